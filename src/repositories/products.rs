//! Catalog reads for the cart and writes for the bulk import.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::aggregates::{CartItem, CatalogLookup, ProductImportRow, StockLevels, StockLookup};
use crate::domain::value_objects::{ProductId, VariantId};
use crate::services::import::{InsertOutcome, ProductImportRepository};
use crate::Result;

#[derive(Debug, sqlx::FromRow)]
struct CatalogRow { name: String, price: Decimal, compare_at_price: Option<Decimal>, stock: i32, image_url: Option<String>, sku: Option<String> }

#[derive(Debug, sqlx::FromRow)]
struct VariantRow { name: String, price: Option<Decimal>, stock: i32, sku: Option<String> }

fn stock_count(stock: i32) -> u32 { u32::try_from(stock).unwrap_or(0) }

#[derive(Clone)]
pub struct PgProductRepository { db: PgPool }

impl PgProductRepository {
    pub fn new(db: PgPool) -> Self { Self { db } }
}

#[async_trait]
impl StockLookup for PgProductRepository {
    async fn stock_levels(&self, product_ids: &[ProductId]) -> Result<StockLevels> {
        let ids: Vec<Uuid> = product_ids.iter().filter_map(|id| Uuid::parse_str(id.as_str()).ok()).collect();
        let products: Vec<(Uuid, i32)> = sqlx::query_as("SELECT id, stock FROM products WHERE id = ANY($1)")
            .bind(&ids).fetch_all(&self.db).await?;
        let variants: Vec<(Uuid, i32)> = sqlx::query_as("SELECT id, stock FROM product_variants WHERE product_id = ANY($1)")
            .bind(&ids).fetch_all(&self.db).await?;
        Ok(StockLevels {
            products: products.into_iter().map(|(id, stock)| (ProductId::new(id.to_string()), stock_count(stock))).collect(),
            variants: variants.into_iter().map(|(id, stock)| (VariantId::new(id.to_string()), stock_count(stock))).collect(),
        })
    }
}

#[async_trait]
impl CatalogLookup for PgProductRepository {
    async fn resolve(&self, product_id: &ProductId, variant_id: Option<&VariantId>) -> Result<Option<CartItem>> {
        let Ok(id) = Uuid::parse_str(product_id.as_str()) else { return Ok(None) };
        let Some(product) = sqlx::query_as::<_, CatalogRow>("SELECT name, price, compare_at_price, stock, image_url, sku FROM products WHERE id = $1 AND is_active")
            .bind(id).fetch_optional(&self.db).await? else { return Ok(None) };

        let mut item = match variant_id {
            None => CartItem::new(product_id.clone(), None, product.name, product.price).with_stock(stock_count(product.stock)),
            Some(variant_id) => {
                let Ok(vid) = Uuid::parse_str(variant_id.as_str()) else { return Ok(None) };
                let Some(variant) = sqlx::query_as::<_, VariantRow>("SELECT name, price, stock, sku FROM product_variants WHERE id = $1 AND product_id = $2")
                    .bind(vid).bind(id).fetch_optional(&self.db).await? else { return Ok(None) };
                let mut item = CartItem::new(product_id.clone(), Some(variant_id.clone()), format!("{} - {}", product.name, variant.name), variant.price.unwrap_or(product.price))
                    .with_stock(stock_count(variant.stock));
                item.sku = variant.sku;
                item
            }
        };
        if let Some(compare_at) = product.compare_at_price { item = item.with_compare_at_price(compare_at); }
        item.image = product.image_url;
        if item.sku.is_none() { item.sku = product.sku; }
        Ok(Some(item))
    }
}

#[async_trait]
impl ProductImportRepository for PgProductRepository {
    async fn clear_all(&self) -> Result<u64> {
        let mut tx = self.db.begin().await?;
        sqlx::query("DELETE FROM product_variants").execute(&mut *tx).await?;
        let removed = sqlx::query("DELETE FROM products").execute(&mut *tx).await?.rows_affected();
        tx.commit().await?;
        Ok(removed)
    }

    async fn insert(&self, row: &ProductImportRow) -> Result<InsertOutcome> {
        let result = sqlx::query("INSERT INTO products (id, sku, name, description, price, compare_at_price, category, brand, image_url, stock, is_active, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW(), NOW()) ON CONFLICT (sku) DO NOTHING")
            .bind(Uuid::now_v7()).bind(row.normalized_sku()).bind(row.name.trim()).bind(&row.description)
            .bind(row.price).bind(row.compare_at_price).bind(&row.category).bind(&row.brand).bind(&row.image_url)
            .bind(row.stock).bind(row.is_active)
            .execute(&self.db).await?;
        Ok(if result.rows_affected() == 0 { InsertOutcome::DuplicateSku } else { InsertOutcome::Inserted })
    }
}
