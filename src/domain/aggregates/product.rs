//! Product import rows
//!
//! Rows arrive from the admin bulk-import screen (a parsed spreadsheet). Each
//! row is validated on its own; a bad row never aborts the batch.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Detail lists in an [`ImportSummary`] keep at most this many entries.
pub const DETAIL_LIMIT: usize = 10;

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(ValidationError::new("must_not_be_negative"));
    }
    Ok(())
}

#[derive(Clone, Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductImportRow {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 64))]
    pub sku: Option<String>,
    #[validate(custom = "non_negative")]
    pub price: Decimal,
    #[serde(default)]
    pub compare_at_price: Option<Decimal>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub stock: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool { true }

impl ProductImportRow {
    pub fn normalized_sku(&self) -> Option<String> {
        self.sku.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_uppercase)
    }

    /// Human readable validation problems, or `None` when the row is valid.
    pub fn problems(&self) -> Option<String> {
        let errors = self.validate().err()?;
        let mut fields: Vec<String> = errors.field_errors().into_iter().map(|(field, errs)| {
            let codes: Vec<&str> = errs.iter().map(|e| &*e.code).collect();
            format!("{field} ({})", codes.join(", "))
        }).collect();
        fields.sort();
        Some(format!("invalid {}", fields.join("; ")))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub imported: usize,
    pub errors: usize,
    pub skipped: usize,
    pub error_details: Vec<String>,
    pub skipped_details: Vec<String>,
}

impl ImportSummary {
    pub fn record_imported(&mut self) { self.imported += 1; }

    pub fn record_error(&mut self, detail: String) {
        self.errors += 1;
        if self.error_details.len() < DETAIL_LIMIT { self.error_details.push(detail); }
    }

    pub fn record_skipped(&mut self, detail: String) {
        self.skipped += 1;
        if self.skipped_details.len() < DETAIL_LIMIT { self.skipped_details.push(detail); }
    }
}

/// Splits a batch into rows worth inserting, recording invalid rows as errors
/// and in-batch SKU repeats as skipped. Row numbers are 1-based.
pub fn screen_rows(rows: Vec<ProductImportRow>, summary: &mut ImportSummary) -> Vec<(usize, ProductImportRow)> {
    let mut seen = HashSet::new();
    let mut accepted = Vec::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        let row_number = index + 1;
        if let Some(problems) = row.problems() {
            summary.record_error(format!("Row {row_number}: {problems}"));
            continue;
        }
        if let Some(sku) = row.normalized_sku() {
            if !seen.insert(sku.clone()) {
                summary.record_skipped(format!("Row {row_number}: duplicate SKU {sku} in batch"));
                continue;
            }
        }
        accepted.push((row_number, row));
    }
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, sku: Option<&str>, price: i64) -> ProductImportRow {
        ProductImportRow {
            name: name.into(), sku: sku.map(Into::into), price: Decimal::new(price, 0), compare_at_price: None,
            description: None, category: None, brand: None, image_url: None, stock: 5, is_active: true,
        }
    }

    #[test]
    fn test_row_validation() {
        assert!(row("Coil", Some("c1"), 10).problems().is_none());
        assert!(row("", None, 10).problems().unwrap().contains("name"));
        assert!(row("Coil", None, -1).problems().unwrap().contains("price"));
        let mut negative_stock = row("Coil", None, 1);
        negative_stock.stock = -3;
        assert!(negative_stock.problems().unwrap().contains("stock"));
    }

    #[test]
    fn test_screen_rows_counts() {
        let mut summary = ImportSummary::default();
        let accepted = screen_rows(vec![row("A", Some("a1"), 1), row("", None, 1), row("B", Some(" A1 "), 1), row("C", None, 2)], &mut summary);
        assert_eq!(accepted.iter().map(|(n, _)| *n).collect::<Vec<_>>(), vec![1, 4]);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.skipped_details, vec!["Row 3: duplicate SKU A1 in batch".to_string()]);
    }

    #[test]
    fn test_details_are_truncated() {
        let mut summary = ImportSummary::default();
        for i in 0..25 { summary.record_error(format!("Row {i}: bad")); }
        assert_eq!(summary.errors, 25);
        assert_eq!(summary.error_details.len(), DETAIL_LIMIT);
    }

    #[test]
    fn test_row_deserializes_from_camel_case() {
        let parsed: ProductImportRow = serde_json::from_str(r#"{"name":"Tank","price":19.5,"compareAtPrice":25}"#).unwrap();
        assert!(parsed.is_active);
        assert_eq!(parsed.stock, 0);
        assert_eq!(parsed.compare_at_price, Some(Decimal::new(25, 0)));
    }
}
