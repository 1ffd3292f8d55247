//! Vapeshop Commerce - back-office functions for the storefront

use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vapeshop_commerce::config::AppConfig;
use vapeshop_commerce::repositories::{PgAbandonedCartRepository, PgLogRepository, PgOrderRepository, PgProductRepository, PgSettingsStore};
use vapeshop_commerce::services::{AbandonedCartService, EventPublisher, ImportService, LogService, NatsPublisher, OrderService, PaymentsService};
use vapeshop_commerce::web::{router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env()?;
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let db = PgPoolOptions::new().max_connections(config.db_max_connections).connect(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "nats unavailable, events will be dropped");
                None
            }
        },
        None => None,
    };
    let publisher: Arc<dyn EventPublisher> = Arc::new(NatsPublisher::new(nats));
    let orders = Arc::new(PgOrderRepository::new(db.clone()));

    let state = AppState {
        payments: Arc::new(PaymentsService::new(orders.clone(), publisher.clone(), config.payment_amount_tolerance, config.payment_confirmed_subject.clone())),
        import: Arc::new(ImportService::new(Arc::new(PgProductRepository::new(db.clone())))),
        logs: Arc::new(LogService::new(Arc::new(PgLogRepository::new(db.clone())))),
        settings: Arc::new(PgSettingsStore::new(db.clone())),
        abandoned: Arc::new(AbandonedCartService::new(Arc::new(PgAbandonedCartRepository::new(db.clone())))),
        orders: Arc::new(OrderService::new(orders, publisher)),
    };

    tracing::info!("Vapeshop Commerce listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?, router(state)).await?;
    Ok(())
}
