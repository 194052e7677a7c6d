use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "gardenpay={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.server.database).await?;

    let gateways = build_gateways(&settings.gateways)?;
    let engine = engine::Engine::builder()
        .database(db.clone())
        .gateways(gateways)
        .build()
        .await?;

    let bind = settings
        .server
        .bind
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    server::run_with_listener(engine, db, listener).await?;

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite { path } => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}

fn build_gateways(
    config: &settings::Gateways,
) -> Result<engine::GatewayRegistry, Box<dyn std::error::Error + Send + Sync>> {
    let mut registry = engine::GatewayRegistry::new();

    if let Some(bank) = &config.bank {
        let adapter = engine::BankGateway::new(engine::BankConfig {
            base_url: bank.base_url.clone(),
            username: bank.username.clone(),
            password: bank.password.clone(),
            return_url: bank.return_url.clone(),
        })?;
        registry = registry.with(engine::GatewayKind::Bank, std::sync::Arc::new(adapter));
        tracing::info!("bank gateway configured");
    }

    if let Some(ecomm) = &config.ecomm {
        let identity_pem = std::fs::read(&ecomm.certificate)?;
        let adapter = engine::EcommGateway::new(engine::EcommConfig {
            base_url: ecomm.base_url.clone(),
            client_url: ecomm.client_url.clone(),
            identity_pem,
        })?;
        registry = registry.with(engine::GatewayKind::Ecomm, std::sync::Arc::new(adapter));
        tracing::info!("ecomm gateway configured");
    }

    if registry.is_empty() {
        tracing::warn!("no payment gateways configured, order creation will fail");
    }

    Ok(registry)
}
