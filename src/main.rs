//! Donation request server
//!
//! Usage: `donation-server [config.yaml]`
//!
//! The configuration file is optional; every setting has a default and the
//! usual ones can be overridden from the environment (see `config`).

use anyhow::{Context, Result};
use donation::config::{AppConfig, StorageBackend};
use donation::core::token::JwtIdentityProvider;
use donation::server::ServerBuilder;
use donation::storage::{InMemoryCatalog, InMemoryDonationStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let mut config = match std::env::args().nth(1) {
        Some(path) => AppConfig::from_yaml_file(&path)
            .with_context(|| format!("loading configuration from {}", path))?,
        None => AppConfig::default(),
    };
    config.apply_env_overrides()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .init();

    let secret = config
        .auth
        .jwt_secret
        .clone()
        .context("JWT_SECRET (or auth.jwt_secret) must be set")?;
    let mut identity = JwtIdentityProvider::new(&secret);
    if let Some(issuer) = &config.auth.jwt_issuer {
        identity = identity.with_issuer(issuer.clone());
    }

    let builder = ServerBuilder::new()
        .with_config(&config)
        .with_identity_provider(identity);

    let builder = match config.storage.backend {
        StorageBackend::InMemory => {
            tracing::info!(
                categories = config.seed.categories.len(),
                "using in-memory storage"
            );
            builder
                .with_store(InMemoryDonationStore::new())
                .with_catalog(InMemoryCatalog::with_categories(
                    config.seed.categories.clone(),
                ))
        }
        StorageBackend::Postgres => postgres_stores(builder, &config).await?,
    };

    builder.serve(&config.server.bind).await
}

#[cfg(feature = "postgres")]
async fn postgres_stores(builder: ServerBuilder, config: &AppConfig) -> Result<ServerBuilder> {
    use donation::storage::{PostgresCatalog, PostgresDonationStore, ensure_schema};
    use sqlx::postgres::PgPoolOptions;

    let url = config
        .storage
        .database_url
        .as_deref()
        .context("storage.database_url must be set for the postgres backend")?;
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await
        .context("connecting to PostgreSQL")?;
    ensure_schema(&pool).await?;

    let catalog = PostgresCatalog::new(pool.clone());
    for category in &config.seed.categories {
        catalog.upsert_category(category).await?;
    }

    tracing::info!("using PostgreSQL storage");
    Ok(builder
        .with_store(PostgresDonationStore::new(pool))
        .with_catalog(catalog))
}

#[cfg(not(feature = "postgres"))]
async fn postgres_stores(_builder: ServerBuilder, _config: &AppConfig) -> Result<ServerBuilder> {
    anyhow::bail!("the postgres backend requires building with `--features postgres`")
}
