//! ServerBuilder for fluent API to build HTTP servers

use super::host::ServerHost;
use super::router::build_router;
use crate::config::AppConfig;
use crate::core::auth::IdentityProvider;
use crate::core::catalog::CatalogStore;
use crate::core::query::PageLimits;
use crate::core::service::DonationRequestStore;
use crate::workflow::DonationWorkflow;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Builder for the donation request HTTP server
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_store(InMemoryDonationStore::new())
///     .with_catalog(InMemoryCatalog::with_categories(categories))
///     .with_identity_provider(JwtIdentityProvider::new(&secret))
///     .build()?;
/// ```
pub struct ServerBuilder {
    store: Option<Arc<dyn DonationRequestStore>>,
    catalog: Option<Arc<dyn CatalogStore>>,
    identity_provider: Option<Arc<dyn IdentityProvider>>,
    limits: PageLimits,
    expose_internal_errors: bool,
    cors_permissive: bool,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            store: None,
            catalog: None,
            identity_provider: None,
            limits: PageLimits::default(),
            expose_internal_errors: false,
            cors_permissive: false,
            custom_routes: Vec::new(),
        }
    }

    /// Set the donation request store (required)
    pub fn with_store(mut self, store: impl DonationRequestStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Set an already shared donation request store
    pub fn with_shared_store(mut self, store: Arc<dyn DonationRequestStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the catalog (required)
    pub fn with_catalog(mut self, catalog: impl CatalogStore + 'static) -> Self {
        self.catalog = Some(Arc::new(catalog));
        self
    }

    pub fn with_shared_catalog(mut self, catalog: Arc<dyn CatalogStore>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Set the identity provider (required)
    pub fn with_identity_provider(mut self, provider: impl IdentityProvider + 'static) -> Self {
        self.identity_provider = Some(Arc::new(provider));
        self
    }

    /// Take pagination bounds, error exposure and CORS from configuration
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        self.limits = config.pagination;
        self.expose_internal_errors = config.server.expose_internal_errors;
        self.cors_permissive = config.server.cors_permissive;
        self
    }

    /// Add custom routes to the server
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Build the transport-agnostic host
    pub fn build_host(&mut self) -> Result<ServerHost> {
        let store = self
            .store
            .take()
            .ok_or_else(|| anyhow::anyhow!("A donation store is required. Call .with_store()"))?;
        let catalog = self
            .catalog
            .take()
            .ok_or_else(|| anyhow::anyhow!("A catalog is required. Call .with_catalog()"))?;
        let identity_provider = self.identity_provider.take().ok_or_else(|| {
            anyhow::anyhow!("An identity provider is required. Call .with_identity_provider()")
        })?;

        let workflow = DonationWorkflow::new(store, catalog).with_limits(self.limits);
        Ok(ServerHost::new(workflow, identity_provider)
            .with_exposed_errors(self.expose_internal_errors))
    }

    /// Build the final REST router
    pub fn build(mut self) -> Result<Router> {
        let host = Arc::new(self.build_host()?);
        let custom_routes = std::mem::take(&mut self.custom_routes);
        Ok(build_router(host, self.cors_permissive, custom_routes))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the provided address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for a shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, shutting down...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, shutting down...");
        },
    }
}
