//! Server host shared by every request handler
//!
//! The host owns the workflow engine and the identity provider and is the
//! single source of truth for the application state. It is transport
//! agnostic: the REST router only borrows it.

use crate::core::auth::IdentityProvider;
use crate::core::error::DonationError;
use crate::workflow::DonationWorkflow;
use axum::response::Response;
use std::sync::Arc;

/// Host context containing all service state
///
/// # Example
///
/// ```rust,ignore
/// let host = Arc::new(ServerHost::new(workflow, Arc::new(JwtIdentityProvider::new(secret))));
/// let app = build_router(host, false, Vec::new());
/// ```
pub struct ServerHost {
    /// Donation request workflow engine
    pub workflow: DonationWorkflow,

    /// Resolves bearer tokens to identities
    pub identity_provider: Arc<dyn IdentityProvider>,

    /// Attach internal error causes to responses (development only)
    pub expose_internal_errors: bool,
}

impl ServerHost {
    pub fn new(workflow: DonationWorkflow, identity_provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            workflow,
            identity_provider,
            expose_internal_errors: false,
        }
    }

    pub fn with_exposed_errors(mut self, expose: bool) -> Self {
        self.expose_internal_errors = expose;
        self
    }

    /// Render an error according to the host's exposure setting
    pub fn error_response(&self, err: DonationError) -> Response {
        err.render(self.expose_internal_errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::StaticIdentityProvider;
    use crate::core::error::StorageError;
    use crate::storage::{InMemoryCatalog, InMemoryDonationStore};
    use axum::body::to_bytes;
    use axum::http::StatusCode;

    fn make_host() -> ServerHost {
        let workflow = DonationWorkflow::new(
            Arc::new(InMemoryDonationStore::new()),
            Arc::new(InMemoryCatalog::new()),
        );
        ServerHost::new(workflow, Arc::new(StaticIdentityProvider::new()))
    }

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_internal_errors_hidden_by_default() {
        let host = make_host();
        let response = host.error_response(StorageError::Poisoned("boom".into()).into());

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_of(response).await;
        assert_eq!(body["message"], "Internal server error");
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_internal_errors_exposed_in_development() {
        let host = make_host().with_exposed_errors(true);
        let body = body_of(host.error_response(StorageError::Poisoned("boom".into()).into())).await;

        assert!(body["error"].as_str().unwrap().contains("boom"));
    }
}
