//! Route table for the REST surface

use axum::{
    Json, Router,
    routing::{get, post, put},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers::{
    approve_request, create_request, get_request, list_all_requests, list_my_requests,
    reject_request,
};
use super::host::ServerHost;

/// Build donation request routes
///
/// - POST /donation-request/create - Submit a request
/// - GET /donation-request/all - List every request (admin)
/// - GET /donation-request/my-requests - List the caller's requests
/// - GET /donation-request/{id} - Get one request (owner or admin)
/// - PUT /donation-request/approve/{id} - Approve (admin)
/// - PUT /donation-request/reject/{id} - Reject (admin)
pub fn build_donation_routes(host: Arc<ServerHost>) -> Router {
    Router::new()
        .route("/donation-request/create", post(create_request))
        .route("/donation-request/all", get(list_all_requests))
        .route("/donation-request/my-requests", get(list_my_requests))
        .route("/donation-request/approve/{id}", put(approve_request))
        .route("/donation-request/reject/{id}", put(reject_request))
        .route("/donation-request/{id}", get(get_request))
        .with_state(host)
}

/// Build health check routes
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "organ-donation"
    }))
}

/// Assemble the full application router
pub fn build_router(host: Arc<ServerHost>, cors_permissive: bool, custom_routes: Vec<Router>) -> Router {
    let mut app = health_routes().merge(build_donation_routes(host));
    for custom in custom_routes {
        app = app.merge(custom);
    }

    let app = app.layer(TraceLayer::new_for_http());
    if cors_permissive {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::{Identity, StaticIdentityProvider};
    use crate::storage::{InMemoryCatalog, InMemoryDonationStore};
    use crate::workflow::DonationWorkflow;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn test_router(cors_permissive: bool) -> Router {
        let workflow = DonationWorkflow::new(
            Arc::new(InMemoryDonationStore::new()),
            Arc::new(InMemoryCatalog::new()),
        );
        let identities =
            StaticIdentityProvider::new().with_token("admin", Identity::admin(Uuid::new_v4()));
        let host = Arc::new(ServerHost::new(workflow, Arc::new(identities)));
        build_router(host, cors_permissive, Vec::new())
    }

    #[tokio::test]
    async fn test_health_returns_200() {
        let resp = test_router(false)
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_static_segments_win_over_id() {
        let resp = test_router(false)
            .oneshot(
                Request::builder()
                    .uri("/donation-request/all")
                    .header(header::AUTHORIZATION, "Bearer admin")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_permissive_cors_headers() {
        let resp = test_router(true)
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(resp.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }
}
