//! Request extractors for the REST surface

use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use axum::response::Response;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::auth::Identity;
use crate::core::error::DonationError;
use crate::server::host::ServerHost;

const MISSING_TOKEN: &str = "Access denied. No token provided.";

/// The caller, resolved from `Authorization: Bearer <token>`
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub Identity);

/// Extract the bearer token from the Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, DonationError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| DonationError::Authentication {
            message: MISSING_TOKEN.to_string(),
        })
}

impl FromRequestParts<Arc<ServerHost>> for Authenticated {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        host: &Arc<ServerHost>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).map_err(|e| host.error_response(e))?;
        let identity = host
            .identity_provider
            .authenticate(token)
            .await
            .map_err(|e| host.error_response(e))?;
        Ok(Authenticated(identity))
    }
}

/// Parse a donation request id from the path
///
/// An id that is not a UUID cannot name an existing record, so it is
/// reported as not found rather than as malformed input.
pub fn parse_request_id(raw: &str) -> Result<Uuid, DonationError> {
    Uuid::parse_str(raw).map_err(|_| DonationError::request_not_found(raw))
}
