//! HS256 bearer tokens
//!
//! Tokens carry the caller's id and role. Verification is stateless: no
//! user lookup is performed.

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::auth::{Identity, IdentityProvider, Role};
use crate::core::error::DonationError;

/// JWT claims embedded in every bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject — identity ID (UUID string).
    pub sub: String,
    /// Caller role.
    pub role: Role,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp); tokens without one never expire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Identity provider backed by HMAC-signed JWTs
#[derive(Clone)]
pub struct JwtIdentityProvider {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: Option<String>,
}

impl JwtIdentityProvider {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer: None,
        }
    }

    /// Require (and stamp) the given issuer
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Issue a token for `identity`, valid for `lifetime_secs` if given
    pub fn issue(
        &self,
        identity: &Identity,
        lifetime_secs: Option<i64>,
    ) -> Result<String, DonationError> {
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            sub: identity.id.to_string(),
            role: identity.role,
            iat: now,
            exp: lifetime_secs.map(|secs| now + secs),
            iss: self.issuer.clone(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| DonationError::Internal(format!("JWT encode: {}", e)))
    }

    /// Decode and verify a token
    pub fn decode(&self, token: &str) -> Result<TokenClaims, DonationError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims::<&str>(&[]);
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }

        jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let message = match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => "Token expired",
                    _ => "Invalid token",
                };
                tracing::debug!(error = %e, "rejected bearer token");
                DonationError::Authentication {
                    message: message.to_string(),
                }
            })
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn authenticate(&self, bearer: &str) -> Result<Identity, DonationError> {
        let claims = self.decode(bearer)?;
        let id = Uuid::parse_str(&claims.sub).map_err(|_| DonationError::Authentication {
            message: "Invalid token".to_string(),
        })?;
        Ok(Identity {
            id,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_roundtrip() {
        let provider = JwtIdentityProvider::new("test-secret");
        let identity = Identity::admin(Uuid::new_v4());

        let token = provider.issue(&identity, Some(900)).unwrap();
        let resolved = provider.authenticate(&token).await.unwrap();

        assert_eq!(resolved, identity);
    }

    #[tokio::test]
    async fn test_token_without_expiry_is_accepted() {
        let provider = JwtIdentityProvider::new("test-secret");
        let identity = Identity::user(Uuid::new_v4());

        let token = provider.issue(&identity, None).unwrap();
        assert_eq!(provider.authenticate(&token).await.unwrap(), identity);
    }

    #[tokio::test]
    async fn test_expired_token() {
        let provider = JwtIdentityProvider::new("test-secret");
        let token = provider
            .issue(&Identity::user(Uuid::new_v4()), Some(-3600))
            .unwrap();

        let err = provider.authenticate(&token).await.unwrap_err();
        assert_eq!(err.to_string(), "Token expired");
    }

    #[tokio::test]
    async fn test_wrong_secret() {
        let issuer = JwtIdentityProvider::new("secret-a");
        let verifier = JwtIdentityProvider::new("secret-b");
        let token = issuer.issue(&Identity::user(Uuid::new_v4()), None).unwrap();

        let err = verifier.authenticate(&token).await.unwrap_err();
        assert!(matches!(err, DonationError::Authentication { .. }));
        assert_eq!(err.to_string(), "Invalid token");
    }

    #[tokio::test]
    async fn test_issuer_mismatch() {
        let issuer = JwtIdentityProvider::new("s").with_issuer("shop");
        let verifier = JwtIdentityProvider::new("s").with_issuer("other");
        let token = issuer.issue(&Identity::user(Uuid::new_v4()), None).unwrap();

        assert!(verifier.authenticate(&token).await.is_err());
    }
}
