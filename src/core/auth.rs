//! Identity and authorization
//!
//! Provides the caller identity handed to every workflow operation and the
//! policies deciding what that identity may do:
//! - Any authenticated requester
//! - Owner of a donation request
//! - Administrator

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::core::error::DonationError;

/// Role carried by an identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DonationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(DonationError::Authentication {
                message: format!("Unknown role '{}'", other),
            }),
        }
    }
}

/// An authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn user(id: Uuid) -> Self {
        Self { id, role: Role::User }
    }

    pub fn admin(id: Uuid) -> Self {
        Self {
            id,
            role: Role::Admin,
        }
    }

    /// Check if identity represents an admin
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Authorization policy for an operation
#[derive(Debug, Clone)]
pub enum AuthPolicy {
    /// Any authenticated identity
    Authenticated,

    /// Admin only
    AdminOnly,

    /// The owner of the resource, or any admin
    OwnerOrAdmin(Uuid),
}

impl AuthPolicy {
    /// Check if the identity satisfies this policy
    pub fn check(&self, identity: &Identity) -> bool {
        match self {
            AuthPolicy::Authenticated => true,
            AuthPolicy::AdminOnly => identity.is_admin(),
            AuthPolicy::OwnerOrAdmin(owner) => identity.is_admin() || identity.id == *owner,
        }
    }

    /// Check the policy, failing with `Forbidden`
    pub fn enforce(&self, identity: &Identity) -> Result<(), DonationError> {
        if self.check(identity) {
            return Ok(());
        }
        let message = match self {
            AuthPolicy::AdminOnly => "Access denied. Admin privileges required.",
            _ => "Access denied",
        };
        Err(DonationError::Forbidden {
            message: message.to_string(),
        })
    }
}

/// Trait for identity providers
///
/// Given a bearer credential, resolves the caller or fails with
/// `Authentication`.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, bearer: &str) -> Result<Identity, DonationError>;
}

/// Fixed token table (for development and tests)
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    tokens: HashMap<String, Identity>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token for an identity
    pub fn with_token(mut self, token: impl Into<String>, identity: Identity) -> Self {
        self.tokens.insert(token.into(), identity);
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn authenticate(&self, bearer: &str) -> Result<Identity, DonationError> {
        self.tokens
            .get(bearer)
            .copied()
            .ok_or_else(|| DonationError::Authentication {
                message: "Invalid token".to_string(),
            })
    }
}
