//! # Organ Donation Service
//!
//! Submission, review and catalog listing of donated organs.
//!
//! ## Features
//!
//! - **Request Lifecycle**: `Pending` requests are approved or rejected once, by an admin
//! - **Catalog Listing**: approval lists the donation as a free, donation-flagged product
//! - **Field-Keyed Validation**: every offending field is reported at once
//! - **Pluggable Storage**: in-memory by default, PostgreSQL behind the `postgres` feature
//! - **Bearer Authentication**: HS256 tokens carrying the caller's id and role
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use donation::prelude::*;
//!
//! let catalog = InMemoryCatalog::with_categories([Category {
//!     id: Uuid::new_v4(),
//!     name: "Kidney".to_string(),
//!     description: None,
//! }]);
//!
//! ServerBuilder::new()
//!     .with_store(InMemoryDonationStore::new())
//!     .with_catalog(catalog)
//!     .with_identity_provider(JwtIdentityProvider::new("secret"))
//!     .serve("127.0.0.1:3000")
//!     .await?;
//! ```

pub mod config;
pub mod core;
pub mod server;
pub mod storage;
pub mod workflow;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        auth::{AuthPolicy, Identity, IdentityProvider, Role, StaticIdentityProvider},
        catalog::{CatalogStore, Category, NewProduct, Product},
        donation::{DonationDraft, DonationRequest, DonationStatus, Transition},
        entity::Entity,
        error::{DonationError, ValidationError},
        query::{ListParams, Page, PageLimits, PaginationMeta},
        service::DonationRequestStore,
        token::JwtIdentityProvider,
    };

    // === Workflow ===
    pub use crate::workflow::{ApprovalOutcome, DonationWorkflow};

    // === Storage ===
    pub use crate::storage::{InMemoryCatalog, InMemoryDonationStore};
    #[cfg(feature = "postgres")]
    pub use crate::storage::{PostgresCatalog, PostgresDonationStore};

    // === Config ===
    pub use crate::config::{AppConfig, StorageBackend};

    // === Server ===
    pub use crate::server::{ServerBuilder, ServerHost};

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;
}
