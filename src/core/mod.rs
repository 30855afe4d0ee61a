//! Core module containing the domain types and the seams of the service

pub mod auth;
pub mod catalog;
pub mod donation;
pub mod entity;
pub mod error;
pub mod query;
pub mod service;
pub mod token;
pub mod validation;

pub use auth::{AuthPolicy, Identity, IdentityProvider, Role, StaticIdentityProvider};
pub use catalog::{CatalogStore, Category, NewProduct, Product};
pub use donation::{
    DonationDraft, DonationRequest, DonationStatus, NewDonationRequest, Transition,
    TransitionKind,
};
pub use entity::Entity;
pub use error::{
    ConfigError, DonationError, ErrorResponse, FieldValidationError, StorageError,
    ValidationError,
};
pub use query::{DonationFilter, ListParams, Page, PageLimits, PageRequest, PaginationMeta};
pub use service::DonationRequestStore;
pub use token::JwtIdentityProvider;
