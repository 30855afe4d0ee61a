//! Typed error handling for the donation service
//!
//! Every failure the workflow can produce is a variant of [`DonationError`].
//! Callers match on the variant instead of parsing messages, and the HTTP
//! layer derives both the status code and the response envelope from it.
//!
//! # Error Categories
//!
//! - [`ValidationError`]: malformed or missing input, keyed by field
//! - [`DonationError::DuplicateRequest`]: business-rule conflict at creation
//! - [`DonationError::NotFound`]: unknown donation request, category, ...
//! - [`DonationError::Forbidden`] / [`DonationError::Authentication`]
//! - [`DonationError::InvalidState`]: transition attempted on a terminal record
//! - [`StorageError`] / [`ConfigError`]: infrastructure failures
//!
//! # Example
//!
//! ```rust,ignore
//! match workflow.approve(&admin, id, None).await {
//!     Ok(outcome) => println!("listed as {}", outcome.product.id),
//!     Err(DonationError::InvalidState { status, .. }) => {
//!         println!("already {}", status);
//!     }
//!     Err(e) => eprintln!("other error: {}", e),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::core::donation::DonationStatus;

/// The main error type of the service
#[derive(Debug)]
pub enum DonationError {
    /// Input failed validation
    Validation(ValidationError),

    /// The requester already has a pending request for this organ
    DuplicateRequest { organ_name: String },

    /// The referenced record does not exist
    NotFound { entity_type: String, id: String },

    /// The caller is authenticated but not allowed to perform the operation
    Forbidden { message: String },

    /// The caller could not be identified
    Authentication { message: String },

    /// A transition was attempted on a record that is no longer pending
    InvalidState {
        id: Uuid,
        status: DonationStatus,
        operation: String,
    },

    /// Storage backend errors
    Storage(StorageError),

    /// Configuration errors
    Config(ConfigError),

    /// Unexpected failures (should not happen in normal operation)
    Internal(String),
}

impl fmt::Display for DonationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DonationError::Validation(e) => write!(f, "{}", e),
            DonationError::DuplicateRequest { .. } => {
                write!(f, "You already have a pending request for this organ")
            }
            DonationError::NotFound { entity_type, .. } => {
                write!(f, "{} not found", entity_type)
            }
            DonationError::Forbidden { message } => write!(f, "{}", message),
            DonationError::Authentication { message } => write!(f, "{}", message),
            DonationError::InvalidState { operation, .. } => {
                write!(f, "Only pending requests can be {}", operation)
            }
            DonationError::Storage(e) => write!(f, "{}", e),
            DonationError::Config(e) => write!(f, "{}", e),
            DonationError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DonationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DonationError::Validation(e) => Some(e),
            DonationError::Storage(e) => Some(e),
            DonationError::Config(e) => Some(e),
            _ => None,
        }
    }
}

/// Error envelope returned by every failing endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    /// Human-readable error message
    pub message: String,
    /// Error code for programmatic handling
    pub code: String,
    /// Offending fields, for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldValidationError>>,
    /// Underlying cause of an infrastructure failure (development only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DonationError {
    /// Shorthand for a donation request that does not exist
    pub fn request_not_found(id: impl ToString) -> Self {
        DonationError::NotFound {
            entity_type: "Donation request".to_string(),
            id: id.to_string(),
        }
    }

    /// Shorthand for a single-field validation failure
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        DonationError::Validation(ValidationError::single(field, message))
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            DonationError::Validation(_) => StatusCode::BAD_REQUEST,
            DonationError::DuplicateRequest { .. } => StatusCode::BAD_REQUEST,
            DonationError::NotFound { .. } => StatusCode::NOT_FOUND,
            DonationError::Forbidden { .. } => StatusCode::FORBIDDEN,
            DonationError::Authentication { .. } => StatusCode::UNAUTHORIZED,
            DonationError::InvalidState { .. } => StatusCode::BAD_REQUEST,
            DonationError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DonationError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DonationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            DonationError::Validation(_) => "VALIDATION_ERROR",
            DonationError::DuplicateRequest { .. } => "DUPLICATE_REQUEST",
            DonationError::NotFound { .. } => "NOT_FOUND",
            DonationError::Forbidden { .. } => "FORBIDDEN",
            DonationError::Authentication { .. } => "AUTHENTICATION_ERROR",
            DonationError::InvalidState { .. } => "INVALID_STATE",
            DonationError::Storage(_) => "STORAGE_ERROR",
            DonationError::Config(_) => "CONFIG_ERROR",
            DonationError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True for failures the caller cannot fix by changing the request
    pub fn is_internal(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Convert to an error response
    ///
    /// Infrastructure failures never leak their cause unless `expose_internal`
    /// is set.
    pub fn to_response(&self, expose_internal: bool) -> ErrorResponse {
        let internal = self.is_internal();
        ErrorResponse {
            success: false,
            message: if internal {
                "Internal server error".to_string()
            } else {
                self.to_string()
            },
            code: self.error_code().to_string(),
            errors: match self {
                DonationError::Validation(e) => Some(e.fields().to_vec()),
                _ => None,
            },
            error: (internal && expose_internal).then(|| self.to_string()),
        }
    }

    /// Render the error, logging infrastructure failures
    pub fn render(self, expose_internal: bool) -> Response {
        if self.is_internal() {
            tracing::error!(code = self.error_code(), "{}", self);
        }
        let status = self.status_code();
        (status, Json(self.to_response(expose_internal))).into_response()
    }
}

impl IntoResponse for DonationError {
    fn into_response(self) -> Response {
        self.render(false)
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// A single field validation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldValidationError {
    pub field: String,
    pub message: String,
}

/// Field-keyed validation failure
///
/// Holds at least one entry once returned from a validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    errors: Vec<FieldValidationError>,
}

impl ValidationError {
    pub fn new(errors: Vec<FieldValidationError>) -> Self {
        Self { errors }
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldValidationError {
                field: field.to_string(),
                message: message.into(),
            }],
        }
    }

    /// All offending fields, in the order they were checked
    pub fn fields(&self) -> &[FieldValidationError] {
        &self.errors
    }

    /// Whether `field` is among the offending fields
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [only] => write!(f, "{}", only.message),
            _ => write!(f, "Validation failed"),
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for DonationError {
    fn from(err: ValidationError) -> Self {
        DonationError::Validation(err)
    }
}

impl From<serde_json::Error> for DonationError {
    fn from(err: serde_json::Error) -> Self {
        DonationError::field("body", format!("Invalid JSON: {}", err))
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors related to storage backends
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to connect to {backend}: {message}")]
    Connection { backend: String, message: String },

    #[error("{backend} query error: {message}")]
    Query { backend: String, message: String },

    #[error("Storage lock poisoned: {0}")]
    Poisoned(String),

    #[error("Data integrity error: {0}")]
    Integrity(String),
}

impl From<StorageError> for DonationError {
    fn from(err: StorageError) -> Self {
        DonationError::Storage(err)
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to parse config{}: {message}", file_suffix(.file))]
    Parse {
        file: Option<String>,
        message: String,
    },

    #[error("Invalid value '{value}' for field '{field}': {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    #[error("Missing required field '{field}' in {context}")]
    MissingField { field: String, context: String },
}

fn file_suffix(file: &Option<String>) -> String {
    file.as_ref()
        .map(|f| format!(" file '{}'", f))
        .unwrap_or_default()
}

impl From<ConfigError> for DonationError {
    fn from(err: ConfigError) -> Self {
        DonationError::Config(err)
    }
}
