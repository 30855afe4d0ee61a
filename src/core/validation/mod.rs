//! Validation and normalization of workflow input
//!
//! Validators are small reusable closures; [`FieldChecks`] collects their
//! failures so that a caller sees every offending field at once.

pub mod donation;
pub mod filters;
pub mod validators;

pub use donation::{validate_admin_notes, validate_draft, validate_rejection_reason};

use crate::core::error::{FieldValidationError, ValidationError};

/// Accumulates field errors across several checks
#[derive(Debug, Default)]
pub struct FieldChecks {
    errors: Vec<FieldValidationError>,
}

impl FieldChecks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a validator; returns whether it passed
    pub fn check(&mut self, field: &str, result: Result<(), String>) -> bool {
        match result {
            Ok(()) => true,
            Err(message) => {
                self.fail(field, message);
                false
            }
        }
    }

    /// Record a failure directly
    pub fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldValidationError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok` when nothing failed, otherwise every recorded failure
    pub fn finish(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(self.errors))
        }
    }
}
