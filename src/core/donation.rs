//! Donation request aggregate and its lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::core::entity::Entity;
use crate::core::error::{DonationError, ValidationError};

/// Lifecycle state of a donation request
///
/// `Pending` is the only non-terminal state. Once a request is `Approved` or
/// `Rejected` no workflow operation may touch it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DonationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl DonationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationStatus::Pending => "Pending",
            DonationStatus::Approved => "Approved",
            DonationStatus::Rejected => "Rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, DonationStatus::Pending)
    }
}

impl fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DonationStatus {
    type Err = DonationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(DonationStatus::Pending),
            "Approved" => Ok(DonationStatus::Approved),
            "Rejected" => Ok(DonationStatus::Rejected),
            other => Err(DonationError::Validation(ValidationError::single(
                "status",
                format!(
                    "Status must be either Pending, Approved, or Rejected (got '{}')",
                    other
                ),
            ))),
        }
    }
}

/// A donation request as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRequest {
    pub id: Uuid,
    pub organ_name: String,
    pub category: Uuid,
    pub images: Vec<String>,
    pub pin_code: u32,
    pub description: String,
    pub quantity: u32,
    pub status: DonationStatus,
    pub requested_by: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    /// Administrator who performed the terminal transition, approve or reject
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DonationRequest {
    /// Build a fresh pending record from validated input
    pub fn pending(new: NewDonationRequest, requested_by: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organ_name: new.organ_name,
            category: new.category,
            images: new.images,
            pin_code: new.pin_code,
            description: new.description,
            quantity: new.quantity,
            status: DonationStatus::Pending,
            requested_by,
            rejection_reason: None,
            admin_notes: None,
            approved_by: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == DonationStatus::Pending
    }

    /// Apply a terminal transition in place
    ///
    /// Fails with `InvalidState` unless the record is still pending, leaving
    /// it untouched.
    pub fn apply(&mut self, transition: &Transition) -> Result<(), DonationError> {
        if !self.is_pending() {
            return Err(DonationError::InvalidState {
                id: self.id,
                status: self.status,
                operation: transition.operation().to_string(),
            });
        }

        self.status = transition.target_status();
        self.approved_by = Some(transition.admin_id);
        self.approved_at = Some(transition.at);
        self.updated_at = transition.at;
        if let Some(notes) = &transition.admin_notes {
            self.admin_notes = Some(notes.clone());
        }
        if let TransitionKind::Reject { reason } = &transition.kind {
            self.rejection_reason = Some(reason.clone());
        }
        Ok(())
    }
}

impl Entity for DonationRequest {
    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Raw submission as received from a requester
///
/// Every field is optional so that missing fields are reported by the
/// validator rather than by the deserializer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationDraft {
    pub organ_name: Option<String>,
    pub category: Option<String>,
    pub images: Option<Vec<String>>,
    pub pin_code: Option<serde_json::Value>,
    pub description: Option<String>,
    pub quantity: Option<serde_json::Value>,
}

/// Normalized, validated submission ready to persist
#[derive(Debug, Clone, PartialEq)]
pub struct NewDonationRequest {
    pub organ_name: String,
    pub category: Uuid,
    pub images: Vec<String>,
    pub pin_code: u32,
    pub description: String,
    pub quantity: u32,
}

/// Which terminal transition to perform
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionKind {
    Approve,
    Reject { reason: String },
}

/// A terminal transition, stamped with who and when
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub kind: TransitionKind,
    pub admin_id: Uuid,
    pub admin_notes: Option<String>,
    pub at: DateTime<Utc>,
}

impl Transition {
    pub fn approve(admin_id: Uuid, admin_notes: Option<String>) -> Self {
        Self {
            kind: TransitionKind::Approve,
            admin_id,
            admin_notes,
            at: Utc::now(),
        }
    }

    pub fn reject(admin_id: Uuid, reason: String, admin_notes: Option<String>) -> Self {
        Self {
            kind: TransitionKind::Reject { reason },
            admin_id,
            admin_notes,
            at: Utc::now(),
        }
    }

    pub fn target_status(&self) -> DonationStatus {
        match self.kind {
            TransitionKind::Approve => DonationStatus::Approved,
            TransitionKind::Reject { .. } => DonationStatus::Rejected,
        }
    }

    /// Past participle used in error messages
    pub fn operation(&self) -> &'static str {
        match self.kind {
            TransitionKind::Approve => "approved",
            TransitionKind::Reject { .. } => "rejected",
        }
    }
}
