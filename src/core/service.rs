//! Persistence seam for donation requests

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::donation::{DonationRequest, Transition};
use crate::core::error::DonationError;
use crate::core::query::{DonationFilter, PageRequest};

/// Store trait for donation requests
///
/// Implementations provide the per-record guarantees the workflow relies on.
/// The workflow is agnostic to the underlying storage mechanism.
#[async_trait]
pub trait DonationRequestStore: Send + Sync {
    /// Persist a new pending request
    ///
    /// Fails with `DuplicateRequest` when the same requester already has a
    /// pending request with the same organ name. Backends enforce this as
    /// strongly as they can (write lock, unique index).
    async fn insert(&self, request: DonationRequest) -> Result<DonationRequest, DonationError>;

    /// Get a request by ID
    async fn get(&self, id: &Uuid) -> Result<Option<DonationRequest>, DonationError>;

    /// Find the requester's pending request for an organ, if any
    async fn find_pending(
        &self,
        requested_by: &Uuid,
        organ_name: &str,
    ) -> Result<Option<DonationRequest>, DonationError>;

    /// List matching requests, newest first, with the total match count
    async fn list(
        &self,
        filter: &DonationFilter,
        page: PageRequest,
    ) -> Result<(Vec<DonationRequest>, usize), DonationError>;

    /// Apply a terminal transition if and only if the record is still pending
    ///
    /// This is a conditional update: two concurrent transitions on the same
    /// record cannot both succeed. Fails with `NotFound` or `InvalidState`.
    async fn transition(
        &self,
        id: &Uuid,
        transition: &Transition,
    ) -> Result<DonationRequest, DonationError>;
}
