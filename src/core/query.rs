//! Query parameters and pagination utilities

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::donation::{DonationRequest, DonationStatus};
use crate::core::error::DonationError;

/// Query parameters for listing donation requests
///
/// Extracted from URL query strings. Missing values fall back to defaults
/// resolved against the configured [`PageLimits`].
///
/// # Example
/// ```text
/// GET /donation-request/all?status=Pending&page=2&limit=10&search=kidney
/// GET /donation-request/my-requests?page=1
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ListParams {
    /// Page number (starts at 1)
    pub page: Option<usize>,

    /// Number of items per page
    pub limit: Option<usize>,

    /// Exact status filter (`Pending`, `Approved`, `Rejected`)
    pub status: Option<String>,

    /// Case-insensitive substring match on organ name or description
    pub search: Option<String>,
}

impl ListParams {
    /// Get page number, ensuring minimum of 1
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    /// Get limit, defaulted and clamped to the configured bounds
    pub fn limit(&self, limits: &PageLimits) -> usize {
        self.limit
            .unwrap_or(limits.default_limit)
            .clamp(1, limits.max_limit.max(1))
    }

    /// Parse the status filter, if any
    pub fn status(&self) -> Result<Option<DonationStatus>, DonationError> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => s.parse().map(Some),
        }
    }

    /// Search term, blank terms ignored
    pub fn search(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    }
}

/// Pagination bounds taken from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageLimits {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

/// Filter applied by the store when listing donation requests
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DonationFilter {
    pub status: Option<DonationStatus>,
    pub requested_by: Option<Uuid>,
    pub search: Option<String>,
}

impl DonationFilter {
    /// Whether `request` passes every set criterion
    pub fn matches(&self, request: &DonationRequest) -> bool {
        if self.status.is_some_and(|s| s != request.status) {
            return false;
        }
        if self.requested_by.is_some_and(|u| u != request.requested_by) {
            return false;
        }
        match &self.search {
            Some(term) => {
                let term = term.to_lowercase();
                request.organ_name.to_lowercase().contains(&term)
                    || request.description.to_lowercase().contains(&term)
            }
            None => true,
        }
    }
}

/// A page request resolved to concrete numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

impl PageRequest {
    pub fn new(page: usize, limit: usize) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    /// Number of records to skip, saturating for absurd page numbers
    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Pagination metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    /// Current page number (starts at 1)
    pub page: usize,

    /// Number of items per page
    pub limit: usize,

    /// Total number of items (after filters)
    pub total: usize,

    /// Total number of pages
    pub pages: usize,
}

impl PaginationMeta {
    /// Create pagination metadata from calculation
    pub fn new(request: PageRequest, total: usize) -> Self {
        Self {
            page: request.page,
            limit: request.limit,
            total,
            pages: total.div_ceil(request.limit),
        }
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}
