//! In-memory stores for testing and development

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::core::catalog::{CatalogStore, Category, NewProduct, Product};
use crate::core::donation::{DonationRequest, Transition};
use crate::core::entity::sort_newest_first;
use crate::core::error::{DonationError, StorageError};
use crate::core::query::{DonationFilter, PageRequest};
use crate::core::service::DonationRequestStore;

fn poisoned(e: impl std::fmt::Display) -> DonationError {
    StorageError::Poisoned(e.to_string()).into()
}

/// In-memory donation request store
///
/// Uses a RwLock for thread-safe access. The duplicate-pending check and the
/// insert happen under the same write lock, and transitions are conditional
/// on the status seen under the lock, so both are race-free here.
#[derive(Clone, Default)]
pub struct InMemoryDonationStore {
    requests: Arc<RwLock<HashMap<Uuid, DonationRequest>>>,
}

impl InMemoryDonationStore {
    /// Create a new, empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored requests
    pub fn len(&self) -> usize {
        self.requests.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DonationRequestStore for InMemoryDonationStore {
    async fn insert(&self, request: DonationRequest) -> Result<DonationRequest, DonationError> {
        let mut requests = self.requests.write().map_err(poisoned)?;

        let duplicate = requests.values().any(|existing| {
            existing.is_pending()
                && existing.requested_by == request.requested_by
                && existing.organ_name == request.organ_name
        });
        if duplicate {
            return Err(DonationError::DuplicateRequest {
                organ_name: request.organ_name,
            });
        }

        requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn get(&self, id: &Uuid) -> Result<Option<DonationRequest>, DonationError> {
        let requests = self.requests.read().map_err(poisoned)?;
        Ok(requests.get(id).cloned())
    }

    async fn find_pending(
        &self,
        requested_by: &Uuid,
        organ_name: &str,
    ) -> Result<Option<DonationRequest>, DonationError> {
        let requests = self.requests.read().map_err(poisoned)?;
        Ok(requests
            .values()
            .find(|r| r.is_pending() && &r.requested_by == requested_by && r.organ_name == organ_name)
            .cloned())
    }

    async fn list(
        &self,
        filter: &DonationFilter,
        page: PageRequest,
    ) -> Result<(Vec<DonationRequest>, usize), DonationError> {
        let requests = self.requests.read().map_err(poisoned)?;

        let mut matching: Vec<DonationRequest> = requests
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        drop(requests);

        sort_newest_first(&mut matching);
        let total = matching.len();
        let items = matching
            .into_iter()
            .skip(page.offset())
            .take(page.limit)
            .collect();

        Ok((items, total))
    }

    async fn transition(
        &self,
        id: &Uuid,
        transition: &Transition,
    ) -> Result<DonationRequest, DonationError> {
        let mut requests = self.requests.write().map_err(poisoned)?;

        let request = requests
            .get_mut(id)
            .ok_or_else(|| DonationError::request_not_found(id))?;
        request.apply(transition)?;

        Ok(request.clone())
    }
}

/// In-memory catalog
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    categories: Arc<RwLock<HashMap<Uuid, Category>>>,
    products: Arc<RwLock<HashMap<Uuid, Product>>>,
}

impl InMemoryCatalog {
    /// Create a new, empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog pre-populated with categories
    pub fn with_categories(categories: impl IntoIterator<Item = Category>) -> Self {
        let catalog = Self::new();
        for category in categories {
            catalog.add_category(category);
        }
        catalog
    }

    /// Add (or replace) a category
    pub fn add_category(&self, category: Category) {
        if let Ok(mut categories) = self.categories.write() {
            categories.insert(category.id, category);
        }
    }

    /// All products currently listed
    pub fn products(&self) -> Vec<Product> {
        self.products
            .read()
            .map(|p| p.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn find_category(&self, id: &Uuid) -> Result<Option<Category>, DonationError> {
        let categories = self.categories.read().map_err(poisoned)?;
        Ok(categories.get(id).cloned())
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, DonationError> {
        let mut products = self.products.write().map_err(poisoned)?;

        if let Some(donation) = product.donation_request_id {
            let existing = products
                .values()
                .find(|p| p.donation_request_id == Some(donation));
            if let Some(existing) = existing {
                return Ok(existing.clone());
            }
        }

        let product = product.into_product();
        products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn delete_product(&self, id: &Uuid) -> Result<(), DonationError> {
        let mut products = self.products.write().map_err(poisoned)?;
        products.remove(id);
        Ok(())
    }

    async fn find_product_by_donation(
        &self,
        donation_request_id: &Uuid,
    ) -> Result<Option<Product>, DonationError> {
        let products = self.products.read().map_err(poisoned)?;
        Ok(products
            .values()
            .find(|p| p.donation_request_id.as_ref() == Some(donation_request_id))
            .cloned())
    }
}
