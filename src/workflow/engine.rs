//! The donation request workflow engine

use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::auth::{AuthPolicy, Identity};
use crate::core::catalog::{CatalogStore, Category, NewProduct, Product};
use crate::core::donation::{DonationDraft, DonationRequest, DonationStatus, Transition};
use crate::core::error::DonationError;
use crate::core::query::{DonationFilter, ListParams, Page, PageLimits, PageRequest, PaginationMeta};
use crate::core::service::DonationRequestStore;
use crate::core::validation::{validate_admin_notes, validate_draft, validate_rejection_reason};

/// Result of a successful approval
#[derive(Debug, Clone)]
pub struct ApprovalOutcome {
    pub request: DonationRequest,
    pub product: Product,
}

/// Drives donation requests from submission to a terminal decision
///
/// Authorization is checked here rather than in the transport layer, so every
/// caller of the engine gets the same rules:
/// - any authenticated requester may submit and list their own requests
/// - the owner or an admin may read a single request
/// - only admins may list everything, approve, or reject
#[derive(Clone)]
pub struct DonationWorkflow {
    store: Arc<dyn DonationRequestStore>,
    catalog: Arc<dyn CatalogStore>,
    limits: PageLimits,
}

impl DonationWorkflow {
    pub fn new(store: Arc<dyn DonationRequestStore>, catalog: Arc<dyn CatalogStore>) -> Self {
        Self {
            store,
            catalog,
            limits: PageLimits::default(),
        }
    }

    /// Override the pagination bounds
    pub fn with_limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> PageLimits {
        self.limits
    }

    /// Submit a new donation request on behalf of `requester`
    #[tracing::instrument(skip(self, draft), fields(requester = %requester.id))]
    pub async fn create(
        &self,
        requester: &Identity,
        draft: DonationDraft,
    ) -> Result<DonationRequest, DonationError> {
        AuthPolicy::Authenticated.enforce(requester)?;
        let new = validate_draft(draft)?;

        if self.catalog.find_category(&new.category).await?.is_none() {
            return Err(DonationError::field("category", "Invalid category selected"));
        }

        if self
            .store
            .find_pending(&requester.id, &new.organ_name)
            .await?
            .is_some()
        {
            tracing::debug!(organ = %new.organ_name, "duplicate pending request");
            return Err(DonationError::DuplicateRequest {
                organ_name: new.organ_name,
            });
        }

        // The store re-checks under its own guarantee; the lookup above only
        // gives the common case a cheap early exit.
        let created = self
            .store
            .insert(DonationRequest::pending(new, requester.id))
            .await?;

        tracing::info!(id = %created.id, organ = %created.organ_name, "donation request submitted");
        Ok(created)
    }

    /// List every request (admin only), filtered and paginated
    #[tracing::instrument(skip(self, params), fields(caller = %caller.id))]
    pub async fn list_all(
        &self,
        caller: &Identity,
        params: &ListParams,
    ) -> Result<Page<DonationRequest>, DonationError> {
        AuthPolicy::AdminOnly.enforce(caller)?;

        let filter = DonationFilter {
            status: params.status()?,
            requested_by: None,
            search: params.search(),
        };
        self.list(&filter, params).await
    }

    /// List the caller's own requests, newest first
    #[tracing::instrument(skip(self, params), fields(caller = %caller.id))]
    pub async fn list_mine(
        &self,
        caller: &Identity,
        params: &ListParams,
    ) -> Result<Page<DonationRequest>, DonationError> {
        AuthPolicy::Authenticated.enforce(caller)?;

        let filter = DonationFilter {
            requested_by: Some(caller.id),
            ..DonationFilter::default()
        };
        self.list(&filter, params).await
    }

    async fn list(
        &self,
        filter: &DonationFilter,
        params: &ListParams,
    ) -> Result<Page<DonationRequest>, DonationError> {
        let page = PageRequest::new(params.page(), params.limit(&self.limits));
        let (items, total) = self.store.list(filter, page).await?;

        Ok(Page {
            items,
            pagination: PaginationMeta::new(page, total),
        })
    }

    /// Fetch a single request visible to `caller`
    #[tracing::instrument(skip(self), fields(caller = %caller.id))]
    pub async fn get(&self, caller: &Identity, id: &Uuid) -> Result<DonationRequest, DonationError> {
        let request = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| DonationError::request_not_found(id))?;

        AuthPolicy::OwnerOrAdmin(request.requested_by).enforce(caller)?;
        Ok(request)
    }

    /// Approve a pending request and list it in the catalog
    ///
    /// The catalog entry is created before the status flips, so a failure in
    /// between leaves the request pending and safe to retry; the catalog
    /// hands back the same entry on the retry. If the transition fails, the
    /// entry is removed again unless a concurrent approval won, in which case
    /// the entry belongs to that approval.
    #[tracing::instrument(skip(self, admin_notes), fields(admin = %admin.id))]
    pub async fn approve(
        &self,
        admin: &Identity,
        id: &Uuid,
        admin_notes: Option<String>,
    ) -> Result<ApprovalOutcome, DonationError> {
        AuthPolicy::AdminOnly.enforce(admin)?;
        let admin_notes = validate_admin_notes(admin_notes)?;

        let current = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| DonationError::request_not_found(id))?;
        if !current.is_pending() {
            tracing::warn!(status = %current.status, "approve on a decided request");
            return Err(DonationError::InvalidState {
                id: *id,
                status: current.status,
                operation: "approved".to_string(),
            });
        }

        let product = self
            .catalog
            .create_product(NewProduct::from_donation(&current))
            .await?;

        match self
            .store
            .transition(id, &Transition::approve(admin.id, admin_notes))
            .await
        {
            Ok(request) => {
                tracing::info!(product = %product.id, "donation request approved");
                Ok(ApprovalOutcome { request, product })
            }
            Err(e) => {
                self.compensate_approval(id, &product).await;
                Err(e)
            }
        }
    }

    async fn compensate_approval(&self, id: &Uuid, product: &Product) {
        let approved_elsewhere = matches!(
            self.store.get(id).await,
            Ok(Some(ref request)) if request.status == DonationStatus::Approved
        );
        if approved_elsewhere {
            tracing::debug!(product = %product.id, "concurrent approval owns the catalog entry");
            return;
        }

        match self.catalog.delete_product(&product.id).await {
            Ok(()) => tracing::warn!(product = %product.id, "approval failed, catalog entry removed"),
            Err(e) => tracing::error!(
                product = %product.id,
                error = %e,
                "approval failed and the catalog entry could not be removed"
            ),
        }
    }

    /// Reject a pending request
    #[tracing::instrument(skip(self, reason, admin_notes), fields(admin = %admin.id))]
    pub async fn reject(
        &self,
        admin: &Identity,
        id: &Uuid,
        reason: Option<String>,
        admin_notes: Option<String>,
    ) -> Result<DonationRequest, DonationError> {
        AuthPolicy::AdminOnly.enforce(admin)?;
        let reason = validate_rejection_reason(reason)?;
        let admin_notes = validate_admin_notes(admin_notes)?;

        let request = self
            .store
            .transition(id, &Transition::reject(admin.id, reason, admin_notes))
            .await
            .inspect_err(|e| {
                if matches!(e, DonationError::InvalidState { .. }) {
                    tracing::warn!("reject on a decided request");
                }
            })?;

        tracing::info!("donation request rejected");
        Ok(request)
    }

    /// Resolve the category of a single request, if it still exists
    pub async fn category_of(
        &self,
        request: &DonationRequest,
    ) -> Result<Option<Category>, DonationError> {
        self.catalog.find_category(&request.category).await
    }

    /// Resolve the categories referenced by a batch of requests
    pub async fn categories_of(
        &self,
        requests: &[DonationRequest],
    ) -> Result<HashMap<Uuid, Category>, DonationError> {
        let mut categories = HashMap::new();
        for request in requests {
            if categories.contains_key(&request.category) {
                continue;
            }
            if let Some(category) = self.catalog.find_category(&request.category).await? {
                categories.insert(category.id, category);
            }
        }
        Ok(categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryCatalog, InMemoryDonationStore};
    use async_trait::async_trait;

    fn category() -> Category {
        Category {
            id: Uuid::new_v4(),
            name: "Kidney".to_string(),
            description: None,
        }
    }

    fn draft(category: Uuid, organ: &str) -> DonationDraft {
        DonationDraft {
            organ_name: Some(organ.to_string()),
            category: Some(category.to_string()),
            images: Some(vec!["img1.png".to_string()]),
            pin_code: Some(serde_json::json!(560001)),
            description: Some("Healthy kidney donor, tested".to_string()),
            quantity: None,
        }
    }

    fn setup() -> (DonationWorkflow, InMemoryCatalog, Category) {
        let cat = category();
        let catalog = InMemoryCatalog::with_categories([cat.clone()]);
        let workflow = DonationWorkflow::new(
            Arc::new(InMemoryDonationStore::new()),
            Arc::new(catalog.clone()),
        );
        (workflow, catalog, cat)
    }

    #[tokio::test]
    async fn test_create_unknown_category() {
        let (workflow, _, _) = setup();
        let err = workflow
            .create(&Identity::user(Uuid::new_v4()), draft(Uuid::new_v4(), "Kidney"))
            .await
            .unwrap_err();

        match err {
            DonationError::Validation(v) => assert!(v.has_field("category")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_approve_reuses_existing_entry() {
        let (workflow, catalog, cat) = setup();
        let user = Identity::user(Uuid::new_v4());
        let admin = Identity::admin(Uuid::new_v4());
        let created = workflow.create(&user, draft(cat.id, "Kidney")).await.unwrap();

        // Simulate a crash after listing but before the status flip
        let earlier = catalog
            .create_product(NewProduct::from_donation(&created))
            .await
            .unwrap();

        let outcome = workflow.approve(&admin, &created.id, None).await.unwrap();
        assert_eq!(outcome.product.id, earlier.id);
        assert_eq!(catalog.products().len(), 1);
    }

    /// Store whose transitions always lose the race
    struct RacingStore(InMemoryDonationStore);

    #[async_trait]
    impl DonationRequestStore for RacingStore {
        async fn insert(&self, r: DonationRequest) -> Result<DonationRequest, DonationError> {
            self.0.insert(r).await
        }
        async fn get(&self, id: &Uuid) -> Result<Option<DonationRequest>, DonationError> {
            self.0.get(id).await
        }
        async fn find_pending(
            &self,
            requested_by: &Uuid,
            organ_name: &str,
        ) -> Result<Option<DonationRequest>, DonationError> {
            self.0.find_pending(requested_by, organ_name).await
        }
        async fn list(
            &self,
            filter: &DonationFilter,
            page: PageRequest,
        ) -> Result<(Vec<DonationRequest>, usize), DonationError> {
            self.0.list(filter, page).await
        }
        async fn transition(
            &self,
            id: &Uuid,
            _transition: &Transition,
        ) -> Result<DonationRequest, DonationError> {
            Err(DonationError::InvalidState {
                id: *id,
                status: DonationStatus::Rejected,
                operation: "approved".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_lost_race_removes_catalog_entry() {
        let cat = category();
        let catalog = InMemoryCatalog::with_categories([cat.clone()]);
        let workflow = DonationWorkflow::new(
            Arc::new(RacingStore(InMemoryDonationStore::new())),
            Arc::new(catalog.clone()),
        );
        let user = Identity::user(Uuid::new_v4());
        let created = workflow.create(&user, draft(cat.id, "Kidney")).await.unwrap();

        let err = workflow
            .approve(&Identity::admin(Uuid::new_v4()), &created.id, None)
            .await
            .unwrap_err();

        assert!(matches!(err, DonationError::InvalidState { .. }));
        assert!(catalog.products().is_empty());
    }

    #[tokio::test]
    async fn test_reject_checks_role_before_reason() {
        let (workflow, _, _) = setup();
        let err = workflow
            .reject(&Identity::user(Uuid::new_v4()), &Uuid::new_v4(), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DonationError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_categories_of_deduplicates() {
        let (workflow, _, cat) = setup();
        let user = Identity::user(Uuid::new_v4());
        let a = workflow.create(&user, draft(cat.id, "Kidney")).await.unwrap();
        let b = workflow.create(&user, draft(cat.id, "Liver")).await.unwrap();

        let categories = workflow.categories_of(&[a, b]).await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[&cat.id].name, "Kidney");
    }
}
