//! HTTP handlers for donation requests
//!
//! Handlers only translate between HTTP and the workflow engine; every rule
//! (validation, authorization, state) lives in the engine.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::catalog::{Category, Product};
use crate::core::donation::{DonationDraft, DonationRequest};
use crate::core::error::DonationError;
use crate::core::query::{ListParams, Page, PaginationMeta};
use crate::server::extractors::{Authenticated, parse_request_id};
use crate::server::host::ServerHost;

/// Success envelope shared by every endpoint
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

/// Category summary embedded in request views
#[derive(Debug, Clone, Serialize)]
pub struct CategoryDetails {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<Category> for CategoryDetails {
    fn from(category: Category) -> Self {
        Self {
            name: category.name,
            description: category.description,
        }
    }
}

/// A donation request as returned over HTTP
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRequestView {
    #[serde(flatten)]
    pub request: DonationRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_details: Option<CategoryDetails>,
}

impl DonationRequestView {
    fn new(request: DonationRequest, category: Option<Category>) -> Self {
        Self {
            request,
            category_details: category.map(CategoryDetails::from),
        }
    }
}

/// Paginated list payload
#[derive(Debug, Serialize)]
pub struct RequestList {
    pub requests: Vec<DonationRequestView>,
    pub pagination: PaginationMeta,
}

/// Approval payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalView {
    pub donation_request: DonationRequest,
    pub new_organ: Product,
}

/// Request body for approve
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveBody {
    pub admin_notes: Option<String>,
}

/// Request body for reject
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectBody {
    pub rejection_reason: Option<String>,
    pub admin_notes: Option<String>,
}

/// Decode an optional JSON body; an empty body yields the defaults
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, DonationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    Ok(serde_json::from_slice(body)?)
}

fn list_params(query: Result<Query<ListParams>, QueryRejection>) -> Result<ListParams, DonationError> {
    query
        .map(|Query(params)| params)
        .map_err(|e| DonationError::field("query", e.body_text()))
}

async fn list_view(
    host: &ServerHost,
    page: Page<DonationRequest>,
) -> Result<RequestList, DonationError> {
    let categories: HashMap<Uuid, Category> = host.workflow.categories_of(&page.items).await?;
    let page = page.map(|request| {
        let category = categories.get(&request.category).cloned();
        DonationRequestView::new(request, category)
    });

    Ok(RequestList {
        requests: page.items,
        pagination: page.pagination,
    })
}

/// Submit a donation request
///
/// POST /donation-request/create
pub async fn create_request(
    State(host): State<Arc<ServerHost>>,
    Authenticated(caller): Authenticated,
    body: Bytes,
) -> Response {
    let result = async {
        let draft: DonationDraft = parse_body(&body)?;
        host.workflow.create(&caller, draft).await
    }
    .await;

    match result {
        Ok(request) => (
            StatusCode::CREATED,
            Json(ApiResponse::ok("Donation request submitted successfully", request)),
        )
            .into_response(),
        Err(e) => host.error_response(e),
    }
}

/// List all donation requests (admin)
///
/// GET /donation-request/all?status=&page=&limit=&search=
pub async fn list_all_requests(
    State(host): State<Arc<ServerHost>>,
    Authenticated(caller): Authenticated,
    query: Result<Query<ListParams>, QueryRejection>,
) -> Response {
    let result = async {
        let params = list_params(query)?;
        let page = host.workflow.list_all(&caller, &params).await?;
        list_view(&host, page).await
    }
    .await;

    match result {
        Ok(list) => Json(ApiResponse::ok("Donation requests retrieved successfully", list))
            .into_response(),
        Err(e) => host.error_response(e),
    }
}

/// List the caller's own donation requests
///
/// GET /donation-request/my-requests?page=&limit=
pub async fn list_my_requests(
    State(host): State<Arc<ServerHost>>,
    Authenticated(caller): Authenticated,
    query: Result<Query<ListParams>, QueryRejection>,
) -> Response {
    let result = async {
        let params = list_params(query)?;
        let page = host.workflow.list_mine(&caller, &params).await?;
        list_view(&host, page).await
    }
    .await;

    match result {
        Ok(list) => Json(ApiResponse::ok("Donation requests retrieved successfully", list))
            .into_response(),
        Err(e) => host.error_response(e),
    }
}

/// Get a single donation request
///
/// GET /donation-request/{id}
pub async fn get_request(
    State(host): State<Arc<ServerHost>>,
    Authenticated(caller): Authenticated,
    Path(raw_id): Path<String>,
) -> Response {
    let result = async {
        let id = parse_request_id(&raw_id)?;
        let request = host.workflow.get(&caller, &id).await?;
        let category = host.workflow.category_of(&request).await?;
        Ok::<_, DonationError>(DonationRequestView::new(request, category))
    }
    .await;

    match result {
        Ok(view) => Json(ApiResponse::ok("Donation request retrieved successfully", view))
            .into_response(),
        Err(e) => host.error_response(e),
    }
}

/// Approve a pending donation request
///
/// PUT /donation-request/approve/{id}
pub async fn approve_request(
    State(host): State<Arc<ServerHost>>,
    Authenticated(caller): Authenticated,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Response {
    let result = async {
        let id = parse_request_id(&raw_id)?;
        let body: ApproveBody = parse_body(&body)?;
        host.workflow.approve(&caller, &id, body.admin_notes).await
    }
    .await;

    match result {
        Ok(outcome) => Json(ApiResponse::ok(
            "Donation request approved successfully",
            ApprovalView {
                donation_request: outcome.request,
                new_organ: outcome.product,
            },
        ))
        .into_response(),
        Err(e) => host.error_response(e),
    }
}

/// Reject a pending donation request
///
/// PUT /donation-request/reject/{id}
pub async fn reject_request(
    State(host): State<Arc<ServerHost>>,
    Authenticated(caller): Authenticated,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Response {
    let result = async {
        let id = parse_request_id(&raw_id)?;
        let body: RejectBody = parse_body(&body)?;
        host.workflow
            .reject(&caller, &id, body.rejection_reason, body.admin_notes)
            .await
    }
    .await;

    match result {
        Ok(request) => Json(ApiResponse::ok("Donation request rejected successfully", request))
            .into_response(),
        Err(e) => host.error_response(e),
    }
}
