use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;

use super::domain::{
    DonorPayload, HospitalPayload, InventoryPayload, NotificationPayload, RequestPayload,
};
use super::service::{
    DonationService, DonorRegistered, RecordCreated, RecordDeleted, StatusUpdated,
    StoreDiagnostics,
};
use super::store::{Document, DocumentStore};

pub const SERVICE_BANNER: &str = "Blood donation management service running";

/// Router builder exposing the donation endpoints.
pub fn donation_router<S>(service: Arc<DonationService<S>>) -> Router
where
    S: DocumentStore + 'static,
{
    Router::new()
        .route("/", get(root_endpoint))
        .route("/test", get(diagnostics_endpoint::<S>))
        .route(
            "/donors",
            post(register_donor_endpoint::<S>).get(list_donors_endpoint::<S>),
        )
        .route(
            "/hospitals",
            post(create_hospital_endpoint::<S>).get(list_hospitals_endpoint::<S>),
        )
        .route(
            "/inventory",
            post(add_inventory_endpoint::<S>).get(list_inventory_endpoint::<S>),
        )
        .route("/inventory/:inv_id", delete(remove_inventory_endpoint::<S>))
        .route(
            "/requests",
            post(create_request_endpoint::<S>).get(list_requests_endpoint::<S>),
        )
        .route(
            "/requests/:request_id/status",
            post(update_request_status_endpoint::<S>),
        )
        .route("/notify", post(record_notification_endpoint::<S>))
        .route("/notifications", get(list_notifications_endpoint::<S>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct DonorListQuery {
    #[serde(default)]
    blood_group: Option<String>,
    #[serde(default = "default_true")]
    eligible_only: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InventoryListQuery {
    #[serde(default)]
    hospital_id: Option<String>,
    #[serde(default)]
    include_expired: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RequestListQuery {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    donor_id: Option<String>,
    #[serde(default)]
    hospital_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NotificationListQuery {
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusUpdateBody {
    #[serde(default)]
    status: String,
}

fn default_true() -> bool {
    true
}

async fn root_endpoint() -> Json<serde_json::Value> {
    Json(json!({ "message": SERVICE_BANNER }))
}

async fn diagnostics_endpoint<S>(
    State(service): State<Arc<DonationService<S>>>,
) -> Json<StoreDiagnostics>
where
    S: DocumentStore + 'static,
{
    Json(service.diagnostics())
}

async fn register_donor_endpoint<S>(
    State(service): State<Arc<DonationService<S>>>,
    Json(payload): Json<DonorPayload>,
) -> Result<Json<DonorRegistered>, ApiError>
where
    S: DocumentStore + 'static,
{
    Ok(Json(service.register_donor(payload)?))
}

async fn list_donors_endpoint<S>(
    State(service): State<Arc<DonationService<S>>>,
    Query(query): Query<DonorListQuery>,
) -> Result<Json<Vec<Document>>, ApiError>
where
    S: DocumentStore + 'static,
{
    let donors = service.list_donors(query.blood_group.as_deref(), query.eligible_only)?;
    Ok(Json(donors))
}

async fn create_hospital_endpoint<S>(
    State(service): State<Arc<DonationService<S>>>,
    Json(payload): Json<HospitalPayload>,
) -> Result<Json<RecordCreated>, ApiError>
where
    S: DocumentStore + 'static,
{
    Ok(Json(service.create_hospital(payload)?))
}

async fn list_hospitals_endpoint<S>(
    State(service): State<Arc<DonationService<S>>>,
) -> Result<Json<Vec<Document>>, ApiError>
where
    S: DocumentStore + 'static,
{
    Ok(Json(service.list_hospitals()?))
}

async fn add_inventory_endpoint<S>(
    State(service): State<Arc<DonationService<S>>>,
    Json(payload): Json<InventoryPayload>,
) -> Result<Json<RecordCreated>, ApiError>
where
    S: DocumentStore + 'static,
{
    Ok(Json(service.add_inventory(payload)?))
}

async fn list_inventory_endpoint<S>(
    State(service): State<Arc<DonationService<S>>>,
    Query(query): Query<InventoryListQuery>,
) -> Result<Json<Vec<Document>>, ApiError>
where
    S: DocumentStore + 'static,
{
    let today = Local::now().date_naive();
    let items = service.list_inventory(
        query.hospital_id.as_deref(),
        query.include_expired,
        today,
    )?;
    Ok(Json(items))
}

async fn remove_inventory_endpoint<S>(
    State(service): State<Arc<DonationService<S>>>,
    Path(inv_id): Path<String>,
) -> Result<Json<RecordDeleted>, ApiError>
where
    S: DocumentStore + 'static,
{
    Ok(Json(service.remove_inventory(&inv_id)?))
}

async fn create_request_endpoint<S>(
    State(service): State<Arc<DonationService<S>>>,
    Json(payload): Json<RequestPayload>,
) -> Result<Json<RecordCreated>, ApiError>
where
    S: DocumentStore + 'static,
{
    Ok(Json(service.create_request(payload)?))
}

async fn list_requests_endpoint<S>(
    State(service): State<Arc<DonationService<S>>>,
    Query(query): Query<RequestListQuery>,
) -> Result<Json<Vec<Document>>, ApiError>
where
    S: DocumentStore + 'static,
{
    let requests = service.list_requests(
        query.status.as_deref(),
        query.donor_id.as_deref(),
        query.hospital_id.as_deref(),
    )?;
    Ok(Json(requests))
}

async fn update_request_status_endpoint<S>(
    State(service): State<Arc<DonationService<S>>>,
    Path(request_id): Path<String>,
    Json(body): Json<StatusUpdateBody>,
) -> Result<Json<StatusUpdated>, ApiError>
where
    S: DocumentStore + 'static,
{
    Ok(Json(service.update_request_status(&request_id, &body.status)?))
}

async fn record_notification_endpoint<S>(
    State(service): State<Arc<DonationService<S>>>,
    Json(payload): Json<NotificationPayload>,
) -> Result<Json<RecordCreated>, ApiError>
where
    S: DocumentStore + 'static,
{
    Ok(Json(service.record_notification(payload)?))
}

async fn list_notifications_endpoint<S>(
    State(service): State<Arc<DonationService<S>>>,
    Query(query): Query<NotificationListQuery>,
) -> Result<Json<Vec<Document>>, ApiError>
where
    S: DocumentStore + 'static,
{
    Ok(Json(service.list_notifications(query.limit)?))
}
