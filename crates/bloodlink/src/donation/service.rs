//! Service facade composing validation, the eligibility rule, the store
//! gateway, and notification recording. One method per endpoint.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::error::ApiError;

use super::domain::{
    DonorPayload, HospitalPayload, InventoryPayload, Notification, NotificationPayload,
    RequestPayload, RequestStatus,
};
use super::eligibility;
use super::store::{self, Document, DocumentId, DocumentStore, Filter};
use super::validate::{
    validate_donor, validate_hospital, validate_inventory, validate_notification,
    validate_request, ValidationError,
};

const DONORS: &str = "donor";
const HOSPITALS: &str = "hospital";
const INVENTORY: &str = "inventory";
const REQUESTS: &str = "request";
const NOTIFICATIONS: &str = "notification";

const DEFAULT_NOTIFICATION_LIMIT: usize = 50;

#[derive(Debug, Clone, Serialize)]
pub struct DonorRegistered {
    pub id: String,
    pub eligible: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordCreated {
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordDeleted {
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdated {
    pub status: &'static str,
}

/// Connectivity report for the diagnostics endpoint. Construction never
/// fails; store errors degrade into the `database` field.
#[derive(Debug, Clone, Serialize)]
pub struct StoreDiagnostics {
    pub backend: String,
    pub database: String,
    pub connection_status: String,
    pub collections: Vec<String>,
}

pub struct DonationService<S> {
    store: Arc<S>,
}

impl<S> DonationService<S>
where
    S: DocumentStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Validate, derive eligibility, persist, and record a registration
    /// notification addressed to the donor.
    pub fn register_donor(&self, payload: DonorPayload) -> Result<DonorRegistered, ApiError> {
        let mut donor = validate_donor(payload)?;
        donor.eligible = eligibility::eligible(donor.age, donor.health_ok);

        let id = store::create(self.store.as_ref(), DONORS, &donor)?;

        let notification = Notification {
            to_email: Some(donor.email.clone()),
            to_phone: None,
            subject: "Registration Successful".to_string(),
            message: format!(
                "Hello {}, your donor profile has been registered.",
                donor.name
            ),
            meta: None,
        };
        store::create(self.store.as_ref(), NOTIFICATIONS, &notification)?;

        info!(donor_id = %id, eligible = donor.eligible, "donor registered");
        Ok(DonorRegistered {
            id: id.to_string(),
            eligible: donor.eligible,
        })
    }

    pub fn list_donors(
        &self,
        blood_group: Option<&str>,
        eligible_only: bool,
    ) -> Result<Vec<Document>, ApiError> {
        let mut filter = Filter::new();
        if let Some(group) = blood_group {
            filter = filter.equals("blood_group", group);
        }
        if eligible_only {
            filter = filter.equals("eligible", true);
        }
        Ok(store::list(self.store.as_ref(), DONORS, &filter, None)?)
    }

    pub fn create_hospital(&self, payload: HospitalPayload) -> Result<RecordCreated, ApiError> {
        let hospital = validate_hospital(payload)?;
        let id = store::create(self.store.as_ref(), HOSPITALS, &hospital)?;
        info!(hospital_id = %id, "hospital created");
        Ok(RecordCreated { id: id.to_string() })
    }

    pub fn list_hospitals(&self) -> Result<Vec<Document>, ApiError> {
        Ok(store::list(
            self.store.as_ref(),
            HOSPITALS,
            &Filter::new(),
            None,
        )?)
    }

    /// Persist a batch after confirming the owning hospital exists. The
    /// reference stays a weak string and is never re-checked on read.
    pub fn add_inventory(&self, payload: InventoryPayload) -> Result<RecordCreated, ApiError> {
        let item = validate_inventory(payload)?;

        let hospital_id = DocumentId::parse(&item.hospital_id)?;
        if self.store.find_one(HOSPITALS, &hospital_id)?.is_none() {
            return Err(ApiError::not_found("Hospital"));
        }

        let id = store::create(self.store.as_ref(), INVENTORY, &item)?;
        Ok(RecordCreated { id: id.to_string() })
    }

    pub fn list_inventory(
        &self,
        hospital_id: Option<&str>,
        include_expired: bool,
        today: NaiveDate,
    ) -> Result<Vec<Document>, ApiError> {
        let mut filter = Filter::new();
        if let Some(hospital) = hospital_id {
            filter = filter.equals("hospital_id", hospital);
        }
        if !include_expired {
            filter = filter.at_least("expiry_date", today.to_string());
        }
        Ok(store::list(self.store.as_ref(), INVENTORY, &filter, None)?)
    }

    pub fn remove_inventory(&self, raw_id: &str) -> Result<RecordDeleted, ApiError> {
        let id = DocumentId::parse(raw_id)?;
        let deleted = self.store.delete_one(INVENTORY, &id)?;
        if deleted == 0 {
            return Err(ApiError::not_found("Inventory record"));
        }
        Ok(RecordDeleted { status: "deleted" })
    }

    /// Persist a request after confirming both referenced parties exist,
    /// then record a notification telling the donor what was asked.
    pub fn create_request(&self, payload: RequestPayload) -> Result<RecordCreated, ApiError> {
        let request = validate_request(payload)?;

        let donor_id = DocumentId::parse(&request.donor_id)?;
        let donor = self
            .store
            .find_one(DONORS, &donor_id)?
            .ok_or(ApiError::not_found("Donor"))?;
        let hospital_id = DocumentId::parse(&request.hospital_id)?;
        let hospital = self
            .store
            .find_one(HOSPITALS, &hospital_id)?
            .ok_or(ApiError::not_found("Hospital"))?;

        let id = store::create(self.store.as_ref(), REQUESTS, &request)?;

        let mut meta = BTreeMap::new();
        meta.insert("request_id".to_string(), Value::String(id.to_string()));
        let notification = Notification {
            to_email: text_field(&donor, "email"),
            to_phone: None,
            subject: "Blood Request".to_string(),
            message: format!(
                "{} requested {} unit(s) of {}.",
                text_field(&hospital, "name").unwrap_or_default(),
                request.units,
                request.blood_group
            ),
            meta: Some(meta),
        };
        store::create(self.store.as_ref(), NOTIFICATIONS, &notification)?;

        info!(request_id = %id, units = request.units, "blood request created");
        Ok(RecordCreated { id: id.to_string() })
    }

    pub fn list_requests(
        &self,
        status: Option<&str>,
        donor_id: Option<&str>,
        hospital_id: Option<&str>,
    ) -> Result<Vec<Document>, ApiError> {
        let mut filter = Filter::new();
        if let Some(status) = status {
            filter = filter.equals("status", status);
        }
        if let Some(donor) = donor_id {
            filter = filter.equals("donor_id", donor);
        }
        if let Some(hospital) = hospital_id {
            filter = filter.equals("hospital_id", hospital);
        }
        Ok(store::list(self.store.as_ref(), REQUESTS, &filter, None)?)
    }

    /// Move a pending request to approved or declined, stamp the update
    /// time, and record a notification for the owning hospital. A failed
    /// hospital lookup leaves the notification unaddressed rather than
    /// failing the transition.
    pub fn update_request_status(
        &self,
        raw_id: &str,
        raw_status: &str,
    ) -> Result<StatusUpdated, ApiError> {
        let status = match RequestStatus::parse(raw_status) {
            Some(status @ (RequestStatus::Approved | RequestStatus::Declined)) => status,
            _ => {
                return Err(ApiError::Validation(ValidationError::single(
                    "status",
                    "must be 'approved' or 'declined'",
                )))
            }
        };

        let request_id = DocumentId::parse(raw_id)?;
        let mut changes = Document::new();
        changes.insert(
            "status".to_string(),
            Value::String(status.label().to_string()),
        );
        changes.insert(
            "updated_at".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
        let matched = self.store.update_one(REQUESTS, &request_id, changes)?;
        if matched == 0 {
            return Err(ApiError::not_found("Request"));
        }

        let hospital = match self.store.find_one(REQUESTS, &request_id)? {
            Some(request) => {
                let raw = text_field(&request, "hospital_id").unwrap_or_default();
                match DocumentId::parse(&raw) {
                    Ok(hospital_id) => self.store.find_one(HOSPITALS, &hospital_id)?,
                    Err(_) => None,
                }
            }
            None => None,
        };

        let notification = Notification {
            to_email: hospital.as_ref().and_then(|doc| text_field(doc, "email")),
            to_phone: None,
            subject: format!("Request {}", status.label()),
            message: format!(
                "Request {} has been {} by the donor.",
                request_id,
                status.label()
            ),
            meta: None,
        };
        store::create(self.store.as_ref(), NOTIFICATIONS, &notification)?;

        info!(request_id = %request_id, status = status.label(), "request status updated");
        Ok(StatusUpdated {
            status: status.label(),
        })
    }

    /// Persist a notification record verbatim. No delivery happens here or
    /// anywhere else.
    pub fn record_notification(
        &self,
        payload: NotificationPayload,
    ) -> Result<RecordCreated, ApiError> {
        let notification = validate_notification(payload)?;
        let id = store::create(self.store.as_ref(), NOTIFICATIONS, &notification)?;
        Ok(RecordCreated { id: id.to_string() })
    }

    pub fn list_notifications(&self, limit: Option<usize>) -> Result<Vec<Document>, ApiError> {
        let limit = limit.unwrap_or(DEFAULT_NOTIFICATION_LIMIT);
        Ok(store::list(
            self.store.as_ref(),
            NOTIFICATIONS,
            &Filter::new(),
            Some(limit),
        )?)
    }

    pub fn diagnostics(&self) -> StoreDiagnostics {
        let mut report = StoreDiagnostics {
            backend: "running".to_string(),
            database: "not available".to_string(),
            connection_status: "not connected".to_string(),
            collections: Vec::new(),
        };

        match self.store.collection_names() {
            Ok(mut names) => {
                names.truncate(10);
                report.database = "connected".to_string();
                report.connection_status = "connected".to_string();
                report.collections = names;
            }
            Err(err) => {
                let detail: String = err.to_string().chars().take(50).collect();
                report.database = format!("error: {detail}");
            }
        }

        report
    }
}

fn text_field(document: &Document, field: &str) -> Option<String> {
    document
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
}
