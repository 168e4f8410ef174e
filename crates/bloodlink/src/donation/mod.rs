//! Donation domain: entity records, payload validation, the eligibility
//! rule, the document-store gateway, and the HTTP-facing service.

pub mod domain;
pub mod eligibility;
pub mod router;
pub mod service;
pub mod store;
pub mod validate;

pub use domain::{
    BloodGroup, BloodRequest, Donor, DonorPayload, Hospital, HospitalPayload, InventoryItem,
    InventoryPayload, Notification, NotificationPayload, RequestPayload, RequestStatus,
};
pub use router::donation_router;
pub use service::{DonationService, StoreDiagnostics};
pub use store::{Document, DocumentId, DocumentStore, Filter, MalformedIdentifier, StoreError};
pub use validate::{FieldError, ValidationError};
