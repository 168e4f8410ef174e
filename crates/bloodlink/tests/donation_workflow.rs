//! Scenarios for the donation lifecycle driven through the service facade:
//! registration and eligibility, inventory intake and expiry filtering,
//! request creation with reference checks, status transitions, and the
//! notification trail each step leaves behind.

mod common {
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    use serde_json::Value;

    use bloodlink::donation::domain::{
        DonorPayload, HospitalPayload, InventoryPayload, RequestPayload,
    };
    use bloodlink::donation::store::{
        Document, DocumentId, DocumentStore, Filter, StoreError, ID_FIELD,
    };
    use bloodlink::donation::DonationService;

    #[derive(Default, Clone)]
    pub(super) struct MemoryStore {
        collections: Arc<Mutex<BTreeMap<String, Vec<Document>>>>,
    }

    fn holds_id(document: &Document, id: &DocumentId) -> bool {
        document
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .is_some_and(|raw| raw == id.to_string())
    }

    impl DocumentStore for MemoryStore {
        fn insert(
            &self,
            collection: &str,
            mut document: Document,
        ) -> Result<DocumentId, StoreError> {
            let id = DocumentId::generate();
            document.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
            let mut guard = self.collections.lock().expect("store mutex poisoned");
            guard.entry(collection.to_string()).or_default().push(document);
            Ok(id)
        }

        fn find(
            &self,
            collection: &str,
            filter: &Filter,
            limit: Option<usize>,
        ) -> Result<Vec<Document>, StoreError> {
            let guard = self.collections.lock().expect("store mutex poisoned");
            let mut matches: Vec<Document> = guard
                .get(collection)
                .map(|documents| {
                    documents
                        .iter()
                        .filter(|document| filter.matches(document))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            if let Some(limit) = limit {
                matches.truncate(limit);
            }
            Ok(matches)
        }

        fn find_one(
            &self,
            collection: &str,
            id: &DocumentId,
        ) -> Result<Option<Document>, StoreError> {
            let guard = self.collections.lock().expect("store mutex poisoned");
            Ok(guard.get(collection).and_then(|documents| {
                documents
                    .iter()
                    .find(|document| holds_id(document, id))
                    .cloned()
            }))
        }

        fn update_one(
            &self,
            collection: &str,
            id: &DocumentId,
            changes: Document,
        ) -> Result<u64, StoreError> {
            let mut guard = self.collections.lock().expect("store mutex poisoned");
            let Some(documents) = guard.get_mut(collection) else {
                return Ok(0);
            };
            match documents.iter_mut().find(|document| holds_id(document, id)) {
                Some(document) => {
                    for (field, value) in changes {
                        document.insert(field, value);
                    }
                    Ok(1)
                }
                None => Ok(0),
            }
        }

        fn delete_one(&self, collection: &str, id: &DocumentId) -> Result<u64, StoreError> {
            let mut guard = self.collections.lock().expect("store mutex poisoned");
            let Some(documents) = guard.get_mut(collection) else {
                return Ok(0);
            };
            match documents.iter().position(|document| holds_id(document, id)) {
                Some(index) => {
                    documents.remove(index);
                    Ok(1)
                }
                None => Ok(0),
            }
        }

        fn collection_names(&self) -> Result<Vec<String>, StoreError> {
            let guard = self.collections.lock().expect("store mutex poisoned");
            Ok(guard.keys().cloned().collect())
        }
    }

    /// Store whose every operation fails, for degraded-path checks.
    pub(super) struct UnreachableStore;

    impl DocumentStore for UnreachableStore {
        fn insert(&self, _: &str, _: Document) -> Result<DocumentId, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        fn find(
            &self,
            _: &str,
            _: &Filter,
            _: Option<usize>,
        ) -> Result<Vec<Document>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        fn find_one(&self, _: &str, _: &DocumentId) -> Result<Option<Document>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        fn update_one(&self, _: &str, _: &DocumentId, _: Document) -> Result<u64, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        fn delete_one(&self, _: &str, _: &DocumentId) -> Result<u64, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        fn collection_names(&self) -> Result<Vec<String>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    pub(super) fn service() -> (DonationService<MemoryStore>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        (DonationService::new(store.clone()), store)
    }

    pub(super) fn donor_payload() -> DonorPayload {
        DonorPayload {
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            phone: "1".to_string(),
            age: Some(30),
            blood_group: "O+".to_string(),
            health_ok: Some(true),
            city: None,
        }
    }

    pub(super) fn hospital_payload() -> HospitalPayload {
        HospitalPayload {
            name: "Mercy General".to_string(),
            email: "bank@mercy.example.com".to_string(),
            phone: "555-0100".to_string(),
            city: Some("Des Moines".to_string()),
        }
    }

    pub(super) fn inventory_payload(hospital_id: &str, expiry_date: &str) -> InventoryPayload {
        InventoryPayload {
            hospital_id: hospital_id.to_string(),
            blood_group: "O+".to_string(),
            units: Some(4),
            expiry_date: expiry_date.to_string(),
        }
    }

    pub(super) fn request_payload(donor_id: &str, hospital_id: &str) -> RequestPayload {
        RequestPayload {
            hospital_id: hospital_id.to_string(),
            donor_id: donor_id.to_string(),
            blood_group: "O+".to_string(),
            units: Some(2),
            status: None,
        }
    }

    pub(super) const UNKNOWN_ID: &str = "00000000-0000-0000-0000-000000000000";
}

use bloodlink::donation::domain::DonorPayload;
use bloodlink::donation::DonationService;
use bloodlink::donation::store::{DocumentId, DocumentStore};
use bloodlink::error::ApiError;
use chrono::NaiveDate;
use common::*;
use serde_json::Value;
use std::sync::Arc;

fn text<'a>(document: &'a serde_json::Map<String, Value>, field: &str) -> Option<&'a str> {
    document.get(field).and_then(Value::as_str)
}

#[test]
fn registering_a_donor_stores_eligibility_and_a_notification() {
    let (service, _) = service();

    let outcome = service
        .register_donor(donor_payload())
        .expect("registration succeeds");
    assert!(outcome.eligible);
    assert!(!outcome.id.is_empty());

    let notifications = service
        .list_notifications(None)
        .expect("notifications list");
    assert_eq!(notifications.len(), 1);
    assert_eq!(text(&notifications[0], "subject"), Some("Registration Successful"));
    assert_eq!(text(&notifications[0], "to_email"), Some("a@x.com"));
}

#[test]
fn out_of_range_age_is_rejected_before_anything_persists() {
    let (service, _) = service();

    let payload = DonorPayload {
        age: Some(17),
        ..donor_payload()
    };
    let error = service.register_donor(payload).expect_err("rejected");
    assert!(matches!(error, ApiError::Validation(_)));

    let donors = service.list_donors(None, false).expect("donor list");
    assert!(donors.is_empty());
    let notifications = service.list_notifications(None).expect("list");
    assert!(notifications.is_empty());
}

#[test]
fn unhealthy_donors_register_as_ineligible() {
    let (service, _) = service();

    let payload = DonorPayload {
        health_ok: Some(false),
        ..donor_payload()
    };
    let outcome = service.register_donor(payload).expect("registers");
    assert!(!outcome.eligible);

    let eligible = service.list_donors(None, true).expect("filtered list");
    assert!(eligible.is_empty(), "eligible_only hides ineligible donors");

    let all = service.list_donors(None, false).expect("unfiltered list");
    assert_eq!(all.len(), 1);
    assert_eq!(text(&all[0], "name"), Some("A"));
    assert!(all[0].contains_key("id"), "identifier is exposed as id");
    assert!(!all[0].contains_key("_id"));
}

#[test]
fn donor_listing_filters_by_blood_group() {
    let (service, _) = service();

    service.register_donor(donor_payload()).expect("registers");
    let payload = DonorPayload {
        name: "B".to_string(),
        email: "b@x.com".to_string(),
        blood_group: "AB-".to_string(),
        ..donor_payload()
    };
    service.register_donor(payload).expect("registers");

    let matches = service.list_donors(Some("AB-"), true).expect("list");
    assert_eq!(matches.len(), 1);
    assert_eq!(text(&matches[0], "name"), Some("B"));

    let none = service.list_donors(Some("B+"), true).expect("list");
    assert!(none.is_empty());
}

#[test]
fn inventory_requires_an_existing_hospital() {
    let (service, _) = service();

    let error = service
        .add_inventory(inventory_payload(UNKNOWN_ID, "2030-01-01"))
        .expect_err("unknown hospital");
    assert!(matches!(error, ApiError::NotFound { .. }));

    let error = service
        .add_inventory(inventory_payload("not-an-identifier", "2030-01-01"))
        .expect_err("malformed hospital id");
    assert!(matches!(error, ApiError::MalformedId(_)));

    let items = service
        .list_inventory(None, true, NaiveDate::from_ymd_opt(2030, 1, 1).expect("date"))
        .expect("list");
    assert!(items.is_empty(), "nothing persisted on failure");
}

#[test]
fn inventory_listing_hides_expired_batches_by_default() {
    let (service, _) = service();
    let today = NaiveDate::from_ymd_opt(2026, 8, 7).expect("date");

    let hospital = service.create_hospital(hospital_payload()).expect("creates");
    service
        .add_inventory(inventory_payload(&hospital.id, "2026-08-06"))
        .expect("stale batch stores fine");
    service
        .add_inventory(inventory_payload(&hospital.id, "2026-08-07"))
        .expect("expiring today");
    service
        .add_inventory(inventory_payload(&hospital.id, "2026-12-01"))
        .expect("fresh batch");

    let current = service
        .list_inventory(Some(&hospital.id), false, today)
        .expect("list");
    let expiries: Vec<_> = current
        .iter()
        .filter_map(|item| text(item, "expiry_date"))
        .collect();
    assert_eq!(expiries, vec!["2026-08-07", "2026-12-01"]);

    let everything = service
        .list_inventory(Some(&hospital.id), true, today)
        .expect("list");
    assert_eq!(everything.len(), 3);
}

#[test]
fn deleting_inventory_removes_the_batch_exactly_once() {
    let (service, _) = service();
    let today = NaiveDate::from_ymd_opt(2026, 8, 7).expect("date");

    let hospital = service.create_hospital(hospital_payload()).expect("creates");
    let batch = service
        .add_inventory(inventory_payload(&hospital.id, "2026-12-01"))
        .expect("stores");

    let ack = service.remove_inventory(&batch.id).expect("deletes");
    assert_eq!(ack.status, "deleted");
    assert!(service
        .list_inventory(None, true, today)
        .expect("list")
        .is_empty());

    let error = service.remove_inventory(&batch.id).expect_err("gone");
    assert!(matches!(error, ApiError::NotFound { .. }));

    let error = service.remove_inventory("@@@").expect_err("malformed");
    assert!(matches!(error, ApiError::MalformedId(_)));
}

#[test]
fn requests_demand_both_references_and_leave_no_trace_on_failure() {
    let (service, _) = service();

    let hospital = service.create_hospital(hospital_payload()).expect("creates");
    let notifications_before = service.list_notifications(None).expect("list").len();

    let error = service
        .create_request(request_payload(UNKNOWN_ID, &hospital.id))
        .expect_err("unknown donor");
    assert!(matches!(error, ApiError::NotFound { what: "Donor" }));

    let donor = service.register_donor(donor_payload()).expect("registers");
    let error = service
        .create_request(request_payload(&donor.id, UNKNOWN_ID))
        .expect_err("unknown hospital");
    assert!(matches!(error, ApiError::NotFound { what: "Hospital" }));

    let requests = service.list_requests(None, None, None).expect("list");
    assert!(requests.is_empty());

    // registration added one notification; the failed requests added none
    let notifications_after = service.list_notifications(None).expect("list").len();
    assert_eq!(notifications_after, notifications_before + 1);
}

#[test]
fn a_created_request_is_pending_and_notifies_the_donor() {
    let (service, _) = service();

    let donor = service.register_donor(donor_payload()).expect("registers");
    let hospital = service.create_hospital(hospital_payload()).expect("creates");

    let request = service
        .create_request(request_payload(&donor.id, &hospital.id))
        .expect("request succeeds");

    let stored = service.list_requests(None, None, None).expect("list");
    assert_eq!(stored.len(), 1);
    assert_eq!(text(&stored[0], "status"), Some("pending"));
    assert_eq!(text(&stored[0], "donor_id"), Some(donor.id.as_str()));

    let notifications = service.list_notifications(None).expect("list");
    let blood_request = notifications
        .iter()
        .find(|n| text(n, "subject") == Some("Blood Request"))
        .expect("request notification recorded");
    assert_eq!(text(blood_request, "to_email"), Some("a@x.com"));
    assert_eq!(
        blood_request
            .get("message")
            .and_then(Value::as_str)
            .expect("message"),
        "Mercy General requested 2 unit(s) of O+."
    );
    let meta = blood_request
        .get("meta")
        .and_then(Value::as_object)
        .expect("meta recorded");
    assert_eq!(
        meta.get("request_id").and_then(Value::as_str),
        Some(request.id.as_str())
    );
}

#[test]
fn request_filters_combine_with_and_semantics() {
    let (service, _) = service();

    let donor = service.register_donor(donor_payload()).expect("registers");
    let hospital_a = service.create_hospital(hospital_payload()).expect("creates");
    let hospital_b = service.create_hospital(hospital_payload()).expect("creates");

    service
        .create_request(request_payload(&donor.id, &hospital_a.id))
        .expect("first request");
    let second = service
        .create_request(request_payload(&donor.id, &hospital_b.id))
        .expect("second request");
    service
        .update_request_status(&second.id, "declined")
        .expect("declines");

    let declined_for_b = service
        .list_requests(Some("declined"), Some(&donor.id), Some(&hospital_b.id))
        .expect("list");
    assert_eq!(declined_for_b.len(), 1);

    let pending_for_b = service
        .list_requests(Some("pending"), None, Some(&hospital_b.id))
        .expect("list");
    assert!(pending_for_b.is_empty());
}

#[test]
fn status_updates_only_accept_terminal_states() {
    let (service, _) = service();

    let donor = service.register_donor(donor_payload()).expect("registers");
    let hospital = service.create_hospital(hospital_payload()).expect("creates");
    let request = service
        .create_request(request_payload(&donor.id, &hospital.id))
        .expect("request succeeds");

    for bad in ["pending", "shipped", ""] {
        let error = service
            .update_request_status(&request.id, bad)
            .expect_err("rejected");
        assert!(matches!(error, ApiError::Validation(_)), "{bad:?} rejected");
    }

    let stored = service.list_requests(None, None, None).expect("list");
    assert_eq!(text(&stored[0], "status"), Some("pending"), "unchanged");

    let error = service
        .update_request_status(UNKNOWN_ID, "approved")
        .expect_err("unknown request");
    assert!(matches!(error, ApiError::NotFound { .. }));
}

#[test]
fn approval_stamps_the_request_and_notifies_the_hospital() {
    let (service, _) = service();

    let donor = service.register_donor(donor_payload()).expect("registers");
    let hospital = service.create_hospital(hospital_payload()).expect("creates");
    let request = service
        .create_request(request_payload(&donor.id, &hospital.id))
        .expect("request succeeds");

    let outcome = service
        .update_request_status(&request.id, "approved")
        .expect("approves");
    assert_eq!(outcome.status, "approved");

    let stored = service.list_requests(None, None, None).expect("list");
    assert_eq!(text(&stored[0], "status"), Some("approved"));
    assert!(stored[0].contains_key("updated_at"));

    let notifications = service.list_notifications(None).expect("list");
    let approvals: Vec<_> = notifications
        .iter()
        .filter(|n| text(n, "subject") == Some("Request approved"))
        .collect();
    assert_eq!(approvals.len(), 1);
    assert_eq!(
        text(approvals[0], "to_email"),
        Some("bank@mercy.example.com")
    );
}

#[test]
fn approval_tolerates_a_missing_hospital() {
    let (service, store) = service();

    let donor = service.register_donor(donor_payload()).expect("registers");
    let hospital = service.create_hospital(hospital_payload()).expect("creates");
    let request = service
        .create_request(request_payload(&donor.id, &hospital.id))
        .expect("request succeeds");

    // the hospital disappears between request creation and approval
    let hospital_id = DocumentId::parse(&hospital.id).expect("well-formed id");
    store
        .delete_one("hospital", &hospital_id)
        .expect("hospital removed");

    let outcome = service
        .update_request_status(&request.id, "approved")
        .expect("approval still succeeds");
    assert_eq!(outcome.status, "approved");

    let notifications = service.list_notifications(None).expect("list");
    let approval = notifications
        .iter()
        .find(|n| text(n, "subject") == Some("Request approved"))
        .expect("notification recorded anyway");
    assert!(
        !approval.contains_key("to_email"),
        "recipient left unaddressed when the hospital is gone"
    );
}

#[test]
fn notification_listing_honors_the_limit_in_insertion_order() {
    let (service, _) = service();

    for index in 0..3 {
        service
            .record_notification(bloodlink::donation::domain::NotificationPayload {
                to_email: None,
                to_phone: Some(format!("555-010{index}")),
                subject: format!("subject {index}"),
                message: "m".to_string(),
                meta: None,
            })
            .expect("records");
    }

    let limited = service.list_notifications(Some(2)).expect("list");
    assert_eq!(limited.len(), 2);
    assert_eq!(text(&limited[0], "subject"), Some("subject 0"));
    assert_eq!(text(&limited[1], "subject"), Some("subject 1"));

    let all = service.list_notifications(None).expect("list");
    assert_eq!(all.len(), 3);
}

#[test]
fn diagnostics_reports_reachable_collections() {
    let (service, _) = service();
    service.register_donor(donor_payload()).expect("registers");

    let report = service.diagnostics();
    assert_eq!(report.backend, "running");
    assert_eq!(report.connection_status, "connected");
    assert!(report.collections.contains(&"donor".to_string()));
    assert!(report.collections.contains(&"notification".to_string()));
    assert!(report.collections.len() <= 10);
}

#[test]
fn diagnostics_degrades_instead_of_failing() {
    let service = DonationService::new(Arc::new(UnreachableStore));

    let report = service.diagnostics();
    assert_eq!(report.backend, "running");
    assert_eq!(report.connection_status, "not connected");
    assert!(report.database.starts_with("error: "));
    assert!(report.collections.is_empty());
}

#[test]
fn store_failures_surface_as_store_errors_elsewhere() {
    let service = DonationService::new(Arc::new(UnreachableStore));

    let error = service
        .register_donor(donor_payload())
        .expect_err("store down");
    assert!(matches!(error, ApiError::Store(_)));
}
