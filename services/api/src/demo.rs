use crate::infra::InMemoryDocumentStore;
use bloodlink::donation::domain::{
    DonorPayload, HospitalPayload, InventoryPayload, RequestPayload,
};
use bloodlink::donation::DonationService;
use bloodlink::error::ApiError;
use chrono::{Duration, Local};
use clap::Args;
use serde_json::Value;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Blood group used for the demo donor and request
    #[arg(long, default_value = "O+")]
    pub(crate) blood_group: String,
    /// Units requested by the demo hospital
    #[arg(long, default_value_t = 2)]
    pub(crate) units: i64,
}

/// End-to-end walkthrough of the donation lifecycle against an in-memory
/// store: registration, inventory intake, a transfusion request, and its
/// approval, printing the notification trail at the end.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), ApiError> {
    let store = Arc::new(InMemoryDocumentStore::default());
    let service = DonationService::new(store);

    println!("== BloodLink demo ==");

    let registration = service.register_donor(DonorPayload {
        name: "Avery Collins".to_string(),
        email: "avery.collins@example.com".to_string(),
        phone: "515-555-0142".to_string(),
        age: Some(29),
        blood_group: args.blood_group.clone(),
        health_ok: Some(true),
        city: Some("Des Moines".to_string()),
    })?;
    println!(
        "registered donor {} (eligible: {})",
        registration.id, registration.eligible
    );

    let hospital = service.create_hospital(HospitalPayload {
        name: "Mercy General".to_string(),
        email: "bloodbank@mercygeneral.example.com".to_string(),
        phone: "515-555-0100".to_string(),
        city: Some("Des Moines".to_string()),
    })?;
    println!("created hospital {}", hospital.id);

    let expiry = Local::now().date_naive() + Duration::days(30);
    let batch = service.add_inventory(InventoryPayload {
        hospital_id: hospital.id.clone(),
        blood_group: args.blood_group.clone(),
        units: Some(6),
        expiry_date: expiry.to_string(),
    })?;
    println!("stocked inventory batch {} (expires {expiry})", batch.id);

    let request = service.create_request(RequestPayload {
        hospital_id: hospital.id.clone(),
        donor_id: registration.id.clone(),
        blood_group: args.blood_group.clone(),
        units: Some(args.units),
        status: None,
    })?;
    println!("created blood request {}", request.id);

    let outcome = service.update_request_status(&request.id, "approved")?;
    println!("request {} is now {}", request.id, outcome.status);

    let approved = service.list_requests(Some("approved"), None, None)?;
    println!("approved requests on file: {}", approved.len());

    println!("notification trail:");
    for notification in service.list_notifications(None)? {
        let subject = notification
            .get("subject")
            .and_then(Value::as_str)
            .unwrap_or("<missing subject>");
        let recipient = notification
            .get("to_email")
            .and_then(Value::as_str)
            .unwrap_or("<unaddressed>");
        println!("  - {subject} -> {recipient}");
    }

    Ok(())
}
