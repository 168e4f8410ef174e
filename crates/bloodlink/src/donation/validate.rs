//! Explicit per-entity validation. Each function consumes a raw payload and
//! returns the typed record, or a [`ValidationError`] listing every
//! offending field.

use chrono::NaiveDate;
use serde::Serialize;
use validator::ValidateEmail;

use super::domain::{
    BloodGroup, BloodRequest, Donor, DonorPayload, Hospital, HospitalPayload, InventoryItem,
    InventoryPayload, Notification, NotificationPayload, RequestPayload, RequestStatus,
};

/// One rejected field and the reason it was rejected.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

fn field_list(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|error| error.field)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("validation failed for: {}", field_list(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError::new(field, message)],
        }
    }
}

fn required_text(field: &'static str, raw: &str, errors: &mut Vec<FieldError>) -> String {
    let value = raw.trim().to_string();
    if value.is_empty() {
        errors.push(FieldError::new(field, "is required"));
    }
    value
}

fn required_email(field: &'static str, raw: &str, errors: &mut Vec<FieldError>) -> String {
    let value = raw.trim().to_string();
    if value.is_empty() {
        errors.push(FieldError::new(field, "is required"));
    } else if !value.validate_email() {
        errors.push(FieldError::new(field, "is not a valid email address"));
    }
    value
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

fn parse_blood_group(
    field: &'static str,
    raw: &str,
    errors: &mut Vec<FieldError>,
) -> Option<BloodGroup> {
    match BloodGroup::parse(raw.trim()) {
        Some(group) => Some(group),
        None => {
            errors.push(FieldError::new(
                field,
                "must be one of the eight ABO/Rh blood groups",
            ));
            None
        }
    }
}

fn positive_units(
    field: &'static str,
    raw: Option<i64>,
    errors: &mut Vec<FieldError>,
) -> Option<u32> {
    match raw {
        Some(value) if (1..=i64::from(u32::MAX)).contains(&value) => Some(value as u32),
        Some(_) => {
            errors.push(FieldError::new(field, "must be at least 1"));
            None
        }
        None => {
            errors.push(FieldError::new(field, "is required"));
            None
        }
    }
}

pub fn validate_donor(payload: DonorPayload) -> Result<Donor, ValidationError> {
    let mut errors = Vec::new();

    let name = required_text("name", &payload.name, &mut errors);
    let email = required_email("email", &payload.email, &mut errors);
    let phone = required_text("phone", &payload.phone, &mut errors);
    let age = match payload.age {
        Some(value) if (18..=65).contains(&value) => Some(value as u8),
        Some(_) => {
            errors.push(FieldError::new("age", "must be between 18 and 65"));
            None
        }
        None => {
            errors.push(FieldError::new("age", "is required"));
            None
        }
    };
    let blood_group = parse_blood_group("blood_group", &payload.blood_group, &mut errors);
    let health_ok = match payload.health_ok {
        Some(value) => Some(value),
        None => {
            errors.push(FieldError::new("health_ok", "is required"));
            None
        }
    };

    match (age, blood_group, health_ok) {
        (Some(age), Some(blood_group), Some(health_ok)) if errors.is_empty() => Ok(Donor {
            name,
            email,
            phone,
            age,
            blood_group,
            health_ok,
            city: optional_text(payload.city),
            eligible: true,
        }),
        _ => Err(ValidationError { errors }),
    }
}

pub fn validate_hospital(payload: HospitalPayload) -> Result<Hospital, ValidationError> {
    let mut errors = Vec::new();

    let name = required_text("name", &payload.name, &mut errors);
    let email = required_email("email", &payload.email, &mut errors);
    let phone = required_text("phone", &payload.phone, &mut errors);

    if errors.is_empty() {
        Ok(Hospital {
            name,
            email,
            phone,
            city: optional_text(payload.city),
        })
    } else {
        Err(ValidationError { errors })
    }
}

pub fn validate_inventory(payload: InventoryPayload) -> Result<InventoryItem, ValidationError> {
    let mut errors = Vec::new();

    let hospital_id = required_text("hospital_id", &payload.hospital_id, &mut errors);
    let blood_group = parse_blood_group("blood_group", &payload.blood_group, &mut errors);
    let units = positive_units("units", payload.units, &mut errors);
    let expiry_date = match NaiveDate::parse_from_str(payload.expiry_date.trim(), "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.push(FieldError::new("expiry_date", "must be a YYYY-MM-DD date"));
            None
        }
    };

    match (blood_group, units, expiry_date) {
        (Some(blood_group), Some(units), Some(expiry_date)) if errors.is_empty() => {
            Ok(InventoryItem {
                hospital_id,
                blood_group,
                units,
                expiry_date,
            })
        }
        _ => Err(ValidationError { errors }),
    }
}

pub fn validate_request(payload: RequestPayload) -> Result<BloodRequest, ValidationError> {
    let mut errors = Vec::new();

    let hospital_id = required_text("hospital_id", &payload.hospital_id, &mut errors);
    let donor_id = required_text("donor_id", &payload.donor_id, &mut errors);
    let blood_group = parse_blood_group("blood_group", &payload.blood_group, &mut errors);
    let units = positive_units("units", payload.units, &mut errors);
    let status = match payload.status.as_deref() {
        None => Some(RequestStatus::Pending),
        Some(raw) => match RequestStatus::parse(raw) {
            Some(status) => Some(status),
            None => {
                errors.push(FieldError::new(
                    "status",
                    "must be pending, approved, or declined",
                ));
                None
            }
        },
    };

    match (blood_group, units, status) {
        (Some(blood_group), Some(units), Some(status)) if errors.is_empty() => Ok(BloodRequest {
            hospital_id,
            donor_id,
            blood_group,
            units,
            status,
        }),
        _ => Err(ValidationError { errors }),
    }
}

pub fn validate_notification(
    payload: NotificationPayload,
) -> Result<Notification, ValidationError> {
    let mut errors = Vec::new();

    let to_email = match optional_text(payload.to_email) {
        Some(value) if !value.validate_email() => {
            errors.push(FieldError::new("to_email", "is not a valid email address"));
            None
        }
        other => other,
    };
    let subject = required_text("subject", &payload.subject, &mut errors);
    let message = required_text("message", &payload.message, &mut errors);

    if errors.is_empty() {
        Ok(Notification {
            to_email,
            to_phone: optional_text(payload.to_phone),
            subject,
            message,
            meta: payload.meta,
        })
    } else {
        Err(ValidationError { errors })
    }
}
