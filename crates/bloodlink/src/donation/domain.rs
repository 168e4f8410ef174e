use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The eight ABO/Rh blood groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodGroup {
    pub const ALL: [BloodGroup; 8] = [
        BloodGroup::APositive,
        BloodGroup::ANegative,
        BloodGroup::BPositive,
        BloodGroup::BNegative,
        BloodGroup::AbPositive,
        BloodGroup::AbNegative,
        BloodGroup::OPositive,
        BloodGroup::ONegative,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            BloodGroup::APositive => "A+",
            BloodGroup::ANegative => "A-",
            BloodGroup::BPositive => "B+",
            BloodGroup::BNegative => "B-",
            BloodGroup::AbPositive => "AB+",
            BloodGroup::AbNegative => "AB-",
            BloodGroup::OPositive => "O+",
            BloodGroup::ONegative => "O-",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|group| group.label() == raw)
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle of a transfusion request. Requests start pending and move
/// exactly once to approved or declined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Declined,
}

impl RequestStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Declined => "declined",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "declined" => Some(Self::Declined),
            _ => None,
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A registered donor. `eligible` is derived once at registration and
/// stored, never recomputed on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donor {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub age: u8,
    pub blood_group: BloodGroup,
    pub health_ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub eligible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

/// A batch of blood units held by a hospital. The hospital reference is a
/// weak string identifier, resolved only when the batch is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub hospital_id: String,
    pub blood_group: BloodGroup,
    pub units: u32,
    pub expiry_date: NaiveDate,
}

/// A hospital's request for units from a donor. Both references are weak
/// string identifiers, resolved only when the request is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloodRequest {
    pub hospital_id: String,
    pub donor_id: String,
    pub blood_group: BloodGroup,
    pub units: u32,
    pub status: RequestStatus,
}

/// A persisted statement of intent to notify a party. Nothing is delivered;
/// the record is the whole product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_phone: Option<String>,
    pub subject: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<BTreeMap<String, Value>>,
}

// Raw wire payloads. Scalars stay loose here so validation can report every
// offending field at once instead of failing on the first serde mismatch.
// Unknown extra fields are ignored.

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DonorPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub blood_group: String,
    #[serde(default)]
    pub health_ok: Option<bool>,
    #[serde(default)]
    pub city: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HospitalPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub city: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InventoryPayload {
    #[serde(default)]
    pub hospital_id: String,
    #[serde(default)]
    pub blood_group: String,
    #[serde(default)]
    pub units: Option<i64>,
    #[serde(default)]
    pub expiry_date: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestPayload {
    #[serde(default)]
    pub hospital_id: String,
    #[serde(default)]
    pub donor_id: String,
    #[serde(default)]
    pub blood_group: String,
    #[serde(default)]
    pub units: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationPayload {
    #[serde(default)]
    pub to_email: Option<String>,
    #[serde(default)]
    pub to_phone: Option<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub meta: Option<BTreeMap<String, Value>>,
}
