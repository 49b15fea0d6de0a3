// libs/appointment-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{de::{self, IgnoredAny}, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub priority: Priority,
}

impl Appointment {
    pub fn overlaps(&self, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> bool {
        crate::services::conflict::ranges_overlap(self.start_time, self.end_time, start_time, end_time)
    }

    pub(crate) fn apply(&mut self, candidate: NewAppointment) {
        self.title = candidate.title;
        self.description = candidate.description;
        self.start_time = candidate.start_time;
        self.end_time = candidate.end_time;
        self.priority = candidate.priority;
    }
}

/// Appointment data before the store has assigned it an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub priority: Priority,
}

impl NewAppointment {
    pub fn into_appointment(self, id: i64) -> Appointment {
        Appointment {
            id,
            title: self.title,
            description: self.description,
            start_time: self.start_time,
            end_time: self.end_time,
            priority: self.priority,
        }
    }
}

/// Stored as ordinal 0/1/2, sent over the wire as "low"/"medium"/"high".
/// Anything unrecognised in either form becomes `Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    #[default]
    Low = 0,
    Medium = 1,
    High = 2,
}

impl Priority {
    pub fn from_ordinal(ordinal: i64) -> Self {
        match ordinal {
            1 => Priority::Medium,
            2 => Priority::High,
            _ => Priority::Low,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "medium" => Priority::Medium,
            "high" => Priority::High,
            _ => Priority::Low,
        }
    }

    pub fn ordinal(self) -> i16 {
        self as i16
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawPriority {
            Name(String),
            Ordinal(i64),
            Other(IgnoredAny),
        }

        Ok(match RawPriority::deserialize(deserializer)? {
            RawPriority::Name(name) => Priority::from_name(&name),
            RawPriority::Ordinal(ordinal) => Priority::from_ordinal(ordinal),
            RawPriority::Other(_) => Priority::Low,
        })
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentRequest {
    /// Required on update, where it must match the route id. Ignored on create.
    pub id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub priority: Priority,
}

impl AppointmentRequest {
    pub fn into_candidate(self) -> NewAppointment {
        NewAppointment {
            title: self.title.trim().to_string(),
            description: self.description,
            start_time: self.start_time,
            end_time: self.end_time,
            priority: self.priority,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AppointmentListQuery {
    #[serde(default, deserialize_with = "calendar_date")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "calendar_date")]
    pub from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "calendar_date")]
    pub to: Option<NaiveDate>,
}

/// Calendar date of a query value: `2025-09-16`, `2025-09-16T10:00:00`, or
/// an RFC 3339 timestamp (converted to UTC first).
fn calendar_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
    let raw = match Option::<String>::deserialize(deserializer)? {
        Some(raw) => raw,
        None => return Ok(None),
    };
    let raw = raw.trim();

    if let Ok(date) = raw.parse::<NaiveDate>() {
        return Ok(Some(date));
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(timestamp.with_timezone(&Utc).date_naive()));
    }
    if let Ok(local) = raw.parse::<NaiveDateTime>() {
        return Ok(Some(local.date()));
    }

    Err(de::Error::custom(format!("invalid date: {}", raw)))
}

#[derive(Debug, Deserialize)]
pub struct ConflictCheckQuery {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub exclude_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConflictCheckResponse {
    pub has_conflict: bool,
    pub conflicting_appointments: Vec<Appointment>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Appointment conflicts with {} existing booking(s)", .0.len())]
    Conflict(Vec<Appointment>),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}
