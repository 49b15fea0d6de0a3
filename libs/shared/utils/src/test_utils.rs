use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::{json, Value};

use shared_config::{AppConfig, StoreBackend};

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: Option<String>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            supabase_service_role_key: None,
        }
    }
}

impl TestConfig {
    /// Config pointing at a mock PostgREST server.
    pub fn with_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            store_backend: StoreBackend::Supabase,
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_service_role_key: self.supabase_service_role_key.clone(),
            ..AppConfig::default()
        }
    }
}

/// 2025-09-16 at the given UTC wall-clock time.
pub fn test_time(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 16, hour, minute, 0).unwrap()
}

pub fn test_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 16).unwrap()
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    /// A row as PostgREST returns it from the `appointments` table.
    pub fn appointment_row(
        id: i64,
        title: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        priority: i64,
    ) -> Value {
        json!({
            "id": id,
            "title": title,
            "description": null,
            "start_time": start_time.to_rfc3339(),
            "end_time": end_time.to_rfc3339(),
            "priority": priority
        })
    }

    pub fn exclusion_violation() -> Value {
        Self::error_response(
            "conflicting key value violates exclusion constraint \"appointments_no_overlap\"",
            "23P01",
        )
    }

    pub fn error_response(message: &str, code: &str) -> Value {
        json!({
            "code": code,
            "details": null,
            "hint": null,
            "message": message
        })
    }
}
