use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_database::{DatabaseError, SupabaseClient};

use crate::models::{Appointment, AppointmentError, NewAppointment, Priority};
use crate::services::conflict::date_window;
use crate::services::store::{AppointmentResult, AppointmentStore};

const APPOINTMENTS_PATH: &str = "/rest/v1/appointments";
const ORDER_BY_START: &str = "order=start_time.asc,id.asc";

/// Row shape of the `appointments` table; priority is kept as its ordinal.
#[derive(Debug, Deserialize)]
struct AppointmentRow {
    id: i64,
    title: String,
    description: Option<String>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    #[serde(default)]
    priority: i64,
}

impl From<AppointmentRow> for Appointment {
    fn from(row: AppointmentRow) -> Self {
        Appointment {
            id: row.id,
            title: row.title,
            description: row.description,
            start_time: row.start_time,
            end_time: row.end_time,
            priority: Priority::from_ordinal(row.priority),
        }
    }
}

impl From<DatabaseError> for AppointmentError {
    fn from(err: DatabaseError) -> Self {
        AppointmentError::StorageUnavailable(err.to_string())
    }
}

fn timestamp_param(ts: DateTime<Utc>) -> String {
    urlencoding::encode(&ts.to_rfc3339_opts(SecondsFormat::Micros, true)).into_owned()
}

fn row_body(candidate: &NewAppointment) -> Value {
    json!({
        "title": candidate.title,
        "description": candidate.description,
        "start_time": candidate.start_time,
        "end_time": candidate.end_time,
        "priority": candidate.priority.ordinal(),
    })
}

/// Appointment store backed by the Postgres `appointments` table behind
/// Supabase's REST surface.
///
/// The table's `EXCLUDE USING gist (tstzrange(start_time, end_time, '[)') WITH &&)`
/// constraint is what makes check-then-write safe across concurrent writers:
/// a write that loses the race is rejected with SQLSTATE 23P01 and reported
/// as a conflict.
pub struct SupabaseAppointmentStore {
    supabase: Arc<SupabaseClient>,
    auth_token: String,
}

impl SupabaseAppointmentStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            auth_token: config.supabase_bearer_token().to_string(),
        }
    }

    async fn fetch(&self, filters: &str) -> AppointmentResult<Vec<Appointment>> {
        let path = if filters.is_empty() {
            format!("{}?select=*&{}", APPOINTMENTS_PATH, ORDER_BY_START)
        } else {
            format!("{}?select=*&{}&{}", APPOINTMENTS_PATH, filters, ORDER_BY_START)
        };

        let rows: Vec<AppointmentRow> = self.supabase.request(
            Method::GET,
            &path,
            Some(&self.auth_token),
            None,
        ).await?;

        Ok(rows.into_iter().map(Appointment::from).collect())
    }

    async fn write(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Vec<AppointmentRow>, DatabaseError> {
        self.supabase.request_with_headers(
            method,
            path,
            Some(&self.auth_token),
            body,
            Some(SupabaseClient::return_representation()),
        ).await
    }

    /// A concurrent writer got in between our check and our write.
    async fn lost_race(
        &self,
        candidate: &NewAppointment,
        exclude_id: Option<i64>,
    ) -> AppointmentError {
        match self.find_conflicts(candidate.start_time, candidate.end_time, exclude_id).await {
            Ok(conflicts) => AppointmentError::Conflict(conflicts),
            Err(err) => err,
        }
    }
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn list_all(&self) -> AppointmentResult<Vec<Appointment>> {
        self.fetch("").await
    }

    async fn list_by_date_range(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> AppointmentResult<Vec<Appointment>> {
        let filters = match date_window(start_date, end_date) {
            (lower, Some(upper)) => format!(
                "and=(start_time.gte.{},start_time.lt.{})",
                timestamp_param(lower),
                timestamp_param(upper),
            ),
            (lower, None) => format!("start_time=gte.{}", timestamp_param(lower)),
        };

        self.fetch(&filters).await
    }

    async fn get_by_id(&self, id: i64) -> AppointmentResult<Option<Appointment>> {
        let mut found = self.fetch(&format!("id=eq.{}", id)).await?;
        Ok(if found.is_empty() { None } else { Some(found.swap_remove(0)) })
    }

    async fn find_conflicts(
        &self,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        exclude_id: Option<i64>,
    ) -> AppointmentResult<Vec<Appointment>> {
        let mut filters = vec![
            format!("start_time=lt.{}", timestamp_param(end_time)),
            format!("end_time=gt.{}", timestamp_param(start_time)),
        ];

        if let Some(exclude_id) = exclude_id {
            filters.push(format!("id=neq.{}", exclude_id));
        }

        self.fetch(&filters.join("&")).await
    }

    async fn create(&self, candidate: NewAppointment) -> AppointmentResult<Appointment> {
        let conflicts = self.find_conflicts(candidate.start_time, candidate.end_time, None).await?;
        if !conflicts.is_empty() {
            return Err(AppointmentError::Conflict(conflicts));
        }

        let rows = match self.write(Method::POST, APPOINTMENTS_PATH, Some(row_body(&candidate))).await {
            Ok(rows) => rows,
            Err(err) if err.is_exclusion_violation() => return Err(self.lost_race(&candidate, None).await),
            Err(err) => return Err(err.into()),
        };

        rows.into_iter()
            .next()
            .map(Appointment::from)
            .ok_or_else(|| AppointmentError::StorageUnavailable("insert returned no rows".to_string()))
    }

    async fn update(&self, id: i64, candidate: NewAppointment) -> AppointmentResult<Appointment> {
        if self.get_by_id(id).await?.is_none() {
            return Err(AppointmentError::NotFound);
        }

        let conflicts = self.find_conflicts(candidate.start_time, candidate.end_time, Some(id)).await?;
        if !conflicts.is_empty() {
            return Err(AppointmentError::Conflict(conflicts));
        }

        let path = format!("{}?id=eq.{}", APPOINTMENTS_PATH, id);
        let rows = match self.write(Method::PATCH, &path, Some(row_body(&candidate))).await {
            Ok(rows) => rows,
            Err(err) if err.is_exclusion_violation() => return Err(self.lost_race(&candidate, Some(id)).await),
            Err(err) => return Err(err.into()),
        };

        // Deleted between the existence check and the patch.
        rows.into_iter()
            .next()
            .map(Appointment::from)
            .ok_or(AppointmentError::NotFound)
    }

    async fn delete(&self, id: i64) -> AppointmentResult<bool> {
        let path = format!("{}?id=eq.{}", APPOINTMENTS_PATH, id);
        let removed = self.write(Method::DELETE, &path, None).await?;
        Ok(!removed.is_empty())
    }
}
