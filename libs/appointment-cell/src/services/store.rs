use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{Appointment, AppointmentError, NewAppointment};

pub type AppointmentResult<T> = Result<T, AppointmentError>;

pub type SharedStore = Arc<dyn AppointmentStore>;

/// Sole authority over appointment persistence.
///
/// Implementations guarantee that no two stored appointments overlap: the
/// conflict check in `create`/`update` and the write that follows behave as
/// one unit even under concurrent callers. Listings are ordered by
/// `start_time`, ties broken by `id`.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn list_all(&self) -> AppointmentResult<Vec<Appointment>>;

    /// Appointments whose start falls on `date` (UTC calendar day).
    async fn list_by_date(&self, date: NaiveDate) -> AppointmentResult<Vec<Appointment>> {
        self.list_by_date_range(date, date).await
    }

    /// Inclusive on both ends, compared by the calendar date of `start_time`.
    async fn list_by_date_range(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> AppointmentResult<Vec<Appointment>>;

    async fn get_by_id(&self, id: i64) -> AppointmentResult<Option<Appointment>>;

    async fn find_conflicts(
        &self,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        exclude_id: Option<i64>,
    ) -> AppointmentResult<Vec<Appointment>>;

    /// Fails with `Conflict` carrying every overlapping appointment.
    async fn create(&self, candidate: NewAppointment) -> AppointmentResult<Appointment>;

    /// Fails with `NotFound` for an unknown id, or `Conflict` when the new
    /// range overlaps any other appointment. The record itself never counts.
    async fn update(&self, id: i64, candidate: NewAppointment) -> AppointmentResult<Appointment>;

    /// `false` when nothing was stored under `id`.
    async fn delete(&self, id: i64) -> AppointmentResult<bool>;
}
