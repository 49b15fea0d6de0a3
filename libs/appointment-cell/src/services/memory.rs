use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;

use crate::models::{Appointment, AppointmentError, NewAppointment};
use crate::services::conflict::{collect_conflicts, sort_by_start};
use crate::services::store::{AppointmentResult, AppointmentStore};

#[derive(Default)]
struct MemoryState {
    last_id: i64,
    appointments: BTreeMap<i64, Appointment>,
}

impl MemoryState {
    fn sorted<F>(&self, keep: F) -> Vec<Appointment>
    where
        F: Fn(&Appointment) -> bool,
    {
        let mut appointments: Vec<Appointment> = self.appointments
            .values()
            .filter(|apt| keep(*apt))
            .cloned()
            .collect();
        sort_by_start(&mut appointments);
        appointments
    }
}

/// Process-local store. Check-then-write runs under a single write guard.
#[derive(Default)]
pub struct InMemoryAppointmentStore {
    state: RwLock<MemoryState>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn list_all(&self) -> AppointmentResult<Vec<Appointment>> {
        let state = self.state.read().await;
        Ok(state.sorted(|_| true))
    }

    async fn list_by_date_range(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> AppointmentResult<Vec<Appointment>> {
        let state = self.state.read().await;
        Ok(state.sorted(|apt| {
            let day = apt.start_time.date_naive();
            day >= start_date && day <= end_date
        }))
    }

    async fn get_by_id(&self, id: i64) -> AppointmentResult<Option<Appointment>> {
        let state = self.state.read().await;
        Ok(state.appointments.get(&id).cloned())
    }

    async fn find_conflicts(
        &self,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        exclude_id: Option<i64>,
    ) -> AppointmentResult<Vec<Appointment>> {
        let state = self.state.read().await;
        Ok(collect_conflicts(state.appointments.values(), start_time, end_time, exclude_id))
    }

    async fn create(&self, candidate: NewAppointment) -> AppointmentResult<Appointment> {
        let mut state = self.state.write().await;

        let conflicts = collect_conflicts(
            state.appointments.values(),
            candidate.start_time,
            candidate.end_time,
            None,
        );
        if !conflicts.is_empty() {
            return Err(AppointmentError::Conflict(conflicts));
        }

        state.last_id += 1;
        let appointment = candidate.into_appointment(state.last_id);
        state.appointments.insert(appointment.id, appointment.clone());

        Ok(appointment)
    }

    async fn update(&self, id: i64, candidate: NewAppointment) -> AppointmentResult<Appointment> {
        let mut state = self.state.write().await;

        if !state.appointments.contains_key(&id) {
            return Err(AppointmentError::NotFound);
        }

        let conflicts = collect_conflicts(
            state.appointments.values(),
            candidate.start_time,
            candidate.end_time,
            Some(id),
        );
        if !conflicts.is_empty() {
            return Err(AppointmentError::Conflict(conflicts));
        }

        let existing = state.appointments
            .get_mut(&id)
            .ok_or(AppointmentError::NotFound)?;
        existing.apply(candidate);

        Ok(existing.clone())
    }

    async fn delete(&self, id: i64) -> AppointmentResult<bool> {
        let mut state = self.state.write().await;
        Ok(state.appointments.remove(&id).is_some())
    }
}
