use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::models::Appointment;

/// Half-open overlap: `[start1, end1)` and `[start2, end2)` share an instant.
/// Back-to-back ranges (one ends exactly when the other starts) do not overlap.
pub fn ranges_overlap(
    start1: DateTime<Utc>,
    end1: DateTime<Utc>,
    start2: DateTime<Utc>,
    end2: DateTime<Utc>,
) -> bool {
    start1 < end2 && end1 > start2
}

/// Appointments overlapping `[start_time, end_time)`, skipping `exclude_id`,
/// in the store's canonical order.
pub fn collect_conflicts<'a, I>(
    appointments: I,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    exclude_id: Option<i64>,
) -> Vec<Appointment>
where
    I: IntoIterator<Item = &'a Appointment>,
{
    let mut conflicts: Vec<Appointment> = appointments
        .into_iter()
        .filter(|existing| Some(existing.id) != exclude_id)
        .filter(|existing| existing.overlaps(start_time, end_time))
        .cloned()
        .collect();

    sort_by_start(&mut conflicts);
    conflicts
}

pub fn sort_by_start(appointments: &mut [Appointment]) {
    appointments.sort_by_key(|apt| (apt.start_time, apt.id));
}

/// UTC instants bounding the calendar days `start_date..=end_date`.
/// The upper bound is exclusive and absent only when `end_date` is the last
/// representable day.
pub fn date_window(
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> (DateTime<Utc>, Option<DateTime<Utc>>) {
    let lower = start_date.and_time(NaiveTime::MIN).and_utc();
    let upper = end_date
        .succ_opt()
        .map(|next_day| next_day.and_time(NaiveTime::MIN).and_utc());
    (lower, upper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::models::Priority;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 16, hour, minute, 0).unwrap()
    }

    fn appointment(id: i64, start: DateTime<Utc>, end: DateTime<Utc>) -> Appointment {
        Appointment {
            id,
            title: format!("appointment {}", id),
            description: None,
            start_time: start,
            end_time: end,
            priority: Priority::Low,
        }
    }

    #[test]
    fn partial_overlap_is_detected_both_ways() {
        assert!(ranges_overlap(at(9, 0), at(10, 0), at(9, 30), at(10, 30)));
        assert!(ranges_overlap(at(9, 30), at(10, 30), at(9, 0), at(10, 0)));
    }

    #[test]
    fn containment_is_an_overlap() {
        assert!(ranges_overlap(at(9, 0), at(12, 0), at(10, 0), at(11, 0)));
        assert!(ranges_overlap(at(10, 0), at(11, 0), at(9, 0), at(12, 0)));
    }

    #[test]
    fn touching_ranges_do_not_overlap() {
        assert!(!ranges_overlap(at(9, 0), at(10, 0), at(10, 0), at(11, 0)));
        assert!(!ranges_overlap(at(10, 0), at(11, 0), at(9, 0), at(10, 0)));
    }

    #[test]
    fn conflicts_skip_excluded_id_and_come_back_ordered() {
        let existing = vec![
            appointment(3, at(11, 0), at(12, 0)),
            appointment(1, at(9, 0), at(10, 0)),
            appointment(2, at(10, 0), at(11, 0)),
        ];

        let conflicts = collect_conflicts(&existing, at(9, 30), at(11, 30), Some(2));
        let ids: Vec<i64> = conflicts.iter().map(|apt| apt.id).collect();

        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn date_window_spans_whole_days() {
        let day = NaiveDate::from_ymd_opt(2025, 9, 16).unwrap();
        let (lower, upper) = date_window(day, day);

        assert_eq!(lower, at(0, 0));
        assert_eq!(upper, Some(Utc.with_ymd_and_hms(2025, 9, 17, 0, 0, 0).unwrap()));
    }
}
