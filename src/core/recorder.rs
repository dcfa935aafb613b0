//! Daily clock-in/clock-out state transitions.
//!
//! Per (user, date) a record moves NONE -> CLOCKED_IN -> CLOCKED_OUT and
//! never further. `now` is an explicit parameter so the transitions are
//! deterministic under test; its date component is the caller's "today".

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::core::store::{AttendanceStore, StoreError};
use crate::core::{geofence, status};
use crate::model::attendance::AttendanceRecord;
use crate::model::location::Location;
use crate::model::work_schedule::WorkSchedule;

/// Expected, recoverable clock-flow outcomes. Surfaced to the caller as
/// advisory messages; only `Store` is a system error.
#[derive(Debug, Error)]
pub enum ClockError {
    #[error("You have already clocked in today.")]
    AlreadyClockedIn,
    #[error("You have already clocked out today.")]
    AlreadyClockedOut,
    #[error("No attendance record found.")]
    NotFound,
    #[error("This attendance record belongs to another user.")]
    NotOwner,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A persisted record plus the advisory compliance message for display.
/// The message is not part of the persisted state.
#[derive(Debug)]
pub struct ClockOutcome {
    pub record: AttendanceRecord,
    pub message: String,
}

/// Clock a user in for the calendar day of `now`.
///
/// Creates the day's record, or overwrites an anomalous row that exists
/// without a clock-in (administrative pre-entries keep their status). A row
/// that already has a clock-in fails with [`ClockError::AlreadyClockedIn`] —
/// including the loser of a racing duplicate insert. Being outside the
/// geofence does not block the clock-in; it only flags the record.
#[allow(clippy::too_many_arguments)]
pub async fn clock_in<S: AttendanceStore + ?Sized>(
    store: &S,
    user_id: u64,
    schedule: Option<&WorkSchedule>,
    locations: &[Location],
    latitude: f64,
    longitude: f64,
    notes: Option<&str>,
    now: NaiveDateTime,
) -> Result<ClockOutcome, ClockError> {
    let today = now.date();

    let existing = store.find_by_user_and_date(user_id, today).await?;
    if let Some(record) = &existing {
        if record.clock_in.is_some() {
            return Err(ClockError::AlreadyClockedIn);
        }
    }

    let nearest = geofence::find_nearest(latitude, longitude, locations);
    let compliant = nearest
        .map(|location| geofence::is_within_radius(latitude, longitude, location))
        .unwrap_or(false);

    // An admin-set absent/sick/leave status survives the clock-in.
    let record_status = match &existing {
        Some(record) if record.status.is_administrative() => record.status,
        _ => status::classify(now.time(), schedule),
    };

    let record = AttendanceRecord {
        id: existing.as_ref().map(|r| r.id).unwrap_or(0),
        user_id,
        location_id: nearest.map(|location| location.id),
        date: today,
        clock_in: Some(now),
        clock_out: None,
        clock_in_latitude: Some(latitude),
        clock_in_longitude: Some(longitude),
        clock_out_latitude: None,
        clock_out_longitude: None,
        is_within_radius: compliant,
        notes: notes.filter(|n| !n.is_empty()).map(str::to_owned),
        status: record_status,
    };

    let record = match existing {
        Some(_) => {
            store.update(&record).await?;
            record
        }
        None => match store.insert(record).await {
            Ok(stored) => stored,
            // Lost the race for today's row to a concurrent clock-in.
            Err(StoreError::Duplicate) => return Err(ClockError::AlreadyClockedIn),
            Err(e) => return Err(e.into()),
        },
    };

    let message = if compliant {
        "Successfully clocked in!".to_owned()
    } else {
        "Clocked in successfully, but you are outside the designated area.".to_owned()
    };

    Ok(ClockOutcome { record, message })
}

/// Clock the owner of `record_id` out.
///
/// Compliance degrades monotonically: one out-of-bounds event in either
/// direction flags the whole day. Status is fixed at clock-in and not
/// recomputed here.
#[allow(clippy::too_many_arguments)]
pub async fn clock_out<S: AttendanceStore + ?Sized>(
    store: &S,
    record_id: u64,
    user_id: u64,
    locations: &[Location],
    latitude: f64,
    longitude: f64,
    notes: Option<&str>,
    now: NaiveDateTime,
) -> Result<ClockOutcome, ClockError> {
    let mut record = store
        .find_by_id(record_id)
        .await?
        .ok_or(ClockError::NotFound)?;

    if record.user_id != user_id {
        return Err(ClockError::NotOwner);
    }
    if record.clock_out.is_some() {
        return Err(ClockError::AlreadyClockedOut);
    }
    // A row without a clock-in (administrative entry) has nothing to close.
    if record.clock_in.is_none() {
        return Err(ClockError::NotFound);
    }

    let nearest = geofence::find_nearest(latitude, longitude, locations);
    let compliant = nearest
        .map(|location| geofence::is_within_radius(latitude, longitude, location))
        .unwrap_or(false);

    record.clock_out = Some(now);
    record.clock_out_latitude = Some(latitude);
    record.clock_out_longitude = Some(longitude);
    record.is_within_radius = record.is_within_radius && compliant;

    if let Some(new_notes) = notes.filter(|n| !n.is_empty()) {
        record.notes = Some(match record.notes.take() {
            Some(old) => format!("{old}\n{new_notes}"),
            None => new_notes.to_owned(),
        });
    }

    store.update(&record).await?;

    let message = if compliant {
        "Successfully clocked out!".to_owned()
    } else {
        "Clocked out successfully, but you are outside the designated area.".to_owned()
    };

    Ok(ClockOutcome { record, message })
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;
    use crate::core::store::memory::MemoryStore;
    use crate::model::attendance::AttendanceStatus;

    const OFFICE_LAT: f64 = -6.2087634;
    const OFFICE_LON: f64 = 106.8455990;

    fn office() -> Location {
        Location {
            id: 1,
            name: "Head Office".into(),
            address: String::new(),
            latitude: OFFICE_LAT,
            longitude: OFFICE_LON,
            radius: 100.0,
            is_active: true,
        }
    }

    fn nine_to_five() -> WorkSchedule {
        WorkSchedule {
            id: 1,
            name: "Regular Shift".into(),
            start_time: chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: chrono::NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            break_duration: 60,
            work_days: vec![1, 2, 3, 4, 5],
            is_active: true,
        }
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 6)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    // ~550 m east of the office, well outside the 100 m radius
    const FAR_LON: f64 = OFFICE_LON + 0.005;

    #[actix_web::rt::test]
    async fn clock_in_creates_the_day_record() {
        let store = MemoryStore::new();
        let outcome = clock_in(
            &store,
            7,
            None,
            &[office()],
            OFFICE_LAT,
            OFFICE_LON,
            Some("on time"),
            at(8, 55),
        )
        .await
        .unwrap();

        assert_eq!(outcome.record.user_id, 7);
        assert_eq!(outcome.record.location_id, Some(1));
        assert_eq!(outcome.record.date, at(8, 55).date());
        assert_eq!(outcome.record.clock_in, Some(at(8, 55)));
        assert!(outcome.record.clock_out.is_none());
        assert!(outcome.record.is_within_radius);
        assert_eq!(outcome.record.status, AttendanceStatus::Present);
        assert_eq!(outcome.record.notes.as_deref(), Some("on time"));
        assert_eq!(outcome.message, "Successfully clocked in!");
    }

    #[actix_web::rt::test]
    async fn second_clock_in_fails_and_leaves_record_unchanged() {
        let store = MemoryStore::new();
        let first = clock_in(
            &store,
            7,
            None,
            &[office()],
            OFFICE_LAT,
            OFFICE_LON,
            None,
            at(8, 55),
        )
        .await
        .unwrap();

        let second = clock_in(
            &store,
            7,
            None,
            &[office()],
            OFFICE_LAT,
            FAR_LON,
            Some("second try"),
            at(9, 40),
        )
        .await;
        assert!(matches!(second, Err(ClockError::AlreadyClockedIn)));

        let stored = store
            .find_by_user_and_date(7, at(8, 55).date())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, first.record);
    }

    #[actix_web::rt::test]
    async fn clock_in_outside_radius_is_flagged_but_not_blocked() {
        let store = MemoryStore::new();
        let outcome = clock_in(
            &store,
            7,
            None,
            &[office()],
            OFFICE_LAT,
            FAR_LON,
            None,
            at(8, 55),
        )
        .await
        .unwrap();

        assert!(!outcome.record.is_within_radius);
        assert_eq!(outcome.record.location_id, Some(1));
        assert_eq!(
            outcome.message,
            "Clocked in successfully, but you are outside the designated area."
        );
    }

    #[actix_web::rt::test]
    async fn clock_in_with_no_active_locations() {
        let store = MemoryStore::new();
        let outcome = clock_in(&store, 7, None, &[], OFFICE_LAT, OFFICE_LON, None, at(8, 55))
            .await
            .unwrap();

        assert_eq!(outcome.record.location_id, None);
        assert!(!outcome.record.is_within_radius);
    }

    #[actix_web::rt::test]
    async fn late_clock_in_is_classified_late() {
        let store = MemoryStore::new();
        let schedule = nine_to_five();
        let outcome = clock_in(
            &store,
            7,
            Some(&schedule),
            &[office()],
            OFFICE_LAT,
            OFFICE_LON,
            None,
            at(9, 40),
        )
        .await
        .unwrap();

        assert_eq!(outcome.record.status, AttendanceStatus::Late);
    }

    #[actix_web::rt::test]
    async fn clock_in_over_admin_entry_keeps_administrative_status() {
        let store = MemoryStore::new();
        let date = at(8, 55).date();
        store
            .seed(AttendanceRecord {
                id: 0,
                user_id: 7,
                location_id: None,
                date,
                clock_in: None,
                clock_out: None,
                clock_in_latitude: None,
                clock_in_longitude: None,
                clock_out_latitude: None,
                clock_out_longitude: None,
                is_within_radius: false,
                notes: None,
                status: AttendanceStatus::Sick,
            })
            .await;

        let outcome = clock_in(
            &store,
            7,
            Some(&nine_to_five()),
            &[office()],
            OFFICE_LAT,
            OFFICE_LON,
            None,
            at(9, 40),
        )
        .await
        .unwrap();

        // overwritten in place, not duplicated; sick status preserved
        assert_eq!(outcome.record.status, AttendanceStatus::Sick);
        assert_eq!(outcome.record.clock_in, Some(at(9, 40)));
        let stored = store
            .find_by_user_and_date(7, date)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, outcome.record);
    }

    #[actix_web::rt::test]
    async fn clock_out_completes_the_day() {
        let store = MemoryStore::new();
        let record = clock_in(
            &store,
            7,
            None,
            &[office()],
            OFFICE_LAT,
            OFFICE_LON,
            Some("morning"),
            at(8, 55),
        )
        .await
        .unwrap()
        .record;

        let outcome = clock_out(
            &store,
            record.id,
            7,
            &[office()],
            OFFICE_LAT,
            OFFICE_LON,
            Some("evening"),
            at(17, 5),
        )
        .await
        .unwrap();

        assert_eq!(outcome.record.clock_out, Some(at(17, 5)));
        assert!(outcome.record.is_within_radius);
        assert_eq!(outcome.record.notes.as_deref(), Some("morning\nevening"));
        // status stays whatever clock-in decided
        assert_eq!(outcome.record.status, AttendanceStatus::Present);
        assert_eq!(outcome.message, "Successfully clocked out!");
    }

    #[actix_web::rt::test]
    async fn out_of_bounds_clock_out_flags_the_day() {
        let store = MemoryStore::new();
        let record = clock_in(
            &store,
            7,
            None,
            &[office()],
            OFFICE_LAT,
            OFFICE_LON,
            None,
            at(8, 55),
        )
        .await
        .unwrap()
        .record;
        assert!(record.is_within_radius);

        let outcome = clock_out(
            &store,
            record.id,
            7,
            &[office()],
            OFFICE_LAT,
            FAR_LON,
            None,
            at(17, 5),
        )
        .await
        .unwrap();

        assert!(!outcome.record.is_within_radius);
        assert_eq!(
            outcome.message,
            "Clocked out successfully, but you are outside the designated area."
        );
    }

    #[actix_web::rt::test]
    async fn clock_out_without_record_is_not_found() {
        let store = MemoryStore::new();
        let result = clock_out(
            &store,
            99,
            7,
            &[office()],
            OFFICE_LAT,
            OFFICE_LON,
            None,
            at(17, 5),
        )
        .await;
        assert!(matches!(result, Err(ClockError::NotFound)));
    }

    #[actix_web::rt::test]
    async fn clock_out_by_another_user_is_rejected() {
        let store = MemoryStore::new();
        let record = clock_in(
            &store,
            7,
            None,
            &[office()],
            OFFICE_LAT,
            OFFICE_LON,
            None,
            at(8, 55),
        )
        .await
        .unwrap()
        .record;

        let result = clock_out(
            &store,
            record.id,
            8,
            &[office()],
            OFFICE_LAT,
            OFFICE_LON,
            None,
            at(17, 5),
        )
        .await;
        assert!(matches!(result, Err(ClockError::NotOwner)));
    }

    #[actix_web::rt::test]
    async fn second_clock_out_is_rejected() {
        let store = MemoryStore::new();
        let record = clock_in(
            &store,
            7,
            None,
            &[office()],
            OFFICE_LAT,
            OFFICE_LON,
            None,
            at(8, 55),
        )
        .await
        .unwrap()
        .record;

        clock_out(
            &store,
            record.id,
            7,
            &[office()],
            OFFICE_LAT,
            OFFICE_LON,
            None,
            at(17, 5),
        )
        .await
        .unwrap();

        let again = clock_out(
            &store,
            record.id,
            7,
            &[office()],
            OFFICE_LAT,
            OFFICE_LON,
            None,
            at(17, 6),
        )
        .await;
        assert!(matches!(again, Err(ClockError::AlreadyClockedOut)));
    }

    #[actix_web::rt::test]
    async fn clock_out_of_admin_entry_without_clock_in_is_not_found() {
        let store = MemoryStore::new();
        let seeded = store
            .seed(AttendanceRecord {
                id: 0,
                user_id: 7,
                location_id: None,
                date: at(8, 55).date(),
                clock_in: None,
                clock_out: None,
                clock_in_latitude: None,
                clock_in_longitude: None,
                clock_out_latitude: None,
                clock_out_longitude: None,
                is_within_radius: false,
                notes: None,
                status: AttendanceStatus::Leave,
            })
            .await;

        let result = clock_out(
            &store,
            seeded.id,
            7,
            &[office()],
            OFFICE_LAT,
            OFFICE_LON,
            None,
            at(17, 5),
        )
        .await;
        assert!(matches!(result, Err(ClockError::NotFound)));
    }

    /// Store that reports no existing row but rejects the insert, like the
    /// loser of two near-simultaneous clock-ins hitting the unique key.
    struct RacingStore;

    #[async_trait]
    impl AttendanceStore for RacingStore {
        async fn find_by_id(&self, _id: u64) -> Result<Option<AttendanceRecord>, StoreError> {
            Ok(None)
        }

        async fn find_by_user_and_date(
            &self,
            _user_id: u64,
            _date: chrono::NaiveDate,
        ) -> Result<Option<AttendanceRecord>, StoreError> {
            Ok(None)
        }

        async fn insert(
            &self,
            _record: AttendanceRecord,
        ) -> Result<AttendanceRecord, StoreError> {
            Err(StoreError::Duplicate)
        }

        async fn update(&self, _record: &AttendanceRecord) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[actix_web::rt::test]
    async fn losing_the_insert_race_reads_as_already_clocked_in() {
        let result = clock_in(
            &RacingStore,
            7,
            None,
            &[office()],
            OFFICE_LAT,
            OFFICE_LON,
            None,
            at(8, 55),
        )
        .await;
        assert!(matches!(result, Err(ClockError::AlreadyClockedIn)));
    }
}
