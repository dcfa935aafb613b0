use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::model::attendance::AttendanceRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The (user_id, date) uniqueness key rejected a second insert.
    #[error("attendance record already exists for this user and date")]
    Duplicate,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Keyed persistence for daily attendance records.
///
/// The state machine only ever needs get/put by id or by (user, date); both
/// the MySQL store and the in-memory test store implement this. `insert`
/// must enforce at most one row per (user, date) so that racing clock-ins
/// are serialized by the storage layer.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn find_by_id(&self, id: u64) -> Result<Option<AttendanceRecord>, StoreError>;

    async fn find_by_user_and_date(
        &self,
        user_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Insert a new daily record. The input `id` is ignored; the stored
    /// record with its assigned id is returned. Fails with
    /// [`StoreError::Duplicate`] when a row for (user_id, date) exists.
    async fn insert(&self, record: AttendanceRecord) -> Result<AttendanceRecord, StoreError>;

    /// Overwrite the row identified by `record.id`.
    async fn update(&self, record: &AttendanceRecord) -> Result<(), StoreError>;
}

#[cfg(test)]
pub mod memory {
    use std::sync::Mutex;

    use super::*;

    /// In-memory store mirroring the MySQL uniqueness behavior.
    #[derive(Default)]
    pub struct MemoryStore {
        inner: Mutex<Inner>,
    }

    #[derive(Default)]
    struct Inner {
        next_id: u64,
        rows: Vec<AttendanceRecord>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed a pre-existing row, e.g. an admin-created sick/leave entry.
        pub async fn seed(&self, record: AttendanceRecord) -> AttendanceRecord {
            self.insert(record).await.expect("seed must not collide")
        }
    }

    #[async_trait]
    impl AttendanceStore for MemoryStore {
        async fn find_by_id(&self, id: u64) -> Result<Option<AttendanceRecord>, StoreError> {
            let inner = self.inner.lock().unwrap();
            Ok(inner.rows.iter().find(|r| r.id == id).cloned())
        }

        async fn find_by_user_and_date(
            &self,
            user_id: u64,
            date: NaiveDate,
        ) -> Result<Option<AttendanceRecord>, StoreError> {
            let inner = self.inner.lock().unwrap();
            Ok(inner
                .rows
                .iter()
                .find(|r| r.user_id == user_id && r.date == date)
                .cloned())
        }

        async fn insert(
            &self,
            mut record: AttendanceRecord,
        ) -> Result<AttendanceRecord, StoreError> {
            let mut inner = self.inner.lock().unwrap();
            if inner
                .rows
                .iter()
                .any(|r| r.user_id == record.user_id && r.date == record.date)
            {
                return Err(StoreError::Duplicate);
            }
            inner.next_id += 1;
            record.id = inner.next_id;
            inner.rows.push(record.clone());
            Ok(record)
        }

        async fn update(&self, record: &AttendanceRecord) -> Result<(), StoreError> {
            let mut inner = self.inner.lock().unwrap();
            match inner.rows.iter_mut().find(|r| r.id == record.id) {
                Some(row) => {
                    *row = record.clone();
                    Ok(())
                }
                None => Err(StoreError::Database(sqlx::Error::RowNotFound)),
            }
        }
    }
}
