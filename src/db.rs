use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::MySqlPool;

use crate::core::store::{AttendanceStore, StoreError};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};

pub async fn init_db(database_url: &str) -> MySqlPool {
    MySqlPool::connect(database_url)
        .await
        .expect("Failed to connect to database")
}

/// MySQL-backed [`AttendanceStore`]. The UNIQUE (user_id, date) key on the
/// attendances table serializes racing clock-ins; the duplicate-key SQL
/// state 23000 surfaces as [`StoreError::Duplicate`].
#[derive(Clone)]
pub struct MySqlAttendanceStore {
    pool: MySqlPool,
}

impl MySqlAttendanceStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, user_id, location_id, date, clock_in, clock_out,
           clock_in_latitude, clock_in_longitude,
           clock_out_latitude, clock_out_longitude,
           is_within_radius, notes, status
    FROM attendances
"#;

/// Row shape as stored; `status` comes back as the enum's string form.
#[derive(sqlx::FromRow)]
struct AttendanceRow {
    id: u64,
    user_id: u64,
    location_id: Option<u64>,
    date: NaiveDate,
    clock_in: Option<NaiveDateTime>,
    clock_out: Option<NaiveDateTime>,
    clock_in_latitude: Option<f64>,
    clock_in_longitude: Option<f64>,
    clock_out_latitude: Option<f64>,
    clock_out_longitude: Option<f64>,
    is_within_radius: bool,
    notes: Option<String>,
    status: String,
}

impl From<AttendanceRow> for AttendanceRecord {
    fn from(row: AttendanceRow) -> Self {
        AttendanceRecord {
            id: row.id,
            user_id: row.user_id,
            location_id: row.location_id,
            date: row.date,
            clock_in: row.clock_in,
            clock_out: row.clock_out,
            clock_in_latitude: row.clock_in_latitude,
            clock_in_longitude: row.clock_in_longitude,
            clock_out_latitude: row.clock_out_latitude,
            clock_out_longitude: row.clock_out_longitude,
            is_within_radius: row.is_within_radius,
            notes: row.notes,
            // the column is a MySQL ENUM, so the parse cannot miss in practice
            status: row.status.parse().unwrap_or(AttendanceStatus::Present),
        }
    }
}

fn is_duplicate_key(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000"))
}

#[async_trait]
impl AttendanceStore for MySqlAttendanceStore {
    async fn find_by_id(&self, id: u64) -> Result<Option<AttendanceRecord>, StoreError> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?");
        let row = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(AttendanceRecord::from))
    }

    async fn find_by_user_and_date(
        &self,
        user_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let sql = format!("{SELECT_COLUMNS} WHERE user_id = ? AND date = ?");
        let row = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(user_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(AttendanceRecord::from))
    }

    async fn insert(&self, record: AttendanceRecord) -> Result<AttendanceRecord, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendances
                (user_id, location_id, date, clock_in, clock_out,
                 clock_in_latitude, clock_in_longitude,
                 clock_out_latitude, clock_out_longitude,
                 is_within_radius, notes, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.user_id)
        .bind(record.location_id)
        .bind(record.date)
        .bind(record.clock_in)
        .bind(record.clock_out)
        .bind(record.clock_in_latitude)
        .bind(record.clock_in_longitude)
        .bind(record.clock_out_latitude)
        .bind(record.clock_out_longitude)
        .bind(record.is_within_radius)
        .bind(record.notes.as_deref())
        .bind(record.status.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_duplicate_key(&e) {
                StoreError::Duplicate
            } else {
                StoreError::Database(e)
            }
        })?;

        Ok(AttendanceRecord {
            id: result.last_insert_id(),
            ..record
        })
    }

    async fn update(&self, record: &AttendanceRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE attendances
            SET user_id = ?, location_id = ?, date = ?, clock_in = ?, clock_out = ?,
                clock_in_latitude = ?, clock_in_longitude = ?,
                clock_out_latitude = ?, clock_out_longitude = ?,
                is_within_radius = ?, notes = ?, status = ?
            WHERE id = ?
            "#,
        )
        .bind(record.user_id)
        .bind(record.location_id)
        .bind(record.date)
        .bind(record.clock_in)
        .bind(record.clock_out)
        .bind(record.clock_in_latitude)
        .bind(record.clock_in_longitude)
        .bind(record.clock_out_latitude)
        .bind(record.clock_out_longitude)
        .bind(record.is_within_radius)
        .bind(record.notes.as_deref())
        .bind(record.status.to_string())
        .bind(record.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
