use crate::models::DbTimeslot;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use slotbook_core::{
    errors::{TimeslotError, TimeslotResult},
    models::timeslot::{validate_bounds, validate_participant, Timeslot},
};
use sqlx::{Pool, Postgres};

/// SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Registry of timeslots.
///
/// Claims are atomic: of two concurrent `occupy_timeslot` calls on the same
/// open slot exactly one succeeds, and a participant holds at most one slot.
#[automock]
#[async_trait]
pub trait TimeslotRepository: Send + Sync {
    /// All slots ordered by start time, then id.
    async fn list_timeslots(&self) -> TimeslotResult<Vec<Timeslot>>;

    async fn get_timeslot_by_id(&self, id: i64) -> TimeslotResult<Option<Timeslot>>;

    async fn get_timeslot_by_email(&self, email: &str) -> TimeslotResult<Option<Timeslot>>;

    /// Inserts an open slot; the registry assigns the id.
    async fn create_timeslot(
        &self,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> TimeslotResult<Timeslot>;

    /// Claims an open slot for `email`.
    ///
    /// # Errors
    ///
    /// * `TimeslotError::Validation` - Blank email
    /// * `TimeslotError::NotFound` - No slot with this id
    /// * `TimeslotError::Conflict` - Slot already claimed, or `email` already holds a slot
    async fn occupy_timeslot(&self, id: i64, email: &str) -> TimeslotResult<Timeslot>;

    /// Reopens a slot currently held by `email`.
    ///
    /// # Errors
    ///
    /// * `TimeslotError::NotFound` - No slot with this id
    /// * `TimeslotError::Conflict` - The slot is open or held by someone else
    async fn release_timeslot(&self, id: i64, email: &str) -> TimeslotResult<Timeslot>;
}

pub struct PgTimeslotRepository {
    pool: Pool<Postgres>,
}

impl PgTimeslotRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_sqlx_error(err: sqlx::Error) -> TimeslotError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return TimeslotError::Conflict("User already has a timeslot".to_string());
        }
    }
    TimeslotError::Database(err.into())
}

fn not_found(id: i64) -> TimeslotError {
    TimeslotError::NotFound(format!("Timeslot with ID {} not found", id))
}

#[async_trait]
impl TimeslotRepository for PgTimeslotRepository {
    async fn list_timeslots(&self) -> TimeslotResult<Vec<Timeslot>> {
        let rows = sqlx::query_as::<_, DbTimeslot>(
            r#"
            SELECT id, email, start_time, end_time
            FROM timeslots
            ORDER BY start_time ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        tracing::debug!("Loaded {} timeslots", rows.len());
        rows.into_iter().map(DbTimeslot::into_timeslot).collect()
    }

    async fn get_timeslot_by_id(&self, id: i64) -> TimeslotResult<Option<Timeslot>> {
        let row = sqlx::query_as::<_, DbTimeslot>(
            r#"
            SELECT id, email, start_time, end_time
            FROM timeslots
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(DbTimeslot::into_timeslot).transpose()
    }

    async fn get_timeslot_by_email(&self, email: &str) -> TimeslotResult<Option<Timeslot>> {
        let row = sqlx::query_as::<_, DbTimeslot>(
            r#"
            SELECT id, email, start_time, end_time
            FROM timeslots
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(DbTimeslot::into_timeslot).transpose()
    }

    async fn create_timeslot(
        &self,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> TimeslotResult<Timeslot> {
        validate_bounds(start_time, end_time)?;

        let row = sqlx::query_as::<_, DbTimeslot>(
            r#"
            INSERT INTO timeslots (start_time, end_time)
            VALUES ($1, $2)
            RETURNING id, email, start_time, end_time
            "#,
        )
        .bind(start_time)
        .bind(end_time)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        tracing::debug!("Timeslot created: id={}", row.id);
        row.into_timeslot()
    }

    async fn occupy_timeslot(&self, id: i64, email: &str) -> TimeslotResult<Timeslot> {
        validate_participant(email)?;

        // The conditional update is the arbiter between concurrent claims
        let row = sqlx::query_as::<_, DbTimeslot>(
            r#"
            UPDATE timeslots
            SET email = $1
            WHERE id = $2 AND email IS NULL
            RETURNING id, email, start_time, end_time
            "#,
        )
        .bind(email)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        match row {
            Some(row) => {
                tracing::debug!("Timeslot occupied: id={}", id);
                row.into_timeslot()
            }
            None => match self.get_timeslot_by_id(id).await? {
                Some(_) => Err(TimeslotError::Conflict(
                    "Timeslot already occupied".to_string(),
                )),
                None => Err(not_found(id)),
            },
        }
    }

    async fn release_timeslot(&self, id: i64, email: &str) -> TimeslotResult<Timeslot> {
        let row = sqlx::query_as::<_, DbTimeslot>(
            r#"
            UPDATE timeslots
            SET email = NULL
            WHERE id = $1 AND email = $2
            RETURNING id, email, start_time, end_time
            "#,
        )
        .bind(id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        match row {
            Some(row) => {
                tracing::debug!("Timeslot released: id={}", id);
                row.into_timeslot()
            }
            None => match self.get_timeslot_by_id(id).await? {
                Some(slot) if slot.is_claimed() => Err(TimeslotError::Conflict(
                    "Timeslot is held by another participant".to_string(),
                )),
                Some(_) => Err(TimeslotError::Conflict(
                    "Timeslot is not occupied".to_string(),
                )),
                None => Err(not_found(id)),
            },
        }
    }
}
