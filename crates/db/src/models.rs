use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use slotbook_core::{errors::TimeslotResult, models::timeslot::Timeslot};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbTimeslot {
    pub id: i64,
    pub email: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl DbTimeslot {
    /// Rows go through the validating constructor; the table CHECK makes failure unlikely.
    pub fn into_timeslot(self) -> TimeslotResult<Timeslot> {
        Timeslot::new(self.id, self.start_time, self.end_time, self.email)
    }
}
