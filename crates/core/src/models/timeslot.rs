use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use crate::errors::{TimeslotError, TimeslotResult};

/// Whether a slot has a participant attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus<'a> {
    Open,
    Claimed(&'a str),
}

/// A bounded interval on the universal timeline, optionally claimed by a
/// participant identified by email.
///
/// Construction guarantees `start_time < end_time`. The id is assigned by the
/// registry that owns the slot and never changes afterwards, so two values
/// compare equal exactly when their ids match.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "TimeslotFields")]
pub struct Timeslot {
    id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeslotFields {
    id: i64,
    #[serde(default)]
    email: Option<String>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

impl TryFrom<TimeslotFields> for Timeslot {
    type Error = TimeslotError;

    fn try_from(fields: TimeslotFields) -> TimeslotResult<Self> {
        Timeslot::new(fields.id, fields.start_time, fields.end_time, fields.email)
    }
}

impl Timeslot {
    /// Builds a slot, rejecting zero-length and inverted intervals.
    pub fn new(
        id: i64,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        email: Option<String>,
    ) -> TimeslotResult<Self> {
        validate_bounds(start_time, end_time)?;

        Ok(Self {
            id,
            email,
            start_time,
            end_time,
        })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn status(&self) -> SlotStatus<'_> {
        match &self.email {
            Some(email) => SlotStatus::Claimed(email),
            None => SlotStatus::Open,
        }
    }

    pub fn is_claimed(&self) -> bool {
        self.email.is_some()
    }

    /// Always positive.
    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    /// Half-open overlap: a slot ending at 10:30 does not overlap one starting at 10:30.
    pub fn overlaps(&self, other: &Timeslot) -> bool {
        self.overlaps_range(other.start_time, other.end_time)
    }

    pub fn overlaps_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time < end && start < self.end_time
    }

    /// Attaches a participant to an open slot.
    ///
    /// # Errors
    ///
    /// * `TimeslotError::Validation` - The email is empty or whitespace
    /// * `TimeslotError::Conflict` - The slot is already claimed
    pub fn claim(&mut self, email: impl Into<String>) -> TimeslotResult<()> {
        let email = email.into();
        validate_participant(&email)?;
        if self.email.is_some() {
            return Err(TimeslotError::Conflict("Timeslot already occupied".to_string()));
        }

        self.email = Some(email);
        Ok(())
    }

    /// Detaches the participant, returning it. Id and bounds stay as they were.
    pub fn release(&mut self) -> Option<String> {
        self.email.take()
    }
}

impl PartialEq for Timeslot {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Timeslot {}

impl Hash for Timeslot {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Rejects zero-length and inverted intervals.
pub fn validate_bounds(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> TimeslotResult<()> {
    if start_time >= end_time {
        return Err(TimeslotError::Validation(format!(
            "Timeslot must start before it ends (start {}, end {})",
            start_time.to_rfc3339(),
            end_time.to_rfc3339()
        )));
    }
    Ok(())
}

/// The only check applied to a participant marker: it must not be blank.
pub fn validate_participant(email: &str) -> TimeslotResult<()> {
    if email.trim().is_empty() {
        return Err(TimeslotError::Validation("Email cannot be empty".to_string()));
    }
    Ok(())
}

/// Lays out `count` contiguous intervals of `slot_length` starting at `start`.
///
/// Ids are not part of the output; the registry assigns them on insert.
pub fn back_to_back(
    start: DateTime<Utc>,
    slot_length: Duration,
    count: usize,
) -> TimeslotResult<Vec<(DateTime<Utc>, DateTime<Utc>)>> {
    if slot_length <= Duration::zero() {
        return Err(TimeslotError::Validation(
            "Slot length must be positive".to_string(),
        ));
    }

    let mut bounds = Vec::with_capacity(count);
    let mut cursor = start;
    for _ in 0..count {
        let end = cursor
            .checked_add_signed(slot_length)
            .ok_or_else(|| TimeslotError::Validation("Slot range out of bounds".to_string()))?;
        bounds.push((cursor, end));
        cursor = end;
    }

    Ok(bounds)
}
