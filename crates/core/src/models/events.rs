use serde::{Deserialize, Serialize};

/// Change notifications fanned out to event stream subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TimeslotEvent {
    #[serde(rename = "OccupiedEvent")]
    Occupied { id: i64, email: String },

    #[serde(rename = "ReleasedEvent")]
    Released { id: i64, email: String },
}

impl TimeslotEvent {
    /// SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            TimeslotEvent::Occupied { .. } => "timeslot_occupied",
            TimeslotEvent::Released { .. } => "timeslot_released",
        }
    }

    pub fn timeslot_id(&self) -> i64 {
        match self {
            TimeslotEvent::Occupied { id, .. } | TimeslotEvent::Released { id, .. } => *id,
        }
    }
}
