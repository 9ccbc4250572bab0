//! # SlotBook Core
//!
//! Domain types shared by the persistence and HTTP layers: the [`Timeslot`]
//! record, the events broadcast when slots change hands, request payloads and
//! the error taxonomy.
//!
//! [`Timeslot`]: models::timeslot::Timeslot

pub mod errors;
pub mod models;
