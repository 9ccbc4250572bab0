pub mod events;
pub mod timeslots;
