pub mod timeslot;
