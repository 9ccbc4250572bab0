//! A process-local registry with the same claim rules as the PostgreSQL one.
//! Used by tests and for running the API without a database.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use slotbook_core::{
    errors::{TimeslotError, TimeslotResult},
    models::timeslot::{validate_participant, Timeslot},
};
use tokio::sync::RwLock;

use crate::repositories::timeslot::TimeslotRepository;

#[derive(Default)]
struct Registry {
    last_id: i64,
    slots: BTreeMap<i64, Timeslot>,
}

#[derive(Default)]
pub struct InMemoryTimeslotRepository {
    registry: RwLock<Registry>,
}

impl InMemoryTimeslotRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TimeslotRepository for InMemoryTimeslotRepository {
    async fn list_timeslots(&self) -> TimeslotResult<Vec<Timeslot>> {
        let registry = self.registry.read().await;
        let mut slots: Vec<Timeslot> = registry.slots.values().cloned().collect();
        slots.sort_by_key(|slot| (slot.start_time(), slot.id()));
        Ok(slots)
    }

    async fn get_timeslot_by_id(&self, id: i64) -> TimeslotResult<Option<Timeslot>> {
        Ok(self.registry.read().await.slots.get(&id).cloned())
    }

    async fn get_timeslot_by_email(&self, email: &str) -> TimeslotResult<Option<Timeslot>> {
        let registry = self.registry.read().await;
        Ok(registry
            .slots
            .values()
            .find(|slot| slot.email() == Some(email))
            .cloned())
    }

    async fn create_timeslot(
        &self,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> TimeslotResult<Timeslot> {
        let mut registry = self.registry.write().await;
        let slot = Timeslot::new(registry.last_id + 1, start_time, end_time, None)?;
        registry.last_id = slot.id();
        registry.slots.insert(slot.id(), slot.clone());
        Ok(slot)
    }

    async fn occupy_timeslot(&self, id: i64, email: &str) -> TimeslotResult<Timeslot> {
        validate_participant(email)?;

        let mut registry = self.registry.write().await;
        let already_holds = registry
            .slots
            .values()
            .any(|slot| slot.id() != id && slot.email() == Some(email));

        let slot = registry
            .slots
            .get_mut(&id)
            .ok_or_else(|| TimeslotError::NotFound(format!("Timeslot with ID {} not found", id)))?;

        if slot.is_claimed() {
            return Err(TimeslotError::Conflict("Timeslot already occupied".to_string()));
        }
        if already_holds {
            return Err(TimeslotError::Conflict("User already has a timeslot".to_string()));
        }

        slot.claim(email)?;
        Ok(slot.clone())
    }

    async fn release_timeslot(&self, id: i64, email: &str) -> TimeslotResult<Timeslot> {
        let mut registry = self.registry.write().await;
        let slot = registry
            .slots
            .get_mut(&id)
            .ok_or_else(|| TimeslotError::NotFound(format!("Timeslot with ID {} not found", id)))?;

        match slot.email() {
            Some(holder) if holder == email => {
                slot.release();
                Ok(slot.clone())
            }
            Some(_) => Err(TimeslotError::Conflict(
                "Timeslot is held by another participant".to_string(),
            )),
            None => Err(TimeslotError::Conflict("Timeslot is not occupied".to_string())),
        }
    }
}
