use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per schedule id. Holding the guard serialises every
/// read-modify-write of that schedule inside this process; other schedules
/// are unaffected.
///
/// The map only keeps weak handles, so a slot lives exactly as long as
/// someone holds or waits on it.
#[derive(Default)]
pub struct ScheduleLocks {
    slots: Mutex<HashMap<u64, Weak<AsyncMutex<()>>>>,
}

pub type ScheduleGuard = OwnedMutexGuard<()>;

impl ScheduleLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, schedule_id: u64) -> Arc<AsyncMutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(slot) = slots.get(&schedule_id).and_then(Weak::upgrade) {
            return slot;
        }
        slots.retain(|_, slot| slot.strong_count() > 0);
        let slot = Arc::new(AsyncMutex::new(()));
        slots.insert(schedule_id, Arc::downgrade(&slot));
        slot
    }

    pub async fn acquire(&self, schedule_id: u64) -> ScheduleGuard {
        self.slot(schedule_id).lock_owned().await
    }

    /// Number of schedules currently held or awaited.
    pub fn in_use(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.values().filter(|slot| slot.strong_count() > 0).count()
    }
}
