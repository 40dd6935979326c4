use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// Per-doctor mutexes serialising "check slot, then write" within this process.
#[derive(Default)]
pub struct SlotLocks {
    doctors: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl SlotLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Held until the returned guard is dropped.
    pub async fn acquire(&self, doctor_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut doctors = self.doctors.lock().await;
            Arc::clone(doctors.entry(doctor_id).or_default())
        };

        debug!("Waiting for slot lock of doctor {}", doctor_id);
        lock.lock_owned().await
    }
}
