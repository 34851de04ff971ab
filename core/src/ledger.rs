//! Points ledger.
//!
//! Awards go through the store's atomic increment when it has one. Otherwise
//! the award is a read-current / add / upsert sequence, serialized per user
//! inside this process. That fallback still loses updates when two devices
//! award points for the same account at the same moment: each reads the old
//! total and the last write wins.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{CoreError, CoreResult};
use crate::models::UserSettings;
use crate::store::FitnessStore;

#[derive(Default)]
pub struct PointsLedger {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl PointsLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(user_id.to_string()).or_default())
    }

    /// Add `delta` points and return the new total.
    ///
    /// `seed` is the row written when the user has no settings yet; its
    /// `updated_at` stamps the award.
    pub fn award<S: FitnessStore + ?Sized>(
        &self,
        store: &S,
        seed: &UserSettings,
        delta: i64,
    ) -> CoreResult<i64> {
        if delta < 0 {
            return Err(CoreError::invalid_input(format!(
                "Point awards must not be negative (got {delta})"
            )));
        }
        let user_id = seed.user_id.as_str();

        if let Some(total) = store.atomic_add_points(seed, delta)? {
            tracing::debug!(user_id, delta, total, "points awarded atomically");
            return Ok(total);
        }

        let lock = self.user_lock(user_id);
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            Self::read_modify_write(store, seed, delta)
        };
        self.release(user_id, &lock);
        let total = result?;
        tracing::debug!(user_id, delta, total, "points awarded");
        Ok(total)
    }

    fn read_modify_write<S: FitnessStore + ?Sized>(
        store: &S,
        seed: &UserSettings,
        delta: i64,
    ) -> CoreResult<i64> {
        let mut settings = store
            .get_settings(&seed.user_id)?
            .unwrap_or_else(|| seed.clone());
        settings.points = settings
            .points
            .checked_add(delta)
            .ok_or_else(|| CoreError::invalid_input("Point total overflow"))?;
        settings.updated_at = seed.updated_at;
        Ok(store.upsert_settings(&settings)?.points)
    }

    /// Drop the user's lock entry once nobody else holds a handle to it.
    fn release(&self, user_id: &str, lock: &Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // One handle in the map, one in `lock`.
        if Arc::strong_count(lock) == 2 {
            locks.remove(user_id);
        }
    }

    #[cfg(test)]
    fn tracked_users(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
