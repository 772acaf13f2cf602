//! Persisted star counter.

use tracing::{info, warn};

use super::KvStore;

/// Key the count is stored under, as a decimal string.
pub const STAR_COUNT_KEY: &str = "star_count";

/// Count of recorded successes, written through to a [`KvStore`].
///
/// Storage problems never stop the counter: a failed or garbled read starts
/// from zero and a failed write is logged while the in-memory count moves on.
pub struct RewardCounter<S> {
    store: S,
    count: u64,
}

impl<S: KvStore> RewardCounter<S> {
    pub fn load(store: S) -> Self {
        let count = match store.get(STAR_COUNT_KEY) {
            Ok(Some(raw)) => raw.trim().parse::<u64>().unwrap_or_else(|_| {
                warn!(value = %raw, "unparseable star count, starting from zero");
                0
            }),
            Ok(None) => 0,
            Err(e) => {
                warn!(error = %e, "could not read star count, starting from zero");
                0
            }
        };
        Self { store, count }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Add one star and persist. Returns the new count.
    pub fn increment(&mut self) -> u64 {
        self.count = self.count.saturating_add(1);
        self.persist();
        info!(stars = self.count, "star earned");
        self.count
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.persist();
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.set(STAR_COUNT_KEY, &self.count.to_string()) {
            warn!(error = %e, stars = self.count, "could not persist star count");
        }
    }
}
