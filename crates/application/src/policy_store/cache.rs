use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use talentgate_core::{AppError, AppResult, UserId};
use talentgate_domain::{AccessErrorKind, GrantSet};
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

/// Freshness and retention windows for cached grant snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyCacheConfig {
    fresh_for: Duration,
    retain_for: Duration,
}

impl PolicyCacheConfig {
    /// Default freshness window.
    pub const DEFAULT_FRESH_FOR: Duration = Duration::from_secs(5 * 60);
    /// Default retention window.
    pub const DEFAULT_RETAIN_FOR: Duration = Duration::from_secs(10 * 60);

    /// Creates a config; retention must be at least as long as freshness.
    pub fn new(fresh_for: Duration, retain_for: Duration) -> AppResult<Self> {
        if retain_for < fresh_for {
            return Err(AppError::Validation(format!(
                "cache retention ({}s) must not be shorter than freshness ({}s)",
                retain_for.as_secs(),
                fresh_for.as_secs()
            )));
        }

        Ok(Self {
            fresh_for,
            retain_for,
        })
    }

    /// Returns how long a snapshot is served without refetching.
    #[must_use]
    pub fn fresh_for(&self) -> Duration {
        self.fresh_for
    }

    /// Returns how long a snapshot is kept before eviction.
    #[must_use]
    pub fn retain_for(&self) -> Duration {
        self.retain_for
    }
}

impl Default for PolicyCacheConfig {
    fn default() -> Self {
        Self {
            fresh_for: Self::DEFAULT_FRESH_FOR,
            retain_for: Self::DEFAULT_RETAIN_FOR,
        }
    }
}

#[derive(Debug, Clone)]
enum CacheSlot {
    Ready {
        grants: Arc<GrantSet>,
        fetched_at: Instant,
    },
    Failed {
        kind: AccessErrorKind,
        failed_at: Instant,
    },
}

/// Result of a cache lookup.
#[derive(Debug, Clone)]
pub(super) enum CacheLookup {
    Fresh(Arc<GrantSet>),
    Stale(Arc<GrantSet>),
    Failed(AccessErrorKind),
    Miss,
}

/// Per-user snapshot cache plus the set of fetches currently running.
#[derive(Debug)]
pub(super) struct GrantCache {
    config: PolicyCacheConfig,
    slots: RwLock<HashMap<UserId, CacheSlot>>,
    in_flight: Mutex<HashSet<UserId>>,
}

impl GrantCache {
    pub(super) fn new(config: PolicyCacheConfig) -> Self {
        Self {
            config,
            slots: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub(super) async fn lookup(&self, user_id: UserId) -> CacheLookup {
        let now = Instant::now();
        {
            let slots = self.slots.read().await;
            match slots.get(&user_id) {
                None => return CacheLookup::Miss,
                Some(CacheSlot::Ready { grants, fetched_at }) => {
                    let age = now.saturating_duration_since(*fetched_at);
                    if age < self.config.fresh_for {
                        return CacheLookup::Fresh(Arc::clone(grants));
                    }
                    if age < self.config.retain_for {
                        return CacheLookup::Stale(Arc::clone(grants));
                    }
                }
                Some(CacheSlot::Failed { kind, failed_at }) => {
                    if now.saturating_duration_since(*failed_at) < self.config.fresh_for {
                        return CacheLookup::Failed(*kind);
                    }
                }
            }
        }

        // Past its window: evict so the next lookup starts a fetch.
        let mut slots = self.slots.write().await;
        if slots
            .get(&user_id)
            .is_some_and(|slot| self.is_expired(slot, now))
        {
            slots.remove(&user_id);
        }
        CacheLookup::Miss
    }

    fn is_expired(&self, slot: &CacheSlot, now: Instant) -> bool {
        match slot {
            CacheSlot::Ready { fetched_at, .. } => {
                now.saturating_duration_since(*fetched_at) >= self.config.retain_for
            }
            CacheSlot::Failed { failed_at, .. } => {
                now.saturating_duration_since(*failed_at) >= self.config.fresh_for
            }
        }
    }

    pub(super) async fn store_ready(&self, user_id: UserId, grants: Arc<GrantSet>) {
        let now = Instant::now();
        let mut slots = self.slots.write().await;
        self.sweep(&mut slots, now);
        slots.insert(
            user_id,
            CacheSlot::Ready {
                grants,
                fetched_at: now,
            },
        );
    }

    /// Records a failed fetch unless a usable snapshot is already cached.
    pub(super) async fn store_failure(&self, user_id: UserId, kind: AccessErrorKind) {
        let now = Instant::now();
        let mut slots = self.slots.write().await;
        self.sweep(&mut slots, now);
        let keep_existing = matches!(
            slots.get(&user_id),
            Some(CacheSlot::Ready { fetched_at, .. })
                if now.saturating_duration_since(*fetched_at) < self.config.retain_for
        );
        if !keep_existing {
            slots.insert(
                user_id,
                CacheSlot::Failed {
                    kind,
                    failed_at: now,
                },
            );
        }
    }

    /// Drops every slot past its window, not only the one being written.
    fn sweep(&self, slots: &mut HashMap<UserId, CacheSlot>, now: Instant) {
        slots.retain(|_, slot| !self.is_expired(slot, now));
    }

    #[cfg(test)]
    pub(super) async fn cached_users(&self) -> usize {
        self.slots.read().await.len()
    }

    pub(super) async fn remove(&self, user_id: UserId) {
        self.slots.write().await.remove(&user_id);
    }

    /// Marks a fetch as running; returns false when one already is.
    pub(super) async fn begin_fetch(&self, user_id: UserId) -> bool {
        self.in_flight.lock().await.insert(user_id)
    }

    pub(super) async fn finish_fetch(&self, user_id: UserId) {
        self.in_flight.lock().await.remove(&user_id);
    }

    pub(super) async fn is_fetching(&self, user_id: UserId) -> bool {
        self.in_flight.lock().await.contains(&user_id)
    }
}
