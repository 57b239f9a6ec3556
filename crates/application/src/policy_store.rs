//! Grant snapshots per actor, with a bounded-time cache.
//!
//! The store is the only component that suspends: every other part of the
//! evaluation path works on a snapshot it hands out. Snapshots are served
//! fresh for `fresh_for`, served stale while a background refresh runs until
//! `retain_for`, and evicted after that. Grant writes never invalidate the
//! cache, so readers may lag a mutation by up to the freshness window.

mod cache;
mod decode;

use std::sync::Arc;

use talentgate_core::{AppError, AppResult, UserId};
use talentgate_domain::{AccessErrorKind, GrantSet};
use tracing::{debug, warn};

use crate::policy_ports::GrantRepository;

use cache::{CacheLookup, GrantCache};

pub use cache::PolicyCacheConfig;

/// Availability of an actor's grants at the moment of a check.
#[derive(Debug, Clone)]
pub enum GrantLoadState {
    /// A fetch is in flight and nothing usable is cached.
    Loading,
    /// A snapshot is available.
    Ready(Arc<GrantSet>),
    /// The last fetch failed.
    Failed(AccessErrorKind),
}

/// Policy store backed by a grant repository.
#[derive(Clone)]
pub struct PolicyStore {
    repository: Arc<dyn GrantRepository>,
    cache: Arc<GrantCache>,
}

impl PolicyStore {
    /// Creates a store with its own cache.
    #[must_use]
    pub fn new(repository: Arc<dyn GrantRepository>, config: PolicyCacheConfig) -> Self {
        Self {
            repository,
            cache: Arc::new(GrantCache::new(config)),
        }
    }

    /// Returns the grants for a user, fetching when nothing usable is cached.
    ///
    /// A stale snapshot is returned immediately and refreshed in the
    /// background. Store failures surface as `AppError::Unavailable`.
    pub async fn load_grants(&self, user_id: UserId) -> AppResult<Arc<GrantSet>> {
        match self.cache.lookup(user_id).await {
            CacheLookup::Fresh(grants) => Ok(grants),
            CacheLookup::Stale(grants) => {
                self.spawn_refresh(user_id).await;
                Ok(grants)
            }
            CacheLookup::Failed(_) | CacheLookup::Miss => self.fetch_and_store(user_id).await,
        }
    }

    /// Returns the current load state without waiting on the repository.
    ///
    /// On a miss this starts a background fetch, at most one per user id,
    /// and reports `Loading` until it lands.
    pub async fn snapshot(&self, user_id: UserId) -> GrantLoadState {
        match self.cache.lookup(user_id).await {
            CacheLookup::Fresh(grants) => GrantLoadState::Ready(grants),
            CacheLookup::Stale(grants) => {
                self.spawn_refresh(user_id).await;
                GrantLoadState::Ready(grants)
            }
            CacheLookup::Failed(kind) => GrantLoadState::Failed(kind),
            CacheLookup::Miss => {
                self.spawn_refresh(user_id).await;
                GrantLoadState::Loading
            }
        }
    }

    /// Drops any cached snapshot or failure for a user.
    pub async fn invalidate(&self, user_id: UserId) {
        self.cache.remove(user_id).await;
    }

    /// Clears a recorded failure and fetches again.
    pub async fn retry(&self, user_id: UserId) -> AppResult<Arc<GrantSet>> {
        self.cache.remove(user_id).await;
        self.fetch_and_store(user_id).await
    }

    /// Returns whether a background fetch is running for a user.
    pub async fn is_fetching(&self, user_id: UserId) -> bool {
        self.cache.is_fetching(user_id).await
    }

    async fn spawn_refresh(&self, user_id: UserId) {
        if !self.cache.begin_fetch(user_id).await {
            return;
        }

        let store = self.clone();
        tokio::spawn(async move {
            let fetch = tokio::spawn({
                let store = store.clone();
                async move { store.fetch_and_store(user_id).await }
            });

            match fetch.await {
                Ok(Ok(_)) => {}
                Ok(Err(error)) => debug!(%user_id, %error, "background grant refresh failed"),
                Err(error) => {
                    // The fetch task died before recording an outcome.
                    warn!(%user_id, %error, "background grant refresh aborted");
                    store
                        .cache
                        .store_failure(user_id, AccessErrorKind::StoreUnavailable)
                        .await;
                }
            }
            store.cache.finish_fetch(user_id).await;
        });
    }

    async fn fetch_and_store(&self, user_id: UserId) -> AppResult<Arc<GrantSet>> {
        match self.fetch(user_id).await {
            Ok(grants) => {
                let grants = Arc::new(grants);
                self.cache.store_ready(user_id, Arc::clone(&grants)).await;
                Ok(grants)
            }
            Err(error) => {
                warn!(%user_id, %error, "failed to load grants");
                self.cache
                    .store_failure(user_id, AccessErrorKind::StoreUnavailable)
                    .await;
                Err(AppError::Unavailable(format!(
                    "grants for user '{user_id}' could not be loaded: {error}"
                )))
            }
        }
    }

    async fn fetch(&self, user_id: UserId) -> AppResult<GrantSet> {
        let Some(role) = self.repository.find_user_role(user_id).await? else {
            debug!(%user_id, "user id did not resolve; evaluating with no grants");
            return Ok(GrantSet::unknown_actor());
        };

        let role_records = self.repository.list_role_grants(&role).await?;
        let user_records = self.repository.list_user_grants(user_id).await?;

        let mut skipped_rows = 0_usize;
        let mut role_grants = Vec::with_capacity(role_records.len());
        for record in role_records {
            match decode::decode_role_grant(record) {
                Ok(grant) => role_grants.push(grant),
                Err(error) => {
                    skipped_rows += 1;
                    warn!(%user_id, role = %role, %error, "skipping malformed role grant row");
                }
            }
        }

        let mut user_grants = Vec::with_capacity(user_records.len());
        for record in user_records {
            let grant_id = record.grant_id.clone();
            match decode::decode_user_grant(record) {
                Ok(grant) => user_grants.push(grant),
                Err(error) => {
                    skipped_rows += 1;
                    warn!(%user_id, %grant_id, %error, "skipping malformed user grant row");
                }
            }
        }

        debug!(
            %user_id,
            role = %role,
            role_grants = role_grants.len(),
            user_grants = user_grants.len(),
            skipped_rows,
            "loaded grants"
        );

        Ok(GrantSet {
            skipped_rows,
            ..GrantSet::new(role_grants, user_grants)
        })
    }
}
