use chrono::{DateTime, Utc};
use talentgate_core::{Actor, AppError, AppResult};
use talentgate_domain::{AccessErrorKind, Permission, Resolution, Verdict};

use crate::policy_store::{GrantLoadState, PolicyStore};

/// Resolves a single permission against a load state at `now`.
///
/// Loading and store failure are reported before the administrator bypass, so
/// the caller always learns that the snapshot was incomplete.
#[must_use]
pub fn evaluate_snapshot(
    state: &GrantLoadState,
    actor: &Actor,
    permission: &Permission,
    now: DateTime<Utc>,
) -> Verdict {
    match state {
        GrantLoadState::Loading => Verdict::loading(),
        GrantLoadState::Failed(kind) => Verdict::errored(*kind),
        GrantLoadState::Ready(grants) => {
            Verdict::from_decision(grants.resolve(actor, permission, now).is_granted())
        }
    }
}

/// Combination rule for multi-permission checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combine {
    /// At least one permission must be granted.
    Any,
    /// Every permission must be granted.
    All,
}

/// Folds single-permission verdicts over one load state.
///
/// A loading or failed state is never granted, whatever the combination.
#[must_use]
pub fn evaluate_snapshot_many(
    state: &GrantLoadState,
    actor: &Actor,
    permissions: &[Permission],
    combine: Combine,
    now: DateTime<Utc>,
) -> Verdict {
    let mut verdicts = permissions
        .iter()
        .map(|permission| evaluate_snapshot(state, actor, permission, now));

    match state {
        GrantLoadState::Loading => Verdict::loading(),
        GrantLoadState::Failed(kind) => Verdict::errored(*kind),
        GrantLoadState::Ready(_) => Verdict::from_decision(match combine {
            Combine::Any => verdicts.any(|verdict| verdict.granted),
            Combine::All => verdicts.all(|verdict| verdict.granted),
        }),
    }
}

/// Which rule decided a check, plus diagnostics about the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    /// Settled verdict.
    pub verdict: Verdict,
    /// Rule that produced the verdict.
    pub resolution: Resolution,
    /// Non-fatal conditions observed in the snapshot.
    pub diagnostics: Vec<AccessErrorKind>,
}

/// Application service answering permission checks for actors.
#[derive(Clone)]
pub struct PolicyEvaluator {
    store: PolicyStore,
}

impl PolicyEvaluator {
    /// Creates an evaluator over a policy store.
    #[must_use]
    pub fn new(store: PolicyStore) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &PolicyStore {
        &self.store
    }

    /// Returns the current verdict without waiting for grants to load.
    pub async fn evaluate(&self, actor: &Actor, permission: &Permission) -> Verdict {
        let state = self.store.snapshot(actor.user_id()).await;
        evaluate_snapshot(&state, actor, permission, Utc::now())
    }

    /// Returns whether any of the permissions is granted.
    pub async fn has_any(&self, actor: &Actor, permissions: &[Permission]) -> Verdict {
        let state = self.store.snapshot(actor.user_id()).await;
        evaluate_snapshot_many(&state, actor, permissions, Combine::Any, Utc::now())
    }

    /// Returns whether every permission is granted.
    pub async fn has_all(&self, actor: &Actor, permissions: &[Permission]) -> Verdict {
        let state = self.store.snapshot(actor.user_id()).await;
        evaluate_snapshot_many(&state, actor, permissions, Combine::All, Utc::now())
    }

    /// Returns the load state after waiting for any fetch to complete.
    ///
    /// Store failures become `GrantLoadState::Failed` rather than errors.
    pub async fn settled_state(&self, actor: &Actor) -> GrantLoadState {
        match self.store.load_grants(actor.user_id()).await {
            Ok(grants) => GrantLoadState::Ready(grants),
            Err(_) => GrantLoadState::Failed(AccessErrorKind::StoreUnavailable),
        }
    }

    /// Returns whether the actor holds the permission, waiting for grants.
    pub async fn has_permission(&self, actor: &Actor, permission: &Permission) -> AppResult<bool> {
        let grants = self.store.load_grants(actor.user_id()).await?;
        Ok(grants.resolve(actor, permission, Utc::now()).is_granted())
    }

    /// Ensures the actor holds the permission, waiting for grants.
    pub async fn require_permission(&self, actor: &Actor, permission: &Permission) -> AppResult<()> {
        if self.has_permission(actor, permission).await? {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "user '{}' with role '{}' is missing permission '{permission}'",
            actor.user_id(),
            actor.role()
        )))
    }

    /// Reports which rule decides a check, waiting for grants.
    pub async fn explain(&self, actor: &Actor, permission: &Permission) -> AppResult<Explanation> {
        let grants = self.store.load_grants(actor.user_id()).await?;
        let resolution = grants.resolve(actor, permission, Utc::now());

        let mut diagnostics = Vec::new();
        if !grants.actor_resolved {
            diagnostics.push(AccessErrorKind::UnknownActor);
        }
        if grants.skipped_rows > 0 {
            diagnostics.push(AccessErrorKind::MalformedGrant);
        }

        Ok(Explanation {
            verdict: Verdict::from_decision(resolution.is_granted()),
            resolution,
            diagnostics,
        })
    }
}
