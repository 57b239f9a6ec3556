use std::fmt::{Display, Formatter};
use std::future::Future;

use chrono::{DateTime, Utc};
use talentgate_core::{Actor, AppError, AppResult, Role};
use talentgate_domain::{AccessErrorKind, Permission};

use crate::policy_evaluator::{PolicyEvaluator, evaluate_snapshot};
use crate::policy_store::GrantLoadState;

mod route_table;

pub use route_table::RouteAccessTable;

/// What a protected path demands of its caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessRequirement {
    /// Permissions checked after the role check.
    pub permissions: Vec<Permission>,
    /// When true every permission is needed, otherwise any one suffices.
    pub require_all: bool,
    /// Allowed roles; empty means any role.
    pub roles: Vec<Role>,
}

impl AccessRequirement {
    /// Requires a single permission.
    #[must_use]
    pub fn permission(permission: Permission) -> Self {
        Self {
            permissions: vec![permission],
            ..Self::default()
        }
    }

    /// Requires at least one of the permissions.
    #[must_use]
    pub fn any_of(permissions: Vec<Permission>) -> Self {
        Self {
            permissions,
            ..Self::default()
        }
    }

    /// Requires every one of the permissions.
    #[must_use]
    pub fn all_of(permissions: Vec<Permission>) -> Self {
        Self {
            permissions,
            require_all: true,
            ..Self::default()
        }
    }

    /// Requires one of the roles.
    #[must_use]
    pub fn roles(roles: Vec<Role>) -> Self {
        Self {
            roles,
            ..Self::default()
        }
    }

    /// Adds a role restriction to this requirement.
    #[must_use]
    pub fn with_roles(mut self, roles: Vec<Role>) -> Self {
        self.roles = roles;
        self
    }

    /// Returns whether the requirement lets everyone through.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.permissions.is_empty() && self.roles.is_empty()
    }
}

/// Why a gate refused entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDenial {
    /// Roles that would have been accepted, when the role check failed.
    pub missing_roles: Vec<Role>,
    /// Permissions the actor lacks.
    pub missing_permissions: Vec<Permission>,
    /// Whether every listed permission was required.
    pub require_all: bool,
}

impl Display for AccessDenial {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        if !self.missing_roles.is_empty() {
            let roles = self
                .missing_roles
                .iter()
                .map(Role::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            return write!(formatter, "requires one of the roles: {roles}");
        }

        let permissions = self
            .missing_permissions
            .iter()
            .map(Permission::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        if self.require_all {
            write!(formatter, "missing required permissions: {permissions}")
        } else {
            write!(formatter, "requires one of the permissions: {permissions}")
        }
    }
}

/// Gate state for one evaluation: `Pending` or exactly one terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    /// Grants are still loading; show a neutral state.
    Pending,
    /// The actor may proceed.
    Granted,
    /// The actor may not proceed.
    Denied(AccessDenial),
    /// Grants could not be fetched.
    Errored(AccessErrorKind),
}

/// Presentation options on denial.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateOptions {
    /// Show an error naming what is missing instead of the fallback.
    pub show_error: bool,
}

/// What a guarded render path should produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateRender<T> {
    /// Grants are loading.
    Pending,
    /// Access granted; render the protected content.
    Children(T),
    /// Access refused quietly.
    Fallback(T),
    /// Access refused visibly.
    Error(String),
}

/// Applies a requirement to an actor given a grant load state.
#[must_use]
pub fn decide(
    state: &GrantLoadState,
    actor: &Actor,
    requirement: &AccessRequirement,
    now: DateTime<Utc>,
) -> GateState {
    if let Some(state) = decide_without_grants(actor, requirement) {
        return state;
    }

    match state {
        GrantLoadState::Loading => return GateState::Pending,
        GrantLoadState::Failed(kind) => return GateState::Errored(*kind),
        GrantLoadState::Ready(_) => {}
    }

    let missing_permissions = requirement
        .permissions
        .iter()
        .filter(|permission| !evaluate_snapshot(state, actor, permission, now).granted)
        .cloned()
        .collect::<Vec<_>>();

    let granted = if requirement.require_all {
        missing_permissions.is_empty()
    } else {
        missing_permissions.len() < requirement.permissions.len()
    };

    if granted {
        GateState::Granted
    } else {
        GateState::Denied(AccessDenial {
            missing_roles: Vec::new(),
            missing_permissions,
            require_all: requirement.require_all,
        })
    }
}

/// Settles the role check and permission-free requirements.
///
/// Role restrictions are checked first and deny even while grants load.
fn decide_without_grants(actor: &Actor, requirement: &AccessRequirement) -> Option<GateState> {
    if !requirement.roles.is_empty() && !requirement.roles.contains(actor.role()) {
        return Some(GateState::Denied(AccessDenial {
            missing_roles: requirement.roles.clone(),
            missing_permissions: Vec::new(),
            require_all: requirement.require_all,
        }));
    }

    requirement.permissions.is_empty().then_some(GateState::Granted)
}

/// Enforces requirements for render paths, actions and routes.
///
/// The gate only reads verdicts and keeps no state of its own; every call
/// evaluates afresh against the store's current snapshot.
#[derive(Clone)]
pub struct AccessGate {
    evaluator: PolicyEvaluator,
}

impl AccessGate {
    /// Creates a gate over an evaluator.
    #[must_use]
    pub fn new(evaluator: PolicyEvaluator) -> Self {
        Self { evaluator }
    }

    /// Returns the current gate state without waiting for grants.
    pub async fn check(&self, actor: &Actor, requirement: &AccessRequirement) -> GateState {
        if let Some(state) = decide_without_grants(actor, requirement) {
            return state;
        }

        let state = self.evaluator.store().snapshot(actor.user_id()).await;
        decide(&state, actor, requirement, Utc::now())
    }

    /// Returns a terminal gate state, waiting for grants when needed.
    pub async fn check_settled(&self, actor: &Actor, requirement: &AccessRequirement) -> GateState {
        if let Some(state) = decide_without_grants(actor, requirement) {
            return state;
        }

        let state = self.evaluator.settled_state(actor).await;
        decide(&state, actor, requirement, Utc::now())
    }

    /// Chooses what a guarded render path should produce.
    pub async fn render<T>(
        &self,
        actor: &Actor,
        requirement: &AccessRequirement,
        options: GateOptions,
        children: impl FnOnce() -> T,
        fallback: impl FnOnce() -> T,
    ) -> GateRender<T> {
        match self.check(actor, requirement).await {
            GateState::Pending => GateRender::Pending,
            GateState::Granted => GateRender::Children(children()),
            GateState::Denied(denial) if options.show_error => {
                GateRender::Error(format!("access denied: {denial}"))
            }
            GateState::Errored(kind) if options.show_error => {
                GateRender::Error(format!("unable to verify access: {kind}"))
            }
            GateState::Denied(_) | GateState::Errored(_) => GateRender::Fallback(fallback()),
        }
    }

    /// Runs an action only when the requirement is met.
    pub async fn guard<T, F, Fut>(
        &self,
        actor: &Actor,
        requirement: &AccessRequirement,
        action: F,
    ) -> AppResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        match self.check_settled(actor, requirement).await {
            GateState::Granted => action().await,
            GateState::Denied(denial) => Err(AppError::Forbidden(denial.to_string())),
            GateState::Errored(kind) => Err(AppError::Unavailable(format!(
                "unable to verify access: {kind}"
            ))),
            GateState::Pending => Err(AppError::Internal(
                "settled gate check reported a pending state".to_owned(),
            )),
        }
    }
}

#[cfg(test)]
mod tests;
