use std::sync::Arc;

use talentgate_application::{
    AccessGate, AccessRequirement, GrantAdminRepository, GrantAdminService, GrantRepository,
    PolicyCacheConfig, PolicyEvaluator, PolicyStore, RouteAccessTable,
};
use talentgate_core::Role;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub policy_evaluator: PolicyEvaluator,
    pub access_gate: AccessGate,
    pub grant_admin_service: GrantAdminService,
    pub route_access: Arc<RouteAccessTable>,
}

impl AppState {
    /// Wires the policy store, evaluator, gate and admin service over the repositories.
    pub fn new(
        grant_repository: Arc<dyn GrantRepository>,
        grant_admin_repository: Arc<dyn GrantAdminRepository>,
        cache: PolicyCacheConfig,
    ) -> Self {
        let policy_evaluator = PolicyEvaluator::new(PolicyStore::new(grant_repository, cache));

        Self {
            access_gate: AccessGate::new(policy_evaluator.clone()),
            grant_admin_service: GrantAdminService::new(
                policy_evaluator.clone(),
                grant_admin_repository,
            ),
            policy_evaluator,
            route_access: Arc::new(route_access_table()),
        }
    }
}

/// Route-level requirements enforced by `middleware::route_gate`.
pub fn route_access_table() -> RouteAccessTable {
    RouteAccessTable::new().with_rule("/api/admin", AccessRequirement::roles(vec![Role::admin()]))
}
