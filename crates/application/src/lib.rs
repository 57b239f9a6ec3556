//! Application services and ports for permission evaluation.

#![forbid(unsafe_code)]

mod access_gate;
mod grant_admin_service;
mod policy_evaluator;
mod policy_ports;
mod policy_store;

pub use access_gate::{
    AccessDenial, AccessGate, AccessRequirement, GateOptions, GateRender, GateState,
    RouteAccessTable, decide,
};
pub use grant_admin_service::GrantAdminService;
pub use policy_evaluator::{
    Combine, Explanation, PolicyEvaluator, evaluate_snapshot, evaluate_snapshot_many,
};
pub use policy_ports::{
    CreateUserGrantInput, GrantAdminRepository, GrantRepository, RoleGrantRecord,
    SetRoleGrantInput, UserGrantEntry, UserGrantRecord,
};
pub use policy_store::{GrantLoadState, PolicyCacheConfig, PolicyStore};
