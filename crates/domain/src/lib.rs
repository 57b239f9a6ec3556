//! Permission descriptors, grants and verdicts.

#![forbid(unsafe_code)]

pub mod catalog;
mod grant;
mod permission;
mod verdict;

pub use grant::{GrantSet, Resolution, RoleGrant, UserGrant};
pub use permission::{
    Permission, PermissionAction, PermissionCategory, ResourceScope, scope_covers,
};
pub use verdict::{AccessErrorKind, Verdict, VerdictState};
