use std::str::FromStr;

use talentgate_core::{AppError, Role};
use talentgate_domain::{PermissionAction, PermissionCategory, ResourceScope, RoleGrant, UserGrant};

use crate::policy_ports::{RoleGrantRecord, UserGrantRecord};

type GrantKey = (PermissionCategory, PermissionAction, Option<ResourceScope>);

fn decode_key(
    category: Option<&str>,
    action: Option<&str>,
    resource: Option<&str>,
) -> Result<GrantKey, AppError> {
    let category = category
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Validation("grant row has no category".to_owned()))?;
    let action = action
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Validation("grant row has no action".to_owned()))?;
    let resource = resource
        .filter(|value| !value.trim().is_empty())
        .map(ResourceScope::new)
        .transpose()?;

    Ok((
        PermissionCategory::from_str(category)?,
        PermissionAction::from_str(action)?,
        resource,
    ))
}

pub(super) fn decode_role_grant(record: RoleGrantRecord) -> Result<RoleGrant, AppError> {
    let (category, action, resource) = decode_key(
        record.category.as_deref(),
        record.action.as_deref(),
        record.resource.as_deref(),
    )?;

    Ok(RoleGrant {
        role: Role::new(record.role.as_str())?,
        category,
        action,
        resource,
        granted: record.granted,
    })
}

pub(super) fn decode_user_grant(record: UserGrantRecord) -> Result<UserGrant, AppError> {
    let (category, action, resource) = decode_key(
        record.category.as_deref(),
        record.action.as_deref(),
        record.resource.as_deref(),
    )?;

    Ok(UserGrant {
        grant_id: record.grant_id,
        user_id: record.user_id,
        category,
        action,
        resource,
        granted: record.granted,
        expires_at: record.expires_at,
        conditions: record.conditions,
    })
}
