//! Static registry of every permission the marketplace recognizes.
//!
//! Call sites reference these constants instead of building descriptors by
//! hand, so a typoed category/action pair fails to compile rather than
//! silently never matching a grant.

use talentgate_core::AppError;

use crate::permission::{
    Permission, PermissionAction as A, PermissionCategory as C, ResourceScope,
};

// User management.

/// Read the actor's own profile.
pub const USER_READ_OWN_PROFILE: Permission = Permission::scoped(C::User, A::Read, "own_profile");
/// Edit the actor's own profile.
pub const USER_UPDATE_OWN_PROFILE: Permission =
    Permission::scoped(C::User, A::Update, "own_profile");
/// Delete the actor's own account.
pub const USER_DELETE_OWN_PROFILE: Permission =
    Permission::scoped(C::User, A::Delete, "own_profile");
/// Browse every public profile.
pub const USER_READ_ALL: Permission = Permission::scoped(C::User, A::Read, "all");
/// Administer any account.
pub const USER_MANAGE: Permission = Permission::scoped(C::User, A::Manage, "all");

// Content.

/// Create posts.
pub const CONTENT_CREATE: Permission = Permission::new(C::Content, A::Create);
/// Read posts.
pub const CONTENT_READ: Permission = Permission::new(C::Content, A::Read);
/// Edit the actor's own posts.
pub const CONTENT_UPDATE_OWN: Permission = Permission::scoped(C::Content, A::Update, "own");
/// Delete the actor's own posts.
pub const CONTENT_DELETE_OWN: Permission = Permission::scoped(C::Content, A::Delete, "own");
/// Publish posts to the public feed.
pub const CONTENT_PUBLISH: Permission = Permission::new(C::Content, A::Publish);
/// Take down posts authored by others.
pub const CONTENT_MODERATE: Permission = Permission::scoped(C::Content, A::Moderate, "all");

// Jobs.

/// Post a job.
pub const JOBS_CREATE: Permission = Permission::new(C::Jobs, A::Create);
/// Browse job postings.
pub const JOBS_READ: Permission = Permission::new(C::Jobs, A::Read);
/// Edit the actor's own job postings.
pub const JOBS_UPDATE_OWN: Permission = Permission::scoped(C::Jobs, A::Update, "own");
/// Remove the actor's own job postings.
pub const JOBS_DELETE_OWN: Permission = Permission::scoped(C::Jobs, A::Delete, "own");
/// Administer every job posting.
pub const JOBS_MANAGE_ALL: Permission = Permission::scoped(C::Jobs, A::Manage, "all");

// Media.

/// Upload photos, audio and video.
pub const MEDIA_UPLOAD: Permission = Permission::new(C::Media, A::Upload);
/// View uploaded media.
pub const MEDIA_READ: Permission = Permission::new(C::Media, A::Read);
/// Delete the actor's own media.
pub const MEDIA_DELETE_OWN: Permission = Permission::scoped(C::Media, A::Delete, "own");

// Administration.

/// Open the admin console.
pub const ADMIN_ACCESS: Permission = Permission::new(C::Admin, A::Read);
/// Change roles and grants.
pub const ADMIN_MANAGE: Permission = Permission::new(C::Admin, A::Manage);
/// Export platform data.
pub const ADMIN_EXPORT: Permission = Permission::new(C::Admin, A::Export);

// AI features.

/// Use AI-assisted features.
pub const AI_USE: Permission = Permission::new(C::Ai, A::Use);
/// Configure AI providers and quotas.
pub const AI_MANAGE: Permission = Permission::new(C::Ai, A::Manage);

// Billing.

/// View the actor's own invoices and plan.
pub const BILLING_READ_OWN: Permission = Permission::scoped(C::Billing, A::Read, "own");
/// Change the actor's own plan.
pub const BILLING_UPDATE_OWN: Permission = Permission::scoped(C::Billing, A::Update, "own");
/// Administer every subscription.
pub const BILLING_MANAGE: Permission = Permission::scoped(C::Billing, A::Manage, "all");

// System operations.

/// Read operational status.
pub const SYSTEM_READ: Permission = Permission::new(C::System, A::Read);
/// Change system settings.
pub const SYSTEM_MANAGE: Permission = Permission::new(C::System, A::Manage);

static CATALOG: &[Permission] = &[
    USER_READ_OWN_PROFILE,
    USER_UPDATE_OWN_PROFILE,
    USER_DELETE_OWN_PROFILE,
    USER_READ_ALL,
    USER_MANAGE,
    CONTENT_CREATE,
    CONTENT_READ,
    CONTENT_UPDATE_OWN,
    CONTENT_DELETE_OWN,
    CONTENT_PUBLISH,
    CONTENT_MODERATE,
    JOBS_CREATE,
    JOBS_READ,
    JOBS_UPDATE_OWN,
    JOBS_DELETE_OWN,
    JOBS_MANAGE_ALL,
    MEDIA_UPLOAD,
    MEDIA_READ,
    MEDIA_DELETE_OWN,
    ADMIN_ACCESS,
    ADMIN_MANAGE,
    ADMIN_EXPORT,
    AI_USE,
    AI_MANAGE,
    BILLING_READ_OWN,
    BILLING_UPDATE_OWN,
    BILLING_MANAGE,
    SYSTEM_READ,
    SYSTEM_MANAGE,
];

/// Returns every catalogued permission.
#[must_use]
pub fn all() -> &'static [Permission] {
    CATALOG
}

/// Returns the catalogued permissions of one feature area.
pub fn for_category(category: C) -> impl Iterator<Item = &'static Permission> {
    CATALOG
        .iter()
        .filter(move |permission| permission.category == category)
}

/// Returns whether a descriptor is part of the catalog.
#[must_use]
pub fn contains(permission: &Permission) -> bool {
    CATALOG.contains(permission)
}

/// Returns whether a grant row's key refers to something the catalog knows.
///
/// Grants may be stored without a scope or with the `all` wildcard even when
/// the catalog only lists a narrower descriptor, so only the category/action
/// pair has to be catalogued in that case.
#[must_use]
pub fn recognizes_grant_key(category: C, action: A, resource: Option<&ResourceScope>) -> bool {
    CATALOG.iter().any(|permission| {
        permission.category == category
            && permission.action == action
            && match resource {
                None => true,
                Some(scope) => scope.is_all() || permission.resource.as_ref() == Some(scope),
            }
    })
}

/// Parses a transport permission and requires it to be catalogued.
pub fn lookup(value: &str) -> Result<Permission, AppError> {
    let permission = Permission::parse(value)?;
    if !contains(&permission) {
        return Err(AppError::Validation(format!(
            "permission '{permission}' is not part of the catalog"
        )));
    }

    Ok(permission)
}

/// Parses a transport permission whose key a grant row could carry.
///
/// Accepts every catalogued descriptor plus its unscoped and `all` forms.
pub fn lookup_grant_key(value: &str) -> Result<Permission, AppError> {
    let permission = Permission::parse(value)?;
    if !recognizes_grant_key(
        permission.category,
        permission.action,
        permission.resource.as_ref(),
    ) {
        return Err(AppError::Validation(format!(
            "permission '{permission}' does not match any catalogued grant key"
        )));
    }

    Ok(permission)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::permission::{PermissionAction, PermissionCategory, ResourceScope};

    use super::{
        JOBS_UPDATE_OWN, USER_READ_OWN_PROFILE, all, for_category, lookup, lookup_grant_key,
    };

    #[test]
    fn catalog_entries_are_unique() {
        let unique = all().iter().collect::<HashSet<_>>();
        assert_eq!(unique.len(), all().len());
    }

    #[test]
    fn every_category_has_at_least_one_entry() {
        for category in PermissionCategory::all() {
            assert!(
                for_category(*category).next().is_some(),
                "category {category} has no catalogued permission"
            );
        }
    }

    #[test]
    fn lookup_returns_catalogued_permission() {
        assert_eq!(lookup("jobs.update:own").ok(), Some(JOBS_UPDATE_OWN));
        assert_eq!(
            lookup("USER.READ:own_profile").ok(),
            Some(USER_READ_OWN_PROFILE)
        );
    }

    #[test]
    fn lookup_rejects_well_formed_but_uncatalogued_permission() {
        assert!(lookup("JOBS.UPDATE:someone_else").is_err());
        assert!(lookup("BILLING.UPLOAD").is_err());
    }

    #[test]
    fn grant_keys_accept_wildcard_and_unscoped_rows() {
        assert!(super::recognizes_grant_key(
            PermissionCategory::Jobs,
            PermissionAction::Update,
            Some(&ResourceScope::ALL)
        ));
        assert!(super::recognizes_grant_key(
            PermissionCategory::Media,
            PermissionAction::Upload,
            None
        ));
        assert!(!super::recognizes_grant_key(
            PermissionCategory::Billing,
            PermissionAction::Upload,
            None
        ));
    }

    #[test]
    fn grant_key_lookup_accepts_wildcard_and_unscoped_forms() {
        assert!(lookup("JOBS.UPDATE:all").is_err());
        assert!(lookup_grant_key("JOBS.UPDATE:all").is_ok_and(|permission| {
            permission.resource.as_ref().is_some_and(ResourceScope::is_all)
        }));
        assert!(lookup_grant_key("jobs.update").is_ok());
        assert!(lookup_grant_key("JOBS.UPDATE:someone-else").is_err());
        assert!(lookup_grant_key("BILLING.READ").is_err());
    }
}
