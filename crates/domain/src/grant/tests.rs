use chrono::{Duration, Utc};
use proptest::prelude::*;
use talentgate_core::{Actor, Role, UserId};

use crate::catalog;
use crate::permission::{Permission, PermissionAction, PermissionCategory, ResourceScope};

use super::{GrantSet, Resolution, RoleGrant, UserGrant};

fn role(name: &str) -> Role {
    match Role::new(name) {
        Ok(role) => role,
        Err(error) => panic!("invalid test role '{name}': {error}"),
    }
}

fn role_grant(role_name: &str, permission: &Permission, granted: bool) -> RoleGrant {
    RoleGrant {
        role: role(role_name),
        category: permission.category,
        action: permission.action,
        resource: permission.resource.clone(),
        granted,
    }
}

fn user_grant(user_id: UserId, permission: &Permission, granted: bool) -> UserGrant {
    UserGrant {
        grant_id: format!("grant-{}", permission.as_transport()),
        user_id,
        category: permission.category,
        action: permission.action,
        resource: permission.resource.clone(),
        granted,
        expires_at: None,
        conditions: None,
    }
}

#[test]
fn talent_role_grant_matches_exact_scope_only() {
    let actor = Actor::new(UserId::new(), role("talent"));
    let grants = GrantSet::new(
        vec![role_grant("talent", &catalog::JOBS_UPDATE_OWN, true)],
        Vec::new(),
    );
    let now = Utc::now();

    assert!(grants.resolve(&actor, &catalog::JOBS_UPDATE_OWN, now).is_granted());

    let all_jobs = catalog::JOBS_UPDATE_OWN.with_resource(ResourceScope::ALL);
    assert_eq!(
        grants.resolve(&actor, &all_jobs, now),
        Resolution::NoMatchingGrant
    );
}

#[test]
fn expired_producer_override_falls_through_to_missing_role_grant() {
    let user_id = UserId::new();
    let actor = Actor::new(user_id, role("producer"));
    let now = Utc::now();
    let mut upload = user_grant(user_id, &catalog::MEDIA_UPLOAD, true);
    upload.expires_at = Some(now - Duration::days(1));
    let grants = GrantSet::new(Vec::new(), vec![upload]);

    assert_eq!(
        grants.resolve(&actor, &catalog::MEDIA_UPLOAD, now),
        Resolution::NoMatchingGrant
    );
}

#[test]
fn expired_denial_does_not_block_role_grant() {
    let user_id = UserId::new();
    let actor = Actor::new(user_id, role("producer"));
    let now = Utc::now();
    let mut revoked = user_grant(user_id, &catalog::JOBS_CREATE, false);
    revoked.expires_at = Some(now - Duration::hours(2));
    let grants = GrantSet::new(
        vec![role_grant("producer", &catalog::JOBS_CREATE, true)],
        vec![revoked],
    );

    assert_eq!(
        grants.resolve(&actor, &catalog::JOBS_CREATE, now),
        Resolution::RoleDefault { granted: true }
    );
}

#[test]
fn unexpired_override_grants_until_expiry() {
    let user_id = UserId::new();
    let actor = Actor::new(user_id, role("talent"));
    let now = Utc::now();
    let mut trial = user_grant(user_id, &catalog::AI_USE, true);
    trial.expires_at = Some(now + Duration::days(7));
    let grants = GrantSet::new(Vec::new(), vec![trial]);

    assert!(grants.resolve(&actor, &catalog::AI_USE, now).is_granted());
    assert!(
        !grants
            .resolve(&actor, &catalog::AI_USE, now + Duration::days(8))
            .is_granted()
    );
}

#[test]
fn wildcard_user_grant_covers_own_profile_request() {
    let user_id = UserId::new();
    let actor = Actor::new(user_id, role("talent"));
    let wildcard = Permission {
        resource: Some(ResourceScope::ALL),
        ..Permission::new(PermissionCategory::User, PermissionAction::Read)
    };
    let grants = GrantSet::new(Vec::new(), vec![user_grant(user_id, &wildcard, true)]);

    assert!(
        grants
            .resolve(&actor, &catalog::USER_READ_OWN_PROFILE, Utc::now())
            .is_granted()
    );
}

#[test]
fn grants_for_other_roles_and_users_are_ignored() {
    let actor = Actor::new(UserId::new(), role("talent"));
    let grants = GrantSet::new(
        vec![role_grant("producer", &catalog::JOBS_CREATE, true)],
        vec![user_grant(UserId::new(), &catalog::JOBS_CREATE, true)],
    );

    assert!(
        !grants
            .resolve(&actor, &catalog::JOBS_CREATE, Utc::now())
            .is_granted()
    );
}

#[test]
fn unknown_actor_snapshot_denies_non_admins() {
    let grants = GrantSet::unknown_actor();
    assert!(!grants.actor_resolved);

    let talent = Actor::new(UserId::new(), role("talent"));
    assert!(!grants.resolve(&talent, &catalog::JOBS_READ, Utc::now()).is_granted());

    let admin = Actor::new(UserId::new(), Role::admin());
    assert!(grants.resolve(&admin, &catalog::JOBS_READ, Utc::now()).is_granted());
}

fn any_permission() -> impl Strategy<Value = Permission> {
    prop::sample::select(catalog::all().to_vec())
}

proptest! {
    #[test]
    fn admin_is_granted_regardless_of_grant_tables(
        permission in any_permission(),
        role_decision in any::<bool>(),
        user_decision in any::<bool>(),
    ) {
        let user_id = UserId::new();
        let actor = Actor::new(user_id, Role::admin());
        let grants = GrantSet::new(
            vec![role_grant("admin", &permission, role_decision)],
            vec![user_grant(user_id, &permission, user_decision)],
        );

        prop_assert_eq!(
            grants.resolve(&actor, &permission, Utc::now()),
            Resolution::AdminBypass
        );
    }

    #[test]
    fn unexpired_denial_override_wins_over_role_grant(
        permission in any_permission(),
        expires_in_hours in prop::option::of(1_i64..10_000),
    ) {
        let user_id = UserId::new();
        let actor = Actor::new(user_id, role("talent"));
        let now = Utc::now();
        let mut denial = user_grant(user_id, &permission, false);
        denial.expires_at = expires_in_hours.map(|hours| now + Duration::hours(hours));
        let grants = GrantSet::new(
            vec![role_grant("talent", &permission, true)],
            vec![denial],
        );

        prop_assert!(!grants.resolve(&actor, &permission, now).is_granted());
    }

    #[test]
    fn expired_override_behaves_as_if_absent(
        permission in any_permission(),
        override_decision in any::<bool>(),
        role_decision in prop::option::of(any::<bool>()),
        expired_hours_ago in 1_i64..10_000,
    ) {
        let user_id = UserId::new();
        let actor = Actor::new(user_id, role("producer"));
        let now = Utc::now();
        let role_grants = role_decision
            .map(|granted| vec![role_grant("producer", &permission, granted)])
            .unwrap_or_default();
        let mut expired = user_grant(user_id, &permission, override_decision);
        expired.expires_at = Some(now - Duration::hours(expired_hours_ago));

        let with_expired = GrantSet::new(role_grants.clone(), vec![expired]);
        let without_override = GrantSet::new(role_grants, Vec::new());

        prop_assert_eq!(
            with_expired.resolve(&actor, &permission, now),
            without_override.resolve(&actor, &permission, now)
        );
    }
}
