use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use talentgate_core::{Actor, AppError, Role, UserId};
use talentgate_domain::{AccessErrorKind, catalog};

use crate::policy_evaluator::PolicyEvaluator;
use crate::policy_store::tests::{FakeGrantRepository, role, settle, store_with};

use super::{AccessGate, AccessRequirement, GateOptions, GateRender, GateState};

const SHOW_ERROR: GateOptions = GateOptions { show_error: true };

async fn talent_with_jobs_read() -> (Arc<FakeGrantRepository>, Actor) {
    let user_id = UserId::new();
    let repository = Arc::new(FakeGrantRepository::new());
    repository.add_user(user_id, "talent").await;
    repository
        .add_role_grant("talent", &catalog::JOBS_READ, true)
        .await;
    (repository, Actor::new(user_id, role("talent")))
}

fn gate_over(repository: Arc<FakeGrantRepository>) -> AccessGate {
    AccessGate::new(PolicyEvaluator::new(store_with(repository)))
}

#[tokio::test]
async fn loading_grants_render_pending_without_denial_message() {
    let (repository, actor) = talent_with_jobs_read().await;
    repository.hold_fetches();
    let evaluator = PolicyEvaluator::new(store_with(repository.clone()));
    let gate = AccessGate::new(evaluator.clone());
    let requirement = AccessRequirement::permission(catalog::JOBS_CREATE);

    let render = gate
        .render(&actor, &requirement, SHOW_ERROR, || "jobs", || "fallback")
        .await;
    assert_eq!(render, GateRender::Pending);

    repository.release_fetches();
    settle(evaluator.store(), actor.user_id()).await;
    assert!(matches!(
        gate.render(&actor, &requirement, SHOW_ERROR, || "jobs", || "fallback").await,
        GateRender::Error(_)
    ));
}

#[tokio::test]
async fn pending_gate_settles_into_granted() {
    let (repository, actor) = talent_with_jobs_read().await;
    repository.hold_fetches();
    let evaluator = PolicyEvaluator::new(store_with(repository.clone()));
    let gate = AccessGate::new(evaluator.clone());
    let requirement = AccessRequirement::permission(catalog::JOBS_READ);

    assert_eq!(gate.check(&actor, &requirement).await, GateState::Pending);

    repository.release_fetches();
    settle(evaluator.store(), actor.user_id()).await;

    assert_eq!(gate.check(&actor, &requirement).await, GateState::Granted);
}

#[tokio::test]
async fn role_check_runs_before_permission_check() {
    let (repository, actor) = talent_with_jobs_read().await;
    repository.hold_fetches();
    let gate = gate_over(repository.clone());
    let requirement =
        AccessRequirement::permission(catalog::JOBS_READ).with_roles(vec![Role::admin()]);

    let state = gate.check(&actor, &requirement).await;

    assert!(matches!(
        state,
        GateState::Denied(ref denial)
            if denial.missing_roles == vec![Role::admin()] && denial.missing_permissions.is_empty()
    ));
    assert_eq!(repository.fetch_count(), 0);
    repository.release_fetches();
}

#[tokio::test]
async fn role_only_requirement_needs_no_grant_fetch() {
    let (repository, actor) = talent_with_jobs_read().await;
    let gate = gate_over(repository.clone());
    let requirement = AccessRequirement::roles(vec![role("talent"), role("producer")]);

    assert_eq!(gate.check_settled(&actor, &requirement).await, GateState::Granted);
    assert_eq!(repository.fetch_count(), 0);
}

#[tokio::test]
async fn denial_renders_fallback_or_error_per_options() {
    let (repository, actor) = talent_with_jobs_read().await;
    let gate = gate_over(repository);
    let requirement = AccessRequirement::all_of(vec![catalog::JOBS_READ, catalog::JOBS_CREATE]);
    assert!(matches!(
        gate.check_settled(&actor, &requirement).await,
        GateState::Denied(_)
    ));

    let quiet = gate
        .render(&actor, &requirement, GateOptions::default(), || "jobs", || "fallback")
        .await;
    assert_eq!(quiet, GateRender::Fallback("fallback"));

    let loud = gate
        .render(&actor, &requirement, SHOW_ERROR, || "jobs", || "fallback")
        .await;
    assert!(matches!(
        loud,
        GateRender::Error(ref message) if message.contains("JOBS.CREATE") && !message.contains("JOBS.READ")
    ));
}

#[tokio::test]
async fn any_of_requirement_renders_children_when_one_is_held() {
    let (repository, actor) = talent_with_jobs_read().await;
    let gate = gate_over(repository);
    let requirement = AccessRequirement::any_of(vec![catalog::JOBS_CREATE, catalog::JOBS_READ]);
    let _ = gate.check_settled(&actor, &requirement).await;

    let render = gate
        .render(&actor, &requirement, GateOptions::default(), || "jobs", || "fallback")
        .await;

    assert_eq!(render, GateRender::Children("jobs"));
}

#[tokio::test]
async fn guard_runs_action_only_when_granted() {
    let (repository, actor) = talent_with_jobs_read().await;
    let gate = gate_over(repository);
    let ran = AtomicBool::new(false);

    let denied = gate
        .guard(
            &actor,
            &AccessRequirement::permission(catalog::JOBS_CREATE),
            || async {
                ran.store(true, Ordering::SeqCst);
                Ok(())
            },
        )
        .await;
    assert!(matches!(denied, Err(AppError::Forbidden(ref message)) if message.contains("JOBS.CREATE")));
    assert!(!ran.load(Ordering::SeqCst));

    let granted = gate
        .guard(
            &actor,
            &AccessRequirement::permission(catalog::JOBS_READ),
            || async { Ok(7) },
        )
        .await;
    assert!(matches!(granted, Ok(7)));
}

#[tokio::test]
async fn store_failure_is_reported_as_error_not_denial() {
    let (repository, actor) = talent_with_jobs_read().await;
    repository.set_failing(true);
    let gate = gate_over(repository);
    let requirement = AccessRequirement::permission(catalog::JOBS_READ);

    assert_eq!(
        gate.check_settled(&actor, &requirement).await,
        GateState::Errored(AccessErrorKind::StoreUnavailable)
    );
    let quiet = gate
        .render(&actor, &requirement, GateOptions::default(), || "jobs", || "fallback")
        .await;
    assert_eq!(quiet, GateRender::Fallback("fallback"));

    let guarded = gate.guard(&actor, &requirement, || async { Ok(()) }).await;
    assert!(matches!(guarded, Err(AppError::Unavailable(_))));
}
