use axum::http::{Method, StatusCode};
use serde_json::json;
use talentgate_application::GrantRepository;

use crate::handlers::test_support::{TestApp, role};

#[tokio::test]
async fn admin_routes_forbid_non_admin_roles() {
    let app = TestApp::new();
    let producer = app.actor("producer").await;

    let (status, body) = app
        .send(
            Method::PUT,
            "/api/admin/role-grants",
            Some(&producer),
            Some(json!({ "role": "talent", "permission": "JOBS.CREATE", "granted": true })),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(
        body["message"]
            .as_str()
            .is_some_and(|message| message.contains("admin"))
    );
}

#[tokio::test]
async fn admin_routes_require_actor_headers() {
    let app = TestApp::new();
    let target = app.actor("talent").await;

    let (status, _) = app
        .send(
            Method::GET,
            &format!("/api/admin/users/{}/grants", target.user_id()),
            None,
            None,
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_override_lifecycle_over_http() {
    let app = TestApp::new();
    let admin = app.actor("admin").await;
    let producer = app.actor("producer").await;

    let (status, created) = app
        .send(
            Method::POST,
            "/api/admin/user-grants",
            Some(&admin),
            Some(json!({
                "user_id": producer.user_id().to_string(),
                "permission": "media.upload",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["permission"], "MEDIA.UPLOAD");
    assert_eq!(created["granted"], true);
    let Some(grant_id) = created["grant_id"].as_str() else {
        panic!("created override has no grant id: {created}");
    };

    let listing_uri = format!("/api/admin/users/{}/grants", producer.user_id());
    let (status, listed) = app
        .send(Method::GET, &listing_uri, Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
    assert_eq!(listed[0]["created_by"], admin.user_id().to_string());

    let revoke_uri = format!("/api/admin/user-grants/{grant_id}");
    let (status, _) = app
        .send(Method::DELETE, &revoke_uri, Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .send(Method::DELETE, &revoke_uri, Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn role_grant_written_over_http_reaches_a_fresh_check() {
    let app = TestApp::new();
    let admin = app.actor("admin").await;
    let talent = app.actor("talent").await;

    let (status, saved) = app
        .send(
            Method::PUT,
            "/api/admin/role-grants",
            Some(&admin),
            Some(json!({ "role": "Talent", "permission": "AI.USE", "granted": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["role"], "talent");

    let (_, body) = app
        .send(
            Method::POST,
            "/api/access/check",
            Some(&talent),
            Some(json!({ "permissions": ["AI.USE"], "wait": true })),
        )
        .await;
    assert_eq!(body["state"], "granted");
}

#[tokio::test]
async fn admin_role_rows_and_unknown_keys_are_rejected() {
    let app = TestApp::new();
    let admin = app.actor("admin").await;

    let (status, _) = app
        .send(
            Method::PUT,
            "/api/admin/role-grants",
            Some(&admin),
            Some(json!({ "role": "admin", "permission": "JOBS.READ", "granted": false })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::PUT,
            "/api/admin/role-grants",
            Some(&admin),
            Some(json!({ "role": "talent", "permission": "BILLING.READ", "granted": true })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for role_name in ["admin", "talent"] {
        let stored = app.repository.list_role_grants(&role(role_name)).await;
        assert!(stored.is_ok_and(|records| records.is_empty()));
    }
}
