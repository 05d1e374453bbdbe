mod common;

use axum::http::{Method, StatusCode};
use common::{AuthHelper, TestApp, TestUser};
use serde_json::json;
use sweet_swirls::{
    client::{
        auth::AuthContext,
        pages::{navigation, route_access, RouteDecision},
        ClientError,
    },
    models::{auth::{LoginRequest, Role}, rbac::Capability},
};

#[tokio::test]
async fn every_seeded_user_can_log_in() {
    let app = TestApp::spawn().await;
    let auth = AuthHelper::new(&app);

    for (user, role) in TestUser::ALL.into_iter().zip(Role::ALL) {
        let context = auth.login_as(user).await;
        assert!(context.has_role(role), "{user:?}");
        assert!(context.api().session().token().is_some());
        auth.logout_and_clear(&context);
    }
}

#[tokio::test]
async fn wrong_password_keeps_the_session_empty() {
    let app = TestApp::spawn().await;
    let context = AuthContext::new(app.client());

    let err = context
        .login(&LoginRequest { email: "admin@sweetswirls.com".into(), password: "wrong".into() })
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidCredentials));
    assert!(!context.is_authenticated());
    assert_eq!(route_access("/login", context.api().session()), RouteDecision::Allow);
    assert_eq!(route_access("/dashboard", context.api().session()), RouteDecision::Redirect("/login"));
}

#[tokio::test]
async fn unknown_email_is_indistinguishable_from_wrong_password() {
    let app = TestApp::spawn().await;
    let (status, body) = app
        .oneshot(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "nobody@sweetswirls.com", "password": "admin123" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");
}

#[tokio::test]
async fn login_with_malformed_email_is_a_validation_error() {
    let app = TestApp::spawn().await;
    let (status, body) = app
        .oneshot(Method::POST, "/api/auth/login", None, Some(json!({ "email": "admin", "password": "x" })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["details"]["email"].is_array());
}

#[tokio::test]
async fn health_is_public_and_everything_else_needs_a_token() {
    let app = TestApp::spawn().await;

    let (status, body) = app.oneshot(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, _) = app.oneshot(Method::GET, "/api/inventory/items", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.oneshot(Method::GET, "/api/auth/me", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn rejected_token_clears_the_client_session() {
    let app = TestApp::spawn().await;
    let context = AuthHelper::new(&app).login_as(TestUser::ShiftLead).await;

    // Mesmo usuário, token de outro servidor
    let user = context.user().unwrap();
    context.api().session().establish("forged.token.value".into(), user).unwrap();

    let err = context.api().list_items(None, None).await.unwrap_err();
    assert!(err.is_unauthorized());
    assert!(!context.is_authenticated());
}

#[tokio::test]
async fn me_returns_the_current_user() {
    let app = TestApp::spawn().await;
    let context = AuthHelper::new(&app).login_as(TestUser::ProductionLead).await;

    let me = context.api().me().await.unwrap();
    assert_eq!(me.email, "production@sweetswirls.com");
    assert_eq!(me.role, Role::ProductionLead);
}

#[tokio::test]
async fn navigation_hides_admin_entries_from_other_roles() {
    let app = TestApp::spawn().await;
    let auth = AuthHelper::new(&app);

    for user in TestUser::ALL {
        let context = auth.login_as(user).await;
        let current = context.user().unwrap();
        let labels: Vec<_> = navigation(Some(&current)).iter().map(|n| n.label).collect();
        let is_admin = user == TestUser::Admin;
        assert_eq!(labels.contains(&"Users"), is_admin, "{user:?}");
        assert_eq!(labels.contains(&"Settings"), is_admin, "{user:?}");
        assert_eq!(context.can(Capability::ManageUsers), is_admin);
    }
}

#[tokio::test]
async fn capability_table_is_enforced_by_the_server() {
    let app = TestApp::spawn().await;
    let team = app.token_for(TestUser::TeamMember).await;
    let shift = app.token_for(TestUser::ShiftLead).await;

    let item = json!({ "name": "Mint Base", "category": "BASE", "unit": "gallons", "parStockLevel": 4 });
    let (status, body) = app.oneshot(Method::POST, "/api/inventory/items", Some(&team), Some(item.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("ManageInventory"));

    let (status, _) = app.oneshot(Method::POST, "/api/inventory/items", Some(&shift), Some(item)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app.oneshot(Method::GET, "/api/auth/users", Some(&shift), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.oneshot(Method::GET, "/api/inventory/items", Some(&team), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_manages_users_and_deactivated_users_cannot_log_in() {
    let app = TestApp::spawn().await;
    let admin = AuthHelper::new(&app).login_as(TestUser::Admin).await;

    let (status, _) = app
        .oneshot(
            Method::POST,
            "/api/auth/users",
            Some(&app.token_for(TestUser::Admin).await),
            Some(json!({ "name": "New Scooper", "email": "scooper@sweetswirls.com", "password": "scoop123", "role": "TEAM_MEMBER" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let users = admin.api().list_users(Some(Role::TeamMember)).await.unwrap();
    let scooper = users.iter().find(|u| u.email == "scooper@sweetswirls.com").unwrap();

    let deactivated = admin.api().deactivate_user(scooper.id).await.unwrap();
    assert!(!deactivated.is_active);

    // Segunda desativação é um no-op -> 409
    let err = admin.api().deactivate_user(scooper.id).await.unwrap_err();
    assert_eq!(err.status(), Some(409));

    let blocked = AuthContext::new(app.client());
    let err = blocked
        .login(&LoginRequest { email: "scooper@sweetswirls.com".into(), password: "scoop123".into() })
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidCredentials));

    admin.api().activate_user(scooper.id).await.unwrap();
    blocked
        .login(&LoginRequest { email: "Scooper@SweetSwirls.com".into(), password: "scoop123".into() })
        .await
        .unwrap();
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let app = TestApp::spawn().await;
    let token = app.token_for(TestUser::Admin).await;
    let (status, _) = app
        .oneshot(
            Method::POST,
            "/api/auth/users",
            Some(&token),
            Some(json!({ "name": "Again", "email": "team@sweetswirls.com", "password": "team1234", "role": "TEAM_MEMBER" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}
