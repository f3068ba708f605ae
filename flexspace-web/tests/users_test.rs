//! Profile self-service and user administration

mod helpers;

use axum::http::StatusCode;
use helpers::{TestApp, ADMIN_EMAIL};
use serde_json::json;

#[tokio::test]
async fn test_me_and_update_me() {
    let app = TestApp::new().await;
    let (token, id) = app.user_token("ann@x.com").await;

    let (status, me) = app.request("GET", "/api/users/me", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], id);
    assert!(me.get("passwordHash").is_none());

    let (status, updated) = app
        .request(
            "PATCH",
            "/api/users/me",
            Some(json!({ "name": "Annie", "role": "Admin" })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Annie");
    assert_eq!(updated["role"], "User");

    let (status, _) = app
        .request(
            "PATCH",
            "/api/users/me",
            Some(json!({ "email": ADMIN_EMAIL })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_change_password() {
    let app = TestApp::new().await;
    let (token, _) = app.user_token("ann@x.com").await;

    let (status, _) = app
        .request(
            "PATCH",
            "/api/users/me/password",
            Some(json!({ "oldPassword": "wrong-one", "newPassword": "password2" })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request(
            "PATCH",
            "/api/users/me/password",
            Some(json!({ "oldPassword": "password1", "newPassword": "short" })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request(
            "PATCH",
            "/api/users/me/password",
            Some(json!({ "oldPassword": "password1", "newPassword": "password2" })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Existing sessions survive a voluntary password change
    let (status, _) = app.request("GET", "/api/users/me", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.login("ann@x.com", "password2").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_user_management() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (ann, ann_id) = app.user_token("ann@x.com").await;

    let (status, _) = app.request("GET", "/api/users", None, Some(&ann)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = app
        .request(
            "POST",
            "/api/users",
            Some(json!({
                "name": "Second Admin",
                "email": "second@flexspace.com",
                "password": "password1",
                "role": "Admin"
            })),
            Some(&admin),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["role"], "Admin");

    let (status, page) = app
        .request("GET", "/api/users?role=Admin&limit=1", None, Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 2);
    assert_eq!(page["data"].as_array().unwrap().len(), 1);

    let (_, found) = app
        .request("GET", "/api/users?search=ANN@", None, Some(&admin))
        .await;
    assert_eq!(found["total"], 1);
    assert_eq!(found["data"][0]["id"], ann_id);

    let user_uri = format!("/api/users/{}", ann_id);
    let (status, promoted) = app
        .request("PATCH", &user_uri, Some(json!({ "role": "Admin" })), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(promoted["role"], "Admin");

    // Role is read from storage on every request, so Ann is an admin right away
    let (status, _) = app.request("GET", "/api/users", None, Some(&ann)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.request("DELETE", &user_uri, None, Some(&admin)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.request("GET", &user_uri, None, Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // A deleted user's token no longer authenticates
    let (status, _) = app.request("GET", "/api/users/me", None, Some(&ann)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
