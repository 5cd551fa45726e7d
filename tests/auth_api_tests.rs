//! Integration tests for the auth endpoints: signup validation, the session
//! cookie contract, login, logout, onboarding.

mod helpers;

use axum::http::{header, StatusCode};
use helpers::{
    bare_request, extract_json, json_request, session_token_from, setup_app, signup_user,
};
use serde_json::json;
use tower::util::ServiceExt;

#[tokio::test]
async fn signup_creates_user_and_sets_cookie() {
    let (app, state) = setup_app().await;

    let request = json_request(
        "POST",
        "/api/auth/signup",
        json!({"email": "ana@example.com", "password": "secret123", "fullName": "Ana Silva"}),
        None,
    );
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("signup should set the session cookie")
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("jwt="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=None"));

    let body = extract_json(response).await;
    assert_eq!(body["success"], true);

    let user = lingua_link::db::users::find_by_email(&state.db, "ana@example.com")
        .await
        .unwrap()
        .expect("user row should exist");
    assert_eq!(user.full_name, "Ana Silva");
    assert!(!user.is_onboarded);
    assert!(user.profile_pic.contains("dicebear"));
}

#[tokio::test]
async fn signup_rejects_duplicate_email_without_second_record() {
    let (app, state) = setup_app().await;
    signup_user(&app, "ana@example.com", "Ana Silva").await;

    let request = json_request(
        "POST",
        "/api/auth/signup",
        json!({"email": "ana@example.com", "password": "different", "fullName": "Other Ana"}),
        None,
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?")
        .bind("ana@example.com")
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn signup_validates_inputs() {
    let (app, _state) = setup_app().await;

    let cases = [
        json!({"email": "", "password": "secret123", "fullName": "Ana"}),
        json!({"email": "ana@example.com", "password": "short", "fullName": "Ana"}),
        json!({"email": "not-an-email", "password": "secret123", "fullName": "Ana"}),
        json!({"email": "spaces in@example.com", "password": "secret123", "fullName": "Ana"}),
    ];

    for body in cases {
        let request = json_request("POST", "/api/auth/signup", body.clone(), None);
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "expected rejection for {}",
            body
        );
    }
}

#[tokio::test]
async fn login_issues_session_for_valid_credentials() {
    let (app, _state) = setup_app().await;
    signup_user(&app, "ana@example.com", "Ana Silva").await;

    let request = json_request(
        "POST",
        "/api/auth/login",
        json!({"email": "ana@example.com", "password": "secret123"}),
        None,
    );
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let token = session_token_from(&response).expect("login should set the session cookie");

    // The issued session authenticates /api/users/me
    let me = app
        .clone()
        .oneshot(bare_request("GET", "/api/users/me", Some(&token)))
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::OK);
    let body = extract_json(me).await;
    assert_eq!(body["user"]["email"], "ana@example.com");
    assert!(
        body["user"].get("passwordHash").is_none(),
        "password hash must never serialize"
    );
}

#[tokio::test]
async fn login_rejects_bad_credentials_with_one_message() {
    let (app, _state) = setup_app().await;
    signup_user(&app, "ana@example.com", "Ana Silva").await;

    for body in [
        json!({"email": "nobody@example.com", "password": "secret123"}),
        json!({"email": "ana@example.com", "password": "wrong-pass"}),
    ] {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/auth/login", body, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = extract_json(response).await;
        assert_eq!(body["message"], "Invalid email or password");
    }
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let (app, _state) = setup_app().await;

    let response = app
        .clone()
        .oneshot(bare_request("POST", "/api/auth/logout", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.starts_with("jwt=;"));
    assert!(set_cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn protected_routes_reject_missing_or_garbage_tokens() {
    let (app, _state) = setup_app().await;

    let response = app
        .clone()
        .oneshot(bare_request("GET", "/api/users/me", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(bare_request("GET", "/api/users/me", Some("not-a-jwt")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn onboarding_requires_every_profile_field() {
    let (app, state) = setup_app().await;
    let token = signup_user(&app, "ana@example.com", "Ana Silva").await;

    let request = json_request(
        "POST",
        "/api/auth/onboarding",
        json!({"fullName": "Ana Silva", "bio": "hi", "nativeLanguage": "pt"}),
        Some(&token),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response).await;
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("learningLanguage"));
    assert!(message.contains("location"));

    let user = lingua_link::db::users::find_by_email(&state.db, "ana@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(!user.is_onboarded, "failed onboarding must not persist");
}

#[tokio::test]
async fn onboarding_persists_fields_and_flag() {
    let (app, state) = setup_app().await;
    let token = signup_user(&app, "ana@example.com", "Ana Silva").await;
    helpers::onboard_user(&app, &token, "Ana Silva").await;

    let user = lingua_link::db::users::find_by_email(&state.db, "ana@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(user.is_onboarded);
    assert_eq!(user.native_language, "Portuguese");
    assert_eq!(user.learning_language, "English");
    assert_eq!(user.location, "Lisbon");
}

#[tokio::test]
async fn onboarding_ignores_smuggled_premium_flag() {
    let (app, state) = setup_app().await;
    let token = signup_user(&app, "ana@example.com", "Ana Silva").await;

    let request = json_request(
        "POST",
        "/api/auth/onboarding",
        json!({
            "fullName": "Ana Silva",
            "bio": "hi",
            "nativeLanguage": "pt",
            "learningLanguage": "en",
            "location": "Lisbon",
            "isPremium": true,
        }),
        Some(&token),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let user = lingua_link::db::users::find_by_email(&state.db, "ana@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(!user.is_premium, "client-supplied premium flag must be ignored");
}
