//! Integration tests for sign-up, login, logout and the ambient endpoints.
mod common;

use actix_web::http::StatusCode;
use actix_web::test;

use blog_core::ports::BaseRepository;
use blog_server::middleware::auth::SESSION_COOKIE;
use blog_server::observability::REQUEST_ID_HEADER;

use common::{body_text, create_user, create_user_with_password, location, session_for, test_state};

fn session_cookie_value<B>(resp: &actix_web::dev::ServiceResponse<B>) -> Option<String> {
    resp.response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.value().to_string())
}

#[actix_web::test]
async fn test_register_logs_in_and_redirects() {
    let state = test_state();
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/accounts/register")
        .set_form([
            ("username", "newuser"),
            ("password", "correct-horse"),
            ("password_confirm", "correct-horse"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/posts");

    let token = session_cookie_value(&resp).expect("session cookie not set");
    let claims = state.tokens.validate_token(&token).unwrap();
    assert_eq!(claims.username, "newuser");

    let user = state.users.find_by_username("newuser").await.unwrap().unwrap();
    assert_eq!(user.id, claims.user_id);
    assert_ne!(user.password_hash, "correct-horse");
}

#[actix_web::test]
async fn test_register_rejects_taken_username() {
    let state = test_state();
    create_user(&state, "testuser").await;
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/accounts/register")
        .set_form([
            ("username", "testuser"),
            ("password", "correct-horse"),
            ("password_confirm", "correct-horse"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(session_cookie_value(&resp).is_none());

    let html = body_text(resp).await;
    assert!(html.contains(r#"data-template="registration/register.html""#));
    assert!(html.contains("A user with that username already exists."));
}

#[actix_web::test]
async fn test_login_redirects_to_next() {
    let state = test_state();
    create_user_with_password(&state, "testuser", "12345").await;
    let app = init_app!(state);

    let req = test::TestRequest::get()
        .uri("/accounts/login?next=%2Fposts%2Fnew")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains(r#"data-template="registration/login.html""#));

    let req = test::TestRequest::post()
        .uri("/accounts/login")
        .set_form([
            ("username", "testuser"),
            ("password", "12345"),
            ("next", "/posts/new"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/posts/new");
    assert!(session_cookie_value(&resp).is_some());
}

#[actix_web::test]
async fn test_login_ignores_offsite_next() {
    let state = test_state();
    create_user_with_password(&state, "testuser", "12345").await;
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/accounts/login")
        .set_form([
            ("username", "testuser"),
            ("password", "12345"),
            ("next", "//evil.example/"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/posts");
}

#[actix_web::test]
async fn test_login_with_wrong_password() {
    let state = test_state();
    create_user_with_password(&state, "testuser", "12345").await;
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/accounts/login")
        .set_form([("username", "testuser"), ("password", "wrong")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(session_cookie_value(&resp).is_none());

    let html = body_text(resp).await;
    assert!(html.contains("Please enter a correct username and password."));
    assert!(!html.contains("wrong"));
}

#[actix_web::test]
async fn test_logout_clears_session() {
    let state = test_state();
    let user = create_user(&state, "testuser").await;
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/accounts/logout")
        .cookie(session_for(&state, &user))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/posts");

    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .expect("removal cookie not set");
    assert_eq!(cookie.value(), "");
    assert_eq!(
        cookie.max_age(),
        Some(actix_web::cookie::time::Duration::ZERO)
    );
}

#[actix_web::test]
async fn test_invalid_session_is_anonymous() {
    let state = test_state();
    let app = init_app!(state);

    let req = test::TestRequest::get()
        .uri("/posts")
        .cookie(actix_web::cookie::Cookie::new(SESSION_COOKIE, "garbage"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let html = body_text(resp).await;
    assert!(html.contains("Log in"));
}

#[actix_web::test]
async fn test_session_of_deleted_user_is_anonymous() {
    let state = test_state();
    let user = create_user(&state, "testuser").await;
    let cookie = session_for(&state, &user);
    state.users.delete(user.id).await.unwrap();
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/posts/new")
        .cookie(cookie.clone())
        .set_form([("title", "Orphan"), ("content", "No author left.")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/accounts/login?next=%2Fposts%2Fnew");

    let req = test::TestRequest::get()
        .uri("/posts")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("Log in"));
}

#[actix_web::test]
async fn test_bearer_token_is_accepted() {
    let state = test_state();
    let user = create_user(&state, "testuser").await;
    let app = init_app!(state);
    let token = session_for(&state, &user).value().to_string();

    let req = test::TestRequest::get()
        .uri("/posts/new")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_health_and_request_id() {
    let state = test_state();
    let app = init_app!(state);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key(REQUEST_ID_HEADER));

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}
