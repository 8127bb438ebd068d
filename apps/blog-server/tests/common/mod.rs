//! Shared fixtures for the HTTP integration tests.
#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::test;

use blog_core::domain::{Comment, Post, User};
use blog_core::ports::BaseRepository;
use blog_infra::JwtConfig;
use blog_server::AppState;
use blog_server::config::SessionConfig;
use blog_server::middleware::auth::SESSION_COOKIE;

/// Build the full application around `$state`, as `main` does.
#[macro_export]
macro_rules! init_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(blog_server::observability::RequestIdMiddleware)
                .app_data(actix_web::web::Data::new($state.clone()))
                .configure(blog_server::handlers::configure_routes),
        )
        .await
    };
}

pub fn test_state() -> AppState {
    AppState::in_memory(
        JwtConfig {
            secret: "integration-test-secret".to_string(),
            ..JwtConfig::default()
        },
        SessionConfig::default(),
    )
}

/// User with a placeholder hash. Enough for session-cookie tests.
pub async fn create_user(state: &AppState, username: &str) -> User {
    state
        .users
        .save(User::new(username.to_string(), "not-a-real-hash".to_string()))
        .await
        .unwrap()
}

/// User whose password can actually be checked at login.
pub async fn create_user_with_password(state: &AppState, username: &str, password: &str) -> User {
    let hash = state.passwords.hash(password).unwrap();
    state
        .users
        .save(User::new(username.to_string(), hash))
        .await
        .unwrap()
}

pub async fn create_post(state: &AppState, author: &User, title: &str, content: &str) -> Post {
    state
        .posts
        .save(Post::new(author.id, title.to_string(), content.to_string()))
        .await
        .unwrap()
}

pub async fn create_comment(state: &AppState, post: &Post, author: &User, text: &str) -> Comment {
    state
        .comments
        .save(Comment::new(post.id, author.id, text.to_string()))
        .await
        .unwrap()
}

/// Session cookie as the login handler would set it.
pub fn session_for(state: &AppState, user: &User) -> Cookie<'static> {
    let token = state
        .tokens
        .generate_token(user.id, &user.username)
        .unwrap();
    Cookie::new(SESSION_COOKIE, token)
}

pub fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(actix_web::http::header::LOCATION)
        .expect("response has no Location header")
        .to_str()
        .unwrap()
        .to_string()
}

pub async fn body_text<B: MessageBody>(resp: ServiceResponse<B>) -> String {
    let bytes = test::read_body(resp).await;
    String::from_utf8(bytes.to_vec()).unwrap()
}
