//! Session authentication: cookie handling and identity extractors.

use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::http::{StatusCode, header};
use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, web};
use std::future::Future;
use std::pin::Pin;

use blog_core::domain::User;
use blog_core::ports::{AuthError, BaseRepository};

use crate::config::SessionConfig;
use crate::state::AppState;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "blog_session";

/// Where anonymous users are sent on pages that need a login.
pub const LOGIN_PATH: &str = "/accounts/login";

/// Authenticated user identity extractor.
///
/// Use this in handlers to require a login:
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: uuid::Uuid,
    pub username: String,
}

impl From<User> for Identity {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
        }
    }
}

/// Authentication failure. Renders as a redirect to the login page that
/// returns to `next` afterwards.
#[derive(Debug)]
pub struct AuthenticationError {
    pub error: AuthError,
    pub next: String,
}

impl std::fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl actix_web::ResponseError for AuthenticationError {
    fn status_code(&self) -> StatusCode {
        StatusCode::FOUND
    }

    fn error_response(&self) -> HttpResponse {
        tracing::debug!(reason = %self.error, next = %self.next, "Login required");

        HttpResponse::Found()
            .insert_header((header::LOCATION, login_url(&self.next)))
            .cookie(clear_session_cookie())
            .finish()
    }
}

/// Login page URL that returns to `next`.
pub fn login_url(next: &str) -> String {
    format!("{}?next={}", LOGIN_PATH, urlencoding::encode(next))
}

/// Only same-site absolute paths are accepted as redirect targets.
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
}

/// Cookie holding a freshly issued session token.
pub fn session_cookie(token: String, max_age_secs: i64, config: &SessionConfig) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .max_age(Duration::seconds(max_age_secs))
        .finish()
}

/// Expired cookie that makes the browser drop the session.
pub fn clear_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}

fn session_token(req: &HttpRequest) -> Result<String, AuthError> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        return Ok(cookie.value().to_string());
    }

    // Bearer tokens are accepted for scripted clients
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?;
    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;

    auth_str
        .strip_prefix("Bearer ")
        .map(String::from)
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))
}

type AuthFuture<T> = Pin<Box<dyn Future<Output = T>>>;

/// Validate the session token, then load its user. A token whose user has
/// been deleted counts as no session.
fn authenticate(req: &HttpRequest) -> AuthFuture<Result<Identity, AuthError>> {
    let state = req.app_data::<web::Data<AppState>>().cloned();
    let token = session_token(req);

    Box::pin(async move {
        let Some(state) = state else {
            tracing::error!("AppState not found in app data");
            return Err(AuthError::InvalidToken(
                "Server configuration error".to_string(),
            ));
        };

        let claims = state.tokens.validate_token(&token?)?;
        match state.users.find_by_id(claims.user_id).await {
            Ok(Some(user)) => Ok(Identity::from(user)),
            Ok(None) => {
                tracing::info!(user_id = %claims.user_id, "Session for deleted user");
                Err(AuthError::UnknownUser)
            }
            Err(e) => {
                tracing::error!("Failed to load session user: {}", e);
                Err(AuthError::InvalidToken("Session user lookup failed".to_string()))
            }
        }
    })
}

/// Path and query of the request, used as the post-login target.
fn requested_path(req: &HttpRequest) -> String {
    match req.uri().query() {
        Some(q) => format!("{}?{}", req.path(), q),
        None => req.path().to_string(),
    }
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = AuthFuture<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let next = requested_path(req);
        let identity = authenticate(req);

        Box::pin(async move {
            identity
                .await
                .map_err(|error| AuthenticationError { error, next })
        })
    }
}

/// Optional identity extractor - doesn't fail if not authenticated.
pub struct OptionalIdentity(pub Option<Identity>);

impl OptionalIdentity {
    pub fn username(&self) -> Option<String> {
        self.0.as_ref().map(|i| i.username.clone())
    }
}

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = AuthFuture<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let identity = authenticate(req);
        Box::pin(async move { Ok(OptionalIdentity(identity.await.ok())) })
    }
}
