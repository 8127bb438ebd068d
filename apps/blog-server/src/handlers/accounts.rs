//! Sign-up, login and logout.

use actix_web::{HttpResponse, web};
use serde::Deserialize;

use blog_core::domain::User;
use blog_core::error::RepoError;
use blog_core::ports::BaseRepository;
use blog_shared::forms::NON_FIELD_ERRORS;
use blog_shared::{FormErrors, LoginForm, RegisterForm};

use super::redirect_with_cookie;
use crate::middleware::auth::{clear_session_cookie, safe_next, session_cookie};
use crate::middleware::error::AppResult;
use crate::state::AppState;
use crate::templates::{LoginPage, RegisterPage, render};

const HOME_URL: &str = "/posts";
const BAD_CREDENTIALS: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";
const USERNAME_TAKEN: &str = "A user with that username already exists.";

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Start a session for `user` and send them to `location`.
fn logged_in(state: &AppState, user: &User, location: &str) -> AppResult<HttpResponse> {
    let token = state.tokens.generate_token(user.id, &user.username)?;
    let cookie = session_cookie(token, state.tokens.expiration_seconds(), &state.session);

    Ok(redirect_with_cookie(location, cookie))
}

/// GET /accounts/login
pub async fn login_form(query: web::Query<NextQuery>) -> AppResult<HttpResponse> {
    let form = LoginForm {
        next: query.into_inner().next,
        ..LoginForm::default()
    };
    render(&LoginPage::new(form, FormErrors::new()))
}

/// POST /accounts/login
pub async fn login(
    state: web::Data<AppState>,
    form: web::Form<LoginForm>,
) -> AppResult<HttpResponse> {
    let form = match form.into_inner().clean() {
        Ok(form) => form,
        Err((form, errors)) => return render(&LoginPage::new(form, errors)),
    };

    let user = match state.users.find_by_username(&form.username).await? {
        Some(user) if state.passwords.verify(&form.password, &user.password_hash)? => user,
        _ => {
            tracing::info!(username = %form.username, "Failed login attempt");
            let mut errors = FormErrors::new();
            errors.add(NON_FIELD_ERRORS, BAD_CREDENTIALS);
            return render(&LoginPage::new(form.without_password(), errors));
        }
    };

    tracing::info!(user_id = %user.id, "User logged in");

    let location = safe_next(form.next.as_deref()).unwrap_or(HOME_URL);
    logged_in(&state, &user, location)
}

/// GET /accounts/register
pub async fn register_form() -> AppResult<HttpResponse> {
    render(&RegisterPage::new(RegisterForm::default(), FormErrors::new()))
}

/// POST /accounts/register
pub async fn register(
    state: web::Data<AppState>,
    form: web::Form<RegisterForm>,
) -> AppResult<HttpResponse> {
    let form = match form.into_inner().clean() {
        Ok(form) => form,
        Err((form, errors)) => return render(&RegisterPage::new(form, errors)),
    };

    let taken = || {
        let mut errors = FormErrors::new();
        errors.add("username", USERNAME_TAKEN);
        errors
    };

    if state.users.find_by_username(&form.username).await?.is_some() {
        return render(&RegisterPage::new(form.without_passwords(), taken()));
    }

    let password_hash = state.passwords.hash(&form.password)?;
    let user = match state
        .users
        .save(User::new(form.username.clone(), password_hash))
        .await
    {
        Ok(user) => user,
        // Lost a race with a concurrent sign-up for the same name
        Err(RepoError::Constraint(_)) => {
            return render(&RegisterPage::new(form.without_passwords(), taken()));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    logged_in(&state, &user, HOME_URL)
}

/// POST /accounts/logout
pub async fn logout() -> HttpResponse {
    redirect_with_cookie(HOME_URL, clear_session_cookie())
}
