//! HTTP handlers and route configuration.

mod accounts;
mod health;
mod posts;

use actix_web::cookie::Cookie;
use actix_web::http::header;
use actix_web::{HttpResponse, web};

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(posts::post_list))
        .route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/posts")
                .route("", web::get().to(posts::post_list))
                // Registered before `/{id}` so "new" is never read as an id
                .service(
                    web::resource("/new")
                        .route(web::get().to(posts::post_create_form))
                        .route(web::post().to(posts::post_create)),
                )
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(posts::post_detail))
                        .route(web::post().to(posts::comment_create)),
                )
                .service(
                    web::resource("/{id}/edit")
                        .route(web::get().to(posts::post_edit_form))
                        .route(web::post().to(posts::post_edit)),
                )
                .service(
                    web::resource("/{id}/delete")
                        .route(web::get().to(posts::post_delete_confirm))
                        .route(web::post().to(posts::post_delete)),
                ),
        )
        .service(
            web::scope("/accounts")
                .service(
                    web::resource("/login")
                        .route(web::get().to(accounts::login_form))
                        .route(web::post().to(accounts::login)),
                )
                .service(
                    web::resource("/register")
                        .route(web::get().to(accounts::register_form))
                        .route(web::post().to(accounts::register)),
                )
                .route("/logout", web::post().to(accounts::logout)),
        );
}

/// `302 Found` to `location`.
fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// `302 Found` that also sets (or removes) a cookie.
fn redirect_with_cookie(location: &str, cookie: Cookie<'_>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .cookie(cookie)
        .finish()
}
