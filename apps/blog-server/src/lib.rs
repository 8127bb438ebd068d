//! # Blog Server
//!
//! Server-rendered blog on actix-web: post listing with search and
//! pagination, post pages with comments, and post create/edit/delete forms.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod state;
pub mod telemetry;
pub mod templates;

pub use config::AppConfig;
pub use state::AppState;
