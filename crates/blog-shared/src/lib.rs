//! # Blog Shared
//!
//! Types shared between the HTTP layer and its templates: submitted forms
//! and the error-page payload.

pub mod forms;
pub mod response;

pub use forms::{CommentForm, FormErrors, LoginForm, PostForm, RegisterForm};
pub use response::ErrorResponse;
