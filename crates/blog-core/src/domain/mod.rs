//! Domain entities - the core business objects.

mod comment;
mod post;
mod search;
mod user;

pub use comment::Comment;
pub use post::Post;
pub use search::PostFilter;
pub use user::User;
