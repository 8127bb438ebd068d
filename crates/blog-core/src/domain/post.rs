use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post entity - a blog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post.
    pub fn new(author_id: Uuid, title: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            title,
            content,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the editable fields. `created_at` is kept so the post keeps
    /// its place in the listing.
    pub fn apply_edit(&mut self, title: String, content: String) {
        self.title = title;
        self.content = content;
        self.updated_at = Utc::now();
    }

    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_post_fields() {
        let author = Uuid::new_v4();
        let post = Post::new(author, "Test Post".into(), "This is a test post.".into());

        assert_eq!(post.title, "Test Post");
        assert_eq!(post.content, "This is a test post.");
        assert_eq!(post.author_id, author);
        assert_eq!(post.created_at, post.updated_at);
    }

    #[test]
    fn test_apply_edit_keeps_created_at() {
        let mut post = Post::new(Uuid::new_v4(), "Old".into(), "Old body".into());
        let created = post.created_at;

        post.apply_edit("New".into(), "New body".into());

        assert_eq!(post.title, "New");
        assert_eq!(post.content, "New body");
        assert_eq!(post.created_at, created);
        assert!(post.updated_at >= created);
    }
}
