//! In-memory repositories - used when no database is configured and in tests.
//!
//! All three repositories share one [`InMemoryStore`] so foreign keys and
//! cascading deletes behave like the SQL schema. Data is lost on restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use blog_core::domain::{Comment, Post, PostFilter, User};
use blog_core::error::RepoError;
use blog_core::pagination::{Page, PageRequest};
use blog_core::ports::{BaseRepository, CommentRepository, PostRepository, UserRepository};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
}

impl Tables {
    fn delete_post_cascade(&mut self, post_id: Uuid) -> bool {
        if self.posts.remove(&post_id).is_none() {
            return false;
        }
        self.comments.retain(|_, c| c.post_id != post_id);
        true
    }
}

/// Shared in-memory tables behind an async RwLock.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

/// In-memory user repository.
#[derive(Clone)]
pub struct InMemoryUserRepository {
    store: Arc<InMemoryStore>,
}

impl InMemoryUserRepository {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.users.get(&id).cloned())
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.store.tables.write().await;

        let taken = tables
            .users
            .values()
            .any(|u| u.username == user.username && u.id != user.id);
        if taken {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }

        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }

        let owned: Vec<Uuid> = tables
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in owned {
            tables.delete_post_cascade(post_id);
        }
        tables.comments.retain(|_, c| c.author_id != id);

        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.users.get(id).cloned())
            .collect())
    }
}

/// In-memory post repository.
#[derive(Clone)]
pub struct InMemoryPostRepository {
    store: Arc<InMemoryStore>,
}

impl InMemoryPostRepository {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.posts.get(&id).cloned())
    }

    async fn save(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.store.tables.write().await;
        if !tables.users.contains_key(&post.author_id) {
            return Err(RepoError::Constraint(
                "Referenced entity does not exist".to_string(),
            ));
        }

        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        if tables.delete_post_cascade(id) {
            Ok(())
        } else {
            Err(RepoError::NotFound)
        }
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn list(&self, filter: &PostFilter, page: PageRequest) -> Result<Page<Post>, RepoError> {
        let tables = self.store.tables.read().await;

        let mut matching: Vec<&Post> = tables
            .posts
            .values()
            .filter(|p| filter.matches(&p.title))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let bounds = page.resolve(matching.len() as u64);
        let items = matching
            .into_iter()
            .skip(bounds.offset() as usize)
            .take(bounds.per_page as usize)
            .cloned()
            .collect();

        Ok(bounds.into_page(items))
    }
}

/// In-memory comment repository.
#[derive(Clone)]
pub struct InMemoryCommentRepository {
    store: Arc<InMemoryStore>,
}

impl InMemoryCommentRepository {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryCommentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.comments.get(&id).cloned())
    }

    async fn save(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.store.tables.write().await;
        if !tables.posts.contains_key(&comment.post_id)
            || !tables.users.contains_key(&comment.author_id)
        {
            return Err(RepoError::Constraint(
                "Referenced entity does not exist".to_string(),
            ));
        }

        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        match tables.comments.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound),
        }
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn find_by_post_id(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    struct Fixture {
        users: InMemoryUserRepository,
        posts: InMemoryPostRepository,
        comments: InMemoryCommentRepository,
        author: User,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let users = InMemoryUserRepository::new(store.clone());
        let author = users
            .save(User::new("testuser".into(), "hash".into()))
            .await
            .unwrap();

        Fixture {
            users,
            posts: InMemoryPostRepository::new(store.clone()),
            comments: InMemoryCommentRepository::new(store),
            author,
        }
    }

    /// Posts with strictly increasing creation times.
    async fn seed_posts(f: &Fixture, titles: &[&str]) -> Vec<Post> {
        let base = Utc::now() - Duration::hours(1);
        let mut saved = Vec::new();
        for (i, title) in titles.iter().enumerate() {
            let mut post = Post::new(f.author.id, title.to_string(), format!("Content {i}"));
            post.created_at = base + Duration::seconds(i as i64);
            saved.push(f.posts.save(post).await.unwrap());
        }
        saved
    }

    #[tokio::test]
    async fn test_list_newest_first_five_per_page() {
        let f = fixture().await;
        let titles: Vec<String> = (0..16).map(|i| format!("Post {i}")).collect();
        let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
        seed_posts(&f, &refs).await;

        let page = f
            .posts
            .list(&PostFilter::default(), PageRequest::parse(None, 5))
            .await
            .unwrap();

        assert_eq!(page.len(), 5);
        assert_eq!(page.num_pages, 4);
        assert!(page.has_other_pages());
        assert_eq!(page.items[0].title, "Post 15");
        assert_eq!(page.items[4].title, "Post 11");

        let last = f
            .posts
            .list(&PostFilter::default(), PageRequest::parse(Some("4"), 5))
            .await
            .unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last.items[0].title, "Post 0");
    }

    #[tokio::test]
    async fn test_list_filters_by_title_case_insensitive() {
        let f = fixture().await;
        seed_posts(&f, &["Test Post", "Another", "LATEST news"]).await;

        let filter = PostFilter::from_query(Some("test"));
        let page = f
            .posts
            .list(&filter, PageRequest::default())
            .await
            .unwrap();

        let titles: Vec<&str> = page.items.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["LATEST news", "Test Post"]);
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn test_delete_post_cascades_to_comments() {
        let f = fixture().await;
        let post = seed_posts(&f, &["Test Post"]).await.remove(0);
        let comment = f
            .comments
            .save(Comment::new(post.id, f.author.id, "This is a test comment.".into()))
            .await
            .unwrap();

        f.posts.delete(post.id).await.unwrap();

        assert!(f.posts.find_by_id(post.id).await.unwrap().is_none());
        assert!(f.comments.find_by_id(comment.id).await.unwrap().is_none());
        assert!(matches!(
            f.posts.delete(post.id).await,
            Err(RepoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_comment_requires_existing_post() {
        let f = fixture().await;
        let orphan = Comment::new(Uuid::new_v4(), f.author.id, "hello".into());

        assert!(matches!(
            f.comments.save(orphan).await,
            Err(RepoError::Constraint(_))
        ));
    }

    #[tokio::test]
    async fn test_comments_ordered_oldest_first() {
        let f = fixture().await;
        let post = seed_posts(&f, &["Test Post"]).await.remove(0);

        let mut first = Comment::new(post.id, f.author.id, "first".into());
        first.created_at = Utc::now() - Duration::minutes(5);
        let second = Comment::new(post.id, f.author.id, "second".into());
        f.comments.save(second).await.unwrap();
        f.comments.save(first).await.unwrap();

        let texts: Vec<String> = f
            .comments
            .find_by_post_id(post.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.text)
            .collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_username_is_unique() {
        let f = fixture().await;
        let dup = User::new("testuser".into(), "other".into());

        assert!(matches!(
            f.users.save(dup).await,
            Err(RepoError::Constraint(_))
        ));
        assert!(f.users.find_by_username("testuser").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let f = fixture().await;
        let post = seed_posts(&f, &["Test Post"]).await.remove(0);
        f.comments
            .save(Comment::new(post.id, f.author.id, "mine".into()))
            .await
            .unwrap();

        f.users.delete(f.author.id).await.unwrap();

        assert!(f.posts.find_by_id(post.id).await.unwrap().is_none());
        assert!(f.comments.find_by_post_id(post.id).await.unwrap().is_empty());
    }
}
