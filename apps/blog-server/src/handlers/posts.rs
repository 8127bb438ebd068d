//! Post listing, detail, comments and post management.

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use uuid::Uuid;

use blog_core::domain::{Comment, Post, PostFilter};
use blog_core::error::DomainError;
use blog_core::ports::BaseRepository;
use blog_core::{POSTS_PER_PAGE, PageRequest};
use blog_shared::{CommentForm, FormErrors, PostForm};

use super::redirect;
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::observability::RequestId;
use crate::state::AppState;
use crate::templates::{
    Authors, CommentView, PageNav, PostConfirmDeletePage, PostCreatePage, PostDetailPage,
    PostEditPage, PostListPage, PostSummary, PostView, post_url, render,
};

const POST_LIST_URL: &str = "/posts";

/// Raw listing query pairs. A repeated key takes its last value.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct ListQuery(Vec<(String, String)>);

impl ListQuery {
    fn last(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Look up a post by the id segment of the path. Malformed ids are treated
/// like unknown ones.
async fn find_post(state: &AppState, raw_id: &str) -> AppResult<Post> {
    let id = Uuid::parse_str(raw_id)
        .map_err(|_| AppError::NotFound(format!("No post matches id {}", raw_id)))?;

    state.posts.find_by_id(id).await?.ok_or_else(|| {
        DomainError::NotFound {
            entity_type: "post",
            id,
        }
        .into()
    })
}

fn ensure_author(post: &Post, identity: &Identity) -> AppResult<()> {
    if post.is_authored_by(identity.user_id) {
        Ok(())
    } else {
        tracing::warn!(
            post_id = %post.id,
            user_id = %identity.user_id,
            "Rejected change by non-author"
        );
        Err(DomainError::NotAuthor {
            entity_type: "post",
            id: post.id,
        }
        .into())
    }
}

async fn load_authors(
    state: &AppState,
    ids: impl IntoIterator<Item = Uuid>,
) -> AppResult<Authors> {
    let mut ids: Vec<Uuid> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();

    Ok(Authors::new(state.users.find_by_ids(&ids).await?))
}

/// Post page with its comments; also used to re-render a rejected comment.
async fn detail_page(
    state: &AppState,
    post: &Post,
    viewer: Option<&Identity>,
    form: CommentForm,
    errors: FormErrors,
) -> AppResult<HttpResponse> {
    let comments = state.comments.find_by_post_id(post.id).await?;
    let authors = load_authors(
        state,
        std::iter::once(post.author_id).chain(comments.iter().map(|c| c.author_id)),
    )
    .await?;

    render(&PostDetailPage {
        current_user: viewer.map(|i| i.username.clone()),
        post: PostView::new(post, &authors, viewer.map(|i| i.user_id)),
        comments: comments
            .iter()
            .map(|c| CommentView::new(c, &authors))
            .collect(),
        form,
        errors,
    })
}

/// GET / and GET /posts
pub async fn post_list(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    query: web::Query<ListQuery>,
) -> AppResult<HttpResponse> {
    let filter = PostFilter::from_query(query.last("q"));
    // Kept raw: non-numeric values fall back to the first page
    let request = PageRequest::parse(query.last("page"), POSTS_PER_PAGE);

    let page = state.posts.list(&filter, request).await?;
    let authors = load_authors(&state, page.items.iter().map(|p| p.author_id)).await?;

    let search = filter.title_contains.unwrap_or_default();
    render(&PostListPage {
        current_user: identity.username(),
        posts: page
            .items
            .iter()
            .map(|p| PostSummary::new(p, &authors))
            .collect(),
        page: PageNav::new(&page, &search),
        query: search,
    })
}

/// GET /posts/{id}
pub async fn post_detail(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, &path).await?;
    detail_page(
        &state,
        &post,
        identity.0.as_ref(),
        CommentForm::default(),
        FormErrors::new(),
    )
    .await
}

/// POST /posts/{id} - add a comment
pub async fn comment_create(
    state: web::Data<AppState>,
    identity: Identity,
    request_id: RequestId,
    path: web::Path<String>,
    form: web::Form<CommentForm>,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, &path).await?;

    let form = match form.into_inner().clean() {
        Ok(form) => form,
        Err((form, errors)) => {
            return detail_page(&state, &post, Some(&identity), form, errors).await;
        }
    };

    let comment = state
        .comments
        .save(Comment::new(post.id, identity.user_id, form.text))
        .await?;

    tracing::info!(
        request_id = %request_id,
        post_id = %post.id,
        comment_id = %comment.id,
        "Comment added"
    );

    Ok(redirect(&post_url(post.id)))
}

/// GET /posts/new
pub async fn post_create_form(identity: Identity) -> AppResult<HttpResponse> {
    render(&PostCreatePage::new(
        Some(identity.username),
        PostForm::default(),
        FormErrors::new(),
    ))
}

/// POST /posts/new
pub async fn post_create(
    state: web::Data<AppState>,
    identity: Identity,
    request_id: RequestId,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    let form = match form.into_inner().clean() {
        Ok(form) => form,
        Err((form, errors)) => {
            return render(&PostCreatePage::new(Some(identity.username), form, errors));
        }
    };

    let post = state
        .posts
        .save(Post::new(identity.user_id, form.title, form.content))
        .await?;

    tracing::info!(
        request_id = %request_id,
        post_id = %post.id,
        author_id = %identity.user_id,
        "Post created"
    );

    Ok(redirect(POST_LIST_URL))
}

/// GET /posts/{id}/edit
pub async fn post_edit_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, &path).await?;
    ensure_author(&post, &identity)?;

    render(&PostEditPage::new(
        Some(identity.username),
        post.id,
        PostForm::new(post.title, post.content),
        FormErrors::new(),
    ))
}

/// POST /posts/{id}/edit
pub async fn post_edit(
    state: web::Data<AppState>,
    identity: Identity,
    request_id: RequestId,
    path: web::Path<String>,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    let mut post = find_post(&state, &path).await?;
    ensure_author(&post, &identity)?;

    let form = match form.into_inner().clean() {
        Ok(form) => form,
        Err((form, errors)) => {
            return render(&PostEditPage::new(
                Some(identity.username),
                post.id,
                form,
                errors,
            ));
        }
    };

    post.apply_edit(form.title, form.content);
    let post = state.posts.save(post).await?;

    tracing::info!(request_id = %request_id, post_id = %post.id, "Post updated");

    Ok(redirect(&post_url(post.id)))
}

/// GET /posts/{id}/delete
pub async fn post_delete_confirm(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, &path).await?;
    ensure_author(&post, &identity)?;

    let authors = load_authors(&state, [post.author_id]).await?;
    render(&PostConfirmDeletePage {
        current_user: Some(identity.username.clone()),
        post: PostView::new(&post, &authors, Some(identity.user_id)),
    })
}

/// POST /posts/{id}/delete
pub async fn post_delete(
    state: web::Data<AppState>,
    identity: Identity,
    request_id: RequestId,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, &path).await?;
    ensure_author(&post, &identity)?;

    state.posts.delete(post.id).await?;

    tracing::info!(request_id = %request_id, post_id = %post.id, "Post deleted");

    Ok(redirect(POST_LIST_URL))
}
