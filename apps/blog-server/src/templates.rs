//! Askama page templates and the view models they render.

use std::collections::HashMap;

use actix_web::HttpResponse;
use actix_web::http::header::ContentType;
use askama::Template;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use blog_core::Page;
use blog_core::domain::{Comment, Post, User};
use blog_shared::forms::TITLE_MAX_CHARS;
use blog_shared::{CommentForm, ErrorResponse, FormErrors, LoginForm, PostForm, RegisterForm};

use crate::middleware::error::AppResult;

const DELETED_USER: &str = "[deleted]";
const EXCERPT_CHARS: usize = 200;

/// Render a template as a `200 OK` HTML response.
pub fn render<T: Template>(template: &T) -> AppResult<HttpResponse> {
    let body = template.render()?;
    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(body))
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%B %-d, %Y %H:%M").to_string()
}

pub fn post_url(id: Uuid) -> String {
    format!("/posts/{}", id)
}

/// Username lookup for authors shown on a page.
pub struct Authors(HashMap<Uuid, String>);

impl Authors {
    pub fn new(users: Vec<User>) -> Self {
        Self(users.into_iter().map(|u| (u.id, u.username)).collect())
    }

    pub fn name(&self, id: Uuid) -> String {
        self.0
            .get(&id)
            .cloned()
            .unwrap_or_else(|| DELETED_USER.to_string())
    }
}

/// A post as shown in the listing.
pub struct PostSummary {
    pub url: String,
    pub title: String,
    pub excerpt: String,
    pub author: String,
    pub created_at: String,
}

impl PostSummary {
    pub fn new(post: &Post, authors: &Authors) -> Self {
        let mut excerpt: String = post.content.chars().take(EXCERPT_CHARS).collect();
        if post.content.chars().count() > EXCERPT_CHARS {
            excerpt.push('…');
        }

        Self {
            url: post_url(post.id),
            title: post.title.clone(),
            excerpt,
            author: authors.name(post.author_id),
            created_at: format_timestamp(&post.created_at),
        }
    }
}

/// Pagination links for the listing, preserving the search query.
pub struct PageNav {
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
    pub start_index: u64,
    pub end_index: u64,
    pub has_other_pages: bool,
    pub first_url: Option<String>,
    pub previous_url: Option<String>,
    pub next_url: Option<String>,
    pub last_url: Option<String>,
}

impl PageNav {
    pub fn new<T>(page: &Page<T>, query: &str) -> Self {
        let link = |n: u64| {
            if query.is_empty() {
                format!("/posts?page={}", n)
            } else {
                format!("/posts?q={}&page={}", urlencoding::encode(query), n)
            }
        };

        Self {
            number: page.number,
            num_pages: page.num_pages,
            total: page.total,
            start_index: page.start_index(),
            end_index: page.end_index(),
            has_other_pages: page.has_other_pages(),
            first_url: page.has_previous().then(|| link(1)),
            previous_url: page.previous_page_number().map(link),
            next_url: page.next_page_number().map(link),
            last_url: page.has_next().then(|| link(page.num_pages)),
        }
    }
}

/// A full post on its own page.
pub struct PostView {
    pub id: String,
    pub url: String,
    pub title: String,
    pub content: String,
    pub author: String,
    pub created_at: String,
    pub edited: bool,
    /// The viewer wrote this post and may edit or delete it.
    pub can_manage: bool,
}

impl PostView {
    pub fn new(post: &Post, authors: &Authors, viewer: Option<Uuid>) -> Self {
        Self {
            id: post.id.to_string(),
            url: post_url(post.id),
            title: post.title.clone(),
            content: post.content.clone(),
            author: authors.name(post.author_id),
            created_at: format_timestamp(&post.created_at),
            edited: post.updated_at > post.created_at,
            can_manage: viewer == Some(post.author_id),
        }
    }
}

pub struct CommentView {
    pub author: String,
    pub text: String,
    pub created_at: String,
}

impl CommentView {
    pub fn new(comment: &Comment, authors: &Authors) -> Self {
        Self {
            author: authors.name(comment.author_id),
            text: comment.text.clone(),
            created_at: format_timestamp(&comment.created_at),
        }
    }
}

#[derive(Template)]
#[template(path = "blog/post_list.html")]
pub struct PostListPage {
    pub current_user: Option<String>,
    pub posts: Vec<PostSummary>,
    pub page: PageNav,
    pub query: String,
}

#[derive(Template)]
#[template(path = "blog/post_detail.html")]
pub struct PostDetailPage {
    pub current_user: Option<String>,
    pub post: PostView,
    pub comments: Vec<CommentView>,
    pub form: CommentForm,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "blog/post_create.html")]
pub struct PostCreatePage {
    pub current_user: Option<String>,
    pub form: PostForm,
    pub errors: FormErrors,
    pub title_max: u64,
}

impl PostCreatePage {
    pub fn new(current_user: Option<String>, form: PostForm, errors: FormErrors) -> Self {
        Self {
            current_user,
            form,
            errors,
            title_max: TITLE_MAX_CHARS,
        }
    }
}

#[derive(Template)]
#[template(path = "blog/post_edit.html")]
pub struct PostEditPage {
    pub current_user: Option<String>,
    pub post_url: String,
    pub form: PostForm,
    pub errors: FormErrors,
    pub title_max: u64,
}

impl PostEditPage {
    pub fn new(
        current_user: Option<String>,
        post_id: Uuid,
        form: PostForm,
        errors: FormErrors,
    ) -> Self {
        Self {
            current_user,
            post_url: post_url(post_id),
            form,
            errors,
            title_max: TITLE_MAX_CHARS,
        }
    }
}

#[derive(Template)]
#[template(path = "blog/post_confirm_delete.html")]
pub struct PostConfirmDeletePage {
    pub current_user: Option<String>,
    pub post: PostView,
}

#[derive(Template)]
#[template(path = "registration/login.html")]
pub struct LoginPage {
    pub current_user: Option<String>,
    pub username: String,
    pub next: String,
    pub errors: FormErrors,
}

impl LoginPage {
    pub fn new(form: LoginForm, errors: FormErrors) -> Self {
        Self {
            current_user: None,
            username: form.username,
            next: form.next.unwrap_or_default(),
            errors,
        }
    }
}

#[derive(Template)]
#[template(path = "registration/register.html")]
pub struct RegisterPage {
    pub current_user: Option<String>,
    pub username: String,
    pub errors: FormErrors,
}

impl RegisterPage {
    pub fn new(form: RegisterForm, errors: FormErrors) -> Self {
        Self {
            current_user: None,
            username: form.username,
            errors,
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage {
    pub current_user: Option<String>,
    pub error: ErrorResponse,
}
