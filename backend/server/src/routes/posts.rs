use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use catalog::{
    Paginated,
    models::{Post, PostDraft, PostSummary},
    text::{reading_minutes, slugify},
};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::{
    database::{POST_VIEWS, POSTS},
    error::AppError,
    markdown::{Heading, headings, render},
    search::{POST_INDEX, index_post, remove_document},
    state::AppState,
    utils::{ListQuery, claim_slug, insert_doc, save_doc},
};

pub const FEATURED_LIMIT: usize = 3;
pub const RELATED_LIMIT: usize = 3;

#[derive(Serialize)]
pub struct PostPage {
    #[serde(flatten)]
    pub post: Post,
    pub content_html: String,
    pub headings: Vec<Heading>,
    pub reading_minutes: usize,
    pub related: Vec<PostSummary>,
}

/// All posts with live view counts, newest first.
async fn load_posts(state: &AppState) -> Result<Vec<Post>, AppError> {
    let mut posts: Vec<Post> = state.store.all_docs(POSTS).await?;
    let views = state.store.counters(POST_VIEWS).await?;

    for post in posts.iter_mut() {
        post.views = views.get(&post.slug).copied().unwrap_or(0);
    }

    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(posts)
}

pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<PostSummary>>, AppError> {
    let page = query.page()?;
    let mut posts = load_posts(&state).await?;
    posts.retain(|post| post.published);

    let mut base_path = "/blog".to_string();

    if let Some(category) = query.category.as_deref().map(slugify) {
        posts.retain(|post| post.category == category);
        base_path = format!("/blog/category/{category}");
    }

    if let Some(tag) = query.tag.as_deref().map(slugify) {
        posts.retain(|post| post.tags.contains(&tag));
        base_path = if base_path == "/blog" {
            format!("/blog/tag/{tag}")
        } else {
            format!("{base_path}?tag={tag}")
        };
    }

    let paginated = Paginated::new(posts, page, state.config.posts_per_page, &base_path);
    Ok(Json(paginated.map(PostSummary::from)))
}

pub async fn featured_posts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PostSummary>>, AppError> {
    let featured = load_posts(&state)
        .await?
        .into_iter()
        .filter(|post| post.published && post.featured)
        .take(FEATURED_LIMIT)
        .map(PostSummary::from)
        .collect();

    Ok(Json(featured))
}

pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<PostPage>, AppError> {
    let mut post: Post = state
        .store
        .get_doc(POSTS, &slug)
        .await?
        .filter(|post: &Post| post.published)
        .ok_or(AppError::NotFound)?;

    post.views = state.store.incr(POST_VIEWS, &slug, 1).await?.max(0) as u64;

    let related = if post.category.is_empty() {
        vec![]
    } else {
        load_posts(&state)
            .await?
            .into_iter()
            .filter(|other| {
                other.published && other.slug != post.slug && other.category == post.category
            })
            .take(RELATED_LIMIT)
            .map(PostSummary::from)
            .collect()
    };

    Ok(Json(PostPage {
        content_html: render(&post.content),
        headings: headings(&post.content),
        reading_minutes: reading_minutes(&post.content),
        related,
        post,
    }))
}

pub async fn admin_list_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<PostSummary>>, AppError> {
    let page = query.page()?;
    let posts = load_posts(&state).await?;

    let paginated = Paginated::new(posts, page, state.config.posts_per_page, "/admin/posts");
    Ok(Json(paginated.map(PostSummary::from)))
}

pub async fn admin_get_post(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<Post>, AppError> {
    let mut post: Post = state
        .store
        .get_doc(POSTS, &slug)
        .await?
        .ok_or(AppError::NotFound)?;
    post.views = state.store.counter(POST_VIEWS, &slug).await?;

    Ok(Json(post))
}

pub async fn create_post(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<PostDraft>,
) -> Result<(StatusCode, Json<Post>), AppError> {
    draft.validate_new()?;

    let base = draft.base_slug()?;
    let slug = claim_slug(&state.store, POSTS, base, draft.slug.is_some()).await?;

    let post = draft.into_post(slug, Utc::now());
    insert_doc(&state.store, POSTS, &post.slug, &post).await?;
    index_post(state.search_client(), &post).await;

    info!("Created post {}", post.slug);
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn update_post(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Json(draft): Json<PostDraft>,
) -> Result<Json<Post>, AppError> {
    draft.validate_update()?;

    let mut post: Post = state
        .store
        .get_doc(POSTS, &slug)
        .await?
        .ok_or(AppError::NotFound)?;

    if draft.slug.is_some() {
        post.slug = draft.base_slug()?;
    }
    draft.apply(&mut post, Utc::now());

    save_doc(&state.store, POSTS, Some(POST_VIEWS), &slug, &post.slug, &post).await?;

    if post.slug != slug {
        remove_document(state.search_client(), POST_INDEX, &slug).await;
    }
    index_post(state.search_client(), &post).await;

    post.views = state.store.counter(POST_VIEWS, &post.slug).await?;
    Ok(Json(post))
}

pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete(POSTS, &slug).await? {
        return Err(AppError::NotFound);
    }

    state.store.delete(POST_VIEWS, &slug).await?;
    remove_document(state.search_client(), POST_INDEX, &slug).await;

    info!("Deleted post {slug}");
    Ok(StatusCode::NO_CONTENT)
}
