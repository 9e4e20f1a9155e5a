//! # Meilisearch
//!
//! Optional search engine over posts and tools. Redis stays the source of truth.
//!
//!
//!
//! ## Schema
//! - Index `posts`: slug, title, excerpt, body (plain text), category, tags, created_at (unix seconds)
//! - Index `tools`: slug, name, tagline, description, category, pricing, rating, features
//! - Drafts never reach the posts index
//!
//!
//!
//! ## Sync
//! - On boot every published post and every tool is upserted
//! - Admin writes upsert or delete the single document touched
//! - Failures are logged and swallowed, the next boot heals the index
//!
//!
//!
//! ## Fallback
//! Without `MEILI_URL`, or when a query fails, search scans the store with a plain
//! case-insensitive substring match. Fine for a site with a few hundred documents.
//!
//!
//!
//! ## Commands
//!
//! Grab relevant keys.
//! ```sh
//! curl -H "Authorization: Bearer $(cat /run/secrets/MEILI_MASTER_KEY)" http://localhost:7700/keys
//! ```
use std::sync::Arc;

use catalog::{
    models::{Post, Pricing, Tool, searchable_text},
    text::plain_text,
};
use meilisearch_sdk::{
    client::Client,
    settings::{MinWordSizeForTypos, Settings, TypoToleranceSettings},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    database::{POSTS, Store, TOOLS},
    error::AppError,
};

pub const POST_INDEX: &str = "posts";
pub const TOOL_INDEX: &str = "tools";
pub const DOC_ID: &str = "slug";

/// Hits fetched per index before pagination.
pub const SEARCH_LIMIT: usize = 50;

#[derive(Serialize, Deserialize)]
pub struct MeiliPost {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub body: String,
    pub category: String,
    pub tags: Vec<String>,
    pub created_at: i64,
}

impl From<&Post> for MeiliPost {
    fn from(post: &Post) -> Self {
        Self {
            slug: post.slug.clone(),
            title: post.title.clone(),
            excerpt: post.excerpt.clone(),
            body: plain_text(&post.content),
            category: post.category.clone(),
            tags: post.tags.clone(),
            created_at: post.created_at.timestamp(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct MeiliTool {
    pub slug: String,
    pub name: String,
    pub tagline: String,
    pub description: String,
    pub category: String,
    pub pricing: Pricing,
    pub rating: f32,
    pub features: Vec<String>,
}

impl From<&Tool> for MeiliTool {
    fn from(tool: &Tool) -> Self {
        Self {
            slug: tool.slug.clone(),
            name: tool.name.clone(),
            tagline: tool.tagline.clone(),
            description: tool.description.clone(),
            category: tool.category.clone(),
            pricing: tool.pricing,
            rating: tool.rating,
            features: tool.features.clone(),
        }
    }
}

/// One search result, whatever collection it came from.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub kind: &'static str,
    pub slug: String,
    pub title: String,
    pub snippet: String,
    pub href: String,
}

impl From<MeiliPost> for SearchHit {
    fn from(post: MeiliPost) -> Self {
        Self {
            kind: "post",
            href: format!("/blog/{}", post.slug),
            slug: post.slug,
            title: post.title,
            snippet: post.excerpt,
        }
    }
}

impl From<MeiliTool> for SearchHit {
    fn from(tool: MeiliTool) -> Self {
        Self {
            kind: "tool",
            href: format!("/tools/{}", tool.slug),
            slug: tool.slug,
            title: tool.name,
            snippet: tool.tagline,
        }
    }
}

pub async fn init_meilisearch(
    meili_url: &str,
    meili_admin_key: Option<&str>,
    store: &Store,
) -> Result<Arc<Client>, AppError> {
    let meili_client = Arc::new(Client::new(meili_url, meili_admin_key)?);

    if let Err(e) = sync_all(&meili_client, store).await {
        warn!("Initial search sync failed, index may be stale: {e}");
    }

    Ok(meili_client)
}

async fn sync_all(meili_client: &Client, store: &Store) -> Result<(), AppError> {
    meili_client
        .index(POST_INDEX)
        .set_settings(&post_settings())
        .await?;
    meili_client
        .index(TOOL_INDEX)
        .set_settings(&tool_settings())
        .await?;

    let posts: Vec<Post> = store.all_docs(POSTS).await?;
    let meili_posts: Vec<MeiliPost> = posts
        .iter()
        .filter(|post| post.published)
        .map(MeiliPost::from)
        .collect();

    let tools: Vec<Tool> = store.all_docs(TOOLS).await?;
    let meili_tools: Vec<MeiliTool> = tools.iter().map(MeiliTool::from).collect();

    upsert_items(meili_client, POST_INDEX, &meili_posts).await?;
    upsert_items(meili_client, TOOL_INDEX, &meili_tools).await?;

    info!(
        "Search synced: {} posts, {} tools",
        meili_posts.len(),
        meili_tools.len()
    );
    Ok(())
}

async fn upsert_items<T>(meili_client: &Client, index_name: &str, items: &[T]) -> Result<(), AppError>
where
    T: Serialize + Send + Sync,
{
    if items.is_empty() {
        return Ok(());
    }

    let _result = meili_client
        .index(index_name)
        .add_or_update(items, Some(DOC_ID))
        .await?
        .wait_for_completion(meili_client, None, None)
        .await?;

    Ok(())
}

/// Upsert a post, or drop it from the index while it is a draft.
pub async fn index_post(meili_client: Option<&Client>, post: &Post) {
    let Some(meili_client) = meili_client else {
        return;
    };

    let index = meili_client.index(POST_INDEX);
    let result = if post.published {
        index
            .add_or_update(&[MeiliPost::from(post)], Some(DOC_ID))
            .await
            .map(|_| ())
    } else {
        index.delete_document(&post.slug).await.map(|_| ())
    };

    if let Err(e) = result {
        warn!("Failed to index post {}: {e}", post.slug);
    }
}

pub async fn index_tool(meili_client: Option<&Client>, tool: &Tool) {
    let Some(meili_client) = meili_client else {
        return;
    };

    if let Err(e) = meili_client
        .index(TOOL_INDEX)
        .add_or_update(&[MeiliTool::from(tool)], Some(DOC_ID))
        .await
    {
        warn!("Failed to index tool {}: {e}", tool.slug);
    }
}

pub async fn remove_document(meili_client: Option<&Client>, index_name: &str, slug: &str) {
    let Some(meili_client) = meili_client else {
        return;
    };

    if let Err(e) = meili_client.index(index_name).delete_document(slug).await {
        warn!("Failed to remove {index_name}/{slug} from search: {e}");
    }
}

/// Tools first, then posts.
pub async fn search(meili_client: &Client, query: &str) -> Result<Vec<SearchHit>, AppError> {
    let tools = meili_client
        .index(TOOL_INDEX)
        .search()
        .with_query(query)
        .with_limit(SEARCH_LIMIT)
        .execute::<MeiliTool>()
        .await?;

    let posts = meili_client
        .index(POST_INDEX)
        .search()
        .with_query(query)
        .with_limit(SEARCH_LIMIT)
        .execute::<MeiliPost>()
        .await?;

    Ok(tools
        .hits
        .into_iter()
        .map(|hit| SearchHit::from(hit.result))
        .chain(posts.hits.into_iter().map(|hit| SearchHit::from(hit.result)))
        .collect())
}

/// Substring scan over the store, same ordering as `search`.
pub async fn scan(store: &Store, query: &str) -> Result<Vec<SearchHit>, AppError> {
    let needle = query.trim().to_lowercase();

    let mut tools: Vec<Tool> = store.all_docs(TOOLS).await?;
    tools.retain(|tool| {
        searchable_text(&[
            &tool.name,
            &tool.tagline,
            &tool.description,
            &tool.features.join(" "),
        ])
        .contains(&needle)
    });
    tools.sort_by(|a, b| a.name.cmp(&b.name));

    let mut posts: Vec<Post> = store.all_docs(POSTS).await?;
    posts.retain(|post| {
        post.published
            && searchable_text(&[&post.title, &post.excerpt, &post.content, &post.tags.join(" ")])
                .contains(&needle)
    });
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(tools
        .iter()
        .map(|tool| SearchHit::from(MeiliTool::from(tool)))
        .chain(posts.iter().map(|post| SearchHit::from(MeiliPost::from(post))))
        .collect())
}

fn typo_tolerance() -> TypoToleranceSettings {
    TypoToleranceSettings {
        enabled: Some(true),
        disable_on_attributes: None,
        disable_on_words: None,
        min_word_size_for_typos: Some(MinWordSizeForTypos {
            one_typo: Some(5),
            two_typos: Some(9),
        }),
    }
}

fn post_settings() -> Settings {
    Settings::new()
        .with_ranking_rules([
            "words",
            "typo",
            "proximity",
            "attribute",
            "exactness",
            "created_at:desc",
        ])
        .with_searchable_attributes(["title", "tags", "excerpt", "body"])
        .with_filterable_attributes(["category", "tags"])
        .with_sortable_attributes(["created_at"])
        .with_typo_tolerance(typo_tolerance())
}

fn tool_settings() -> Settings {
    Settings::new()
        .with_ranking_rules([
            "words",
            "typo",
            "proximity",
            "attribute",
            "exactness",
            "rating:desc",
        ])
        .with_searchable_attributes(["name", "tagline", "features", "description"])
        .with_filterable_attributes(["category", "pricing"])
        .with_sortable_attributes(["rating"])
        .with_typo_tolerance(typo_tolerance())
}

#[cfg(test)]
mod tests {
    use catalog::models::ToolDraft;
    use chrono::Utc;

    use super::*;

    #[tokio::test]
    async fn test_scan_matches_tools_and_published_posts() {
        let store = Store::memory();
        let now = Utc::now();

        let tool = ToolDraft {
            name: Some("Claude".into()),
            tagline: Some("Helpful assistant".into()),
            website: Some("https://claude.ai".into()),
            ..Default::default()
        }
        .into_tool("claude".into(), now);
        store.put_doc(TOOLS, &tool.slug, &tool).await.unwrap();

        let mut post = catalog::models::PostDraft {
            title: Some("Using an assistant for research".into()),
            content: Some("Body".into()),
            published: Some(true),
            ..Default::default()
        }
        .into_post("using-an-assistant".into(), now);
        store.put_doc(POSTS, &post.slug, &post).await.unwrap();

        post.slug = "draft".into();
        post.published = false;
        store.put_doc(POSTS, &post.slug, &post).await.unwrap();

        let hits = scan(&store, "Assistant").await.unwrap();
        let kinds: Vec<_> = hits.iter().map(|h| (h.kind, h.slug.as_str())).collect();
        assert_eq!(kinds, vec![("tool", "claude"), ("post", "using-an-assistant")]);
        assert_eq!(hits[0].href, "/tools/claude");
    }
}
