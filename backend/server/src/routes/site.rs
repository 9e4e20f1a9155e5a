use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::header::CONTENT_TYPE,
    response::IntoResponse,
};
use catalog::{
    Paginated, TextStats,
    models::{Comparison, Position, Post, Tool},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use urlencoding::encode;

use crate::{
    database::{COMPARISONS, POSTS, TOOLS},
    error::AppError,
    search::{SearchHit, scan, search},
    state::AppState,
    utils::{ListQuery, xml_escape},
};

pub const SEARCH_PER_PAGE: usize = 10;

pub async fn health() -> &'static str {
    "ok"
}

#[derive(Serialize)]
pub struct AdSlot {
    pub position: Position,
    pub slot: String,
}

#[derive(Serialize)]
pub struct AdsResponse {
    pub enabled: bool,
    pub client: Option<String>,
    pub slots: Vec<AdSlot>,
}

/// Ad network settings for the front end loader. Disabled without a client id.
pub async fn ads(State(state): State<Arc<AppState>>) -> Json<AdsResponse> {
    let ads = &state.config.ads;

    let Some(client) = ads.client.clone() else {
        return Json(AdsResponse {
            enabled: false,
            client: None,
            slots: vec![],
        });
    };

    let slots = Position::ALL
        .into_iter()
        .filter_map(|position| {
            let slot = match position {
                Position::Header => &ads.header_slot,
                Position::Sidebar => &ads.sidebar_slot,
                Position::InContent => &ads.in_content_slot,
                Position::Footer => &ads.footer_slot,
            };
            slot.clone().map(|slot| AdSlot { position, slot })
        })
        .collect();

    Json(AdsResponse {
        enabled: true,
        client: Some(client),
        slots,
    })
}

#[derive(Deserialize)]
pub struct CounterRequest {
    pub text: String,
}

/// Word, character and token counts for the public counter tool.
pub async fn counter(Json(request): Json<CounterRequest>) -> Json<TextStats> {
    Json(TextStats::of(&request.text))
}

pub async fn search_site(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<SearchHit>>, AppError> {
    let page = query.page()?;
    let q = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or(AppError::InvalidQuery("q"))?;

    let hits = match state.search_client() {
        Some(meili_client) => match search(meili_client, q).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!("Search engine failed, scanning store instead: {e}");
                scan(&state.store, q).await?
            }
        },
        None => scan(&state.store, q).await?,
    };

    Ok(Json(Paginated::new(hits, page, SEARCH_PER_PAGE, &search_path(q))))
}

fn search_path(q: &str) -> String {
    format!("/search?q={}", encode(q))
}

fn url_entry(site_url: &str, path: &str, modified: Option<DateTime<Utc>>) -> String {
    let loc = xml_escape(&format!("{site_url}{path}"));

    match modified {
        Some(modified) => format!(
            "  <url><loc>{loc}</loc><lastmod>{}</lastmod></url>\n",
            modified.format("%Y-%m-%d")
        ),
        None => format!("  <url><loc>{loc}</loc></url>\n"),
    }
}

pub async fn sitemap(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let site_url = state.config.site_url.as_str();

    let mut posts: Vec<Post> = state.store.all_docs(POSTS).await?;
    posts.retain(|post| post.published);
    posts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    let mut tools: Vec<Tool> = state.store.all_docs(TOOLS).await?;
    tools.sort_by(|a, b| a.slug.cmp(&b.slug));

    let mut comparisons: Vec<Comparison> = state.store.all_docs(COMPARISONS).await?;
    comparisons.sort_by(|a, b| a.slug.cmp(&b.slug));

    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );

    for path in ["/", "/blog", "/tools", "/compare"] {
        xml.push_str(&url_entry(site_url, path, None));
    }
    for post in &posts {
        xml.push_str(&url_entry(site_url, &format!("/blog/{}", post.slug), Some(post.updated_at)));
    }
    for tool in &tools {
        xml.push_str(&url_entry(site_url, &format!("/tools/{}", tool.slug), Some(tool.updated_at)));
    }
    for comparison in &comparisons {
        xml.push_str(&url_entry(
            site_url,
            &format!("/compare/{}", comparison.slug),
            Some(comparison.updated_at),
        ));
    }

    xml.push_str("</urlset>\n");

    Ok(([(CONTENT_TYPE, "application/xml; charset=utf-8")], xml))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_path() {
        assert_eq!(search_path("rust & ai"), "/search?q=rust%20%26%20ai");
        assert_eq!(search_path("café"), "/search?q=caf%C3%A9");
    }
}
