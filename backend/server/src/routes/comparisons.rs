use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use catalog::{
    Paginated,
    models::{Comparison, ComparisonDraft, Tool},
};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::{
    database::{COMPARISONS, Store, TOOLS},
    error::AppError,
    state::AppState,
    utils::{ListQuery, claim_slug, insert_doc, save_doc},
};

pub const COMPARISONS_PER_PAGE: usize = 12;

#[derive(Serialize)]
pub struct ComparisonPage {
    #[serde(flatten)]
    pub comparison: Comparison,
    pub resolved: Vec<Tool>,
}

/// Every listed tool, or `UnknownTool` for the first one missing.
async fn require_tools(store: &Store, slugs: &[String]) -> Result<Vec<Tool>, AppError> {
    let mut tools = Vec::with_capacity(slugs.len());

    for slug in slugs {
        let tool: Tool = store
            .get_doc(TOOLS, slug)
            .await?
            .ok_or_else(|| AppError::UnknownTool(slug.clone()))?;
        tools.push(tool);
    }

    Ok(tools)
}

pub async fn list_comparisons(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<Comparison>>, AppError> {
    let page = query.page()?;

    let mut comparisons: Vec<Comparison> = state.store.all_docs(COMPARISONS).await?;
    comparisons.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Json(Paginated::new(
        comparisons,
        page,
        COMPARISONS_PER_PAGE,
        "/compare",
    )))
}

/// Comparison with its tools. Tools deleted since are skipped.
pub async fn get_comparison(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<ComparisonPage>, AppError> {
    let comparison: Comparison = state
        .store
        .get_doc(COMPARISONS, &slug)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut resolved = Vec::with_capacity(comparison.tools.len());
    for tool_slug in &comparison.tools {
        if let Some(tool) = state.store.get_doc::<Tool>(TOOLS, tool_slug).await? {
            resolved.push(tool);
        }
    }

    Ok(Json(ComparisonPage {
        comparison,
        resolved,
    }))
}

pub async fn create_comparison(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<ComparisonDraft>,
) -> Result<(StatusCode, Json<Comparison>), AppError> {
    draft.validate_new()?;

    let tools = require_tools(&state.store, &draft.tool_slugs()).await?;
    let names: Vec<String> = tools.into_iter().map(|tool| tool.name).collect();

    let base = draft.base_slug(&names)?;
    let slug = claim_slug(&state.store, COMPARISONS, base, draft.slug.is_some()).await?;

    let comparison = draft.into_comparison(slug, &names, Utc::now());
    insert_doc(&state.store, COMPARISONS, &comparison.slug, &comparison).await?;

    info!("Created comparison {}", comparison.slug);
    Ok((StatusCode::CREATED, Json(comparison)))
}

pub async fn update_comparison(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Json(draft): Json<ComparisonDraft>,
) -> Result<Json<Comparison>, AppError> {
    draft.validate_update()?;

    let mut comparison: Comparison = state
        .store
        .get_doc(COMPARISONS, &slug)
        .await?
        .ok_or(AppError::NotFound)?;

    if draft.tools.is_some() {
        require_tools(&state.store, &draft.tool_slugs()).await?;
    }
    if draft.slug.is_some() {
        comparison.slug = draft.base_slug(&[])?;
    }
    draft.apply(&mut comparison, Utc::now());

    save_doc(
        &state.store,
        COMPARISONS,
        None,
        &slug,
        &comparison.slug,
        &comparison,
    )
    .await?;

    Ok(Json(comparison))
}

pub async fn delete_comparison(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete(COMPARISONS, &slug).await? {
        return Err(AppError::NotFound);
    }

    info!("Deleted comparison {slug}");
    Ok(StatusCode::NO_CONTENT)
}
