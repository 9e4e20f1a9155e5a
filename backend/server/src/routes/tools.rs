use std::{cmp::Ordering, sync::Arc};

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use catalog::{
    Paginated,
    models::{Comparison, Pricing, Tool, ToolDraft},
    text::slugify,
};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::{
    database::{COMPARISONS, TOOLS},
    error::AppError,
    search::{TOOL_INDEX, index_tool, remove_document},
    state::AppState,
    utils::{ListQuery, claim_slug, insert_doc, save_doc},
};

#[derive(Serialize)]
pub struct ToolPage {
    #[serde(flatten)]
    pub tool: Tool,
    pub outbound_url: String,
    pub comparisons: Vec<Comparison>,
}

/// Featured first, then best rated, then by name.
fn directory_order(a: &Tool, b: &Tool) -> Ordering {
    b.featured
        .cmp(&a.featured)
        .then_with(|| b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal))
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
}

pub async fn list_tools(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<Tool>>, AppError> {
    let page = query.page()?;
    let mut tools: Vec<Tool> = state.store.all_docs(TOOLS).await?;

    let mut base_path = "/tools".to_string();

    if let Some(category) = query.category.as_deref().map(slugify) {
        tools.retain(|tool| tool.category == category);
        base_path = format!("/tools/category/{category}");
    }

    if let Some(raw) = query.pricing.as_deref() {
        let pricing = Pricing::parse(raw).ok_or(AppError::InvalidQuery("pricing"))?;
        tools.retain(|tool| tool.pricing == pricing);
        base_path = format!("{base_path}?pricing={}", raw.trim().to_lowercase());
    }

    tools.sort_by(directory_order);

    Ok(Json(Paginated::new(
        tools,
        page,
        state.config.tools_per_page,
        &base_path,
    )))
}

pub async fn get_tool(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<ToolPage>, AppError> {
    let tool: Tool = state
        .store
        .get_doc(TOOLS, &slug)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut comparisons: Vec<Comparison> = state.store.all_docs(COMPARISONS).await?;
    comparisons.retain(|comparison| comparison.tools.contains(&tool.slug));
    comparisons.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Json(ToolPage {
        outbound_url: tool.outbound_url().to_string(),
        comparisons,
        tool,
    }))
}

pub async fn create_tool(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<ToolDraft>,
) -> Result<(StatusCode, Json<Tool>), AppError> {
    draft.validate_new()?;

    let base = draft.base_slug()?;
    let slug = claim_slug(&state.store, TOOLS, base, draft.slug.is_some()).await?;

    let tool = draft.into_tool(slug, Utc::now());
    insert_doc(&state.store, TOOLS, &tool.slug, &tool).await?;
    index_tool(state.search_client(), &tool).await;

    info!("Created tool {}", tool.slug);
    Ok((StatusCode::CREATED, Json(tool)))
}

pub async fn update_tool(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Json(draft): Json<ToolDraft>,
) -> Result<Json<Tool>, AppError> {
    draft.validate_update()?;

    let mut tool: Tool = state
        .store
        .get_doc(TOOLS, &slug)
        .await?
        .ok_or(AppError::NotFound)?;

    if draft.slug.is_some() {
        tool.slug = draft.base_slug()?;
    }
    draft.apply(&mut tool, Utc::now());

    save_doc(&state.store, TOOLS, None, &slug, &tool.slug, &tool).await?;

    if tool.slug != slug {
        rename_in_comparisons(&state, &slug, &tool.slug).await?;
        remove_document(state.search_client(), TOOL_INDEX, &slug).await;
    }
    index_tool(state.search_client(), &tool).await;

    Ok(Json(tool))
}

/// Keep comparisons pointing at a tool that changed slug.
async fn rename_in_comparisons(state: &AppState, from: &str, to: &str) -> Result<(), AppError> {
    let comparisons: Vec<Comparison> = state.store.all_docs(COMPARISONS).await?;

    for mut comparison in comparisons {
        if !comparison.tools.iter().any(|t| t == from) {
            continue;
        }

        for tool in comparison.tools.iter_mut().filter(|t| *t == from) {
            *tool = to.to_string();
        }
        state
            .store
            .put_doc(COMPARISONS, &comparison.slug, &comparison)
            .await?;
    }

    Ok(())
}

pub async fn delete_tool(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete(TOOLS, &slug).await? {
        return Err(AppError::NotFound);
    }

    remove_document(state.search_client(), TOOL_INDEX, &slug).await;

    info!("Deleted tool {slug}");
    Ok(StatusCode::NO_CONTENT)
}
