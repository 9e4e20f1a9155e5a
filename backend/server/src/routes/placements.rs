use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Redirect,
};
use catalog::models::{Placement, PlacementDraft, Position};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::{
    database::{PLACEMENT_CLICKS, PLACEMENTS},
    error::AppError,
    state::AppState,
    utils::{ListQuery, claim_slug, insert_doc, save_doc},
};

/// What the site renders for a placement. Visitors go through `/go/{slug}`.
#[derive(Serialize)]
pub struct PublicPlacement {
    pub slug: String,
    pub label: String,
    pub tool: Option<String>,
    pub position: Position,
    pub href: String,
}

impl From<Placement> for PublicPlacement {
    fn from(placement: Placement) -> Self {
        Self {
            href: format!("/go/{}", placement.slug),
            slug: placement.slug,
            label: placement.label,
            tool: placement.tool,
            position: placement.position,
        }
    }
}

async fn load_placements(state: &AppState) -> Result<Vec<Placement>, AppError> {
    let mut placements: Vec<Placement> = state.store.all_docs(PLACEMENTS).await?;
    let clicks = state.store.counters(PLACEMENT_CLICKS).await?;

    for placement in placements.iter_mut() {
        placement.clicks = clicks.get(&placement.slug).copied().unwrap_or(0);
    }

    placements.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(placements)
}

fn position_filter(query: &ListQuery) -> Result<Option<Position>, AppError> {
    query
        .position
        .as_deref()
        .map(|raw| Position::parse(raw).ok_or(AppError::InvalidQuery("position")))
        .transpose()
}

pub async fn list_placements(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<PublicPlacement>>, AppError> {
    let position = position_filter(&query)?;

    let placements = load_placements(&state)
        .await?
        .into_iter()
        .filter(|p| p.active && position.is_none_or(|position| p.position == position))
        .map(PublicPlacement::from)
        .collect();

    Ok(Json(placements))
}

/// Count the click and send the visitor on.
pub async fn follow_placement(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Redirect, AppError> {
    let placement: Placement = state
        .store
        .get_doc(PLACEMENTS, &slug)
        .await?
        .filter(|placement: &Placement| placement.active)
        .ok_or(AppError::NotFound)?;

    state.store.incr(PLACEMENT_CLICKS, &slug, 1).await?;

    Ok(Redirect::temporary(&placement.target_url))
}

pub async fn admin_list_placements(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Placement>>, AppError> {
    let position = position_filter(&query)?;

    let mut placements = load_placements(&state).await?;
    placements.retain(|p| position.is_none_or(|position| p.position == position));

    Ok(Json(placements))
}

pub async fn create_placement(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<PlacementDraft>,
) -> Result<(StatusCode, Json<Placement>), AppError> {
    draft.validate_new()?;

    let base = draft.base_slug()?;
    let slug = claim_slug(&state.store, PLACEMENTS, base, draft.slug.is_some()).await?;

    let placement = draft.into_placement(slug, Utc::now());
    insert_doc(&state.store, PLACEMENTS, &placement.slug, &placement).await?;

    info!("Created placement {}", placement.slug);
    Ok((StatusCode::CREATED, Json(placement)))
}

pub async fn update_placement(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Json(draft): Json<PlacementDraft>,
) -> Result<Json<Placement>, AppError> {
    draft.validate_update()?;

    let mut placement: Placement = state
        .store
        .get_doc(PLACEMENTS, &slug)
        .await?
        .ok_or(AppError::NotFound)?;

    if draft.slug.is_some() {
        placement.slug = draft.base_slug()?;
    }
    draft.apply(&mut placement);

    save_doc(
        &state.store,
        PLACEMENTS,
        Some(PLACEMENT_CLICKS),
        &slug,
        &placement.slug,
        &placement,
    )
    .await?;

    placement.clicks = state.store.counter(PLACEMENT_CLICKS, &placement.slug).await?;
    Ok(Json(placement))
}

pub async fn delete_placement(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete(PLACEMENTS, &slug).await? {
        return Err(AppError::NotFound);
    }

    state.store.delete(PLACEMENT_CLICKS, &slug).await?;

    info!("Deleted placement {slug}");
    Ok(StatusCode::NO_CONTENT)
}
