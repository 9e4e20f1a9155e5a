//! # Newsletter
//!
//! ## Flow
//! - Subscribe with an email, stored lowercased so case variants collapse
//! - Each subscriber gets a random unsubscribe token at signup, kept for life
//! - Unsubscribe links carry only the token, never the address
//! - Subscribing again after leaving re-activates the same record
//!
//! Sending the emails themselves is left to whatever mailer reads the subscriber list.
use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use catalog::{
    Paginated,
    models::{Subscriber, normalize_email},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    database::{NEWSLETTER_TOKENS, SUBSCRIBERS},
    error::AppError,
    state::AppState,
    utils::{ListQuery, Status},
};

pub const SUBSCRIBERS_PER_PAGE: usize = 50;

#[derive(Deserialize)]
pub struct SubscribeRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct UnsubscribeQuery {
    pub token: String,
}

#[derive(Serialize)]
pub struct SubscriberList {
    pub active: usize,
    #[serde(flatten)]
    pub page: Paginated<Subscriber>,
}

pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubscribeRequest>,
) -> Result<(StatusCode, Json<Status>), AppError> {
    let email = normalize_email(&request.email)?;

    if let Some(mut existing) = state
        .store
        .get_doc::<Subscriber>(SUBSCRIBERS, &email)
        .await?
    {
        if existing.subscribed {
            return Ok((
                StatusCode::OK,
                Json(Status {
                    status: "already_subscribed",
                }),
            ));
        }

        existing.subscribed = true;
        existing.unsubscribed_at = None;
        state.store.put_doc(SUBSCRIBERS, &email, &existing).await?;

        info!("Subscriber re-activated");
        return Ok((StatusCode::OK, Json(Status { status: "subscribed" })));
    }

    let subscriber = Subscriber {
        email: email.clone(),
        token: Uuid::new_v4().simple().to_string(),
        subscribed: true,
        created_at: Utc::now(),
        unsubscribed_at: None,
    };

    if !state
        .store
        .put_new_doc(SUBSCRIBERS, &email, &subscriber)
        .await?
    {
        // Lost a race with an identical signup.
        return Ok((
            StatusCode::OK,
            Json(Status {
                status: "already_subscribed",
            }),
        ));
    }
    state
        .store
        .put(NEWSLETTER_TOKENS, &subscriber.token, &email)
        .await?;

    info!("New newsletter subscriber");
    Ok((StatusCode::CREATED, Json(Status { status: "subscribed" })))
}

pub async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UnsubscribeQuery>,
) -> Result<Json<Status>, AppError> {
    let email = state
        .store
        .get(NEWSLETTER_TOKENS, query.token.trim())
        .await?
        .ok_or(AppError::NotFound)?;

    let mut subscriber: Subscriber = state
        .store
        .get_doc(SUBSCRIBERS, &email)
        .await?
        .ok_or(AppError::NotFound)?;

    if subscriber.subscribed {
        subscriber.subscribed = false;
        subscriber.unsubscribed_at = Some(Utc::now());
        state.store.put_doc(SUBSCRIBERS, &email, &subscriber).await?;

        info!("Subscriber left");
    }

    Ok(Json(Status {
        status: "unsubscribed",
    }))
}

pub async fn list_subscribers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<SubscriberList>, AppError> {
    let page = query.page()?;

    let mut subscribers: Vec<Subscriber> = state.store.all_docs(SUBSCRIBERS).await?;
    subscribers.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let active = subscribers.iter().filter(|s| s.subscribed).count();

    Ok(Json(SubscriberList {
        active,
        page: Paginated::new(
            subscribers,
            page,
            SUBSCRIBERS_PER_PAGE,
            "/admin/subscribers",
        ),
    }))
}
