//! Backend of a content marketing site: blog/news, an AI tools directory, tool comparisons,
//! affiliate placements, ad network settings and a newsletter.
//!
//!
//!
//! # General Infrastructure
//! - Front end renders pages and calls this server for everything dynamic
//! - Redis holds every document, see [`database`]
//! - Meilisearch is optional, see [`search`]
//! - Admin routes sit behind one shared password, no user accounts
//!
//!
//!
//! # Listing Pages
//!
//! Every list endpoint returns one page of items plus a page window for navigation.
//! The window is computed here so every front end renders the same links.
//!
//! ```text
//! GET /api/posts?page=5     (10 pages total)
//! links: 1 … 4 [5] 6 … 10
//! ```
//!
//! Page 1 links to the bare path (`/blog`), later pages to `/blog?page=N`.
//!
//!
//!
//! # Visitor Counters
//! - Post views bump on every `GET /api/posts/{slug}`
//! - Placement clicks bump on every `GET /go/{slug}` before the redirect
//! - Both live in their own Redis hashes, documents are never rewritten for a visit
//!
//!
//!
//! # Setup
//!
//! Run against a throwaway in-memory store.
//! ```sh
//! REDIS_URL=memory:// ADMIN_PASSWORD=dev RUST_LOG=info cargo run -p server
//! ```
//!
//! Seed content.
//! ```sh
//! cargo run -p process -- seed.json --redis-url redis://localhost:6379
//! ```
//!
//! Create a post.
//! ```sh
//! curl -X POST localhost:1111/api/admin/posts \
//!   -H "Authorization: Bearer dev" -H "Content-Type: application/json" \
//!   -d '{"title": "Hello", "content": "# Hello", "published": true}'
//! ```
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{
        HeaderName, HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod database;
pub mod error;
pub mod markdown;
pub mod routes;
pub mod search;
pub mod state;
pub mod utils;

use config::Config;
use routes::{admin_routes, public_routes};
use state::AppState;
use utils::ADMIN_PASSWORD_HEADER;

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(public_routes())
        .nest("/api/admin", admin_routes(state.clone()))
        .layer(cors(&state.config))
        .with_state(state)
}

fn cors(config: &Config) -> CorsLayer {
    let origin = match config.cors_origin.as_deref().map(HeaderValue::from_str) {
        Some(Ok(origin)) => AllowOrigin::exact(origin),
        Some(Err(e)) => {
            warn!("Invalid CORS_ORIGIN, allowing any origin: {e}");
            AllowOrigin::any()
        }
        None => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static(ADMIN_PASSWORD_HEADER),
        ])
        .max_age(Duration::from_secs(60 * 60))
}

pub async fn start_server() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new().await?;

    info!("Starting server...");

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
