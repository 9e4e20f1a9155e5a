use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

pub mod comparisons;
pub mod newsletter;
pub mod placements;
pub mod posts;
pub mod site;
pub mod tools;

use crate::{state::AppState, utils::require_admin};

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(site::health))
        .route("/sitemap.xml", get(site::sitemap))
        .route("/go/{slug}", get(placements::follow_placement))
        .route("/api/posts", get(posts::list_posts))
        .route("/api/posts/featured", get(posts::featured_posts))
        .route("/api/posts/{slug}", get(posts::get_post))
        .route("/api/tools", get(tools::list_tools))
        .route("/api/tools/{slug}", get(tools::get_tool))
        .route("/api/compare", get(comparisons::list_comparisons))
        .route("/api/compare/{slug}", get(comparisons::get_comparison))
        .route("/api/placements", get(placements::list_placements))
        .route("/api/ads", get(site::ads))
        .route("/api/counter", post(site::counter))
        .route("/api/search", get(site::search_site))
        .route("/api/newsletter/subscribe", post(newsletter::subscribe))
        .route(
            "/api/newsletter/unsubscribe",
            get(newsletter::unsubscribe).post(newsletter::unsubscribe),
        )
}

pub fn admin_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/posts",
            get(posts::admin_list_posts).post(posts::create_post),
        )
        .route(
            "/posts/{slug}",
            get(posts::admin_get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/tools", post(tools::create_tool))
        .route(
            "/tools/{slug}",
            put(tools::update_tool).delete(tools::delete_tool),
        )
        .route("/comparisons", post(comparisons::create_comparison))
        .route(
            "/comparisons/{slug}",
            put(comparisons::update_comparison).delete(comparisons::delete_comparison),
        )
        .route(
            "/placements",
            get(placements::admin_list_placements).post(placements::create_placement),
        )
        .route(
            "/placements/{slug}",
            put(placements::update_placement).delete(placements::delete_placement),
        )
        .route("/subscribers", get(newsletter::list_subscribers))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}
