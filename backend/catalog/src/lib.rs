//! # Catalog
//!
//! Shared pieces of the site backend: document models, pagination and text helpers.
//! Used by the HTTP server and the seed importer alike.
//!
//! ## Collections
//! - posts: blog/news articles written in Markdown
//! - tools: the AI tools directory
//! - comparisons: side by side pages for two or more tools
//! - placements: affiliate links pinned to a spot on the site
//! - subscribers: newsletter signups
pub mod models;
pub mod pagination;
pub mod text;

pub use pagination::{PageItem, PageLink, Paginated, page_window};
pub use text::{TextStats, slugify};
