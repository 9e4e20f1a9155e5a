//! # Seed Import
//!
//! Loads a JSON seed of tools, posts, comparisons and placements into the store the server reads.
//!
//! ## Order
//! 1. Tools first, comparisons look up tool names for their default title and slug
//! 2. Posts
//! 3. Comparisons, skipped when any tool they name is missing
//! 4. Placements
//!
//! ## Slugs
//! - Each draft claims its explicit slug, otherwise one derived from its title or name
//! - Seeds never get `-2` style suffixes, so running the same seed twice is a no-op
//! - An existing slug is skipped unless `--replace` is passed, then the document is overwritten
//!
//! ## Notes
//! - Counters (views, clicks) are left alone, replacing a document keeps its history
//! - Meilisearch is not touched here, the server resyncs every index on boot
use std::fs;

use anyhow::Context;
use catalog::models::{Comparison, Tool};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use server::database::{COMPARISONS, PLACEMENTS, POSTS, Store, TOOLS, init_store};

pub mod models;

pub use models::{Report, Seed};

pub async fn load_seed(source: &str) -> anyhow::Result<Seed> {
    let raw = if source.starts_with("http://") || source.starts_with("https://") {
        reqwest::get(source)
            .await?
            .error_for_status()?
            .text()
            .await?
    } else {
        fs::read_to_string(source).with_context(|| format!("Failed to read {source}"))?
    };

    serde_json::from_str(&raw).with_context(|| format!("Malformed seed in {source}"))
}

pub async fn import(seed: Seed, redis_url: &str, replace: bool) -> anyhow::Result<()> {
    let store = init_store(redis_url).await?;

    println!("Loaded Tools: {}", seed.tools.len());
    println!("Loaded Posts: {}", seed.posts.len());
    println!("Loaded Comparisons: {}", seed.comparisons.len());
    println!("Loaded Placements: {}\n", seed.placements.len());

    let pb = ProgressBar::new(seed.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )?
        .progress_chars("=> "),
    );

    let report = import_into(&store, seed, replace, &pb).await?;
    pb.finish_with_message("done");

    println!("\nCreated: {}", report.created);
    println!("Replaced: {}", report.replaced);
    println!("Skipped: {}", report.skipped);
    println!("Invalid: {}", report.invalid);
    println!("\nSearch indexes resync on the next server start.");

    Ok(())
}

/// Write every valid draft in `seed` to `store`.
pub async fn import_into(
    store: &Store,
    seed: Seed,
    replace: bool,
    pb: &ProgressBar,
) -> anyhow::Result<Report> {
    let mut report = Report::default();
    let now = Utc::now();

    for draft in seed.tools {
        pb.inc(1);
        let slug = match draft.validate_new().and_then(|_| draft.base_slug()) {
            Ok(slug) => slug,
            Err(e) => {
                pb.println(format!("Invalid tool: {e}"));
                report.invalid += 1;
                continue;
            }
        };
        pb.set_message(format!("tool {slug}"));

        let tool = draft.into_tool(slug, now);
        write(store, TOOLS, &tool.slug, &tool, replace, &mut report).await?;
    }

    for draft in seed.posts {
        pb.inc(1);
        let slug = match draft.validate_new().and_then(|_| draft.base_slug()) {
            Ok(slug) => slug,
            Err(e) => {
                pb.println(format!("Invalid post: {e}"));
                report.invalid += 1;
                continue;
            }
        };
        pb.set_message(format!("post {slug}"));

        let post = draft.into_post(slug, now);
        write(store, POSTS, &post.slug, &post, replace, &mut report).await?;
    }

    for draft in seed.comparisons {
        pb.inc(1);
        if let Err(e) = draft.validate_new() {
            pb.println(format!("Invalid comparison: {e}"));
            report.invalid += 1;
            continue;
        }

        let Some(tool_names) = tool_names(store, &draft.tool_slugs()).await? else {
            pb.println(format!(
                "Invalid comparison: unknown tool in {}",
                draft.tool_slugs().join(", ")
            ));
            report.invalid += 1;
            continue;
        };

        let slug = match draft.base_slug(&tool_names) {
            Ok(slug) => slug,
            Err(e) => {
                pb.println(format!("Invalid comparison: {e}"));
                report.invalid += 1;
                continue;
            }
        };
        pb.set_message(format!("comparison {slug}"));

        let comparison: Comparison = draft.into_comparison(slug, &tool_names, now);
        write(
            store,
            COMPARISONS,
            &comparison.slug,
            &comparison,
            replace,
            &mut report,
        )
        .await?;
    }

    for draft in seed.placements {
        pb.inc(1);
        let slug = match draft.validate_new().and_then(|_| draft.base_slug()) {
            Ok(slug) => slug,
            Err(e) => {
                pb.println(format!("Invalid placement: {e}"));
                report.invalid += 1;
                continue;
            }
        };
        pb.set_message(format!("placement {slug}"));

        let placement = draft.into_placement(slug, now);
        write(
            store,
            PLACEMENTS,
            &placement.slug,
            &placement,
            replace,
            &mut report,
        )
        .await?;
    }

    Ok(report)
}

/// Display names for `slugs`, `None` when any of them is not in the store.
async fn tool_names(store: &Store, slugs: &[String]) -> anyhow::Result<Option<Vec<String>>> {
    let mut names = Vec::with_capacity(slugs.len());

    for slug in slugs {
        match store.get_doc::<Tool>(TOOLS, slug).await? {
            Some(tool) => names.push(tool.name),
            None => return Ok(None),
        }
    }

    Ok(Some(names))
}

async fn write<T: Serialize>(
    store: &Store,
    collection: &str,
    slug: &str,
    doc: &T,
    replace: bool,
    report: &mut Report,
) -> anyhow::Result<()> {
    if store.put_new_doc(collection, slug, doc).await? {
        report.created += 1;
    } else if replace {
        store.put_doc(collection, slug, doc).await?;
        report.replaced += 1;
    } else {
        report.skipped += 1;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use catalog::models::{Placement, Post};
    use server::database::MEMORY_URL;

    use super::*;

    const SEED: &str = r##"{
        "tools": [
            {"name": "Claude", "website": "https://claude.ai", "rating": 4.8},
            {"name": "ChatGPT", "website": "https://chatgpt.com", "rating": 4.6},
            {"name": "No Website"}
        ],
        "posts": [
            {"title": "Hello World", "content": "# Hello\n\nFirst post.", "published": true}
        ],
        "comparisons": [
            {"tools": ["claude", "chatgpt"]},
            {"tools": ["claude", "missing-tool"]}
        ],
        "placements": [
            {"label": "Try Claude", "target_url": "https://claude.ai", "position": "sidebar"}
        ]
    }"##;

    async fn store() -> Store {
        init_store(MEMORY_URL).await.unwrap()
    }

    #[tokio::test]
    async fn test_import_counts() {
        let store = store().await;
        let seed: Seed = serde_json::from_str(SEED).unwrap();

        let report = import_into(&store, seed, false, &ProgressBar::hidden())
            .await
            .unwrap();

        assert_eq!(
            report,
            Report {
                created: 5,
                replaced: 0,
                skipped: 0,
                invalid: 2,
            }
        );

        let comparison: Comparison = store
            .get_doc(COMPARISONS, "claude-vs-chatgpt")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(comparison.title, "Claude vs ChatGPT");
        assert_eq!(comparison.tools, vec!["claude", "chatgpt"]);

        let post: Post = store.get_doc(POSTS, "hello-world").await.unwrap().unwrap();
        assert!(post.published);

        let placement: Placement = store
            .get_doc(PLACEMENTS, "try-claude")
            .await
            .unwrap()
            .unwrap();
        assert!(placement.active);
    }

    #[tokio::test]
    async fn test_second_run_skips_or_replaces() {
        let store = store().await;

        let seed: Seed = serde_json::from_str(SEED).unwrap();
        import_into(&store, seed, false, &ProgressBar::hidden())
            .await
            .unwrap();

        let seed: Seed = serde_json::from_str(SEED).unwrap();
        let report = import_into(&store, seed, false, &ProgressBar::hidden())
            .await
            .unwrap();
        assert_eq!(report.created, 0);
        assert_eq!(report.skipped, 5);

        let seed: Seed = serde_json::from_str(SEED).unwrap();
        let report = import_into(&store, seed, true, &ProgressBar::hidden())
            .await
            .unwrap();
        assert_eq!(report.replaced, 5);
        assert_eq!(store.fields(TOOLS).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_load_seed_from_file() {
        let path = std::env::temp_dir().join(format!("seed-{}.json", std::process::id()));
        fs::write(&path, SEED).unwrap();

        let seed = load_seed(path.to_str().unwrap()).await.unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(seed.tools.len(), 3);
        assert_eq!(seed.len(), 7);
    }

    #[tokio::test]
    async fn test_load_seed_missing_file() {
        assert!(load_seed("/nonexistent/seed.json").await.is_err());
    }
}
