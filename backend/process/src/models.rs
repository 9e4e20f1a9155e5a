use catalog::models::{ComparisonDraft, PlacementDraft, PostDraft, ToolDraft};
use serde::Deserialize;

/// Seed file layout. Every section is optional.
///
/// ```json
/// {
///     "tools": [{ "name": "Claude", "website": "https://claude.ai", "rating": 4.8 }],
///     "posts": [{ "title": "Hello", "content": "# Hello", "published": true }],
///     "comparisons": [{ "tools": ["claude", "chatgpt"] }],
///     "placements": [{ "label": "Try Claude", "target_url": "https://claude.ai", "position": "sidebar" }]
/// }
/// ```
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct Seed {
    pub tools: Vec<ToolDraft>,
    pub posts: Vec<PostDraft>,
    pub comparisons: Vec<ComparisonDraft>,
    pub placements: Vec<PlacementDraft>,
}

impl Seed {
    pub fn len(&self) -> usize {
        self.tools.len() + self.posts.len() + self.comparisons.len() + self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub created: usize,
    pub replaced: usize,
    pub skipped: usize,
    pub invalid: usize,
}

#[cfg(test)]
mod tests {
    use super::Seed;

    #[test]
    fn test_sections_are_optional() {
        let seed: Seed = serde_json::from_str(r#"{"tools": [{"name": "Claude"}]}"#).unwrap();
        assert_eq!(seed.len(), 1);
        assert!(seed.posts.is_empty());
    }

    #[test]
    fn test_empty_seed() {
        let seed: Seed = serde_json::from_str("{}").unwrap();
        assert!(seed.is_empty());
    }
}
