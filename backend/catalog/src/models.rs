//! # Documents
//!
//! Every document is stored as JSON keyed by its slug.
//!
//! ## Drafts
//! Admin writes arrive as drafts where every field is optional:
//! - create: required fields are checked by `validate_new`, the rest get defaults
//! - update: `apply` only overwrites fields that are present
//!
//! Slugs are never trusted raw, they always go through `slugify`.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::text::{excerpt, plain_text, reading_minutes, slugify};

pub const EXCERPT_CHARS: usize = 160;
pub const MAX_RATING: f32 = 5.0;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{0} produces an empty slug")]
    EmptySlug(&'static str),

    #[error("rating must be between 0 and {}", MAX_RATING)]
    Rating,

    #[error("a comparison needs at least two different tools")]
    TooFewTools,

    #[error("{0} must be an http(s) URL")]
    Url(&'static str),

    #[error("invalid email address")]
    Email,
}

fn required(value: &Option<String>, field: &'static str) -> Result<(), ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(ValidationError::Missing(field)),
    }
}

fn not_blank(value: &Option<String>, field: &'static str) -> Result<(), ValidationError> {
    match value {
        Some(v) if v.trim().is_empty() => Err(ValidationError::Missing(field)),
        _ => Ok(()),
    }
}

fn http_url(value: &Option<String>, field: &'static str) -> Result<(), ValidationError> {
    match value {
        Some(v) if !(v.starts_with("https://") || v.starts_with("http://")) => {
            Err(ValidationError::Url(field))
        }
        _ => Ok(()),
    }
}

/// Slug from an explicit value, falling back to `source`.
pub fn draft_slug(
    explicit: Option<&str>,
    source: &str,
    field: &'static str,
) -> Result<String, ValidationError> {
    let slug = slugify(explicit.unwrap_or(source));

    if slug.is_empty() {
        return Err(ValidationError::EmptySlug(field));
    }

    Ok(slug)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub views: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Post without its body, used by list views.
#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub category: String,
    pub tags: Vec<String>,
    pub author: String,
    pub cover_image: Option<String>,
    pub published: bool,
    pub featured: bool,
    pub views: u64,
    pub reading_minutes: usize,
    pub created_at: DateTime<Utc>,
}

impl From<Post> for PostSummary {
    fn from(post: Post) -> Self {
        Self {
            reading_minutes: reading_minutes(&post.content),
            slug: post.slug,
            title: post.title,
            excerpt: post.excerpt,
            category: post.category,
            tags: post.tags,
            author: post.author,
            cover_image: post.cover_image,
            published: post.published,
            featured: post.featured,
            views: post.views,
            created_at: post.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostDraft {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub author: Option<String>,
    pub cover_image: Option<String>,
    pub published: Option<bool>,
    pub featured: Option<bool>,
}

impl PostDraft {
    pub fn validate_new(&self) -> Result<(), ValidationError> {
        required(&self.title, "title")?;
        required(&self.content, "content")?;
        http_url(&self.cover_image, "cover_image")
    }

    pub fn validate_update(&self) -> Result<(), ValidationError> {
        not_blank(&self.title, "title")?;
        not_blank(&self.content, "content")?;
        http_url(&self.cover_image, "cover_image")
    }

    /// Slug this draft asks for on create.
    pub fn base_slug(&self) -> Result<String, ValidationError> {
        draft_slug(
            self.slug.as_deref(),
            self.title.as_deref().unwrap_or_default(),
            "title",
        )
    }

    pub fn into_post(self, slug: String, now: DateTime<Utc>) -> Post {
        let content = self.content.unwrap_or_default();
        let excerpt = self
            .excerpt
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| excerpt(&content, EXCERPT_CHARS));

        Post {
            slug,
            title: self.title.unwrap_or_default().trim().to_string(),
            excerpt,
            content,
            category: self.category.map(|c| slugify(&c)).unwrap_or_default(),
            tags: self.tags.map(normalize_tags).unwrap_or_default(),
            author: self.author.unwrap_or_default(),
            cover_image: self.cover_image,
            published: self.published.unwrap_or(false),
            featured: self.featured.unwrap_or(false),
            views: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the fields present in the draft. Slug renames are handled by the caller.
    pub fn apply(self, post: &mut Post, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            post.title = title.trim().to_string();
        }
        if let Some(content) = self.content {
            post.content = content;
            if self.excerpt.is_none() {
                post.excerpt = excerpt(&post.content, EXCERPT_CHARS);
            }
        }
        if let Some(excerpt) = self.excerpt {
            post.excerpt = excerpt;
        }
        if let Some(category) = self.category {
            post.category = slugify(&category);
        }
        if let Some(tags) = self.tags {
            post.tags = normalize_tags(tags);
        }
        if let Some(author) = self.author {
            post.author = author;
        }
        if self.cover_image.is_some() {
            post.cover_image = self.cover_image;
        }
        if let Some(published) = self.published {
            post.published = published;
        }
        if let Some(featured) = self.featured {
            post.featured = featured;
        }
        post.updated_at = now;
    }
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags.iter().map(|t| slugify(t)) {
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pricing {
    #[default]
    Free,
    Freemium,
    Paid,
    Enterprise,
}

impl Pricing {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "free" => Some(Self::Free),
            "freemium" => Some(Self::Freemium),
            "paid" => Some(Self::Paid),
            "enterprise" => Some(Self::Enterprise),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub pricing: Pricing,
    pub website: String,
    #[serde(default)]
    pub affiliate_url: Option<String>,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tool {
    /// Link visitors are sent to, preferring the affiliate URL.
    pub fn outbound_url(&self) -> &str {
        self.affiliate_url.as_deref().unwrap_or(&self.website)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolDraft {
    pub slug: Option<String>,
    pub name: Option<String>,
    pub tagline: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub pricing: Option<Pricing>,
    pub website: Option<String>,
    pub affiliate_url: Option<String>,
    pub rating: Option<f32>,
    pub features: Option<Vec<String>>,
    pub featured: Option<bool>,
}

impl ToolDraft {
    fn validate_common(&self) -> Result<(), ValidationError> {
        not_blank(&self.name, "name")?;
        http_url(&self.website, "website")?;
        http_url(&self.affiliate_url, "affiliate_url")?;

        match self.rating {
            Some(r) if !(0.0..=MAX_RATING).contains(&r) => Err(ValidationError::Rating),
            _ => Ok(()),
        }
    }

    pub fn validate_new(&self) -> Result<(), ValidationError> {
        required(&self.name, "name")?;
        required(&self.website, "website")?;
        self.validate_common()
    }

    pub fn validate_update(&self) -> Result<(), ValidationError> {
        not_blank(&self.website, "website")?;
        self.validate_common()
    }

    pub fn base_slug(&self) -> Result<String, ValidationError> {
        draft_slug(
            self.slug.as_deref(),
            self.name.as_deref().unwrap_or_default(),
            "name",
        )
    }

    pub fn into_tool(self, slug: String, now: DateTime<Utc>) -> Tool {
        Tool {
            slug,
            name: self.name.unwrap_or_default().trim().to_string(),
            tagline: self.tagline.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            category: self.category.map(|c| slugify(&c)).unwrap_or_default(),
            pricing: self.pricing.unwrap_or_default(),
            website: self.website.unwrap_or_default(),
            affiliate_url: self.affiliate_url,
            rating: self.rating.unwrap_or(0.0),
            features: self.features.unwrap_or_default(),
            featured: self.featured.unwrap_or(false),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(self, tool: &mut Tool, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            tool.name = name.trim().to_string();
        }
        if let Some(tagline) = self.tagline {
            tool.tagline = tagline;
        }
        if let Some(description) = self.description {
            tool.description = description;
        }
        if let Some(category) = self.category {
            tool.category = slugify(&category);
        }
        if let Some(pricing) = self.pricing {
            tool.pricing = pricing;
        }
        if let Some(website) = self.website {
            tool.website = website;
        }
        if self.affiliate_url.is_some() {
            tool.affiliate_url = self.affiliate_url;
        }
        if let Some(rating) = self.rating {
            tool.rating = rating;
        }
        if let Some(features) = self.features {
            tool.features = features;
        }
        if let Some(featured) = self.featured {
            tool.featured = featured;
        }
        tool.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub slug: String,
    pub title: String,
    pub tools: Vec<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub verdict: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComparisonDraft {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub tools: Option<Vec<String>>,
    pub summary: Option<String>,
    pub verdict: Option<String>,
}

impl ComparisonDraft {
    /// Tool slugs in order, normalized and without repeats.
    pub fn tool_slugs(&self) -> Vec<String> {
        let mut slugs: Vec<String> = Vec::new();
        for slug in self.tools.iter().flatten().map(|t| slugify(t)) {
            if !slug.is_empty() && !slugs.contains(&slug) {
                slugs.push(slug);
            }
        }
        slugs
    }

    pub fn validate_new(&self) -> Result<(), ValidationError> {
        if self.tool_slugs().len() < 2 {
            return Err(ValidationError::TooFewTools);
        }
        not_blank(&self.title, "title")
    }

    pub fn validate_update(&self) -> Result<(), ValidationError> {
        if self.tools.is_some() && self.tool_slugs().len() < 2 {
            return Err(ValidationError::TooFewTools);
        }
        not_blank(&self.title, "title")
    }

    /// `chatgpt-vs-claude` style slug unless one was given.
    pub fn base_slug(&self, tool_names: &[String]) -> Result<String, ValidationError> {
        draft_slug(self.slug.as_deref(), &tool_names.join(" vs "), "tools")
    }

    pub fn into_comparison(
        self,
        slug: String,
        tool_names: &[String],
        now: DateTime<Utc>,
    ) -> Comparison {
        let tools = self.tool_slugs();

        Comparison {
            slug,
            title: self
                .title
                .map(|t| t.trim().to_string())
                .unwrap_or_else(|| tool_names.join(" vs ")),
            tools,
            summary: self.summary.unwrap_or_default(),
            verdict: self.verdict.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(self, comparison: &mut Comparison, now: DateTime<Utc>) {
        if self.tools.is_some() {
            comparison.tools = self.tool_slugs();
        }
        if let Some(title) = self.title {
            comparison.title = title.trim().to_string();
        }
        if let Some(summary) = self.summary {
            comparison.summary = summary;
        }
        if let Some(verdict) = self.verdict {
            comparison.verdict = verdict;
        }
        comparison.updated_at = now;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Header,
    Sidebar,
    InContent,
    Footer,
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::Header,
        Position::Sidebar,
        Position::InContent,
        Position::Footer,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().replace('-', "_").as_str() {
            "header" => Some(Self::Header),
            "sidebar" => Some(Self::Sidebar),
            "in_content" => Some(Self::InContent),
            "footer" => Some(Self::Footer),
            _ => None,
        }
    }
}

/// Affiliate link shown at a fixed spot on the site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub slug: String,
    pub label: String,
    #[serde(default)]
    pub tool: Option<String>,
    pub target_url: String,
    pub position: Position,
    #[serde(default = "active_default")]
    pub active: bool,
    #[serde(default)]
    pub clicks: u64,
    pub created_at: DateTime<Utc>,
}

fn active_default() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlacementDraft {
    pub slug: Option<String>,
    pub label: Option<String>,
    pub tool: Option<String>,
    pub target_url: Option<String>,
    pub position: Option<Position>,
    pub active: Option<bool>,
}

impl PlacementDraft {
    pub fn validate_new(&self) -> Result<(), ValidationError> {
        required(&self.label, "label")?;
        required(&self.target_url, "target_url")?;
        if self.position.is_none() {
            return Err(ValidationError::Missing("position"));
        }
        http_url(&self.target_url, "target_url")
    }

    pub fn validate_update(&self) -> Result<(), ValidationError> {
        not_blank(&self.label, "label")?;
        http_url(&self.target_url, "target_url")
    }

    pub fn base_slug(&self) -> Result<String, ValidationError> {
        draft_slug(
            self.slug.as_deref(),
            self.label.as_deref().unwrap_or_default(),
            "label",
        )
    }

    pub fn into_placement(self, slug: String, now: DateTime<Utc>) -> Placement {
        Placement {
            slug,
            label: self.label.unwrap_or_default().trim().to_string(),
            tool: self.tool.map(|t| slugify(&t)),
            target_url: self.target_url.unwrap_or_default(),
            position: self.position.unwrap_or(Position::Sidebar),
            active: self.active.unwrap_or(true),
            clicks: 0,
            created_at: now,
        }
    }

    pub fn apply(self, placement: &mut Placement) {
        if let Some(label) = self.label {
            placement.label = label.trim().to_string();
        }
        if self.tool.is_some() {
            placement.tool = self.tool.map(|t| slugify(&t));
        }
        if let Some(target_url) = self.target_url {
            placement.target_url = target_url;
        }
        if let Some(position) = self.position {
            placement.position = position;
        }
        if let Some(active) = self.active {
            placement.active = active;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscriber {
    pub email: String,
    pub token: String,
    pub subscribed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub unsubscribed_at: Option<DateTime<Utc>>,
}

/// Lowercased address, or an error when it does not look like one.
pub fn normalize_email(raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim().to_lowercase();

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::Email);
    };

    let valid = !local.is_empty()
        && email.len() <= 254
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
        && !domain.contains('@');

    if valid { Ok(email) } else { Err(ValidationError::Email) }
}

/// Text searched by the store fallback when no search engine is configured.
pub fn searchable_text(parts: &[&str]) -> String {
    plain_text(&parts.join(" ")).to_lowercase()
}
