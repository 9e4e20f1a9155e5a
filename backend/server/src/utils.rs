use std::{collections::HashSet, sync::Arc};

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use catalog::{pagination::parse_page, text::unique_slug};
use serde::{Deserialize, Serialize};

use crate::{database::Store, error::AppError, state::AppState};

pub const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

/// Password supplied as `Authorization: Bearer ...` or `x-admin-password`.
pub fn supplied_password(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    bearer
        .or_else(|| {
            headers
                .get(ADMIN_PASSWORD_HEADER)
                .and_then(|value| value.to_str().ok())
        })
        .map(str::trim)
}

/// Shared password gate for everything under `/api/admin`.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let expected = state.config.admin_password.as_str();

    match supplied_password(request.headers()) {
        Some(password) if !expected.is_empty() && passwords_match(password, expected) => {
            Ok(next.run(request).await)
        }
        _ => Err(AppError::Unauthorized),
    }
}

/// Compare without stopping at the first differing byte.
fn passwords_match(supplied: &str, expected: &str) -> bool {
    supplied.len() == expected.len()
        && supplied
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}

#[derive(Deserialize, Default)]
pub struct ListQuery {
    pub page: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub pricing: Option<String>,
    pub position: Option<String>,
    pub q: Option<String>,
}

impl ListQuery {
    pub fn page(&self) -> Result<usize, AppError> {
        parse_page(self.page.as_deref()).ok_or(AppError::InvalidQuery("page"))
    }
}

#[derive(Serialize)]
pub struct Status {
    pub status: &'static str,
}

/// Pick the slug for a new document.
///
/// An explicit slug must be free. A derived one gets a numeric suffix until it is.
pub async fn claim_slug(
    store: &Store,
    collection: &str,
    base: String,
    explicit: bool,
) -> Result<String, AppError> {
    let taken: HashSet<String> = store.fields(collection).await?.into_iter().collect();

    if explicit {
        if taken.contains(&base) {
            return Err(AppError::Conflict(base));
        }
        return Ok(base);
    }

    Ok(unique_slug(&base, |candidate| taken.contains(candidate)))
}

/// Insert a document that must not exist yet.
pub async fn insert_doc<T: Serialize>(
    store: &Store,
    collection: &str,
    slug: &str,
    doc: &T,
) -> Result<(), AppError> {
    if !store.put_new_doc(collection, slug, doc).await? {
        return Err(AppError::Conflict(slug.to_string()));
    }

    Ok(())
}

/// Save an updated document, moving it (and its counter) when the slug changed.
pub async fn save_doc<T: Serialize>(
    store: &Store,
    collection: &str,
    counter: Option<&str>,
    old_slug: &str,
    new_slug: &str,
    doc: &T,
) -> Result<(), AppError> {
    if old_slug == new_slug {
        return store.put_doc(collection, new_slug, doc).await;
    }

    insert_doc(store, collection, new_slug, doc).await?;
    store.delete(collection, old_slug).await?;

    if let Some(counter) = counter {
        store.move_counter(counter, old_slug, new_slug).await?;
    }

    Ok(())
}

/// Escape text for XML element content.
pub fn xml_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());

    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_passwords_match() {
        assert!(passwords_match("correct horse", "correct horse"));
        assert!(!passwords_match("correct horsf", "correct horse"));
        assert!(!passwords_match("correct", "correct horse"));
        assert!(!passwords_match("", "x"));
    }

    #[test]
    fn test_supplied_password_sources() {
        let mut headers = HeaderMap::new();
        assert_eq!(supplied_password(&headers), None);

        headers.insert(ADMIN_PASSWORD_HEADER, HeaderValue::from_static("hunter2"));
        assert_eq!(supplied_password(&headers), Some("hunter2"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer s3cret"));
        assert_eq!(supplied_password(&headers), Some("s3cret"));
    }

    #[test]
    fn test_list_query_page() {
        let query = ListQuery {
            page: Some("0".into()),
            ..Default::default()
        };
        assert!(matches!(query.page(), Err(AppError::InvalidQuery("page"))));
        assert_eq!(ListQuery::default().page().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_claim_slug() {
        let store = Store::memory();
        store.put("posts", "hello", "{}").await.unwrap();

        let derived = claim_slug(&store, "posts", "hello".into(), false).await.unwrap();
        assert_eq!(derived, "hello-2");

        let explicit = claim_slug(&store, "posts", "hello".into(), true).await;
        assert!(matches!(explicit, Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml_escape("a&b<c>"), "a&amp;b&lt;c&gt;");
    }
}
