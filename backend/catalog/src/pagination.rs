//! # Pagination
//!
//! Pure page math shared by every list endpoint.
//!
//! ## Page Window
//!
//! List views never render every page link. Instead they render a bounded window:
//! - 0 or 1 pages: nothing at all
//! - up to 7 pages: every page
//! - otherwise: first page, neighbours of the current page, last page, with an
//!   ellipsis standing in for each skipped run
//!
//! ```text
//! total = 10, current = 1   ->  1 2 … 10
//! total = 10, current = 5   ->  1 … 4 5 6 … 10
//! total = 10, current = 10  ->  1 … 9 10
//! ```
//!
//! The current page is taken as is. Out of range values still produce a well formed
//! window, clamping is the handler's job when it picks which slice to return.
use serde::Serialize;

/// Largest page count rendered without ellipses.
pub const FULL_WINDOW: usize = 7;

/// One entry of a page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "page", rename_all = "lowercase")]
pub enum PageItem {
    Page(usize),
    Ellipsis,
}

/// A window entry ready for the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PageLink {
    Page {
        page: usize,
        href: String,
        current: bool,
    },
    Ellipsis,
}

/// Compute the bounded set of page entries shown around `current_page`.
pub fn page_window(current_page: usize, total_pages: usize) -> Vec<PageItem> {
    if total_pages <= 1 {
        return vec![];
    }

    if total_pages <= FULL_WINDOW {
        return (1..=total_pages).map(PageItem::Page).collect();
    }

    let mut items = vec![PageItem::Page(1)];

    if current_page > 3 {
        items.push(PageItem::Ellipsis);
    }

    let start = current_page.saturating_sub(1).max(2);
    let end = current_page.saturating_add(1).min(total_pages - 1);
    items.extend((start..=end).map(PageItem::Page));

    if current_page < total_pages - 2 {
        items.push(PageItem::Ellipsis);
    }

    items.push(PageItem::Page(total_pages));
    items
}

/// Compute the number of pages for a list.
pub fn total_pages(item_count: usize, per_page: usize) -> usize {
    item_count.div_ceil(per_page.max(1))
}

/// Clamp a requested page into a valid range.
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Return start/end indices for one page of `total_items`.
pub fn page_bounds(total_items: usize, per_page: usize, page: usize) -> (usize, usize) {
    let per_page = per_page.max(1);
    let start = page.saturating_sub(1).saturating_mul(per_page);
    let end = start.saturating_add(per_page).min(total_items);
    (start.min(total_items), end)
}

/// Parse a one-based `page` query value.
///
/// Missing means the first page. Zero or garbage is `None`.
pub fn parse_page(raw: Option<&str>) -> Option<usize> {
    match raw {
        Some(value) => value.trim().parse::<usize>().ok().filter(|page| *page >= 1),
        None => Some(1),
    }
}

/// Link for `page` under `base_path`. Page 1 is the bare path.
pub fn page_href(base_path: &str, page: usize) -> String {
    if page <= 1 {
        return base_path.to_string();
    }

    let separator = if base_path.contains('?') { '&' } else { '?' };
    format!("{base_path}{separator}page={page}")
}

/// Map a page window to links, highlighting the entry equal to `current_page`.
pub fn page_links(current_page: usize, total_pages: usize, base_path: &str) -> Vec<PageLink> {
    page_window(current_page, total_pages)
        .into_iter()
        .map(|item| match item {
            PageItem::Page(page) => PageLink::Page {
                page,
                href: page_href(base_path, page),
                current: page == current_page,
            },
            PageItem::Ellipsis => PageLink::Ellipsis,
        })
        .collect()
}

/// One page of a list plus everything needed to render its navigation.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub links: Vec<PageLink>,
}

impl<T> Paginated<T> {
    /// Slice an already ordered result set down to `page`.
    pub fn new(mut all: Vec<T>, page: usize, per_page: usize, base_path: &str) -> Self {
        let per_page = per_page.max(1);
        let total_items = all.len();
        let total = total_pages(total_items, per_page);
        let page = clamp_page(page, total);

        let (start, end) = page_bounds(total_items, per_page, page);
        let items: Vec<T> = all.drain(start..end).collect();

        Self {
            items,
            page,
            per_page,
            total_items,
            total_pages: total,
            links: page_links(page, total, base_path),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
            links: self.links,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PageItem::{Ellipsis, Page};

    fn pages(numbers: &[usize]) -> Vec<PageItem> {
        numbers.iter().copied().map(Page).collect()
    }

    #[test]
    fn test_no_window_for_single_page() {
        assert!(page_window(1, 0).is_empty());
        assert!(page_window(1, 1).is_empty());
    }

    #[test]
    fn test_short_lists_show_every_page() {
        assert_eq!(page_window(1, 5), pages(&[1, 2, 3, 4, 5]));
        assert_eq!(page_window(4, 7), pages(&[1, 2, 3, 4, 5, 6, 7]));
        assert_eq!(page_window(1, 2), pages(&[1, 2]));
    }

    #[test]
    fn test_first_page_of_ten() {
        assert_eq!(page_window(1, 10), vec![Page(1), Page(2), Ellipsis, Page(10)]);
    }

    #[test]
    fn test_last_page_of_ten() {
        assert_eq!(page_window(10, 10), vec![Page(1), Ellipsis, Page(9), Page(10)]);
    }

    #[test]
    fn test_middle_page_of_ten() {
        assert_eq!(
            page_window(5, 10),
            vec![Page(1), Ellipsis, Page(4), Page(5), Page(6), Ellipsis, Page(10)]
        );
    }

    #[test]
    fn test_edges_of_leading_ellipsis() {
        assert_eq!(
            page_window(3, 10),
            vec![Page(1), Page(2), Page(3), Page(4), Ellipsis, Page(10)]
        );
        assert_eq!(
            page_window(4, 10),
            vec![Page(1), Ellipsis, Page(3), Page(4), Page(5), Ellipsis, Page(10)]
        );
    }

    #[test]
    fn test_edges_of_trailing_ellipsis() {
        assert_eq!(
            page_window(8, 10),
            vec![Page(1), Ellipsis, Page(7), Page(8), Page(9), Page(10)]
        );
        assert_eq!(
            page_window(7, 10),
            vec![Page(1), Ellipsis, Page(6), Page(7), Page(8), Ellipsis, Page(10)]
        );
    }

    #[test]
    fn test_out_of_range_current_page_passes_through() {
        assert_eq!(page_window(25, 10), vec![Page(1), Ellipsis, Page(10)]);
        assert_eq!(page_window(0, 10), vec![Page(1), Ellipsis, Page(10)]);
    }

    #[test]
    fn test_window_invariants_hold_everywhere() {
        for total in 0..40 {
            for current in 0..=total + 3 {
                let window = page_window(current, total);

                if total <= 1 {
                    assert!(window.is_empty());
                    continue;
                }

                assert_eq!(window.first(), Some(&Page(1)), "{current}/{total}");
                assert_eq!(window.last(), Some(&Page(total)), "{current}/{total}");

                for pair in window.windows(2) {
                    assert!(
                        !(pair[0] == Ellipsis && pair[1] == Ellipsis),
                        "adjacent ellipses at {current}/{total}"
                    );
                    if let (Page(a), Page(b)) = (pair[0], pair[1]) {
                        assert!(a < b, "unordered pages at {current}/{total}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(total_pages(0, 9), 0);
        assert_eq!(total_pages(9, 9), 1);
        assert_eq!(total_pages(10, 9), 2);
        assert_eq!(total_pages(5, 0), 5);
    }

    #[test]
    fn test_clamp_page() {
        assert_eq!(clamp_page(0, 4), 1);
        assert_eq!(clamp_page(9, 4), 4);
        assert_eq!(clamp_page(3, 0), 1);
    }

    #[test]
    fn test_page_bounds() {
        assert_eq!(page_bounds(25, 10, 1), (0, 10));
        assert_eq!(page_bounds(25, 10, 3), (20, 25));
        assert_eq!(page_bounds(25, 10, 9), (25, 25));
    }

    #[test]
    fn test_parse_page() {
        assert_eq!(parse_page(None), Some(1));
        assert_eq!(parse_page(Some("4")), Some(4));
        assert_eq!(parse_page(Some("0")), None);
        assert_eq!(parse_page(Some("two")), None);
    }

    #[test]
    fn test_page_href() {
        assert_eq!(page_href("/blog", 1), "/blog");
        assert_eq!(page_href("/blog", 3), "/blog?page=3");
        assert_eq!(page_href("/tools?pricing=free", 2), "/tools?pricing=free&page=2");
    }

    #[test]
    fn test_page_links_mark_current() {
        let links = page_links(2, 3, "/blog");
        assert_eq!(
            links,
            vec![
                PageLink::Page {
                    page: 1,
                    href: "/blog".to_string(),
                    current: false
                },
                PageLink::Page {
                    page: 2,
                    href: "/blog?page=2".to_string(),
                    current: true
                },
                PageLink::Page {
                    page: 3,
                    href: "/blog?page=3".to_string(),
                    current: false
                },
            ]
        );
    }

    #[test]
    fn test_paginated_slices_and_clamps() {
        let all: Vec<u32> = (1..=23).collect();
        let page = Paginated::new(all, 7, 10, "/blog");

        assert_eq!(page.page, 3);
        assert_eq!(page.items, vec![21, 22, 23]);
        assert_eq!(page.total_items, 23);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.links.len(), 3);
    }

    #[test]
    fn test_paginated_empty() {
        let page = Paginated::<u32>::new(vec![], 1, 10, "/blog");
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 0);
        assert!(page.links.is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(page_window(5, 10)).unwrap();
        assert_eq!(json[0], serde_json::json!({"kind": "page", "page": 1}));
        assert_eq!(json[1], serde_json::json!({"kind": "ellipsis"}));
    }
}
