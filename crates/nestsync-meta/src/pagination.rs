//! Graph API list envelope and the result of following it.
//!
//! List endpoints answer with
//!
//! ```text
//! {"data": [...], "paging": {"cursors": {...}, "next": "https://graph.facebook.com/...&after=CURSOR"}}
//! ```
//!
//! `paging.next` is a complete URL that already carries every query
//! parameter (including the access token), so it is followed verbatim. It is
//! absent on the last page.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub next: Option<String>,
}

impl<T> Page<T> {
    /// URL of the following page, or `None` on the last page.
    #[must_use]
    pub fn next_page_url(&self) -> Option<&str> {
        self.paging
            .as_ref()
            .and_then(|p| p.next.as_deref())
            .filter(|next| !next.is_empty())
    }
}

/// Items collected across every followed page.
#[derive(Debug, Clone)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pages_fetched: usize,
    /// `true` when the page cap stopped the walk while upstream still
    /// advertised a next page.
    pub truncated: bool,
}
