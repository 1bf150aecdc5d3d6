//! HTTP client for the Meta Graph API (Instagram Graph + Marketing API).
//!
//! The client is stateless with respect to tenants: every fetch takes the
//! already-resolved access token. Cloning a [`MetaClient`] shares both the
//! connection pool and the [`RateLimiter`], so one instance serves every
//! concurrent tenant job.

mod ads;
mod instagram;

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::MetaError;
use crate::pagination::{Page, Paginated};
use crate::rate_limit::RateLimiter;

pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com/v21.0";

pub(super) const DEFAULT_MAX_PAGES: usize = 50;
pub(super) const DEFAULT_PAGE_SIZE: u32 = 50;

#[derive(Clone)]
pub struct MetaClient {
    pub(super) client: Client,
    pub(super) base_url: Url,
    pub(super) limiter: RateLimiter,
    pub(super) timeout: Duration,
    pub(super) max_pages: usize,
    pub(super) page_size: u32,
}

impl MetaClient {
    /// Creates a client pointed at the production Graph API.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, limiter: RateLimiter) -> Result<Self, MetaError> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout_secs, limiter)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// `timeout_secs` bounds each individual call, measured from the moment
    /// the limiter admits it.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`MetaError::InvalidBaseUrl`] if `base_url` does not
    /// parse.
    pub fn with_base_url(
        base_url: &str,
        timeout_secs: u64,
        limiter: RateLimiter,
    ) -> Result<Self, MetaError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent("nestsync/0.1 (social-sync)")
            .build()?;

        // A trailing slash makes `Url::join` append to the version segment
        // instead of replacing it.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base = Url::parse(&normalised).map_err(|e| MetaError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url: base,
            limiter,
            timeout: Duration::from_secs(timeout_secs),
            max_pages: DEFAULT_MAX_PAGES,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Caps how many pages a list fetch follows. Zero is raised to one.
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Sets the `limit` sent on list fetches.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    #[must_use]
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    #[must_use]
    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Builds `{base}/{path}?access_token=...&{params}`.
    pub(super) fn build_url(
        &self,
        path: &str,
        token: &str,
        params: &[(&str, &str)],
    ) -> Result<Url, MetaError> {
        let mut url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| MetaError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: format!("cannot join path \"{path}\": {e}"),
            })?;

        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("access_token", token);
        }

        Ok(url)
    }

    /// Issues one GET through the shared limiter and decodes a 2xx body.
    ///
    /// The per-call timeout covers sending the request and reading the body.
    pub(super) async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, MetaError> {
        let endpoint = endpoint_label(url);
        let timeout = self.timeout;

        let outcome = self
            .limiter
            .execute(|| {
                tokio::time::timeout(timeout, async {
                    let response = self.client.get(url).send().await?;
                    let status = response.status();
                    let body = response.text().await?;
                    Ok::<(StatusCode, String), reqwest::Error>((status, body))
                })
            })
            .await;

        let (status, body) = outcome.map_err(|_| MetaError::Timeout {
            endpoint: endpoint.clone(),
            timeout_secs: timeout.as_secs(),
        })??;

        if !status.is_success() {
            return Err(MetaError::Upstream {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str::<T>(&body).map_err(|e| MetaError::Deserialize {
            context: endpoint,
            source: e,
        })
    }

    /// Walks `paging.next` from `first` until the last page or the page cap.
    ///
    /// Any page error aborts the walk and discards what was collected. The
    /// cap is not an error: the result is flagged `truncated` and a warning
    /// is logged.
    pub(super) async fn get_paginated<T: DeserializeOwned>(
        &self,
        first: Url,
    ) -> Result<Paginated<T>, MetaError> {
        let endpoint = endpoint_label(first.as_str());
        let mut url = String::from(first);
        let mut items = Vec::new();
        let mut pages_fetched = 0usize;

        loop {
            let page: Page<T> = self.get_json(&url).await?;
            pages_fetched += 1;
            let next = page.next_page_url().map(str::to_owned);
            items.extend(page.data);

            let Some(next) = next else {
                return Ok(Paginated {
                    items,
                    pages_fetched,
                    truncated: false,
                });
            };

            if pages_fetched >= self.max_pages {
                tracing::warn!(
                    endpoint = %endpoint,
                    max_pages = self.max_pages,
                    items = items.len(),
                    "page cap reached; continuing with partial list"
                );
                return Ok(Paginated {
                    items,
                    pages_fetched,
                    truncated: true,
                });
            }

            url = next;
        }
    }
}

impl std::fmt::Debug for MetaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetaClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("max_pages", &self.max_pages)
            .field("page_size", &self.page_size)
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}

/// Path of a request URL, used in errors and logs so tokens never leak.
pub(super) fn endpoint_label(url: &str) -> String {
    Url::parse(url).map_or_else(|_| "<invalid url>".to_owned(), |u| u.path().to_owned())
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
