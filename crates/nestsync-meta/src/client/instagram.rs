//! Instagram Graph fetches: profile, media, carousel children, insights.

use crate::error::MetaError;
use crate::pagination::{Page, Paginated};
use crate::types::{GraphChild, GraphInsight, GraphMedia, GraphProfile, InsightsResponse};

use super::MetaClient;

const PROFILE_FIELDS: &str = "id,username,name,biography,website,profile_picture_url,\
followers_count,follows_count,media_count";

const MEDIA_FIELDS: &str = "id,caption,media_type,media_product_type,media_url,\
thumbnail_url,permalink,timestamp,like_count,comments_count";

const CHILD_FIELDS: &str = "id,media_type,media_url,thumbnail_url,timestamp";

/// Account metrics read as daily time series.
pub const ACCOUNT_INSIGHT_METRICS: &str = "reach,profile_views";

/// Demographic dimensions requested in one breakdown call.
pub const DEMOGRAPHIC_BREAKDOWNS: &str = "city,country,age,gender";

impl MetaClient {
    /// Fetches the business account's profile and counters.
    ///
    /// # Errors
    ///
    /// - [`MetaError::Upstream`] on any non-2xx status.
    /// - [`MetaError::Timeout`] if the call exceeds the per-call timeout.
    /// - [`MetaError::Http`] on network failure.
    /// - [`MetaError::Deserialize`] if the body does not match [`GraphProfile`].
    pub async fn fetch_profile(
        &self,
        token: &str,
        ig_account_id: &str,
    ) -> Result<GraphProfile, MetaError> {
        let url = self.build_url(ig_account_id, token, &[("fields", PROFILE_FIELDS)])?;
        self.get_json(url.as_str()).await
    }

    /// Lists the account's media, following pagination up to the page cap.
    ///
    /// `since` (unix seconds) restricts the list to media published after it.
    ///
    /// # Errors
    ///
    /// Propagates the first page error; see [`Self::fetch_profile`].
    pub async fn fetch_media(
        &self,
        token: &str,
        ig_account_id: &str,
        since: Option<i64>,
    ) -> Result<Paginated<GraphMedia>, MetaError> {
        let limit = self.page_size.to_string();
        let since = since.map(|s| s.to_string());
        let mut params = vec![("fields", MEDIA_FIELDS), ("limit", limit.as_str())];
        if let Some(since) = since.as_deref() {
            params.push(("since", since));
        }

        let url = self.build_url(&format!("{ig_account_id}/media"), token, &params)?;
        self.get_paginated(url).await
    }

    /// Lists the items of one carousel post.
    ///
    /// # Errors
    ///
    /// See [`Self::fetch_profile`].
    pub async fn fetch_children(
        &self,
        token: &str,
        media_id: &str,
    ) -> Result<Vec<GraphChild>, MetaError> {
        let url = self.build_url(
            &format!("{media_id}/children"),
            token,
            &[("fields", CHILD_FIELDS)],
        )?;
        let page: Page<GraphChild> = self.get_json(url.as_str()).await?;
        Ok(page.data)
    }

    /// Fetches lifetime metrics for one media object. `metrics` is chosen
    /// by the caller per media type.
    ///
    /// # Errors
    ///
    /// See [`Self::fetch_profile`].
    pub async fn fetch_media_insights(
        &self,
        token: &str,
        media_id: &str,
        metrics: &[&str],
    ) -> Result<Vec<GraphInsight>, MetaError> {
        let metric = metrics.join(",");
        let url = self.build_url(
            &format!("{media_id}/insights"),
            token,
            &[("metric", metric.as_str())],
        )?;
        let response: InsightsResponse = self.get_json(url.as_str()).await?;
        Ok(response.data)
    }

    /// Fetches daily account metrics between `since` and `until` (unix seconds).
    ///
    /// # Errors
    ///
    /// See [`Self::fetch_profile`].
    pub async fn fetch_account_insights(
        &self,
        token: &str,
        ig_account_id: &str,
        since: i64,
        until: i64,
    ) -> Result<Vec<GraphInsight>, MetaError> {
        let since = since.to_string();
        let until = until.to_string();
        let url = self.build_url(
            &format!("{ig_account_id}/insights"),
            token,
            &[
                ("metric", ACCOUNT_INSIGHT_METRICS),
                ("period", "day"),
                ("since", since.as_str()),
                ("until", until.as_str()),
            ],
        )?;
        let response: InsightsResponse = self.get_json(url.as_str()).await?;
        Ok(response.data)
    }

    /// Fetches the follower demographic breakdowns in one call.
    ///
    /// # Errors
    ///
    /// See [`Self::fetch_profile`].
    pub async fn fetch_demographics(
        &self,
        token: &str,
        ig_account_id: &str,
    ) -> Result<Vec<GraphInsight>, MetaError> {
        let url = self.build_url(
            &format!("{ig_account_id}/insights"),
            token,
            &[
                ("metric", "follower_demographics"),
                ("period", "lifetime"),
                ("metric_type", "total_value"),
                ("breakdown", DEMOGRAPHIC_BREAKDOWNS),
            ],
        )?;
        let response: InsightsResponse = self.get_json(url.as_str()).await?;
        Ok(response.data)
    }
}
