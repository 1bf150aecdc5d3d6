//! Marketing API fetches: campaigns and their daily insights.

use crate::error::MetaError;
use crate::pagination::Paginated;
use crate::types::{GraphCampaign, GraphCampaignInsight};

use super::MetaClient;

const CAMPAIGN_FIELDS: &str = "id,name,objective,status,effective_status,daily_budget,\
lifetime_budget,budget_remaining,start_time,stop_time,created_time";

const CAMPAIGN_INSIGHT_FIELDS: &str =
    "spend,impressions,reach,clicks,cpc,cpm,ctr,actions,date_start,date_stop";

/// Marketing API paths use the `act_` form of the ad account id.
pub(crate) fn ad_account_path(ad_account_id: &str) -> String {
    if ad_account_id.starts_with("act_") {
        ad_account_id.to_owned()
    } else {
        format!("act_{ad_account_id}")
    }
}

impl MetaClient {
    /// Lists every campaign of an ad account, following pagination up to the
    /// page cap.
    ///
    /// # Errors
    ///
    /// Propagates the first page error: [`MetaError::Upstream`],
    /// [`MetaError::Timeout`], [`MetaError::Http`] or [`MetaError::Deserialize`].
    pub async fn fetch_campaigns(
        &self,
        token: &str,
        ad_account_id: &str,
    ) -> Result<Paginated<GraphCampaign>, MetaError> {
        let limit = self.page_size.to_string();
        let url = self.build_url(
            &format!("{}/campaigns", ad_account_path(ad_account_id)),
            token,
            &[("fields", CAMPAIGN_FIELDS), ("limit", limit.as_str())],
        )?;
        self.get_paginated(url).await
    }

    /// Fetches one row per day for a campaign inside a named date preset
    /// such as `last_90d`.
    ///
    /// # Errors
    ///
    /// See [`Self::fetch_campaigns`].
    pub async fn fetch_campaign_insights(
        &self,
        token: &str,
        campaign_id: &str,
        date_window: &str,
    ) -> Result<Paginated<GraphCampaignInsight>, MetaError> {
        let url = self.build_url(
            &format!("{campaign_id}/insights"),
            token,
            &[
                ("fields", CAMPAIGN_INSIGHT_FIELDS),
                ("date_preset", date_window),
                ("time_increment", "1"),
            ],
        )?;
        self.get_paginated(url).await
    }
}
