//! Serde mirrors of the Graph API payloads the sync engine reads.
//!
//! Instagram counters arrive as JSON numbers while Marketing API amounts
//! (budgets, spend, rates) arrive as decimal strings. Both are kept in their
//! wire form here; interpretation happens in the sync engine. Timestamps
//! are left as strings because Graph uses `+0000` offsets, not RFC 3339.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct GraphProfile {
    pub id: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub biography: Option<String>,
    pub website: Option<String>,
    pub profile_picture_url: Option<String>,
    pub followers_count: Option<i64>,
    pub follows_count: Option<i64>,
    pub media_count: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphMedia {
    pub id: String,
    pub caption: Option<String>,
    pub media_type: Option<String>,
    pub media_product_type: Option<String>,
    pub media_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub permalink: Option<String>,
    pub timestamp: Option<String>,
    pub like_count: Option<i64>,
    pub comments_count: Option<i64>,
}

/// One item of a carousel, from `/{media-id}/children`.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphChild {
    pub id: String,
    pub media_type: Option<String>,
    pub media_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub timestamp: Option<String>,
}

/// Body of every `/insights` call on Instagram objects.
#[derive(Debug, Clone, Deserialize)]
pub struct InsightsResponse {
    #[serde(default)]
    pub data: Vec<GraphInsight>,
}

/// One metric. Time-series metrics fill `values`; aggregate metrics and
/// breakdowns fill `total_value`.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphInsight {
    pub name: String,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub values: Vec<GraphInsightValue>,
    #[serde(default)]
    pub total_value: Option<GraphTotalValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphInsightValue {
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphTotalValue {
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub breakdowns: Vec<GraphBreakdown>,
}

/// A breakdown segment. `results` is kept opaque.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphBreakdown {
    #[serde(default)]
    pub dimension_keys: Vec<String>,
    #[serde(default)]
    pub results: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphCampaign {
    pub id: String,
    pub name: Option<String>,
    pub objective: Option<String>,
    pub status: Option<String>,
    pub effective_status: Option<String>,
    pub daily_budget: Option<String>,
    pub lifetime_budget: Option<String>,
    pub budget_remaining: Option<String>,
    pub start_time: Option<String>,
    pub stop_time: Option<String>,
    pub created_time: Option<String>,
}

/// One row of `/{campaign-id}/insights` with `time_increment=1`.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphCampaignInsight {
    pub date_start: Option<String>,
    pub date_stop: Option<String>,
    pub spend: Option<String>,
    pub impressions: Option<String>,
    pub reach: Option<String>,
    pub clicks: Option<String>,
    pub cpc: Option<String>,
    pub cpm: Option<String>,
    pub ctr: Option<String>,
    #[serde(default)]
    pub actions: Vec<GraphAction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphAction {
    pub action_type: String,
    pub value: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn campaign_insight_keeps_decimal_strings() {
        let row: GraphCampaignInsight = serde_json::from_value(json!({
            "date_start": "2026-03-01",
            "date_stop": "2026-03-01",
            "spend": "12.34",
            "ctr": "1.25",
            "actions": [{"action_type": "purchase", "value": "2"}]
        }))
        .expect("valid insight row");

        assert_eq!(row.spend.as_deref(), Some("12.34"));
        assert!(row.impressions.is_none());
        assert_eq!(row.actions.len(), 1);
    }

    #[test]
    fn insight_with_breakdowns_parses() {
        let response: InsightsResponse = serde_json::from_value(json!({
            "data": [{
                "name": "follower_demographics",
                "period": "lifetime",
                "total_value": {
                    "breakdowns": [{
                        "dimension_keys": ["country"],
                        "results": [{"dimension_values": ["US"], "value": 10}]
                    }]
                }
            }]
        }))
        .expect("valid insights response");

        let total = response.data[0].total_value.as_ref().expect("total_value");
        assert_eq!(total.breakdowns[0].dimension_keys, vec!["country"]);
        assert!(response.data[0].values.is_empty());
    }
}
