//! Conversion of Graph API payloads into the normalized records the
//! persistence layer stores.

use nestsync_core::{
    CampaignInsight, MediaType, NormalizedCampaign, NormalizedChild, NormalizedPost,
    ProfileSnapshot,
};
use nestsync_meta::{GraphCampaign, GraphCampaignInsight, GraphChild, GraphMedia, GraphProfile};

use crate::parse::{parse_count, parse_graph_date, parse_graph_timestamp, parse_rate, sum_conversions};

/// `account_id` is the id the run was asked to sync, not the echoed `id`.
#[must_use]
pub fn normalize_profile(account_id: &str, raw: &GraphProfile) -> ProfileSnapshot {
    ProfileSnapshot {
        account_id: account_id.to_owned(),
        username: raw.username.clone(),
        name: raw.name.clone(),
        biography: raw.biography.clone(),
        website: raw.website.clone(),
        profile_picture_url: raw.profile_picture_url.clone(),
        followers_count: raw.followers_count.unwrap_or(0),
        follows_count: raw.follows_count.unwrap_or(0),
        media_count: raw.media_count.unwrap_or(0),
    }
}

#[must_use]
pub fn normalize_post(account_id: &str, raw: &GraphMedia) -> NormalizedPost {
    NormalizedPost {
        id: raw.id.clone(),
        account_id: account_id.to_owned(),
        caption: raw.caption.clone(),
        media_type: MediaType::from_graph(raw.media_type.as_deref().unwrap_or_default()),
        media_product_type: raw.media_product_type.clone(),
        media_url: raw.media_url.clone(),
        thumbnail_url: raw.thumbnail_url.clone(),
        permalink: raw.permalink.clone(),
        posted_at: parse_graph_timestamp(raw.timestamp.as_deref()),
        like_count: raw.like_count.unwrap_or(0),
        comments_count: raw.comments_count.unwrap_or(0),
    }
}

#[must_use]
pub fn normalize_child(post_id: &str, raw: &GraphChild) -> NormalizedChild {
    NormalizedChild {
        id: raw.id.clone(),
        post_id: post_id.to_owned(),
        media_type: MediaType::from_graph(raw.media_type.as_deref().unwrap_or_default()),
        media_url: raw.media_url.clone(),
        thumbnail_url: raw.thumbnail_url.clone(),
        posted_at: parse_graph_timestamp(raw.timestamp.as_deref()),
    }
}

#[must_use]
pub fn normalize_campaign(ad_account_id: &str, raw: &GraphCampaign) -> NormalizedCampaign {
    NormalizedCampaign {
        id: raw.id.clone(),
        ad_account_id: ad_account_id.to_owned(),
        name: raw.name.clone(),
        objective: raw.objective.clone(),
        status: raw.status.clone(),
        effective_status: raw.effective_status.clone(),
        daily_budget: parse_count(raw.daily_budget.as_deref()),
        lifetime_budget: parse_count(raw.lifetime_budget.as_deref()),
        budget_remaining: parse_count(raw.budget_remaining.as_deref()),
        start_time: parse_graph_timestamp(raw.start_time.as_deref()),
        stop_time: parse_graph_timestamp(raw.stop_time.as_deref()),
        created_time: parse_graph_timestamp(raw.created_time.as_deref()),
    }
}

/// Returns `None` for rows without a usable `date_start`; they have no
/// snapshot key.
#[must_use]
pub fn normalize_campaign_insight(
    campaign_id: &str,
    date_window: &str,
    raw: &GraphCampaignInsight,
) -> Option<CampaignInsight> {
    let date = parse_graph_date(raw.date_start.as_deref())?;

    Some(CampaignInsight {
        campaign_id: campaign_id.to_owned(),
        date,
        date_window: date_window.to_owned(),
        spend: parse_count(raw.spend.as_deref()),
        impressions: parse_count(raw.impressions.as_deref()),
        reach: parse_count(raw.reach.as_deref()),
        clicks: parse_count(raw.clicks.as_deref()),
        cpc: parse_count(raw.cpc.as_deref()),
        cpm: parse_count(raw.cpm.as_deref()),
        ctr: parse_rate(raw.ctr.as_deref()),
        conversions: sum_conversions(&raw.actions),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn post_defaults_missing_counters_to_zero() {
        let raw: GraphMedia = serde_json::from_value(json!({
            "id": "p1",
            "media_type": "REELS",
            "timestamp": "2026-03-01T12:00:00+0000"
        }))
        .expect("valid media");

        let post = normalize_post("acct", &raw);
        assert_eq!(post.media_type, MediaType::Video);
        assert_eq!(post.like_count, 0);
        assert_eq!(post.comments_count, 0);
        assert!(post.posted_at.is_some());
        assert_eq!(post.account_id, "acct");
    }

    #[test]
    fn post_without_media_type_is_other() {
        let raw: GraphMedia = serde_json::from_value(json!({"id": "p2"})).expect("valid media");
        assert_eq!(normalize_post("acct", &raw).media_type, MediaType::Other);
    }

    #[test]
    fn profile_uses_requested_account_id() {
        let raw: GraphProfile = serde_json::from_value(json!({
            "id": "echoed",
            "followers_count": 120
        }))
        .expect("valid profile");

        let profile = normalize_profile("requested", &raw);
        assert_eq!(profile.account_id, "requested");
        assert_eq!(profile.followers_count, 120);
        assert_eq!(profile.media_count, 0);
    }

    #[test]
    fn campaign_budgets_parse_from_strings() {
        let raw: GraphCampaign = serde_json::from_value(json!({
            "id": "c1",
            "daily_budget": "5000",
            "budget_remaining": "1234.9",
            "start_time": "2026-03-01T10:00:00-0700"
        }))
        .expect("valid campaign");

        let campaign = normalize_campaign("act_1", &raw);
        assert_eq!(campaign.daily_budget, 5000);
        assert_eq!(campaign.lifetime_budget, 0);
        assert_eq!(campaign.budget_remaining, 1234);
        assert!(campaign.start_time.is_some());
        assert!(campaign.stop_time.is_none());
    }

    #[test]
    fn campaign_insight_parses_counts_rate_and_conversions() {
        let raw: GraphCampaignInsight = serde_json::from_value(json!({
            "date_start": "2026-03-04",
            "date_stop": "2026-03-04",
            "spend": "12.75",
            "impressions": "1000",
            "reach": "800",
            "clicks": "25",
            "cpc": "0.51",
            "cpm": "12.75",
            "ctr": "2.5",
            "actions": [
                {"action_type": "purchase", "value": "2"},
                {"action_type": "link_click", "value": "25"}
            ]
        }))
        .expect("valid insight");

        let row = normalize_campaign_insight("c1", "last_90d", &raw).expect("has date");
        assert_eq!(row.date, NaiveDate::from_ymd_opt(2026, 3, 4).expect("date"));
        assert_eq!(row.spend, 12);
        assert_eq!(row.impressions, 1000);
        assert_eq!(row.cpc, 0);
        assert!((row.ctr - 2.5).abs() < f64::EPSILON);
        assert_eq!(row.conversions, 2);
        assert_eq!(row.date_window, "last_90d");
    }

    #[test]
    fn campaign_insight_without_date_is_dropped() {
        let raw: GraphCampaignInsight =
            serde_json::from_value(json!({"spend": "1"})).expect("valid insight");
        assert!(normalize_campaign_insight("c1", "last_7d", &raw).is_none());
    }
}
