//! Normalized records produced by the sync engine and consumed by the
//! persistence layer.
//!
//! Counters are plain `i64` that default to zero; the only nullable numbers are
//! account-insight columns, where `None` means "not measured for this date in
//! this run" and the stored value must be left untouched.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Media type as reported by the Graph API `media_type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    Image,
    Video,
    CarouselAlbum,
    /// Anything the API adds later; treated like an image for metric selection.
    Other,
}

impl MediaType {
    #[must_use]
    pub fn from_graph(raw: &str) -> Self {
        match raw {
            "IMAGE" => MediaType::Image,
            "VIDEO" | "REELS" => MediaType::Video,
            "CAROUSEL_ALBUM" => MediaType::CarouselAlbum,
            _ => MediaType::Other,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "IMAGE",
            MediaType::Video => "VIDEO",
            MediaType::CarouselAlbum => "CAROUSEL_ALBUM",
            MediaType::Other => "OTHER",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time snapshot of the connected Instagram business account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub account_id: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub biography: Option<String>,
    pub website: Option<String>,
    pub profile_picture_url: Option<String>,
    pub followers_count: i64,
    pub follows_count: i64,
    pub media_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedPost {
    /// Provider media id; globally unique upstream.
    pub id: String,
    pub account_id: String,
    pub caption: Option<String>,
    pub media_type: MediaType,
    /// `"FEED"`, `"REELS"`, `"STORY"`, ...
    pub media_product_type: Option<String>,
    pub media_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub permalink: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub like_count: i64,
    pub comments_count: i64,
}

/// One item inside a carousel post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedChild {
    pub id: String,
    pub post_id: String,
    pub media_type: MediaType,
    pub media_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
}

/// Daily lifetime-metric snapshot for one post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostInsight {
    pub post_id: String,
    pub date: NaiveDate,
    pub reach: i64,
    pub saved: i64,
    pub total_interactions: i64,
    /// Zero for media types that have no `views` metric.
    pub views: i64,
}

/// Per-account metrics for one (date, period) bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInsight {
    pub account_id: String,
    pub date: NaiveDate,
    pub period: String,
    pub reach: Option<i64>,
    pub profile_views: Option<i64>,
    /// Always taken from the profile fetch of the same run.
    pub follower_count: i64,
}

/// The four demographic breakdown slots. Payloads are stored as opaque JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemographicSlots {
    pub city: Option<serde_json::Value>,
    pub country: Option<serde_json::Value>,
    pub age_gender: Option<serde_json::Value>,
    pub locale: Option<serde_json::Value>,
}

impl DemographicSlots {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.city.is_none()
            && self.country.is_none()
            && self.age_gender.is_none()
            && self.locale.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedCampaign {
    pub id: String,
    pub ad_account_id: String,
    pub name: Option<String>,
    pub objective: Option<String>,
    pub status: Option<String>,
    pub effective_status: Option<String>,
    /// Budgets arrive in the account currency's minor unit.
    pub daily_budget: i64,
    pub lifetime_budget: i64,
    pub budget_remaining: i64,
    pub start_time: Option<DateTime<Utc>>,
    pub stop_time: Option<DateTime<Utc>>,
    pub created_time: Option<DateTime<Utc>>,
}

/// Campaign metrics for one day inside a named date window (e.g. `last_90d`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignInsight {
    pub campaign_id: String,
    pub date: NaiveDate,
    pub date_window: String,
    pub spend: i64,
    pub impressions: i64,
    pub reach: i64,
    pub clicks: i64,
    pub cpc: i64,
    pub cpm: i64,
    /// Click-through rate as a percentage, e.g. `1.25`.
    pub ctr: f64,
    pub conversions: i64,
}
