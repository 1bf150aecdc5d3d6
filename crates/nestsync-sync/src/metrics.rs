//! Metric selection and interpretation for Instagram insights.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use nestsync_core::{AccountInsight, MediaType, PostInsight};
use nestsync_meta::GraphInsight;

use crate::parse::{json_count, parse_graph_date};

const VIDEO_METRICS: &[&str] = &["reach", "saved", "total_interactions", "views"];
const STILL_METRICS: &[&str] = &["reach", "saved", "total_interactions"];

/// Media type to requested lifetime metrics. Only video has `views`.
pub const POST_METRIC_TABLE: [(MediaType, &[&str]); 4] = [
    (MediaType::Video, VIDEO_METRICS),
    (MediaType::Image, STILL_METRICS),
    (MediaType::CarouselAlbum, STILL_METRICS),
    (MediaType::Other, STILL_METRICS),
];

/// Period label written on account-insight rows.
pub const ACCOUNT_PERIOD: &str = "day";

#[must_use]
pub fn metrics_for(media_type: MediaType) -> &'static [&'static str] {
    POST_METRIC_TABLE
        .iter()
        .find(|(kind, _)| *kind == media_type)
        .map_or(STILL_METRICS, |(_, metrics)| *metrics)
}

/// Scalar value of a metric: the first time-series point, else the total.
fn metric_value(insight: &GraphInsight) -> Option<i64> {
    insight
        .values
        .first()
        .and_then(|v| json_count(&v.value))
        .or_else(|| {
            insight
                .total_value
                .as_ref()
                .and_then(|t| t.value.as_ref())
                .and_then(json_count)
        })
}

/// Builds the daily snapshot for one post. Metrics the media type does not
/// request stay at zero whatever upstream sent.
#[must_use]
pub fn post_insight_from(
    post_id: &str,
    media_type: MediaType,
    date: NaiveDate,
    data: &[GraphInsight],
) -> PostInsight {
    let requested = metrics_for(media_type);
    let mut insight = PostInsight {
        post_id: post_id.to_owned(),
        date,
        reach: 0,
        saved: 0,
        total_interactions: 0,
        views: 0,
    };

    for metric in data {
        if !requested.contains(&metric.name.as_str()) {
            continue;
        }
        let value = metric_value(metric).unwrap_or(0);
        match metric.name.as_str() {
            "reach" => insight.reach = value,
            "saved" => insight.saved = value,
            "total_interactions" => insight.total_interactions = value,
            "views" => insight.views = value,
            _ => {}
        }
    }

    insight
}

/// How an account metric maps onto dated rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountMetricKind {
    /// Per-day series, bucketed by each point's `end_time` date.
    Series,
    /// Trailing aggregate, always attributed to the run date.
    Point,
}

/// Account metrics read from the insights endpoint. Anything else is ignored.
pub const ACCOUNT_METRIC_TABLE: [(&str, AccountMetricKind); 2] = [
    ("reach", AccountMetricKind::Series),
    ("profile_views", AccountMetricKind::Point),
];

#[must_use]
pub fn account_metric_kind(name: &str) -> Option<AccountMetricKind> {
    ACCOUNT_METRIC_TABLE
        .iter()
        .find(|(metric, _)| *metric == name)
        .map(|(_, kind)| *kind)
}

#[derive(Default)]
struct DayBucket {
    reach: Option<i64>,
    profile_views: Option<i64>,
}

impl DayBucket {
    fn set(&mut self, metric: &str, value: i64) {
        match metric {
            "reach" => self.reach = Some(value),
            "profile_views" => self.profile_views = Some(value),
            _ => {}
        }
    }
}

fn total_value(metric: &GraphInsight) -> Option<i64> {
    metric
        .total_value
        .as_ref()
        .and_then(|t| t.value.as_ref())
        .and_then(json_count)
}

/// Value of the most recent point; ties on `end_time` go to the later entry.
fn latest_point(metric: &GraphInsight) -> Option<i64> {
    metric
        .values
        .iter()
        .enumerate()
        .filter_map(|(index, point)| {
            json_count(&point.value)
                .map(|value| (parse_graph_date(point.end_time.as_deref()), index, value))
        })
        .max_by_key(|(date, index, _)| (*date, *index))
        .map(|(_, _, value)| value)
}

/// Groups account metrics into one row per date.
///
/// Series metrics are bucketed by the date of each point's `end_time`
/// (`today` when a point has none, or when only a total is returned). Point
/// metrics always land on `today`, taking the latest point of a series.
/// `follower_count` comes from the profile fetch and is stamped on every row.
#[must_use]
pub fn account_insights_from(
    account_id: &str,
    data: &[GraphInsight],
    today: NaiveDate,
    follower_count: i64,
) -> Vec<AccountInsight> {
    let mut buckets: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();

    for metric in data {
        let name = metric.name.as_str();
        let Some(kind) = account_metric_kind(name) else {
            tracing::debug!(metric = name, "ignoring unrequested account metric");
            continue;
        };

        match kind {
            AccountMetricKind::Point => {
                if let Some(value) = latest_point(metric).or_else(|| total_value(metric)) {
                    buckets.entry(today).or_default().set(name, value);
                }
            }
            AccountMetricKind::Series if metric.values.is_empty() => {
                if let Some(value) = total_value(metric) {
                    buckets.entry(today).or_default().set(name, value);
                }
            }
            AccountMetricKind::Series => {
                for point in &metric.values {
                    let Some(value) = json_count(&point.value) else {
                        continue;
                    };
                    let date = parse_graph_date(point.end_time.as_deref()).unwrap_or(today);
                    buckets.entry(date).or_default().set(name, value);
                }
            }
        }
    }

    buckets
        .into_iter()
        .map(|(date, bucket)| AccountInsight {
            account_id: account_id.to_owned(),
            date,
            period: ACCOUNT_PERIOD.to_owned(),
            reach: bucket.reach,
            profile_views: bucket.profile_views,
            follower_count,
        })
        .collect()
}
