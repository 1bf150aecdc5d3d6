pub mod client;
pub mod error;
pub mod pagination;
pub mod rate_limit;
pub mod types;

pub use client::MetaClient;
pub use error::MetaError;
pub use pagination::{Page, Paginated, Paging};
pub use rate_limit::RateLimiter;
pub use types::{
    GraphAction, GraphBreakdown, GraphCampaign, GraphCampaignInsight, GraphChild, GraphInsight,
    GraphInsightValue, GraphMedia, GraphProfile, GraphTotalValue, InsightsResponse,
};
