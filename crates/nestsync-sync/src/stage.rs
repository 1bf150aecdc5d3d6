//! The ordered pipeline and its declared read-dependencies.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::error::StageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Profile,
    Posts,
    CarouselChildren,
    PostInsights,
    AccountInsights,
    Demographics,
    Campaigns,
    CampaignInsights,
}

/// Failure policy of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// One upstream call; any error aborts the run.
    Coarse,
    /// One upstream call per stored row; upstream errors skip the row.
    FineGrained,
}

impl Stage {
    /// Execution order. Later stages read rows written by earlier ones.
    pub const PIPELINE: [Stage; 8] = [
        Stage::Profile,
        Stage::Posts,
        Stage::CarouselChildren,
        Stage::PostInsights,
        Stage::AccountInsights,
        Stage::Demographics,
        Stage::Campaigns,
        Stage::CampaignInsights,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Profile => "profile",
            Stage::Posts => "posts",
            Stage::CarouselChildren => "carousel_children",
            Stage::PostInsights => "post_insights",
            Stage::AccountInsights => "account_insights",
            Stage::Demographics => "demographics",
            Stage::Campaigns => "campaigns",
            Stage::CampaignInsights => "campaign_insights",
        }
    }

    #[must_use]
    pub fn granularity(self) -> Granularity {
        match self {
            Stage::CarouselChildren | Stage::PostInsights | Stage::CampaignInsights => {
                Granularity::FineGrained
            }
            Stage::Profile
            | Stage::Posts
            | Stage::AccountInsights
            | Stage::Demographics
            | Stage::Campaigns => Granularity::Coarse,
        }
    }

    /// Stages that must have completed in this run before `self` may start.
    #[must_use]
    pub fn requires(self) -> &'static [Stage] {
        match self {
            Stage::Profile | Stage::Posts | Stage::Demographics | Stage::Campaigns => &[],
            Stage::CarouselChildren | Stage::PostInsights => &[Stage::Posts],
            // Follower count comes from the profile fetch.
            Stage::AccountInsights => &[Stage::Profile],
            Stage::CampaignInsights => &[Stage::Campaigns],
        }
    }

    /// Stages that need the tenant's ad account.
    #[must_use]
    pub fn needs_ad_account(self) -> bool {
        matches!(self, Stage::Campaigns | Stage::CampaignInsights)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks which stages completed in the current run and refuses to start a
/// stage whose prerequisites did not.
#[derive(Debug, Default)]
pub struct StageLedger {
    completed: HashSet<Stage>,
    skipped: Vec<Stage>,
}

impl StageLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns [`StageError::PrerequisiteMissing`] naming the first required
    /// stage that has not completed.
    pub fn check(&self, stage: Stage) -> Result<(), StageError> {
        match stage
            .requires()
            .iter()
            .find(|&&required| !self.completed.contains(&required))
        {
            Some(&requires) => Err(StageError::PrerequisiteMissing { stage, requires }),
            None => Ok(()),
        }
    }

    pub fn complete(&mut self, stage: Stage) {
        self.completed.insert(stage);
    }

    pub fn skip(&mut self, stage: Stage) {
        self.skipped.push(stage);
    }

    #[must_use]
    pub fn is_complete(&self, stage: Stage) -> bool {
        self.completed.contains(&stage)
    }

    #[must_use]
    pub fn skipped(&self) -> &[Stage] {
        &self.skipped
    }
}
