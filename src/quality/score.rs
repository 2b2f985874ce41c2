//! Quality score and entry-threshold predicate.
//!
//! Both are pure functions of the record's follower count and verification
//! tier, used to populate `meta.score` and to re-check
//! `meta.entry_threshold_passed`.

use serde::{Deserialize, Serialize};

use crate::data_model::{M2Inputs, Verified};

/// Verified accounts (any tier but `none`) need at least this many followers.
pub const VERIFIED_MIN_FOLLOWERS: u64 = 30_000;
/// Any account with at least this many followers passes.
pub const MIN_FOLLOWERS: u64 = 50_000;

pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

/// `(verified != none && followers >= 30k) || followers >= 50k`
pub fn passes_threshold(followers_count: u64, verified: Verified) -> bool {
    (verified.is_verified() && followers_count >= VERIFIED_MIN_FOLLOWERS)
        || followers_count >= MIN_FOLLOWERS
}

pub fn verified_boost(verified: Verified) -> f64 {
    match verified {
        Verified::Blue => 10.0,
        Verified::Legacy => 5.0,
        Verified::Org | Verified::None => 0.0,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Log-followers score: `clip(clip(20*log10(max(f,1)/1000), 0, 100) + boost, 0, 100)`,
/// rounded to two decimals.
pub fn score(followers_count: u64, verified: Verified) -> f64 {
    let followers = followers_count.max(1) as f64;
    let base = (20.0 * (followers / 1000.0).log10()).clamp(SCORE_MIN, SCORE_MAX);
    round2((base + verified_boost(verified)).clamp(SCORE_MIN, SCORE_MAX))
}

/// Everything a scoring strategy may look at.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreInputs {
    pub followers_count: u64,
    pub verified: Verified,
    pub m2: Option<M2Inputs>,
}

impl ScoreInputs {
    pub fn new(followers_count: u64, verified: Verified) -> Self {
        ScoreInputs {
            followers_count,
            verified,
            m2: None,
        }
    }
}

pub trait ScoringStrategy: Send + Sync {
    fn version(&self) -> &'static str;
    fn formula(&self) -> &'static str;
    fn score(&self, inputs: &ScoreInputs) -> f64;
}

/// The default v1 strategy wrapping [`score`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFollowersScore;

impl ScoringStrategy for LogFollowersScore {
    fn version(&self) -> &'static str {
        "v1"
    }

    fn formula(&self) -> &'static str {
        "clip(20*log10(max(followers_count,1)/1000),0,100) + verified_boost(blue=10,legacy=5), clipped to [0,100]"
    }

    fn score(&self, inputs: &ScoreInputs) -> f64 {
        score(inputs.followers_count, inputs.verified)
    }
}

/// Multi-factor strategy: activity 30%, quality 50%, relevance 20%.
///
/// Missing activity/relevance count as 0; missing quality falls back to the
/// v1 log-followers score.
#[derive(Debug, Clone, Copy, Default)]
pub struct M2Score;

impl M2Score {
    pub const ACTIVITY_WEIGHT: f64 = 0.3;
    pub const QUALITY_WEIGHT: f64 = 0.5;
    pub const RELEVANCE_WEIGHT: f64 = 0.2;
}

impl ScoringStrategy for M2Score {
    fn version(&self) -> &'static str {
        "m2"
    }

    fn formula(&self) -> &'static str {
        "0.3*activity + 0.5*quality + 0.2*relevance, components in [0,100]"
    }

    fn score(&self, inputs: &ScoreInputs) -> f64 {
        let m2 = inputs.m2.clone().unwrap_or_default();
        let component = |v: Option<f64>| v.unwrap_or(0.0).clamp(SCORE_MIN, SCORE_MAX);
        let quality = m2
            .quality
            .map(|q| q.clamp(SCORE_MIN, SCORE_MAX))
            .unwrap_or_else(|| score(inputs.followers_count, inputs.verified));
        let total = Self::ACTIVITY_WEIGHT * component(m2.activity)
            + Self::QUALITY_WEIGHT * quality
            + Self::RELEVANCE_WEIGHT * component(m2.relevance);
        round2(total.clamp(SCORE_MIN, SCORE_MAX))
    }
}

/// Name used in pipeline configuration to pick a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringStrategyKind {
    #[default]
    LogFollowers,
    M2,
}

impl ScoringStrategyKind {
    pub fn build(&self) -> Box<dyn ScoringStrategy> {
        match self {
            ScoringStrategyKind::LogFollowers => Box::new(LogFollowersScore),
            ScoringStrategyKind::M2 => Box::new(M2Score),
        }
    }
}
