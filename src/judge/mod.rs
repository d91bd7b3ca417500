use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::products::ProductFacts;
use crate::users::repo::UserProfile;

mod openai;
mod prompt;

pub use openai::OpenAiJudge;

/// Upper bound on ranked picks; the judge is asked for the top 3 and
/// anything longer is rejected as malformed.
pub const MAX_RECOMMENDATIONS: usize = 3;

/// Structured result of scoring one product for one profile.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Verdict {
    pub score: i32,
    pub reasoning: String,
}

/// One prior scan, normalized for ranking. Names are resolved before the
/// judge sees the pool; it never receives a nameless candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationCandidate {
    pub product_name: String,
    pub upc: String,
    pub score: i32,
    pub image_url: String,
    pub reasoning: String,
}

/// One ranked pick. Name, image and upc are copied from a candidate the
/// judge was given, never invented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub score: i32,
    pub reasoning: String,
    pub product_name: String,
    pub image_url: String,
    pub upc: String,
}

/// Judge output for a ranking request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub recommendations: Vec<Recommendation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("judge request failed: {0}")]
    Request(String),
    #[error("judge returned malformed output: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait Judge: Send + Sync {
    /// Score one product (0-100) for one profile.
    async fn score(
        &self,
        profile: &UserProfile,
        facts: &ProductFacts,
    ) -> Result<Verdict, JudgeError>;

    /// Rank the candidate pool and return the healthiest picks for the
    /// profile, at most [`MAX_RECOMMENDATIONS`].
    async fn rank(
        &self,
        profile: &UserProfile,
        candidates: &[RecommendationCandidate],
    ) -> Result<Ranking, JudgeError>;
}
