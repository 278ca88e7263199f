// src/models/hint.rs

use serde::{Deserialize, Serialize, Serializer};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'hints' table in the database.
///
/// One row per (block, answer, text). Rows are never deleted: reporting a
/// hint flips `reported`, which hides it from students until staff clear
/// the flag again.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Hint {
    pub id: i64,
    pub block_id: i64,

    /// Normalized wrong answer this hint belongs to.
    pub answer: String,

    /// The hint text shown to students. Sanitized on submission.
    pub text: String,

    /// Net vote count. Starts at 0, moved by upvote/downvote.
    pub rating: i64,

    /// Reported hints are excluded from best-hint selection.
    pub reported: bool,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Category tag attached to a get_hint response.
///
/// The client contract predates this rewrite: a served hint carries the
/// string 'ErrorResponse', while the no-hint sentinel carries JSON `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintCategory {
    ErrorResponse,
    None,
}

impl Serialize for HintCategory {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            HintCategory::ErrorResponse => serializer.serialize_str("ErrorResponse"),
            HintCategory::None => serializer.serialize_bool(false),
        }
    }
}

/// Response body for get_hint.
#[derive(Debug, Serialize)]
pub struct HintResponse {
    #[serde(rename = "BestHint")]
    pub best_hint: String,
    #[serde(rename = "StudentAnswer")]
    pub student_answer: String,
    #[serde(rename = "HintCategory")]
    pub hint_category: HintCategory,
}

/// DTO for get_hint: the submission exactly as the problem input posted it
/// (form-encoded, e.g. 'ans=incorrect+answer+1').
#[derive(Debug, Deserialize, Validate)]
pub struct GetHintRequest {
    #[validate(length(min = 1, max = 2048))]
    pub submittedanswer: String,
}

/// DTO for add_new_hint.
#[derive(Debug, Deserialize, Validate)]
pub struct AddHintRequest {
    #[validate(length(
        min = 1,
        max = 512,
        message = "Hint text must be between 1 and 512 characters."
    ))]
    pub new_hint_submission: String,
    #[validate(length(min = 1, max = 512))]
    pub answer: String,
}

/// DTO for rate_hint. `student_rating` is 'upvote', 'downvote' or 'report'.
#[derive(Debug, Deserialize, Validate)]
pub struct RateHintRequest {
    #[validate(length(min = 1, max = 512))]
    pub student_answer: String,
    #[validate(length(min = 1, max = 512))]
    pub hint: String,
    #[validate(length(min = 1, max = 20))]
    pub student_rating: String,
}

/// DTO for the staff unreport operation.
#[derive(Debug, Deserialize, Validate)]
pub struct UnreportHintRequest {
    #[validate(length(min = 1, max = 512))]
    pub answer: String,
    #[validate(length(min = 1, max = 512))]
    pub hint: String,
}

/// One hint row in the staff tally.
#[derive(Debug, Serialize)]
pub struct HintTally {
    pub text: String,
    pub rating: i64,
    pub reported: bool,
}

/// Staff view: every hint for one answer, best-first.
#[derive(Debug, Serialize)]
pub struct AnswerHintSummary {
    pub answer: String,
    pub hints: Vec<HintTally>,
}
