// src/models/course.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'courses' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub display_name: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'hinter_blocks' table: a named hinter instance attached
/// to a course. Handler URLs resolve blocks by (course_id, name).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct HinterBlock {
    pub id: i64,
    pub course_id: i64,
    pub name: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Aggregated course page: the course plus its hinter blocks.
#[derive(Debug, Serialize)]
pub struct CourseDetailResponse {
    pub course: Course,
    pub blocks: Vec<HinterBlock>,
}

/// DTO for creating a course.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Display name must be between 1 and 255 characters."
    ))]
    pub display_name: String,
}

/// DTO for attaching a hinter block to a course.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBlockRequest {
    #[validate(length(min = 1, max = 64), custom(function = validate_block_name))]
    pub name: String,
}

/// Block names appear in handler URLs, so they are restricted to
/// alphanumerics, '_' and '-'.
fn validate_block_name(name: &str) -> Result<(), validator::ValidationError> {
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(validator::ValidationError::new("invalid_block_name"));
    }
    Ok(())
}
