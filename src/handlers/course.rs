// src/handlers/course.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::course::{
        Course, CourseDetailResponse, CreateBlockRequest, CreateCourseRequest, HinterBlock,
    },
    utils::jwt::Claims,
};

/// Creates a new course.
/// Staff only.
pub async fn create_course(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let id: i64 = sqlx::query_scalar("INSERT INTO courses (display_name) VALUES (?) RETURNING id")
        .bind(&payload.display_name)
        .fetch_one(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create course: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Attaches a named hinter block to a course.
/// Staff only.
pub async fn create_block(
    State(pool): State<SqlitePool>,
    Path(course_id): Path<i64>,
    Json(payload): Json<CreateBlockRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    ensure_course_exists(&pool, course_id).await?;

    let id: i64 =
        sqlx::query_scalar("INSERT INTO hinter_blocks (course_id, name) VALUES (?, ?) RETURNING id")
            .bind(course_id)
            .bind(&payload.name)
            .fetch_one(&pool)
            .await
            .map_err(|e| {
                if e.to_string().contains("UNIQUE constraint") {
                    AppError::Conflict(format!(
                        "Block '{}' already exists in this course",
                        payload.name
                    ))
                } else {
                    tracing::error!("Failed to create hinter block: {:?}", e);
                    AppError::InternalServerError(e.to_string())
                }
            })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Enrolls the current user into a course. Idempotent: re-enrolling is a
/// no-op rather than an error.
pub async fn enroll(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.sub.parse::<i64>().unwrap_or(0);

    ensure_course_exists(&pool, course_id).await?;

    sqlx::query(
        "INSERT INTO enrollments (user_id, course_id) VALUES (?, ?) \
         ON CONFLICT (user_id, course_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(course_id)
    .execute(&pool)
    .await?;

    Ok(Json(serde_json::json!({ "enrolled": true })))
}

/// The course page: course info plus its hinter blocks.
pub async fn get_course(
    State(pool): State<SqlitePool>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let course = sqlx::query_as::<_, Course>(
        "SELECT id, display_name, created_at FROM courses WHERE id = ?",
    )
    .bind(course_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Course not found".to_string()))?;

    let blocks = sqlx::query_as::<_, HinterBlock>(
        "SELECT id, course_id, name, created_at FROM hinter_blocks WHERE course_id = ? ORDER BY id",
    )
    .bind(course_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(CourseDetailResponse { course, blocks }))
}

/// 404 when the course does not exist.
async fn ensure_course_exists(pool: &SqlitePool, course_id: i64) -> Result<(), AppError> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM courses WHERE id = ?")
        .bind(course_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Course not found".to_string()))?;

    Ok(())
}
