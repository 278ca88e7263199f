// src/handlers/hinter.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::NO_HINTS_MESSAGE,
    error::AppError,
    models::{
        course::HinterBlock,
        hint::{AddHintRequest, GetHintRequest, Hint, HintCategory, HintResponse, RateHintRequest},
    },
    utils::{
        answer::{normalize_answer, parse_submitted_answer},
        html::clean_html,
        jwt::Claims,
    },
};

/// Returns the best hint for a wrong answer.
///
/// The submission arrives form-encoded ('ans=incorrect+answer+1'); the best
/// hint is the highest-rated non-reported one, ties going to the earliest
/// submission. A served hint is recorded in the student's used-hint history
/// so it can be rated after the problem is solved. Without an eligible hint
/// the fixed sentinel is returned and nothing is recorded.
pub async fn get_hint(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path((course_id, block_name)): Path<(i64, String)>,
    Json(payload): Json<GetHintRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user_id = claims.sub.parse::<i64>().unwrap_or(0);
    let block = resolve_block(&pool, course_id, &block_name).await?;
    ensure_enrolled(&pool, user_id, course_id).await?;

    let answer = parse_submitted_answer(&payload.submittedanswer)
        .ok_or(AppError::BadRequest("Empty answer submission".to_string()))?;

    let best = sqlx::query_as::<_, Hint>(
        r#"
        SELECT id, block_id, answer, text, rating, reported, created_at
        FROM hints
        WHERE block_id = ? AND answer = ? AND reported = FALSE
        ORDER BY rating DESC, id ASC
        LIMIT 1
        "#,
    )
    .bind(block.id)
    .bind(&answer)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch best hint: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let response = match best {
        Some(hint) => {
            // Remember what was shown so get_used_hint_answer_data can
            // surface it for rating later.
            sqlx::query(
                "INSERT INTO used_hints (block_id, user_id, text, answer) VALUES (?, ?, ?, ?) \
                 ON CONFLICT (block_id, user_id, text) DO UPDATE SET answer = excluded.answer",
            )
            .bind(block.id)
            .bind(user_id)
            .bind(&hint.text)
            .bind(&answer)
            .execute(&pool)
            .await?;

            HintResponse {
                best_hint: hint.text,
                student_answer: answer,
                hint_category: HintCategory::ErrorResponse,
            }
        }
        None => HintResponse {
            best_hint: NO_HINTS_MESSAGE.to_string(),
            student_answer: answer,
            hint_category: HintCategory::None,
        },
    };

    Ok(Json(response))
}

/// Stores a student-submitted hint for an answer.
///
/// The text is HTML-sanitized before it is written. Submitting a hint that
/// already exists for the answer upvotes it instead of duplicating the row.
pub async fn add_new_hint(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path((course_id, block_name)): Path<(i64, String)>,
    Json(payload): Json<AddHintRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user_id = claims.sub.parse::<i64>().unwrap_or(0);
    let block = resolve_block(&pool, course_id, &block_name).await?;
    ensure_enrolled(&pool, user_id, course_id).await?;

    let answer = normalize_answer(&payload.answer);
    if answer.is_empty() {
        return Err(AppError::BadRequest("Empty answer".to_string()));
    }

    let text = clean_html(payload.new_hint_submission.trim());
    if text.is_empty() {
        return Err(AppError::BadRequest(
            "Hint text is empty after sanitization".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM hints WHERE block_id = ? AND answer = ? AND text = ?")
            .bind(block.id)
            .bind(&answer)
            .bind(&text)
            .fetch_optional(&mut *tx)
            .await?;

    if let Some(id) = existing {
        // Resubmission counts as an endorsement of the existing hint.
        sqlx::query("UPDATE hints SET rating = rating + 1 WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        return Ok((StatusCode::OK, Json(serde_json::json!({ "id": id }))));
    }

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO hints (block_id, answer, text) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(block.id)
    .bind(&answer)
    .bind(&text)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to add hint: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Applies a student rating to a hint.
///
/// 'upvote'/'downvote' move the rating by one and answer `{success: true}`;
/// 'report' hides the hint from best-hint selection and answers
/// `{rating: 'reported', hint}`.
pub async fn rate_hint(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path((course_id, block_name)): Path<(i64, String)>,
    Json(payload): Json<RateHintRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user_id = claims.sub.parse::<i64>().unwrap_or(0);
    let block = resolve_block(&pool, course_id, &block_name).await?;
    ensure_enrolled(&pool, user_id, course_id).await?;

    let answer = normalize_answer(&payload.student_answer);

    let hint = sqlx::query_as::<_, Hint>(
        r#"
        SELECT id, block_id, answer, text, rating, reported, created_at
        FROM hints
        WHERE block_id = ? AND answer = ? AND text = ?
        "#,
    )
    .bind(block.id)
    .bind(&answer)
    .bind(&payload.hint)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("No such hint for that answer".to_string()))?;

    match payload.student_rating.as_str() {
        "upvote" => {
            sqlx::query("UPDATE hints SET rating = rating + 1 WHERE id = ?")
                .bind(hint.id)
                .execute(&pool)
                .await?;

            Ok(Json(serde_json::json!({ "success": true })))
        }
        "downvote" => {
            sqlx::query("UPDATE hints SET rating = rating - 1 WHERE id = ?")
                .bind(hint.id)
                .execute(&pool)
                .await?;

            Ok(Json(serde_json::json!({ "success": true })))
        }
        "report" => {
            sqlx::query("UPDATE hints SET reported = TRUE WHERE id = ?")
                .bind(hint.id)
                .execute(&pool)
                .await?;

            Ok(Json(
                serde_json::json!({ "rating": "reported", "hint": hint.text }),
            ))
        }
        other => Err(AppError::BadRequest(format!("Unknown rating '{}'", other))),
    }
}

/// Returns the hints shown to this student since the last call, as a
/// `hint text -> answer` mapping, then clears the record.
///
/// The frontend calls this when the student finally answers correctly, to
/// offer the hints they used for rating.
pub async fn get_used_hint_answer_data(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path((course_id, block_name)): Path<(i64, String)>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.sub.parse::<i64>().unwrap_or(0);
    let block = resolve_block(&pool, course_id, &block_name).await?;
    ensure_enrolled(&pool, user_id, course_id).await?;

    let mut tx = pool.begin().await?;

    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT text, answer FROM used_hints WHERE block_id = ? AND user_id = ? ORDER BY id",
    )
    .bind(block.id)
    .bind(user_id)
    .fetch_all(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM used_hints WHERE block_id = ? AND user_id = ?")
        .bind(block.id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    let mut data = serde_json::Map::new();
    for (text, answer) in rows {
        data.insert(text, serde_json::Value::String(answer));
    }

    Ok(Json(serde_json::Value::Object(data)))
}

/// Resolves a hinter block from its course and name, 404 when absent.
pub(crate) async fn resolve_block(
    pool: &SqlitePool,
    course_id: i64,
    name: &str,
) -> Result<HinterBlock, AppError> {
    sqlx::query_as::<_, HinterBlock>(
        "SELECT id, course_id, name, created_at FROM hinter_blocks WHERE course_id = ? AND name = ?",
    )
    .bind(course_id)
    .bind(name)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Hinter block not found".to_string()))
}

/// 403 unless the user is enrolled in the course.
pub(crate) async fn ensure_enrolled(
    pool: &SqlitePool,
    user_id: i64,
    course_id: i64,
) -> Result<(), AppError> {
    let enrolled: Option<i64> =
        sqlx::query_scalar("SELECT id FROM enrollments WHERE user_id = ? AND course_id = ?")
            .bind(user_id)
            .bind(course_id)
            .fetch_optional(pool)
            .await?;

    if enrolled.is_none() {
        return Err(AppError::Forbidden(
            "You must be enrolled in this course".to_string(),
        ));
    }

    Ok(())
}
