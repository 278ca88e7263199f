// src/handlers/staff.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::hint::{AnswerHintSummary, HintTally, UnreportHintRequest},
    utils::answer::normalize_answer,
};

/// Row shape for the tally query.
#[derive(sqlx::FromRow)]
struct TallyRow {
    answer: String,
    text: String,
    rating: i64,
    reported: bool,
}

/// Full hint tally for a block, grouped per answer with hints best-first.
/// Reported hints are included: they are hidden from students, not gone.
/// Staff only.
pub async fn list_hints(
    State(pool): State<SqlitePool>,
    Path((course_id, block_name)): Path<(i64, String)>,
) -> Result<impl IntoResponse, AppError> {
    let block = super::hinter::resolve_block(&pool, course_id, &block_name).await?;

    let rows = sqlx::query_as::<_, TallyRow>(
        r#"
        SELECT answer, text, rating, reported
        FROM hints
        WHERE block_id = ?
        ORDER BY answer ASC, rating DESC, id ASC
        "#,
    )
    .bind(block.id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch hint tally: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let mut summaries: Vec<AnswerHintSummary> = Vec::new();
    for row in rows {
        let tally = HintTally {
            text: row.text,
            rating: row.rating,
            reported: row.reported,
        };
        match summaries.last_mut() {
            Some(summary) if summary.answer == row.answer => summary.hints.push(tally),
            _ => summaries.push(AnswerHintSummary {
                answer: row.answer,
                hints: vec![tally],
            }),
        }
    }

    Ok(Json(summaries))
}

/// Clears the reported flag on a hint, restoring it to best-hint
/// eligibility.
/// Staff only.
pub async fn unreport_hint(
    State(pool): State<SqlitePool>,
    Path((course_id, block_name)): Path<(i64, String)>,
    Json(payload): Json<UnreportHintRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let block = super::hinter::resolve_block(&pool, course_id, &block_name).await?;
    let answer = normalize_answer(&payload.answer);

    let result = sqlx::query(
        "UPDATE hints SET reported = FALSE WHERE block_id = ? AND answer = ? AND text = ?",
    )
    .bind(block.id)
    .bind(&answer)
    .bind(&payload.hint)
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("No such hint for that answer".to_string()));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}
