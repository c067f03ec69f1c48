//! Saving the compatibility questionnaire.
//!
//! Clients send the raw answer array; each element may be a number or a numeric
//! string. Element `i` becomes the answer to question `i`.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use store::{Answer, MAX_ANSWER};
use tracing::info;

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SaveAnswersRequest {
    pub answers: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct SaveAnswersResponse {
    pub success: bool,
    pub message: String,
    pub answers: Vec<Answer>,
}

/// Leading integer of `s`, ignoring surrounding whitespace and trailing junk:
/// `"2"`, `" 3 "` and `"1.9"` parse, `"abc"` does not.
fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

fn parse_answer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => leading_integer(s),
        _ => None,
    }
}

/// Validate the submitted array into answers keyed by position.
pub fn parse_answers(raw: &[Value]) -> ApiResult<Vec<Answer>> {
    raw.iter()
        .enumerate()
        .map(|(index, value)| {
            let answer = parse_answer(value)
                .filter(|n| (0..=i64::from(MAX_ANSWER)).contains(n))
                .ok_or_else(|| {
                    ApiError::BadRequest(format!(
                        "Invalid answer at index {index}: expected an integer from 0 to {MAX_ANSWER}"
                    ))
                })?;
            let question_id = u32::try_from(index)
                .map_err(|_| ApiError::BadRequest("Too many answers".to_string()))?;
            // range checked above
            Ok(Answer::new(question_id, answer as u8))
        })
        .collect()
}

pub async fn save_answers(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<SaveAnswersRequest>, JsonRejection>,
) -> ApiResult<Json<SaveAnswersResponse>> {
    let Json(request) =
        payload.map_err(|_| ApiError::BadRequest("Invalid answers format".to_string()))?;
    let answers = parse_answers(&request.answers)?;

    let user = state.store.save_answers(user.id, answers).await?;
    info!(user_id = %user.id, count = user.answers.len(), "saved compatibility answers");

    Ok(Json(SaveAnswersResponse {
        success: true,
        message: "Compatibility test saved successfully".to_string(),
        answers: user.answers,
    }))
}
