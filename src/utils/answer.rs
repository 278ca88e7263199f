// src/utils/answer.rs

use url::form_urlencoded;

/// Extracts the answer text from a raw problem submission.
///
/// The frontend forwards the submission exactly as the problem input posted
/// it, i.e. a form-encoded pair like `ans=incorrect+answer+1`. The answer is
/// the value part, percent/plus decoded; submissions without a `=` are
/// treated as a bare answer string.
///
/// Returns `None` when nothing usable remains after decoding.
pub fn parse_submitted_answer(raw: &str) -> Option<String> {
    let (key, value) = form_urlencoded::parse(raw.as_bytes()).next()?;

    let decoded = if raw.contains('=') { value } else { key };

    let answer = normalize_answer(&decoded);
    if answer.is_empty() { None } else { Some(answer) }
}

/// Normalizes an answer for use as a hint key.
///
/// Keys are case-insensitive so that e.g. 'Incorrect Answer' and
/// 'incorrect answer' share one hint pool.
pub fn normalize_answer(answer: &str) -> String {
    answer.trim().to_lowercase()
}
