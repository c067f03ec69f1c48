//! # Compatibility scoring
//!
//! Two users answer the same questionnaire on a `0..=3` scale. For every question
//! both of them answered, the similarity is `(1 - |a - b| / 3) * 100`; the score is
//! the mean similarity over those shared questions, rounded to the nearest integer
//! with halves rounding up.
//!
//! Answers are matched by `question_id`, never by position, so the score is
//! symmetric and unaffected by the order or sparseness of either answer set.
//! When a set repeats a `question_id` the first occurrence counts.

use std::collections::{HashMap, HashSet};

use crate::models::{Answer, MAX_ANSWER};

/// Compatibility score in `0..=100` between two answer sets.
///
/// Returns 0 when either set is empty or the sets share no question.
pub fn compatibility(mine: &[Answer], theirs: &[Answer]) -> u8 {
    if mine.is_empty() || theirs.is_empty() {
        return 0;
    }

    let mut by_question: HashMap<u32, u8> = HashMap::with_capacity(theirs.len());
    for answer in theirs {
        by_question.entry(answer.question_id).or_insert(answer.answer);
    }

    let mut seen = HashSet::with_capacity(mine.len());
    let mut compared: u64 = 0;
    let mut closeness: u64 = 0;
    for answer in mine {
        if !seen.insert(answer.question_id) {
            continue;
        }
        let Some(&other) = by_question.get(&answer.question_id) else {
            continue;
        };
        let diff = answer.answer.abs_diff(other).min(MAX_ANSWER);
        compared += 1;
        closeness += u64::from(MAX_ANSWER - diff);
    }

    if compared == 0 {
        return 0;
    }

    // mean of closeness_i / 3 * 100, i.e. 100 * closeness / (3 * compared), rounded half up
    let scale = u64::from(MAX_ANSWER);
    let score = (200 * closeness + scale * compared) / (2 * scale * compared);
    score.min(100) as u8
}
