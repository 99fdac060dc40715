use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::{
    attempt::{Attempt, SubmittedAnswer},
    catalog::Test,
};

/// Raw outcome of checking answers against a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub correct_count: usize,
    pub total_questions: usize,
    /// `round(100 * correct / total)`, halves rounded up. 0 for an empty test.
    pub percentage: u8,
}

/// Checks `answers` against the test's key.
///
/// Unanswered questions count as wrong, answers to questions outside the key
/// are ignored, and when a question is answered twice the last answer counts.
pub fn score_answers(test: &Test, answers: &[SubmittedAnswer]) -> Score {
    let total_questions = test.questions.len();

    if total_questions == 0 {
        return Score {
            correct_count: 0,
            total_questions,
            percentage: 0,
        };
    }

    let selected: HashMap<&str, &str> = answers
        .iter()
        .map(|a| (a.question_id.as_str(), a.selected_option_id.as_str()))
        .collect();

    let correct_count = test
        .questions
        .iter()
        .filter(|q| selected.get(q.id.as_str()) == Some(&q.correct_option_id.as_str()))
        .count();

    // Integer form of round-half-up, avoids float drift at exact halves.
    let percentage = (200 * correct_count + total_questions) / (2 * total_questions);

    Score {
        correct_count,
        total_questions,
        percentage: percentage.min(100) as u8,
    }
}

/// Builds the immutable attempt record for a submission.
pub fn grade_attempt(
    test: &Test,
    answers: Vec<SubmittedAnswer>,
    attempted_at: DateTime<Utc>,
) -> Attempt {
    let score = score_answers(test, &answers);

    Attempt {
        test_id: test.id.clone(),
        course_id: test.course_id.clone(),
        answers,
        correct_count: score.correct_count,
        total_questions: score.total_questions,
        score_percentage: score.percentage,
        passed: score.percentage >= test.passing_percentage,
        attempted_at,
    }
}
