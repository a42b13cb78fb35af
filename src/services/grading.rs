use std::collections::{HashMap, HashSet};

use crate::{
    errors::{AppError, AppResult},
    models::domain::{quiz_attempt::UserAnswer, Quiz},
};

/// Rejects submissions that answer the same question more than once, so the
/// stored answers form a mapping and the score cannot exceed the quiz size.
pub fn ensure_distinct_questions(answers: &[UserAnswer]) -> AppResult<()> {
    let mut seen = HashSet::with_capacity(answers.len());
    for answer in answers {
        if !seen.insert(answer.question.as_str()) {
            return Err(AppError::ValidationError(format!(
                "Question '{}' is answered more than once.",
                answer.question
            )));
        }
    }
    Ok(())
}

/// Distinct submitted question ids that belong to `quiz`, in submission order.
/// Anything else cannot earn points and is not worth looking up.
pub fn scorable_question_ids(quiz: &Quiz, answers: &[UserAnswer]) -> Vec<String> {
    let mut seen = HashSet::new();
    answers
        .iter()
        .filter(|a| quiz.contains_question(&a.question))
        .filter(|a| seen.insert(a.question.as_str()))
        .map(|a| a.question.clone())
        .collect()
}

/// Counts answers that exactly match the authoritative answer: case-sensitive,
/// no trimming. Questions outside the quiz or without an answer key count 0.
pub fn grade_answers(quiz: &Quiz, answers: &[UserAnswer], keys: &HashMap<String, String>) -> u32 {
    let mut credited = HashSet::new();

    for answer in answers {
        if !quiz.contains_question(&answer.question) {
            continue;
        }
        let Some(correct) = keys.get(&answer.question) else {
            continue;
        };
        if *correct == answer.answer {
            credited.insert(answer.question.as_str());
        }
    }

    credited.len() as u32
}
