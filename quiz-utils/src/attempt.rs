use quiz_schema::{Question, UserAttempt};

use crate::error::Error;

/// A question the user answered incorrectly, with the option they picked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MissedQuestion<'q> {
    /// 1-based position in the quiz.
    pub position: usize,
    pub question: &'q Question,
    pub chosen_answer: u32,
}

impl MissedQuestion<'_> {
    pub fn correct_option(&self) -> Option<&str> {
        option_text(self.question, self.question.correct_answer)
    }

    pub fn chosen_option(&self) -> Option<&str> {
        option_text(self.question, self.chosen_answer)
    }
}

fn option_text(question: &Question, index: u32) -> Option<&str> {
    question.options.get(index as usize).map(String::as_str)
}

/// Checks that an attempt can be graded against `questions`:
/// - there is at least one question
/// - `answers` and `total_questions` both match the number of questions
/// - `score` does not exceed `total_questions`
/// - every question has at least two options and a correct answer within them
pub fn validate_attempt(questions: &[Question], attempt: &UserAttempt) -> Result<(), Error> {
    if questions.is_empty() {
        return Err(Error::InvalidAttempt(
            "question list must not be empty".to_string(),
        ));
    }

    if attempt.answers.len() != questions.len() {
        return Err(Error::InvalidAttempt(format!(
            "number of answers ({}) does not match number of questions ({})",
            attempt.answers.len(),
            questions.len()
        )));
    }

    if attempt.total_questions as usize != questions.len() {
        return Err(Error::InvalidAttempt(format!(
            "total_questions ({}) does not match number of questions ({})",
            attempt.total_questions,
            questions.len()
        )));
    }

    if attempt.score > attempt.total_questions {
        return Err(Error::InvalidAttempt(format!(
            "score ({}) exceeds total_questions ({})",
            attempt.score, attempt.total_questions
        )));
    }

    for question in questions {
        validate_question(question)?;
    }

    Ok(())
}

pub fn validate_question(question: &Question) -> Result<(), Error> {
    if question.question.trim().is_empty() {
        return Err(Error::InvalidQuestion(format!(
            "question {} has no text",
            question.id
        )));
    }
    if question.options.len() < 2 {
        return Err(Error::InvalidQuestion(format!(
            "question {} must have at least two options",
            question.id
        )));
    }
    if question.correct_answer as usize >= question.options.len() {
        return Err(Error::InvalidQuestion(format!(
            "question {} correct_answer {} is out of range",
            question.id, question.correct_answer
        )));
    }
    Ok(())
}

/// Pairs every question with the answer at the same position and keeps the
/// ones where the answer differs from `correct_answer`.
///
/// Callers are expected to have run [`validate_attempt`]; surplus answers or
/// questions are ignored.
pub fn incorrect_answers<'q>(
    questions: &'q [Question],
    attempt: &UserAttempt,
) -> Vec<MissedQuestion<'q>> {
    questions
        .iter()
        .zip(&attempt.answers)
        .enumerate()
        .filter(|(_, (question, answer))| question.correct_answer != **answer)
        .map(|(i, (question, answer))| MissedQuestion {
            position: i + 1,
            question,
            chosen_answer: *answer,
        })
        .collect()
}

pub fn count_correct(questions: &[Question], attempt: &UserAttempt) -> usize {
    questions
        .iter()
        .zip(&attempt.answers)
        .filter(|(question, answer)| question.correct_answer == **answer)
        .count()
}
