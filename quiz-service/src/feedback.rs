use std::sync::Arc;

use quiz_schema::{Question, UserAttempt};
use quiz_utils::{
    attempt::{count_correct, incorrect_answers, validate_attempt},
    prompt::{PERFECT_SCORE_FEEDBACK, feedback_prompt},
};

use crate::{
    config::EnvVars,
    error::Error,
    generation::{GenerationRequest, ProviderError, TextGenerator},
};

const FEEDBACK_TEMPERATURE: f32 = 0.6;

/// Turns a graded quiz attempt into a personalized study summary (separata).
pub struct FeedbackComposer<G> {
    generator: Arc<G>,
    language: String,
    max_output_tokens: u32,
}

impl<G: TextGenerator> FeedbackComposer<G> {
    pub fn new(generator: Arc<G>, env_vars: &EnvVars) -> Self {
        Self {
            generator,
            language: env_vars.prompt_language.clone(),
            max_output_tokens: env_vars.max_feedback_tokens,
        }
    }

    /// Compares each answer with the question at the same position.
    ///
    /// All correct: returns [`PERFECT_SCORE_FEEDBACK`] without contacting the
    /// provider. Otherwise one provider call covers every missed question.
    #[tracing::instrument(
        skip_all,
        fields(questions = questions.len(), answers = attempt.answers.len()),
        err(Debug)
    )]
    pub async fn generate_feedback(
        &self,
        questions: &[Question],
        attempt: &UserAttempt,
    ) -> Result<String, Error> {
        validate_attempt(questions, attempt)?;

        let missed = incorrect_answers(questions, attempt);
        tracing::info!(
            correct = count_correct(questions, attempt),
            incorrect = missed.len(),
            total = questions.len(),
            score = attempt.score,
            "graded attempt"
        );

        if missed.is_empty() {
            return Ok(PERFECT_SCORE_FEEDBACK.to_string());
        }

        let prompt = feedback_prompt(&missed, &self.language);
        let feedback = self
            .generator
            .generate(GenerationRequest {
                prompt,
                temperature: FEEDBACK_TEMPERATURE,
                max_output_tokens: self.max_output_tokens,
            })
            .await?;

        let feedback = feedback.trim();
        if feedback.is_empty() {
            return Err(ProviderError::EmptyResponse.into());
        }

        tracing::info!(len = feedback.len(), "feedback generated");
        Ok(feedback.to_string())
    }
}
