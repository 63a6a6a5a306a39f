use std::sync::Arc;

use quiz_utils::prompt::{CONNECTION_TEST_PROMPT, explanation_prompt};

use crate::{
    config::EnvVars,
    error::Error,
    generation::{GenerationRequest, ProviderError, TextGenerator},
};

const EXPLANATION_TEMPERATURE: f32 = 0.3;
const CONNECTION_TEST_TEMPERATURE: f32 = 0.1;
const CONNECTION_TEST_MAX_TOKENS: u32 = 16;

/// Asks the generation provider to explain a quiz question.
pub struct ExplanationRequester<G> {
    generator: Arc<G>,
    language: String,
    max_output_tokens: u32,
}

impl<G: TextGenerator> ExplanationRequester<G> {
    pub fn new(generator: Arc<G>, env_vars: &EnvVars) -> Self {
        Self {
            generator,
            language: env_vars.prompt_language.clone(),
            max_output_tokens: env_vars.max_explanation_tokens,
        }
    }

    /// Returns the generated explanation, trimmed.
    ///
    /// Input is validated before the provider is contacted.
    #[tracing::instrument(
        skip_all,
        fields(question_len = question_text.len(), options = options.len()),
        err(Debug)
    )]
    pub async fn generate_explanation(
        &self,
        question_text: &str,
        options: &[String],
        correct_answer: Option<u32>,
    ) -> Result<String, Error> {
        let prompt = explanation_prompt(question_text, options, correct_answer, &self.language)?;

        let explanation = self
            .generator
            .generate(GenerationRequest {
                prompt,
                temperature: EXPLANATION_TEMPERATURE,
                max_output_tokens: self.max_output_tokens,
            })
            .await?;

        let explanation = explanation.trim();
        if explanation.is_empty() {
            return Err(ProviderError::EmptyResponse.into());
        }

        tracing::info!(len = explanation.len(), "explanation generated");
        Ok(explanation.to_string())
    }

    /// Liveness probe. Generated content is discarded.
    #[tracing::instrument(skip_all)]
    pub async fn test_connection(&self) -> bool {
        let result = self
            .generator
            .generate(GenerationRequest {
                prompt: CONNECTION_TEST_PROMPT.to_string(),
                temperature: CONNECTION_TEST_TEMPERATURE,
                max_output_tokens: CONNECTION_TEST_MAX_TOKENS,
            })
            .await;

        match result {
            // Any 2xx reply proves the provider is reachable, even one whose
            // token budget ran out before producing text.
            Ok(_) | Err(ProviderError::EmptyResponse | ProviderError::Malformed(_)) => true,
            Err(e) => {
                tracing::warn!(error = %e, "generation provider connection test failed");
                false
            }
        }
    }
}
