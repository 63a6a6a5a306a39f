use std::{env::var, fmt, str::FromStr, sync::Arc, time::Duration};

use axum::http::HeaderValue;
use sentry::types::Dsn;
use tracing::{debug, error, warn};

use crate::{
    explanation::ExplanationRequester,
    feedback::FeedbackComposer,
    generation::TextGenerator,
    repository::{QuestionRepository, QuestionStore},
};

/// Shared, immutable request state. Every component is built once at startup.
pub struct AppState<S, G> {
    pub env_vars: Arc<EnvVars>,
    pub questions: Arc<QuestionRepository<S>>,
    pub explanations: Arc<ExplanationRequester<G>>,
    pub feedback: Arc<FeedbackComposer<G>>,
}

impl<S, G> Clone for AppState<S, G> {
    fn clone(&self) -> Self {
        Self {
            env_vars: Arc::clone(&self.env_vars),
            questions: Arc::clone(&self.questions),
            explanations: Arc::clone(&self.explanations),
            feedback: Arc::clone(&self.feedback),
        }
    }
}

impl<S: QuestionStore, G: TextGenerator> AppState<S, G> {
    pub fn new(env_vars: EnvVars, store: S, generator: G) -> Self {
        let generator = Arc::new(generator);
        let questions = QuestionRepository::new(store, &env_vars);
        let explanations = ExplanationRequester::new(Arc::clone(&generator), &env_vars);
        let feedback = FeedbackComposer::new(generator, &env_vars);

        Self {
            env_vars: Arc::new(env_vars),
            questions: Arc::new(questions),
            explanations: Arc::new(explanations),
            feedback: Arc::new(feedback),
        }
    }
}

#[derive(Clone, Debug)]
pub struct EnvVars {
    pub cors_origins: Vec<String>,
    pub database_timeout: Duration,
    pub environment: Environment,
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub max_explanation_tokens: u32,
    pub max_feedback_tokens: u32,
    pub max_questions_per_request: u32,
    pub mongodb_database: Option<String>,
    pub mongodb_uri: String,
    pub port: u16,
    pub prompt_language: String,
    pub provider_timeout: Duration,
    pub questions_collection: String,
    pub request_body_size_limit: usize,
    pub request_timeout: Duration,
    pub sentry_dsn: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "development" => Environment::Development,
            "staging" => Environment::Staging,
            "production" => Environment::Production,
            other => {
                warn!(
                    "ENVIRONMENT value '{}' is not valid. Defaulting to 'production'.",
                    other
                );
                Environment::Production
            }
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        };
        f.write_str(s)
    }
}

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:8080,http://127.0.0.1:8080";

impl EnvVars {
    pub fn new() -> Self {
        Self::from_lookup(|name| var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    ///
    /// Panics on missing required variables or unparseable values, so a
    /// misconfigured process never starts serving.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(mongodb_uri) = lookup("MONGODB_URI") else {
            error!("MONGODB_URI not set");
            panic!("MONGODB_URI required");
        };
        assert!(!mongodb_uri.is_empty(), "MONGODB_URI must not be empty");

        let Some(gemini_api_key) = lookup("GEMINI_API_KEY") else {
            error!("GEMINI_API_KEY not set");
            panic!("GEMINI_API_KEY required");
        };
        assert!(!gemini_api_key.is_empty(), "GEMINI_API_KEY must not be empty");

        let mongodb_database = lookup("MONGODB_DATABASE").filter(|s| !s.is_empty());
        let questions_collection = non_empty_or(&lookup, "QUESTIONS_COLLECTION", "questions");
        let gemini_model = non_empty_or(&lookup, "GEMINI_MODEL", DEFAULT_GEMINI_MODEL);
        let gemini_base_url = non_empty_or(&lookup, "GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        let prompt_language = non_empty_or(&lookup, "PROMPT_LANGUAGE", "Spanish");

        let port = match lookup("PORT") {
            Some(port_string) => port_string.parse().expect("PORT to be parseable as u16"),
            None => {
                let default_port = 8000;
                warn!("PORT not set. Defaulting to {default_port}");
                default_port
            }
        };

        let environment = match lookup("ENVIRONMENT") {
            Some(v) => v.into(),
            None => {
                warn!("ENVIRONMENT not set. Defaulting to 'production'.");
                Environment::Production
            }
        };

        let sentry_dsn = match lookup("SENTRY_DSN") {
            Some(dsn_string) => {
                assert!(
                    valid_sentry_dsn(&dsn_string),
                    "SENTRY_DSN is not valid DSN."
                );
                Some(dsn_string)
            }
            None => {
                warn!("SENTRY_DSN not set.");
                None
            }
        };

        let request_timeout =
            Duration::from_millis(parse_or(&lookup, "REQUEST_TIMEOUT_IN_MS", 30_000));
        let provider_timeout =
            Duration::from_millis(parse_or(&lookup, "PROVIDER_TIMEOUT_IN_MS", 20_000));
        let database_timeout =
            Duration::from_millis(parse_or(&lookup, "DATABASE_TIMEOUT_IN_MS", 5_000));
        let request_body_size_limit = parse_or(&lookup, "REQUEST_BODY_SIZE_LIMIT", 1 << 20);

        let max_questions_per_request = parse_or(&lookup, "MAX_QUESTIONS_PER_REQUEST", 20);
        assert!(
            max_questions_per_request > 0,
            "MAX_QUESTIONS_PER_REQUEST must be greater than 0"
        );
        let max_explanation_tokens = parse_or(&lookup, "MAX_EXPLANATION_TOKENS", 1000);
        let max_feedback_tokens = parse_or(&lookup, "MAX_FEEDBACK_TOKENS", 1500);

        let cors_origins: Vec<String> = non_empty_or(&lookup, "CORS_ORIGINS", DEFAULT_CORS_ORIGINS)
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        for origin in &cors_origins {
            assert!(
                HeaderValue::from_str(origin).is_ok(),
                "CORS_ORIGINS entry '{origin}' is not a valid header value"
            );
        }

        Self {
            cors_origins,
            database_timeout,
            environment,
            gemini_api_key,
            gemini_base_url,
            gemini_model,
            max_explanation_tokens,
            max_feedback_tokens,
            max_questions_per_request,
            mongodb_database,
            mongodb_uri,
            port,
            prompt_language,
            provider_timeout,
            questions_collection,
            request_body_size_limit,
            request_timeout,
            sentry_dsn,
        }
    }
}

fn non_empty_or<F>(lookup: &F, name: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => {
            debug!("{name} not set. Defaulting to {default}");
            default.to_string()
        }
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + fmt::Display,
    T::Err: fmt::Debug,
{
    match lookup(name) {
        Some(v) => match v.trim().parse() {
            Ok(parsed) => parsed,
            Err(e) => panic!("{name} is not a valid unsigned integer: {e:?}"),
        },
        None => {
            debug!("{name} not set. Defaulting to {default}");
            default
        }
    }
}

fn valid_sentry_dsn(url: &str) -> bool {
    url.parse::<Dsn>().is_ok()
}
