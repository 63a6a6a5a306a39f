use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use mongodb::bson::Bson;
use quiz_schema::{Question, QuestionDocument};
use quiz_service::{
    app,
    config::{AppState, EnvVars},
    generation::{GenerationRequest, ProviderError, TextGenerator},
    repository::{QuestionStore, RepositoryError},
};

#[allow(dead_code)]
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub store_calls: Arc<AtomicUsize>,
    pub generator_calls: Arc<AtomicUsize>,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

pub async fn spawn_app(store: InMemoryStore, generator: StubGenerator) -> TestApp {
    spawn_app_with(test_env_vars(&[]), store, generator).await
}

pub async fn spawn_app_with(
    env_vars: EnvVars,
    store: InMemoryStore,
    generator: StubGenerator,
) -> TestApp {
    let store_calls = store.calls.clone();
    let generator_calls = generator.calls.clone();
    let prompts = generator.prompts.clone();

    let router = app(AppState::new(env_vars, store, generator));
    spawn_router(router, |address| TestApp {
        address,
        api_client: reqwest::Client::new(),
        store_calls,
        generator_calls,
        prompts,
    })
    .await
}

/// Serves `router` on a random local port.
#[allow(dead_code)]
pub async fn spawn_router<T>(router: axum::Router, with_address: impl FnOnce(String) -> T) -> T {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    with_address(address)
}

/// Configuration with the required variables filled in, plus `overrides`.
pub fn test_env_vars(overrides: &[(&str, &str)]) -> EnvVars {
    let mut vars: HashMap<String, String> = HashMap::from([
        (
            "MONGODB_URI".to_string(),
            "mongodb://127.0.0.1:27017/quiz".to_string(),
        ),
        ("GEMINI_API_KEY".to_string(), "test-key".to_string()),
        ("ENVIRONMENT".to_string(), "development".to_string()),
        ("PORT".to_string(), "0".to_string()),
    ]);
    for (k, v) in overrides {
        vars.insert(k.to_string(), v.to_string());
    }
    EnvVars::from_lookup(|name| vars.get(name).cloned())
}

#[allow(dead_code)]
pub fn question_doc(id: i32, subject: &str, correct_answer: u32) -> QuestionDocument {
    QuestionDocument {
        id: Bson::Int32(id),
        subject: Some(subject.to_string()),
        question: format!("Question {id}?"),
        options: vec![
            "Option A".to_string(),
            "Option B".to_string(),
            "Option C".to_string(),
            "Option D".to_string(),
        ],
        correct_answer,
    }
}

#[allow(dead_code)]
pub fn question(id: &str, text: &str, options: &[&str], correct_answer: u32) -> Question {
    Question {
        id: id.to_string(),
        subject: None,
        question: text.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        correct_answer,
    }
}

/// In-memory [`QuestionStore`] that counts every query.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    pub documents: Vec<QuestionDocument>,
    pub calls: Arc<AtomicUsize>,
    /// Every query fails as if the database were unreachable.
    pub unavailable: bool,
    /// `sample` ignores `count` and returns every matching document.
    pub oversample: bool,
    /// Every query hangs forever, like a store that never answers.
    pub stalled: bool,
}

#[allow(dead_code)]
impl InMemoryStore {
    pub fn new(documents: Vec<QuestionDocument>) -> Self {
        Self {
            documents,
            ..Default::default()
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    pub fn stalled() -> Self {
        Self {
            stalled: true,
            ..Default::default()
        }
    }

    async fn begin(&self) -> Result<(), RepositoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.stalled {
            std::future::pending::<()>().await;
        }
        if self.unavailable {
            return Err(RepositoryError::Unavailable(
                "connection refused by 10.0.0.12:27017".to_string(),
            ));
        }
        Ok(())
    }

    fn matching<'a>(
        &'a self,
        subject: Option<&'a str>,
    ) -> impl Iterator<Item = &'a QuestionDocument> + 'a {
        self.documents
            .iter()
            .filter(move |d| subject.is_none() || d.subject.as_deref() == subject)
    }
}

impl QuestionStore for InMemoryStore {
    async fn sample(
        &self,
        count: u32,
        subject: Option<&str>,
    ) -> Result<Vec<QuestionDocument>, RepositoryError> {
        self.begin().await?;
        let matching = self.matching(subject).cloned();
        if self.oversample {
            Ok(matching.collect())
        } else {
            Ok(matching.take(count as usize).collect())
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<QuestionDocument>, RepositoryError> {
        self.begin().await?;
        Ok(self
            .documents
            .iter()
            .find(|d| quiz_schema::render_id(&d.id) == id)
            .cloned())
    }

    async fn distinct_subjects(&self) -> Result<Vec<String>, RepositoryError> {
        self.begin().await?;
        Ok(self
            .documents
            .iter()
            .filter_map(|d| d.subject.clone())
            .collect())
    }

    async fn count(&self, subject: Option<&str>) -> Result<u64, RepositoryError> {
        self.begin().await?;
        Ok(self.matching(subject).count() as u64)
    }
}

#[allow(dead_code)]
#[derive(Clone, Debug)]
pub enum Reply {
    Text(String),
    Timeout,
    Status(u16),
    Empty,
    Malformed,
}

/// [`TextGenerator`] returning a canned reply and recording every prompt.
#[derive(Clone)]
pub struct StubGenerator {
    pub reply: Reply,
    pub calls: Arc<AtomicUsize>,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl StubGenerator {
    pub fn replying(text: &str) -> Self {
        Self::with_reply(Reply::Text(text.to_string()))
    }

    pub fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            calls: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl TextGenerator for StubGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.prompt);

        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Timeout => Err(ProviderError::Timeout),
            Reply::Status(status) => Err(ProviderError::Status(*status)),
            Reply::Empty => Err(ProviderError::EmptyResponse),
            Reply::Malformed => Err(ProviderError::Malformed("no candidates".to_string())),
        }
    }
}
