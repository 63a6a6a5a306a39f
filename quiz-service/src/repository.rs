use std::{collections::BTreeSet, future::Future, time::Duration};

use quiz_schema::{Question, QuestionDocument};

use crate::{config::EnvVars, error::Error};

#[derive(thiserror::Error, Debug)]
pub enum RepositoryError {
    #[error("question store did not answer within {0:?}")]
    Timeout(Duration),
    #[error("{0}")]
    Unavailable(String),
    // Froms
    #[error("{0}")]
    MongoDB(#[from] mongodb::error::Error),
}

/// Read-only queries against the document store holding quiz questions.
pub trait QuestionStore: Send + Sync + 'static {
    /// Up to `count` randomly chosen documents, optionally restricted to `subject`.
    fn sample(
        &self,
        count: u32,
        subject: Option<&str>,
    ) -> impl Future<Output = Result<Vec<QuestionDocument>, RepositoryError>> + Send;

    fn find_by_id(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<QuestionDocument>, RepositoryError>> + Send;

    /// Subject values across all documents. May contain duplicates.
    fn distinct_subjects(
        &self,
    ) -> impl Future<Output = Result<Vec<String>, RepositoryError>> + Send;

    fn count(
        &self,
        subject: Option<&str>,
    ) -> impl Future<Output = Result<u64, RepositoryError>> + Send;
}

/// Validates question queries and shapes stored documents into [`Question`]s.
pub struct QuestionRepository<S> {
    store: S,
    max_questions: u32,
    timeout: Duration,
}

impl<S: QuestionStore> QuestionRepository<S> {
    pub fn new(store: S, env_vars: &EnvVars) -> Self {
        Self {
            store,
            max_questions: env_vars.max_questions_per_request,
            timeout: env_vars.database_timeout,
        }
    }

    pub fn max_questions(&self) -> u32 {
        self.max_questions
    }

    /// Returns at most `count` random questions.
    ///
    /// An unknown subject is a `NotFound`; an empty store without a subject
    /// filter yields an empty list.
    #[tracing::instrument(skip_all, fields(count = count, subject = ?subject), err(Debug))]
    pub async fn get_random_questions(
        &self,
        count: i64,
        subject: Option<&str>,
    ) -> Result<Vec<Question>, Error> {
        let max = self.max_questions;
        let count = u32::try_from(count)
            .ok()
            .filter(|c| (1..=max).contains(c))
            .ok_or_else(|| {
                Error::Validation(format!("count must be an integer between 1 and {max}"))
            })?;

        let subject = normalize(subject);
        let documents = self.bounded(self.store.sample(count, subject)).await?;

        if documents.is_empty() {
            if let Some(subject) = subject {
                tracing::warn!("no questions found for subject");
                return Err(Error::NotFound(format!(
                    "no questions found for subject '{subject}'"
                )));
            }
        }

        let mut questions: Vec<Question> = documents.into_iter().map(Question::from).collect();
        questions.truncate(count as usize);

        tracing::info!(returned = questions.len(), "sampled random questions");
        Ok(questions)
    }

    #[tracing::instrument(skip_all, fields(id = %id), err(Debug))]
    pub async fn get_question_by_id(&self, id: &str) -> Result<Question, Error> {
        let id = id.trim();
        if id.is_empty() {
            return Err(Error::Validation("question id must not be empty".to_string()));
        }

        match self.bounded(self.store.find_by_id(id)).await? {
            Some(document) => Ok(Question::from(document)),
            None => {
                tracing::warn!("question not found");
                Err(Error::NotFound(format!("question '{id}' not found")))
            }
        }
    }

    /// Sorted, de-duplicated, non-blank subjects.
    #[tracing::instrument(skip_all, err(Debug))]
    pub async fn list_subjects(&self) -> Result<Vec<String>, Error> {
        let subjects: BTreeSet<String> = self
            .bounded(self.store.distinct_subjects())
            .await?
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        tracing::info!(subjects = subjects.len(), "listed subjects");
        Ok(subjects.into_iter().collect())
    }

    #[tracing::instrument(skip_all, fields(subject = ?subject), err(Debug))]
    pub async fn count_questions(&self, subject: Option<&str>) -> Result<u64, Error> {
        let count = self.bounded(self.store.count(normalize(subject))).await?;
        tracing::info!(count, "counted questions");
        Ok(count)
    }

    async fn bounded<T, F>(&self, query: F) -> Result<T, RepositoryError>
    where
        F: Future<Output = Result<T, RepositoryError>>,
    {
        tokio::time::timeout(self.timeout, query)
            .await
            .map_err(|_| RepositoryError::Timeout(self.timeout))?
    }
}

fn normalize(subject: Option<&str>) -> Option<&str> {
    subject.map(str::trim).filter(|s| !s.is_empty())
}
