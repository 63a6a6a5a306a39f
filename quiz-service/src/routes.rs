use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use quiz_schema::{Question, UserAttempt};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    config::AppState, error::Error, generation::TextGenerator, repository::QuestionStore,
};

pub const DEFAULT_QUESTION_COUNT: i64 = 5;

#[derive(Debug, Deserialize)]
pub struct RandomQuestionsQuery {
    pub count: Option<i64>,
    pub subject: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubjectQuery {
    pub subject: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubjectsResponse {
    pub subjects: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CountResponse {
    pub total_questions: u64,
    pub subject: Option<String>,
    pub filtered: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExplanationRequest {
    pub question_text: String,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub correct_answer: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExplanationResponse {
    pub explanation: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub ok: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub questions: Vec<Question>,
    pub user_attempt: UserAttempt,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub feedback: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub message: String,
    pub version: String,
    pub environment: String,
    pub status: String,
}

pub async fn get_random_questions<S: QuestionStore, G: TextGenerator>(
    State(state): State<AppState<S, G>>,
    query: Result<Query<RandomQuestionsQuery>, QueryRejection>,
) -> Result<Json<Vec<Question>>, Error> {
    let Query(query) = query?;
    let count = query.count.unwrap_or(DEFAULT_QUESTION_COUNT);

    let questions = state
        .questions
        .get_random_questions(count, query.subject.as_deref())
        .await?;
    Ok(Json(questions))
}

pub async fn get_question<S: QuestionStore, G: TextGenerator>(
    State(state): State<AppState<S, G>>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<Question>, Error> {
    let Path(id) = id?;
    let question = state.questions.get_question_by_id(&id).await?;
    Ok(Json(question))
}

pub async fn get_subjects<S: QuestionStore, G: TextGenerator>(
    State(state): State<AppState<S, G>>,
) -> Result<Json<SubjectsResponse>, Error> {
    let subjects = state.questions.list_subjects().await?;
    Ok(Json(SubjectsResponse { subjects }))
}

pub async fn get_question_count<S: QuestionStore, G: TextGenerator>(
    State(state): State<AppState<S, G>>,
    query: Result<Query<SubjectQuery>, QueryRejection>,
) -> Result<Json<CountResponse>, Error> {
    let Query(query) = query?;
    let subject = query
        .subject
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let total_questions = state.questions.count_questions(subject.as_deref()).await?;
    Ok(Json(CountResponse {
        total_questions,
        filtered: subject.is_some(),
        subject,
    }))
}

pub async fn post_explanation<S: QuestionStore, G: TextGenerator>(
    State(state): State<AppState<S, G>>,
    request: Result<Json<ExplanationRequest>, JsonRejection>,
) -> Result<Json<ExplanationResponse>, Error> {
    let Json(request) = request?;

    let explanation = state
        .explanations
        .generate_explanation(
            &request.question_text,
            request.options.as_deref().unwrap_or_default(),
            request.correct_answer,
        )
        .await?;
    Ok(Json(ExplanationResponse { explanation }))
}

pub async fn get_explanation_test<S: QuestionStore, G: TextGenerator>(
    State(state): State<AppState<S, G>>,
) -> Json<ConnectionStatus> {
    let ok = state.explanations.test_connection().await;
    info!(ok, "generation provider connection test");
    Json(ConnectionStatus { ok })
}

pub async fn post_feedback<S: QuestionStore, G: TextGenerator>(
    State(state): State<AppState<S, G>>,
    request: Result<Json<FeedbackRequest>, JsonRejection>,
) -> Result<Json<FeedbackResponse>, Error> {
    let Json(request) = request?;

    let feedback = state
        .feedback
        .generate_feedback(&request.questions, &request.user_attempt)
        .await?;
    Ok(Json(FeedbackResponse { feedback }))
}

pub async fn get_root<S: QuestionStore, G: TextGenerator>(
    State(state): State<AppState<S, G>>,
) -> Json<ServiceStatus> {
    Json(ServiceStatus {
        message: "Welcome to the quiz service!".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.env_vars.environment.to_string(),
        status: "healthy".to_string(),
    })
}

pub async fn get_status_ping() -> impl IntoResponse {
    info!("Status");
    StatusCode::OK
}

pub async fn fallback() -> Error {
    Error::NotFound("route not found".to_string())
}
