//! Quiz service: random quiz questions from MongoDB, AI-generated explanations
//! and personalized feedback for quiz attempts.
use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use tower_http::{
    LatencyUnit,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

pub mod config;
pub mod db;
pub mod error;
pub mod explanation;
pub mod feedback;
pub mod generation;
pub mod repository;
pub mod routes;

use config::AppState;
use generation::TextGenerator;
use repository::QuestionStore;

/// Builds the full HTTP application: `/api/v1` routes plus health endpoints.
pub fn app<S: QuestionStore, G: TextGenerator>(state: AppState<S, G>) -> Router {
    let env_vars = state.env_vars.clone();

    let api = Router::new()
        .route("/questions", get(routes::get_random_questions::<S, G>))
        .route("/questions/subjects", get(routes::get_subjects::<S, G>))
        .route("/questions/count", get(routes::get_question_count::<S, G>))
        .route("/questions/{id}", get(routes::get_question::<S, G>))
        .route(
            "/explanations/generate",
            post(routes::post_explanation::<S, G>),
        )
        .route(
            "/explanations/test",
            get(routes::get_explanation_test::<S, G>),
        )
        .route("/feedback/generate", post(routes::post_feedback::<S, G>));

    let origins: Vec<HeaderValue> = env_vars
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::get_root::<S, G>))
        .route("/status/ping", get(routes::get_status_ping))
        .nest("/api/v1", api)
        .fallback(routes::fallback)
        .layer(cors)
        .layer(TimeoutLayer::new(env_vars.request_timeout))
        .layer(RequestBodyLimitLayer::new(env_vars.request_body_size_limit))
        .layer(middleware::map_response(error::json_error_bodies))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Micros),
                ),
        )
        .with_state(state)
}
