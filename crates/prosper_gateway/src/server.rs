use crate::types::{EngagementResponse, ErrorBody, ReportResponse, SuggestionsResponse};
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use prosper_core::prelude::*;
use prosper_core::User;
use prosper_engagement::{EngagementClassifier, SuggestionGenerator};
use prosper_reasoning::HolisticReporter;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared state for the route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
    pub classifier: Arc<EngagementClassifier>,
    pub generator: Arc<SuggestionGenerator>,
    pub reporter: Arc<HolisticReporter>,
}

/// The HTTP server.
///
/// - `GET /health`
/// - `POST /functions/analyzeUserEngagement`
/// - `POST /functions/generateGideonProactiveSuggestions`
/// - `POST /functions/generateHolisticProgressReport` (Bearer token)
pub struct GatewayServer {
    state: AppState,
    host: String,
    port: u16,
}

impl GatewayServer {
    pub fn new(state: AppState, host: &str, port: u16) -> Self {
        Self {
            state,
            host: host.to_string(),
            port,
        }
    }

    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/functions/analyzeUserEngagement", post(analyze_engagement))
            .route(
                "/functions/generateGideonProactiveSuggestions",
                post(generate_suggestions),
            )
            .route(
                "/functions/generateHolisticProgressReport",
                post(generate_report),
            )
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Bind and serve until the process ends.
    pub async fn serve(self) -> Result<()> {
        let addr = format!("{}:{}", self.host, self.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Gateway failed to bind {}", addr))?;
        tracing::info!("Gateway listening on {}", addr);
        axum::serve(listener, Self::router(self.state))
            .await
            .context("Gateway server error")
    }
}

// ============================================================================
// Route handlers
// ============================================================================

async fn health() -> &'static str {
    "ok"
}

fn internal_error(job: &str, err: &JobError) -> Response {
    tracing::error!("{} failed: {}", job, err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::with_details(format!("{} failed", job), err.to_string())),
    )
        .into_response()
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(ErrorBody::new("Unauthorized"))).into_response()
}

async fn analyze_engagement(State(state): State<AppState>) -> Response {
    match state.classifier.run().await {
        Ok(run) => Json(EngagementResponse::from(run)).into_response(),
        Err(e) => internal_error("Engagement analysis", &e),
    }
}

async fn generate_suggestions(State(state): State<AppState>) -> Response {
    match state.generator.run().await {
        Ok(run) => Json(SuggestionsResponse::from(run)).into_response(),
        Err(e) => internal_error("Suggestion generation", &e),
    }
}

async fn generate_report(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = match authenticate(state.store.as_ref(), &headers).await {
        Ok(user) => user,
        Err(JobError::Unauthorized) => return unauthorized(),
        Err(e) => return internal_error("Authentication", &e),
    };

    match state.reporter.generate(&user.email, Utc::now()).await {
        Ok(report) => Json(ReportResponse {
            success: true,
            report,
        })
        .into_response(),
        Err(e) => internal_error("Report generation", &e),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve the caller from the `Authorization: Bearer` header.
pub async fn authenticate(store: &dyn EntityStore, headers: &HeaderMap) -> Result<Stored<User>, JobError> {
    let token = bearer_token(headers).ok_or(JobError::Unauthorized)?;
    Entities::new(store)
        .first::<User>(Query::new().eq("api_token", token))
        .await?
        .ok_or(JobError::Unauthorized)
}
