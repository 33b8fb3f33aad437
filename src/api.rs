use std::sync::Arc;

use anyhow::{Error, Result};
use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    clients::{health::HealthChecker, store::EventStore},
    config::Config,
    intake::{BookingRequest, Intake, MessageRequest, ReplyRequest, ReviewRequest},
    models::{event::Event, health::HealthStatus, response::ApiResponse},
};

pub struct AppState {
    pub intake: Intake,
    pub store: Arc<dyn EventStore>,
    pub health_checker: HealthChecker,
}

pub async fn run_api_server(config: &Config, state: Arc<AppState>) -> Result<(), Error> {
    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = TcpListener::bind(&addr).await?;

    info!(address = %addr, "Intake API server started");

    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/bookings", post(submit_booking))
        .route("/messages", post(submit_message))
        .route("/reviews", post(submit_review))
        .route("/events/{id}", get(get_event))
        .route("/events/{id}/reply", post(submit_reply))
        .route("/events/{id}/retry", post(retry_event))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn submit_booking(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BookingRequest>,
) -> impl IntoResponse {
    match state.intake.submit_booking(request).await {
        Ok(event) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(event, "Booking received".to_string())),
        ),
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::error(
                e.to_string(),
                "Booking could not be saved".to_string(),
            )),
        ),
    }
}

async fn submit_message(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MessageRequest>,
) -> impl IntoResponse {
    match state.intake.submit_message(request).await {
        Ok(event) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(event, "Message received".to_string())),
        ),
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::error(
                e.to_string(),
                "Message could not be saved".to_string(),
            )),
        ),
    }
}

async fn submit_review(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReviewRequest>,
) -> impl IntoResponse {
    match state.intake.submit_review(request).await {
        Ok(event) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(event, "Review received".to_string())),
        ),
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::error(
                e.to_string(),
                "Review could not be saved".to_string(),
            )),
        ),
    }
}

async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.get(&id).await {
        Ok(Some(event)) => (
            StatusCode::OK,
            Json(ApiResponse::success(event, "Event found".to_string())),
        ),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<Event>::error(
                format!("No event with id {}", id),
                "Event not found".to_string(),
            )),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<Event>::error(
                e.to_string(),
                "Event lookup failed".to_string(),
            )),
        ),
    }
}

async fn submit_reply(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<ReplyRequest>,
) -> impl IntoResponse {
    match state.intake.submit_reply(&id, request).await {
        Ok(event) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(event, "Reply enqueued".to_string())),
        ),
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::error(
                e.to_string(),
                "Reply could not be saved".to_string(),
            )),
        ),
    }
}

async fn retry_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.intake.retry_event(&id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(ApiResponse::<Event>::success_empty(
                "Event re-queued for dispatch".to_string(),
            )),
        ),
        Ok(false) => (
            StatusCode::CONFLICT,
            Json(ApiResponse::<Event>::error(
                "Event is not in a failed state".to_string(),
                "Only failed events can be retried".to_string(),
            )),
        ),
        Err(e) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<Event>::error(
                e.to_string(),
                "Event not found".to_string(),
            )),
        ),
    }
}

async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_checker.check_all().await;

    let status_code = match health.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}
