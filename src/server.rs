use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, info_span, warn, Instrument};

use crate::config::Config;
use crate::llm::GenerateError;
use crate::pipeline::{Pipeline, PipelineError};
use crate::pr::PublishError;
use crate::request::{DraftRequest, RequestError};

/// Shared by all requests: the configured defaults and the pipeline that
/// owns the checkout.
pub struct AppState {
    pub defaults: Config,
    pub pipeline: Pipeline,
}

#[derive(Debug, Serialize)]
struct CreatePrResponse {
    status: &'static str,
    pr_url: String,
    pr_number: u64,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/create-pr", post(create_pr))
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router(state)).await
}

async fn create_pr(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DraftRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    match run_request(&state, body).await {
        Ok(created) => Json(created).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn run_request(
    state: &AppState,
    body: DraftRequest,
) -> Result<CreatePrResponse, PipelineError> {
    let request = body.resolve(&state.defaults)?;
    let span = info_span!("create_pr", owner = %request.owner, repo = %request.repository, branch = %request.branch);

    let published = state.pipeline.run(&request).instrument(span).await?;
    Ok(CreatePrResponse {
        status: "success",
        pr_url: published.pull_request.html_url,
        pr_number: published.pull_request.number,
    })
}

/// Unreadable bodies get axum's status with the same `{"detail"}` shape.
fn rejection_response(rejection: JsonRejection) -> Response {
    let status = rejection.status();
    let detail = rejection.body_text();
    warn!(status = status.as_u16(), error = %detail, "request body rejected");
    (status, Json(json!({ "detail": detail }))).into_response()
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "request rejected");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// HTTP status for a failed run. Upstream error statuses pass through.
fn status_for(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::Request(RequestError::MissingField(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::Request(RequestError::UnsupportedProvider(_)) => StatusCode::BAD_REQUEST,
        PipelineError::Git(_) | PipelineError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        PipelineError::Generate(GenerateError::Status { status, .. })
        | PipelineError::Publish(PublishError::Status { status, .. }) => upstream_status(*status),
        PipelineError::Generate(GenerateError::MissingContent { .. }) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        PipelineError::Generate(GenerateError::Transport(_))
        | PipelineError::Publish(PublishError::ApiRequest(_))
        | PipelineError::Publish(PublishError::InvalidResponse { .. }) => StatusCode::BAD_GATEWAY,
    }
}

fn upstream_status(status: u16) -> StatusCode {
    StatusCode::from_u16(status)
        .ok()
        .filter(|code| code.is_client_error() || code.is_server_error())
        .unwrap_or(StatusCode::BAD_GATEWAY)
}
