use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{HeaderValue, Method, Request, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use std::{path::PathBuf, sync::Arc};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{
    models::{GenerationRequest, GenerationResult, Mode, SaveRequest},
    output::{copy_to_clipboard, resolve_target, save_markup, OutputError},
    pipeline::Pipeline,
    slot::ResultSlot,
};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub slot: Arc<ResultSlot>,
    pub output_dir: PathBuf,
    pub expander_model: String,
    pub generator_model: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/generate", post(submit_generation))
        .route("/api/generate/wait", post(generate_and_wait))
        .route("/api/result", get(current_result))
        .route("/api/save", post(save_result))
        .route("/api/copy", post(copy_result))
        .layer(middleware::from_fn(reject_foreign_origin))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
                    origin.to_str().is_ok_and(is_local_origin)
                }))
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE])
        )
        .with_state(state)
}

/// `http(s)://localhost`, `127.0.0.1` or `[::1]`, any port.
pub fn is_local_origin(origin: &str) -> bool {
    let Some(authority) = origin
        .strip_prefix("http://")
        .or_else(|| origin.strip_prefix("https://"))
    else {
        return false;
    };
    let host = if authority.starts_with('[') {
        authority.split_inclusive(']').next().unwrap_or_default()
    } else {
        authority.split(':').next().unwrap_or_default()
    };
    let rest = &authority[host.len()..];
    let port_ok = rest.is_empty()
        || rest.strip_prefix(':').is_some_and(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
    port_ok && matches!(host, "localhost" | "127.0.0.1" | "[::1]")
}

// Any request carrying a non-local `Origin` is refused, including ones that skip the preflight.
async fn reject_foreign_origin(request: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let origin = request.headers().get(header::ORIGIN).map(|o| o.to_str().unwrap_or_default());
    match origin {
        Some(origin) if !is_local_origin(origin) => {
            tracing::warn!("🚫 Refusing {} {} from origin {}", request.method(), request.uri().path(), origin);
            Err(StatusCode::FORBIDDEN)
        }
        _ => Ok(next.run(request).await),
    }
}

fn status_response(code: StatusCode, status: impl Into<String>) -> Response {
    (code, Json(json!({ "status": status.into() }))).into_response()
}

fn running_status(mode: Mode) -> &'static str {
    match mode {
        Mode::Direct => "⏳ Generating with LLM Alpha...",
        Mode::TwoStage => "⏳ Expanding your idea...",
    }
}

async fn run_and_publish(state: &AppState, seq: u64, request: GenerationRequest) -> GenerationResult {
    let outcome = state.pipeline.run(&request).await;
    let result = GenerationResult::from_outcome(seq, request.mode, outcome);
    if state.slot.complete(result.clone()) {
        tracing::info!("✅ Request #{} finished (success: {})", seq, result.is_success());
    } else {
        tracing::info!("⏭️ Request #{} finished after a newer submission; result dropped", seq);
    }
    result
}

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "expander_model": state.expander_model,
        "generator_model": state.generator_model,
    }))
}

/// Starts a background run and answers immediately; poll `/api/result` for the outcome.
pub async fn submit_generation(State(state): State<AppState>, Json(body): Json<GenerationRequest>) -> Response {
    if let Err(e) = Pipeline::validate(&body.raw_prompt) {
        return status_response(StatusCode::BAD_REQUEST, format!("⚠️ {e}"));
    }

    let mode = body.mode;
    let seq = state.slot.begin(mode);
    tracing::info!("🎯 Request #{} submitted ({})", seq, mode.label());

    tokio::spawn(async move {
        run_and_publish(&state, seq, body).await;
    });

    (StatusCode::ACCEPTED, Json(json!({ "seq": seq, "status": running_status(mode) }))).into_response()
}

pub async fn generate_and_wait(State(state): State<AppState>, Json(body): Json<GenerationRequest>) -> Response {
    if let Err(e) = Pipeline::validate(&body.raw_prompt) {
        return status_response(StatusCode::BAD_REQUEST, format!("⚠️ {e}"));
    }

    let seq = state.slot.begin(body.mode);
    let result = run_and_publish(&state, seq, body).await;
    let code = if result.is_success() { StatusCode::OK } else { StatusCode::BAD_GATEWAY };
    (code, Json(result)).into_response()
}

pub async fn current_result(State(state): State<AppState>) -> Response {
    Json(state.slot.snapshot()).into_response()
}

pub async fn save_result(State(state): State<AppState>, body: Option<Json<SaveRequest>>) -> Response {
    let Some(markup) = state.slot.markup_to_save() else {
        return status_response(StatusCode::CONFLICT, format!("⚠️ {}", OutputError::NothingToSave));
    };

    let request = body.map(|Json(b)| b).unwrap_or_default();
    let target = match resolve_target(&state.output_dir, request.path.as_deref()) {
        Ok(target) => target,
        Err(e) => {
            tracing::warn!("⚠️ Rejected save path: {}", e);
            return status_response(StatusCode::BAD_REQUEST, format!("⚠️ {e}"));
        }
    };

    match save_markup(&target, Some(&markup)) {
        Ok(path) => (
            StatusCode::OK,
            Json(json!({
                "path": path.display().to_string(),
                "status": format!("✅ Website saved successfully to {}", path.display()),
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("❌ Save to {} failed: {}", target.display(), e);
            status_response(StatusCode::INTERNAL_SERVER_ERROR, format!("❌ {e}"))
        }
    }
}

pub async fn copy_result(State(state): State<AppState>) -> Response {
    let markup = state.slot.markup_to_save();
    let copied = tokio::task::spawn_blocking(move || copy_to_clipboard(markup.as_deref())).await;

    match copied {
        Ok(Ok(())) => status_response(StatusCode::OK, "📋 HTML code copied to clipboard!"),
        Ok(Err(OutputError::NothingToSave)) => status_response(StatusCode::CONFLICT, "⚠️ Nothing to copy. Please generate a website first."),
        Ok(Err(e)) => {
            tracing::error!("❌ Copy failed: {}", e);
            status_response(StatusCode::INTERNAL_SERVER_ERROR, format!("❌ {e}"))
        }
        Err(e) => status_response(StatusCode::INTERNAL_SERVER_ERROR, format!("❌ Clipboard task failed: {e}")),
    }
}
