use crate::config::Config;
use crate::db::Store;
use crate::engine::OcrEngine;
use crate::error::OcrError;
use crate::extraction::Extractor;
use crate::preprocessing::Preset;
use crate::render;
use crate::staging::StagedUpload;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Headroom for multipart framing on top of the file size limit
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<Extractor>,
    pub config: Arc<Config>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub engine: String,
}

impl AppState {
    pub fn new(engine: Arc<dyn OcrEngine>, store: Store, config: Config) -> Self {
        let extractor = Extractor::new(engine, store, config.languages.clone())
            .record_failures(config.record_failures);

        Self {
            extractor: Arc::new(extractor),
            config: Arc::new(config),
        }
    }
}

/// Build the router for the interactive surface
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_file_size + MULTIPART_OVERHEAD;

    Router::new()
        .route("/", get(handle_index))
        .route("/extract", post(handle_extract))
        .route("/history", get(handle_history))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let engine = crate::engines::create(&config)?;
    let store = Store::open(&config.database).await?;
    if config.reset_store {
        store.reset().await?;
    }

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!(
        "Candidate languages: {} (fallback: {})",
        config.languages,
        config.languages.fallback().name
    );

    let app = router(AppState::new(engine, store, config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn handle_index(State(state): State<AppState>) -> Html<String> {
    render::index_page(state.extractor.languages(), state.config.max_file_size)
}

/// Handle an upload: stage it, extract, render the outcome
async fn handle_extract(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Html<String>, OcrError> {
    let mut file: Option<(String, Bytes)> = None;
    let mut advanced = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| OcrError::InvalidRequest(format!("Failed to parse multipart: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let data = field.bytes().await.map_err(|e| {
                    OcrError::InvalidRequest(format!("Failed to read file data: {}", e))
                })?;
                file = Some((file_name, data));
            }
            "advanced" => {
                let value = field.text().await.map_err(|e| {
                    OcrError::InvalidRequest(format!("Invalid advanced flag: {}", e))
                })?;
                advanced = parse_toggle(&value);
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let (file_name, data) = file.ok_or(OcrError::MissingFile)?;
    if data.is_empty() {
        return Err(OcrError::MissingFile);
    }

    if data.len() > state.config.max_file_size {
        return Err(OcrError::ImageTooLarge {
            size: data.len(),
            max: state.config.max_file_size,
        });
    }

    // Removed when `upload` goes out of scope, whatever the outcome
    let upload = StagedUpload::create(&state.config.staging_dir, &file_name, &data)?;

    let extraction = state
        .extractor
        .extract(&upload, Preset::from_toggle(advanced))
        .await;

    Ok(render::result_page(extraction.result()))
}

async fn handle_history(State(state): State<AppState>) -> Result<Html<String>, OcrError> {
    let records = state
        .extractor
        .store()
        .recent(state.config.history_limit)
        .await?;
    Ok(render::history_page(&records))
}

/// Handle health check requests
async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine: state.extractor.engine_name().to_string(),
    })
}

/// Checkbox semantics: present with any truthy value means on
fn parse_toggle(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "on" | "1" | "yes"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toggle() {
        assert!(parse_toggle("on"));
        assert!(parse_toggle(" TRUE "));
        assert!(parse_toggle("1"));
        assert!(!parse_toggle("false"));
        assert!(!parse_toggle(""));
    }
}
