/**
 * HTTP Routes
 * Multipart upload of the two input documents and the health probe
 */

use std::sync::Arc;

use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, info};

use crate::orchestrator::{
    MatchResponse, MatchUploads, Orchestrator, OutcomeKind, VerificationOutcome,
};

/// Per-file ceiling.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

impl IntoResponse for VerificationOutcome {
    fn into_response(self) -> Response {
        (self.status(), Json(self.response())).into_response()
    }
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn match_fingerprints(State(state): State<AppState>, multipart: Multipart) -> Response {
    info!("received /api/match request");

    let uploads = match read_uploads(multipart).await {
        Ok(uploads) => uploads,
        Err(outcome) => return outcome.into_response(),
    };

    // Detached so a client disconnect neither aborts the pipeline nor
    // skips cleanup.
    let orchestrator = state.orchestrator.clone();
    let task = tokio::spawn(async move { orchestrator.verify(uploads).await });

    match task.await {
        Ok(Ok(outcome)) => outcome.into_response(),
        Ok(Err(e)) => {
            error!(error = %e, "request setup failed");
            server_error(
                "Server setup error: Failed to create temporary directory.",
                e.to_string(),
            )
        }
        Err(e) => {
            error!(error = %e, "match task aborted");
            server_error("Processing failed unexpectedly.", "Check server logs for more details.")
        }
    }
}

fn server_error(message: &str, detail: impl Into<String>) -> Response {
    let body = MatchResponse {
        verified: false,
        message: message.to_string(),
        error: Some(detail.into()),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

async fn read_uploads(mut multipart: Multipart) -> Result<MatchUploads, VerificationOutcome> {
    let mut private = None;
    let mut public = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err(VerificationOutcome::invalid_input(format!(
                    "Malformed multipart body: {e}"
                )))
            }
        };
        let slot = match field.name() {
            Some("privateFile") => &mut private,
            Some("publicFile") => &mut public,
            _ => continue,
        };
        *slot = Some(read_json_file(field).await?);
    }

    match (private, public) {
        (Some(private), Some(public)) => Ok(MatchUploads { private, public }),
        _ => Err(VerificationOutcome {
            kind: OutcomeKind::InvalidInputFormat,
            message: "Both private and public JSON files are required.".to_string(),
            detail: None,
        }),
    }
}

async fn read_json_file(field: Field<'_>) -> Result<Vec<u8>, VerificationOutcome> {
    let name = field.name().unwrap_or_default().to_string();
    if let Some(content_type) = field.content_type() {
        if !content_type.starts_with("application/json") {
            return Err(VerificationOutcome::invalid_input(
                "Invalid file type. Only JSON files (.json) are allowed.",
            ));
        }
    }
    let bytes = field.bytes().await.map_err(|e| {
        VerificationOutcome::invalid_input(format!("Failed to read {name}: {e}"))
    })?;
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(VerificationOutcome::invalid_input(format!(
            "{name} exceeds the {} MB upload limit.",
            MAX_UPLOAD_BYTES / (1024 * 1024)
        )));
    }
    Ok(bytes.to_vec())
}
