/*!
 * Verification Orchestrator
 * Per-request state machine: workspace isolation, document merge, external
 * pipeline invocation, outcome classification, guaranteed cleanup
 */

pub mod classify;
pub mod outcome;
pub mod pipeline;
pub mod workspace;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::OrchestratorError;

pub use classify::{classify, PipelineRun, OOM_KILL_EXIT};
pub use outcome::{MatchResponse, OutcomeKind, VerificationOutcome};
pub use pipeline::{PipelineFuture, ProofPipeline, ScriptPipeline};
pub use workspace::Workspace;

/// Name of the merged document handed to the pipeline.
pub const MERGED_INPUT_FILE: &str = "input.json";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Received,
    WorkspaceAllocated,
    InputsParsed,
    InputsMerged,
    ExternalPipelineInvoked,
    OutcomeClassified,
    WorkspaceReleased,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentLabel {
    Private,
    Public,
}

impl DocumentLabel {
    fn file_name(self) -> &'static str {
        match self {
            Self::Private => "private.json",
            Self::Public => "public.json",
        }
    }
}

impl fmt::Display for DocumentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Private => "private",
            Self::Public => "public",
        })
    }
}

/// The two raw documents of one match request.
#[derive(Clone, Debug, Default)]
pub struct MatchUploads {
    pub private: Vec<u8>,
    pub public: Vec<u8>,
}

pub struct Orchestrator {
    uploads_root: PathBuf,
    pipeline: Arc<dyn ProofPipeline>,
}

impl Orchestrator {
    pub fn new(uploads_root: impl Into<PathBuf>, pipeline: Arc<dyn ProofPipeline>) -> Self {
        Self {
            uploads_root: uploads_root.into(),
            pipeline,
        }
    }

    pub fn uploads_root(&self) -> &Path {
        &self.uploads_root
    }

    /// Drives one request to a terminal outcome. The workspace is released
    /// before this returns, whatever the outcome.
    pub async fn verify(&self, uploads: MatchUploads) -> Result<VerificationOutcome, OrchestratorError> {
        info!(stage = ?Stage::Received, "match request received");
        let workspace = Workspace::allocate(&self.uploads_root)
            .await
            .map_err(|source| OrchestratorError::WorkspaceSetup {
                root: self.uploads_root.clone(),
                source,
            })?;
        let request = workspace.id();
        info!(%request, stage = ?Stage::WorkspaceAllocated, workspace = %workspace.path().display());

        let outcome = self.process(&workspace, uploads).await;
        info!(%request, stage = ?Stage::OutcomeClassified, kind = ?outcome.kind, message = %outcome.message);

        workspace.release().await;
        info!(%request, stage = ?Stage::WorkspaceReleased, "request finished");
        Ok(outcome)
    }

    async fn process(&self, workspace: &Workspace, uploads: MatchUploads) -> VerificationOutcome {
        let request = workspace.id();
        for (label, bytes) in [
            (DocumentLabel::Private, &uploads.private),
            (DocumentLabel::Public, &uploads.public),
        ] {
            let path = workspace.file(label.file_name());
            if let Err(e) = tokio::fs::write(&path, bytes).await {
                return VerificationOutcome::processing_error(format!(
                    "failed to store {label} upload: {e}"
                ));
            }
        }

        let private = match parse_document(DocumentLabel::Private, &uploads.private) {
            Ok(doc) => doc,
            Err(outcome) => return outcome,
        };
        let public = match parse_document(DocumentLabel::Public, &uploads.public) {
            Ok(doc) => doc,
            Err(outcome) => return outcome,
        };
        info!(%request, stage = ?Stage::InputsParsed);

        let merged = merge_documents(private, public);
        let input_path = workspace.file(MERGED_INPUT_FILE);
        let body = match serde_json::to_vec_pretty(&Value::Object(merged)) {
            Ok(body) => body,
            Err(e) => return VerificationOutcome::processing_error(e.to_string()),
        };
        if let Err(e) = tokio::fs::write(&input_path, body).await {
            return VerificationOutcome::processing_error(format!(
                "failed to write merged input: {e}"
            ));
        }
        info!(%request, stage = ?Stage::InputsMerged, input = %input_path.display());

        info!(%request, stage = ?Stage::ExternalPipelineInvoked);
        match self.pipeline.run(&input_path, workspace.path()).await {
            Ok(run) => classify(&run),
            Err(e) => {
                warn!(%request, error = %e, "pipeline could not be launched");
                VerificationOutcome::new(
                    OutcomeKind::UnknownFailure,
                    "Verification script could not be started.",
                    e.to_string(),
                )
            }
        }
    }
}

/// Parses one uploaded document; the root must be a JSON object.
pub fn parse_document(label: DocumentLabel, bytes: &[u8]) -> Result<Map<String, Value>, VerificationOutcome> {
    let invalid = |reason: String| {
        VerificationOutcome::invalid_input(format!(
            "Invalid format in {label} file. Ensure it's valid JSON. ({reason})"
        ))
    };
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(invalid(format!(
            "expected a JSON object at the top level, found {}",
            json_kind(&other)
        ))),
        Err(e) => Err(invalid(e.to_string())),
    }
}

/// Key-wise union; on a collision the public document's value wins.
pub fn merge_documents(private: Map<String, Value>, public: Map<String, Value>) -> Map<String, Value> {
    let mut merged = private;
    for (key, value) in public {
        if merged.insert(key.clone(), value).is_some() {
            warn!(%key, "key present in both documents; public value wins");
        }
    }
    merged
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
