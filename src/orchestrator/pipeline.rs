/**
 * External Pipeline
 * Opaque witness → proof → verify executable, driven as a subprocess
 */

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;
use tracing::{debug, info, warn};

use super::classify::PipelineRun;

pub type PipelineFuture<'a> = Pin<Box<dyn Future<Output = io::Result<PipelineRun>> + Send + 'a>>;

/// Runs the proving pipeline over a merged input document.
///
/// `Err` means the pipeline could not be run at all; a pipeline that ran and
/// failed is an `Ok` with a nonzero exit code.
pub trait ProofPipeline: Send + Sync {
    fn run<'a>(&'a self, input: &'a Path, workspace: &'a Path) -> PipelineFuture<'a>;
}

/// `<interpreter> <script> <input.json> <workspace>`, with no timeout.
#[derive(Clone, Debug)]
pub struct ScriptPipeline {
    interpreter: PathBuf,
    script: PathBuf,
}

impl ScriptPipeline {
    pub fn new(interpreter: impl Into<PathBuf>, script: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            script: script.into(),
        }
    }

    pub fn script(&self) -> &Path {
        &self.script
    }
}

impl ProofPipeline for ScriptPipeline {
    fn run<'a>(&'a self, input: &'a Path, workspace: &'a Path) -> PipelineFuture<'a> {
        Box::pin(async move {
            info!(
                script = %self.script.display(),
                input = %input.display(),
                "executing verification script"
            );
            let output = Command::new(&self.interpreter)
                .arg(&self.script)
                .arg(input)
                .arg(workspace)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(false)
                .output()
                .await?;

            let run = PipelineRun {
                exit_code: exit_code(output.status),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            };
            debug!(stdout = %run.stdout, "script stdout");
            if run.succeeded() {
                info!("script exited with code 0");
            } else {
                warn!(exit_code = ?run.exit_code, stderr = %run.stderr, "script failed");
            }
            Ok(run)
        })
    }
}

/// Shell convention: a process killed by signal N reports 128 + N.
fn exit_code(status: ExitStatus) -> Option<i32> {
    if let Some(code) = status.code() {
        return Some(code);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Some(128 + signal);
        }
    }
    None
}
