//! Shared fixtures: a scripted in-process pipeline and multipart bodies.

#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use fingermatch::orchestrator::{Orchestrator, PipelineFuture, PipelineRun, ProofPipeline};

pub type Behaviour = Box<dyn Fn(&Path) -> io::Result<PipelineRun> + Send + Sync>;

/// Records every invocation, then answers with `behaviour`.
pub struct FakePipeline {
    behaviour: Behaviour,
    calls: AtomicUsize,
    workspaces: Mutex<Vec<PathBuf>>,
}

impl FakePipeline {
    pub fn new(behaviour: impl Fn(&Path) -> io::Result<PipelineRun> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            behaviour: Box::new(behaviour),
            calls: AtomicUsize::new(0),
            workspaces: Mutex::new(Vec::new()),
        })
    }

    pub fn exiting(code: i32, stderr: &str) -> Arc<Self> {
        let stderr = stderr.to_string();
        Self::new(move |_| Ok(run(Some(code), "", &stderr)))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn workspaces(&self) -> Vec<PathBuf> {
        self.workspaces.lock().unwrap().clone()
    }
}

impl ProofPipeline for FakePipeline {
    fn run<'a>(&'a self, input: &'a Path, workspace: &'a Path) -> PipelineFuture<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.workspaces.lock().unwrap().push(workspace.to_path_buf());
            (self.behaviour)(input)
        })
    }
}

pub fn run(exit_code: Option<i32>, stdout: &str, stderr: &str) -> PipelineRun {
    PipelineRun {
        exit_code,
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    }
}

pub fn orchestrator(root: &Path, pipeline: Arc<FakePipeline>) -> Arc<Orchestrator> {
    Arc::new(Orchestrator::new(root, pipeline))
}

/// Number of entries left under the uploads root.
pub fn leftover_workspaces(root: &Path) -> usize {
    match std::fs::read_dir(root) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

pub const BOUNDARY: &str = "fingermatch-test-boundary";

pub struct Part<'a> {
    pub name: &'a str,
    pub content_type: &'a str,
    pub body: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn json(name: &'a str, body: &'a [u8]) -> Self {
        Self {
            name,
            content_type: "application/json",
            body,
        }
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}.json\"\r\nContent-Type: {}\r\n\r\n",
                part.name, part.name, part.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(part.body);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
