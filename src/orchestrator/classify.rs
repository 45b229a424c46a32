/**
 * Outcome Classification
 * The pipeline reports nothing but an exit status and free text, so failures
 * are recognised by an ordered table of text rules; first match wins.
 */

use super::outcome::{OutcomeKind, VerificationOutcome};

/// Exit status of a process killed by SIGKILL, which is what the OOM killer sends.
pub const OOM_KILL_EXIT: i32 = 137;

const UNKNOWN_DETAIL_LINES: usize = 5;
const UNKNOWN_DETAIL_CHARS: usize = 500;

/// Everything observable about one finished pipeline invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineRun {
    /// `None` only if the platform reports neither a code nor a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl PipelineRun {
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Captured text as seen by the rules.
///
/// Both streams are searched, stderr first, not stderr alone. A script that
/// prints e.g. "verification failed" to stdout as progress text, then exits
/// nonzero, is classified by that text.
pub struct Diagnostics<'a> {
    pub run: &'a PipelineRun,
    /// stderr then stdout, as written.
    pub raw: String,
    /// `raw`, lowercased for case-insensitive matching.
    pub lowered: String,
}

impl<'a> Diagnostics<'a> {
    pub fn new(run: &'a PipelineRun) -> Self {
        let raw = match (run.stderr.trim().is_empty(), run.stdout.trim().is_empty()) {
            (_, true) => run.stderr.clone(),
            (true, false) => run.stdout.clone(),
            (false, false) => format!("{}\n{}", run.stderr, run.stdout),
        };
        let lowered = raw.to_lowercase();
        Self { run, raw, lowered }
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lowered.contains(needle)
    }
}

/// One `(predicate, outcome, detail-extractor)` entry.
pub struct Rule {
    pub name: &'static str,
    pub matches: fn(&Diagnostics<'_>) -> bool,
    pub kind: OutcomeKind,
    pub message: &'static str,
    pub detail: fn(&Diagnostics<'_>) -> String,
}

impl Rule {
    fn outcome(&self, diag: &Diagnostics<'_>) -> VerificationOutcome {
        VerificationOutcome::new(self.kind, self.message, (self.detail)(diag))
    }
}

/// Evaluated in order; append new rules here.
pub static RULES: &[Rule] = &[
    Rule {
        name: "witness",
        matches: |d| d.contains("witness generation failed"),
        kind: OutcomeKind::WitnessComputationFailed,
        message: "Verification process failed: Witness computation error.",
        detail: witness_detail,
    },
    Rule {
        name: "prover",
        matches: |d| d.contains("proof generation failed"),
        kind: OutcomeKind::ProofGenerationFailed,
        message: "Verification process failed: Proof generation error.",
        detail: |_| {
            "Proof generation script failed. This might be due to setup or resource issues."
                .into()
        },
    },
    Rule {
        name: "verifier",
        matches: |d| d.contains("verification failed") || d.contains("invalid proof"),
        kind: OutcomeKind::ProofInvalid,
        message: "Verification Failed: Proof invalid.",
        detail: |_| {
            "The generated proof did not verify against the public inputs. \
             The fingerprints likely do not match according to the circuit logic."
                .into()
        },
    },
    Rule {
        name: "oom",
        matches: |d| d.run.exit_code == Some(OOM_KILL_EXIT),
        kind: OutcomeKind::ResourceExhausted,
        message: "Processing failed: Resource Limit Exceeded.",
        detail: |_| {
            "The verification process likely ran out of memory (OOM Killed). \
             Try with smaller inputs or increase server memory."
                .into()
        },
    },
];

pub fn classify(run: &PipelineRun) -> VerificationOutcome {
    classify_with(RULES, run)
}

pub fn classify_with(rules: &[Rule], run: &PipelineRun) -> VerificationOutcome {
    if run.succeeded() {
        return VerificationOutcome::verified();
    }
    let diag = Diagnostics::new(run);
    match rules.iter().find(|rule| (rule.matches)(&diag)) {
        Some(rule) => {
            tracing::debug!(rule = rule.name, "pipeline failure classified");
            rule.outcome(&diag)
        }
        None => unknown_failure(&diag),
    }
}

fn unknown_failure(diag: &Diagnostics<'_>) -> VerificationOutcome {
    let code = diag
        .run
        .exit_code
        .map_or_else(|| "unknown".to_string(), |c| c.to_string());
    let head: String = diag
        .raw
        .lines()
        .take(UNKNOWN_DETAIL_LINES)
        .collect::<Vec<_>>()
        .join("\n")
        .chars()
        .take(UNKNOWN_DETAIL_CHARS)
        .collect();
    let detail = if head.trim().is_empty() {
        "No specific error details available from script.".to_string()
    } else {
        head
    };
    VerificationOutcome::new(
        OutcomeKind::UnknownFailure,
        format!("Verification script failed unexpectedly (Exit code {code})."),
        detail,
    )
}

fn witness_detail(diag: &Diagnostics<'_>) -> String {
    if let Some(line) = assertion_line(&diag.lowered) {
        format!("Circuit assertion failed (around line {line}). Check input ranges/values.")
    } else if diag.contains("constraint not satisfied") {
        "Circuit constraint not satisfied. Check input values correspond to circuit logic."
            .to_string()
    } else {
        "Witness generator script failed. Check circuit inputs and logs.".to_string()
    }
}

/// Line number from the first `assert failed … line: N` in the text, which
/// may span several lines.
fn assertion_line(text: &str) -> Option<&str> {
    let start = text.find("assert failed")?;
    let tail = &text[start..];
    tail.match_indices("line:").find_map(|(at, marker)| {
        let rest = tail[at + marker.len()..].trim_start_matches([' ', '\t']);
        let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        (digits > 0).then(|| &rest[..digits])
    })
}
