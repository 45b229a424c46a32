/**
 * Fingermatch
 * Zero-knowledge fingerprint matching: the verification server plus the
 * offline tools that produce and check its signed inputs
 *
 * Commands:
 * - serve: POST /api/match, runs the external prover/verifier per request
 * - generate: random signed query/database documents
 * - audit: re-verify every signature in existing documents
 */

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fingermatch::audit::{self, AuditArgs};
use fingermatch::config::ServerConfig;
use fingermatch::generate::{self, GenerateArgs};
use fingermatch::orchestrator::{Orchestrator, ScriptPipeline};
use fingermatch::routes::AppState;

#[derive(Parser, Debug)]
#[command(name = "fingermatch", version, about)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG wins when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the match verification server.
    Serve(ServerConfig),

    /// Generate signed circuit inputs.
    Generate(GenerateArgs),

    /// Check the hashes and signatures in generated inputs.
    Audit(AuditArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("info"),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Command::Serve(config) => serve(config),
        Command::Generate(args) => generate::run(&args)
            .map(|written| {
                info!(files = written.len(), "generation complete");
                ExitCode::SUCCESS
            })
            .context("generation failed"),
        Command::Audit(args) => run_audit(&args),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn serve(config: ServerConfig) -> anyhow::Result<ExitCode> {
    info!("Starting Fingermatch server");

    tokio::fs::create_dir_all(&config.uploads_dir)
        .await
        .with_context(|| format!("creating uploads directory {}", config.uploads_dir.display()))?;
    config.check_prerequisites();

    let pipeline = Arc::new(ScriptPipeline::new(&config.shell, &config.pipeline_script));
    let orchestrator = Arc::new(Orchestrator::new(&config.uploads_dir, pipeline));
    let app = fingermatch::app(AppState { orchestrator });

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "Fingermatch server listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(ExitCode::SUCCESS)
}

fn run_audit(args: &AuditArgs) -> anyhow::Result<ExitCode> {
    let report = audit::run(args).context("audit failed")?;
    if report.all_valid() {
        info!(checked = report.entries.len(), "all signatures verify");
        Ok(ExitCode::SUCCESS)
    } else {
        warn!(failed = report.failures().count(), "audit found invalid signatures");
        Ok(ExitCode::from(2))
    }
}
