/**
 * Server Configuration
 * Flags with environment fallbacks, plus the startup prerequisite check
 */

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::Args;
use tracing::{info, warn};

#[derive(Args, Clone, Debug)]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 5001)]
    pub port: u16,

    /// Parent directory of per-request workspaces.
    #[arg(long, env = "FINGERMATCH_UPLOADS_DIR", default_value = "uploads")]
    pub uploads_dir: PathBuf,

    /// Witness → proof → verify script, invoked as `<shell> <script> <input.json> <workspace>`.
    #[arg(long, env = "FINGERMATCH_PIPELINE_SCRIPT", default_value = "circuits/execute_proof.sh")]
    pub pipeline_script: PathBuf,

    #[arg(long, env = "FINGERMATCH_SHELL", default_value = "bash")]
    pub shell: PathBuf,

    /// Precompiled circuit artifacts (wasm, zkey, verification key).
    #[arg(long, env = "FINGERMATCH_CIRCUITS_DIR", default_value = "circuits/build")]
    pub circuits_dir: PathBuf,

    #[arg(long, env = "FINGERMATCH_ZKEY", default_value = "fingerprint_matcher_0001.zkey")]
    pub zkey: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5001,
            uploads_dir: PathBuf::from("uploads"),
            pipeline_script: PathBuf::from("circuits/execute_proof.sh"),
            shell: PathBuf::from("bash"),
            circuits_dir: PathBuf::from("circuits/build"),
            zkey: "fingerprint_matcher_0001.zkey".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }

    /// Files the pipeline needs that are missing. Requests are still served;
    /// they will fail in the pipeline instead.
    pub fn missing_prerequisites(&self) -> Vec<PathBuf> {
        [
            self.pipeline_script.clone(),
            self.circuits_dir.clone(),
            self.circuits_dir.join(&self.zkey),
        ]
        .into_iter()
        .filter(|path| !path.exists())
        .collect()
    }

    pub fn check_prerequisites(&self) {
        let missing = self.missing_prerequisites();
        if missing.is_empty() {
            info!("all pipeline prerequisites present");
        }
        for path in missing {
            warn!(path = %path.display(), "pipeline prerequisite missing");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_missing_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("execute_proof.sh");
        std::fs::write(&script, "#!/bin/sh\n").unwrap();
        let config = ServerConfig {
            pipeline_script: script,
            circuits_dir: dir.path().to_path_buf(),
            ..ServerConfig::default()
        };
        assert_eq!(
            config.missing_prerequisites(),
            vec![dir.path().join("fingerprint_matcher_0001.zkey")]
        );
    }

    #[test]
    fn binds_all_interfaces() {
        let config = ServerConfig {
            port: 8080,
            ..ServerConfig::default()
        };
        assert_eq!(config.bind_addr().to_string(), "0.0.0.0:8080");
    }
}
