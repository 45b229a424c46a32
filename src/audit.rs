/**
 * Input Audit
 * Re-hashes every record in assembled match inputs and checks each signature
 * against the key it is published with
 */

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::assembler::{
    CombinedInputs, PrivateInputs, PublicInputs, COMBINED_FILE, PRIVATE_FILE, PUBLIC_FILE,
};
use crate::eddsa::{self, PublicKey, Signature};
use crate::error::AuditError;
use crate::hasher;
use crate::record::FingerprintRecord;

#[derive(Args, Clone, Debug)]
pub struct AuditArgs {
    /// Directory holding `public.json` + `private.json`, or `input.json`.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Subject {
    Query,
    Database(usize),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => f.write_str("query"),
            Self::Database(i) => write!(f, "database[{i}]"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditEntry {
    pub subject: Subject,
    pub valid: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuditReport {
    pub entries: Vec<AuditEntry>,
}

impl AuditReport {
    pub fn all_valid(&self) -> bool {
        self.entries.iter().all(|e| e.valid)
    }

    pub fn failures(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter().filter(|e| !e.valid)
    }
}

/// Loads the documents in `dir`, preferring the combined layout when present.
pub fn load(dir: &Path) -> Result<(PublicInputs, PrivateInputs), AuditError> {
    let combined = dir.join(COMBINED_FILE);
    if combined.is_file() {
        let inputs: CombinedInputs = read_json(&combined)?;
        return Ok((inputs.public, inputs.private));
    }
    Ok((
        read_json(&dir.join(PUBLIC_FILE))?,
        read_json(&dir.join(PRIVATE_FILE))?,
    ))
}

pub fn audit(public: &PublicInputs, private: &PrivateInputs) -> Result<AuditReport, AuditError> {
    let records = private.db_fp_array.len();
    let keys = public.db_public_keys.len();
    let signatures = private.db_signatures.len();
    if records != keys || records != signatures {
        return Err(AuditError::Mismatched {
            records,
            keys,
            signatures,
        });
    }

    let mut entries = Vec::with_capacity(records + 1);
    entries.push(AuditEntry {
        subject: Subject::Query,
        valid: check(&public.query_fp, &private.query_signature, &public.query_public_key)?,
    });
    for (i, ((record, signature), key)) in private
        .db_fp_array
        .iter()
        .zip(&private.db_signatures)
        .zip(&public.db_public_keys)
        .enumerate()
    {
        entries.push(AuditEntry {
            subject: Subject::Database(i),
            valid: check(record, signature, key)?,
        });
    }
    Ok(AuditReport { entries })
}

pub fn run(args: &AuditArgs) -> Result<AuditReport, AuditError> {
    let (public, private) = load(&args.dir)?;
    let report = audit(&public, &private)?;
    for entry in &report.entries {
        if entry.valid {
            info!(subject = %entry.subject, "signature valid");
        } else {
            warn!(subject = %entry.subject, "signature does not verify");
        }
    }
    Ok(report)
}

fn check(record: &FingerprintRecord, signature: &Signature, key: &PublicKey) -> Result<bool, AuditError> {
    let digest = hasher::hash(record)?;
    Ok(eddsa::verify(&digest, signature, key))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AuditError> {
    let body = fs::read(path).map_err(|source| AuditError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&body).map_err(|source| AuditError::Json {
        path: path.to_path_buf(),
        source,
    })
}
