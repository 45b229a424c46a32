/**
 * Input Assembler
 * Signs records, enforces the self-verification invariant, and partitions
 * the artifacts into the circuit's public and private inputs
 */

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::eddsa::{self, KeyPair, PublicKey, Signature};
use crate::error::AssembleError;
use crate::hasher::{self, Digest};
use crate::record::{FingerprintRecord, DB_SIZE};

pub const PUBLIC_FILE: &str = "public.json";
pub const PRIVATE_FILE: &str = "private.json";
pub const COMBINED_FILE: &str = "input.json";

/// A record whose signature has passed self-verification. Only [`seal`]
/// constructs one.
#[derive(Clone, Debug)]
pub struct SignedRecord {
    record: FingerprintRecord,
    digest: Digest,
    public_key: PublicKey,
    signature: Signature,
}

impl SignedRecord {
    pub fn record(&self) -> &FingerprintRecord {
        &self.record
    }

    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

/// Hashes and signs `record`, then re-verifies the fresh signature.
///
/// # Panics
///
/// If the signature does not verify against the digest and key that
/// produced it. That means the primitive itself is broken; the generation
/// run must not continue.
pub fn seal(record: FingerprintRecord, keys: &KeyPair) -> Result<SignedRecord, AssembleError> {
    seal_with(record, keys, eddsa::verify)
}

type Verifier = fn(&Digest, &Signature, &PublicKey) -> bool;

fn seal_with(
    record: FingerprintRecord,
    keys: &KeyPair,
    verify: Verifier,
) -> Result<SignedRecord, AssembleError> {
    let digest = hasher::hash(&record)?;
    let signature = eddsa::sign(keys.seed(), &digest)?;
    assert!(
        verify(&digest, &signature, keys.public_key()),
        "FATAL: freshly generated signature failed verification (digest {digest})"
    );
    debug!(%digest, "signature generated and self-verified");
    Ok(SignedRecord {
        record,
        digest,
        public_key: keys.public_key().clone(),
        signature,
    })
}

/// Inputs disclosed to the verifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicInputs {
    pub query_fp: FingerprintRecord,
    pub query_public_key: PublicKey,
    pub db_public_keys: Vec<PublicKey>,
}

/// Witness-only inputs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateInputs {
    pub db_fp_array: Vec<FingerprintRecord>,
    pub query_signature: Signature,
    pub db_signatures: Vec<Signature>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedInputs {
    #[serde(flatten)]
    pub public: PublicInputs,
    #[serde(flatten)]
    pub private: PrivateInputs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Layout {
    /// `public.json` + `private.json`
    Split,
    /// a single `input.json`
    Combined,
}

#[derive(Clone, Debug)]
pub enum AssembledDocuments {
    Split {
        public: PublicInputs,
        private: PrivateInputs,
    },
    Combined(CombinedInputs),
}

/// One query plus the signed database it is matched against.
#[derive(Clone, Debug)]
pub struct MatchInputs {
    query: SignedRecord,
    database: Vec<SignedRecord>,
}

impl MatchInputs {
    pub fn new(query: SignedRecord, database: Vec<SignedRecord>) -> Result<Self, AssembleError> {
        if database.len() != DB_SIZE {
            return Err(AssembleError::DatabaseSize {
                expected: DB_SIZE,
                actual: database.len(),
            });
        }
        Ok(Self { query, database })
    }

    pub fn public_inputs(&self) -> PublicInputs {
        PublicInputs {
            query_fp: self.query.record.clone(),
            query_public_key: self.query.public_key.clone(),
            db_public_keys: self.database.iter().map(|e| e.public_key.clone()).collect(),
        }
    }

    pub fn private_inputs(&self) -> PrivateInputs {
        PrivateInputs {
            db_fp_array: self.database.iter().map(|e| e.record.clone()).collect(),
            query_signature: self.query.signature.clone(),
            db_signatures: self.database.iter().map(|e| e.signature.clone()).collect(),
        }
    }

    pub fn assemble(&self, layout: Layout) -> AssembledDocuments {
        match layout {
            Layout::Split => AssembledDocuments::Split {
                public: self.public_inputs(),
                private: self.private_inputs(),
            },
            Layout::Combined => AssembledDocuments::Combined(CombinedInputs {
                public: self.public_inputs(),
                private: self.private_inputs(),
            }),
        }
    }
}

impl AssembledDocuments {
    /// Serialized documents keyed by file name.
    pub fn render(&self) -> Result<Vec<(&'static str, String)>, AssembleError> {
        match self {
            Self::Split { public, private } => Ok(vec![
                (PUBLIC_FILE, to_json(PUBLIC_FILE, public)?),
                (PRIVATE_FILE, to_json(PRIVATE_FILE, private)?),
            ]),
            Self::Combined(combined) => Ok(vec![(COMBINED_FILE, to_json(COMBINED_FILE, combined)?)]),
        }
    }

    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>, AssembleError> {
        fs::create_dir_all(dir).map_err(|source| AssembleError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut written = Vec::new();
        for (name, body) in self.render()? {
            let path = dir.join(name);
            fs::write(&path, body).map_err(|source| AssembleError::Io {
                path: path.clone(),
                source,
            })?;
            info!(path = %path.display(), "wrote circuit inputs");
            written.push(path);
        }
        Ok(written)
    }
}

fn to_json<T: Serialize>(document: &'static str, value: &T) -> Result<String, AssembleError> {
    serde_json::to_string_pretty(value).map_err(|source| AssembleError::Json { document, source })
}
