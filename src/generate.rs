/**
 * Input Generation
 * Offline run producing a random, fully signed query/database pair
 */

use std::path::PathBuf;

use clap::Args;
use rand::Rng;
use tracing::info;

use crate::assembler::{seal, Layout, MatchInputs};
use crate::eddsa::generate_key_pair;
use crate::error::AssembleError;
use crate::record::{FingerprintRecord, DB_SIZE};

/// Largest per-component shift applied to a planted match.
const PLANTED_JITTER: i64 = 2;

#[derive(Args, Clone, Debug)]
pub struct GenerateArgs {
    /// Directory the documents are written to.
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = Layout::Split)]
    pub layout: Layout,

    /// Replace this database entry with a noisy copy of the query.
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..DB_SIZE as i64))]
    pub plant_match: Option<u8>,
}

/// Random query and database records; `plant_match` swaps in a near-copy
/// of the query at that index.
pub fn random_dataset<R: Rng + ?Sized>(
    rng: &mut R,
    plant_match: Option<usize>,
) -> (FingerprintRecord, Vec<FingerprintRecord>) {
    let query = FingerprintRecord::random(rng);
    let database = (0..DB_SIZE)
        .map(|i| {
            if plant_match == Some(i) {
                info!(index = i, "planting near-match of the query");
                query.perturbed(rng, PLANTED_JITTER)
            } else {
                FingerprintRecord::random(rng)
            }
        })
        .collect();
    (query, database)
}

/// Generates keys, hashes, signs and self-verifies every record, then writes
/// the circuit input documents.
pub fn run(args: &GenerateArgs) -> Result<Vec<PathBuf>, AssembleError> {
    let mut rng = rand::thread_rng();
    let (query, database) = random_dataset(&mut rng, args.plant_match.map(usize::from));

    info!(count = 1 + DB_SIZE, "generating key pairs");
    let query_keys = generate_key_pair()?;
    let query = seal(query, &query_keys)?;
    info!("query fingerprint signed and verified");

    let mut signed = Vec::with_capacity(DB_SIZE);
    for (index, record) in database.into_iter().enumerate() {
        let keys = generate_key_pair()?;
        signed.push(seal(record, &keys)?);
        info!(index, "database entry signed and verified");
    }

    let inputs = MatchInputs::new(query, signed)?;
    inputs.assemble(args.layout).write_to(&args.out_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planted_match_is_close_to_query() {
        let mut rng = rand::thread_rng();
        let (query, database) = random_dataset(&mut rng, Some(1));
        assert_eq!(database.len(), DB_SIZE);
        for (q, d) in query.minutiae().iter().zip(database[1].minutiae()) {
            assert!(q.x().abs_diff(d.x()) <= PLANTED_JITTER as u32);
            assert!(q.y().abs_diff(d.y()) <= PLANTED_JITTER as u32);
            assert!(q.angle().abs_diff(d.angle()) <= PLANTED_JITTER as u32);
        }
    }
}
