/**
 * Record Hasher
 * Single-call Poseidon digest over a flattened minutiae record
 */

use std::sync::OnceLock;

use poseidon_rs::{Fr, Poseidon};

use crate::error::HashError;
use crate::field::{to_field, FieldElement};
use crate::record::{FingerprintRecord, Minutia, N_MINUTIAE};

/// Widest input the permutation accepts in one call (state width 17).
pub const POSEIDON_MAX_INPUTS: usize = 16;

/// Output of [`hash`]; the message that gets signed.
pub type Digest = FieldElement;

fn poseidon() -> &'static Poseidon {
    static CELL: OnceLock<Poseidon> = OnceLock::new();
    CELL.get_or_init(Poseidon::new)
}

/// Circomlib-compatible Poseidon over `1..=16` field elements.
pub fn poseidon_hash(inputs: &[FieldElement]) -> Result<FieldElement, HashError> {
    if inputs.len() > POSEIDON_MAX_INPUTS {
        return Err(HashError::Capacity {
            len: inputs.len(),
            max: POSEIDON_MAX_INPUTS,
        });
    }
    if inputs.is_empty() {
        return Err(HashError::Shape("poseidon needs at least one input".into()));
    }
    let frs = inputs
        .iter()
        .map(FieldElement::to_fr)
        .collect::<Result<Vec<Fr>, _>>()?;
    let out = poseidon().hash(frs).map_err(HashError::Primitive)?;
    Ok(FieldElement::from_fr(&out))
}

/// Hashes a record. Pure: identical records always give identical digests.
pub fn hash(record: &FingerprintRecord) -> Result<Digest, HashError> {
    if record.len() != N_MINUTIAE {
        return Err(HashError::Shape(format!(
            "expected {N_MINUTIAE} minutiae, got {}",
            record.len()
        )));
    }
    let flattened = record.flatten();
    if flattened.len() != 3 * N_MINUTIAE {
        return Err(HashError::Shape(format!(
            "expected {} flattened values, got {}",
            3 * N_MINUTIAE,
            flattened.len()
        )));
    }
    let inputs = flattened
        .into_iter()
        .map(to_field)
        .collect::<Result<Vec<_>, _>>()?;
    poseidon_hash(&inputs)
}

/// Hashes raw nested rows, e.g. straight out of a JSON document.
pub fn hash_rows(rows: &[Vec<i64>]) -> Result<Digest, HashError> {
    let mut minutiae = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let &[x, y, angle] = row.as_slice() else {
            return Err(HashError::Shape(format!(
                "minutia {i} has {} fields, expected 3",
                row.len()
            )));
        };
        minutiae.push(Minutia::new(x, y, angle)?);
    }
    hash(&FingerprintRecord::new(minutiae))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> FingerprintRecord {
        let rows = [[10, 15, 20], [25, 30, 45], [40, 10, 80], [5, 45, 5], [20, 20, 70]];
        FingerprintRecord::new(
            rows.iter()
                .map(|&[x, y, a]| Minutia::new(x, y, a).unwrap())
                .collect(),
        )
    }

    fn counting(n: u64) -> Vec<FieldElement> {
        (1..=n).map(|v| to_field(v).unwrap()).collect()
    }

    fn decimal(text: &str) -> FieldElement {
        crate::field::decode(text).unwrap()
    }

    // circomlib / circomlibjs poseidon reference outputs
    #[test]
    fn matches_circomlib_vectors() {
        assert_eq!(
            poseidon_hash(&counting(2)).unwrap(),
            decimal("7853200120776062878684798364095072458815029376092732009249414926327459813530")
        );
        assert_eq!(
            poseidon_hash(&counting(14)).unwrap(),
            decimal("8354478399926161176778659061636406690034081872658507739535256090879947077494")
        );
        assert_eq!(
            poseidon_hash(&counting(16)).unwrap(),
            decimal("9989051620750914585850546081941653841776809718687451684622678807385399211877")
        );
    }

    #[test]
    fn every_supported_arity_hashes() {
        for n in 1..=POSEIDON_MAX_INPUTS as u64 {
            assert!(poseidon_hash(&counting(n)).is_ok(), "arity {n}");
        }
        assert_eq!(
            poseidon_hash(&counting(15)).unwrap(),
            decimal("4203130618016961831408770638653325366880478848856764494148034853759773445968")
        );
    }

    #[test]
    fn record_digest_is_pinned() {
        assert_eq!(
            hash(&sample()).unwrap(),
            decimal("20557914375975194910199283715248469230817233566774964721377494579388226613327")
        );
    }

    #[test]
    fn digest_is_deterministic() {
        let record = sample();
        assert_eq!(hash(&record).unwrap(), hash(&record.clone()).unwrap());
    }

    #[test]
    fn rows_and_typed_records_agree() {
        let rows: Vec<Vec<i64>> = sample()
            .minutiae()
            .iter()
            .map(|m| m.fields().iter().map(|&v| v as i64).collect())
            .collect();
        assert_eq!(hash_rows(&rows).unwrap(), hash(&sample()).unwrap());
    }

    #[test]
    fn wrong_minutia_count_is_a_shape_error() {
        let mut minutiae = sample().minutiae().to_vec();
        minutiae.pop();
        let short = FingerprintRecord::new(minutiae);
        assert!(matches!(hash(&short), Err(HashError::Shape(_))));
    }

    #[test]
    fn wrong_field_count_is_a_shape_error() {
        let mut rows = vec![vec![1, 2, 3]; N_MINUTIAE];
        rows[2] = vec![1, 2];
        assert!(matches!(hash_rows(&rows), Err(HashError::Shape(_))));
    }

    #[test]
    fn out_of_range_row_is_rejected() {
        let mut rows = vec![vec![1, 2, 3]; N_MINUTIAE];
        rows[0] = vec![1, 2, 400];
        assert!(matches!(hash_rows(&rows), Err(HashError::Record(_))));
    }

    #[test]
    fn arity_above_sixteen_is_a_capacity_error() {
        let inputs = vec![FieldElement::zero(); POSEIDON_MAX_INPUTS + 1];
        assert_eq!(
            poseidon_hash(&inputs),
            Err(HashError::Capacity { len: 17, max: 16 })
        );
        assert!(poseidon_hash(&inputs[..POSEIDON_MAX_INPUTS]).is_ok());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn single_field_change_changes_digest(
            idx in 0..N_MINUTIAE,
            field in 0..3usize,
            delta in 1i64..10,
        ) {
            let base = sample();
            let mut rows: Vec<[i64; 3]> = base
                .minutiae()
                .iter()
                .map(|m| m.fields().map(|v| v as i64))
                .collect();
            let limit = if field == 2 { 89 } else { 60 };
            let v = rows[idx][field];
            rows[idx][field] = if v + delta <= limit { v + delta } else { v - delta };
            let changed = FingerprintRecord::new(
                rows.iter().map(|&[x, y, a]| Minutia::new(x, y, a).unwrap()).collect(),
            );
            prop_assert_ne!(hash(&changed).unwrap(), hash(&base).unwrap());
        }
    }
}
