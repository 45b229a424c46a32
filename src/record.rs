/**
 * Fingerprint Records
 * Fixed-shape minutiae records as consumed by the matching circuit
 */

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::RecordError;

/// Minutiae per fingerprint.
pub const N_MINUTIAE: usize = 5;
/// Records held in the private database.
pub const DB_SIZE: usize = 5;
/// Inclusive upper bound of both coordinates.
pub const MAX_COORD: u32 = 60;
/// Exclusive upper bound of the orientation.
pub const ANGLE_RANGE: u32 = 90;

/// A feature point. Serialized as `[x, y, angle]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "[u32; 3]", try_from = "[i64; 3]")]
pub struct Minutia {
    x: u32,
    y: u32,
    angle: u32,
}

impl Minutia {
    pub fn new(x: i64, y: i64, angle: i64) -> Result<Self, RecordError> {
        Ok(Self {
            x: bounded("x", x, MAX_COORD as i64)?,
            y: bounded("y", y, MAX_COORD as i64)?,
            angle: bounded("angle", angle, ANGLE_RANGE as i64 - 1)?,
        })
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            x: rng.gen_range(0..=MAX_COORD),
            y: rng.gen_range(0..=MAX_COORD),
            angle: rng.gen_range(0..ANGLE_RANGE),
        }
    }

    pub fn x(&self) -> u32 {
        self.x
    }

    pub fn y(&self) -> u32 {
        self.y
    }

    pub fn angle(&self) -> u32 {
        self.angle
    }

    pub fn fields(&self) -> [u32; 3] {
        [self.x, self.y, self.angle]
    }

    /// Shifts every component by at most `jitter`, clamped to the valid ranges.
    fn jittered<R: Rng + ?Sized>(&self, rng: &mut R, jitter: i64) -> Self {
        let mut nudge = |v: u32, max: u32| -> u32 {
            let shifted = v as i64 + rng.gen_range(-jitter..=jitter);
            shifted.clamp(0, max as i64) as u32
        };
        Self {
            x: nudge(self.x, MAX_COORD),
            y: nudge(self.y, MAX_COORD),
            angle: nudge(self.angle, ANGLE_RANGE - 1),
        }
    }
}

fn bounded(field: &'static str, value: i64, max: i64) -> Result<u32, RecordError> {
    if !(0..=max).contains(&value) {
        return Err(RecordError::OutOfRange { field, value, max });
    }
    Ok(value as u32)
}

impl From<Minutia> for [u32; 3] {
    fn from(m: Minutia) -> Self {
        m.fields()
    }
}

impl TryFrom<[i64; 3]> for Minutia {
    type Error = RecordError;

    fn try_from([x, y, angle]: [i64; 3]) -> Result<Self, Self::Error> {
        Minutia::new(x, y, angle)
    }
}

/// Ordered minutiae of one fingerprint. Order is significant: it fixes the
/// row-major flattening fed to the hash.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FingerprintRecord(Vec<Minutia>);

impl FingerprintRecord {
    pub fn new(minutiae: Vec<Minutia>) -> Self {
        Self(minutiae)
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self((0..N_MINUTIAE).map(|_| Minutia::random(rng)).collect())
    }

    /// A noisy re-capture of this record, used to plant a match in demo data.
    pub fn perturbed<R: Rng + ?Sized>(&self, rng: &mut R, jitter: i64) -> Self {
        Self(self.0.iter().map(|m| m.jittered(rng, jitter)).collect())
    }

    pub fn minutiae(&self) -> &[Minutia] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `[x0, y0, a0, x1, y1, a1, ...]`
    pub fn flatten(&self) -> Vec<u32> {
        self.0.iter().flat_map(Minutia::fields).collect()
    }
}
