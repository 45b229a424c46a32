/**
 * Field Codec
 * BN254 scalar-field elements backed by arbitrary-precision integers,
 * and their decimal-string wire encoding
 */

use std::fmt;
use std::sync::OnceLock;

use ff::PrimeField;
use num_bigint::{BigInt, BigUint};
use num_traits::Zero;
use poseidon_rs::Fr;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::CodecError;

/// Order of the BN254 scalar field; the native field of Poseidon and Baby Jubjub.
pub const MODULUS: &str =
    "21888242871839275222246405745257275088548364400416034343698204186575808495617";

pub fn modulus() -> &'static BigUint {
    static CELL: OnceLock<BigUint> = OnceLock::new();
    CELL.get_or_init(|| parse_decimal(MODULUS).unwrap_or_default())
}

/// An integer in `[0, MODULUS)`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldElement(BigUint);

impl FieldElement {
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    /// Range-checked constructor.
    pub fn new(value: BigUint) -> Result<Self, CodecError> {
        if &value >= modulus() {
            return Err(CodecError::Range(value.to_str_radix(10)));
        }
        Ok(Self(value))
    }

    /// Reduces any integer into the field.
    pub fn reduce(value: &BigUint) -> Self {
        Self(value % modulus())
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    pub fn into_biguint(self) -> BigUint {
        self.0
    }

    /// 32-byte little-endian representation.
    pub fn to_le_bytes32(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        let bytes = self.0.to_bytes_le();
        out[..bytes.len()].copy_from_slice(&bytes);
        out
    }

    /// Converts into the Montgomery-form element used by the Poseidon permutation.
    pub fn to_fr(&self) -> Result<Fr, CodecError> {
        let text = encode(self);
        Fr::from_str(&text).ok_or(CodecError::Format(text))
    }

    pub fn from_fr(fr: &Fr) -> Self {
        let repr = fr.into_repr();
        let bytes: Vec<u8> = repr
            .as_ref()
            .iter()
            .flat_map(|limb| limb.to_le_bytes())
            .collect();
        Self(BigUint::from_bytes_le(&bytes))
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(self))
    }
}

/// Lifts a native integer into the field. Negative values and values at or
/// above the modulus are rejected rather than wrapped.
pub fn to_field<T>(value: T) -> Result<FieldElement, CodecError>
where
    BigInt: From<T>,
{
    let value = BigInt::from(value);
    let unsigned = value
        .to_biguint()
        .ok_or_else(|| CodecError::Range(value.to_str_radix(10)))?;
    FieldElement::new(unsigned)
}

pub fn encode(value: &FieldElement) -> String {
    value.0.to_str_radix(10)
}

/// Encodes a byte sequence as the decimal form of its big-endian integer value.
pub fn encode_bytes(bytes: &[u8]) -> String {
    BigUint::from_bytes_be(bytes).to_str_radix(10)
}

pub fn decode(text: &str) -> Result<FieldElement, CodecError> {
    let value = parse_decimal(text).ok_or_else(|| CodecError::Format(text.to_string()))?;
    FieldElement::new(value)
}

/// Inverse of [`encode_bytes`]; `len` restores leading zero bytes.
pub fn decode_bytes(text: &str, len: usize) -> Result<Vec<u8>, CodecError> {
    let value = parse_decimal(text).ok_or_else(|| CodecError::Format(text.to_string()))?;
    let raw = if value.is_zero() {
        Vec::new()
    } else {
        value.to_bytes_be()
    };
    if raw.len() > len {
        return Err(CodecError::Range(text.to_string()));
    }
    let mut out = vec![0u8; len - raw.len()];
    out.extend_from_slice(&raw);
    Ok(out)
}

fn parse_decimal(text: &str) -> Option<BigUint> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    BigUint::parse_bytes(text.as_bytes(), 10)
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode(self))
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FieldElementVisitor)
    }
}

struct FieldElementVisitor;

impl<'de> Visitor<'de> for FieldElementVisitor {
    type Value = FieldElement;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal string or non-negative integer below the field modulus")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<FieldElement, E> {
        decode(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<FieldElement, E> {
        to_field(v).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<FieldElement, E> {
        to_field(v).map_err(E::custom)
    }
}
