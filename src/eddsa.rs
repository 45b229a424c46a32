/**
 * Signer / Verifier
 * EdDSA over Baby Jubjub with a Poseidon challenge, signing field elements
 * directly so the signed value is exactly the record digest
 */

use std::fmt;

use blake_hash::{Blake512, Digest as _};
use num_bigint::BigUint;
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};

use crate::babyjub::{base8, suborder, Point};
use crate::error::SigningError;
use crate::field::FieldElement;
use crate::hasher::{poseidon_hash, Digest};

pub const SEED_LEN: usize = 31;

/// Secret signing seed. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretSeed([u8; SEED_LEN]);

impl SecretSeed {
    pub fn from_bytes(bytes: [u8; SEED_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SEED_LEN] {
        &self.0
    }

    fn expand(&self) -> [u8; 64] {
        expand(&self.0)
    }
}

/// Blake-512 of the private key: low half is the pruned secret scalar, high
/// half keys the deterministic nonce. Matches iden3 `prv2pub`.
fn expand(private_key: &[u8]) -> [u8; 64] {
    let mut out = [0u8; 64];
    out.copy_from_slice(&Blake512::digest(private_key));
    out
}

impl fmt::Debug for SecretSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretSeed(..)")
    }
}

fn derive_public_key(expanded: &[u8; 64]) -> PublicKey {
    base8().mul_scalar(&(secret_scalar(expanded) >> 3u32))
}

fn secret_scalar(expanded: &[u8; 64]) -> BigUint {
    let mut k = [0u8; 32];
    k.copy_from_slice(&expanded[..32]);
    k[0] &= 0xF8;
    k[31] &= 0x7F;
    k[31] |= 0x40;
    BigUint::from_bytes_le(&k)
}

pub type PublicKey = Point;

#[derive(Clone, Debug)]
pub struct KeyPair {
    seed: SecretSeed,
    public_key: PublicKey,
}

impl KeyPair {
    /// Deterministic: the same seed always yields the same public key.
    pub fn from_seed(seed: SecretSeed) -> Self {
        let public_key = derive_public_key(&seed.expand());
        Self { seed, public_key }
    }

    pub fn seed(&self) -> &SecretSeed {
        &self.seed
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }
}

/// `(R8, S)`; wire form `[R8x, R8y, S]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "[FieldElement; 3]", from = "[FieldElement; 3]")]
pub struct Signature {
    pub r8: Point,
    pub s: FieldElement,
}

impl From<Signature> for [FieldElement; 3] {
    fn from(sig: Signature) -> Self {
        [sig.r8.x(), sig.r8.y(), sig.s]
    }
}

impl From<[FieldElement; 3]> for Signature {
    fn from([x, y, s]: [FieldElement; 3]) -> Self {
        Signature {
            r8: Point::from_coordinates(x, y),
            s,
        }
    }
}

/// Draws a fresh 31-byte seed from the OS CSPRNG.
pub fn generate_key_pair() -> Result<KeyPair, SigningError> {
    let mut bytes = [0u8; SEED_LEN];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| SigningError::Entropy)?;
    Ok(KeyPair::from_seed(SecretSeed(bytes)))
}

fn challenge(r8: &Point, a: &PublicKey, digest: &Digest) -> Result<BigUint, SigningError> {
    let hm = poseidon_hash(&[r8.x(), r8.y(), a.x(), a.y(), digest.clone()])?;
    Ok(hm.into_biguint())
}

/// Deterministic in `(seed, digest)`.
pub fn sign(seed: &SecretSeed, digest: &Digest) -> Result<Signature, SigningError> {
    sign_expanded(&seed.expand(), digest)
}

fn sign_expanded(expanded: &[u8; 64], digest: &Digest) -> Result<Signature, SigningError> {
    let s = secret_scalar(expanded);
    let a = base8().mul_scalar(&(&s >> 3u32));

    let mut nonce = Blake512::new();
    nonce.update(&expanded[32..]);
    nonce.update(digest.to_le_bytes32());
    let r = BigUint::from_bytes_le(&nonce.finalize()) % suborder();

    let r8 = base8().mul_scalar(&r);
    let hm = challenge(&r8, &a, digest)?;
    let big_s = (r + hm * s) % suborder();

    Ok(Signature {
        r8,
        s: FieldElement::reduce(&big_s),
    })
}

/// Checks `B8·S == R8 + 8·hm·A`. Pure; malformed inputs verify as `false`.
pub fn verify(digest: &Digest, signature: &Signature, public_key: &PublicKey) -> bool {
    if !signature.r8.is_on_curve() || !public_key.is_on_curve() {
        return false;
    }
    if signature.s.as_biguint() >= suborder() {
        return false;
    }
    let Ok(hm) = challenge(&signature.r8, public_key, digest) else {
        return false;
    };
    let lhs = base8().mul_scalar(signature.s.as_biguint());
    let rhs = signature.r8.add(&public_key.mul_scalar(&(hm * 8u32)));
    lhs == rhs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::to_field;

    fn fixed_keys(fill: u8) -> KeyPair {
        KeyPair::from_seed(SecretSeed::from_bytes([fill; SEED_LEN]))
    }

    #[test]
    fn public_key_is_a_function_of_the_seed() {
        assert_eq!(fixed_keys(7).public_key(), fixed_keys(7).public_key());
        assert_ne!(fixed_keys(7).public_key(), fixed_keys(8).public_key());
        assert!(fixed_keys(7).public_key().is_on_curve());
    }

    #[test]
    fn signatures_verify() {
        let keys = generate_key_pair().unwrap();
        let digest = to_field(123456789u64).unwrap();
        let sig = sign(keys.seed(), &digest).unwrap();
        assert!(verify(&digest, &sig, keys.public_key()));
    }

    #[test]
    fn signing_is_deterministic() {
        let keys = fixed_keys(3);
        let digest = to_field(42u32).unwrap();
        assert_eq!(
            sign(keys.seed(), &digest).unwrap(),
            sign(keys.seed(), &digest).unwrap()
        );
    }

    #[test]
    fn mutated_digest_is_rejected() {
        let keys = fixed_keys(1);
        let digest = to_field(1000u32).unwrap();
        let sig = sign(keys.seed(), &digest).unwrap();
        assert!(!verify(&to_field(1001u32).unwrap(), &sig, keys.public_key()));
    }

    #[test]
    fn mutated_public_key_is_rejected() {
        let keys = fixed_keys(1);
        let digest = to_field(1000u32).unwrap();
        let sig = sign(keys.seed(), &digest).unwrap();
        assert!(!verify(&digest, &sig, fixed_keys(2).public_key()));

        let off_curve = Point::from_coordinates(keys.public_key().y(), keys.public_key().x());
        assert!(!verify(&digest, &sig, &off_curve));
    }

    #[test]
    fn oversized_s_is_rejected() {
        let keys = fixed_keys(9);
        let digest = to_field(5u32).unwrap();
        let mut sig = sign(keys.seed(), &digest).unwrap();
        sig.s = FieldElement::reduce(&(sig.s.as_biguint() + suborder()));
        assert!(!verify(&digest, &sig, keys.public_key()));
    }

    #[test]
    fn wire_form_is_three_decimal_strings() {
        let keys = fixed_keys(4);
        let sig = sign(keys.seed(), &to_field(9u32).unwrap()).unwrap();
        let json = serde_json::to_value(&sig).unwrap();
        let parts = json.as_array().unwrap();
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.as_str().is_some_and(|s| s.bytes().all(|b| b.is_ascii_digit()))));
        let back: Signature = serde_json::from_value(json).unwrap();
        assert_eq!(back, sig);
    }

    fn decimal(text: &str) -> FieldElement {
        crate::field::decode(text).unwrap()
    }

    // circomlibjs eddsa test: private key 00010203..0001, message bytes 00..09 (LE).
    #[test]
    fn matches_circomlib_vector() {
        let mut private_key = [0u8; 32];
        for (i, b) in private_key.iter_mut().enumerate() {
            *b = (i % 10) as u8;
        }
        let expanded = expand(&private_key);
        let a = derive_public_key(&expanded);
        assert_eq!(
            a.x(),
            decimal("13277427435165878497778222415993513565335242147425444199013288855685581939618")
        );
        assert_eq!(
            a.y(),
            decimal("13622229784656158136036771217484571176836296686641868549125388198837476602820")
        );

        let digest = decimal("42649378395939397566720");
        let sig = sign_expanded(&expanded, &digest).unwrap();
        assert_eq!(
            sig.r8.x(),
            decimal("11384336176656855268977457483345535180380036354188103142384839473266348197733")
        );
        assert_eq!(
            sig.r8.y(),
            decimal("15383486972088797283337779941324724402501462225528836549661220478783371668959")
        );
        assert_eq!(
            sig.s,
            decimal("1672775540645840396591609181675628451599263765380031905495115170613215233181")
        );
        assert!(verify(&digest, &sig, &a));
    }

    #[test]
    fn fixed_seed_vector() {
        let keys = fixed_keys(7);
        assert_eq!(
            keys.public_key(),
            &Point::from_coordinates(
                decimal("16845399507483113481643120065631354903120154070286676401464537333343974343775"),
                decimal("2269379100012756824898394303847446122822603503209963571636551812930740452617"),
            )
        );
        let sig = sign(keys.seed(), &to_field(42u32).unwrap()).unwrap();
        assert_eq!(
            sig,
            Signature {
                r8: Point::from_coordinates(
                    decimal("4566531948041978531129804642538401371530519549335194885382387359050990547844"),
                    decimal("21797497756867730393001369855006661129572694700655502508650902871476785521516"),
                ),
                s: decimal("182605885642133458112090176246533941651575211455960948527687470043164055628"),
            }
        );
    }

    #[test]
    fn seed_debug_is_redacted() {
        assert_eq!(format!("{:?}", fixed_keys(1).seed()), "SecretSeed(..)");
    }
}
