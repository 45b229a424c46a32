/**
 * Baby Jubjub
 * Twisted Edwards curve a·x² + y² = 1 + d·x²·y² over the BN254 scalar field
 */

use std::sync::OnceLock;

use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};

use crate::field::{modulus, FieldElement};

const A: u32 = 168700;
const D: u32 = 168696;

const BASE8_X: &str =
    "5299619240641551281634865583518297030282874472190772894086521144482721001553";
const BASE8_Y: &str =
    "16950150798460657717958625567821834550301663161624707787222815936182638968203";
const SUBORDER: &str =
    "2736030358979909402780800718157159386076813972158567259200215660948447373041";

/// Order ℓ of the prime subgroup generated by [`base8`].
pub fn suborder() -> &'static BigUint {
    static CELL: OnceLock<BigUint> = OnceLock::new();
    CELL.get_or_init(|| BigUint::parse_bytes(SUBORDER.as_bytes(), 10).unwrap_or_default())
}

/// Generator of the prime-order subgroup (8 × the curve generator).
pub fn base8() -> &'static Point {
    static CELL: OnceLock<Point> = OnceLock::new();
    CELL.get_or_init(|| Point {
        x: BigUint::parse_bytes(BASE8_X.as_bytes(), 10).unwrap_or_default(),
        y: BigUint::parse_bytes(BASE8_Y.as_bytes(), 10).unwrap_or_default(),
    })
}

fn add(a: &BigUint, b: &BigUint) -> BigUint {
    (a + b) % modulus()
}

fn sub(a: &BigUint, b: &BigUint) -> BigUint {
    (a + modulus() - b) % modulus()
}

fn mul(a: &BigUint, b: &BigUint) -> BigUint {
    (a * b) % modulus()
}

fn inv(a: &BigUint) -> BigUint {
    let p = modulus();
    a.modpow(&(p - 2u32), p)
}

/// Affine point. Coordinates are kept reduced.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "[FieldElement; 2]", from = "[FieldElement; 2]")]
pub struct Point {
    x: BigUint,
    y: BigUint,
}

impl Point {
    pub fn identity() -> Self {
        Self {
            x: BigUint::zero(),
            y: BigUint::one(),
        }
    }

    pub fn from_coordinates(x: FieldElement, y: FieldElement) -> Self {
        Self {
            x: x.into_biguint(),
            y: y.into_biguint(),
        }
    }

    pub fn x(&self) -> FieldElement {
        FieldElement::reduce(&self.x)
    }

    pub fn y(&self) -> FieldElement {
        FieldElement::reduce(&self.y)
    }

    pub fn is_on_curve(&self) -> bool {
        let x2 = mul(&self.x, &self.x);
        let y2 = mul(&self.y, &self.y);
        let lhs = add(&mul(&BigUint::from(A), &x2), &y2);
        let rhs = add(&BigUint::one(), &mul(&BigUint::from(D), &mul(&x2, &y2)));
        lhs == rhs
    }

    pub fn add(&self, other: &Point) -> Point {
        self.projective().add(&other.projective()).affine()
    }

    /// Double-and-add; `scalar` is not reduced, so callers may pass cofactor multiples.
    pub fn mul_scalar(&self, scalar: &BigUint) -> Point {
        let base = self.projective();
        let mut acc = Projective::identity();
        for i in (0..scalar.bits()).rev() {
            acc = acc.add(&acc);
            if scalar.bit(i) {
                acc = acc.add(&base);
            }
        }
        acc.affine()
    }

    fn projective(&self) -> Projective {
        Projective {
            x: self.x.clone(),
            y: self.y.clone(),
            z: BigUint::one(),
        }
    }
}

impl From<Point> for [FieldElement; 2] {
    fn from(p: Point) -> Self {
        [p.x(), p.y()]
    }
}

impl From<[FieldElement; 2]> for Point {
    fn from([x, y]: [FieldElement; 2]) -> Self {
        Point::from_coordinates(x, y)
    }
}

struct Projective {
    x: BigUint,
    y: BigUint,
    z: BigUint,
}

impl Projective {
    fn identity() -> Self {
        Self {
            x: BigUint::zero(),
            y: BigUint::one(),
            z: BigUint::one(),
        }
    }

    // add-2008-bbjlp; complete for this curve since d is a non-square.
    fn add(&self, q: &Projective) -> Projective {
        let a = mul(&self.z, &q.z);
        let b = mul(&a, &a);
        let c = mul(&self.x, &q.x);
        let d = mul(&self.y, &q.y);
        let e = mul(&BigUint::from(D), &mul(&c, &d));
        let f = sub(&b, &e);
        let g = add(&b, &e);
        let cross = mul(&add(&self.x, &self.y), &add(&q.x, &q.y));
        Projective {
            x: mul(&mul(&a, &f), &sub(&sub(&cross, &c), &d)),
            y: mul(&mul(&a, &g), &sub(&d, &mul(&BigUint::from(A), &c))),
            z: mul(&f, &g),
        }
    }

    fn affine(&self) -> Point {
        let zinv = inv(&self.z);
        Point {
            x: mul(&self.x, &zinv),
            y: mul(&self.y, &zinv),
        }
    }
}
