use curve25519_dalek::Scalar;
use serde::{Deserialize, Serialize};

/// Prime field every constraint system is defined over.
///
/// Spartan commits over ristretto255, so its scalar field
/// (order 2^252 + 27742317777372353535851937790883648493) is the only one
/// available. The field is still recorded in artifacts so a key can never be
/// paired with a constraint system from a different field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Field {
    #[default]
    Ristretto255,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::Ristretto255 => "ristretto255",
        }
    }
}

pub fn from_i64(x: i64) -> Scalar {
    let x_abs = x.unsigned_abs();
    if x < 0 {
        -Scalar::from(x_abs)
    } else {
        Scalar::from(x_abs)
    }
}

pub fn from_bool(b: bool) -> Scalar {
    if b {
        Scalar::ONE
    } else {
        Scalar::ZERO
    }
}

// 2^k for k < 64
pub fn pow2(k: usize) -> Scalar {
    Scalar::from(1u64 << k)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_i64() {
        assert_eq!(from_i64(1234), Scalar::from(1234u32));
        assert_eq!(from_i64(-1234), -Scalar::from(1234u32));
        assert_eq!(from_i64(-2) + Scalar::from(2u8), Scalar::ZERO);
    }

    #[test]
    fn test_pow2() {
        assert_eq!(pow2(0), Scalar::ONE);
        assert_eq!(pow2(32), Scalar::from(4294967296u64));
    }
}
