//! Boolean gadgets shared by the cipher circuits.
//!
//! Bits are carried as linear combinations known to evaluate to 0 or 1, so
//! negation, rotation and table lookups that end in a linear sum cost no
//! constraints. Multi-bit values are little-endian: `bits[0]` is the least
//! significant bit.

use curve25519_dalek::Scalar;

use crate::{
    circuit::{LinearCombination, Term},
    compiler::Compiler,
    scalar::{from_bool, pow2},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bit {
    Constant(bool),
    /// Expression constrained to {0, 1} together with its assigned value.
    Expr(LinearCombination, bool),
}

impl Bit {
    /// Private boolean variable.
    pub fn alloc(compiler: &mut Compiler, value: bool) -> Bit {
        let term = compiler.alloc_variable(from_bool(value));
        compiler.enforce_boolean(term);
        Bit::Expr(term.into(), value)
    }

    pub fn value(&self) -> bool {
        match self {
            Bit::Constant(value) | Bit::Expr(_, value) => *value,
        }
    }

    pub fn lc(&self) -> LinearCombination {
        match self {
            Bit::Constant(true) => LinearCombination::one(),
            Bit::Constant(false) => LinearCombination::zero(),
            Bit::Expr(lc, _) => lc.clone(),
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Bit::Constant(_))
    }

    pub fn not(&self) -> Bit {
        match self {
            Bit::Constant(value) => Bit::Constant(!value),
            Bit::Expr(lc, value) => Bit::Expr(LinearCombination::one() - lc.clone(), !value),
        }
    }

    pub fn xor(compiler: &mut Compiler, a: &Bit, b: &Bit) -> Bit {
        match (a, b) {
            (Bit::Constant(k), other) | (other, Bit::Constant(k)) => {
                if *k {
                    other.not()
                } else {
                    other.clone()
                }
            }
            _ => {
                let value = a.value() ^ b.value();
                let c = compiler.alloc_variable(from_bool(value));
                // 2a * b = a + b - c
                compiler.enforce(
                    a.lc().scaled(Scalar::from(2u8)),
                    b.lc(),
                    a.lc() + b.lc() - c.into(),
                );
                Bit::Expr(c.into(), value)
            }
        }
    }

    pub fn and(compiler: &mut Compiler, a: &Bit, b: &Bit) -> Bit {
        match (a, b) {
            (Bit::Constant(k), other) | (other, Bit::Constant(k)) => {
                if *k {
                    other.clone()
                } else {
                    Bit::Constant(false)
                }
            }
            _ => {
                let value = a.value() & b.value();
                let c = compiler.alloc_variable(from_bool(value));
                compiler.enforce(a.lc(), b.lc(), c.into());
                Bit::Expr(c.into(), value)
            }
        }
    }
}

pub fn xor_bits(compiler: &mut Compiler, a: &[Bit], b: &[Bit]) -> Vec<Bit> {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| Bit::xor(compiler, x, y))
        .collect()
}

/// Σ 2^i · bits[i]
pub fn pack(bits: &[Bit]) -> LinearCombination {
    bits.iter()
        .enumerate()
        .fold(LinearCombination::zero(), |acc, (i, bit)| {
            acc + bit.lc().scaled(pow2(i))
        })
}

pub fn value_of(bits: &[Bit]) -> u64 {
    bits.iter()
        .enumerate()
        .fold(0u64, |acc, (i, bit)| acc | (u64::from(bit.value()) << i))
}

pub fn constant_bits(value: u64, width: usize) -> Vec<Bit> {
    (0..width)
        .map(|i| Bit::Constant((value >> i) & 1 == 1))
        .collect()
}

pub fn private_bits(compiler: &mut Compiler, value: u64, width: usize) -> Vec<Bit> {
    (0..width)
        .map(|i| Bit::alloc(compiler, (value >> i) & 1 == 1))
        .collect()
}

/// Allocates `value` as a public input and decomposes it into `width` bits.
pub fn input_bits(compiler: &mut Compiler, value: u64, width: usize) -> Vec<Bit> {
    let input = compiler.alloc_input(Scalar::from(value));
    let bits = private_bits(compiler, value, width);
    compiler.enforce_equal(pack(&bits), input.into());
    bits
}

/// Publishes the packed value of `bits` as a new public input.
pub fn expose(compiler: &mut Compiler, bits: &[Bit]) -> Term {
    let input = compiler.alloc_input(Scalar::from(value_of(bits)));
    compiler.enforce_equal(pack(bits), input.into());
    input
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UInt32 {
    bits: Vec<Bit>,
}

impl UInt32 {
    pub fn constant(value: u32) -> Self {
        UInt32 {
            bits: constant_bits(value.into(), 32),
        }
    }

    pub fn alloc(compiler: &mut Compiler, value: u32) -> Self {
        UInt32 {
            bits: private_bits(compiler, value.into(), 32),
        }
    }

    pub fn input(compiler: &mut Compiler, value: u32) -> Self {
        UInt32 {
            bits: input_bits(compiler, value.into(), 32),
        }
    }

    pub fn bits(&self) -> &[Bit] {
        &self.bits
    }

    pub fn value(&self) -> u32 {
        value_of(&self.bits) as u32
    }

    pub fn is_constant(&self) -> bool {
        self.bits.iter().all(Bit::is_constant)
    }

    pub fn rotl(&self, by: usize) -> Self {
        let by = by % 32;
        UInt32 {
            bits: (0..32)
                .map(|i| self.bits[(i + 32 - by) % 32].clone())
                .collect(),
        }
    }

    pub fn xor(&self, compiler: &mut Compiler, other: &UInt32) -> Self {
        UInt32 {
            bits: xor_bits(compiler, &self.bits, &other.bits),
        }
    }

    /// Sum modulo 2^32. The full sum is decomposed into bits, carries
    /// included, and the carries are discarded.
    pub fn add_many(compiler: &mut Compiler, words: &[UInt32]) -> Self {
        let total: u64 = words.iter().map(|w| u64::from(w.value())).sum();
        if words.iter().all(UInt32::is_constant) {
            return UInt32::constant(total as u32);
        }

        let max_total = u64::from(u32::MAX) * words.len() as u64;
        let width = (64 - max_total.leading_zeros()) as usize;
        let sum = words
            .iter()
            .fold(LinearCombination::zero(), |acc, w| acc + pack(&w.bits));
        let mut result = private_bits(compiler, total, width);
        compiler.enforce_equal(sum, pack(&result));
        result.truncate(32);
        UInt32 { bits: result }
    }

    pub fn expose(&self, compiler: &mut Compiler) -> Term {
        expose(compiler, &self.bits)
    }
}
