//! AES-128 / AES-256 in counter mode.
//!
//! The counter block is `nonce || counter`, the counter encoded big-endian and
//! incremented per block. Public inputs, in allocation order: nonce bytes,
//! initial counter, plaintext bytes, ciphertext bytes. The key is private.
//!
//! Bytes are little-endian bit vectors of length 8. The state is column-major:
//! byte `r + 4c` sits in row `r` of column `c`.

use curve25519_dalek::Scalar;
use serde::{Deserialize, Serialize};

use crate::{
    bits::{constant_bits, expose, input_bits, pack, private_bits, value_of, xor_bits, Bit, UInt32},
    circuit::{LinearCombination, Term},
    compiler::{CircuitDescriptor, Compiler},
    error::{KeygenError, Result},
    scalar::from_bool,
};

pub const BLOCK_BYTES: usize = 16;
pub const NONCE_BYTES: usize = 12;
/// Default CTR length. One 16-byte block rather than a 64-byte chunk, so the
/// AES circuits stay smaller than the 4-block ChaCha20 one.
pub const BLOCKS: usize = 1;

const RCON: [u8; 11] = [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80, 0x1b, 0x36];

const fn gf_mul(mut a: u8, mut b: u8) -> u8 {
    let mut p = 0u8;
    while b != 0 {
        if b & 1 != 0 {
            p ^= a;
        }
        let carry = a & 0x80;
        a <<= 1;
        if carry != 0 {
            a ^= 0x1b;
        }
        b >>= 1;
    }
    p
}

/// a^254, which is a^-1 for a != 0 and 0 for a = 0.
const fn gf_inv(a: u8) -> u8 {
    let mut result = 1u8;
    let mut base = a;
    let mut e = 254u8;
    while e > 0 {
        if e & 1 != 0 {
            result = gf_mul(result, base);
        }
        base = gf_mul(base, base);
        e >>= 1;
    }
    result
}

const fn build_sbox() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let b = gf_inv(i as u8);
        table[i] = b
            ^ b.rotate_left(1)
            ^ b.rotate_left(2)
            ^ b.rotate_left(3)
            ^ b.rotate_left(4)
            ^ 0x63;
        i += 1;
    }
    table
}

pub const SBOX: [u8; 256] = build_sbox();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeySize {
    Aes128,
    Aes256,
}

impl KeySize {
    pub fn key_bytes(&self) -> usize {
        match self {
            KeySize::Aes128 => 16,
            KeySize::Aes256 => 32,
        }
    }

    pub fn rounds(&self) -> usize {
        match self {
            KeySize::Aes128 => 10,
            KeySize::Aes256 => 14,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            KeySize::Aes128 => "aes128",
            KeySize::Aes256 => "aes256",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AesCircuit {
    pub key_size: KeySize,
    pub key: Vec<u8>,
    pub nonce: [u8; NONCE_BYTES],
    pub counter: u32,
    pub plaintext: Vec<u8>,
    /// Overrides the standard round count.
    pub rounds: Option<usize>,
}

impl AesCircuit {
    /// Zero-filled instance of the default shape.
    pub fn new(key_size: KeySize) -> Self {
        Self::with_blocks(key_size, BLOCKS)
    }

    pub fn with_blocks(key_size: KeySize, blocks: usize) -> Self {
        AesCircuit {
            key_size,
            key: vec![0; key_size.key_bytes()],
            nonce: [0; NONCE_BYTES],
            counter: 0,
            plaintext: vec![0; blocks * BLOCK_BYTES],
            rounds: None,
        }
    }

    pub fn with_key(mut self, key: &[u8]) -> Self {
        self.key = key.to_vec();
        self
    }

    pub fn with_nonce(mut self, nonce: [u8; NONCE_BYTES]) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn with_counter(mut self, counter: u32) -> Self {
        self.counter = counter;
        self
    }

    pub fn with_plaintext(mut self, plaintext: &[u8]) -> Self {
        self.plaintext = plaintext.to_vec();
        self
    }

    pub fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = Some(rounds);
        self
    }

    pub fn blocks(&self) -> usize {
        self.plaintext.len() / BLOCK_BYTES
    }

    pub fn rounds(&self) -> usize {
        self.rounds.unwrap_or(self.key_size.rounds())
    }

    fn validate(&self) -> Result<()> {
        let name = self.key_size.name();
        if self.key.len() != self.key_size.key_bytes() {
            return Err(KeygenError::Configuration(format!(
                "{name} expects a {}-byte key, descriptor declares {}",
                self.key_size.key_bytes(),
                self.key.len()
            )));
        }
        if self.plaintext.is_empty() || self.plaintext.len() % BLOCK_BYTES != 0 {
            return Err(KeygenError::Configuration(format!(
                "{name} plaintext must be a non-zero multiple of {BLOCK_BYTES} bytes, got {}",
                self.plaintext.len()
            )));
        }
        let rounds = self.rounds();
        if rounds == 0 || rounds > self.key_size.rounds() {
            return Err(KeygenError::Configuration(format!(
                "{name} round count must be in 1..={}, got {rounds}",
                self.key_size.rounds()
            )));
        }
        Ok(())
    }
}

/// Sixteen boolean selectors with exactly the one at the nibble's value set.
fn one_hot(compiler: &mut Compiler, nibble: &[Bit]) -> Vec<Term> {
    let index = value_of(nibble) as usize;
    let selectors: Vec<Term> = (0..16)
        .map(|i| {
            let selector = compiler.alloc_variable(from_bool(i == index));
            compiler.enforce_boolean(selector);
            selector
        })
        .collect();

    let count = selectors.iter().map(|&s| (s, Scalar::ONE)).collect();
    compiler.enforce_equal(count, LinearCombination::one());
    let position = selectors
        .iter()
        .enumerate()
        .map(|(i, &s)| (s, Scalar::from(i as u64)))
        .collect();
    compiler.enforce_equal(position, pack(nibble));
    selectors
}

/// S-box lookup as a 16x16 table: one-hot both nibbles, then for every output
/// bit and every high nibble multiply the selector by the linear row sum.
fn sub_byte(compiler: &mut Compiler, byte: &[Bit]) -> Vec<Bit> {
    let out = SBOX[value_of(byte) as usize];
    if byte.iter().all(Bit::is_constant) {
        return constant_bits(out.into(), 8);
    }

    let lo = one_hot(compiler, &byte[..4]);
    let hi = one_hot(compiler, &byte[4..]);

    let mut result = Vec::with_capacity(8);
    for k in 0..8 {
        let mut bit = LinearCombination::zero();
        for (i, &selector) in hi.iter().enumerate() {
            let row: LinearCombination = lo
                .iter()
                .enumerate()
                .filter(|&(j, _)| (SBOX[16 * i + j] >> k) & 1 == 1)
                .map(|(_, &l)| (l, Scalar::ONE))
                .collect();
            let product =
                compiler.alloc_variable(compiler.value(selector) * compiler.evaluate(&row));
            compiler.enforce(selector.into(), row, product.into());
            bit = bit + product.into();
        }
        result.push(Bit::Expr(bit, (out >> k) & 1 == 1));
    }
    result
}

/// Multiplication by x in GF(2^8).
fn xtime(compiler: &mut Compiler, a: &[Bit]) -> Vec<Bit> {
    let carry = &a[7];
    vec![
        carry.clone(),
        Bit::xor(compiler, &a[0], carry),
        a[1].clone(),
        Bit::xor(compiler, &a[2], carry),
        Bit::xor(compiler, &a[3], carry),
        a[4].clone(),
        a[5].clone(),
        a[6].clone(),
    ]
}

fn shift_rows(state: &[Vec<Bit>]) -> Vec<Vec<Bit>> {
    (0..BLOCK_BYTES)
        .map(|i| {
            let (r, c) = (i % 4, i / 4);
            state[r + 4 * ((c + r) % 4)].clone()
        })
        .collect()
}

fn mix_columns(compiler: &mut Compiler, state: &[Vec<Bit>]) -> Vec<Vec<Bit>> {
    let mut out = Vec::with_capacity(BLOCK_BYTES);
    for column in state.chunks(4) {
        let pairs: Vec<Vec<Bit>> = (0..4)
            .map(|i| xor_bits(compiler, &column[i], &column[(i + 1) % 4]))
            .collect();
        let all = xor_bits(compiler, &pairs[0], &pairs[2]);
        for i in 0..4 {
            let doubled = xtime(compiler, &pairs[i]);
            let mixed = xor_bits(compiler, &column[i], &all);
            out.push(xor_bits(compiler, &mixed, &doubled));
        }
    }
    out
}

fn add_round_key(
    compiler: &mut Compiler,
    state: &[Vec<Bit>],
    round_key: &[Vec<Bit>],
) -> Vec<Vec<Bit>> {
    state
        .iter()
        .zip(round_key.iter())
        .map(|(s, k)| xor_bits(compiler, s, k))
        .collect()
}

/// Round key bytes for rounds 0..=rounds, flattened word by word.
fn expand_key(compiler: &mut Compiler, key: &[Vec<Bit>], rounds: usize) -> Vec<Vec<Bit>> {
    let nk = key.len() / 4;
    let mut words: Vec<Vec<Vec<Bit>>> = key.chunks(4).map(|w| w.to_vec()).collect();
    for i in nk..4 * (rounds + 1) {
        let mut temp = words[i - 1].clone();
        if i % nk == 0 {
            temp.rotate_left(1);
            temp = temp.iter().map(|b| sub_byte(compiler, b)).collect();
            temp[0] = xor_bits(compiler, &temp[0], &constant_bits(RCON[i / nk].into(), 8));
        } else if nk > 6 && i % nk == 4 {
            temp = temp.iter().map(|b| sub_byte(compiler, b)).collect();
        }
        let word = words[i - nk]
            .iter()
            .zip(temp.iter())
            .map(|(a, b)| xor_bits(compiler, a, b))
            .collect();
        words.push(word);
    }
    words.into_iter().flatten().collect()
}

fn encrypt_block(
    compiler: &mut Compiler,
    input: &[Vec<Bit>],
    round_keys: &[Vec<Bit>],
    rounds: usize,
) -> Vec<Vec<Bit>> {
    let mut state = add_round_key(compiler, input, &round_keys[..BLOCK_BYTES]);
    for round in 1..=rounds {
        let substituted: Vec<Vec<Bit>> = state.iter().map(|b| sub_byte(compiler, b)).collect();
        let mut shifted = shift_rows(&substituted);
        if round != rounds {
            shifted = mix_columns(compiler, &shifted);
        }
        let round_key = &round_keys[BLOCK_BYTES * round..BLOCK_BYTES * (round + 1)];
        state = add_round_key(compiler, &shifted, round_key);
    }
    state
}

impl CircuitDescriptor for AesCircuit {
    fn name(&self) -> &str {
        self.key_size.name()
    }

    fn key_len(&self) -> usize {
        self.key.len()
    }

    fn block_count(&self) -> Option<usize> {
        Some(self.blocks())
    }

    fn synthesize(&self, compiler: &mut Compiler) -> Result<()> {
        self.validate()?;
        let rounds = self.rounds();

        let key: Vec<Vec<Bit>> = self
            .key
            .iter()
            .map(|&b| private_bits(compiler, b.into(), 8))
            .collect();
        let nonce: Vec<Vec<Bit>> = self
            .nonce
            .iter()
            .map(|&b| input_bits(compiler, b.into(), 8))
            .collect();
        let counter = UInt32::input(compiler, self.counter);
        let plaintext: Vec<Vec<Bit>> = self
            .plaintext
            .iter()
            .map(|&b| input_bits(compiler, b.into(), 8))
            .collect();

        let round_keys = expand_key(compiler, &key, rounds);

        for (i, chunk) in plaintext.chunks(BLOCK_BYTES).enumerate() {
            let block_counter = if i == 0 {
                counter.clone()
            } else {
                UInt32::add_many(compiler, &[counter.clone(), UInt32::constant(i as u32)])
            };
            let mut input = nonce.clone();
            for byte in (0..4).rev() {
                input.push(block_counter.bits()[8 * byte..8 * (byte + 1)].to_vec());
            }

            let keystream = encrypt_block(compiler, &input, &round_keys, rounds);
            for (byte, stream) in chunk.iter().zip(keystream.iter()) {
                let ciphertext = xor_bits(compiler, byte, stream);
                expose(compiler, &ciphertext);
            }
        }
        Ok(())
    }
}
