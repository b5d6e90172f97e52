//! ChaCha20 (RFC 8439) in counter mode.
//!
//! Public inputs, in allocation order: nonce (3 little-endian words), initial
//! block counter, plaintext words, ciphertext words. The key is private.

use crate::{
    bits::UInt32,
    compiler::{CircuitDescriptor, Compiler},
    error::{KeygenError, Result},
};

pub const KEY_BYTES: usize = 32;
pub const NONCE_BYTES: usize = 12;
pub const BLOCK_WORDS: usize = 16;
pub const BLOCK_BYTES: usize = 4 * BLOCK_WORDS;
pub const ROUNDS: usize = 20;
pub const BLOCKS: usize = 4;

const SIGMA: [u32; 4] = [0x6170_7865, 0x3320_646e, 0x7962_2d32, 0x6b20_6574];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChaChaCircuit {
    pub key: Vec<u8>,
    pub nonce: [u8; NONCE_BYTES],
    pub counter: u32,
    pub plaintext: Vec<u8>,
    pub rounds: usize,
}

impl Default for ChaChaCircuit {
    fn default() -> Self {
        Self::with_blocks(BLOCKS)
    }
}

impl ChaChaCircuit {
    /// Zero-filled instance of the given shape.
    pub fn with_blocks(blocks: usize) -> Self {
        ChaChaCircuit {
            key: vec![0; KEY_BYTES],
            nonce: [0; NONCE_BYTES],
            counter: 0,
            plaintext: vec![0; blocks * BLOCK_BYTES],
            rounds: ROUNDS,
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
        self.rounds = rounds;
        self
    }

    pub fn blocks(&self) -> usize {
        self.plaintext.len() / BLOCK_BYTES
    }

    fn validate(&self) -> Result<()> {
        if self.key.len() != KEY_BYTES {
            return Err(KeygenError::Configuration(format!(
                "chacha20 expects a {KEY_BYTES}-byte key, descriptor declares {}",
                self.key.len()
            )));
        }
        if self.plaintext.is_empty() || self.plaintext.len() % BLOCK_BYTES != 0 {
            return Err(KeygenError::Configuration(format!(
                "chacha20 plaintext must be a non-zero multiple of {BLOCK_BYTES} bytes, got {}",
                self.plaintext.len()
            )));
        }
        if self.rounds == 0 || self.rounds % 2 != 0 {
            return Err(KeygenError::Configuration(format!(
                "chacha20 round count must be even and non-zero, got {}",
                self.rounds
            )));
        }
        Ok(())
    }
}

fn le_words(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
        .collect()
}

fn add(compiler: &mut Compiler, a: &UInt32, b: &UInt32) -> UInt32 {
    UInt32::add_many(compiler, &[a.clone(), b.clone()])
}

fn quarter_round(
    compiler: &mut Compiler,
    x: &mut [UInt32],
    a: usize,
    b: usize,
    c: usize,
    d: usize,
) {
    x[a] = add(compiler, &x[a], &x[b]);
    x[d] = x[d].xor(compiler, &x[a]).rotl(16);
    x[c] = add(compiler, &x[c], &x[d]);
    x[b] = x[b].xor(compiler, &x[c]).rotl(12);
    x[a] = add(compiler, &x[a], &x[b]);
    x[d] = x[d].xor(compiler, &x[a]).rotl(8);
    x[c] = add(compiler, &x[c], &x[d]);
    x[b] = x[b].xor(compiler, &x[c]).rotl(7);
}

/// Keystream words of one block.
fn block(
    compiler: &mut Compiler,
    key: &[UInt32],
    counter: &UInt32,
    nonce: &[UInt32],
    rounds: usize,
) -> Vec<UInt32> {
    let initial: Vec<UInt32> = SIGMA
        .iter()
        .map(|&c| UInt32::constant(c))
        .chain(key.iter().cloned())
        .chain(std::iter::once(counter.clone()))
        .chain(nonce.iter().cloned())
        .collect();

    let mut x = initial.clone();
    for _ in 0..rounds / 2 {
        quarter_round(compiler, &mut x, 0, 4, 8, 12);
        quarter_round(compiler, &mut x, 1, 5, 9, 13);
        quarter_round(compiler, &mut x, 2, 6, 10, 14);
        quarter_round(compiler, &mut x, 3, 7, 11, 15);
        quarter_round(compiler, &mut x, 0, 5, 10, 15);
        quarter_round(compiler, &mut x, 1, 6, 11, 12);
        quarter_round(compiler, &mut x, 2, 7, 8, 13);
        quarter_round(compiler, &mut x, 3, 4, 9, 14);
    }

    x.iter()
        .zip(initial.iter())
        .map(|(mixed, input)| add(compiler, mixed, input))
        .collect()
}

impl CircuitDescriptor for ChaChaCircuit {
    fn name(&self) -> &str {
        "chacha20"
    }

    fn key_len(&self) -> usize {
        self.key.len()
    }

    fn block_count(&self) -> Option<usize> {
        Some(self.blocks())
    }

    fn synthesize(&self, compiler: &mut Compiler) -> Result<()> {
        self.validate()?;

        let key: Vec<UInt32> = le_words(&self.key)
            .into_iter()
            .map(|w| UInt32::alloc(compiler, w))
            .collect();
        let nonce: Vec<UInt32> = le_words(&self.nonce)
            .into_iter()
            .map(|w| UInt32::input(compiler, w))
            .collect();
        let counter = UInt32::input(compiler, self.counter);
        let plaintext: Vec<UInt32> = le_words(&self.plaintext)
            .into_iter()
            .map(|w| UInt32::input(compiler, w))
            .collect();

        for (i, chunk) in plaintext.chunks(BLOCK_WORDS).enumerate() {
            let block_counter = if i == 0 {
                counter.clone()
            } else {
                add(compiler, &counter, &UInt32::constant(i as u32))
            };
            let keystream = block(compiler, &key, &block_counter, &nonce, self.rounds);
            for (word, stream) in chunk.iter().zip(keystream.iter()) {
                word.xor(compiler, stream).expose(compiler);
            }
        }
        Ok(())
    }
}
