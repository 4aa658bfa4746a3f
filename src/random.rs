//! Randomness sources for word selection.
//!
//! A [`RandomSource`] only has to produce a uniform index below a bound.
//! [`OsRandom`] is the production source; [`KeystreamRandom`] expands a
//! 32-byte seed into a ChaCha20 keystream so runs can be reproduced.

use std::fmt;

use blake2::{Blake2b512, Digest};
use chacha20::ChaCha20;
use chacha20::cipher::{KeyIvInit, StreamCipher};
use rand::TryRngCore;
use rand::rngs::OsRng;
use zeroize::{Zeroize, Zeroizing};

use crate::error::{DicewareError, Result};

pub const SEED_LEN: usize = 32;

const BUFFER_LEN: usize = 512;

/// Capability to draw a uniformly distributed integer in `[0, bound)`.
///
/// Generators own exactly one source. Sources used from several threads
/// must be one instance per thread.
pub trait RandomSource: Send {
    fn next_index(&mut self, bound: usize) -> Result<usize>;
}

/// Reduces raw 64-bit draws to `[0, bound)` without modulo bias.
///
/// Draws falling into the final, partial block of size `2^64 mod bound`
/// are rejected and redrawn.
pub(crate) fn uniform_below<F>(bound: usize, mut draw: F) -> Result<usize>
where
    F: FnMut() -> Result<u64>,
{
    if bound == 0 {
        return Err(DicewareError::InsufficientPool {
            requested: 1,
            available: 0,
        });
    }

    let bound = bound as u64;
    let remainder = (u64::MAX % bound + 1) % bound;
    let limit = u64::MAX - remainder;

    loop {
        let value = draw()?;
        if value <= limit {
            return Ok((value % bound) as usize);
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(bound, "rejected biased draw");
    }
}

/// Operating system CSPRNG.
#[derive(Debug)]
pub struct OsRandom {
    rng: OsRng,
}

impl OsRandom {
    /// Draws from the OS generator once so an unusable host fails here rather
    /// than halfway through a passphrase.
    pub fn new() -> Result<Self> {
        let mut source = Self { rng: OsRng };
        source.next_u64()?;
        Ok(source)
    }

    fn next_u64(&mut self) -> Result<u64> {
        let value = self.rng.try_next_u64();
        value.map_err(DicewareError::RandomnessUnavailable)
    }
}

impl RandomSource for OsRandom {
    fn next_index(&mut self, bound: usize) -> Result<usize> {
        uniform_below(bound, || self.next_u64())
    }
}

/// Deterministic source reading a ChaCha20 keystream (zero nonce).
///
/// Two instances built from the same seed yield the same index sequence.
pub struct KeystreamRandom {
    cipher: ChaCha20,
    buffer: Zeroizing<[u8; BUFFER_LEN]>,
    pos: usize,
}

impl KeystreamRandom {
    pub fn new(key: &[u8; SEED_LEN]) -> Self {
        let mut cipher = ChaCha20::new(key.into(), &[0u8; 12].into());
        let mut buffer = Zeroizing::new([0u8; BUFFER_LEN]);
        cipher.apply_keystream(&mut buffer[..]);

        Self {
            cipher,
            buffer,
            pos: 0,
        }
    }

    pub fn from_seed_phrase(phrase: &str) -> Self {
        Self::new(&derive_seed(phrase))
    }

    fn next_u64(&mut self) -> u64 {
        if self.pos + 8 > BUFFER_LEN {
            self.buffer.fill(0);
            self.cipher.apply_keystream(&mut self.buffer[..]);
            self.pos = 0;
        }

        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.buffer[self.pos..self.pos + 8]);
        self.pos += 8;

        u64::from_le_bytes(bytes)
    }
}

impl RandomSource for KeystreamRandom {
    fn next_index(&mut self, bound: usize) -> Result<usize> {
        uniform_below(bound, || Ok(self.next_u64()))
    }
}

impl fmt::Debug for KeystreamRandom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeystreamRandom")
            .field("pos", &self.pos)
            .finish_non_exhaustive()
    }
}

/// Hashes a seed phrase into a keystream key (BLAKE2b-512, first 32 bytes).
pub fn derive_seed(phrase: &str) -> Zeroizing<[u8; SEED_LEN]> {
    let mut hasher = Blake2b512::new();
    hasher.update(phrase.as_bytes());
    let mut digest = hasher.finalize();

    let mut seed = Zeroizing::new([0u8; SEED_LEN]);
    seed.copy_from_slice(&digest[..SEED_LEN]);
    digest.as_mut_slice().zeroize();

    seed
}
