use std::collections::HashSet;
use std::fmt;
use std::path::Path;

#[cfg(feature = "tracing")]
use tracing::instrument;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{DicewareError, Result};
use crate::random::{OsRandom, RandomSource};
use crate::wordlist::WordPool;

/// Converts a signed, user-supplied word count into a passphrase length.
pub fn checked_length(requested: i64) -> Result<usize> {
    usize::try_from(requested)
        .ok()
        .filter(|&length| length > 0)
        .ok_or(DicewareError::InvalidLength { requested })
}

/// Words selected for one passphrase. Wiped from memory on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Passphrase {
    words: Vec<String>,
}

impl Passphrase {
    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Joins the words with `delimiter` between consecutive words.
    pub fn join(&self, delimiter: &str) -> Zeroizing<String> {
        let capacity = self.words.iter().map(String::len).sum::<usize>()
            + delimiter.len() * self.words.len().saturating_sub(1);

        // Sized up front so the buffer never reallocates and leaves copies behind.
        let mut joined = Zeroizing::new(String::with_capacity(capacity));
        for (i, word) in self.words.iter().enumerate() {
            if i > 0 {
                joined.push_str(delimiter);
            }
            joined.push_str(word);
        }

        joined
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Passphrase")
            .field("len", &self.words.len())
            .finish_non_exhaustive()
    }
}

/// Diceware passphrase generator.
///
/// Owns its word pool and exactly one randomness source. When no source
/// has been set, the OS CSPRNG is created on first use.
pub struct Generator {
    pool: WordPool,
    source: Option<Box<dyn RandomSource>>,
}

impl Generator {
    pub fn new(pool: WordPool) -> Self {
        Self { pool, source: None }
    }

    pub fn with_source(pool: WordPool, source: impl RandomSource + 'static) -> Self {
        Self {
            pool,
            source: Some(Box::new(source)),
        }
    }

    /// Generator over the bundled word list.
    pub fn bundled() -> Self {
        Self::new(WordPool::bundled().clone())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        WordPool::from_path(path).map(Self::new)
    }

    pub fn pool(&self) -> &WordPool {
        &self.pool
    }

    /// Replaces the randomness source. The previous one is dropped.
    pub fn set_source(&mut self, source: impl RandomSource + 'static) {
        self.source = Some(Box::new(source));
    }

    /// Returns the active source, creating the OS CSPRNG if none is set.
    pub fn random_source(&mut self) -> Result<&mut dyn RandomSource> {
        active_source(&mut self.source)
    }

    /// Draws a single word.
    pub fn next_word(&mut self) -> Result<&str> {
        let source = active_source(&mut self.source)?;
        draw(source, &self.pool)
    }

    pub fn generate(&mut self, length: usize) -> Result<Passphrase> {
        self.generate_with(length, true)
    }

    /// Selects `length` words by repeated uniform draws.
    ///
    /// Without duplicates, a draw whose word is already in the passphrase is
    /// discarded and redrawn (rejection sampling). Nothing is removed from the
    /// pool, so the number of draws grows as `length` nears the number of
    /// distinct words.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self)))]
    pub fn generate_with(&mut self, length: usize, duplicates_allowed: bool) -> Result<Passphrase> {
        if length == 0 {
            return Err(DicewareError::InvalidLength { requested: 0 });
        }

        let available = if duplicates_allowed {
            self.pool.len()
        } else {
            self.pool.distinct_len()
        };

        if self.pool.is_empty() || (!duplicates_allowed && length > available) {
            return Err(DicewareError::InsufficientPool {
                requested: length,
                available,
            });
        }

        let source = active_source(&mut self.source)?;
        let pool = &self.pool;

        // Never size anything from `length` alone: it may be far beyond the pool.
        // Without duplicates, the check above already bounds it by `available`.
        let set_capacity = if duplicates_allowed { 0 } else { length };
        let mut chosen: HashSet<&str> = HashSet::with_capacity(set_capacity);
        let mut words = Vec::with_capacity(length.min(pool.len()));
        let mut draws: u64 = 0;

        while words.len() < length {
            let word = draw(source, pool)?;
            draws += 1;

            if duplicates_allowed || chosen.insert(word) {
                words.push(word.to_owned());
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(draws, "passphrase generated");
        #[cfg(not(feature = "tracing"))]
        let _ = draws;

        Ok(Passphrase { words })
    }

    pub fn generate_joined(&mut self, length: usize, delimiter: &str) -> Result<Zeroizing<String>> {
        self.generate_joined_with(length, delimiter, true)
    }

    pub fn generate_joined_with(
        &mut self,
        length: usize,
        delimiter: &str,
        duplicates_allowed: bool,
    ) -> Result<Zeroizing<String>> {
        let passphrase = self.generate_with(length, duplicates_allowed)?;
        Ok(passphrase.join(delimiter))
    }
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("pool_len", &self.pool.len())
            .field("source_set", &self.source.is_some())
            .finish()
    }
}

fn active_source(slot: &mut Option<Box<dyn RandomSource>>) -> Result<&mut dyn RandomSource> {
    let source = match slot.take() {
        Some(source) => source,
        None => {
            #[cfg(feature = "tracing")]
            tracing::debug!("initializing OS randomness source");
            Box::new(OsRandom::new()?)
        }
    };

    Ok(&mut **slot.insert(source))
}

fn draw<'p>(source: &mut dyn RandomSource, pool: &'p WordPool) -> Result<&'p str> {
    let bound = pool.len();
    if bound == 0 {
        return Err(DicewareError::InsufficientPool {
            requested: 1,
            available: 0,
        });
    }

    let index = source.next_index(bound)?;
    match pool.get(index) {
        Some(word) => Ok(word),
        None => Err(DicewareError::IndexOutOfRange { index, bound }),
    }
}
