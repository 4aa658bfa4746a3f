pub mod error;
pub mod generator;
pub mod random;
pub mod wordlist;

pub use error::{DicewareError, Result};
pub use generator::{Generator, Passphrase, checked_length};
pub use random::{KeystreamRandom, OsRandom, RandomSource, derive_seed};
pub use wordlist::{WordPool, parse_line};
