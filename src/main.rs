mod ui;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use dicer::{Generator, KeystreamRandom, WordPool, checked_length};

#[derive(Parser)]
#[command(
    name = "dicer",
    version,
    author,
    about = "Diceware passphrase generator"
)]
struct Cli {
    /// Number of words (defaults to the security preset)
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    words: Option<i64>,

    #[arg(short, long, value_enum, default_value = "standard")]
    security: SecurityLevel,

    /// Placed between consecutive words
    #[arg(short, long, default_value = " ")]
    delimiter: String,

    /// Never repeat a word within a passphrase
    #[arg(short, long)]
    unique: bool,

    /// Diceware word list ("<roll code> <word>" per line); bundled list if omitted
    #[arg(short, long, env = "DICER_WORDLIST")]
    wordlist: Option<PathBuf>,

    /// Prompt for a seed phrase and generate reproducibly from it
    #[arg(long)]
    seed: bool,

    /// Number of passphrases to print
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    count: u32,

    /// Print passphrases only
    #[arg(short, long)]
    quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
enum SecurityLevel {
    Standard,
    Paranoid,
}

impl SecurityLevel {
    fn word_count(self) -> i64 {
        match self {
            SecurityLevel::Standard => 6,
            SecurityLevel::Paranoid => 10,
        }
    }
}

#[cfg(feature = "tracing")]
fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match (verbose, EnvFilter::try_from_default_env()) {
        (0, Ok(filter)) => filter,
        (0, Err(_)) => EnvFilter::new("warn"),
        (1, _) => EnvFilter::new("dicer=debug"),
        _ => EnvFilter::new("dicer=trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "tracing")]
    init_tracing(cli.verbose);
    #[cfg(not(feature = "tracing"))]
    let _ = cli.verbose;

    let word_count = checked_length(cli.words.unwrap_or(cli.security.word_count()))?;

    let (pool, wordlist_label) = match &cli.wordlist {
        Some(path) => (
            WordPool::from_path(path)
                .with_context(|| format!("Failed to load word list {}", path.display()))?,
            path.display().to_string(),
        ),
        None => (WordPool::bundled().clone(), "bundled".to_string()),
    };

    let output_config = ui::OutputConfig {
        word_count,
        delimiter: cli.delimiter.clone(),
        duplicates_allowed: !cli.unique,
        wordlist_label,
        wordlist_size: pool.len(),
        distinct_words: pool.distinct_len(),
        seeded: cli.seed,
    };

    let mut generator = Generator::new(pool);

    if cli.seed {
        let seed = ui::prompt_seed()?;
        generator.set_source(KeystreamRandom::from_seed_phrase(&seed));
    }

    let outputs = (0..cli.count)
        .map(|_| generator.generate_joined_with(word_count, &cli.delimiter, !cli.unique))
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to generate passphrase")?;

    let options = ui::DisplayOptions {
        unicode_support: ui::detect_unicode_support(),
        color_support: ui::detect_color_support(),
        quiet: cli.quiet,
    };

    ui::display_output(&outputs, &output_config, &options);

    Ok(())
}
