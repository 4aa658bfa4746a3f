use anyhow::{Context, Result};
use console::{Style, Term};
use rpassword::read_password;
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroizing;

pub const MIN_SAFE_WORD_COUNT: usize = 6;

pub const MAX_SEED_BYTES: usize = 1024 * 1024;

pub struct OutputConfig {
    pub word_count: usize,
    pub delimiter: String,
    pub duplicates_allowed: bool,
    pub wordlist_label: String,
    pub wordlist_size: usize,
    pub distinct_words: usize,
    pub seeded: bool,
}

pub struct DisplayOptions {
    pub unicode_support: bool,
    pub color_support: bool,
    pub quiet: bool,
}

pub fn detect_unicode_support() -> bool {
    supports_unicode::on(supports_unicode::Stream::Stdout)
}

pub fn detect_color_support() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

pub fn get_status_symbols(unicode_support: bool) -> (&'static str, &'static str) {
    if unicode_support {
        ("✓", "!")
    } else {
        ("+", "!")
    }
}

fn get_branches(unicode_support: bool) -> (&'static str, &'static str) {
    if unicode_support {
        ("├─", "└─")
    } else {
        ("|-", "`-")
    }
}

fn status_style(secure: bool, options: &DisplayOptions) -> Style {
    if !options.color_support {
        Style::new()
    } else if secure {
        Style::new().green()
    } else {
        Style::new().yellow()
    }
}

/// Trims and NFC-normalizes a seed phrase so the same phrase typed on
/// different systems selects the same words. Control characters are rejected.
fn normalize_seed(raw: &str) -> Result<Zeroizing<String>> {
    let seed = Zeroizing::new(raw.trim().nfc().collect::<String>());

    if seed.is_empty() {
        anyhow::bail!("Seed phrase cannot be empty");
    }

    if seed.len() > MAX_SEED_BYTES {
        anyhow::bail!(
            "Seed phrase too long ({} bytes, maximum is {})",
            seed.len(),
            MAX_SEED_BYTES
        );
    }

    let positions: Vec<String> = seed
        .chars()
        .enumerate()
        .filter(|(_, c)| c.is_control())
        .map(|(pos, _)| pos.to_string())
        .collect();

    if !positions.is_empty() {
        anyhow::bail!(
            "Seed phrase contains control character(s) at position(s): {}",
            positions.join(", ")
        );
    }

    Ok(seed)
}

/// Reads the seed phrase for reproducible output without echoing it.
pub fn prompt_seed() -> Result<Zeroizing<String>> {
    let term = Term::stderr();
    term.write_str("Seed: ")?;
    term.flush()?;

    let raw = Zeroizing::new(read_password().context("Failed to fetch seed phrase")?);
    normalize_seed(&raw)
}

pub fn display_output(
    outputs: &[Zeroizing<String>],
    config: &OutputConfig,
    options: &DisplayOptions,
) {
    if options.quiet {
        for output in outputs {
            println!("{}", &**output);
        }
        return;
    }

    println!("Out[0]:");
    for output in outputs {
        println!("{}", &**output);
    }
    println!();

    display_settings(config, options);
}

fn display_settings(config: &OutputConfig, options: &DisplayOptions) {
    let (check_ok, check_warn) = get_status_symbols(options.unicode_support);
    let (branch, last) = get_branches(options.unicode_support);

    let words_secure = config.word_count >= MIN_SAFE_WORD_COUNT;
    let list_secure = config.distinct_words > 1;
    let source_secure = !config.seeded;

    let words_style = status_style(words_secure, options);
    let list_style = status_style(list_secure, options);
    let source_style = status_style(source_secure, options);

    let status = |secure: bool| format!("[{}]", if secure { check_ok } else { check_warn });

    println!("Settings:");

    println!(
        "  {} Word list  {} {} ({} {}, {} distinct)",
        branch,
        list_style.apply_to(status(list_secure)),
        config.wordlist_label,
        list_style.apply_to(config.wordlist_size),
        if config.wordlist_size == 1 {
            "word"
        } else {
            "words"
        },
        list_style.apply_to(config.distinct_words)
    );

    println!(
        "  {} Words      {} {}",
        branch,
        words_style.apply_to(status(words_secure)),
        words_style.apply_to(config.word_count)
    );

    println!(
        "  {} Repeats    {}",
        branch,
        if config.duplicates_allowed {
            "allowed"
        } else {
            "forbidden"
        }
    );

    println!("  {} Delimiter  {:?}", branch, config.delimiter);

    if config.seeded {
        println!(
            "  {} Source     {} ChaCha20 keystream (seeded, reproducible)",
            branch,
            source_style.apply_to(status(source_secure))
        );
    } else {
        println!(
            "  {} Source     {} OS CSPRNG",
            branch,
            source_style.apply_to(status(source_secure))
        );
    }

    println!("  {} Sampling   Unbiased rejection", last);
}
