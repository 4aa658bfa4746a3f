// This file is part of Dicer.
//
// Copyright (c) 2025  René Coignard <contact@renecoignard.com>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::OnceLock;

use unicode_normalization::UnicodeNormalization;

use crate::error::{DicewareError, Result};

const BUNDLED_DATA: &str = include_str!("../assets/wordlist.properties");

#[cfg(test)]
const EXPECTED_SHA256: &str = "fb02c2bc1c2418014fee9766f20f425b5d869ac4f4265b308d5b438930e8dbf6";

static BUNDLED: OnceLock<WordPool> = OnceLock::new();

/// Ordered, immutable sequence of candidate words.
///
/// Repeated words are kept as-is; `distinct_len` tracks how many different
/// words the pool can actually yield.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordPool {
    words: Vec<String>,
    distinct: usize,
}

/// Extracts the word from a diceware line (`<roll code> <word>`).
///
/// Returns `None` unless the line is a run of ASCII digits, whitespace, and
/// exactly one further token.
pub fn parse_line(line: &str) -> Option<&str> {
    let mut tokens = line.split(is_line_space).filter(|t| !t.is_empty());

    let code = tokens.next()?;
    let word = tokens.next()?;

    if tokens.next().is_some() || !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    Some(word)
}

fn is_line_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r')
}

fn is_comment_or_blank(line: &str) -> bool {
    let line = line.trim_start();
    line.is_empty() || line.starts_with('#') || line.starts_with('!')
}

/// Joins lines ending in an odd number of backslashes with the line after,
/// dropping the backslash and the continuation's leading whitespace.
fn logical_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut continuing = false;

    for raw in text.lines() {
        let line = if continuing {
            raw.trim_start()
        } else if is_comment_or_blank(raw) {
            continue;
        } else {
            raw
        };

        let trailing = line.len() - line.trim_end_matches('\\').len();
        if trailing % 2 == 1 {
            current.push_str(&line[..line.len() - 1]);
            continuing = true;
        } else {
            current.push_str(line);
            lines.push(std::mem::take(&mut current));
            continuing = false;
        }
    }

    if continuing {
        lines.push(current);
    }

    lines
}

/// Resolves `\t`, `\n`, `\r`, `\f`, `\uXXXX` and `\<char>` escapes.
/// Malformed `\u` escapes are kept literally.
fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0C'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let valid = hex.len() == 4 && hex.bytes().all(|b| b.is_ascii_hexdigit());
                let decoded = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32);
                match decoded {
                    Some(ch) if valid => out.push(ch),
                    _ => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    out
}

/// Value of a logical `key=value` / `key: value` / `key value` line.
fn property_value(line: &str) -> Option<String> {
    let line = line.trim_start();

    let mut split = None;
    let mut chars = line.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '=' | ':' => {
                split = Some(i);
                break;
            }
            c if c.is_whitespace() => {
                split = Some(i);
                break;
            }
            _ => {}
        }
    }

    let rest = line[split?..].trim_start();
    let rest = rest.strip_prefix(['=', ':']).unwrap_or(rest);

    Some(unescape(rest).trim().to_owned())
}

impl WordPool {
    /// Builds a pool from an arbitrary string collection. Empty strings are dropped.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<String> = words
            .into_iter()
            .filter(|w| !w.as_ref().is_empty())
            .map(|w| w.as_ref().nfc().collect())
            .collect();

        let distinct = words.iter().collect::<HashSet<_>>().len();

        Self { words, distinct }
    }

    /// Parses diceware text, one `<code> <word>` entry per line. Lines that
    /// don't match are skipped.
    pub fn parse(text: &str) -> Self {
        Self::from_words(text.lines().filter_map(parse_line))
    }

    pub fn from_reader<R: BufRead>(reader: R, origin: &str) -> Result<Self> {
        let mut words = Vec::new();

        for line in reader.lines() {
            let line = line.map_err(|e| DicewareError::source_read(origin, e))?;
            if let Some(word) = parse_line(&line) {
                words.push(word.to_owned());
            }
        }

        Ok(Self::from_words(words))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let origin = path.display().to_string();

        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => return Err(DicewareError::source_read(origin, e)),
        };
        let pool = Self::from_reader(BufReader::new(file), &origin)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            path = %origin,
            words = pool.len(),
            distinct = pool.distinct_len(),
            "loaded word list"
        );

        Ok(pool)
    }

    /// Builds a pool from key-value entries. Keys are ignored; values are the words.
    pub fn from_resource_map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        V: AsRef<str>,
    {
        Self::from_words(entries.into_iter().map(|(_, value)| value))
    }

    /// Parses a properties-style resource: `key=value` (or `:` / whitespace)
    /// entries, `#`/`!` comments, `\` line continuations and escapes such as
    /// `\uXXXX`. Entries with an empty value are skipped.
    pub fn from_properties(text: &str) -> Self {
        let lines = logical_lines(text);
        Self::from_words(lines.iter().filter_map(|line| property_value(line)))
    }

    /// The word list shipped with the crate.
    pub fn bundled() -> &'static WordPool {
        BUNDLED.get_or_init(|| Self::from_properties(BUNDLED_DATA))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn distinct_len(&self) -> usize {
        self.distinct
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.words.get(index).map(String::as_str)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sha2::{Digest, Sha256};
    use std::collections::BTreeMap;
    use std::io::{Cursor, Write};

    #[test]
    fn test_parse_line_padded() {
        assert_eq!(parse_line("  11234  correct  "), Some("correct"));
    }

    #[test]
    fn test_parse_line_tab_separated() {
        assert_eq!(parse_line("66666\tzoom"), Some("zoom"));
    }

    #[test]
    fn test_parse_line_rejects_malformed() {
        assert_eq!(parse_line("badline"), None);
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("   "), None);
        assert_eq!(parse_line("11234"), None);
        assert_eq!(parse_line("11234correct"), None);
        assert_eq!(parse_line("1a234 correct"), None);
        assert_eq!(parse_line("11234 correct horse"), None);
        assert_eq!(parse_line("word 11234"), None);
    }

    #[test]
    fn test_parse_line_keeps_punctuation() {
        assert_eq!(parse_line("12 t-rex!"), Some("t-rex!"));
    }

    #[test]
    fn test_parse_skips_bad_lines() {
        let text = "11111 abacus\nbadline\n\n11112 abdomen\n# comment\n11113 abdominal\n";
        let pool = WordPool::parse(text);
        let words: Vec<&str> = pool.iter().collect();
        assert_eq!(words, vec!["abacus", "abdomen", "abdominal"]);
    }

    #[test]
    fn test_from_reader() {
        let reader = Cursor::new("1 alpha\r\n2 beta\r\n");
        let pool = WordPool::from_reader(reader, "memory").unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.get(0), Some("alpha"));
        assert_eq!(pool.get(1), Some("beta"));
        assert_eq!(pool.get(2), None);
    }

    #[test]
    fn test_from_reader_invalid_utf8() {
        let reader = Cursor::new(vec![b'1', b' ', 0xFF, 0xFE, b'\n']);
        let err = WordPool::from_reader(reader, "memory").unwrap_err();
        assert!(matches!(err, DicewareError::SourceRead { ref origin, .. } if origin == "memory"));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "11111 correct").unwrap();
        writeln!(file, "not a word line").unwrap();
        writeln!(file, "11112 horse").unwrap();
        file.flush().unwrap();

        let pool = WordPool::from_path(file.path()).unwrap();
        assert_eq!(pool.iter().collect::<Vec<_>>(), vec!["correct", "horse"]);
    }

    #[test]
    fn test_from_path_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.txt");

        let err = WordPool::from_path(&missing).unwrap_err();
        match err {
            DicewareError::SourceRead { origin, source } => {
                assert!(origin.ends_with("nope.txt"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_from_words_drops_empty() {
        let pool = WordPool::from_words(["a", "", "b"]);
        assert_eq!(pool.len(), 2);
        assert!(pool.contains("a"));
        assert!(!pool.contains(""));
    }

    #[test]
    fn test_duplicates_permitted() {
        let pool = WordPool::from_words(vec!["a".to_string(), "a".to_string(), "b".to_string()]);
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.distinct_len(), 2);
    }

    #[test]
    fn test_empty_pool() {
        let pool = WordPool::parse("");
        assert!(pool.is_empty());
        assert_eq!(pool.distinct_len(), 0);
        assert_eq!(pool, WordPool::default());
    }

    #[test]
    fn test_words_normalized_to_nfc() {
        let nfd = WordPool::parse("1 cafe\u{0301}");
        let nfc = WordPool::parse("1 caf\u{00E9}");
        assert_eq!(nfd, nfc);
        assert!(nfd.contains("caf\u{00E9}"));
    }

    #[test]
    fn test_from_resource_map_ignores_keys() {
        let mut map = BTreeMap::new();
        map.insert("111", "apple");
        map.insert("112", "banjo");
        map.insert("113", "cedar");

        let pool = WordPool::from_resource_map(map);
        assert_eq!(pool.iter().collect::<Vec<_>>(), vec!["apple", "banjo", "cedar"]);
    }

    #[test]
    fn test_from_properties() {
        let text = concat!(
            "# header\n",
            "! also a comment\n",
            "\n",
            "111=apple\n",
            "112 : banjo\n",
            "113 cedar\n",
            "lonely\n",
            "114=\n",
        );
        let pool = WordPool::from_properties(text);
        assert_eq!(pool.iter().collect::<Vec<_>>(), vec!["apple", "banjo", "cedar"]);
    }

    #[test]
    fn test_properties_line_continuation() {
        let text = "111=ac\\\n    id\n112=basil\n";
        let pool = WordPool::from_properties(text);
        assert_eq!(pool.iter().collect::<Vec<_>>(), vec!["acid", "basil"]);
    }

    #[test]
    fn test_properties_escaped_backslash_does_not_continue() {
        let text = "111=back\\\\\n112=slash\n";
        let pool = WordPool::from_properties(text);
        assert_eq!(pool.iter().collect::<Vec<_>>(), vec!["back\\", "slash"]);
    }

    #[test]
    fn test_properties_comment_never_continues() {
        let text = "# note \\\n111=apple\n";
        let pool = WordPool::from_properties(text);
        assert_eq!(pool.iter().collect::<Vec<_>>(), vec!["apple"]);
    }

    #[test]
    fn test_properties_unicode_escapes() {
        let text = "111=caf\\u00e9\n112=tab\\tbed\n113=bad\\u00zz\n114=sign\\u+0e9\n";
        let pool = WordPool::from_properties(text);
        assert_eq!(
            pool.iter().collect::<Vec<_>>(),
            vec!["caf\u{00E9}", "tab\tbed", "bad\\u00zz", "sign\\u+0e9"]
        );
    }

    #[test]
    fn test_properties_escaped_key_separator() {
        let text = "a\\=b=word\nc\\ d lamp\n";
        let pool = WordPool::from_properties(text);
        assert_eq!(pool.iter().collect::<Vec<_>>(), vec!["word", "lamp"]);
    }

    #[test]
    fn test_bundled_loaded() {
        let pool = WordPool::bundled();
        assert_eq!(pool.len(), 216);
        assert_eq!(pool.distinct_len(), 216);
    }

    #[test]
    fn test_bundled_integrity() {
        let pool = WordPool::bundled();

        assert_eq!(pool.get(0), Some("acid"), "First word should be \"acid\"");
        assert_eq!(pool.get(35), Some("basil"), "Word 35 should be \"basil\"");
        assert_eq!(pool.get(215), Some("needle"), "Last word should be \"needle\"");

        for (i, word) in pool.iter().enumerate() {
            assert!(
                word.chars().all(|c| c.is_ascii_lowercase()),
                "Word at index {} (\"{}\") contains invalid characters",
                i,
                word
            );
            assert!(
                (3..=7).contains(&word.len()),
                "Word at index {} (\"{}\") has invalid length {}",
                i,
                word,
                word.len()
            );
        }
    }

    #[test]
    fn test_bundled_sha256() {
        let mut hasher = Sha256::new();
        hasher.update(BUNDLED_DATA.as_bytes());
        let result = format!("{:x}", hasher.finalize());

        assert_eq!(
            result, EXPECTED_SHA256,
            "Bundled word list SHA-256 mismatch; file may be corrupted"
        );
    }
}
