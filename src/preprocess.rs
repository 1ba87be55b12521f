//! Line cleaning ahead of trie insertion
//!
//! Raw log lines are normalized into zero or more sequences: ignored
//! characters are dropped, delimiters split the line, and spaces are
//! collapsed. A regex extractor can replace cleaning entirely.

use crate::error::Result;
use regex::Regex;
use std::collections::BTreeSet;
use std::io::BufRead;

/// Cleaned corpus file written next to the other outputs
pub const CLEANED_FILE: &str = "cleaned_data.txt";

/// Characters removed from every line unless configured otherwise
pub const DEFAULT_IGNORED: &[char] = &['\r', '[', ']', '{', '}', '"', '\'', '(', ')'];

/// Character-level normalizer
///
/// When lower-casing, input is folded before the ignore and delimiter
/// checks and so are the configured characters, so `A` and `a` match alike.
#[derive(Debug, Clone)]
pub struct LineCleaner {
    lowercase: bool,
    /// As configured
    ignored_chars: BTreeSet<char>,
    delimiter_chars: BTreeSet<char>,
    /// Lookup sets, folded when lower-casing
    ignored: BTreeSet<char>,
    delimiters: BTreeSet<char>,
}

impl Default for LineCleaner {
    fn default() -> Self {
        let ignored: BTreeSet<char> = DEFAULT_IGNORED.iter().copied().collect();
        let delimiters: BTreeSet<char> = ['\n'].into_iter().collect();
        Self {
            lowercase: true,
            ignored_chars: ignored.clone(),
            delimiter_chars: delimiters.clone(),
            ignored,
            delimiters,
        }
    }
}

impl LineCleaner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self.rebuild();
        self
    }

    /// Drop these characters in addition to the defaults
    pub fn with_ignored(mut self, chars: &str) -> Self {
        self.ignored_chars.extend(chars.chars());
        self.rebuild();
        self
    }

    /// Split sequences on these characters in addition to newline
    pub fn with_delimiters(mut self, chars: &str) -> Self {
        self.delimiter_chars.extend(chars.chars());
        self.rebuild();
        self
    }

    fn rebuild(&mut self) {
        let lowercase = self.lowercase;
        let fold = |set: &BTreeSet<char>| -> BTreeSet<char> {
            if lowercase {
                set.iter().flat_map(|c| c.to_lowercase()).collect()
            } else {
                set.clone()
            }
        };
        self.ignored = fold(&self.ignored_chars);
        self.delimiters = fold(&self.delimiter_chars);
    }

    /// Clean one raw line into its sequences
    ///
    /// ```
    /// use stattrie::preprocess::LineCleaner;
    ///
    /// let cleaner = LineCleaner::new().with_delimiters(";");
    /// let out = cleaner.clean_line("GET  [/Index];  POST (/login) ");
    /// assert_eq!(out, vec!["get /index", "post /login"]);
    /// ```
    pub fn clean_line(&self, line: &str) -> Vec<String> {
        let folded;
        let line = if self.lowercase {
            folded = line.to_lowercase();
            folded.as_str()
        } else {
            line
        };

        let mut sequences = Vec::new();
        let mut current = String::with_capacity(line.len());
        let mut pending_space = false;

        for c in line.chars() {
            if self.ignored.contains(&c) {
                continue;
            }
            if self.delimiters.contains(&c) {
                flush(&mut current, &mut sequences);
                pending_space = false;
                continue;
            }
            if c == ' ' || c == '\t' {
                pending_space = !current.is_empty();
                continue;
            }
            if pending_space {
                current.push(' ');
                pending_space = false;
            }
            current.push(c);
        }
        flush(&mut current, &mut sequences);
        sequences
    }
}

fn flush(current: &mut String, sequences: &mut Vec<String>) {
    if !current.is_empty() {
        sequences.push(std::mem::take(current));
    }
}

/// Emits regex matches instead of cleaned lines
///
/// With capture groups, each non-empty group is emitted in group order;
/// without, the full match. Matches are emitted verbatim unless
/// lower-casing is switched on.
#[derive(Debug, Clone)]
pub struct RegexExtractor {
    pattern: Regex,
    lowercase: bool,
}

impl RegexExtractor {
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            lowercase: false,
        })
    }

    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    pub fn extract(&self, line: &str) -> Vec<String> {
        let mut out = Vec::new();
        for caps in self.pattern.captures_iter(line) {
            if caps.len() > 1 {
                out.extend(
                    caps.iter()
                        .skip(1)
                        .flatten()
                        .filter(|m| !m.as_str().is_empty())
                        .map(|m| self.normalize(m.as_str())),
                );
            } else if let Some(m) = caps.get(0) {
                if !m.as_str().is_empty() {
                    out.push(self.normalize(m.as_str()));
                }
            }
        }
        out
    }

    fn normalize(&self, s: &str) -> String {
        if self.lowercase {
            s.to_lowercase()
        } else {
            s.to_string()
        }
    }
}

/// How raw lines become trie input
#[derive(Debug, Clone)]
pub enum Preprocessor {
    /// Lines inserted verbatim (empty lines skipped)
    Raw,
    Clean(LineCleaner),
    Extract(RegexExtractor),
}

impl Default for Preprocessor {
    fn default() -> Self {
        Preprocessor::Clean(LineCleaner::default())
    }
}

impl Preprocessor {
    pub fn process_line(&self, line: &str) -> Vec<String> {
        match self {
            Preprocessor::Raw => {
                let line = line.trim_end_matches(['\r', '\n']);
                if line.is_empty() {
                    Vec::new()
                } else {
                    vec![line.to_string()]
                }
            }
            Preprocessor::Clean(cleaner) => cleaner.clean_line(line),
            Preprocessor::Extract(extractor) => extractor.extract(line),
        }
    }

    /// Read every line and return the ordered sequences
    pub fn clean_reader<R: BufRead>(&self, reader: R) -> std::io::Result<Vec<String>> {
        let mut sequences = Vec::new();
        let mut lines = 0usize;
        for line in reader.lines() {
            let line = line?;
            lines += 1;
            sequences.extend(self.process_line(&line));
        }
        tracing::info!(lines, sequences = sequences.len(), "input cleaned");
        Ok(sequences)
    }
}

/// Clean `reader` with the default cleaner
pub fn clean_reader<R: BufRead>(reader: R) -> std::io::Result<Vec<String>> {
    Preprocessor::default().clean_reader(reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StatTrieError;
    use std::io::Cursor;

    #[test]
    fn test_default_cleaning() {
        let cleaner = LineCleaner::new();
        assert_eq!(
            cleaner.clean_line("  User \"Admin\"   LOGGED  in\r"),
            vec!["user admin logged in"]
        );
    }

    #[test]
    fn test_ignored_and_keep_case() {
        let cleaner = LineCleaner::new().with_lowercase(false).with_ignored("=");
        assert_eq!(cleaner.clean_line("Key=(Value)"), vec!["KeyValue"]);
    }

    #[test]
    fn test_configured_chars_match_both_cases() {
        let cleaner = LineCleaner::new().with_ignored("X").with_delimiters("S");
        assert_eq!(cleaner.clean_line("aXbx cSd sE"), vec!["ab c", "d", "e"]);

        let exact = LineCleaner::new().with_ignored("X").with_lowercase(false);
        assert_eq!(exact.clean_line("aXbx"), vec!["abx"]);
    }

    #[test]
    fn test_delimiters_split_and_collapse() {
        let cleaner = LineCleaner::new().with_delimiters(",;");
        assert_eq!(cleaner.clean_line("a, b;;;c ,"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_blank_line_yields_nothing() {
        assert!(LineCleaner::new().clean_line("  [ ]  ").is_empty());
    }

    #[test]
    fn test_regex_full_match_and_groups() {
        let full = RegexExtractor::new(r"\d+").unwrap();
        assert_eq!(full.extract("a 12 b 345"), vec!["12", "345"]);

        let groups = RegexExtractor::new(r"(GET|POST) (\S+)").unwrap();
        assert_eq!(
            groups.extract("GET /A then POST /b"),
            vec!["GET", "/A", "POST", "/b"]
        );
    }

    #[test]
    fn test_regex_lowercase_opt_in() {
        let extractor = RegexExtractor::new(r"/\w+").unwrap().with_lowercase(true);
        assert_eq!(extractor.extract("GET /Admin"), vec!["/admin"]);
    }

    #[test]
    fn test_regex_optional_group_skipped() {
        let extractor = RegexExtractor::new(r"user=(\w+)(?:,id=(\d+))?").unwrap();
        assert_eq!(extractor.extract("user=bob"), vec!["bob"]);
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(
            RegexExtractor::new("(unclosed"),
            Err(StatTrieError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_raw_keeps_lines_verbatim() {
        let raw = Preprocessor::Raw;
        assert_eq!(raw.process_line("  Mixed [Case]  "), vec!["  Mixed [Case]  "]);
        assert!(raw.process_line("").is_empty());
    }

    #[test]
    fn test_clean_reader_order() {
        let input = Cursor::new("B\n\nA (x)\nb\n");
        let out = clean_reader(input).unwrap();
        assert_eq!(out, vec!["b", "a x", "b"]);
    }
}
