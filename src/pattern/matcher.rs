//! Pattern matcher implementations

use crate::result::PatternError;
use globset::{Glob, GlobMatcher as GlobsetMatcher};
use regex::bytes::Regex;

/// Location of a match inside the unread output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    /// Start position of the match
    pub start: usize,
    /// End position of the match
    pub end: usize,
}

/// Trait for pattern matching
pub trait Matcher: Send + Sync {
    /// Find the first match in the buffer
    fn find(&self, buffer: &[u8]) -> Option<Match>;
}

/// Return the first matcher *in list order* that finds anything in `buffer`.
///
/// Position in the output does not matter: a later-listed pattern occurring
/// earlier in the text still loses to an earlier-listed one.
pub fn first_match(buffer: &[u8], matchers: &[(usize, Box<dyn Matcher>)]) -> Option<(usize, Match)> {
    matchers
        .iter()
        .find_map(|(index, matcher)| matcher.find(buffer).map(|m| (*index, m)))
}

/// Literal matcher using Boyer-Moore-Horspool
pub struct ExactMatcher {
    pattern: Vec<u8>,
    bad_char_table: [usize; 256],
}

impl ExactMatcher {
    /// Create a new literal matcher
    pub fn new(pattern: impl Into<Vec<u8>>) -> Result<Self, PatternError> {
        let pattern = pattern.into();

        if pattern.is_empty() {
            return Err(PatternError::EmptyPattern);
        }

        let mut bad_char_table = [pattern.len(); 256];
        for (i, &byte) in pattern.iter().enumerate().take(pattern.len() - 1) {
            bad_char_table[byte as usize] = pattern.len() - 1 - i;
        }

        Ok(Self {
            pattern,
            bad_char_table,
        })
    }
}

impl Matcher for ExactMatcher {
    fn find(&self, buffer: &[u8]) -> Option<Match> {
        let len = self.pattern.len();
        let mut pos = 0;

        while pos + len <= buffer.len() {
            if buffer[pos..pos + len] == self.pattern[..] {
                return Some(Match {
                    start: pos,
                    end: pos + len,
                });
            }

            let shift_char = buffer[pos + len - 1];
            pos += self.bad_char_table[shift_char as usize];
        }

        None
    }
}

/// Matches whichever of several literals occurs earliest in the output.
///
/// Used where the console may answer with one of a fixed set of prompts and
/// the exact one depends on server timing.
pub struct AnyOfMatcher {
    alternatives: Vec<ExactMatcher>,
}

impl AnyOfMatcher {
    /// Create a matcher over a fixed list of literals
    pub fn new<I, S>(alternatives: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let alternatives = alternatives
            .into_iter()
            .map(|s| ExactMatcher::new(s.as_ref().as_bytes()))
            .collect::<Result<Vec<_>, _>>()?;

        if alternatives.is_empty() {
            return Err(PatternError::EmptyPattern);
        }

        Ok(Self { alternatives })
    }
}

impl Matcher for AnyOfMatcher {
    fn find(&self, buffer: &[u8]) -> Option<Match> {
        self.alternatives
            .iter()
            .filter_map(|m| m.find(buffer))
            .min_by_key(|m| (m.start, std::cmp::Reverse(m.end)))
    }
}

/// Regex matcher working directly on bytes
pub struct RegexMatcher {
    regex: Regex,
}

impl RegexMatcher {
    /// Create a new regex matcher
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }
}

impl Matcher for RegexMatcher {
    fn find(&self, buffer: &[u8]) -> Option<Match> {
        self.regex.find(buffer).map(|m| Match {
            start: m.start(),
            end: m.end(),
        })
    }
}

/// Glob pattern matcher.
///
/// Finds the leftmost, shortest substring the glob accepts. This is quadratic in
/// the buffer length, which is fine for console prompts but not for bulk output.
pub struct GlobMatcher {
    matcher: GlobsetMatcher,
}

impl GlobMatcher {
    /// Create a new glob matcher
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let glob = Glob::new(pattern).map_err(|e| PatternError::InvalidGlob(e.to_string()))?;

        Ok(Self {
            matcher: glob.compile_matcher(),
        })
    }
}

impl Matcher for GlobMatcher {
    fn find(&self, buffer: &[u8]) -> Option<Match> {
        let text = std::str::from_utf8(buffer).ok()?;

        for start in 0..text.len() {
            if !text.is_char_boundary(start) {
                continue;
            }
            for end in start + 1..=text.len() {
                if text.is_char_boundary(end) && self.matcher.is_match(&text[start..end]) {
                    return Some(Match { start, end });
                }
            }
        }

        None
    }
}
