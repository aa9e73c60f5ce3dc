//! Pattern matching for console output

mod matcher;

pub use matcher::{first_match, Match, Matcher};

use crate::result::PatternError;
use regex::Regex;

/// Something the engine can wait for in the console output.
///
/// Text patterns are tried in the order they are listed; the first one present
/// anywhere in the unread output wins. `Eof` and `Timeout` are pseudo-patterns:
/// listing them turns the corresponding condition into an ordinary match
/// instead of an error.
///
/// # Examples
///
/// ```
/// use nioscon::Pattern;
///
/// let password = Pattern::exact("password:");
/// let prompt = Pattern::any_of(["Infoblox >", "Infoblox #"]);
/// let banner = Pattern::regex(r"NIOS \d+\.\d+").unwrap();
/// let patterns = [password, prompt, banner, Pattern::Eof, Pattern::Timeout];
/// assert!(patterns[3].is_special());
/// ```
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Literal substring.
    Exact(String),

    /// Any one of a fixed list of literal substrings.
    ///
    /// Within the list, the alternative occurring earliest in the output wins.
    AnyOf(Vec<String>),

    /// Shell-style wildcard pattern (`*`, `?`, `[...]`).
    Glob(String),

    /// Regular expression.
    Regex(Regex),

    /// The remote side closed its output.
    Eof,

    /// Nothing matched within the session timeout.
    Timeout,
}

impl Pattern {
    /// Create a literal pattern
    pub fn exact(s: impl Into<String>) -> Self {
        Pattern::Exact(s.into())
    }

    /// Create a pattern matching any one of several literals
    pub fn any_of<I, S>(alternatives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Pattern::AnyOf(alternatives.into_iter().map(Into::into).collect())
    }

    /// Create a glob pattern
    pub fn glob(pattern: &str) -> Self {
        Pattern::Glob(pattern.to_string())
    }

    /// Create a regex pattern
    pub fn regex(pattern: &str) -> Result<Self, PatternError> {
        Ok(Pattern::Regex(Regex::new(pattern)?))
    }

    /// Build the matcher for a text pattern.
    ///
    /// Returns `Ok(None)` for `Eof` and `Timeout`, which are resolved by the
    /// session rather than by looking at the output.
    pub fn to_matcher(&self) -> Result<Option<Box<dyn Matcher>>, PatternError> {
        use matcher::{AnyOfMatcher, ExactMatcher, GlobMatcher, RegexMatcher};

        let matcher: Box<dyn Matcher> = match self {
            Pattern::Exact(s) => Box::new(ExactMatcher::new(s.as_bytes())?),
            Pattern::AnyOf(list) => Box::new(AnyOfMatcher::new(list)?),
            Pattern::Glob(g) => Box::new(GlobMatcher::new(g)?),
            Pattern::Regex(r) => Box::new(RegexMatcher::new(r.as_str())?),
            Pattern::Eof | Pattern::Timeout => return Ok(None),
        };

        Ok(Some(matcher))
    }

    /// Check if this is a pseudo-pattern (EOF, Timeout)
    pub fn is_special(&self) -> bool {
        matches!(self, Pattern::Eof | Pattern::Timeout)
    }
}

/// Compiled form of an ordered pattern list.
pub(crate) struct PatternSet {
    matchers: Vec<(usize, Box<dyn Matcher>)>,
    eof: Option<usize>,
    timeout: Option<usize>,
}

impl PatternSet {
    pub(crate) fn compile(patterns: &[Pattern]) -> Result<Self, PatternError> {
        let mut matchers = Vec::new();
        let mut eof = None;
        let mut timeout = None;

        for (idx, pattern) in patterns.iter().enumerate() {
            match pattern {
                Pattern::Eof => {
                    eof.get_or_insert(idx);
                }
                Pattern::Timeout => {
                    timeout.get_or_insert(idx);
                }
                _ => {
                    if let Some(matcher) = pattern.to_matcher()? {
                        matchers.push((idx, matcher));
                    }
                }
            }
        }

        Ok(Self {
            matchers,
            eof,
            timeout,
        })
    }

    pub(crate) fn find(&self, buffer: &[u8]) -> Option<(usize, Match)> {
        first_match(buffer, &self.matchers)
    }

    pub(crate) fn eof_index(&self) -> Option<usize> {
        self.eof
    }

    pub(crate) fn timeout_index(&self) -> Option<usize> {
        self.timeout
    }
}
