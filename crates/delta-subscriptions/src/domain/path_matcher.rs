//! Wildcard key patterns
//!
//! A pattern is a restricted glob: `*` matches any sequence (including the
//! empty one) and every other character, `.` included, matches itself. The
//! match is anchored at both ends.

use regex::Regex;
use tracing::warn;

/// A compiled wildcard pattern.
#[derive(Clone, Debug)]
pub struct PathMatcher {
    pattern: String,
    compiled: Option<Regex>,
}

impl PathMatcher {
    /// Compile `pattern`. Never fails.
    ///
    /// If the regex engine rejects the translated pattern (size limits on
    /// absurdly long input), the matcher falls back to exact comparison.
    #[must_use]
    pub fn compile(pattern: &str) -> Self {
        let compiled = match Regex::new(&translate(pattern)) {
            Ok(regex) => Some(regex),
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "Pattern falls back to exact matching");
                None
            }
        };

        Self {
            pattern: pattern.to_string(),
            compiled,
        }
    }

    /// Whether `key` matches the whole pattern.
    #[must_use]
    pub fn matches(&self, key: &str) -> bool {
        match &self.compiled {
            Some(regex) => regex.is_match(key),
            None => self.pattern == key,
        }
    }

    /// The source pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// Translate every `*` to `.*`, escape everything else, anchor both ends.
fn translate(pattern: &str) -> String {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    format!("(?s)^{body}$")
}
