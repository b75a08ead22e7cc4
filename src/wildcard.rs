//! Wildcard path matching for include targets.
//!
//! Only `*` is special: it matches any run of characters, path separators
//! included. Everything else matches literally and the whole path must match.

use crate::error::Result;
use regex::Regex;
use std::path::Path;

/// The only wildcard meta-character understood in include targets
pub const WILDCARD: char = '*';

/// Returns true if the include target contains a wildcard
pub fn has_wildcard(target: &str) -> bool {
    target.contains(WILDCARD)
}

/// Splits a wildcard target into its literal directory prefix and the remainder
///
/// The prefix keeps its trailing separator and is empty when the wildcard sits
/// in the first path segment. Returns `None` if there is no wildcard.
///
/// ```
/// use vhostconf::wildcard::split_wildcard;
///
/// assert_eq!(split_wildcard("/etc/apache2/sites-*/*.conf"), Some(("/etc/apache2/", "sites-*/*.conf")));
/// assert_eq!(split_wildcard("*.conf"), Some(("", "*.conf")));
/// assert_eq!(split_wildcard("plain.conf"), None);
/// ```
pub fn split_wildcard(target: &str) -> Option<(&str, &str)> {
    let star = target.find(WILDCARD)?;
    let split = target[..star]
        .rfind(std::path::is_separator)
        .map_or(0, |idx| idx + 1);
    Some(target.split_at(split))
}

/// Translates a wildcard pattern into an anchored regular expression source
///
/// ```
/// use vhostconf::wildcard::translate;
///
/// assert_eq!(translate("/etc/*.conf"), r"^/etc/.*\.conf$");
/// ```
pub fn translate(pattern: &str) -> String {
    let body = pattern
        .split(WILDCARD)
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    format!("^{body}$")
}

/// Compiled wildcard pattern tested against full file paths
#[derive(Debug, Clone)]
pub struct WildcardMatcher {
    pattern: String,
    regex: Regex,
}

impl WildcardMatcher {
    /// Compiles a wildcard pattern
    ///
    /// # Errors
    ///
    /// Returns `VhostError::Regex` if the translated pattern cannot be compiled.
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: pattern.to_string(),
            regex: Regex::new(&translate(pattern))?,
        })
    }

    /// The wildcard pattern this matcher was built from
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Tests a full path against the pattern
    pub fn is_match(&self, path: &Path) -> bool {
        self.regex.is_match(&path.to_string_lossy())
    }
}
