//! Path representation for namespaced identifiers
//!
//! Function and type names are dot-separated paths:
//! - `osc.phasor`
//! - `filter.svf_process`
//! - `osc.phasor_ctx`
//!
//! Calls carry their target as a path, and the replacement table rewrites one
//! path into another, so paths are used as keys throughout the passes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A hierarchical name for a declaration.
///
/// Paths are immutable and support efficient comparison and hashing.
///
/// # Examples
///
/// ```
/// # use tonal_ast::Path;
/// let path = Path::from("osc.phasor");
/// assert_eq!(path.segments(), &["osc", "phasor"]);
/// assert_eq!(path.to_string(), "osc.phasor");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// Create a new path from a vector of segments.
    pub fn new(segments: Vec<String>) -> Self {
        Self { segments }
    }

    /// Parse a path from a dot-separated string.
    pub fn parse(s: &str) -> Self {
        Self {
            segments: s.split('.').map(String::from).collect(),
        }
    }

    /// Get the path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Get the number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if the path is empty.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Get the last segment (leaf name).
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Join segments with a separator.
    pub fn join(&self, sep: &str) -> String {
        self.segments.join(sep)
    }

    /// Returns a copy of this path whose leaf segment carries `suffix`.
    ///
    /// `osc.phasor` with suffix `_ctx` becomes `osc.phasor_ctx`.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        let mut segments = self.segments.clone();
        match segments.last_mut() {
            Some(last) => last.push_str(suffix),
            None => segments.push(suffix.to_string()),
        }
        Self::new(segments)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for Path {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Path> for String {
    fn from(path: Path) -> Self {
        path.to_string()
    }
}

impl PartialEq<&str> for Path {
    fn eq(&self, other: &&str) -> bool {
        self.to_string() == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_creation() {
        let path = Path::from("a.b.c");
        assert_eq!(path.segments(), &["a", "b", "c"]);
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn test_path_display() {
        let path = Path::from("osc.phasor");
        assert_eq!(path.to_string(), "osc.phasor");
    }

    #[test]
    fn test_path_suffix_applies_to_leaf() {
        let path = Path::from("osc.phasor");
        assert_eq!(path.with_suffix("_ctx"), "osc.phasor_ctx");
        assert_eq!(Path::from("f").with_suffix("_ctx"), "f_ctx");
    }

    #[test]
    fn test_path_serde() {
        let path = Path::from("a.b");
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"a.b\"");
        let back: Path = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
