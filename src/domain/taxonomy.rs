//! Taxonomy paths: the typed replacement for directory-encoded
//! method/field/item classification.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{OrchestrateError, Result};

/// Maximum number of taxonomy levels.
const MAX_DEPTH: usize = 3;

/// One validated path segment (a directory basename or a file stem).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Segment(String);

impl Segment {
    /// Validate a raw segment: non-empty, no path separators, no NUL.
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(OrchestrateError::Discovery("empty taxonomy segment".to_string()));
        }
        if raw.contains(['/', '\\', '\0']) {
            return Err(OrchestrateError::Discovery(format!(
                "taxonomy segment '{}' contains a path separator",
                raw.escape_default()
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Segment {
    type Error = OrchestrateError;

    fn try_from(value: String) -> Result<Self> {
        Segment::new(value)
    }
}

impl From<Segment> for String {
    fn from(segment: Segment) -> Self {
        segment.0
    }
}

/// Ordered, bounded sequence of segments, root-most level first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaxonomyPath(Vec<Segment>);

impl TaxonomyPath {
    pub fn new(segments: Vec<Segment>) -> Result<Self> {
        if segments.is_empty() || segments.len() > MAX_DEPTH {
            return Err(OrchestrateError::Discovery(format!(
                "taxonomy path must have 1..={} segments, got {}",
                MAX_DEPTH,
                segments.len()
            )));
        }
        Ok(Self(segments))
    }

    /// Build a path from raw strings, validating each segment.
    pub fn parse<I, S>(raw: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments = raw.into_iter().map(Segment::new).collect::<Result<Vec<_>>>()?;
        Self::new(segments)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// The leaf (item) segment.
    pub fn leaf(&self) -> &Segment {
        // Non-empty by construction.
        &self.0[self.0.len() - 1]
    }

    /// Segments above the leaf.
    pub fn ancestors(&self) -> &[Segment] {
        &self.0[..self.0.len() - 1]
    }
}

impl fmt::Display for TaxonomyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(segment.as_str())?;
        }
        Ok(())
    }
}
