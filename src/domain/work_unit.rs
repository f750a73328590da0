//! Work units: one discovered input artifact and its taxonomy path.

use serde::Serialize;
use std::path::{Path, PathBuf};

use super::taxonomy::{Segment, TaxonomyPath};

/// One piece of discovered work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkUnit {
    path: TaxonomyPath,
    source_file: PathBuf,
}

impl WorkUnit {
    pub fn new(path: TaxonomyPath, source_file: impl Into<PathBuf>) -> Self {
        Self {
            path,
            source_file: source_file.into(),
        }
    }

    pub fn path(&self) -> &TaxonomyPath {
        &self.path
    }

    /// Absolute path to the input document.
    pub fn source_file(&self) -> &Path {
        &self.source_file
    }

    /// Item segment (the input file name).
    pub fn item(&self) -> &Segment {
        self.path.leaf()
    }
}
