//! Work discovery over a directory taxonomy.
//!
//! Depth-1 families list matching files directly under the root. The
//! ner-clean family walks `method/field/item` directories. The item is the
//! file's full name (`herald.json`), which is what the external programs
//! expect. Results are ordered lexicographically by taxonomy path.

use glob::Pattern;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{JobFamily, Segment, TaxonomyPath, WorkUnit};
use crate::error::{OrchestrateError, Result};

/// Restricts directory levels to a single value (e.g. only `spacy` methods).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryFilter {
    levels: BTreeMap<usize, String>,
}

impl DiscoveryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only descend into entries named `value` at `level`.
    pub fn with_level(mut self, level: usize, value: impl Into<String>) -> Self {
        self.levels.insert(level, value.into());
        self
    }

    fn allows(&self, level: usize, name: &str) -> bool {
        self.levels.get(&level).map(|v| v == name).unwrap_or(true)
    }
}

struct Entry {
    name: String,
    path: PathBuf,
    is_dir: bool,
    is_file: bool,
}

/// Discover all work units for `family` under `root`.
///
/// Fails only when the root itself is missing, not a directory, or
/// unreadable. An empty root yields an empty vector.
pub fn discover(root: &Path, family: JobFamily, input_pattern: &str, filter: &DiscoveryFilter) -> Result<Vec<WorkUnit>> {
    let pattern = Pattern::new(input_pattern).map_err(|e| {
        OrchestrateError::Configuration(format!("invalid input pattern '{}': {}", input_pattern, e))
    })?;

    let metadata = fs::metadata(root).map_err(|e| {
        OrchestrateError::Discovery(format!("work root {} is not accessible: {}", root.display(), e))
    })?;
    if !metadata.is_dir() {
        return Err(OrchestrateError::Discovery(format!(
            "work root {} is not a directory",
            root.display()
        )));
    }
    let root = root.canonicalize().map_err(|e| {
        OrchestrateError::Discovery(format!("cannot resolve work root {}: {}", root.display(), e))
    })?;
    let entries = list_entries(&root).map_err(|e| {
        OrchestrateError::Discovery(format!("cannot read work root {}: {}", root.display(), e))
    })?;

    let mut units = Vec::new();
    let mut prefix = Vec::new();
    walk(entries, 0, family.depth(), &pattern, filter, &mut prefix, &mut units);

    units.sort_by(|a, b| a.path().cmp(b.path()));
    debug!("Discovered {} {} units under {}", units.len(), family, root.display());
    Ok(units)
}

fn walk(
    entries: Vec<Entry>,
    level: usize,
    depth: usize,
    pattern: &Pattern,
    filter: &DiscoveryFilter,
    prefix: &mut Vec<Segment>,
    units: &mut Vec<WorkUnit>,
) {
    let is_leaf = level + 1 == depth;

    for entry in entries {
        if is_leaf {
            if !entry.is_file || !pattern.matches(&entry.name) {
                continue;
            }
            if !filter.allows(level, &entry.name) {
                continue;
            }
            let segment = match Segment::new(entry.name.clone()) {
                Ok(segment) => segment,
                Err(e) => {
                    warn!("Skipping {}: {}", entry.path.display(), e);
                    continue;
                }
            };
            let mut segments = prefix.clone();
            segments.push(segment);
            match TaxonomyPath::new(segments) {
                Ok(path) => units.push(WorkUnit::new(path, entry.path)),
                Err(e) => warn!("Skipping {}: {}", entry.path.display(), e),
            }
        } else {
            if !entry.is_dir || !filter.allows(level, &entry.name) {
                continue;
            }
            let segment = match Segment::new(entry.name.clone()) {
                Ok(segment) => segment,
                Err(e) => {
                    warn!("Skipping {}: {}", entry.path.display(), e);
                    continue;
                }
            };
            let children = match list_entries(&entry.path) {
                Ok(children) => children,
                Err(e) => {
                    warn!("Skipping unreadable directory {}: {}", entry.path.display(), e);
                    continue;
                }
            };
            prefix.push(segment);
            walk(children, level + 1, depth, pattern, filter, prefix, units);
            prefix.pop();
        }
    }
}

/// Visible, UTF-8 named entries of `dir`, sorted by name.
fn list_entries(dir: &Path) -> std::io::Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for dir_entry in fs::read_dir(dir)? {
        let dir_entry = dir_entry?;
        let path = dir_entry.path();
        let name = match dir_entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                warn!("Skipping non UTF-8 entry {:?} in {}", raw, dir.display());
                continue;
            }
        };
        if name.starts_with('.') {
            continue;
        }
        // Follow symlinks so linked inputs are treated like regular ones.
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };
        entries.push(Entry {
            name,
            path,
            is_dir: metadata.is_dir(),
            is_file: metadata.is_file(),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "[]").unwrap();
    }

    fn rendered(units: &[WorkUnit]) -> Vec<String> {
        units.iter().map(|u| u.path().to_string()).collect()
    }

    #[test]
    fn test_depth_one_lists_matching_files_in_order() {
        let dir = TempDir::new().unwrap();
        for name in ["zeta.json", "alpha.json", "mid.json"] {
            touch(&dir.path().join(name));
        }
        touch(&dir.path().join("notes.txt"));
        touch(&dir.path().join(".hidden.json"));
        fs::create_dir(dir.path().join("nested.json")).unwrap();

        let units = discover(dir.path(), JobFamily::Scrape, "*.json", &DiscoveryFilter::new()).unwrap();
        assert_eq!(rendered(&units), vec!["alpha.json", "mid.json", "zeta.json"]);
        for unit in &units {
            assert!(unit.source_file().is_absolute());
            assert!(unit.source_file().exists());
        }
    }

    #[test]
    fn test_item_keeps_extension() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("a.json"));
        touch(&dir.path().join("a-b.json"));
        let units = discover(dir.path(), JobFamily::NerAnalyze, "*.json", &DiscoveryFilter::new()).unwrap();
        assert_eq!(rendered(&units), vec!["a-b.json", "a.json"]);
        assert_eq!(units[1].item().as_str(), "a.json");
        assert_eq!(units[1].source_file().file_name().and_then(|n| n.to_str()), Some("a.json"));
    }

    #[test]
    fn test_depth_three_cross_product() {
        let dir = TempDir::new().unwrap();
        for method in ["spacy", "nltk"] {
            for field in ["title", "text"] {
                for item in ["b.json", "a.json"] {
                    touch(&dir.path().join(method).join(field).join(item));
                }
            }
        }
        // Stray files at directory levels are ignored.
        touch(&dir.path().join("README.json"));
        touch(&dir.path().join("spacy").join("stray.json"));

        let units = discover(dir.path(), JobFamily::NerClean, "*.json", &DiscoveryFilter::new()).unwrap();
        assert_eq!(
            rendered(&units),
            vec![
                "nltk/text/a.json",
                "nltk/text/b.json",
                "nltk/title/a.json",
                "nltk/title/b.json",
                "spacy/text/a.json",
                "spacy/text/b.json",
                "spacy/title/a.json",
                "spacy/title/b.json",
            ]
        );
    }

    #[test]
    fn test_filter_restricts_levels() {
        let dir = TempDir::new().unwrap();
        for method in ["spacy", "nltk"] {
            for field in ["title", "text"] {
                touch(&dir.path().join(method).join(field).join("a.json"));
            }
        }
        let filter = DiscoveryFilter::new().with_level(0, "spacy").with_level(1, "text");
        let units = discover(dir.path(), JobFamily::NerClean, "*.json", &filter).unwrap();
        assert_eq!(rendered(&units), vec!["spacy/text/a.json"]);
    }

    #[test]
    fn test_empty_root_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let units = discover(dir.path(), JobFamily::NerClean, "*.json", &DiscoveryFilter::new()).unwrap();
        assert!(units.is_empty());
    }

    #[test]
    fn test_missing_root_is_discovery_error() {
        let dir = TempDir::new().unwrap();
        let err = discover(&dir.path().join("nope"), JobFamily::Scrape, "*.json", &DiscoveryFilter::new()).unwrap_err();
        assert!(err.is_discovery());
    }

    #[test]
    fn test_file_root_is_discovery_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.json");
        touch(&file);
        let err = discover(&file, JobFamily::Scrape, "*.json", &DiscoveryFilter::new()).unwrap_err();
        assert!(err.is_discovery());
    }

    #[test]
    fn test_invalid_pattern_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        let err = discover(dir.path(), JobFamily::Scrape, "[", &DiscoveryFilter::new()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_n_files_yield_n_units() {
        let dir = TempDir::new().unwrap();
        for i in 0..25 {
            touch(&dir.path().join(format!("links_{:02}.json", i)));
        }
        let units = discover(dir.path(), JobFamily::Scrape, "*.json", &DiscoveryFilter::new()).unwrap();
        assert_eq!(units.len(), 25);
        assert_eq!(units[0].item().as_str(), "links_00.json");
        assert_eq!(units[24].item().as_str(), "links_24.json");
    }
}
