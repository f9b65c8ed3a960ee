// Pivot discovery against the generated entities directory

use std::path::{Path, PathBuf};
use tracing::trace;

use super::traits::PivotResolver;
use crate::naming;

/// Finds pivots by looking for a generated `<First><Second>.<ext>` entity file.
///
/// Existence is checked on every call so the answer follows the deployed
/// entities rather than a cached snapshot.
#[derive(Debug, Clone)]
pub struct FilePivotResolver {
    entities_dir: PathBuf,
    extension: String,
}

impl FilePivotResolver {
    pub fn new(entities_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            entities_dir: entities_dir.into(),
            extension: extension.into().trim_start_matches('.').to_string(),
        }
    }

    pub fn entities_dir(&self) -> &Path {
        &self.entities_dir
    }

    pub fn pivot_path(&self, first: &str, second: &str) -> PathBuf {
        self.entities_dir
            .join(format!("{}.{}", naming::pivot_name(first, second), self.extension))
    }
}

impl PivotResolver for FilePivotResolver {
    fn pivot_exists(&self, first: &str, second: &str) -> bool {
        let path = self.pivot_path(first, second);
        let exists = path.is_file();
        trace!(path = %path.display(), exists, "Pivot probe");
        exists
    }
}
