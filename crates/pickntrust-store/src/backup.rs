//! JSON export of `unified_content`.

use std::path::{Path, PathBuf};

use chrono::Utc;
use pickntrust_models::ContentItem;
use tracing::info;

use crate::atomic::{atomic_write_json, read_json};
use crate::db::Database;
use crate::error::Result;

/// File name prefix of content exports.
pub const EXPORT_PREFIX: &str = "unified_content-";

impl Database {
    /// Writes every content row to `dir/unified_content-<timestamp>.json`.
    ///
    /// Returns the path written.
    pub fn export_json(&self, dir: &Path) -> Result<PathBuf> {
        let items = self.all_content()?;
        let path = dir.join(format!(
            "{}{}.json",
            EXPORT_PREFIX,
            Utc::now().format("%Y%m%d-%H%M%S")
        ));
        atomic_write_json(&path, &items)?;
        info!(path = %path.display(), rows = items.len(), "Exported content");
        Ok(path)
    }
}

/// Loads an export written by [`Database::export_json`].
pub fn load_export(path: &Path) -> Result<Vec<ContentItem>> {
    read_json(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pickntrust_models::ContentBuilder;
    use tempfile::tempdir;

    #[test]
    fn test_export_json() {
        let dir = tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        db.insert_content(&ContentBuilder::new("Mixer", "https://amzn.to/m").build())
            .unwrap();
        db.insert_content(&ContentBuilder::new("Kettle", "https://amzn.to/k").build())
            .unwrap();

        let path = db.export_json(&dir.path().join("backups")).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(EXPORT_PREFIX));
        assert!(name.ends_with(".json"));

        let items = load_export(&path).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Kettle");
    }
}
