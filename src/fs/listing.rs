use std::path::Path;
use tracing::debug;

use crate::error::Result;

/// List the immediate child directories of `root`, sorted by name
///
/// Only real directories are listed; symlinks and files are left out, as are
/// names that are not valid UTF-8 since they cannot be requested by name.
pub fn list_archivable_dirs(root: &Path) -> Result<Vec<String>> {
    let mut dirs = Vec::new();

    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) => dirs.push(name),
            Err(name) => debug!("Skipping non UTF-8 directory name {:?}", name),
        }
    }

    dirs.sort();
    Ok(dirs)
}
