use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{CorpusError, CorpusResult};

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(extension)
}

/// Recursively collect files with the given extension below `dir`
///
/// Symlinked directories are not followed. Subdirectories that cannot be
/// read are skipped with a warning.
fn walk_dir(dir: &Path, extension: &str, found: &mut BTreeSet<PathBuf>) -> CorpusResult<()> {
    let entries = fs::read_dir(dir).map_err(|e| CorpusError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| CorpusError::io(dir, e))?;
        let path = entry.path();
        let is_dir = entry
            .file_type()
            .map(|file_type| file_type.is_dir())
            .unwrap_or(false);

        if is_dir {
            if let Err(e) = walk_dir(&path, extension, found) {
                warn!("Skipping unreadable directory: {}", e);
            }
        } else if path.is_file() && has_extension(&path, extension) {
            found.insert(path);
        }
    }
    Ok(())
}

/// Resolve input paths into the sorted list of documents to convert
///
/// Each path is either a document carrying `extension` or a directory that
/// is scanned recursively. Paths are made absolute and de-duplicated, so the
/// result does not depend on argument order or directory listing order.
///
/// # Errors
/// - Path cannot be made absolute
/// - Top-level directory cannot be read
///
/// An empty result is not an error here; callers decide how to report it.
pub fn collect_files<P: AsRef<Path>>(paths: &[P], extension: &str) -> CorpusResult<Vec<PathBuf>> {
    let roots = paths
        .iter()
        .map(|path| {
            let path = path.as_ref();
            std::path::absolute(path).map_err(|e| CorpusError::io(path, e))
        })
        .collect::<CorpusResult<BTreeSet<_>>>()?;

    let mut files = BTreeSet::new();
    for root in roots {
        if root.is_dir() {
            let mut found = BTreeSet::new();
            walk_dir(&root, extension, &mut found)?;
            info!("Queuing {} TMX(s) in {}", found.len(), root.display());
            files.append(&mut found);
        } else if root.is_file() && has_extension(&root, extension) {
            files.insert(root);
        } else {
            warn!("Skipping {}: not a .{} file or directory", root.display(), extension);
        }
    }
    Ok(files.into_iter().collect())
}
