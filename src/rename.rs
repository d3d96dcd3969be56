use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::config::WalkOptions;
use crate::error::{IoResultExt, Result, ToolkitError};
use crate::scanner::collect_files;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenameSummary {
    pub renamed: usize,
    /// Files whose new name was already taken
    pub skipped: usize,
}

fn numbered_name(path: &Path, name: &str, index: usize) -> PathBuf {
    let file_name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", name, index, ext.to_string_lossy()),
        None => format!("{}_{}", name, index),
    };
    path.with_file_name(file_name)
}

/// Renames the files directly inside `source` to `<name>_<n><ext>`, numbering
/// from 1 in file-name order. Subdirectories are left alone and a file is
/// skipped when its new name already exists.
pub fn rename_files(source: &Path, name: &str, show_progress: bool) -> Result<RenameSummary> {
    if name.is_empty() || name.contains(['/', '\\']) {
        return Err(ToolkitError::invalid_input(
            source,
            format!("'{}' is not a usable base name", name),
        ));
    }
    let walk = WalkOptions {
        recursive: false,
        follow_symlinks: false,
        show_progress,
    };
    let files = collect_files(source, &walk)?;

    let mut summary = RenameSummary::default();
    for (idx, path) in files.iter().enumerate() {
        let target = numbered_name(path, name, idx + 1);
        if target == *path {
            continue;
        }
        if target.exists() {
            warn!(
                "Not renaming '{}': '{}' already exists",
                path.display(),
                target.display()
            );
            summary.skipped += 1;
            continue;
        }
        fs::rename(path, &target).at_path(path)?;
        debug!("Renamed '{}' -> '{}'", path.display(), target.display());
        summary.renamed += 1;
    }

    info!(
        "Renamed {} files in '{}' ({} skipped)",
        summary.renamed,
        source.display(),
        summary.skipped
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_numbering_keeps_extension() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("IMG_4411.HEIC"), b"1").unwrap();
        fs::write(root.join("IMG_4412.jpg"), b"2").unwrap();
        fs::write(root.join("README"), b"3").unwrap();
        fs::create_dir(root.join("sub")).unwrap();

        let summary = rename_files(root, "flower", false).unwrap();
        assert_eq!(summary, RenameSummary { renamed: 3, skipped: 0 });
        assert_eq!(fs::read(root.join("flower_1.HEIC")).unwrap(), b"1");
        assert_eq!(fs::read(root.join("flower_2.jpg")).unwrap(), b"2");
        assert_eq!(fs::read(root.join("flower_3")).unwrap(), b"3");
        assert!(root.join("sub").is_dir());
    }

    #[test]
    fn test_existing_target_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a.png"), b"a").unwrap();
        fs::write(root.join("b.png"), b"b").unwrap();
        fs::write(root.join("x_1.png"), b"taken").unwrap();

        // a.png -> x_1.png collides, b.png -> x_2.png, x_1.png -> x_3.png
        let summary = rename_files(root, "x", false).unwrap();
        assert_eq!(summary, RenameSummary { renamed: 2, skipped: 1 });
        assert_eq!(fs::read(root.join("a.png")).unwrap(), b"a");
        assert_eq!(fs::read(root.join("x_2.png")).unwrap(), b"b");
        assert_eq!(fs::read(root.join("x_3.png")).unwrap(), b"taken");
    }

    #[test]
    fn test_rejects_bad_name() {
        let temp_dir = TempDir::new().unwrap();
        assert!(rename_files(temp_dir.path(), "", false).is_err());
        assert!(rename_files(temp_dir.path(), "../escape", false).is_err());
    }
}
