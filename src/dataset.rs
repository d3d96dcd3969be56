use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use indicatif::HumanCount;
use log::{debug, info};

use crate::config::{ArrangeOptions, TransferMode, WalkOptions};
use crate::error::{IoResultExt, Result, ToolkitError};
use crate::scanner::collect_files;
use crate::utils::progress_bar;

/// Class label of `path`: the `class_index`-th component of its stem split on
/// `separator`.
pub fn class_label(path: &Path, separator: &str, class_index: usize) -> Result<String> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ToolkitError::invalid_input(path, "file name is not valid UTF-8"))?;
    if separator.is_empty() {
        return Err(ToolkitError::invalid_input(path, "separator must not be empty"));
    }
    match stem.split(separator).nth(class_index) {
        Some(label) if !label.is_empty() => Ok(label.to_string()),
        _ => Err(ToolkitError::invalid_input(
            path,
            format!(
                "no class label at index {} when splitting on '{}'",
                class_index, separator
            ),
        )),
    }
}

/// Sorts the files of `source` into one subdirectory per class label.
///
/// Files land in `<destination>/<label>/<file name>`, or under `source` itself
/// when no destination is given. Every file is labelled before the first one
/// is placed, so a bad name fails the run without moving anything. Returns the
/// number of files placed.
pub fn arrange_for_classification(
    source: &Path,
    destination: Option<&Path>,
    options: &ArrangeOptions,
) -> Result<usize> {
    let walk = WalkOptions {
        recursive: options.recursive,
        follow_symlinks: false,
        show_progress: options.show_progress,
    };
    let files = collect_files(source, &walk)?;
    let root = destination.unwrap_or(source);

    let mut plan: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(files.len());
    // target -> the file that will end up there
    let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::with_capacity(files.len());
    for path in files {
        let label = class_label(&path, &options.separator, options.class_index)?;
        let Some(name) = path.file_name() else {
            continue;
        };
        let target = root.join(&label).join(name);
        if let Some(other) = claimed.get(&target) {
            return Err(ToolkitError::invalid_input(
                &path,
                format!(
                    "'{}' would also be placed at '{}'",
                    other.display(),
                    target.display()
                ),
            ));
        }
        if target != path && fs::symlink_metadata(&target).is_ok() {
            return Err(ToolkitError::invalid_input(
                &path,
                format!("'{}' already exists", target.display()),
            ));
        }
        claimed.insert(target.clone(), path.clone());
        if target != path {
            plan.push((path, target));
        }
    }

    info!(
        "Arranging {} files from '{}' into '{}' ({:?})",
        HumanCount(plan.len() as u64),
        source.display(),
        root.display(),
        options.mode
    );
    let pb = progress_bar(
        plan.len() as u64,
        "Arranging files for classification...",
        options.show_progress,
    );
    for (from, to) in &plan {
        if let Some(class_dir) = to.parent() {
            fs::create_dir_all(class_dir).at_path(class_dir)?;
        }
        match options.mode {
            TransferMode::Copy => {
                fs::copy(from, to).at_path(from)?;
            }
            TransferMode::Move => move_file(from, to)?,
        }
        debug!("{} -> {}", from.display(), to.display());
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(plan.len())
}

fn move_file(from: &Path, to: &Path) -> Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
            fs::copy(from, to).at_path(from)?;
            fs::remove_file(from).at_path(from)
        }
        Err(e) => Err(ToolkitError::io(from, e)),
    }
}
