use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::{debug, info};
use walkdir::WalkDir;

use crate::config::WalkOptions;
use crate::error::{IoResultExt, Result, ToolkitError};
use crate::utils::{has_extension, spinner};

const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// Fails with `InvalidInput` unless `dir` exists and is a directory.
pub fn ensure_directory(dir: &Path) -> Result<()> {
    if !dir.exists() {
        return Err(ToolkitError::invalid_input(dir, "directory does not exist"));
    }
    if !dir.is_dir() {
        return Err(ToolkitError::invalid_input(dir, "not a directory"));
    }
    Ok(())
}

/// Hex-encoded BLAKE3 digest (256 bits) of the file's full content.
pub fn calculate_file_hash(file_path: &Path) -> Result<String> {
    let mut file = fs::File::open(file_path).at_path(file_path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0; HASH_BUFFER_SIZE];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = file.read(&mut buffer).at_path(file_path)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
        total_bytes += bytes_read as u64;
    }

    let hash = hasher.finalize().to_hex().to_string();
    debug!(
        "Hash calculated for '{}': {} ({} bytes)",
        file_path.display(),
        hash,
        total_bytes
    );
    Ok(hash)
}

/// Lists the regular files under `dir` in encounter order.
///
/// Entries are visited sorted by file name within each directory, so two walks
/// over an unchanged tree yield the same order.
pub fn collect_files(dir: &Path, options: &WalkOptions) -> Result<Vec<PathBuf>> {
    ensure_directory(dir)?;

    let max_depth = if options.recursive { usize::MAX } else { 1 };
    let pb = spinner("Scanning files...", options.show_progress);

    let mut files = Vec::new();
    let mut total_dirs = 0usize;
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(options.follow_symlinks)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            ToolkitError::io(path, e.into())
        })?;
        let file_type = entry.file_type();
        if file_type.is_dir() {
            total_dirs += 1;
        } else if file_type.is_file() {
            files.push(entry.into_path());
            if files.len() % 64 == 0 {
                pb.set_message(format!("Scanning files... {} found", files.len()));
            }
        }
    }
    pb.finish_and_clear();

    debug!(
        "Found {} files and {} directories under '{}'",
        files.len(),
        total_dirs,
        dir.display()
    );
    Ok(files)
}

/// Lists the files under `dir` carrying one of `extensions`.
pub fn collect_candidates(
    dir: &Path,
    extensions: &[String],
    options: &WalkOptions,
) -> Result<Vec<PathBuf>> {
    let files = collect_files(dir, options)?;
    let total = files.len();
    let candidates: Vec<PathBuf> = files
        .into_iter()
        .filter(|path| has_extension(path, extensions))
        .collect();
    info!(
        "Scanning '{}': {} of {} files match [{}]",
        dir.display(),
        candidates.len(),
        total,
        extensions.join(", ")
    );
    Ok(candidates)
}
