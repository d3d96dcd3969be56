use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use colored::Colorize;
use indicatif::{HumanBytes, HumanCount};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::config::{DeleteOptions, ScanOptions};
use crate::error::{IoResultExt, Result, ToolkitError};
use crate::scanner::{calculate_file_hash, collect_candidates};
use crate::utils::progress_bar;

/// A file whose content matches a file seen earlier in the same scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DuplicatePair {
    /// The later file, the one that gets deleted
    pub duplicate: PathBuf,
    /// The first file seen with this content, never deleted
    pub original: PathBuf,
}

impl DuplicatePair {
    pub fn new(duplicate: impl Into<PathBuf>, original: impl Into<PathBuf>) -> Self {
        Self {
            duplicate: duplicate.into(),
            original: original.into(),
        }
    }
}

/// Outcome of `delete_duplicates`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteSummary {
    pub deleted: usize,
    /// Duplicates that were already gone, skipped under `missing_ok`
    pub missing: usize,
    pub bytes_freed: u64,
}

/// Scans `directory` and pairs every repeated image with the first file that
/// had the same content.
///
/// Pairs come back in encounter order. Any read failure aborts the scan.
pub fn find_duplicates(directory: &Path, options: &ScanOptions) -> Result<Vec<DuplicatePair>> {
    let candidates = collect_candidates(directory, &options.extensions, &options.walk())?;

    let pb = progress_bar(
        candidates.len() as u64,
        "Hashing images...",
        options.show_progress,
    );
    // hash -> first path seen with that hash
    let mut registry: HashMap<String, PathBuf> = HashMap::new();
    let mut duplicates = Vec::new();

    for path in candidates {
        let hash = match calculate_file_hash(&path) {
            Ok(hash) => hash,
            Err(e) => {
                pb.abandon();
                return Err(e);
            }
        };
        match registry.get(&hash) {
            Some(original) => {
                debug!(
                    "'{}' duplicates '{}'",
                    path.display(),
                    original.display()
                );
                duplicates.push(DuplicatePair::new(path, original.clone()));
            }
            None => {
                registry.insert(hash, path);
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    info!(
        "Duplicate analysis complete: {} unique images, {} duplicates",
        HumanCount(registry.len() as u64),
        HumanCount(duplicates.len() as u64)
    );
    Ok(duplicates)
}

/// Deletes the duplicate side of every pair, in order.
///
/// Originals are never touched: the batch is rejected up front if any
/// duplicate is its own original or the original of another pair. Past that
/// check, a failure stops the batch and leaves earlier deletions in place.
pub fn delete_duplicates(
    pairs: &[DuplicatePair],
    options: &DeleteOptions,
) -> Result<DeleteSummary> {
    check_originals_untouched(pairs)?;
    info!("Deleting {} duplicates", HumanCount(pairs.len() as u64));
    let pb = progress_bar(
        pairs.len() as u64,
        "Deleting duplicates...",
        options.show_progress,
    );
    let mut summary = DeleteSummary::default();

    for pair in pairs {
        let result = delete_one(pair, options, &mut summary);
        if let Err(e) = result {
            pb.abandon();
            return Err(e);
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    info!(
        "Deleted {} files, freed {}",
        HumanCount(summary.deleted as u64),
        HumanBytes(summary.bytes_freed)
    );
    if summary.missing > 0 {
        warn!("{} duplicates were already gone", summary.missing);
    }
    Ok(summary)
}

/// Resolves the parent directory where possible, so `./a.png` and `a.png`
/// count as the same file. The last component is kept as is, so a symlink is
/// not confused with its target.
fn identity(path: &Path) -> PathBuf {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            fs::canonicalize(parent)
                .map(|dir| dir.join(name))
                .unwrap_or_else(|_| path.to_path_buf())
        }
        _ => path.to_path_buf(),
    }
}

fn check_originals_untouched(pairs: &[DuplicatePair]) -> Result<()> {
    let originals: HashSet<PathBuf> = pairs.iter().map(|p| identity(&p.original)).collect();
    for pair in pairs {
        let duplicate = identity(&pair.duplicate);
        if duplicate == identity(&pair.original) {
            return Err(ToolkitError::invalid_input(
                &pair.duplicate,
                "duplicate is the same file as its original",
            ));
        }
        if originals.contains(&duplicate) {
            return Err(ToolkitError::invalid_input(
                &pair.duplicate,
                "duplicate is the original of another pair",
            ));
        }
    }
    Ok(())
}

fn delete_one(
    pair: &DuplicatePair,
    options: &DeleteOptions,
    summary: &mut DeleteSummary,
) -> Result<()> {
    let path = &pair.duplicate;
    // symlink_metadata so a dangling link is still removable
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if options.missing_ok {
                debug!("Already gone: '{}'", path.display());
                summary.missing += 1;
                return Ok(());
            }
            return Err(ToolkitError::NotFound { path: path.clone() });
        }
        Err(e) => return Err(ToolkitError::io(path, e)),
    };

    if metadata.is_dir() {
        return Err(ToolkitError::invalid_input(path, "duplicate must be a file"));
    }
    if options.verify && !still_identical(pair)? {
        return Err(ToolkitError::VerificationFailed {
            duplicate: path.clone(),
            original: pair.original.clone(),
        });
    }

    match fs::remove_file(path) {
        Ok(()) => {
            debug!("Deleted '{}'", path.display());
            summary.deleted += 1;
            summary.bytes_freed += metadata.len();
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && options.missing_ok => {
            summary.missing += 1;
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ToolkitError::NotFound { path: path.clone() })
        }
        Err(e) => Err(ToolkitError::io(path, e)),
    }
}

fn still_identical(pair: &DuplicatePair) -> Result<bool> {
    if !pair.original.is_file() {
        return Ok(false);
    }
    Ok(calculate_file_hash(&pair.original)? == calculate_file_hash(&pair.duplicate)?)
}

pub fn print_results(duplicates: &[DuplicatePair], base_path: &Path) {
    if duplicates.is_empty() {
        println!("{}", "No duplicate files found!".green());
        return;
    }
    let wasted: u64 = duplicates
        .iter()
        .filter_map(|pair| fs::metadata(&pair.duplicate).ok())
        .map(|m| m.len())
        .sum();

    println!(
        "{}",
        format!(
            "Found {} duplicate files wasting {} of space",
            HumanCount(duplicates.len() as u64),
            HumanBytes(wasted)
        )
        .yellow()
    );

    let relative = |path: &Path| -> String {
        path.strip_prefix(base_path)
            .unwrap_or(path)
            .display()
            .to_string()
    };
    for pair in duplicates {
        println!(
            "  {} {} {}",
            relative(&pair.duplicate).red(),
            "duplicates".dimmed(),
            relative(&pair.original)
        );
    }
}

/// JSON report of one scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateReport {
    /// RFC 3339 timestamp of when the report was written
    pub generated_at: String,
    pub directory: PathBuf,
    pub recursive: bool,
    pub pairs: Vec<DuplicatePair>,
}

/// Writes `pairs` as a JSON report at `path`, recording which directory was
/// scanned and how.
pub fn write_report(
    pairs: &[DuplicatePair],
    path: &Path,
    directory: &Path,
    recursive: bool,
) -> Result<()> {
    let generated_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|e| ToolkitError::Config {
            path: path.to_path_buf(),
            message: format!("cannot format report timestamp: {}", e),
        })?;
    let report = DuplicateReport {
        generated_at,
        directory: directory.to_path_buf(),
        recursive,
        pairs: pairs.to_vec(),
    };
    let content = serde_json::to_vec_pretty(&report).map_err(|e| ToolkitError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).at_path(parent)?;
    }
    fs::write(path, content).at_path(path)?;
    info!("Wrote {} pairs to '{}'", pairs.len(), path.display());
    Ok(())
}

pub fn read_report(path: &Path) -> Result<DuplicateReport> {
    let content = fs::read(path).at_path(path)?;
    serde_json::from_slice(&content).map_err(|e| ToolkitError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn quiet_scan() -> ScanOptions {
        ScanOptions::default().with_progress(false)
    }

    fn quiet_delete() -> DeleteOptions {
        DeleteOptions::default().with_progress(false)
    }

    #[test]
    fn test_basic_pairing() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a.png"), b"X").unwrap();
        fs::write(root.join("b.png"), b"X").unwrap();
        fs::write(root.join("c.jpg"), b"Y").unwrap();

        let pairs = find_duplicates(root, &quiet_scan()).unwrap();
        assert_eq!(pairs, vec![DuplicatePair::new(root.join("b.png"), root.join("a.png"))]);
    }

    #[test]
    fn test_all_later_copies_point_at_first() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for name in ["1.jpg", "2.jpeg", "3.PNG"] {
            fs::write(root.join(name), b"same").unwrap();
        }

        let pairs = find_duplicates(root, &quiet_scan()).unwrap();
        assert_eq!(
            pairs,
            vec![
                DuplicatePair::new(root.join("2.jpeg"), root.join("1.jpg")),
                DuplicatePair::new(root.join("3.PNG"), root.join("1.jpg")),
            ]
        );
    }

    #[test]
    fn test_ignores_other_extensions_and_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a.png"), b"X").unwrap();
        fs::write(root.join("a.txt"), b"X").unwrap();
        fs::write(root.join("a.gif"), b"X").unwrap();
        fs::create_dir(root.join("folder.png")).unwrap();

        assert!(find_duplicates(root, &quiet_scan()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_directory_is_invalid_input() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        assert!(matches!(
            find_duplicates(&missing, &quiet_scan()),
            Err(ToolkitError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_delete_removes_only_duplicates() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a.png"), b"X").unwrap();
        fs::write(root.join("b.png"), b"X").unwrap();

        let pairs = find_duplicates(root, &quiet_scan()).unwrap();
        let summary = delete_duplicates(&pairs, &quiet_delete()).unwrap();
        assert_eq!(summary.deleted, 1);
        assert_eq!(summary.bytes_freed, 1);
        assert!(root.join("a.png").exists());
        assert!(!root.join("b.png").exists());
    }

    #[test]
    fn test_delete_directory_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("folder")).unwrap();
        fs::write(root.join("a.png"), b"X").unwrap();

        let pairs = vec![DuplicatePair::new(root.join("folder"), root.join("a.png"))];
        match delete_duplicates(&pairs, &quiet_delete()) {
            Err(ToolkitError::InvalidInput { reason, .. }) => {
                assert_eq!(reason, "duplicate must be a file")
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(root.join("folder").is_dir());
        assert!(root.join("a.png").exists());
    }

    #[test]
    fn test_missing_ok_controls_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let pairs = vec![DuplicatePair::new(root.join("gone.png"), root.join("a.png"))];

        let summary = delete_duplicates(&pairs, &quiet_delete()).unwrap();
        assert_eq!(summary.missing, 1);
        assert_eq!(summary.deleted, 0);

        match delete_duplicates(&pairs, &quiet_delete().with_missing_ok(false)) {
            Err(ToolkitError::NotFound { path }) => assert_eq!(path, root.join("gone.png")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_partial_failure_keeps_earlier_deletions() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a.png"), b"X").unwrap();
        fs::write(root.join("b.png"), b"X").unwrap();
        fs::write(root.join("d.png"), b"X").unwrap();
        fs::create_dir(root.join("c")).unwrap();

        let pairs = vec![
            DuplicatePair::new(root.join("b.png"), root.join("a.png")),
            DuplicatePair::new(root.join("c"), root.join("a.png")),
            DuplicatePair::new(root.join("d.png"), root.join("a.png")),
        ];
        assert!(delete_duplicates(&pairs, &quiet_delete()).is_err());
        assert!(!root.join("b.png").exists());
        assert!(root.join("d.png").exists());
    }

    #[test]
    fn test_verify_refuses_changed_original() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a.png"), b"X").unwrap();
        fs::write(root.join("b.png"), b"X").unwrap();

        let pairs = find_duplicates(root, &quiet_scan()).unwrap();
        fs::write(root.join("a.png"), b"edited").unwrap();

        let verify = quiet_delete().with_verify(true);
        assert!(matches!(
            delete_duplicates(&pairs, &verify),
            Err(ToolkitError::VerificationFailed { .. })
        ));
        assert!(root.join("b.png").exists());

        fs::write(root.join("a.png"), b"X").unwrap();
        assert_eq!(delete_duplicates(&pairs, &verify).unwrap().deleted, 1);
    }

    #[test]
    fn test_verify_refuses_missing_original() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("b.png"), b"X").unwrap();

        let pairs = vec![DuplicatePair::new(root.join("b.png"), root.join("a.png"))];
        assert!(matches!(
            delete_duplicates(&pairs, &quiet_delete().with_verify(true)),
            Err(ToolkitError::VerificationFailed { .. })
        ));
        assert!(root.join("b.png").exists());
    }

    #[test]
    fn test_pair_pointing_at_itself_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a.png"), b"X").unwrap();

        let pairs = vec![DuplicatePair::new(
            root.join("a.png"),
            root.join(".").join("a.png"),
        )];
        match delete_duplicates(&pairs, &quiet_delete()) {
            Err(ToolkitError::InvalidInput { path, .. }) => assert_eq!(path, root.join("a.png")),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(root.join("a.png").exists());
    }

    #[test]
    fn test_original_of_another_pair_is_never_deleted() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for name in ["a.png", "b.png", "c.png"] {
            fs::write(root.join(name), b"X").unwrap();
        }

        let pairs = vec![
            DuplicatePair::new(root.join("b.png"), root.join("a.png")),
            DuplicatePair::new(root.join("a.png"), root.join("c.png")),
        ];
        assert!(matches!(
            delete_duplicates(&pairs, &quiet_delete()),
            Err(ToolkitError::InvalidInput { .. })
        ));
        // rejected before anything was deleted
        for name in ["a.png", "b.png", "c.png"] {
            assert!(root.join(name).exists());
        }
    }

    #[test]
    fn test_report_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let pairs = vec![DuplicatePair::new(root.join("b.png"), root.join("a.png"))];
        let report_path = root.join("reports").join("dups.json");

        write_report(&pairs, &report_path, root, false).unwrap();
        let report = read_report(&report_path).unwrap();
        assert_eq!(report.pairs, pairs);
        assert_eq!(report.directory, root);
        assert!(!report.recursive);
        assert!(OffsetDateTime::parse(&report.generated_at, &Rfc3339).is_ok());
    }

    #[test]
    fn test_read_report_rejects_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.json");
        fs::write(&path, b"{ not json").unwrap();
        assert!(matches!(
            read_report(&path),
            Err(ToolkitError::Config { .. })
        ));
    }
}
