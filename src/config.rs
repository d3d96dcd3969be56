//! Configuration for a toolkit run.
//!
//! Options are plain values handed to each operation; nothing here is global.
//! A `Config` can be loaded from a TOML file such as:
//!
//! ```toml
//! [scan]
//! recursive = true
//! extensions = ["jpg", "jpeg", "png"]
//!
//! [delete]
//! missing_ok = true
//! verify = false
//!
//! [paths]
//! project_dir = "/data/flowers"
//! raw_dataset_dir = "/mnt/raw"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolkitError};

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "sci-toolkit.toml";

/// Extensions treated as images by the duplicate scanner
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Options controlling directory traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkOptions {
    /// Descend into subdirectories
    pub recursive: bool,
    /// Follow symbolic links while walking
    pub follow_symlinks: bool,
    /// Draw progress bars on stderr
    pub show_progress: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            follow_symlinks: false,
            show_progress: true,
        }
    }
}

/// Options for `find_duplicates`.
///
/// Scans are flat unless `recursive` is set. With `recursive` set every nested
/// file joins the same scan and can pair with files in other directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    pub recursive: bool,
    /// Recognized extensions, without the leading dot, matched case-insensitively
    pub extensions: Vec<String>,
    /// Off by default: symlinked images are left out of the scan entirely,
    /// even when they point at a regular file. Turn on to hash link targets.
    pub follow_symlinks: bool,
    #[serde(skip)]
    pub show_progress: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            extensions: DEFAULT_IMAGE_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            follow_symlinks: false,
            show_progress: true,
        }
    }
}

impl ScanOptions {
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn walk(&self) -> WalkOptions {
        WalkOptions {
            recursive: self.recursive,
            follow_symlinks: self.follow_symlinks,
            show_progress: self.show_progress,
        }
    }
}

/// Options for `delete_duplicates`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteOptions {
    /// Treat an already missing duplicate as deleted instead of failing
    pub missing_ok: bool,
    /// Re-hash both files of a pair and only delete when they still match
    pub verify: bool,
    #[serde(skip)]
    pub show_progress: bool,
}

impl Default for DeleteOptions {
    fn default() -> Self {
        Self {
            missing_ok: true,
            verify: false,
            show_progress: true,
        }
    }
}

impl DeleteOptions {
    pub fn with_missing_ok(mut self, missing_ok: bool) -> Self {
        self.missing_ok = missing_ok;
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }
}

/// Whether arranged files are copied or moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    #[default]
    Copy,
    Move,
}

/// Options for `arrange_for_classification`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrangeOptions {
    /// Separator splitting the file stem into label components
    pub separator: String,
    /// Which component of the split stem is the class label
    pub class_index: usize,
    pub mode: TransferMode,
    pub recursive: bool,
    #[serde(skip)]
    pub show_progress: bool,
}

impl Default for ArrangeOptions {
    fn default() -> Self {
        Self {
            separator: "_".to_string(),
            class_index: 0,
            mode: TransferMode::Copy,
            recursive: true,
            show_progress: true,
        }
    }
}

/// Well-known directories of a data project.
///
/// Only `project_dir` is required; the others default to the conventional
/// layout beneath it unless overridden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectPaths {
    pub project_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reports_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_dataset_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_dataset_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_dataset_dir: Option<PathBuf>,
}

impl Default for ProjectPaths {
    fn default() -> Self {
        Self::from_root(".")
    }
}

impl ProjectPaths {
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: root.into(),
            reports_dir: None,
            models_dir: None,
            raw_dataset_dir: None,
            processed_dataset_dir: None,
            external_dataset_dir: None,
        }
    }

    fn resolve(&self, explicit: &Option<PathBuf>, default: &[&str]) -> PathBuf {
        match explicit {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.project_dir.join(path),
            None => default
                .iter()
                .fold(self.project_dir.clone(), |acc, part| acc.join(part)),
        }
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.resolve(&self.reports_dir, &["reports"])
    }

    pub fn models_dir(&self) -> PathBuf {
        self.resolve(&self.models_dir, &["models"])
    }

    pub fn raw_dataset_dir(&self) -> PathBuf {
        self.resolve(&self.raw_dataset_dir, &["data", "raw"])
    }

    pub fn processed_dataset_dir(&self) -> PathBuf {
        self.resolve(&self.processed_dataset_dir, &["data", "processed"])
    }

    pub fn external_dataset_dir(&self) -> PathBuf {
        self.resolve(&self.external_dataset_dir, &["data", "external"])
    }

    /// Resolves a command-line path: absolute paths pass through, relative
    /// ones are taken against the project directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_dir.join(path)
        }
    }
}

/// Top-level configuration for a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanOptions,
    pub delete: DeleteOptions,
    pub arrange: ArrangeOptions,
    pub paths: ProjectPaths,
}

impl Config {
    /// Parses a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ToolkitError::io(path, e))?;
        let config = Self::from_toml(&content).map_err(|message| ToolkitError::Config {
            path: path.to_path_buf(),
            message,
        })?;
        info!("Loaded config from '{}'", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Loads `explicit` if given, otherwise `sci-toolkit.toml` from the
    /// working directory if it exists, otherwise the defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        if local.is_file() {
            return Self::load(&local);
        }
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }
}
