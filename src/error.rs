//! Error types shared by every toolkit operation.
//!
//! Every variant carries the path that caused it so a failed batch can be
//! traced back to the offending file.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolkitError {
    /// The caller handed us something we cannot operate on
    #[error("Invalid input '{}': {reason}", path.display())]
    InvalidInput { path: PathBuf, reason: String },

    /// Reading, writing, renaming or unlinking a file failed
    #[error("I/O failure on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A duplicate scheduled for deletion no longer exists
    #[error("File not found: '{}'", path.display())]
    NotFound { path: PathBuf },

    /// The original of a pair is gone or no longer matches its duplicate
    #[error(
        "Refusing to delete '{}': original '{}' is missing or differs",
        duplicate.display(),
        original.display()
    )]
    VerificationFailed { duplicate: PathBuf, original: PathBuf },

    /// Decoding or encoding an image failed
    #[error("Image codec error on '{}': {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A configuration or report file could not be parsed or written
    #[error("Bad config or report file '{}': {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl ToolkitError {
    pub fn invalid_input(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ToolkitError::InvalidInput {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ToolkitError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ToolkitError>;

/// Attaches a path to a bare `io::Result`.
pub(crate) trait IoResultExt<T> {
    fn at_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn at_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| ToolkitError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_path() {
        let err = ToolkitError::invalid_input("/tmp/photos", "not a directory");
        assert_eq!(
            err.to_string(),
            "Invalid input '/tmp/photos': not a directory"
        );

        let err = ToolkitError::NotFound {
            path: PathBuf::from("gone.png"),
        };
        assert!(err.to_string().contains("gone.png"));
    }

    #[test]
    fn test_at_path_wraps_io_errors() {
        let res: std::io::Result<()> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        match res.at_path("locked.jpg") {
            Err(ToolkitError::Io { path, source }) => {
                assert_eq!(path, PathBuf::from("locked.jpg"));
                assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
