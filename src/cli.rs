use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sci-toolkit", version)]
#[command(about = "Data preparation utilities for image classification datasets")]
pub struct Cli {
    /// TOML config file (default: ./sci-toolkit.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Resolve relative paths against the configured project directory
    #[arg(short, long, global = true)]
    pub project: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Hide progress bars
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Find images with identical content and optionally delete the copies
    Dedup {
        /// Directory to scan for duplicates
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Include subdirectories in the scan
        #[arg(short, long)]
        recursive: bool,

        /// Delete every duplicate, keeping the first file of each group
        #[arg(short, long)]
        delete: bool,

        /// Fail if a duplicate disappears before it is deleted
        #[arg(long)]
        strict: bool,

        /// Re-hash each pair right before deleting
        #[arg(long)]
        verify: bool,

        /// Write the duplicate pairs to a JSON report
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Delete the duplicates listed in a JSON report
    DeleteReport {
        report: PathBuf,

        /// Fail if a duplicate disappears before it is deleted
        #[arg(long)]
        strict: bool,

        /// Re-hash each pair right before deleting
        #[arg(long)]
        verify: bool,
    },

    /// Convert every image in a directory to another format
    Convert {
        path: PathBuf,

        /// Target format (png, jpg, webp, bmp, ...)
        #[arg(short, long, default_value = "png")]
        to: String,

        /// Write converted files here instead of next to the originals
        #[arg(short, long)]
        dest: Option<PathBuf>,

        /// Only convert files directly inside the directory
        #[arg(long)]
        no_recursive: bool,
    },

    /// Shrink images so their longest side fits the given size
    Compress {
        path: PathBuf,

        /// Maximum width or height in pixels
        #[arg(short, long)]
        max_size: u32,

        /// Only compress files directly inside the directory
        #[arg(long)]
        no_recursive: bool,
    },

    /// Copy or move files into per-class subdirectories
    Arrange {
        source: PathBuf,

        /// Destination root (default: the source directory)
        #[arg(short, long)]
        dest: Option<PathBuf>,

        /// Separator between label components in file names
        #[arg(long)]
        sep: Option<String>,

        /// Index of the class label among the components
        #[arg(long)]
        class_index: Option<usize>,

        /// Move files instead of copying them
        #[arg(long = "move")]
        move_files: bool,
    },

    /// Rename files to <NAME>_<n><ext>
    Rename { path: PathBuf, name: String },

    /// Print the configured project directories
    Paths,
}
