pub mod cli;
pub mod config;
pub mod convert;
pub mod dataset;
pub mod duplicates;
pub mod error;
pub mod rename;
pub mod scanner;
pub mod utils;

pub use cli::{Cli, Command};
pub use config::{
    ArrangeOptions, Config, DeleteOptions, ProjectPaths, ScanOptions, TransferMode, WalkOptions,
};
pub use convert::{ConvertSummary, compress_images, convert_images, parse_format};
pub use dataset::{arrange_for_classification, class_label};
pub use duplicates::{
    DeleteSummary, DuplicatePair, DuplicateReport, delete_duplicates, find_duplicates,
    print_results, read_report, write_report,
};
pub use error::{Result, ToolkitError};
pub use rename::{RenameSummary, rename_files};
pub use scanner::{calculate_file_hash, collect_candidates, collect_files};
pub use utils::format_human_elapsed;
