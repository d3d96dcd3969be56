use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use log::{LevelFilter, debug, info};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

use sci_toolkit::{
    Cli, Command, Config, DeleteOptions, WalkOptions, arrange_for_classification,
    compress_images, convert_images, delete_duplicates, find_duplicates, format_human_elapsed,
    parse_format, print_results, read_report, rename_files, write_report,
};

fn init_logging(verbose: bool) -> Result<()> {
    let mut builder = ConfigBuilder::new();
    builder.set_time_format_rfc3339();
    // Falls back to UTC when the local offset cannot be determined
    let _ = builder.set_time_offset_to_local();
    TermLogger::init(
        if verbose { LevelFilter::Debug } else { LevelFilter::Info },
        builder.build(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .context("Failed to initialize logger")
}

fn resolve_dir(config: &Config, cli: &Cli, path: &Path) -> Result<PathBuf> {
    let path = if cli.project {
        config.paths.resolve_path(path)
    } else {
        path.to_path_buf()
    };
    path.canonicalize()
        .with_context(|| format!("Failed to resolve path: {}", path.display()))
}

fn delete_options(config: &Config, cli: &Cli, strict: bool, verify: bool) -> DeleteOptions {
    let mut options = config.delete.clone().with_progress(!cli.quiet);
    if strict {
        options.missing_ok = false;
    }
    if verify {
        options.verify = true;
    }
    options
}

fn walk_options(cli: &Cli, no_recursive: bool) -> WalkOptions {
    WalkOptions {
        recursive: !no_recursive,
        show_progress: !cli.quiet,
        ..WalkOptions::default()
    }
}

fn run(cli: &Cli, config: &Config) -> Result<()> {
    match &cli.command {
        Command::Dedup {
            path,
            recursive,
            delete,
            strict,
            verify,
            report,
        } => {
            let dir = resolve_dir(config, cli, path)?;
            let mut scan = config.scan.clone().with_progress(!cli.quiet);
            if *recursive {
                scan.recursive = true;
            }
            info!("Target directory: '{}'", dir.display());
            let pairs = find_duplicates(&dir, &scan)?;
            print_results(&pairs, &dir);

            if let Some(report) = report {
                write_report(&pairs, report, &dir, scan.recursive)?;
            }
            if *delete && !pairs.is_empty() {
                let options = delete_options(config, cli, *strict, *verify);
                let summary = delete_duplicates(&pairs, &options)?;
                println!(
                    "{}",
                    format!("Deleted {} duplicate files", summary.deleted).green()
                );
            }
        }
        Command::DeleteReport {
            report,
            strict,
            verify,
        } => {
            let report = read_report(report)?;
            info!(
                "Report from {} lists {} pairs under '{}'",
                report.generated_at,
                report.pairs.len(),
                report.directory.display()
            );
            let summary =
                delete_duplicates(&report.pairs, &delete_options(config, cli, *strict, *verify))?;
            println!(
                "{}",
                format!(
                    "Deleted {} duplicate files ({} already gone)",
                    summary.deleted, summary.missing
                )
                .green()
            );
        }
        Command::Convert {
            path,
            to,
            dest,
            no_recursive,
        } => {
            let dir = resolve_dir(config, cli, path)?;
            let format = parse_format(to)?;
            let summary =
                convert_images(&dir, dest.as_deref(), format, &walk_options(cli, *no_recursive))?;
            println!("Converted {} images", summary.processed);
        }
        Command::Compress {
            path,
            max_size,
            no_recursive,
        } => {
            let dir = resolve_dir(config, cli, path)?;
            let summary = compress_images(&dir, *max_size, &walk_options(cli, *no_recursive))?;
            println!("Compressed {} images", summary.processed);
        }
        Command::Arrange {
            source,
            dest,
            sep,
            class_index,
            move_files,
        } => {
            let dir = resolve_dir(config, cli, source)?;
            let mut options = config.arrange.clone();
            options.show_progress = !cli.quiet;
            if let Some(sep) = sep {
                options.separator = sep.clone();
            }
            if let Some(class_index) = class_index {
                options.class_index = *class_index;
            }
            if *move_files {
                options.mode = sci_toolkit::TransferMode::Move;
            }
            let placed = arrange_for_classification(&dir, dest.as_deref(), &options)?;
            println!("Arranged {} files", placed);
        }
        Command::Rename { path, name } => {
            let dir = resolve_dir(config, cli, path)?;
            let summary = rename_files(&dir, name, !cli.quiet)?;
            println!(
                "Renamed {} files ({} skipped)",
                summary.renamed, summary.skipped
            );
        }
        Command::Paths => {
            let paths = &config.paths;
            println!("project   {}", paths.project_dir.display());
            println!("reports   {}", paths.reports_dir().display());
            println!("models    {}", paths.models_dir().display());
            println!("raw       {}", paths.raw_dataset_dir().display());
            println!("processed {}", paths.processed_dataset_dir().display());
            println!("external  {}", paths.external_dataset_dir().display());
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    info!("Starting sci-toolkit v{}", env!("CARGO_PKG_VERSION"));
    debug!("Command line arguments: {:?}", cli);

    let config = Config::discover(cli.config.as_deref())?;
    run(&cli, &config)?;

    info!(
        "Completed in {}",
        format_human_elapsed(start_time.elapsed())
    );
    Ok(())
}
