//! Format conversion and downscaling of image directories.
//!
//! HEIC/HEIF files are never decoded here; they are reported and left alone.

use std::collections::HashMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use indicatif::HumanCount;
use log::{debug, info, warn};

use crate::config::WalkOptions;
use crate::error::{IoResultExt, Result, ToolkitError};
use crate::scanner::{collect_files, ensure_directory};
use crate::utils::{extension_lowercase, progress_bar};

const JPEG_QUALITY: u8 = 90;
const UNDECODABLE_EXTENSIONS: &[&str] = &["heic", "heif"];

/// Outcome of a conversion or compression pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertSummary {
    /// Images written
    pub processed: usize,
    /// Images left as they were
    pub skipped: usize,
}

/// Looks up an output format by extension or name, e.g. `png`, `jpg`, `webp`.
pub fn parse_format(name: &str) -> Result<ImageFormat> {
    let name = name.trim_start_matches('.');
    ImageFormat::from_extension(name)
        .ok_or_else(|| ToolkitError::invalid_input(name, "unknown image format"))
}

fn primary_extension(format: ImageFormat) -> &'static str {
    format.extensions_str().first().copied().unwrap_or("img")
}

fn is_undecodable(path: &Path) -> bool {
    extension_lowercase(path)
        .map(|ext| UNDECODABLE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

fn open_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|source| ToolkitError::Image {
        path: path.to_path_buf(),
        source,
    })
}

fn save_image(img: &DynamicImage, path: &Path, format: ImageFormat) -> Result<()> {
    if format == ImageFormat::Jpeg {
        let file = fs::File::create(path).at_path(path)?;
        let mut writer = BufWriter::new(file);
        let encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
        img.to_rgb8()
            .write_with_encoder(encoder)
            .map_err(|source| ToolkitError::Image {
                path: path.to_path_buf(),
                source,
            })?;
        writer.flush().at_path(path)?;
        return Ok(());
    }
    img.save_with_format(path, format)
        .map_err(|source| ToolkitError::Image {
            path: path.to_path_buf(),
            source,
        })
}

fn remove_source(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(ToolkitError::io(path, e)),
        _ => Ok(()),
    }
}

/// Rewrites every image under `source` in `format`, removing the originals.
///
/// Converted files are named `<stem>.<ext>` and written to `destination` when
/// given, otherwise next to the source file. Files already in `format` and
/// files that are not images are skipped. Targets are planned before anything
/// is written: if two images would land on the same file, or a target already
/// exists, the run fails with nothing converted.
pub fn convert_images(
    source: &Path,
    destination: Option<&Path>,
    format: ImageFormat,
    options: &WalkOptions,
) -> Result<ConvertSummary> {
    ensure_directory(source)?;
    let files = collect_files(source, options)?;
    let ext = primary_extension(format);
    info!(
        "Converting images in '{}' to {}",
        source.display(),
        ext
    );

    let mut summary = ConvertSummary::default();
    let mut plan: Vec<(PathBuf, PathBuf)> = Vec::new();
    // target -> the image that will be written there
    let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();
    for path in files {
        if is_undecodable(&path) {
            warn!("Skipping '{}': HEIC/HEIF is not supported", path.display());
            summary.skipped += 1;
            continue;
        }
        let current = match ImageFormat::from_path(&path) {
            Ok(current) => current,
            Err(_) => {
                debug!("Not an image: '{}'", path.display());
                summary.skipped += 1;
                continue;
            }
        };
        if current == format {
            summary.skipped += 1;
            continue;
        }

        let target = target_path(&path, destination, ext);
        if let Some(other) = claimed.get(&target) {
            return Err(ToolkitError::invalid_input(
                &path,
                format!(
                    "'{}' would also be converted to '{}'",
                    other.display(),
                    target.display()
                ),
            ));
        }
        if fs::symlink_metadata(&target).is_ok() {
            return Err(ToolkitError::invalid_input(
                &path,
                format!("'{}' already exists", target.display()),
            ));
        }
        claimed.insert(target.clone(), path.clone());
        plan.push((path, target));
    }

    if let Some(dest) = destination {
        fs::create_dir_all(dest).at_path(dest)?;
    }
    let pb = progress_bar(
        plan.len() as u64,
        "Converting images...",
        options.show_progress,
    );
    for (path, target) in &plan {
        let img = open_image(path)?;
        save_image(&img, target, format)?;
        remove_source(path)?;
        debug!("Converted '{}' -> '{}'", path.display(), target.display());
        summary.processed += 1;
        pb.inc(1);
    }
    pb.finish_and_clear();

    info!(
        "Converted {} images, skipped {}",
        HumanCount(summary.processed as u64),
        HumanCount(summary.skipped as u64)
    );
    Ok(summary)
}

fn target_path(path: &Path, destination: Option<&Path>, ext: &str) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default();
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(ext);
    match destination {
        Some(dest) => dest.join(name),
        None => path.with_file_name(name),
    }
}

/// Shrinks every image under `directory` whose longest side exceeds
/// `max_size`, keeping the aspect ratio. Images are rewritten in place; smaller
/// images are never upscaled.
pub fn compress_images(
    directory: &Path,
    max_size: u32,
    options: &WalkOptions,
) -> Result<ConvertSummary> {
    if max_size == 0 {
        return Err(ToolkitError::invalid_input(directory, "max size must be positive"));
    }
    let files = collect_files(directory, options)?;
    info!(
        "Compressing images in '{}' to at most {}px",
        directory.display(),
        max_size
    );

    let pb = progress_bar(
        files.len() as u64,
        "Compressing images...",
        options.show_progress,
    );
    let mut summary = ConvertSummary::default();
    for path in &files {
        pb.inc(1);
        if is_undecodable(path) {
            warn!("Skipping '{}': HEIC/HEIF is not supported", path.display());
            summary.skipped += 1;
            continue;
        }
        let Ok(format) = ImageFormat::from_path(path) else {
            summary.skipped += 1;
            continue;
        };

        let img = open_image(path)?;
        let (width, height) = img.dimensions();
        if width.max(height) <= max_size {
            summary.skipped += 1;
            continue;
        }
        let resized = img.resize(max_size, max_size, FilterType::Lanczos3);
        save_image(&resized, path, format)?;
        debug!(
            "Resized '{}' from {}x{} to {}x{}",
            path.display(),
            width,
            height,
            resized.width(),
            resized.height()
        );
        summary.processed += 1;
    }
    pb.finish_and_clear();

    info!(
        "Compressed {} images, left {} unchanged",
        HumanCount(summary.processed as u64),
        HumanCount(summary.skipped as u64)
    );
    Ok(summary)
}
