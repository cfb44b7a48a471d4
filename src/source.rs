//! Batch source enumeration.
//!
//! Enumerates still images from a directory (sorted for a stable run
//! order) or a single file, and parses the frame tag from each file stem.
//! Decoding is delegated to the `image` crate; files whose names carry
//! neither `Full` nor `Half` are skipped with a warning and never counted
//! as processed frames.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use crate::decision::FrameTag;

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// One enumerated input frame.
#[derive(Clone, Debug)]
pub struct SourceImage {
    pub path: PathBuf,
    pub stem: String,
    pub tag: FrameTag,
}

/// Enumerate processable frames under `source`.
///
/// Directories are scanned non-recursively; entries are sorted by file
/// name so repeat runs visit frames in the same order.
pub fn enumerate(source: &Path) -> Result<Vec<SourceImage>> {
    if source.is_file() {
        return match classify(source) {
            Some(image) => Ok(vec![image]),
            None => Err(anyhow!(
                "{} is not a processable frame (unsupported extension or missing Full/Half tag)",
                source.display()
            )),
        };
    }

    if !source.is_dir() {
        return Err(anyhow!("source {} does not exist", source.display()));
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(source)
        .with_context(|| format!("failed to read source directory {}", source.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    let mut images = Vec::new();
    for path in paths {
        if !has_image_extension(&path) {
            continue;
        }
        match classify(&path) {
            Some(image) => images.push(image),
            None => log::warn!(
                "skipping {}: file stem carries neither Full nor Half tag",
                path.display()
            ),
        }
    }
    Ok(images)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.iter().any(|known| *known == ext)
        })
        .unwrap_or(false)
}

fn classify(path: &Path) -> Option<SourceImage> {
    if !has_image_extension(path) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?.to_string();
    let tag = FrameTag::from_stem(&stem)?;
    Some(SourceImage {
        path: path.to_path_buf(),
        stem,
        tag,
    })
}
