//! Media manifest generation
//!
//! Lists the files of a folder as `{id, name, size, type}` entries so a
//! static front-end can browse hosted media without a database.

use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::AppError;

const ID_LENGTH: usize = 16;
const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];
const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "webm", "mov", "mkv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    File,
}

impl MediaKind {
    /// Classify by extension, ignoring case.
    pub fn from_name(name: &str) -> Self {
        let extension = Path::new(name)
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => Self::Image,
            Some(ext) if VIDEO_EXTENSIONS.contains(&ext) => Self::Video,
            _ => Self::File,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: String,
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub kind: MediaKind,
}

/// Stable id: URL-safe base64 SHA-256 of the relative path, cut to 16 chars.
pub fn entry_id(relative_path: &str) -> String {
    let digest = Sha256::digest(relative_path.as_bytes());
    let mut id = general_purpose::URL_SAFE_NO_PAD.encode(digest);
    id.truncate(ID_LENGTH);
    id
}

fn relative_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn collect(
    root: &Path,
    dir: &Path,
    recursive: bool,
    entries: &mut Vec<ManifestEntry>,
) -> Result<(), AppError> {
    let read_dir = std::fs::read_dir(dir).map_err(|e| {
        AppError::Validation(format!("cannot read folder {}: {}", dir.display(), e))
    })?;

    for dir_entry in read_dir {
        let dir_entry = dir_entry.map_err(|e| AppError::Internal(e.into()))?;
        let path: PathBuf = dir_entry.path();
        let metadata = dir_entry
            .metadata()
            .map_err(|e| AppError::Internal(e.into()))?;

        if metadata.is_dir() {
            if recursive {
                collect(root, &path, recursive, entries)?;
            }
            continue;
        }

        let name = relative_name(root, &path);
        entries.push(ManifestEntry {
            id: entry_id(&name),
            kind: MediaKind::from_name(&name),
            size: metadata.len(),
            name,
        });
    }

    Ok(())
}

/// List the files of `folder`, sorted by name.
pub fn build_manifest(folder: &Path, recursive: bool) -> Result<Vec<ManifestEntry>, AppError> {
    let mut entries = Vec::new();
    collect(folder, folder, recursive, &mut entries)?;
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Build the manifest and write it pretty-printed to `output`.
pub fn write_manifest(
    folder: &Path,
    output: &Path,
    recursive: bool,
) -> Result<Vec<ManifestEntry>, AppError> {
    let entries = build_manifest(folder, recursive)?;

    if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| AppError::Internal(e.into()))?;
    }
    let json = serde_json::to_string_pretty(&entries)?;
    std::fs::write(output, json).map_err(|e| AppError::Internal(e.into()))?;

    tracing::info!(
        folder = %folder.display(),
        output = %output.display(),
        entries = entries.len(),
        "Manifest written"
    );
    Ok(entries)
}
