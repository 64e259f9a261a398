use crate::core::grouper::DuplicateGroup;
use crate::core::hash;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BulkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode manifest: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Manifest written next to the copied groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewManifest {
    pub groups: Vec<ManifestGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestGroup {
    pub number: usize,
    pub dir: PathBuf,
    pub images: Vec<ManifestImage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestImage {
    pub source: PathBuf,
    /// BLAKE3 of the source bytes; byte-identical copies share a value.
    /// Absent when the source could not be read back for hashing.
    pub content_hash: Option<String>,
}

pub const MANIFEST_FILE: &str = "manifest.json";

/// Copy each group into its own numbered subfolder of `out_dir`.
///
/// Folders are named `group_1`, `group_2`, … in group order. Originals are
/// left untouched; only bytes are copied. A `manifest.json` describing the
/// copied groups, including content hashes for spotting byte-identical
/// copies, is written into `out_dir`.
pub fn copy_groups(groups: &[DuplicateGroup], out_dir: &Path) -> Result<ReviewManifest, BulkError> {
    fs::create_dir_all(out_dir)?;

    let mut manifest = ReviewManifest { groups: Vec::new() };
    for (idx, group) in groups.iter().enumerate() {
        let number = idx + 1;
        let group_dir = out_dir.join(format!("group_{number}"));
        fs::create_dir_all(&group_dir)?;

        let mut images = Vec::new();
        for path in &group.images {
            let file_name = match path.file_name() {
                Some(name) => name,
                None => continue,
            };
            fs::copy(path, group_dir.join(file_name))?;

            let content_hash = match hash::content_hash(path) {
                Ok(hash) => Some(hash.0),
                Err(e) => {
                    log::warn!("cannot hash {}: {}", path.display(), e);
                    None
                }
            };
            images.push(ManifestImage {
                source: path.clone(),
                content_hash,
            });
        }

        log::info!(
            "group {}: {} images copied to {}",
            number,
            images.len(),
            group_dir.display()
        );
        manifest.groups.push(ManifestGroup {
            number,
            dir: group_dir,
            images,
        });
    }

    let manifest_path = out_dir.join(MANIFEST_FILE);
    fs::write(&manifest_path, serde_json::to_vec_pretty(&manifest)?)?;
    Ok(manifest)
}
