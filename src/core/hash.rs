use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// BLAKE3 hash of a file's bytes, hex-encoded.
///
/// Perceptual fingerprints tell the reviewer two images *look* alike; the
/// content hash tells them the files are byte-identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Hash a file's full contents.
pub fn content_hash(path: &Path) -> std::io::Result<ContentHash> {
    let file = File::open(path)?;
    let mut hasher = blake3::Hasher::new();

    // Zero-length files cannot be mapped.
    if file.metadata()?.len() == 0 {
        return Ok(ContentHash(hasher.finalize().to_hex().to_string()));
    }

    let mmap = unsafe { Mmap::map(&file)? };
    hasher.update(&mmap);
    Ok(ContentHash(hasher.finalize().to_hex().to_string()))
}

/// Partition `paths` into sets of byte-identical files.
///
/// Only sets with two or more members are returned; unreadable files are
/// logged and skipped. Set order follows the first appearance of each hash.
pub fn exact_duplicates(paths: &[PathBuf]) -> Vec<Vec<PathBuf>> {
    let mut by_hash: HashMap<ContentHash, usize> = HashMap::new();
    let mut sets: Vec<Vec<PathBuf>> = Vec::new();

    for path in paths {
        let hash = match content_hash(path) {
            Ok(hash) => hash,
            Err(e) => {
                log::warn!("cannot hash {}: {}", path.display(), e);
                continue;
            }
        };
        match by_hash.get(&hash) {
            Some(&idx) => sets[idx].push(path.clone()),
            None => {
                by_hash.insert(hash, sets.len());
                sets.push(vec![path.clone()]);
            }
        }
    }

    sets.retain(|set| set.len() > 1);
    sets
}
