use image::ImageReader;
use image_hasher::{HashAlg, Hasher, HasherConfig};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// 64-bit perceptual fingerprint of an image.
///
/// Byte order is big-endian so the hash's leading bits land in the high bits
/// of the integer; bucket keys are taken from the top of the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    pub const BITS: u32 = 64;

    /// Hamming distance to another fingerprint.
    pub fn distance(self, other: Fingerprint) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    /// The top `prefix_bits` bits, interpreted as an unsigned integer.
    ///
    /// `prefix_bits` must be in `1..=64`; callers validate before building
    /// an index.
    pub fn bucket_key(self, prefix_bits: u32) -> u64 {
        debug_assert!(prefix_bits >= 1 && prefix_bits <= Self::BITS);
        self.0 >> (Self::BITS - prefix_bits)
    }

    fn from_hash_bytes(bytes: &[u8]) -> Fingerprint {
        let mut bits = 0u64;
        for &b in bytes {
            bits = (bits << 8) | u64::from(b);
        }
        Fingerprint(bits)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Fingerprints for a set of images, in input order.
///
/// Order matters downstream: grouping is seed-based and processes bucket
/// entries in the order they entered this table.
#[derive(Debug, Default, Clone)]
pub struct FingerprintTable {
    entries: Vec<(PathBuf, Fingerprint)>,
}

impl FingerprintTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: PathBuf, fingerprint: Fingerprint) {
        self.entries.push((path, fingerprint));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(PathBuf, Fingerprint)] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &(PathBuf, Fingerprint)> {
        self.entries.iter()
    }
}

impl FromIterator<(PathBuf, Fingerprint)> for FingerprintTable {
    fn from_iter<I: IntoIterator<Item = (PathBuf, Fingerprint)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Computes perceptual fingerprints, fanning work out over a bounded rayon
/// pool and gathering results after the join barrier.
pub struct FingerprintEngine {
    hasher: Hasher,
    pool: rayon::ThreadPool,
}

impl FingerprintEngine {
    /// Engine with one worker per logical CPU.
    pub fn new() -> Result<Self, rayon::ThreadPoolBuildError> {
        Self::with_workers(num_cpus::get())
    }

    /// Engine with an explicit worker bound.
    pub fn with_workers(workers: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .build()?;
        Ok(Self {
            hasher: Self::build_hasher(),
            pool,
        })
    }

    // 8x8 DCT mean hash, the same family as the classic pHash.
    fn build_hasher() -> Hasher {
        HasherConfig::new()
            .hash_size(8, 8)
            .hash_alg(HashAlg::Mean)
            .preproc_dct()
            .to_hasher()
    }

    /// Fingerprint a single image.
    pub fn fingerprint(&self, path: &Path) -> Result<Fingerprint, FingerprintError> {
        let reader = ImageReader::open(path).map_err(|source| FingerprintError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let img = reader.decode().map_err(|source| FingerprintError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let hash = self.hasher.hash_image(&img);
        Ok(Fingerprint::from_hash_bytes(hash.as_bytes()))
    }

    /// Fingerprint every readable image in `images`, in parallel.
    ///
    /// Unreadable or undecodable files are logged and excluded; they cannot
    /// appear in any duplicate group. Results keep the input order of the
    /// surviving entries.
    pub fn fingerprint_all(&self, images: &[PathBuf]) -> FingerprintTable {
        let results: Vec<Option<(PathBuf, Fingerprint)>> = self.pool.install(|| {
            images
                .par_iter()
                .map(|path| match self.fingerprint(path) {
                    Ok(fingerprint) => Some((path.clone(), fingerprint)),
                    Err(e) => {
                        log::warn!("skipping {}: {}", path.display(), e);
                        None
                    }
                })
                .collect()
        });

        results.into_iter().flatten().collect()
    }
}
