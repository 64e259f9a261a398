use crate::core::bucket::BucketIndex;
use crate::core::fingerprint::{Fingerprint, FingerprintEngine};
use crate::core::grouper::{self, DuplicateGroup};
use crate::core::scanner::{self, ScanError};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("prefix_bits must be between 1 and 64, got {got}")]
    InvalidPrefixBits { got: u32 },

    #[error("failed to build fingerprint worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Tuning for a detection run.
///
/// `threshold` is the maximum Hamming distance at which two fingerprints are
/// considered similar; being unsigned, the "negative threshold" failure mode
/// cannot be expressed. `prefix_bits` trades recall for throughput: more bits
/// mean smaller buckets and more accepted misses across bucket boundaries.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub prefix_bits: u32,
    pub threshold: u32,
    pub workers: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            prefix_bits: 12,
            threshold: 5,
            workers: num_cpus::get(),
        }
    }
}

impl DetectorConfig {
    fn validate(&self) -> Result<(), DetectError> {
        if self.prefix_bits == 0 || self.prefix_bits > Fingerprint::BITS {
            return Err(DetectError::InvalidPrefixBits {
                got: self.prefix_bits,
            });
        }
        Ok(())
    }
}

/// The duplicate-detection pipeline: fingerprint, bucket, group.
///
/// Only classifies; never deletes, moves, or copies files. Destructive work
/// belongs to the review tools that consume the returned groups.
pub struct DuplicateDetector {
    config: DetectorConfig,
    engine: FingerprintEngine,
}

impl DuplicateDetector {
    /// Validates the configuration and builds the worker pool. Rejects bad
    /// parameters before any image is touched.
    pub fn new(config: DetectorConfig) -> Result<Self, DetectError> {
        config.validate()?;
        let engine = FingerprintEngine::with_workers(config.workers)?;
        Ok(Self { config, engine })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Run the pipeline over an explicit image list.
    ///
    /// Unreadable images are excluded upstream and cannot appear in any
    /// group. Every returned group has at least two members, groups are
    /// mutually disjoint, and an empty input yields an empty list.
    pub fn find_duplicates(&self, images: &[PathBuf]) -> Vec<DuplicateGroup> {
        let table = self.engine.fingerprint_all(images);
        log::info!(
            "fingerprinted {} of {} images",
            table.len(),
            images.len()
        );

        let index = BucketIndex::build(&table, self.config.prefix_bits);
        let groups = grouper::group_all(&index, self.config.threshold);
        log::info!(
            "{} similar group(s) across {} bucket(s)",
            groups.len(),
            index.bucket_count()
        );
        groups
    }

    /// Scan `dir` for images, then run the pipeline over what was found.
    pub fn find_duplicates_in_dir(&self, dir: &Path) -> Result<Vec<DuplicateGroup>, DetectError> {
        let images = scanner::find_image_files(dir)?;
        Ok(self.find_duplicates(&images))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn create_test_image(path: &Path, width: u32, height: u32) {
        use image::{ImageBuffer, Rgb};

        let img = ImageBuffer::from_fn(width, height, |x, y| {
            let intensity = ((x * 7 + y * 13) % 256) as u8;
            Rgb([intensity, 255 - intensity, intensity])
        });
        img.save(path).unwrap();
    }

    #[test]
    fn test_rejects_zero_prefix_bits() {
        let result = DuplicateDetector::new(DetectorConfig {
            prefix_bits: 0,
            ..DetectorConfig::default()
        });
        assert!(matches!(
            result,
            Err(DetectError::InvalidPrefixBits { got: 0 })
        ));
    }

    #[test]
    fn test_rejects_oversized_prefix_bits() {
        let result = DuplicateDetector::new(DetectorConfig {
            prefix_bits: 65,
            ..DetectorConfig::default()
        });
        assert!(matches!(
            result,
            Err(DetectError::InvalidPrefixBits { got: 65 })
        ));
    }

    #[test]
    fn test_empty_input_yields_empty_group_list() {
        let detector = DuplicateDetector::new(DetectorConfig::default()).unwrap();
        assert!(detector.find_duplicates(&[]).is_empty());
    }

    #[test]
    fn test_identical_images_group_at_threshold_zero() {
        let temp_dir = TempDir::new().unwrap();
        let original = temp_dir.path().join("original.png");
        let copy = temp_dir.path().join("copy.png");
        create_test_image(&original, 64, 64);
        fs::copy(&original, &copy).unwrap();

        let detector = DuplicateDetector::new(DetectorConfig {
            threshold: 0,
            ..DetectorConfig::default()
        })
        .unwrap();
        let groups = detector.find_duplicates(&[original.clone(), copy.clone()]);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].images, vec![original, copy]);
    }

    #[test]
    fn test_unreadable_file_never_reaches_a_group() {
        let temp_dir = TempDir::new().unwrap();
        let original = temp_dir.path().join("original.png");
        let copy = temp_dir.path().join("copy.png");
        let corrupt = temp_dir.path().join("corrupt.png");
        create_test_image(&original, 64, 64);
        fs::copy(&original, &copy).unwrap();
        fs::write(&corrupt, b"garbage bytes").unwrap();

        let detector = DuplicateDetector::new(DetectorConfig {
            threshold: 0,
            ..DetectorConfig::default()
        })
        .unwrap();
        let groups = detector.find_duplicates(&[corrupt.clone(), original, copy]);

        assert_eq!(groups.len(), 1);
        assert!(groups[0].images.iter().all(|p| *p != corrupt));
    }

    #[test]
    fn test_find_duplicates_in_dir_scans_then_groups() {
        let temp_dir = TempDir::new().unwrap();
        let original = temp_dir.path().join("original.png");
        create_test_image(&original, 64, 64);
        fs::copy(&original, temp_dir.path().join("copy.png")).unwrap();
        fs::write(temp_dir.path().join("notes.txt"), b"ignored").unwrap();

        let detector = DuplicateDetector::new(DetectorConfig {
            threshold: 0,
            ..DetectorConfig::default()
        })
        .unwrap();
        let groups = detector.find_duplicates_in_dir(temp_dir.path()).unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
    }

    #[test]
    fn test_find_duplicates_in_dir_propagates_enumeration_failure() {
        let detector = DuplicateDetector::new(DetectorConfig::default()).unwrap();
        let result = detector.find_duplicates_in_dir(Path::new("/no/such/collection"));
        assert!(matches!(result, Err(DetectError::Scan(_))));
    }

    #[test]
    fn test_groups_are_disjoint_end_to_end() {
        let temp_dir = TempDir::new().unwrap();
        let mut images = Vec::new();
        // Two identical pairs plus one unrelated image.
        for (name, seed) in [("a1.png", 1u32), ("b1.png", 2), ("lone.png", 3)] {
            let path = temp_dir.path().join(name);
            let img = image::ImageBuffer::from_fn(64, 64, |x, y| {
                let v = ((x * seed * 31 + y * seed * 17) % 256) as u8;
                image::Rgb([v, v.wrapping_mul(3), v.wrapping_add(seed as u8)])
            });
            img.save(&path).unwrap();
            images.push(path);
        }
        let a2 = temp_dir.path().join("a2.png");
        let b2 = temp_dir.path().join("b2.png");
        fs::copy(temp_dir.path().join("a1.png"), &a2).unwrap();
        fs::copy(temp_dir.path().join("b1.png"), &b2).unwrap();
        images.push(a2);
        images.push(b2);

        let detector = DuplicateDetector::new(DetectorConfig {
            threshold: 0,
            ..DetectorConfig::default()
        })
        .unwrap();
        let groups = detector.find_duplicates(&images);

        let mut seen = HashSet::new();
        for group in &groups {
            assert!(group.len() >= 2);
            for path in &group.images {
                assert!(seen.insert(path.clone()));
            }
        }
    }
}
