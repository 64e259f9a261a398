//! Find visually similar photos and hand them to a human for review.
//!
//! The detection pipeline fingerprints images with a 64-bit perceptual hash,
//! buckets fingerprints by their leading bits to bound comparisons, and
//! greedily groups fingerprints within a Hamming-distance threshold. The
//! pipeline only classifies; deleting, moving, and copying happen in the
//! [`review`] tools that consume the resulting groups.

pub mod core;
pub mod review;

pub use crate::core::{
    BlurDetector, BucketIndex, DetectError, DetectorConfig, DuplicateDetector, DuplicateGroup,
    Fingerprint, FingerprintEngine, FingerprintTable, ScanOptions,
};
pub use crate::review::{ReviewDecision, ReviewSession};
