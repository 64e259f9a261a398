use crate::core::scanner::{self, ScanError};
use image::GrayImage;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlurError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Flags blurry images by the variance of their Laplacian response.
///
/// A sharp image has well-defined edges, so the Laplacian response spreads
/// widely; a blurry one concentrates near zero. Images whose response
/// variance falls below the threshold are classified blurry. Independent of
/// the duplicate pipeline; shares only the directory scanner.
#[derive(Debug, Clone)]
pub struct BlurDetector {
    threshold: f64,
}

impl BlurDetector {
    pub const DEFAULT_THRESHOLD: f64 = 100.0;

    /// Higher thresholds are stricter and flag more images.
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Classify one image. Unreadable files are reported as not blurry so a
    /// bad file never blocks a sweep.
    pub fn is_blurry(&self, path: &Path) -> bool {
        let img = match image::open(path) {
            Ok(img) => img,
            Err(e) => {
                log::warn!("cannot read {}, skipping blur check: {}", path.display(), e);
                return false;
            }
        };
        laplacian_variance(&img.to_luma8()) < self.threshold
    }

    /// Scan `src_dir`, move every flagged image into `review_dir`, and return
    /// the moved paths. Files already under `review_dir` are left alone.
    pub fn collect_blurry(
        &self,
        src_dir: &Path,
        review_dir: &Path,
    ) -> Result<Vec<PathBuf>, BlurError> {
        fs::create_dir_all(review_dir)?;

        let mut moved = Vec::new();
        for path in scanner::find_image_files(src_dir)? {
            if path.starts_with(review_dir) {
                continue;
            }
            if !self.is_blurry(&path) {
                continue;
            }

            let file_name = match path.file_name() {
                Some(name) => name.to_owned(),
                None => continue,
            };
            let dest = review_dir.join(file_name);
            fs::rename(&path, &dest)?;
            log::info!("flagged blurry: {} -> {}", path.display(), dest.display());
            moved.push(dest);
        }
        Ok(moved)
    }
}

impl Default for BlurDetector {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD)
    }
}

/// Variance of the 4-connected Laplacian over the interior pixels.
pub fn laplacian_variance(image: &GrayImage) -> f64 {
    let (width, height) = image.dimensions();
    if width < 3 || height < 3 {
        return 0.0;
    }

    let px = |x: u32, y: u32| f64::from(image.get_pixel(x, y)[0]);

    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    let mut count = 0u64;
    for y in 1..(height - 1) {
        for x in 1..(width - 1) {
            let response =
                4.0 * px(x, y) - px(x - 1, y) - px(x + 1, y) - px(x, y - 1) - px(x, y + 1);
            sum += response;
            sum_sq += response * response;
            count += 1;
        }
    }

    let n = count as f64;
    let mean = sum / n;
    sum_sq / n - mean * mean
}
