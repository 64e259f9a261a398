use glob::Pattern;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid path: {path}")]
    InvalidPath { path: String },

    #[error("invalid exclude pattern {pattern}: {source}")]
    InvalidPattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Controls which files a scan picks up.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Lowercase extensions, without the leading dot.
    pub extensions: HashSet<String>,
    /// Glob patterns matched against the full path; matches are skipped.
    pub exclude_patterns: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        let extensions = ["png", "jpg", "jpeg", "bmp", "gif", "webp", "tiff", "tif"]
            .into_iter()
            .map(String::from)
            .collect();
        Self {
            extensions,
            exclude_patterns: Vec::new(),
        }
    }
}

/// Recursively collect image files under `dir` with the default options.
pub fn find_image_files(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    find_image_files_with(dir, &ScanOptions::default())
}

/// Recursively collect image files under `dir`.
///
/// Returns paths sorted lexicographically so downstream grouping is
/// deterministic for a given tree. Unreadable directory entries are skipped.
pub fn find_image_files_with(dir: &Path, options: &ScanOptions) -> Result<Vec<PathBuf>, ScanError> {
    if !dir.is_dir() {
        return Err(ScanError::InvalidPath {
            path: dir.to_string_lossy().to_string(),
        });
    }

    let exclude_patterns = options
        .exclude_patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|source| ScanError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut images = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let path_str = path.to_string_lossy();
        if exclude_patterns.iter().any(|p| p.matches(&path_str)) {
            continue;
        }

        if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
            if options.extensions.contains(&ext.to_lowercase()) {
                images.push(path.to_path_buf());
            }
        }
    }

    images.sort();
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_filters_by_extension() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.jpg"), b"x").unwrap();
        fs::write(temp_dir.path().join("b.PNG"), b"x").unwrap();
        fs::write(temp_dir.path().join("c.txt"), b"x").unwrap();
        fs::write(temp_dir.path().join("noext"), b"x").unwrap();

        let found = find_image_files(temp_dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.PNG"]);
    }

    #[test]
    fn test_recurses_into_subdirectories() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("x").join("y");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("deep.png"), b"x").unwrap();
        fs::write(temp_dir.path().join("top.jpg"), b"x").unwrap();

        let found = find_image_files(temp_dir.path()).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_exclude_patterns_skip_matches() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("keep.jpg"), b"x").unwrap();
        fs::write(temp_dir.path().join("skip.tmp.jpg"), b"x").unwrap();

        let options = ScanOptions {
            exclude_patterns: vec!["*.tmp.*".to_string()],
            ..ScanOptions::default()
        };
        let found = find_image_files_with(temp_dir.path(), &options).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("keep.jpg"));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let options = ScanOptions {
            exclude_patterns: vec!["[".to_string()],
            ..ScanOptions::default()
        };
        let result = find_image_files_with(temp_dir.path(), &options);
        assert!(matches!(result, Err(ScanError::InvalidPattern { .. })));
    }

    #[test]
    fn test_missing_directory_is_rejected() {
        let result = find_image_files(Path::new("/definitely/not/a/real/dir"));
        assert!(matches!(result, Err(ScanError::InvalidPath { .. })));
    }

    #[test]
    fn test_empty_directory_yields_empty_list() {
        let temp_dir = TempDir::new().unwrap();
        assert!(find_image_files(temp_dir.path()).unwrap().is_empty());
    }
}
