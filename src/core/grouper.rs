use crate::core::bucket::BucketIndex;
use crate::core::fingerprint::Fingerprint;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// A set of images judged mutually similar, seed first, then matches in the
/// order they were scanned. Always has at least two members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub id: String,
    pub images: Vec<PathBuf>,
}

impl DuplicateGroup {
    fn new(images: Vec<PathBuf>) -> Self {
        Self {
            id: format!("grp_{}", Uuid::new_v4().simple()),
            images,
        }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Greedy single-pass clustering of one bucket's entries.
///
/// Entries are processed in order. Each not-yet-consumed entry seeds a
/// candidate group and scans every subsequent unconsumed entry; an entry
/// joins when its Hamming distance *to the seed* is within `threshold`.
/// Membership is never tested against other members, so the clustering is
/// deliberately non-transitive and first-seed-wins. Candidates that attract
/// no match are discarded, never emitted as singletons.
pub fn group_bucket(
    entries: &[(PathBuf, Fingerprint)],
    threshold: u32,
) -> Vec<Vec<PathBuf>> {
    let mut groups = Vec::new();
    let mut used = vec![false; entries.len()];

    for i in 0..entries.len() {
        if used[i] {
            continue;
        }
        used[i] = true;
        let (seed_path, seed_fp) = &entries[i];
        let mut members = vec![seed_path.clone()];

        for j in (i + 1)..entries.len() {
            if used[j] {
                continue;
            }
            let (path, fp) = &entries[j];
            if seed_fp.distance(*fp) <= threshold {
                used[j] = true;
                members.push(path.clone());
            }
        }

        if members.len() > 1 {
            groups.push(members);
        }
    }

    groups
}

/// Cluster every bucket and concatenate the results in bucket-key order.
///
/// Buckets are disjoint and groups never cross a bucket, so the concatenated
/// groups are disjoint by construction.
pub fn group_all(index: &BucketIndex, threshold: u32) -> Vec<DuplicateGroup> {
    index
        .buckets()
        .flat_map(|(_, entries)| group_bucket(entries, threshold))
        .map(DuplicateGroup::new)
        .collect()
}
