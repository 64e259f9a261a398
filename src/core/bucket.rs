use crate::core::fingerprint::{Fingerprint, FingerprintTable};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Fingerprints partitioned by the top `prefix_bits` bits of their value.
///
/// Bucketing bounds the grouper's per-image comparison count at the cost of
/// recall: two images within the distance threshold whose leading bits differ
/// land in different buckets and are never compared. That miss is part of the
/// contract, tuned via `prefix_bits`.
#[derive(Debug, Clone)]
pub struct BucketIndex {
    prefix_bits: u32,
    buckets: BTreeMap<u64, Vec<(PathBuf, Fingerprint)>>,
}

impl BucketIndex {
    /// Partition `table` exhaustively and disjointly.
    ///
    /// Entries keep their table order within each bucket, and buckets iterate
    /// in ascending key order, so the partition is deterministic for a given
    /// table and `prefix_bits`. Expects `prefix_bits` in `1..=64`, validated
    /// at the detector boundary.
    pub fn build(table: &FingerprintTable, prefix_bits: u32) -> Self {
        let mut buckets: BTreeMap<u64, Vec<(PathBuf, Fingerprint)>> = BTreeMap::new();
        for (path, fingerprint) in table.iter() {
            buckets
                .entry(fingerprint.bucket_key(prefix_bits))
                .or_default()
                .push((path.clone(), *fingerprint));
        }
        Self {
            prefix_bits,
            buckets,
        }
    }

    pub fn prefix_bits(&self) -> u32 {
        self.prefix_bits
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Total entries across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Buckets in ascending key order.
    pub fn buckets(&self) -> impl Iterator<Item = (u64, &[(PathBuf, Fingerprint)])> {
        self.buckets.iter().map(|(key, entries)| (*key, entries.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::Path;

    fn table_of(fingerprints: &[u64]) -> FingerprintTable {
        fingerprints
            .iter()
            .enumerate()
            .map(|(i, &bits)| {
                (
                    Path::new(&format!("img_{i}.jpg")).to_path_buf(),
                    Fingerprint(bits),
                )
            })
            .collect()
    }

    #[test]
    fn test_partition_is_exhaustive_and_disjoint() {
        let table = table_of(&[
            0x0000_0000_0000_0001,
            0x0000_0000_0000_0002,
            0x8000_0000_0000_0000,
            0xFFFF_0000_0000_0000,
            0x7FFF_FFFF_FFFF_FFFF,
        ]);
        let index = BucketIndex::build(&table, 12);

        assert_eq!(index.len(), table.len());

        let mut seen = HashSet::new();
        for (_, entries) in index.buckets() {
            for (path, _) in entries {
                assert!(seen.insert(path.clone()), "{} in two buckets", path.display());
            }
        }
        assert_eq!(seen.len(), table.len());
    }

    #[test]
    fn test_bucket_key_is_pure_function_of_top_bits() {
        // Same top 12 bits, different low bits: one bucket.
        let table = table_of(&[0xABC0_0000_0000_0000, 0xABC0_0000_0000_FFFF]);
        let index = BucketIndex::build(&table, 12);
        assert_eq!(index.bucket_count(), 1);
        let (key, entries) = index.buckets().next().unwrap();
        assert_eq!(key, 0xABC);
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_close_fingerprints_split_by_leading_bit() {
        // Hamming distance 1, but the differing bit is the top bit: with any
        // prefix the pair lands in different buckets. Accepted false negative.
        let table = table_of(&[0x0000_0000_0000_0000, 0x8000_0000_0000_0000]);
        assert_eq!(Fingerprint(0).distance(Fingerprint(0x8000_0000_0000_0000)), 1);

        let index = BucketIndex::build(&table, 1);
        assert_eq!(index.bucket_count(), 2);
    }

    #[test]
    fn test_full_width_prefix_buckets_by_exact_value() {
        let table = table_of(&[42, 42, 43]);
        let index = BucketIndex::build(&table, 64);
        assert_eq!(index.bucket_count(), 2);
    }

    #[test]
    fn test_deterministic_across_rebuilds() {
        let table = table_of(&[7, 9, 0xDEAD_BEEF_0000_0000, 0xDEAD_BEEF_FFFF_FFFF]);
        let a: Vec<_> = BucketIndex::build(&table, 16)
            .buckets()
            .map(|(k, e)| (k, e.to_vec()))
            .collect();
        let b: Vec<_> = BucketIndex::build(&table, 16)
            .buckets()
            .map(|(k, e)| (k, e.to_vec()))
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_table_yields_empty_index() {
        let index = BucketIndex::build(&FingerprintTable::new(), 12);
        assert!(index.is_empty());
        assert_eq!(index.bucket_count(), 0);
    }
}
