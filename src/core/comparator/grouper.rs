//! Seed-based one-hop grouping of fingerprints.

use super::{FingerprintedFile, SimilarityGroup, DEFAULT_THRESHOLD};
use crate::core::hasher::Fingerprint;
use std::collections::HashMap;
use tracing::debug;

/// Groups fingerprinted files whose fingerprints lie within `threshold`
/// of a group's seed
#[derive(Debug, Clone, Copy)]
pub struct SimilarityGrouper {
    threshold: u32,
    skip_invalid: bool,
}

impl SimilarityGrouper {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            skip_invalid: false,
        }
    }

    /// Drop files without a fingerprint instead of keeping them as singletons
    pub fn skip_invalid(mut self, skip: bool) -> Self {
        self.skip_invalid = skip;
        self
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Number of distinct fingerprints among `files`
    pub fn distinct_fingerprints(files: &[FingerprintedFile]) -> usize {
        bucket(files).0.len()
    }

    /// Group files. Output order follows first appearance of each seed in
    /// `files`; singletons for failed files come last, in input order.
    pub fn group(&self, files: &[FingerprintedFile]) -> Vec<SimilarityGroup> {
        let (buckets, failed) = bucket(files);

        let mut visited = vec![false; buckets.len()];
        let mut groups = Vec::with_capacity(buckets.len() + failed.len());

        for seed in 0..buckets.len() {
            if visited[seed] {
                continue;
            }
            visited[seed] = true;

            let (seed_fingerprint, seed_files) = &buckets[seed];
            let mut members: Vec<FingerprintedFile> = seed_files.iter().map(|f| (*f).clone()).collect();
            let mut max_distance = 0;

            // Every bucket before `seed` is already visited.
            for other in (seed + 1)..buckets.len() {
                if visited[other] {
                    continue;
                }
                let (fingerprint, files) = &buckets[other];
                let distance = seed_fingerprint.distance(fingerprint);
                if distance <= self.threshold {
                    visited[other] = true;
                    members.extend(files.iter().map(|f| (*f).clone()));
                    max_distance = max_distance.max(distance);
                }
            }

            groups.push(SimilarityGroup {
                id: groups.len(),
                seed: Some((*seed_fingerprint).clone()),
                members,
                max_distance,
            });
        }

        if !self.skip_invalid {
            for file in failed {
                groups.push(SimilarityGroup::singleton(groups.len(), file.clone()));
            }
        }

        debug!(
            files = files.len(),
            distinct = buckets.len(),
            groups = groups.len(),
            threshold = self.threshold,
            "grouping complete"
        );

        groups
    }
}

impl Default for SimilarityGrouper {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

type Bucket<'a> = (&'a Fingerprint, Vec<&'a FingerprintedFile>);

/// Exact-fingerprint buckets in first-appearance order, plus the failed files
fn bucket(files: &[FingerprintedFile]) -> (Vec<Bucket<'_>>, Vec<&FingerprintedFile>) {
    let mut buckets: Vec<Bucket<'_>> = Vec::new();
    let mut index: HashMap<&Fingerprint, usize> = HashMap::new();
    let mut failed = Vec::new();

    for file in files {
        match &file.fingerprint {
            Some(fingerprint) => {
                let slot = *index.entry(fingerprint).or_insert_with(|| {
                    buckets.push((fingerprint, Vec::new()));
                    buckets.len() - 1
                });
                buckets[slot].1.push(file);
            }
            None => failed.push(file),
        }
    }

    (buckets, failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn file(name: &str, bits: Option<u8>) -> FingerprintedFile {
        FingerprintedFile::new(
            format!("/photos/{}", name),
            bits.map(|b| Fingerprint::new(vec![b])),
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        )
    }

    fn names(group: &SimilarityGroup) -> Vec<String> {
        group
            .members
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(SimilarityGrouper::default().group(&[]).is_empty());
    }

    #[test]
    fn identical_fingerprints_share_a_bucket() {
        let files = vec![file("a", Some(0b1010)), file("b", Some(0b1010))];
        let groups = SimilarityGrouper::new(0).group(&files);

        assert_eq!(groups.len(), 1);
        assert_eq!(names(&groups[0]), vec!["a", "b"]);
        assert_eq!(SimilarityGrouper::distinct_fingerprints(&files), 1);
    }

    #[test]
    fn both_neighbours_of_the_seed_merge() {
        // A:0000 B:0001 C:0010, d(A,B)=1 d(A,C)=1 d(B,C)=2
        let files = vec![file("a", Some(0b0000)), file("b", Some(0b0001)), file("c", Some(0b0010))];
        let groups = SimilarityGrouper::new(1).group(&files);

        assert_eq!(groups.len(), 1);
        assert_eq!(names(&groups[0]), vec!["a", "b", "c"]);
        assert_eq!(groups[0].max_distance, 1);
    }

    #[test]
    fn pairs_beyond_threshold_stay_apart() {
        // A:0000 B:0011 C:0110, every pairwise distance is 2
        let files = vec![file("a", Some(0b0000)), file("b", Some(0b0011)), file("c", Some(0b0110))];

        let groups = SimilarityGrouper::new(1).group(&files);
        assert_eq!(groups.len(), 3);

        let groups = SimilarityGrouper::new(2).group(&files);
        assert_eq!(groups.len(), 1);
        assert_eq!(names(&groups[0]), vec!["a", "b", "c"]);
    }

    #[test]
    fn only_the_seed_is_compared() {
        // A:0000 B:0001 C:0011, d(A,B)=1 d(B,C)=1 d(A,C)=2
        let files = vec![file("a", Some(0b0000)), file("b", Some(0b0001)), file("c", Some(0b0011))];
        let groups = SimilarityGrouper::new(1).group(&files);

        assert_eq!(groups.len(), 2);
        assert_eq!(names(&groups[0]), vec!["a", "b"]);
        assert_eq!(names(&groups[1]), vec!["c"]);
    }

    #[test]
    fn later_seed_can_claim_leftovers() {
        // A:0000 B:0111 C:0110, d(A,B)=3 d(A,C)=2 d(B,C)=1
        let files = vec![file("a", Some(0b0000)), file("b", Some(0b0111)), file("c", Some(0b0110))];
        let groups = SimilarityGrouper::new(1).group(&files);

        assert_eq!(groups.len(), 2);
        assert_eq!(names(&groups[0]), vec!["a"]);
        assert_eq!(names(&groups[1]), vec!["b", "c"]);
    }

    #[test]
    fn raising_threshold_can_split_a_pair() {
        let files = vec![file("a", Some(0b0000)), file("b", Some(0b0111)), file("c", Some(0b0110))];

        // At 2 the seed A grabs C first, leaving B alone.
        let groups = SimilarityGrouper::new(2).group(&files);
        assert_eq!(groups.len(), 2);
        assert_eq!(names(&groups[0]), vec!["a", "c"]);
        assert_eq!(names(&groups[1]), vec!["b"]);

        // At 3 everything is within reach of A.
        let groups = SimilarityGrouper::new(3).group(&files);
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn threshold_growth_never_shrinks_the_first_group() {
        let files: Vec<_> = [0b0000_0000u8, 0b0000_0001, 0b0000_0011, 0b0000_0111, 0b1111_0000]
            .iter()
            .enumerate()
            .map(|(i, bits)| file(&format!("f{}", i), Some(*bits)))
            .collect();

        let mut previous = 0;
        for threshold in 0..=8 {
            let groups = SimilarityGrouper::new(threshold).group(&files);
            let first = groups[0].len();
            assert!(first >= previous, "threshold {} shrank the seed group", threshold);
            previous = first;
        }
        assert_eq!(previous, files.len());
    }

    #[test]
    fn isolated_bucket_is_its_own_group() {
        let files = vec![file("a", Some(0b0000_0000)), file("b", Some(0b1111_1111)), file("c", Some(0b1111_1111))];
        let groups = SimilarityGrouper::new(3).group(&files);

        assert_eq!(groups.len(), 2);
        assert_eq!(names(&groups[0]), vec!["a"]);
        assert_eq!(names(&groups[1]), vec!["b", "c"]);
    }

    #[test]
    fn grouping_is_idempotent() {
        let files = vec![
            file("a", Some(0b0000)),
            file("b", Some(0b0111)),
            file("c", Some(0b0110)),
            file("d", None),
            file("e", Some(0b0000)),
        ];
        let grouper = SimilarityGrouper::new(1);
        assert_eq!(grouper.group(&files), grouper.group(&files));
    }

    #[test]
    fn failed_files_become_trailing_singletons() {
        let files = vec![file("bad1", None), file("a", Some(0b0000)), file("bad2", None), file("b", Some(0b0000))];
        let groups = SimilarityGrouper::new(1).group(&files);

        assert_eq!(groups.len(), 3);
        assert_eq!(names(&groups[0]), vec!["a", "b"]);
        assert_eq!(names(&groups[1]), vec!["bad1"]);
        assert_eq!(names(&groups[2]), vec!["bad2"]);
        assert!(groups[1].seed.is_none());
        assert_eq!(groups.iter().map(|g| g.id).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn skip_invalid_drops_failed_files() {
        let files = vec![file("bad", None), file("a", Some(0b0000))];
        let groups = SimilarityGrouper::new(1).skip_invalid(true).group(&files);

        assert_eq!(groups.len(), 1);
        assert_eq!(names(&groups[0]), vec!["a"]);
    }

    #[test]
    fn every_file_lands_in_exactly_one_group() {
        let files: Vec<_> = (0u8..32).map(|i| file(&format!("f{}", i), Some(i.wrapping_mul(37)))).collect();
        let groups = SimilarityGrouper::new(2).group(&files);

        let mut seen: Vec<_> = groups.iter().flat_map(|g| g.members.iter().map(|f| f.path.clone())).collect();
        seen.sort();
        let mut expected: Vec<_> = files.iter().map(|f| f.path.clone()).collect();
        expected.sort();
        assert_eq!(seen, expected);
    }
}
