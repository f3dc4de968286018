//! Picks the file to keep in each group.

use super::{FingerprintedFile, MatchType, SimilarityGroup};
use serde::Serialize;

/// Outcome of selecting within one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub group_id: usize,
    /// Largest seed distance inside the group
    pub max_distance: u32,
    pub kept: FingerprintedFile,
    /// Duplicates, earliest first
    pub removed: Vec<FingerprintedFile>,
}

impl Selection {
    pub fn is_duplicate_set(&self) -> bool {
        !self.removed.is_empty()
    }

    pub fn match_type(&self) -> MatchType {
        MatchType::from_distance(self.max_distance)
    }

    pub fn len(&self) -> usize {
        1 + self.removed.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Keep the earliest-created member; ties break on path.
///
/// Returns `None` only for an empty group, which the grouper never produces.
pub fn select(group: &SimilarityGroup) -> Option<Selection> {
    let mut members = group.members.clone();
    members.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.path.cmp(&b.path)));

    let mut members = members.into_iter();
    let kept = members.next()?;

    Some(Selection {
        group_id: group.id,
        max_distance: group.max_distance,
        kept,
        removed: members.collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hasher::Fingerprint;
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    fn member(name: &str, secs: i64) -> FingerprintedFile {
        FingerprintedFile::new(
            format!("/p/{}", name),
            Some(Fingerprint::new(vec![0])),
            Utc.timestamp_opt(secs, 0).unwrap(),
        )
    }

    fn group(members: Vec<FingerprintedFile>) -> SimilarityGroup {
        SimilarityGroup {
            id: 7,
            seed: Some(Fingerprint::new(vec![0])),
            members,
            max_distance: 0,
        }
    }

    #[test]
    fn earliest_created_is_kept() {
        let selection = select(&group(vec![member("c", 3), member("a", 1), member("b", 2)])).unwrap();

        assert_eq!(selection.kept.path, PathBuf::from("/p/a"));
        let removed: Vec<_> = selection.removed.iter().map(|f| f.path.clone()).collect();
        assert_eq!(removed, vec![PathBuf::from("/p/b"), PathBuf::from("/p/c")]);
        assert_eq!(selection.group_id, 7);
    }

    #[test]
    fn ties_break_on_path() {
        let selection = select(&group(vec![member("z", 5), member("m", 5), member("a", 9)])).unwrap();

        assert_eq!(selection.kept.path, PathBuf::from("/p/m"));
        assert_eq!(selection.removed[0].path, PathBuf::from("/p/z"));
    }

    #[test]
    fn singleton_keeps_its_member() {
        let selection = select(&SimilarityGroup::singleton(0, member("solo", 1))).unwrap();
        assert!(!selection.is_duplicate_set());
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn empty_group_selects_nothing() {
        assert!(select(&group(Vec::new())).is_none());
    }
}
