//! Version resolution from existing release tags

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::boundary::BoundaryWarning;
use crate::domain::{ReleaseTag, Version, VersionBump};
use crate::error::{Backend, Result, VoyagerError};
use crate::git::TagStore;

/// Release tags of one fresh `list_tags` read, grouped by parsed version.
///
/// Tags that do not parse are dropped.
#[derive(Debug, Clone, Default)]
pub struct TagScan {
    versions: BTreeMap<Version, Vec<ReleaseTag>>,
}

impl TagScan {
    pub fn from_tags(tags: Vec<ReleaseTag>) -> Self {
        let mut versions: BTreeMap<Version, Vec<ReleaseTag>> = BTreeMap::new();
        for tag in tags {
            match tag.version() {
                Some(version) => versions.entry(version).or_default().push(tag),
                None => debug!(tag = %tag.name, "ignoring tag that is not a release version"),
            }
        }
        TagScan { versions }
    }

    pub fn latest(&self) -> Option<Version> {
        self.versions.keys().next_back().copied()
    }

    pub fn next(&self, bump: VersionBump) -> Result<Version> {
        VersionResolver::<()>::next_from(self.latest(), bump)
    }

    /// Tag recorded for `version`; the one named `preferred` wins, then the
    /// canonical `v<version>` name
    pub fn find(&self, version: &Version, preferred: &str) -> Option<&ReleaseTag> {
        let tags = self.versions.get(version)?;
        let canonical = version.tag_name();
        tags.iter()
            .find(|t| t.name == preferred)
            .or_else(|| tags.iter().find(|t| t.name == canonical))
            .or_else(|| tags.first())
    }

    /// Parsed versions, newest first
    pub fn versions(&self) -> impl Iterator<Item = &Version> {
        self.versions.keys().rev()
    }

    /// One warning per version claimed by more than one tag
    pub fn warnings(&self) -> Vec<BoundaryWarning> {
        self.versions
            .iter()
            .filter(|(_, tags)| tags.len() > 1)
            .map(|(version, tags)| BoundaryWarning::DuplicateVersion {
                version: *version,
                tags: tags.iter().map(|t| t.name.clone()).collect(),
            })
            .collect()
    }
}

/// Computes the latest and next release version from the tag store
pub struct VersionResolver<'a, T> {
    tags: &'a T,
}

impl<'a, T> VersionResolver<'a, T> {
    /// Apply `bump` to `from`, seeding at 0.0.0 when there is no prior release
    pub fn next_from(from: Option<Version>, bump: VersionBump) -> Result<Version> {
        from.unwrap_or_else(Version::zero).bump(bump)
    }
}

impl<'a, T: TagStore> VersionResolver<'a, T> {
    pub fn new(tags: &'a T) -> Self {
        VersionResolver { tags }
    }

    /// Read every tag and group the parsable ones by version
    pub fn scan(&self) -> Result<TagScan> {
        let scan = TagScan::from_tags(self.tags.list_tags()?);
        for warning in scan.warnings() {
            warn!("{}", warning);
        }
        Ok(scan)
    }

    /// Highest released version
    pub fn latest(&self) -> Result<Version> {
        self.scan()?
            .latest()
            .ok_or_else(|| VoyagerError::not_found(Backend::TagStore, "release tag"))
    }

    pub fn next(&self, bump: VersionBump) -> Result<Version> {
        self.scan()?.next(bump)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockTagStore;

    fn store(tags: &[&str]) -> MockTagStore {
        let store = MockTagStore::new();
        for tag in tags {
            store.add_tag(*tag, "abc");
        }
        store
    }

    #[test]
    fn test_latest_ignores_malformed_tags() {
        let tags = store(&["v1.0.0", "v1.2.3", "v2.0.0-bad", "not-a-version"]);
        let resolver = VersionResolver::new(&tags);
        assert_eq!(resolver.latest().unwrap(), Version::new(1, 2, 3));
    }

    #[test]
    fn test_latest_not_found_when_nothing_parses() {
        let tags = store(&["v2.0.0-bad", "not-a-version"]);
        let err = VersionResolver::new(&tags).latest().unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_next_from_latest() {
        let tags = store(&["v1.4.7", "v1.4.6"]);
        let resolver = VersionResolver::new(&tags);
        assert_eq!(resolver.next(VersionBump::Major).unwrap(), Version::new(2, 0, 0));
        assert_eq!(resolver.next(VersionBump::Minor).unwrap(), Version::new(1, 5, 0));
        assert_eq!(resolver.next(VersionBump::Patch).unwrap(), Version::new(1, 4, 8));
    }

    #[test]
    fn test_next_seeds_at_zero() {
        let tags = store(&[]);
        let resolver = VersionResolver::new(&tags);
        assert_eq!(resolver.next(VersionBump::Patch).unwrap(), Version::new(0, 0, 1));
        assert_eq!(resolver.next(VersionBump::Minor).unwrap(), Version::new(0, 1, 0));
        assert_eq!(resolver.next(VersionBump::Major).unwrap(), Version::new(1, 0, 0));
    }

    #[test]
    fn test_next_refuses_to_wrap_around() {
        let tags = store(&["v1.0.0", "v18446744073709551615.0.0"]);
        let resolver = VersionResolver::new(&tags);
        assert!(matches!(
            resolver.next(VersionBump::Major),
            Err(VoyagerError::Validation(_))
        ));
        assert_eq!(
            resolver.next(VersionBump::Patch).unwrap(),
            Version::new(u64::MAX, 0, 1)
        );
    }

    #[test]
    fn test_ordering_is_numeric() {
        let tags = store(&["v1.9.0", "v1.10.0", "v1.2.0"]);
        assert_eq!(
            VersionResolver::new(&tags).latest().unwrap(),
            Version::new(1, 10, 0)
        );
    }

    #[test]
    fn test_duplicate_versions_warn_and_count_once() {
        let tags = store(&["v1.2.0", "V1.2.0", "1.2.0", "v1.1.0"]);
        let scan = VersionResolver::new(&tags).scan().unwrap();

        assert_eq!(scan.latest(), Some(Version::new(1, 2, 0)));
        assert_eq!(scan.versions().count(), 2);
        let warnings = scan.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            &warnings[0],
            BoundaryWarning::DuplicateVersion { tags, .. } if tags.len() == 3
        ));
    }

    #[test]
    fn test_find_prefers_requested_then_canonical() {
        let tags = store(&["V1.2.0", "v1.2.0", "1.2.0"]);
        let scan = VersionResolver::new(&tags).scan().unwrap();
        let v = Version::new(1, 2, 0);

        assert_eq!(scan.find(&v, "1.2.0").unwrap().name, "1.2.0");
        assert_eq!(scan.find(&v, "v01.2.0").unwrap().name, "v1.2.0");
        assert!(scan.find(&Version::new(9, 9, 9), "v9.9.9").is_none());
    }

    #[test]
    fn test_every_call_reads_the_store() {
        let tags = store(&["v1.0.0"]);
        let resolver = VersionResolver::new(&tags);
        resolver.latest().unwrap();
        tags.add_tag("v1.1.0", "def");
        assert_eq!(resolver.latest().unwrap(), Version::new(1, 1, 0));
        assert_eq!(tags.calls("list_tags"), 2);
    }
}
