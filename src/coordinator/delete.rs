use tracing::{debug, info};

use crate::concourse::Pipeline;
use crate::domain::{Step, Version};
use crate::error::{Result, VoyagerError};
use crate::git::TagStore;
use crate::github::RecordStore;
use crate::repository::ReleaseRepository;
use crate::resolver::VersionResolver;

/// What a delete removed; `false` means the resource was already absent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub tag: String,
    pub record_deleted: bool,
    pub tag_deleted: bool,
}

/// Removes a release: the release record first, then the tag
pub struct DeleteCoordinator<'a, T, R, P> {
    repo: &'a ReleaseRepository<T, R, P>,
}

impl<'a, T: TagStore, R: RecordStore, P: Pipeline> DeleteCoordinator<'a, T, R, P> {
    pub fn new(repo: &'a ReleaseRepository<T, R, P>) -> Self {
        DeleteCoordinator { repo }
    }

    /// Name the release is stored under: an existing tag for the version,
    /// else an existing record, else `v<version>`
    fn resolve_name(&self, target: &str, version: &Version) -> Result<String> {
        let scan = VersionResolver::new(self.repo.tags()).scan()?;
        if let Some(tag) = scan.find(version, target) {
            return Ok(tag.name.clone());
        }

        let records = self.repo.list_records(None)?;
        let record = records
            .iter()
            .filter(|r| r.version().as_ref() == Some(version))
            .find(|r| r.tag == target)
            .or_else(|| records.iter().find(|r| r.version().as_ref() == Some(version)));
        Ok(record
            .map(|r| r.tag.clone())
            .unwrap_or_else(|| version.tag_name()))
    }

    /// Delete the release named by `target`.
    ///
    /// Each resource that is already gone counts as deleted, so deleting
    /// twice succeeds.
    pub fn delete(&self, target: &str) -> Result<DeleteOutcome> {
        let target = target.trim();
        if target.is_empty() {
            return Err(VoyagerError::validation("a tag to delete is required"));
        }
        let version = Version::parse(target)?;
        let tag = self.resolve_name(target, &version)?;
        info!(%tag, "deleting release");

        let record_deleted = match self.repo.delete_record(&tag) {
            Ok(()) => true,
            Err(err) if err.is_not_found() => {
                debug!(%tag, "release record already absent");
                false
            }
            Err(err) => return Err(err),
        };

        let tag_deleted = match self.repo.delete_tag(&tag) {
            Ok(()) => true,
            Err(err) if err.is_not_found() => {
                debug!(%tag, "tag already absent");
                false
            }
            Err(err) if record_deleted => {
                return Err(VoyagerError::partial(
                    "delete",
                    tag,
                    vec![Step::DeleteRecord],
                    Step::DeleteTag,
                    err,
                ))
            }
            Err(err) => return Err(err),
        };

        Ok(DeleteOutcome {
            tag,
            record_deleted,
            tag_deleted,
        })
    }
}
