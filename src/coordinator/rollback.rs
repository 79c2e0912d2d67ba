use tracing::info;

use crate::concourse::Pipeline;
use crate::domain::{Acknowledgement, PipelineTrigger, Version};
use crate::error::{Backend, Result, VoyagerError};
use crate::git::TagStore;
use crate::github::RecordStore;
use crate::repository::ReleaseRepository;
use crate::resolver::VersionResolver;

/// A validated rollback target and the trigger that would rebuild it
#[derive(Debug, Clone, PartialEq)]
pub struct RollbackPlan {
    pub tag: String,
    pub version: Version,
    pub commit: String,
    pub trigger: PipelineTrigger,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RollbackOutcome {
    pub tag: String,
    pub version: Version,
    pub commit: String,
    pub acknowledgement: Acknowledgement,
}

/// Asks the pipeline to rebuild an earlier release.
///
/// Tags and release records are left untouched, so the latest version does
/// not move.
pub struct RollbackCoordinator<'a, T, R, P> {
    repo: &'a ReleaseRepository<T, R, P>,
}

impl<'a, T: TagStore, R: RecordStore, P: Pipeline> RollbackCoordinator<'a, T, R, P> {
    pub fn new(repo: &'a ReleaseRepository<T, R, P>) -> Self {
        RollbackCoordinator { repo }
    }

    /// Check that `target` names an existing release tag and resolve its commit
    pub fn plan(&self, target: &str) -> Result<RollbackPlan> {
        let target = target.trim();
        if target.is_empty() {
            return Err(VoyagerError::validation("a rollback target tag is required"));
        }

        let version = match Version::parse(target) {
            Ok(version) => version,
            Err(err) => {
                if self.repo.resolve_tag(target)?.is_none() {
                    return Err(VoyagerError::not_found(Backend::TagStore, target));
                }
                return Err(err);
            }
        };

        let scan = VersionResolver::new(self.repo.tags()).scan()?;
        let tag = scan
            .find(&version, target)
            .ok_or_else(|| VoyagerError::not_found(Backend::TagStore, target))?;

        Ok(RollbackPlan {
            tag: tag.name.clone(),
            version,
            commit: tag.commit.clone(),
            trigger: PipelineTrigger::rollback(&version),
        })
    }

    pub fn rollback(&self, target: &str) -> Result<RollbackOutcome> {
        let plan = self.plan(target)?;
        self.execute(plan)
    }

    pub fn execute(&self, plan: RollbackPlan) -> Result<RollbackOutcome> {
        info!(tag = %plan.tag, commit = %plan.commit, "rolling back");
        let acknowledgement = self.repo.trigger(&plan.trigger)?;

        Ok(RollbackOutcome {
            tag: plan.tag,
            version: plan.version,
            commit: plan.commit,
            acknowledgement,
        })
    }
}
