use tracing::{info, warn};

use crate::boundary::BoundaryWarning;
use crate::concourse::Pipeline;
use crate::domain::{Acknowledgement, PipelineTrigger, Step, Version, VersionBump};
use crate::error::{Result, VoyagerError};
use crate::git::TagStore;
use crate::github::RecordStore;
use crate::repository::ReleaseRepository;
use crate::resolver::VersionResolver;

/// What a release would write, computed without touching any backend state
#[derive(Debug, Clone, PartialEq)]
pub struct ReleasePlan {
    pub version: Version,
    pub tag: String,
    pub commit: String,
    pub title: String,
    pub warnings: Vec<BoundaryWarning>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseOutcome {
    pub version: Version,
    pub tag: String,
    pub commit: String,
    pub acknowledgement: Acknowledgement,
    pub warnings: Vec<BoundaryWarning>,
}

/// Creates a release: tag, then release record, then pipeline trigger
pub struct ReleaseCoordinator<'a, T, R, P> {
    repo: &'a ReleaseRepository<T, R, P>,
}

impl<'a, T: TagStore, R: RecordStore, P: Pipeline> ReleaseCoordinator<'a, T, R, P> {
    pub fn new(repo: &'a ReleaseRepository<T, R, P>) -> Self {
        ReleaseCoordinator { repo }
    }

    /// Resolve HEAD and the next version for `bump`
    pub fn plan(&self, bump: VersionBump) -> Result<ReleasePlan> {
        let commit = self.repo.head_commit()?;
        let scan = VersionResolver::new(self.repo.tags()).scan()?;
        let version = scan.next(bump)?;
        let tag = version.tag_name();

        Ok(ReleasePlan {
            version,
            title: tag.clone(),
            tag,
            commit,
            warnings: scan.warnings(),
        })
    }

    pub fn create_release(&self, bump: VersionBump, message: &str) -> Result<ReleaseOutcome> {
        let plan = self.plan(bump)?;
        self.execute(plan, message)
    }

    /// Write a planned release.
    ///
    /// A tag conflict aborts before anything is written. Once the tag exists
    /// it is never removed here: later failures come back as a partial
    /// failure and are left to the operator.
    pub fn execute(&self, plan: ReleasePlan, message: &str) -> Result<ReleaseOutcome> {
        let ReleasePlan {
            version,
            tag,
            commit,
            title,
            warnings,
        } = plan;
        info!(%tag, %commit, "creating release");

        if let Err(err) = self.repo.create_tag(&tag, &commit) {
            if err.is_conflict() {
                warn!(%tag, "tag already exists; another release claimed this version");
            }
            return Err(err);
        }
        let mut completed = vec![Step::CreateTag];

        if let Err(err) = self.repo.create_record(&tag, &commit, &title, message) {
            return Err(VoyagerError::partial(
                "release",
                tag,
                completed,
                Step::CreateRecord,
                err,
            ));
        }
        completed.push(Step::CreateRecord);

        let acknowledgement = match self
            .repo
            .trigger(&PipelineTrigger::release(&version, message))
        {
            Ok(ack) => ack,
            Err(err) => {
                return Err(VoyagerError::partial(
                    "release",
                    tag,
                    completed,
                    Step::TriggerPipeline,
                    err,
                ))
            }
        };

        info!(%tag, build = ?acknowledgement.build_id, "release created");
        Ok(ReleaseOutcome {
            version,
            tag,
            commit,
            acknowledgement,
            warnings,
        })
    }
}
