//! The three release backends behind one handle

use crate::concourse::Pipeline;
use crate::domain::{Acknowledgement, PipelineTrigger, ReleaseRecord, ReleaseTag};
use crate::error::Result;
use crate::git::TagStore;
use crate::github::RecordStore;

/// Tag store, release-record store and pipeline used by the coordinators.
///
/// Holds no state of its own; every call goes to a backend.
pub struct ReleaseRepository<T, R, P> {
    tags: T,
    records: R,
    pipeline: P,
}

impl<T: TagStore, R: RecordStore, P: Pipeline> ReleaseRepository<T, R, P> {
    pub fn new(tags: T, records: R, pipeline: P) -> Self {
        ReleaseRepository {
            tags,
            records,
            pipeline,
        }
    }

    pub fn tags(&self) -> &T {
        &self.tags
    }

    pub fn records(&self) -> &R {
        &self.records
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub fn head_commit(&self) -> Result<String> {
        self.tags.head_commit()
    }

    pub fn create_tag(&self, name: &str, commit: &str) -> Result<()> {
        self.tags.create_tag(name, commit)
    }

    pub fn delete_tag(&self, name: &str) -> Result<()> {
        self.tags.delete_tag(name)
    }

    pub fn list_tags(&self) -> Result<Vec<ReleaseTag>> {
        self.tags.list_tags()
    }

    pub fn resolve_tag(&self, name: &str) -> Result<Option<String>> {
        self.tags.resolve_tag(name)
    }

    pub fn create_record(&self, tag: &str, commit: &str, title: &str, body: &str) -> Result<()> {
        self.records.create_record(tag, commit, title, body)
    }

    pub fn delete_record(&self, tag: &str) -> Result<()> {
        self.records.delete_record(tag)
    }

    pub fn list_records(&self, limit: Option<usize>) -> Result<Vec<ReleaseRecord>> {
        self.records.list_records(limit)
    }

    pub fn trigger(&self, request: &PipelineTrigger) -> Result<Acknowledgement> {
        self.pipeline.trigger(request)
    }
}
