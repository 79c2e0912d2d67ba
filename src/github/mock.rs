use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use crate::domain::ReleaseRecord;
use crate::error::{Backend, Result, VoyagerError};
use crate::git::mock::CallScript;
use crate::github::RecordStore;

#[derive(Default)]
struct MockRecords {
    // newest first
    records: Vec<ReleaseRecord>,
    script: CallScript,
}

/// In-memory release-record store for testing.
///
/// Operations are counted as `"create_record"`, `"delete_record"` and
/// `"list_records"`.
#[derive(Default)]
pub struct MockRecordStore {
    state: Mutex<MockRecords>,
}

impl MockRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record as if it had been created out of band
    pub fn add_record(&self, record: ReleaseRecord) {
        self.state().records.insert(0, record);
    }

    pub fn fail_next(&self, operation: &'static str, times: usize) {
        self.state().script.fail_next(operation, times);
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.state().script.calls(operation)
    }

    pub fn tags(&self) -> Vec<String> {
        self.state().records.iter().map(|r| r.tag.clone()).collect()
    }

    fn state(&self) -> MutexGuard<'_, MockRecords> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn enter(&self, operation: &'static str) -> Result<MutexGuard<'_, MockRecords>> {
        let mut state = self.state();
        state.script.record(Backend::RecordStore, operation)?;
        Ok(state)
    }
}

impl RecordStore for MockRecordStore {
    fn create_record(&self, tag: &str, commit: &str, title: &str, body: &str) -> Result<()> {
        let mut state = self.enter("create_record")?;
        if state.records.iter().any(|r| r.tag == tag) {
            return Err(VoyagerError::conflict(Backend::RecordStore, tag));
        }
        let mut record = ReleaseRecord::new(tag, commit, title, body);
        record.created_at = Some(Utc::now());
        state.records.insert(0, record);
        Ok(())
    }

    fn delete_record(&self, tag: &str) -> Result<()> {
        let mut state = self.enter("delete_record")?;
        let before = state.records.len();
        state.records.retain(|r| r.tag != tag);
        if state.records.len() == before {
            return Err(VoyagerError::not_found(Backend::RecordStore, tag));
        }
        Ok(())
    }

    fn list_records(&self, limit: Option<usize>) -> Result<Vec<ReleaseRecord>> {
        let state = self.enter("list_records")?;
        let take = limit.unwrap_or(usize::MAX);
        Ok(state.records.iter().take(take).cloned().collect())
    }
}
