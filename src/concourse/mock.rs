use std::sync::{Mutex, MutexGuard};

use crate::concourse::Pipeline;
use crate::domain::{Acknowledgement, PipelineTrigger};
use crate::error::{Backend, Result};
use crate::git::mock::CallScript;

#[derive(Default)]
struct MockBuilds {
    triggers: Vec<PipelineTrigger>,
    script: CallScript,
}

/// Pipeline that records every accepted trigger.
///
/// The single operation is counted as `"trigger"`.
#[derive(Default)]
pub struct MockPipeline {
    state: Mutex<MockBuilds>,
}

impl MockPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, times: usize) {
        self.state().script.fail_next("trigger", times);
    }

    /// Attempts, including failed ones
    pub fn calls(&self) -> usize {
        self.state().script.calls("trigger")
    }

    /// Triggers the pipeline acknowledged, in order
    pub fn triggers(&self) -> Vec<PipelineTrigger> {
        self.state().triggers.clone()
    }

    fn state(&self) -> MutexGuard<'_, MockBuilds> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Pipeline for MockPipeline {
    fn trigger(&self, request: &PipelineTrigger) -> Result<Acknowledgement> {
        let mut state = self.state();
        state.script.record(Backend::Pipeline, "trigger")?;
        state.triggers.push(request.clone());
        let id = state.triggers.len() as u64;
        Ok(Acknowledgement {
            build_id: Some(id),
            build_name: Some(id.to_string()),
            url: None,
        })
    }
}
