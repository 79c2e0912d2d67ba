use std::fmt;

use crate::domain::ReleaseState;
use crate::error::VoyagerError;

/// A single backend-touching step of a coordinator operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CreateTag,
    CreateRecord,
    TriggerPipeline,
    DeleteRecord,
    DeleteTag,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::CreateTag => "create tag",
            Step::CreateRecord => "create release record",
            Step::TriggerPipeline => "trigger pipeline",
            Step::DeleteRecord => "delete release record",
            Step::DeleteTag => "delete tag",
        };
        f.write_str(name)
    }
}

/// Report for an operation that changed some backends but not all of them
#[derive(Debug)]
pub struct PartialFailure {
    pub operation: &'static str,
    pub target: String,
    pub completed: Vec<Step>,
    pub failed: Step,
    pub cause: VoyagerError,
}

impl PartialFailure {
    pub fn new(
        operation: &'static str,
        target: impl Into<String>,
        completed: Vec<Step>,
        failed: Step,
        cause: VoyagerError,
    ) -> Self {
        PartialFailure {
            operation,
            target: target.into(),
            completed,
            failed,
            cause,
        }
    }

    /// What the operator has to do to reconcile the backends
    pub fn remediation(&self) -> String {
        let tag = &self.target;
        match self.failed {
            Step::CreateRecord => format!(
                "tag {tag} exists without a release record - create the release record for {tag} \
                 and trigger the pipeline, or run `voyager delete -t {tag}`"
            ),
            Step::TriggerPipeline if self.operation == "release" => format!(
                "tag and release record for {tag} are in place - retry the pipeline trigger for {tag}"
            ),
            Step::DeleteTag => {
                format!("record deleted, tag deletion failed - retry tag deletion for {tag}")
            }
            other => format!("retry {other} for {tag}"),
        }
    }

    /// Backend presence implied by the steps that went through
    pub fn state(&self) -> ReleaseState {
        let done = |step: Step| self.completed.contains(&step);
        match self.operation {
            "delete" => ReleaseState {
                tag_exists: !done(Step::DeleteTag),
                release_record_exists: !done(Step::DeleteRecord),
                pipeline_triggered: false,
            },
            _ => ReleaseState {
                tag_exists: done(Step::CreateTag),
                release_record_exists: done(Step::CreateRecord),
                pipeline_triggered: done(Step::TriggerPipeline),
            },
        }
    }
}

impl fmt::Display for PartialFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let completed: Vec<String> = self.completed.iter().map(|s| s.to_string()).collect();
        write!(
            f,
            "{} of {} partially applied: completed [{}]; {} failed: {}. Remediation: {}",
            self.operation,
            self.target,
            completed.join(", "),
            self.failed,
            self.cause,
            self.remediation()
        )
    }
}
