//! CI pipeline trigger
//!
//! A trigger is fire-and-forget: [Pipeline::trigger] returns once the CI
//! system acknowledges the request, never waiting on the build.

pub mod client;
pub mod flyrc;
pub mod mock;

pub use client::{Build, ConcourseClient, ConcourseTarget};
pub use mock::MockPipeline;

use crate::domain::{Acknowledgement, PipelineTrigger};
use crate::error::Result;

/// Pipeline trigger operations
pub trait Pipeline: Send + Sync {
    /// Ask the CI system to start a build with the trigger's parameters.
    ///
    /// Fails with [Network](crate::VoyagerError::Network) when the request is
    /// not acknowledged.
    fn trigger(&self, request: &PipelineTrigger) -> Result<Acknowledgement>;
}

/// Pipeline for commands that never trigger a build
#[derive(Debug, Default, Clone, Copy)]
pub struct Unconfigured;

impl Pipeline for Unconfigured {
    fn trigger(&self, _request: &PipelineTrigger) -> Result<Acknowledgement> {
        Err(crate::VoyagerError::config(
            "Concourse is not configured; add a [concourse] section to voyager.toml \
             or pass --concourse-url and --concourse-team",
        ))
    }
}
