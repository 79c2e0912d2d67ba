//! Domain logic - pure release rules independent of any backend

pub mod release;
pub mod step;
pub mod tag;
pub mod version;

pub use release::{Acknowledgement, PipelineTrigger, ReleaseRecord, ReleaseState};
pub use step::{PartialFailure, Step};
pub use tag::{short_hash, ReleaseTag};
pub use version::{Version, VersionBump};
