//! Release lifecycle operations
//!
//! Each coordinator runs its steps strictly in order against a
//! [ReleaseRepository](crate::repository::ReleaseRepository) and stops at the
//! first failure. Nothing already written is undone automatically; a failure
//! after a write is reported as a
//! [PartialFailure](crate::VoyagerError::PartialFailure) naming the steps that
//! went through.

pub mod delete;
pub mod history;
pub mod release;
pub mod rollback;

pub use delete::{DeleteCoordinator, DeleteOutcome};
pub use history::{validate_limit, ReleaseHistory};
pub use release::{ReleaseCoordinator, ReleaseOutcome, ReleasePlan};
pub use rollback::{RollbackCoordinator, RollbackOutcome, RollbackPlan};
