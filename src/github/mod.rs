//! Release-record store
//!
//! Hosted release objects keyed by tag name. [client::GitHubClient] talks to
//! the GitHub releases API; [mock::MockRecordStore] keeps records in memory.

pub mod client;
pub mod mock;

pub use client::GitHubClient;
pub use mock::MockRecordStore;

use crate::domain::ReleaseRecord;
use crate::error::Result;

/// Hosted release-record operations
///
/// ## Errors
///
/// - `create_record`: [Conflict](crate::VoyagerError::Conflict) when a record
///   for the tag exists
/// - `delete_record`: [NotFound](crate::VoyagerError::NotFound) when absent
/// - every call: [Network](crate::VoyagerError::Network) on transport failure
///   or timeout
pub trait RecordStore: Send + Sync {
    /// Publish a release record for `tag` targeting `commit`
    fn create_record(&self, tag: &str, commit: &str, title: &str, body: &str) -> Result<()>;

    /// Remove the release record for `tag`
    fn delete_record(&self, tag: &str) -> Result<()>;

    /// Records newest first as kept by the host; `None` reads every page
    fn list_records(&self, limit: Option<usize>) -> Result<Vec<ReleaseRecord>>;
}
