//! Tag store abstraction layer
//!
//! This module provides a trait-based abstraction over the version-control
//! side of a release: the commit a release points at and the immutable tag
//! that names it. Implementations:
//!
//! - [repository::Git2TagStore]: tags pushed to and listed from a git remote via `git2`
//! - [mock::MockTagStore]: in-memory implementation for testing
//!
//! Coordinators depend on the [TagStore] trait only.
//!
//! ```rust
//! # use voyager::git::TagStore;
//! # fn example<T: TagStore>(store: &T) -> voyager::Result<()> {
//! let head = store.head_commit()?;
//! store.create_tag("v1.0.0", &head)?;
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockTagStore;
pub use repository::Git2TagStore;

use crate::domain::ReleaseTag;
use crate::error::Result;

/// Remote tag store operations
///
/// Every call is a fresh read or write against the backend; implementations
/// must not cache tag state between calls.
///
/// ## Errors
///
/// - `create_tag`: [Conflict](crate::VoyagerError::Conflict) when the name exists,
///   [Network](crate::VoyagerError::Network) on transport failure
/// - `delete_tag`: [NotFound](crate::VoyagerError::NotFound) when absent,
///   [Network](crate::VoyagerError::Network) on transport failure
pub trait TagStore: Send + Sync {
    /// Commit id currently checked out (HEAD)
    fn head_commit(&self) -> Result<String>;

    /// Create an immutable tag `name` pointing at `commit`
    fn create_tag(&self, name: &str, commit: &str) -> Result<()>;

    /// Remove tag `name`
    fn delete_tag(&self, name: &str) -> Result<()>;

    /// All tags with the commit each is bound to
    fn list_tags(&self) -> Result<Vec<ReleaseTag>>;

    /// Commit bound to tag `name`, `None` if the tag does not exist
    fn resolve_tag(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .list_tags()?
            .into_iter()
            .find(|tag| tag.name == name)
            .map(|tag| tag.commit))
    }
}
