use crate::domain::ReleaseTag;
use crate::error::{Backend, Result, VoyagerError};
use crate::git::TagStore;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Call counts and scripted failures shared by the in-memory backends
#[derive(Default)]
pub(crate) struct CallScript {
    calls: HashMap<&'static str, usize>,
    failures: HashMap<&'static str, usize>,
}

impl CallScript {
    pub(crate) fn fail_next(&mut self, operation: &'static str, times: usize) {
        self.failures.insert(operation, times);
    }

    pub(crate) fn calls(&self, operation: &str) -> usize {
        self.calls.get(operation).copied().unwrap_or(0)
    }

    /// Record a call; `Err` when a scripted failure is pending for it
    pub(crate) fn record(&mut self, backend: Backend, operation: &'static str) -> Result<()> {
        *self.calls.entry(operation).or_insert(0) += 1;
        if let Some(remaining) = self.failures.get_mut(operation) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(VoyagerError::network(
                    backend,
                    operation,
                    "simulated connection failure",
                ));
            }
        }
        Ok(())
    }
}

#[derive(Default)]
struct MockTags {
    head: String,
    tags: Vec<ReleaseTag>,
    script: CallScript,
}

/// In-memory tag store for testing without a git remote.
///
/// Counts calls per operation (`"head_commit"`, `"create_tag"`,
/// `"delete_tag"`, `"list_tags"`) and can be scripted to fail the next
/// calls of an operation with a network error.
pub struct MockTagStore {
    state: Mutex<MockTags>,
}

impl MockTagStore {
    /// Create a new empty mock tag store
    pub fn new() -> Self {
        MockTagStore {
            state: Mutex::new(MockTags {
                head: "0000000000000000000000000000000000000001".to_string(),
                ..MockTags::default()
            }),
        }
    }

    /// Add a tag pointing to a commit
    pub fn add_tag(&self, name: impl Into<String>, commit: impl Into<String>) {
        self.state().tags.push(ReleaseTag::new(name, commit));
    }

    /// Set the commit HEAD resolves to
    pub fn set_head(&self, commit: impl Into<String>) {
        self.state().head = commit.into();
    }

    /// Make the next `times` calls of `operation` fail with a network error
    pub fn fail_next(&self, operation: &'static str, times: usize) {
        self.state().script.fail_next(operation, times);
    }

    /// Number of calls made to `operation`
    pub fn calls(&self, operation: &str) -> usize {
        self.state().script.calls(operation)
    }

    /// Names of the tags currently stored
    pub fn tag_names(&self) -> Vec<String> {
        self.state().tags.iter().map(|t| t.name.clone()).collect()
    }

    fn state(&self) -> MutexGuard<'_, MockTags> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn enter(&self, operation: &'static str) -> Result<MutexGuard<'_, MockTags>> {
        let mut state = self.state();
        state.script.record(Backend::TagStore, operation)?;
        Ok(state)
    }
}

impl Default for MockTagStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TagStore for MockTagStore {
    fn head_commit(&self) -> Result<String> {
        Ok(self.enter("head_commit")?.head.clone())
    }

    fn create_tag(&self, name: &str, commit: &str) -> Result<()> {
        let mut state = self.enter("create_tag")?;
        if state.tags.iter().any(|t| t.name == name) {
            return Err(VoyagerError::conflict(Backend::TagStore, name));
        }
        state.tags.push(ReleaseTag::new(name, commit));
        Ok(())
    }

    fn delete_tag(&self, name: &str) -> Result<()> {
        let mut state = self.enter("delete_tag")?;
        let before = state.tags.len();
        state.tags.retain(|t| t.name != name);
        if state.tags.len() == before {
            return Err(VoyagerError::not_found(Backend::TagStore, name));
        }
        Ok(())
    }

    fn list_tags(&self) -> Result<Vec<ReleaseTag>> {
        Ok(self.enter("list_tags")?.tags.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_tag_store_create_and_list() {
        let store = MockTagStore::new();
        store.create_tag("v1.0.0", "abc").unwrap();

        let tags = store.list_tags().unwrap();
        assert_eq!(tags, vec![ReleaseTag::new("v1.0.0", "abc")]);
        assert_eq!(store.resolve_tag("v1.0.0").unwrap(), Some("abc".to_string()));
        assert_eq!(store.resolve_tag("v2.0.0").unwrap(), None);
    }

    #[test]
    fn test_mock_tag_store_conflict() {
        let store = MockTagStore::new();
        store.add_tag("v1.0.0", "abc");
        let err = store.create_tag("v1.0.0", "def").unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn test_mock_tag_store_delete_missing() {
        let store = MockTagStore::new();
        assert!(store.delete_tag("v1.0.0").unwrap_err().is_not_found());
        assert_eq!(store.calls("delete_tag"), 1);
    }

    #[test]
    fn test_mock_tag_store_scripted_failure() {
        let store = MockTagStore::new();
        store.fail_next("create_tag", 1);
        assert!(matches!(
            store.create_tag("v1.0.0", "abc"),
            Err(VoyagerError::Network { .. })
        ));
        assert!(store.create_tag("v1.0.0", "abc").is_ok());
        assert_eq!(store.calls("create_tag"), 2);
    }

    #[test]
    fn test_mock_tag_store_default() {
        let store = MockTagStore::default();
        assert!(store.list_tags().unwrap().is_empty());
    }
}
