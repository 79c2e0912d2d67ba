use crate::domain::Version;

/// A release tag as recorded in the tag store, bound to one commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTag {
    pub name: String,
    pub commit: String,
}

impl ReleaseTag {
    /// Create a new tag from a name and commit id
    pub fn new(name: impl Into<String>, commit: impl Into<String>) -> Self {
        ReleaseTag {
            name: name.into(),
            commit: commit.into(),
        }
    }

    /// Parsed version of the tag name, `None` for non-release tags
    pub fn version(&self) -> Option<Version> {
        Version::parse(&self.name).ok()
    }

    /// First seven characters of the commit id
    pub fn short_commit(&self) -> &str {
        short_hash(&self.commit)
    }
}

/// Abbreviate a commit id the way `git log --oneline` does
pub fn short_hash(commit: &str) -> &str {
    commit.get(..7).unwrap_or(commit)
}
