use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Version;

/// Hosted release object associated with a tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseRecord {
    pub tag: String,
    pub commit: String,
    pub title: String,
    pub body: String,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl ReleaseRecord {
    pub fn new(
        tag: impl Into<String>,
        commit: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        ReleaseRecord {
            tag: tag.into(),
            commit: commit.into(),
            title: title.into(),
            body: body.into(),
            created_at: None,
            url: None,
            author: None,
        }
    }

    pub fn version(&self) -> Option<Version> {
        Version::parse(&self.tag).ok()
    }
}

/// Parameters handed to the CI system when requesting a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineTrigger {
    pub version: String,
    pub body: String,
    pub is_rollback: bool,
}

impl PipelineTrigger {
    pub fn release(version: &Version, body: impl Into<String>) -> Self {
        PipelineTrigger {
            version: version.to_string(),
            body: body.into(),
            is_rollback: false,
        }
    }

    pub fn rollback(version: &Version) -> Self {
        PipelineTrigger {
            version: version.to_string(),
            body: String::new(),
            is_rollback: true,
        }
    }
}

/// Receipt returned by the CI system for an accepted trigger
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Acknowledgement {
    pub build_id: Option<u64>,
    pub build_name: Option<String>,
    pub url: Option<String>,
}

/// Observed presence of a release across the three backends.
///
/// Derived for a single operation and never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReleaseState {
    pub tag_exists: bool,
    pub release_record_exists: bool,
    pub pipeline_triggered: bool,
}

impl ReleaseState {
    pub fn is_consistent(&self) -> bool {
        self.tag_exists == self.release_record_exists
            && (self.pipeline_triggered || !self.tag_exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_constructors() {
        let v = Version::new(1, 2, 0);
        let release = PipelineTrigger::release(&v, "notes");
        assert_eq!(release.version, "1.2.0");
        assert!(!release.is_rollback);

        let rollback = PipelineTrigger::rollback(&v);
        assert_eq!(rollback.body, "");
        assert!(rollback.is_rollback);
    }

    #[test]
    fn test_release_state_consistency() {
        let full = ReleaseState {
            tag_exists: true,
            release_record_exists: true,
            pipeline_triggered: true,
        };
        assert!(full.is_consistent());
        assert!(ReleaseState::default().is_consistent());

        let tag_only = ReleaseState {
            tag_exists: true,
            ..ReleaseState::default()
        };
        assert!(!tag_only.is_consistent());
    }

    #[test]
    fn test_record_version() {
        let record = ReleaseRecord::new("v3.1.4", "abc", "v3.1.4", "");
        assert_eq!(record.version(), Some(Version::new(3, 1, 4)));
        assert_eq!(ReleaseRecord::new("latest", "abc", "", "").version(), None);
    }
}
