use crate::error::{Result, VoyagerError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semantic version triple used to order and increment release tags.
///
/// Ordering is lexicographic over (major, minor, patch); the tag string a
/// version was parsed from never takes part in comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    /// Create a new version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
        }
    }

    /// Seed used when no release exists yet
    pub fn zero() -> Self {
        Version::new(0, 0, 0)
    }

    /// Parse version from a tag string (e.g., "v1.2.3" -> Version(1,2,3))
    ///
    /// A single leading `v`/`V` is accepted. Anything beyond the three
    /// numeric components (pre-release suffixes, build metadata, extra
    /// components) is rejected.
    pub fn parse(tag: &str) -> Result<Self> {
        let clean_tag = tag
            .strip_prefix('v')
            .or_else(|| tag.strip_prefix('V'))
            .unwrap_or(tag);

        let parts: Vec<&str> = clean_tag.split('.').collect();
        if parts.len() != 3 {
            return Err(VoyagerError::validation(format!(
                "Invalid version format: '{}' - expected vX.Y.Z",
                tag
            )));
        }

        let component = |part: &str, name: &str| -> Result<u64> {
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                return Err(VoyagerError::validation(format!(
                    "Invalid {} version in '{}': '{}'",
                    name, tag, part
                )));
            }
            part.parse::<u64>().map_err(|_| {
                VoyagerError::validation(format!("{} version out of range in '{}'", name, tag))
            })
        };

        Ok(Version {
            major: component(parts[0], "major")?,
            minor: component(parts[1], "minor")?,
            patch: component(parts[2], "patch")?,
        })
    }

    /// Bump version according to bump type.
    ///
    /// Fails when the bumped component would overflow, so the result is
    /// always greater than `self`.
    pub fn bump(&self, bump_type: VersionBump) -> Result<Self> {
        let overflow = || {
            VoyagerError::validation(format!(
                "Cannot apply a {} bump to {}: component out of range",
                bump_type, self
            ))
        };
        let bumped = match bump_type {
            VersionBump::Major => {
                Version::new(self.major.checked_add(1).ok_or_else(overflow)?, 0, 0)
            }
            VersionBump::Minor => Version::new(
                self.major,
                self.minor.checked_add(1).ok_or_else(overflow)?,
                0,
            ),
            VersionBump::Patch => Version::new(
                self.major,
                self.minor,
                self.patch.checked_add(1).ok_or_else(overflow)?,
            ),
        };
        Ok(bumped)
    }

    /// Canonical tag name, always `v`-prefixed
    pub fn tag_name(&self) -> String {
        format!("v{}", self)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = VoyagerError;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

/// Which component of a version a release increments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionBump {
    Major,
    Minor,
    #[default]
    Patch,
}

impl FromStr for VersionBump {
    type Err = VoyagerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "major" => Ok(VersionBump::Major),
            "minor" => Ok(VersionBump::Minor),
            "patch" => Ok(VersionBump::Patch),
            other => Err(VoyagerError::validation(format!(
                "Unknown bump kind '{}' - expected major, minor or patch",
                other
            ))),
        }
    }
}

impl fmt::Display for VersionBump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VersionBump::Major => "major",
            VersionBump::Minor => "minor",
            VersionBump::Patch => "patch",
        };
        f.write_str(name)
    }
}
