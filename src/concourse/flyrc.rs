//! Targets saved by `fly login` in `~/.flyrc`

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, VoyagerError};

#[derive(Debug, Default, Deserialize)]
pub struct FlyRc {
    #[serde(default)]
    pub targets: HashMap<String, FlyTarget>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlyTarget {
    #[serde(default)]
    pub api: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub token: Option<FlyToken>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlyToken {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

impl FlyTarget {
    pub fn token_value(&self) -> Option<&str> {
        self.token.as_ref().and_then(|t| t.value.as_deref())
    }
}

impl FlyRc {
    pub fn parse(content: &str) -> Result<Self> {
        // an empty file deserializes to unit
        if content.trim().is_empty() {
            return Ok(FlyRc::default());
        }
        serde_yaml::from_str(content)
            .map_err(|e| VoyagerError::config(format!("Cannot parse flyrc: {}", e)))
    }

    /// Read a flyrc file; `None` when it does not exist
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        Self::parse(&content).map(Some)
    }

    pub fn target(&self, name: &str) -> Option<&FlyTarget> {
        self.targets.get(name)
    }
}

/// `~/.flyrc`
pub fn default_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".flyrc"))
}
