use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::boundary::BoundaryWarning;
use crate::concourse::flyrc::FlyRc;
use crate::concourse::ConcourseTarget;
use crate::domain::VersionBump;
use crate::error::{Result, VoyagerError};

pub const CONFIG_FILE: &str = "voyager.toml";
pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";
pub const CONCOURSE_TOKEN_VAR: &str = "CONCOURSE_TOKEN";

/// Represents the complete configuration for voyager.
///
/// Credentials are never part of it; see [Credentials].
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub repository: RepositoryConfig,

    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concourse: Option<ConcourseConfig>,

    #[serde(default)]
    pub versioning: VersioningConfig,
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_pipeline() -> String {
    "release-pipeline".to_string()
}

fn default_release_job() -> String {
    "build-and-release".to_string()
}

fn default_rollback_job() -> String {
    "rollback".to_string()
}

/// Which repository is released and where its tags live.
///
/// `owner` and `name` fall back to the remote URL when unset.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RepositoryConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default = "default_remote")]
    pub remote: String,

    #[serde(default = "default_branch")]
    pub default_branch: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        RepositoryConfig {
            owner: None,
            name: None,
            remote: default_remote(),
            default_branch: default_branch(),
        }
    }
}

/// Release-record store settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GitHubConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_true")]
    pub verify_ssl: bool,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        GitHubConfig {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            verify_ssl: true,
        }
    }
}

/// Pipeline settings.
///
/// `url` and `team` may be left out when `target` names a `fly` target.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConcourseConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    #[serde(default = "default_pipeline")]
    pub pipeline: String,

    #[serde(default = "default_release_job")]
    pub release_job: String,

    #[serde(default = "default_rollback_job")]
    pub rollback_job: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ConcourseConfig {
    fn default() -> Self {
        ConcourseConfig {
            url: None,
            team: None,
            target: None,
            pipeline: default_pipeline(),
            release_job: default_release_job(),
            rollback_job: default_rollback_job(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct VersioningConfig {
    #[serde(default)]
    pub default_bump: VersionBump,
}

/// Command-line overrides for the `[concourse]` section
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConcourseOverrides {
    pub url: Option<String>,
    pub team: Option<String>,
    pub target: Option<String>,
    pub pipeline: Option<String>,
}

impl Config {
    /// Apply command-line overrides, creating the `[concourse]` section
    /// when any is given
    pub fn with_concourse_overrides(mut self, overrides: &ConcourseOverrides) -> Self {
        let any = overrides.url.is_some()
            || overrides.team.is_some()
            || overrides.target.is_some()
            || overrides.pipeline.is_some();
        if !any {
            return self;
        }

        let mut concourse = self.concourse.take().unwrap_or_default();
        if let Some(url) = &overrides.url {
            concourse.url = Some(url.clone());
        }
        if let Some(team) = &overrides.team {
            concourse.team = Some(team.clone());
        }
        if let Some(target) = &overrides.target {
            concourse.target = Some(target.clone());
        }
        if let Some(pipeline) = &overrides.pipeline {
            concourse.pipeline = pipeline.clone();
        }
        self.concourse = Some(concourse);
        self
    }

    /// Owner and name of the repository, from the config or the remote URL
    pub fn repository_slug(&self, remote_url: Option<&str>) -> Result<(String, String)> {
        let inferred = remote_url.and_then(parse_remote_url);
        let owner = self
            .repository
            .owner
            .clone()
            .or_else(|| inferred.as_ref().map(|(owner, _)| owner.clone()));
        let name = self
            .repository
            .name
            .clone()
            .or_else(|| inferred.as_ref().map(|(_, name)| name.clone()));

        match (owner, name) {
            (Some(owner), Some(name)) => Ok((owner, name)),
            _ => Err(VoyagerError::config(format!(
                "Cannot determine repository owner/name; set [repository] owner and name in {} \
                 or add a GitHub '{}' remote",
                CONFIG_FILE, self.repository.remote
            ))),
        }
    }
}

/// Extract `(owner, name)` from an SSH or HTTPS remote URL
pub fn parse_remote_url(url: &str) -> Option<(String, String)> {
    let re = regex::Regex::new(r"[:/]([^/:]+)/([^/]+?)(?:\.git)?/?$").ok()?;
    let caps = re.captures(url.trim())?;
    Some((caps[1].to_string(), caps[2].to_string()))
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `voyager.toml` in current directory
/// 3. `voyager/voyager.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If a file exists but cannot be read or parsed, or a custom path
///   does not exist
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    if let Some(path) = config_path {
        return parse_file(Path::new(path));
    }

    let local = Path::new(".").join(CONFIG_FILE);
    if local.exists() {
        return parse_file(&local);
    }

    if let Some(config_dir) = dirs::config_dir() {
        let user = config_dir.join("voyager").join(CONFIG_FILE);
        if user.exists() {
            return parse_file(&user);
        }
    }

    Ok(Config::default())
}

fn parse_file(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| {
        VoyagerError::config(format!("Cannot read {}: {}", path.display(), e))
    })?;
    toml::from_str(&content)
        .map_err(|e| VoyagerError::config(format!("Invalid {}: {}", path.display(), e)))
}

/// Tokens for the release-record store and the pipeline.
///
/// Read once at start-up and handed to the adapters that need them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub github_token: Option<String>,
    pub concourse_token: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Credentials {
            github_token: read(GITHUB_TOKEN_VAR),
            concourse_token: read(CONCOURSE_TOKEN_VAR),
        }
    }

    pub fn github_token(&self) -> Result<&str> {
        self.github_token.as_deref().ok_or_else(|| {
            VoyagerError::config(format!(
                "GitHub token not found. Please set the {} environment variable",
                GITHUB_TOKEN_VAR
            ))
        })
    }

    /// Resolve the Concourse endpoint, team and token.
    ///
    /// Values from the config win; gaps are filled from the `fly` target named
    /// in the config. The environment token wins over the one saved by `fly`.
    pub fn concourse_target(
        &self,
        config: &ConcourseConfig,
        flyrc: Option<&FlyRc>,
    ) -> Result<ConcourseTarget> {
        let saved = match (&config.target, flyrc) {
            (Some(name), Some(rc)) => rc.target(name).cloned(),
            _ => None,
        };
        let saved = saved.unwrap_or_default();

        let url = config.url.clone().or(saved.api.clone()).ok_or_else(|| {
            VoyagerError::config(
                "Concourse API URL not found. Set [concourse] url, pass --concourse-url \
                 or point --concourse-target at a target in ~/.flyrc",
            )
        })?;
        let team = config.team.clone().or(saved.team.clone()).ok_or_else(|| {
            VoyagerError::config(
                "Concourse team not found. Set [concourse] team, pass --concourse-team \
                 or point --concourse-target at a target in ~/.flyrc",
            )
        })?;
        let token = self
            .concourse_token
            .clone()
            .or_else(|| saved.token_value().map(str::to_string))
            .ok_or_else(|| {
                VoyagerError::config(format!(
                    "Concourse token not found. Set {} or log in with `fly -t <target> login`",
                    CONCOURSE_TOKEN_VAR
                ))
            })?;

        Ok(ConcourseTarget { url, team, token })
    }

    /// One warning per token that is not set
    pub fn warnings(&self) -> Vec<BoundaryWarning> {
        let mut warnings = Vec::new();
        if self.github_token.is_none() {
            warnings.push(BoundaryWarning::MissingCredential {
                variable: GITHUB_TOKEN_VAR.to_string(),
            });
        }
        if self.concourse_token.is_none() {
            warnings.push(BoundaryWarning::MissingCredential {
                variable: CONCOURSE_TOKEN_VAR.to_string(),
            });
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remote_url() {
        let expected = Some(("acme".to_string(), "rocket".to_string()));
        assert_eq!(parse_remote_url("git@github.com:acme/rocket.git"), expected);
        assert_eq!(parse_remote_url("https://github.com/acme/rocket"), expected);
        assert_eq!(parse_remote_url("https://github.com/acme/rocket.git/"), expected);
        assert_eq!(
            parse_remote_url("ssh://git@ghe.example.com/acme/rocket.git"),
            expected
        );
        assert_eq!(parse_remote_url("rocket"), None);
    }

    #[test]
    fn test_repository_slug_prefers_config() {
        let mut config = Config::default();
        config.repository.owner = Some("team".to_string());

        let slug = config
            .repository_slug(Some("git@github.com:acme/rocket.git"))
            .unwrap();
        assert_eq!(slug, ("team".to_string(), "rocket".to_string()));
        assert!(Config::default().repository_slug(None).is_err());
    }

    #[test]
    fn test_concourse_overrides() {
        let overrides = ConcourseOverrides {
            url: Some("https://ci.example.com".to_string()),
            pipeline: Some("app".to_string()),
            ..ConcourseOverrides::default()
        };
        let config = Config::default().with_concourse_overrides(&overrides);
        let concourse = config.concourse.unwrap();
        assert_eq!(concourse.url.as_deref(), Some("https://ci.example.com"));
        assert_eq!(concourse.pipeline, "app");
        assert_eq!(concourse.release_job, "build-and-release");

        let untouched = Config::default().with_concourse_overrides(&ConcourseOverrides::default());
        assert!(untouched.concourse.is_none());
    }

    #[test]
    fn test_concourse_target_from_flyrc() {
        let rc = FlyRc::parse(
            "targets:\n  ci:\n    api: https://ci.example.com\n    team: main\n    token:\n      type: bearer\n      value: saved\n",
        )
        .unwrap();
        let config = ConcourseConfig {
            target: Some("ci".to_string()),
            ..ConcourseConfig::default()
        };

        let target = Credentials::default()
            .concourse_target(&config, Some(&rc))
            .unwrap();
        assert_eq!(target.url, "https://ci.example.com");
        assert_eq!(target.token, "saved");

        let creds = Credentials {
            concourse_token: Some("env".to_string()),
            ..Credentials::default()
        };
        assert_eq!(creds.concourse_target(&config, Some(&rc)).unwrap().token, "env");
    }

    #[test]
    fn test_concourse_target_missing_team() {
        let config = ConcourseConfig {
            url: Some("https://ci.example.com".to_string()),
            ..ConcourseConfig::default()
        };
        let creds = Credentials {
            concourse_token: Some("t".to_string()),
            ..Credentials::default()
        };
        let err = creds.concourse_target(&config, None).unwrap_err();
        assert!(err.to_string().contains("team"));
    }

    #[test]
    fn test_credential_warnings() {
        let creds = Credentials {
            github_token: Some("t".to_string()),
            concourse_token: None,
        };
        assert_eq!(
            creds.warnings(),
            vec![BoundaryWarning::MissingCredential {
                variable: CONCOURSE_TOKEN_VAR.to_string()
            }]
        );
        assert!(Credentials::default().github_token().is_err());
    }
}
