//! Repository scaffolding for `voyager init`

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{ConcourseConfig, Config, RepositoryConfig, CONFIG_FILE};
use crate::error::{Result, VoyagerError};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitOptions {
    pub owner: String,
    pub name: String,
    pub concourse_url: Option<String>,
    pub concourse_team: Option<String>,
    pub pipeline: Option<String>,
    /// Branch the generated pipeline builds from
    pub branch: Option<String>,
    /// Overwrite existing files without asking
    pub force: bool,
}

impl InitOptions {
    fn concourse(&self) -> Option<(&str, &str)> {
        match (&self.concourse_url, &self.concourse_team) {
            (Some(url), Some(team)) => Some((url.as_str(), team.as_str())),
            _ => None,
        }
    }

    fn pipeline_name(&self) -> String {
        self.pipeline
            .clone()
            .unwrap_or_else(|| ConcourseConfig::default().pipeline)
    }

    fn branch_name(&self) -> String {
        self.branch
            .clone()
            .unwrap_or_else(|| RepositoryConfig::default().default_branch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Created,
    Overwritten,
    Skipped,
}

#[derive(Debug, Default)]
pub struct InitReport {
    pub files: Vec<(PathBuf, FileAction)>,
    pub gitignore_updated: bool,
}

impl InitReport {
    pub fn action(&self, relative: &str) -> Option<FileAction> {
        self.files
            .iter()
            .find(|(path, _)| path.ends_with(relative))
            .map(|(_, action)| *action)
    }
}

/// Write the voyager files under `root`.
///
/// Existing files are replaced only with `force` or when `confirm` agrees.
/// Concourse files are written only when both URL and team are given.
pub fn scaffold<F>(root: &Path, options: &InitOptions, mut confirm: F) -> Result<InitReport>
where
    F: FnMut(&Path) -> bool,
{
    let mut report = InitReport::default();
    let mut write = |relative: &str, content: String, executable: bool| -> Result<()> {
        let path = root.join(relative);
        let existed = path.exists();
        if existed && !options.force && !confirm(&path) {
            report.files.push((path, FileAction::Skipped));
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        if executable {
            make_executable(&path)?;
        }
        let action = if existed {
            FileAction::Overwritten
        } else {
            FileAction::Created
        };
        report.files.push((path, action));
        Ok(())
    };

    write(".github/workflows/voyager.yml", github_workflow(), false)?;
    if let Some((url, team)) = options.concourse() {
        write(
            "ci/pipeline.yml",
            concourse_pipeline(&options.owner, &options.name, &options.branch_name()),
            false,
        )?;
        write(
            "ci/set-pipeline.sh",
            set_pipeline_script(url, team, &options.pipeline_name(), options),
            true,
        )?;
    }
    write(".env.example", env_example(options.concourse().is_some()), false)?;
    write(CONFIG_FILE, voyager_config(options)?, false)?;

    report.gitignore_updated = ignore_env_file(&root.join(".gitignore"))?;
    Ok(report)
}

/// Append `.env` to an existing `.gitignore` that lacks it
fn ignore_env_file(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    let content = fs::read_to_string(path)?;
    if content.lines().any(|line| line.trim() == ".env") {
        return Ok(false);
    }
    let separator = if content.is_empty() || content.ends_with('\n') {
        ""
    } else {
        "\n"
    };
    fs::write(
        path,
        format!("{}{}\n# Environment variables\n.env\n", content, separator),
    )?;
    Ok(true)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

fn voyager_config(options: &InitOptions) -> Result<String> {
    let concourse = options.concourse().map(|(url, team)| ConcourseConfig {
        url: Some(url.to_string()),
        team: Some(team.to_string()),
        pipeline: options.pipeline_name(),
        ..ConcourseConfig::default()
    });
    let config = Config {
        repository: RepositoryConfig {
            owner: Some(options.owner.clone()),
            name: Some(options.name.clone()),
            default_branch: options.branch_name(),
            ..RepositoryConfig::default()
        },
        concourse,
        ..Config::default()
    };
    toml::to_string_pretty(&config)
        .map_err(|e| VoyagerError::config(format!("Cannot render {}: {}", CONFIG_FILE, e)))
}

fn github_workflow() -> String {
    r#"name: Voyager Release Workflow

on:
  push:
    tags:
      - 'v*'

jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
        with:
          fetch-depth: 0
      - uses: dtolnay/rust-toolchain@stable
      - name: Build
        run: cargo build --release
      - name: Test
        run: cargo test --release
"#
    .to_string()
}

fn concourse_pipeline(owner: &str, name: &str, branch: &str) -> String {
    format!(
        r#"resource_types:
  - name: github-release
    type: registry-image
    source:
      repository: concourse/github-release-resource
      tag: latest

resources:
  - name: source-code
    type: git
    source:
      uri: https://github.com/{owner}/{name}.git
      branch: {branch}
  - name: github-release
    type: github-release
    source:
      owner: {owner}
      repository: {name}
      access_token: ((github_token))

jobs:
  - name: build-and-release
    plan:
      - get: source-code
        trigger: false
      - task: build
        config:
          platform: linux
          image_resource:
            type: registry-image
            source: {{repository: rust, tag: latest}}
          inputs:
            - name: source-code
          outputs:
            - name: built-release
          params:
            VERSION: ((version))
            BODY: ((body))
          run:
            path: sh
            args:
              - -exc
              - |
                cd source-code
                echo "Building version ${{VERSION}}"
                cargo build --release
                tar czf ../built-release/{name}-${{VERSION}}.tar.gz -C target/release .
      - put: github-release
        params:
          name: v((version))
          tag: v((version))
          globs: ["built-release/*.tar.gz"]

  - name: rollback
    plan:
      - get: source-code
        passed: [build-and-release]
      - task: prepare-rollback
        config:
          platform: linux
          image_resource:
            type: registry-image
            source: {{repository: alpine, tag: latest}}
          inputs:
            - name: source-code
          outputs:
            - name: rollback-info
          params:
            VERSION: ((version))
            IS_ROLLBACK: ((is_rollback))
          run:
            path: sh
            args:
              - -exc
              - |
                if [ "${{IS_ROLLBACK}}" = "true" ]; then
                  echo "Executing rollback to version ${{VERSION}}"
                  echo "${{VERSION}}" > rollback-info/rollback-version.txt
                else
                  echo "Not a rollback operation, skipping"
                fi
"#
    )
}

fn set_pipeline_script(url: &str, team: &str, pipeline: &str, options: &InitOptions) -> String {
    format!(
        r#"#!/bin/bash
# Set the Concourse pipeline for {owner}/{name}
set -euo pipefail

if [ -z "${{GITHUB_TOKEN:-}}" ]; then
    echo "Error: GITHUB_TOKEN environment variable is not set"
    exit 1
fi

CONCOURSE_URL="{url}"
TEAM="{team}"
PIPELINE="{pipeline}"

fly -t "$TEAM" login -c "$CONCOURSE_URL" -n "$TEAM"
fly -t "$TEAM" set-pipeline -p "$PIPELINE" -c ci/pipeline.yml \
   -v github_token="$GITHUB_TOKEN" \
   -v version="0.1.0" \
   -v body="" \
   -v is_rollback="false"
"#,
        owner = options.owner,
        name = options.name,
    )
}

fn env_example(include_concourse: bool) -> String {
    let mut content =
        String::from("# GitHub API token with 'repo' scope\nGITHUB_TOKEN=your_github_token\n");
    if include_concourse {
        content.push_str("\n# Concourse CI token\nCONCOURSE_TOKEN=your_concourse_token\n");
    }
    content
}
