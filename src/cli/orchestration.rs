//! Command workflows
//!
//! Each `run_*` function wires the live backends from a [Workspace] and hands
//! them to a generic workflow. The generic workflows take any backends and a
//! [Prompter], so they can be driven without a terminal.

use std::path::Path;

use anyhow::Result;

use crate::cli::init::{self, FileAction, InitOptions};
use crate::concourse::flyrc::{self, FlyRc};
use crate::concourse::{ConcourseClient, Pipeline, Unconfigured};
use crate::config::{load_config, ConcourseOverrides, Config, Credentials};
use crate::coordinator::{
    validate_limit, DeleteCoordinator, DeleteOutcome, ReleaseCoordinator, ReleaseHistory,
    ReleaseOutcome, RollbackCoordinator, RollbackOutcome,
};
use crate::domain::{ReleaseRecord, Version, VersionBump};
use crate::error::VoyagerError;
use crate::git::{Git2TagStore, TagStore};
use crate::github::{GitHubClient, RecordStore};
use crate::repository::ReleaseRepository;
use crate::ui::{self, OutputFormat};

/// How many releases interactive selection offers
const SELECTION_LIMIT: usize = 20;

/// Interactive decisions the command layer may need
pub trait Prompter {
    /// Pick one of `releases`, returning its tag
    fn select(&mut self, releases: &[ReleaseRecord], action: &str) -> Result<String>;

    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// Prompts on the terminal; refuses to guess when there is none
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn select(&mut self, releases: &[ReleaseRecord], action: &str) -> Result<String> {
        if !ui::is_interactive() {
            return Err(VoyagerError::validation(format!(
                "no tag given to {}; pass -t/--tag",
                action
            ))
            .into());
        }
        ui::select_release(releases, action)
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        if !ui::is_interactive() {
            return Err(VoyagerError::validation(format!(
                "cannot ask \"{}\" without a terminal; pass the confirmation flag",
                prompt
            ))
            .into());
        }
        ui::confirm_action(prompt)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseArgs {
    pub bump: VersionBump,
    pub message: Option<String>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RollbackArgs {
    pub tag: Option<String>,
    pub dry_run: bool,
    /// Skip the confirmation prompt
    pub yes: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeleteArgs {
    pub tag: Option<String>,
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InitArgs {
    pub concourse_url: Option<String>,
    pub concourse_team: Option<String>,
    pub pipeline: Option<String>,
    pub force: bool,
}

/// Release message used when none is given
pub fn default_message(version: &Version) -> String {
    format!("Release {}", version)
}

/// Configuration and credentials for one invocation
pub struct Workspace {
    pub config: Config,
    pub credentials: Credentials,
}

impl Workspace {
    pub fn load(config_path: Option<&str>, overrides: &ConcourseOverrides) -> Result<Self> {
        let config = load_config(config_path)?.with_concourse_overrides(overrides);
        Ok(Workspace {
            config,
            credentials: Credentials::from_env(),
        })
    }

    pub fn tag_store(&self) -> Result<Git2TagStore> {
        Ok(Git2TagStore::open(".", self.config.repository.remote.clone())?)
    }

    pub fn record_store(&self, tags: &Git2TagStore) -> Result<GitHubClient> {
        let remote_url = tags.remote_url().ok().flatten();
        let (owner, name) = self.config.repository_slug(remote_url.as_deref())?;
        let token = self.credentials.github_token()?;
        Ok(GitHubClient::new(&self.config.github, &owner, &name, token)?)
    }

    pub fn concourse(&self) -> Result<ConcourseClient> {
        let config = self.config.concourse.as_ref().ok_or_else(|| {
            VoyagerError::config(
                "Concourse is not configured; add a [concourse] section to voyager.toml \
                 or pass --concourse-url and --concourse-team",
            )
        })?;
        let saved = match flyrc::default_path() {
            Some(path) => FlyRc::load(&path)?,
            None => None,
        };
        let target = self.credentials.concourse_target(config, saved.as_ref())?;
        Ok(ConcourseClient::new(target, config)?)
    }

    fn repository(&self) -> Result<ReleaseRepository<Git2TagStore, GitHubClient, ConcourseClient>> {
        let tags = self.tag_store()?;
        let records = self.record_store(&tags)?;
        let pipeline = self.concourse()?;
        Ok(ReleaseRepository::new(tags, records, pipeline))
    }

    fn repository_without_pipeline(
        &self,
    ) -> Result<ReleaseRepository<Git2TagStore, GitHubClient, Unconfigured>> {
        let tags = self.tag_store()?;
        let records = self.record_store(&tags)?;
        Ok(ReleaseRepository::new(tags, records, Unconfigured))
    }
}

pub fn run_release(workspace: &Workspace, args: &ReleaseArgs) -> Result<()> {
    let repo = workspace.repository()?;
    release(&repo, args)?;
    Ok(())
}

pub fn run_list(workspace: &Workspace, limit: i64, format: OutputFormat) -> Result<()> {
    let tags = workspace.tag_store()?;
    let records = workspace.record_store(&tags)?;
    list(&records, limit, format)?;
    Ok(())
}

pub fn run_rollback(workspace: &Workspace, args: &RollbackArgs) -> Result<()> {
    let repo = workspace.repository()?;
    rollback(&repo, args, &mut TerminalPrompter)?;
    Ok(())
}

pub fn run_delete(workspace: &Workspace, args: &DeleteArgs) -> Result<()> {
    let repo = workspace.repository_without_pipeline()?;
    delete(&repo, args, &mut TerminalPrompter)?;
    Ok(())
}

pub fn run_pipelines(workspace: &Workspace, limit: i64, format: OutputFormat) -> Result<()> {
    let limit = validate_limit(limit)?;
    let client = workspace.concourse()?;
    let builds = client.builds(limit)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&builds)?),
        OutputFormat::Table if builds.is_empty() => {
            ui::display_status(&format!("No builds found for {}", client.pipeline_name()))
        }
        OutputFormat::Table => println!("{}", ui::build_table(&builds)),
    }
    Ok(())
}

pub fn run_init(workspace: &Workspace, args: &InitArgs) -> Result<()> {
    let tags = workspace.tag_store()?;
    let remote_url = tags.remote_url().ok().flatten();
    let (owner, name) = workspace.config.repository_slug(remote_url.as_deref())?;
    ui::display_status(&format!("Initializing voyager for {}/{}", owner, name));

    let options = InitOptions {
        owner,
        name,
        concourse_url: args.concourse_url.clone(),
        concourse_team: args.concourse_team.clone(),
        pipeline: args.pipeline.clone(),
        branch: Some(workspace.config.repository.default_branch.clone()),
        force: args.force,
    };
    let report = init::scaffold(Path::new("."), &options, |path| {
        ui::is_interactive()
            && ui::confirm_action(&format!("The file {} already exists. Overwrite?", path.display()))
                .unwrap_or(false)
    })?;

    for (path, action) in &report.files {
        match action {
            FileAction::Created => ui::display_success(&format!("Created {}", path.display())),
            FileAction::Overwritten => {
                ui::display_success(&format!("Overwrote {}", path.display()))
            }
            FileAction::Skipped => ui::display_status(&format!("Kept {}", path.display())),
        }
    }
    if report.gitignore_updated {
        ui::display_success("Added .env to .gitignore");
    }
    for warning in workspace.credentials.warnings() {
        ui::display_boundary_warning(&warning);
    }

    println!("\nNext steps:");
    println!("  1. Review the generated files");
    if report.action("ci/set-pipeline.sh").is_some() {
        println!("  2. Set CONCOURSE_TOKEN and run ./ci/set-pipeline.sh");
    }
    println!("  3. Set GITHUB_TOKEN to a token with 'repo' scope");
    println!("  4. Create your first release: voyager release");
    Ok(())
}

/// Plan and, unless dry-running, create a release
pub fn release<T, R, P>(
    repo: &ReleaseRepository<T, R, P>,
    args: &ReleaseArgs,
) -> Result<Option<ReleaseOutcome>>
where
    T: TagStore,
    R: RecordStore,
    P: Pipeline,
{
    let coordinator = ReleaseCoordinator::new(repo);
    let plan = coordinator.plan(args.bump)?;
    for warning in &plan.warnings {
        ui::display_boundary_warning(warning);
    }

    let message = args
        .message
        .clone()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| default_message(&plan.version));
    ui::display_release_plan(&plan, &message);

    if args.dry_run {
        ui::display_status("Dry run: no tag, release record or build was created");
        return Ok(None);
    }

    let outcome = coordinator.execute(plan, &message)?;
    ui::display_release_outcome(&outcome);
    Ok(Some(outcome))
}

/// Print up to `limit` releases, newest version first
pub fn list<R: RecordStore>(
    records: &R,
    limit: i64,
    format: OutputFormat,
) -> Result<Vec<ReleaseRecord>> {
    let limit = validate_limit(limit)?;
    let releases = ReleaseHistory::new(records).list(limit)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&releases)?),
        OutputFormat::Table if releases.is_empty() => ui::display_status("No releases found"),
        OutputFormat::Table => println!("{}", ui::release_table(&releases)),
    }
    Ok(releases)
}

/// A concrete tag: the given one, or one chosen from recent releases
fn resolve_target<R: RecordStore>(
    records: &R,
    tag: Option<&str>,
    prompter: &mut dyn Prompter,
    action: &str,
) -> Result<String> {
    if let Some(tag) = tag {
        return Ok(tag.to_string());
    }
    let releases = ReleaseHistory::new(records).list(SELECTION_LIMIT)?;
    if releases.is_empty() {
        return Err(VoyagerError::validation(format!("no releases available to {}", action)).into());
    }
    prompter.select(&releases, action)
}

/// Validate a rollback target and, once confirmed, trigger the rollback build
pub fn rollback<T, R, P>(
    repo: &ReleaseRepository<T, R, P>,
    args: &RollbackArgs,
    prompter: &mut dyn Prompter,
) -> Result<Option<RollbackOutcome>>
where
    T: TagStore,
    R: RecordStore,
    P: Pipeline,
{
    let target = resolve_target(repo.records(), args.tag.as_deref(), prompter, "roll back to")?;
    let coordinator = RollbackCoordinator::new(repo);
    let plan = coordinator.plan(&target)?;
    ui::display_rollback_plan(&plan);

    if args.dry_run {
        ui::display_status("Dry run: no build was triggered");
        return Ok(None);
    }
    if !args.yes && !prompter.confirm(&format!("Roll back to {}?", plan.tag))? {
        ui::display_status("Rollback cancelled");
        return Ok(None);
    }

    let outcome = coordinator.execute(plan)?;
    ui::display_rollback_outcome(&outcome);
    Ok(Some(outcome))
}

/// Delete a release once confirmed
pub fn delete<T, R, P>(
    repo: &ReleaseRepository<T, R, P>,
    args: &DeleteArgs,
    prompter: &mut dyn Prompter,
) -> Result<Option<DeleteOutcome>>
where
    T: TagStore,
    R: RecordStore,
    P: Pipeline,
{
    let target = resolve_target(repo.records(), args.tag.as_deref(), prompter, "delete")?;
    if !args.force
        && !prompter.confirm(&format!(
            "Delete release {}? This removes the release record and the tag",
            target
        ))?
    {
        ui::display_status("Delete cancelled");
        return Ok(None);
    }

    let outcome = DeleteCoordinator::new(repo).delete(&target)?;
    ui::display_delete_outcome(&outcome);
    Ok(Some(outcome))
}

/// Print an error the way its kind needs: partial failures with their
/// remediation, everything else on one line
pub fn report_error(err: &anyhow::Error) {
    match err.downcast_ref::<VoyagerError>() {
        Some(VoyagerError::PartialFailure(report)) => ui::display_partial_failure(report),
        _ => ui::display_error(&format!("{:#}", err)),
    }
}
