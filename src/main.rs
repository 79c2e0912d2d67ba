use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use voyager::cli::{self, DeleteArgs, InitArgs, ReleaseArgs, RollbackArgs, Workspace};
use voyager::config::ConcourseOverrides;
use voyager::domain::VersionBump;
use voyager::telemetry;
use voyager::ui::OutputFormat;

#[derive(Parser)]
#[command(
    name = "voyager",
    version,
    about = "Create, roll back and delete releases across git tags, GitHub releases and Concourse"
)]
struct Cli {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(short, long, global = true, conflicts_with = "verbose", help = "Only print errors")]
    quiet: bool,

    #[arg(short, long, global = true, help = "Show progress logs")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Default)]
struct ConcourseFlags {
    #[arg(long, help = "Concourse API URL")]
    concourse_url: Option<String>,

    #[arg(long, help = "Concourse team name")]
    concourse_team: Option<String>,

    #[arg(long, help = "Target in ~/.flyrc to take URL, team and token from")]
    concourse_target: Option<String>,

    #[arg(long, help = "Concourse pipeline name")]
    pipeline: Option<String>,
}

impl ConcourseFlags {
    fn overrides(&self) -> ConcourseOverrides {
        ConcourseOverrides {
            url: self.concourse_url.clone(),
            team: self.concourse_team.clone(),
            target: self.concourse_target.clone(),
            pipeline: self.pipeline.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Scaffold voyager configuration and CI files in this repository
    Init {
        #[arg(long, help = "Concourse API URL")]
        concourse_url: Option<String>,

        #[arg(long, help = "Concourse team name")]
        concourse_team: Option<String>,

        #[arg(long, help = "Concourse pipeline name")]
        pipeline: Option<String>,

        #[arg(short, long, help = "Overwrite existing files without asking")]
        force: bool,
    },

    /// Tag HEAD with the next version, publish a release and trigger the pipeline
    Release {
        #[arg(short = 't', long = "type", help = "Version component to bump [major|minor|patch]")]
        bump: Option<VersionBump>,

        #[arg(short, long, help = "Release message (default: \"Release <version>\")")]
        message: Option<String>,

        #[arg(long, help = "Show the release plan without writing anything")]
        dry_run: bool,

        #[command(flatten)]
        concourse: ConcourseFlags,
    },

    /// List releases, newest version first
    List {
        #[arg(short = 'n', long, default_value_t = 10, allow_negative_numbers = true)]
        limit: i64,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },

    /// Ask the pipeline to rebuild an earlier release
    Rollback {
        #[arg(short, long, help = "Release tag to roll back to")]
        tag: Option<String>,

        #[arg(long, help = "Validate the target without triggering a build")]
        dry_run: bool,

        #[arg(short = 'y', long, help = "Skip the confirmation prompt")]
        yes: bool,

        #[command(flatten)]
        concourse: ConcourseFlags,
    },

    /// Delete a release record and its tag
    Delete {
        #[arg(short, long, help = "Release tag to delete")]
        tag: Option<String>,

        #[arg(short, long, help = "Skip the confirmation prompt")]
        force: bool,
    },

    /// Show recent pipeline builds
    Pipelines {
        #[arg(short = 'n', long, default_value_t = 5, allow_negative_numbers = true)]
        limit: i64,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,

        #[command(flatten)]
        concourse: ConcourseFlags,
    },
}

fn main() {
    let cli = Cli::parse();
    telemetry::init_tracing(telemetry::level_for(cli.quiet, cli.verbose));

    if let Err(err) = run(cli) {
        cli::report_error(&err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let overrides = match &cli.command {
        Command::Release { concourse, .. }
        | Command::Rollback { concourse, .. }
        | Command::Pipelines { concourse, .. } => concourse.overrides(),
        Command::Init {
            concourse_url,
            concourse_team,
            pipeline,
            ..
        } => ConcourseOverrides {
            url: concourse_url.clone(),
            team: concourse_team.clone(),
            pipeline: pipeline.clone(),
            ..ConcourseOverrides::default()
        },
        _ => ConcourseOverrides::default(),
    };
    let workspace = Workspace::load(cli.config.as_deref(), &overrides)?;

    match cli.command {
        Command::Init {
            concourse_url,
            concourse_team,
            pipeline,
            force,
        } => cli::run_init(
            &workspace,
            &InitArgs {
                concourse_url,
                concourse_team,
                pipeline,
                force,
            },
        ),
        Command::Release {
            bump,
            message,
            dry_run,
            ..
        } => cli::run_release(
            &workspace,
            &ReleaseArgs {
                bump: bump.unwrap_or(workspace.config.versioning.default_bump),
                message,
                dry_run,
            },
        ),
        Command::List { limit, output } => cli::run_list(&workspace, limit, output),
        Command::Rollback {
            tag, dry_run, yes, ..
        } => cli::run_rollback(&workspace, &RollbackArgs { tag, dry_run, yes }),
        Command::Delete { tag, force } => cli::run_delete(&workspace, &DeleteArgs { tag, force }),
        Command::Pipelines { limit, output, .. } => cli::run_pipelines(&workspace, limit, output),
    }
}
