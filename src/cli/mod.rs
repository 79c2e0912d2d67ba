//! Command layer: argument-level workflows, prompts and output

pub mod init;
pub mod orchestration;

pub use orchestration::{
    report_error, run_delete, run_init, run_list, run_pipelines, run_release, run_rollback,
    DeleteArgs, InitArgs, Prompter, ReleaseArgs, RollbackArgs, TerminalPrompter, Workspace,
};
