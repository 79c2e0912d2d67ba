pub mod boundary;
pub mod cli;
pub mod concourse;
pub mod config;
pub mod coordinator;
pub mod domain;
pub mod error;
pub mod git;
pub mod github;
pub mod repository;
pub mod resolver;
pub mod telemetry;
pub mod ui;

pub use error::{Backend, Result, VoyagerError};
pub use repository::ReleaseRepository;
