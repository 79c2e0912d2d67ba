use std::fmt;

use crate::domain::Version;

/// Non-fatal conditions found while reading release state.
/// These are reported to the user but never abort an operation.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// Several tags parse to the same version (e.g. `v1.2.0` and `V1.2.0`)
    DuplicateVersion { version: Version, tags: Vec<String> },
    /// A credential the backends need is not set in the environment
    MissingCredential { variable: String },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::DuplicateVersion { version, tags } => {
                write!(
                    f,
                    "Tags {} all resolve to version {}; treating them as one release",
                    tags.join(", "),
                    version
                )
            }
            BoundaryWarning::MissingCredential { variable } => {
                write!(
                    f,
                    "{} environment variable is not set; commands that need it will fail",
                    variable
                )
            }
        }
    }
}
