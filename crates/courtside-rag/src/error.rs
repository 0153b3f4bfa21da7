use std::path::PathBuf;

/// Errors raised while building the classification engine or loading its
/// configuration. Classification itself never fails.
#[derive(Debug, thiserror::Error)]
pub enum CourtsideError {
    #[error("rule '{name}' in the {set} rule set failed to compile: {source}")]
    InvalidPattern {
        set: String,
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("rule set '{0}' is empty")]
    EmptyRuleSet(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, CourtsideError>;
