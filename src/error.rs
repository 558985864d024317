use std::{path::PathBuf, time::Duration};

use thiserror::Error;

/// A query token that names a known field but carries nothing to match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("'{key}:' has an empty value list")]
    EmptyValueList { key: String },
}

/// Failure talking to the GitHub API. Aborts the whole pipeline.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("GitHub API request failed: {0}")]
    Api(#[from] octocrab::Error),

    #[error("GitHub GraphQL query returned errors: {0}")]
    GraphQL(String),

    #[error("GitHub API request timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum TeamLookupError {
    #[error("team '{org}/{team}' not found")]
    NotFound { org: String, team: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("failed to read mapping file '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid mapping file '{}'", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    /// One line per missing setting, in the order they were checked.
    #[error("{}", .0.join("\n"))]
    Missing(Vec<String>),

    #[error("invalid cron expression '{expression}'")]
    InvalidCron {
        expression: String,
        #[source]
        source: cron::error::Error,
    },
}
