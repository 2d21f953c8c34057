//! Error types shared by the collector, the dataset layer and the analyzer.

use reqwest::StatusCode;

/// Failures talking to the repository host.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Connection, timeout or body read failure.
    #[error("network error: {message}")]
    Network { message: String },

    /// The host answered with a non-success status.
    #[error("{url} returned {status}: {message}")]
    Status {
        status: StatusCode,
        url: String,
        message: String,
    },

    /// The response body did not match the expected shape.
    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl From<reqwest::Error> for HostError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Failures reading or writing the dataset and results files.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error on {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("invalid timestamp {value:?}")]
    InvalidTimestamp { value: String },
}

/// Failures of the comparative analysis.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("at least 2 organization groups are required, got {found}")]
    InsufficientGroups { found: usize },

    #[error("organization {organization:?} has no rows in the dataset")]
    EmptyGroup { organization: String },

    #[error("{observations} observations across {groups} groups leave no residual degrees of freedom")]
    NoResidualDegreesOfFreedom { observations: usize, groups: usize },

    #[error("F distribution unavailable for df=({df_between}, {df_within}): {message}")]
    Distribution {
        df_between: f64,
        df_within: f64,
        message: String,
    },

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// Invalid configuration or missing credential.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {message}")]
    Invalid { message: String },

    #[error("environment variable {variable} must be set to a GitHub token")]
    MissingCredential { variable: &'static str },

    #[error(transparent)]
    Load(#[from] config::ConfigError),
}
