use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Entry of `GET /orgs/{org}/repos`.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoSummary {
    pub name: String,
    pub stargazers_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub forks_count: u64,
}

/// Subset of `GET /repos/{owner}/{repo}` we rely on.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoDetail {
    pub open_issues_count: u64,
}

/// Result of a one-item-per-page list request: only the `Link` header matters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageProbe {
    pub link: Option<String>,
}

impl PageProbe {
    pub fn new(link: Option<String>) -> Self {
        Self { link }
    }
}
