use crate::error::HostError;
use async_trait::async_trait;

pub mod client;
pub mod pagination;
pub mod types;

pub use client::GitHubClient;
pub use pagination::count_from_link_header;
pub use types::{PageProbe, RepoDetail, RepoSummary};

/// The four repository host calls the collector depends on.
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Public repositories of `org`, sorted by stars descending on the host side.
    async fn list_org_repos(&self, org: &str, per_page: u32) -> Result<Vec<RepoSummary>, HostError>;

    async fn repo_detail(&self, org: &str, repo: &str) -> Result<RepoDetail, HostError>;

    /// Closed pull requests at one item per page.
    async fn closed_pulls_probe(&self, org: &str, repo: &str) -> Result<PageProbe, HostError>;

    /// Releases at one item per page.
    async fn releases_probe(&self, org: &str, repo: &str) -> Result<PageProbe, HostError>;
}
