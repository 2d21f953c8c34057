use crate::dataset::{RepositoryRecord, NO_DESCRIPTION, NO_LANGUAGE};
use crate::github::{count_from_link_header, PageProbe, RepoDetail, RepoSummary};

/// Builds the persisted record for one repository from the host responses.
pub fn extract_record(
    organization: &str,
    summary: &RepoSummary,
    detail: &RepoDetail,
    pulls: &PageProbe,
    releases: &PageProbe,
) -> RepositoryRecord {
    RepositoryRecord {
        organization: organization.to_string(),
        name: summary.name.clone(),
        stars: summary.stargazers_count,
        created_at: summary.created_at,
        updated_at: summary.updated_at,
        open_issue_count: detail.open_issues_count,
        accepted_pull_request_count: count_from_link_header(pulls.link.as_deref()),
        release_count: count_from_link_header(releases.link.as_deref()),
        primary_language: or_sentinel(summary.language.as_deref(), NO_LANGUAGE),
        description: or_sentinel(summary.description.as_deref(), NO_DESCRIPTION),
        fork_count: summary.forks_count,
    }
}

fn or_sentinel(value: Option<&str>, sentinel: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => sentinel.to_string(),
    }
}
