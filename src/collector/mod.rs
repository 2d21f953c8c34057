use crate::config::{Config, RepositoryFailurePolicy};
use crate::dataset::RepositoryRecord;
use crate::error::HostError;
use crate::github::{RepoSummary, RepositoryHost};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

pub mod extractor;

pub use extractor::extract_record;

/// Some organizations or repositories could not be read.
pub const EXIT_PARTIAL: u8 = 2;
/// Nothing was collected; the dataset is left untouched.
pub const EXIT_COLLECTION_FAILED: u8 = 3;

/// The `n` most starred repositories, highest first.
///
/// The sort is stable so equal star counts keep the host's ordering.
pub fn select_top(mut repos: Vec<RepoSummary>, n: usize) -> Vec<RepoSummary> {
    repos.sort_by(|a, b| b.stargazers_count.cmp(&a.stargazers_count));
    repos.truncate(n);
    repos
}

#[derive(Debug)]
pub struct OrganizationFailure {
    pub organization: String,
    pub error: HostError,
}

#[derive(Debug)]
pub struct SkippedRepository {
    pub organization: String,
    pub repository: String,
    pub error: HostError,
}

/// Records of one organization plus the repositories that could not be read.
#[derive(Debug, Default)]
pub struct OrganizationOutcome {
    pub records: Vec<RepositoryRecord>,
    pub skipped: Vec<SkippedRepository>,
    /// Set when the organization was cut short under `AbortOrganization`.
    pub aborted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    Complete,
    Partial,
    Failed,
}

#[derive(Debug, Default)]
pub struct CollectionReport {
    pub records: Vec<RepositoryRecord>,
    pub failed_organizations: Vec<OrganizationFailure>,
    pub skipped_repositories: Vec<SkippedRepository>,
    pub aborted_organizations: Vec<String>,
}

impl CollectionReport {
    pub fn status(&self) -> CollectionStatus {
        let had_failures = !self.failed_organizations.is_empty()
            || !self.skipped_repositories.is_empty()
            || !self.aborted_organizations.is_empty();

        if !had_failures {
            CollectionStatus::Complete
        } else if self.records.is_empty() {
            CollectionStatus::Failed
        } else {
            CollectionStatus::Partial
        }
    }

    /// Process exit code for the `collect` command.
    pub fn exit_code(&self) -> u8 {
        match self.status() {
            CollectionStatus::Complete => 0,
            CollectionStatus::Partial => EXIT_PARTIAL,
            CollectionStatus::Failed => EXIT_COLLECTION_FAILED,
        }
    }

    /// Whether there is anything worth writing to the dataset.
    pub fn should_write_dataset(&self) -> bool {
        self.status() != CollectionStatus::Failed
    }
}

pub struct OrganizationCollector<'a> {
    host: &'a dyn RepositoryHost,
    per_page: u32,
    top_n: usize,
    policy: RepositoryFailurePolicy,
}

impl<'a> OrganizationCollector<'a> {
    pub fn new(
        host: &'a dyn RepositoryHost,
        per_page: u32,
        top_n: usize,
        policy: RepositoryFailurePolicy,
    ) -> Self {
        Self {
            host,
            per_page,
            top_n,
            policy,
        }
    }

    pub fn from_config(host: &'a dyn RepositoryHost, config: &Config) -> Self {
        Self::new(
            host,
            config.per_page,
            config.top_n,
            config.repository_failure_policy,
        )
    }

    /// Collects every organization in order and folds their records together.
    ///
    /// A listing failure skips the organization; the rest still run.
    pub async fn collect_all(&self, organizations: &[String]) -> CollectionReport {
        let mut report = CollectionReport::default();

        for org in organizations {
            match self.collect_organization(org).await {
                Ok(outcome) => {
                    report.records.extend(outcome.records);
                    report.skipped_repositories.extend(outcome.skipped);
                    if outcome.aborted {
                        report.aborted_organizations.push(org.clone());
                    }
                }
                Err(e) => {
                    error!("Failed to list repositories of {}: {}", org, e);
                    report.failed_organizations.push(OrganizationFailure {
                        organization: org.clone(),
                        error: e,
                    });
                }
            }
        }

        info!(
            "Collection finished: {} repositories, {} organizations failed, {} repositories skipped",
            report.records.len(),
            report.failed_organizations.len(),
            report.skipped_repositories.len()
        );

        report
    }

    /// Top repositories of one organization, in descending star order.
    ///
    /// Errors only when the repository listing itself fails.
    pub async fn collect_organization(&self, org: &str) -> Result<OrganizationOutcome, HostError> {
        info!("Collecting organization: {}", org);

        let repos = self.host.list_org_repos(org, self.per_page).await?;
        info!("Found {} repositories for {}", repos.len(), org);

        let top = select_top(repos, self.top_n);
        let mut outcome = OrganizationOutcome::default();

        let pb = ProgressBar::new(top.len() as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} repositories {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );

        for summary in &top {
            info!(
                "Processing repository: {} ({} stars)",
                summary.name, summary.stargazers_count
            );
            pb.set_message(summary.name.clone());

            match self.collect_repository(org, summary).await {
                Ok(record) => outcome.records.push(record),
                Err(e) => {
                    outcome.skipped.push(SkippedRepository {
                        organization: org.to_string(),
                        repository: summary.name.clone(),
                        error: e,
                    });

                    if self.policy == RepositoryFailurePolicy::AbortOrganization {
                        warn!(
                            "Failed to read {}/{}, abandoning remaining repositories of {}",
                            org, summary.name, org
                        );
                        outcome.aborted = true;
                        break;
                    }
                    warn!("Failed to read {}/{}, skipping it", org, summary.name);
                }
            }
            pb.inc(1);
        }

        pb.finish_and_clear();
        Ok(outcome)
    }

    async fn collect_repository(
        &self,
        org: &str,
        summary: &RepoSummary,
    ) -> Result<RepositoryRecord, HostError> {
        let detail = self.host.repo_detail(org, &summary.name).await?;
        let pulls = self.host.closed_pulls_probe(org, &summary.name).await?;
        let releases = self.host.releases_probe(org, &summary.name).await?;

        Ok(extract_record(org, summary, &detail, &pulls, &releases))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{PageProbe, RepoDetail};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use reqwest::StatusCode;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    fn repo(name: &str, stars: u64) -> RepoSummary {
        RepoSummary {
            name: name.to_string(),
            stargazers_count: stars,
            created_at: Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            language: Some("Rust".to_string()),
            description: None,
            forks_count: 1,
        }
    }

    fn not_found(url: &str) -> HostError {
        HostError::Status {
            status: StatusCode::NOT_FOUND,
            url: url.to_string(),
            message: "Not Found".to_string(),
        }
    }

    #[derive(Default)]
    struct FakeHost {
        repos: HashMap<String, Vec<RepoSummary>>,
        broken_repos: HashSet<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeHost {
        fn with_org(mut self, org: &str, repos: Vec<RepoSummary>) -> Self {
            self.repos.insert(org.to_string(), repos);
            self
        }

        fn with_broken_repo(mut self, name: &str) -> Self {
            self.broken_repos.insert(name.to_string());
            self
        }

        fn detail_calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RepositoryHost for FakeHost {
        async fn list_org_repos(&self, org: &str, _per_page: u32) -> Result<Vec<RepoSummary>, HostError> {
            self.repos
                .get(org)
                .cloned()
                .ok_or_else(|| not_found(&format!("/orgs/{}/repos", org)))
        }

        async fn repo_detail(&self, _org: &str, repo: &str) -> Result<RepoDetail, HostError> {
            self.calls.lock().unwrap().push(repo.to_string());
            if self.broken_repos.contains(repo) {
                return Err(HostError::Network {
                    message: "connection reset".to_string(),
                });
            }
            Ok(RepoDetail {
                open_issues_count: 3,
            })
        }

        async fn closed_pulls_probe(&self, _org: &str, _repo: &str) -> Result<PageProbe, HostError> {
            Ok(PageProbe::new(Some(
                r#"<https://api.github.com/x?per_page=1&page=42>; rel="last""#.to_string(),
            )))
        }

        async fn releases_probe(&self, _org: &str, _repo: &str) -> Result<PageProbe, HostError> {
            Ok(PageProbe::default())
        }
    }

    fn orgs(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn select_top_sorts_descending_and_truncates() {
        let repos = (0..15).map(|i| repo(&format!("r{}", i), i * 10)).collect();
        let top = select_top(repos, 10);

        assert_eq!(top.len(), 10);
        assert_eq!(top[0].stargazers_count, 140);
        assert!(top
            .windows(2)
            .all(|w| w[0].stargazers_count >= w[1].stargazers_count));
    }

    #[test]
    fn select_top_keeps_host_order_for_ties() {
        let repos = vec![repo("a", 5), repo("b", 9), repo("c", 5), repo("d", 5)];
        let names: Vec<_> = select_top(repos, 3).into_iter().map(|r| r.name).collect();
        assert_eq!(names, ["b", "a", "c"]);
    }

    #[test]
    fn select_top_with_fewer_repositories_keeps_all() {
        let repos = vec![repo("a", 1), repo("b", 2)];
        assert_eq!(select_top(repos, 10).len(), 2);
    }

    #[tokio::test]
    async fn collects_top_ten_in_star_order() {
        let repos = (0..12).map(|i| repo(&format!("r{}", i), (i * 7) % 13)).collect();
        let host = FakeHost::default().with_org("facebook", repos);
        let collector =
            OrganizationCollector::new(&host, 100, 10, RepositoryFailurePolicy::SkipRepository);

        let outcome = collector.collect_organization("facebook").await.unwrap();

        assert_eq!(outcome.records.len(), 10);
        assert!(outcome
            .records
            .windows(2)
            .all(|w| w[0].stars >= w[1].stars));
        assert!(outcome.records.iter().all(|r| r.accepted_pull_request_count == 42));
        assert!(outcome.records.iter().all(|r| r.release_count == 0));
        assert!(!outcome.aborted);
    }

    #[tokio::test]
    async fn listing_failure_skips_only_that_organization() {
        let host = FakeHost::default()
            .with_org("facebook", vec![repo("react", 10)])
            .with_org("google", vec![repo("guava", 5), repo("gson", 3)]);
        let collector =
            OrganizationCollector::new(&host, 100, 10, RepositoryFailurePolicy::SkipRepository);

        let report = collector
            .collect_all(&orgs(&["facebook", "microsoft", "google"]))
            .await;

        let labels: Vec<_> = report.records.iter().map(|r| r.organization.as_str()).collect();
        assert_eq!(labels, ["facebook", "google", "google"]);
        assert_eq!(report.failed_organizations.len(), 1);
        assert_eq!(report.failed_organizations[0].organization, "microsoft");
        assert_eq!(report.status(), CollectionStatus::Partial);
    }

    #[tokio::test]
    async fn skip_policy_drops_only_the_failing_repository() {
        let host = FakeHost::default()
            .with_org("google", vec![repo("a", 30), repo("b", 20), repo("c", 10)])
            .with_broken_repo("b");
        let collector =
            OrganizationCollector::new(&host, 100, 10, RepositoryFailurePolicy::SkipRepository);

        let report = collector.collect_all(&orgs(&["google"])).await;

        let names: Vec<_> = report.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["a", "c"]);
        assert_eq!(report.skipped_repositories.len(), 1);
        assert_eq!(report.skipped_repositories[0].repository, "b");
        assert!(report.aborted_organizations.is_empty());
    }

    #[tokio::test]
    async fn abort_policy_stops_the_organization() {
        let host = FakeHost::default()
            .with_org("google", vec![repo("a", 30), repo("b", 20), repo("c", 10)])
            .with_org("microsoft", vec![repo("vscode", 100)])
            .with_broken_repo("b");
        let collector =
            OrganizationCollector::new(&host, 100, 10, RepositoryFailurePolicy::AbortOrganization);

        let report = collector.collect_all(&orgs(&["google", "microsoft"])).await;

        let names: Vec<_> = report.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["a", "vscode"]);
        assert_eq!(report.aborted_organizations, ["google"]);
        assert!(!host.detail_calls().contains(&"c".to_string()));
    }

    #[tokio::test]
    async fn status_reflects_outcome() {
        let host = FakeHost::default().with_org("google", vec![repo("a", 1)]);
        let collector =
            OrganizationCollector::new(&host, 100, 10, RepositoryFailurePolicy::SkipRepository);

        let complete = collector.collect_all(&orgs(&["google"])).await;
        assert_eq!(complete.status(), CollectionStatus::Complete);

        let failed = collector.collect_all(&orgs(&["nobody", "nothing"])).await;
        assert_eq!(failed.status(), CollectionStatus::Failed);
    }

    #[tokio::test]
    async fn exit_code_follows_status() {
        let clean = FakeHost::default().with_org("google", vec![repo("a", 2)]);
        let collector =
            OrganizationCollector::new(&clean, 100, 10, RepositoryFailurePolicy::SkipRepository);
        let report = collector
            .collect_all(&orgs(&["google"]))
            .await;
        assert_eq!(report.exit_code(), 0);
        assert!(report.should_write_dataset());

        let host = FakeHost::default()
            .with_org("google", vec![repo("a", 2), repo("b", 1)])
            .with_broken_repo("b");
        let collector =
            OrganizationCollector::new(&host, 100, 10, RepositoryFailurePolicy::SkipRepository);
        let report = collector
            .collect_all(&orgs(&["google", "nobody"]))
            .await;
        assert_eq!(report.status(), CollectionStatus::Partial);
        assert_eq!(report.exit_code(), EXIT_PARTIAL);
        assert!(report.should_write_dataset());
    }

    #[tokio::test]
    async fn nothing_collected_is_a_failure_even_without_failed_organizations() {
        let host = FakeHost::default()
            .with_org("google", vec![repo("b", 1)])
            .with_broken_repo("b");
        let collector =
            OrganizationCollector::new(&host, 100, 10, RepositoryFailurePolicy::SkipRepository);

        let report = collector.collect_all(&orgs(&["google"])).await;

        assert!(report.records.is_empty());
        assert!(report.failed_organizations.is_empty());
        assert_eq!(report.skipped_repositories.len(), 1);
        assert_eq!(report.status(), CollectionStatus::Failed);
        assert_eq!(report.exit_code(), EXIT_COLLECTION_FAILED);
        assert!(!report.should_write_dataset());
    }
}
