use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::{info, warn};

pub mod anova;

pub use anova::{one_way_anova, AnovaOutcome};

use crate::dataset::{read_dataset, RepositoryRecord};
use crate::error::AnalysisError;

/// p-values below this reject equal group means.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    AgeDays,
    OpenIssues,
    AcceptedPullRequests,
    Releases,
    DaysSinceUpdate,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::AgeDays,
        Metric::OpenIssues,
        Metric::AcceptedPullRequests,
        Metric::Releases,
        Metric::DaysSinceUpdate,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Metric::AgeDays => "Idade (dias)",
            Metric::OpenIssues => "Total de issues",
            Metric::AcceptedPullRequests => "Pull requests aceitas",
            Metric::Releases => "Total de releases",
            Metric::DaysSinceUpdate => "Dias desde a última atualização",
        }
    }

    /// Value of this metric for one row, with `now` fixed for the whole run.
    pub fn value(&self, record: &RepositoryRecord, now: DateTime<Utc>) -> f64 {
        match self {
            Metric::AgeDays => (now - record.created_at).num_days() as f64,
            Metric::OpenIssues => record.open_issue_count as f64,
            Metric::AcceptedPullRequests => record.accepted_pull_request_count as f64,
            Metric::Releases => record.release_count as f64,
            Metric::DaysSinceUpdate => (now - record.updated_at).num_days() as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Significant,
    NotSignificant,
}

impl Verdict {
    pub fn from_p_value(p_value: f64) -> Self {
        if p_value < SIGNIFICANCE_LEVEL {
            Verdict::Significant
        } else {
            Verdict::NotSignificant
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            Verdict::Significant => "Diferença significativa",
            Verdict::NotSignificant => "Sem diferença significativa",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricResult {
    pub metric: Metric,
    pub f_statistic: f64,
    pub p_value: f64,
    pub verdict: Verdict,
}

#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    /// Rows per organization, in configured order.
    pub group_sizes: Vec<(String, usize)>,
    /// One entry per metric, in `Metric::ALL` order.
    pub results: Vec<MetricResult>,
}

pub struct ComparativeAnalyzer {
    organizations: Vec<String>,
}

impl ComparativeAnalyzer {
    pub fn new(organizations: &[String]) -> Self {
        Self {
            organizations: organizations.to_vec(),
        }
    }

    pub fn analyze_file(&self, path: &Path) -> Result<AnalysisReport, AnalysisError> {
        let records = read_dataset(path)?;
        self.analyze_records(&records, Utc::now())
    }

    pub fn analyze_records(
        &self,
        records: &[RepositoryRecord],
        now: DateTime<Utc>,
    ) -> Result<AnalysisReport, AnalysisError> {
        let groups = self.partition(records);

        // Preconditions are the same for every metric, so check them once up front.
        let sizes: Vec<(&str, usize)> = groups
            .iter()
            .map(|(org, rows)| (org.as_str(), rows.len()))
            .collect();
        check_group_sizes(&sizes)?;

        let mut results = Vec::with_capacity(Metric::ALL.len());
        for metric in Metric::ALL {
            let values: Vec<(&str, Vec<f64>)> = groups
                .iter()
                .map(|(org, rows)| {
                    let values: Vec<f64> = rows.iter().map(|r| metric.value(r, now)).collect();
                    (org.as_str(), values)
                })
                .collect();
            let borrowed: Vec<(&str, &[f64])> = values
                .iter()
                .map(|(org, v)| (*org, v.as_slice()))
                .collect();

            let outcome = one_way_anova(&borrowed)?;
            let verdict = Verdict::from_p_value(outcome.p_value);
            info!(
                "{}: F = {:.4}, p = {:.4} ({})",
                metric.display_name(),
                outcome.f_statistic,
                outcome.p_value,
                verdict.text()
            );

            results.push(MetricResult {
                metric,
                f_statistic: outcome.f_statistic,
                p_value: outcome.p_value,
                verdict,
            });
        }

        Ok(AnalysisReport {
            generated_at: now,
            group_sizes: sizes
                .into_iter()
                .map(|(org, n)| (org.to_string(), n))
                .collect(),
            results,
        })
    }

    fn partition<'r>(&self, records: &'r [RepositoryRecord]) -> Vec<(String, Vec<&'r RepositoryRecord>)> {
        let mut groups: Vec<(String, Vec<&RepositoryRecord>)> = self
            .organizations
            .iter()
            .map(|org| (org.clone(), Vec::new()))
            .collect();

        let mut ignored = 0usize;
        for record in records {
            match groups.iter_mut().find(|(org, _)| *org == record.organization) {
                Some((_, rows)) => rows.push(record),
                None => ignored += 1,
            }
        }

        if ignored > 0 {
            warn!(
                "Ignoring {} rows from organizations outside {:?}",
                ignored, self.organizations
            );
        }
        groups
    }
}

fn check_group_sizes(sizes: &[(&str, usize)]) -> Result<(), AnalysisError> {
    if sizes.len() < 2 {
        return Err(AnalysisError::InsufficientGroups { found: sizes.len() });
    }
    if let Some((org, _)) = sizes.iter().find(|(_, n)| *n == 0) {
        return Err(AnalysisError::EmptyGroup {
            organization: org.to_string(),
        });
    }
    let observations: usize = sizes.iter().map(|(_, n)| n).sum();
    if observations <= sizes.len() {
        return Err(AnalysisError::NoResidualDegreesOfFreedom {
            observations,
            groups: sizes.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{NO_DESCRIPTION, NO_LANGUAGE};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    fn record(org: &str, issues: u64, age_days: i64) -> RepositoryRecord {
        RepositoryRecord {
            organization: org.to_string(),
            name: format!("{}-{}", org, issues),
            stars: 100,
            created_at: now() - Duration::days(age_days),
            updated_at: now() - Duration::hours(36),
            open_issue_count: issues,
            accepted_pull_request_count: issues * 2,
            release_count: 1,
            primary_language: NO_LANGUAGE.to_string(),
            description: NO_DESCRIPTION.to_string(),
            fork_count: 0,
        }
    }

    fn default_orgs() -> Vec<String> {
        vec![
            "facebook".to_string(),
            "microsoft".to_string(),
            "google".to_string(),
        ]
    }

    #[test]
    fn derived_day_counts_use_whole_days() {
        let r = record("facebook", 1, 400);
        assert_eq!(Metric::AgeDays.value(&r, now()), 400.0);
        assert_eq!(Metric::DaysSinceUpdate.value(&r, now()), 1.0);
    }

    #[test]
    fn verdict_threshold_is_strict() {
        assert_eq!(Verdict::from_p_value(0.049), Verdict::Significant);
        assert_eq!(Verdict::from_p_value(0.05), Verdict::NotSignificant);
        assert_eq!(Verdict::from_p_value(0.9), Verdict::NotSignificant);
    }

    #[test]
    fn produces_five_metrics_in_fixed_order() {
        let records = vec![
            record("facebook", 1, 100),
            record("facebook", 2, 200),
            record("facebook", 3, 300),
            record("microsoft", 10, 150),
            record("microsoft", 11, 250),
            record("microsoft", 12, 350),
            record("google", 20, 120),
            record("google", 21, 220),
            record("google", 22, 320),
        ];

        let report = ComparativeAnalyzer::new(&default_orgs())
            .analyze_records(&records, now())
            .unwrap();

        let metrics: Vec<_> = report.results.iter().map(|r| r.metric).collect();
        assert_eq!(metrics, Metric::ALL);
        for result in &report.results {
            assert!(result.f_statistic >= 0.0);
            assert!((0.0..=1.0).contains(&result.p_value));
        }
        assert_eq!(report.results[1].verdict, Verdict::Significant);
        assert_eq!(report.results[0].verdict, Verdict::NotSignificant);
        assert_eq!(
            report.group_sizes,
            vec![
                ("facebook".to_string(), 3),
                ("microsoft".to_string(), 3),
                ("google".to_string(), 3)
            ]
        );
    }

    #[test]
    fn missing_organization_is_reported_by_name() {
        let records = vec![
            record("facebook", 1, 100),
            record("facebook", 2, 200),
            record("google", 3, 300),
        ];

        let result = ComparativeAnalyzer::new(&default_orgs()).analyze_records(&records, now());
        match result {
            Err(AnalysisError::EmptyGroup { organization }) => assert_eq!(organization, "microsoft"),
            other => panic!("expected EmptyGroup, got {:?}", other),
        }
    }

    #[test]
    fn single_configured_organization_is_rejected() {
        let records = vec![record("facebook", 1, 100), record("facebook", 2, 100)];
        let result = ComparativeAnalyzer::new(&["facebook".to_string()])
            .analyze_records(&records, now());
        assert!(matches!(
            result,
            Err(AnalysisError::InsufficientGroups { found: 1 })
        ));
    }

    #[test]
    fn rows_outside_the_organization_list_are_ignored() {
        let records = vec![
            record("facebook", 1, 100),
            record("facebook", 2, 100),
            record("google", 5, 100),
            record("google", 6, 100),
            record("apple", 900, 100),
        ];
        let orgs = vec!["facebook".to_string(), "google".to_string()];

        let report = ComparativeAnalyzer::new(&orgs)
            .analyze_records(&records, now())
            .unwrap();
        let observed: usize = report.group_sizes.iter().map(|(_, n)| n).sum();
        assert_eq!(observed, 4);
    }
}
