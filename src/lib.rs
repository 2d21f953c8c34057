//! Ranks the most starred public repositories of a set of GitHub
//! organizations, persists them as CSV and compares the organizations with a
//! one-way ANOVA.

pub mod analysis;
pub mod collector;
pub mod config;
pub mod dataset;
pub mod error;
pub mod github;
pub mod output;

pub use analysis::{AnalysisReport, ComparativeAnalyzer, Metric, MetricResult, Verdict};
pub use collector::{CollectionReport, CollectionStatus, OrganizationCollector};
pub use crate::config::{Config, Credentials, RepositoryFailurePolicy};
pub use dataset::{read_dataset, write_dataset, RepositoryRecord};
pub use github::{GitHubClient, RepositoryHost};
