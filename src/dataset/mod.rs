use crate::error::DatasetError;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fs;
use std::path::Path;
use tracing::info;

pub const NO_LANGUAGE: &str = "Não especificada";
pub const NO_DESCRIPTION: &str = "Sem descrição";

pub const DATASET_HEADER: [&str; 11] = [
    "organização",
    "nome",
    "estrelas",
    "data_criação",
    "última_atualização",
    "total_issues",
    "pull_requests_aceitas",
    "total_releases",
    "linguagem",
    "descrição",
    "forks",
];

/// One ranked repository, as persisted in the dataset file.
///
/// Field order is the column order of the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    #[serde(rename = "organização")]
    pub organization: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "estrelas")]
    pub stars: u64,
    #[serde(rename = "data_criação", with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "última_atualização", with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "total_issues")]
    pub open_issue_count: u64,
    #[serde(rename = "pull_requests_aceitas")]
    pub accepted_pull_request_count: u64,
    #[serde(rename = "total_releases")]
    pub release_count: u64,
    #[serde(rename = "linguagem")]
    pub primary_language: String,
    #[serde(rename = "descrição")]
    pub description: String,
    #[serde(rename = "forks")]
    pub fork_count: u64,
}

/// Parses an instant and normalizes it to UTC.
///
/// RFC 3339 with any offset is converted; naive date-times are taken as UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DatasetError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }

    Err(DatasetError::InvalidTimestamp {
        value: value.to_string(),
    })
}

mod timestamp {
    use super::*;

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

/// Writes the dataset, replacing any existing file at `path`.
pub fn write_dataset(path: &Path, records: &[RepositoryRecord]) -> Result<(), DatasetError> {
    let display = path.display().to_string();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| DatasetError::Io {
            path: display.clone(),
            source,
        })?;
    }

    let csv_err = |source| DatasetError::Csv {
        path: display.clone(),
        source,
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_err)?;

    // Written explicitly so an empty dataset still carries its header.
    writer.write_record(DATASET_HEADER).map_err(csv_err)?;
    for record in records {
        writer.serialize(record).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| DatasetError::Io {
        path: display.clone(),
        source,
    })?;

    let shown_path = &display;
    info!("Dataset with {} rows saved to {}", records.len(), shown_path);
    Ok(())
}

pub fn read_dataset(path: &Path) -> Result<Vec<RepositoryRecord>, DatasetError> {
    let display = path.display().to_string();
    let csv_err = |source| DatasetError::Csv {
        path: display.clone(),
        source,
    };

    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;
    let records = reader
        .deserialize()
        .collect::<Result<Vec<RepositoryRecord>, _>>()
        .map_err(csv_err)?;

    let shown_path = &display;
    info!("Loaded {} rows from {}", records.len(), shown_path);
    Ok(records)
}
