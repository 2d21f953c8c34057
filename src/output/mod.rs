use crate::analysis::{AnalysisReport, Verdict};
use crate::error::DatasetError;
use colored::*;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

pub const RESULTS_HEADER: [&str; 4] = ["Métrica", "Estatística F", "P-valor", "Interpretação"];

#[derive(Serialize)]
struct ResultRow<'a> {
    #[serde(rename = "Métrica")]
    metric: &'a str,
    #[serde(rename = "Estatística F")]
    f_statistic: f64,
    #[serde(rename = "P-valor")]
    p_value: f64,
    #[serde(rename = "Interpretação")]
    verdict: &'a str,
}

/// Writes one row per metric, replacing any existing file.
pub fn write_results(path: &Path, report: &AnalysisReport) -> Result<(), DatasetError> {
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

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    for result in &report.results {
        writer
            .serialize(ResultRow {
                metric: result.metric.display_name(),
                f_statistic: result.f_statistic,
                p_value: result.p_value,
                verdict: result.verdict.text(),
            })
            .map_err(csv_err)?;
    }
    writer.flush().map_err(|source| DatasetError::Io {
        path: display.clone(),
        source,
    })?;

    let shown_path = &display;
    info!("Analysis results saved to {}", shown_path);
    Ok(())
}

pub fn print_summary(report: &AnalysisReport) {
    println!("\n{}", "ANOVA entre organizações".bright_cyan().bold());

    let groups: Vec<String> = report
        .group_sizes
        .iter()
        .map(|(org, n)| format!("{} ({})", org, n))
        .collect();
    println!("Grupos: {}", groups.join(", ").bright_white());

    println!(
        "{:<34} {:>14} {:>10}  {}",
        RESULTS_HEADER[0], RESULTS_HEADER[1], RESULTS_HEADER[2], RESULTS_HEADER[3]
    );
    for result in &report.results {
        let verdict = match result.verdict {
            Verdict::Significant => result.verdict.text().bright_green().bold(),
            Verdict::NotSignificant => result.verdict.text().normal(),
        };
        println!(
            "{:<34} {:>14.4} {:>10.4}  {}",
            result.metric.display_name(),
            result.f_statistic,
            result.p_value,
            verdict
        );
    }
}
