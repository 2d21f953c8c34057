use crate::error::AnalysisError;
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnovaOutcome {
    pub f_statistic: f64,
    pub p_value: f64,
    pub df_between: f64,
    pub df_within: f64,
}

/// Classic one-way ANOVA assuming equal variances across groups.
///
/// Callers name the groups; here they are only checked for size. Needs at
/// least two groups, no empty group and more observations than groups.
pub fn one_way_anova(groups: &[(&str, &[f64])]) -> Result<AnovaOutcome, AnalysisError> {
    if groups.len() < 2 {
        return Err(AnalysisError::InsufficientGroups {
            found: groups.len(),
        });
    }
    if let Some((name, _)) = groups.iter().find(|(_, values)| values.is_empty()) {
        return Err(AnalysisError::EmptyGroup {
            organization: name.to_string(),
        });
    }

    let k = groups.len();
    let n: usize = groups.iter().map(|(_, values)| values.len()).sum();
    if n <= k {
        return Err(AnalysisError::NoResidualDegreesOfFreedom {
            observations: n,
            groups: k,
        });
    }

    let grand_mean = groups
        .iter()
        .flat_map(|(_, values)| values.iter())
        .sum::<f64>()
        / n as f64;

    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for (_, values) in groups {
        let mean = mean(values);
        ss_between += values.len() as f64 * (mean - grand_mean).powi(2);
        ss_within += values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    }

    let df_between = (k - 1) as f64;
    let df_within = (n - k) as f64;

    // Zero spread inside every group: F is 0/0 or x/0.
    if ss_within == 0.0 {
        let (f_statistic, p_value) = if ss_between == 0.0 {
            (0.0, 1.0)
        } else {
            (f64::INFINITY, 0.0)
        };
        return Ok(AnovaOutcome {
            f_statistic,
            p_value,
            df_between,
            df_within,
        });
    }

    let f_statistic = (ss_between / df_between) / (ss_within / df_within);
    let distribution =
        FisherSnedecor::new(df_between, df_within).map_err(|e| AnalysisError::Distribution {
            df_between,
            df_within,
            message: e.to_string(),
        })?;
    let p_value = distribution.sf(f_statistic).clamp(0.0, 1.0);

    Ok(AnovaOutcome {
        f_statistic,
        p_value,
        df_between,
        df_within,
    })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
