//! Significance tests for gender differences in performance and promotion.

use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF, StudentsT};

use crate::error::{PrepError, Result};
use crate::models::PreparedRecord;

/// Significance level
pub const ALPHA: f64 = 0.05;

/// Result of a hypothesis test
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TestOutcome {
    /// Test statistic
    pub statistic: f64,
    /// Two-sided p-value
    pub p_value: f64,
    /// Whether `p_value < ALPHA`
    pub significant: bool,
}

impl TestOutcome {
    fn new(statistic: f64, p_value: f64) -> Self {
        Self {
            statistic,
            p_value,
            significant: p_value < ALPHA,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean_and_variance(sample: &[f64]) -> (f64, f64) {
    let n = sample.len() as f64;
    let mean = sample.iter().sum::<f64>() / n;
    let variance = sample.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, variance)
}

/// Student's two-sample t-test with pooled variance
#[allow(clippy::cast_precision_loss)]
pub fn two_sample_ttest(a: &[f64], b: &[f64]) -> Result<TestOutcome> {
    if a.len() < 2 || b.len() < 2 {
        return Err(PrepError::statistics(format!(
            "t-test needs at least two observations per group, got {} and {}",
            a.len(),
            b.len()
        )));
    }
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let (mean1, var1) = mean_and_variance(a);
    let (mean2, var2) = mean_and_variance(b);

    let dof = n1 + n2 - 2.0;
    let pooled = ((n1 - 1.0) * var1 + (n2 - 1.0) * var2) / dof;
    if pooled <= 0.0 {
        return Err(PrepError::statistics("t-test on samples with zero variance"));
    }
    let statistic = (mean1 - mean2) / (pooled * (1.0 / n1 + 1.0 / n2)).sqrt();

    let dist = StudentsT::new(0.0, 1.0, dof).map_err(|e| PrepError::statistics(e.to_string()))?;
    Ok(TestOutcome::new(statistic, 2.0 * dist.sf(statistic.abs())))
}

/// Chi-square independence test on a 2x2 table, with Yates' correction
#[allow(clippy::cast_precision_loss)]
pub fn chi_square_2x2(observed: [[usize; 2]; 2]) -> Result<TestOutcome> {
    let row_totals = observed.map(|row| (row[0] + row[1]) as f64);
    let column_totals = [0, 1].map(|j| (observed[0][j] + observed[1][j]) as f64);
    let total: f64 = row_totals.iter().sum();

    let mut statistic = 0.0;
    for (i, row) in observed.iter().enumerate() {
        for (j, &count) in row.iter().enumerate() {
            let expected = row_totals[i] * column_totals[j] / total;
            if expected.is_nan() || expected <= 0.0 {
                return Err(PrepError::statistics(format!(
                    "chi-square table has a zero expected frequency: {observed:?}"
                )));
            }
            let diff = expected - count as f64;
            let corrected = count as f64 + diff.abs().min(0.5) * diff.signum();
            statistic += (corrected - expected).powi(2) / expected;
        }
    }

    let dist = ChiSquared::new(1.0).map_err(|e| PrepError::statistics(e.to_string()))?;
    Ok(TestOutcome::new(statistic, dist.sf(statistic)))
}

/// Does `perf_rank` differ between men and everyone else?
pub fn performance_ttest(records: &[PreparedRecord]) -> Result<TestOutcome> {
    let (men, others): (Vec<&PreparedRecord>, Vec<&PreparedRecord>) =
        records.iter().partition(|r| r.is_men == 1);
    let ranks = |group: Vec<&PreparedRecord>| -> Vec<f64> {
        group.into_iter().map(|r| f64::from(r.perf_rank)).collect()
    };
    two_sample_ttest(&ranks(men), &ranks(others))
}

/// Is promotion independent of `is_men`?
pub fn promotion_chi_square(records: &[PreparedRecord]) -> Result<TestOutcome> {
    let mut observed = [[0usize; 2]; 2];
    for record in records {
        observed[usize::from(record.is_men == 1)][usize::from(record.is_promo == 1)] += 1;
    }
    chi_square_2x2(observed)
}
