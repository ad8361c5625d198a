//! Promotion rates, cross-tabulations and grouped descriptive statistics.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{PrepError, Result};
use crate::models::PreparedRecord;

/// Categorical column a table can be grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Gender flag, `0` or `1`
    IsMen,
    /// Role letter of the job level
    JobRole,
    /// Rank digit of the job level
    JobRank,
    /// Full job level code
    JobLevel,
    /// Performance rank
    PerfRank,
    /// Region descriptor
    Region,
    /// Job function descriptor
    JobFunction,
}

impl Dimension {
    /// Every dimension, in column order
    pub const ALL: [Self; 7] = [
        Self::IsMen,
        Self::JobRole,
        Self::JobRank,
        Self::JobLevel,
        Self::PerfRank,
        Self::Region,
        Self::JobFunction,
    ];

    /// Column name of the dimension
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            Self::IsMen => "is_men",
            Self::JobRole => "job_role",
            Self::JobRank => "job_rank",
            Self::JobLevel => "job_level",
            Self::PerfRank => "perf_rank",
            Self::Region => "region",
            Self::JobFunction => "job_function",
        }
    }

    /// Value of the dimension on one record; missing descriptors yield `None`
    #[must_use]
    pub fn value(self, record: &PreparedRecord) -> Option<String> {
        match self {
            Self::IsMen => Some(record.is_men.to_string()),
            Self::JobRole => Some(record.job_role.clone()),
            Self::JobRank => Some(record.job_rank.to_string()),
            Self::JobLevel => Some(record.job_level.clone()),
            Self::PerfRank => Some(record.perf_rank.to_string()),
            Self::Region => record.region.clone(),
            Self::JobFunction => record.job_function.clone(),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Dimension {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|dimension| dimension.column() == s)
            .ok_or_else(|| PrepError::config(format!("unknown dimension '{s}'")))
    }
}

/// Numeric column descriptive statistics can be computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    /// Performance rank, 1-5
    PerfRank,
    /// Tenure in years
    Tenure,
    /// Age in years
    Age,
    /// Rank digit of the job level
    JobRank,
}

impl Measure {
    /// Value of the measure on one record
    #[must_use]
    pub fn value(self, record: &PreparedRecord) -> Option<f64> {
        match self {
            Self::PerfRank => Some(f64::from(record.perf_rank)),
            Self::Tenure => record.tenure,
            Self::Age => record.age,
            Self::JobRank => Some(f64::from(record.job_rank)),
        }
    }
}

/// Promotion count and rate of one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRate {
    /// Values of the grouping dimensions, in the requested order
    pub key: Vec<String>,
    /// Rows in the group
    pub count: usize,
    /// Promoted rows in the group
    pub promoted: usize,
    /// `promoted / count`
    pub rate: f64,
}

#[allow(clippy::cast_precision_loss)]
fn ratio(part: usize, whole: usize) -> f64 {
    part as f64 / whole as f64
}

/// Share of records with `is_promo = 1`
pub fn promotion_rate(records: &[PreparedRecord]) -> Result<f64> {
    if records.is_empty() {
        return Err(PrepError::statistics("promotion rate of an empty table"));
    }
    let promoted = records.iter().filter(|r| r.is_promo == 1).count();
    Ok(ratio(promoted, records.len()))
}

/// Promotion count and rate for every combination of the given dimensions
///
/// Groups are sorted by key. Records missing any grouping value are left
/// out.
#[must_use]
pub fn group_rates(records: &[PreparedRecord], dimensions: &[Dimension]) -> Vec<GroupRate> {
    let mut groups: BTreeMap<Vec<String>, (usize, usize)> = BTreeMap::new();
    for record in records {
        let key: Option<Vec<String>> = dimensions.iter().map(|d| d.value(record)).collect();
        let Some(key) = key else { continue };
        let entry = groups.entry(key).or_default();
        entry.0 += 1;
        entry.1 += usize::from(record.is_promo);
    }

    groups
        .into_iter()
        .map(|(key, (count, promoted))| GroupRate {
            key,
            count,
            promoted,
            rate: ratio(promoted, count),
        })
        .collect()
}

/// Frequency table of two dimensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crosstab {
    /// Dimension along the rows
    pub row: Dimension,
    /// Dimension along the columns
    pub column: Dimension,
    /// Sorted row values
    pub row_labels: Vec<String>,
    /// Sorted column values
    pub column_labels: Vec<String>,
    /// `counts[i][j]` rows with `row_labels[i]` and `column_labels[j]`
    pub counts: Vec<Vec<usize>>,
}

impl Crosstab {
    /// Count for one cell; unknown labels count zero
    #[must_use]
    pub fn count(&self, row: &str, column: &str) -> usize {
        let i = self.row_labels.iter().position(|label| label == row);
        let j = self.column_labels.iter().position(|label| label == column);
        match (i, j) {
            (Some(i), Some(j)) => self.counts[i][j],
            _ => 0,
        }
    }
}

/// Cross-tabulate two dimensions
#[must_use]
pub fn crosstab(records: &[PreparedRecord], row: Dimension, column: Dimension) -> Crosstab {
    let pairs: Vec<(String, String)> = records
        .iter()
        .filter_map(|r| Some((row.value(r)?, column.value(r)?)))
        .collect();

    let mut row_labels: Vec<String> = pairs.iter().map(|(r, _)| r.clone()).collect();
    row_labels.sort();
    row_labels.dedup();
    let mut column_labels: Vec<String> = pairs.iter().map(|(_, c)| c.clone()).collect();
    column_labels.sort();
    column_labels.dedup();

    let mut counts = vec![vec![0; column_labels.len()]; row_labels.len()];
    for (r, c) in &pairs {
        if let (Ok(i), Ok(j)) = (row_labels.binary_search(r), column_labels.binary_search(c)) {
            counts[i][j] += 1;
        }
    }

    Crosstab {
        row,
        column,
        row_labels,
        column_labels,
        counts,
    }
}

/// Summary of a numeric sample
///
/// `std` is the sample standard deviation and is `None` for a single
/// value. Quartiles interpolate linearly between order statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveStats {
    /// Number of values
    pub count: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// Sample standard deviation; `None` for a single value
    pub std: Option<f64>,
    /// Smallest value
    pub min: f64,
    /// First quartile
    pub q25: f64,
    /// Median
    pub median: f64,
    /// Third quartile
    pub q75: f64,
    /// Largest value
    pub max: f64,
}

impl DescriptiveStats {
    /// Computes statistics from unsorted values; `None` if there are none
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values: Vec<f64> = values.into_iter().collect();
        values.sort_by(f64::total_cmp);
        Self::from_sorted(&values)
    }

    /// Computes statistics from values sorted in ascending order
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_sorted(sorted: &[f64]) -> Option<Self> {
        let min = *sorted.first()?;
        let max = *sorted.last()?;
        let count = sorted.len();
        let n = count as f64;
        let mean = sorted.iter().sum::<f64>() / n;
        let std = (count > 1).then(|| {
            let squares: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            (squares / (n - 1.0)).sqrt()
        });

        Some(Self {
            count,
            mean,
            std,
            min,
            q25: quantile(sorted, 0.25),
            median: quantile(sorted, 0.5),
            q75: quantile(sorted, 0.75),
            max,
        })
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - position.floor();
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Descriptive statistics of one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    /// Value of the grouping dimension
    pub group: String,
    /// Statistics of the measure within the group
    pub stats: DescriptiveStats,
}

/// Descriptive statistics of a measure, per value of a dimension
#[must_use]
pub fn describe_by(records: &[PreparedRecord], by: Dimension, measure: Measure) -> Vec<GroupStats> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for record in records {
        if let (Some(group), Some(value)) = (by.value(record), measure.value(record)) {
            groups.entry(group).or_default().push(value);
        }
    }

    groups
        .into_iter()
        .filter_map(|(group, values)| {
            DescriptiveStats::new(values).map(|stats| GroupStats { group, stats })
        })
        .collect()
}
