//! Model input: numeric feature matrix, train/test split and scaling.
//!
//! Categorical descriptors are one-hot encoded with the first category
//! dropped. Missing numeric values are forward filled in table order.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray, UInt8Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{PrepError, Result};
use crate::models::PreparedRecord;

/// Share of rows held out for testing
pub const DEFAULT_TEST_FRACTION: f64 = 0.3;

/// Seed for the train/test shuffle
pub const DEFAULT_SPLIT_SEED: u64 = 8;

type NumericFeature = (&'static str, fn(&PreparedRecord) -> Option<f64>);
type CategoricalFeature = (&'static str, fn(&PreparedRecord) -> Option<&str>);

const NUMERIC: [NumericFeature; 5] = [
    ("age", |r| r.age),
    ("job_rank", |r| Some(f64::from(r.job_rank))),
    ("perf_rank", |r| Some(f64::from(r.perf_rank))),
    ("tenure", |r| r.tenure),
    ("is_men", |r| Some(f64::from(r.is_men))),
];

const CATEGORICAL: [CategoricalFeature; 3] = [
    ("region", |r| r.region.as_deref()),
    ("job_function", |r| r.job_function.as_deref()),
    ("job_role", |r| Some(r.job_role.as_str())),
];

/// Feature matrix with its target column
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    /// Feature names, one per column of `rows`
    pub columns: Vec<String>,
    /// Row keys
    pub employee_ids: Vec<String>,
    /// Feature values, row major
    pub rows: Vec<Vec<f64>>,
    /// `is_promo` per row
    pub target: Vec<u8>,
}

impl FeatureTable {
    /// Build the feature table from prepared records
    pub fn from_records(records: &[PreparedRecord]) -> Result<Self> {
        if records.is_empty() {
            return Err(PrepError::statistics("feature table of an empty table"));
        }

        let mut columns: Vec<String> = Vec::new();
        let mut values: Vec<Vec<f64>> = Vec::new();

        for (name, extract) in NUMERIC {
            let filled = forward_fill(records.iter().map(extract)).ok_or_else(|| {
                PrepError::statistics(format!("feature '{name}' has no values"))
            })?;
            columns.push(name.to_string());
            values.push(filled);
        }

        for (name, extract) in CATEGORICAL {
            let mut categories: Vec<&str> = records.iter().filter_map(extract).collect();
            categories.sort_unstable();
            categories.dedup();
            for category in categories.into_iter().skip(1) {
                columns.push(format!("{name}_{category}"));
                values.push(
                    records
                        .iter()
                        .map(|r| if extract(r) == Some(category) { 1.0 } else { 0.0 })
                        .collect(),
                );
            }
        }

        let rows = (0..records.len())
            .map(|i| values.iter().map(|column| column[i]).collect())
            .collect();

        Ok(Self {
            columns,
            employee_ids: records.iter().map(|r| r.employee_id.clone()).collect(),
            rows,
            target: records.iter().map(|r| r.is_promo).collect(),
        })
    }

    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows at the given positions, in that order
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            employee_ids: indices.iter().map(|&i| self.employee_ids[i].clone()).collect(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
            target: indices.iter().map(|&i| self.target[i]).collect(),
        }
    }

    /// Convert to a record batch: key, one `Float64` column per feature, target
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let mut fields = Vec::with_capacity(self.columns.len() + 2);
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(fields.capacity());

        fields.push(Field::new("employee_id", DataType::Utf8, false));
        arrays.push(Arc::new(StringArray::from_iter_values(&self.employee_ids)));

        for (j, name) in self.columns.iter().enumerate() {
            fields.push(Field::new(name, DataType::Float64, false));
            arrays.push(Arc::new(Float64Array::from_iter_values(
                self.rows.iter().map(|row| row[j]),
            )));
        }

        fields.push(Field::new("is_promo", DataType::UInt8, false));
        arrays.push(Arc::new(UInt8Array::from(self.target.clone())));

        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
    }
}

/// Replace each missing value with the last present one; leading gaps take
/// the first present value. `None` if every value is missing.
fn forward_fill(values: impl Iterator<Item = Option<f64>>) -> Option<Vec<f64>> {
    let values: Vec<Option<f64>> = values.collect();
    let first = values.iter().flatten().copied().next()?;
    let mut last = first;
    Some(
        values
            .into_iter()
            .map(|value| {
                if let Some(value) = value {
                    last = value;
                }
                last
            })
            .collect(),
    )
}

/// Shuffle rows with a seeded generator and hold out a share for testing
///
/// Returns `(train, test)`. The test set has `ceil(len * test_fraction)`
/// rows; both sets must end up non-empty.
pub fn train_test_split(
    table: &FeatureTable,
    test_fraction: f64,
    seed: u64,
) -> Result<(FeatureTable, FeatureTable)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PrepError::config(format!(
            "test fraction must be between 0 and 1, got {test_fraction}"
        )));
    }
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let n_test = (table.len() as f64 * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= table.len() {
        return Err(PrepError::config(format!(
            "cannot split {} rows with test fraction {test_fraction}",
            table.len()
        )));
    }

    let mut indices: Vec<usize> = (0..table.len()).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    let (test, train) = indices.split_at(n_test);

    log::debug!("Split {} rows into {} train and {} test", table.len(), train.len(), test.len());
    Ok((table.select(train), table.select(test)))
}

/// Per-column standardisation fitted on one table and applied to others
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Fit column means and population standard deviations
    ///
    /// Columns with zero variance get a scale of 1, so they are only
    /// centred.
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(table: &FeatureTable) -> Result<Self> {
        if table.is_empty() {
            return Err(PrepError::statistics("cannot fit a scaler on an empty table"));
        }
        let n = table.len() as f64;
        let width = table.columns.len();

        let means: Vec<f64> = (0..width)
            .map(|j| table.rows.iter().map(|row| row[j]).sum::<f64>() / n)
            .collect();
        let scales = (0..width)
            .map(|j| {
                let variance = table
                    .rows
                    .iter()
                    .map(|row| (row[j] - means[j]).powi(2))
                    .sum::<f64>()
                    / n;
                let std = variance.sqrt();
                if std > 0.0 { std } else { 1.0 }
            })
            .collect();

        Ok(Self { means, scales })
    }

    /// Fitted column means
    #[must_use]
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Fitted column scales
    #[must_use]
    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    /// Standardise a table with the fitted parameters
    pub fn transform(&self, table: &FeatureTable) -> Result<FeatureTable> {
        if table.columns.len() != self.means.len() {
            return Err(PrepError::schema(format!(
                "scaler fitted on {} columns, table has {}",
                self.means.len(),
                table.columns.len()
            )));
        }
        let rows = table
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(self.means.iter().zip(&self.scales))
                    .map(|(value, (mean, scale))| (value - mean) / scale)
                    .collect()
            })
            .collect();
        Ok(FeatureTable {
            rows,
            ..table.clone()
        })
    }
}

/// Train and test tables, standardised with parameters fitted on train
#[derive(Debug, Clone)]
pub struct ModelInput {
    /// Training rows, scaled
    pub train: FeatureTable,
    /// Held-out rows, scaled with the training parameters
    pub test: FeatureTable,
    /// Scaler fitted on the training rows
    pub scaler: StandardScaler,
}

/// Build, split and scale the feature table
pub fn prepare_model_input(
    records: &[PreparedRecord],
    test_fraction: f64,
    seed: u64,
) -> Result<ModelInput> {
    let table = FeatureTable::from_records(records)?;
    let (train, test) = train_test_split(&table, test_fraction, seed)?;
    let scaler = StandardScaler::fit(&train)?;
    Ok(ModelInput {
        train: scaler.transform(&train)?,
        test: scaler.transform(&test)?,
        scaler,
    })
}
