//! The analysis-ready employee record.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, FieldRef, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use serde::Serialize;

use crate::error::Result;
use crate::models::types::{JobLevel, PerfRank};

/// Employee record with every derived field computed
///
/// Raw fields consumed by derivation (`gender`, `perf_rating`,
/// `promo_decision`) are not carried over. Columns the pipeline does not
/// interpret travel along in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedRecord {
    /// Unique key
    pub employee_id: String,
    /// Hire date, if known
    pub hire_date: Option<NaiveDate>,
    /// Age rounded to one decimal
    pub age: Option<f64>,
    /// Job level code, e.g. `M3`
    pub job_level: String,
    /// Region descriptor
    pub region: Option<String>,
    /// Job function descriptor
    pub job_function: Option<String>,
    /// 1 when a promotion decision was recorded
    pub is_promo: u8,
    /// Role letter of the job level
    pub job_role: String,
    /// Rank digit of the job level
    pub job_rank: u8,
    /// 1 when gender is exactly `men`
    pub is_men: u8,
    /// Performance rank, 1-5
    pub perf_rank: u8,
    /// Years from hire date to the cutoff date, one decimal
    pub tenure: Option<f64>,
    /// Passthrough columns, keyed by column name
    #[serde(skip)]
    pub extra: BTreeMap<String, Option<String>>,
}

/// Comparable image of a record without its key
///
/// Floating point fields are compared by bit pattern, so two rows are
/// duplicates exactly when every value prints identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordFingerprint {
    hire_date: Option<NaiveDate>,
    age: Option<u64>,
    job_level: String,
    region: Option<String>,
    job_function: Option<String>,
    is_promo: u8,
    job_role: String,
    job_rank: u8,
    is_men: u8,
    perf_rank: u8,
    tenure: Option<u64>,
    extra: BTreeMap<String, Option<String>>,
}

impl PreparedRecord {
    /// Assemble a record from its raw passthrough fields and derived values
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        employee_id: String,
        hire_date: Option<NaiveDate>,
        age: Option<f64>,
        job_level: JobLevel,
        region: Option<String>,
        job_function: Option<String>,
        is_promo: bool,
        is_men: bool,
        perf_rank: PerfRank,
        tenure: Option<f64>,
    ) -> Self {
        Self {
            employee_id,
            hire_date,
            age,
            job_level: job_level.to_string(),
            region,
            job_function,
            is_promo: u8::from(is_promo),
            job_role: job_level.role.to_string(),
            job_rank: job_level.rank,
            is_men: u8::from(is_men),
            perf_rank: perf_rank.value(),
            tenure,
            extra: BTreeMap::new(),
        }
    }

    /// Attach passthrough columns
    #[must_use]
    pub fn with_extra(mut self, extra: BTreeMap<String, Option<String>>) -> Self {
        self.extra = extra;
        self
    }

    /// Every field except the key, for duplicate detection
    #[must_use]
    pub fn fingerprint(&self) -> RecordFingerprint {
        RecordFingerprint {
            hire_date: self.hire_date,
            age: self.age.map(f64::to_bits),
            job_level: self.job_level.clone(),
            region: self.region.clone(),
            job_function: self.job_function.clone(),
            is_promo: self.is_promo,
            job_role: self.job_role.clone(),
            job_rank: self.job_rank,
            is_men: self.is_men,
            perf_rank: self.perf_rank,
            tenure: self.tenure.map(f64::to_bits),
            extra: self.extra.clone(),
        }
    }

    /// Arrow schema of the prepared table
    #[must_use]
    pub fn schema() -> Schema {
        Schema::new(vec![
            Field::new("employee_id", DataType::Utf8, false),
            Field::new("hire_date", DataType::Date32, true),
            Field::new("age", DataType::Float64, true),
            Field::new("job_level", DataType::Utf8, false),
            Field::new("region", DataType::Utf8, true),
            Field::new("job_function", DataType::Utf8, true),
            Field::new("is_promo", DataType::UInt8, false),
            Field::new("job_role", DataType::Utf8, false),
            Field::new("job_rank", DataType::UInt8, false),
            Field::new("is_men", DataType::UInt8, false),
            Field::new("perf_rank", DataType::UInt8, false),
            Field::new("tenure", DataType::Float64, true),
        ])
    }

    /// Names of the passthrough columns present on any record, sorted
    #[must_use]
    pub fn extra_columns(records: &[Self]) -> Vec<String> {
        records
            .iter()
            .flat_map(|record| record.extra.keys())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Convert prepared records to a `RecordBatch`
    ///
    /// Passthrough columns follow the fixed columns as nullable text.
    pub fn to_record_batch(records: &[Self]) -> Result<RecordBatch> {
        let schema = Self::schema();
        let mut fields: Vec<FieldRef> = schema.fields().iter().map(Arc::clone).collect();
        let batch = serde_arrow::to_record_batch(&fields, &records)?;

        let extra = Self::extra_columns(records);
        if extra.is_empty() {
            return Ok(batch);
        }
        let mut columns: Vec<ArrayRef> = batch.columns().to_vec();
        for name in extra {
            let values: StringArray = records
                .iter()
                .map(|record| record.extra.get(&name).cloned().flatten())
                .collect();
            fields.push(Arc::new(Field::new(name, DataType::Utf8, true)));
            columns.push(Arc::new(values));
        }
        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;

    fn record(id: &str) -> PreparedRecord {
        PreparedRecord::new(
            id.to_string(),
            NaiveDate::from_ymd_opt(2020, 1, 15),
            Some(41.3),
            "M3".parse().unwrap(),
            Some("North".to_string()),
            None,
            true,
            false,
            PerfRank::try_from(4).unwrap(),
            Some(3.7),
        )
    }

    #[test]
    fn derived_fields_follow_job_level() {
        let r = record("1");
        assert_eq!(r.job_level, "M3");
        assert_eq!(r.job_role, "M");
        assert_eq!(r.job_rank, 3);
        assert_eq!(r.is_promo, 1);
        assert_eq!(r.is_men, 0);
    }

    #[test]
    fn fingerprint_ignores_the_key() {
        assert_eq!(record("1").fingerprint(), record("2").fingerprint());
        let mut other = record("3");
        other.tenure = Some(3.8);
        assert_ne!(record("1").fingerprint(), other.fingerprint());
    }

    #[test]
    fn fingerprint_includes_passthrough_columns() {
        let managed = |manager: &str| {
            BTreeMap::from([("manager".to_string(), Some(manager.to_string()))])
        };
        let alice = record("1").with_extra(managed("Alice"));
        let bob = record("2").with_extra(managed("Bob"));
        assert_ne!(alice.fingerprint(), bob.fingerprint());
        assert_eq!(alice.fingerprint(), record("3").with_extra(managed("Alice")).fingerprint());
    }

    #[test]
    fn passthrough_columns_follow_the_fixed_ones() {
        let extra = BTreeMap::from([
            ("manager".to_string(), Some("Alice".to_string())),
            ("badge".to_string(), None),
        ]);
        let batch = PreparedRecord::to_record_batch(&[record("1").with_extra(extra), record("2")])
            .unwrap();
        let schema = batch.schema();
        let fixed = PreparedRecord::schema().fields().len();
        assert_eq!(schema.fields().len(), fixed + 2);
        assert_eq!(schema.field(fixed).name(), "badge");
        assert_eq!(schema.field(fixed + 1).name(), "manager");
        let managers = batch.column(fixed + 1).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(managers.value(0), "Alice");
        assert!(managers.is_null(1));
    }

    #[test]
    fn converts_to_record_batch() {
        let batch = PreparedRecord::to_record_batch(&[record("1"), record("2")]).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.schema().field(1).data_type(), &DataType::Date32);
        assert_eq!(batch.column(5).null_count(), 2);
    }
}
