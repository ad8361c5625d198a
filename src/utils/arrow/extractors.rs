//! Field extraction utilities for Arrow record batches
//!
//! Column-at-a-time extractors that turn an Arrow column into a vector of
//! typed values, one per row, with nulls as `None`.

use arrow::array::{Array, Date32Array, Float64Array, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::Result;
use crate::schema::date_utils::{DateFormatConfig, parse_datetime_string};
use crate::utils::arrow::array_utils::{downcast_array, get_column};

/// A date cell as read from the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateCell {
    /// Null or empty cell
    Missing,
    /// A valid calendar date
    Valid(NaiveDate),
    /// A date with a time of day other than midnight
    Timestamp(NaiveDateTime),
    /// Text that no configured format could parse
    Unparsed(String),
}

impl DateCell {
    /// Classify a point in time; midnight values are plain dates
    #[must_use]
    pub fn from_datetime(datetime: NaiveDateTime) -> Self {
        if datetime.time() == NaiveTime::MIN {
            Self::Valid(datetime.date())
        } else {
            Self::Timestamp(datetime)
        }
    }

    /// The date, if the cell held a valid one
    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::Valid(date) => Some(*date),
            Self::Timestamp(datetime) => Some(datetime.date()),
            Self::Missing | Self::Unparsed(_) => None,
        }
    }

    /// The point in time, if the cell held a valid one; dates are taken at midnight
    #[must_use]
    pub fn datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Valid(date) => Some(date.and_time(NaiveTime::MIN)),
            Self::Timestamp(datetime) => Some(*datetime),
            Self::Missing | Self::Unparsed(_) => None,
        }
    }
}

/// Extract a required column as text
///
/// Only null cells become `None`; values are returned exactly as stored,
/// including empty and whitespace-only strings.
pub fn extract_strings(batch: &RecordBatch, column_name: &str) -> Result<Vec<Option<String>>> {
    let array = get_column(batch, column_name, &DataType::Utf8, true)?
        .unwrap_or_else(|| arrow::array::new_null_array(&DataType::Utf8, batch.num_rows()));
    let strings = downcast_array::<StringArray>(&array, column_name, "String")?;

    Ok(strings
        .iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

/// Extract a required column as floating point values, treating NaN as null
pub fn extract_f64s(batch: &RecordBatch, column_name: &str) -> Result<Vec<Option<f64>>> {
    let array = get_column(batch, column_name, &DataType::Float64, true)?
        .unwrap_or_else(|| arrow::array::new_null_array(&DataType::Float64, batch.num_rows()));
    let floats = downcast_array::<Float64Array>(&array, column_name, "Float64")?;

    Ok((0..floats.len())
        .map(|row| {
            (!floats.is_null(row))
                .then(|| floats.value(row))
                .filter(|value| !value.is_nan())
        })
        .collect())
}

/// Extract a required date column
///
/// Date and timestamp columns are converted directly; text columns are
/// parsed with the configured formats. A time of day is kept, so tenure
/// can be counted in whole elapsed days.
pub fn extract_dates(
    batch: &RecordBatch,
    column_name: &str,
    date_config: &DateFormatConfig,
) -> Result<Vec<DateCell>> {
    let schema = batch.schema();
    let data_type = schema
        .field_with_name(column_name)
        .map(|field| field.data_type().clone())
        .unwrap_or(DataType::Null);

    if matches!(data_type, DataType::Utf8 | DataType::LargeUtf8) {
        return Ok(extract_strings(batch, column_name)?
            .into_iter()
            .map(|value| match value {
                None => DateCell::Missing,
                Some(text) if text.trim().is_empty() => DateCell::Missing,
                Some(text) => parse_datetime_string(&text, date_config)
                    .map_or(DateCell::Unparsed(text), DateCell::from_datetime),
            })
            .collect());
    }

    if matches!(data_type, DataType::Timestamp(_, _) | DataType::Date64) {
        let target = DataType::Timestamp(TimeUnit::Microsecond, None);
        let array = get_column(batch, column_name, &target, true)?
            .unwrap_or_else(|| arrow::array::new_null_array(&target, batch.num_rows()));
        let stamps = downcast_array::<TimestampMicrosecondArray>(&array, column_name, "Timestamp")?;
        return Ok((0..stamps.len())
            .map(|row| {
                if stamps.is_null(row) {
                    return DateCell::Missing;
                }
                stamps
                    .value_as_datetime(row)
                    .map_or(DateCell::Missing, DateCell::from_datetime)
            })
            .collect());
    }

    let array = get_column(batch, column_name, &DataType::Date32, true)?
        .unwrap_or_else(|| arrow::array::new_null_array(&DataType::Date32, batch.num_rows()));
    let dates = downcast_array::<Date32Array>(&array, column_name, "Date32")?;

    Ok((0..dates.len())
        .map(|row| {
            if dates.is_null(row) {
                return DateCell::Missing;
            }
            days_to_date(dates.value(row)).map_or(DateCell::Missing, DateCell::Valid)
        })
        .collect())
}

/// Extract the join key as text
///
/// Integral floating point keys print without a decimal point, so a key
/// read as `1001.0` from one source matches `1001` from another. Text keys
/// are trimmed; a blank key is treated as missing.
pub fn extract_keys(batch: &RecordBatch, column_name: &str) -> Result<Vec<Option<String>>> {
    let schema = batch.schema();
    let is_float = schema
        .field_with_name(column_name)
        .is_ok_and(|field| field.data_type().is_floating());

    if !is_float {
        return Ok(extract_strings(batch, column_name)?
            .into_iter()
            .map(|value| {
                value
                    .map(|text| text.trim().to_string())
                    .filter(|text| !text.is_empty())
            })
            .collect());
    }

    Ok(extract_f64s(batch, column_name)?
        .into_iter()
        .map(|value| {
            value.map(|v| {
                if v.fract() == 0.0 && v.abs() < 9.0e15 {
                    format!("{v:.0}")
                } else {
                    v.to_string()
                }
            })
        })
        .collect())
}

/// Convert days since the Unix epoch to a date
#[must_use]
pub fn days_to_date(days: i32) -> Option<NaiveDate> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
    if days >= 0 {
        epoch.checked_add_days(Days::new(u64::from(days.unsigned_abs())))
    } else {
        epoch.checked_sub_days(Days::new(u64::from(days.unsigned_abs())))
    }
}

/// Convert a date to days since the Unix epoch
#[must_use]
pub fn date_to_days(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN);
    i32::try_from(date.signed_duration_since(epoch).num_days()).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Int64Array};
    use arrow::datatypes::{Field, Schema};
    use std::sync::Arc;

    fn batch(name: &str, array: ArrayRef) -> RecordBatch {
        let schema = Schema::new(vec![Field::new(name, array.data_type().clone(), true)]);
        RecordBatch::try_new(Arc::new(schema), vec![array]).unwrap()
    }

    #[test]
    fn text_is_kept_as_stored() {
        let b = batch(
            "g",
            Arc::new(StringArray::from(vec![Some("men"), Some(" men"), Some(" "), Some(""), None])),
        );
        assert_eq!(
            extract_strings(&b, "g").unwrap(),
            vec![
                Some("men".to_string()),
                Some(" men".to_string()),
                Some(" ".to_string()),
                Some(String::new()),
                None
            ]
        );
    }

    #[test]
    fn text_keys_are_trimmed() {
        let b = batch("id", Arc::new(StringArray::from(vec![Some(" 1001 "), Some("  "), None])));
        assert_eq!(
            extract_keys(&b, "id").unwrap(),
            vec![Some("1001".to_string()), None, None]
        );
    }

    #[test]
    fn float_keys_print_as_integers() {
        let b = batch("id", Arc::new(Float64Array::from(vec![Some(1001.0), Some(7.5), None])));
        assert_eq!(
            extract_keys(&b, "id").unwrap(),
            vec![Some("1001".to_string()), Some("7.5".to_string()), None]
        );
        let b = batch("id", Arc::new(Int64Array::from(vec![1001])));
        assert_eq!(extract_keys(&b, "id").unwrap(), vec![Some("1001".to_string())]);
    }

    #[test]
    fn dates_from_text_and_date32() {
        let config = DateFormatConfig::default();
        let b = batch("d", Arc::new(StringArray::from(vec![Some("2022-03-30"), Some("never"), None])));
        let cells = extract_dates(&b, "d", &config).unwrap();
        assert_eq!(cells[0].date(), NaiveDate::from_ymd_opt(2022, 3, 30));
        assert_eq!(cells[1], DateCell::Unparsed("never".to_string()));
        assert_eq!(cells[2], DateCell::Missing);

        let day = date_to_days(NaiveDate::from_ymd_opt(2022, 3, 30).unwrap());
        let b = batch("d", Arc::new(Date32Array::from(vec![Some(day), None])));
        let cells = extract_dates(&b, "d", &config).unwrap();
        assert_eq!(cells[0].date(), NaiveDate::from_ymd_opt(2022, 3, 30));
        assert_eq!(cells[1], DateCell::Missing);
    }

    #[test]
    fn timestamps_keep_the_time_of_day() {
        let config = DateFormatConfig::default();
        let noon = NaiveDate::from_ymd_opt(2022, 3, 30)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let midnight = NaiveDate::from_ymd_opt(2022, 3, 31)
            .unwrap()
            .and_time(NaiveTime::MIN);
        let micros = |dt: NaiveDateTime| dt.and_utc().timestamp_micros();
        let b = batch(
            "d",
            Arc::new(TimestampMicrosecondArray::from(vec![Some(micros(noon)), Some(micros(midnight)), None])),
        );
        let cells = extract_dates(&b, "d", &config).unwrap();
        assert_eq!(cells[0], DateCell::Timestamp(noon));
        assert_eq!(cells[0].date(), NaiveDate::from_ymd_opt(2022, 3, 30));
        assert_eq!(cells[1], DateCell::Valid(midnight.date()));
        assert_eq!(cells[2], DateCell::Missing);

        let b = batch("d", Arc::new(StringArray::from(vec!["2022-03-30 12:00:00", " "])));
        let cells = extract_dates(&b, "d", &config).unwrap();
        assert_eq!(cells[0], DateCell::Timestamp(noon));
        assert_eq!(cells[1], DateCell::Missing);
    }

    #[test]
    fn missing_column_is_an_error() {
        let b = batch("a", Arc::new(Int64Array::from(vec![1])));
        assert!(extract_strings(&b, "b").is_err());
    }
}
