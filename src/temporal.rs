//! Date thresholds and date-column coercion.
//!
//! Date splits compare every value of a date column against one or two
//! [`DateThreshold`]s. Columns that are not already date/time typed are cast
//! to `Timestamp(Microsecond, None)` first; the cast always produces a new
//! batch and never touches the caller's data.
//!
//! All comparisons are between UTC instants. Timezone-aware timestamp
//! columns compare by the instant they store, not their local wall-clock
//! time, and RFC 3339 thresholds with an offset are normalised to UTC.

use std::{fmt, str::FromStr, sync::Arc};

use arrow::{
    array::{ArrayRef, AsArray, RecordBatch},
    compute::{cast_with_options, CastOptions},
    datatypes::{DataType, Field, Schema, TimeUnit, TimestampMicrosecondType},
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Type that non-temporal date columns are coerced to.
pub const COERCED_DATE_TYPE: DataType = DataType::Timestamp(TimeUnit::Microsecond, None);

/// Formats accepted by [`DateThreshold::from_str`], besides RFC 3339.
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// A cutoff date/time for threshold splits.
///
/// Thresholds are naive date/times read as UTC. They compare against the
/// UTC instant of each row.
///
/// # Example
///
/// ```ignore
/// use cortar::DateThreshold;
///
/// let cutoff: DateThreshold = "2020-01-05".parse()?;
/// let cutoff = DateThreshold::from(chrono::NaiveDate::from_ymd_opt(2020, 1, 5).unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateThreshold(NaiveDateTime);

impl DateThreshold {
    /// Creates a threshold from a naive date/time.
    pub fn new(value: NaiveDateTime) -> Self {
        Self(value)
    }

    /// Returns the threshold as a naive date/time.
    pub fn value(&self) -> NaiveDateTime {
        self.0
    }

    /// Microseconds since the Unix epoch, the unit date columns compare in.
    pub fn timestamp_micros(&self) -> i64 {
        self.0.and_utc().timestamp_micros()
    }
}

impl From<NaiveDateTime> for DateThreshold {
    fn from(value: NaiveDateTime) -> Self {
        Self(value)
    }
}

impl From<NaiveDate> for DateThreshold {
    fn from(value: NaiveDate) -> Self {
        Self(value.and_time(NaiveTime::default()))
    }
}

impl From<DateTime<Utc>> for DateThreshold {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value.naive_utc())
    }
}

impl FromStr for DateThreshold {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self(dt.naive_utc()));
        }
        for format in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(Self(dt));
            }
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self::from)
            .map_err(|e| Error::parse(format!("invalid date threshold '{s}': {e}")))
    }
}

impl TryFrom<String> for DateThreshold {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl TryFrom<&str> for DateThreshold {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        value.parse()
    }
}

impl From<DateThreshold> for String {
    fn from(value: DateThreshold) -> Self {
        value.to_string()
    }
}

impl fmt::Display for DateThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.time() == NaiveTime::default() {
            write!(f, "{}", self.0.date())
        } else {
            write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%S%.f"))
        }
    }
}

/// Returns true if `data_type` already holds date/time values.
pub fn is_temporal(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _)
    )
}

/// Coerces the named column to date/time values.
///
/// Returns the batch and whether a cast happened. Columns already typed
/// `Date32`, `Date64` or `Timestamp` come back unchanged; any other column is
/// cast to [`COERCED_DATE_TYPE`] in a new batch.
///
/// # Errors
///
/// Returns [`Error::ColumnNotFound`] if the column is absent and
/// [`Error::DateCoercion`] if any value cannot be read as a date/time.
pub fn coerce_date_column(batch: &RecordBatch, column: &str) -> Result<(RecordBatch, bool)> {
    let schema = batch.schema();
    let idx = schema
        .index_of(column)
        .map_err(|_| Error::column_not_found(column))?;

    let field = schema.field(idx);
    if is_temporal(field.data_type()) {
        return Ok((batch.clone(), false));
    }

    let coerced = cast_strict(batch.column(idx), &COERCED_DATE_TYPE)
        .map_err(|e| Error::date_coercion(column, e))?;

    tracing::trace!(
        column,
        from = %field.data_type(),
        to = %COERCED_DATE_TYPE,
        "coerced date column"
    );

    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .enumerate()
        .map(|(i, f)| {
            if i == idx {
                Field::new(f.name(), COERCED_DATE_TYPE, f.is_nullable())
            } else {
                f.as_ref().clone()
            }
        })
        .collect();
    let mut columns: Vec<ArrayRef> = batch.columns().to_vec();
    columns[idx] = coerced;

    let new_schema = Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()));
    let batch = RecordBatch::try_new(new_schema, columns)?;
    Ok((batch, true))
}

/// Reads a temporal column as microseconds since the Unix epoch.
///
/// # Errors
///
/// Returns [`Error::NullDate`] on the first null value.
pub(crate) fn timestamp_micros(column: &str, values: &ArrayRef) -> Result<Vec<i64>> {
    let normalized = cast_strict(values, &COERCED_DATE_TYPE)
        .map_err(|e| Error::date_coercion(column, e))?;
    let micros = normalized.as_primitive::<TimestampMicrosecondType>();

    micros
        .iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| Error::NullDate {
                column: column.to_string(),
                row,
            })
        })
        .collect()
}

fn cast_strict(
    array: &ArrayRef,
    to: &DataType,
) -> std::result::Result<ArrayRef, arrow::error::ArrowError> {
    let options = CastOptions {
        safe: false,
        ..Default::default()
    };
    cast_with_options(array.as_ref(), to, &options)
}
