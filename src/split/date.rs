//! Threshold splits on a date-valued column.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, RecordBatch};

use super::{take_three_way, SplitIndices, TrainTestSplit, TrainValTestSplit};
use crate::{
    dataset::LabeledDataset,
    error::{Error, Result},
    temporal::{coerce_date_column, timestamp_micros, DateThreshold},
};

/// Result of a single-threshold date split.
///
/// When one side of the threshold is empty the split is not meaningful:
/// the whole dataset sits in the non-empty slot and the other slot is
/// `None`. An empty input leaves every slot `None`.
#[derive(Debug, Clone, Default)]
pub struct DateTrainTestSplit {
    /// Training features (dates before the threshold)
    pub x_train: Option<RecordBatch>,
    /// Test features (dates on or after the threshold)
    pub x_test: Option<RecordBatch>,
    /// Training labels
    pub y_train: Option<ArrayRef>,
    /// Test labels
    pub y_test: Option<ArrayRef>,
    /// The full feature batch after date coercion, if requested and a cast
    /// happened
    pub coerced: Option<RecordBatch>,
}

impl DateTrainTestSplit {
    /// Returns true if either side of the threshold came out empty.
    pub fn is_degenerate(&self) -> bool {
        self.x_train.is_none() || self.x_test.is_none()
    }

    /// Returns `(x_train, x_test, y_train, y_test)`.
    pub fn into_parts(
        self,
    ) -> (
        Option<RecordBatch>,
        Option<RecordBatch>,
        Option<ArrayRef>,
        Option<ArrayRef>,
    ) {
        (self.x_train, self.x_test, self.y_train, self.y_test)
    }

    /// Returns the split with both sides present, or `None` if degenerate.
    pub fn into_complete(self) -> Option<TrainTestSplit> {
        Some(TrainTestSplit {
            x_train: self.x_train?,
            x_test: self.x_test?,
            y_train: self.y_train?,
            y_test: self.y_test?,
        })
    }
}

/// Result of a two-threshold date split.
///
/// Empty subsets are returned as empty batches, never collapsed.
#[derive(Debug, Clone)]
pub struct DateTrainValTestSplit {
    /// The three subsets
    pub split: TrainValTestSplit,
    /// The full feature batch after date coercion, if requested and a cast
    /// happened
    pub coerced: Option<RecordBatch>,
}

impl DateTrainValTestSplit {
    /// Returns `(x_train, x_val, x_test, y_train, y_val, y_test)`.
    pub fn into_parts(
        self,
    ) -> (
        RecordBatch,
        RecordBatch,
        RecordBatch,
        ArrayRef,
        ArrayRef,
        ArrayRef,
    ) {
        self.split.into_parts()
    }
}

/// Splits rows by comparing a date column against fixed thresholds.
///
/// Non-temporal columns (e.g. ISO-8601 strings) are coerced to timestamps
/// in a copy. The subsets are built from that copy; the caller's batch is
/// never modified. Set [`DateSplitter::keep_coerced`] to also get the whole
/// coerced batch back.
///
/// # Example
///
/// ```ignore
/// use cortar::DateSplitter;
///
/// let split = DateSplitter::new("date")
///     .keep_coerced(true)
///     .train_val_test(&x, &y, "2020-01-04".parse()?, "2020-01-08".parse()?)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateSplitter {
    column: String,
    keep_coerced: bool,
}

struct Prepared {
    data: LabeledDataset,
    micros: Vec<i64>,
    coerced: Option<RecordBatch>,
}

impl DateSplitter {
    /// Creates a splitter on the named date column.
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            keep_coerced: false,
        }
    }

    /// Returns the date column name.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Whether to return the full coerced feature batch with the split.
    #[must_use]
    pub fn keep_coerced(mut self, keep: bool) -> Self {
        self.keep_coerced = keep;
        self
    }

    /// Splits at a single threshold: dates before `date_split` train, the
    /// rest test.
    ///
    /// If either side would be empty, returns the degenerate form described
    /// on [`DateTrainTestSplit`] rather than an error.
    ///
    /// # Errors
    ///
    /// Returns error if the column is absent, `x` and `y` differ in length,
    /// or the column cannot be read as dates.
    pub fn train_test(
        &self,
        x: &RecordBatch,
        y: &ArrayRef,
        date_split: DateThreshold,
    ) -> Result<DateTrainTestSplit> {
        self.check_inputs(x, y)?;
        let prepared = self.prepare(x, y)?;

        let threshold = date_split.timestamp_micros();
        let (train, test): (Vec<usize>, Vec<usize>) =
            (0..prepared.data.len()).partition(|&row| prepared.micros[row] < threshold);

        tracing::debug!(
            column = %self.column,
            %date_split,
            train = train.len(),
            test = test.len(),
            "date train/test split"
        );

        let coerced = prepared.coerced;
        let split = match (train.is_empty(), test.is_empty()) {
            (true, true) => DateTrainTestSplit {
                coerced,
                ..Default::default()
            },
            (false, true) => {
                let (x_all, y_all) = prepared.data.into_parts();
                DateTrainTestSplit {
                    x_train: Some(x_all),
                    y_train: Some(y_all),
                    coerced,
                    ..Default::default()
                }
            }
            (true, false) => {
                let (x_all, y_all) = prepared.data.into_parts();
                DateTrainTestSplit {
                    x_test: Some(x_all),
                    y_test: Some(y_all),
                    coerced,
                    ..Default::default()
                }
            }
            (false, false) => {
                let (x_train, y_train) = prepared.data.take(&train)?.into_parts();
                let (x_test, y_test) = prepared.data.take(&test)?.into_parts();
                DateTrainTestSplit {
                    x_train: Some(x_train),
                    x_test: Some(x_test),
                    y_train: Some(y_train),
                    y_test: Some(y_test),
                    coerced,
                }
            }
        };
        Ok(split)
    }

    /// Splits at two thresholds: dates before `validation_date` train, dates
    /// in `[validation_date, test_date)` validate, the rest test.
    ///
    /// Equal thresholds give an empty validation subset.
    ///
    /// # Errors
    ///
    /// Returns error if the column is absent, `x` and `y` differ in length,
    /// `validation_date` is after `test_date`, or the column cannot be read
    /// as dates.
    pub fn train_val_test(
        &self,
        x: &RecordBatch,
        y: &ArrayRef,
        validation_date: DateThreshold,
        test_date: DateThreshold,
    ) -> Result<DateTrainValTestSplit> {
        self.check_inputs(x, y)?;
        check_threshold_order(validation_date, test_date)?;
        let prepared = self.prepare(x, y)?;

        let val_start = validation_date.timestamp_micros();
        let test_start = test_date.timestamp_micros();

        let mut indices = SplitIndices::default();
        for (row, &ts) in prepared.micros.iter().enumerate() {
            if ts < val_start {
                indices.train.push(row);
            } else if ts < test_start {
                indices.validation.push(row);
            } else {
                indices.test.push(row);
            }
        }

        tracing::debug!(
            column = %self.column,
            %validation_date,
            %test_date,
            train = indices.train.len(),
            validation = indices.validation.len(),
            test = indices.test.len(),
            "date train/validation/test split"
        );

        Ok(DateTrainValTestSplit {
            split: take_three_way(&prepared.data, &indices)?,
            coerced: prepared.coerced,
        })
    }

    fn check_inputs(&self, x: &RecordBatch, y: &ArrayRef) -> Result<()> {
        if x.schema().index_of(&self.column).is_err() {
            return Err(Error::column_not_found(&self.column));
        }
        if x.num_rows() != y.len() {
            return Err(Error::length_mismatch(x.num_rows(), y.len()));
        }
        Ok(())
    }

    fn prepare(&self, x: &RecordBatch, y: &ArrayRef) -> Result<Prepared> {
        let (batch, did_cast) = coerce_date_column(x, &self.column)?;
        let idx = batch.schema().index_of(&self.column)?;
        let micros = timestamp_micros(&self.column, batch.column(idx))?;

        let coerced = (self.keep_coerced && did_cast).then(|| batch.clone());
        let data = LabeledDataset::new(batch, Arc::clone(y))?;

        Ok(Prepared {
            data,
            micros,
            coerced,
        })
    }
}

pub(crate) fn check_threshold_order(
    validation_date: DateThreshold,
    test_date: DateThreshold,
) -> Result<()> {
    if validation_date > test_date {
        return Err(Error::ThresholdOrder {
            validation: validation_date.to_string(),
            test: test_date.to_string(),
        });
    }
    Ok(())
}

/// Splits `x` and `y` at `date_split` on the named date column.
///
/// Rows dated before the threshold train, the rest test, each in original
/// row order. See [`DateSplitter::train_test`].
///
/// # Errors
/// Returns error if the column is absent, `x` and `y` differ in length, or
/// the column cannot be read as dates
pub fn date_based_split(
    x: &RecordBatch,
    y: &ArrayRef,
    date_col: &str,
    date_split: DateThreshold,
) -> Result<DateTrainTestSplit> {
    DateSplitter::new(date_col).train_test(x, y, date_split)
}

/// Splits `x` and `y` into train, validation and test on the named date
/// column. See [`DateSplitter::train_val_test`].
///
/// # Errors
/// Returns error if the column is absent, `x` and `y` differ in length,
/// `validation_date > test_date`, or the column cannot be read as dates
pub fn date_based_val_split(
    x: &RecordBatch,
    y: &ArrayRef,
    date_col: &str,
    validation_date: DateThreshold,
    test_date: DateThreshold,
) -> Result<DateTrainValTestSplit> {
    DateSplitter::new(date_col).train_val_test(x, y, validation_date, test_date)
}

#[cfg(test)]
mod tests {
    use arrow::{
        array::{Date32Array, Int32Array, StringArray, TimestampMicrosecondArray},
        datatypes::{DataType, Field, Schema},
    };

    use super::*;
    use crate::temporal::COERCED_DATE_TYPE;

    /// Ten rows dated 2020-01-01 through 2020-01-10 as strings, labels
    /// equal to the row id
    fn make_dated(n: usize) -> (RecordBatch, ArrayRef) {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int32, false),
            Field::new("date", DataType::Utf8, false),
        ]));

        let ids: Vec<i32> = (0..n as i32).collect();
        let dates: Vec<String> = (1..=n).map(|d| format!("2020-01-{d:02}")).collect();

        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int32Array::from(ids.clone())),
                Arc::new(StringArray::from(dates)),
            ],
        )
        .expect("batch creation failed");

        (batch, Arc::new(Int32Array::from(ids)))
    }

    fn date(s: &str) -> DateThreshold {
        s.parse().expect("threshold")
    }

    fn ids(batch: &RecordBatch) -> Vec<i32> {
        batch
            .column(0)
            .as_any()
            .downcast_ref::<Int32Array>()
            .expect("downcast")
            .values()
            .to_vec()
    }

    // ========== date_based_split tests ==========

    #[test]
    fn test_threshold_inside_range() {
        let (x, y) = make_dated(10);

        let split = date_based_split(&x, &y, "date", date("2020-01-05")).expect("split failed");

        assert!(!split.is_degenerate());
        let (x_train, x_test, y_train, y_test) = split.into_parts();
        let x_train = x_train.expect("train");
        let x_test = x_test.expect("test");
        assert_eq!(ids(&x_train), vec![0, 1, 2, 3]);
        assert_eq!(ids(&x_test), vec![4, 5, 6, 7, 8, 9]);
        assert_eq!(y_train.expect("y_train").len(), 4);
        assert_eq!(y_test.expect("y_test").len(), 6);
    }

    #[test]
    fn test_subsets_carry_coerced_column() {
        let (x, y) = make_dated(10);

        let split = date_based_split(&x, &y, "date", date("2020-01-05")).expect("split failed");

        let x_train = split.x_train.expect("train");
        assert_eq!(x_train.schema().field(1).data_type(), &COERCED_DATE_TYPE);
        assert!(split.coerced.is_none());
        assert_eq!(x.schema().field(1).data_type(), &DataType::Utf8);
    }

    #[test]
    fn test_threshold_before_all_dates() {
        let (x, y) = make_dated(10);

        let split = date_based_split(&x, &y, "date", date("2019-12-31")).expect("split failed");

        assert!(split.is_degenerate());
        let (x_train, x_test, y_train, y_test) = split.into_parts();
        assert!(x_train.is_none());
        assert!(y_train.is_none());
        assert_eq!(x_test.expect("whole dataset").num_rows(), 10);
        assert_eq!(y_test.expect("all labels").len(), 10);
    }

    #[test]
    fn test_threshold_after_all_dates() {
        let (x, y) = make_dated(10);

        let split = date_based_split(&x, &y, "date", date("2021-01-01")).expect("split failed");

        assert!(split.is_degenerate());
        assert_eq!(split.x_train.as_ref().expect("whole").num_rows(), 10);
        assert_eq!(split.y_train.as_ref().expect("all labels").len(), 10);
        assert!(split.x_test.is_none());
        assert!(split.y_test.is_none());
        assert!(split.into_complete().is_none());
    }

    #[test]
    fn test_threshold_equal_to_first_date_goes_to_test() {
        let (x, y) = make_dated(3);

        let split = date_based_split(&x, &y, "date", date("2020-01-01")).expect("split failed");

        assert!(split.x_train.is_none());
        assert_eq!(split.x_test.expect("whole").num_rows(), 3);
    }

    #[test]
    fn test_empty_input_is_all_absent() {
        let (x, y) = make_dated(0);

        let split = date_based_split(&x, &y, "date", date("2020-01-05")).expect("split failed");

        let (a, b, c, d) = split.into_parts();
        assert!(a.is_none() && b.is_none() && c.is_none() && d.is_none());
    }

    #[test]
    fn test_into_complete() {
        let (x, y) = make_dated(10);

        let split = date_based_split(&x, &y, "date", date("2020-01-03"))
            .expect("split failed")
            .into_complete()
            .expect("complete");

        assert_eq!(split.x_train.num_rows(), 2);
        assert_eq!(split.x_test.num_rows(), 8);
    }

    #[test]
    fn test_preserves_original_order() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int32, false),
            Field::new("date", DataType::Utf8, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int32Array::from(vec![0, 1, 2, 3, 4])),
                Arc::new(StringArray::from(vec![
                    "2020-03-01",
                    "2020-01-01",
                    "2020-04-01",
                    "2020-02-01",
                    "2020-01-15",
                ])),
            ],
        )
        .expect("batch");
        let y: ArrayRef = Arc::new(Int32Array::from(vec![0, 1, 2, 3, 4]));

        let split = date_based_split(&batch, &y, "date", date("2020-02-15")).expect("split failed");

        assert_eq!(ids(split.x_train.as_ref().expect("train")), vec![1, 3, 4]);
        assert_eq!(ids(split.x_test.as_ref().expect("test")), vec![0, 2]);
        let y_test = split.y_test.expect("y_test");
        let y_test = y_test
            .as_any()
            .downcast_ref::<Int32Array>()
            .expect("downcast");
        assert_eq!(y_test.values().to_vec(), vec![0, 2]);
    }

    #[test]
    fn test_date32_column_needs_no_coercion() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int32, false),
            Field::new("day", DataType::Date32, false),
        ]));
        // 2020-01-01 .. 2020-01-04
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int32Array::from(vec![0, 1, 2, 3])),
                Arc::new(Date32Array::from(vec![18262, 18263, 18264, 18265])),
            ],
        )
        .expect("batch");
        let y: ArrayRef = Arc::new(Int32Array::from(vec![0, 1, 2, 3]));

        let split = DateSplitter::new("day")
            .keep_coerced(true)
            .train_test(&batch, &y, date("2020-01-03"))
            .expect("split failed");

        assert!(split.coerced.is_none());
        let x_train = split.x_train.expect("train");
        assert_eq!(x_train.schema().field(1).data_type(), &DataType::Date32);
        assert_eq!(ids(&x_train), vec![0, 1]);
    }

    #[test]
    fn test_timestamp_threshold_with_time_of_day() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int32, false),
            Field::new("ts", COERCED_DATE_TYPE, false),
        ]));
        let noon = date("2020-01-01T12:00:00").timestamp_micros();
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int32Array::from(vec![0, 1, 2])),
                Arc::new(TimestampMicrosecondArray::from(vec![
                    noon - 1,
                    noon,
                    noon + 1,
                ])),
            ],
        )
        .expect("batch");
        let y: ArrayRef = Arc::new(Int32Array::from(vec![0, 1, 2]));

        let split =
            date_based_split(&batch, &y, "ts", date("2020-01-01 12:00:00")).expect("split failed");

        assert_eq!(ids(split.x_train.as_ref().expect("train")), vec![0]);
        assert_eq!(ids(split.x_test.as_ref().expect("test")), vec![1, 2]);
    }

    #[test]
    fn test_zoned_timestamps_compare_as_utc_instants() {
        // local 05:00 and 11:00 in +05:00
        let midnight = date("2020-01-05T00:00:00Z").timestamp_micros();
        let six = date("2020-01-05T06:00:00Z").timestamp_micros();
        let ts: ArrayRef =
            Arc::new(TimestampMicrosecondArray::from(vec![midnight, six]).with_timezone("+05:00"));
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int32, false),
            Field::new("ts", ts.data_type().clone(), false),
        ]));
        let batch = RecordBatch::try_new(schema, vec![Arc::new(Int32Array::from(vec![0, 1])), ts])
            .expect("batch");
        let y: ArrayRef = Arc::new(Int32Array::from(vec![0, 1]));

        let split =
            date_based_split(&batch, &y, "ts", date("2020-01-05T03:00:00Z")).expect("split failed");

        assert_eq!(ids(split.x_train.as_ref().expect("train")), vec![0]);
        assert_eq!(ids(split.x_test.as_ref().expect("test")), vec![1]);

        // the same instants written with an offset split the same way
        let strings = RecordBatch::try_new(
            Arc::new(Schema::new(vec![
                Field::new("id", DataType::Int32, false),
                Field::new("ts", DataType::Utf8, false),
            ])),
            vec![
                Arc::new(Int32Array::from(vec![0, 1])),
                Arc::new(StringArray::from(vec![
                    "2020-01-05T05:00:00+05:00",
                    "2020-01-05T11:00:00+05:00",
                ])),
            ],
        )
        .expect("batch");
        let split = date_based_split(&strings, &y, "ts", date("2020-01-05T03:00:00Z"))
            .expect("split failed");

        assert_eq!(ids(split.x_train.as_ref().expect("train")), vec![0]);
        assert_eq!(ids(split.x_test.as_ref().expect("test")), vec![1]);
    }

    #[test]
    fn test_keep_coerced_returns_whole_batch() {
        let (x, y) = make_dated(10);

        let split = DateSplitter::new("date")
            .keep_coerced(true)
            .train_test(&x, &y, date("2020-01-05"))
            .expect("split failed");

        let coerced = split.coerced.expect("coerced batch");
        assert_eq!(coerced.num_rows(), 10);
        assert_eq!(coerced.schema().field(1).data_type(), &COERCED_DATE_TYPE);
    }

    #[test]
    fn test_missing_column() {
        let (x, y) = make_dated(10);

        let err = date_based_split(&x, &y, "when", date("2020-01-05")).unwrap_err();
        assert!(matches!(err, Error::ColumnNotFound { .. }));
    }

    #[test]
    fn test_length_mismatch() {
        let (x, _) = make_dated(5);
        let (_, y) = make_dated(4);

        let err = date_based_split(&x, &y, "date", date("2020-01-05")).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { .. }));
    }

    #[test]
    fn test_unparseable_dates() {
        let schema = Arc::new(Schema::new(vec![Field::new("date", DataType::Utf8, false)]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(StringArray::from(vec!["2020-01-01", "not-a-date"]))],
        )
        .expect("batch");
        let y: ArrayRef = Arc::new(Int32Array::from(vec![0, 1]));

        let err = date_based_split(&batch, &y, "date", date("2020-01-05")).unwrap_err();
        assert!(matches!(err, Error::DateCoercion { .. }));
        assert!(err.to_string().contains("'date'"));
    }

    #[test]
    fn test_null_dates_rejected() {
        let schema = Arc::new(Schema::new(vec![Field::new("date", DataType::Utf8, true)]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(StringArray::from(vec![
                Some("2020-01-01"),
                None,
                Some("2020-01-03"),
            ]))],
        )
        .expect("batch");
        let y: ArrayRef = Arc::new(Int32Array::from(vec![0, 1, 2]));

        let err = date_based_split(&batch, &y, "date", date("2020-01-02")).unwrap_err();
        assert!(matches!(err, Error::NullDate { row: 1, .. }));
    }

    // ========== date_based_val_split tests ==========

    #[test]
    fn test_val_split_three_buckets() {
        let (x, y) = make_dated(10);

        let split = date_based_val_split(&x, &y, "date", date("2020-01-04"), date("2020-01-08"))
            .expect("split failed");

        let (x_train, x_val, x_test, y_train, y_val, y_test) = split.into_parts();
        assert_eq!(ids(&x_train), vec![0, 1, 2]);
        assert_eq!(ids(&x_val), vec![3, 4, 5, 6]);
        assert_eq!(ids(&x_test), vec![7, 8, 9]);
        assert_eq!(y_train.len(), 3);
        assert_eq!(y_val.len(), 4);
        assert_eq!(y_test.len(), 3);
    }

    #[test]
    fn test_val_split_equal_thresholds() {
        let (x, y) = make_dated(10);

        let split = date_based_val_split(&x, &y, "date", date("2020-01-05"), date("2020-01-05"))
            .expect("split failed");

        assert_eq!(split.split.x_train.num_rows(), 4);
        assert_eq!(split.split.x_val.num_rows(), 0);
        assert_eq!(split.split.y_val.len(), 0);
        assert_eq!(split.split.x_test.num_rows(), 6);
    }

    #[test]
    fn test_val_split_does_not_collapse_empty_subsets() {
        let (x, y) = make_dated(10);

        let split = date_based_val_split(&x, &y, "date", date("2019-01-01"), date("2019-06-01"))
            .expect("split failed");

        assert_eq!(split.split.x_train.num_rows(), 0);
        assert_eq!(split.split.x_val.num_rows(), 0);
        assert_eq!(split.split.x_test.num_rows(), 10);
        assert_eq!(split.split.x_train.num_columns(), 2);
    }

    #[test]
    fn test_val_split_rejects_inverted_thresholds() {
        let (x, y) = make_dated(10);

        let err = date_based_val_split(&x, &y, "date", date("2020-01-08"), date("2020-01-04"))
            .unwrap_err();
        assert!(matches!(err, Error::ThresholdOrder { .. }));
    }

    #[test]
    fn test_val_split_missing_column_checked_first() {
        let (x, y) = make_dated(10);

        let err = date_based_val_split(&x, &y, "when", date("2020-01-08"), date("2020-01-04"))
            .unwrap_err();
        assert!(matches!(err, Error::ColumnNotFound { .. }));
    }

    #[test]
    fn test_val_split_length_mismatch() {
        let (x, _) = make_dated(5);
        let (_, y) = make_dated(4);

        let err = date_based_val_split(&x, &y, "date", date("2020-01-02"), date("2020-01-03"))
            .unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { .. }));
    }

    #[test]
    fn test_val_split_keep_coerced() {
        let (x, y) = make_dated(10);

        let split = DateSplitter::new("date")
            .keep_coerced(true)
            .train_val_test(&x, &y, date("2020-01-02"), date("2020-01-09"))
            .expect("split failed");

        assert!(split.coerced.is_some());
        assert_eq!(split.split.x_val.num_rows(), 7);
    }

    #[test]
    fn test_splitter_column_accessor() {
        assert_eq!(DateSplitter::new("date").column(), "date");
    }
}
