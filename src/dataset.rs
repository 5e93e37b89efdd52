//! Labeled dataset type for cortar.
//!
//! Provides [`LabeledDataset`], a feature [`RecordBatch`] paired with a
//! label array aligned to it by row position.

use std::sync::Arc;

use arrow::{
    array::{Array, ArrayRef, RecordBatch, RecordBatchOptions, UInt64Array},
    compute::{concat_batches, take},
};

use crate::error::{Error, Result};

/// Features and labels aligned 1:1 by row position.
///
/// The features are held as a single densely indexed `RecordBatch`, so row
/// position `i` of the features always corresponds to element `i` of the
/// labels. Cloning is cheap: both halves are reference counted.
///
/// # Example
///
/// ```ignore
/// use cortar::LabeledDataset;
///
/// let data = LabeledDataset::from_label_column(&batch, "target")?;
/// let head = data.take(&[0, 1, 2])?;
/// ```
#[derive(Debug, Clone)]
pub struct LabeledDataset {
    features: RecordBatch,
    labels: ArrayRef,
}

impl LabeledDataset {
    /// Pairs a feature batch with its labels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthMismatch`] if the batch and the labels have a
    /// different number of rows.
    pub fn new(features: RecordBatch, labels: ArrayRef) -> Result<Self> {
        if features.num_rows() != labels.len() {
            return Err(Error::length_mismatch(features.num_rows(), labels.len()));
        }
        Ok(Self { features, labels })
    }

    /// Splits the named target column out of `batch`.
    ///
    /// The remaining columns become the features, in their original order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnNotFound`] if the column is absent.
    pub fn from_label_column(batch: &RecordBatch, label_column: &str) -> Result<Self> {
        let schema = batch.schema();
        let label_idx = schema
            .index_of(label_column)
            .map_err(|_| Error::column_not_found(label_column))?;

        let keep: Vec<usize> = (0..batch.num_columns())
            .filter(|&i| i != label_idx)
            .collect();
        let features = batch.project(&keep)?;
        let labels = Arc::clone(batch.column(label_idx));

        Self::new(features, labels)
    }

    /// Concatenates `batches` into one densely indexed feature batch.
    ///
    /// # Errors
    ///
    /// Returns an error if no batch is given, if the batches disagree on
    /// schema, or if the labels do not cover every row.
    pub fn from_batches(batches: &[RecordBatch], labels: ArrayRef) -> Result<Self> {
        let first = batches.first().ok_or(Error::EmptyDataset)?;
        let schema = first.schema();

        for (i, batch) in batches.iter().enumerate().skip(1) {
            if batch.schema() != schema {
                return Err(Error::schema_mismatch(format!(
                    "Batch {} has different schema than batch 0",
                    i
                )));
            }
        }

        let features = if batches.len() == 1 {
            first.clone()
        } else {
            concat_batches(&schema, batches)?
        };

        Self::new(features, labels)
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.features.num_rows()
    }

    /// Returns true if the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the feature batch.
    pub fn features(&self) -> &RecordBatch {
        &self.features
    }

    /// Returns the labels.
    pub fn labels(&self) -> &ArrayRef {
        &self.labels
    }

    /// Consumes the dataset, returning `(features, labels)`.
    pub fn into_parts(self) -> (RecordBatch, ArrayRef) {
        (self.features, self.labels)
    }

    /// Returns the rows at `positions`, in the order given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if any position is past the end.
    pub fn take(&self, positions: &[usize]) -> Result<Self> {
        let len = self.len();
        if let Some(&index) = positions.iter().find(|&&p| p >= len) {
            return Err(Error::IndexOutOfBounds { index, len });
        }

        let indices = positions_array(positions);
        let features = take_batch(&self.features, &indices)?;
        let labels = take(self.labels.as_ref(), &indices, None)?;

        Ok(Self { features, labels })
    }
}

fn positions_array(positions: &[usize]) -> UInt64Array {
    UInt64Array::from_iter_values(positions.iter().map(|&p| p as u64))
}

fn take_batch(batch: &RecordBatch, indices: &UInt64Array) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = batch
        .columns()
        .iter()
        .map(|col| take(col.as_ref(), indices, None).map_err(Error::Arrow))
        .collect::<Result<Vec<_>>>()?;

    // try_new rejects zero-column batches without an explicit row count
    let options = RecordBatchOptions::new().with_row_count(Some(indices.len()));
    RecordBatch::try_new_with_options(batch.schema(), columns, &options).map_err(Error::Arrow)
}
