//! Dataset splitting utilities
//!
//! Partitions a feature batch and its labels into disjoint train/test or
//! train/validation/test subsets, either by random proportion or by a
//! date-valued column.
//!
//! # Example
//!
//! ```ignore
//! use cortar::split::{date_based_split, random_train_test_split, random_val_split};
//!
//! // 80/20 split, reproducible
//! let split = random_train_test_split(&x, &y, 0.2, Some(42))?;
//!
//! // 70/10/20 split
//! let split = random_val_split(&x, &y, 0.1, 0.2, Some(42))?;
//!
//! // Everything before 2020-01-05 trains, the rest tests
//! let split = date_based_split(&x, &y, "date", "2020-01-05".parse()?)?;
//! ```

mod date;
mod random;

use arrow::array::{ArrayRef, RecordBatch};
pub use date::{
    date_based_split, date_based_val_split, DateSplitter, DateTrainTestSplit,
    DateTrainValTestSplit,
};
pub use random::{
    random_train_test_split, random_train_test_split_with_rng, random_val_split,
    random_val_split_with_rng, split_positions, RandomSplitter, DEFAULT_SEED, DEFAULT_TEST_SIZE,
    DEFAULT_VAL_SIZE,
};
pub(crate) use date::check_threshold_order;
pub(crate) use random::{check_test_fraction, check_val_fractions};

use crate::{dataset::LabeledDataset, error::Result};

/// Row positions assigned to each subset.
///
/// Together the three vectors hold every position `0..n` exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitIndices {
    /// Training positions
    pub train: Vec<usize>,
    /// Validation positions (empty for two-way splits)
    pub validation: Vec<usize>,
    /// Test positions
    pub test: Vec<usize>,
}

impl SplitIndices {
    /// Total number of positions across all subsets.
    pub fn len(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }

    /// Returns true if no position was assigned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Train/test split of features and labels
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    /// Training features
    pub x_train: RecordBatch,
    /// Test features
    pub x_test: RecordBatch,
    /// Training labels
    pub y_train: ArrayRef,
    /// Test labels
    pub y_test: ArrayRef,
}

impl TrainTestSplit {
    fn from_subsets(train: LabeledDataset, test: LabeledDataset) -> Self {
        let (x_train, y_train) = train.into_parts();
        let (x_test, y_test) = test.into_parts();
        Self {
            x_train,
            x_test,
            y_train,
            y_test,
        }
    }

    /// Returns `(x_train, x_test, y_train, y_test)`.
    pub fn into_parts(self) -> (RecordBatch, RecordBatch, ArrayRef, ArrayRef) {
        (self.x_train, self.x_test, self.y_train, self.y_test)
    }
}

/// Train/validation/test split of features and labels
#[derive(Debug, Clone)]
pub struct TrainValTestSplit {
    /// Training features
    pub x_train: RecordBatch,
    /// Validation features
    pub x_val: RecordBatch,
    /// Test features
    pub x_test: RecordBatch,
    /// Training labels
    pub y_train: ArrayRef,
    /// Validation labels
    pub y_val: ArrayRef,
    /// Test labels
    pub y_test: ArrayRef,
}

impl TrainValTestSplit {
    fn from_subsets(train: LabeledDataset, val: LabeledDataset, test: LabeledDataset) -> Self {
        let (x_train, y_train) = train.into_parts();
        let (x_val, y_val) = val.into_parts();
        let (x_test, y_test) = test.into_parts();
        Self {
            x_train,
            x_val,
            x_test,
            y_train,
            y_val,
            y_test,
        }
    }

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
        (
            self.x_train,
            self.x_val,
            self.x_test,
            self.y_train,
            self.y_val,
            self.y_test,
        )
    }
}

/// Materialises the subsets named by `indices`.
fn take_three_way(data: &LabeledDataset, indices: &SplitIndices) -> Result<TrainValTestSplit> {
    Ok(TrainValTestSplit::from_subsets(
        data.take(&indices.train)?,
        data.take(&indices.validation)?,
        data.take(&indices.test)?,
    ))
}
