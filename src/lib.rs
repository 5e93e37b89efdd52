//! cortar - Train/Validation/Test Splitting for Arrow Tabular Data
//!
//! Partitions an in-memory feature batch and its labels into disjoint
//! subsets for training, validation and testing.
//!
//! # Design Principles
//!
//! 1. **Partition, never drop** - every input row lands in exactly one
//!    subset
//! 2. **Row positions, not content** - subsets are selected by position so
//!    labels always follow their rows
//! 3. **No hidden state** - random generators are owned per call, and date
//!    coercion works on a copy of the caller's data
//! 4. **Arrow throughout** - features are `RecordBatch`, labels `ArrayRef`
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use arrow::{
//!     array::{ArrayRef, Int32Array, RecordBatch, StringArray},
//!     datatypes::{DataType, Field, Schema},
//! };
//! use cortar::{date_based_split, random_train_test_split};
//!
//! # fn main() -> cortar::Result<()> {
//! let schema = Arc::new(Schema::new(vec![
//!     Field::new("id", DataType::Int32, false),
//!     Field::new("date", DataType::Utf8, false),
//! ]));
//! let x = RecordBatch::try_new(
//!     schema,
//!     vec![
//!         Arc::new(Int32Array::from(vec![1, 2, 3, 4])),
//!         Arc::new(StringArray::from(vec![
//!             "2020-01-01",
//!             "2020-01-02",
//!             "2020-01-03",
//!             "2020-01-04",
//!         ])),
//!     ],
//! )?;
//! let y: ArrayRef = Arc::new(Int32Array::from(vec![0, 1, 0, 1]));
//!
//! let split = random_train_test_split(&x, &y, 0.25, Some(42))?;
//! println!("train rows: {}", split.x_train.num_rows());
//!
//! let split = date_based_split(&x, &y, "date", "2020-01-03".parse()?)?;
//! println!("degenerate: {}", split.is_degenerate());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
// Allow common test patterns
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::cast_lossless,
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_precision_loss,
        clippy::float_cmp,
        clippy::panic
    )
)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]

pub mod config;
pub mod dataset;
pub mod error;
pub mod split;
pub mod temporal;

// Re-exports for convenience
pub use arrow::array::{ArrayRef, RecordBatch};
pub use config::{SplitConfig, SplitOutcome};
pub use dataset::LabeledDataset;
pub use error::{Error, Result};
pub use split::{
    date_based_split, date_based_val_split, random_train_test_split,
    random_train_test_split_with_rng, random_val_split, random_val_split_with_rng,
    split_positions, DateSplitter, DateTrainTestSplit, DateTrainValTestSplit, RandomSplitter,
    SplitIndices, TrainTestSplit, TrainValTestSplit,
};
pub use temporal::{coerce_date_column, DateThreshold};
