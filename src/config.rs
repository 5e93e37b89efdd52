//! Declarative split configuration.
//!
//! A [`SplitConfig`] describes any of the four splits as data, so a split can
//! be stored next to an experiment and replayed later.
//!
//! ```json
//! { "strategy": "random", "test_size": 0.2, "val_size": 0.1, "seed": 42 }
//! { "strategy": "date", "column": "date", "test_date": "2020-01-05" }
//! ```

use arrow::array::{ArrayRef, RecordBatch};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    split::{
        self, check_test_fraction, check_val_fractions, DateSplitter, DateTrainTestSplit,
        DateTrainValTestSplit, TrainTestSplit, TrainValTestSplit, DEFAULT_SEED, DEFAULT_TEST_SIZE,
    },
    temporal::DateThreshold,
};

/// How to split a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum SplitConfig {
    /// Random split by proportion.
    Random {
        /// Fraction of rows for testing
        #[serde(default = "default_test_size")]
        test_size: f64,
        /// Fraction of rows for validation; absent means a two-way split
        #[serde(default, skip_serializing_if = "Option::is_none")]
        val_size: Option<f64>,
        /// Random seed; `null` draws from OS entropy
        #[serde(default = "default_seed")]
        seed: Option<u64>,
    },

    /// Threshold split on a date column.
    Date {
        /// Name of the date column
        column: String,
        /// Start of the validation bucket; absent means a two-way split
        #[serde(default, skip_serializing_if = "Option::is_none")]
        validation_date: Option<DateThreshold>,
        /// Start of the test bucket
        test_date: DateThreshold,
        /// Return the coerced feature batch with the split
        #[serde(default)]
        keep_coerced: bool,
    },
}

fn default_test_size() -> f64 {
    DEFAULT_TEST_SIZE
}

#[allow(clippy::unnecessary_wraps)]
fn default_seed() -> Option<u64> {
    Some(DEFAULT_SEED)
}

/// The result of applying a [`SplitConfig`].
#[derive(Debug, Clone)]
pub enum SplitOutcome {
    /// Random train/test split
    TrainTest(TrainTestSplit),
    /// Random train/validation/test split
    TrainValTest(TrainValTestSplit),
    /// Single-threshold date split
    DateTrainTest(DateTrainTestSplit),
    /// Two-threshold date split
    DateTrainValTest(DateTrainValTestSplit),
}

impl SplitOutcome {
    /// Number of subsets this outcome was asked to produce (2 or 3).
    pub fn num_subsets(&self) -> usize {
        match self {
            Self::TrainTest(_) | Self::DateTrainTest(_) => 2,
            Self::TrainValTest(_) | Self::DateTrainValTest(_) => 3,
        }
    }
}

impl SplitConfig {
    /// Parses a config from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] if the JSON is malformed or does not
    /// describe a split.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Format(e.to_string()))
    }

    /// Serializes the config to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Format(e.to_string()))
    }

    /// Checks the arguments that do not depend on the data.
    ///
    /// # Errors
    ///
    /// Returns the same fraction or threshold-order error the split itself
    /// would.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Random {
                test_size,
                val_size: None,
                ..
            } => check_test_fraction(*test_size),
            Self::Random {
                test_size,
                val_size: Some(val_size),
                ..
            } => check_val_fractions(*val_size, *test_size),
            Self::Date {
                validation_date: Some(validation_date),
                test_date,
                ..
            } => split::check_threshold_order(*validation_date, *test_date),
            Self::Date {
                validation_date: None,
                ..
            } => Ok(()),
        }
    }

    /// Runs the configured split over `x` and `y`.
    ///
    /// # Errors
    ///
    /// Returns whatever error the underlying split returns.
    pub fn apply(&self, x: &RecordBatch, y: &ArrayRef) -> Result<SplitOutcome> {
        match self {
            Self::Random {
                test_size,
                val_size: None,
                seed,
            } => split::random_train_test_split(x, y, *test_size, *seed)
                .map(SplitOutcome::TrainTest),
            Self::Random {
                test_size,
                val_size: Some(val_size),
                seed,
            } => split::random_val_split(x, y, *val_size, *test_size, *seed)
                .map(SplitOutcome::TrainValTest),
            Self::Date {
                column,
                validation_date,
                test_date,
                keep_coerced,
            } => {
                let splitter = DateSplitter::new(column.as_str()).keep_coerced(*keep_coerced);
                match validation_date {
                    Some(validation_date) => splitter
                        .train_val_test(x, y, *validation_date, *test_date)
                        .map(SplitOutcome::DateTrainValTest),
                    None => splitter
                        .train_test(x, y, *test_date)
                        .map(SplitOutcome::DateTrainTest),
                }
            }
        }
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self::Random {
            test_size: DEFAULT_TEST_SIZE,
            val_size: None,
            seed: Some(DEFAULT_SEED),
        }
    }
}
