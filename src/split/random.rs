// Allow casts for size calculations - these are intentional and safe for
// dataset sizes
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]

//! Proportional (random) splits.

use std::sync::Arc;

use arrow::array::{ArrayRef, RecordBatch};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use super::{take_three_way, SplitIndices, TrainTestSplit, TrainValTestSplit};
use crate::{
    dataset::LabeledDataset,
    error::{Error, Result},
};

/// Default fraction of rows assigned to the test subset.
pub const DEFAULT_TEST_SIZE: f64 = 0.2;

/// Default fraction of rows assigned to the validation subset.
pub const DEFAULT_VAL_SIZE: f64 = 0.1;

/// Default random seed.
pub const DEFAULT_SEED: u64 = 42;

/// Slack allowed when checking that fractions sum to at most 1.
const FRACTION_EPSILON: f64 = 1e-9;

/// Builder for random splits.
///
/// Defaults to `test_size = 0.2`, `val_size = 0.1` and seed 42.
///
/// # Example
///
/// ```ignore
/// use cortar::RandomSplitter;
///
/// let split = RandomSplitter::new().test_size(0.25).seed(7).train_test(&x, &y)?;
/// let split = RandomSplitter::new().unseeded().train_val_test(&x, &y)?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomSplitter {
    test_size: f64,
    val_size: f64,
    seed: Option<u64>,
}

impl RandomSplitter {
    /// Creates a splitter with the default fractions and seed.
    pub fn new() -> Self {
        Self {
            test_size: DEFAULT_TEST_SIZE,
            val_size: DEFAULT_VAL_SIZE,
            seed: Some(DEFAULT_SEED),
        }
    }

    /// Sets the fraction of rows assigned to the test subset.
    #[must_use]
    pub fn test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    /// Sets the fraction of rows assigned to the validation subset.
    ///
    /// Only used by [`RandomSplitter::train_val_test`].
    #[must_use]
    pub fn val_size(mut self, val_size: f64) -> Self {
        self.val_size = val_size;
        self
    }

    /// Sets the random seed.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Draws the permutation from OS entropy instead of a fixed seed.
    #[must_use]
    pub fn unseeded(mut self) -> Self {
        self.seed = None;
        self
    }

    /// Splits into train and test subsets.
    ///
    /// # Errors
    ///
    /// See [`random_train_test_split`].
    pub fn train_test(&self, x: &RecordBatch, y: &ArrayRef) -> Result<TrainTestSplit> {
        random_train_test_split(x, y, self.test_size, self.seed)
    }

    /// Splits into train, validation and test subsets.
    ///
    /// # Errors
    ///
    /// See [`random_val_split`].
    pub fn train_val_test(&self, x: &RecordBatch, y: &ArrayRef) -> Result<TrainValTestSplit> {
        random_val_split(x, y, self.val_size, self.test_size, self.seed)
    }
}

impl Default for RandomSplitter {
    fn default() -> Self {
        Self::new()
    }
}

/// Randomly splits `x` and `y` into train and test subsets.
///
/// The first `floor(n * (1 - test_size))` positions of a random permutation
/// of `0..n` train, the rest test. Rows keep the order the permutation gives
/// them. With a seed the split is deterministic for a given row count.
///
/// # Arguments
/// * `x` - Feature batch
/// * `y` - Labels aligned with `x`
/// * `test_size` - Fraction of rows for testing (0.0 to 1.0)
/// * `seed` - Optional random seed; `None` uses OS entropy
///
/// # Errors
/// Returns error if `x` and `y` differ in length or `test_size` is outside
/// `[0, 1]`
pub fn random_train_test_split(
    x: &RecordBatch,
    y: &ArrayRef,
    test_size: f64,
    seed: Option<u64>,
) -> Result<TrainTestSplit> {
    let mut rng = seeded_rng(seed);
    let split = random_train_test_split_with_rng(x, y, test_size, &mut rng)?;
    tracing::debug!(
        train = split.x_train.num_rows(),
        test = split.x_test.num_rows(),
        test_size,
        ?seed,
        "random train/test split"
    );
    Ok(split)
}

/// Like [`random_train_test_split`], drawing the permutation from `rng`.
///
/// # Errors
/// See [`random_train_test_split`]
pub fn random_train_test_split_with_rng<R: Rng + ?Sized>(
    x: &RecordBatch,
    y: &ArrayRef,
    test_size: f64,
    rng: &mut R,
) -> Result<TrainTestSplit> {
    let data = LabeledDataset::new(x.clone(), Arc::clone(y))?;
    check_test_fraction(test_size)?;

    let indices = partition(data.len(), 0.0, test_size, rng);
    Ok(TrainTestSplit::from_subsets(
        data.take(&indices.train)?,
        data.take(&indices.test)?,
    ))
}

/// Randomly splits `x` and `y` into train, validation and test subsets.
///
/// One permutation of `0..n` is cut at `floor(n * (1 - test_size -
/// val_size))` and `floor(n * (1 - test_size))`. A `val_size` of zero still
/// yields three subsets, the validation one empty.
///
/// # Arguments
/// * `x` - Feature batch
/// * `y` - Labels aligned with `x`
/// * `val_size` - Fraction of rows for validation
/// * `test_size` - Fraction of rows for testing
/// * `seed` - Optional random seed; `None` uses OS entropy
///
/// # Errors
/// Returns error if `x` and `y` differ in length, the fractions sum to more
/// than 1, or either fraction is negative
pub fn random_val_split(
    x: &RecordBatch,
    y: &ArrayRef,
    val_size: f64,
    test_size: f64,
    seed: Option<u64>,
) -> Result<TrainValTestSplit> {
    let mut rng = seeded_rng(seed);
    let split = random_val_split_with_rng(x, y, val_size, test_size, &mut rng)?;
    tracing::debug!(
        train = split.x_train.num_rows(),
        validation = split.x_val.num_rows(),
        test = split.x_test.num_rows(),
        val_size,
        test_size,
        ?seed,
        "random train/validation/test split"
    );
    Ok(split)
}

/// Like [`random_val_split`], drawing the permutation from `rng`.
///
/// # Errors
/// See [`random_val_split`]
pub fn random_val_split_with_rng<R: Rng + ?Sized>(
    x: &RecordBatch,
    y: &ArrayRef,
    val_size: f64,
    test_size: f64,
    rng: &mut R,
) -> Result<TrainValTestSplit> {
    let data = LabeledDataset::new(x.clone(), Arc::clone(y))?;
    let indices = split_positions(data.len(), val_size, test_size, rng)?;
    take_three_way(&data, &indices)
}

/// Partitions row positions `0..n` into train, validation and test.
///
/// This is the permutation step of [`random_val_split`] without touching
/// any data. Pass `val_size = 0.0` for a two-way split.
///
/// # Errors
/// Returns error if the fractions sum to more than 1 or either is negative
pub fn split_positions<R: Rng + ?Sized>(
    n: usize,
    val_size: f64,
    test_size: f64,
    rng: &mut R,
) -> Result<SplitIndices> {
    check_val_fractions(val_size, test_size)?;
    Ok(partition(n, val_size, test_size, rng))
}

pub(crate) fn check_val_fractions(val_size: f64, test_size: f64) -> Result<()> {
    if val_size + test_size > 1.0 + FRACTION_EPSILON {
        return Err(Error::invalid_fraction(format!(
            "val_size + test_size must be less than or equal to 1, got {}",
            val_size + test_size
        )));
    }
    // written this way so NaN is rejected too
    if !(val_size >= 0.0 && test_size >= 0.0) {
        return Err(Error::invalid_fraction(format!(
            "val_size and test_size must be non-negative, got val_size={val_size}, \
             test_size={test_size}"
        )));
    }
    Ok(())
}

pub(crate) fn check_test_fraction(test_size: f64) -> Result<()> {
    if (0.0..=1.0).contains(&test_size) {
        Ok(())
    } else {
        Err(Error::invalid_fraction(format!(
            "test_size must be between 0 and 1, got {test_size}"
        )))
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn partition<R: Rng + ?Sized>(
    n: usize,
    val_size: f64,
    test_size: f64,
    rng: &mut R,
) -> SplitIndices {
    let mut permutation: Vec<usize> = (0..n).collect();
    permutation.shuffle(rng);

    let train_end = cut_point(n, 1.0 - test_size - val_size);
    let val_end = cut_point(n, 1.0 - test_size).max(train_end);

    let test = permutation.split_off(val_end);
    let validation = permutation.split_off(train_end);

    SplitIndices {
        train: permutation,
        validation,
        test,
    }
}

/// `floor(n * fraction)`, clamped to `0..=n`.
fn cut_point(n: usize, fraction: f64) -> usize {
    let point = ((n as f64) * fraction).floor();
    if point <= 0.0 {
        0
    } else {
        (point as usize).min(n)
    }
}
