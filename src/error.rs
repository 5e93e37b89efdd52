//! Error types for cortar.

/// Result type alias for cortar operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while splitting a dataset.
///
/// Every variant is raised before any partitioning work begins; none of
/// them are recovered internally.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Arrow error during data processing.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Features and labels have a different number of rows.
    #[error("X and y must have the same length (X has {features} rows, y has {labels})")]
    LengthMismatch {
        /// Number of feature rows.
        features: usize,
        /// Number of labels.
        labels: usize,
    },

    /// A split fraction is out of range.
    #[error("Invalid fraction: {message}")]
    InvalidFraction {
        /// Description naming the offending argument.
        message: String,
    },

    /// Column not found in schema.
    #[error("Column '{name}' not found in schema")]
    ColumnNotFound {
        /// The name of the missing column.
        name: String,
    },

    /// A column could not be interpreted as date/time values.
    #[error("Failed to coerce column '{column}' to datetime: {source}")]
    DateCoercion {
        /// The column being coerced.
        column: String,
        /// The underlying cast failure.
        #[source]
        source: arrow::error::ArrowError,
    },

    /// A date column holds a null value.
    #[error("Date column '{column}' has a null value at row {row}")]
    NullDate {
        /// The date column.
        column: String,
        /// Row position of the first null.
        row: usize,
    },

    /// Validation threshold falls after the test threshold.
    #[error("validation_date ({validation}) must not be after test_date ({test})")]
    ThresholdOrder {
        /// The validation threshold, formatted.
        validation: String,
        /// The test threshold, formatted.
        test: String,
    },

    /// Row position out of bounds when taking a subset.
    #[error("Index {index} out of bounds for dataset with {len} rows")]
    IndexOutOfBounds {
        /// The requested index.
        index: usize,
        /// The actual length of the dataset.
        len: usize,
    },

    /// Schema mismatch between batches.
    #[error("Schema mismatch: {message}")]
    SchemaMismatch {
        /// Description of the schema mismatch.
        message: String,
    },

    /// Empty dataset error.
    #[error("Dataset is empty")]
    EmptyDataset,

    /// Parse error.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parse error.
        message: String,
    },

    /// Serialization format error.
    #[error("Format error: {0}")]
    Format(String),
}

impl Error {
    /// Create a length mismatch error.
    #[must_use]
    pub fn length_mismatch(features: usize, labels: usize) -> Self {
        Self::LengthMismatch { features, labels }
    }

    /// Create an invalid fraction error.
    pub fn invalid_fraction(message: impl Into<String>) -> Self {
        Self::InvalidFraction {
            message: message.into(),
        }
    }

    /// Create a column not found error.
    pub fn column_not_found(name: impl Into<String>) -> Self {
        Self::ColumnNotFound { name: name.into() }
    }

    /// Create a date coercion error.
    pub fn date_coercion(column: impl Into<String>, source: arrow::error::ArrowError) -> Self {
        Self::DateCoercion {
            column: column.into(),
            source,
        }
    }

    /// Create a schema mismatch error.
    pub fn schema_mismatch(message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }
}
