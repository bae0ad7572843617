use thiserror::Error;
use tracing::error;

/// Error types for the compute module
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComputeError {
    /// Fewer usable rows than the model needs
    #[error("Insufficient data: need at least {required} non-null rows, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// The value column holds something that is not a finite number
    #[error("Non-numeric values in column '{column}': {detail}")]
    NonNumeric { column: String, detail: String },

    /// Every observation has the same value, nothing to fit
    #[error("Degenerate variance: all {count} values equal {value}")]
    DegenerateVariance { count: usize, value: f64 },

    /// A column the operation expects is absent
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Error from Polars DataFrame operations
    #[error("DataFrame error: {0}")]
    DataFrame(String),

    /// Error from Polars Series operations
    #[error("Series error: {0}")]
    Series(String),

    /// The normal equations could not be solved
    #[error("Solver error: {0}")]
    Solver(String),

    /// Error from date operations
    #[error("Date error: {0}")]
    Date(String),

    /// Invalid model configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<polars::error::PolarsError> for ComputeError {
    fn from(error: polars::error::PolarsError) -> Self {
        let compute_error = match error {
            polars::error::PolarsError::ColumnNotFound(_) => {
                let err = ComputeError::MissingColumn(error.to_string());
                error!(?err, "DataFrame error: Column not found");
                err
            }
            polars::error::PolarsError::NoData(_) => {
                let err = ComputeError::DataFrame(format!("No data: {}", error));
                error!(?err, "DataFrame error: No data");
                err
            }
            polars::error::PolarsError::ShapeMismatch(_) => {
                let err = ComputeError::DataFrame(format!("Shape mismatch: {}", error));
                error!(?err, "DataFrame error: Shape mismatch");
                err
            }
            polars::error::PolarsError::SchemaMismatch(_) => {
                let err = ComputeError::DataFrame(format!("Schema mismatch: {}", error));
                error!(?err, "DataFrame error: Schema mismatch");
                err
            }
            _ => {
                let err = ComputeError::Series(format!("Series error: {}", error));
                error!(?err, "Series error");
                err
            }
        };
        compute_error
    }
}

impl ComputeError {
    /// True for the failures caused by the training data itself rather than by the engine.
    pub fn is_data_rejection(&self) -> bool {
        matches!(
            self,
            ComputeError::InsufficientData { .. }
                | ComputeError::NonNumeric { .. }
                | ComputeError::DegenerateVariance { .. }
        )
    }
}

/// Type alias for Result with ComputeError
pub type Result<T> = std::result::Result<T, ComputeError>;
