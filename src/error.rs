use std::fmt;

/// Result type for Charybdis operations
pub type Result<T> = std::result::Result<T, CharybdisError>;

/// Main error type for the Charybdis library
#[derive(Debug, Clone)]
pub enum CharybdisError {
    /// Input rank does not match what the layer expects
    RankMismatch {
        expected: String,
        actual: String,
    },

    /// Invalid parameter value
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// Axis size is not an exact multiple of the pool size
    IncompatiblePoolSize {
        axis_size: usize,
        pool_size: usize,
    },

    /// Tensor reshape or broadcast failure
    ShapeError(String),
}

impl fmt::Display for CharybdisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharybdisError::RankMismatch { expected, actual } => {
                write!(f, "Rank mismatch: expected {}, got {}", expected, actual)
            }
            CharybdisError::InvalidParameter { name, reason } => {
                write!(f, "Invalid parameter '{}': {}", name, reason)
            }
            CharybdisError::IncompatiblePoolSize { axis_size, pool_size } => {
                write!(
                    f,
                    "Axis size {} is not a multiple of the pool size (pool_size={})",
                    axis_size, pool_size
                )
            }
            CharybdisError::ShapeError(msg) => write!(f, "Shape error: {}", msg),
        }
    }
}

impl std::error::Error for CharybdisError {}

// Conversion from ndarray::ShapeError
impl From<ndarray::ShapeError> for CharybdisError {
    fn from(err: ndarray::ShapeError) -> Self {
        CharybdisError::ShapeError(err.to_string())
    }
}

// Helper functions for common error patterns
impl CharybdisError {
    pub fn rank_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        CharybdisError::RankMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        CharybdisError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
