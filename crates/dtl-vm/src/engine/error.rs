//! Errors surfaced during evaluation.
//!
//! These cover bad data and arithmetic faults. Ordering violations in the
//! command list are compiler bugs and panic instead.

use dtl_core::{DType, IoError};

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    IntegerOverflow,

    #[error("index {index} out of bounds for array of length {length}")]
    IndexOutOfBounds { index: usize, length: usize },

    #[error("column '{column}' has {actual} rows, expected {expected}")]
    RowCountMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("column '{column}' has dtype {actual}, expected {expected}")]
    ColumnDtypeMismatch {
        column: String,
        expected: DType,
        actual: DType,
    },

    #[error("{op} is not defined for {dtype}")]
    UnsupportedDtype { op: &'static str, dtype: DType },

    #[error(transparent)]
    Io(#[from] IoError),
}
