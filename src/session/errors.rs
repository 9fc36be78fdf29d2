use thiserror::Error;

use crate::expression::ExpressionError;
use crate::propagation::PropagationError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("No expression has been computed")]
    NoExpression,
    #[error("No values to evaluate with")]
    NoValues,
    #[error("Row {index} is out of range for a table of {len} rows")]
    RowOutOfRange { index: usize, len: usize },
    #[error("{0}")]
    Propagation(#[from] PropagationError),
    #[error("Simplification failed: {0}")]
    Simplify(#[from] ExpressionError),
}
