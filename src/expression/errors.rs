use thiserror::Error;

/// Errors that can occur while evaluating or simplifying an expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Complex result from a fractional power or root of a negative number")]
    ComplexResult,
    #[error("{function} is undefined at {value}")]
    Domain { function: &'static str, value: f64 },
    #[error("Result is not a finite number")]
    NonFinite,
    #[error("No value bound for: {}", .symbols.join(", "))]
    MissingValue { symbols: Vec<String> },
    #[error("Simplification was cancelled")]
    Cancelled,
    #[error("Expression is {depth} levels deep, more than the limit of {limit}")]
    TooDeep { depth: usize, limit: usize },
}
