use thiserror::Error;

use crate::expression::ExpressionError;
use crate::parser::ParseError;

/// Problems with a symbol chosen for differentiation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SymbolError {
    #[error("Symbol name cannot be empty")]
    Empty,
    #[error("Invalid symbol name: '{0}'")]
    Invalid(String),
    #[error("Symbol name '{0}' uses the reserved 'u_' uncertainty prefix")]
    Reserved(String),
    #[error("Symbol '{0}' is listed more than once")]
    Duplicate(String),
    #[error("Expression already uses '{0}', the uncertainty symbol of a listed symbol")]
    Collision(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PropagationError {
    #[error("Cannot parse expression: {0}")]
    Parse(#[from] ParseError),
    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),
    #[error("No symbols to differentiate by")]
    EmptySymbolList,
    #[error("Symbol error: {0}")]
    Symbol(#[from] SymbolError),
    #[error("Missing values for: {}", .symbols.join(", "))]
    MissingValue { symbols: Vec<String> },
    #[error("Cannot evaluate: {0}")]
    Evaluation(ExpressionError),
    #[error("Invalid value '{value}' for {symbol}")]
    InvalidValue { symbol: String, value: String },
}

impl From<ExpressionError> for PropagationError {
    fn from(error: ExpressionError) -> Self {
        match error {
            ExpressionError::MissingValue { symbols } => PropagationError::MissingValue { symbols },
            other => PropagationError::Evaluation(other),
        }
    }
}
