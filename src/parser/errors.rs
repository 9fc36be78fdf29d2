use thiserror::Error;

/// Errors raised while turning source text into an expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Expression is empty")]
    Empty,
    #[error("Unexpected character '{ch}' at position {position}")]
    UnexpectedChar { ch: char, position: usize },
    #[error("Expected {expected} at position {position}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        position: usize,
    },
    #[error("Unexpected end of input")]
    UnexpectedEnd,
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
    #[error("Unknown function: {0}")]
    UnknownFunction(String),
    #[error("Unknown LaTeX command: \\{0}")]
    UnknownCommand(String),
    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),
    #[error("Expression nests more than {limit} levels deep")]
    TooDeep { limit: usize },
}
