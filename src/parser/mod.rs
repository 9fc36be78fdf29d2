//! Text and LaTeX parsers producing [`Expression`] trees

mod errors;
mod latex;
mod text;

use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::expression::Expression;

pub use errors::ParseError;
pub use latex::parse_latex;
pub use text::parse_text;

/// Deepest nesting of groups, signs, exponents and function arguments either
/// parser accepts. Parsing recurses once per level.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Which parser to use for an expression source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InputFormat {
    #[default]
    Text,
    Latex,
}

impl InputFormat {
    pub fn name(self) -> &'static str {
        match self {
            InputFormat::Text => "text",
            InputFormat::Latex => "latex",
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for InputFormat {
    type Err = ParseError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(InputFormat::Text),
            "latex" => Ok(InputFormat::Latex),
            _ => Err(ParseError::UnsupportedFormat(tag.to_string())),
        }
    }
}

/// # Errors
///
/// Returns a [`ParseError`] when the source is empty or malformed.
pub fn parse(source: &str, format: InputFormat) -> Result<Expression, ParseError> {
    debug!("Parsing {} source: '{}'", format, source);
    match format {
        InputFormat::Text => parse_text(source),
        InputFormat::Latex => parse_latex(source),
    }
}

#[cfg(test)]
mod tests;
