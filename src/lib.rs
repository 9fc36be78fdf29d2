//! Hazy - Propagate measurement uncertainty through symbolic expressions
//!
//! This library parses an expression (plain text or LaTeX), builds the
//! first-order propagated uncertainty `sqrt(sum((df/dx)^2 * u_x^2))` for a chosen
//! set of symbols, evaluates both against measured values, simplifies them
//! off-thread and exports them in several notations.

pub mod export;
pub mod expression;
pub mod parser;
pub mod propagation;
pub mod session;
pub mod worker;

// Re-export the main public API
pub use export::{ExportError, ExportFormat, Rendered, render, save};
pub use expression::{
    Bindings, Constant, DEFAULT_MAX_ITERATIONS, Expression, ExpressionError, Function, Simplifier,
};
pub use parser::{InputFormat, ParseError, parse, parse_latex, parse_text};
pub use propagation::{
    InputSpec, Measurement, Propagation, PropagationError, SymbolError, ValueMap, build, evaluate,
    split_symbols, uncertainty_symbol, validate_symbols,
};
pub use session::{QuantityRow, Session, SessionError, Target};
pub use worker::{CancelToken, SimplifyConfig, SimplifyJob};

/// Propagate uncertainty through a plain-text expression
///
/// This is a convenience function that parses `expression` with the text parser
/// and builds its propagated uncertainty over the comma separated `symbols`.
///
/// # Errors
///
/// This function will return an error if:
/// * The expression is empty or malformed
/// * The symbol list is empty, or a symbol is invalid, reserved or repeated
///
/// # Examples
///
/// ```
/// use hazy::{ValueMap, propagate};
///
/// let propagation = propagate("x * y", "x, y").unwrap();
/// let values = ValueMap::new()
///     .with("x", 2.0)
///     .with("y", 3.0)
///     .with("u_x", 0.1)
///     .with("u_y", 0.2);
///
/// let measurement = propagation.evaluate(&values).unwrap();
/// assert!((measurement.value - 6.0).abs() < 1e-9);
/// assert!((measurement.uncertainty - 0.5).abs() < 1e-9);
/// ```
pub fn propagate(expression: &str, symbols: &str) -> Result<Propagation, PropagationError> {
    build(&InputSpec::text(expression), &split_symbols(symbols))
}
