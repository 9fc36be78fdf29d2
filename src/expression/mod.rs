//! Symbolic expressions: construction, evaluation, differentiation and simplification

mod ast;
mod constructors;
mod derivative;
mod display;
mod errors;
mod eval;
mod function;
mod latex;
mod simplify;

pub use ast::{Constant, Expression};
pub use errors::ExpressionError;
pub use eval::Bindings;
pub use function::Function;
pub use latex::{GREEK_LETTERS, is_greek, symbol_to_latex};
pub use simplify::{CancelToken, DEFAULT_MAX_DEPTH, DEFAULT_MAX_ITERATIONS, Simplifier};
