//! Error propagation: build `sqrt(sum((df/dx)^2 * u_x^2))` and evaluate it

mod builder;
mod errors;
mod values;

pub use builder::{
    InputSpec, Propagation, UNCERTAINTY_PREFIX, build, split_symbols, uncertainty_symbol,
    validate_symbols,
};
pub use errors::{PropagationError, SymbolError};
pub use values::{Measurement, ValueMap, evaluate};

#[cfg(test)]
mod tests;
