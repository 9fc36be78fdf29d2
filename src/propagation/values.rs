use std::fmt;

use log::debug;

use crate::expression::{Bindings, Expression};
use crate::parser::parse_text;
use crate::propagation::errors::PropagationError;

/// Values for symbols, including the synthesized `u_*` uncertainty symbols
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueMap {
    values: Bindings,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, symbol: impl Into<String>, value: f64) -> Self {
        self.insert(symbol, value);
        self
    }

    pub fn insert(&mut self, symbol: impl Into<String>, value: f64) -> Option<f64> {
        self.values.insert(symbol.into(), value)
    }

    /// Insert a value given as text. Any constant expression is accepted: `2e-3`, `1/3`, `pi/2`.
    ///
    /// # Errors
    ///
    /// Returns [`PropagationError::InvalidValue`] when the text does not reduce to a number.
    pub fn insert_str(&mut self, symbol: &str, text: &str) -> Result<f64, PropagationError> {
        let invalid = || PropagationError::InvalidValue {
            symbol: symbol.to_string(),
            value: text.to_string(),
        };

        let value = parse_text(text)
            .map_err(|_| invalid())?
            .evaluate(&Bindings::new())
            .map_err(|_| invalid())?;

        debug!("Bound {} = {} (from '{}')", symbol, value, text);
        self.values.insert(symbol.to_string(), value);
        Ok(value)
    }

    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.values.get(symbol).copied()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.values.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn bindings(&self) -> &Bindings {
        &self.values
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(symbol, value)| (symbol.into(), value))
                .collect(),
        }
    }
}

/// A value with its propagated uncertainty
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub value: f64,
    pub uncertainty: f64,
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ± {}", self.value, self.uncertainty)
    }
}

/// Substitute `values` into `expression` and reduce it to a number.
///
/// # Errors
///
/// Returns [`PropagationError::MissingValue`] when a free symbol has no value and
/// [`PropagationError::Evaluation`] when the numeric reduction fails.
pub fn evaluate(expression: &Expression, values: &ValueMap) -> Result<f64, PropagationError> {
    let substituted = expression.substitute(values.bindings());
    Ok(substituted.evaluate(&Bindings::new())?)
}
