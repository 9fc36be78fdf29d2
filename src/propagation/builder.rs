use std::collections::HashSet;

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::expression::Expression;
use crate::parser::{InputFormat, parse};
use crate::propagation::errors::{PropagationError, SymbolError};
use crate::propagation::values::{Measurement, ValueMap, evaluate};

/// Prefix of the synthesized uncertainty symbol for each differentiated symbol
pub const UNCERTAINTY_PREFIX: &str = "u_";

/// Name of the uncertainty symbol paired with `symbol`: `x` -> `u_x`
pub fn uncertainty_symbol(symbol: &str) -> String {
    format!("{}{}", UNCERTAINTY_PREFIX, symbol)
}

/// Split a comma separated symbol list, trimming whitespace around each entry
pub fn split_symbols(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Raw expression source and the parser to read it with
#[derive(Debug, Clone, PartialEq)]
pub struct InputSpec {
    pub format: InputFormat,
    pub value: String,
}

impl InputSpec {
    /// # Errors
    ///
    /// Returns [`PropagationError::UnsupportedFormat`] when `format` is neither `text` nor `latex`.
    pub fn new(format: &str, value: impl Into<String>) -> Result<Self, PropagationError> {
        let format = format
            .parse::<InputFormat>()
            .map_err(|_| PropagationError::UnsupportedFormat(format.to_string()))?;
        Ok(Self {
            format,
            value: value.into(),
        })
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self {
            format: InputFormat::Text,
            value: value.into(),
        }
    }

    pub fn latex(value: impl Into<String>) -> Self {
        Self {
            format: InputFormat::Latex,
            value: value.into(),
        }
    }
}

/// # Errors
///
/// Returns an error if the list is empty, or any name is not an identifier,
/// starts with the reserved `u_` prefix, or appears twice.
pub fn validate_symbols<S: AsRef<str>>(symbols: &[S]) -> Result<Vec<String>, PropagationError> {
    debug!("Validating {} symbols", symbols.len());

    if symbols.is_empty() {
        warn!("No symbols to differentiate by");
        return Err(PropagationError::EmptySymbolList);
    }

    let mut seen = HashSet::new();
    let mut validated = Vec::with_capacity(symbols.len());

    for symbol in symbols {
        let name = symbol.as_ref();
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            warn!("Empty symbol name");
            return Err(SymbolError::Empty.into());
        };
        if !(first.is_ascii_alphabetic() || first == '_')
            || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            warn!("Symbol name is not an identifier: '{}'", name);
            return Err(SymbolError::Invalid(name.to_string()).into());
        }
        if name.starts_with(UNCERTAINTY_PREFIX) {
            warn!("Symbol name uses the reserved prefix: '{}'", name);
            return Err(SymbolError::Reserved(name.to_string()).into());
        }
        if !seen.insert(name) {
            warn!("Duplicate symbol: '{}'", name);
            return Err(SymbolError::Duplicate(name.to_string()).into());
        }
        validated.push(name.to_string());
    }

    Ok(validated)
}

/// `(df/ds)^2 * u_s^2`
fn error_term(expression: &Expression, symbol: &str) -> Expression {
    let partial = expression.differentiate(symbol);
    debug!("d/d{} = {}", symbol, partial);
    Expression::mul_expr(
        Expression::pow_expr(partial, Expression::number(2.0)),
        Expression::pow_expr(
            Expression::symbol(uncertainty_symbol(symbol)),
            Expression::number(2.0),
        ),
    )
}

/// Parsed expression and its propagated uncertainty, built for one symbol list
#[derive(Debug, Clone, PartialEq)]
pub struct Propagation {
    expression: Expression,
    uncertainty: Expression,
    symbols: Vec<String>,
}

impl Propagation {
    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn uncertainty(&self) -> &Expression {
        &self.uncertainty
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Every symbol that needs a value to evaluate both expressions
    pub fn required_symbols(&self) -> Vec<String> {
        let mut required = self.expression.free_symbols();
        required.extend(self.uncertainty.free_symbols());
        required.into_iter().collect()
    }

    /// Copy with the original expression replaced, e.g. by its simplified form
    pub fn with_expression(&self, expression: Expression) -> Self {
        Self {
            expression,
            ..self.clone()
        }
    }

    /// Copy with the uncertainty expression replaced, e.g. by its simplified form
    pub fn with_uncertainty(&self, uncertainty: Expression) -> Self {
        Self {
            uncertainty,
            ..self.clone()
        }
    }

    /// # Errors
    ///
    /// Returns an error when a value is missing or either expression fails to evaluate.
    pub fn evaluate(&self, values: &ValueMap) -> Result<Measurement, PropagationError> {
        let value = evaluate(&self.expression, values)?;
        let uncertainty = evaluate(&self.uncertainty, values)?;
        Ok(Measurement { value, uncertainty })
    }

    pub fn into_parts(self) -> (Expression, Expression) {
        (self.expression, self.uncertainty)
    }
}

/// Parse `spec` and combine its partial derivatives over `symbols` in quadrature.
///
/// Both results stay symbolic. Partial derivatives are computed in parallel;
/// the sum keeps the order of `symbols`.
///
/// # Errors
///
/// Returns an error if the source cannot be parsed, the symbol list is invalid
/// or the expression already mentions `u_s` for a listed `s`.
pub fn build<S: AsRef<str>>(
    spec: &InputSpec,
    symbols: &[S],
) -> Result<Propagation, PropagationError> {
    info!(
        "Building propagation for {} expression '{}'",
        spec.format, spec.value
    );

    let expression = parse(&spec.value, spec.format)?;
    let symbols = validate_symbols(symbols)?;
    if let Some(name) = symbols
        .iter()
        .map(|symbol| uncertainty_symbol(symbol))
        .find(|name| expression.contains_symbol(name))
    {
        warn!("Expression uses uncertainty symbol '{}' as a parameter", name);
        return Err(SymbolError::Collision(name).into());
    }

    let terms: Vec<Expression> = symbols
        .par_iter()
        .map(|symbol| error_term(&expression, symbol))
        .collect();

    let sum = terms
        .into_iter()
        .fold(Expression::number(0.0), Expression::add_expr);
    let uncertainty = Expression::sqrt(sum);

    info!("Propagated uncertainty: {}", uncertainty);

    Ok(Propagation {
        expression,
        uncertainty,
        symbols,
    })
}
