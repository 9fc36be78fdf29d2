use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::expression::ast::Expression;
use crate::expression::errors::ExpressionError;

/// Numeric values bound to symbol names
pub type Bindings = BTreeMap<String, f64>;

#[inline]
fn is_zero(value: f64) -> bool {
    value == 0.0
}

#[inline]
fn is_integer(value: f64) -> bool {
    if value.abs() > 2_f64.powi(52) {
        true
    } else {
        (value - value.round()).abs() < f64::EPSILON
    }
}

impl Expression {
    /// Number of nodes on the longest root-to-leaf path. Walks the tree with an
    /// explicit stack, so it is safe on trees too deep to recurse over.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(self, 1)];
        while let Some((expr, level)) = pending.pop() {
            deepest = deepest.max(level);
            match expr {
                Expression::Number(_) | Expression::Symbol(_) | Expression::Constant(_) => {}
                Expression::Add(l, r)
                | Expression::Sub(l, r)
                | Expression::Mul(l, r)
                | Expression::Div(l, r)
                | Expression::Pow(l, r) => {
                    pending.push((l, level + 1));
                    pending.push((r, level + 1));
                }
                Expression::Neg(e) | Expression::Func(_, e) => pending.push((e, level + 1)),
            }
        }
        deepest
    }

    /// Every symbol name occurring in the tree
    pub fn free_symbols(&self) -> BTreeSet<String> {
        let mut symbols = BTreeSet::new();
        self.collect_symbols(&mut symbols);
        symbols
    }

    fn collect_symbols(&self, symbols: &mut BTreeSet<String>) {
        match self {
            Expression::Symbol(name) => {
                symbols.insert(name.clone());
            }
            Expression::Number(_) | Expression::Constant(_) => {}
            Expression::Add(l, r)
            | Expression::Sub(l, r)
            | Expression::Mul(l, r)
            | Expression::Div(l, r)
            | Expression::Pow(l, r) => {
                l.collect_symbols(symbols);
                r.collect_symbols(symbols);
            }
            Expression::Neg(e) | Expression::Func(_, e) => e.collect_symbols(symbols),
        }
    }

    pub fn contains_symbol(&self, name: &str) -> bool {
        match self {
            Expression::Symbol(s) => s == name,
            Expression::Number(_) | Expression::Constant(_) => false,
            Expression::Add(l, r)
            | Expression::Sub(l, r)
            | Expression::Mul(l, r)
            | Expression::Div(l, r)
            | Expression::Pow(l, r) => l.contains_symbol(name) || r.contains_symbol(name),
            Expression::Neg(e) | Expression::Func(_, e) => e.contains_symbol(name),
        }
    }

    /// Replace every bound symbol with its value. Unbound symbols stay in place.
    pub fn substitute(&self, bindings: &Bindings) -> Expression {
        let boxed = |e: &Expression| Box::new(e.substitute(bindings));
        match self {
            Expression::Symbol(name) => match bindings.get(name) {
                Some(value) => Expression::Number(*value),
                None => self.clone(),
            },
            Expression::Number(_) | Expression::Constant(_) => self.clone(),
            Expression::Add(l, r) => Expression::Add(boxed(l), boxed(r)),
            Expression::Sub(l, r) => Expression::Sub(boxed(l), boxed(r)),
            Expression::Mul(l, r) => Expression::Mul(boxed(l), boxed(r)),
            Expression::Div(l, r) => Expression::Div(boxed(l), boxed(r)),
            Expression::Pow(l, r) => Expression::Pow(boxed(l), boxed(r)),
            Expression::Neg(e) => Expression::Neg(boxed(e)),
            Expression::Func(f, e) => Expression::Func(*f, boxed(e)),
        }
    }

    /// # Errors
    ///
    /// Returns an error when:
    /// - Some free symbol has no value in `bindings`
    /// - Dividing by zero
    /// - Raising a negative base to a fractional exponent (complex result)
    /// - A function argument lies outside its real domain
    /// - The result overflows or is not a number
    pub fn evaluate(&self, bindings: &Bindings) -> Result<f64, ExpressionError> {
        debug!("Evaluating expression: {}", self);

        let missing: Vec<String> = self
            .free_symbols()
            .into_iter()
            .filter(|name| !bindings.contains_key(name))
            .collect();
        if !missing.is_empty() {
            debug!("Unbound symbols: {:?}", missing);
            return Err(ExpressionError::MissingValue { symbols: missing });
        }

        let result = self.evaluate_node(bindings).and_then(|value| {
            if value.is_finite() {
                Ok(value)
            } else {
                Err(ExpressionError::NonFinite)
            }
        });

        match &result {
            Ok(value) => debug!("Expression evaluated to: {}", value),
            Err(e) => debug!("Expression evaluation failed: {}", e),
        }

        result
    }

    fn evaluate_node(&self, bindings: &Bindings) -> Result<f64, ExpressionError> {
        match self {
            Expression::Number(n) => Ok(*n),
            Expression::Constant(c) => Ok(c.value()),
            Expression::Symbol(name) => {
                bindings
                    .get(name)
                    .copied()
                    .ok_or_else(|| ExpressionError::MissingValue {
                        symbols: vec![name.clone()],
                    })
            }
            Expression::Add(l, r) => {
                let left = l.evaluate_node(bindings)?;
                let right = r.evaluate_node(bindings)?;
                Ok(left + right)
            }
            Expression::Sub(l, r) => {
                let left = l.evaluate_node(bindings)?;
                let right = r.evaluate_node(bindings)?;
                Ok(left - right)
            }
            Expression::Mul(l, r) => {
                let left = l.evaluate_node(bindings)?;
                let right = r.evaluate_node(bindings)?;
                Ok(left * right)
            }
            Expression::Div(l, r) => {
                let left = l.evaluate_node(bindings)?;
                let right = r.evaluate_node(bindings)?;
                if is_zero(right) {
                    debug!("Division by zero attempted");
                    Err(ExpressionError::DivisionByZero)
                } else {
                    Ok(left / right)
                }
            }
            Expression::Pow(l, r) => {
                let left = l.evaluate_node(bindings)?;
                let right = r.evaluate_node(bindings)?;
                if left < 0.0 && !is_integer(right) {
                    debug!(
                        "Complex result from negative base with fractional exponent: {}^{}",
                        left, right
                    );
                    Err(ExpressionError::ComplexResult)
                } else if is_zero(left) && right < 0.0 {
                    debug!("Zero raised to negative power: 0^{}", right);
                    Err(ExpressionError::DivisionByZero)
                } else {
                    Ok(left.powf(right))
                }
            }
            Expression::Neg(e) => {
                let val = e.evaluate_node(bindings)?;
                Ok(-val)
            }
            Expression::Func(f, e) => {
                let val = e.evaluate_node(bindings)?;
                f.apply(val)
            }
        }
    }
}

#[cfg(test)]
mod tests_inner_helpers {
    use super::{is_integer, is_zero};

    #[test]
    fn test_is_zero() {
        assert!(is_zero(0.0));
        assert!(is_zero(-0.0));
        assert!(!is_zero(f64::EPSILON / 2.0));
        assert!(!is_zero(1e-300));
    }

    #[test]
    fn test_is_integer() {
        assert!(is_integer(1.0));
        assert!(is_integer(42.0));
        assert!(is_integer(-17.0));
        assert!(!is_integer(1.5));
        assert!(!is_integer(1.234_567));

        assert!(is_integer(2_f64.powi(53)));
        assert!(is_integer(1e15));
    }
}
