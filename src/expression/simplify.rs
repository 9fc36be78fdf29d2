//! Bottom-up rewriting to a fixed point.
//!
//! Each pass simplifies children first, then rewrites the node itself:
//! sums are flattened into coefficient/term pairs and like terms merged,
//! products are flattened into base/exponent pairs and like bases merged,
//! nested integer powers collapse and functions at exact points fold.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, warn};

use crate::expression::ast::{Constant, Expression};
use crate::expression::errors::ExpressionError;
use crate::expression::function::Function;

pub const DEFAULT_MAX_ITERATIONS: usize = 64;

/// Deepest tree the engine will recurse over on an ordinary thread stack
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Shared flag used to abandon a running simplification
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Fixed-point simplification engine
#[derive(Debug, Clone)]
pub struct Simplifier {
    max_iterations: usize,
    max_depth: usize,
    cancel: Option<CancelToken>,
}

impl Default for Simplifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Simplifier {
    pub fn new() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_depth: DEFAULT_MAX_DEPTH,
            cancel: None,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Raise the depth limit when the caller runs on a thread with a larger stack.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// The token is checked between passes and before every subtree.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// # Errors
    ///
    /// Returns [`ExpressionError::Cancelled`] once the attached token has been cancelled,
    /// and [`ExpressionError::TooDeep`] when the tree is deeper than the depth limit.
    pub fn simplify(&self, expr: &Expression) -> Result<Expression, ExpressionError> {
        self.check_depth(expr)?;
        let mut current = expr.clone();

        for iteration in 0..self.max_iterations {
            self.check_cancelled()?;
            let next = self.pass(&current)?;
            debug!("Simplification pass {}: {} -> {}", iteration, current, next);

            if next == current {
                return Ok(next);
            }
            self.check_depth(&next)?;
            current = next;
        }

        warn!(
            "Simplification stopped after {} passes without reaching a fixed point",
            self.max_iterations
        );
        Ok(current)
    }

    fn check_depth(&self, expr: &Expression) -> Result<(), ExpressionError> {
        let depth = expr.depth();
        if depth > self.max_depth {
            warn!(
                "Expression is {} levels deep, refusing to simplify past {}",
                depth, self.max_depth
            );
            return Err(ExpressionError::TooDeep {
                depth,
                limit: self.max_depth,
            });
        }
        Ok(())
    }

    fn check_cancelled(&self) -> Result<(), ExpressionError> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => {
                debug!("Simplification cancelled");
                Err(ExpressionError::Cancelled)
            }
            _ => Ok(()),
        }
    }

    fn pass(&self, expr: &Expression) -> Result<Expression, ExpressionError> {
        self.check_cancelled()?;

        let rebuilt = match expr {
            Expression::Number(_) | Expression::Symbol(_) | Expression::Constant(_) => {
                return Ok(expr.clone());
            }
            Expression::Add(l, r) => {
                Expression::Add(Box::new(self.pass(l)?), Box::new(self.pass(r)?))
            }
            Expression::Sub(l, r) => {
                Expression::Sub(Box::new(self.pass(l)?), Box::new(self.pass(r)?))
            }
            Expression::Mul(l, r) => {
                Expression::Mul(Box::new(self.pass(l)?), Box::new(self.pass(r)?))
            }
            Expression::Div(l, r) => {
                Expression::Div(Box::new(self.pass(l)?), Box::new(self.pass(r)?))
            }
            Expression::Pow(l, r) => {
                Expression::Pow(Box::new(self.pass(l)?), Box::new(self.pass(r)?))
            }
            Expression::Neg(e) => Expression::Neg(Box::new(self.pass(e)?)),
            Expression::Func(f, e) => Expression::Func(*f, Box::new(self.pass(e)?)),
        };

        Ok(rewrite(rebuilt))
    }
}

impl Expression {
    /// Simplify with the default engine settings
    pub fn simplify(&self) -> Expression {
        // Without a cancel token only the depth limit can stop the engine
        Simplifier::new()
            .simplify(self)
            .unwrap_or_else(|_| self.clone())
    }
}

fn rewrite(expr: Expression) -> Expression {
    match expr {
        Expression::Add(_, _) | Expression::Sub(_, _) | Expression::Neg(_) => {
            Sum::collect(&expr).rebuild()
        }
        Expression::Mul(_, _) | Expression::Div(_, _) => Product::collect(&expr).rebuild(),
        Expression::Pow(base, exponent) => rewrite_power(*base, *exponent),
        Expression::Func(function, arg) => rewrite_function(function, *arg),
        other => other,
    }
}

fn scaled(coefficient: f64, term: Expression) -> Expression {
    Expression::mul_expr(Expression::number(coefficient), term)
}

/// Coefficient and remaining term of a product, when the coefficient is not a fraction
fn split_coefficient(expr: &Expression) -> (f64, Expression) {
    if matches!(expr, Expression::Mul(_, _) | Expression::Div(_, _)) {
        let product = Product::collect(expr);
        if product.denominator_coeff == 1.0 {
            let coefficient = product.numerator_coeff;
            return (coefficient, product.with_numerator_coeff(1.0).rebuild());
        }
    }
    (1.0, expr.clone())
}

struct Sum {
    constant: f64,
    terms: Vec<(f64, Expression)>,
}

impl Sum {
    fn collect(expr: &Expression) -> Self {
        let mut sum = Sum {
            constant: 0.0,
            terms: Vec::new(),
        };
        sum.absorb(expr, 1.0);
        sum
    }

    fn absorb(&mut self, expr: &Expression, sign: f64) {
        match expr {
            Expression::Add(l, r) => {
                self.absorb(l, sign);
                self.absorb(r, sign);
            }
            Expression::Sub(l, r) => {
                self.absorb(l, sign);
                self.absorb(r, -sign);
            }
            Expression::Neg(e) => self.absorb(e, -sign),
            Expression::Number(n) => self.constant += sign * n,
            other => {
                let (coefficient, term) = split_coefficient(other);
                self.push(sign * coefficient, term);
            }
        }
    }

    fn push(&mut self, coefficient: f64, term: Expression) {
        match self.terms.iter_mut().find(|(_, existing)| *existing == term) {
            Some(entry) => entry.0 += coefficient,
            None => self.terms.push((coefficient, term)),
        }
    }

    fn rebuild(self) -> Expression {
        let mut result: Option<Expression> = None;

        for (coefficient, term) in self.terms {
            if coefficient == 0.0 {
                continue;
            }
            result = Some(match result {
                None => scaled(coefficient, term),
                Some(acc) if coefficient < 0.0 => {
                    Expression::Sub(Box::new(acc), Box::new(scaled(-coefficient, term)))
                }
                Some(acc) => Expression::Add(Box::new(acc), Box::new(scaled(coefficient, term))),
            });
        }

        match result {
            None => Expression::number(self.constant),
            Some(acc) if self.constant == 0.0 => acc,
            Some(acc) if self.constant < 0.0 => Expression::Sub(
                Box::new(acc),
                Box::new(Expression::number(-self.constant)),
            ),
            Some(acc) => Expression::Add(Box::new(acc), Box::new(Expression::number(self.constant))),
        }
    }
}

struct Product {
    numerator_coeff: f64,
    denominator_coeff: f64,
    factors: Vec<(Expression, Expression)>,
}

impl Product {
    fn collect(expr: &Expression) -> Self {
        let mut product = Product {
            numerator_coeff: 1.0,
            denominator_coeff: 1.0,
            factors: Vec::new(),
        };
        product.absorb(expr, false);
        product.normalize_coefficients();
        product
    }

    fn absorb(&mut self, expr: &Expression, inverted: bool) {
        match expr {
            Expression::Mul(l, r) => {
                self.absorb(l, inverted);
                self.absorb(r, inverted);
            }
            Expression::Div(l, r) => {
                self.absorb(l, inverted);
                self.absorb(r, !inverted);
            }
            Expression::Neg(e) => {
                self.numerator_coeff = -self.numerator_coeff;
                self.absorb(e, inverted);
            }
            Expression::Number(n) if inverted => self.denominator_coeff *= n,
            Expression::Number(n) => self.numerator_coeff *= n,
            Expression::Pow(base, exponent) => {
                let exponent = if inverted {
                    Expression::neg_expr(exponent.as_ref().clone())
                } else {
                    exponent.as_ref().clone()
                };
                self.push(base.as_ref().clone(), exponent);
            }
            other => {
                let exponent = Expression::number(if inverted { -1.0 } else { 1.0 });
                self.push(other.clone(), exponent);
            }
        }
    }

    fn push(&mut self, base: Expression, exponent: Expression) {
        match self.factors.iter_mut().find(|(existing, _)| *existing == base) {
            Some(entry) => {
                let merged = Expression::add_expr(entry.1.clone(), exponent);
                entry.1 = merged;
            }
            None => self.factors.push((base, exponent)),
        }
    }

    fn normalize_coefficients(&mut self) {
        if self.denominator_coeff < 0.0 {
            self.numerator_coeff = -self.numerator_coeff;
            self.denominator_coeff = -self.denominator_coeff;
        }
        let (m, n) = (self.numerator_coeff, self.denominator_coeff);
        if n != 0.0 && n != 1.0 && m % n == 0.0 {
            self.numerator_coeff = m / n;
            self.denominator_coeff = 1.0;
        }
    }

    fn with_numerator_coeff(mut self, coefficient: f64) -> Self {
        self.numerator_coeff = coefficient;
        self
    }

    fn rebuild(self) -> Expression {
        if self.numerator_coeff == 0.0 && self.denominator_coeff != 0.0 {
            return Expression::number(0.0);
        }

        let mut numerator = Vec::new();
        let mut denominator = Vec::new();
        for (base, exponent) in self.factors {
            match exponent.as_number() {
                Some(e) if e == 0.0 => {}
                Some(e) if e < 0.0 => {
                    denominator.push(Expression::pow_expr(base, Expression::number(-e)))
                }
                _ => numerator.push(Expression::pow_expr(base, exponent)),
            }
        }

        let numerator = match product_of(numerator) {
            None => Expression::number(self.numerator_coeff),
            Some(e) => scaled(self.numerator_coeff, e),
        };
        let denominator = match product_of(denominator) {
            None if self.denominator_coeff == 1.0 => None,
            None => Some(Expression::number(self.denominator_coeff)),
            Some(e) => Some(scaled(self.denominator_coeff, e)),
        };

        match denominator {
            None => numerator,
            Some(d) => Expression::Div(Box::new(numerator), Box::new(d)),
        }
    }
}

fn product_of(factors: Vec<Expression>) -> Option<Expression> {
    factors
        .into_iter()
        .reduce(|acc, factor| Expression::Mul(Box::new(acc), Box::new(factor)))
}

fn integer_value(expr: &Expression) -> Option<f64> {
    expr.as_number().filter(|n| n.fract() == 0.0)
}

fn rewrite_power(base: Expression, exponent: Expression) -> Expression {
    if let Expression::Pow(inner_base, inner_exponent) = &base
        && let (Some(inner), Some(outer)) = (integer_value(inner_exponent), integer_value(&exponent))
    {
        return Expression::pow_expr(
            inner_base.as_ref().clone(),
            Expression::number(inner * outer),
        );
    }
    Expression::pow_expr(base, exponent)
}

fn rewrite_function(function: Function, arg: Expression) -> Expression {
    if let Some(x) = arg.as_number()
        && let Some(exact) = exact_value(function, x)
    {
        return Expression::number(exact);
    }
    match (function, &arg) {
        (Function::Ln, Expression::Constant(Constant::E)) => Expression::number(1.0),
        (Function::Exp, Expression::Func(Function::Ln, inner)) => inner.as_ref().clone(),
        _ => Expression::func(function, arg),
    }
}

/// Function values that are exact in floating point
fn exact_value(function: Function, x: f64) -> Option<f64> {
    match function {
        Function::Sqrt if x >= 0.0 => {
            let root = x.sqrt();
            (root.fract() == 0.0 && root * root == x).then_some(root)
        }
        Function::Log10 if x > 0.0 => {
            let power = x.log10().round();
            (10_f64.powf(power) == x).then_some(power)
        }
        Function::Abs => Some(x.abs()),
        Function::Ln | Function::Acos if x == 1.0 => Some(0.0),
        Function::Exp | Function::Cos | Function::Cosh if x == 0.0 => Some(1.0),
        Function::Sin
        | Function::Tan
        | Function::Asin
        | Function::Atan
        | Function::Sinh
        | Function::Tanh
            if x == 0.0 =>
        {
            Some(0.0)
        }
        _ => None,
    }
}
