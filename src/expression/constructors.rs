use std::ops;

use crate::expression::ast::{Constant, Expression};
use crate::expression::function::Function;

impl Expression {
    pub fn number(n: f64) -> Self {
        Expression::Number(n)
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Expression::Symbol(name.into())
    }

    pub fn constant(constant: Constant) -> Self {
        Expression::Constant(constant)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Expression::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_zero_num(&self) -> bool {
        matches!(self, Expression::Number(n) if *n == 0.0)
    }

    pub fn is_one_num(&self) -> bool {
        matches!(self, Expression::Number(n) if *n == 1.0)
    }

    /// `a + b`, folding numbers and additive zeros
    pub fn add_expr(left: Self, right: Self) -> Self {
        if let (Some(l), Some(r)) = (left.as_number(), right.as_number()) {
            return Self::number(l + r);
        }
        if left.is_zero_num() {
            return right;
        }
        if right.is_zero_num() {
            return left;
        }
        Expression::Add(Box::new(left), Box::new(right))
    }

    /// `a - b`, folding numbers and zeros
    pub fn sub_expr(left: Self, right: Self) -> Self {
        if let (Some(l), Some(r)) = (left.as_number(), right.as_number()) {
            return Self::number(l - r);
        }
        if right.is_zero_num() {
            return left;
        }
        if left.is_zero_num() {
            return Self::neg_expr(right);
        }
        Expression::Sub(Box::new(left), Box::new(right))
    }

    /// `a * b`
    ///
    /// Folds `0 * x`, `1 * x`, `-1 * x` and number-with-number products.
    pub fn mul_expr(left: Self, right: Self) -> Self {
        if left.is_zero_num() || right.is_zero_num() {
            return Self::number(0.0);
        }
        if left.is_one_num() {
            return right;
        }
        if right.is_one_num() {
            return left;
        }
        if let (Some(l), Some(r)) = (left.as_number(), right.as_number()) {
            return Self::number(l * r);
        }
        if left.as_number() == Some(-1.0) {
            return Self::neg_expr(right);
        }
        if right.as_number() == Some(-1.0) {
            return Self::neg_expr(left);
        }
        Expression::Mul(Box::new(left), Box::new(right))
    }

    /// `a / b`
    ///
    /// Numbers are only folded when the quotient is exact, so `1 / 3` stays a fraction.
    pub fn div_expr(left: Self, right: Self) -> Self {
        if let (Some(m), Some(n)) = (left.as_number(), right.as_number())
            && n != 0.0
            && m % n == 0.0
        {
            return Self::number(m / n);
        }
        if right.is_one_num() {
            return left;
        }
        if left.is_zero_num() && !right.is_zero_num() {
            return Self::number(0.0);
        }
        Expression::Div(Box::new(left), Box::new(right))
    }

    /// `base ^ exponent`, folding `x ^ 0`, `x ^ 1`, `1 ^ x` and integer powers of numbers
    pub fn pow_expr(base: Self, exponent: Self) -> Self {
        if exponent.is_zero_num() {
            return Self::number(1.0);
        }
        if exponent.is_one_num() {
            return base;
        }
        if base.is_one_num() {
            return Self::number(1.0);
        }
        if let (Some(b), Some(e)) = (base.as_number(), exponent.as_number())
            && e.fract() == 0.0
            && e > 0.0
            && e <= f64::from(i32::MAX)
        {
            let folded = b.powi(e as i32);
            if folded.is_finite() {
                return Self::number(folded);
            }
        }
        Expression::Pow(Box::new(base), Box::new(exponent))
    }

    /// `-a`, folding numbers and double negation
    pub fn neg_expr(inner: Self) -> Self {
        match inner {
            Expression::Number(n) => Self::number(-n),
            Expression::Neg(e) => *e,
            other => Expression::Neg(Box::new(other)),
        }
    }

    pub fn func(function: Function, arg: Self) -> Self {
        Expression::Func(function, Box::new(arg))
    }

    pub fn sqrt(arg: Self) -> Self {
        Self::func(Function::Sqrt, arg)
    }
}

impl ops::Add for Expression {
    type Output = Expression;

    fn add(self, rhs: Expression) -> Expression {
        Expression::add_expr(self, rhs)
    }
}

impl ops::Sub for Expression {
    type Output = Expression;

    fn sub(self, rhs: Expression) -> Expression {
        Expression::sub_expr(self, rhs)
    }
}

impl ops::Mul for Expression {
    type Output = Expression;

    fn mul(self, rhs: Expression) -> Expression {
        Expression::mul_expr(self, rhs)
    }
}

impl ops::Div for Expression {
    type Output = Expression;

    fn div(self, rhs: Expression) -> Expression {
        Expression::div_expr(self, rhs)
    }
}

impl ops::Neg for Expression {
    type Output = Expression;

    fn neg(self) -> Expression {
        Expression::neg_expr(self)
    }
}

impl From<f64> for Expression {
    fn from(n: f64) -> Self {
        Expression::Number(n)
    }
}

impl From<&str> for Expression {
    fn from(name: &str) -> Self {
        Expression::Symbol(name.to_string())
    }
}
