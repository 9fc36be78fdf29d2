use crate::expression::ast::Expression;
use crate::expression::function::Function;

impl Expression {
    /// Partial derivative with respect to `symbol`.
    ///
    /// Subtrees that do not mention `symbol` differentiate to `0` without being walked,
    /// so a symbol absent from the expression yields `0`.
    pub fn differentiate(&self, symbol: &str) -> Expression {
        if !self.contains_symbol(symbol) {
            return Expression::number(0.0);
        }

        match self {
            Expression::Number(_) | Expression::Constant(_) => Expression::number(0.0),
            Expression::Symbol(_) => Expression::number(1.0),
            Expression::Add(l, r) => {
                Expression::add_expr(l.differentiate(symbol), r.differentiate(symbol))
            }
            Expression::Sub(l, r) => {
                Expression::sub_expr(l.differentiate(symbol), r.differentiate(symbol))
            }
            Expression::Mul(l, r) => Expression::add_expr(
                Expression::mul_expr(l.differentiate(symbol), r.as_ref().clone()),
                Expression::mul_expr(l.as_ref().clone(), r.differentiate(symbol)),
            ),
            Expression::Div(l, r) => {
                // (l' r - l r') / r^2
                let numerator = Expression::sub_expr(
                    Expression::mul_expr(l.differentiate(symbol), r.as_ref().clone()),
                    Expression::mul_expr(l.as_ref().clone(), r.differentiate(symbol)),
                );
                Expression::div_expr(
                    numerator,
                    Expression::pow_expr(r.as_ref().clone(), Expression::number(2.0)),
                )
            }
            Expression::Pow(base, exponent) => {
                power_derivative(base.as_ref(), exponent.as_ref(), symbol)
            }
            Expression::Neg(e) => Expression::neg_expr(e.differentiate(symbol)),
            Expression::Func(f, arg) => f.derivative(arg, arg.differentiate(symbol)),
        }
    }
}

fn power_derivative(base: &Expression, exponent: &Expression, symbol: &str) -> Expression {
    let base_varies = base.contains_symbol(symbol);
    let exponent_varies = exponent.contains_symbol(symbol);

    if !exponent_varies {
        // n * b^(n - 1) * b'
        let lowered = Expression::sub_expr(exponent.clone(), Expression::number(1.0));
        return Expression::mul_expr(
            Expression::mul_expr(
                exponent.clone(),
                Expression::pow_expr(base.clone(), lowered),
            ),
            base.differentiate(symbol),
        );
    }

    let power = Expression::pow_expr(base.clone(), exponent.clone());
    let ln_base = Expression::func(Function::Ln, base.clone());

    if !base_varies {
        // b^e * ln(b) * e'
        return Expression::mul_expr(
            Expression::mul_expr(power, ln_base),
            exponent.differentiate(symbol),
        );
    }

    // b^e * (e' ln(b) + e b' / b)
    Expression::mul_expr(
        power,
        Expression::add_expr(
            Expression::mul_expr(exponent.differentiate(symbol), ln_base),
            Expression::div_expr(
                Expression::mul_expr(exponent.clone(), base.differentiate(symbol)),
                base.clone(),
            ),
        ),
    )
}
