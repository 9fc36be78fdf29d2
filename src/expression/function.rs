use crate::expression::ast::Expression;
use crate::expression::errors::ExpressionError;

/// Elementary functions understood by the parsers, evaluator and differentiator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    Ln,
    Log10,
    Sqrt,
    Abs,
}

impl Function {
    pub const ALL: [Function; 14] = [
        Function::Sin,
        Function::Cos,
        Function::Tan,
        Function::Asin,
        Function::Acos,
        Function::Atan,
        Function::Sinh,
        Function::Cosh,
        Function::Tanh,
        Function::Exp,
        Function::Ln,
        Function::Log10,
        Function::Sqrt,
        Function::Abs,
    ];

    /// Canonical name in the text syntax
    pub fn name(self) -> &'static str {
        match self {
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Asin => "asin",
            Function::Acos => "acos",
            Function::Atan => "atan",
            Function::Sinh => "sinh",
            Function::Cosh => "cosh",
            Function::Tanh => "tanh",
            Function::Exp => "exp",
            Function::Ln => "ln",
            Function::Log10 => "log10",
            Function::Sqrt => "sqrt",
            Function::Abs => "abs",
        }
    }

    /// Look up a function by its text name or one of its aliases.
    /// `log` is the natural logarithm, as in most algebra systems.
    pub fn from_name(name: &str) -> Option<Self> {
        let found = match name {
            "log" => Function::Ln,
            "arcsin" => Function::Asin,
            "arccos" => Function::Acos,
            "arctan" => Function::Atan,
            "Abs" => Function::Abs,
            _ => return Function::ALL.into_iter().find(|f| f.name() == name),
        };
        Some(found)
    }

    /// LaTeX command (without the backslash) when one exists
    pub fn latex_command(self) -> Option<&'static str> {
        match self {
            Function::Sin => Some("sin"),
            Function::Cos => Some("cos"),
            Function::Tan => Some("tan"),
            Function::Asin => Some("arcsin"),
            Function::Acos => Some("arccos"),
            Function::Atan => Some("arctan"),
            Function::Sinh => Some("sinh"),
            Function::Cosh => Some("cosh"),
            Function::Tanh => Some("tanh"),
            Function::Exp => Some("exp"),
            Function::Ln => Some("ln"),
            Function::Log10 => Some("log"),
            Function::Sqrt | Function::Abs => None,
        }
    }

    pub fn from_latex_command(command: &str) -> Option<Self> {
        Function::ALL
            .into_iter()
            .find(|f| f.latex_command() == Some(command))
    }

    /// # Errors
    ///
    /// Returns an error when the argument lies outside the real domain of the function.
    pub fn apply(self, x: f64) -> Result<f64, ExpressionError> {
        let domain = |function: Function| ExpressionError::Domain {
            function: function.name(),
            value: x,
        };

        match self {
            Function::Sin => Ok(x.sin()),
            Function::Cos => Ok(x.cos()),
            Function::Tan => Ok(x.tan()),
            Function::Asin | Function::Acos if !(-1.0..=1.0).contains(&x) => Err(domain(self)),
            Function::Asin => Ok(x.asin()),
            Function::Acos => Ok(x.acos()),
            Function::Atan => Ok(x.atan()),
            Function::Sinh => Ok(x.sinh()),
            Function::Cosh => Ok(x.cosh()),
            Function::Tanh => Ok(x.tanh()),
            Function::Exp => Ok(x.exp()),
            Function::Ln | Function::Log10 if x <= 0.0 => Err(domain(self)),
            Function::Ln => Ok(x.ln()),
            Function::Log10 => Ok(x.log10()),
            Function::Sqrt if x < 0.0 => Err(ExpressionError::ComplexResult),
            Function::Sqrt => Ok(x.sqrt()),
            Function::Abs => Ok(x.abs()),
        }
    }

    /// Chain rule: derivative of `f(u)` given `u` and `du`
    pub fn derivative(self, u: &Expression, du: Expression) -> Expression {
        let one = || Expression::number(1.0);
        let f = |func: Function| Expression::func(func, u.clone());

        let outer = match self {
            Function::Sin => f(Function::Cos),
            Function::Cos => Expression::neg_expr(f(Function::Sin)),
            Function::Tan => Expression::div_expr(
                one(),
                Expression::pow_expr(f(Function::Cos), Expression::number(2.0)),
            ),
            Function::Asin | Function::Acos => {
                let root = Expression::sqrt(Expression::sub_expr(
                    one(),
                    Expression::pow_expr(u.clone(), Expression::number(2.0)),
                ));
                let d = Expression::div_expr(one(), root);
                if self == Function::Acos {
                    Expression::neg_expr(d)
                } else {
                    d
                }
            }
            Function::Atan => Expression::div_expr(
                one(),
                Expression::add_expr(
                    one(),
                    Expression::pow_expr(u.clone(), Expression::number(2.0)),
                ),
            ),
            Function::Sinh => f(Function::Cosh),
            Function::Cosh => f(Function::Sinh),
            Function::Tanh => Expression::div_expr(
                one(),
                Expression::pow_expr(f(Function::Cosh), Expression::number(2.0)),
            ),
            Function::Exp => f(Function::Exp),
            Function::Ln => Expression::div_expr(one(), u.clone()),
            Function::Log10 => Expression::div_expr(
                one(),
                Expression::mul_expr(
                    u.clone(),
                    Expression::func(Function::Ln, Expression::number(10.0)),
                ),
            ),
            Function::Sqrt => Expression::div_expr(
                one(),
                Expression::mul_expr(Expression::number(2.0), f(Function::Sqrt)),
            ),
            Function::Abs => Expression::div_expr(u.clone(), f(Function::Abs)),
        };

        Expression::mul_expr(outer, du)
    }
}
