use crate::expression::ast::{Constant, Expression};
use crate::expression::function::Function;

/// Greek letter names understood as LaTeX commands
pub const GREEK_LETTERS: [&str; 36] = [
    "alpha", "beta", "gamma", "delta", "epsilon", "varepsilon", "zeta", "eta", "theta",
    "vartheta", "iota", "kappa", "lambda", "mu", "nu", "xi", "rho", "varrho", "sigma",
    "varsigma", "tau", "upsilon", "phi", "varphi", "chi", "psi", "omega", "Gamma", "Delta",
    "Theta", "Lambda", "Xi", "Pi", "Sigma", "Phi", "Omega",
];

pub fn is_greek(name: &str) -> bool {
    GREEK_LETTERS.contains(&name)
}

/// LaTeX for a symbol name: `u_x` becomes `u_{x}`, `sigma` becomes `\sigma`,
/// multi-letter names are wrapped in `\mathrm{}` so they read back as one symbol.
pub fn symbol_to_latex(name: &str) -> String {
    fn part(text: &str) -> String {
        if is_greek(text) {
            format!("\\{}", text)
        } else {
            text.to_string()
        }
    }

    let (base, subscript) = match name.split_once('_') {
        Some((base, sub)) if !base.is_empty() && !sub.is_empty() => (base, Some(sub)),
        _ => (name, None),
    };

    let single_letter = base.chars().count() == 1 && base.chars().all(|c| c.is_ascii_alphabetic());
    let base = if single_letter || is_greek(base) {
        part(base)
    } else {
        format!("\\mathrm{{{}}}", base)
    };

    match subscript {
        Some(sub) => format!("{}_{{{}}}", base, part(sub)),
        None => base,
    }
}

impl Expression {
    /// Render the expression as LaTeX.
    /// - Uses \cdot for multiplication
    /// - Uses \frac for division
    /// - Function arguments are always delimited with \left( \right)
    pub fn to_latex(&self) -> String {
        fn precedence(expr: &Expression) -> u8 {
            match expr {
                Expression::Add(_, _) | Expression::Sub(_, _) => 1,
                Expression::Mul(_, _) | Expression::Div(_, _) => 2,
                Expression::Neg(_) => 3,
                Expression::Number(n) if *n < 0.0 => 3,
                Expression::Pow(_, _) => 4,
                Expression::Func(Function::Sqrt | Function::Abs, _) => 5,
                Expression::Func(_, _) => 4,
                Expression::Number(_) | Expression::Symbol(_) | Expression::Constant(_) => 5,
            }
        }

        fn wrap_parens(s: String) -> String {
            format!("\\left({}\\right)", s)
        }

        fn fmt(expr: &Expression) -> String {
            match expr {
                Expression::Number(n) => number_to_string(*n),
                Expression::Symbol(name) => symbol_to_latex(name),
                Expression::Constant(Constant::Pi) => String::from("\\pi"),
                Expression::Constant(Constant::E) => String::from("\\mathrm{e}"),
                Expression::Add(l, r) => format!("{} + {}", fmt(l), fmt(r)),
                Expression::Sub(l, r) => {
                    let mut rs = fmt(r);
                    if precedence(r) <= 1 {
                        rs = wrap_parens(rs);
                    }
                    format!("{} - {}", fmt(l), rs)
                }
                Expression::Mul(l, r) => {
                    let mut ls = fmt(l);
                    let mut rs = fmt(r);
                    if precedence(l) < 2 {
                        ls = wrap_parens(ls);
                    }
                    if precedence(r) < 2 {
                        rs = wrap_parens(rs);
                    }
                    format!("{} \\cdot {}", ls, rs)
                }
                Expression::Div(l, r) => format!("\\frac{{{}}}{{{}}}", fmt(l), fmt(r)),
                Expression::Pow(l, r) => {
                    let mut base = fmt(l);
                    if precedence(l) <= 4 {
                        base = wrap_parens(base);
                    }
                    format!("{}^{{{}}}", base, fmt(r))
                }
                Expression::Neg(e) => {
                    let mut inner = fmt(e);
                    if precedence(e) < 4 {
                        inner = wrap_parens(inner);
                    }
                    format!("-{}", inner)
                }
                Expression::Func(Function::Sqrt, arg) => format!("\\sqrt{{{}}}", fmt(arg)),
                Expression::Func(Function::Abs, arg) => {
                    format!("\\left|{}\\right|", fmt(arg))
                }
                Expression::Func(func, arg) => {
                    let command = func.latex_command().unwrap_or_else(|| func.name());
                    format!("\\{}{}", command, wrap_parens(fmt(arg)))
                }
            }
        }

        fn number_to_string(n: f64) -> String {
            // Preserve integers without trailing .0, keep others as-is
            if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e18 {
                format!("{}", n.trunc() as i64)
            } else if n.is_infinite() {
                if n.is_sign_positive() {
                    String::from("\\infty")
                } else {
                    String::from("-\\infty")
                }
            } else if n.is_nan() {
                String::from("\\mathrm{NaN}")
            } else {
                format!("{}", n)
            }
        }

        fmt(self)
    }
}
