use std::fmt;

use crate::expression::ast::Expression;

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fn precedence(expr: &Expression) -> u8 {
            match expr {
                Expression::Add(_, _) | Expression::Sub(_, _) => 1,
                Expression::Mul(_, _) | Expression::Div(_, _) => 2,
                Expression::Neg(_) => 3,
                Expression::Number(n) if *n < 0.0 => 3,
                Expression::Pow(_, _) => 4,
                Expression::Number(_)
                | Expression::Symbol(_)
                | Expression::Constant(_)
                | Expression::Func(_, _) => 5,
            }
        }

        fn is_literal_zero(expr: &Expression) -> bool {
            match expr {
                Expression::Number(n) => *n == 0.0,
                Expression::Neg(inner) => {
                    matches!(inner.as_ref(), Expression::Number(n) if *n == 0.0)
                }
                _ => false,
            }
        }

        fn leading_is_unary_minus(expr: &Expression) -> bool {
            match expr {
                Expression::Neg(_) => true,
                Expression::Number(n) => *n < 0.0,
                Expression::Add(l, _)
                | Expression::Sub(l, _)
                | Expression::Mul(l, _)
                | Expression::Div(l, _)
                | Expression::Pow(l, _) => leading_is_unary_minus(l),
                Expression::Symbol(_) | Expression::Constant(_) | Expression::Func(_, _) => false,
            }
        }

        fn write_with_parens(
            f: &mut fmt::Formatter,
            expr: &Expression,
            need_parens: bool,
        ) -> fmt::Result {
            if need_parens {
                write!(f, "(")?;
                fmt_expression(f, expr)?;
                write!(f, ")")
            } else {
                fmt_expression(f, expr)
            }
        }

        fn fmt_expression(f: &mut fmt::Formatter, expr: &Expression) -> fmt::Result {
            match expr {
                Expression::Number(n) => write!(f, "{}", n),
                Expression::Symbol(name) => write!(f, "{}", name),
                Expression::Constant(c) => write!(f, "{}", c.name()),
                Expression::Func(func, arg) => {
                    write!(f, "{}(", func.name())?;
                    fmt_expression(f, arg)?;
                    write!(f, ")")
                }
                Expression::Add(l, r) => {
                    if let Expression::Neg(inner) = r.as_ref() {
                        write_with_parens(f, l, false)?;
                        let need_r = precedence(inner) <= 1;
                        if need_r && leading_is_unary_minus(inner) {
                            write!(f, " -")?;
                        } else {
                            write!(f, " - ")?;
                        }
                        write_with_parens(f, inner, need_r)
                    } else {
                        write_with_parens(f, l, false)?;
                        write!(f, " + ")?;
                        write_with_parens(f, r, false)
                    }
                }
                Expression::Sub(l, r) => {
                    if let Expression::Neg(inner) = r.as_ref() {
                        write_with_parens(f, l, false)?;
                        write!(f, " + ")?;
                        write_with_parens(f, inner, false)
                    } else {
                        let need_r = precedence(r) <= 1;
                        write_with_parens(f, l, false)?;
                        if need_r && leading_is_unary_minus(r) {
                            write!(f, " -")?;
                        } else {
                            write!(f, " - ")?;
                        }
                        write_with_parens(f, r, need_r)
                    }
                }
                Expression::Mul(l, r) => {
                    if let Expression::Number(n) = l.as_ref() {
                        // the elided product still sits at product precedence
                        if *n == 1.0 && !is_literal_zero(r) {
                            return write_with_parens(f, r, precedence(r) < 2);
                        }
                        if *n == -1.0 {
                            if is_literal_zero(r) {
                                return fmt_expression(f, r);
                            }
                            let need = precedence(r) < 4;
                            write!(f, "-")?;
                            return write_with_parens(f, r, need);
                        }
                    }
                    let need_l = precedence(l) < 2;
                    let need_r = precedence(r) < 2;
                    write_with_parens(f, l, need_l)?;
                    write!(f, " * ")?;
                    write_with_parens(f, r, need_r)
                }
                Expression::Div(l, r) => {
                    let need_l = precedence(l) < 2;
                    let need_r = precedence(r) <= 2;
                    write_with_parens(f, l, need_l)?;
                    write!(f, " / ")?;
                    write_with_parens(f, r, need_r)
                }
                Expression::Pow(l, r) => {
                    // right associative: a ^ b ^ c is a ^ (b ^ c)
                    let need_l = precedence(l) <= 4;
                    let need_r = precedence(r) < 4;
                    write_with_parens(f, l, need_l)?;
                    write!(f, " ^ ")?;
                    write_with_parens(f, r, need_r)
                }
                Expression::Neg(e) => {
                    if let Expression::Number(n) = e.as_ref()
                        && *n == 0.0
                    {
                        return write!(f, "0");
                    }
                    if let Expression::Neg(inner) = e.as_ref() {
                        fmt_expression(f, inner)
                    } else {
                        let need = precedence(e) < 4 || leading_is_unary_minus(e);
                        write!(f, "-")?;
                        write_with_parens(f, e, need)
                    }
                }
            }
        }

        fmt_expression(f, self)
    }
}
