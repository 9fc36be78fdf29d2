//! Content MathML

use crate::expression::{Constant, Expression, Function};

const NAMESPACE: &str = "http://www.w3.org/1998/Math/MathML";

pub fn to_mathml(expr: &Expression) -> String {
    let mut out = format!("<math xmlns=\"{}\">", NAMESPACE);
    write_node(expr, &mut out);
    out.push_str("</math>");
    out
}

fn write_apply(operator: &str, operands: &[&Expression], out: &mut String) {
    out.push_str("<apply><");
    out.push_str(operator);
    out.push_str("/>");
    for operand in operands {
        write_node(operand, out);
    }
    out.push_str("</apply>");
}

fn write_node(expr: &Expression, out: &mut String) {
    match expr {
        Expression::Number(n) => out.push_str(&format!("<cn>{}</cn>", n)),
        Expression::Symbol(name) => out.push_str(&format!("<ci>{}</ci>", escape(name))),
        Expression::Constant(Constant::Pi) => out.push_str("<pi/>"),
        Expression::Constant(Constant::E) => out.push_str("<exponentiale/>"),
        Expression::Add(l, r) => write_apply("plus", &[l.as_ref(), r.as_ref()], out),
        Expression::Sub(l, r) => write_apply("minus", &[l.as_ref(), r.as_ref()], out),
        Expression::Mul(l, r) => write_apply("times", &[l.as_ref(), r.as_ref()], out),
        Expression::Div(l, r) => write_apply("divide", &[l.as_ref(), r.as_ref()], out),
        Expression::Pow(l, r) => write_apply("power", &[l.as_ref(), r.as_ref()], out),
        Expression::Neg(e) => write_apply("minus", &[e.as_ref()], out),
        Expression::Func(Function::Log10, arg) => {
            out.push_str("<apply><log/><logbase><cn>10</cn></logbase>");
            write_node(arg, out);
            out.push_str("</apply>");
        }
        Expression::Func(f, arg) => write_apply(operator(*f), &[arg.as_ref()], out),
    }
}

fn operator(function: Function) -> &'static str {
    match function {
        Function::Sin => "sin",
        Function::Cos => "cos",
        Function::Tan => "tan",
        Function::Asin => "arcsin",
        Function::Acos => "arccos",
        Function::Atan => "arctan",
        Function::Sinh => "sinh",
        Function::Cosh => "cosh",
        Function::Tanh => "tanh",
        Function::Exp => "exp",
        Function::Ln => "ln",
        Function::Log10 => "log",
        Function::Sqrt => "root",
        Function::Abs => "abs",
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
