use crate::expression::{Bindings, Constant, Expression, Function};
use crate::parser::{
    InputFormat, MAX_NESTING_DEPTH, ParseError, parse, parse_latex, parse_text,
};

fn sym(name: &str) -> Expression {
    Expression::symbol(name)
}

fn num(n: f64) -> Expression {
    Expression::number(n)
}

fn bindings(pairs: &[(&str, f64)]) -> Bindings {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), *value))
        .collect()
}

fn assert_same_value(left: &Expression, right: &Expression, values: &Bindings) {
    let a = left.evaluate(values);
    let b = right.evaluate(values);
    assert!(a.is_ok() && b.is_ok(), "{:?} vs {:?}", a, b);
    if let (Ok(a), Ok(b)) = (a, b) {
        assert!((a - b).abs() < 1e-9, "{} vs {}", a, b);
    }
}

#[test]
fn test_input_format_from_str() {
    assert_eq!("text".parse::<InputFormat>(), Ok(InputFormat::Text));
    assert_eq!("LaTex".parse::<InputFormat>(), Ok(InputFormat::Latex));
    assert_eq!(
        "mathml".parse::<InputFormat>(),
        Err(ParseError::UnsupportedFormat("mathml".to_string()))
    );
}

#[test]
fn test_parse_text_precedence() {
    let expr = parse_text("x + y * z");
    assert_eq!(
        expr,
        Ok(Expression::Add(
            Box::new(sym("x")),
            Box::new(Expression::Mul(Box::new(sym("y")), Box::new(sym("z"))))
        ))
    );
}

#[test]
fn test_parse_text_power_is_right_associative() {
    let expr = parse_text("2 ^ 3 ^ 2");
    assert!(expr.is_ok());
    if let Ok(expr) = expr {
        assert_same_value(&expr, &num(512.0), &Bindings::new());
    }
}

#[test]
fn test_parse_text_double_star_power() {
    assert_eq!(parse_text("x**2"), parse_text("x^2"));
}

#[test]
fn test_parse_text_unary_minus_binds_looser_than_power() {
    assert_eq!(
        parse_text("-x^2"),
        Ok(Expression::Neg(Box::new(Expression::Pow(
            Box::new(sym("x")),
            Box::new(num(2.0))
        ))))
    );
}

#[test]
fn test_parse_text_numbers() {
    assert_eq!(parse_text("0.5"), Ok(num(0.5)));
    assert_eq!(parse_text(".25"), Ok(num(0.25)));
    assert_eq!(parse_text("1e-3"), Ok(num(0.001)));
    assert_eq!(parse_text("2.5E2"), Ok(num(250.0)));
    assert_eq!(parse_text("."), Err(ParseError::InvalidNumber(".".to_string())));
}

#[test]
fn test_parse_text_identifiers_and_constants() {
    assert_eq!(parse_text("u_x"), Ok(sym("u_x")));
    assert_eq!(parse_text("pi"), Ok(Expression::Constant(Constant::Pi)));
    assert_eq!(parse_text("E"), Ok(Expression::Constant(Constant::E)));
    assert_eq!(parse_text("e"), Ok(sym("e")));
}

#[test]
fn test_parse_text_functions() {
    assert_eq!(
        parse_text("sin(x)"),
        Ok(Expression::Func(Function::Sin, Box::new(sym("x"))))
    );
    assert_eq!(
        parse_text("log(x)"),
        Ok(Expression::Func(Function::Ln, Box::new(sym("x"))))
    );
    assert_eq!(
        parse_text("frobnicate(x)"),
        Err(ParseError::UnknownFunction("frobnicate".to_string()))
    );
}

#[test]
fn test_parse_text_errors() {
    assert_eq!(parse_text(""), Err(ParseError::Empty));
    assert_eq!(parse_text("   "), Err(ParseError::Empty));
    assert_eq!(parse_text("x +"), Err(ParseError::UnexpectedEnd));
    assert!(matches!(
        parse_text("x $ y"),
        Err(ParseError::UnexpectedChar { ch: '$', position: 2 })
    ));
    assert!(matches!(
        parse_text("(x + y"),
        Err(ParseError::UnexpectedEnd)
    ));
    assert!(matches!(
        parse_text("2 x"),
        Err(ParseError::UnexpectedToken { position: 2, .. })
    ));
}

#[test]
fn test_parse_latex_fraction_and_sqrt() {
    assert_eq!(
        parse_latex("\\frac{x}{y}"),
        Ok(Expression::Div(Box::new(sym("x")), Box::new(sym("y"))))
    );
    assert_eq!(
        parse_latex("\\sqrt{x}"),
        Ok(Expression::Func(Function::Sqrt, Box::new(sym("x"))))
    );

    let cube_root = parse_latex("\\sqrt[3]{x}");
    assert!(cube_root.is_ok());
    if let Ok(expr) = cube_root {
        assert_same_value(&expr, &num(2.0), &bindings(&[("x", 8.0)]));
    }
}

#[test]
fn test_parse_latex_implicit_multiplication() {
    let expr = parse_latex("2xy");
    assert_eq!(
        expr,
        Ok(Expression::Mul(
            Box::new(Expression::Mul(Box::new(num(2.0)), Box::new(sym("x")))),
            Box::new(sym("y"))
        ))
    );
}

#[test]
fn test_parse_latex_subscripts() {
    assert_eq!(parse_latex("x_{1}"), Ok(sym("x_1")));
    assert_eq!(parse_latex("u_x"), Ok(sym("u_x")));
    assert_eq!(parse_latex("\\sigma_{mass}"), Ok(sym("sigma_mass")));
    assert_eq!(parse_latex("\\mathrm{mass}"), Ok(sym("mass")));
}

#[test]
fn test_parse_latex_unbraced_superscript_takes_one_digit() {
    let expr = parse_latex("x^23");
    assert_eq!(
        expr,
        Ok(Expression::Mul(
            Box::new(Expression::Pow(Box::new(sym("x")), Box::new(num(2.0)))),
            Box::new(num(3.0))
        ))
    );
}

#[test]
fn test_parse_latex_operators() {
    let expr = parse_latex("a \\cdot b \\times c \\div d");
    assert!(expr.is_ok());
    if let Ok(expr) = expr {
        assert_same_value(
            &expr,
            &num(3.0),
            &bindings(&[("a", 2.0), ("b", 3.0), ("c", 4.0), ("d", 8.0)]),
        );
    }
}

#[test]
fn test_parse_latex_functions() {
    assert_eq!(
        parse_latex("\\sin x"),
        Ok(Expression::Func(Function::Sin, Box::new(sym("x"))))
    );
    assert_eq!(
        parse_latex("\\ln\\left(x\\right)"),
        Ok(Expression::Func(Function::Ln, Box::new(sym("x"))))
    );
    assert_eq!(
        parse_latex("\\log(x)"),
        Ok(Expression::Func(Function::Log10, Box::new(sym("x"))))
    );
    assert_eq!(
        parse_latex("\\operatorname{asin}(x)"),
        Ok(Expression::Func(Function::Asin, Box::new(sym("x"))))
    );

    let squared = parse_latex("\\sin^2 \\theta + \\cos^{2}\\theta");
    assert!(squared.is_ok());
    if let Ok(expr) = squared {
        assert_same_value(&expr, &num(1.0), &bindings(&[("theta", 0.3)]));
    }

    let log_base = parse_latex("\\log_{2} 8");
    assert!(log_base.is_ok());
    if let Ok(expr) = log_base {
        assert_same_value(&expr, &num(3.0), &Bindings::new());
    }
}

#[test]
fn test_parse_latex_constants() {
    assert_eq!(parse_latex("\\pi"), Ok(Expression::Constant(Constant::Pi)));
    assert_eq!(
        parse_latex("\\mathrm{e}"),
        Ok(Expression::Constant(Constant::E))
    );
}

#[test]
fn test_parse_latex_absolute_value() {
    let expected = Ok(Expression::Func(Function::Abs, Box::new(sym("x"))));
    assert_eq!(parse_latex("|x|"), expected);
    assert_eq!(parse_latex("\\left|x\\right|"), expected);

    let product = parse_latex("|x||y|");
    assert!(product.is_ok());
    if let Ok(expr) = product {
        assert_same_value(&expr, &num(6.0), &bindings(&[("x", -2.0), ("y", 3.0)]));
    }
}

#[test]
fn test_parse_latex_spacing_is_ignored() {
    assert_eq!(parse_latex("x\\,y"), parse_latex("xy"));
    assert_eq!(parse_latex("\\displaystyle x"), Ok(sym("x")));
}

#[test]
fn test_parse_latex_errors() {
    assert_eq!(parse_latex(""), Err(ParseError::Empty));
    assert_eq!(parse_latex("\\,"), Err(ParseError::Empty));
    assert_eq!(parse_latex("\\frac{1}"), Err(ParseError::UnexpectedEnd));
    assert_eq!(
        parse_latex("\\foo{x}"),
        Err(ParseError::UnknownCommand("foo".to_string()))
    );
    assert!(matches!(
        parse_latex("\\left( x \\right]"),
        Err(ParseError::UnexpectedToken { .. })
    ));
    assert!(matches!(
        parse_latex("x + }"),
        Err(ParseError::UnexpectedToken { .. })
    ));
}

#[test]
fn test_parse_dispatches_on_format() {
    assert_eq!(parse("x*y", InputFormat::Text), parse_text("x*y"));
    assert_eq!(parse("xy", InputFormat::Latex), parse_latex("xy"));
    assert!(parse("xy", InputFormat::Text).is_ok());
}

fn wrapped(open: &str, inner: &str, close: &str, levels: usize) -> String {
    format!("{}{}{}", open.repeat(levels), inner, close.repeat(levels))
}

#[test]
fn test_parse_text_nesting_limit() {
    let too_deep = Err(ParseError::TooDeep {
        limit: MAX_NESTING_DEPTH,
    });

    assert_eq!(parse_text(&wrapped("(", "x", ")", MAX_NESTING_DEPTH)), Ok(sym("x")));
    assert_eq!(
        parse_text(&wrapped("(", "x", ")", MAX_NESTING_DEPTH + 1)),
        too_deep
    );
    assert_eq!(parse_text(&wrapped("(", "x", ")", 200_000)), too_deep);
    assert_eq!(parse_text(&wrapped("sin(", "x", ")", 100_000)), too_deep);
    assert_eq!(parse_text(&format!("{}x", "-".repeat(100_000))), too_deep);
    assert_eq!(parse_text(&wrapped("x^", "x", "", 100_000)), too_deep);
}

#[test]
fn test_parse_latex_nesting_limit() {
    let too_deep = Err(ParseError::TooDeep {
        limit: MAX_NESTING_DEPTH,
    });

    assert_eq!(parse_latex(&wrapped("{", "x", "}", 100)), Ok(sym("x")));
    assert_eq!(parse_latex(&wrapped("{", "x", "}", 200_000)), too_deep);
    assert_eq!(parse_latex(&wrapped("\\left(", "x", "\\right)", 100_000)), too_deep);
    assert_eq!(parse_latex(&wrapped("\\sqrt{", "x", "}", 100_000)), too_deep);
    assert_eq!(parse_latex(&wrapped("x^{", "x", "}", 100_000)), too_deep);
    assert_eq!(parse_latex(&format!("{}x", "-".repeat(100_000))), too_deep);
    assert_eq!(parse_latex(&wrapped("\\sin ", "x", "", 100_000)), too_deep);
}

#[test]
fn test_long_flat_sum_parses() {
    let source = (0..2000)
        .map(|i| format!("x{}", i))
        .collect::<Vec<_>>()
        .join(" + ");
    let parsed = parse_text(&source);
    assert!(parsed.is_ok());
    if let Ok(expr) = parsed {
        assert_eq!(expr.depth(), 2000);
    }
}

#[test]
fn test_display_round_trips_through_text_parser() {
    let sources = [
        "x * y / (z - 1)",
        "-x ^ 2 + sin(x) ^ 2",
        "(x ^ y) ^ 2 - 2 ^ -x",
        "sqrt((y * u_x) ^ 2 + (x * u_y) ^ 2)",
        "x - (y - z) / -3",
        "exp(-x) * ln(abs(y))",
        "1*(a+b)*c",
        "(1*(a+b))/c",
        "x - 1*(a+b)",
        "2 ^ (1*(a-b))",
    ];
    let values = bindings(&[
        ("x", 1.3),
        ("y", -0.7),
        ("z", 2.9),
        ("u_x", 0.1),
        ("u_y", 0.2),
        ("a", 1.0),
        ("b", 2.0),
        ("c", 3.0),
    ]);

    for source in sources {
        let parsed = parse_text(source);
        assert!(parsed.is_ok(), "{}", source);
        if let Ok(expr) = parsed {
            let reparsed = parse_text(&expr.to_string());
            assert!(reparsed.is_ok(), "{} -> {}", source, expr);
            if let Ok(again) = reparsed {
                assert_same_value(&expr, &again, &values);
            }
        }
    }
}

#[test]
fn test_latex_round_trips_through_latex_parser() {
    let sources = [
        "x * y / (z - 1)",
        "-x ^ 2 + sin(x) ^ 2",
        "sqrt((y * u_x) ^ 2 + (x * u_y) ^ 2)",
        "log10(x) * abs(y) + pi * E",
        "mass * sigma_z ^ 3",
    ];
    let values = bindings(&[
        ("x", 1.3),
        ("y", -0.7),
        ("z", 2.9),
        ("u_x", 0.1),
        ("u_y", 0.2),
        ("mass", 4.0),
        ("sigma_z", 0.5),
    ]);

    for source in sources {
        let parsed = parse_text(source);
        assert!(parsed.is_ok(), "{}", source);
        if let Ok(expr) = parsed {
            let latex = expr.to_latex();
            let reparsed = parse_latex(&latex);
            assert!(reparsed.is_ok(), "{} -> {}: {:?}", source, latex, reparsed);
            if let Ok(again) = reparsed {
                assert_same_value(&expr, &again, &values);
            }
        }
    }
}
