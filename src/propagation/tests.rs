use crate::expression::{Expression, ExpressionError};
use crate::parser::{ParseError, parse_text};
use crate::propagation::{
    InputSpec, Measurement, PropagationError, SymbolError, ValueMap, build, evaluate,
    split_symbols, uncertainty_symbol, validate_symbols,
};

fn assert_close(result: Result<f64, PropagationError>, expected: f64) {
    assert!(result.is_ok(), "expected {}, got {:?}", expected, result);
    if let Ok(value) = result {
        assert!(
            (value - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            value
        );
    }
}

fn product_values() -> ValueMap {
    ValueMap::new()
        .with("x", 2.0)
        .with("y", 3.0)
        .with("u_x", 0.1)
        .with("u_y", 0.2)
}

#[test]
fn test_uncertainty_symbol() {
    assert_eq!(uncertainty_symbol("x"), "u_x");
    assert_eq!(uncertainty_symbol("mass"), "u_mass");
}

#[test]
fn test_split_symbols() {
    assert_eq!(split_symbols("x, y ,z"), vec!["x", "y", "z"]);
    assert_eq!(split_symbols(""), Vec::<String>::new());
    assert_eq!(split_symbols("x,,y"), vec!["x", "y"]);
}

#[test]
fn test_input_spec_from_tag() {
    assert_eq!(InputSpec::new("text", "x"), Ok(InputSpec::text("x")));
    assert_eq!(InputSpec::new("LaTex", "x"), Ok(InputSpec::latex("x")));
    assert_eq!(
        InputSpec::new("mathml", "x"),
        Err(PropagationError::UnsupportedFormat("mathml".to_string()))
    );
}

#[test]
fn test_validate_symbols() {
    assert_eq!(
        validate_symbols(&["x", "y_1", "_z"]),
        Ok(vec!["x".to_string(), "y_1".to_string(), "_z".to_string()])
    );
    assert_eq!(
        validate_symbols::<&str>(&[]),
        Err(PropagationError::EmptySymbolList)
    );
    assert_eq!(
        validate_symbols(&[""]),
        Err(PropagationError::Symbol(SymbolError::Empty))
    );
    assert_eq!(
        validate_symbols(&["1x"]),
        Err(PropagationError::Symbol(SymbolError::Invalid("1x".to_string())))
    );
    assert_eq!(
        validate_symbols(&["x y"]),
        Err(PropagationError::Symbol(SymbolError::Invalid("x y".to_string())))
    );
    assert_eq!(
        validate_symbols(&["x", "u_x"]),
        Err(PropagationError::Symbol(SymbolError::Reserved("u_x".to_string())))
    );
    assert_eq!(
        validate_symbols(&["x", "x"]),
        Err(PropagationError::Symbol(SymbolError::Duplicate("x".to_string())))
    );
}

#[test]
fn test_build_returns_parsed_expression() {
    let sources = ["x*y", "sin(x) / (1 + y ^ 2)", "a - b - c"];
    for source in sources {
        let propagation = build(&InputSpec::text(source), &["x", "y"]);
        assert!(propagation.is_ok(), "{}", source);
        if let (Ok(propagation), Ok(parsed)) = (propagation, parse_text(source)) {
            assert_eq!(propagation.expression(), &parsed);
        }
    }
}

#[test]
fn test_build_product_formula() {
    let propagation = build(&InputSpec::text("x*y"), &["x", "y"]);
    assert!(propagation.is_ok());
    if let Ok(propagation) = propagation {
        let expected = parse_text("sqrt(y^2 * u_x^2 + x^2 * u_y^2)");
        assert!(expected.is_ok());
        if let Ok(expected) = expected {
            assert_eq!(propagation.uncertainty(), &expected);
        }
        assert_eq!(propagation.symbols(), &["x".to_string(), "y".to_string()]);
    }
}

#[test]
fn test_evaluate_sum() {
    let propagation = build(&InputSpec::text("x+y"), &["x", "y"]);
    assert!(propagation.is_ok());
    if let Ok(propagation) = propagation {
        let values = ValueMap::new().with("x", 3.0).with("y", 4.0);
        assert_close(evaluate(propagation.expression(), &values), 7.0);
    }
}

#[test]
fn test_evaluate_product_uncertainty() {
    let propagation = build(&InputSpec::text("x*y"), &["x", "y"]);
    assert!(propagation.is_ok());
    if let Ok(propagation) = propagation {
        let expected = ((3.0_f64 * 0.1).powi(2) + (2.0_f64 * 0.2).powi(2)).sqrt();
        assert_close(
            evaluate(propagation.uncertainty(), &product_values()),
            expected,
        );
        assert_close(evaluate(propagation.uncertainty(), &product_values()), 0.5);
    }
}

#[test]
fn test_propagation_evaluate_measurement() {
    let propagation = build(&InputSpec::text("x*y"), &["x", "y"]);
    assert!(propagation.is_ok());
    if let Ok(propagation) = propagation {
        let measurement = propagation.evaluate(&product_values());
        assert!(measurement.is_ok());
        if let Ok(Measurement { value, uncertainty }) = measurement {
            assert!((value - 6.0).abs() < 1e-9);
            assert!((uncertainty - 0.5).abs() < 1e-9);
        }
    }
}

#[test]
fn test_symbol_subset_only_propagates_listed_errors() {
    let propagation = build(&InputSpec::text("x*y"), &["x"]);
    assert!(propagation.is_ok());
    if let Ok(propagation) = propagation {
        assert_eq!(
            propagation.required_symbols(),
            vec!["u_x".to_string(), "x".to_string(), "y".to_string()]
        );
        let values = ValueMap::new()
            .with("x", 2.0)
            .with("y", 3.0)
            .with("u_x", 0.1);
        assert_close(evaluate(propagation.uncertainty(), &values), 0.3);
    }
}

#[test]
fn test_absent_symbol_contributes_nothing() {
    let propagation = build(&InputSpec::text("2 * x"), &["x", "z"]);
    assert!(propagation.is_ok());
    if let Ok(propagation) = propagation {
        assert!(!propagation.uncertainty().contains_symbol("u_z"));
        let values = ValueMap::new().with("x", 1.0).with("u_x", 0.25);
        assert_close(evaluate(propagation.uncertainty(), &values), 0.5);
    }
}

#[test]
fn test_missing_value_leaves_expression_usable() {
    let propagation = build(&InputSpec::text("x*y"), &["x", "y"]);
    assert!(propagation.is_ok());
    if let Ok(propagation) = propagation {
        let incomplete = ValueMap::new().with("x", 2.0).with("y", 3.0);
        assert_eq!(
            evaluate(propagation.uncertainty(), &incomplete),
            Err(PropagationError::MissingValue {
                symbols: vec!["u_x".to_string(), "u_y".to_string()]
            })
        );
        assert_close(evaluate(propagation.uncertainty(), &product_values()), 0.5);
    }
}

#[test]
fn test_evaluation_error() {
    let propagation = build(&InputSpec::text("1 / x"), &["x"]);
    assert!(propagation.is_ok());
    if let Ok(propagation) = propagation {
        let values = ValueMap::new().with("x", 0.0).with("u_x", 0.1);
        assert_eq!(
            evaluate(propagation.expression(), &values),
            Err(PropagationError::Evaluation(ExpressionError::DivisionByZero))
        );
    }
}

#[test]
fn test_build_is_repeatable() {
    let spec = InputSpec::text("x ^ 2 * sin(y) / z");
    let symbols = ["x", "y", "z"];
    let first = build(&spec, &symbols);
    let second = build(&spec, &symbols);
    assert!(first.is_ok() && second.is_ok());
    if let (Ok(first), Ok(second)) = (first, second) {
        let values = ValueMap::new()
            .with("x", 1.5)
            .with("y", 0.4)
            .with("z", 2.0)
            .with("u_x", 0.01)
            .with("u_y", 0.02)
            .with("u_z", 0.03);
        assert_eq!(
            evaluate(first.uncertainty(), &values),
            evaluate(second.uncertainty(), &values)
        );
        assert_eq!(
            evaluate(first.expression(), &values),
            evaluate(second.expression(), &values)
        );
    }
}

#[test]
fn test_latex_build() {
    let propagation = build(&InputSpec::latex("\\frac{m}{V}"), &["m", "V"]);
    assert!(propagation.is_ok());
    if let Ok(propagation) = propagation {
        let values = ValueMap::new()
            .with("m", 10.0)
            .with("V", 2.0)
            .with("u_m", 0.3)
            .with("u_V", 0.1);
        // rho = m / V, relative errors add in quadrature
        let rho = 5.0_f64;
        let expected = rho * ((0.3_f64 / 10.0).powi(2) + (0.1_f64 / 2.0).powi(2)).sqrt();
        assert_close(evaluate(propagation.uncertainty(), &values), expected);
    }
}

#[test]
fn test_parse_failures_are_parse_errors() {
    assert_eq!(
        build(&InputSpec::text(""), &["x"]),
        Err(PropagationError::Parse(ParseError::Empty))
    );
    assert_eq!(
        build(&InputSpec::latex(""), &["x"]),
        Err(PropagationError::Parse(ParseError::Empty))
    );
    assert!(matches!(
        build(&InputSpec::latex("\\frac{x}"), &["x"]),
        Err(PropagationError::Parse(_))
    ));
    assert!(matches!(
        build(&InputSpec::latex("\\unknown x"), &["x"]),
        Err(PropagationError::Parse(_))
    ));
}

#[test]
fn test_build_rejects_bad_symbol_lists() {
    assert_eq!(
        build::<&str>(&InputSpec::text("x"), &[]),
        Err(PropagationError::EmptySymbolList)
    );
    assert!(matches!(
        build(&InputSpec::text("x + u_x"), &["u_x"]),
        Err(PropagationError::Symbol(SymbolError::Reserved(_)))
    ));
}

#[test]
fn test_build_rejects_parameter_named_like_an_uncertainty() {
    assert_eq!(
        build(&InputSpec::text("x * u_x"), &["x"]),
        Err(PropagationError::Symbol(SymbolError::Collision(
            "u_x".to_string()
        )))
    );
    assert_eq!(
        build(&InputSpec::latex("a + u_{b} \\cdot b"), &["a", "b"]),
        Err(PropagationError::Symbol(SymbolError::Collision(
            "u_b".to_string()
        )))
    );

    // u_y is an ordinary parameter while y itself is not differentiated
    let propagation = build(&InputSpec::text("x * u_y"), &["x"]);
    assert!(propagation.is_ok());
    if let Ok(propagation) = propagation {
        let values = ValueMap::new()
            .with("x", 2.0)
            .with("u_y", 3.0)
            .with("u_x", 0.5);
        assert_close(evaluate(propagation.uncertainty(), &values), 1.5);
    }
}

#[test]
fn test_into_parts_hands_over_both_expressions() {
    let propagation = build(&InputSpec::text("x / y"), &["x", "y"]);
    assert!(propagation.is_ok());
    if let Ok(propagation) = propagation {
        let expression = propagation.expression().clone();
        let uncertainty = propagation.uncertainty().clone();
        let (owned_expression, owned_uncertainty) = propagation.into_parts();
        assert_eq!(owned_expression, expression);
        assert_eq!(owned_uncertainty, uncertainty);
        assert!(owned_uncertainty.contains_symbol("u_y"));
    }
}

#[test]
fn test_value_map_from_text() {
    let mut values = ValueMap::new();
    assert_eq!(values.insert_str("x", "2e-3"), Ok(0.002));
    assert!(values.insert_str("y", "1/4").is_ok());
    assert_eq!(values.get("y"), Some(0.25));
    assert!(values.insert_str("z", "pi / 2").is_ok());
    assert_eq!(
        values.insert_str("w", "abc"),
        Err(PropagationError::InvalidValue {
            symbol: "w".to_string(),
            value: "abc".to_string()
        })
    );
    assert_eq!(
        values.insert_str("w", "1/0"),
        Err(PropagationError::InvalidValue {
            symbol: "w".to_string(),
            value: "1/0".to_string()
        })
    );
    assert_eq!(values.len(), 3);
    assert!(!values.contains("w"));
}

#[test]
fn test_value_map_from_iterator() {
    let values: ValueMap = [("x", 1.0), ("u_x", 0.5)].into_iter().collect();
    assert_eq!(values.get("u_x"), Some(0.5));
    assert_close(evaluate(&Expression::symbol("x"), &values), 1.0);
}

#[test]
fn test_measurement_display() {
    let measurement = Measurement {
        value: 6.0,
        uncertainty: 0.5,
    };
    assert_eq!(measurement.to_string(), "6 ± 0.5");
}
