//! LaTeX math input: `\frac{x}{y}`, `\sqrt[3]{x}`, `2xy`, `\sin^2 \theta`, `\left| x \right|`

use log::debug;

use crate::expression::{Constant, Expression, Function, is_greek};
use crate::parser::MAX_NESTING_DEPTH;
use crate::parser::errors::ParseError;

/// Commands that only change spacing or style
const IGNORED_COMMANDS: [&str; 11] = [
    ",", ";", ":", "!", " ", "quad", "qquad", "displaystyle", "textstyle", "limits", "nolimits",
];

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(String),
    Letter(char),
    Command(String),
    Char(char),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {}", n),
            Token::Letter(c) => format!("'{}'", c),
            Token::Command(name) => format!("'\\{}'", name),
            Token::Char(c) => format!("'{}'", c),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<(Token, usize)>, ParseError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while let Some(&ch) = chars.get(pos) {
        let start = pos;
        match ch {
            c if c.is_whitespace() => pos += 1,
            c if c.is_ascii_digit()
                || (c == '.' && chars.get(pos + 1).is_some_and(|d| d.is_ascii_digit())) =>
            {
                let mut seen_point = false;
                let number: String = chars
                    .iter()
                    .skip(pos)
                    .take_while(|d| {
                        if **d == '.' && !seen_point {
                            seen_point = true;
                            true
                        } else {
                            d.is_ascii_digit()
                        }
                    })
                    .collect();
                pos += number.chars().count();
                tokens.push((Token::Number(number), start));
            }
            c if c.is_ascii_alphabetic() => {
                pos += 1;
                tokens.push((Token::Letter(c), start));
            }
            '\\' => {
                pos += 1;
                let name: String = match chars.get(pos) {
                    Some(c) if c.is_ascii_alphabetic() => chars
                        .iter()
                        .skip(pos)
                        .take_while(|c| c.is_ascii_alphabetic())
                        .collect(),
                    Some(c) => c.to_string(),
                    None => return Err(ParseError::UnexpectedEnd),
                };
                pos += name.chars().count();
                if !IGNORED_COMMANDS.contains(&name.as_str()) {
                    tokens.push((Token::Command(name), start));
                }
            }
            '+' | '-' | '*' | '/' | '^' | '_' | '{' | '}' | '(' | ')' | '[' | ']' | '|' | '.' => {
                pos += 1;
                tokens.push((Token::Char(ch), start));
            }
            other => {
                return Err(ParseError::UnexpectedChar {
                    ch: other,
                    position: pos,
                });
            }
        }
    }

    Ok(tokens)
}

fn is_operator_command(name: &str) -> bool {
    matches!(name, "cdot" | "times" | "div" | "right")
}

fn parse_number(text: &str) -> Result<Expression, ParseError> {
    text.parse::<f64>()
        .map(Expression::Number)
        .map_err(|_| ParseError::InvalidNumber(text.to_string()))
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    /// Open `|...|` pairs; a bar inside one closes it instead of starting a new one
    abs_depth: usize,
    depth: usize,
}

impl Parser {
    /// Run `parse` one nesting level deeper
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::TooDeep {
                limit: MAX_NESTING_DEPTH,
            });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn peek_is(&self, ch: char) -> bool {
        self.peek() == Some(&Token::Char(ch))
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(token, _)| token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.tokens.get(self.pos) {
            Some((token, position)) => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: token.describe(),
                position: *position,
            },
            None => ParseError::UnexpectedEnd,
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        if self.peek() == Some(&expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(&expected.describe()))
        }
    }

    /// Whether the next token can begin an implicitly multiplied factor
    fn starts_atom(&self) -> bool {
        match self.peek() {
            Some(Token::Number(_)) | Some(Token::Letter(_)) => true,
            Some(Token::Char('(' | '[' | '{')) => true,
            Some(Token::Char('|')) => self.abs_depth == 0,
            Some(Token::Command(name)) => !is_operator_command(name),
            _ => false,
        }
    }

    fn parse_sum(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_product()?;
        loop {
            if self.peek_is('+') {
                self.pos += 1;
                let right = self.parse_product()?;
                left = Expression::Add(Box::new(left), Box::new(right));
            } else if self.peek_is('-') {
                self.pos += 1;
                let right = self.parse_product()?;
                left = Expression::Sub(Box::new(left), Box::new(right));
            } else {
                return Ok(left);
            }
        }
    }

    fn parse_product(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let operator = match self.peek() {
                Some(Token::Char('*')) => Some('*'),
                Some(Token::Command(c)) if c == "cdot" || c == "times" => Some('*'),
                Some(Token::Char('/')) => Some('/'),
                Some(Token::Command(c)) if c == "div" => Some('/'),
                _ => None,
            };

            match operator {
                Some(op) => {
                    self.pos += 1;
                    let right = self.parse_unary()?;
                    left = if op == '*' {
                        Expression::Mul(Box::new(left), Box::new(right))
                    } else {
                        Expression::Div(Box::new(left), Box::new(right))
                    };
                }
                // implicit multiplication: `2xy`, `x\sin y`
                None if self.starts_atom() => {
                    let right = self.parse_postfix()?;
                    left = Expression::Mul(Box::new(left), Box::new(right));
                }
                None => return Ok(left),
            }
        }
    }

    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        if self.peek_is('-') {
            self.pos += 1;
            let operand = self.nested(Self::parse_unary)?;
            return Ok(Expression::Neg(Box::new(operand)));
        }
        if self.peek_is('+') {
            self.pos += 1;
            return self.nested(Self::parse_unary);
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expression, ParseError> {
        let base = self.parse_atom()?;
        if self.peek_is('^') {
            self.pos += 1;
            let exponent = self.nested(Self::parse_script)?;
            return Ok(Expression::Pow(Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    /// Argument of `^`: a braced group or a single token (`x^23` is `x^2 * 3`)
    fn parse_script(&mut self) -> Result<Expression, ParseError> {
        if self.peek_is('{') {
            return self.parse_group();
        }
        if self.peek_is('-') {
            self.pos += 1;
            let operand = self.nested(Self::parse_script)?;
            return Ok(Expression::Neg(Box::new(operand)));
        }
        if let Some(digit) = self.take_single_digit() {
            return parse_number(&digit);
        }
        self.parse_atom()
    }

    /// Split one digit off a number token, leaving the rest in place
    fn take_single_digit(&mut self) -> Option<String> {
        let (token, position) = self.tokens.get_mut(self.pos)?;
        let Token::Number(text) = token else {
            return None;
        };
        let mut chars = text.chars();
        let first = chars.next()?;
        let rest: String = chars.collect();
        if rest.is_empty() {
            self.pos += 1;
        } else {
            *text = rest;
            *position += 1;
        }
        Some(first.to_string())
    }

    fn parse_group(&mut self) -> Result<Expression, ParseError> {
        self.expect(Token::Char('{'))?;
        let inner = self.nested(Self::parse_sum)?;
        self.expect(Token::Char('}'))?;
        Ok(inner)
    }

    fn parse_atom(&mut self) -> Result<Expression, ParseError> {
        let Some(token) = self.peek().cloned() else {
            return Err(ParseError::UnexpectedEnd);
        };

        match token {
            Token::Number(text) => {
                self.pos += 1;
                parse_number(&text)
            }
            Token::Letter(c) => {
                self.pos += 1;
                let name = self.with_subscript(c.to_string())?;
                Ok(Expression::Symbol(name))
            }
            Token::Char(open @ ('(' | '[' | '{')) => {
                self.pos += 1;
                let close = match open {
                    '(' => ')',
                    '[' => ']',
                    _ => '}',
                };
                let saved_depth = std::mem::replace(&mut self.abs_depth, 0);
                let inner = self.nested(Self::parse_sum);
                self.abs_depth = saved_depth;
                let inner = inner?;
                self.expect(Token::Char(close))?;
                Ok(inner)
            }
            Token::Char('|') => {
                self.pos += 1;
                self.abs_depth += 1;
                let inner = self.nested(Self::parse_sum);
                self.abs_depth -= 1;
                let inner = inner?;
                self.expect(Token::Char('|'))?;
                Ok(Expression::Func(Function::Abs, Box::new(inner)))
            }
            Token::Command(name) if !is_operator_command(&name) => {
                self.pos += 1;
                self.parse_command(&name)
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_command(&mut self, name: &str) -> Result<Expression, ParseError> {
        match name {
            "frac" | "dfrac" | "tfrac" => {
                let numerator = self.parse_group()?;
                let denominator = self.parse_group()?;
                Ok(Expression::Div(Box::new(numerator), Box::new(denominator)))
            }
            "sqrt" => {
                if self.peek_is('[') {
                    self.pos += 1;
                    let index = self.nested(Self::parse_sum)?;
                    self.expect(Token::Char(']'))?;
                    let radicand = self.parse_group()?;
                    let exponent =
                        Expression::Div(Box::new(Expression::Number(1.0)), Box::new(index));
                    Ok(Expression::Pow(Box::new(radicand), Box::new(exponent)))
                } else {
                    let radicand = self.parse_group()?;
                    Ok(Expression::Func(Function::Sqrt, Box::new(radicand)))
                }
            }
            "left" => self.parse_delimited(),
            "pi" => Ok(Expression::Constant(Constant::Pi)),
            "mathrm" | "text" | "mathit" => {
                let text = self.parse_raw_group()?;
                if text == "e" {
                    return Ok(Expression::Constant(Constant::E));
                }
                let name = self.with_subscript(text)?;
                Ok(Expression::Symbol(name))
            }
            "operatorname" => {
                let text = self.parse_raw_group()?;
                let function = Function::from_latex_command(&text)
                    .or_else(|| Function::from_name(&text))
                    .ok_or(ParseError::UnknownFunction(text))?;
                self.parse_function(function)
            }
            "log" if self.peek_is('_') => {
                self.pos += 1;
                let base = self.nested(Self::parse_script)?;
                let log = self.parse_function(Function::Ln)?;
                Ok(Expression::Div(
                    Box::new(log),
                    Box::new(Expression::Func(Function::Ln, Box::new(base))),
                ))
            }
            greek if is_greek(greek) => {
                let name = self.with_subscript(greek.to_string())?;
                Ok(Expression::Symbol(name))
            }
            other => match Function::from_latex_command(other) {
                Some(function) => self.parse_function(function),
                None => Err(ParseError::UnknownCommand(other.to_string())),
            },
        }
    }

    /// `\sin^2 x`, `\ln(x)`, `\exp{x}`. An undelimited argument is a single signed factor.
    fn parse_function(&mut self, function: Function) -> Result<Expression, ParseError> {
        let power = if self.peek_is('^') {
            self.pos += 1;
            Some(self.nested(Self::parse_script)?)
        } else {
            None
        };

        let delimited = matches!(self.peek(), Some(Token::Char('(' | '[' | '{')))
            || matches!(self.peek(), Some(Token::Command(c)) if c == "left");
        let arg = if delimited {
            self.nested(Self::parse_atom)?
        } else {
            self.nested(Self::parse_unary)?
        };

        let applied = Expression::Func(function, Box::new(arg));
        Ok(match power {
            Some(exponent) => Expression::Pow(Box::new(applied), Box::new(exponent)),
            None => applied,
        })
    }

    /// Body of `\left<delim> ... \right<delim>`
    fn parse_delimited(&mut self) -> Result<Expression, ParseError> {
        let open = self.advance().ok_or(ParseError::UnexpectedEnd)?;
        let (close, is_abs) = match &open {
            Token::Char('(') => (Token::Char(')'), false),
            Token::Char('[') => (Token::Char(']'), false),
            Token::Char('|') => (Token::Char('|'), true),
            Token::Char('.') => (Token::Char('.'), false),
            Token::Command(c) if c == "{" => (Token::Command(String::from("}")), false),
            Token::Command(c) if c == "|" => (Token::Command(String::from("|")), true),
            other => {
                return Err(ParseError::UnexpectedToken {
                    expected: String::from("delimiter after \\left"),
                    found: other.describe(),
                    position: self.tokens.get(self.pos - 1).map_or(0, |(_, p)| *p),
                });
            }
        };

        let saved_depth = std::mem::replace(&mut self.abs_depth, 0);
        let inner = self.nested(Self::parse_sum);
        self.abs_depth = saved_depth;
        let inner = inner?;

        self.expect(Token::Command(String::from("right")))?;
        // `\left( ... \right.` is allowed
        if self.peek_is('.') {
            self.pos += 1;
        } else {
            self.expect(close)?;
        }

        if is_abs {
            Ok(Expression::Func(Function::Abs, Box::new(inner)))
        } else {
            Ok(inner)
        }
    }

    /// Appends a `_sub` suffix to a symbol name when one follows
    fn with_subscript(&mut self, name: String) -> Result<String, ParseError> {
        if !self.peek_is('_') {
            return Ok(name);
        }
        self.pos += 1;

        let subscript = if self.peek_is('{') {
            self.parse_raw_group()?
        } else if let Some(digit) = self.take_single_digit() {
            digit
        } else {
            match self.advance() {
                Some(Token::Letter(c)) => c.to_string(),
                Some(Token::Command(g)) if is_greek(&g) => g,
                Some(_) => {
                    self.pos -= 1;
                    return Err(self.unexpected("subscript"));
                }
                None => return Err(ParseError::UnexpectedEnd),
            }
        };

        Ok(format!("{}_{}", name, subscript))
    }

    /// Raw identifier text inside braces, e.g. the `mass` of `\mathrm{mass}`
    fn parse_raw_group(&mut self) -> Result<String, ParseError> {
        self.expect(Token::Char('{'))?;
        let mut text = String::new();
        loop {
            match self.peek() {
                Some(Token::Char('}')) => break,
                Some(Token::Letter(c)) => text.push(*c),
                Some(Token::Number(n)) => text.push_str(n),
                Some(Token::Char('_')) => text.push('_'),
                Some(Token::Command(g)) if is_greek(g) => text.push_str(g),
                _ => return Err(self.unexpected("identifier text")),
            }
            self.pos += 1;
        }
        if text.is_empty() {
            return Err(self.unexpected("identifier text"));
        }
        self.pos += 1;
        Ok(text)
    }
}

/// # Errors
///
/// Returns a [`ParseError`] when the source is empty, uses an unknown command or is
/// otherwise malformed.
pub fn parse_latex(source: &str) -> Result<Expression, ParseError> {
    if source.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let tokens = tokenize(source)?;
    debug!("Tokenized LaTeX source into {} tokens", tokens.len());
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        abs_depth: 0,
        depth: 0,
    };
    let expr = parser.parse_sum()?;
    if parser.peek().is_some() {
        return Err(parser.unexpected("operator or end of input"));
    }
    Ok(expr)
}
