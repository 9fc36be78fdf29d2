//! Native text syntax: `x * sin(y) ^ 2 / 3`, `u_x ** 2`, `pi`, `E`

use log::debug;

use crate::expression::{Constant, Expression, Function};
use crate::parser::MAX_NESTING_DEPTH;
use crate::parser::errors::ParseError;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LeftParen,
    RightParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {}", n),
            Token::Ident(name) => format!("'{}'", name),
            Token::Plus => String::from("'+'"),
            Token::Minus => String::from("'-'"),
            Token::Star => String::from("'*'"),
            Token::Slash => String::from("'/'"),
            Token::Caret => String::from("'^'"),
            Token::LeftParen => String::from("'('"),
            Token::RightParen => String::from("')'"),
        }
    }
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    position: usize,
}

fn tokenize(source: &str) -> Result<Vec<Spanned>, ParseError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while let Some(&ch) = chars.get(pos) {
        let start = pos;
        let token = match ch {
            c if c.is_whitespace() => {
                pos += 1;
                continue;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let (number, end) = lex_number(&chars, pos)?;
                pos = end;
                tokens.push(Spanned {
                    token: Token::Number(number),
                    position: start,
                });
                continue;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let name: String = chars
                    .iter()
                    .skip(pos)
                    .take_while(|c| c.is_ascii_alphanumeric() || **c == '_')
                    .collect();
                pos += name.chars().count();
                tokens.push(Spanned {
                    token: Token::Ident(name),
                    position: start,
                });
                continue;
            }
            '*' if chars.get(pos + 1) == Some(&'*') => {
                pos += 1;
                Token::Caret
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '^' => Token::Caret,
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            other => {
                return Err(ParseError::UnexpectedChar {
                    ch: other,
                    position: pos,
                });
            }
        };
        pos += 1;
        tokens.push(Spanned {
            token,
            position: start,
        });
    }

    Ok(tokens)
}

/// Digits with an optional fraction and an optional exponent (`1.5e-3`)
fn lex_number(chars: &[char], start: usize) -> Result<(f64, usize), ParseError> {
    let is_digit = |i: usize| chars.get(i).is_some_and(|c| c.is_ascii_digit());

    let mut end = start;
    while is_digit(end) {
        end += 1;
    }
    if chars.get(end) == Some(&'.') {
        end += 1;
        while is_digit(end) {
            end += 1;
        }
    }
    // `2e` alone is a number followed by an identifier
    if matches!(chars.get(end), Some('e' | 'E')) {
        let mut lookahead = end + 1;
        if matches!(chars.get(lookahead), Some('+' | '-')) {
            lookahead += 1;
        }
        if is_digit(lookahead) {
            end = lookahead;
            while is_digit(end) {
                end += 1;
            }
        }
    }

    let text: String = chars.iter().skip(start).take(end - start).collect();
    text.parse::<f64>()
        .map(|n| (n, end))
        .map_err(|_| ParseError::InvalidNumber(text))
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
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
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.tokens.get(self.pos) {
            Some(spanned) => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: spanned.token.describe(),
                position: spanned.position,
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

    fn parse_sum(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_product()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    let right = self.parse_product()?;
                    left = Expression::Add(Box::new(left), Box::new(right));
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    let right = self.parse_product()?;
                    left = Expression::Sub(Box::new(left), Box::new(right));
                }
                _ => return Ok(left),
            }
        }
    }

    fn parse_product(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    let right = self.parse_unary()?;
                    left = Expression::Mul(Box::new(left), Box::new(right));
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let right = self.parse_unary()?;
                    left = Expression::Div(Box::new(left), Box::new(right));
                }
                _ => return Ok(left),
            }
        }
    }

    /// Unary minus binds looser than `^`, so `-x^2` is `-(x^2)`
    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                let operand = self.nested(Self::parse_unary)?;
                Ok(Expression::Neg(Box::new(operand)))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.nested(Self::parse_unary)
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Expression, ParseError> {
        let base = self.parse_primary()?;
        if self.peek() == Some(&Token::Caret) {
            self.pos += 1;
            let exponent = self.nested(Self::parse_unary)?;
            return Ok(Expression::Pow(Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        let expected = "number, symbol or '('";
        match self.peek() {
            Some(Token::Number(_)) | Some(Token::Ident(_)) | Some(Token::LeftParen) => {}
            _ => return Err(self.unexpected(expected)),
        }

        match self.advance() {
            Some(Token::Number(n)) => Ok(Expression::Number(n)),
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LeftParen) {
                    let function = Function::from_name(&name)
                        .ok_or_else(|| ParseError::UnknownFunction(name.clone()))?;
                    self.pos += 1;
                    let arg = self.nested(Self::parse_sum)?;
                    self.expect(Token::RightParen)?;
                    Ok(Expression::Func(function, Box::new(arg)))
                } else if let Some(constant) = Constant::from_name(&name) {
                    Ok(Expression::Constant(constant))
                } else {
                    Ok(Expression::Symbol(name))
                }
            }
            _ => {
                let inner = self.nested(Self::parse_sum)?;
                self.expect(Token::RightParen)?;
                Ok(inner)
            }
        }
    }
}

/// # Errors
///
/// Returns a [`ParseError`] when the source is empty, contains characters outside the
/// syntax, calls an unknown function, nests deeper than [`MAX_NESTING_DEPTH`] or is
/// otherwise malformed.
pub fn parse_text(source: &str) -> Result<Expression, ParseError> {
    if source.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let tokens = tokenize(source)?;
    debug!("Tokenized text source into {} tokens", tokens.len());

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_sum()?;
    if parser.peek().is_some() {
        return Err(parser.unexpected("operator or end of input"));
    }
    Ok(expr)
}
