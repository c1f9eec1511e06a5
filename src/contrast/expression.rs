//! Linear contrast expressions over column names.
//!
//! Grammar:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('+' | '-') unary | primary
//! primary := number | name | '`' quoted name '`' | '(' expr ')'
//! ```
//!
//! The result must be linear in the column names: products of two
//! column-bearing factors, division by one, and constant offsets are rejected.

use crate::core::VifError;

/// Deepest nesting of parentheses and unary signs accepted in one expression.
pub const MAX_NESTING_DEPTH: usize = 128;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Name(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let ch = chars[pos];
        match ch {
            c if c.is_whitespace() => pos += 1,
            '+' => {
                tokens.push(Token::Plus);
                pos += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                pos += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                pos += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                pos += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                pos += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                pos += 1;
            }
            '`' => {
                let start = pos + 1;
                let Some(len) = chars[start..].iter().position(|&c| c == '`') else {
                    return Err("unterminated quoted column name".to_string());
                };
                let name: String = chars[start..start + len].iter().collect();
                if name.is_empty() {
                    return Err("empty quoted column name".to_string());
                }
                tokens.push(Token::Name(name));
                pos = start + len + 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = pos;
                while pos < chars.len() && (chars[pos].is_ascii_digit() || chars[pos] == '.') {
                    pos += 1;
                }
                // exponent, e.g. 1e-3
                if pos < chars.len() && matches!(chars[pos], 'e' | 'E') {
                    let mut probe = pos + 1;
                    if probe < chars.len() && matches!(chars[probe], '+' | '-') {
                        probe += 1;
                    }
                    if probe < chars.len() && chars[probe].is_ascii_digit() {
                        pos = probe;
                        while pos < chars.len() && chars[pos].is_ascii_digit() {
                            pos += 1;
                        }
                    }
                }
                let text: String = chars[start..pos].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| format!("malformed number '{text}'"))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = pos;
                while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '_') {
                    pos += 1;
                }
                tokens.push(Token::Name(chars[start..pos].iter().collect()));
            }
            other => return Err(format!("unexpected character '{other}'")),
        }
    }

    Ok(tokens)
}

/// A linear form: sum of weights times columns, plus a constant.
#[derive(Debug, Clone)]
struct Linear {
    weights: Vec<f64>,
    constant: f64,
    references_column: bool,
}

impl Linear {
    fn scalar(n: usize, value: f64) -> Self {
        Self {
            weights: vec![0.0; n],
            constant: value,
            references_column: false,
        }
    }

    fn column(n: usize, index: usize) -> Self {
        let mut weights = vec![0.0; n];
        weights[index] = 1.0;
        Self {
            weights,
            constant: 0.0,
            references_column: true,
        }
    }

    fn scale(mut self, k: f64) -> Self {
        self.weights.iter_mut().for_each(|w| *w *= k);
        self.constant *= k;
        self
    }

    fn add(mut self, other: Self, sign: f64) -> Self {
        for (w, o) in self.weights.iter_mut().zip(other.weights) {
            *w += sign * o;
        }
        self.constant += sign * other.constant;
        self.references_column |= other.references_column;
        self
    }
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    columns: &'a [String],
}

impl Parser<'_> {
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseFailure>,
    ) -> Result<T, ParseFailure> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseFailure::Syntax(format!(
                "expression nests deeper than {MAX_NESTING_DEPTH} levels"
            )));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expr(&mut self) -> Result<Linear, ParseFailure> {
        let mut acc = self.term()?;
        loop {
            let sign = match self.peek() {
                Some(Token::Plus) => 1.0,
                Some(Token::Minus) => -1.0,
                _ => return Ok(acc),
            };
            self.pos += 1;
            let rhs = self.term()?;
            acc = acc.add(rhs, sign);
        }
    }

    fn term(&mut self) -> Result<Linear, ParseFailure> {
        let mut acc = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    acc = match (acc.references_column, rhs.references_column) {
                        (true, true) => {
                            return Err(ParseFailure::Syntax(
                                "product of two column terms is not linear".to_string(),
                            ))
                        }
                        (false, _) => rhs.scale(acc.constant),
                        (true, false) => acc.scale(rhs.constant),
                    };
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    if rhs.references_column {
                        return Err(ParseFailure::Syntax(
                            "division by a column term is not linear".to_string(),
                        ));
                    }
                    if rhs.constant == 0.0 {
                        return Err(ParseFailure::Syntax("division by zero".to_string()));
                    }
                    acc = acc.scale(1.0 / rhs.constant);
                }
                _ => return Ok(acc),
            }
        }
    }

    fn unary(&mut self) -> Result<Linear, ParseFailure> {
        match self.peek() {
            Some(Token::Plus) => {
                self.pos += 1;
                self.nested(Self::unary)
            }
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(self.nested(Self::unary)?.scale(-1.0))
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Linear, ParseFailure> {
        let n = self.columns.len();
        match self.advance() {
            Some(Token::Number(value)) => Ok(Linear::scalar(n, value)),
            Some(Token::Name(name)) => match self.columns.iter().position(|c| *c == name) {
                Some(index) => Ok(Linear::column(n, index)),
                None => Err(ParseFailure::UnknownColumn(name)),
            },
            Some(Token::LParen) => {
                let inner = self.nested(Self::expr)?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(ParseFailure::Syntax("missing closing parenthesis".to_string())),
                }
            }
            Some(token) => Err(ParseFailure::Syntax(format!("unexpected token {token:?}"))),
            None => Err(ParseFailure::Syntax("unexpected end of expression".to_string())),
        }
    }
}

enum ParseFailure {
    Syntax(String),
    UnknownColumn(String),
}

/// Evaluate a linear expression over `columns` into one weight per column.
///
/// Fails with `UnknownColumn` when a name is not a column, and with
/// `InvalidContrast` for malformed or nonlinear expressions, constant offsets,
/// expressions whose weights are all zero, and nesting beyond
/// [`MAX_NESTING_DEPTH`].
pub fn parse_contrast(expression: &str, columns: &[String]) -> Result<Vec<f64>, VifError> {
    let invalid = |reason: String| VifError::InvalidContrast {
        contrast: expression.to_string(),
        reason,
    };

    let tokens = tokenize(expression).map_err(invalid)?;
    if tokens.is_empty() {
        return Err(invalid("empty expression".to_string()));
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        columns,
    };
    let linear = match parser.expr() {
        Ok(linear) => linear,
        Err(ParseFailure::UnknownColumn(name)) => return Err(VifError::UnknownColumn { name }),
        Err(ParseFailure::Syntax(reason)) => return Err(invalid(reason)),
    };

    if let Some(token) = parser.peek() {
        return Err(invalid(format!("unexpected trailing token {token:?}")));
    }
    if !linear.references_column {
        return Err(invalid("expression does not reference any column".to_string()));
    }
    if linear.constant != 0.0 {
        return Err(invalid(format!(
            "constant offset {} is not allowed",
            linear.constant
        )));
    }
    if linear.weights.iter().any(|w| !w.is_finite()) {
        return Err(invalid("weights must be finite".to_string()));
    }
    if linear.weights.iter().all(|&w| w == 0.0) {
        return Err(invalid("contrast evaluates to the all-zero vector".to_string()));
    }

    Ok(linear.weights)
}
