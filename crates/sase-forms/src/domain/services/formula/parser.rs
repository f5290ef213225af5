//! Recursive-descent interpreter
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('-' | '+') unary | primary
//! primary := NUMBER | STRING | 'true' | 'false' | '(' expr ')'
//! ```
//!
//! Values are computed while parsing, so left-associative chains are folded
//! in a loop and only parentheses and prefix signs recurse.

use std::fmt;

use super::lexer::{tokenize, Spanned, Token};
use super::FormulaError;
use crate::domain::value_objects::FieldValue;

/// Maximum nesting of parentheses and prefix signs.
pub const MAX_DEPTH: usize = 64;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    Str(String),
    Bool(bool),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Str(_) => "text",
            Self::Bool(_) => "boolean",
        }
    }

    fn to_number(&self, operator: char) -> Result<f64, FormulaError> {
        let mismatch = || FormulaError::TypeMismatch {
            operator,
            operand: self.kind(),
        };
        match self {
            Self::Number(n) => Ok(*n),
            Self::Str(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(mismatch),
            Self::Bool(_) => Err(mismatch()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Str(s) => write!(f, "{}", s),
            Self::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Number(n) => FieldValue::Number(n),
            Value::Str(s) => FieldValue::Text(s),
            Value::Bool(b) => FieldValue::Bool(b),
        }
    }
}

/// Evaluate an already substituted formula.
pub fn evaluate(source: &str) -> Result<Value, FormulaError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(FormulaError::EmptyFormula);
    }

    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if let Some(extra) = parser.peek() {
        return Err(FormulaError::TrailingInput { offset: extra.offset });
    }
    Ok(value)
}

struct Parser<'t> {
    tokens: &'t [Spanned],
    pos: usize,
    depth: usize,
}

impl<'t> Parser<'t> {
    fn peek(&self) -> Option<&'t Spanned> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'t Spanned> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek().is_some_and(|t| &t.token == expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn descend(&mut self) -> Result<(), FormulaError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(FormulaError::NestingTooDeep { limit: MAX_DEPTH });
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<Value, FormulaError> {
        let mut acc = self.term()?;
        loop {
            if self.eat(&Token::Plus) {
                let rhs = self.term()?;
                acc = add(acc, rhs)?;
            } else if self.eat(&Token::Minus) {
                let rhs = self.term()?;
                acc = arithmetic('-', &acc, &rhs)?;
            } else {
                return Ok(acc);
            }
        }
    }

    fn term(&mut self) -> Result<Value, FormulaError> {
        let mut acc = self.unary()?;
        loop {
            if self.eat(&Token::Star) {
                let rhs = self.unary()?;
                acc = arithmetic('*', &acc, &rhs)?;
            } else if self.eat(&Token::Slash) {
                let rhs = self.unary()?;
                acc = arithmetic('/', &acc, &rhs)?;
            } else {
                return Ok(acc);
            }
        }
    }

    fn unary(&mut self) -> Result<Value, FormulaError> {
        let sign = if self.eat(&Token::Minus) {
            Some('-')
        } else if self.eat(&Token::Plus) {
            Some('+')
        } else {
            None
        };

        let Some(sign) = sign else {
            return self.primary();
        };

        self.descend()?;
        let operand = self.unary()?;
        self.depth -= 1;

        let n = operand.to_number(sign)?;
        Ok(Value::Number(if sign == '-' { -n } else { n }))
    }

    fn primary(&mut self) -> Result<Value, FormulaError> {
        let Some(spanned) = self.next() else {
            return Err(FormulaError::UnexpectedEnd);
        };

        match &spanned.token {
            Token::Number(n) => Ok(Value::Number(*n)),
            Token::Str(s) => Ok(Value::Str(s.clone())),
            Token::Bool(b) => Ok(Value::Bool(*b)),
            Token::LParen => {
                self.descend()?;
                let inner = self.expr()?;
                if !self.eat(&Token::RParen) {
                    return Err(match self.peek() {
                        Some(t) => FormulaError::UnexpectedToken {
                            found: t.token.describe(),
                            offset: t.offset,
                        },
                        None => FormulaError::UnexpectedEnd,
                    });
                }
                self.depth -= 1;
                Ok(inner)
            }
            other => Err(FormulaError::UnexpectedToken {
                found: other.describe(),
                offset: spanned.offset,
            }),
        }
    }
}

/// `+` concatenates when either side is text, otherwise adds numbers.
fn add(lhs: Value, rhs: Value) -> Result<Value, FormulaError> {
    match (&lhs, &rhs) {
        (Value::Str(_), _) | (_, Value::Str(_)) => Ok(Value::Str(format!("{}{}", lhs, rhs))),
        _ => arithmetic('+', &lhs, &rhs),
    }
}

fn arithmetic(operator: char, lhs: &Value, rhs: &Value) -> Result<Value, FormulaError> {
    let a = lhs.to_number(operator)?;
    let b = rhs.to_number(operator)?;
    let result = match operator {
        '+' => a + b,
        '-' => a - b,
        '*' => a * b,
        _ => {
            if b == 0.0 {
                return Err(FormulaError::DivisionByZero);
            }
            a / b
        }
    };
    if !result.is_finite() {
        return Err(FormulaError::NonFinite);
    }
    Ok(Value::Number(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(source: &str) -> f64 {
        match evaluate(source).unwrap() {
            Value::Number(n) => n,
            other => panic!("expected number, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(num("1 + 2 * 3"), 7.0);
        assert_eq!(num("(1 + 2) * 3"), 9.0);
        assert_eq!(num("10 - 4 - 3"), 3.0);
        assert_eq!(num("24 / 4 / 2"), 3.0);
        assert_eq!(num("-3 + +5"), 2.0);
        assert_eq!(num("--2"), 2.0);
    }

    #[test]
    fn test_concatenation() {
        assert_eq!(
            evaluate("'Jane' + ' ' + 'Doe'").unwrap(),
            Value::Str("Jane Doe".into())
        );
        assert_eq!(evaluate("'n' + 1 + 2").unwrap(), Value::Str("n12".into()));
        assert_eq!(evaluate("1 + 2 + 'n'").unwrap(), Value::Str("3n".into()));
        assert_eq!(evaluate("true + '!'").unwrap(), Value::Str("true!".into()));
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        assert_eq!(num("'6' * 2"), 12.0);
        assert_eq!(num("'10' - ' 4 '"), 6.0);
        assert_eq!(num("-'3'"), -3.0);
    }

    #[test]
    fn test_type_mismatch() {
        assert!(matches!(
            evaluate("'abc' * 2"),
            Err(FormulaError::TypeMismatch { operator: '*', operand: "text" })
        ));
        assert!(matches!(
            evaluate("true + 1"),
            Err(FormulaError::TypeMismatch { operator: '+', operand: "boolean" })
        ));
        assert!(matches!(evaluate("'inf' - 1"), Err(FormulaError::TypeMismatch { .. })));
    }

    #[test]
    fn test_division_and_overflow() {
        assert!(matches!(evaluate("1 / 0"), Err(FormulaError::DivisionByZero)));
        assert!(matches!(evaluate("1e308 * 10"), Err(FormulaError::NonFinite)));
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(evaluate("(1 + 2"), Err(FormulaError::UnexpectedEnd)));
        assert!(matches!(evaluate("1 +"), Err(FormulaError::UnexpectedEnd)));
        assert!(matches!(evaluate("1 2"), Err(FormulaError::TrailingInput { offset: 2 })));
        assert!(matches!(evaluate("1 )"), Err(FormulaError::TrailingInput { offset: 2 })));
        assert!(matches!(evaluate("* 2"), Err(FormulaError::UnexpectedToken { offset: 0, .. })));
        assert!(matches!(evaluate("   "), Err(FormulaError::EmptyFormula)));
    }

    #[test]
    fn test_nesting_limit() {
        let shallow = format!("{}1{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert_eq!(num(&shallow), 1.0);

        let deep = format!("{}1{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert!(matches!(evaluate(&deep), Err(FormulaError::NestingTooDeep { .. })));

        let signs = format!("{}1", "-".repeat(MAX_DEPTH + 1));
        assert!(matches!(evaluate(&signs), Err(FormulaError::NestingTooDeep { .. })));
    }

    #[test]
    fn test_long_flat_chain() {
        let chain = vec!["1"; 10_000].join(" + ");
        assert_eq!(num(&chain), 10_000.0);
    }
}
