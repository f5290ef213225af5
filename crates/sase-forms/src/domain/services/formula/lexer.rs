//! Tokenizer for substituted formulas

use super::FormulaError;

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    Bool(bool),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Str(s) => format!("{:?}", s),
            Self::Bool(b) => b.to_string(),
            Self::Plus => "+".into(),
            Self::Minus => "-".into(),
            Self::Star => "*".into(),
            Self::Slash => "/".into(),
            Self::LParen => "(".into(),
            Self::RParen => ")".into(),
        }
    }
}

/// Token with its byte offset in the source.
#[derive(Clone, Debug, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

pub fn tokenize(source: &str) -> Result<Vec<Spanned>, FormulaError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        let token = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '0'..='9' | '.' => {
                let end = number_end(source, offset);
                let text = &source[offset..end];
                let value = text
                    .parse::<f64>()
                    .map_err(|_| FormulaError::InvalidNumber { text: text.to_string(), offset })?;
                while chars.peek().is_some_and(|&(i, _)| i < end) {
                    chars.next();
                }
                tokens.push(Spanned { token: Token::Number(value), offset });
                continue;
            }
            '"' | '\'' => {
                chars.next();
                let text = read_string(&mut chars, c, offset)?;
                tokens.push(Spanned { token: Token::Str(text), offset });
                continue;
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some(&(_, w)) = chars.peek() {
                    if w.is_alphanumeric() || w == '_' {
                        word.push(w);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let token = match word.as_str() {
                    "true" => Token::Bool(true),
                    "false" => Token::Bool(false),
                    _ => return Err(FormulaError::UnknownIdentifier { name: word, offset }),
                };
                tokens.push(Spanned { token, offset });
                continue;
            }
            other => return Err(FormulaError::UnexpectedCharacter { ch: other, offset }),
        };
        chars.next();
        tokens.push(Spanned { token, offset });
    }

    Ok(tokens)
}

/// End of a numeric literal: digits, one optional fraction, optional exponent.
fn number_end(source: &str, start: usize) -> usize {
    let bytes = source.as_bytes();
    let mut i = start;
    let digits = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    i = digits(i);
    if i < bytes.len() && bytes[i] == b'.' {
        i = digits(i + 1);
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_end = digits(j);
        if exp_end > j {
            i = exp_end;
        }
    }
    i
}

fn read_string(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    quote: char,
    offset: usize,
) -> Result<String, FormulaError> {
    let mut text = String::new();
    while let Some((_, c)) = chars.next() {
        match c {
            c if c == quote => return Ok(text),
            '\\' => match chars.next() {
                Some((_, 'n')) => text.push('\n'),
                Some((_, 't')) => text.push('\t'),
                Some((_, escaped)) => text.push(escaped),
                None => break,
            },
            c => text.push(c),
        }
    }
    Err(FormulaError::UnterminatedString { offset })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn test_arithmetic_tokens() {
        assert_eq!(
            kinds("(3 + 4.5) * -2 / 1e3"),
            vec![
                Token::LParen,
                Token::Number(3.0),
                Token::Plus,
                Token::Number(4.5),
                Token::RParen,
                Token::Star,
                Token::Minus,
                Token::Number(2.0),
                Token::Slash,
                Token::Number(1000.0),
            ]
        );
    }

    #[test]
    fn test_string_tokens() {
        assert_eq!(
            kinds(r#""Jane" + ' ' + 'O\'Neil'"#),
            vec![
                Token::Str("Jane".into()),
                Token::Plus,
                Token::Str(" ".into()),
                Token::Plus,
                Token::Str("O'Neil".into()),
            ]
        );
    }

    #[test]
    fn test_booleans() {
        assert_eq!(kinds("true"), vec![Token::Bool(true)]);
    }

    #[test]
    fn test_rejects_identifiers_and_braces() {
        assert!(matches!(
            tokenize("John + 1"),
            Err(FormulaError::UnknownIdentifier { offset: 0, .. })
        ));
        assert!(matches!(
            tokenize("{missing} + 1"),
            Err(FormulaError::UnexpectedCharacter { ch: '{', offset: 0 })
        ));
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(
            tokenize("'abc"),
            Err(FormulaError::UnterminatedString { offset: 0 })
        ));
    }

    #[test]
    fn test_lone_dot_is_invalid_number() {
        assert!(matches!(tokenize("."), Err(FormulaError::InvalidNumber { .. })));
    }
}
