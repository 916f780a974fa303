//! Tokenizer for formula bodies.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::FormulaError;

/// A lexical token of the formula grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// A numeric literal.
    Number(Decimal),
    /// A cell or named-field reference.
    Reference(String),
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// End of input.
    Eof,
}

/// A token together with the character offset it starts at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// What was read.
    pub kind: TokenKind,
    /// Character offset into the formula body.
    pub position: usize,
}

/// Splits a formula body into tokens.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    /// Creates a lexer over a formula body (without the leading `=`).
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    fn current(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.current().is_some_and(char::is_whitespace) {
            self.position += 1;
        }
    }

    fn read_number(&mut self) -> Result<Decimal, FormulaError> {
        let start = self.position;
        let mut seen_dot = false;

        while let Some(ch) = self.current() {
            if ch.is_ascii_digit() {
                self.position += 1;
            } else if ch == '.' && !seen_dot {
                seen_dot = true;
                self.position += 1;
            } else {
                break;
            }
        }

        let mut text: String = self.input[start..self.position].iter().collect();
        if text == "." {
            return Err(FormulaError::Syntax {
                position: start,
                message: "expected digits around '.'".to_string(),
            });
        }
        if text.starts_with('.') {
            text.insert(0, '0');
        }
        if text.ends_with('.') {
            text.pop();
        }

        Decimal::from_str(&text).map_err(|_| FormulaError::Overflow)
    }

    fn read_reference(&mut self) -> String {
        let start = self.position;
        while self
            .current()
            .is_some_and(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        {
            self.position += 1;
        }
        self.input[start..self.position].iter().collect()
    }

    /// Reads the next token, returning [`TokenKind::Eof`] once input is exhausted.
    pub fn next_token(&mut self) -> Result<Token, FormulaError> {
        self.skip_whitespace();
        let position = self.position;

        let Some(ch) = self.current() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                position,
            });
        };

        let kind = match ch {
            '0'..='9' | '.' => TokenKind::Number(self.read_number()?),
            'A'..='Z' | 'a'..='z' | '_' => TokenKind::Reference(self.read_reference()),
            '+' | '-' | '*' | '/' | '(' | ')' => {
                self.position += 1;
                match ch {
                    '+' => TokenKind::Plus,
                    '-' => TokenKind::Minus,
                    '*' => TokenKind::Star,
                    '/' => TokenKind::Slash,
                    '(' => TokenKind::LeftParen,
                    _ => TokenKind::RightParen,
                }
            }
            other => {
                return Err(FormulaError::UnknownToken {
                    token: other,
                    position,
                });
            }
        };

        Ok(Token { kind, position })
    }

    /// Tokenizes the whole input, ending with an [`TokenKind::Eof`] token.
    pub fn tokenize(mut self) -> Result<Vec<Token>, FormulaError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_lexer_numbers() {
        assert_eq!(
            kinds("12 3.5 .25"),
            vec![
                TokenKind::Number(dec("12")),
                TokenKind::Number(dec("3.5")),
                TokenKind::Number(dec("0.25")),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lexer_references_keep_case() {
        assert_eq!(
            kinds("B10 basicSalary _tmp1"),
            vec![
                TokenKind::Reference("B10".to_string()),
                TokenKind::Reference("basicSalary".to_string()),
                TokenKind::Reference("_tmp1".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lexer_operators_and_parens() {
        assert_eq!(
            kinds("(+-*/)"),
            vec![
                TokenKind::LeftParen,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::RightParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lexer_records_positions() {
        let tokens = Lexer::new("  A1 +2").tokenize().unwrap();
        assert_eq!(tokens[0].position, 2);
        assert_eq!(tokens[1].position, 5);
        assert_eq!(tokens[2].position, 6);
    }

    #[test]
    fn test_lexer_rejects_unknown_character() {
        let err = Lexer::new("A1 ^ 2").tokenize().unwrap_err();
        assert_eq!(
            err,
            FormulaError::UnknownToken {
                token: '^',
                position: 3
            }
        );
    }

    #[test]
    fn test_lexer_rejects_lone_dot() {
        let err = Lexer::new("1 + .").tokenize().unwrap_err();
        assert!(matches!(err, FormulaError::Syntax { position: 4, .. }));
    }
}
