//! Recursive descent parser for formula bodies.
//!
//! The grammar is deliberately closed: literals, references, the four
//! arithmetic operators, unary sign and parentheses.
//!
//! ```bnf
//! Expression ::= Term ( ( "+" | "-" ) Term )*
//! Term       ::= Unary ( ( "*" | "/" ) Unary )*
//! Unary      ::= ( "+" | "-" ) Unary | Primary
//! Primary    ::= Number | Reference | "(" Expression ")"
//! ```

use rust_decimal::Decimal;

use super::lexer::{Lexer, Token, TokenKind};
use crate::error::FormulaError;

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
}

/// Formula expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Numeric literal.
    Number(Decimal),
    /// Cell or named-field reference.
    Reference(String),
    /// Unary negation.
    Negate(Box<Expr>),
    /// Binary operation.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
}

impl Expr {
    /// Appends every reference in this expression, in source order.
    pub fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Number(_) => {}
            Expr::Reference(name) => out.push(name),
            Expr::Negate(operand) => operand.collect_references(out),
            Expr::Binary { left, right, .. } => {
                left.collect_references(out);
                right.collect_references(out);
            }
        }
    }
}

/// Deepest expression the parser accepts, counting parentheses, unary
/// signs and operator chains. Evaluation recurses once per level.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Parses a token stream into an [`Expr`].
pub struct Parser {
    tokens: Vec<Token>,
    index: usize,
    depth: usize,
}

impl Parser {
    /// Tokenizes `body` and prepares to parse it.
    pub fn new(body: &str) -> Result<Self, FormulaError> {
        let tokens = Lexer::new(body).tokenize()?;
        Ok(Self {
            tokens,
            index: 0,
            depth: 0,
        })
    }

    fn current(&self) -> &Token {
        // tokenize always ends with Eof and the parser never advances past it
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) {
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
    }

    fn syntax_error(&self, message: impl Into<String>) -> FormulaError {
        FormulaError::Syntax {
            position: self.current().position,
            message: message.into(),
        }
    }

    fn too_deep(&self) -> FormulaError {
        self.syntax_error("formula nested too deeply")
    }

    /// Steps into a parenthesis or unary sign.
    fn enter(&mut self) -> Result<(), FormulaError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(self.too_deep());
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Height of a new node over a child of height `child`.
    fn grow(&self, child: usize) -> Result<usize, FormulaError> {
        let height = child + 1;
        if height > MAX_NESTING_DEPTH {
            return Err(self.too_deep());
        }
        Ok(height)
    }

    /// Parses the complete body, rejecting trailing tokens.
    pub fn parse(mut self) -> Result<Expr, FormulaError> {
        if self.current().kind == TokenKind::Eof {
            return Err(self.syntax_error("empty formula"));
        }

        let (expr, _) = self.parse_expression()?;

        if self.current().kind != TokenKind::Eof {
            return Err(self.syntax_error(format!(
                "unexpected {:?} after expression",
                self.current().kind
            )));
        }

        Ok(expr)
    }

    fn parse_expression(&mut self) -> Result<(Expr, usize), FormulaError> {
        let (mut left, mut height) = self.parse_term()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Subtract,
                _ => return Ok((left, height)),
            };
            self.advance();
            let (right, right_height) = self.parse_term()?;
            height = self.grow(height.max(right_height))?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_term(&mut self) -> Result<(Expr, usize), FormulaError> {
        let (mut left, mut height) = self.parse_unary()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinaryOp::Multiply,
                TokenKind::Slash => BinaryOp::Divide,
                _ => return Ok((left, height)),
            };
            self.advance();
            let (right, right_height) = self.parse_unary()?;
            height = self.grow(height.max(right_height))?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_unary(&mut self) -> Result<(Expr, usize), FormulaError> {
        match self.current().kind {
            TokenKind::Plus => {
                self.advance();
                self.enter()?;
                let operand = self.parse_unary()?;
                self.leave();
                Ok(operand)
            }
            TokenKind::Minus => {
                self.advance();
                self.enter()?;
                let (operand, height) = self.parse_unary()?;
                self.leave();
                Ok((Expr::Negate(Box::new(operand)), self.grow(height)?))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<(Expr, usize), FormulaError> {
        match &self.current().kind {
            TokenKind::Number(value) => {
                let value = *value;
                self.advance();
                Ok((Expr::Number(value), 1))
            }
            TokenKind::Reference(name) => {
                let name = name.clone();
                self.advance();
                Ok((Expr::Reference(name), 1))
            }
            TokenKind::LeftParen => {
                self.advance();
                self.enter()?;
                let parsed = self.parse_expression()?;
                if self.current().kind != TokenKind::RightParen {
                    return Err(self.syntax_error("expected ')'"));
                }
                self.advance();
                self.leave();
                Ok(parsed)
            }
            TokenKind::Eof => Err(self.syntax_error("unexpected end of formula")),
            other => Err(self.syntax_error(format!("unexpected {:?}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<Expr, FormulaError> {
        Parser::new(body)?.parse()
    }

    fn num(n: i64) -> Box<Expr> {
        Box::new(Expr::Number(Decimal::from(n)))
    }

    #[test]
    fn test_parser_precedence() {
        let expr = parse("2+3*4").unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Add,
                left: num(2),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Multiply,
                    left: num(3),
                    right: num(4),
                }),
            }
        );
    }

    #[test]
    fn test_parser_left_associative() {
        let expr = parse("8-3-1").unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Subtract,
                left: Box::new(Expr::Binary {
                    op: BinaryOp::Subtract,
                    left: num(8),
                    right: num(3),
                }),
                right: num(1),
            }
        );
    }

    #[test]
    fn test_parser_unary_minus() {
        assert_eq!(parse("-A1").unwrap(), Expr::Negate(Box::new(Expr::Reference("A1".into()))));
        assert_eq!(parse("+5").unwrap(), Expr::Number(Decimal::from(5)));
    }

    #[test]
    fn test_parser_deep_nesting() {
        let body = format!("{}1{}", "(".repeat(64), ")".repeat(64));
        assert_eq!(parse(&body).unwrap(), Expr::Number(Decimal::ONE));
    }

    #[test]
    fn test_parser_rejects_runaway_nesting() {
        let too_deep = |body: &str| match parse(body) {
            Err(FormulaError::Syntax { message, .. }) => message == "formula nested too deeply",
            _ => false,
        };

        let parens = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
        assert!(too_deep(&parens));
        assert!(too_deep(&format!("{}1", "-".repeat(10_000))));
        assert!(too_deep(&format!("{}1", "+".repeat(10_000))));
        assert!(too_deep(&format!("1{}", "+1".repeat(10_000))));
        assert!(too_deep(&format!("2{}", "*2".repeat(10_000))));
    }

    #[test]
    fn test_parser_accepts_nesting_up_to_the_limit() {
        let depth = MAX_NESTING_DEPTH - 1;
        let body = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(parse(&body).unwrap(), Expr::Number(Decimal::ONE));

        let chain = format!("1{}", "+1".repeat(MAX_NESTING_DEPTH - 1));
        assert!(parse(&chain).is_ok());
    }

    #[test]
    fn test_parser_collects_references_in_order() {
        let expr = parse("B10 + B11 * (basicSalary - B10)").unwrap();
        let mut refs = Vec::new();
        expr.collect_references(&mut refs);
        assert_eq!(refs, vec!["B10", "B11", "basicSalary", "B10"]);
    }

    #[test]
    fn test_parser_errors() {
        assert!(matches!(parse(""), Err(FormulaError::Syntax { .. })));
        assert!(matches!(parse("   "), Err(FormulaError::Syntax { .. })));
        assert!(matches!(parse("(1+2"), Err(FormulaError::Syntax { position: 4, .. })));
        assert!(matches!(parse("1+"), Err(FormulaError::Syntax { .. })));
        assert!(matches!(parse("1 2"), Err(FormulaError::Syntax { position: 2, .. })));
        assert!(matches!(parse("A1 B1"), Err(FormulaError::Syntax { .. })));
        assert!(matches!(parse(")"), Err(FormulaError::Syntax { position: 0, .. })));
    }
}
