//! FILENAME: parser/src/parser.rs
//! PURPOSE: Recursive descent parser that converts a stream of Tokens into
//! an AST, normalizing every cell reference against the entering cell.
//! CONTEXT: Second stage of the parsing pipeline.
//!
//! GRAMMAR:
//!   expr    --> term (("+" | "-") term)*
//!   term    --> factor (("*" | "/") factor)*
//!   factor  --> NUMBER | "-" factor | FN "(" expr ("," expr)* ")"
//!             | REF | "(" expr ")"
//!   cellRef --> "$"? LETTER "$"? DIGITS        (no inner whitespace)
//!
//! "+"/"-" are left-associative at precedence 10, "*"/"/" at 20, and unary
//! "-" binds tighter than any binary operator. Function names are
//! case-sensitive lowercase; column letters are case-insensitive.
//!
//! An absolute marker before the digits pins the row alone. A marker
//! before the letter pins the whole reference: "$a1" keeps pointing at a1
//! wherever the formula is rebased, while "a$1" keeps only the row. The
//! printer re-emits one marker per pinned axis, so "$a1" round-trips as
//! "$a$1" with identical structure.

use crate::ast::{Ast, Axis, CellRef, FnId};
use crate::coord::{col_spec_to_index, row_spec_to_index, CellId};
use crate::error::{ParseError, ParseResult};
use crate::lexer::Lexer;
use crate::token::Token;

/// Parses `formula` into an AST with every reference normalized against
/// `base`: absolute axes keep their absolute index, relative axes store
/// `absolute - baseAxis` (possibly negative).
pub fn parse(formula: &str, base: CellId) -> ParseResult<Ast> {
    Parser::new(formula, base).parse()
}

/// The Parser holds the lexer, one token of lookahead, and the base cell
/// used to normalize relative references.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current_token: Token,
    base: CellId,
}

impl<'a> Parser<'a> {
    /// Creates a parser and advances to the first token.
    pub fn new(input: &'a str, base: CellId) -> Self {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token();
        Parser {
            lexer,
            current_token,
            base,
        }
    }

    /// Parses the entire input and returns the AST.
    pub fn parse(&mut self) -> ParseResult<Ast> {
        if self.current_token == Token::End {
            return Err(ParseError::syntax("empty formula"));
        }

        let expr = self.parse_expr()?;

        if self.current_token != Token::End {
            return Err(ParseError::syntax(format!(
                "unexpected {} after expression, expected end of formula",
                self.current_token
            )));
        }

        Ok(expr)
    }

    fn advance(&mut self) {
        self.current_token = self.lexer.next_token();
    }

    /// Consumes the expected token or fails naming what was found.
    fn expect(&mut self, expected: Token, context: &str) -> ParseResult<()> {
        if self.current_token == expected {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::syntax(format!(
                "expected {} {}, found {}",
                expected, context, self.current_token
            )))
        }
    }

    /// expr --> term (("+" | "-") term)*
    fn parse_expr(&mut self) -> ParseResult<Ast> {
        let mut left = self.parse_term()?;

        loop {
            let func = match &self.current_token {
                Token::Plus => FnId::Add,
                Token::Minus => FnId::Sub,
                _ => break,
            };

            self.advance();
            let right = self.parse_term()?;
            left = Ast::App {
                func,
                args: vec![left, right],
            };
        }

        Ok(left)
    }

    /// term --> factor (("*" | "/") factor)*
    fn parse_term(&mut self) -> ParseResult<Ast> {
        let mut left = self.parse_factor()?;

        loop {
            let func = match &self.current_token {
                Token::Star => FnId::Mul,
                Token::Slash => FnId::Div,
                _ => break,
            };

            self.advance();
            let right = self.parse_factor()?;
            left = Ast::App {
                func,
                args: vec![left, right],
            };
        }

        Ok(left)
    }

    /// factor --> NUMBER | "-" factor | FN "(" args ")" | REF | "(" expr ")"
    fn parse_factor(&mut self) -> ParseResult<Ast> {
        match self.current_token.clone() {
            Token::Number(n) => {
                self.advance();
                Ok(Ast::Num(n))
            }

            Token::Minus => {
                self.advance();
                let operand = self.parse_factor()?;
                Ok(Ast::App {
                    func: FnId::Neg,
                    args: vec![operand],
                })
            }

            Token::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(Token::RParen, "to close the group")?;
                Ok(expr)
            }

            Token::Ident(lexeme) => {
                self.advance();

                if let Some(func) = FnId::from_name(&lexeme) {
                    return self.parse_call(func, &lexeme);
                }

                let cell_ref = self.parse_cell_ref(&lexeme)?;
                Ok(Ast::Ref(cell_ref))
            }

            Token::End => Err(ParseError::syntax(
                "unexpected end of formula, expected a value",
            )),

            Token::Illegal(ch) => Err(ParseError::syntax(format!(
                "unrecognized character '{}'",
                ch
            ))),

            token => Err(ParseError::syntax(format!(
                "unexpected {}, expected a number, reference, or group",
                token
            ))),
        }
    }

    /// Parses the argument list of a named function call.
    fn parse_call(&mut self, func: FnId, name: &str) -> ParseResult<Ast> {
        self.expect(Token::LParen, &format!("after function name {}", name))?;

        let mut args = vec![self.parse_expr()?];
        while self.current_token == Token::Comma {
            self.advance();
            args.push(self.parse_expr()?);
        }

        self.expect(Token::RParen, "to close the argument list")?;

        Ok(Ast::App { func, args })
    }

    /// Parses a cell reference lexeme of the form `$?letter$?digits` and
    /// normalizes it against the base cell.
    fn parse_cell_ref(&mut self, lexeme: &str) -> ParseResult<CellRef> {
        let bad_ref = || {
            ParseError::syntax(format!(
                "'{}' is not a function name or cell reference",
                lexeme
            ))
        };

        let mut chars = lexeme.chars().peekable();

        let whole_abs = chars.next_if_eq(&'$').is_some();
        let letter = chars
            .next()
            .filter(|c| c.is_ascii_alphabetic())
            .ok_or_else(bad_ref)?;
        let row_marker = chars.next_if_eq(&'$').is_some();
        let digits: String = chars.collect();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(bad_ref());
        }

        let col_index = col_spec_to_index(letter)?;
        let row_index = row_spec_to_index(&digits)?;

        let col = if whole_abs {
            Axis::absolute(col_index)
        } else {
            Axis::relative(col_index - self.base.col)
        };
        let row = if whole_abs || row_marker {
            Axis::absolute(row_index)
        } else {
            Axis::relative(row_index - self.base.row)
        };

        Ok(CellRef { col, row })
    }
}
