//! FILENAME: parser/src/lexer.rs
//! PURPOSE: Scans a raw formula string and produces a stream of Tokens.
//! CONTEXT: First stage of the parsing pipeline. Whitespace between tokens
//! is skipped; whitespace can never occur inside a number or a reference
//! because a lexeme ends at the first character outside its class. The
//! lexer itself never fails: unrecognized input becomes `Token::Illegal`
//! and is rejected by the parser.

use crate::token::Token;
use std::iter::Peekable;
use std::str::Chars;

pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input: input.chars().peekable(),
        }
    }

    /// Advances the lexer and returns the next token.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        match self.input.next() {
            Some('+') => Token::Plus,
            Some('-') => Token::Minus,
            Some('*') => Token::Star,
            Some('/') => Token::Slash,
            Some('(') => Token::LParen,
            Some(')') => Token::RParen,
            Some(',') => Token::Comma,

            Some(ch) if ch.is_ascii_digit() => self.read_number(ch),

            Some(ch) if is_ident_start(ch) => self.read_ident(ch),

            None => Token::End,

            Some(ch) => Token::Illegal(ch),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&ch) = self.input.peek() {
            if !ch.is_whitespace() {
                break;
            }
            self.input.next();
        }
    }

    /// Reads a number: digits, optional `.digits`, optional exponent.
    /// The fraction dot and the exponent marker are only consumed when
    /// the characters after them complete the pattern, so "1." lexes as
    /// the number 1 followed by an illegal '.'.
    fn read_number(&mut self, first_char: char) -> Token {
        let mut number_str = String::from(first_char);

        while let Some(&ch) = self.input.peek() {
            if ch.is_ascii_digit() {
                number_str.push(ch);
                self.input.next();
            } else {
                break;
            }
        }

        if self.input.peek() == Some(&'.') && self.digit_follows_at(1) {
            number_str.push('.');
            self.input.next();
            while let Some(&ch) = self.input.peek() {
                if ch.is_ascii_digit() {
                    number_str.push(ch);
                    self.input.next();
                } else {
                    break;
                }
            }
        }

        if matches!(self.input.peek(), Some(&'e') | Some(&'E')) {
            let signed = matches!(self.clone_peek_at(1), Some('+') | Some('-'));
            let exponent_len = if signed { 2 } else { 1 };
            if self.digit_follows_at(exponent_len) {
                number_str.push(self.input.next().unwrap_or('e'));
                if signed {
                    number_str.push(self.input.next().unwrap_or('+'));
                }
                while let Some(&ch) = self.input.peek() {
                    if ch.is_ascii_digit() {
                        number_str.push(ch);
                        self.input.next();
                    } else {
                        break;
                    }
                }
            }
        }

        match number_str.parse::<f64>() {
            Ok(n) => Token::Number(n),
            Err(_) => Token::Illegal(first_char),
        }
    }

    /// Reads a function-or-reference lexeme. Absolute markers are part
    /// of the lexeme; the parser decides what the text means.
    fn read_ident(&mut self, first_char: char) -> Token {
        let mut ident = String::from(first_char);

        while let Some(&ch) = self.input.peek() {
            if is_ident_continue(ch) {
                ident.push(ch);
                self.input.next();
            } else {
                break;
            }
        }

        Token::Ident(ident)
    }

    /// Looks `offset` characters past the current peek position.
    fn clone_peek_at(&self, offset: usize) -> Option<char> {
        self.input.clone().nth(offset)
    }

    /// True when the character `offset` positions ahead is a digit.
    fn digit_follows_at(&self, offset: usize) -> bool {
        self.clone_peek_at(offset)
            .map(|c| c.is_ascii_digit())
            .unwrap_or(false)
    }
}

/// Returns true if `ch` can start a function-or-reference lexeme.
fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
}

/// Returns true if `ch` can continue a function-or-reference lexeme.
fn is_ident_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
}
