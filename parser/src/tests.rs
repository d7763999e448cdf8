//! FILENAME: parser/src/tests.rs
//! PURPOSE: Consolidated unit tests for the formula language crate.

use crate::ast::{Ast, Axis, CellRef, FnId};
use crate::coord::CellId;
use crate::error::ParseError;
use crate::lexer::Lexer;
use crate::parser::parse;
use crate::printer::to_formula;
use crate::token::Token;

fn id(text: &str) -> CellId {
    text.parse().unwrap()
}

fn num(n: f64) -> Ast {
    Ast::Num(n)
}

fn app(func: FnId, args: Vec<Ast>) -> Ast {
    Ast::App { func, args }
}

fn reference(col: Axis, row: Axis) -> Ast {
    Ast::Ref(CellRef { col, row })
}

// ========================================
// LEXER TESTS
// ========================================

#[test]
fn lexer_tokenizes_simple_math() {
    let mut lexer = Lexer::new("1 + 2");

    assert_eq!(lexer.next_token(), Token::Number(1.0));
    assert_eq!(lexer.next_token(), Token::Plus);
    assert_eq!(lexer.next_token(), Token::Number(2.0));
    assert_eq!(lexer.next_token(), Token::End);
}

#[test]
fn lexer_tokenizes_call() {
    let mut lexer = Lexer::new("min(a1, 10)");

    assert_eq!(lexer.next_token(), Token::Ident("min".to_string()));
    assert_eq!(lexer.next_token(), Token::LParen);
    assert_eq!(lexer.next_token(), Token::Ident("a1".to_string()));
    assert_eq!(lexer.next_token(), Token::Comma);
    assert_eq!(lexer.next_token(), Token::Number(10.0));
    assert_eq!(lexer.next_token(), Token::RParen);
    assert_eq!(lexer.next_token(), Token::End);
}

#[test]
fn lexer_keeps_absolute_markers_in_lexeme() {
    let mut lexer = Lexer::new("$a$1+b$2");

    assert_eq!(lexer.next_token(), Token::Ident("$a$1".to_string()));
    assert_eq!(lexer.next_token(), Token::Plus);
    assert_eq!(lexer.next_token(), Token::Ident("b$2".to_string()));
}

#[test]
fn lexer_reads_decimals_and_exponents() {
    let mut lexer = Lexer::new("3.14 2e10 1.5e-3 7E+2");

    assert_eq!(lexer.next_token(), Token::Number(3.14));
    assert_eq!(lexer.next_token(), Token::Number(2e10));
    assert_eq!(lexer.next_token(), Token::Number(1.5e-3));
    assert_eq!(lexer.next_token(), Token::Number(7e2));
}

#[test]
fn lexer_stops_number_at_bare_dot() {
    // "1." is not a number: the dot needs digits after it.
    let mut lexer = Lexer::new("1.");

    assert_eq!(lexer.next_token(), Token::Number(1.0));
    assert_eq!(lexer.next_token(), Token::Illegal('.'));
}

#[test]
fn lexer_leaves_incomplete_exponent_alone() {
    // "2e" lexes as the number 2 followed by the lexeme "e".
    let mut lexer = Lexer::new("2e");

    assert_eq!(lexer.next_token(), Token::Number(2.0));
    assert_eq!(lexer.next_token(), Token::Ident("e".to_string()));
}

#[test]
fn lexer_flags_unknown_characters() {
    let mut lexer = Lexer::new("1 # 2");

    assert_eq!(lexer.next_token(), Token::Number(1.0));
    assert_eq!(lexer.next_token(), Token::Illegal('#'));
}

// ========================================
// PARSER TESTS - LITERALS & OPERATORS
// ========================================

#[test]
fn parser_parses_number_literal() {
    assert_eq!(parse("42", CellId::ORIGIN).unwrap(), num(42.0));
    assert_eq!(parse("3.25", CellId::ORIGIN).unwrap(), num(3.25));
    assert_eq!(parse("2e3", CellId::ORIGIN).unwrap(), num(2000.0));
}

#[test]
fn parser_applies_precedence() {
    let result = parse("1+2*3", CellId::ORIGIN).unwrap();
    assert_eq!(
        result,
        app(FnId::Add, vec![num(1.0), app(FnId::Mul, vec![num(2.0), num(3.0)])])
    );
}

#[test]
fn parser_is_left_associative() {
    let result = parse("1-2-3", CellId::ORIGIN).unwrap();
    assert_eq!(
        result,
        app(FnId::Sub, vec![app(FnId::Sub, vec![num(1.0), num(2.0)]), num(3.0)])
    );

    let result = parse("8/4/2", CellId::ORIGIN).unwrap();
    assert_eq!(
        result,
        app(FnId::Div, vec![app(FnId::Div, vec![num(8.0), num(4.0)]), num(2.0)])
    );
}

#[test]
fn parser_respects_parentheses() {
    let result = parse("(1+2)*3", CellId::ORIGIN).unwrap();
    assert_eq!(
        result,
        app(FnId::Mul, vec![app(FnId::Add, vec![num(1.0), num(2.0)]), num(3.0)])
    );
}

#[test]
fn parser_parses_unary_minus() {
    assert_eq!(
        parse("-5", CellId::ORIGIN).unwrap(),
        app(FnId::Neg, vec![num(5.0)])
    );
    assert_eq!(
        parse("--5", CellId::ORIGIN).unwrap(),
        app(FnId::Neg, vec![app(FnId::Neg, vec![num(5.0)])])
    );
    // Unary minus binds tighter than multiplication.
    assert_eq!(
        parse("-2*3", CellId::ORIGIN).unwrap(),
        app(FnId::Mul, vec![app(FnId::Neg, vec![num(2.0)]), num(3.0)])
    );
}

#[test]
fn parser_parses_variadic_functions() {
    assert_eq!(
        parse("min(1,2,3)", CellId::ORIGIN).unwrap(),
        app(FnId::Min, vec![num(1.0), num(2.0), num(3.0)])
    );
    assert_eq!(
        parse("max(7)", CellId::ORIGIN).unwrap(),
        app(FnId::Max, vec![num(7.0)])
    );
}

#[test]
fn parser_function_names_are_case_sensitive() {
    // "MIN" is not a function, and it is not a cell reference either.
    assert!(parse("MIN(1,2)", CellId::ORIGIN).is_err());
}

// ========================================
// PARSER TESTS - CELL REFERENCES
// ========================================

#[test]
fn parser_normalizes_relative_references() {
    // b3 entered from a1: one column right, two rows down.
    assert_eq!(
        parse("b3", id("a1")).unwrap(),
        reference(Axis::relative(1), Axis::relative(2))
    );
    // a1 entered from c3: offsets are negative.
    assert_eq!(
        parse("a1", id("c3")).unwrap(),
        reference(Axis::relative(-2), Axis::relative(-2))
    );
}

#[test]
fn parser_keeps_absolute_axes_absolute() {
    assert_eq!(
        parse("$b$2", id("d5")).unwrap(),
        reference(Axis::absolute(1), Axis::absolute(1))
    );
    assert_eq!(
        parse("b$2", id("d5")).unwrap(),
        reference(Axis::relative(-2), Axis::absolute(1))
    );
}

#[test]
fn parser_leading_marker_pins_whole_reference() {
    // "$b2" is anchored on both axes, so copying the formula anywhere
    // keeps it pointing at b2.
    assert_eq!(
        parse("$b2", id("d5")).unwrap(),
        reference(Axis::absolute(1), Axis::absolute(1))
    );
}

#[test]
fn parser_reference_letters_are_case_insensitive() {
    assert_eq!(parse("B2", id("a1")).unwrap(), parse("b2", id("a1")).unwrap());
}

#[test]
fn parser_rejects_out_of_range_rows() {
    assert!(matches!(
        parse("a0", CellId::ORIGIN),
        Err(ParseError::Limits(_))
    ));
    assert!(matches!(
        parse("a10000", CellId::ORIGIN),
        Err(ParseError::Limits(_))
    ));
}

#[test]
fn parser_rejects_malformed_input() {
    for formula in [
        "", "1+", "min(", "min(1", "min", "(1+2", "1 2", "a", "a1b c", "aa1", "_x", "a 1", "1..2",
        "$", "$$a1", "a$", "*3",
    ] {
        assert!(
            matches!(parse(formula, CellId::ORIGIN), Err(ParseError::Syntax(_))),
            "expected syntax error for {:?}",
            formula
        );
    }
}

// ========================================
// PRINTER TESTS
// ========================================

#[test]
fn printer_uses_minimal_parens() {
    let cases = [
        ("1+2*3", "1+2*3"),
        ("(1+2)*3", "(1+2)*3"),
        ("1-2-3", "1-2-3"),
        ("1-(2-3)", "1-(2-3)"),
        ("8/4/2", "8/4/2"),
        ("8/(4/2)", "8/(4/2)"),
        ("(1+2)/(3-4)", "(1+2)/(3-4)"),
        ("2*(3+4)-1", "2*(3+4)-1"),
    ];
    for (input, expected) in cases {
        let ast = parse(input, CellId::ORIGIN).unwrap();
        assert_eq!(to_formula(&ast, CellId::ORIGIN).unwrap(), expected);
    }
}

#[test]
fn printer_wraps_binary_operand_of_negation() {
    let cases = [
        ("-(1+2)", "-(1+2)"),
        ("-(2*3)", "-(2*3)"),
        ("--2", "--2"),
        ("-min(1,2)", "-min(1, 2)"),
        ("-5*2", "-5*2"),
    ];
    for (input, expected) in cases {
        let ast = parse(input, CellId::ORIGIN).unwrap();
        assert_eq!(to_formula(&ast, CellId::ORIGIN).unwrap(), expected);
    }
}

#[test]
fn printer_renders_whole_numbers_without_fraction() {
    let ast = parse("4.0+0.5", CellId::ORIGIN).unwrap();
    assert_eq!(to_formula(&ast, CellId::ORIGIN).unwrap(), "4+0.5");
}

#[test]
fn printer_rebases_relative_references() {
    // Parsed at c1, printed one row down: every relative row shifts.
    let ast = parse("a1+b2", id("c1")).unwrap();
    assert_eq!(to_formula(&ast, id("c2")).unwrap(), "a2+b3");
}

#[test]
fn printer_keeps_pinned_references_fixed() {
    let ast = parse("$a1+b1", id("c1")).unwrap();
    assert_eq!(to_formula(&ast, id("c2")).unwrap(), "$a$1+b2");
}

#[test]
fn printer_fails_when_rebase_leaves_sheet() {
    // a1 seen from b1 is one column left; from a1 that is off-sheet.
    let ast = parse("a1", id("b1")).unwrap();
    assert!(matches!(
        to_formula(&ast, id("a1")),
        Err(ParseError::Syntax(_))
    ));

    let ast = parse("a1", id("a2")).unwrap();
    assert!(matches!(
        to_formula(&ast, id("a1")),
        Err(ParseError::Syntax(_))
    ));
}

#[test]
fn printer_round_trips_structure() {
    let formulas = [
        "1+2*3",
        "(1+2)*3",
        "min(a1, b2, 3)",
        "max($a$1, b$2, $c3)",
        "-(a1+b1)/2",
        "1-(2-3)-4",
        "a1*b1*c1",
        "2.5e3+0.125",
        "--7",
    ];
    for formula in formulas {
        let base = id("d4");
        let ast = parse(formula, base).unwrap();
        let printed = to_formula(&ast, base).unwrap();
        let reparsed = parse(&printed, base).unwrap();
        assert_eq!(reparsed, ast, "round trip changed {:?} -> {:?}", formula, printed);
    }
}
