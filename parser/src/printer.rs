//! FILENAME: parser/src/printer.rs
//! PURPOSE: Renders an AST back into minimally-parenthesized formula text,
//! rebased against a target cell.
//! CONTEXT: The inverse of the parser. Absolute axes print with their "$"
//! marker and fixed spec; relative axes print the spec of
//! `offset + baseAxis`, which is how copying a formula to another cell
//! adjusts its relative references. Printing against the cell the AST
//! already lives in reproduces an equivalent formula:
//! `parse(to_formula(a, c), c)` is structurally equal to `a`.

use crate::ast::{Ast, Axis, FnId};
use crate::coord::{index_to_col_spec, index_to_row_spec, CellId};
use crate::error::{ParseError, ParseResult};

/// Renders `ast` as formula text with references rebased against `base`.
/// Fails with a syntax error when a relative reference leaves the sheet.
pub fn to_formula(ast: &Ast, base: CellId) -> ParseResult<String> {
    let mut out = String::new();
    render(ast, base, &mut out)?;
    Ok(out)
}

/// Precedence of an infix application, `None` for everything that prints
/// as an atom (literals, references, named calls, unary minus).
fn infix_precedence(ast: &Ast) -> Option<u8> {
    match ast {
        Ast::App { func, .. } => match func {
            FnId::Add | FnId::Sub => Some(10),
            FnId::Mul | FnId::Div => Some(20),
            FnId::Neg | FnId::Min | FnId::Max => None,
        },
        _ => None,
    }
}

fn render(ast: &Ast, base: CellId, out: &mut String) -> ParseResult<()> {
    match ast {
        Ast::Num(n) => {
            out.push_str(&n.to_string());
            Ok(())
        }

        Ast::Ref(cell_ref) => {
            render_axis_col(&cell_ref.col, base, out)?;
            render_axis_row(&cell_ref.row, base, out)
        }

        Ast::App { func, args } => match func {
            FnId::Min | FnId::Max => {
                out.push_str(&func.to_string());
                out.push('(');
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    render(arg, base, out)?;
                }
                out.push(')');
                Ok(())
            }

            FnId::Neg => {
                let [operand] = args.as_slice() else {
                    return Err(ParseError::syntax("malformed negation"));
                };
                out.push('-');
                // A binary application under unary minus needs its own
                // parens; atoms and nested negations do not.
                if infix_precedence(operand).is_some() {
                    out.push('(');
                    render(operand, base, out)?;
                    out.push(')');
                } else {
                    render(operand, base, out)?;
                }
                Ok(())
            }

            FnId::Add | FnId::Sub | FnId::Mul | FnId::Div => {
                let [left, right] = args.as_slice() else {
                    return Err(ParseError::syntax("malformed binary application"));
                };
                let parent = infix_precedence(ast).unwrap_or(0);
                render_child(left, base, out, |p| p < parent)?;
                out.push_str(&func.to_string());
                render_child(right, base, out, |p| p <= parent)
            }
        },
    }
}

/// Renders an infix child, parenthesizing it iff its precedence trips
/// `needs_parens`. Left children wrap on strictly-lower precedence,
/// right children on lower-or-equal, which preserves associativity and
/// meaning with the fewest parens.
fn render_child(
    child: &Ast,
    base: CellId,
    out: &mut String,
    needs_parens: impl Fn(u8) -> bool,
) -> ParseResult<()> {
    let wrap = infix_precedence(child).map(&needs_parens).unwrap_or(false);
    if wrap {
        out.push('(');
        render(child, base, out)?;
        out.push(')');
        Ok(())
    } else {
        render(child, base, out)
    }
}

fn render_axis_col(axis: &Axis, base: CellId, out: &mut String) -> ParseResult<()> {
    if axis.is_abs {
        out.push('$');
        out.push(index_to_col_spec(axis.index, 0)?);
    } else {
        out.push(index_to_col_spec(axis.index, base.col)?);
    }
    Ok(())
}

fn render_axis_row(axis: &Axis, base: CellId, out: &mut String) -> ParseResult<()> {
    if axis.is_abs {
        out.push('$');
        out.push_str(&index_to_row_spec(axis.index, 0)?);
    } else {
        out.push_str(&index_to_row_spec(axis.index, base.row)?);
    }
    Ok(())
}
