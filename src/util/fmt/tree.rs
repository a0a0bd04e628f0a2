use std::fmt::{self, Write};

use crate::ast::*;

const INDENT_WIDTH: usize = 2;

/// Displays a whole program as an indented tree, one node per line.
pub struct ProgramTree<'a, 'src>(pub &'a [Stmt<'src>]);

impl fmt::Display for ProgramTree<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        print_program(f, self.0)
    }
}

/// Displays a single expression as an indented tree.
pub struct ExprTree<'a, 'src>(pub &'a Expr<'src>);

impl fmt::Display for ExprTree<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        print_expr(f, 0, self.0)
    }
}

pub fn print_program_string(program: &[Stmt<'_>]) -> String {
    ProgramTree(program).to_string()
}

pub fn print_expr_string(expr: &Expr<'_>) -> String {
    ExprTree(expr).to_string()
}

pub fn print_program(w: &mut impl Write, program: &[Stmt<'_>]) -> fmt::Result {
    for stmt in program {
        print_stmt(w, 0, stmt)?;
    }
    Ok(())
}

pub fn print_stmt(w: &mut impl Write, i: usize, stmt: &Stmt<'_>) -> fmt::Result {
    sp(w, i)?;
    match stmt {
        Stmt::Block(body) => {
            writeln!(w, "block")?;
            for item in body {
                print_stmt(w, i + 1, item)?;
            }
        }
        Stmt::Var {
            name,
            ty,
            initializer,
        } => {
            writeln!(w, "let {}: {}", name.lexeme, TypeName(ty))?;
            if let Some(initializer) = initializer {
                print_expr(w, i + 1, initializer)?;
            }
        }
        Stmt::Fn(FnDecl {
            name,
            params,
            body,
            return_ty,
        }) => {
            write!(w, "fn {}(", name.lexeme)?;
            for (idx, param) in params.iter().enumerate() {
                if idx > 0 {
                    write!(w, ", ")?;
                }
                write!(w, "{}: {}", param.name.lexeme, TypeName(&param.ty))?;
            }
            writeln!(w, ") -> {}", TypeName(return_ty))?;
            print_body(w, i + 1, body)?;
        }
        Stmt::Print(expr) => {
            writeln!(w, "print")?;
            print_expr(w, i + 1, expr)?;
        }
        Stmt::Expression(expr) => {
            writeln!(w, "expr")?;
            print_expr(w, i + 1, expr)?;
        }
        Stmt::Return(expr) => {
            writeln!(w, "return")?;
            if let Some(expr) = expr {
                print_expr(w, i + 1, expr)?;
            }
        }
        Stmt::If {
            condition,
            then_block,
            elifs,
            else_block,
        } => {
            writeln!(w, "if")?;
            print_arm(w, i + 1, condition, then_block)?;
            for arm in elifs {
                sp(w, i + 1)?;
                writeln!(w, "else if")?;
                print_arm(w, i + 2, &arm.condition, &arm.block)?;
            }
            if let Some(else_block) = else_block {
                sp(w, i + 1)?;
                writeln!(w, "else")?;
                print_body(w, i + 2, else_block)?;
            }
        }
    }
    Ok(())
}

fn print_arm(w: &mut impl Write, i: usize, condition: &Expr<'_>, block: &Stmt<'_>) -> fmt::Result {
    print_expr(w, i, condition)?;
    sp(w, i)?;
    writeln!(w, "then")?;
    print_body(w, i + 1, block)
}

/// Prints the statements of a block without the block node itself.
fn print_body(w: &mut impl Write, i: usize, body: &Stmt<'_>) -> fmt::Result {
    match body {
        Stmt::Block(stmts) => stmts.iter().try_for_each(|stmt| print_stmt(w, i, stmt)),
        other => print_stmt(w, i, other),
    }
}

pub fn print_expr(w: &mut impl Write, i: usize, expr: &Expr<'_>) -> fmt::Result {
    sp(w, i)?;
    match expr {
        Expr::Number(value) => writeln!(w, "number {value}")?,
        Expr::String(value) => writeln!(w, "string {value:?}")?,
        Expr::Char(value) => writeln!(w, "char '{}'", char::from(*value).escape_default())?,
        Expr::Bool(value) => writeln!(w, "bool {value}")?,
        Expr::Identifier(name) => writeln!(w, "ident {}", name.lexeme)?,
        Expr::Binary { lhs, op, rhs } => {
            writeln!(w, "binary {}", op.lexeme)?;
            print_expr(w, i + 1, lhs)?;
            print_expr(w, i + 1, rhs)?;
        }
        Expr::Unary { op, rhs } => {
            writeln!(w, "unary {}", op.lexeme)?;
            print_expr(w, i + 1, rhs)?;
        }
        Expr::Grouping(inner) => {
            writeln!(w, "paren")?;
            print_expr(w, i + 1, inner)?;
        }
        Expr::Call { callee, args } => {
            writeln!(w, "call")?;
            print_expr(w, i + 1, callee)?;
            for arg in args {
                print_expr(w, i + 1, arg)?;
            }
        }
    }
    Ok(())
}

struct TypeName<'a, 'src>(&'a TypeDescriptor<'src>);

impl fmt::Display for TypeName<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_pointer {
            f.write_char('*')?;
        }
        f.write_str(self.0.name.lexeme)
    }
}

fn sp(w: &mut impl Write, i: usize) -> fmt::Result {
    write!(w, "{:1$}", "", i * INDENT_WIDTH)
}
