//! A naive tree-walk interpreter over the AST.
//!
//! Runs programs directly, without lowering them. Pointers are not supported.

use std::{fmt, io, rc::Rc};

use tracing::{debug, instrument, trace};

use crate::{
    ast::{ElifArm, Expr, ExprVisitor, FnDecl, Primitive, Stmt, StmtVisitor, TypeDescriptor},
    codegen::types::{FBinOp, FCmpPred},
    environment::{Environment, ScopeId, Undefined},
    token::{Token, TokenKind},
};

type Result<T, E = Error> = std::result::Result<T, E>;

/// Calls nested deeper than this fail instead of overflowing the host stack.
pub const MAX_CALL_DEPTH: usize = 100;

#[derive(Clone, Debug, PartialEq)]
pub enum Value<'src> {
    Number(f64),
    String(Rc<str>),
    Char(u8),
    Bool(bool),
    Void,
    Function(Rc<FnDecl<'src>>),
    Native(Native),
}

/// Functions provided by the interpreter itself.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Native {
    Printf,
}

impl Value<'_> {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Char(_) => "char",
            Value::Bool(_) => "bool",
            Value::Void => "void",
            Value::Function(_) | Value::Native(_) => "fn",
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => f.write_str(s),
            Value::Char(c) => write!(f, "{}", char::from(*c)),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Void => f.write_str("void"),
            Value::Function(decl) => write!(f, "<fn {}>", decl.name.lexeme),
            Value::Native(Native::Printf) => f.write_str("<native printf>"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Undefined(#[from] Undefined),

    #[error("operator '{op}' cannot be applied to {operand}")]
    InvalidOperand { op: String, operand: &'static str },

    #[error("mismatched types: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("unresolved type '{0}'")]
    UnresolvedType(String),

    #[error("'{0}' is not callable")]
    NotCallable(String),

    #[error("'{callee}' takes {expected} argument(s), but {found} were supplied")]
    Arity {
        callee: String,
        expected: usize,
        found: usize,
    },

    #[error("pointers are not supported by the interpreter")]
    Pointer,

    #[error("call to '{0}' exceeds the maximum depth of {MAX_CALL_DEPTH}")]
    CallDepth(String),

    #[error("'return' outside of a function")]
    ReturnOutsideFunction,

    #[error("printf: {0}")]
    Format(String),

    #[error("failed to write output")]
    Io(#[from] io::Error),
}

/// How a statement finished.
#[derive(Debug, PartialEq)]
pub enum Flow<'src> {
    Normal,
    Return(Value<'src>),
}

/// Executes statements, writing program output to `W`.
pub struct Interpreter<'src, W> {
    env: Environment<Value<'src>>,
    out: W,
    /// Number of active calls.
    calls: usize,
}

impl<'src, W> Interpreter<'src, W>
where
    W: io::Write,
{
    pub fn new(out: W) -> Interpreter<'src, W> {
        let mut env = Environment::new();
        env.bind("printf", Value::Native(Native::Printf));
        Interpreter { env, out, calls: 0 }
    }

    /// Runs every statement in order, stopping at the first error. Bindings
    /// persist across runs.
    #[instrument(level = "debug", skip_all, fields(stmts = stmts.len()))]
    pub fn run(&mut self, stmts: &[Stmt<'src>]) -> Result<()> {
        for stmt in stmts {
            trace!(?stmt, "executing");
            stmt.accept(self)?;
        }
        self.out.flush()?;
        debug!("finished");
        Ok(())
    }

    pub fn evaluate(&mut self, expr: &Expr<'src>) -> Result<Value<'src>> {
        expr.accept(self)
    }

    pub fn into_output(self) -> W {
        self.out
    }
}

impl<'src, W> StmtVisitor<'src> for Interpreter<'src, W>
where
    W: io::Write,
{
    type Output = Result<Flow<'src>>;

    fn visit_block(&mut self, body: &[Stmt<'src>]) -> Self::Output {
        self.env.push();
        let flow = self.execute_all(body);
        self.env.pop();
        flow
    }

    fn visit_var(
        &mut self,
        name: &Token<'src>,
        ty: &TypeDescriptor<'src>,
        initializer: Option<&Expr<'src>>,
    ) -> Self::Output {
        let value = match initializer {
            Some(init) => {
                let value = self.evaluate(init)?;
                if !ty.is_auto() {
                    check_type(ty, &value)?;
                }
                value
            }
            None => default_value(ty)?,
        };
        self.env.bind(name.lexeme, value);
        Ok(Flow::Normal)
    }

    fn visit_fn(&mut self, decl: &FnDecl<'src>) -> Self::Output {
        self.env
            .bind(decl.name.lexeme, Value::Function(Rc::new(decl.clone())));
        Ok(Flow::Normal)
    }

    fn visit_print(&mut self, expr: &Expr<'src>) -> Self::Output {
        let value = self.evaluate(expr)?;
        writeln!(self.out, "{value}")?;
        Ok(Flow::Normal)
    }

    fn visit_expression(&mut self, expr: &Expr<'src>) -> Self::Output {
        self.evaluate(expr)?;
        Ok(Flow::Normal)
    }

    fn visit_return(&mut self, expr: Option<&Expr<'src>>) -> Self::Output {
        if self.calls == 0 {
            return Err(Error::ReturnOutsideFunction);
        }
        let value = match expr {
            Some(expr) => self.evaluate(expr)?,
            None => Value::Void,
        };
        Ok(Flow::Return(value))
    }

    fn visit_if(
        &mut self,
        condition: &Expr<'src>,
        then_block: &Stmt<'src>,
        elifs: &[ElifArm<'src>],
        else_block: Option<&Stmt<'src>>,
    ) -> Self::Output {
        if self.condition(condition)? {
            return then_block.accept(self);
        }
        for arm in elifs {
            if self.condition(&arm.condition)? {
                return arm.block.accept(self);
            }
        }
        match else_block {
            Some(block) => block.accept(self),
            None => Ok(Flow::Normal),
        }
    }
}

impl<'src, W> ExprVisitor<'src> for Interpreter<'src, W>
where
    W: io::Write,
{
    type Output = Result<Value<'src>>;

    fn visit_number(&mut self, value: f64) -> Self::Output {
        Ok(Value::Number(value))
    }

    fn visit_string(&mut self, value: &str) -> Self::Output {
        Ok(Value::String(value.into()))
    }

    fn visit_char(&mut self, value: u8) -> Self::Output {
        Ok(Value::Char(value))
    }

    fn visit_bool(&mut self, value: bool) -> Self::Output {
        Ok(Value::Bool(value))
    }

    fn visit_identifier(&mut self, name: &Token<'src>) -> Self::Output {
        self.env
            .get(name.lexeme)
            .cloned()
            .ok_or_else(|| Undefined(name.lexeme.to_owned()).into())
    }

    fn visit_binary(
        &mut self,
        lhs: &Expr<'src>,
        op: &Token<'src>,
        rhs: &Expr<'src>,
    ) -> Self::Output {
        let lhs = self.evaluate(lhs)?;
        let rhs = self.evaluate(rhs)?;

        if let (Value::Number(l), Value::Number(r)) = (&lhs, &rhs) {
            let (l, r) = (*l, *r);
            let value = match op.kind {
                TokenKind::Plus => Value::Number(FBinOp::Add.fold(l, r)),
                TokenKind::Minus => Value::Number(FBinOp::Sub.fold(l, r)),
                TokenKind::Star => Value::Number(FBinOp::Mul.fold(l, r)),
                TokenKind::Slash => Value::Number(FBinOp::Div.fold(l, r)),
                TokenKind::Less => Value::Bool(FCmpPred::Olt.fold(l, r)),
                TokenKind::LessEq => Value::Bool(FCmpPred::Ole.fold(l, r)),
                TokenKind::Greater => Value::Bool(FCmpPred::Ogt.fold(l, r)),
                TokenKind::GreaterEq => Value::Bool(FCmpPred::Oge.fold(l, r)),
                TokenKind::EqualEqual => Value::Bool(FCmpPred::Ueq.fold(l, r)),
                TokenKind::BangEqual => Value::Bool(FCmpPred::Une.fold(l, r)),
                _ => return Err(invalid_operand(op, &lhs)),
            };
            return Ok(value);
        }

        if lhs.type_name() != rhs.type_name() {
            return Err(Error::TypeMismatch {
                expected: lhs.type_name(),
                found: rhs.type_name(),
            });
        }
        match op.kind {
            TokenKind::EqualEqual => Ok(Value::Bool(lhs == rhs)),
            TokenKind::BangEqual => Ok(Value::Bool(lhs != rhs)),
            _ => Err(invalid_operand(op, &lhs)),
        }
    }

    fn visit_unary(&mut self, op: &Token<'src>, rhs: &Expr<'src>) -> Self::Output {
        if matches!(op.kind, TokenKind::Ampersand | TokenKind::Star) {
            return Err(Error::Pointer);
        }
        match (op.kind, self.evaluate(rhs)?) {
            (TokenKind::Minus, Value::Number(n)) => Ok(Value::Number(-n)),
            (TokenKind::Bang, Value::Bool(b)) => Ok(Value::Bool(!b)),
            (_, value) => Err(invalid_operand(op, &value)),
        }
    }

    fn visit_grouping(&mut self, inner: &Expr<'src>) -> Self::Output {
        self.evaluate(inner)
    }

    fn visit_call(&mut self, callee: &Expr<'src>, args: &[Expr<'src>]) -> Self::Output {
        let callee_value = self.evaluate(callee)?;
        let args = args
            .iter()
            .map(|arg| self.evaluate(arg))
            .collect::<Result<Vec<_>>>()?;
        match callee_value {
            Value::Function(decl) => self.call(&decl, args),
            Value::Native(Native::Printf) => self.printf(&args),
            _ => Err(Error::NotCallable(match callee {
                Expr::Identifier(name) => name.lexeme.to_owned(),
                _ => callee_value.type_name().to_owned(),
            })),
        }
    }
}

impl<'src, W> Interpreter<'src, W>
where
    W: io::Write,
{
    fn execute_all(&mut self, stmts: &[Stmt<'src>]) -> Result<Flow<'src>> {
        for stmt in stmts {
            if let Flow::Return(value) = stmt.accept(self)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn condition(&mut self, condition: &Expr<'src>) -> Result<bool> {
        match self.evaluate(condition)? {
            Value::Bool(b) => Ok(b),
            other => Err(Error::TypeMismatch {
                expected: "bool",
                found: other.type_name(),
            }),
        }
    }

    /// Functions run in a scope under the global one, so they never see
    /// their caller's locals.
    fn call(&mut self, decl: &FnDecl<'src>, args: Vec<Value<'src>>) -> Result<Value<'src>> {
        if args.len() != decl.params.len() {
            return Err(Error::Arity {
                callee: decl.name.lexeme.to_owned(),
                expected: decl.params.len(),
                found: args.len(),
            });
        }
        if self.calls >= MAX_CALL_DEPTH {
            return Err(Error::CallDepth(decl.name.lexeme.to_owned()));
        }
        trace!(name = decl.name.lexeme, depth = self.calls, "call");

        self.env.push_child_of(ScopeId::ROOT);
        self.calls += 1;
        let flow = self
            .bind_params(decl, args)
            .and_then(|()| decl.body.accept(self));
        self.calls -= 1;
        self.env.pop();

        Ok(match flow? {
            Flow::Return(value) => value,
            Flow::Normal => Value::Void,
        })
    }

    fn bind_params(&mut self, decl: &FnDecl<'src>, args: Vec<Value<'src>>) -> Result<()> {
        for (param, arg) in decl.params.iter().zip(args) {
            check_type(&param.ty, &arg)?;
            self.env.bind(param.name.lexeme, arg);
        }
        Ok(())
    }

    /// Supports `%f %s %c %d %%`.
    fn printf(&mut self, args: &[Value<'src>]) -> Result<Value<'src>> {
        let Some((Value::String(format), rest)) = args.split_first() else {
            return Err(Error::Format("expected a format string".to_owned()));
        };
        let mut rest = rest.iter();
        let mut output = String::new();
        let mut chars = format.chars();

        while let Some(ch) = chars.next() {
            if ch != '%' {
                output.push(ch);
                continue;
            }
            let Some(spec) = chars.next() else {
                return Err(Error::Format("dangling '%'".to_owned()));
            };
            if spec == '%' {
                output.push('%');
                continue;
            }
            let arg = rest
                .next()
                .ok_or_else(|| Error::Format(format!("missing argument for '%{spec}'")))?;
            match (spec, arg) {
                ('f', Value::Number(n)) => output.push_str(&format!("{n:.6}")),
                ('s', Value::String(s)) => output.push_str(s),
                ('c', Value::Char(c)) => output.push(char::from(*c)),
                ('d', Value::Bool(b)) => output.push_str(if *b { "1" } else { "0" }),
                #[allow(clippy::cast_possible_truncation)]
                ('d', Value::Number(n)) => output.push_str(&(n.trunc() as i64).to_string()),
                ('f' | 's' | 'c' | 'd', arg) => {
                    return Err(Error::Format(format!(
                        "'%{spec}' cannot format a {}",
                        arg.type_name()
                    )))
                }
                _ => return Err(Error::Format(format!("unsupported conversion '%{spec}'"))),
            }
        }

        self.out.write_all(output.as_bytes())?;
        #[allow(clippy::cast_precision_loss)]
        let written = output.len() as f64;
        Ok(Value::Number(written))
    }
}

fn invalid_operand(op: &Token<'_>, value: &Value<'_>) -> Error {
    Error::InvalidOperand {
        op: op.lexeme.to_owned(),
        operand: value.type_name(),
    }
}

fn primitive(ty: &TypeDescriptor<'_>) -> Result<Primitive> {
    if ty.is_pointer {
        return Err(Error::Pointer);
    }
    ty.primitive()
        .ok_or_else(|| Error::UnresolvedType(ty.name.lexeme.to_owned()))
}

fn check_type(ty: &TypeDescriptor<'_>, value: &Value<'_>) -> Result<()> {
    let expected = match primitive(ty)? {
        Primitive::Number => "number",
        Primitive::String => "string",
        Primitive::Bool => "bool",
        Primitive::Char => "char",
        Primitive::Void => "void",
    };
    if expected == value.type_name() {
        Ok(())
    } else {
        Err(Error::TypeMismatch {
            expected,
            found: value.type_name(),
        })
    }
}

fn default_value<'src>(ty: &TypeDescriptor<'_>) -> Result<Value<'src>> {
    Ok(match primitive(ty)? {
        Primitive::Number => Value::Number(0.0),
        Primitive::String => Value::String("".into()),
        Primitive::Bool => Value::Bool(false),
        Primitive::Char => Value::Char(0),
        Primitive::Void => Value::Void,
    })
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{ast::test_utils::ident, parser::test_utils::parse_program};

    fn run(src: &'static str) -> Result<String> {
        let stmts = parse_program(src);
        let mut interpreter = Interpreter::new(Vec::new());
        interpreter.run(&stmts)?;
        Ok(String::from_utf8(interpreter.into_output()).unwrap())
    }

    #[test]
    fn test_printf_formats() {
        let output = run(indoc! {r#"
            let name = "kel";
            printf("%s %f %d%%\n", name, 1.5, 7.9);
            printf("%c%d\n", 'x', 1 < 2);
        "#})
        .unwrap();
        assert_eq!(output, "kel 1.500000 7%\nx1\n");
    }

    #[test]
    fn test_functions_and_recursion() {
        let output = run(indoc! {r#"
            fn fib(n number) number {
                if n < 2 {
                    return n;
                }
                return fib(n - 1) + fib(n - 2);
            }
            printf("%d\n", fib(10));
        "#})
        .unwrap();
        assert_eq!(output, "55\n");
    }

    #[test]
    fn test_elif_chain_picks_first_match() {
        let output = run(indoc! {r#"
            fn classify(n number) string {
                if n < 0 {
                    return "negative";
                } else if n == 0 {
                    return "zero";
                } else if n < 10 {
                    return "small";
                } else {
                    return "large";
                }
            }
            printf("%s %s %s %s\n", classify(-1), classify(0), classify(3), classify(99));
        "#})
        .unwrap();
        assert_eq!(output, "negative zero small large\n");
    }

    #[test]
    fn test_block_scoping() {
        let output = run(indoc! {r#"
            let x = 1;
            {
                let x = 2;
                printf("%d ", x);
            }
            printf("%d\n", x);
        "#})
        .unwrap();
        assert_eq!(output, "2 1\n");
    }

    #[test]
    fn test_functions_do_not_see_caller_locals() {
        let err = run(indoc! {"
            fn peek() number { return secret; }
            fn main() { let secret = 1; peek(); }
            main();
        "})
        .unwrap_err();
        assert!(matches!(err, Error::Undefined(Undefined(name)) if name == "secret"));
    }

    #[test]
    fn test_print_statement() {
        let stmts = [
            Stmt::Var {
                name: Token::new(TokenKind::Identifier, "n", 1),
                ty: TypeDescriptor::auto(1),
                initializer: Some(Expr::Number(2.5)),
            },
            Stmt::Print(ident("n")),
            Stmt::Print(Expr::String("done".into())),
        ];
        let mut interpreter = Interpreter::new(Vec::new());
        interpreter.run(&stmts).unwrap();
        assert_eq!(interpreter.into_output(), b"2.5\ndone\n");
    }

    #[test]
    fn test_defaults_and_nan() {
        let mut interpreter = Interpreter::new(io::sink());
        interpreter.run(&parse_program("let n number; let b bool;")).unwrap();
        assert_eq!(interpreter.evaluate(&ident("n")).unwrap(), Value::Number(0.0));
        assert_eq!(interpreter.evaluate(&ident("b")).unwrap(), Value::Bool(false));

        let stmts = parse_program("let nan = 0 / 0; let eq = nan == nan; let lt = nan < 1;");
        interpreter.run(&stmts).unwrap();
        assert_eq!(interpreter.evaluate(&ident("eq")).unwrap(), Value::Bool(true));
        assert_eq!(interpreter.evaluate(&ident("lt")).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_runtime_errors() {
        let cases: &[(&str, &str)] = &[
            ("let x = y;", "undefined name 'y'"),
            ("let x = 1; let p = &x;", "pointers are not supported by the interpreter"),
            ("return 1;", "'return' outside of a function"),
            ("let x = 1; x();", "'x' is not callable"),
            ("fn f(a number) {} f();", "'f' takes 1 argument(s), but 0 were supplied"),
            ("let s string = 1;", "mismatched types: expected string, found number"),
            ("let b = -true;", "operator '-' cannot be applied to bool"),
            ("if 1 { }", "mismatched types: expected bool, found number"),
            (r#"printf("%d");"#, "printf: missing argument for '%d'"),
            (r#"printf("%s", 1);"#, "printf: '%s' cannot format a number"),
            (r#"printf("%x", 1);"#, "printf: unsupported conversion '%x'"),
            (
                "fn forever() { forever(); } forever();",
                "call to 'forever' exceeds the maximum depth of 100",
            ),
        ];
        for (src, expected) in cases {
            let err = run(*src).unwrap_err();
            assert_eq!(err.to_string(), *expected, "source: {src}");
        }
    }

    #[test]
    fn test_call_depth_recovers() {
        let stmts = parse_program(indoc! {"
            fn down(n number) number {
                if n == 0 {
                    return 0;
                }
                return down(n - 1);
            }
        "});
        let mut interpreter = Interpreter::new(Vec::new());
        interpreter.run(&stmts).unwrap();

        let deep = parse_program("let r = down(500);");
        assert!(matches!(
            interpreter.run(&deep),
            Err(Error::CallDepth(name)) if name == "down"
        ));
        // The failed call unwound every frame.
        let shallow = parse_program("let r = down(10);");
        interpreter.run(&shallow).unwrap();
        assert_eq!(interpreter.evaluate(&ident("r")).unwrap(), Value::Number(0.0));
    }
}
