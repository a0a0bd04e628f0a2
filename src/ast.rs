// program    ::= declaration* EOF
// declaration ::= 'let' IDENT ['*'] [type] ['=' expr] ';'
//              | 'fn' IDENT '(' [param (',' param)*] ')' ['*'] [type] block
//              | statement
// param      ::= IDENT ['*'] type
// statement  ::= 'if' expr block ('else' 'if' expr block)* ['else' block]
//              | 'return' [expr] ';'
//              | block
//              | expr ';'
// block      ::= '{' declaration* '}'
// expr       ::= expr ('+' | '-' | '*' | '/') expr
//              | expr ('<' | '<=' | '>' | '>=' | '==' | '!=') expr
//              | ('-' | '*' | '&' | '!') expr
//              | expr '(' [expr (',' expr)*] ')'
//              | '(' expr ')'
//              | IDENT | NUMBER | STRING | CHAR | 'true' | 'false'

// Precedence
//
// ()
// - * & ! (prefix)
// * /
// + -
// < <= > >=
// == !=

use std::borrow::Cow;

use crate::token::{Token, TokenKind, AUTO, VOID};

#[derive(Clone, Debug, PartialEq)]
pub enum Expr<'src> {
    Number(f64),
    String(Cow<'src, str>),
    Char(u8),
    Bool(bool),
    Identifier(Token<'src>),
    Binary {
        lhs: Box<Expr<'src>>,
        op: Token<'src>,
        rhs: Box<Expr<'src>>,
    },
    Unary {
        op: Token<'src>,
        rhs: Box<Expr<'src>>,
    },
    Grouping(Box<Expr<'src>>),
    Call {
        callee: Box<Expr<'src>>,
        args: Vec<Expr<'src>>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt<'src> {
    Block(Vec<Stmt<'src>>),
    Var {
        name: Token<'src>,
        ty: TypeDescriptor<'src>,
        initializer: Option<Expr<'src>>,
    },
    Fn(FnDecl<'src>),
    Print(Expr<'src>),
    Expression(Expr<'src>),
    Return(Option<Expr<'src>>),
    If {
        condition: Expr<'src>,
        then_block: Box<Stmt<'src>>,
        elifs: Vec<ElifArm<'src>>,
        else_block: Option<Box<Stmt<'src>>>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct FnDecl<'src> {
    pub name: Token<'src>,
    pub params: Vec<Param<'src>>,
    /// Always a [`Stmt::Block`] when produced by the parser.
    pub body: Box<Stmt<'src>>,
    pub return_ty: TypeDescriptor<'src>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ElifArm<'src> {
    pub condition: Expr<'src>,
    pub block: Stmt<'src>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Param<'src> {
    pub name: Token<'src>,
    pub ty: TypeDescriptor<'src>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypeDescriptor<'src> {
    /// A primitive type keyword, a user type name, or one of the synthesized
    /// `auto` and `void` placeholders.
    pub name: Token<'src>,
    pub is_pointer: bool,
}

impl<'src> TypeDescriptor<'src> {
    pub fn new(name: Token<'src>, is_pointer: bool) -> TypeDescriptor<'src> {
        TypeDescriptor { name, is_pointer }
    }

    /// The "infer from initializer" placeholder.
    pub fn auto(line: u32) -> TypeDescriptor<'src> {
        Self::new(Token::new(TokenKind::Type, AUTO, line), false)
    }

    pub fn void(line: u32) -> TypeDescriptor<'src> {
        Self::new(Token::new(TokenKind::Type, VOID, line), false)
    }

    pub fn is_auto(&self) -> bool {
        self.name.lexeme == AUTO
    }

    pub fn primitive(&self) -> Option<Primitive> {
        Primitive::from_name(self.name.lexeme)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Primitive {
    Number,
    String,
    Bool,
    Char,
    Void,
}

impl Primitive {
    pub fn from_name(name: &str) -> Option<Primitive> {
        let primitive = match name {
            "number" => Primitive::Number,
            "string" => Primitive::String,
            "bool" => Primitive::Bool,
            "char" => Primitive::Char,
            VOID => Primitive::Void,
            _ => return None,
        };
        Some(primitive)
    }
}

/// Handles every variant of [`Expr`].
pub trait ExprVisitor<'src> {
    type Output;

    fn visit_number(&mut self, value: f64) -> Self::Output;
    fn visit_string(&mut self, value: &str) -> Self::Output;
    fn visit_char(&mut self, value: u8) -> Self::Output;
    fn visit_bool(&mut self, value: bool) -> Self::Output;
    fn visit_identifier(&mut self, name: &Token<'src>) -> Self::Output;
    fn visit_binary(
        &mut self,
        lhs: &Expr<'src>,
        op: &Token<'src>,
        rhs: &Expr<'src>,
    ) -> Self::Output;
    fn visit_unary(&mut self, op: &Token<'src>, rhs: &Expr<'src>) -> Self::Output;
    fn visit_grouping(&mut self, inner: &Expr<'src>) -> Self::Output;
    fn visit_call(&mut self, callee: &Expr<'src>, args: &[Expr<'src>]) -> Self::Output;
}

/// Handles every variant of [`Stmt`].
pub trait StmtVisitor<'src> {
    type Output;

    fn visit_block(&mut self, body: &[Stmt<'src>]) -> Self::Output;
    fn visit_var(
        &mut self,
        name: &Token<'src>,
        ty: &TypeDescriptor<'src>,
        initializer: Option<&Expr<'src>>,
    ) -> Self::Output;
    fn visit_fn(&mut self, decl: &FnDecl<'src>) -> Self::Output;
    fn visit_print(&mut self, expr: &Expr<'src>) -> Self::Output;
    fn visit_expression(&mut self, expr: &Expr<'src>) -> Self::Output;
    fn visit_return(&mut self, expr: Option<&Expr<'src>>) -> Self::Output;
    fn visit_if(
        &mut self,
        condition: &Expr<'src>,
        then_block: &Stmt<'src>,
        elifs: &[ElifArm<'src>],
        else_block: Option<&Stmt<'src>>,
    ) -> Self::Output;
}

impl<'src> Expr<'src> {
    pub fn accept<V: ExprVisitor<'src>>(&self, visitor: &mut V) -> V::Output {
        match self {
            Expr::Number(value) => visitor.visit_number(*value),
            Expr::String(value) => visitor.visit_string(value),
            Expr::Char(value) => visitor.visit_char(*value),
            Expr::Bool(value) => visitor.visit_bool(*value),
            Expr::Identifier(name) => visitor.visit_identifier(name),
            Expr::Binary { lhs, op, rhs } => visitor.visit_binary(lhs, op, rhs),
            Expr::Unary { op, rhs } => visitor.visit_unary(op, rhs),
            Expr::Grouping(inner) => visitor.visit_grouping(inner),
            Expr::Call { callee, args } => visitor.visit_call(callee, args),
        }
    }

    pub fn binary(lhs: Expr<'src>, op: Token<'src>, rhs: Expr<'src>) -> Expr<'src> {
        Expr::Binary {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        }
    }

    pub fn unary(op: Token<'src>, rhs: Expr<'src>) -> Expr<'src> {
        Expr::Unary {
            op,
            rhs: Box::new(rhs),
        }
    }
}

impl<'src> Stmt<'src> {
    pub fn accept<V: StmtVisitor<'src>>(&self, visitor: &mut V) -> V::Output {
        match self {
            Stmt::Block(body) => visitor.visit_block(body),
            Stmt::Var {
                name,
                ty,
                initializer,
            } => visitor.visit_var(name, ty, initializer.as_ref()),
            Stmt::Fn(decl) => visitor.visit_fn(decl),
            Stmt::Print(expr) => visitor.visit_print(expr),
            Stmt::Expression(expr) => visitor.visit_expression(expr),
            Stmt::Return(expr) => visitor.visit_return(expr.as_ref()),
            Stmt::If {
                condition,
                then_block,
                elifs,
                else_block,
            } => visitor.visit_if(condition, then_block, elifs, else_block.as_deref()),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;

    pub fn ident(name: &str) -> Expr<'_> {
        Expr::Identifier(Token::new(TokenKind::Identifier, name, 1))
    }

    pub fn op(kind: TokenKind, lexeme: &str) -> Token<'_> {
        Token::new(kind, lexeme, 1)
    }
}
