use tracing::{debug, instrument, trace};

use crate::{
    ast::{ElifArm, Expr, FnDecl, Param, Stmt, TypeDescriptor},
    token::{Literal, Positioned, Token, TokenKind},
};

type Result<T, E = ()> = std::result::Result<T, E>;

/// The result of parsing one translation unit.
#[derive(Debug, Default)]
pub struct Parsed<'src> {
    /// Every top-level declaration that parsed successfully, in order.
    pub stmts: Vec<Stmt<'src>>,
    pub errors: Vec<Positioned<Error>>,
    pub had_error: bool,
}

/// Parses a sequence of top-level declarations. Parsing never stops early: a
/// malformed declaration is reported and skipped.
#[instrument(level = "debug", skip_all, fields(tokens = tokens.len()))]
pub fn parse<'src>(tokens: &[Token<'src>]) -> Parsed<'src> {
    let mut p = Parser::new(tokens);
    let stmts = p.parse_program();
    debug!(stmts = stmts.len(), errors = p.errors.len(), "parsed");
    Parsed {
        stmts,
        had_error: !p.errors.is_empty(),
        errors: p.errors,
    }
}

/// Parses a single expression which must span the whole token sequence.
pub fn parse_expr<'src>(tokens: &[Token<'src>]) -> Result<Expr<'src>, Vec<Positioned<Error>>> {
    let mut p = Parser::new(tokens);
    let expr = p.parse_expression().and_then(|expr| {
        p.consume(TokenKind::Eof)?;
        Ok(expr)
    });
    match expr {
        Ok(expr) if p.errors.is_empty() => Ok(expr),
        _ => Err(p.errors),
    }
}

/// Binding strength of an infix operator, weakest first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    None,
    Assignment,
    Or,
    And,
    Equality,
    Comparison,
    Term,
    Factor,
    Unary,
    Call,
    Primary,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Prefix {
    Grouping,
    Unary,
    Literal,
    Variable,
    Boolean,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Infix {
    Binary,
    Call,
}

/// One row of the Pratt dispatch table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ParseRule {
    pub prefix: Option<Prefix>,
    pub infix: Option<Infix>,
    pub precedence: Precedence,
}

impl ParseRule {
    const fn new(prefix: Option<Prefix>, infix: Option<Infix>, precedence: Precedence) -> Self {
        ParseRule {
            prefix,
            infix,
            precedence,
        }
    }

    pub const fn of(kind: TokenKind) -> ParseRule {
        use Precedence as P;
        use TokenKind::*;
        match kind {
            LParen => Self::new(Some(Prefix::Grouping), Some(Infix::Call), P::Call),
            Minus => Self::new(Some(Prefix::Unary), Some(Infix::Binary), P::Term),
            Plus => Self::new(None, Some(Infix::Binary), P::Term),
            Star => Self::new(Some(Prefix::Unary), Some(Infix::Binary), P::Factor),
            Slash => Self::new(None, Some(Infix::Binary), P::Factor),
            Bang | Ampersand => Self::new(Some(Prefix::Unary), None, P::None),
            EqualEqual | BangEqual => Self::new(None, Some(Infix::Binary), P::Equality),
            Less | Greater | LessEq | GreaterEq => {
                Self::new(None, Some(Infix::Binary), P::Comparison)
            }
            Number | String | Char => Self::new(Some(Prefix::Literal), None, P::None),
            Identifier => Self::new(Some(Prefix::Variable), None, P::None),
            True | False => Self::new(Some(Prefix::Boolean), None, P::None),
            _ => Self::new(None, None, P::None),
        }
    }
}

struct Parser<'src, 'tok> {
    tokens: &'tok [Token<'src>],
    /// Returned by `peek` when the sequence lacks a trailing end marker.
    eof: Token<'src>,
    cursor: usize,
    errors: Vec<Positioned<Error>>,
}

impl<'src> Parser<'src, '_> {
    fn parse_program(&mut self) -> Vec<Stmt<'src>> {
        let mut stmts = Vec::new();
        while self.except([]) {
            let start = self.cursor;
            match self.parse_declaration() {
                Ok(stmt) => {
                    trace!(?stmt, "declaration");
                    stmts.push(stmt);
                }
                Err(()) => self.synchronize(start),
            }
        }
        stmts
    }

    fn parse_declaration(&mut self) -> Result<Stmt<'src>> {
        if self.take(TokenKind::Let) {
            self.parse_var()
        } else if self.take(TokenKind::Fn) {
            self.parse_fn().map(Stmt::Fn)
        } else {
            self.parse_statement()
        }
    }

    fn parse_statement(&mut self) -> Result<Stmt<'src>> {
        match self.peek().kind {
            TokenKind::If => {
                self.advance();
                self.parse_if()
            }
            TokenKind::Return => {
                self.advance();
                if self.take(TokenKind::Semicolon) {
                    return Ok(Stmt::Return(None));
                }
                let expr = self.parse_expression()?;
                self.consume(TokenKind::Semicolon)?;
                Ok(Stmt::Return(Some(expr)))
            }
            TokenKind::LBrace => {
                self.advance();
                self.parse_block()
            }
            _ => {
                let expr = self.parse_expression()?;
                self.consume(TokenKind::Semicolon)?;
                Ok(Stmt::Expression(expr))
            }
        }
    }

    /// `let` was already consumed.
    fn parse_var(&mut self) -> Result<Stmt<'src>> {
        let name = self.consume(TokenKind::Identifier)?;
        let ty = self.parse_optional_type(name.line)?;

        let initializer = if self.take(TokenKind::Assign) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        if ty.is_auto() && initializer.is_none() {
            self.error(Error::CannotInfer);
            return Err(());
        }
        self.consume(TokenKind::Semicolon)?;

        Ok(Stmt::Var {
            name,
            ty,
            initializer,
        })
    }

    /// `fn` was already consumed.
    fn parse_fn(&mut self) -> Result<FnDecl<'src>> {
        let name = self.consume(TokenKind::Identifier)?;
        self.consume(TokenKind::LParen)?;
        let params = self.parse_list(TokenKind::RParen, TokenKind::Comma, |p| {
            let name = p.consume(TokenKind::Identifier)?;
            let is_pointer = p.take(TokenKind::Star);
            let ty = p.parse_type_name(is_pointer)?;
            Ok(Param { name, ty })
        })?;
        let rparen = self.consume(TokenKind::RParen)?;

        let return_ty = match self.parse_optional_type(rparen.line)? {
            ty if ty.is_auto() => TypeDescriptor::void(rparen.line),
            ty => ty,
        };

        self.consume(TokenKind::LBrace)?;
        let body = self.parse_block()?;

        Ok(FnDecl {
            name,
            params,
            body: Box::new(body),
            return_ty,
        })
    }

    /// `if` was already consumed.
    fn parse_if(&mut self) -> Result<Stmt<'src>> {
        let condition = self.parse_expression()?;
        self.consume(TokenKind::LBrace)?;
        let then_block = self.parse_block()?;

        let mut elifs = Vec::new();
        let mut else_block = None;
        while self.take(TokenKind::Else) {
            if self.take(TokenKind::If) {
                let condition = self.parse_expression()?;
                self.consume(TokenKind::LBrace)?;
                let block = self.parse_block()?;
                elifs.push(ElifArm { condition, block });
            } else {
                self.consume(TokenKind::LBrace)?;
                else_block = Some(Box::new(self.parse_block()?));
                break;
            }
        }

        Ok(Stmt::If {
            condition,
            then_block: Box::new(then_block),
            elifs,
            else_block,
        })
    }

    /// Parses declarations up to and including the closing brace. The opening
    /// brace was already consumed.
    fn parse_block(&mut self) -> Result<Stmt<'src>> {
        let mut body = Vec::new();
        while self.except([TokenKind::RBrace]) {
            body.push(self.parse_declaration()?);
        }
        self.consume(TokenKind::RBrace)?;
        Ok(Stmt::Block(body))
    }

    /// Parses `[*] [type]`. Without a type name the descriptor is `auto`.
    fn parse_optional_type(&mut self, line: u32) -> Result<TypeDescriptor<'src>> {
        let is_pointer = self.take(TokenKind::Star);
        if self.is(TokenKind::Type) || self.is(TokenKind::Identifier) {
            return self.parse_type_name(is_pointer);
        }
        if is_pointer {
            self.error(Error::PointerWithoutType);
            return Err(());
        }
        Ok(TypeDescriptor::auto(line))
    }

    /// Parses a primitive type keyword or a user type name.
    fn parse_type_name(&mut self, is_pointer: bool) -> Result<TypeDescriptor<'src>> {
        let mut name = self.consume_any(&[TokenKind::Type, TokenKind::Identifier])?;
        name.kind = TokenKind::Type;
        Ok(TypeDescriptor::new(name, is_pointer))
    }

    fn parse_expression(&mut self) -> Result<Expr<'src>> {
        self.parse_precedence(Precedence::None)
    }

    /// Parses an expression whose infix operators all bind tighter than
    /// `min`.
    fn parse_precedence(&mut self, min: Precedence) -> Result<Expr<'src>> {
        let token = self.advance();
        let Some(prefix) = ParseRule::of(token.kind).prefix else {
            self.error(Error::NoPrefixRule(token.lexeme.to_owned()));
            return Err(());
        };
        let mut lhs = self.parse_prefix(prefix, token)?;

        loop {
            let rule = ParseRule::of(self.peek().kind);
            let Some(infix) = rule.infix else {
                break;
            };
            if rule.precedence <= min {
                break;
            }
            let op = self.advance();
            lhs = self.parse_infix(infix, op, lhs, rule.precedence)?;
        }

        Ok(lhs)
    }

    fn parse_prefix(&mut self, prefix: Prefix, token: Token<'src>) -> Result<Expr<'src>> {
        let expr = match prefix {
            Prefix::Grouping => {
                let inner = self.parse_expression()?;
                self.consume(TokenKind::RParen)?;
                Expr::Grouping(Box::new(inner))
            }
            Prefix::Unary => {
                let rhs = self.parse_precedence(Precedence::Unary)?;
                Expr::unary(token, rhs)
            }
            Prefix::Literal => match token.literal {
                Some(Literal::Number(value)) => Expr::Number(value),
                Some(Literal::String(value)) => Expr::String(value),
                Some(Literal::Char(value)) => Expr::Char(value),
                None => {
                    self.error(Error::MalformedLiteral(token.kind));
                    return Err(());
                }
            },
            Prefix::Variable => Expr::Identifier(token),
            Prefix::Boolean => Expr::Bool(token.kind == TokenKind::True),
        };
        Ok(expr)
    }

    fn parse_infix(
        &mut self,
        infix: Infix,
        op: Token<'src>,
        lhs: Expr<'src>,
        precedence: Precedence,
    ) -> Result<Expr<'src>> {
        match infix {
            // Recursing at the operator's own precedence makes it left
            // associative.
            Infix::Binary => {
                let rhs = self.parse_precedence(precedence)?;
                Ok(Expr::binary(lhs, op, rhs))
            }
            Infix::Call => {
                let args = self.parse_list(TokenKind::RParen, TokenKind::Comma, |p| {
                    p.parse_expression()
                })?;
                self.consume(TokenKind::RParen)?;
                Ok(Expr::Call {
                    callee: Box::new(lhs),
                    args,
                })
            }
        }
    }

    /// Parses `item (separator item)*` until `end_delim` is found. Does **NOT**
    /// consume the end delimiter.
    fn parse_list<T>(
        &mut self,
        end_delim: TokenKind,
        separator: TokenKind,
        mut parse_item: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        debug_assert_ne!(end_delim, separator);

        let mut items = Vec::new();
        while self.except([end_delim]) {
            items.push(parse_item(self)?);
            if !self.take(separator) {
                if self.is(end_delim) {
                    break;
                }
                let actual = self.peek().kind;
                self.error(Error::UnexpectedAny {
                    actual,
                    expected: Box::from([separator, end_delim]),
                });
                return Err(());
            }
        }
        Ok(items)
    }

    /// Skips tokens after a failed declaration. Braces the declaration opened
    /// are skipped up to their matching close, then recovery stops just past a
    /// `;` or right before a token that starts a statement. Always makes
    /// progress.
    fn synchronize(&mut self, start: usize) {
        if self.cursor == start {
            self.advance();
        }
        let consumed = self.tokens.get(start..self.cursor).unwrap_or_default();
        let mut depth = consumed.iter().fold(0_usize, |depth, token| match token.kind {
            TokenKind::LBrace => depth + 1,
            TokenKind::RBrace => depth.saturating_sub(1),
            _ => depth,
        });
        loop {
            let c = self.peek().kind;
            if c == TokenKind::Eof {
                break;
            }
            if depth == 0
                && (self.previous().is_some_and(|t| t.kind == TokenKind::Semicolon)
                    || c.starts_statement())
            {
                break;
            }
            self.advance();
            match c {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace if depth > 0 => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
        trace!(skipped = self.cursor - start, "synchronized");
    }
}

impl<'src, 'tok> Parser<'src, 'tok> {
    fn new(tokens: &'tok [Token<'src>]) -> Parser<'src, 'tok> {
        let line = tokens.last().map_or(1, |t| t.line);
        Parser {
            tokens,
            eof: Token::new(TokenKind::Eof, "", line),
            cursor: 0,
            errors: Vec::with_capacity(8),
        }
    }

    /// Records an error at the line of the last consumed token.
    fn error(&mut self, error: Error) {
        let line = self.previous().unwrap_or_else(|| self.peek()).line;
        self.errors.push(Positioned::new(line, error));
    }

    /// Returns the current token.
    fn peek(&self) -> &Token<'src> {
        self.tokens.get(self.cursor).unwrap_or(&self.eof)
    }

    fn previous(&self) -> Option<&Token<'src>> {
        let index = self.cursor.checked_sub(1)?;
        self.tokens.get(index)
    }

    /// Returns the current token and advances. Never moves past the end.
    fn advance(&mut self) -> Token<'src> {
        let c = self.peek().clone();
        if !c.is_eof() {
            self.cursor += 1;
        }
        c
    }

    /// Checks whether the current token matches the given one.
    fn is(&self, expect: TokenKind) -> bool {
        self.peek().kind == expect
    }

    /// Advances if the current token matches the provided one, returning true.
    /// If not, returns false and doesn't advance.
    fn take(&mut self, expect: TokenKind) -> bool {
        if self.is(expect) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Advances if the current token matches the provided one. If not,
    /// records an error.
    fn consume(&mut self, expect: TokenKind) -> Result<Token<'src>> {
        if self.is(expect) {
            Ok(self.advance())
        } else {
            let actual = self.peek().kind;
            self.error(Error::Unexpected {
                actual,
                expected: expect,
            });
            Err(())
        }
    }

    /// Advances if the current token matches any of the provided tokens. If
    /// not, records an error.
    fn consume_any(&mut self, expect: &'static [TokenKind]) -> Result<Token<'src>> {
        if expect.iter().any(|t| self.is(*t)) {
            return Ok(self.advance());
        }
        let actual = self.peek().kind;
        self.error(Error::UnexpectedAny {
            actual,
            expected: Box::from(expect),
        });
        Err(())
    }

    /// Returns true while the current token does *not* match one of the
    /// provided ones. [`TokenKind::Eof`] is implicitly included in the list.
    ///
    /// This won't advance the cursor.
    fn except(&self, except: impl IntoIterator<Item = TokenKind>) -> bool {
        let c = self.peek().kind;
        c != TokenKind::Eof && except.into_iter().all(|e| c != e)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("expected {expected}, but got {actual}")]
    Unexpected {
        actual: TokenKind,
        expected: TokenKind,
    },
    #[error("expected one of {}, but got {actual}", display_kinds(expected))]
    UnexpectedAny {
        actual: TokenKind,
        expected: Box<[TokenKind]>,
    },
    #[error("no prefix parse rule for '{0}'")]
    NoPrefixRule(String),
    #[error("need to supply type with '*'")]
    PointerWithoutType,
    #[error("cannot infer type without initializer")]
    CannotInfer,
    #[error("{0} token without a literal value")]
    MalformedLiteral(TokenKind),
}

fn display_kinds(kinds: &[TokenKind]) -> String {
    let names: Vec<_> = kinds.iter().map(ToString::to_string).collect();
    names.join(", ")
}

#[cfg(test)]
pub(crate) mod test_utils {
    use crate::{ast::Stmt, lexer};

    /// Lexes and parses, panicking on any diagnostic. The source is leaked so
    /// the tree can borrow from it.
    pub fn parse_program(src: &str) -> Vec<Stmt<'static>> {
        let src: &'static str = Box::leak(src.to_owned().into_boxed_str());
        let lexed = lexer::lex(src);
        assert!(!lexed.had_error, "lexer errors: {:?}", lexed.errors);
        let parsed = super::parse(&lexed.tokens);
        assert!(!parsed.had_error, "parser errors: {:?}", parsed.errors);
        parsed.stmts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lexer, util::test_utils::tree_tests};

    tree_tests!(
        use parser;

        fn test_simple_expression() {
            let expr = "(1 * 2 + 3) - (1 + 2 * 3)";
            let tree_ok = "
                binary -
                  paren
                    binary +
                      binary *
                        number 1
                        number 2
                      number 3
                  paren
                    binary +
                      number 1
                      binary *
                        number 2
                        number 3
            ";
        }

        fn test_literals() {
            let expr = r#"f(1.5, "a\tb", 'c', true, false, x)"#;
            let tree_ok = r#"
                call
                  ident f
                  number 1.5
                  string "a\tb"
                  char 'c'
                  bool true
                  bool false
                  ident x
            "#;
        }

        fn test_multiplication_binds_tighter_on_the_right() {
            let expr = "1 + 2 * 3";
            let tree_ok = "
                binary +
                  number 1
                  binary *
                    number 2
                    number 3
            ";
        }

        fn test_multiplication_binds_tighter_on_the_left() {
            let expr = "1 * 2 + 3";
            let tree_ok = "
                binary +
                  binary *
                    number 1
                    number 2
                  number 3
            ";
        }

        fn test_subtraction_is_left_associative() {
            let expr = "1 - 2 - 3";
            let tree_ok = "
                binary -
                  binary -
                    number 1
                    number 2
                  number 3
            ";
        }

        fn test_division_is_left_associative() {
            let expr = "8 / 4 / 2";
            let tree_ok = "
                binary /
                  binary /
                    number 8
                    number 4
                  number 2
            ";
        }

        fn test_comparison_binds_tighter_than_equality() {
            let expr = "a == b < c";
            let tree_ok = "
                binary ==
                  ident a
                  binary <
                    ident b
                    ident c
            ";
        }

        fn test_term_binds_tighter_than_comparison() {
            let expr = "a + 1 >= b - 2";
            let tree_ok = "
                binary >=
                  binary +
                    ident a
                    number 1
                  binary -
                    ident b
                    number 2
            ";
        }

        fn test_unary_operators() {
            let expr = "-a * *p + !b";
            let tree_ok = "
                binary +
                  binary *
                    unary -
                      ident a
                    unary *
                      ident p
                  unary !
                    ident b
            ";
        }

        fn test_address_of_and_call_precedence() {
            let expr = "-f(&x)(y)";
            let tree_ok = "
                unary -
                  call
                    call
                      ident f
                      unary &
                        ident x
                    ident y
            ";
        }

        fn test_call_without_arguments() {
            let expr = "main()";
            let tree_ok = "
                call
                  ident main
            ";
        }

        fn test_error_no_prefix_rule() {
            let expr = "1 + ;";
            let expected_errors = &["error: near line [1]. cause: no prefix parse rule for ';'"];
        }

        fn test_error_unmatched_paren() {
            let expr = "(1 + 2";
            let expected_errors = &["error: near line [1]. cause: expected right_paren, but got eof"];
        }

        fn test_error_call_arguments_need_commas() {
            let expr = "f(1 2)";
            let expected_errors = &[
                "error: near line [1]. cause: expected one of comma, right_paren, but got number",
            ];
        }

        fn test_error_trailing_tokens() {
            let expr = "1 2";
            let expected_errors = &["error: near line [1]. cause: expected eof, but got number"];
        }

        fn test_var_declarations() {
            let program = "
                let a = 1;
                let b number = 2;
                let c *number = &b;
                let d string;
                let e Point;
            ";
            let tree_ok = "
                let a: auto
                  number 1
                let b: number
                  number 2
                let c: *number
                  unary &
                    ident b
                let d: string
                let e: Point
            ";
        }

        fn test_fn_declarations() {
            let program = "
                fn add(a number, b *number) number {
                    return a + *b;
                }
                fn noop() {
                    return;
                }
                fn alloc() *char {}
            ";
            let tree_ok = "
                fn add(a: number, b: *number) -> number
                  return
                    binary +
                      ident a
                      unary *
                        ident b
                fn noop() -> void
                  return
                fn alloc() -> *char
            ";
        }

        fn test_if_else_if_chain() {
            let program = "
                fn sign(x number) number {
                    if x < 0 {
                        return -1;
                    } else if x == 0 {
                        return 0;
                    } else if x > 100 {
                        return 2;
                    } else {
                        return 1;
                    }
                }
            ";
            let tree_ok = "
                fn sign(x: number) -> number
                  if
                    binary <
                      ident x
                      number 0
                    then
                      return
                        unary -
                          number 1
                    else if
                      binary ==
                        ident x
                        number 0
                      then
                        return
                          number 0
                    else if
                      binary >
                        ident x
                        number 100
                      then
                        return
                          number 2
                    else
                      return
                        number 1
            ";
        }

        fn test_if_without_else() {
            let program = "if ok { f(); }";
            let tree_ok = "
                if
                  ident ok
                  then
                    expr
                      call
                        ident f
            ";
        }

        fn test_nested_blocks() {
            let program = "{ let x = 1; { x; } }";
            let tree_ok = "
                block
                  let x: auto
                    number 1
                  block
                    expr
                      ident x
            ";
        }

        fn test_error_pointer_without_type() {
            let program = "let p * = 1;";
            let expected_errors = &["error: near line [1]. cause: need to supply type with '*'"];
        }

        fn test_error_missing_initializer() {
            let program = "let x;";
            let expected_errors = &["error: near line [1]. cause: cannot infer type without initializer"];
        }

        fn test_recovery_missing_semicolon() {
            let program = "let x = 1 let y = 2;";
            let tree_error = "
                let y: auto
                  number 2
            ";
            let expected_errors = &["error: near line [1]. cause: expected semi_colon, but got let"];
        }

        fn test_recovery_skips_to_next_statement() {
            let program = "
                let = 1; let a = 2;
                fn f( { }
                return a;
            ";
            let tree_error = "
                let a: auto
                  number 2
                return
                  ident a
            ";
            let expected_errors = &[
                "error: near line [2]. cause: expected identifier, but got assign",
                "error: near line [3]. cause: expected identifier, but got left_brace",
            ];
        }

        fn test_recovery_skips_the_rest_of_a_block() {
            let program = "fn f() {\n  let x = 1\n  let y = 2;\n}\nfn g() {}";
            let tree_error = "
                fn g() -> void
            ";
            let expected_errors = &["error: near line [2]. cause: expected semi_colon, but got let"];
        }

        fn test_recovery_inside_nested_blocks() {
            let program = "
                fn f(n number) {
                    if n < 1 { let = 2; }
                    return;
                }
                let ok = 1;
            ";
            let tree_error = "
                let ok: auto
                  number 1
            ";
            let expected_errors = &["error: near line [3]. cause: expected identifier, but got assign"];
        }

        fn test_error_lexer_diagnostics_come_first() {
            let program = "let s = \"abc";
            let expected_errors = &[
                "error: near line [1]. cause: unterminated string",
                "error: near line [1]. cause: expected semi_colon, but got eof",
            ];
        }
    );

    #[test]
    fn test_had_error_and_progress_on_garbage() {
        let lexed = lexer::lex(") ) ; } let ok = true;");
        let parsed = parse(&lexed.tokens);
        assert!(parsed.had_error);
        assert_eq!(parsed.stmts.len(), 1);
        assert!(matches!(parsed.stmts[0], Stmt::Var { .. }));
    }

    #[test]
    fn test_parse_without_trailing_eof() {
        let lexed = lexer::lex("let x = 1;");
        let tokens = &lexed.tokens[..lexed.tokens.len() - 1];
        let parsed = parse(tokens);
        assert!(!parsed.had_error);
        assert_eq!(parsed.stmts.len(), 1);
    }

    #[test]
    fn test_user_type_is_rekinded() {
        let stmts = test_utils::parse_program("let p Point = origin;");
        let Stmt::Var { ty, .. } = &stmts[0] else {
            panic!("expected a variable declaration");
        };
        assert_eq!(ty.name.kind, TokenKind::Type);
        assert_eq!(ty.name.lexeme, "Point");
        assert_eq!(ty.primitive(), None);
    }

    #[test]
    fn test_rule_table() {
        assert_eq!(ParseRule::of(TokenKind::Bang).precedence, Precedence::None);
        assert_eq!(ParseRule::of(TokenKind::Bang).infix, None);
        assert_eq!(ParseRule::of(TokenKind::Plus).prefix, None);
        assert_eq!(ParseRule::of(TokenKind::Semicolon), ParseRule::new(None, None, Precedence::None));
        assert!(Precedence::Factor > Precedence::Term);
        assert!(Precedence::Call > Precedence::Unary);
    }
}
