use std::{borrow::Cow, fmt};

#[derive(Clone, PartialEq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    /// The exact source text of this token.
    pub lexeme: &'src str,
    /// Only present for [`TokenKind::Number`], [`TokenKind::String`] and
    /// [`TokenKind::Char`].
    pub literal: Option<Literal<'src>>,
    pub line: u32,
}

impl<'src> Token<'src> {
    pub fn new(kind: TokenKind, lexeme: &'src str, line: u32) -> Token<'src> {
        Token {
            kind,
            lexeme,
            literal: None,
            line,
        }
    }

    pub fn with_literal(mut self, literal: Literal<'src>) -> Token<'src> {
        self.literal = Some(literal);
        self
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?}, {:?}, line {})", self.kind, self.lexeme, self.line)?;
        if let Some(ref literal) = self.literal {
            write!(f, " = {literal:?}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Literal<'src> {
    Number(f64),
    /// Borrowed when the source text needed no escaping.
    String(Cow<'src, str>),
    Char(u8),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBrack,
    RBrack,
    Semicolon,
    Comma,
    Plus,
    Minus,
    Star,
    Slash,
    Bang,
    /// `&`, the address-of operator.
    Ampersand,
    Assign,
    Dot,
    PlusPlus,
    MinusMinus,
    EqualEqual,
    BangEqual,
    Less,
    Greater,
    LessEq,
    GreaterEq,

    Number,
    String,
    Char,
    Identifier,

    Let,
    True,
    False,
    Fn,
    If,
    Else,
    Return,
    /// One of the primitive type keywords, or a user type name once the parser
    /// has resolved it as such.
    Type,

    Eof,
}

impl TokenKind {
    /// Whether a statement may begin with this token. Used by the parser to
    /// find a resume point after an error.
    pub fn starts_statement(self) -> bool {
        matches!(
            self,
            TokenKind::Let | TokenKind::Fn | TokenKind::If | TokenKind::Return
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;
        let name = match self {
            LParen => "left_paren",
            RParen => "right_paren",
            LBrace => "left_brace",
            RBrace => "right_brace",
            LBrack => "left_brack",
            RBrack => "right_brack",
            Semicolon => "semi_colon",
            Comma => "comma",
            Plus => "plus",
            Minus => "minus",
            Star => "star",
            Slash => "slash",
            Bang => "bang",
            Ampersand => "address",
            Assign => "assign",
            Dot => "dot",
            PlusPlus => "plusplus",
            MinusMinus => "minusminus",
            EqualEqual => "equal",
            BangEqual => "not_equal",
            Less => "less",
            Greater => "greater",
            LessEq => "less_eq",
            GreaterEq => "greater_eq",
            Number => "number",
            String => "string",
            Char => "char",
            Identifier => "identifier",
            Let => "let",
            True => "true",
            False => "false",
            Fn => "fn",
            If => "if",
            Else => "else",
            Return => "return",
            Type => "type",
            Eof => "eof",
        };
        f.write_str(name)
    }
}

pub static KEYWORDS: phf::Map<&'static str, TokenKind> = phf::phf_map! {
    "let" => TokenKind::Let,
    "true" => TokenKind::True,
    "false" => TokenKind::False,
    "fn" => TokenKind::Fn,
    "if" => TokenKind::If,
    "else" => TokenKind::Else,
    "return" => TokenKind::Return,
    "number" => TokenKind::Type,
    "string" => TokenKind::Type,
    "bool" => TokenKind::Type,
    "char" => TokenKind::Type,
};

/// Type names the parser synthesizes; they can't be written in source.
pub const AUTO: &str = "auto";
pub const VOID: &str = "void";

/// An error (or any other value) tagged with the source line it refers to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Positioned<T> {
    pub line: u32,
    pub inner: T,
}

impl<T> Positioned<T> {
    pub fn new(line: u32, inner: T) -> Positioned<T> {
        Positioned { line, inner }
    }
}

impl<T: fmt::Display> fmt::Display for Positioned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error: near line [{}]. cause: {}", self.line, self.inner)
    }
}

impl<T: std::error::Error + 'static> std::error::Error for Positioned<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.inner)
    }
}
