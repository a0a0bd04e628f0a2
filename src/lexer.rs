use std::{borrow::Cow, mem};

use tracing::{debug, instrument, trace};

use crate::token::{Literal, Positioned, Token, TokenKind, KEYWORDS};

pub const SUGGESTED_TOKENS_CAPACITY: usize = 1_024;

/// The result of scanning one translation unit.
#[derive(Debug, Default)]
pub struct Lexed<'src> {
    /// Always terminated by exactly one [`TokenKind::Eof`] token.
    pub tokens: Vec<Token<'src>>,
    pub errors: Vec<Positioned<Error>>,
    pub had_error: bool,
}

/// Lexes the provided source with a fresh lexer.
pub fn lex(src: &str) -> Lexed<'_> {
    Lexer::default().scan(src)
}

/// The kel scanner.
///
/// A single instance may be used for several inputs: every call to
/// [`Lexer::scan`] starts over from a clean state.
#[derive(Default)]
pub struct Lexer<'src> {
    src: &'src str,
    cursor: usize,
    start: usize,
    line: u32,
    tokens: Vec<Token<'src>>,
    errors: Vec<Positioned<Error>>,
}

impl<'src> Lexer<'src> {
    /// Scans the source until the input is exhausted. Errors are collected,
    /// never fatal.
    #[instrument(level = "debug", skip_all, fields(len = src.len()))]
    pub fn scan(&mut self, src: &'src str) -> Lexed<'src> {
        self.reset(src);
        while !self.is_at_end() {
            self.start = self.cursor;
            self.scan_token();
        }
        self.start = self.cursor;
        self.produce(TokenKind::Eof);

        let tokens = mem::take(&mut self.tokens);
        let errors = mem::take(&mut self.errors);
        debug!(tokens = tokens.len(), errors = errors.len(), "scanned");
        Lexed {
            had_error: !errors.is_empty(),
            tokens,
            errors,
        }
    }

    fn reset(&mut self, src: &'src str) {
        self.src = src;
        self.cursor = 0;
        self.start = 0;
        self.line = 1;
        self.tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY.min(src.len() + 1));
        self.errors = Vec::new();
    }

    fn scan_token(&mut self) {
        use TokenKind::*;
        match self.advance() {
            b' ' | b'\t' | b'\r' => {}
            b'\n' => self.line += 1,
            b'(' => self.produce(LParen),
            b')' => self.produce(RParen),
            b'{' => self.produce(LBrace),
            b'}' => self.produce(RBrace),
            b'[' => self.produce(LBrack),
            b']' => self.produce(RBrack),
            b',' => self.produce(Comma),
            b';' => self.produce(Semicolon),
            b'.' => self.produce(Dot),
            b'*' => self.produce(Star),
            b'&' => self.produce(Ampersand),
            b'+' => self.produce_either(b'+', PlusPlus, Plus),
            b'-' => self.produce_either(b'-', MinusMinus, Minus),
            b'!' => self.produce_either(b'=', BangEqual, Bang),
            b'=' => self.produce_either(b'=', EqualEqual, Assign),
            b'<' => self.produce_either(b'=', LessEq, Less),
            b'>' => self.produce_either(b'=', GreaterEq, Greater),
            b'/' => {
                if self.take(b'/') {
                    self.line_comment();
                } else {
                    self.produce(Slash);
                }
            }
            b'"' => self.string(),
            b'\'' => self.char(),
            c if c.is_ascii_digit() => self.number(),
            c if is_alpha(c) => self.identifier_or_keyword(),
            _ => self.unrecognized(),
        }
    }

    /// Consumes a comment up to, but not including, the line break.
    fn line_comment(&mut self) {
        while !self.is_at_end() && self.peek() != b'\n' {
            self.advance();
        }
    }

    /// Lexes a string literal. Escapes are resolved only when the token
    /// actually contains one, so most strings borrow from the source.
    fn string(&mut self) {
        let mut has_escaped = false;
        let closed = loop {
            match self.peek() {
                _ if self.is_at_end() => {
                    self.error(Error::UnterminatedString);
                    break false;
                }
                // The line break is left for the main loop so that line
                // counting stays accurate.
                b'\n' => {
                    self.error(Error::MultilineString);
                    break false;
                }
                b'"' => {
                    self.advance();
                    break true;
                }
                b'\\' => {
                    has_escaped = true;
                    self.advance();
                    if !self.is_at_end() && self.peek() != b'\n' {
                        self.advance();
                    }
                }
                _ => {
                    self.advance();
                }
            }
        };

        let raw = self.contents(closed);
        let value = if has_escaped {
            Cow::Owned(perform_escape(raw))
        } else {
            Cow::Borrowed(raw)
        };
        self.produce_literal(TokenKind::String, Literal::String(value));
    }

    fn char(&mut self) {
        while !self.is_at_end() && !matches!(self.peek(), b'\'' | b'\n') {
            if self.advance() == b'\\' && !self.is_at_end() && self.peek() != b'\n' {
                self.advance();
            }
        }
        let closed = self.take(b'\'');
        if !closed {
            self.error(Error::UnterminatedChar);
        }

        let value = match self.contents(closed).as_bytes() {
            [byte] => *byte,
            [b'\\', escaped] => escape(*escaped),
            other => {
                if closed {
                    self.error(Error::CharLength);
                }
                other.first().copied().unwrap_or(0)
            }
        };
        self.produce_literal(TokenKind::Char, Literal::Char(value));
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }
        let substr = self.substr();
        match substr.parse::<f64>() {
            Ok(value) => self.produce_literal(TokenKind::Number, Literal::Number(value)),
            Err(_) => self.error(Error::MalformedNumber(substr.to_owned())),
        }
    }

    fn identifier_or_keyword(&mut self) {
        while is_alpha(self.peek()) {
            self.advance();
        }
        let kind = KEYWORDS
            .get(self.substr())
            .copied()
            .unwrap_or(TokenKind::Identifier);
        self.produce(kind);
    }

    fn unrecognized(&mut self) {
        // Skip the whole character so that the cursor stays on a boundary.
        let c = self.src[self.start..].chars().next().unwrap_or('\0');
        self.cursor = self.start + c.len_utf8();
        self.error(Error::UnrecognizedChar(c));
    }
}

impl<'src> Lexer<'src> {
    /// Returns the current byte and advances the cursor.
    fn advance(&mut self) -> u8 {
        let c = self.peek();
        self.cursor += 1;
        c
    }

    /// Advances if the current byte matches the provided one.
    fn take(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Returns the current byte without advancing, or NUL at the end.
    fn peek(&self) -> u8 {
        self.src.as_bytes().get(self.cursor).copied().unwrap_or(b'\0')
    }

    fn peek_next(&self) -> u8 {
        self.src
            .as_bytes()
            .get(self.cursor + 1)
            .copied()
            .unwrap_or(b'\0')
    }

    fn is_at_end(&self) -> bool {
        self.cursor >= self.src.len()
    }

    /// Returns the text of the token being scanned.
    fn substr(&self) -> &'src str {
        &self.src[self.start..self.cursor]
    }

    /// Returns the text between the delimiters of a quoted token, which may
    /// lack its closing delimiter.
    fn contents(&self, closed: bool) -> &'src str {
        let end = if closed { self.cursor - 1 } else { self.cursor };
        &self.src[self.start + 1..end]
    }

    fn produce(&mut self, kind: TokenKind) {
        let token = Token::new(kind, self.substr(), self.line);
        trace!(?token);
        self.tokens.push(token);
    }

    fn produce_literal(&mut self, kind: TokenKind, literal: Literal<'src>) {
        let token = Token::new(kind, self.substr(), self.line).with_literal(literal);
        trace!(?token);
        self.tokens.push(token);
    }

    /// Produces `matched` if the next byte is `next`, consuming it, or
    /// `otherwise` without consuming anything.
    fn produce_either(&mut self, next: u8, matched: TokenKind, otherwise: TokenKind) {
        let kind = if self.take(next) { matched } else { otherwise };
        self.produce(kind);
    }

    fn error(&mut self, error: Error) {
        self.errors.push(Positioned::new(self.line, error));
    }
}

fn is_alpha(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn escape(c: u8) -> u8 {
    match c {
        b'n' => b'\n',
        b't' => b'\t',
        b'r' => b'\r',
        b'0' => b'\0',
        other => other,
    }
}

fn perform_escape(raw: &str) -> String {
    let mut buf = String::with_capacity(raw.len());
    let mut escaped = false;
    for char in raw.chars() {
        let char = match (escaped, char) {
            (true, 'n') => '\n',
            (true, 't') => '\t',
            (true, 'r') => '\r',
            (true, '0') => '\0',
            (false, '\\') => {
                escaped = true;
                continue;
            }
            (_, char) => char,
        };
        escaped = false;
        buf.push(char);
    }
    buf
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("unrecognized character '{0}'")]
    UnrecognizedChar(char),
    #[error("unterminated string")]
    UnterminatedString,
    #[error("multiline strings are not supported")]
    MultilineString,
    #[error("unterminated character")]
    UnterminatedChar,
    #[error("can only specify 1 character inside of single quotes")]
    CharLength,
    #[error("malformed number '{0}'")]
    MalformedNumber(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).tokens.into_iter().map(|t| t.kind).collect()
    }

    fn messages(src: &str) -> Vec<String> {
        lex(src).errors.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn tests_with_lexeme_and_line() {
        use TokenKind::*;
        let cases = cases!(match .. {
            "+-*/" => [
                (Plus, "+", 1),
                (Minus, "-", 1),
                (Star, "*", 1),
                (Slash, "/", 1),
                (Eof, "", 1),
            ],
            "++ -- == != <= >= = ! < >" => [
                (PlusPlus, "++", 1),
                (MinusMinus, "--", 1),
                (EqualEqual, "==", 1),
                (BangEqual, "!=", 1),
                (LessEq, "<=", 1),
                (GreaterEq, ">=", 1),
                (Assign, "=", 1),
                (Bang, "!", 1),
                (Less, "<", 1),
                (Greater, ">", 1),
                (Eof, "", 1),
            ],
            "<<=+++" => [
                (Less, "<", 1),
                (LessEq, "<=", 1),
                (PlusPlus, "++", 1),
                (Plus, "+", 1),
                (Eof, "", 1),
            ],
            "let x number = 1;" => [
                (Let, "let", 1),
                (Identifier, "x", 1),
                (Type, "number", 1),
                (Assign, "=", 1),
                (Number, "1", 1),
                (Semicolon, ";", 1),
                (Eof, "", 1),
            ],
            "fn main() {\n  return;\n}\n" => [
                (Fn, "fn", 1),
                (Identifier, "main", 1),
                (LParen, "(", 1),
                (RParen, ")", 1),
                (LBrace, "{", 1),
                (Return, "return", 2),
                (Semicolon, ";", 2),
                (RBrace, "}", 3),
                (Eof, "", 4),
            ],
            "a // comment ( \" ' \nb" => [
                (Identifier, "a", 1),
                (Identifier, "b", 2),
                (Eof, "", 2),
            ],
            "snake_case _x if else true false string bool char" => [
                (Identifier, "snake_case", 1),
                (Identifier, "_x", 1),
                (If, "if", 1),
                (Else, "else", 1),
                (True, "true", 1),
                (False, "false", 1),
                (Type, "string", 1),
                (Type, "bool", 1),
                (Type, "char", 1),
                (Eof, "", 1),
            ],
            "1 12.5 3. .5" => [
                (Number, "1", 1),
                (Number, "12.5", 1),
                (Number, "3", 1),
                (Dot, ".", 1),
                (Dot, ".", 1),
                (Number, "5", 1),
                (Eof, "", 1),
            ],
            "&x *p [a]" => [
                (Ampersand, "&", 1),
                (Identifier, "x", 1),
                (Star, "*", 1),
                (Identifier, "p", 1),
                (LBrack, "[", 1),
                (Identifier, "a", 1),
                (RBrack, "]", 1),
                (Eof, "", 1),
            ],
        });

        for (input, tokens) in cases {
            let lexed = lex(input);
            assert!(!lexed.had_error, "{input:?}: {:?}", lexed.errors);
            let actual: Vec<_> = lexed
                .tokens
                .iter()
                .map(|t| (t.kind, t.lexeme, t.line))
                .collect();
            assert_eq!(&actual, tokens, "{input:?}");
        }
    }

    #[test]
    fn test_literals() {
        let lexed = lex(r#"12.25 "hi" 'c' "a\tb\"c" '\n'"#);
        let literals: Vec<_> = lexed.tokens.into_iter().filter_map(|t| t.literal).collect();
        assert_eq!(
            literals,
            [
                Literal::Number(12.25),
                Literal::String(Cow::Borrowed("hi")),
                Literal::Char(b'c'),
                Literal::String(Cow::Owned("a\tb\"c".to_owned())),
                Literal::Char(b'\n'),
            ]
        );
    }

    #[test]
    fn test_unescaped_string_borrows() {
        let lexed = lex(r#""hello world""#);
        assert!(matches!(
            lexed.tokens[0].literal,
            Some(Literal::String(Cow::Borrowed("hello world")))
        ));
        assert_eq!(lexed.tokens[0].lexeme, r#""hello world""#);
    }

    #[test]
    fn test_unterminated_string() {
        let lexed = lex("let s = \"abc");
        assert!(lexed.had_error);
        assert_eq!(
            messages("let s = \"abc"),
            ["error: near line [1]. cause: unterminated string"]
        );
        assert_eq!(
            lexed.tokens.last().map(|t| t.kind),
            Some(TokenKind::Eof)
        );
    }

    #[test]
    fn test_multiline_string_keeps_scanning() {
        let src = "\"one\ntwo\" three";
        assert_eq!(
            messages(src),
            [
                "error: near line [1]. cause: multiline strings are not supported",
                "error: near line [2]. cause: unterminated string",
            ]
        );
        assert_eq!(
            kinds(src),
            [
                TokenKind::String,
                TokenKind::Identifier,
                TokenKind::String,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_char_errors() {
        assert_eq!(
            messages("'ab' ''"),
            [
                "error: near line [1]. cause: can only specify 1 character inside of single quotes",
                "error: near line [1]. cause: can only specify 1 character inside of single quotes",
            ]
        );
        assert_eq!(
            messages("'a"),
            ["error: near line [1]. cause: unterminated character"]
        );
    }

    #[test]
    fn test_unrecognized_characters_are_skipped() {
        let src = "a $ b\n# ç c";
        assert_eq!(
            messages(src),
            [
                "error: near line [1]. cause: unrecognized character '$'",
                "error: near line [2]. cause: unrecognized character '#'",
                "error: near line [2]. cause: unrecognized character 'ç'",
            ]
        );
        assert_eq!(
            kinds(src),
            [
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_single_eof_and_monotonic_lines() {
        let inputs = [
            "",
            "\n\n\n",
            "fn f(a number) number {\n return a * 2;\n}\nlet x = f(2);\n",
            "\"broken\n 'x' ~ 1.5 // trailing",
        ];
        for input in inputs {
            let tokens = lex(input).tokens;
            let eofs = tokens.iter().filter(|t| t.is_eof()).count();
            assert_eq!(eofs, 1, "{input:?}");
            assert!(tokens.last().is_some_and(Token::is_eof));
            assert!(tokens.windows(2).all(|w| w[0].line <= w[1].line), "{input:?}");
        }
    }

    #[test]
    fn test_lexer_reuse_resets_state() {
        let mut lexer = Lexer::default();
        let first = lexer.scan("$\n\n");
        assert!(first.had_error);
        let second = lexer.scan("x");
        assert!(!second.had_error);
        assert!(second.errors.is_empty());
        assert_eq!(second.tokens[0].line, 1);
        assert_eq!(second.tokens.len(), 2);
    }

    macro_rules! cases {
        (match .. {
            $($str:expr => [$(($kind:expr, $lexeme:expr, $line:expr)),* $(,)?]),* $(,)?
        }) => {{
            &[$((
                $str,
                vec![$(($kind, $lexeme, $line)),*],
            )),*]
        }};
    }
    use cases;
}
