//! Tokenizer shared by the role and script grammars.
//!
//! Keywords are not reserved at this level: every word lexes as
//! [`TokenKind::Ident`] and the parser decides what it means in context.
//! `#` and `//` start comments that run to the end of the line.

use std::fmt;

use crate::dsl::error::{ParseError, ParseErrorKind, ParseResult, Pos};

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Str(String),
    Int(i64),
    Float(f64),
    LBrace,
    RBrace,
    LParen,
    RParen,
    Comma,
    Semi,
    Dot,
    Percent,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(word) => write!(f, "`{word}`"),
            TokenKind::Str(text) => write!(f, "string \"{text}\""),
            TokenKind::Int(n) => write!(f, "number {n}"),
            TokenKind::Float(n) => write!(f, "number {n}"),
            TokenKind::LBrace => f.write_str("`{`"),
            TokenKind::RBrace => f.write_str("`}`"),
            TokenKind::LParen => f.write_str("`(`"),
            TokenKind::RParen => f.write_str("`)`"),
            TokenKind::Comma => f.write_str("`,`"),
            TokenKind::Semi => f.write_str("`;`"),
            TokenKind::Dot => f.write_str("`.`"),
            TokenKind::Percent => f.write_str("`%`"),
            TokenKind::Assign => f.write_str("`=`"),
            TokenKind::Plus => f.write_str("`+`"),
            TokenKind::Minus => f.write_str("`-`"),
            TokenKind::Star => f.write_str("`*`"),
            TokenKind::Slash => f.write_str("`/`"),
            TokenKind::Lt => f.write_str("`<`"),
            TokenKind::Le => f.write_str("`<=`"),
            TokenKind::Gt => f.write_str("`>`"),
            TokenKind::Ge => f.write_str("`>=`"),
            TokenKind::EqEq => f.write_str("`==`"),
            TokenKind::NotEq => f.write_str("`!=`"),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Pos,
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn pos(&self) -> Pos {
        Pos::new(self.line, self.column)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('#') => self.skip_line(),
                Some('/') => {
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    if ahead.next() == Some('/') {
                        self.skip_line();
                    } else {
                        return;
                    }
                }
                _ => return,
            }
        }
    }

    fn string(&mut self, start: Pos) -> ParseResult<TokenKind> {
        self.bump();
        let mut text = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(ParseError::new(
                        ParseErrorKind::UnterminatedString,
                        "unterminated string literal",
                        start,
                    ));
                }
                Some('"') => return Ok(TokenKind::Str(text)),
                Some('\\') => match self.bump() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some(c @ ('"' | '\\')) => text.push(c),
                    Some(other) => {
                        text.push('\\');
                        text.push(other);
                    }
                    None => {
                        return Err(ParseError::new(
                            ParseErrorKind::UnterminatedString,
                            "unterminated string literal",
                            start,
                        ));
                    }
                },
                Some(c) => text.push(c),
            }
        }
    }

    fn number(&mut self, start: Pos) -> ParseResult<TokenKind> {
        let mut text = String::new();
        let mut is_float = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '_' {
                self.bump();
                if c != '_' {
                    text.push(c);
                }
            } else if c == '.' && !is_float {
                // `1.5` is a float; `unit.Hp` style access never starts with a digit.
                let mut ahead = self.chars.clone();
                ahead.next();
                if !ahead.next().is_some_and(|d| d.is_ascii_digit()) {
                    break;
                }
                is_float = true;
                self.bump();
                text.push('.');
            } else {
                break;
            }
        }
        if self.peek().is_some_and(|c| c.is_alphabetic()) {
            return Err(ParseError::new(
                ParseErrorKind::InvalidNumber,
                format!("invalid number literal `{text}{}`", self.peek().unwrap_or_default()),
                start,
            ));
        }
        let invalid = || {
            ParseError::new(
                ParseErrorKind::InvalidNumber,
                format!("invalid number literal `{text}`"),
                start,
            )
        };
        if is_float {
            text.parse().map(TokenKind::Float).map_err(|_| invalid())
        } else {
            text.parse().map(TokenKind::Int).map_err(|_| invalid())
        }
    }

    fn ident(&mut self) -> TokenKind {
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                word.push(c);
                self.bump();
            } else {
                break;
            }
        }
        TokenKind::Ident(word)
    }

    fn next_token(&mut self) -> ParseResult<Token> {
        self.skip_trivia();
        let pos = self.pos();
        let Some(c) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                pos,
            });
        };

        let kind = match c {
            '"' => self.string(pos)?,
            c if c.is_ascii_digit() => self.number(pos)?,
            c if c.is_alphabetic() || c == '_' => self.ident(),
            _ => {
                self.bump();
                match c {
                    '{' => TokenKind::LBrace,
                    '}' => TokenKind::RBrace,
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    ',' => TokenKind::Comma,
                    ';' => TokenKind::Semi,
                    '.' => TokenKind::Dot,
                    '%' => TokenKind::Percent,
                    '+' => TokenKind::Plus,
                    '-' => TokenKind::Minus,
                    '*' => TokenKind::Star,
                    '/' => TokenKind::Slash,
                    '=' if self.peek() == Some('=') => {
                        self.bump();
                        TokenKind::EqEq
                    }
                    '=' => TokenKind::Assign,
                    '!' if self.peek() == Some('=') => {
                        self.bump();
                        TokenKind::NotEq
                    }
                    '<' if self.peek() == Some('=') => {
                        self.bump();
                        TokenKind::Le
                    }
                    '<' => TokenKind::Lt,
                    '>' if self.peek() == Some('=') => {
                        self.bump();
                        TokenKind::Ge
                    }
                    '>' => TokenKind::Gt,
                    other => {
                        return Err(ParseError::new(
                            ParseErrorKind::UnexpectedChar,
                            format!("unexpected character `{other}`"),
                            pos,
                        ));
                    }
                }
            }
        };
        Ok(Token { kind, pos })
    }
}

/// Splits `src` into tokens, ending with a single [`TokenKind::Eof`].
pub fn tokenize(src: &str) -> ParseResult<Vec<Token>> {
    let mut lexer = Lexer::new(src);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn comments_and_operators() {
        assert_eq!(
            kinds("a <= 1.5 # note\n// whole line\nb != \"x\""),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Le,
                TokenKind::Float(1.5),
                TokenKind::Ident("b".into()),
                TokenKind::NotEq,
                TokenKind::Str("x".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn positions_are_one_based() {
        let tokens = tokenize("deal\n  5").unwrap();
        assert_eq!(tokens[0].pos, Pos::new(1, 1));
        assert_eq!(tokens[1].pos, Pos::new(2, 3));
    }

    #[test]
    fn errors_carry_kind_and_position() {
        let err = tokenize("heal 5 to \"target").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedString);
        assert_eq!((err.line, err.column), (1, 11));

        let err = tokenize("range 5x").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidNumber);

        let err = tokenize("heal @").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedChar);
        assert_eq!((err.line, err.column), (1, 6));
    }

    #[test]
    fn escapes_in_strings() {
        assert_eq!(
            kinds(r#""a\"b""#),
            vec![TokenKind::Str("a\"b".into()), TokenKind::Eof]
        );
    }
}
