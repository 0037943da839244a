//! Parse errors for role and skill-script text.

use battle_core::{ErrorSeverity, GameError};

/// 1-based source position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos {
    pub line: u32,
    pub column: u32,
}

impl Pos {
    pub const START: Pos = Pos { line: 1, column: 1 };

    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, col {}", self.line, self.column)
    }
}

/// Category of a [`ParseError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ParseErrorKind {
    UnexpectedChar,
    UnterminatedString,
    InvalidNumber,
    UnexpectedToken,
    UnexpectedEof,
    UnknownKeyword,
    DuplicateSection,
    InvalidValue,
    TooDeep,
}

/// Malformed role or script text. Loading stops at the first one.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("line {line}, col {column}: {message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, message: impl Into<String>, at: Pos) -> Self {
        Self {
            kind,
            message: message.into(),
            line: at.line,
            column: at.column,
        }
    }

    pub fn pos(&self) -> Pos {
        Pos::new(self.line, self.column)
    }
}

impl GameError for ParseError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self.kind {
            ParseErrorKind::UnexpectedChar => "PARSE_UNEXPECTED_CHAR",
            ParseErrorKind::UnterminatedString => "PARSE_UNTERMINATED_STRING",
            ParseErrorKind::InvalidNumber => "PARSE_INVALID_NUMBER",
            ParseErrorKind::UnexpectedToken => "PARSE_UNEXPECTED_TOKEN",
            ParseErrorKind::UnexpectedEof => "PARSE_UNEXPECTED_EOF",
            ParseErrorKind::UnknownKeyword => "PARSE_UNKNOWN_KEYWORD",
            ParseErrorKind::DuplicateSection => "PARSE_DUPLICATE_SECTION",
            ParseErrorKind::InvalidValue => "PARSE_INVALID_VALUE",
            ParseErrorKind::TooDeep => "PARSE_TOO_DEEP",
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
