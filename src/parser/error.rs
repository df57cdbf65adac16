//! Ошибки парсера шаблонов.

use super::token::{Position, Token};
use thiserror::Error;

/// Ошибка парсинга.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Неожиданный токен.
    #[error("Unexpected token at {pos}: expected {expected}, found {found}")]
    UnexpectedToken {
        pos: Position,
        expected: String,
        found: String,
    },

    /// Неожиданный конец шаблона.
    #[error("Unexpected end of template at {pos}: {message}")]
    UnexpectedEof { pos: Position, message: String },

    /// Незакрытый комментарий `{# ... #}`.
    #[error("Unclosed comment at {pos}")]
    UnclosedComment { pos: Position },

    /// Ошибка лексера.
    #[error("Lexer error at {pos}: unexpected character")]
    LexerError { pos: Position },

    /// Неизвестный тег.
    #[error("Unknown tag '{name}' at {pos}")]
    UnknownTag { pos: Position, name: String },

    /// `extends` не на верхнем уровне или повторно.
    #[error("Misplaced extends at {pos}: {message}")]
    MisplacedExtends { pos: Position, message: String },

    /// Литерал, которого нет в языке выражений.
    #[error("Unsupported literal '{literal}' at {pos}")]
    UnsupportedLiteral { pos: Position, literal: String },

    /// Блок с таким именем уже объявлен в этом шаблоне.
    #[error("Block '{name}' defined twice at {pos}")]
    DuplicateBlock { pos: Position, name: String },
}

impl ParseError {
    /// Создать ошибку "неожиданный токен".
    pub fn unexpected_token(pos: Position, expected: impl Into<String>, found: &Token) -> Self {
        Self::UnexpectedToken {
            pos,
            expected: expected.into(),
            found: found.to_string(),
        }
    }

    /// Создать ошибку "неожиданный конец".
    pub fn unexpected_eof(pos: Position, message: impl Into<String>) -> Self {
        Self::UnexpectedEof {
            pos,
            message: message.into(),
        }
    }

    /// Создать ошибку "неизвестный тег".
    pub fn unknown_tag(pos: Position, name: impl Into<String>) -> Self {
        Self::UnknownTag {
            pos,
            name: name.into(),
        }
    }

    /// Создать ошибку "extends не на своём месте".
    pub fn misplaced_extends(pos: Position, message: impl Into<String>) -> Self {
        Self::MisplacedExtends {
            pos,
            message: message.into(),
        }
    }

    pub fn duplicate_block(pos: Position, name: impl Into<String>) -> Self {
        Self::DuplicateBlock {
            pos,
            name: name.into(),
        }
    }

    /// Получить позицию ошибки.
    pub fn position(&self) -> Position {
        match self {
            Self::UnexpectedToken { pos, .. } => *pos,
            Self::UnexpectedEof { pos, .. } => *pos,
            Self::UnclosedComment { pos } => *pos,
            Self::LexerError { pos } => *pos,
            Self::UnknownTag { pos, .. } => *pos,
            Self::MisplacedExtends { pos, .. } => *pos,
            Self::UnsupportedLiteral { pos, .. } => *pos,
            Self::DuplicateBlock { pos, .. } => *pos,
        }
    }
}
