//! Токены и позиции для лексера шаблонов.

use serde::{Deserialize, Serialize};

/// Диапазон байтов в исходном тексте шаблона.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Начальная позиция (байт).
    pub start: usize,
    /// Конечная позиция (байт).
    pub end: usize,
}

impl Span {
    /// Создать новый Span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Токен с позицией.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: Span) -> Self {
        Self { value, span }
    }
}

/// Строка (с 1) и смещение в байтах внутри строки (с 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, offset: usize) -> Self {
        Self { line, offset }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, offset {}", self.line, self.offset)
    }
}

/// Таблица начал строк: переводит байтовую позицию в [`Position`].
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut starts = vec![0];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                starts.push(i + 1);
            }
        }
        Self { starts }
    }

    /// Позиция байта `byte` в исходнике.
    pub fn position(&self, byte: usize) -> Position {
        let line = match self.starts.binary_search(&byte) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        Position::new(line + 1, byte - self.starts[line])
    }
}

/// Типы токенов шаблона.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Обычный текст между тегами
    Text(String),
    /// `{{`
    OpenPrint,
    /// `}}`
    ClosePrint,
    /// `{%`
    OpenTag,
    /// `%}`
    CloseTag,

    /// Идентификатор (включая имена тегов)
    Name(String),
    /// Строковый литерал (уже без кавычек)
    Str(String),
    /// Числовой литерал: распознаётся только ради понятной ошибки
    Number(String),

    Dot,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,

    /// Конец шаблона
    Eof,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Text(_) => write!(f, "text"),
            Token::OpenPrint => write!(f, "{{{{"),
            Token::ClosePrint => write!(f, "}}}}"),
            Token::OpenTag => write!(f, "{{%"),
            Token::CloseTag => write!(f, "%}}"),
            Token::Name(s) => write!(f, "{}", s),
            Token::Str(s) => write!(f, "{:?}", s),
            Token::Number(s) => write!(f, "{}", s),
            Token::Dot => write!(f, "."),
            Token::Comma => write!(f, ","),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Eof => write!(f, "EOF"),
        }
    }
}
