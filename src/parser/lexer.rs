//! Лексер шаблонов.
//!
//! Текст между тегами сканируется вручную, содержимое `{{ }}` и `{% %}`
//! разбирается через logos до закрывающего разделителя.

use logos::Logos;

use super::error::ParseError;
use super::token::{LineIndex, Position, Span, Spanned, Token};

/// Внутренние токены для logos (содержимое тегов).
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
enum TagToken {
    #[token("}}")]
    ClosePrint,

    #[token("%}")]
    CloseTag,

    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    // Строки в двойных и одинарных кавычках
    #[regex(r#""([^"\\]|\\.)*""#, |lex| unquote(lex.slice()))]
    #[regex(r#"'([^'\\]|\\.)*'"#, |lex| unquote(lex.slice()))]
    Str(String),

    #[regex(r"[0-9]+(\.[0-9]+)?", |lex| lex.slice().to_string())]
    Number(String),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Name(String),
}

/// Убрать кавычки и обработать escape-последовательности.
fn unquote(s: &str) -> String {
    let inner = &s[1..s.len() - 1];
    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('r') => result.push('\r'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some('\'') => result.push('\''),
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Найти начало следующего `{{`, `{%` или `{#`.
fn find_open(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    (0..bytes.len().saturating_sub(1))
        .find(|&i| bytes[i] == b'{' && matches!(bytes[i + 1], b'{' | b'%' | b'#'))
}

/// Лексер шаблона.
pub struct Lexer<'a> {
    source: &'a str,
    lines: LineIndex,
    /// Позиция в режиме текста
    pos: usize,
    /// Открытый тег: logos-лексер по хвосту исходника и его смещение
    tag: Option<(logos::Lexer<'a, TagToken>, usize)>,
    peeked: Option<Spanned<Token>>,
}

impl<'a> Lexer<'a> {
    /// Создать новый лексер.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            lines: LineIndex::new(source),
            pos: 0,
            tag: None,
            peeked: None,
        }
    }

    /// Получить следующий токен.
    pub fn next_token(&mut self) -> Result<Spanned<Token>, ParseError> {
        if let Some(token) = self.peeked.take() {
            return Ok(token);
        }

        self.read_token()
    }

    /// Посмотреть на следующий токен без его потребления.
    pub fn peek_token(&mut self) -> Result<&Spanned<Token>, ParseError> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.read_token()?,
        };
        Ok(self.peeked.insert(token))
    }

    /// Строка и смещение для байтовой позиции.
    pub fn position(&self, byte: usize) -> Position {
        self.lines.position(byte)
    }

    fn read_token(&mut self) -> Result<Spanned<Token>, ParseError> {
        if self.tag.is_some() {
            self.read_tag_token()
        } else {
            self.read_text_token()
        }
    }

    fn read_text_token(&mut self) -> Result<Spanned<Token>, ParseError> {
        loop {
            let rest = &self.source[self.pos..];
            if rest.is_empty() {
                return Ok(Spanned::new(Token::Eof, Span::new(self.pos, self.pos)));
            }

            let Some(open) = find_open(rest) else {
                let span = Span::new(self.pos, self.source.len());
                self.pos = self.source.len();
                return Ok(Spanned::new(Token::Text(rest.to_string()), span));
            };

            if open > 0 {
                let span = Span::new(self.pos, self.pos + open);
                self.pos += open;
                return Ok(Spanned::new(Token::Text(rest[..open].to_string()), span));
            }

            let start = self.pos;
            let token = match &rest[..2] {
                "{#" => {
                    let close = rest[2..].find("#}").ok_or(ParseError::UnclosedComment {
                        pos: self.lines.position(start),
                    })?;
                    self.pos += close + 4;
                    continue;
                }
                "{{" => Token::OpenPrint,
                _ => Token::OpenTag,
            };

            let source = self.source;
            self.tag = Some((TagToken::lexer(&source[start + 2..]), start + 2));
            return Ok(Spanned::new(token, Span::new(start, start + 2)));
        }
    }

    fn read_tag_token(&mut self) -> Result<Spanned<Token>, ParseError> {
        let Some((lexer, base)) = self.tag.as_mut() else {
            return self.read_text_token();
        };
        let base = *base;

        match lexer.next() {
            Some(Ok(tag_token)) => {
                let span = Span::new(base + lexer.span().start, base + lexer.span().end);
                let token = match tag_token {
                    TagToken::ClosePrint => Token::ClosePrint,
                    TagToken::CloseTag => Token::CloseTag,
                    TagToken::Dot => Token::Dot,
                    TagToken::Comma => Token::Comma,
                    TagToken::LParen => Token::LParen,
                    TagToken::RParen => Token::RParen,
                    TagToken::LBracket => Token::LBracket,
                    TagToken::RBracket => Token::RBracket,
                    TagToken::Str(s) => Token::Str(s),
                    TagToken::Number(n) => Token::Number(n),
                    TagToken::Name(n) => Token::Name(n),
                };
                if matches!(token, Token::ClosePrint | Token::CloseTag) {
                    self.tag = None;
                    self.pos = span.end;
                }
                Ok(Spanned::new(token, span))
            }
            Some(Err(())) => {
                let start = base + lexer.span().start;
                Err(ParseError::LexerError {
                    pos: self.lines.position(start),
                })
            }
            None => Err(ParseError::unexpected_eof(
                self.lines.position(self.source.len()),
                "unclosed tag",
            )),
        }
    }
}
