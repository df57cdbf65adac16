//! Рекурсивный парсер шаблонов.

use std::collections::HashSet;

use super::error::ParseError;
use super::lexer::Lexer;
use super::token::{Position, Token};
use crate::ast::{Body, Expr, Extends, Module, Node};

/// Запас стека перед рекурсивным спуском и размер нового сегмента.
const RED_ZONE: usize = 256 * 1024;
const STACK_SIZE: usize = 8 * 1024 * 1024;

/// Парсер шаблона.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    /// Родительский шаблон из `{% extends %}`
    parent: Option<Extends>,
    /// Глубина вложенности в блоки и циклы
    depth: usize,
    /// Имена уже объявленных блоков
    blocks: HashSet<String>,
}

impl<'a> Parser<'a> {
    /// Создать новый парсер.
    pub fn new(source: &'a str) -> Self {
        Self {
            lexer: Lexer::new(source),
            parent: None,
            depth: 0,
            blocks: HashSet::new(),
        }
    }

    /// Распарсить шаблон целиком.
    pub fn parse_module(mut self) -> Result<Module, ParseError> {
        let body = self.parse_body(&[])?;
        Ok(Module {
            parent: self.parent,
            body,
        })
    }

    /// Распарсить последовательность узлов до одного из `end_tags`
    /// (или до конца шаблона, если список пуст).
    fn parse_body(&mut self, end_tags: &[&str]) -> Result<Body, ParseError> {
        let mut nodes = Vec::new();

        loop {
            let token = self.lexer.next_token()?;
            let pos = self.lexer.position(token.span.start);

            match token.value {
                Token::Eof => {
                    if let Some(tag) = end_tags.first() {
                        return Err(ParseError::unexpected_eof(
                            pos,
                            format!("expected {{% {} %}}", tag),
                        ));
                    }
                    return Ok(Body::new(nodes));
                }
                Token::Text(data) => nodes.push(Node::Text { data, pos }),
                Token::OpenPrint => {
                    let expr = self.parse_expr()?;
                    self.expect(Token::ClosePrint, "'}}'")?;
                    nodes.push(Node::Print { expr, pos });
                }
                Token::OpenTag => {
                    let name = self.expect_name("tag name")?;
                    if end_tags.contains(&name.as_str()) {
                        self.finish_end_tag()?;
                        return Ok(Body::new(nodes));
                    }
                    if let Some(node) = self.parse_tag(&name, pos)? {
                        nodes.push(node);
                    }
                }
                other => {
                    return Err(ParseError::unexpected_token(
                        pos,
                        "text, '{{' or '{%'",
                        &other,
                    ))
                }
            }
        }
    }

    /// Распарсить тег после его имени. `extends` не даёт узла.
    fn parse_tag(&mut self, name: &str, pos: Position) -> Result<Option<Node>, ParseError> {
        match name {
            "extends" => {
                if self.depth > 0 {
                    return Err(ParseError::misplaced_extends(
                        pos,
                        "extends is only allowed at the top level",
                    ));
                }
                if self.parent.is_some() {
                    return Err(ParseError::misplaced_extends(
                        pos,
                        "template already extends another template",
                    ));
                }
                let target = self.parse_expr()?;
                self.expect(Token::CloseTag, "'%}'")?;
                self.parent = Some(Extends { target, pos });
                Ok(None)
            }
            "block" => {
                let name = self.expect_name("block name")?;
                if !self.blocks.insert(name.clone()) {
                    return Err(ParseError::duplicate_block(pos, name));
                }
                self.expect(Token::CloseTag, "'%}'")?;
                let body = self.parse_nested(&["endblock"])?;
                Ok(Some(Node::Block { name, body, pos }))
            }
            "for" => {
                let first = self.expect_name("loop variable")?;
                let (key, value) = if self.peek()? == Token::Comma {
                    self.lexer.next_token()?;
                    (Some(first), self.expect_name("loop value variable")?)
                } else {
                    (None, first)
                };
                self.expect(Token::Name("in".to_string()), "'in'")?;
                let iterable = self.parse_expr()?;
                self.expect(Token::CloseTag, "'%}'")?;
                let body = self.parse_nested(&["endfor"])?;
                Ok(Some(Node::For {
                    key,
                    value,
                    iterable,
                    body,
                    pos,
                }))
            }
            "include" => {
                let target = self.parse_expr()?;
                self.expect(Token::CloseTag, "'%}'")?;
                Ok(Some(Node::Include { target, pos }))
            }
            _ => Err(ParseError::unknown_tag(pos, name)),
        }
    }

    fn parse_nested(&mut self, end_tags: &[&str]) -> Result<Body, ParseError> {
        self.depth += 1;
        let body = stacker::maybe_grow(RED_ZONE, STACK_SIZE, || self.parse_body(end_tags));
        self.depth -= 1;
        body
    }

    /// Хвост закрывающего тега: `{% endblock name %}` допускает имя.
    fn finish_end_tag(&mut self) -> Result<(), ParseError> {
        if let Token::Name(_) = self.peek()? {
            self.lexer.next_token()?;
        }
        self.expect(Token::CloseTag, "'%}'")
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        stacker::maybe_grow(RED_ZONE, STACK_SIZE, || self.parse_postfix())
    }

    /// Первичное выражение и цепочка `.attr` / `[expr]`.
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.peek()? {
                Token::Dot => {
                    self.lexer.next_token()?;
                    let attr = self.expect_name("attribute name")?;
                    let args = if self.peek()? == Token::LParen {
                        self.lexer.next_token()?;
                        Some(self.parse_args()?)
                    } else {
                        None
                    };
                    expr = Expr::GetAttr {
                        container: Box::new(expr),
                        attr: Box::new(Expr::Str(attr)),
                        args,
                    };
                }
                Token::LBracket => {
                    self.lexer.next_token()?;
                    let attr = self.parse_expr()?;
                    self.expect(Token::RBracket, "']'")?;
                    expr = Expr::GetAttr {
                        container: Box::new(expr),
                        attr: Box::new(attr),
                        args: None,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.lexer.next_token()?;
        let pos = self.lexer.position(token.span.start);

        match token.value {
            Token::Name(name) => Ok(Expr::Name(name)),
            Token::Str(text) => Ok(Expr::Str(text)),
            Token::Number(literal) => Err(ParseError::UnsupportedLiteral { pos, literal }),
            Token::LParen => {
                let expr = self.parse_expr()?;
                self.expect(Token::RParen, "')'")?;
                Ok(expr)
            }
            Token::Eof => Err(ParseError::unexpected_eof(pos, "expected expression")),
            other => Err(ParseError::unexpected_token(pos, "expression", &other)),
        }
    }

    /// Аргументы вызова после `(`.
    fn parse_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if self.peek()? == Token::RParen {
            self.lexer.next_token()?;
            return Ok(args);
        }

        loop {
            args.push(self.parse_expr()?);
            if self.peek()? == Token::Comma {
                self.lexer.next_token()?;
                continue;
            }
            self.expect(Token::RParen, "')'")?;
            return Ok(args);
        }
    }

    fn peek(&mut self) -> Result<Token, ParseError> {
        Ok(self.lexer.peek_token()?.value.clone())
    }

    fn expect(&mut self, expected: Token, description: &str) -> Result<(), ParseError> {
        let token = self.lexer.next_token()?;
        if token.value == expected {
            return Ok(());
        }
        let pos = self.lexer.position(token.span.start);
        Err(ParseError::unexpected_token(pos, description, &token.value))
    }

    fn expect_name(&mut self, description: &str) -> Result<String, ParseError> {
        let token = self.lexer.next_token()?;
        match token.value {
            Token::Name(name) => Ok(name),
            other => {
                let pos = self.lexer.position(token.span.start);
                Err(ParseError::unexpected_token(pos, description, &other))
            }
        }
    }
}
