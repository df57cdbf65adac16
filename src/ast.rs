//! Синтаксическое дерево шаблона.

use crate::parser::token::Position;
use serde::{Deserialize, Serialize};

/// Корень дерева: один шаблон.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Module {
    /// Ссылка на родительский шаблон (`{% extends %}`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Extends>,
    pub body: Body,
}

/// Ссылка `{% extends <target> %}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extends {
    pub target: Expr,
    pub pos: Position,
}

/// Упорядоченная последовательность узлов.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Body {
    pub nodes: Vec<Node>,
}

impl Body {
    /// Создать тело из списка узлов.
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Пустое ли тело.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Удаление без рекурсии: глубина вложенности тел не ограничена стеком.
impl Drop for Body {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.nodes);
        while let Some(node) = pending.pop() {
            if let Node::Block { mut body, .. } | Node::For { mut body, .. } = node {
                pending.append(&mut body.nodes);
            }
        }
    }
}

/// Узел шаблона.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Литеральный текст.
    Text { data: String, pos: Position },
    /// `{{ expr }}`
    Print { expr: Expr, pos: Position },
    /// `{% block name %} ... {% endblock %}`
    Block {
        name: String,
        body: Body,
        pos: Position,
    },
    /// `{% for [key,] value in iterable %} ... {% endfor %}`
    For {
        key: Option<String>,
        value: String,
        iterable: Expr,
        body: Body,
        pos: Position,
    },
    /// `{% include target %}`
    Include { target: Expr, pos: Position },
}

impl Node {
    /// Позиция узла в исходнике.
    pub fn pos(&self) -> Position {
        match self {
            Node::Text { pos, .. }
            | Node::Print { pos, .. }
            | Node::Block { pos, .. }
            | Node::For { pos, .. }
            | Node::Include { pos, .. } => *pos,
        }
    }
}

/// Выражение.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Имя переменной.
    Name(String),
    /// Строковый литерал.
    Str(String),
    /// Доступ к атрибуту: `container.attr`, `container[attr]`
    /// или вызов `container.attr(args)` (тогда `args` равно `Some`).
    GetAttr {
        container: Box<Expr>,
        attr: Box<Expr>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        args: Option<Vec<Expr>>,
    },
}

impl Expr {
    /// Значение выражения, известное на этапе компиляции (только строковые литералы).
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Expr::Str(text) => Some(text),
            _ => None,
        }
    }
}
