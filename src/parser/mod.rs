//! Парсер Twig-шаблонов.
//!
//! # Синтаксис
//!
//! ```twig
//! {# комментарий #}
//! {% extends 'layout.twig' %}
//!
//! {% block content %}
//!   Hello, {{ user.name }}!
//!   {% for key, item in items %}{{ item }}{% endfor %}
//!   {% include 'footer.twig' %}
//! {% endblock %}
//! ```
//!
//! # Пример
//!
//! ```rust,ignore
//! use twigc::parser::parse;
//!
//! let module = parse("Hello, {{ name }}!").unwrap();
//! assert_eq!(module.body.nodes.len(), 3);
//! ```

pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use error::ParseError;
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::{LineIndex, Position, Span, Spanned, Token};

use crate::ast::Module;

/// Парсит исходный текст шаблона в синтаксическое дерево.
pub fn parse(source: &str) -> Result<Module, ParseError> {
    Parser::new(source).parse_module()
}
