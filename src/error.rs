//! Определения ошибок генератора.

use crate::parser::ParseError;
use thiserror::Error;

/// Основной тип `Result` для библиотеки.
pub type GenResult<T> = Result<T, GenError>;

/// Вид ссылки на другой шаблон.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Extends,
    Include,
}

impl std::fmt::Display for RefKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefKind::Extends => write!(f, "extends"),
            RefKind::Include => write!(f, "include"),
        }
    }
}

/// Перечисление всех возможных ошибок генерации.
#[derive(Error, Debug)]
pub enum GenError {
    #[error("Template not found: {0}")]
    SourceNotFound(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error in {template}: {source}")]
    ParseFailure {
        template: String,
        #[source]
        source: ParseError,
    },

    #[error("Unable to evaluate {kind} reference in {template}: only string literals are supported")]
    UnresolvableReference { template: String, kind: RefKind },

    #[error("Unsupported expression in {template}: {message}")]
    UnsupportedExpression { template: String, message: String },

    #[error("Circular template reference detected: {0}")]
    CyclicInheritance(String),
}

impl GenError {
    pub fn unresolvable(template: impl Into<String>, kind: RefKind) -> Self {
        Self::UnresolvableReference {
            template: template.into(),
            kind,
        }
    }

    pub fn unsupported(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnsupportedExpression {
            template: template.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Position;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            GenError::unresolvable("child.twig", RefKind::Extends).to_string(),
            "Unable to evaluate extends reference in child.twig: only string literals are supported"
        );
        assert_eq!(
            GenError::CyclicInheritance("a -> b -> a".into()).to_string(),
            "Circular template reference detected: a -> b -> a"
        );
    }

    #[test]
    fn test_parse_failure_keeps_source() {
        let err = GenError::ParseFailure {
            template: "bad.twig".into(),
            source: ParseError::UnclosedComment {
                pos: Position::new(1, 0),
            },
        };
        assert_eq!(
            err.to_string(),
            "Parse error in bad.twig: Unclosed comment at line 1, offset 0"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
