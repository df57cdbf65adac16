//! # twigc
//!
//! Компилятор Twig-шаблонов в исходный код на Rust.
//!
//! Шаблон (вместе с родителями по `extends` и подключёнными через `include`
//! шаблонами) превращается в Rust-модуль: публичную функцию рендеринга
//! и по функции на каждый блок. Сгенерированный код пишет в stdout и
//! опирается на модуль [`runtime`].
//!
//! ## Основные модули
//!
//! - [`parser`] - лексер и парсер шаблонов
//! - [`ast`] - синтаксическое дерево
//! - [`loader`] - источники шаблонов (память, файловая система)
//! - [`codegen`] - генерация кода
//! - [`runtime`] - поддержка времени выполнения для сгенерированного кода
//!
//! ## Пример
//!
//! ```rust,ignore
//! use twigc::{Generator, MemoryLoader};
//!
//! let loader = MemoryLoader::new().with_template("hello.twig", "Hello, {{ name }}!");
//! let code = Generator::new(loader).generate("hello.twig").unwrap();
//! assert!(code.contains("pub fn template_hello_twig"));
//! ```

pub mod ast;
pub mod codegen;
pub mod error;
pub mod loader;
pub mod parser;
pub mod runtime;

// === Re-exports для удобства ===
pub use ast::{Expr, Module, Node};
pub use codegen::{sanitize_identifier, Generator, GeneratorConfig};
pub use error::{GenError, GenResult, RefKind};
pub use loader::{FilesystemLoader, Loader, MemoryLoader};
pub use parser::{parse, ParseError};
