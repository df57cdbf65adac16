//! Источники шаблонов.
//!
//! Генератор получает исходный текст шаблона по имени через трейт [`Loader`].
//!
//! ```rust,ignore
//! use twigc::loader::{Loader, MemoryLoader};
//!
//! let loader = MemoryLoader::new().with_template("hello.twig", "Hello, World!");
//! assert_eq!(loader.load("hello.twig").unwrap(), "Hello, World!");
//! ```

mod filesystem;
mod memory;

pub use filesystem::FilesystemLoader;
pub use memory::MemoryLoader;

use crate::error::GenResult;

/// Хранилище исходников шаблонов.
pub trait Loader {
    /// Загрузить исходный текст шаблона по имени.
    ///
    /// Если шаблона нет, возвращает [`GenError::SourceNotFound`](crate::error::GenError::SourceNotFound).
    fn load(&self, name: &str) -> GenResult<String>;
}

impl<L: Loader + ?Sized> Loader for &L {
    fn load(&self, name: &str) -> GenResult<String> {
        (**self).load(name)
    }
}

impl<L: Loader + ?Sized> Loader for Box<L> {
    fn load(&self, name: &str) -> GenResult<String> {
        (**self).load(name)
    }
}
