//! Шаблоны в памяти.

use std::collections::HashMap;

use super::Loader;
use crate::error::{GenError, GenResult};

/// Загрузчик из словаря имя → текст.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    templates: HashMap<String, String>,
}

impl MemoryLoader {
    /// Создать пустой загрузчик.
    pub fn new() -> Self {
        Self::default()
    }

    /// Добавить шаблон (builder).
    pub fn with_template(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(name, source);
        self
    }

    /// Добавить или заменить шаблон.
    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.templates.insert(name.into(), source.into());
    }

    /// Количество шаблонов.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl<N: Into<String>, S: Into<String>> FromIterator<(N, S)> for MemoryLoader {
    fn from_iter<I: IntoIterator<Item = (N, S)>>(iter: I) -> Self {
        let mut loader = MemoryLoader::new();
        for (name, source) in iter {
            loader.insert(name, source);
        }
        loader
    }
}

impl Loader for MemoryLoader {
    fn load(&self, name: &str) -> GenResult<String> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| GenError::SourceNotFound(name.to_string()))
    }
}
