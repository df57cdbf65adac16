//! Шаблоны на диске.
//!
//! Отвечает за поиск файла шаблона по имени в путях поиска.

use std::fs;
use std::path::{Component, Path, PathBuf};

use log::debug;

use super::Loader;
use crate::error::{GenError, GenResult};

/// Загрузчик из файловой системы.
#[derive(Debug, Clone)]
pub struct FilesystemLoader {
    /// Пути поиска (в порядке приоритета)
    search_paths: Vec<PathBuf>,
    /// Расширения, которые пробуются, если точного файла нет
    extensions: Vec<String>,
}

impl FilesystemLoader {
    /// Создать загрузчик с одним корневым каталогом.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_search_paths(vec![root.into()])
    }

    /// Создать загрузчик с путями поиска.
    pub fn with_search_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            search_paths: paths,
            extensions: vec!["twig".to_string()],
        }
    }

    /// Добавить путь поиска.
    pub fn add_search_path(&mut self, path: PathBuf) {
        if !self.search_paths.contains(&path) {
            self.search_paths.push(path);
        }
    }

    /// Заменить список расширений.
    pub fn set_extensions(&mut self, extensions: Vec<String>) {
        self.extensions = extensions;
    }

    /// Получить все пути поиска.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Разрешить имя шаблона в путь к файлу.
    pub fn resolve(&self, name: &str) -> GenResult<PathBuf> {
        // Имя не должно выводить за пределы путей поиска
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
        if name.is_empty() || escapes {
            return Err(GenError::SourceNotFound(name.to_string()));
        }

        for search_path in &self.search_paths {
            if let Some(path) = self.find_in_dir(search_path, relative) {
                return Ok(path);
            }
        }

        Err(GenError::SourceNotFound(name.to_string()))
    }

    fn find_in_dir(&self, dir: &Path, relative: &Path) -> Option<PathBuf> {
        let exact = dir.join(relative);
        let with_extensions = self.extensions.iter().map(|ext| {
            let mut file = exact.clone().into_os_string();
            file.push(".");
            file.push(ext);
            PathBuf::from(file)
        });

        std::iter::once(exact.clone())
            .chain(with_extensions)
            .find(|candidate| candidate.is_file())
    }
}

impl Default for FilesystemLoader {
    fn default() -> Self {
        Self::new(".")
    }
}

impl Loader for FilesystemLoader {
    fn load(&self, name: &str) -> GenResult<String> {
        let path = self.resolve(name)?;
        debug!("loading template {} from {}", name, path.display());
        fs::read_to_string(&path)
            .map_err(|e| GenError::Io(format!("Failed to read {}: {}", path.display(), e)))
    }
}
