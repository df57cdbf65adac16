//! Окружение компиляции: активные шаблоны, локальные имена, импорты.

use std::collections::HashSet;

use crate::error::{GenError, GenResult};

/// Стек шаблонов, компилируемых в данный момент.
///
/// Служит и множеством посещённых: повторный вход в активный шаблон
/// означает цикл `extends`/`include`.
#[derive(Debug, Default)]
pub struct ActiveStack {
    names: Vec<String>,
}

impl ActiveStack {
    /// Войти в шаблон.
    pub fn push(&mut self, name: &str) -> GenResult<()> {
        if let Some(start) = self.names.iter().position(|n| n == name) {
            let mut chain: Vec<&str> = self.names[start..].iter().map(String::as_str).collect();
            chain.push(name);
            return Err(GenError::CyclicInheritance(chain.join(" -> ")));
        }
        self.names.push(name.to_string());
        Ok(())
    }

    /// Выйти из последнего шаблона.
    pub fn pop(&mut self) {
        self.names.pop();
    }
}

/// Имена, связанные циклами `for`.
///
/// Стек, а не множество: вложенный цикл может перекрыть имя внешнего,
/// и после выхода внешнее имя должно остаться видимым.
#[derive(Debug, Default)]
pub struct Scope {
    locals: Vec<String>,
}

impl Scope {
    pub fn is_local(&self, name: &str) -> bool {
        self.locals.iter().any(|n| n == name)
    }

    pub fn bind(&mut self, name: impl Into<String>) {
        self.locals.push(name.into());
    }

    /// Текущая глубина, к которой потом возвращает [`Scope::restore`].
    pub fn mark(&self) -> usize {
        self.locals.len()
    }

    pub fn restore(&mut self, mark: usize) {
        self.locals.truncate(mark);
    }
}

/// Упорядоченное множество `use`-путей.
#[derive(Debug, Default)]
pub struct Imports {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl Imports {
    /// Объявить импорт. Возвращает `true`, если он новый.
    pub fn declare(&mut self, path: impl Into<String>) -> bool {
        let path = path.into();
        if self.seen.contains(&path) {
            return false;
        }
        self.seen.insert(path.clone());
        self.order.push(path);
        true
    }

    /// Импорты в порядке первого объявления.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

/// Состояние одного вызова `generate`.
#[derive(Debug, Default)]
pub struct CompileEnv {
    pub active: ActiveStack,
    pub scope: Scope,
    pub imports: Imports,
    counter: usize,
}

impl CompileEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Свежее имя для вспомогательной привязки в сгенерированном коде.
    pub fn fresh_name(&mut self, prefix: &str) -> String {
        let name = format!("{}_{}", prefix, self.counter);
        self.counter += 1;
        name
    }
}
