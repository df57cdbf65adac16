//! Реестр блоков: отложенная компиляция тел `{% block %}`.
//!
//! Тела блоков не компилируются в месте объявления. Генератор регистрирует
//! задание, а после основного обхода компилирует все ожидающие задания
//! в отдельные функции. Порядок функций совпадает с порядком слотов, то есть
//! с порядком первой регистрации.
//!
//! Имя функции слот получает при первой регистрации. Если санитизация
//! свела два разных ключа к одному имени (`Nav.twig` и `nav.twig`),
//! более поздний ключ получает суффикс `_2`, `_3` и так далее.

use std::collections::{HashMap, HashSet};

use log::debug;

use super::output::{block_function_name, Function};
use super::GeneratorConfig;
use crate::ast::Body;
use crate::parser::Position;

/// Ключ блока: корень цепочки наследования и имя блока.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockKey {
    pub root: String,
    pub name: String,
}

impl BlockKey {
    pub fn new(root: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            name: name.into(),
        }
    }
}

/// Задание на компиляцию тела блока.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockJob {
    pub key: BlockKey,
    pub body: Body,
    /// Шаблон, в котором объявлено тело
    pub template: String,
    /// Расстояние по `extends` от запрошенного шаблона
    pub level: usize,
    pub pos: Position,
}

/// Правило замены уже зарегистрированного блока.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterPolicy {
    /// Основной обход: побеждает уровень не выше существующего.
    Override,
    /// Блок внутри откладываемого тела: побеждает только строго более
    /// производный шаблон.
    Nested,
}

impl RegisterPolicy {
    fn replaces(self, new_level: usize, existing_level: usize) -> bool {
        match self {
            RegisterPolicy::Override => new_level <= existing_level,
            RegisterPolicy::Nested => new_level < existing_level,
        }
    }
}

/// Результат регистрации.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    New,
    Replaced,
    Kept,
}

#[derive(Debug)]
struct Slot {
    job: BlockJob,
    function: String,
    generation: u64,
    compiled: Option<String>,
}

/// Задание, ожидающее компиляции.
#[derive(Debug, Clone)]
pub struct PendingJob {
    pub slot: usize,
    pub generation: u64,
    pub job: BlockJob,
}

/// Реестр блоков одного вызова `generate`.
#[derive(Debug, Default)]
pub struct BlockRegistry {
    slots: Vec<Slot>,
    index: HashMap<BlockKey, usize>,
    /// Занятые имена функций
    functions: HashSet<String>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Зарегистрировать задание.
    ///
    /// Замена сохраняет слот (и позицию функции в выводе) и сбрасывает
    /// скомпилированное тело.
    pub fn register(
        &mut self,
        job: BlockJob,
        policy: RegisterPolicy,
        config: &GeneratorConfig,
    ) -> Registration {
        match self.index.get(&job.key) {
            Some(&slot) => {
                let existing = &mut self.slots[slot];
                if !policy.replaces(job.level, existing.job.level) {
                    return Registration::Kept;
                }
                existing.job = job;
                existing.generation += 1;
                existing.compiled = None;
                Registration::Replaced
            }
            None => {
                let function = self.unique_function_name(config, &job.key);
                self.index.insert(job.key.clone(), self.slots.len());
                self.slots.push(Slot {
                    job,
                    function,
                    generation: 0,
                    compiled: None,
                });
                Registration::New
            }
        }
    }

    /// Первое задание без скомпилированного тела.
    pub fn next_pending(&self) -> Option<PendingJob> {
        self.slots
            .iter()
            .enumerate()
            .find(|(_, slot)| slot.compiled.is_none())
            .map(|(i, slot)| PendingJob {
                slot: i,
                generation: slot.generation,
                job: slot.job.clone(),
            })
    }

    /// Сохранить тело. Если задание было заменено во время компиляции,
    /// тело устарело и отбрасывается.
    pub fn complete(&mut self, slot: usize, generation: u64, body: String) {
        if let Some(s) = self.slots.get_mut(slot) {
            if s.generation == generation {
                s.compiled = Some(body);
            } else {
                debug!("discarding stale body of block {}", s.job.key.name);
            }
        }
    }

    /// Имя функции зарегистрированного блока.
    pub fn function_name(&self, key: &BlockKey) -> Option<&str> {
        self.index.get(key).map(|&slot| self.slots[slot].function.as_str())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Функции блоков в порядке слотов.
    pub fn into_functions(self) -> Vec<Function> {
        self.slots
            .into_iter()
            .map(|slot| Function {
                name: slot.function,
                body: slot.compiled.unwrap_or_default(),
            })
            .collect()
    }

    fn unique_function_name(&mut self, config: &GeneratorConfig, key: &BlockKey) -> String {
        let base = block_function_name(config, &key.root, &key.name);
        let mut name = base.clone();
        let mut suffix = 2;
        while self.functions.contains(&name) {
            name = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        if name != base {
            debug!("block {} of {} renamed to {}", key.name, key.root, name);
        }
        self.functions.insert(name.clone());
        name
    }
}
