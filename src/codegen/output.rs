//! Запись и сборка выходного Rust-модуля.

use super::GeneratorConfig;

/// Построчный буфер кода с отступами.
#[derive(Debug, Clone)]
pub struct CodeWriter {
    buf: String,
    unit: String,
    depth: usize,
}

impl CodeWriter {
    pub fn new(unit: impl Into<String>, depth: usize) -> Self {
        Self {
            buf: String::new(),
            unit: unit.into(),
            depth,
        }
    }

    /// Записать строку на текущем уровне отступа.
    pub fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.depth {
            self.buf.push_str(&self.unit);
        }
        self.buf.push_str(text.as_ref());
        self.buf.push('\n');
    }

    /// Записать строку и увеличить отступ (`{` в конце).
    pub fn open(&mut self, text: impl AsRef<str>) {
        self.line(text);
        self.depth += 1;
    }

    /// Уменьшить отступ и записать строку.
    pub fn close(&mut self, text: impl AsRef<str>) {
        self.depth = self.depth.saturating_sub(1);
        self.line(text);
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

/// Привести имя шаблона или блока к идентификатору Rust.
///
/// Каждая максимальная серия символов вне `[A-Za-z0-9]` (включая `_`)
/// превращается в один `_`, буквы приводятся к нижнему регистру.
/// Повторное применение ничего не меняет.
pub fn sanitize_identifier(name: &str) -> String {
    let parts: Vec<String> = name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();

    if parts.is_empty() {
        "unnamed".to_string()
    } else {
        parts.join("_")
    }
}

/// Имя корневой функции рендеринга шаблона.
pub fn template_function_name(config: &GeneratorConfig, template: &str) -> String {
    format!("{}_{}", config.template_prefix, sanitize_identifier(template))
}

/// Базовое имя функции блока. Двойное подчёркивание разделяет корень
/// и блок; пары, совпавшие после санитизации, различает
/// [`BlockRegistry`](super::BlockRegistry).
pub fn block_function_name(config: &GeneratorConfig, root: &str, block: &str) -> String {
    format!(
        "{}_{}__{}",
        config.block_prefix,
        sanitize_identifier(root),
        sanitize_identifier(block)
    )
}

/// Скомпилированная функция: имя и тело (уже с отступом).
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub body: String,
}

/// Собрать итоговый текст модуля.
pub fn assemble<'a>(
    config: &GeneratorConfig,
    source: &str,
    imports: impl Iterator<Item = &'a str>,
    blocks: &[Function],
    root: &Function,
) -> String {
    let mut out = CodeWriter::new(config.indent.clone(), 0);
    out.line(format!(
        "// Code generated by twigc from {:?}. DO NOT EDIT.",
        source
    ));
    out.line("");
    for path in imports {
        out.line(format!("use {};", path));
    }

    for block in blocks {
        out.line("");
        out.line("#[allow(dead_code, non_snake_case, unused_mut, unused_variables)]");
        write_function(&mut out, "fn", block);
    }

    out.line("");
    out.line("#[allow(unused_mut, unused_variables)]");
    write_function(&mut out, "pub fn", root);

    out.into_string()
}

fn write_function(out: &mut CodeWriter, keyword: &str, function: &Function) {
    out.open(format!(
        "{} {}(ctx: &Context) -> std::io::Result<()> {{",
        keyword, function.name
    ));
    out.line("let mut out = std::io::stdout().lock();");
    // Тело уже записано с отступом на уровень функции
    out.buf.push_str(&function.body);
    out.line("Ok(())");
    out.close("}");
}
