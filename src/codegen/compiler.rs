//! Рекурсивный обход шаблонов.
//!
//! Один [`Compiler`] живёт ровно один вызов `generate`: он держит окружение,
//! реестр блоков и буфер корневой функции, поэтому независимые вызовы
//! не разделяют изменяемого состояния.

use std::mem;

use log::debug;

use super::blocks::{BlockJob, BlockKey, BlockRegistry, RegisterPolicy, Registration};
use super::expr::{compile_expr, rust_ident, Fragment};
use super::output::{assemble, template_function_name, CodeWriter, Function};
use super::scope::CompileEnv;
use super::{GeneratorConfig, RED_ZONE, STACK_SIZE};
use crate::ast::{Body, Expr, Node};
use crate::error::{GenError, GenResult, RefKind};
use crate::loader::Loader;
use crate::parser::{self, Position};

const WRITE_TRAIT: &str = "std::io::Write";

/// Контекст компиляции одного шаблона.
#[derive(Debug, Clone)]
struct Frame {
    /// Шаблон, из которого взяты узлы
    template: String,
    /// Корень цепочки наследования (ключ блоков)
    root: String,
    level: usize,
    /// Вставлять ли вызов функции блока на месте объявления
    places_blocks: bool,
}

/// Как шаблон был достигнут.
#[derive(Clone, Copy)]
enum Link<'a> {
    /// Запрошен напрямую.
    Top,
    /// Родитель шаблона уровня `child_level`.
    Extends { child_level: usize },
    /// Подключён через `include` из этого кадра.
    Include(&'a Frame),
}

pub(super) struct Compiler<'g, L: Loader> {
    loader: &'g L,
    config: &'g GeneratorConfig,
    env: CompileEnv,
    blocks: BlockRegistry,
    out: CodeWriter,
    policy: RegisterPolicy,
}

impl<'g, L: Loader> Compiler<'g, L> {
    pub fn new(loader: &'g L, config: &'g GeneratorConfig) -> Self {
        Self {
            loader,
            config,
            env: CompileEnv::new(),
            blocks: BlockRegistry::new(),
            out: CodeWriter::new(config.indent.clone(), 1),
            policy: RegisterPolicy::Override,
        }
    }

    /// Скомпилировать шаблон `name` в текст модуля.
    pub fn run(mut self, name: &str) -> GenResult<String> {
        self.env
            .imports
            .declare(format!("{}::Context", self.config.runtime_path));

        self.compile_template(name, Link::Top)?;
        self.flush()?;

        let Compiler {
            config,
            env,
            blocks,
            out,
            ..
        } = self;
        let root = Function {
            name: template_function_name(config, name),
            body: out.into_string(),
        };
        let functions = blocks.into_functions();
        Ok(assemble(config, name, env.imports.iter(), &functions, &root))
    }

    /// Войти в шаблон, скомпилировать его и выйти. Возвращает корень
    /// цепочки наследования.
    fn compile_template(&mut self, name: &str, link: Link<'_>) -> GenResult<String> {
        self.env.active.push(name)?;
        let result = self.compile_module(name, link);
        self.env.active.pop();
        result
    }

    fn compile_module(&mut self, name: &str, link: Link<'_>) -> GenResult<String> {
        let source = self.loader.load(name)?;
        let module = parser::parse(&source).map_err(|source| GenError::ParseFailure {
            template: name.to_string(),
            source,
        })?;

        let level = match link {
            Link::Top => 0,
            Link::Extends { child_level } => child_level + 1,
            Link::Include(includer) => includer.level,
        };
        debug!("compiling template {} at level {}", name, level);

        let frame = match &module.parent {
            Some(parent) => {
                let target = parent
                    .target
                    .as_literal()
                    .ok_or_else(|| GenError::unresolvable(name, RefKind::Extends))?;
                let root = self.compile_template(target, Link::Extends { child_level: level })?;
                Frame {
                    template: name.to_string(),
                    root,
                    level,
                    places_blocks: false,
                }
            }
            None => {
                let (root, places_blocks) = match link {
                    Link::Include(includer) => (includer.root.clone(), includer.places_blocks),
                    _ => (name.to_string(), true),
                };
                Frame {
                    template: name.to_string(),
                    root,
                    level,
                    places_blocks,
                }
            }
        };

        self.compile_body(&frame, &module.body)?;
        Ok(frame.root)
    }

    fn compile_body(&mut self, frame: &Frame, body: &Body) -> GenResult<()> {
        for node in &body.nodes {
            stacker::maybe_grow(RED_ZONE, STACK_SIZE, || self.compile_node(frame, node))?;
        }
        Ok(())
    }

    fn compile_node(&mut self, frame: &Frame, node: &Node) -> GenResult<()> {
        match node {
            Node::Text { data, pos } => {
                self.trace(frame, *pos);
                self.env.imports.declare(WRITE_TRAIT);
                self.out.line(format!("write!(out, \"{{}}\", {:?})?;", data));
                Ok(())
            }
            Node::Print { expr, pos } => {
                self.trace(frame, *pos);
                let fragment = self.expr(frame, expr)?;
                self.env.imports.declare(WRITE_TRAIT);
                match fragment {
                    Fragment::Fallible(code) => {
                        let val = self.env.fresh_name("val");
                        self.open_guard(&val, &code);
                        self.out.line(format!("write!(out, \"{{}}\", {})?;", val));
                        self.close_guard();
                    }
                    other => self
                        .out
                        .line(format!("write!(out, \"{{}}\", {})?;", other.code())),
                }
                Ok(())
            }
            Node::Block { name, body, pos } => {
                let key = self.register_block(frame, name, body, *pos);
                if frame.places_blocks {
                    self.trace(frame, *pos);
                    if let Some(function) = self.blocks.function_name(&key) {
                        let call = format!("{}(ctx)?;", function);
                        self.out.line(call);
                    }
                }
                Ok(())
            }
            Node::For {
                key,
                value,
                iterable,
                body,
                pos,
            } => {
                self.trace(frame, *pos);
                self.compile_for(frame, key.as_deref(), value, iterable, body)
            }
            Node::Include { target, .. } => {
                let target = target
                    .as_literal()
                    .ok_or_else(|| GenError::unresolvable(&frame.template, RefKind::Include))?;
                self.compile_template(target, Link::Include(frame))?;
                Ok(())
            }
        }
    }

    fn compile_for(
        &mut self,
        frame: &Frame,
        key: Option<&str>,
        value: &str,
        iterable: &Expr,
        body: &Body,
    ) -> GenResult<()> {
        // Коллекция вычисляется до связывания имён цикла
        let iterable = self.expr(frame, iterable)?;
        let config = self.config;
        self.env.imports.declare(config.runtime_path.clone());
        let runtime = config.runtime_alias();

        let guard = match &iterable {
            Fragment::Fallible(code) => {
                let val = self.env.fresh_name("val");
                self.open_guard(&val, code);
                Some(format!("&{}", val))
            }
            _ => None,
        };
        let collection = guard.clone().unwrap_or_else(|| iterable.value_ref(runtime));

        // Более позднее имя перекрывает одноимённое раннее
        let names = [key, Some(value), Some("loop")];
        let params: Vec<String> = names
            .iter()
            .enumerate()
            .map(|(i, name)| match name {
                Some(name) if !names[i + 1..].contains(&Some(*name)) => rust_ident(name),
                _ => "_".to_string(),
            })
            .collect();

        self.out.open(format!(
            "{}::iterate({}, |{}| {{",
            runtime,
            collection,
            params.join(", ")
        ));

        let mark = self.env.scope.mark();
        for name in names.iter().flatten() {
            self.env.scope.bind(*name);
        }
        let result = self.compile_body(frame, body);
        self.env.scope.restore(mark);
        result?;

        self.out.line("Ok(false)");
        self.out.close("})?;");
        if guard.is_some() {
            self.close_guard();
        }
        Ok(())
    }

    /// `{ let val = <code>; if let Ok(val) = val {`
    fn open_guard(&mut self, val: &str, code: &str) {
        self.out.open("{");
        self.out.line(format!("let {} = {};", val, code));
        self.out.open(format!("if let Ok({}) = {} {{", val, val));
    }

    fn close_guard(&mut self) {
        self.out.close("}");
        self.out.close("}");
    }

    fn register_block(&mut self, frame: &Frame, name: &str, body: &Body, pos: Position) -> BlockKey {
        let key = BlockKey::new(frame.root.clone(), name);
        let job = BlockJob {
            key: key.clone(),
            body: body.clone(),
            template: frame.template.clone(),
            level: frame.level,
            pos,
        };
        match self.blocks.register(job, self.policy, self.config) {
            Registration::New => debug!("registered block {} from {}", name, frame.template),
            Registration::Replaced => debug!("block {} overridden by {}", name, frame.template),
            Registration::Kept => debug!("block {} from {} is already overridden", name, frame.template),
        }
        key
    }

    /// Скомпилировать все отложенные тела блоков.
    fn flush(&mut self) -> GenResult<()> {
        self.policy = RegisterPolicy::Nested;
        debug!("flushing {} block(s)", self.blocks.len());

        while let Some(pending) = self.blocks.next_pending() {
            let body = self.compile_deferred(&pending.job)?;
            self.blocks.complete(pending.slot, pending.generation, body);
        }
        Ok(())
    }

    fn compile_deferred(&mut self, job: &BlockJob) -> GenResult<String> {
        let frame = Frame {
            template: job.template.clone(),
            root: job.key.root.clone(),
            level: job.level,
            places_blocks: true,
        };

        self.env.active.push(&job.template)?;
        let saved = mem::replace(&mut self.out, CodeWriter::new(self.config.indent.clone(), 1));
        let mark = self.env.scope.mark();

        let result = self.compile_body(&frame, &job.body);

        self.env.scope.restore(mark);
        let writer = mem::replace(&mut self.out, saved);
        self.env.active.pop();

        result.map(|()| writer.into_string())
    }

    fn expr(&mut self, frame: &Frame, expr: &Expr) -> GenResult<Fragment> {
        compile_expr(&mut self.env, self.config, &frame.template, expr)
    }

    fn trace(&mut self, frame: &Frame, pos: Position) {
        if self.config.trace_comments {
            self.out.line(format!("// {} in {}", pos, frame.template));
        }
    }
}
