//! Генерация Rust-кода из шаблонов.
//!
//! Каждый шаблон превращается в модуль с одной публичной функцией
//! рендеринга и по одной функции на каждый блок цепочки наследования.
//! Тела блоков компилируются отложенно, после основного обхода, поэтому
//! переопределения из дочерних шаблонов попадают в функцию, а вызов остаётся
//! там, где его объявил базовый шаблон.
//!
//! ```rust,ignore
//! use twigc::codegen::Generator;
//! use twigc::loader::MemoryLoader;
//!
//! let loader = MemoryLoader::new()
//!     .with_template("layout.twig", "Hello, {% block name %}{% endblock %}!")
//!     .with_template("test.twig", "{% extends 'layout.twig' %}{% block name %}World{% endblock %}");
//!
//! let code = Generator::new(loader).generate("test.twig").unwrap();
//! assert!(code.contains("pub fn template_test_twig(ctx: &Context)"));
//! ```

mod blocks;
mod compiler;
mod expr;
mod output;
mod scope;

pub use blocks::{BlockJob, BlockKey, BlockRegistry, RegisterPolicy, Registration};
pub use expr::{compile_expr, rust_ident, Fragment};
pub use output::{
    assemble, block_function_name, sanitize_identifier, template_function_name, CodeWriter, Function,
};
pub use scope::{ActiveStack, CompileEnv, Imports, Scope};

use log::debug;

use crate::error::GenResult;
use crate::loader::Loader;
use compiler::Compiler;

/// Запас стека перед рекурсивным шагом и размер нового сегмента.
const RED_ZONE: usize = 256 * 1024;
const STACK_SIZE: usize = 8 * 1024 * 1024;

/// Настройки генератора.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Путь к модулю поддержки в сгенерированном коде
    pub runtime_path: String,
    /// Префикс корневой функции шаблона
    pub template_prefix: String,
    /// Префикс функций блоков
    pub block_prefix: String,
    /// Единица отступа
    pub indent: String,
    /// Писать ли комментарии `// line L, offset O in NAME`
    pub trace_comments: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            runtime_path: "twigc::runtime".to_string(),
            template_prefix: "template".to_string(),
            block_prefix: "block".to_string(),
            indent: "    ".to_string(),
            trace_comments: true,
        }
    }
}

impl GeneratorConfig {
    /// Имя, под которым модуль поддержки виден после `use`.
    pub fn runtime_alias(&self) -> &str {
        self.runtime_path
            .rsplit("::")
            .next()
            .unwrap_or(&self.runtime_path)
    }
}

/// Генератор: загрузчик и настройки.
///
/// Изменяемое состояние создаётся заново в каждом вызове
/// [`Generator::generate`], поэтому генератор можно разделять между потоками.
#[derive(Debug, Clone)]
pub struct Generator<L: Loader> {
    loader: L,
    config: GeneratorConfig,
}

impl<L: Loader> Generator<L> {
    pub fn new(loader: L) -> Self {
        Self::with_config(loader, GeneratorConfig::default())
    }

    pub fn with_config(loader: L, config: GeneratorConfig) -> Self {
        Self { loader, config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Сгенерировать модуль для шаблона `name`.
    ///
    /// Первая ошибка прерывает генерацию; частичный результат не возвращается.
    pub fn generate(&self, name: &str) -> GenResult<String> {
        debug!("generating {}", name);
        Compiler::new(&self.loader, &self.config).run(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GenError, RefKind};
    use crate::loader::MemoryLoader;
    use crate::parser::ParseError;
    use crate::runtime::{Context, Value};

    fn generator(templates: &[(&str, &str)]) -> Generator<MemoryLoader> {
        Generator::new(templates.iter().copied().collect())
    }

    fn untraced(templates: &[(&str, &str)]) -> Generator<MemoryLoader> {
        let config = GeneratorConfig {
            trace_comments: false,
            ..GeneratorConfig::default()
        };
        Generator::with_config(templates.iter().copied().collect(), config)
    }

    fn layout() -> Vec<(&'static str, &'static str)> {
        vec![
            ("layout.twig", "Hello, {% block name %}{% endblock %}!"),
            (
                "test.twig",
                "{% extends 'layout.twig' %}{% block name %}World{% endblock %}",
            ),
        ]
    }

    /// Эталонные модули компилируются вместе с тестами.
    mod golden {
        pub mod hello {
            include!("golden/hello.rs");
        }
        pub mod inheritance {
            include!("golden/inheritance.rs");
        }
        pub mod list {
            include!("golden/list.rs");
        }
    }

    fn crate_runtime(templates: &[(&str, &str)]) -> Generator<MemoryLoader> {
        let config = GeneratorConfig {
            runtime_path: "crate::runtime".into(),
            ..GeneratorConfig::default()
        };
        Generator::with_config(templates.iter().copied().collect(), config)
    }

    #[test]
    fn test_hello_world() {
        let code = crate_runtime(&[("hello.twig", "Hello, World!")])
            .generate("hello.twig")
            .unwrap();
        assert_eq!(code, include_str!("golden/hello.rs"));

        golden::hello::template_hello_twig(&Context::new()).unwrap();
    }

    #[test]
    fn test_inheritance_places_override_at_parent_position() {
        let code = crate_runtime(&layout()).generate("test.twig").unwrap();
        assert_eq!(code, include_str!("golden/inheritance.rs"));
        assert_eq!(code.matches("block_layout_twig__name(ctx)?;").count(), 1);

        golden::inheritance::template_test_twig(&Context::new()).unwrap();
    }

    #[test]
    fn test_loop_with_guarded_attribute() {
        let code = crate_runtime(&[(
            "list.twig",
            "{% for key, user in users %}[{{ key }}={{ user.name }}]{% endfor %}",
        )])
        .generate("list.twig")
        .unwrap();
        assert_eq!(code, include_str!("golden/list.rs"));

        let mut ctx = Context::new();
        ctx.insert(
            "users".into(),
            Value::from(vec![Value::from_pairs([("name", "Ann")]), Value::Int(7)]),
        );
        golden::list::template_list_twig(&ctx).unwrap();
    }

    #[test]
    fn test_print_and_loop_are_traced() {
        let code = generator(&[("t.twig", "{{ a }}{% for i in l %}{{ i }}{% endfor %}")])
            .generate("t.twig")
            .unwrap();

        let body = r#"    // line 1, offset 0 in t.twig
    write!(out, "{}", runtime::lookup(ctx, "a"))?;
    // line 1, offset 7 in t.twig
    runtime::iterate(runtime::lookup(ctx, "l"), |_, i, r#loop| {
        // line 1, offset 23 in t.twig
        write!(out, "{}", i)?;
        Ok(false)
    })?;
"#;
        assert!(code.contains(body), "{}", code);
    }

    #[test]
    fn test_layout_alone_has_empty_block() {
        let code = untraced(&layout()).generate("layout.twig").unwrap();
        assert!(code.contains("pub fn template_layout_twig("));
        assert!(code.contains(
            "fn block_layout_twig__name(ctx: &Context) -> std::io::Result<()> {\n    \
             let mut out = std::io::stdout().lock();\n    Ok(())\n}"
        ));
    }

    #[test]
    fn test_for_scope_does_not_leak() {
        let code = untraced(&[(
            "list.twig",
            "{% for k, v in items %}{{ v }}{% endfor %}{{ v }}",
        )])
        .generate("list.twig")
        .unwrap();

        let body = r#"    runtime::iterate(runtime::lookup(ctx, "items"), |k, v, r#loop| {
        write!(out, "{}", v)?;
        Ok(false)
    })?;
    write!(out, "{}", runtime::lookup(ctx, "v"))?;
"#;
        assert!(code.contains(body), "{}", code);
        assert!(code.contains(
            "use twigc::runtime::Context;\nuse twigc::runtime;\nuse std::io::Write;\n"
        ));
    }

    #[test]
    fn test_for_without_key_and_loop_variable() {
        let code = untraced(&[(
            "list.twig",
            "{% for item in items %}{{ loop.index }}{% endfor %}",
        )])
        .generate("list.twig")
        .unwrap();

        assert!(code.contains("|_, item, r#loop| {"));
        assert!(code.contains("let val_0 = runtime::get_attr(r#loop, \"index\");"));
    }

    #[test]
    fn test_nested_loop_shadowing() {
        let code = untraced(&[(
            "nested.twig",
            "{% for x in a %}{% for x in x %}{{ x }}{% endfor %}{{ x }}{% endfor %}{{ x }}",
        )])
        .generate("nested.twig")
        .unwrap();

        assert_eq!(code.matches("write!(out, \"{}\", x)?;").count(), 2);
        assert!(code.contains("runtime::iterate(x, |_, x, r#loop| {"));
        assert!(code.contains("write!(out, \"{}\", runtime::lookup(ctx, \"x\"))?;"));
    }

    #[test]
    fn test_fallible_iterable_is_guarded() {
        let code = untraced(&[("t.twig", "{% for i in user.items %}{{ i }}{% endfor %}")])
            .generate("t.twig")
            .unwrap();

        let body = r#"    {
        let val_0 = runtime::get_attr(runtime::lookup(ctx, "user"), "items");
        if let Ok(val_0) = val_0 {
            runtime::iterate(&val_0, |_, i, r#loop| {
                write!(out, "{}", i)?;
                Ok(false)
            })?;
        }
    }
"#;
        assert!(code.contains(body), "{}", code);
    }

    #[test]
    fn test_attribute_print_is_guarded() {
        let code = untraced(&[("t.twig", "{{ user.name }}")])
            .generate("t.twig")
            .unwrap();

        let body = r#"    {
        let val_0 = runtime::get_attr(runtime::lookup(ctx, "user"), "name");
        if let Ok(val_0) = val_0 {
            write!(out, "{}", val_0)?;
        }
    }
"#;
        assert!(code.contains(body), "{}", code);
    }

    #[test]
    fn test_method_call_is_unsupported() {
        let err = generator(&[("t.twig", "{{ user.name() }}")])
            .generate("t.twig")
            .unwrap_err();
        assert!(matches!(
            err,
            GenError::UnsupportedExpression { ref template, .. } if template == "t.twig"
        ));
    }

    #[test]
    fn test_literal_include_is_inlined() {
        let code = untraced(&[
            ("main.twig", "A{% include 'part.twig' %}B"),
            ("part.twig", "P{{ x }}"),
        ])
        .generate("main.twig")
        .unwrap();

        assert_eq!(code.matches("fn ").count(), 1);
        let body = r#"    write!(out, "{}", "A")?;
    write!(out, "{}", "P")?;
    write!(out, "{}", runtime::lookup(ctx, "x"))?;
    write!(out, "{}", "B")?;
"#;
        assert!(code.contains(body), "{}", code);
    }

    #[test]
    fn test_include_sees_loop_locals() {
        let code = untraced(&[
            ("main.twig", "{% for item in items %}{% include 'row.twig' %}{% endfor %}"),
            ("row.twig", "{{ item }}"),
        ])
        .generate("main.twig")
        .unwrap();
        assert!(code.contains("write!(out, \"{}\", item)?;"));
    }

    #[test]
    fn test_variable_include_is_unresolvable() {
        let err = generator(&[("main.twig", "{% include partial %}")])
            .generate("main.twig")
            .unwrap_err();
        assert!(matches!(
            err,
            GenError::UnresolvableReference { ref template, kind: RefKind::Include } if template == "main.twig"
        ));
    }

    #[test]
    fn test_variable_extends_is_unresolvable() {
        let err = generator(&[("child.twig", "{% extends layout %}")])
            .generate("child.twig")
            .unwrap_err();
        assert!(matches!(
            err,
            GenError::UnresolvableReference { kind: RefKind::Extends, .. }
        ));
    }

    #[test]
    fn test_sanitized_template_name() {
        let code = untraced(&[("a/b-c.twig", "x")]).generate("a/b-c.twig").unwrap();
        assert!(code.contains("pub fn template_a_b_c_twig(ctx: &Context)"));
    }

    #[test]
    fn test_output_is_deterministic() {
        let templates = [
            ("base.twig", "{% block a %}{{ x.y }}{% endblock %}{% block b %}{% for i in l %}{{ i }}{% endfor %}{% endblock %}"),
            ("child.twig", "{% extends 'base.twig' %}{% block b %}{{ z[w] }}{% endblock %}{% block a %}A{% endblock %}"),
        ];
        let gen = generator(&templates);
        let first = gen.generate("child.twig").unwrap();
        let second = gen.generate("child.twig").unwrap();
        assert_eq!(first, second);

        // Функции идут в порядке первой регистрации
        let a = first.find("fn block_base_twig__a(").unwrap();
        let b = first.find("fn block_base_twig__b(").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_three_level_chain() {
        let code = untraced(&[
            ("base.twig", "<{% block a %}base{% endblock %}>"),
            ("mid.twig", "{% extends 'base.twig' %}{% block a %}mid{% endblock %}"),
            ("top.twig", "{% extends 'mid.twig' %}{% block a %}top{% endblock %}"),
        ])
        .generate("top.twig")
        .unwrap();

        assert_eq!(code.matches("fn block_base_twig__a(").count(), 1);
        assert!(code.contains("\"top\""));
        assert!(!code.contains("\"mid\""));
        assert!(!code.contains("\"base\""));
        assert_eq!(code.matches("block_base_twig__a(ctx)?;").count(), 1);
    }

    #[test]
    fn test_middle_template_override() {
        let code = untraced(&[
            ("base.twig", "{% block a %}base{% endblock %}"),
            ("mid.twig", "{% extends 'base.twig' %}{% block a %}mid{% endblock %}"),
            ("top.twig", "{% extends 'mid.twig' %}"),
        ])
        .generate("top.twig")
        .unwrap();
        assert!(code.contains("\"mid\""));
        assert!(code.contains("pub fn template_top_twig("));
    }

    #[test]
    fn test_nested_block_override() {
        let code = untraced(&[
            (
                "base.twig",
                "{% block content %}[{% block inner %}i{% endblock %}]{% endblock %}",
            ),
            ("child.twig", "{% extends 'base.twig' %}{% block inner %}I{% endblock %}"),
        ])
        .generate("child.twig")
        .unwrap();

        let content = r#"fn block_base_twig__content(ctx: &Context) -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    write!(out, "{}", "[")?;
    block_base_twig__inner(ctx)?;
    write!(out, "{}", "]")?;
    Ok(())
}"#;
        assert!(code.contains(content), "{}", code);
        assert!(code.contains("write!(out, \"{}\", \"I\")?;"));
        assert!(!code.contains("\"i\""));
        assert_eq!(code.matches("fn block_base_twig__inner(").count(), 1);
    }

    #[test]
    fn test_nested_block_without_override() {
        let code = untraced(&[(
            "base.twig",
            "{% block content %}[{% block inner %}i{% endblock %}]{% endblock %}",
        )])
        .generate("base.twig")
        .unwrap();

        let content = code.find("fn block_base_twig__content(").unwrap();
        let inner = code.find("fn block_base_twig__inner(").unwrap();
        assert!(content < inner);
        assert!(code.contains("write!(out, \"{}\", \"i\")?;"));
    }

    #[test]
    fn test_child_text_outside_blocks_follows_parent() {
        let code = untraced(&[
            ("layout.twig", "L"),
            ("page.twig", "{% extends 'layout.twig' %}C"),
        ])
        .generate("page.twig")
        .unwrap();
        let l = code.find("\"L\"").unwrap();
        let c = code.find("\"C\"").unwrap();
        assert!(l < c);
    }

    #[test]
    fn test_cyclic_extends() {
        let err = generator(&[
            ("a.twig", "{% extends 'b.twig' %}"),
            ("b.twig", "{% extends 'a.twig' %}"),
        ])
        .generate("a.twig")
        .unwrap_err();
        assert!(matches!(
            err,
            GenError::CyclicInheritance(ref chain) if chain == "a.twig -> b.twig -> a.twig"
        ));
    }

    #[test]
    fn test_self_include_is_cycle() {
        let err = generator(&[("a.twig", "{% include 'a.twig' %}")])
            .generate("a.twig")
            .unwrap_err();
        assert!(matches!(err, GenError::CyclicInheritance(_)));
    }

    #[test]
    fn test_repeated_include_is_not_a_cycle() {
        let code = untraced(&[
            ("main.twig", "{% include 'p.twig' %}{% include 'p.twig' %}"),
            ("p.twig", "p"),
        ])
        .generate("main.twig")
        .unwrap();
        assert_eq!(code.matches("\"p\"").count(), 2);
    }

    #[test]
    fn test_missing_templates() {
        let gen = generator(&[("child.twig", "{% extends 'layout.twig' %}")]);
        assert!(matches!(gen.generate("nope.twig"), Err(GenError::SourceNotFound(name)) if name == "nope.twig"));
        assert!(matches!(gen.generate("child.twig"), Err(GenError::SourceNotFound(name)) if name == "layout.twig"));
    }

    #[test]
    fn test_parse_failure_names_template() {
        let err = generator(&[("bad.twig", "{% block %}")])
            .generate("bad.twig")
            .unwrap_err();
        assert!(matches!(err, GenError::ParseFailure { ref template, .. } if template == "bad.twig"));
    }

    #[test]
    fn test_duplicate_block_is_parse_failure() {
        let gen = generator(&[
            ("sibling.twig", "{% block a %}{% endblock %}{% block a %}{% endblock %}"),
            ("nested.twig", "{% block a %}{% block a %}{% endblock %}{% endblock %}"),
            ("layout.twig", "{% block a %}{% endblock %}"),
            (
                "child.twig",
                "{% extends 'layout.twig' %}{% block a %}{% block b %}{% endblock %}{% endblock %}{% block b %}{% endblock %}",
            ),
        ]);
        for name in ["sibling.twig", "nested.twig", "child.twig"] {
            let err = gen.generate(name).unwrap_err();
            assert!(
                matches!(
                    err,
                    GenError::ParseFailure { ref template, source: ParseError::DuplicateBlock { .. } } if template == name
                ),
                "{}: {:?}",
                name,
                err
            );
        }
    }

    #[test]
    fn test_deeply_nested_loops() {
        let depth = 5000;
        let source = format!(
            "{}{{{{ x }}}}{}",
            "{% for x in xs %}".repeat(depth),
            "{% endfor %}".repeat(depth)
        );
        let config = GeneratorConfig {
            indent: String::new(),
            trace_comments: false,
            ..GeneratorConfig::default()
        };
        let loader = MemoryLoader::new().with_template("deep.twig", source);
        let code = Generator::with_config(loader, config).generate("deep.twig").unwrap();

        assert_eq!(code.matches("runtime::iterate(").count(), depth);
        assert_eq!(code.matches("Ok(false)").count(), depth);
        assert_eq!(code.matches("write!(out, \"{}\", x)?;").count(), 1);
    }

    #[test]
    fn test_colliding_roots_get_distinct_functions() {
        let code = untraced(&[
            ("nav.twig", "{% block a %}1{% endblock %}{% include 'c.twig' %}"),
            ("c.twig", "{% extends 'Nav.twig' %}"),
            ("Nav.twig", "{% block a %}2{% endblock %}"),
        ])
        .generate("nav.twig")
        .unwrap();

        assert_eq!(code.matches("fn block_nav_twig__a(").count(), 1);
        assert_eq!(code.matches("fn block_nav_twig__a_2(").count(), 1);
        assert_eq!(code.matches("block_nav_twig__a(ctx)?;").count(), 1);
        assert_eq!(code.matches("block_nav_twig__a_2(ctx)?;").count(), 1);

        let first = code.find("fn block_nav_twig__a(").unwrap();
        let second = code.find("fn block_nav_twig__a_2(").unwrap();
        let one = code.find("\"1\"").unwrap();
        let two = code.find("\"2\"").unwrap();
        assert!(first < one && one < second && second < two, "{}", code);
    }

    #[test]
    fn test_custom_config() {
        let config = GeneratorConfig {
            runtime_path: "crate::rt".into(),
            template_prefix: "render".into(),
            block_prefix: "part".into(),
            indent: "\t".into(),
            trace_comments: false,
        };
        assert_eq!(config.runtime_alias(), "rt");

        let loader: MemoryLoader = layout().into_iter().collect();
        let code = Generator::with_config(loader, config).generate("test.twig").unwrap();
        assert!(code.contains("use crate::rt::Context;\n"));
        assert!(code.contains("pub fn render_test_twig(ctx: &Context)"));
        assert!(code.contains("\tpart_layout_twig__name(ctx)?;\n"));
    }

    #[test]
    fn test_generator_is_shareable() {
        let gen = generator(&layout());
        let expected = gen.generate("test.twig").unwrap();
        let gen = &gen;
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(move || gen.generate("test.twig").unwrap()))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }
}
