//! Компиляция выражений шаблона в фрагменты Rust-кода.

use super::scope::CompileEnv;
use super::{GeneratorConfig, RED_ZONE, STACK_SIZE};
use crate::ast::Expr;
use crate::error::{GenError, GenResult};

/// Скомпилированное выражение.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Выражение типа `&Value`
    Value(String),
    /// Строковый литерал `&'static str`
    Literal(String),
    /// Выражение типа `Result<Value, AttrError>`
    Fallible(String),
}

impl Fragment {
    pub fn code(&self) -> &str {
        match self {
            Fragment::Value(code) | Fragment::Literal(code) | Fragment::Fallible(code) => code,
        }
    }

    /// Выражение типа `&Value` для безошибочного фрагмента.
    pub fn value_ref(&self, runtime: &str) -> String {
        match self {
            Fragment::Literal(lit) => format!("&{}::Value::from({})", runtime, lit),
            other => other.code().to_string(),
        }
    }

    /// Выражение типа `&str` для безошибочного фрагмента.
    fn str_ref(&self) -> String {
        match self {
            Fragment::Value(code) => format!("&{}.to_string()", code),
            other => other.code().to_string(),
        }
    }
}

const KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "else", "enum", "extern", "false", "fn", "for", "if",
    "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return", "static",
    "struct", "trait", "true", "type", "unsafe", "use", "where", "while", "async", "await", "dyn",
    "abstract", "become", "box", "do", "final", "macro", "override", "priv", "typeof", "unsized",
    "virtual", "yield", "try", "gen",
];

/// Имена, которые нельзя сделать raw-идентификаторами, и имена,
/// занятые сгенерированной функцией.
const RESERVED: &[&str] = &["self", "Self", "super", "crate", "_", "ctx", "out"];

/// Идентификатор Rust для имени переменной шаблона.
pub fn rust_ident(name: &str) -> String {
    if RESERVED.contains(&name) {
        format!("{}_", name)
    } else if KEYWORDS.contains(&name) {
        format!("r#{}", name)
    } else {
        name.to_string()
    }
}

/// Скомпилировать выражение.
///
/// `template` нужен только для сообщений об ошибках.
pub fn compile_expr(
    env: &mut CompileEnv,
    config: &GeneratorConfig,
    template: &str,
    expr: &Expr,
) -> GenResult<Fragment> {
    match expr {
        Expr::Name(name) => {
            if env.scope.is_local(name) {
                return Ok(Fragment::Value(rust_ident(name)));
            }
            env.imports.declare(config.runtime_path.clone());
            Ok(Fragment::Value(format!(
                "{}::lookup(ctx, {:?})",
                config.runtime_alias(),
                name
            )))
        }
        Expr::Str(text) => Ok(Fragment::Literal(format!("{:?}", text))),
        Expr::GetAttr {
            container,
            attr,
            args,
        } => {
            if args.is_some() {
                return Err(GenError::unsupported(template, "method calls are unsupported"));
            }
            let (container, attr) = stacker::maybe_grow(RED_ZONE, STACK_SIZE, || {
                let container = compile_expr(env, config, template, container)?;
                let attr = compile_expr(env, config, template, attr)?;
                Ok::<_, GenError>((container, attr))
            })?;
            env.imports.declare(config.runtime_path.clone());
            Ok(get_attr(env, config.runtime_alias(), container, attr))
        }
    }
}

/// `runtime::get_attr(container, attr)`; ошибочные операнды
/// разворачиваются через `and_then`.
fn get_attr(env: &mut CompileEnv, runtime: &str, container: Fragment, attr: Fragment) -> Fragment {
    let mut chain = Vec::new();

    let container = match container {
        Fragment::Fallible(code) => {
            let name = env.fresh_name("attr");
            let arg = format!("&{}", name);
            chain.push((name, code));
            arg
        }
        other => other.value_ref(runtime),
    };
    let attr = match attr {
        Fragment::Fallible(code) => {
            let name = env.fresh_name("attr");
            let arg = format!("&{}.to_string()", name);
            chain.push((name, code));
            arg
        }
        other => other.str_ref(),
    };

    let mut code = format!("{}::get_attr({}, {})", runtime, container, attr);
    for (name, source) in chain.into_iter().rev() {
        code = format!("{}.and_then(|{}| {})", source, name, code);
    }
    Fragment::Fallible(code)
}
