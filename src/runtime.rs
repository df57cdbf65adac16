//! Поддержка времени выполнения для сгенерированного кода.
//!
//! Генератор не вызывает эти функции сам: он только ссылается на них из
//! выходного модуля (`runtime::lookup`, `runtime::get_attr`, `runtime::iterate`).
//!
//! ```rust,ignore
//! use twigc::runtime::{self, Context, Value};
//!
//! let mut ctx = Context::new();
//! ctx.insert("user".into(), Value::from_pairs([("name", "Ann")]));
//! let name = runtime::get_attr(runtime::lookup(&ctx, "user"), "name").unwrap();
//! assert_eq!(name.to_string(), "Ann");
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io;

use thiserror::Error;

/// Контекст рендеринга: имя → значение.
pub type Context = HashMap<String, Value>;

static NULL: Value = Value::Null;

/// Динамическое значение шаблона.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    /// Ключи упорядочены, поэтому обход детерминирован.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Собрать `Map` из пар.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Название типа для сообщений об ошибках.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }
}

/// Приведение к строке, как его видит шаблон.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null | Value::Bool(false) => Ok(()),
            Value::Bool(true) => write!(f, "1"),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(_) | Value::Map(_) => write!(f, "Array"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(0.0)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Контекст из JSON-объекта; всё, что не объект, даёт пустой контекст.
pub fn context_from_json(json: serde_json::Value) -> Context {
    match json {
        serde_json::Value::Object(fields) => fields
            .into_iter()
            .map(|(k, v)| (k, Value::from(v)))
            .collect(),
        _ => Context::new(),
    }
}

/// Ошибка разрешения атрибута.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttrError {
    #[error("attribute '{0}' not found")]
    NotFound(String),

    #[error("cannot read attribute '{attr}' of {kind} value")]
    NotAContainer { attr: String, kind: &'static str },
}

/// Значение переменной контекста; для отсутствующего имени `Null`.
pub fn lookup<'a>(ctx: &'a Context, name: &str) -> &'a Value {
    ctx.get(name).unwrap_or(&NULL)
}

/// Разрешить `container.attr`: ключ словаря или индекс массива.
pub fn get_attr(container: &Value, attr: &str) -> Result<Value, AttrError> {
    match container {
        Value::Map(fields) => fields
            .get(attr)
            .cloned()
            .ok_or_else(|| AttrError::NotFound(attr.to_string())),
        Value::Array(items) => attr
            .parse::<usize>()
            .ok()
            .and_then(|index| items.get(index))
            .cloned()
            .ok_or_else(|| AttrError::NotFound(attr.to_string())),
        other => Err(AttrError::NotAContainer {
            attr: attr.to_string(),
            kind: other.kind(),
        }),
    }
}

/// Значение переменной `loop` для элемента `index0` из `length`.
fn loop_value(index0: usize, length: usize) -> Value {
    let as_int = |n: usize| Value::Int(n as i64);
    Value::from_pairs([
        ("index", as_int(index0 + 1)),
        ("index0", as_int(index0)),
        ("revindex", as_int(length - index0)),
        ("revindex0", as_int(length - index0 - 1)),
        ("first", Value::Bool(index0 == 0)),
        ("last", Value::Bool(index0 + 1 == length)),
        ("length", as_int(length)),
    ])
}

/// Обойти коллекцию, вызывая `f(key, value, loop)` для каждого элемента.
///
/// `f` возвращает `Ok(true)`, чтобы остановить обход. У массивов ключи
/// целочисленные, у словарей строковые; прочие значения не дают
/// ни одной итерации.
pub fn iterate<F>(collection: &Value, mut f: F) -> io::Result<()>
where
    F: FnMut(&Value, &Value, &Value) -> io::Result<bool>,
{
    match collection {
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                if f(&Value::Int(i as i64), item, &loop_value(i, items.len()))? {
                    break;
                }
            }
        }
        Value::Map(fields) => {
            for (i, (key, item)) in fields.iter().enumerate() {
                let key = Value::String(key.clone());
                if f(&key, item, &loop_value(i, fields.len()))? {
                    break;
                }
            }
        }
        _ => {}
    }
    Ok(())
}
