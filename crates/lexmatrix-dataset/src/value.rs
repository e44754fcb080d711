//! Cell values of relational tables and the row type built from them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value of one column in one row.
///
/// Columns declared with a separator hold a `List`; everything else holds
/// `Text` or `Null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Text(String),
    List(Vec<String>),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Text if non-empty, `Null` otherwise.
    pub fn non_empty(s: &str) -> Self {
        if s.is_empty() {
            Value::Null
        } else {
            Value::Text(s.to_string())
        }
    }

    /// Whether the value carries no information (null, empty text, empty list).
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The single value, or the first element of a list.
    pub fn first(&self) -> Option<&str> {
        match self {
            Value::Null => None,
            Value::Text(s) => Some(s),
            Value::List(items) => items.first().map(String::as_str),
        }
    }

    pub fn to_list(&self) -> Vec<String> {
        match self {
            Value::Null => Vec::new(),
            Value::Text(s) => vec![s.clone()],
            Value::List(items) => items.clone(),
        }
    }

    /// Decode a raw field. Only the declared separator is split on; an empty
    /// field decodes to an empty list.
    pub fn from_field(raw: &str, separator: Option<&str>) -> Self {
        match separator {
            Some(_) if raw.is_empty() => Value::List(Vec::new()),
            Some(sep) => Value::List(raw.split(sep).map(str::to_string).collect()),
            None => Value::non_empty(raw),
        }
    }

    /// Encode for a flat field, joining lists with `separator` (or `;` if the
    /// column declares none).
    pub fn to_field(&self, separator: Option<&str>) -> String {
        match self {
            Value::Null => String::new(),
            Value::Text(s) => s.clone(),
            Value::List(items) => items.join(separator.unwrap_or(";")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Option<String>> for Value {
    fn from(s: Option<String>) -> Self {
        s.map(Value::Text).unwrap_or_default()
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

/// One row of a table, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(BTreeMap<String, Value>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// Text of a single-valued column (first element for lists).
    pub fn text(&self, column: &str) -> Option<&str> {
        self.0.get(column).and_then(Value::first)
    }

    pub fn list(&self, column: &str) -> Vec<String> {
        self.0.get(column).map(Value::to_list).unwrap_or_default()
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(column.into(), value.into());
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Row(iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect())
    }
}
