//! Column descriptors and cell resolution.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::{Map, Value};

use abate_common::format::{
    format_currency, format_date, format_date_time, format_number, format_weight,
};

/// One record of an export: field name to raw value.
pub type Row = Map<String, Value>;

type FormatFn = dyn Fn(&Value) -> String + Send + Sync;

/// Turns a present, non-null raw value into display text.
#[derive(Clone)]
pub enum Formatter {
    /// `R$ 1.234,56`
    Currency,
    /// Grouped number with a fixed count of fraction digits.
    Number(u32),
    /// `1.234,50 kg`
    Weight,
    /// `dd/mm/yyyy`
    Date,
    /// `dd/mm/yyyy HH:MM:SS`
    DateTime,
    Custom(Arc<FormatFn>),
}

impl Formatter {
    pub fn custom(f: impl Fn(&Value) -> String + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }

    pub fn apply(&self, value: &Value) -> String {
        match self {
            Self::Currency => match numeric(value) {
                Some(n) => format_currency(Some(n)),
                None => stringify(value),
            },
            Self::Number(decimals) => match numeric(value) {
                Some(n) => format_number(Some(n), *decimals),
                None => stringify(value),
            },
            Self::Weight => match numeric(value) {
                Some(n) => format_weight(Some(n)),
                None => stringify(value),
            },
            Self::Date => format_date(&stringify(value)),
            Self::DateTime => format_date_time(&stringify(value)),
            Self::Custom(f) => f(value),
        }
    }
}

impl fmt::Debug for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Currency => f.write_str("Currency"),
            Self::Number(decimals) => f.debug_tuple("Number").field(decimals).finish(),
            Self::Weight => f.write_str("Weight"),
            Self::Date => f.write_str("Date"),
            Self::DateTime => f.write_str("DateTime"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl FromStr for Formatter {
    type Err = String;

    /// Parses the built-in names: `currency`, `number`, `number=2`,
    /// `weight`, `date`, `datetime`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, arg) = match s.split_once('=') {
            Some((name, arg)) => (name.trim(), Some(arg.trim())),
            None => (s.trim(), None),
        };
        match (name.to_ascii_lowercase().as_str(), arg) {
            ("currency" | "moeda", None) => Ok(Self::Currency),
            ("weight" | "peso", None) => Ok(Self::Weight),
            ("date" | "data", None) => Ok(Self::Date),
            ("datetime" | "data_hora", None) => Ok(Self::DateTime),
            ("number" | "numero", None) => Ok(Self::Number(0)),
            ("number" | "numero", Some(decimals)) => decimals
                .parse()
                .map(Self::Number)
                .map_err(|_| format!("invalid decimal count: {decimals}")),
            _ => Err(format!("unknown formatter: {s}")),
        }
    }
}

/// Describes one output column.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    /// Field looked up in each row.
    pub key: String,
    /// Header text.
    pub label: String,
    pub formatter: Option<Formatter>,
}

impl ColumnSpec {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            formatter: None,
        }
    }

    pub fn with_formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Display text of this column's cell in `row`.
    ///
    /// The formatter sees every present, non-null value, zero included.
    /// Without one, missing, null and falsy values (`0`, `false`, `""`)
    /// are empty cells.
    pub fn resolve(&self, row: &Row) -> String {
        match (row.get(&self.key), &self.formatter) {
            (None | Some(Value::Null), _) => String::new(),
            (Some(value), Some(formatter)) => formatter.apply(value),
            (Some(value), None) if is_falsy(value) => String::new(),
            (Some(value), None) => stringify(value),
        }
    }
}

impl FromStr for ColumnSpec {
    type Err = String;

    /// Parses `key`, `key:Label` or `key:Label:formatter`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let key = parts.next().unwrap_or_default().trim();
        if key.is_empty() {
            return Err(format!("column without a key: {s:?}"));
        }
        let label = parts
            .next()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(key);
        let column = Self::new(key, label);
        match parts.next() {
            Some(formatter) => Ok(column.with_formatter(formatter.parse()?)),
            None => Ok(column),
        }
    }
}

/// Plain text of a raw value.
///
/// Whole floats print without a fractional part (`7.0` is `7`); arrays and
/// objects print as compact JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) => f.to_string(),
            _ => n.to_string(),
        },
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
