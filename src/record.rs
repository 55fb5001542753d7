//! # Data Records
//!
//! A record is the Traza, Client or other entity whose attributes fields are
//! bound to. It is read-only here: fields look values up by name and turn
//! them into display strings.
//!
//! Values are a tagged union so each kind has exactly one stringification
//! rule:
//!
//! | Value | Display |
//! |-------|---------|
//! | `Text` | as-is |
//! | `Integer` / `Number` | `42`, `12.5` |
//! | `Bool` | `Sí` / `No` |
//! | `Date` | `dd/mm/YYYY` |
//! | `DateTime` | `dd/mm/YYYY HH:MM` |
//! | `Record` | its `nombre`/`name`, else scalar values joined by `, ` |
//! | `List` | elements joined by `, ` |
//! | `Null`, empty | unresolved |
//!
//! ```
//! use validoc::record::DataRecord;
//!
//! let record = DataRecord::from_json_str(r#"{
//!     "numero_traza": 1042,
//!     "fecha": "2024-03-05",
//!     "tad": {"nombre": "TAD Azcapotzalco", "ciudad": "CDMX"}
//! }"#).unwrap();
//!
//! assert_eq!(record.resolve("numero_traza").as_deref(), Some("1042"));
//! assert_eq!(record.resolve("fecha").as_deref(), Some("05/03/2024"));
//! assert_eq!(record.resolve("tad").as_deref(), Some("TAD Azcapotzalco"));
//! assert_eq!(record.resolve("tad.ciudad").as_deref(), Some("CDMX"));
//! assert_eq!(record.resolve("missing"), None);
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{Result, ValidocError};

const DATE_FORMAT: &str = "%d/%m/%Y";
const DATE_TIME_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Keys used as the display value of a nested record.
const LABEL_KEYS: &[&str] = &["nombre", "name"];

/// One attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    Null,
    Text(String),
    Integer(i64),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Record(BTreeMap<String, DataValue>),
    List(Vec<DataValue>),
}

impl DataValue {
    /// Display string, or `None` when there is nothing to show.
    pub fn display(&self) -> Option<String> {
        let s = match self {
            DataValue::Null => return None,
            DataValue::Text(s) => s.clone(),
            DataValue::Integer(i) => i.to_string(),
            DataValue::Number(n) if n.is_finite() => format!("{}", n),
            DataValue::Number(_) => return None,
            DataValue::Bool(true) => "Sí".to_string(),
            DataValue::Bool(false) => "No".to_string(),
            DataValue::Date(d) => d.format(DATE_FORMAT).to_string(),
            DataValue::DateTime(dt) => dt.format(DATE_TIME_FORMAT).to_string(),
            DataValue::Record(map) => return display_record(map),
            DataValue::List(items) => join_displayed(items.iter()),
        };
        if s.trim().is_empty() { None } else { Some(s) }
    }

    fn is_scalar(&self) -> bool {
        !matches!(self, DataValue::Record(_) | DataValue::List(_))
    }
}

fn display_record(map: &BTreeMap<String, DataValue>) -> Option<String> {
    for key in LABEL_KEYS {
        if let Some(label) = map.get(*key).filter(|v| v.is_scalar()).and_then(DataValue::display) {
            return Some(label);
        }
    }
    let joined = join_displayed(map.values().filter(|v| v.is_scalar()));
    if joined.is_empty() { None } else { Some(joined) }
}

fn join_displayed<'a>(values: impl Iterator<Item = &'a DataValue>) -> String {
    values
        .filter_map(DataValue::display)
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_text(s: String) -> DataValue {
    if let Ok(d) = NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
        return DataValue::Date(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
        return DataValue::DateTime(dt.naive_local());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f") {
        return DataValue::DateTime(dt);
    }
    DataValue::Text(s)
}

impl From<Value> for DataValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => DataValue::Null,
            Value::Bool(b) => DataValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => DataValue::Integer(i),
                None => n.as_f64().map(DataValue::Number).unwrap_or(DataValue::Null),
            },
            Value::String(s) => parse_text(s),
            Value::Array(items) => DataValue::List(items.into_iter().map(DataValue::from).collect()),
            Value::Object(map) => DataValue::Record(
                map.into_iter()
                    .map(|(k, v)| (k, DataValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for DataValue {
    fn from(s: &str) -> Self {
        parse_text(s.to_string())
    }
}

/// Attributes of a bindable entity.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct DataRecord {
    values: BTreeMap<String, DataValue>,
}

impl From<Map<String, Value>> for DataRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            values: map
                .into_iter()
                .map(|(k, v)| (k, DataValue::from(v)))
                .collect(),
        }
    }
}

impl DataRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object; anything else is rejected.
    pub fn from_json_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self::from(map)),
            Value::Null => Ok(Self::new()),
            other => Err(ValidocError::Template(format!(
                "data record must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_json_value(serde_json::from_str(json)?)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<DataValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<DataValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Look up an attribute. An exact key wins; otherwise `a.b.c` walks
    /// nested records.
    pub fn get(&self, path: &str) -> Option<&DataValue> {
        if let Some(v) = self.values.get(path) {
            return Some(v);
        }
        let mut parts = path.split('.');
        let mut current = self.values.get(parts.next()?)?;
        for part in parts {
            match current {
                DataValue::Record(map) => current = map.get(part)?,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Display string for an attribute, `None` if missing or empty.
    pub fn resolve(&self, path: &str) -> Option<String> {
        let path = path.trim();
        if path.is_empty() {
            return None;
        }
        self.get(path).and_then(DataValue::display)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
