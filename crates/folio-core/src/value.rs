//! Conversions from YAML and TOML documents into JSON values.
//!
//! Frontmatter and data files are normalized to `serde_json::Value` so the
//! rest of the pipeline (template context, extra fields) deals with one
//! value model regardless of the source format.

use serde_json::{Map, Number, Value};

/// Convert a YAML value into a JSON value.
///
/// Non-string mapping keys are stringified; keys that cannot be represented
/// (nested sequences or mappings used as keys) are dropped.
pub fn from_yaml(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(seq) => Value::Array(seq.into_iter().map(from_yaml).collect()),
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, value) in mapping {
                if let Some(key) = yaml_key(key) {
                    map.insert(key, from_yaml(value));
                }
            }
            Value::Object(map)
        }
        serde_yaml::Value::Tagged(tagged) => from_yaml(tagged.value),
    }
}

fn yaml_key(key: serde_yaml::Value) -> Option<String> {
    match key {
        serde_yaml::Value::String(s) => Some(s),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Null => Some("null".to_string()),
        serde_yaml::Value::Tagged(tagged) => yaml_key(tagged.value),
        serde_yaml::Value::Sequence(_) | serde_yaml::Value::Mapping(_) => None,
    }
}

/// Convert a TOML value into a JSON value.
///
/// TOML datetimes become their RFC 3339 string form.
pub fn from_toml(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(from_toml).collect()),
        toml::Value::Table(table) => Value::Object(from_toml_table(table)),
    }
}

/// Convert a TOML table into a JSON object map.
pub fn from_toml_table(table: toml::Table) -> Map<String, Value> {
    table.into_iter().map(|(k, v)| (k, from_toml(v))).collect()
}
