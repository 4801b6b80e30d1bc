//! Data file loading.
//!
//! Files under the data directory become a nested JSON object keyed by
//! directory name and file stem: `data/team/authors.yaml` is reachable as
//! `data.team.authors`.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{
    error::{CoreError, Result},
    value,
};

/// Load every data file below `dir` into a nested object.
///
/// A missing directory yields an empty object.
pub fn load_data_dir(dir: &Path) -> Result<Value> {
    if !dir.exists() {
        debug!(dir = %dir.display(), "data directory not found, skipping");
        return Ok(Value::Object(Map::new()));
    }
    load_level(dir).map(Value::Object)
}

fn load_level(dir: &Path) -> Result<Map<String, Value>> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<_>>()?;
    entries.sort();

    let mut map = Map::new();
    let mut owners: BTreeMap<String, PathBuf> = BTreeMap::new();

    for path in entries {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }

        let (key, value) = if path.is_dir() {
            (name.to_string(), Value::Object(load_level(&path)?))
        } else {
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default()
                .to_ascii_lowercase();
            let Some(value) = parse_data_file(&path, &ext)? else {
                warn!(path = %path.display(), "skipping data file with unknown extension");
                continue;
            };
            (key.to_string(), value)
        };

        if let Some(first) = owners.get(&key) {
            return Err(CoreError::data_conflict(key, first, &path));
        }
        debug!(key = %key, path = %path.display(), "loaded data");
        owners.insert(key.clone(), path);
        map.insert(key, value);
    }

    Ok(map)
}

fn parse_data_file(path: &Path, ext: &str) -> Result<Option<Value>> {
    let value = match ext {
        "yaml" | "yml" => {
            let content = fs::read_to_string(path)?;
            let yaml: serde_yaml::Value = serde_yaml::from_str(&content)
                .map_err(|e| CoreError::parse(path, e.to_string()))?;
            value::from_yaml(yaml)
        }
        "json" => {
            let content = fs::read_to_string(path)?;
            serde_json::from_str(&content).map_err(|e| CoreError::parse(path, e.to_string()))?
        }
        "toml" => {
            let content = fs::read_to_string(path)?;
            let table: toml::Table = content
                .parse()
                .map_err(|e: toml::de::Error| CoreError::parse(path, e.to_string()))?;
            Value::Object(value::from_toml_table(table))
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}
