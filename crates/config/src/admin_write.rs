//! Section-addressable, comment-preserving config writes. The original
//! file's comments and key order are preserved and a timestamped backup is
//! created alongside. Uses `toml_edit` rather than round-tripping through
//! `toml::Value`, since the latter discards comments on serialize.

use crate::ConfigError;
use std::path::Path;
use toml_edit::{DocumentMut, Item, Table, Value};

/// Apply `updates` (JSON object, dotted keys treated as nested tables) to the
/// TOML document at `path`, addressed by `section_path`. Writes a timestamped
/// backup before rewriting the file, and validates the merged document can
/// still be deserialized into `Settings` before committing.
pub fn update_section(
    path: &Path,
    section_path: &[&str],
    updates: &serde_json::Map<String, serde_json::Value>,
) -> Result<(), ConfigError> {
    let original = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::FileNotFound(format!("{}: {e}", path.display())))?;
    let mut doc: DocumentMut = original
        .parse()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    {
        let mut table: &mut Table = doc.as_table_mut();
        for (i, segment) in section_path.iter().enumerate() {
            let is_last_segment = i == section_path.len() - 1;
            let entry = table.entry(segment).or_insert_with(|| {
                Item::Table({
                    let mut t = Table::new();
                    t.set_implicit(!is_last_segment);
                    t
                })
            });
            table = entry
                .as_table_mut()
                .ok_or_else(|| ConfigError::InvalidValue {
                    field: segment.to_string(),
                    message: "existing key is not a table".to_string(),
                })?;
        }
        for (key, value) in updates {
            table.insert(key, Item::Value(json_to_toml_value(value)));
        }
    }

    let candidate = doc.to_string();
    let candidate_settings: crate::Settings =
        toml::from_str(&candidate).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    candidate_settings.validate()?;

    let timestamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
    let backup_path = path.with_extension(format!("toml.bak.{timestamp}"));
    std::fs::copy(path, &backup_path)?;

    std::fs::write(path, candidate)?;
    tracing::info!(
        path = %path.display(),
        backup = %backup_path.display(),
        section = ?section_path,
        "wrote configuration section with comment-preserving update"
    );
    Ok(())
}

fn json_to_toml_value(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::from(""),
        serde_json::Value::Bool(b) => Value::from(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else {
                Value::from(n.as_f64().unwrap_or_default())
            }
        }
        serde_json::Value::String(s) => Value::from(s.clone()),
        serde_json::Value::Array(arr) => {
            let items: toml_edit::Array = arr.iter().map(json_to_toml_value).collect();
            Value::Array(items)
        }
        serde_json::Value::Object(obj) => {
            let mut table = toml_edit::InlineTable::new();
            for (k, v) in obj {
                table.insert(k, json_to_toml_value(v));
            }
            Value::InlineTable(table)
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Environment(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn update_preserves_comments_and_unrelated_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "# top comment\n[webapi]\nport = 8080 # inline comment\nbind_address = \"0.0.0.0\"\n"
        )
        .unwrap();

        let mut updates = serde_json::Map::new();
        updates.insert("port".to_string(), serde_json::json!(9200));
        update_section(file.path(), &["webapi"], &updates).unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        assert!(contents.contains("# top comment"));
        assert!(contents.contains("bind_address = \"0.0.0.0\""));
        assert!(contents.contains("9200"));
    }

    #[test]
    fn update_creates_timestamped_backup() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[webapi]\nport = 8080\n").unwrap();
        let dir = file.path().parent().unwrap().to_path_buf();
        let before: std::collections::HashSet<_> = std::fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok().map(|e| e.file_name()))
            .collect();

        let mut updates = serde_json::Map::new();
        updates.insert("port".to_string(), serde_json::json!(9300));
        update_section(file.path(), &["webapi"], &updates).unwrap();

        let after: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok().map(|e| e.file_name()))
            .filter(|n| !before.contains(n))
            .collect();
        assert_eq!(after.len(), 1);
        assert!(after[0].to_string_lossy().contains(".toml.bak."));
    }

    #[test]
    fn update_rejects_invalid_value_and_leaves_file_untouched() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[wake_word]\nthreshold = 0.5\n").unwrap();
        let original = std::fs::read_to_string(file.path()).unwrap();

        let mut updates = serde_json::Map::new();
        updates.insert("threshold".to_string(), serde_json::json!(5.0));
        let result = update_section(file.path(), &["wake_word"], &updates);
        assert!(result.is_err());

        let after = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(original, after);
    }
}
