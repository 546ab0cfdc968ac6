//! Dataset sources feeding the reconciler.
//!
//! A source yields a finite sequence of record descriptors in its natural
//! order. Sources are restartable: every `load` call re-reads the underlying
//! data, so re-running a batch picks up dataset edits without process state.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::SeedError;
use crate::record::RecordDescriptor;

/// A finite, restartable supply of dataset records.
pub trait DatasetSource {
    /// Loads the full dataset.
    fn load(&self) -> Result<Vec<RecordDescriptor>, SeedError>;
}

/// Dataset held directly in memory, mainly for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    records: Vec<RecordDescriptor>,
}

impl InMemorySource {
    pub fn new(records: Vec<RecordDescriptor>) -> Self {
        Self { records }
    }
}

impl DatasetSource for InMemorySource {
    fn load(&self) -> Result<Vec<RecordDescriptor>, SeedError> {
        Ok(self.records.clone())
    }
}

/// Dataset read from JSON seed files.
///
/// The path may be a single `.json` file holding one record object or an
/// array of records, or a directory whose `*.json` files are read in sorted
/// name order and flattened into one sequence.
#[derive(Debug, Clone)]
pub struct JsonSource {
    path: PathBuf,
}

impl JsonSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetSource for JsonSource {
    fn load(&self) -> Result<Vec<RecordDescriptor>, SeedError> {
        if self.path.is_dir() {
            load_directory(&self.path)
        } else {
            load_file(&self.path)
        }
    }
}

fn load_file(path: &Path) -> Result<Vec<RecordDescriptor>, SeedError> {
    let raw = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&raw)
        .map_err(|e| SeedError::Data(format!("{}: {}", path.display(), e)))?;

    let records = match value {
        Value::Array(items) => items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<RecordDescriptor>, _>>()
            .map_err(|e| SeedError::Data(format!("{}: {}", path.display(), e)))?,
        Value::Object(_) => vec![serde_json::from_value(value)
            .map_err(|e| SeedError::Data(format!("{}: {}", path.display(), e)))?],
        _ => {
            return Err(SeedError::Data(format!(
                "{}: expected a record object or an array of records",
                path.display()
            )))
        }
    };

    Ok(records)
}

fn load_directory(dir: &Path) -> Result<Vec<RecordDescriptor>, SeedError> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();

    // Sorted name order keeps runs deterministic across platforms.
    files.sort();

    let mut records = Vec::new();
    for file in files {
        records.extend(load_file(&file)?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_in_memory_source() {
        let source = InMemorySource::new(vec![
            RecordDescriptor::new("healthcare"),
            RecordDescriptor::new("retail"),
        ]);
        let records = source.load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key, "healthcare");
    }

    #[test]
    fn test_load_array_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "industries.json",
            r#"[
                { "key": "healthcare", "fields": { "name": "Healthcare" } },
                { "key": "retail", "fields": { "name": "Retail" } }
            ]"#,
        );

        let records = JsonSource::new(path).load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].key, "retail");
    }

    #[test]
    fn test_load_single_object_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "one.json", r#"{ "key": "healthcare" }"#);

        let records = JsonSource::new(path).load().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, "healthcare");
    }

    #[test]
    fn test_load_directory_sorted() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "b.json", r#"[{ "key": "second" }]"#);
        write_file(dir.path(), "a.json", r#"[{ "key": "first" }]"#);
        write_file(dir.path(), "notes.txt", "ignored");

        let records = JsonSource::new(dir.path()).load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key, "first");
        assert_eq!(records[1].key, "second");
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "bad.json", "{ not json }");

        let result = JsonSource::new(path).load();
        assert!(matches!(result, Err(SeedError::Data(_))));
    }

    #[test]
    fn test_load_scalar_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "scalar.json", "42");

        let result = JsonSource::new(path).load();
        assert!(matches!(result, Err(SeedError::Data(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = JsonSource::new("/nonexistent/industries.json").load();
        assert!(matches!(result, Err(SeedError::Io(_))));
    }
}
