use crate::error::{AnalysisError, AnalysisResult};
use serde_json::{Map, Value};
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

const HISTORY_EXTENSION: &str = "json";

/// One named upload: the raw bytes of a streaming-history file.
#[derive(Debug, Clone)]
pub struct InputSource {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl InputSource {
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn read_path(path: &Path) -> AnalysisResult<Self> {
        let bytes = fs::read(path).map_err(|source| AnalysisError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            name: path.display().to_string(),
            bytes,
        })
    }
}

/// A raw play event, every original column kept.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayEvent {
    pub source: usize,
    pub row: usize,
    pub fields: Map<String, Value>,
}

impl PlayEvent {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayTable {
    pub sources: Vec<String>,
    pub events: Vec<PlayEvent>,
}

impl PlayTable {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn source_name(&self, event: &PlayEvent) -> &str {
        self.sources
            .get(event.source)
            .map(String::as_str)
            .unwrap_or("<unknown input>")
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.events
            .iter()
            .any(|event| event.fields.contains_key(column))
    }
}

/// Parses every source and concatenates the rows in input order.
///
/// The whole load fails on the first malformed source; nothing partial is
/// returned.
pub fn load_sources(sources: &[InputSource]) -> AnalysisResult<PlayTable> {
    if sources.is_empty() {
        return Err(AnalysisError::malformed(
            "<no input>",
            "no streaming history files were given",
        ));
    }

    let mut table = PlayTable::default();
    for (source_index, source) in sources.iter().enumerate() {
        let rows = parse_rows(source)?;
        debug!(source = %source.name, rows = rows.len(), "parsed streaming history");
        table.sources.push(source.name.clone());
        table
            .events
            .extend(rows.into_iter().enumerate().map(|(row, fields)| PlayEvent {
                source: source_index,
                row,
                fields,
            }));
    }
    Ok(table)
}

fn parse_rows(source: &InputSource) -> AnalysisResult<Vec<Map<String, Value>>> {
    let value: Value = serde_json::from_slice(&source.bytes)
        .map_err(|err| AnalysisError::malformed(&source.name, format!("invalid JSON: {err}")))?;

    let Value::Array(items) = value else {
        return Err(AnalysisError::malformed(
            &source.name,
            format!(
                "expected an array of play records, found {}",
                json_kind(&value)
            ),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(fields) => Ok(fields),
            other => Err(AnalysisError::malformed(
                &source.name,
                format!("record {index} is {}, not an object", json_kind(&other)),
            )),
        })
        .collect()
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Expands directories into the `.json` files beneath them, sorted by path.
/// Plain file arguments are kept as given, in order.
pub fn collect_input_paths(paths: &[PathBuf]) -> AnalysisResult<Vec<PathBuf>> {
    let mut out = Vec::new();
    for path in paths {
        if !path.is_dir() {
            out.push(path.clone());
            continue;
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(path).follow_links(true) {
            let entry = entry.map_err(|err| walk_error(path, err))?;
            if entry.file_type().is_file() && is_history_file(entry.path()) {
                found.push(entry.into_path());
            }
        }
        if found.is_empty() {
            return Err(AnalysisError::malformed(
                &path.display().to_string(),
                "directory contains no .json files",
            ));
        }
        found.sort();
        out.append(&mut found);
    }
    Ok(out)
}

pub fn read_sources(paths: &[PathBuf]) -> AnalysisResult<Vec<InputSource>> {
    collect_input_paths(paths)?
        .iter()
        .map(|path| InputSource::read_path(path))
        .collect()
}

/// An entry the walk cannot resolve fails the whole load, like an unreadable
/// file argument does.
fn walk_error(root: &Path, err: walkdir::Error) -> AnalysisError {
    let path = err.path().unwrap_or(root).to_path_buf();
    let source = match err.into_io_error() {
        Some(source) => source,
        None => io::Error::other(format!("filesystem loop below {}", root.display())),
    };
    AnalysisError::Io { path, source }
}

fn is_history_file(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case(HISTORY_EXTENSION))
}
