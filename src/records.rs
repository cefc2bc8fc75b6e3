use crate::error::{AnalysisError, AnalysisResult};
use crate::loader::{PlayEvent, PlayTable, json_kind};
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub const TS_FIELD: &str = "ts";
pub const MS_PLAYED_FIELD: &str = "ms_played";
pub const TRACK_FIELD: &str = "master_metadata_track_name";
pub const ALBUM_FIELD: &str = "master_metadata_album_album_name";
pub const ARTIST_FIELD: &str = "master_metadata_album_artist_name";

pub const SOURCE_FIELDS: [&str; 5] = [
    TS_FIELD,
    MS_PLAYED_FIELD,
    TRACK_FIELD,
    ALBUM_FIELD,
    ARTIST_FIELD,
];

/// The five-field projection of a play event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkingRecord {
    pub ts: Option<OffsetDateTime>,
    pub ms_played: Option<u64>,
    pub track_name: Option<String>,
    pub album_name: Option<String>,
    pub artist_name: Option<String>,
}

impl WorkingRecord {
    pub fn ms_played_or_zero(&self) -> u64 {
        self.ms_played.unwrap_or(0)
    }
}

pub fn project(table: &PlayTable) -> AnalysisResult<Vec<WorkingRecord>> {
    if table.is_empty() {
        return Ok(Vec::new());
    }

    if let Some(field) = SOURCE_FIELDS
        .into_iter()
        .find(|field| !table.has_column(field))
    {
        return Err(AnalysisError::MissingField { field });
    }

    table
        .events
        .iter()
        .map(|event| project_event(table, event))
        .collect()
}

fn project_event(table: &PlayTable, event: &PlayEvent) -> AnalysisResult<WorkingRecord> {
    let fail = |field: &str, reason: String| {
        AnalysisError::malformed(
            table.source_name(event),
            format!("record {} field `{field}`: {reason}", event.row),
        )
    };

    let ts = match event.get(TS_FIELD) {
        None | Some(Value::Null) => None,
        Some(Value::String(raw)) => Some(
            OffsetDateTime::parse(raw, &Rfc3339)
                .map_err(|err| fail(TS_FIELD, format!("invalid timestamp {raw:?}: {err}")))?,
        ),
        Some(other) => {
            return Err(fail(
                TS_FIELD,
                format!("expected a timestamp string, found {}", json_kind(other)),
            ));
        }
    };

    let ms_played = match event.get(MS_PLAYED_FIELD) {
        None | Some(Value::Null) => None,
        Some(value) => Some(
            milliseconds(value).ok_or_else(|| {
                fail(MS_PLAYED_FIELD, format!("expected a non-negative integer, found {value}"))
            })?,
        ),
    };

    Ok(WorkingRecord {
        ts,
        ms_played,
        track_name: text_field(event, TRACK_FIELD).map_err(|reason| fail(TRACK_FIELD, reason))?,
        album_name: text_field(event, ALBUM_FIELD).map_err(|reason| fail(ALBUM_FIELD, reason))?,
        artist_name: text_field(event, ARTIST_FIELD)
            .map_err(|reason| fail(ARTIST_FIELD, reason))?,
    })
}

fn milliseconds(value: &Value) -> Option<u64> {
    if let Some(ms) = value.as_u64() {
        return Some(ms);
    }
    // exports written through float columns carry values like 1234.0
    value
        .as_f64()
        .filter(|ms| *ms >= 0.0 && ms.fract() == 0.0 && *ms <= u64::MAX as f64)
        .map(|ms| ms as u64)
}

fn text_field(event: &PlayEvent, column: &str) -> Result<Option<String>, String> {
    match event.get(column) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(other) => Err(format!("expected a string, found {}", json_kind(other))),
    }
}
