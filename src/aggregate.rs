use crate::records::WorkingRecord;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

pub const MS_PER_HOUR: f64 = 3_600_000.0;
pub const UNKNOWN_ARTIST: &str = "(unknown artist)";

/// Per-artist rollup. A `None` artist name is the group of records that had
/// no artist at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistSummaryRow {
    pub artist_name: Option<String>,
    pub hrs_played: f64,
    pub tracks: u64,
}

impl ArtistSummaryRow {
    pub fn label(&self) -> &str {
        artist_label(self.artist_name.as_deref())
    }
}

pub fn artist_label(name: Option<&str>) -> &str {
    name.unwrap_or(UNKNOWN_ARTIST)
}

#[derive(Debug, Default)]
struct ArtistTotals {
    ms_played: u64,
    tracks: u64,
}

/// Groups records by artist, sums play time and counts rows, then ranks by
/// hours descending. Ties keep the order in which artists first appeared.
pub fn summarize_artists<'a, I>(records: I) -> Vec<ArtistSummaryRow>
where
    I: IntoIterator<Item = &'a WorkingRecord>,
{
    let mut order: Vec<(Option<&'a str>, ArtistTotals)> = Vec::new();
    let mut lookup: HashMap<Option<&'a str>, usize> = HashMap::new();

    for record in records {
        let key = record.artist_name.as_deref();
        let index = *lookup.entry(key).or_insert_with(|| {
            order.push((key, ArtistTotals::default()));
            order.len() - 1
        });
        let totals = &mut order[index].1;
        totals.ms_played = totals.ms_played.saturating_add(record.ms_played_or_zero());
        totals.tracks = totals.tracks.saturating_add(1);
    }

    let mut rows: Vec<ArtistSummaryRow> = order
        .into_iter()
        .map(|(artist, totals)| ArtistSummaryRow {
            artist_name: artist.map(str::to_string),
            hrs_played: ms_to_hours(totals.ms_played),
            tracks: totals.tracks,
        })
        .collect();
    rows.sort_by(compare_by_hours);
    rows
}

fn compare_by_hours(a: &ArtistSummaryRow, b: &ArtistSummaryRow) -> Ordering {
    b.hrs_played.total_cmp(&a.hrs_played)
}

pub fn ms_to_hours(ms: u64) -> f64 {
    round2(ms as f64 / MS_PER_HOUR)
}

/// Rounds half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
