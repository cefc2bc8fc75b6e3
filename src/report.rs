use crate::aggregate::{ArtistSummaryRow, artist_label};
use crate::charts::{BAR_ARTISTS, SCATTER_ARTISTS};
use crate::pipeline::Analysis;
use crate::windows::{WINDOW_COUNT, YearWindowedRow};
use serde::Serialize;
use std::fmt::Write as _;

const NAME_WIDTH: usize = 32;

#[derive(Serialize)]
struct JsonReport<'a> {
    record_count: usize,
    source_count: usize,
    artists: &'a [ArtistSummaryRow],
    year_labels: Vec<&'a str>,
    years: &'a [YearWindowedRow],
    top_artists: Vec<JsonTopArtist<'a>>,
}

#[derive(Serialize)]
struct JsonTopArtist<'a> {
    rank: usize,
    artist: &'a str,
    first_listened: Option<String>,
    plays: u64,
}

pub fn render_json(analysis: &Analysis) -> serde_json::Result<String> {
    let report = JsonReport {
        record_count: analysis.records.len(),
        source_count: analysis.source_count,
        artists: &analysis.artists,
        year_labels: analysis
            .years
            .windows
            .iter()
            .map(|window| window.label.as_str())
            .collect(),
        years: &analysis.years.rows,
        top_artists: analysis
            .dashboard
            .artists
            .iter()
            .map(|chart| JsonTopArtist {
                rank: chart.rank,
                artist: &chart.artist,
                first_listened: chart.first_listened.map(|date| date.to_string()),
                plays: chart.histogram.total(),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&report)
}

/// Plain-text tables for `--report`.
pub fn render_text(analysis: &Analysis) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} records from {} file(s)",
        analysis.records.len(),
        analysis.source_count
    );
    if analysis.is_empty() {
        out.push_str("No listening history to summarize.\n");
        return out;
    }

    out.push('\n');
    out.push_str(&analysis.dashboard.scatter.title);
    out.push('\n');
    let _ = writeln!(out, "{:>4}  {:<NAME_WIDTH$}  {:>10}  {:>8}", "#", "artist", "hours", "tracks");
    for (index, row) in analysis.artists.iter().take(SCATTER_ARTISTS).enumerate() {
        let _ = writeln!(
            out,
            "{:>4}  {:<NAME_WIDTH$}  {:>10.2}  {:>8}",
            index + 1,
            clip(row.label()),
            row.hrs_played,
            row.tracks
        );
    }

    out.push('\n');
    out.push_str(&analysis.dashboard.year_bars.title);
    out.push('\n');
    let mut header = format!("{:>4}  {:<NAME_WIDTH$}", "#", "artist");
    for window in analysis.years.windows.iter().rev() {
        let _ = write!(header, "  {:>16}", format!("{} h / tracks", window.label));
    }
    out.push_str(header.trim_end());
    out.push('\n');
    for (index, row) in analysis.years.rows.iter().take(BAR_ARTISTS).enumerate() {
        let label = artist_label(row.artist_name.as_deref());
        let mut line = format!("{:>4}  {:<NAME_WIDTH$}", index + 1, clip(label));
        for year in (0..WINDOW_COUNT).rev() {
            let cell = row.years[year]
                .map(|stats| format!("{:.2} / {}", stats.hrs_played, stats.tracks))
                .unwrap_or_else(|| String::from("-"));
            let _ = write!(line, "  {cell:>16}");
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out.push('\n');
    for chart in &analysis.dashboard.artists {
        let _ = writeln!(
            out,
            "{}  [{} plays]",
            chart.histogram.title,
            chart.histogram.total()
        );
    }
    if analysis.dashboard.artists.is_empty() {
        let _ = writeln!(
            out,
            "No artist played in {}.",
            analysis.years.windows.most_recent().label
        );
    }
    out
}

fn clip(name: &str) -> String {
    if name.chars().count() <= NAME_WIDTH {
        return name.to_string();
    }
    let mut clipped: String = name.chars().take(NAME_WIDTH - 3).collect();
    clipped.push_str("...");
    clipped
}
