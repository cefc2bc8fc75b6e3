use crate::aggregate::{ArtistSummaryRow, summarize_artists};
use crate::charts::{Dashboard, TopArtistCount, build_dashboard};
use crate::error::AnalysisResult;
use crate::loader::{InputSource, load_sources, read_sources};
use crate::records::{WorkingRecord, project};
use crate::windows::{YearWindowedSummary, YearWindows, summarize_years};
use std::path::PathBuf;
use time::OffsetDateTime;
use tracing::info;

/// Every value the analysis depends on, passed in explicitly per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnalysisOptions {
    pub top_artists: TopArtistCount,
    /// First of the three compared calendar years; derived from the data
    /// when unset.
    pub first_year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub source_count: usize,
    pub records: Vec<WorkingRecord>,
    pub artists: Vec<ArtistSummaryRow>,
    pub years: YearWindowedSummary,
    pub dashboard: Dashboard,
}

impl Analysis {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub fn analyze_paths(paths: &[PathBuf], options: &AnalysisOptions) -> AnalysisResult<Analysis> {
    let sources = read_sources(paths)?;
    analyze(&sources, options)
}

/// Load, project, aggregate and chart in one pass. Any loader or projector
/// failure aborts before a single chart is built.
pub fn analyze(sources: &[InputSource], options: &AnalysisOptions) -> AnalysisResult<Analysis> {
    let table = load_sources(sources)?;
    let records = project(&table)?;
    info!(
        sources = sources.len(),
        records = records.len(),
        "loaded streaming history"
    );
    analyze_records(sources.len(), records, options)
}

pub fn analyze_records(
    source_count: usize,
    records: Vec<WorkingRecord>,
    options: &AnalysisOptions,
) -> AnalysisResult<Analysis> {
    let windows = match options.first_year {
        Some(year) => YearWindows::consecutive(year)?,
        None => YearWindows::ending_at_latest(&records, OffsetDateTime::now_utc().year())?,
    };

    let artists = summarize_artists(&records);
    let years = summarize_years(&records, &windows);
    let dashboard = build_dashboard(&records, &artists, &years, options.top_artists);
    let compared_years: Vec<&str> = windows.iter().map(|window| window.label.as_str()).collect();
    info!(
        artists = artists.len(),
        compared_years = %compared_years.join(","),
        artist_charts = dashboard.artists.len(),
        "analysis finished"
    );

    Ok(Analysis {
        source_count,
        records,
        artists,
        years,
        dashboard,
    })
}
