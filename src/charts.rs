use crate::aggregate::{ArtistSummaryRow, artist_label};
use crate::error::{AnalysisError, AnalysisResult};
use crate::records::WorkingRecord;
use crate::windows::YearWindowedSummary;
use time::{Date, Duration, OffsetDateTime, UtcOffset};

pub const HISTOGRAM_BINS: usize = 38;
pub const SCATTER_ARTISTS: usize = 10;
pub const BAR_ARTISTS: usize = 20;

const MIN_BIN_WIDTH_NANOS: i128 = 1_000_000_000;

/// How many artists get their own histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopArtistCount(usize);

impl TopArtistCount {
    pub const MIN: usize = 1;
    pub const MAX: usize = 50;
    pub const DEFAULT: usize = 5;

    pub fn new(count: usize) -> AnalysisResult<Self> {
        if !(Self::MIN..=Self::MAX).contains(&count) {
            return Err(AnalysisError::InvalidTopCount(count));
        }
        Ok(Self(count))
    }

    pub fn clamped(count: usize) -> Self {
        Self(count.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> usize {
        self.0
    }

    pub fn increment(self) -> Self {
        Self::clamped(self.0.saturating_add(1))
    }

    pub fn decrement(self) -> Self {
        Self::clamped(self.0.saturating_sub(1))
    }
}

impl Default for TopArtistCount {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub label: String,
    pub tracks: u64,
    pub hrs_played: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterChart {
    pub title: String,
    pub points: Vec<ScatterPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearBar {
    /// Index into `GroupedBarChart::series`.
    pub series: usize,
    pub hrs_played: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarGroup {
    pub artist: String,
    pub bars: Vec<YearBar>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupedBarChart {
    pub title: String,
    /// Series labels, most recent year first.
    pub series: Vec<String>,
    pub groups: Vec<BarGroup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistogramBin {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    pub title: String,
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    pub fn total(&self) -> u64 {
        self.bins.iter().map(|bin| bin.count).sum()
    }

    pub fn max_count(&self) -> u64 {
        self.bins.iter().map(|bin| bin.count).max().unwrap_or(0)
    }

    pub fn span(&self) -> Option<(OffsetDateTime, OffsetDateTime)> {
        Some((self.bins.first()?.start, self.bins.last()?.end))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistHistogram {
    pub rank: usize,
    pub artist: String,
    pub first_listened: Option<Date>,
    pub histogram: Histogram,
}

/// Every chart produced by one analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub scatter: ScatterChart,
    pub year_bars: GroupedBarChart,
    pub timeline: Histogram,
    pub artists: Vec<ArtistHistogram>,
}

pub fn build_dashboard(
    records: &[WorkingRecord],
    artists: &[ArtistSummaryRow],
    years: &YearWindowedSummary,
    top: TopArtistCount,
) -> Dashboard {
    Dashboard {
        scatter: top_artists_scatter(artists),
        year_bars: top_year_bars(years),
        timeline: all_time_histogram(records),
        artists: artist_histograms(records, years, top),
    }
}

pub fn top_artists_scatter(summary: &[ArtistSummaryRow]) -> ScatterChart {
    ScatterChart {
        title: format!(
            "Top {SCATTER_ARTISTS} Artists - Based on number of tracks and total hours played"
        ),
        points: summary
            .iter()
            .take(SCATTER_ARTISTS)
            .map(|row| ScatterPoint {
                label: row.label().to_string(),
                tracks: row.tracks,
                hrs_played: row.hrs_played,
            })
            .collect(),
    }
}

pub fn top_year_bars(summary: &YearWindowedSummary) -> GroupedBarChart {
    let series = summary
        .windows
        .iter()
        .rev()
        .map(|window| window.label.clone())
        .collect();

    let groups = summary
        .rows
        .iter()
        .take(BAR_ARTISTS)
        .map(|row| BarGroup {
            artist: artist_label(row.artist_name.as_deref()).to_string(),
            bars: row
                .years
                .iter()
                .rev()
                .enumerate()
                .filter_map(|(series, stats)| {
                    stats.map(|stats| YearBar {
                        series,
                        hrs_played: stats.hrs_played,
                    })
                })
                .collect(),
        })
        .collect();

    GroupedBarChart {
        title: format!("Top {BAR_ARTISTS} Artists - Total hours played each year"),
        series,
        groups,
    }
}

pub fn all_time_histogram(records: &[WorkingRecord]) -> Histogram {
    timestamp_histogram(
        "All Time - Number of tracks monthly",
        records.iter().filter_map(|record| record.ts),
        HISTOGRAM_BINS,
    )
}

/// Buckets timestamps into `bin_count` equal-width bins spanning the observed
/// range; the latest timestamp lands in the last bin.
pub fn timestamp_histogram<I>(title: &str, timestamps: I, bin_count: usize) -> Histogram
where
    I: IntoIterator<Item = OffsetDateTime>,
{
    let timestamps: Vec<OffsetDateTime> = timestamps
        .into_iter()
        .map(|ts| ts.to_offset(UtcOffset::UTC))
        .collect();
    let title = title.to_string();

    let (Some(first), Some(last)) = (timestamps.iter().min(), timestamps.iter().max()) else {
        return Histogram {
            title,
            bins: Vec::new(),
        };
    };
    if bin_count == 0 {
        return Histogram {
            title,
            bins: Vec::new(),
        };
    }

    let start = *first;
    let span = (*last - start).whole_nanoseconds();
    let bins = bin_count as i128;
    let width = ((span + bins - 1) / bins).max(MIN_BIN_WIDTH_NANOS);

    let mut counts = vec![0_u64; bin_count];
    for ts in &timestamps {
        let offset = (*ts - start).whole_nanoseconds();
        let index = (offset / width).clamp(0, bins - 1) as usize;
        counts[index] = counts[index].saturating_add(1);
    }

    let width = Duration::nanoseconds(i64::try_from(width).unwrap_or(i64::MAX));
    let bins = counts
        .into_iter()
        .enumerate()
        .map(|(index, count)| {
            let bin_start = start.saturating_add(width.saturating_mul(index as i32));
            HistogramBin {
                start: bin_start,
                end: bin_start.saturating_add(width),
                count,
            }
        })
        .collect();

    Histogram { title, bins }
}

/// One histogram per top artist of the year-windowed ranking, over the
/// artist's whole history. Asking for more artists than exist is not an error.
pub fn artist_histograms(
    records: &[WorkingRecord],
    summary: &YearWindowedSummary,
    top: TopArtistCount,
) -> Vec<ArtistHistogram> {
    summary
        .rows
        .iter()
        .take(top.get())
        .enumerate()
        .map(|(index, row)| {
            let artist_name = row.artist_name.as_deref();
            let artist = artist_label(artist_name).to_string();
            let timestamps: Vec<OffsetDateTime> = records
                .iter()
                .filter(|record| record.artist_name.as_deref() == artist_name)
                .filter_map(|record| record.ts)
                .collect();
            let first_listened = timestamps
                .iter()
                .min()
                .map(|ts| ts.to_offset(UtcOffset::UTC).date());
            let rank = index + 1;
            let title = format!(
                "TOP {rank} Artist - {artist} (first listened on {})",
                first_listened
                    .map(|date| date.to_string())
                    .unwrap_or_else(|| String::from("unknown date"))
            );
            ArtistHistogram {
                rank,
                artist,
                first_listened,
                histogram: timestamp_histogram(&title, timestamps, HISTOGRAM_BINS),
            }
        })
        .collect()
}
