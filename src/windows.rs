use crate::aggregate::{ArtistSummaryRow, summarize_artists};
use crate::error::{AnalysisError, AnalysisResult};
use crate::records::WorkingRecord;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use time::{Date, Month, OffsetDateTime, UtcOffset};

pub const WINDOW_COUNT: usize = 3;

/// A half-open time range `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearWindow {
    pub label: String,
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl YearWindow {
    pub fn calendar(year: i32) -> AnalysisResult<Self> {
        Ok(Self {
            label: year.to_string(),
            start: new_year(year)?,
            end: new_year(year + 1)?,
        })
    }

    pub fn contains(&self, ts: OffsetDateTime) -> bool {
        ts >= self.start && ts < self.end
    }
}

fn new_year(year: i32) -> AnalysisResult<OffsetDateTime> {
    Date::from_calendar_date(year, Month::January, 1)
        .map(|date| date.midnight().assume_utc())
        .map_err(|err| AnalysisError::InvalidWindows(format!("year {year}: {err}")))
}

/// Three disjoint windows, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearWindows([YearWindow; WINDOW_COUNT]);

impl YearWindows {
    pub fn new(windows: [YearWindow; WINDOW_COUNT]) -> AnalysisResult<Self> {
        for window in &windows {
            if window.start >= window.end {
                return Err(AnalysisError::InvalidWindows(format!(
                    "window {} is empty",
                    window.label
                )));
            }
        }
        for pair in windows.windows(2) {
            if pair[0].end > pair[1].start {
                return Err(AnalysisError::InvalidWindows(format!(
                    "window {} overlaps or precedes {}",
                    pair[1].label, pair[0].label
                )));
            }
        }
        Ok(Self(windows))
    }

    pub fn consecutive(first_year: i32) -> AnalysisResult<Self> {
        Self::new([
            YearWindow::calendar(first_year)?,
            YearWindow::calendar(first_year + 1)?,
            YearWindow::calendar(first_year + 2)?,
        ])
    }

    /// The three calendar years ending with the year of the latest record,
    /// or with `fallback_year` when no record carries a timestamp.
    pub fn ending_at_latest(records: &[WorkingRecord], fallback_year: i32) -> AnalysisResult<Self> {
        let last_year = records
            .iter()
            .filter_map(|record| record.ts)
            .max()
            .map(|ts| ts.to_offset(UtcOffset::UTC).year())
            .unwrap_or(fallback_year);
        Self::consecutive(last_year - (WINDOW_COUNT as i32 - 1))
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &YearWindow> {
        self.0.iter()
    }

    pub fn get(&self, index: usize) -> Option<&YearWindow> {
        self.0.get(index)
    }

    pub fn most_recent(&self) -> &YearWindow {
        &self.0[WINDOW_COUNT - 1]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearStats {
    pub hrs_played: f64,
    pub tracks: u64,
}

/// One artist across the three windows; `years` is indexed like the windows,
/// oldest first, `None` where the artist had no plays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearWindowedRow {
    pub artist_name: Option<String>,
    pub years: [Option<YearStats>; WINDOW_COUNT],
}

impl YearWindowedRow {
    pub fn most_recent(&self) -> Option<YearStats> {
        self.years[WINDOW_COUNT - 1]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct YearWindowedSummary {
    pub windows: YearWindows,
    pub rows: Vec<YearWindowedRow>,
}

/// Records inside `window`, ascending by timestamp.
pub fn filter_window<'a>(records: &'a [WorkingRecord], window: &YearWindow) -> Vec<&'a WorkingRecord> {
    let mut subset: Vec<&WorkingRecord> = records
        .iter()
        .filter(|record| record.ts.is_some_and(|ts| window.contains(ts)))
        .collect();
    subset.sort_by_key(|record| record.ts);
    subset
}

pub fn summarize_window(records: &[WorkingRecord], window: &YearWindow) -> Vec<ArtistSummaryRow> {
    summarize_artists(filter_window(records, window))
}

pub fn summarize_years(records: &[WorkingRecord], windows: &YearWindows) -> YearWindowedSummary {
    let per_year: Vec<Vec<ArtistSummaryRow>> = windows
        .iter()
        .map(|window| summarize_window(records, window))
        .collect();

    let mut rows: Vec<YearWindowedRow> = Vec::new();
    let mut lookup: HashMap<Option<String>, usize> = HashMap::new();
    for (year_index, summary) in per_year.into_iter().enumerate().rev() {
        for row in summary {
            let index = *lookup.entry(row.artist_name.clone()).or_insert_with(|| {
                rows.push(YearWindowedRow {
                    artist_name: row.artist_name.clone(),
                    years: [None; WINDOW_COUNT],
                });
                rows.len() - 1
            });
            rows[index].years[year_index] = Some(YearStats {
                hrs_played: row.hrs_played,
                tracks: row.tracks,
            });
        }
    }

    rows.sort_by(compare_most_recent);
    YearWindowedSummary {
        windows: windows.clone(),
        rows,
    }
}

fn compare_most_recent(a: &YearWindowedRow, b: &YearWindowedRow) -> Ordering {
    match (a.most_recent(), b.most_recent()) {
        (Some(a), Some(b)) => b.hrs_played.total_cmp(&a.hrs_played),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use time::macros::datetime;

    fn play(artist: &str, ts: OffsetDateTime, ms: u64) -> WorkingRecord {
        WorkingRecord {
            ts: Some(ts),
            ms_played: Some(ms),
            artist_name: Some(artist.to_string()),
            ..WorkingRecord::default()
        }
    }

    fn names(summary: &YearWindowedSummary) -> Vec<&str> {
        summary
            .rows
            .iter()
            .filter_map(|row| row.artist_name.as_deref())
            .collect()
    }

    #[test]
    fn window_includes_start_and_excludes_end() {
        let window = YearWindow::calendar(2021).expect("window");
        assert!(window.contains(datetime!(2021-01-01 00:00 UTC)));
        assert!(window.contains(datetime!(2021-12-31 23:59:59 UTC)));
        assert!(!window.contains(datetime!(2022-01-01 00:00 UTC)));
        assert!(!window.contains(datetime!(2020-12-31 23:59:59.999 UTC)));
    }

    #[test]
    fn offsets_are_compared_as_instants() {
        let window = YearWindow::calendar(2021).expect("window");
        assert!(!window.contains(datetime!(2021-01-01 00:30 +01:00)));
        assert!(window.contains(datetime!(2020-12-31 23:30 -01:00)));
    }

    #[test]
    fn rejects_overlapping_windows() {
        let err = YearWindows::new([
            YearWindow::calendar(2020).expect("window"),
            YearWindow::calendar(2020).expect("window"),
            YearWindow::calendar(2022).expect("window"),
        ])
        .expect_err("overlap");
        assert!(matches!(err, AnalysisError::InvalidWindows(_)));
    }

    #[test]
    fn default_windows_end_with_latest_year() {
        let records = vec![
            play("A", datetime!(2019-05-01 00:00 UTC), 1),
            play("A", datetime!(2023-02-01 00:00 UTC), 1),
        ];
        let windows = YearWindows::ending_at_latest(&records, 1999).expect("windows");
        assert_eq!(windows.most_recent().label, "2023");
        assert_eq!(windows.get(0).map(|w| w.label.as_str()), Some("2021"));

        let fallback = YearWindows::ending_at_latest(&[], 2024).expect("windows");
        assert_eq!(fallback.most_recent().label, "2024");
    }

    #[test]
    fn filter_sorts_by_timestamp() {
        let records = vec![
            play("A", datetime!(2021-06-01 00:00 UTC), 1),
            play("B", datetime!(2021-02-01 00:00 UTC), 1),
            play("C", datetime!(2022-01-01 00:00 UTC), 1),
        ];
        let window = YearWindow::calendar(2021).expect("window");
        let subset: Vec<_> = filter_window(&records, &window)
            .into_iter()
            .filter_map(|record| record.artist_name.as_deref())
            .collect();
        assert_eq!(subset, vec!["B", "A"]);
    }

    #[test]
    fn outer_join_keeps_artists_from_any_year() {
        let records = vec![
            play("old", datetime!(2020-03-01 00:00 UTC), 3_600_000),
            play("mid", datetime!(2021-03-01 00:00 UTC), 3_600_000),
            play("new", datetime!(2022-03-01 00:00 UTC), 1_800_000),
            play("both", datetime!(2022-04-01 00:00 UTC), 7_200_000),
            play("both", datetime!(2020-04-01 00:00 UTC), 360_000),
        ];
        let windows = YearWindows::consecutive(2020).expect("windows");

        let summary = summarize_years(&records, &windows);

        assert_eq!(names(&summary), vec!["both", "new", "mid", "old"]);
        let both = &summary.rows[0];
        assert_eq!(
            both.years,
            [
                Some(YearStats {
                    hrs_played: 0.1,
                    tracks: 1
                }),
                None,
                Some(YearStats {
                    hrs_played: 2.0,
                    tracks: 1
                }),
            ]
        );
        assert_eq!(summary.rows[2].years[2], None);
        assert!(summary.rows[2].years[1].is_some());
    }

    #[test]
    fn artists_without_recent_plays_sort_last() {
        let records = vec![
            play("gone", datetime!(2021-03-01 00:00 UTC), 36_000_000),
            play("quiet", datetime!(2022-03-01 00:00 UTC), 36_000),
        ];
        let windows = YearWindows::consecutive(2020).expect("windows");

        let summary = summarize_years(&records, &windows);

        assert_eq!(names(&summary), vec!["quiet", "gone"]);
    }

    #[test]
    fn artist_set_is_union_of_years() {
        let records = vec![
            play("a", datetime!(2020-01-01 00:00 UTC), 1),
            play("b", datetime!(2021-01-01 00:00 UTC), 1),
            play("c", datetime!(2022-12-31 23:59 UTC), 1),
            play("d", datetime!(2023-01-01 00:00 UTC), 1),
        ];
        let windows = YearWindows::consecutive(2020).expect("windows");

        let summary = summarize_years(&records, &windows);

        let joined: HashSet<_> = names(&summary).into_iter().collect();
        assert_eq!(joined, HashSet::from(["a", "b", "c"]));
    }

    proptest::proptest! {
        #[test]
        fn join_never_drops_an_artist(
            plays in proptest::collection::vec((0u8..8, 0i64..(4 * 365 * 24)), 0..150)
        ) {
            let origin = datetime!(2019-07-01 00:00 UTC);
            let records: Vec<_> = plays
                .iter()
                .map(|(artist, hours)| play(&format!("a{artist}"), origin + time::Duration::hours(*hours), 60_000))
                .collect();
            let windows = YearWindows::consecutive(2020).expect("windows");

            let summary = summarize_years(&records, &windows);

            let mut expected = HashSet::new();
            for window in windows.iter() {
                for row in summarize_window(&records, window) {
                    expected.insert(row.artist_name);
                }
            }
            let joined: HashSet<_> = summary.rows.iter().map(|row| row.artist_name.clone()).collect();
            proptest::prop_assert_eq!(joined, expected);
            proptest::prop_assert_eq!(summary.rows.len(), summary.rows.iter().map(|row| &row.artist_name).collect::<HashSet<_>>().len());
        }
    }
}
