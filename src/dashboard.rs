use crate::charts::{ArtistHistogram, TopArtistCount};
use crate::config::{self, Preferences, Theme};
use crate::pipeline::{Analysis, AnalysisOptions, analyze_paths};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Scatter,
    YearBars,
    Timeline,
    Artists,
}

impl Page {
    pub const ALL: [Page; 4] = [Self::Scatter, Self::YearBars, Self::Timeline, Self::Artists];

    pub fn label(self) -> &'static str {
        match self {
            Self::Scatter => "Top 10",
            Self::YearBars => "Years",
            Self::Timeline => "All Time",
            Self::Artists => "Artists",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Scatter => Self::YearBars,
            Self::YearBars => Self::Timeline,
            Self::Timeline => Self::Artists,
            Self::Artists => Self::Scatter,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Scatter => Self::Artists,
            Self::YearBars => Self::Scatter,
            Self::Timeline => Self::YearBars,
            Self::Artists => Self::Timeline,
        }
    }
}

/// Stored preference values hidden by a one-run command-line override. They
/// are what gets saved until the user changes that setting in the dashboard.
#[derive(Debug, Default)]
struct Displaced {
    top_artists: Option<TopArtistCount>,
    first_year: Option<Option<i32>>,
}

/// Interactive shell state. The analysis itself is rebuilt from scratch by
/// `pipeline::analyze_paths` on every trigger; nothing here feeds into it
/// except the explicit options.
#[derive(Debug)]
pub struct DashboardCore {
    pub inputs: Vec<PathBuf>,
    pub top_artists: TopArtistCount,
    pub first_year: Option<i32>,
    pub example_path: PathBuf,
    pub theme: Theme,
    pub analysis: Option<Analysis>,
    pub page: Page,
    pub selected_artist: usize,
    pub dirty: bool,
    pub status: String,
    displaced: Displaced,
}

impl DashboardCore {
    pub fn from_preferences(preferences: Preferences) -> Self {
        Self {
            top_artists: preferences.top_artist_count(),
            inputs: preferences.last_inputs,
            first_year: preferences.first_year,
            example_path: preferences.example_path,
            theme: preferences.theme,
            analysis: None,
            page: Page::Scatter,
            selected_artist: 0,
            dirty: true,
            status: String::from("Load history with :load <path> or press e for the example"),
            displaced: Displaced::default(),
        }
    }

    pub fn preferences(&self) -> Preferences {
        Preferences {
            top_artists: self.displaced.top_artists.unwrap_or(self.top_artists).get(),
            first_year: self.displaced.first_year.unwrap_or(self.first_year),
            example_path: self.example_path.clone(),
            last_inputs: self.inputs.clone(),
            theme: self.theme,
        }
    }

    pub fn save(&mut self) -> anyhow::Result<()> {
        config::save_preferences(&self.preferences())?;
        self.set_status("Preferences saved");
        Ok(())
    }

    pub fn options(&self) -> AnalysisOptions {
        AnalysisOptions {
            top_artists: self.top_artists,
            first_year: self.first_year,
        }
    }

    /// Re-runs the whole pipeline on the current inputs. A failure clears
    /// every chart.
    pub fn run_analysis(&mut self) {
        if self.inputs.is_empty() {
            self.analysis = None;
            self.set_status("No input files. Use :load <path> or press e");
            return;
        }

        match analyze_paths(&self.inputs, &self.options()) {
            Ok(analysis) => {
                let status = if analysis.is_empty() {
                    String::from("History is empty, nothing to chart")
                } else {
                    format!(
                        "Analyzed {} records from {} file(s), top {}",
                        analysis.records.len(),
                        analysis.source_count,
                        self.top_artists.get()
                    )
                };
                self.selected_artist = self
                    .selected_artist
                    .min(analysis.dashboard.artists.len().saturating_sub(1));
                self.analysis = Some(analysis);
                self.set_status(&status);
            }
            Err(err) => {
                warn!(error = %err, "analysis failed");
                self.analysis = None;
                self.set_status(&format!("analysis failed: {err}"));
            }
        }
    }

    pub fn load_inputs(&mut self, paths: Vec<PathBuf>) {
        info!(inputs = paths.len(), "loading streaming history");
        self.inputs = paths.iter().map(|path| config::normalize_path(path)).collect();
        self.selected_artist = 0;
        self.run_analysis();
    }

    pub fn load_example(&mut self) {
        let example = self.example_path.clone();
        self.load_inputs(vec![example]);
    }

    /// Uses `count` for this session only; `preferences()` keeps the stored
    /// value.
    pub fn override_top_artists(&mut self, count: TopArtistCount) {
        self.displaced.top_artists.get_or_insert(self.top_artists);
        self.top_artists = count;
    }

    pub fn override_first_year(&mut self, year: i32) {
        self.displaced.first_year.get_or_insert(self.first_year);
        self.first_year = Some(year);
    }

    pub fn set_top_artists(&mut self, count: TopArtistCount) {
        self.displaced.top_artists = None;
        if count == self.top_artists {
            return;
        }
        self.top_artists = count;
        if self.inputs.is_empty() {
            self.set_status(&format!("Top artists: {}", count.get()));
        } else {
            self.run_analysis();
        }
    }

    pub fn set_first_year(&mut self, year: Option<i32>) {
        self.displaced.first_year = None;
        self.first_year = year;
        if self.inputs.is_empty() {
            let label = year.map_or_else(|| String::from("auto"), |year| year.to_string());
            self.set_status(&format!("First compared year: {label}"));
        } else {
            self.run_analysis();
        }
    }

    pub fn next_page(&mut self) {
        self.page = self.page.next();
        self.dirty = true;
    }

    pub fn prev_page(&mut self) {
        self.page = self.page.prev();
        self.dirty = true;
    }

    pub fn select_next_artist(&mut self) {
        let count = self.artist_charts().len();
        if count == 0 {
            return;
        }
        self.selected_artist = (self.selected_artist + 1).min(count - 1);
        self.dirty = true;
    }

    pub fn select_prev_artist(&mut self) {
        self.selected_artist = self.selected_artist.saturating_sub(1);
        self.dirty = true;
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggle();
        self.dirty = true;
    }

    pub fn artist_charts(&self) -> &[ArtistHistogram] {
        self.analysis
            .as_ref()
            .map(|analysis| analysis.dashboard.artists.as_slice())
            .unwrap_or_default()
    }

    pub fn selected_artist_chart(&self) -> Option<&ArtistHistogram> {
        self.artist_charts().get(self.selected_artist)
    }

    pub fn input_summary(&self) -> String {
        match self.inputs.as_slice() {
            [] => String::from("no input"),
            [single] => display_name(single),
            [first, rest @ ..] => format!("{} +{}", display_name(first), rest.len()),
        }
    }

    pub fn set_status(&mut self, message: &str) {
        self.status = message.to_string();
        self.dirty = true;
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const HISTORY: &str = r#"[
        {"ts": "2022-03-01T10:00:00Z", "ms_played": 3600000,
         "master_metadata_track_name": "t", "master_metadata_album_album_name": "x",
         "master_metadata_album_artist_name": "A"},
        {"ts": "2022-04-01T10:00:00Z", "ms_played": 1800000,
         "master_metadata_track_name": "t", "master_metadata_album_album_name": "x",
         "master_metadata_album_artist_name": "B"},
        {"ts": "2021-04-01T10:00:00Z", "ms_played": 1800000,
         "master_metadata_track_name": "t", "master_metadata_album_album_name": "x",
         "master_metadata_album_artist_name": "C"}
    ]"#;

    #[test]
    fn page_cycle_visits_every_page() {
        let mut page = Page::Scatter;
        for expected in Page::ALL.iter().skip(1) {
            page = page.next();
            assert_eq!(page, *expected);
        }
        assert_eq!(page.next(), Page::Scatter);
        assert_eq!(Page::Scatter.prev(), Page::Artists);
    }

    #[test]
    fn analysis_follows_top_count_changes() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("history.json");
        fs::write(&path, HISTORY).expect("write");

        let mut core = DashboardCore::from_preferences(Preferences::default());
        core.load_inputs(vec![path]);
        assert_eq!(core.artist_charts().len(), 3);

        core.set_top_artists(TopArtistCount::clamped(1));
        assert_eq!(core.artist_charts().len(), 1);
        assert_eq!(core.artist_charts()[0].artist, "A");
        assert!(core.status.contains("top 1"));
    }

    #[test]
    fn failed_analysis_clears_previous_charts() {
        let dir = tempdir().expect("tempdir");
        let good = dir.path().join("good.json");
        let bad = dir.path().join("bad.json");
        fs::write(&good, HISTORY).expect("write");
        fs::write(&bad, "[1, 2]").expect("write");

        let mut core = DashboardCore::from_preferences(Preferences::default());
        core.load_inputs(vec![good.clone()]);
        assert!(core.analysis.is_some());

        core.load_inputs(vec![good, bad]);
        assert!(core.analysis.is_none());
        assert!(core.status.contains("bad.json"));
        assert!(core.artist_charts().is_empty());
    }

    #[test]
    fn artist_selection_stays_in_bounds() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("history.json");
        fs::write(&path, HISTORY).expect("write");

        let mut core = DashboardCore::from_preferences(Preferences::default());
        core.select_next_artist();
        assert_eq!(core.selected_artist, 0);

        core.load_inputs(vec![path]);
        for _ in 0..10 {
            core.select_next_artist();
        }
        assert_eq!(core.selected_artist, 2);

        core.set_top_artists(TopArtistCount::clamped(1));
        assert_eq!(core.selected_artist, 0);
        assert!(core.selected_artist_chart().is_some());
    }

    #[test]
    fn preferences_reflect_session_state() {
        let mut core = DashboardCore::from_preferences(Preferences::default());
        core.top_artists = TopArtistCount::clamped(9);
        core.first_year = Some(2018);
        core.toggle_theme();

        let preferences = core.preferences();
        assert_eq!(preferences.top_artists, 9);
        assert_eq!(preferences.first_year, Some(2018));
        assert_eq!(preferences.theme, Theme::Light);
    }

    #[test]
    fn missing_example_reports_error() {
        let dir = tempdir().expect("tempdir");
        let mut core = DashboardCore::from_preferences(Preferences {
            example_path: dir.path().join("data.json"),
            ..Preferences::default()
        });
        core.load_example();
        assert!(core.analysis.is_none());
        assert!(core.status.starts_with("analysis failed"));
    }

    #[test]
    fn command_line_overrides_are_not_saved() {
        let stored = Preferences {
            top_artists: 7,
            first_year: Some(2016),
            ..Preferences::default()
        };
        let mut core = DashboardCore::from_preferences(stored);
        core.override_top_artists(TopArtistCount::clamped(40));
        core.override_first_year(2020);

        assert_eq!(core.options().top_artists.get(), 40);
        assert_eq!(core.options().first_year, Some(2020));
        let preferences = core.preferences();
        assert_eq!(preferences.top_artists, 7);
        assert_eq!(preferences.first_year, Some(2016));

        core.set_top_artists(TopArtistCount::clamped(12));
        core.set_first_year(None);
        let preferences = core.preferences();
        assert_eq!(preferences.top_artists, 12);
        assert_eq!(preferences.first_year, None);
    }
}
