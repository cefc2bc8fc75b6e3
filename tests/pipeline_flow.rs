use std::fs;
use std::path::PathBuf;
use streamdash::charts::TopArtistCount;
use streamdash::error::AnalysisError;
use streamdash::loader::InputSource;
use streamdash::pipeline::{AnalysisOptions, analyze, analyze_paths};
use streamdash::report;
use tempfile::tempdir;

fn play(ts: &str, ms: u64, artist: &str) -> String {
    format!(
        r#"{{"ts": "{ts}", "ms_played": {ms}, "master_metadata_track_name": "song",
            "master_metadata_album_album_name": "album",
            "master_metadata_album_artist_name": "{artist}"}}"#
    )
}

fn history(plays: &[String]) -> String {
    format!("[{}]", plays.join(","))
}

fn options(top: usize, first_year: Option<i32>) -> AnalysisOptions {
    AnalysisOptions {
        top_artists: TopArtistCount::new(top).expect("top"),
        first_year,
    }
}

#[test]
fn ranks_artists_across_files() {
    let first = history(&[
        play("2021-02-01T10:00:00Z", 60_000, "A"),
        play("2021-03-01T10:00:00Z", 3_600_000, "B"),
    ]);
    let second = history(&[play("2021-04-01T10:00:00Z", 120_000, "A")]);
    let sources = vec![
        InputSource::from_bytes("one.json", first),
        InputSource::from_bytes("two.json", second),
    ];

    let analysis = analyze(&sources, &options(5, Some(2019))).expect("analysis");

    let ranked: Vec<_> = analysis
        .artists
        .iter()
        .map(|row| (row.label(), row.hrs_played, row.tracks))
        .collect();
    assert_eq!(ranked, vec![("B", 1.0, 1), ("A", 0.05, 2)]);
    assert_eq!(analysis.source_count, 2);
    assert_eq!(analysis.dashboard.artists.len(), 2);
    assert_eq!(analysis.dashboard.artists[0].artist, "B");
    assert_eq!(analysis.dashboard.timeline.total(), 3);
}

#[test]
fn same_input_gives_same_dashboard() {
    let sources = vec![InputSource::from_bytes(
        "history.json",
        history(&[
            play("2020-05-01T10:00:00Z", 600_000, "A"),
            play("2021-05-01T10:00:00Z", 900_000, "B"),
            play("2022-05-01T10:00:00Z", 300_000, "C"),
        ]),
    )];
    let opts = options(3, None);

    let first = analyze(&sources, &opts).expect("analysis");
    let second = analyze(&sources, &opts).expect("analysis");

    assert_eq!(first, second);
    assert_eq!(first.years.windows.most_recent().label, "2022");
}

#[test]
fn empty_history_renders_no_artist_charts() {
    let sources = vec![InputSource::from_bytes("empty.json", "[]")];

    let analysis = analyze(&sources, &options(1, None)).expect("analysis");

    assert!(analysis.is_empty());
    assert!(analysis.dashboard.artists.is_empty());
    assert!(analysis.dashboard.scatter.points.is_empty());
    assert!(analysis.dashboard.timeline.bins.is_empty());
    assert!(report::render_text(&analysis).contains("No listening history"));
}

#[test]
fn one_bad_file_fails_the_whole_run() {
    let sources = vec![
        InputSource::from_bytes("good.json", history(&[play("2021-01-01T00:00:00Z", 1, "A")])),
        InputSource::from_bytes("broken.json", "{not json"),
    ];

    let err = analyze(&sources, &options(5, None)).expect_err("malformed");

    match err {
        AnalysisError::MalformedInput { source_name, .. } => assert_eq!(source_name, "broken.json"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn missing_column_is_reported() {
    let sources = vec![InputSource::from_bytes(
        "partial.json",
        r#"[{"ts": "2021-01-01T00:00:00Z", "ms_played": 10}]"#,
    )];

    let err = analyze(&sources, &options(5, None)).expect_err("missing field");

    assert!(matches!(err, AnalysisError::MissingField { .. }));
}

#[test]
fn loads_every_json_file_in_a_folder() {
    let dir = tempdir().expect("tempdir");
    fs::write(
        dir.path().join("Streaming_History_Audio_2021.json"),
        history(&[play("2021-06-01T00:00:00Z", 7_200_000, "A")]),
    )
    .expect("write");
    fs::write(
        dir.path().join("Streaming_History_Audio_2022.JSON"),
        history(&[play("2022-06-01T00:00:00Z", 3_600_000, "B")]),
    )
    .expect("write");
    fs::write(dir.path().join("notes.txt"), "not history").expect("write");

    let analysis =
        analyze_paths(&[dir.path().to_path_buf()], &options(5, None)).expect("analysis");

    assert_eq!(analysis.source_count, 2);
    assert_eq!(analysis.records.len(), 2);
    let year_leader = analysis.years.rows[0].artist_name.as_deref();
    assert_eq!(year_leader, Some("B"));
}

#[test]
fn missing_path_is_an_io_error() {
    let err = analyze_paths(&[PathBuf::from("/definitely/not/here.json")], &options(5, None))
        .expect_err("io");
    assert!(matches!(err, AnalysisError::Io { .. }));
}

#[test]
fn json_report_lists_top_artists() {
    let sources = vec![InputSource::from_bytes(
        "history.json",
        history(&[
            play("2022-01-05T00:00:00Z", 3_600_000, "A"),
            play("2022-02-05T00:00:00Z", 1_800_000, "B"),
        ]),
    )];
    let analysis = analyze(&sources, &options(1, None)).expect("analysis");

    let rendered = report::render_json(&analysis).expect("json");
    let value: serde_json::Value = serde_json::from_str(&rendered).expect("parse");

    assert_eq!(value["top_artists"].as_array().map(Vec::len), Some(1));
}
