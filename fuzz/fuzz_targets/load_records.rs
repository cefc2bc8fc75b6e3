#![no_main]

use libfuzzer_sys::fuzz_target;
use streamdash::charts::TopArtistCount;
use streamdash::loader::{InputSource, load_sources};
use streamdash::pipeline::{AnalysisOptions, analyze_records};
use streamdash::records::project;

fuzz_target!(|data: &[u8]| {
    let sources = [InputSource::from_bytes("fuzz.json", data)];
    let Ok(table) = load_sources(&sources) else {
        return;
    };
    let Ok(records) = project(&table) else {
        return;
    };
    let total = records.len() as u64;
    let options = AnalysisOptions {
        top_artists: TopArtistCount::clamped(usize::from(data.first().copied().unwrap_or(5))),
        first_year: None,
    };
    if let Ok(analysis) = analyze_records(1, records, &options) {
        let tracks: u64 = analysis.artists.iter().map(|row| row.tracks).sum();
        assert_eq!(tracks, total);
        assert!(analysis.dashboard.artists.len() <= options.top_artists.get());
    }
});
