use anyhow::Context;
use std::path::PathBuf;
use streamdash::charts::TopArtistCount;
use streamdash::config;
use streamdash::dashboard::DashboardCore;
use streamdash::logging::{self, LogTarget};
use streamdash::pipeline::{AnalysisOptions, analyze_paths};
use streamdash::report;
use tracing::info;

#[derive(Debug, Default)]
struct CliArgs {
    top: Option<usize>,
    first_year: Option<i32>,
    example: bool,
    report: bool,
    json: bool,
    inputs: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1).collect())?;
    let preferences = config::load_preferences()?;
    let top_override = args.top.map(TopArtistCount::new).transpose()?;

    let inputs = if args.example {
        vec![preferences.example_path.clone()]
    } else {
        args.inputs.clone()
    };

    if args.report {
        logging::init(LogTarget::Stderr)?;
        if inputs.is_empty() {
            anyhow::bail!("--report needs at least one input path (or --example)");
        }
        let options = AnalysisOptions {
            top_artists: top_override.unwrap_or_else(|| preferences.top_artist_count()),
            first_year: args.first_year.or(preferences.first_year),
        };
        let analysis = analyze_paths(&inputs, &options).context("analysis failed")?;
        let rendered = if args.json {
            report::render_json(&analysis)?
        } else {
            report::render_text(&analysis)
        };
        println!("{rendered}");
        return Ok(());
    }

    config::ensure_config_dir()?;
    logging::init(LogTarget::File(config::log_path()?))?;
    info!("dashboard starting");

    let mut core = DashboardCore::from_preferences(preferences);
    if let Some(count) = top_override {
        core.override_top_artists(count);
    }
    if let Some(year) = args.first_year {
        core.override_first_year(year);
    }
    if !inputs.is_empty() {
        core.load_inputs(inputs);
    } else if !core.inputs.is_empty() {
        core.run_analysis();
    }
    streamdash::app::run(core)
}

fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--top" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--top requires a number between 1 and 50");
                };
                let count = value
                    .trim()
                    .parse::<usize>()
                    .with_context(|| format!("--top expects a number, got {value}"))?;
                out.top = Some(count);
            }
            "--first-year" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--first-year requires a year such as 2020");
                };
                let year = value
                    .trim()
                    .parse::<i32>()
                    .with_context(|| format!("--first-year expects a year, got {value}"))?;
                out.first_year = Some(year);
            }
            "--example" => out.example = true,
            "--report" => out.report = true,
            "--json" => {
                out.report = true;
                out.json = true;
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other if other.starts_with("--") => anyhow::bail!("unknown argument {other}"),
            path => out.inputs.push(PathBuf::from(path)),
        }
        index += 1;
    }
    Ok(out)
}

fn print_help() {
    println!("streamdash [options] [PATH...]");
    println!("  PATH               Streaming history JSON file or folder of them");
    println!("  --top N            Number of top artists to chart (1-50, default 5)");
    println!("  --first-year YYYY  First of the three compared years (default: latest three)");
    println!("  --example          Analyze the example dataset (data.json)");
    println!("  --report           Print summary tables instead of opening the dashboard");
    println!("  --json             Like --report, as JSON");
}
