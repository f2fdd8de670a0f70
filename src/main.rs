use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, bail};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use tempo_check::accuracy::TestSet;
use tempo_check::report::write_report;
use tempo_check::streaming;
use tempo_check::validation::{ValidationConfig, ValidationRunner};

fn usage(program: &str) {
    eprintln!("Usage: {program} <suite.json>... [--plot-dir DIR] [--report FILE]");
    eprintln!("       {program} --stream [MIN_BPM MAX_BPM]");
}

fn main() -> anyhow::Result<()> {
    let _ = TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage(&args[0]);
        return Ok(());
    }

    if args[1] == "--stream" {
        let min_tempo: f32 = match args.get(2) {
            Some(v) => v.parse().context("MIN_BPM must be a number")?,
            None => 40.0,
        };
        let max_tempo: f32 = match args.get(3) {
            Some(v) => v.parse().context("MAX_BPM must be a number")?,
            None => 240.0,
        };
        return streaming::run_live(min_tempo, max_tempo);
    }

    let mut suite_paths: Vec<PathBuf> = Vec::new();
    let mut plot_dir: Option<PathBuf> = None;
    let mut report_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--plot-dir" => {
                let value = args.get(i + 1).context("missing value for --plot-dir")?;
                plot_dir = Some(PathBuf::from(value));
                i += 2;
            }
            "--report" => {
                let value = args.get(i + 1).context("missing value for --report")?;
                report_path = Some(PathBuf::from(value));
                i += 2;
            }
            flag if flag.starts_with("--") => bail!("unknown flag {flag}"),
            path => {
                suite_paths.push(PathBuf::from(path));
                i += 1;
            }
        }
    }

    if suite_paths.is_empty() {
        usage(&args[0]);
        return Ok(());
    }

    let mut sets: Vec<TestSet> = Vec::with_capacity(suite_paths.len());
    for path in &suite_paths {
        let file = File::open(path).with_context(|| format!("cannot open suite {}", path.display()))?;
        let set: TestSet = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("malformed suite {}", path.display()))?;
        sets.push(set);
    }

    let runner = ValidationRunner::new(ValidationConfig {
        plot_dir,
        ..ValidationConfig::default()
    });
    let reports = runner.run_sets(&mut sets);

    if let Some(path) = report_path {
        write_report(&path, &reports)?;
        println!("Wrote report to {}", path.display());
    }

    Ok(())
}
