use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::accuracy::{self, TestCase, TestSet};
use crate::analyzer::{AnalyzerConfig, AubioTempoAnalyzer, TempoAnalyzer};
use crate::diagnostics::PlotWriter;
use crate::error::{HarnessError, Result};
use crate::scheduler::{ChunkScheduler, DEFAULT_CHUNK_SIZE, DEFAULT_HOP_SIZE};
use crate::source::{AudioSource, FileSource};
use crate::windowing::TimeWindow;

/// Builds a fresh analyzer for each test case from the case's tempo range
/// and the source's sample rate. Injectable so tests can substitute
/// deterministic analyzers for the aubio-backed one.
pub type AnalyzerFactory =
    Box<dyn Fn(&AnalyzerConfig, usize, usize) -> Result<Box<dyn TempoAnalyzer>>>;

#[derive(Debug, Clone)]
pub struct ValidationConfig {
    pub chunk_size: usize,
    pub hop_size: usize,
    /// Directory for the per-test plot file pairs; `None` disables them.
    pub plot_dir: Option<PathBuf>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            hop_size: DEFAULT_HOP_SIZE,
            plot_dir: None,
        }
    }
}

/// Outcome of one test case.
#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub label: String,
    pub path: String,
    pub expected_bpm: f32,
    /// `None` for aborted and zero-detection cases.
    pub accuracy: Option<f32>,
    pub correct: u32,
    pub total: u32,
    pub error: Option<String>,
}

/// Outcome of one validation set.
#[derive(Debug, Clone, Serialize)]
pub struct SetReport {
    pub name: String,
    pub mean_accuracy: Option<f32>,
    pub cases: Vec<CaseReport>,
}

/// Runs validation sets strictly sequentially: within a set, no case starts
/// before the previous one finished or aborted, and each case exclusively
/// owns its source, analyzer, and plot sink for its whole run.
pub struct ValidationRunner {
    config: ValidationConfig,
    make_analyzer: AnalyzerFactory,
}

impl ValidationRunner {
    pub fn new(config: ValidationConfig) -> Self {
        Self::with_analyzer_factory(
            config,
            Box::new(|cfg, chunk_size, hop_size| {
                AubioTempoAnalyzer::new(cfg, chunk_size, hop_size)
                    .map(|a| Box::new(a) as Box<dyn TempoAnalyzer>)
            }),
        )
    }

    pub fn with_analyzer_factory(config: ValidationConfig, make_analyzer: AnalyzerFactory) -> Self {
        Self { config, make_analyzer }
    }

    pub fn run_sets(&self, sets: &mut [TestSet]) -> Vec<SetReport> {
        sets.iter_mut().map(|set| self.run_set(set)).collect()
    }

    pub fn run_set(&self, set: &mut TestSet) -> SetReport {
        log::info!("Starting validation set {}", set.name);
        set.results.clear();

        let mut cases = Vec::with_capacity(set.cases.len());
        for case in &mut set.cases {
            log::info!("Start testing: {}", case.path);
            match self.run_case(case) {
                Ok(pct) => {
                    log::info!("Finished testing: {}", case.path);
                    println!("[{}] accuracy: {:.1}%", case.label, pct);
                    set.results.push(pct);
                    cases.push(case_report(case, Some(pct), None));
                }
                Err(e @ HarnessError::NoDetections { .. }) => {
                    log::warn!("{e}");
                    cases.push(case_report(case, None, Some(e.to_string())));
                }
                Err(e) => {
                    log::error!("[{}] aborted: {}", case.label, e);
                    // Partial counters from an aborted stream are meaningless.
                    accuracy::reset_counters(case);
                    cases.push(case_report(case, None, Some(e.to_string())));
                }
            }
        }

        let mean = accuracy::set_mean(&set.results);
        match mean {
            Some(m) => println!("Validation set [{}] accuracy: {:.1}%", set.name, m),
            None => log::warn!("Validation set [{}] produced no results", set.name),
        }

        SetReport {
            name: set.name.clone(),
            mean_accuracy: mean,
            cases,
        }
    }

    /// One case: configure, stream, score, finish. The source, analyzer, and
    /// plot sink are dropped on every exit path, normal or aborted.
    fn run_case(&self, case: &mut TestCase) -> Result<f32> {
        accuracy::reset_counters(case);

        let mut sink = match &self.config.plot_dir {
            Some(dir) => match PlotWriter::create(dir, &case.label) {
                Ok(writer) => Some(writer),
                Err(e) => {
                    log::warn!("plot files unavailable for [{}]: {}", case.label, e);
                    None
                }
            },
            None => None,
        };

        let mut source = FileSource::open(Path::new(&case.path))?;
        let analyzer_config = AnalyzerConfig {
            sample_rate: source.sample_rate(),
            min_tempo: case.min_tempo,
            max_tempo: case.max_tempo,
        };
        let mut analyzer =
            (self.make_analyzer)(&analyzer_config, self.config.chunk_size, self.config.hop_size)?;
        let scheduler = ChunkScheduler::new(self.config.chunk_size, self.config.hop_size);
        let window = TimeWindow::new(case.start_time, case.end_time);

        analyzer.start();
        let outcome = scheduler.run(&mut source, &mut *analyzer, window, sink.as_mut(), |event| {
            accuracy::record_detection(case, event);
        });
        analyzer.stop();
        outcome?;

        accuracy::finish_test(case)
    }
}

fn case_report(case: &TestCase, accuracy: Option<f32>, error: Option<String>) -> CaseReport {
    CaseReport {
        label: case.label.clone(),
        path: case.path.clone(),
        expected_bpm: case.expected_bpm,
        accuracy,
        correct: case.correct,
        total: case.total,
        error,
    }
}
