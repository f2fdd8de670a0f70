use thiserror::Error;

/// Errors a single test case can fail with. Each is caught at the
/// validation-runner boundary; none propagates past the case that raised it.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The audio source could not be opened at all (missing file, unsupported
    /// container, no input device). The case aborts before streaming starts.
    #[error("failed to open audio source {path}: {message}")]
    SourceOpen { path: String, message: String },

    /// A read or decode failure partway through the stream. The case aborts
    /// and whatever counters had accumulated are discarded.
    #[error("decode failure while reading samples: {0}")]
    Decode(String),

    /// The tempo analyzer rejected its configuration or a chunk.
    #[error("tempo analysis failed: {0}")]
    Analysis(String),

    /// The case finished without a single detection event, so its accuracy
    /// percentage is undefined. Such cases contribute nothing to the set mean.
    #[error("no detections recorded for [{label}]; accuracy is undefined")]
    NoDetections { label: String },
}

pub type Result<T> = std::result::Result<T, HarnessError>;
