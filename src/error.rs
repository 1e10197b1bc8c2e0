use thiserror::Error;

#[derive(Error, Debug)]
pub enum PeelerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("highpass filter design failed: {0}")]
    FilterDesign(String),

    #[error("unknown preprocessor engine: {0}")]
    UnknownPreprocessorEngine(String),

    #[error("invalid chunksize: {0} (must be nonzero and at least one peak width)")]
    InvalidChunksize(usize),

    #[error("cluster {cluster_index} has a degenerate (zero-norm) template")]
    DegenerateTemplate { cluster_index: usize },

    #[error("catalogue has no clusters")]
    EmptyCatalogue,

    #[error("signal has {got} channels, catalogue was built for {expected}")]
    ChannelMismatch { expected: usize, got: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("catalogue (de)serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PeelerError>;
