use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GestureError {
    #[error("joint set must have {expected} points, got {actual}")]
    InvalidInput { expected: usize, actual: usize },

    #[error("failed to read phrase table {path}")]
    PhraseTableIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed phrase table {path}")]
    PhraseTableFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read config {path}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config {path}")]
    ConfigFormat {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("speech worker is no longer running")]
    SpeechWorkerStopped,

    #[error("speech engine failed: {0}")]
    SpeechEngine(String),
}
