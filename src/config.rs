use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::GestureError;

pub const DEFAULT_CONFIG_PATH: &str = "signlink.toml";

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub stabilizer: StabilizerConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default = "default_labels")]
    pub labels: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            stabilizer: StabilizerConfig::default(),
            speech: SpeechConfig::default(),
            source: SourceConfig::default(),
            labels: default_labels(),
        }
    }
}

fn default_labels() -> PathBuf {
    PathBuf::from("assets/labels.json")
}

// ============================================================================
// Classifier Config
// ============================================================================

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct ClassifierConfig {
    /// Thumb tip to index tip distance below which a hand reads as "OK"
    #[serde(default = "default_ok_distance")]
    pub ok_distance: f32,
    /// Wrist x spread that counts as a wave
    #[serde(default = "default_wave_amplitude")]
    pub wave_amplitude: f32,
    /// Minimum wrist samples before a wave can be detected
    #[serde(default = "default_wave_min_samples")]
    pub wave_min_samples: usize,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            ok_distance: default_ok_distance(),
            wave_amplitude: default_wave_amplitude(),
            wave_min_samples: default_wave_min_samples(),
            history_capacity: default_history_capacity(),
        }
    }
}

fn default_ok_distance() -> f32 {
    0.05
}

fn default_wave_amplitude() -> f32 {
    0.06
}

fn default_wave_min_samples() -> usize {
    6
}

fn default_history_capacity() -> usize {
    20
}

// ============================================================================
// Stabilizer Config
// ============================================================================

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct StabilizerConfig {
    /// A label must be seen on strictly more consecutive frames than this
    #[serde(default = "default_stable_frames")]
    pub stable_frames: u32,
    /// Frames during which no new phrase may be spoken after one fires
    #[serde(default = "default_cooldown_frames")]
    pub cooldown_frames: u32,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            stable_frames: default_stable_frames(),
            cooldown_frames: default_cooldown_frames(),
        }
    }
}

fn default_stable_frames() -> u32 {
    6
}

fn default_cooldown_frames() -> u32 {
    30
}

// ============================================================================
// Speech Config
// ============================================================================

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SpeechBackend {
    /// eSpeak / eSpeak NG command line synthesizer
    Espeak,
    /// macOS `say`
    Say,
    /// No audio, phrases go to the log
    Log,
}

impl Default for SpeechBackend {
    fn default() -> Self {
        if cfg!(target_os = "macos") {
            SpeechBackend::Say
        } else {
            SpeechBackend::Espeak
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct SpeechConfig {
    #[serde(default)]
    pub engine: SpeechBackend,
    /// Words per minute
    #[serde(default = "default_rate")]
    pub rate: u32,
    /// 0.0 - 1.0
    #[serde(default = "default_volume")]
    pub volume: f32,
    /// How long the last utterance may keep playing once input runs out
    #[serde(default = "default_finish_timeout_ms")]
    pub finish_timeout_ms: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            engine: SpeechBackend::default(),
            rate: default_rate(),
            volume: default_volume(),
            finish_timeout_ms: default_finish_timeout_ms(),
        }
    }
}

fn default_rate() -> u32 {
    180
}

fn default_volume() -> f32 {
    1.0
}

fn default_finish_timeout_ms() -> u64 {
    5000
}

// ============================================================================
// Source Config
// ============================================================================

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct SourceConfig {
    /// Replay pacing; 0 replays as fast as frames can be read
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Reflect x coordinates for input that is not already selfie-mirrored
    #[serde(default)]
    pub mirror: bool,
    #[serde(default = "default_min_hand_confidence")]
    pub min_hand_confidence: f32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            mirror: false,
            min_hand_confidence: default_min_hand_confidence(),
        }
    }
}

fn default_fps() -> u32 {
    30
}

fn default_min_hand_confidence() -> f32 {
    0.5
}

impl Config {
    /// Loads `path` if given (it must exist), otherwise `signlink.toml` in the
    /// working directory when present, otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, GestureError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self, GestureError> {
        let text = fs::read_to_string(path).map_err(|source| GestureError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    fn parse(text: &str, path: &Path) -> Result<Self, GestureError> {
        toml::from_str(text).map_err(|source| GestureError::ConfigFormat {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("", Path::new("test.toml")).unwrap();
        assert_eq!(config.classifier, ClassifierConfig::default());
        assert_eq!(config.stabilizer.stable_frames, 6);
        assert_eq!(config.stabilizer.cooldown_frames, 30);
        assert_eq!(config.speech.rate, 180);
        assert_eq!(config.speech.finish_timeout_ms, 5000);
        assert_eq!(config.source.fps, 30);
        assert_eq!(config.labels, PathBuf::from("assets/labels.json"));
    }

    #[test]
    fn sections_override_individual_fields() {
        let text = r#"
            labels = "custom.json"

            [stabilizer]
            cooldown_frames = 45

            [speech]
            engine = "log"
            volume = 0.5
        "#;
        let config = Config::parse(text, Path::new("test.toml")).unwrap();
        assert_eq!(config.stabilizer.stable_frames, 6);
        assert_eq!(config.stabilizer.cooldown_frames, 45);
        assert_eq!(config.speech.engine, SpeechBackend::Log);
        assert_eq!(config.speech.volume, 0.5);
        assert_eq!(config.speech.rate, 180);
        assert_eq!(config.labels, PathBuf::from("custom.json"));
    }

    #[test]
    fn malformed_file_is_reported() {
        let err = Config::parse("[speech]\nengine = \"robot\"", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, GestureError::ConfigFormat { .. }));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/signlink.toml"))).unwrap_err();
        assert!(matches!(err, GestureError::ConfigIo { .. }));
    }
}
