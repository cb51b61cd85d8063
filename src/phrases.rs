use std::{collections::HashMap, fs, path::Path};

use crate::{error::GestureError, types::GestureLabel};

/// Label to spoken phrase mapping, loaded once and read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct PhraseTable {
    phrases: HashMap<String, String>,
}

impl PhraseTable {
    pub fn from_map(phrases: HashMap<String, String>) -> Self {
        Self { phrases }
    }

    /// Reads a flat JSON object of `"OPEN_PALM": "Hello"` style entries.
    pub fn load(path: &Path) -> Result<Self, GestureError> {
        let text = fs::read_to_string(path).map_err(|source| GestureError::PhraseTableIo {
            path: path.to_path_buf(),
            source,
        })?;
        let phrases = serde_json::from_str(&text).map_err(|source| {
            GestureError::PhraseTableFormat {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Ok(Self { phrases })
    }

    /// Like [`PhraseTable::load`], but a missing file yields an empty table so
    /// every label falls back to its default rendering.
    pub fn load_or_default(path: &Path) -> Result<Self, GestureError> {
        match Self::load(path) {
            Err(GestureError::PhraseTableIo { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                log::warn!(
                    "phrase table {} not found, using default phrases",
                    path.display()
                );
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Phrase for `label`; `None` has nothing to say.
    pub fn phrase(&self, label: GestureLabel) -> Option<String> {
        let key = label.key()?;
        Some(
            self.phrases
                .get(key)
                .cloned()
                .unwrap_or_else(|| title_case(key)),
        )
    }
}

/// `THUMBS_UP` -> `Thumbs Up`.
fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
