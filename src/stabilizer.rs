//! Debounces per-frame labels into spoken phrases.
//!
//! A label has to hold for more than `stable_frames` consecutive frames before
//! its phrase is emitted. After an emission, a cooldown suppresses further
//! output, and the same phrase is never emitted twice in a row.

use crate::{config::StabilizerConfig, phrases::PhraseTable, types::GestureLabel};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpeakEvent {
    pub label: GestureLabel,
    pub phrase: String,
}

#[derive(Clone, Debug)]
pub struct Stabilizer {
    config: StabilizerConfig,
    candidate: GestureLabel,
    consecutive: u32,
    cooldown_remaining: u32,
    last_spoken: String,
}

impl Stabilizer {
    pub fn new(config: StabilizerConfig) -> Self {
        Self {
            config,
            candidate: GestureLabel::None,
            consecutive: 0,
            cooldown_remaining: 0,
            last_spoken: String::new(),
        }
    }

    /// Advances one frame.
    ///
    /// `consecutive` counts the frames the candidate has been seen in a row,
    /// including the frame that introduced it; `None` never accumulates.
    pub fn update(&mut self, label: GestureLabel, phrases: &PhraseTable) -> Option<SpeakEvent> {
        if label == self.candidate && !label.is_none() {
            self.consecutive = self.consecutive.saturating_add(1);
        } else {
            if label != self.candidate {
                log::debug!("candidate {:?} -> {:?}", self.candidate, label);
            }
            self.candidate = label;
            self.consecutive = if label.is_none() { 0 } else { 1 };
        }

        self.cooldown_remaining = self.cooldown_remaining.saturating_sub(1);

        if !self.is_stable() || self.cooldown_remaining > 0 {
            return None;
        }

        let phrase = phrases.phrase(self.candidate)?;
        if phrase == self.last_spoken {
            return None;
        }

        log::debug!(
            "emitting {:?} after {} frames: {phrase}",
            self.candidate,
            self.consecutive
        );
        self.last_spoken.clone_from(&phrase);
        self.cooldown_remaining = self.config.cooldown_frames;

        Some(SpeakEvent {
            label: self.candidate,
            phrase,
        })
    }

    pub fn candidate(&self) -> GestureLabel {
        self.candidate
    }

    #[allow(dead_code)]
    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    #[allow(dead_code)]
    pub fn cooldown_remaining(&self) -> u32 {
        self.cooldown_remaining
    }

    #[allow(dead_code)]
    pub fn last_spoken(&self) -> &str {
        &self.last_spoken
    }

    pub fn is_stable(&self) -> bool {
        !self.candidate.is_none() && self.consecutive > self.config.stable_frames
    }
}

impl Default for Stabilizer {
    fn default() -> Self {
        Self::new(StabilizerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn phrases() -> PhraseTable {
        PhraseTable::from_map(HashMap::from([
            ("OPEN_PALM".to_string(), "Hello".to_string()),
            ("FIST".to_string(), "Stop".to_string()),
            ("PEACE".to_string(), "Peace".to_string()),
        ]))
    }

    /// Feeds `label` `frames` times and returns the emissions with their
    /// 1-based frame numbers.
    fn feed(
        stabilizer: &mut Stabilizer,
        table: &PhraseTable,
        label: GestureLabel,
        frames: usize,
    ) -> Vec<(usize, SpeakEvent)> {
        (1..=frames)
            .filter_map(|frame| stabilizer.update(label, table).map(|event| (frame, event)))
            .collect()
    }

    #[test]
    fn initial_state_is_idle() {
        let stabilizer = Stabilizer::default();
        assert_eq!(stabilizer.candidate(), GestureLabel::None);
        assert_eq!(stabilizer.consecutive(), 0);
        assert_eq!(stabilizer.cooldown_remaining(), 0);
        assert_eq!(stabilizer.last_spoken(), "");
        assert!(!stabilizer.is_stable());
    }

    #[test]
    fn seven_frames_emit_once_on_the_seventh() {
        let table = phrases();
        let mut stabilizer = Stabilizer::default();
        let events = feed(&mut stabilizer, &table, GestureLabel::OpenPalm, 7);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, 7);
        assert_eq!(events[0].1.phrase, "Hello");
        assert_eq!(events[0].1.label, GestureLabel::OpenPalm);
        assert_eq!(stabilizer.cooldown_remaining(), 30);
        assert_eq!(stabilizer.last_spoken(), "Hello");
    }

    #[test]
    fn six_frames_emit_nothing() {
        let table = phrases();
        let mut stabilizer = Stabilizer::default();
        assert!(feed(&mut stabilizer, &table, GestureLabel::Fist, 6).is_empty());
        assert!(!stabilizer.is_stable());
    }

    #[test]
    fn none_resets_tracking() {
        let table = phrases();
        let mut stabilizer = Stabilizer::default();
        assert!(feed(&mut stabilizer, &table, GestureLabel::Fist, 5).is_empty());
        assert!(stabilizer.update(GestureLabel::None, &table).is_none());
        assert_eq!(stabilizer.consecutive(), 0);
        assert!(feed(&mut stabilizer, &table, GestureLabel::Fist, 6).is_empty());
        assert_eq!(feed(&mut stabilizer, &table, GestureLabel::Fist, 1).len(), 1);
    }

    #[test]
    fn none_never_becomes_stable() {
        let table = phrases();
        let mut stabilizer = Stabilizer::default();
        assert!(feed(&mut stabilizer, &table, GestureLabel::None, 100).is_empty());
        assert_eq!(stabilizer.consecutive(), 0);
    }

    #[test]
    fn cooldown_and_repeat_suppression() {
        let table = phrases();
        let mut stabilizer = Stabilizer::default();
        assert_eq!(feed(&mut stabilizer, &table, GestureLabel::Peace, 7).len(), 1);

        assert!(feed(&mut stabilizer, &table, GestureLabel::Peace, 30).is_empty());
        assert_eq!(stabilizer.cooldown_remaining(), 0);

        // Cooldown is over but the phrase has not changed.
        assert!(feed(&mut stabilizer, &table, GestureLabel::Peace, 1).is_empty());
    }

    #[test]
    fn change_and_return_re_enables_emission() {
        let table = phrases();
        let mut stabilizer = Stabilizer::default();
        assert_eq!(feed(&mut stabilizer, &table, GestureLabel::Fist, 7).len(), 1);

        // Held through the whole cooldown, the new label fires as soon as it ends.
        let events = feed(&mut stabilizer, &table, GestureLabel::OpenPalm, 30);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, 30);
        assert_eq!(events[0].1.phrase, "Hello");

        let events = feed(&mut stabilizer, &table, GestureLabel::Fist, 40);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].1.phrase, "Stop");
    }

    #[test]
    fn brief_dropout_does_not_repeat_phrase() {
        let table = phrases();
        let mut stabilizer = Stabilizer::default();
        assert_eq!(feed(&mut stabilizer, &table, GestureLabel::Fist, 7).len(), 1);
        feed(&mut stabilizer, &table, GestureLabel::None, 40);
        assert!(feed(&mut stabilizer, &table, GestureLabel::Fist, 40).is_empty());
    }

    #[test]
    fn missing_phrase_uses_label_name() {
        let table = phrases();
        let mut stabilizer = Stabilizer::default();
        let events = feed(&mut stabilizer, &table, GestureLabel::ThumbsUp, 7);
        assert_eq!(events[0].1.phrase, "Thumbs Up");
    }

    #[test]
    fn thresholds_come_from_config() {
        let table = phrases();
        let mut stabilizer = Stabilizer::new(StabilizerConfig {
            stable_frames: 2,
            cooldown_frames: 5,
        });
        let events = feed(&mut stabilizer, &table, GestureLabel::Fist, 3);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, 3);
        assert_eq!(stabilizer.cooldown_remaining(), 5);
    }
}
