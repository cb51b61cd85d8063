pub mod render;
pub mod source;

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;

use crate::{
    config::Config,
    gesture::GestureClassifier,
    history::WristHistory,
    phrases::PhraseTable,
    speech::{SpeechEvent, Speaker},
    stabilizer::{SpeakEvent, Stabilizer},
    types::{GestureLabel, HandObservation},
};

use self::{
    render::{FpsCounter, FrameView, Renderer},
    source::LandmarkSource,
};

/// Per-process gesture state, threaded through the frame loop.
pub struct GestureSession {
    classifier: GestureClassifier,
    history: WristHistory,
    stabilizer: Stabilizer,
    phrases: PhraseTable,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FrameOutcome {
    /// This frame's classification.
    pub label: GestureLabel,
    /// The label currently being tracked for stability.
    pub candidate: GestureLabel,
    pub stable: bool,
    pub emitted: Option<SpeakEvent>,
}

impl GestureSession {
    pub fn new(config: &Config, phrases: PhraseTable) -> Self {
        Self {
            classifier: GestureClassifier::new(config.classifier),
            history: WristHistory::new(config.classifier.history_capacity),
            stabilizer: Stabilizer::new(config.stabilizer),
            phrases,
        }
    }

    /// Classifies and stabilizes one frame. Frames without a hand count as
    /// `None` and leave the wrist history untouched.
    pub fn process(&mut self, hand: Option<&HandObservation>) -> FrameOutcome {
        let label = match hand {
            Some(hand) => {
                self.history.push(hand.joints.wrist().x);
                self.classifier
                    .classify(&hand.joints, hand.handedness, Some(&self.history))
            }
            None => GestureLabel::None,
        };

        let emitted = self.stabilizer.update(label, &self.phrases);

        FrameOutcome {
            label,
            candidate: self.stabilizer.candidate(),
            stable: self.stabilizer.is_stable(),
            emitted,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub frames: u64,
    /// Phrases handed to the speech worker.
    pub phrases: u64,
    pub speech_failures: u64,
    /// The source ran dry, as opposed to a quit request.
    pub exhausted: bool,
}

/// Runs until `quit` is raised or the source runs dry. Each frame is fully
/// processed before the next one is read; speech is handed off and never
/// waited on.
pub fn run_frame_loop<S, R>(
    source: &mut S,
    session: &mut GestureSession,
    speaker: &Speaker,
    renderer: &mut R,
    quit: &AtomicBool,
) -> Result<LoopSummary>
where
    S: LandmarkSource + ?Sized,
    R: Renderer + ?Sized,
{
    let mut fps = FpsCounter::default();
    let mut summary = LoopSummary::default();

    while !quit.load(Ordering::Relaxed) {
        let Some(frame) = source.next_frame()? else {
            log::info!("landmark source exhausted");
            summary.exhausted = true;
            break;
        };

        let outcome = session.process(frame.hand.as_ref());
        summary.frames += 1;

        if let Some(event) = &outcome.emitted {
            match speaker.say(&event.phrase) {
                Ok(()) => summary.phrases += 1,
                Err(err) => {
                    log::warn!("could not hand off {:?}: {err}", event.phrase);
                    summary.speech_failures += 1;
                }
            }
        }

        let mut speech_error = None;
        for event in speaker.events() {
            match event {
                SpeechEvent::Started(phrase) => log::debug!("speaking {phrase:?}"),
                SpeechEvent::Finished(phrase) => log::debug!("finished {phrase:?}"),
                SpeechEvent::Failed { phrase, reason } => {
                    summary.speech_failures += 1;
                    speech_error = Some(format!("{phrase}: {reason}"));
                }
            }
        }

        renderer.render(&FrameView {
            label: outcome.candidate,
            stable: outcome.stable,
            spoken: outcome.emitted.as_ref().map(|event| event.phrase.as_str()),
            speech_error: speech_error.as_deref(),
            fps: fps.tick(frame.timestamp),
        });
    }

    Ok(summary)
}
