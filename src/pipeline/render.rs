use std::{io::Write, time::Instant};

use crate::types::GestureLabel;

const PLACEHOLDER: &str = "—";
const FPS_REFRESH_FRAMES: u64 = 10;

/// What the display needs for one frame. Purely observational.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameView<'a> {
    pub label: GestureLabel,
    pub stable: bool,
    /// Set only on the frame a phrase is emitted.
    pub spoken: Option<&'a str>,
    pub speech_error: Option<&'a str>,
    pub fps: f32,
}

pub trait Renderer {
    fn render(&mut self, view: &FrameView<'_>);
}

/// Line-oriented status output; only changes are written.
pub struct TerminalRenderer<W: Write> {
    out: W,
    shown: Option<(GestureLabel, bool)>,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, shown: None }
    }

    #[allow(dead_code)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn render(&mut self, view: &FrameView<'_>) {
        let state = (view.label, view.stable);
        if self.shown != Some(state) {
            let name = view.label.key().unwrap_or(PLACEHOLDER);
            let marker = if view.stable { " *" } else { "" };
            let _ = writeln!(self.out, "Gesture: {name}{marker}  [{:.1} FPS]", view.fps);
            self.shown = Some(state);
        }
        if let Some(phrase) = view.spoken {
            let _ = writeln!(self.out, "Speak: {phrase}");
        }
        if let Some(error) = view.speech_error {
            let _ = writeln!(self.out, "Speech error: {error}");
        }
        let _ = self.out.flush();
    }
}

/// Average frame rate since the first frame, refreshed every ten frames.
#[derive(Debug, Default)]
pub struct FpsCounter {
    started: Option<Instant>,
    frames: u64,
    fps: f32,
}

impl FpsCounter {
    pub fn tick(&mut self, now: Instant) -> f32 {
        let started = *self.started.get_or_insert(now);
        self.frames += 1;
        if self.frames % FPS_REFRESH_FRAMES == 0 {
            let elapsed = now.duration_since(started).as_secs_f32();
            self.fps = self.frames as f32 / (elapsed + 1e-6);
        }
        self.fps
    }
}
