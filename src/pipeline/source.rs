use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{
    config::SourceConfig,
    types::{Handedness, HandObservation, JointSet, LandmarkFrame},
};

/// Produces one landmark frame per iteration of the frame loop.
pub trait LandmarkSource {
    /// `Ok(None)` once the source is exhausted. Errors are fatal capture
    /// failures; recoverable problems come back as frames without a hand.
    fn next_frame(&mut self) -> Result<Option<LandmarkFrame>>;
}

#[derive(Debug, Deserialize)]
struct FrameRecord {
    #[serde(default)]
    hands: Vec<HandRecord>,
}

#[derive(Debug, Deserialize)]
struct HandRecord {
    handedness: Handedness,
    #[serde(default = "full_score")]
    score: f32,
    landmarks: Vec<[f32; 3]>,
}

fn full_score() -> f32 {
    1.0
}

/// Replays recorded detector output: one JSON object per line, e.g.
/// `{"hands":[{"handedness":"Right","score":0.93,"landmarks":[[x,y,z], ...]}]}`.
pub struct ReplaySource<R> {
    reader: R,
    config: SourceConfig,
    line: Vec<u8>,
    line_no: usize,
    interval: Option<Duration>,
    next_due: Option<Instant>,
}

/// Opens `input` (`-` for stdin). Failing here means there is no landmark
/// source at all, which the caller treats as fatal.
pub fn open_replay(input: &str, config: SourceConfig) -> Result<ReplaySource<Box<dyn BufRead>>> {
    let reader: Box<dyn BufRead> = if input == "-" {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(input)
            .with_context(|| format!("landmark source {input} is unavailable"))?;
        Box::new(BufReader::new(file))
    };

    log::info!(
        "replaying landmarks from {} at {} fps{}",
        if input == "-" { "stdin" } else { input },
        config.fps,
        if config.mirror { " (mirrored)" } else { "" }
    );

    Ok(ReplaySource::new(reader, config))
}

impl<R: BufRead> ReplaySource<R> {
    pub fn new(reader: R, config: SourceConfig) -> Self {
        let interval =
            (config.fps > 0).then(|| Duration::from_secs_f64(1.0 / f64::from(config.fps)));
        Self {
            reader,
            config,
            line: Vec::new(),
            line_no: 0,
            interval,
            next_due: None,
        }
    }

    fn pace(&mut self) {
        let Some(interval) = self.interval else {
            return;
        };
        let now = Instant::now();
        let due = self.next_due.unwrap_or(now);
        if due > now {
            thread::sleep(due - now);
        }
        self.next_due = Some(due.max(now) + interval);
    }
}

impl<R: BufRead> LandmarkSource for ReplaySource<R> {
    fn next_frame(&mut self) -> Result<Option<LandmarkFrame>> {
        loop {
            self.line.clear();
            let read = self
                .reader
                .read_until(b'\n', &mut self.line)
                .with_context(|| format!("failed to read landmark frame {}", self.line_no + 1))?;
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            if !self.line.trim_ascii().is_empty() {
                break;
            }
        }

        self.pace();

        // Encoding damage costs one frame, like any other malformed record.
        let frame = match std::str::from_utf8(&self.line) {
            Ok(line) => decode_frame(line, self.line_no, &self.config),
            Err(err) => {
                log::warn!("line {}: landmark frame is not UTF-8: {err}", self.line_no);
                LandmarkFrame::empty()
            }
        };
        Ok(Some(frame))
    }
}

/// Turns one record into a frame. Anything unusable becomes "no hand".
fn decode_frame(line: &str, line_no: usize, config: &SourceConfig) -> LandmarkFrame {
    let record: FrameRecord = match serde_json::from_str(line) {
        Ok(record) => record,
        Err(err) => {
            log::warn!("line {line_no}: malformed landmark frame: {err}");
            return LandmarkFrame::empty();
        }
    };

    // Single-hand only: the first detection wins.
    let Some(hand) = record.hands.into_iter().next() else {
        return LandmarkFrame::empty();
    };

    if hand.score < config.min_hand_confidence {
        log::debug!(
            "line {line_no}: {} hand below confidence ({:.2})",
            hand.handedness.label(),
            hand.score
        );
        return LandmarkFrame::empty();
    }

    let joints = match JointSet::try_from(hand.landmarks.as_slice()) {
        Ok(joints) => joints,
        Err(err) => {
            log::warn!("line {line_no}: {err}");
            return LandmarkFrame::empty();
        }
    };
    let joints = if config.mirror {
        joints.mirrored()
    } else {
        joints
    };

    LandmarkFrame::with_hand(HandObservation {
        joints,
        handedness: hand.handedness,
        score: hand.score,
    })
}
