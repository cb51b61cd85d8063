use std::{
    io::Write,
    process::{Child, Command, Stdio},
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};

use crate::{
    config::{SpeechBackend, SpeechConfig},
    error::GestureError,
};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A text-to-speech backend driven by the speech worker thread.
pub trait SpeechEngine: Send + 'static {
    /// Begins speaking `text` without waiting for it to finish.
    fn start(&mut self, text: &str) -> Result<(), GestureError>;
    /// Stops the utterance in progress, if any.
    fn cancel(&mut self) -> Result<(), GestureError>;
    /// `Ok(true)` while the last utterance is still playing.
    fn poll(&mut self) -> Result<bool, GestureError>;
}

impl<E: SpeechEngine + ?Sized> SpeechEngine for Box<E> {
    fn start(&mut self, text: &str) -> Result<(), GestureError> {
        (**self).start(text)
    }

    fn cancel(&mut self) -> Result<(), GestureError> {
        (**self).cancel()
    }

    fn poll(&mut self) -> Result<bool, GestureError> {
        (**self).poll()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpeechEvent {
    Started(String),
    Finished(String),
    Failed { phrase: String, reason: String },
}

/// Single-slot handoff: posting replaces whatever is still waiting.
struct Mailbox {
    tx: Sender<String>,
    evict: Receiver<String>,
}

impl Mailbox {
    fn new() -> (Self, Receiver<String>) {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let evict = rx.clone();
        (Self { tx, evict }, rx)
    }

    fn post(&self, phrase: String) -> Result<(), GestureError> {
        let mut pending = phrase;
        loop {
            match self.tx.try_send(pending) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Full(phrase)) => {
                    if let Ok(stale) = self.evict.try_recv() {
                        log::debug!("dropping queued utterance {stale:?}");
                    }
                    pending = phrase;
                }
                Err(TrySendError::Disconnected(_)) => {
                    return Err(GestureError::SpeechWorkerStopped);
                }
            }
        }
    }
}

/// Handle to the speech worker. `say` never blocks the caller.
pub struct Speaker {
    mailbox: Option<Mailbox>,
    finish: Option<Sender<Duration>>,
    events: Receiver<SpeechEvent>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Speaker {
    pub fn spawn<E: SpeechEngine>(engine: E) -> Self {
        let (mailbox, rx) = Mailbox::new();
        let (finish_tx, finish_rx) = crossbeam_channel::bounded(1);
        let (event_tx, events) = crossbeam_channel::unbounded();
        let handle = thread::spawn(move || run_speech_loop(engine, rx, finish_rx, event_tx));

        Self {
            mailbox: Some(mailbox),
            finish: Some(finish_tx),
            events,
            handle: Some(handle),
        }
    }

    /// Queues `phrase`, replacing any phrase the worker has not picked up yet.
    pub fn say(&self, phrase: &str) -> Result<(), GestureError> {
        let worker_alive = self
            .handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished());
        match &self.mailbox {
            Some(mailbox) if worker_alive => mailbox.post(phrase.to_string()),
            _ => Err(GestureError::SpeechWorkerStopped),
        }
    }

    /// Status reports produced since the last call.
    pub fn events(&self) -> impl Iterator<Item = SpeechEvent> + '_ {
        self.events.try_iter()
    }

    /// Lets the queued or playing utterance run for up to `grace` before the
    /// worker stops, then returns the events nobody collected yet. Dropping
    /// the speaker instead cuts speech off immediately.
    pub fn finish(mut self, grace: Duration) -> Vec<SpeechEvent> {
        if let Some(finish) = self.finish.take() {
            let _ = finish.send(grace);
        }
        self.shutdown();
        self.events.try_iter().collect()
    }

    fn shutdown(&mut self) {
        self.mailbox.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Speaker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_speech_loop<E: SpeechEngine>(
    mut engine: E,
    mailbox: Receiver<String>,
    finish: Receiver<Duration>,
    events: Sender<SpeechEvent>,
) {
    let mut current: Option<String> = None;

    loop {
        match mailbox.recv_timeout(POLL_INTERVAL) {
            Ok(phrase) => {
                let phrase = latest_phrase(&mailbox, phrase);

                // At most one utterance is ever active.
                if let Err(err) = engine.cancel() {
                    log::warn!("failed to cancel utterance: {err}");
                }
                if let Some(interrupted) = current.take() {
                    log::debug!("interrupted {interrupted:?}");
                }

                match engine.start(&phrase) {
                    Ok(()) => {
                        let _ = events.send(SpeechEvent::Started(phrase.clone()));
                        current = Some(phrase);
                    }
                    Err(err) => {
                        log::warn!("speech failed for {phrase:?}: {err}");
                        let _ = events.send(SpeechEvent::Failed {
                            phrase,
                            reason: err.to_string(),
                        });
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if let Some(phrase) = current.take() {
                    current = poll_utterance(&mut engine, &events, phrase);
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    // The finish request is sent before the mailbox closes, so it is visible here.
    let grace = finish.try_recv().ok();
    if let Some(grace) = grace.filter(|_| current.is_some()) {
        let deadline = Instant::now() + grace;
        while let Some(phrase) = current.take() {
            current = poll_utterance(&mut engine, &events, phrase);
            let now = Instant::now();
            if current.is_none() || now >= deadline {
                break;
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
        if let Some(phrase) = &current {
            log::warn!("{phrase:?} still playing after {grace:?}, stopping it");
        }
    }

    if current.is_some() {
        if let Err(err) = engine.cancel() {
            log::warn!("failed to cancel utterance on shutdown: {err}");
        }
    }
}

/// Returns the phrase back while it is still playing.
fn poll_utterance<E: SpeechEngine>(
    engine: &mut E,
    events: &Sender<SpeechEvent>,
    phrase: String,
) -> Option<String> {
    match engine.poll() {
        Ok(true) => Some(phrase),
        Ok(false) => {
            let _ = events.send(SpeechEvent::Finished(phrase));
            None
        }
        Err(err) => {
            log::warn!("speech failed for {phrase:?}: {err}");
            let _ = events.send(SpeechEvent::Failed {
                phrase,
                reason: err.to_string(),
            });
            None
        }
    }
}

fn latest_phrase(mailbox: &Receiver<String>, mut phrase: String) -> String {
    while let Ok(newer) = mailbox.try_recv() {
        phrase = newer;
    }
    phrase
}

/// Writes phrases to the log instead of producing audio.
pub struct LogEngine;

impl SpeechEngine for LogEngine {
    fn start(&mut self, text: &str) -> Result<(), GestureError> {
        log::info!("speak: {text}");
        Ok(())
    }

    fn cancel(&mut self) -> Result<(), GestureError> {
        Ok(())
    }

    fn poll(&mut self) -> Result<bool, GestureError> {
        Ok(false)
    }
}

/// Runs a command line synthesizer per utterance; cancelling kills it.
///
/// The text goes in on stdin so a phrase can never be taken for a flag.
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
    child: Option<Child>,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            child: None,
        }
    }

    /// eSpeak takes words per minute and an amplitude of 0-200.
    pub fn espeak(rate: u32, volume: f32) -> Self {
        let amplitude = (volume.clamp(0.0, 1.0) * 200.0).round() as u32;
        Self::new(
            "espeak",
            vec![
                "-s".to_string(),
                rate.to_string(),
                "-a".to_string(),
                amplitude.to_string(),
                "--stdin".to_string(),
            ],
        )
    }

    /// macOS `say` has no volume flag; it follows the system output volume.
    pub fn say(rate: u32) -> Self {
        Self::new(
            "say",
            vec![
                "-r".to_string(),
                rate.to_string(),
                "-f".to_string(),
                "-".to_string(),
            ],
        )
    }

    fn engine_error(&self, action: &str, err: std::io::Error) -> GestureError {
        GestureError::SpeechEngine(format!("failed to {action} {}: {err}", self.program))
    }
}

impl SpeechEngine for CommandEngine {
    fn start(&mut self, text: &str) -> Result<(), GestureError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| self.engine_error("launch", err))?;

        // Dropping stdin closes it, which ends the synthesizer's input.
        if let Some(mut stdin) = child.stdin.take() {
            if let Err(err) = writeln!(stdin, "{text}") {
                let _ = child.kill();
                let _ = child.wait();
                return Err(self.engine_error("write to", err));
            }
        }
        self.child = Some(child);
        Ok(())
    }

    fn cancel(&mut self) -> Result<(), GestureError> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let running = child
            .try_wait()
            .map_err(|err| self.engine_error("query", err))?
            .is_none();
        if running {
            child.kill().map_err(|err| self.engine_error("stop", err))?;
        }
        child.wait().map_err(|err| self.engine_error("reap", err))?;
        Ok(())
    }

    fn poll(&mut self) -> Result<bool, GestureError> {
        let Some(child) = self.child.as_mut() else {
            return Ok(false);
        };
        let status = match child.try_wait() {
            Ok(None) => return Ok(true),
            Ok(Some(status)) => status,
            Err(err) => {
                self.child = None;
                return Err(self.engine_error("query", err));
            }
        };
        self.child = None;
        if status.success() {
            Ok(false)
        } else {
            Err(GestureError::SpeechEngine(format!(
                "{} exited with {status}",
                self.program
            )))
        }
    }
}

impl Drop for CommandEngine {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

pub fn build_engine(config: &SpeechConfig) -> Box<dyn SpeechEngine> {
    match config.engine {
        SpeechBackend::Espeak => Box::new(CommandEngine::espeak(config.rate, config.volume)),
        SpeechBackend::Say => Box::new(CommandEngine::say(config.rate)),
        SpeechBackend::Log => Box::new(LogEngine),
    }
}
