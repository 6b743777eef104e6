use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::debug;

use crate::error::{Result, TravisStatusError};

use super::timer::RepeatingTimer;
use super::view::{StatusSink, STATUS_BAR_KEY};

/// Dots that grow and shrink after the label.
pub const FRAMES: &[&str] = &["", ".", "..", "...", "..", "."];

pub const FRAME_INTERVAL_MS: u64 = 300;

/// Frame sequence, cadence and suffix of the "building" animation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationConfig {
    frames: Vec<String>,
    interval: Duration,
    suffix: String,
}

impl AnimationConfig {
    pub fn new(frames: Vec<String>, interval: Duration, suffix: impl Into<String>) -> Result<Self> {
        if frames.is_empty() {
            return Err(TravisStatusError::Config(
                "animation needs at least one frame".into(),
            ));
        }
        if interval.is_zero() {
            return Err(TravisStatusError::Config(
                "animation interval must be positive".into(),
            ));
        }

        Ok(Self {
            frames,
            interval,
            suffix: suffix.into(),
        })
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            frames: FRAMES.iter().map(ToString::to_string).collect(),
            interval: Duration::from_millis(FRAME_INTERVAL_MS),
            suffix: String::new(),
        }
    }
}

#[derive(Debug, Default)]
struct AnimationState {
    /// Label of the current build cycle, `None` until `set_label`
    prefix: Option<String>,
    index: usize,
    running: bool,
}

/// Renders `prefix + frame + suffix` to one view's status bar while a build runs.
///
/// State is shared with the timer task. Every sink write happens under the
/// state lock, so once `on_complete` returns no tick can write again.
pub struct StatusAnimator {
    config: Arc<AnimationConfig>,
    sink: Arc<dyn StatusSink>,
    state: Arc<Mutex<AnimationState>>,
    timer: Option<RepeatingTimer>,
}

impl StatusAnimator {
    pub fn new(config: AnimationConfig, sink: Arc<dyn StatusSink>) -> Self {
        Self {
            config: Arc::new(config),
            sink,
            state: Arc::new(Mutex::new(AnimationState::default())),
            timer: None,
        }
    }

    /// Configure the label for this build cycle.
    ///
    /// Ignored while a label is already set; `on_complete` clears it.
    pub fn set_label(&mut self, prefix: impl Into<String>) {
        let mut state = lock(&self.state);
        if state.prefix.is_none() {
            state.prefix = Some(prefix.into());
            state.index = 0;
        }
    }

    pub fn label(&self) -> Option<String> {
        lock(&self.state).prefix.clone()
    }

    /// Start ticking. Does nothing without a label or while already running.
    pub fn start(&mut self) {
        {
            let mut state = lock(&self.state);
            if state.running || state.prefix.is_none() {
                return;
            }
            state.running = true;
        }

        let config = Arc::clone(&self.config);
        let sink = Arc::clone(&self.sink);
        let state = Arc::clone(&self.state);
        let mut timer = RepeatingTimer::new(self.config.interval, move || {
            tick(&config, sink.as_ref(), &state);
        });
        timer.start();
        self.timer = Some(timer);
    }

    pub fn is_running(&self) -> bool {
        lock(&self.state).running
    }

    /// Stop the animation, clear the status bar if it was animating and
    /// forget the label so the next cycle can set a new one.
    pub fn on_complete(&mut self) {
        {
            let mut state = lock(&self.state);
            if state.running {
                self.sink.erase_status(STATUS_BAR_KEY);
            }
            *state = AnimationState::default();
        }

        if let Some(mut timer) = self.timer.take() {
            timer.stop();
        }
    }

    /// Same as `on_complete`; `err` is only logged.
    pub fn on_error(&mut self, err: &dyn Display) {
        debug!("Stopping build animation after error: {err}");
        self.on_complete();
    }
}

fn tick(config: &AnimationConfig, sink: &dyn StatusSink, state: &Mutex<AnimationState>) {
    let mut state = lock(state);
    if !state.running {
        return;
    }
    let Some(prefix) = state.prefix.as_deref() else {
        return;
    };

    let frame = &config.frames[state.index % config.frames.len()];
    sink.set_status(STATUS_BAR_KEY, &format!("{prefix}{frame}{}", config.suffix));
    state.index = (state.index + 1) % config.frames.len();
}

fn lock(state: &Mutex<AnimationState>) -> MutexGuard<'_, AnimationState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
