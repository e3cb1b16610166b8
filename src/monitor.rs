//! Level monitor: RMS-based voice activity detection for one recording session.
//!
//! Samples are classified per frame as speech or silence against a fixed RMS
//! threshold. Two deadline timers drive automatic stops: an initial grace
//! period (abort when no speech ever arrives) and a trailing silence window
//! (stop once the speaker has gone quiet after talking).

use crate::defaults;
use std::time::{Duration, Instant};

/// Trait for time operations, allowing mock time in tests.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// Real system clock using `std::time::Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Configuration for the level monitor.
#[derive(Debug, Clone, Copy)]
pub struct MonitorConfig {
    /// RMS threshold for classifying a frame as speech (0.0 to 1.0).
    pub speech_threshold: f32,
    /// Trailing silence duration before auto-stop (milliseconds).
    pub trailing_silence_ms: u32,
    /// Grace period for the first speech frame before no-speech abort (milliseconds).
    pub initial_grace_ms: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            speech_threshold: defaults::SPEECH_THRESHOLD,
            trailing_silence_ms: defaults::TRAILING_SILENCE_MS,
            initial_grace_ms: defaults::INITIAL_GRACE_MS,
        }
    }
}

/// Why the monitor requested a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No speech frame arrived within the initial grace period.
    NoSpeech,
    /// Speech was detected, then silence lasted the full trailing window.
    TrailingSilence,
}

/// Per-frame classification result.
#[derive(Debug, Clone, Copy)]
pub struct FrameReport {
    /// RMS level of the frame (0.0 to 1.0).
    pub level: f32,
    /// Whether the frame crossed the speech threshold.
    pub is_speech: bool,
    /// Stop request, if one of the timers expired on this frame.
    pub stop: Option<StopReason>,
}

/// Voice activity monitor for a single recording session.
///
/// Created when recording starts (arming the grace timer) and discarded when
/// the session ends; it is not restartable mid-session.
pub struct LevelMonitor<C: Clock = SystemClock> {
    config: MonitorConfig,
    clock: C,
    has_detected_speech: bool,
    grace_deadline: Option<Instant>,
    trailing_deadline: Option<Instant>,
}

impl<C: Clock> LevelMonitor<C> {
    /// Create a monitor with the given configuration and clock.
    ///
    /// The initial grace timer is armed immediately.
    pub fn with_clock(config: MonitorConfig, clock: C) -> Self {
        let grace_deadline =
            Some(clock.now() + Duration::from_millis(config.initial_grace_ms as u64));
        Self {
            config,
            clock,
            has_detected_speech: false,
            grace_deadline,
            trailing_deadline: None,
        }
    }

    /// Process one frame of i16 PCM samples.
    ///
    /// Speech frames cancel both timers (the grace timer permanently, the
    /// trailing timer until the next silent frame). Silent frames after
    /// speech arm the trailing timer if none is armed. Expired timers are
    /// reported as a stop request.
    pub fn process(&mut self, samples: &[i16]) -> FrameReport {
        let level = calculate_rms(samples);
        let is_speech = level >= self.config.speech_threshold;
        let now = self.clock.now();

        if is_speech {
            if !self.has_detected_speech {
                self.has_detected_speech = true;
                self.grace_deadline = None;
            }
            // Any speech frame cancels a pending trailing-silence timer
            self.trailing_deadline = None;
        } else if self.has_detected_speech && self.trailing_deadline.is_none() {
            self.trailing_deadline =
                Some(now + Duration::from_millis(self.config.trailing_silence_ms as u64));
        }

        let stop = if self.grace_deadline.is_some_and(|d| now >= d) {
            Some(StopReason::NoSpeech)
        } else if self.trailing_deadline.is_some_and(|d| now >= d) {
            Some(StopReason::TrailingSilence)
        } else {
            None
        };

        FrameReport {
            level,
            is_speech,
            stop,
        }
    }

    /// Whether any speech frame has been observed this session.
    pub fn has_detected_speech(&self) -> bool {
        self.has_detected_speech
    }

    /// Whether a trailing-silence timer is currently armed.
    pub fn trailing_timer_armed(&self) -> bool {
        self.trailing_deadline.is_some()
    }

    /// The RMS level at or above which a frame counts as speech.
    pub fn speech_threshold(&self) -> f32 {
        self.config.speech_threshold
    }
}

impl LevelMonitor<SystemClock> {
    /// Create a monitor with the given configuration using the system clock.
    pub fn new(config: MonitorConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

/// Calculates the Root Mean Square (RMS) of audio samples.
///
/// # Returns
/// Normalized RMS value (0.0 to 1.0), where:
/// - 0.0 represents silence
/// - ~0.707 represents a full-scale sine wave
/// - 1.0 represents maximum amplitude
pub fn calculate_rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = samples
        .iter()
        .map(|&sample| {
            let normalized = sample as f64 / i16::MAX as f64;
            normalized * normalized
        })
        .sum();

    let mean_square = sum_squares / samples.len() as f64;
    mean_square.sqrt() as f32
}
