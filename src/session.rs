//! Recording session: one speech capture from start to stop.
//!
//! Polls the audio source on a fixed cadence, feeds frames to the level
//! monitor, and accumulates the clip until the monitor requests a stop or
//! the user stops manually. The source is released before returning.

use crate::audio::source::AudioSource;
use crate::error::Result;
use crate::monitor::{Clock, LevelMonitor, MonitorConfig, StopReason, SystemClock};
use crate::{defaults, render};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Cooperative stop flag, set by the user (Enter key) to end a recording.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    triggered: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop of the current recording.
    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Clear the flag before a new recording starts.
    pub fn reset(&self) {
        self.triggered.store(false, Ordering::SeqCst);
    }
}

/// How a recording session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Speech was detected; the accumulated clip is ready for upload.
    Clip(Vec<i16>),
    /// The session ended without any speech frame; the clip is discarded.
    NoSpeech,
}

/// A single recording session with voice activity detection.
pub struct RecordingSession<'a, C: Clock = SystemClock> {
    source: &'a mut dyn AudioSource,
    monitor: LevelMonitor<C>,
    frame_interval: Duration,
    show_levels: bool,
}

impl<'a> RecordingSession<'a, SystemClock> {
    pub fn new(source: &'a mut dyn AudioSource, config: MonitorConfig) -> Self {
        Self::with_clock(source, config, SystemClock)
    }
}

impl<'a, C: Clock> RecordingSession<'a, C> {
    pub fn with_clock(source: &'a mut dyn AudioSource, config: MonitorConfig, clock: C) -> Self {
        Self {
            source,
            monitor: LevelMonitor::with_clock(config, clock),
            frame_interval: Duration::from_millis(defaults::FRAME_INTERVAL_MS),
            show_levels: false,
        }
    }

    /// Enable or disable the level meter during recording.
    pub fn with_level_display(mut self, show: bool) -> Self {
        self.show_levels = show;
        self
    }

    /// Record until the monitor requests a stop or `stop` is triggered.
    ///
    /// Both silence timers are cancelled implicitly when the loop exits; the
    /// monitor is discarded with the session.
    ///
    /// # Errors
    /// Returns errors if audio capture fails; the source is still stopped
    /// on a read failure.
    pub async fn record(mut self, stop: &StopSignal) -> Result<SessionOutcome> {
        let mut accumulated: Vec<i16> = Vec::new();

        self.source.start()?;

        loop {
            if stop.is_triggered() {
                break;
            }

            let samples = match self.source.read_samples() {
                Ok(samples) => samples,
                Err(e) => {
                    // Release the device before surfacing the error
                    self.source.stop().ok();
                    self.clear_level_line();
                    return Err(e);
                }
            };

            // Empty reads still count as silent frames so the grace timer
            // can expire on a source that never delivers data
            let report = self.monitor.process(&samples);
            accumulated.extend_from_slice(&samples);

            if self.show_levels {
                render::show_level(
                    report.level,
                    self.monitor.speech_threshold(),
                    self.monitor.has_detected_speech(),
                );
            }

            if let Some(reason) = report.stop {
                debug_assert!(
                    matches!(reason, StopReason::NoSpeech) != self.monitor.has_detected_speech()
                );
                break;
            }

            tokio::time::sleep(self.frame_interval).await;
        }

        self.source.stop()?;
        self.clear_level_line();

        if self.monitor.has_detected_speech() {
            Ok(SessionOutcome::Clip(accumulated))
        } else {
            Ok(SessionOutcome::NoSpeech)
        }
    }

    fn clear_level_line(&self) {
        if self.show_levels {
            render::clear_line();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::source::MockAudioSource;
    use crate::error::VoxchatError;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    #[derive(Debug, Clone)]
    struct MockClock {
        current: Arc<Mutex<Instant>>,
    }

    impl MockClock {
        fn new() -> Self {
            Self {
                current: Arc::new(Mutex::new(Instant::now())),
            }
        }

        fn advance(&self, duration: Duration) {
            let mut current = self.current.lock().unwrap();
            *current += duration;
        }
    }

    impl Clock for MockClock {
        fn now(&self) -> Instant {
            *self.current.lock().unwrap()
        }
    }

    /// Audio source that replays a frame script and advances the mock clock
    /// by one frame interval per read, so monitor deadlines fire while
    /// tokio's paused timer drives the loop.
    struct ScriptedSource {
        frames: Vec<Vec<i16>>,
        position: usize,
        clock: MockClock,
        started: bool,
    }

    impl ScriptedSource {
        fn new(frames: Vec<Vec<i16>>, clock: MockClock) -> Self {
            Self {
                frames,
                position: 0,
                clock,
                started: false,
            }
        }
    }

    impl AudioSource for ScriptedSource {
        fn start(&mut self) -> Result<()> {
            self.started = true;
            Ok(())
        }

        fn stop(&mut self) -> Result<()> {
            self.started = false;
            Ok(())
        }

        fn read_samples(&mut self) -> Result<Vec<i16>> {
            self.clock
                .advance(Duration::from_millis(defaults::FRAME_INTERVAL_MS));
            let frame = if self.position < self.frames.len() {
                self.frames[self.position].clone()
            } else {
                // Script exhausted: keep returning silence
                vec![0i16; 480]
            };
            self.position += 1;
            Ok(frame)
        }
    }

    fn speech_frame() -> Vec<i16> {
        vec![3000i16; 480]
    }

    fn quiet_frame() -> Vec<i16> {
        vec![33i16; 480]
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_silence_session_ends_no_speech() {
        let clock = MockClock::new();
        let mut source = ScriptedSource::new(vec![], clock.clone());
        let session =
            RecordingSession::with_clock(&mut source, MonitorConfig::default(), clock.clone());

        let outcome = session.record(&StopSignal::new()).await.unwrap();
        assert_eq!(outcome, SessionOutcome::NoSpeech);
        assert!(!source.started, "source must be released");
    }

    #[tokio::test(start_paused = true)]
    async fn test_speech_then_silence_yields_clip() {
        let clock = MockClock::new();
        let mut frames = vec![speech_frame(), speech_frame()];
        // Enough quiet frames to cover the trailing window
        for _ in 0..80 {
            frames.push(quiet_frame());
        }
        let mut source = ScriptedSource::new(frames, clock.clone());
        let session =
            RecordingSession::with_clock(&mut source, MonitorConfig::default(), clock.clone());

        let outcome = session.record(&StopSignal::new()).await.unwrap();
        match outcome {
            SessionOutcome::Clip(samples) => {
                assert!(!samples.is_empty());
                // The clip includes both the speech and the trailing frames
                assert!(samples.len() > 2 * 480);
            }
            SessionOutcome::NoSpeech => panic!("expected a clip"),
        }
        assert!(!source.started);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_stop_without_speech_is_no_speech() {
        let clock = MockClock::new();
        let mut source = ScriptedSource::new(vec![], clock.clone());
        let session =
            RecordingSession::with_clock(&mut source, MonitorConfig::default(), clock.clone());

        let stop = StopSignal::new();
        stop.trigger();
        let outcome = session.record(&stop).await.unwrap();
        assert_eq!(outcome, SessionOutcome::NoSpeech);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_stop_after_speech_yields_clip() {
        let clock = MockClock::new();
        let stop = StopSignal::new();

        // Speech first; trigger the stop once the first frame was read
        struct StopAfterFirst {
            inner: ScriptedSource,
            stop: StopSignal,
        }
        impl AudioSource for StopAfterFirst {
            fn start(&mut self) -> Result<()> {
                self.inner.start()
            }
            fn stop(&mut self) -> Result<()> {
                self.inner.stop()
            }
            fn read_samples(&mut self) -> Result<Vec<i16>> {
                let frame = self.inner.read_samples()?;
                self.stop.trigger();
                Ok(frame)
            }
        }

        let mut source = StopAfterFirst {
            inner: ScriptedSource::new(vec![speech_frame()], clock.clone()),
            stop: stop.clone(),
        };
        let session =
            RecordingSession::with_clock(&mut source, MonitorConfig::default(), clock.clone());

        let outcome = session.record(&stop).await.unwrap();
        assert!(matches!(outcome, SessionOutcome::Clip(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_failure_propagates() {
        let mut source = MockAudioSource::new().with_start_failure();
        let session = RecordingSession::new(&mut source, MonitorConfig::default());

        let result = session.record(&StopSignal::new()).await;
        assert!(matches!(result, Err(VoxchatError::AudioCapture { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_failure_releases_source() {
        let mut source = MockAudioSource::new().with_read_failure();
        let session = RecordingSession::new(&mut source, MonitorConfig::default());

        let result = session.record(&StopSignal::new()).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_stop_signal_reset() {
        let stop = StopSignal::new();
        stop.trigger();
        assert!(stop.is_triggered());
        stop.reset();
        assert!(!stop.is_triggered());
    }
}
