//! One conversation turn from mic to spoken reply.
//!
//! The controller walks a single turn through its stages: record a clip,
//! upload it, transcribe it, then reveal the reply text while speech
//! synthesis and playback run alongside. Failures at any stage clear the
//! transient indicators, raise a banner, and land back in `Idle`; re-arming
//! after a turn is the caller's decision.

use crate::audio::playback::SpeechPlayer;
use crate::audio::source::AudioSource;
use crate::audio::wav::encode_wav;
use crate::backend::Backend;
use crate::defaults;
use crate::monitor::{Clock, MonitorConfig, SystemClock};
use crate::render::{ChatView, Placeholder, Status, reveal_text};
use crate::session::{RecordingSession, SessionOutcome, StopSignal};
use std::sync::Arc;
use std::time::Duration;

/// Stage of the active turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    Recording,
    Uploading,
    Transcribing,
    AwaitingResponse,
    StreamingText,
    StreamingAudio,
}

/// How a turn ended; drives the caller's re-arm decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Transcript and reply delivered, audio finished.
    Completed,
    /// Recording ended without any speech; nothing was sent.
    NoSpeech,
    /// Some stage failed; a banner was raised and no re-arm should follow.
    Failed,
}

/// Tunables for a turn, derived from the config layer.
#[derive(Debug, Clone)]
pub struct TurnConfig {
    pub monitor: MonitorConfig,
    pub reveal_interval: Duration,
    pub show_levels: bool,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            reveal_interval: Duration::from_millis(defaults::TEXT_REVEAL_INTERVAL_MS),
            show_levels: false,
        }
    }
}

/// Drives single turns against a backend and a speech player.
pub struct TurnController<C: Clock + Clone = SystemClock> {
    config: TurnConfig,
    backend: Arc<dyn Backend>,
    player: Arc<dyn SpeechPlayer>,
    view: ChatView<C>,
    clock: C,
    phase: TurnPhase,
}

impl TurnController<SystemClock> {
    pub fn new(
        config: TurnConfig,
        backend: Arc<dyn Backend>,
        player: Arc<dyn SpeechPlayer>,
        view: ChatView,
    ) -> Self {
        Self::with_clock(config, backend, player, view, SystemClock)
    }
}

impl<C: Clock + Clone> TurnController<C> {
    pub fn with_clock(
        config: TurnConfig,
        backend: Arc<dyn Backend>,
        player: Arc<dyn SpeechPlayer>,
        view: ChatView<C>,
        clock: C,
    ) -> Self {
        Self {
            config,
            backend,
            player,
            view,
            clock,
            phase: TurnPhase::Idle,
        }
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn view(&self) -> &ChatView<C> {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ChatView<C> {
        &mut self.view
    }

    /// Run one full turn. Always lands back in `Idle`.
    pub async fn run_turn(
        &mut self,
        source: &mut dyn AudioSource,
        stop: &StopSignal,
    ) -> TurnOutcome {
        stop.reset();
        self.phase = TurnPhase::Recording;
        self.view.set_status(Status::Listening);

        let session = RecordingSession::with_clock(
            source,
            self.config.monitor.clone(),
            self.clock.clone(),
        )
        .with_level_display(self.config.show_levels);

        let clip = match session.record(stop).await {
            Ok(SessionOutcome::Clip(samples)) => samples,
            Ok(SessionOutcome::NoSpeech) => {
                self.view.set_status(Status::NoSpeech);
                self.phase = TurnPhase::Idle;
                return TurnOutcome::NoSpeech;
            }
            Err(e) => {
                return self.fail(&e.banner_text(), None);
            }
        };

        let processing = self.view.push_placeholder(Placeholder::Processing);
        self.view.set_status(Status::Processing);

        self.phase = TurnPhase::Uploading;
        let wav = match encode_wav(&clip) {
            Ok(wav) => wav,
            Err(e) => return self.fail(&e.banner_text(), Some(processing)),
        };
        let filename = match self.backend.upload(wav).await {
            Ok(filename) => filename,
            Err(e) => return self.fail(&e.banner_text(), Some(processing)),
        };

        self.phase = TurnPhase::Transcribing;
        self.view.set_status(Status::Transcribing);
        let exchange = match self.backend.process(&filename).await {
            Ok(exchange) => exchange,
            Err(e) => return self.fail(&e.banner_text(), Some(processing)),
        };

        self.phase = TurnPhase::AwaitingResponse;
        self.view.remove_placeholder(processing);
        self.view.push_user(&exchange.transcript);
        let waiting = self.view.push_placeholder(Placeholder::Waiting);
        self.view.set_status(Status::GeneratingResponse);

        // Reply text is in hand; streaming starts now
        self.view.remove_placeholder(waiting);
        self.view.push_assistant(&exchange.response);
        self.view.set_status(Status::ConvertingToSpeech);

        let backend = Arc::clone(&self.backend);
        let player = Arc::clone(&self.player);
        let reply = exchange.response.clone();
        let audio_task = tokio::spawn(async move {
            let audio = backend.synthesize(&reply).await?;
            player.play(audio).await
        });

        // The typewriter runs to completion on its own clock, whether or
        // not the audio fetch has finished
        self.phase = TurnPhase::StreamingText;
        reveal_text(&exchange.response, self.config.reveal_interval).await;

        // Text is fully revealed; the buffered audio is what remains
        self.phase = TurnPhase::StreamingAudio;
        self.view.set_status(Status::Playing);
        match audio_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return self.fail(&e.banner_text(), None),
            Err(e) => return self.fail(&format!("Error: {e}"), None),
        }

        self.phase = TurnPhase::Idle;
        self.view.set_status(Status::Idle);
        TurnOutcome::Completed
    }

    fn fail(&mut self, banner: &str, placeholder: Option<crate::render::EntryId>) -> TurnOutcome {
        if let Some(id) = placeholder {
            self.view.remove_placeholder(id);
        }
        self.view.banner(banner);
        self.phase = TurnPhase::Idle;
        self.view.set_status(Status::Idle);
        TurnOutcome::Failed
    }
}
