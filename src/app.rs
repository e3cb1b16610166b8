//! Chat application entry point.
//!
//! Orchestrates the conversation loop:
//! record → upload → transcribe → reveal reply while speech plays → re-arm

use crate::audio::capture::{CpalAudioSource, suppress_audio_warnings};
use crate::audio::playback::RodioPlayer;
use crate::backend::HttpBackend;
use crate::config::{ChatConfig, Config};
use crate::error::{Result, VoxchatError};
use crate::monitor::MonitorConfig;
use crate::render::{ChatView, Status};
use crate::session::StopSignal;
use crate::turn::{TurnConfig, TurnController, TurnOutcome};
use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// CLI overrides applied on top of the loaded configuration.
#[derive(Debug, Default)]
pub struct ChatOverrides {
    pub device: Option<String>,
    pub server: Option<String>,
    pub threshold: Option<f32>,
    pub silence: Option<u32>,
    pub grace: Option<u32>,
    pub once: bool,
    pub no_auto: bool,
}

/// Run the chat command: conversation loop until Ctrl+C (or one turn
/// with `--once`).
pub async fn run_chat_command(
    mut config: Config,
    overrides: ChatOverrides,
    quiet: bool,
    verbosity: u8,
) -> Result<()> {
    // Suppress noisy JACK/ALSA warnings before audio init
    suppress_audio_warnings();

    if let Some(d) = overrides.device {
        config.audio.device = Some(d);
    }
    if let Some(url) = overrides.server {
        config.backend.url = url;
    }
    if let Some(t) = overrides.threshold {
        if !(0.0..=1.0).contains(&t) {
            return Err(VoxchatError::ConfigInvalidValue {
                key: "audio.speech_threshold".to_string(),
                message: format!("must be between 0.0 and 1.0, got {t}"),
            });
        }
        config.audio.speech_threshold = t;
    }
    if let Some(ms) = overrides.silence {
        config.audio.trailing_silence_ms = ms;
    }
    if let Some(ms) = overrides.grace {
        config.audio.initial_grace_ms = ms;
    }
    if overrides.no_auto {
        config.chat.auto_rearm = false;
    }

    let backend = Arc::new(HttpBackend::new(
        &config.backend.url,
        config.backend.timeout_secs,
    )?);
    let player = Arc::new(RodioPlayer::new());
    let mut source = CpalAudioSource::new(config.audio.device.as_deref())?;

    let turn_config = TurnConfig {
        monitor: MonitorConfig {
            speech_threshold: config.audio.speech_threshold,
            trailing_silence_ms: config.audio.trailing_silence_ms,
            initial_grace_ms: config.audio.initial_grace_ms,
        },
        reveal_interval: Duration::from_millis(config.chat.text_reveal_interval_ms),
        show_levels: !quiet && verbosity >= 1,
    };

    let view = ChatView::new(quiet);
    let mut controller = TurnController::new(turn_config, backend, player, view);

    if !quiet {
        eprintln!("Connected to {}", config.backend.url);
        eprintln!("Press Enter to stop a recording early, Ctrl+C to quit.");
    }

    let mut presses = spawn_stdin_reader();
    let stop = StopSignal::new();

    // First turn always waits for the user
    controller.view_mut().set_status(Status::Idle);
    if !wait_for_press(&mut presses).await {
        return Ok(());
    }

    loop {
        let outcome = run_turn_with_input(&mut controller, &mut source, &stop, &mut presses).await;

        if overrides.once {
            break;
        }

        match outcome {
            Some(outcome) => match rearm_delay(outcome, &config.chat) {
                Some(delay) => {
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = tokio::signal::ctrl_c() => break,
                    }
                }
                None => {
                    controller.view_mut().set_status(Status::Idle);
                    if !wait_for_press(&mut presses).await {
                        break;
                    }
                }
            },
            // Ctrl+C during the turn
            None => break,
        }
    }

    if !quiet {
        eprintln!("\nGoodbye.");
    }
    Ok(())
}

/// Delay before the microphone re-arms itself after a turn.
///
/// `None` means the next turn waits for an Enter press: failed turns never
/// re-arm automatically, and nothing does when auto re-arm is disabled.
pub fn rearm_delay(outcome: TurnOutcome, chat: &ChatConfig) -> Option<Duration> {
    if !chat.auto_rearm {
        return None;
    }
    match outcome {
        TurnOutcome::Completed => Some(Duration::from_millis(chat.rearm_delay_ms)),
        TurnOutcome::NoSpeech => Some(Duration::from_millis(chat.no_speech_rearm_delay_ms)),
        TurnOutcome::Failed => None,
    }
}

/// Run one turn, treating an Enter press as a manual recording stop and
/// Ctrl+C as shutdown (returns None).
async fn run_turn_with_input(
    controller: &mut TurnController,
    source: &mut CpalAudioSource,
    stop: &StopSignal,
    presses: &mut mpsc::UnboundedReceiver<()>,
) -> Option<TurnOutcome> {
    let turn = controller.run_turn(source, stop);
    tokio::pin!(turn);

    loop {
        tokio::select! {
            outcome = &mut turn => return Some(outcome),
            press = presses.recv() => {
                match press {
                    Some(()) => stop.trigger(),
                    // stdin closed; keep running on timers alone
                    None => return Some(turn.await),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                stop.trigger();
                let _outcome = turn.await;
                return None;
            }
        }
    }
}

/// Wait for an Enter press; false means stdin closed or Ctrl+C.
async fn wait_for_press(presses: &mut mpsc::UnboundedReceiver<()>) -> bool {
    tokio::select! {
        press = presses.recv() => press.is_some(),
        _ = tokio::signal::ctrl_c() => false,
    }
}

/// Read lines from stdin on a blocking thread; each line is one press.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            if line.is_err() || tx.send(()).is_err() {
                break;
            }
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rearm_delay_after_completed_turn() {
        let chat = ChatConfig::default();
        assert_eq!(
            rearm_delay(TurnOutcome::Completed, &chat),
            Some(Duration::from_millis(800))
        );
    }

    #[test]
    fn test_rearm_delay_after_no_speech_turn() {
        let chat = ChatConfig::default();
        assert_eq!(
            rearm_delay(TurnOutcome::NoSpeech, &chat),
            Some(Duration::from_millis(1000))
        );
    }

    #[test]
    fn test_failed_turn_never_rearms() {
        let chat = ChatConfig::default();
        assert!(chat.auto_rearm);
        assert_eq!(rearm_delay(TurnOutcome::Failed, &chat), None);
    }

    #[test]
    fn test_no_rearm_when_auto_disabled() {
        let chat = ChatConfig {
            auto_rearm: false,
            ..ChatConfig::default()
        };
        assert_eq!(rearm_delay(TurnOutcome::Completed, &chat), None);
        assert_eq!(rearm_delay(TurnOutcome::NoSpeech, &chat), None);
        assert_eq!(rearm_delay(TurnOutcome::Failed, &chat), None);
    }

    #[test]
    fn test_configured_delays_are_respected() {
        let chat = ChatConfig {
            rearm_delay_ms: 250,
            no_speech_rearm_delay_ms: 400,
            ..ChatConfig::default()
        };
        assert_eq!(
            rearm_delay(TurnOutcome::Completed, &chat),
            Some(Duration::from_millis(250))
        );
        assert_eq!(
            rearm_delay(TurnOutcome::NoSpeech, &chat),
            Some(Duration::from_millis(400))
        );
    }
}
