//! Synthesized speech playback via rodio.
//!
//! One clip plays at a time: starting a new playback stops and discards any
//! prior one before the new sink is installed.

use crate::error::{Result, VoxchatError};
use async_trait::async_trait;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

/// Trait for playing a synthesized speech clip to completion.
#[async_trait]
pub trait SpeechPlayer: Send + Sync {
    /// Play the given audio bytes (e.g. MP3/WAV), resolving when playback
    /// finishes. Any playback still in progress is stopped and discarded
    /// first. Empty payloads are a no-op.
    async fn play(&self, bytes: Vec<u8>) -> Result<()>;
}

/// Real playback through the default output device.
pub struct RodioPlayer {
    current: Arc<Mutex<Option<Arc<rodio::Sink>>>>,
}

impl RodioPlayer {
    pub fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new(None)),
        }
    }

    /// Stop and discard the current playback, if any.
    pub fn stop(&self) {
        if let Ok(mut guard) = self.current.lock()
            && let Some(sink) = guard.take()
        {
            sink.stop();
        }
    }
}

impl Default for RodioPlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechPlayer for RodioPlayer {
    async fn play(&self, bytes: Vec<u8>) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }

        // Discard any prior playback before starting a new one
        self.stop();

        let current = Arc::clone(&self.current);
        // rodio's OutputStream is not Send, so the whole playback lives on a
        // blocking thread; the sink handle is shared back for stop().
        tokio::task::spawn_blocking(move || -> Result<()> {
            let (_stream, stream_handle) =
                rodio::OutputStream::try_default().map_err(|e| VoxchatError::Playback {
                    message: format!("No output device: {}", e),
                })?;
            let sink = Arc::new(rodio::Sink::try_new(&stream_handle).map_err(|e| {
                VoxchatError::Playback {
                    message: format!("Failed to open sink: {}", e),
                }
            })?);

            let source =
                rodio::Decoder::new(Cursor::new(bytes)).map_err(|e| VoxchatError::Playback {
                    message: format!("Decode failed: {}", e),
                })?;

            if let Ok(mut guard) = current.lock() {
                *guard = Some(Arc::clone(&sink));
            }

            sink.append(source);
            sink.sleep_until_end();

            // Clear the handle unless a newer playback already replaced it
            if let Ok(mut guard) = current.lock()
                && guard.as_ref().is_some_and(|s| Arc::ptr_eq(s, &sink))
            {
                *guard = None;
            }

            Ok(())
        })
        .await
        .map_err(|e| VoxchatError::Playback {
            message: format!("Playback task failed: {}", e),
        })?
    }
}

/// Mock player for tests: records payloads instead of playing them.
#[derive(Default)]
pub struct NullPlayer {
    played: Mutex<Vec<Vec<u8>>>,
    should_fail: bool,
}

impl NullPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the mock to fail on play.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Payloads handed to `play`, in order.
    pub fn played(&self) -> Vec<Vec<u8>> {
        self.played.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn play_count(&self) -> usize {
        self.played.lock().map(|p| p.len()).unwrap_or(0)
    }
}

#[async_trait]
impl SpeechPlayer for NullPlayer {
    async fn play(&self, bytes: Vec<u8>) -> Result<()> {
        if self.should_fail {
            return Err(VoxchatError::Playback {
                message: "mock playback error".to_string(),
            });
        }
        if let Ok(mut played) = self.played.lock() {
            played.push(bytes);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_player_records_payloads() {
        let player = NullPlayer::new();
        player.play(vec![1, 2, 3]).await.unwrap();
        player.play(vec![4]).await.unwrap();

        assert_eq!(player.play_count(), 2);
        assert_eq!(player.played(), vec![vec![1, 2, 3], vec![4]]);
    }

    #[tokio::test]
    async fn test_null_player_failure() {
        let player = NullPlayer::new().with_failure();
        let result = player.play(vec![1]).await;
        assert!(matches!(result, Err(VoxchatError::Playback { .. })));
        assert_eq!(player.play_count(), 0);
    }

    #[tokio::test]
    async fn test_rodio_player_empty_payload_is_noop() {
        let player = RodioPlayer::new();
        // Must not touch the output device for an empty clip
        player.play(Vec::new()).await.unwrap();
    }

    #[test]
    fn test_rodio_player_stop_without_playback() {
        let player = RodioPlayer::new();
        player.stop();
    }
}
