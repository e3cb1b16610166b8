//! Default configuration constants for voxchat.
//!
//! Shared across configuration types and the turn controller to keep the
//! timing model in one place.

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition backends and keeps upload
/// payloads small.
pub const SAMPLE_RATE: u32 = 16000;

/// RMS threshold (0.0 to 1.0) above which a frame counts as speech.
///
/// Frames with RMS at or above this value are classified as speech,
/// everything below is silence.
pub const SPEECH_THRESHOLD: f32 = 0.01;

/// Trailing silence duration in milliseconds before a recording auto-stops.
///
/// Armed on the first silent frame after speech has been detected; any
/// speech frame cancels it.
pub const TRAILING_SILENCE_MS: u32 = 2000;

/// Initial grace period in milliseconds.
///
/// If no speech is detected within this window after recording starts,
/// the turn is abandoned (no-speech abort) without touching the backend.
pub const INITIAL_GRACE_MS: u32 = 3000;

/// Sampling cadence of the level monitor in milliseconds.
///
/// Stands in for the browser's animation-frame cadence. Timers are
/// deadline-based, so a late frame cannot miss a stop.
pub const FRAME_INTERVAL_MS: u64 = 30;

/// Typewriter reveal interval in milliseconds per character.
pub const TEXT_REVEAL_INTERVAL_MS: u64 = 30;

/// Delay in milliseconds before auto-rearming after a completed turn.
pub const REARM_DELAY_MS: u64 = 800;

/// Delay in milliseconds before auto-rearming after a no-speech turn.
pub const NO_SPEECH_REARM_DELAY_MS: u64 = 1000;

/// How long error banners stay visible before self-dismissing, in milliseconds.
pub const BANNER_DISMISS_MS: u64 = 5000;

/// Default backend base URL.
pub const BACKEND_URL: &str = "http://localhost:5000";

/// Default backend request timeout in seconds.
///
/// Covers transcription and synthesis round-trips; generous because the
/// backend buffers the whole synthesized stream before we see the end.
pub const BACKEND_TIMEOUT_SECS: u64 = 60;
