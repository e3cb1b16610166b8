//! Audio capture, encoding, and playback.

pub mod capture;
pub mod playback;
pub mod source;
pub mod wav;
