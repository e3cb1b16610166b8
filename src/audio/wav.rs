//! In-memory WAV encoding for upload clips.

use crate::defaults::SAMPLE_RATE;
use crate::error::{Result, VoxchatError};
use std::io::Cursor;

/// Encode 16kHz mono i16 PCM samples as a WAV byte buffer.
///
/// The result is what gets attached to the multipart upload as
/// `recording.wav`.
pub fn encode_wav(samples: &[i16]) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| VoxchatError::AudioEncode {
                message: format!("Failed to create WAV writer: {}", e),
            })?;

        for &sample in samples {
            writer
                .write_sample(sample)
                .map_err(|e| VoxchatError::AudioEncode {
                    message: format!("Failed to write WAV sample: {}", e),
                })?;
        }

        writer.finalize().map_err(|e| VoxchatError::AudioEncode {
            message: format!("Failed to finalize WAV data: {}", e),
        })?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_empty_clip_is_valid_wav() {
        let bytes = encode_wav(&[]).unwrap();
        // RIFF header + fmt + data chunks
        assert!(bytes.len() >= 44);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
    }

    #[test]
    fn test_encode_round_trips_through_hound() {
        let samples: Vec<i16> = (0..1600).map(|i| (i % 100) as i16).collect();
        let bytes = encode_wav(&samples).unwrap();

        let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, SAMPLE_RATE);
        assert_eq!(spec.bits_per_sample, 16);

        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }
}
