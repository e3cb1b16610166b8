//! HTTP client for the chat backend.
//!
//! Three opaque operations per turn: upload the recorded clip, process it
//! into a transcript and reply, and fetch synthesized speech for the reply.
//! No retry logic; a failure at any step aborts the turn.

use crate::defaults;
use crate::error::{Result, VoxchatError};
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Transcript and reply text for one processed clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub transcript: String,
    pub response: String,
}

/// Trait for the backend, allowing a mock in tests.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Upload a recorded WAV clip. Returns the server-side filename.
    async fn upload(&self, wav_bytes: Vec<u8>) -> Result<String>;

    /// Transcribe the uploaded clip and generate a reply.
    async fn process(&self, filename: &str) -> Result<Exchange>;

    /// Fetch synthesized speech for the reply text.
    ///
    /// The entire byte stream is buffered before returning; playback starts
    /// only once the payload is complete.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    success: bool,
    filename: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct ProcessRequest<'a> {
    filename: &'a str,
}

#[derive(Debug, Deserialize)]
struct ProcessResponse {
    success: bool,
    transcript: Option<String>,
    response: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
}

/// Real backend client over HTTP.
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    /// Create a client for the given base URL (no trailing slash needed).
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| VoxchatError::Other(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Create a client with the default timeout.
    pub fn with_defaults(base_url: &str) -> Result<Self> {
        Self::new(base_url, defaults::BACKEND_TIMEOUT_SECS)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn upload(&self, wav_bytes: Vec<u8>) -> Result<String> {
        let part = reqwest::multipart::Part::bytes(wav_bytes)
            .file_name("recording.wav")
            .mime_str("audio/wav")
            .map_err(|e| VoxchatError::Upload {
                message: format!("Invalid clip payload: {e}"),
            })?;
        let form = reqwest::multipart::Form::new().part("audio", part);

        let response = self
            .client
            .post(self.endpoint("/upload-audio"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| VoxchatError::Upload {
                message: e.to_string(),
            })?;

        let body: UploadResponse = response.json().await.map_err(|e| VoxchatError::Upload {
            message: format!("Invalid upload response: {e}"),
        })?;

        if !body.success {
            return Err(VoxchatError::Upload {
                message: body.error.unwrap_or_else(|| "Upload failed".to_string()),
            });
        }

        body.filename.ok_or_else(|| VoxchatError::Upload {
            message: "Upload response missing filename".to_string(),
        })
    }

    async fn process(&self, filename: &str) -> Result<Exchange> {
        let response = self
            .client
            .post(self.endpoint("/process-audio"))
            .json(&ProcessRequest { filename })
            .send()
            .await
            .map_err(|e| VoxchatError::Processing {
                message: e.to_string(),
            })?;

        let body: ProcessResponse =
            response.json().await.map_err(|e| VoxchatError::Processing {
                message: format!("Invalid process response: {e}"),
            })?;

        if !body.success {
            return Err(VoxchatError::Processing {
                message: body
                    .error
                    .unwrap_or_else(|| "Processing failed".to_string()),
            });
        }

        match (body.transcript, body.response) {
            (Some(transcript), Some(response)) => Ok(Exchange {
                transcript,
                response,
            }),
            _ => Err(VoxchatError::Processing {
                message: "Process response missing transcript or response".to_string(),
            }),
        }
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(self.endpoint("/stream-audio"))
            .json(&SynthesizeRequest { text })
            .send()
            .await
            .map_err(|e| VoxchatError::Synthesis {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(VoxchatError::Synthesis {
                message: format!("Audio streaming failed with status: {}", response.status()),
            });
        }

        // Collect the whole stream before playback; the latency cost is the
        // price of skipping gapless progressive decoding.
        let mut stream = response.bytes_stream();
        let mut audio = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| VoxchatError::Synthesis {
                message: format!("Failed to read audio chunk: {e}"),
            })?;
            audio.extend_from_slice(&chunk);
        }

        Ok(audio)
    }
}

/// Scripted backend for tests, with per-operation call counting.
#[derive(Default)]
pub struct MockBackend {
    upload_result: Option<String>,
    upload_error: Option<String>,
    process_result: Option<Exchange>,
    process_error: Option<String>,
    synthesize_result: Vec<u8>,
    synthesize_error: Option<String>,
    upload_calls: std::sync::atomic::AtomicUsize,
    process_calls: std::sync::atomic::AtomicUsize,
    synthesize_calls: std::sync::atomic::AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            upload_result: Some("recording.wav".to_string()),
            process_result: Some(Exchange {
                transcript: "hello".to_string(),
                response: "hi there".to_string(),
            }),
            synthesize_result: vec![0u8; 16],
            ..Self::default()
        }
    }

    pub fn with_upload_filename(mut self, filename: &str) -> Self {
        self.upload_result = Some(filename.to_string());
        self
    }

    pub fn with_upload_error(mut self, error: &str) -> Self {
        self.upload_error = Some(error.to_string());
        self
    }

    pub fn with_exchange(mut self, transcript: &str, response: &str) -> Self {
        self.process_result = Some(Exchange {
            transcript: transcript.to_string(),
            response: response.to_string(),
        });
        self
    }

    pub fn with_process_error(mut self, error: &str) -> Self {
        self.process_error = Some(error.to_string());
        self
    }

    pub fn with_audio(mut self, audio: Vec<u8>) -> Self {
        self.synthesize_result = audio;
        self
    }

    pub fn with_synthesize_error(mut self, error: &str) -> Self {
        self.synthesize_error = Some(error.to_string());
        self
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn process_calls(&self) -> usize {
        self.process_calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn synthesize_calls(&self) -> usize {
        self.synthesize_calls
            .load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn upload(&self, _wav_bytes: Vec<u8>) -> Result<String> {
        self.upload_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if let Some(error) = &self.upload_error {
            return Err(VoxchatError::Upload {
                message: error.clone(),
            });
        }
        self.upload_result
            .clone()
            .ok_or_else(|| VoxchatError::Upload {
                message: "no upload result configured".to_string(),
            })
    }

    async fn process(&self, _filename: &str) -> Result<Exchange> {
        self.process_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if let Some(error) = &self.process_error {
            return Err(VoxchatError::Processing {
                message: error.clone(),
            });
        }
        self.process_result
            .clone()
            .ok_or_else(|| VoxchatError::Processing {
                message: "no process result configured".to_string(),
            })
    }

    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
        self.synthesize_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if let Some(error) = &self.synthesize_error {
            return Err(VoxchatError::Synthesis {
                message: error.clone(),
            });
        }
        Ok(self.synthesize_result.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_response_parses_success() {
        let body: UploadResponse =
            serde_json::from_str(r#"{"success": true, "filename": "abc.wav"}"#).unwrap();
        assert!(body.success);
        assert_eq!(body.filename.as_deref(), Some("abc.wav"));
        assert!(body.error.is_none());
    }

    #[test]
    fn test_upload_response_parses_failure() {
        let body: UploadResponse =
            serde_json::from_str(r#"{"success": false, "error": "disk full"}"#).unwrap();
        assert!(!body.success);
        assert_eq!(body.error.as_deref(), Some("disk full"));
    }

    #[test]
    fn test_process_response_parses_success() {
        let body: ProcessResponse = serde_json::from_str(
            r#"{"success": true, "transcript": "hi", "response": "hello!"}"#,
        )
        .unwrap();
        assert!(body.success);
        assert_eq!(body.transcript.as_deref(), Some("hi"));
        assert_eq!(body.response.as_deref(), Some("hello!"));
    }

    #[test]
    fn test_process_request_serializes_filename() {
        let json = serde_json::to_string(&ProcessRequest {
            filename: "clip.wav",
        })
        .unwrap();
        assert_eq!(json, r#"{"filename":"clip.wav"}"#);
    }

    #[test]
    fn test_synthesize_request_serializes_text() {
        let json = serde_json::to_string(&SynthesizeRequest { text: "read this" }).unwrap();
        assert_eq!(json, r#"{"text":"read this"}"#);
    }

    #[test]
    fn test_http_backend_strips_trailing_slash() {
        let backend = HttpBackend::with_defaults("http://localhost:5000/").unwrap();
        assert_eq!(
            backend.endpoint("/upload-audio"),
            "http://localhost:5000/upload-audio"
        );
    }

    #[tokio::test]
    async fn test_mock_backend_counts_calls() {
        let backend = MockBackend::new();

        backend.upload(vec![0u8]).await.unwrap();
        backend.process("recording.wav").await.unwrap();
        backend.synthesize("hi").await.unwrap();
        backend.synthesize("hi again").await.unwrap();

        assert_eq!(backend.upload_calls(), 1);
        assert_eq!(backend.process_calls(), 1);
        assert_eq!(backend.synthesize_calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_backend_upload_error() {
        let backend = MockBackend::new().with_upload_error("x");

        let err = backend.upload(vec![0u8]).await.unwrap_err();
        assert_eq!(err.banner_text(), "Error: x");
    }

    #[tokio::test]
    async fn test_mock_backend_exchange() {
        let backend = MockBackend::new().with_exchange("what time is it", "It is noon.");

        let exchange = backend.process("f.wav").await.unwrap();
        assert_eq!(exchange.transcript, "what time is it");
        assert_eq!(exchange.response, "It is noon.");
    }
}
