//! Transcription service client (spec §4.5 `transcribe` stage).
//!
//! Grounded on `original_source/state-machine/answer-transcribe.py`'s
//! `transcribe_video`: submit one job request carrying the extracted audio
//! file and a `generateSubtitles` flag, read back `transcript` and
//! `subtitles` (empty subtitles means no VTT was produced).

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{TranscribeError, TranscribeResult};

#[derive(Debug, Clone)]
pub struct TranscribeConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl TranscribeConfig {
    pub fn from_env() -> TranscribeResult<Self> {
        let endpoint = std::env::var("TRANSCRIBE_SERVICE_ENDPOINT")
            .map_err(|_| TranscribeError::Http {
                status: 0,
                body: "TRANSCRIBE_SERVICE_ENDPOINT not set".into(),
            })?;
        let api_key = std::env::var("TRANSCRIBE_SERVICE_API_KEY").ok();
        let timeout_secs: u64 = std::env::var("TRANSCRIBE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(120);

        Ok(Self {
            endpoint,
            api_key,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[derive(Debug, Serialize)]
struct TranscribeJobRequestPayload {
    #[serde(rename = "generateSubtitles")]
    generate_subtitles: bool,
}

/// The result of one transcription job: a plain-text `transcript` and, when
/// `generate_subtitles` was requested and the audio was intelligible,
/// WebVTT `subtitles` (empty otherwise).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranscribeJobResult {
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub subtitles: String,
}

#[derive(Clone)]
pub struct TranscribeClient {
    http: Client,
    config: TranscribeConfig,
}

impl TranscribeClient {
    pub fn new(config: TranscribeConfig) -> TranscribeResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(TranscribeError::Network)?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> TranscribeResult<Self> {
        Self::new(TranscribeConfig::from_env()?)
    }

    /// Submits `audio_file` for transcription, requesting WebVTT subtitles
    /// alongside the plain transcript.
    pub async fn transcribe(&self, audio_file: impl AsRef<Path>) -> TranscribeResult<TranscribeJobResult> {
        let audio_file = audio_file.as_ref();
        let bytes = tokio::fs::read(audio_file).await?;
        let filename = audio_file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.mp3")
            .to_string();

        let payload = TranscribeJobRequestPayload {
            generate_subtitles: true,
        };

        let form = reqwest::multipart::Form::new()
            .text("generateSubtitles", serde_json::to_string(&payload.generate_subtitles)?)
            .part(
                "audio",
                reqwest::multipart::Part::bytes(bytes).file_name(filename),
            );

        let mut request = self.http.post(&self.config.endpoint).multipart(form);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(TranscribeError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn transcribe_parses_transcript_and_subtitles() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "transcript": "hello world",
                "subtitles": "WEBVTT FILE:\n\n00:00.000 --> 00:01.000\nhello world\n\n",
            })))
            .mount(&server)
            .await;

        let client = TranscribeClient::new(TranscribeConfig {
            endpoint: server.uri(),
            api_key: None,
            timeout: Duration::from_secs(5),
        })
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("audio.mp3");
        tokio::fs::write(&audio, b"not real audio").await.unwrap();

        let result = client.transcribe(&audio).await.unwrap();
        assert_eq!(result.transcript, "hello world");
        assert!(result.subtitles.starts_with("WEBVTT"));
    }

    #[tokio::test]
    async fn transcribe_surfaces_non_2xx_as_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("service unavailable"))
            .mount(&server)
            .await;

        let client = TranscribeClient::new(TranscribeConfig {
            endpoint: server.uri(),
            api_key: None,
            timeout: Duration::from_secs(5),
        })
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("audio.mp3");
        tokio::fs::write(&audio, b"not real audio").await.unwrap();

        let err = client.transcribe(&audio).await.unwrap_err();
        assert!(matches!(err, TranscribeError::Http { status: 503, .. }));
    }
}
