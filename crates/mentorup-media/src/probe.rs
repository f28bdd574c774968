//! `ffprobe` wrappers: `probe_duration` and `probe_dims` (spec §4.1).
//!
//! Both return sentinel values rather than erroring when the track they need
//! is absent, matching `media_tools.find_duration`/`find_video_dims`
//! (`original_source/.../media_tools.py`): callers treat `<= 0` / `(-1,-1)`
//! as "unknown".

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use serde::Deserialize;

use crate::error::{MediaError, MediaResult};

#[derive(Debug, Default, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    width: Option<i64>,
    height: Option<i64>,
    duration: Option<String>,
}

async fn run_ffprobe(path: &Path) -> MediaResult<FfprobeOutput> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: format!("ffprobe exited with {:?}", output.status.code()),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    Ok(serde_json::from_slice(&output.stdout)?)
}

/// Duration in seconds, or `-1.0` if no Video/Audio track is present.
pub async fn probe_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    let probe = run_ffprobe(path).await?;

    let media_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video" || s.codec_type == "audio");
    let Some(media_stream) = media_stream else {
        return Ok(-1.0);
    };

    let duration = probe
        .format
        .duration
        .as_ref()
        .or(media_stream.duration.as_ref())
        .and_then(|d| d.parse::<f64>().ok());

    Ok(duration.unwrap_or(-1.0))
}

/// `(width, height)` of the first video stream, or `(-1, -1)` if absent.
pub async fn probe_dims(path: impl AsRef<Path>) -> MediaResult<(i64, i64)> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    let probe = run_ffprobe(path).await?;
    let video_stream = probe.streams.iter().find(|s| s.codec_type == "video");

    match video_stream.and_then(|s| Some((s.width?, s.height?))) {
        Some(dims) => Ok(dims),
        None => Ok((-1, -1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn probe_duration_missing_file_errors() {
        let err = probe_duration("/nonexistent/path/clip.mp4").await.unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
