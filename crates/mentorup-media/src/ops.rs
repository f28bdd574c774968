//! The four transcode operations (spec §4.1): `trim`, `encode_web`,
//! `encode_mobile`, `extract_audio`. Grounded on
//! `original_source/.../media_tools.py`'s `video_encode_for_web`/
//! `video_encode_for_mobile`/`video_to_audio` and
//! `original_source/state-machine/trim.py`'s `output_args_trim_video`.

use std::path::{Path, PathBuf};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_dims;

/// `{:.3}` seconds, matching `trim.py`'s `format_secs`.
fn format_secs(secs: f64) -> String {
    format!("{:.3}", secs)
}

async fn require_exists(path: &Path) -> MediaResult<()> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }
    Ok(())
}

/// Re-encodes `[start_s, end_s)` with H.264 CRF 30.
pub async fn trim(
    src: impl AsRef<Path>,
    dst: impl AsRef<Path>,
    start_s: f64,
    end_s: f64,
) -> MediaResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();
    require_exists(src).await?;
    if end_s <= start_s {
        return Err(MediaError::InvalidRange {
            start: start_s,
            end: end_s,
        });
    }
    if let Some(parent) = dst.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let cmd = FfmpegCommand::new(src, dst)
        .output_arg("-ss")
        .output_arg(format_secs(start_s))
        .output_arg("-to")
        .output_arg(format_secs(end_s))
        .video_codec("libx264")
        .crf(30)
        .log_level("quiet");

    FfmpegRunner::new().run(&cmd).await
}

/// Shared `libx264`/`yuv420p`/`faststart`/mono-AAC tail for the two web
/// encode operations (spec §4.1 says "same codec parameters as web").
fn apply_web_codec_args(cmd: FfmpegCommand) -> FfmpegCommand {
    cmd.video_codec("libx264")
        .crf(23)
        .output_arg("-pix_fmt")
        .output_arg("yuv420p")
        .output_arg("-movflags")
        .output_arg("+faststart")
        .audio_codec("aac")
        .output_arg("-ac")
        .output_arg("1")
        .log_level("quiet")
}

/// Crops to 16:9, scales the longest edge to at most `max_height` (720px),
/// rounding output dimensions to the nearest even integer.
pub async fn encode_web(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    const MAX_HEIGHT: f64 = 720.0;
    const TARGET_ASPECT: f64 = 16.0 / 9.0;

    let src = src.as_ref();
    let dst = dst.as_ref();
    require_exists(src).await?;
    if let Some(parent) = dst.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let (i_w, i_h) = probe_dims(src).await?;
    if i_w <= 0 || i_h <= 0 {
        return Err(MediaError::ffmpeg_failed(
            "cannot determine source dimensions",
            None,
            None,
        ));
    }
    let (i_w, i_h) = (i_w as f64, i_h as f64);
    let i_aspect = i_w / i_h;

    let (crop_w, crop_h, o_h) = if i_aspect >= TARGET_ASPECT {
        (i_w - i_h * TARGET_ASPECT, 0.0, MAX_HEIGHT.min(i_h).round())
    } else {
        (
            0.0,
            i_h - i_w * (1.0 / TARGET_ASPECT),
            MAX_HEIGHT.min(i_w * (1.0 / TARGET_ASPECT)).round(),
        )
    };
    let mut o_w = (o_h * TARGET_ASPECT) as i64;
    let mut o_h = o_h as i64;
    if o_w % 2 != 0 {
        o_w += 1;
    }
    if o_h % 2 != 0 {
        o_h += 1;
    }

    let filter = format!(
        "crop=iw-{:.0}:ih-{:.0},scale={}:{}",
        crop_w, crop_h, o_w, o_h
    );
    let cmd = apply_web_codec_args(FfmpegCommand::new(src, dst).video_filter(filter));
    FfmpegRunner::new().run(&cmd).await
}

/// Centered square crop (480x480); 25% top-bottom zoom-in when the source is
/// landscape, otherwise a plain centered square crop.
pub async fn encode_mobile(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    const TARGET: i64 = 480;

    let src = src.as_ref();
    let dst = dst.as_ref();
    require_exists(src).await?;
    if let Some(parent) = dst.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let (i_w, i_h) = probe_dims(src).await?;
    if i_w <= 0 || i_h <= 0 {
        return Err(MediaError::ffmpeg_failed(
            "cannot determine source dimensions",
            None,
            None,
        ));
    }
    let (i_w, i_h) = (i_w as f64, i_h as f64);

    let (crop_w, crop_h) = if i_w > i_h {
        let crop_h = i_h * 0.25;
        let crop_w = i_w - (i_h - crop_h);
        (crop_w, crop_h)
    } else {
        (0.0, 0.0)
    };

    let filter = format!(
        "crop=iw-{:.0}:ih-{:.0},scale={}:{}",
        crop_w, crop_h, TARGET, TARGET
    );
    let cmd = apply_web_codec_args(FfmpegCommand::new(src, dst).video_filter(filter));
    FfmpegRunner::new().run(&cmd).await
}

/// Extracts an MP3 at source quality. Defaults to `{src}.mp3` when `dst` is
/// absent, matching `video_to_audio`.
pub async fn extract_audio(
    src: impl AsRef<Path>,
    dst: Option<&Path>,
) -> MediaResult<PathBuf> {
    let src = src.as_ref();
    require_exists(src).await?;

    let dst = match dst {
        Some(d) => d.to_path_buf(),
        None => src.with_extension("mp3"),
    };
    if let Some(parent) = dst.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let cmd = FfmpegCommand::new(src, &dst).log_level("quiet");
    FfmpegRunner::new().run(&cmd).await?;
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trim_rejects_end_before_start() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.mp4");
        tokio::fs::write(&src, b"not a real video").await.unwrap();
        let dst = dir.path().join("dst.mp4");

        let err = trim(&src, &dst, 5.0, 1.0).await.unwrap_err();
        assert!(matches!(err, MediaError::InvalidRange { .. }));
    }

    #[tokio::test]
    async fn trim_rejects_missing_source() {
        let err = trim("/nonexistent.mp4", "/tmp/out.mp4", 0.0, 1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }

    #[test]
    fn format_secs_has_three_decimals() {
        assert_eq!(format_secs(1.0), "1.000");
        assert_eq!(format_secs(2.5), "2.500");
    }
}
