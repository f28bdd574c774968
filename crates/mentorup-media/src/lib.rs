#![deny(unreachable_patterns)]
//! FFmpeg/ffprobe wrapper for answer video processing: trim, web/mobile
//! transcode, audio extraction, and WebVTT synthesis.

pub mod command;
pub mod error;
pub mod ops;
pub mod probe;
pub mod vtt;

pub use command::{FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use ops::{encode_mobile, encode_web, extract_audio, trim};
pub use probe::{probe_dims, probe_duration};
pub use vtt::{parse_vtt, render_vtt, transcript_to_vtt, trim_vtt_and_transcript, VttCue};
