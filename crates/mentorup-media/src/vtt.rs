//! WebVTT synthesis from plain transcripts (spec §4.1 `transcript_to_vtt`) and
//! timestamp-based trimming (spec §9 Open Question on
//! `trim_vtt_and_transcript_via_timestamps`).

use std::path::Path;

use crate::probe::probe_duration;

const PIECE_LENGTH: usize = 68;
const CUE_OFFSET_SECS: f64 = 0.85;

/// Split `transcript` into exactly `ceil(len/piece_len)` chunks, snapping each
/// interior boundary forward to the next whitespace so no chunk splits a
/// word, per spec §4.1.
fn chunk_transcript(transcript: &str, piece_len: usize) -> Vec<(usize, usize)> {
    let len = transcript.len();
    if len == 0 {
        return Vec::new();
    }
    let chunk_count = len.div_ceil(piece_len);

    let mut splits = vec![0usize];
    for k in 1..chunk_count {
        let target = (piece_len * k).min(len);
        let boundary = match transcript[target..].find(' ') {
            Some(rel) => target + rel,
            None => len,
        };
        let boundary = boundary.max(*splits.last().unwrap()).min(len);
        splits.push(boundary);
    }
    splits.push(len);

    splits.windows(2).map(|w| (w[0], w[1])).collect()
}

fn format_cue_timestamp(total_secs: f64) -> String {
    let minutes = (total_secs / 60.0).floor() as u64;
    let secs = total_secs - (minutes as f64) * 60.0;
    format!("{:02}:{:06.3}", minutes, secs)
}

/// Synthesizes a WebVTT file by partitioning `transcript` into chunks of at
/// most 68 characters at whitespace boundaries and assigning each a cue by
/// linearly subdividing `probe_duration(src_media)` into `ceil(len/68)`
/// equal intervals, offset by a fixed +0.85s. Writes nothing and returns an
/// empty string when the duration is unknown (`<= 0`).
pub async fn transcript_to_vtt(
    src_media: impl AsRef<Path>,
    vtt_dst: impl AsRef<Path>,
    transcript: &str,
) -> crate::error::MediaResult<String> {
    let duration = probe_duration(src_media).await?;
    if duration <= 0.0 {
        return Ok(String::new());
    }

    let vtt = render_vtt(duration, transcript);
    if !vtt.is_empty() {
        let dst = vtt_dst.as_ref();
        if let Some(parent) = dst.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dst, &vtt).await?;
    }
    Ok(vtt)
}

/// Pure cue-synthesis core of [`transcript_to_vtt`], split out for unit
/// testing and for `regen_vtt` callers that already hold a known duration.
pub fn render_vtt(duration: f64, transcript: &str) -> String {
    if transcript.is_empty() {
        return String::new();
    }
    let chunks = chunk_transcript(transcript, PIECE_LENGTH);
    let chunk_count = chunks.len() as f64;

    let mut vtt = String::from("WEBVTT FILE:\n\n");
    for (j, (start, end)) in chunks.iter().enumerate() {
        let cue_start = (duration / chunk_count) * (j as f64) + CUE_OFFSET_SECS;
        let cue_end = (duration / chunk_count) * ((j + 1) as f64) + CUE_OFFSET_SECS;
        vtt.push_str(&format!(
            "{} --> {}\n",
            format_cue_timestamp(cue_start),
            format_cue_timestamp(cue_end)
        ));
        vtt.push_str(transcript[*start..*end].trim());
        vtt.push_str("\n\n");
    }
    vtt
}

/// One parsed cue: `[start, end)` in seconds plus its text.
#[derive(Debug, Clone, PartialEq)]
pub struct VttCue {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

fn parse_cue_timestamp(ts: &str) -> Option<f64> {
    let (minutes, secs) = ts.split_once(':')?;
    let minutes: f64 = minutes.parse().ok()?;
    let secs: f64 = secs.parse().ok()?;
    Some(minutes * 60.0 + secs)
}

/// Parses a WebVTT document's cues (ignores the `WEBVTT` header line).
pub fn parse_vtt(vtt: &str) -> Vec<VttCue> {
    let mut cues = Vec::new();
    let mut lines = vtt.lines().peekable();
    while let Some(line) = lines.next() {
        let Some((start_str, end_str)) = line.split_once(" --> ") else {
            continue;
        };
        let (Some(start), Some(end)) = (
            parse_cue_timestamp(start_str.trim()),
            parse_cue_timestamp(end_str.trim()),
        ) else {
            continue;
        };
        let mut text_lines = Vec::new();
        while let Some(next) = lines.peek() {
            if next.is_empty() {
                lines.next();
                break;
            }
            text_lines.push(lines.next().unwrap());
        }
        cues.push(VttCue {
            start,
            end,
            text: text_lines.join(" "),
        });
    }
    cues
}

/// Restricts cues to `[start, end]`, re-anchors their timestamps to a new
/// 0-based timeline, and concatenates the retained cues' text as the new
/// transcript. Resolves spec §9's Open Question on
/// `trim_vtt_and_transcript_via_timestamps`.
pub fn trim_vtt_and_transcript(vtt: &str, start: f64, end: f64) -> (String, String) {
    let cues: Vec<VttCue> = parse_vtt(vtt)
        .into_iter()
        .filter(|c| c.start >= start && c.end <= end)
        .collect();

    let transcript = cues
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let mut out = String::from("WEBVTT FILE:\n\n");
    for cue in &cues {
        out.push_str(&format!(
            "{} --> {}\n",
            format_cue_timestamp(cue.start - start),
            format_cue_timestamp(cue.end - start)
        ));
        out.push_str(&cue.text);
        out.push_str("\n\n");
    }

    (out, transcript)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_vtt_is_idempotent() {
        let transcript = "the quick brown fox jumps over the lazy dog and keeps running until it reaches the edge of the forest clearing";
        let first = render_vtt(12.0, transcript);
        let second = render_vtt(12.0, transcript);
        assert_eq!(first, second);
    }

    #[test]
    fn render_vtt_cue_count_matches_ceil_len_over_68() {
        let transcript = "a".repeat(200);
        let vtt = render_vtt(30.0, &transcript);
        let cues = parse_vtt(&vtt);
        assert_eq!(cues.len(), (200f64 / 68.0).ceil() as usize);
    }

    #[test]
    fn render_vtt_empty_transcript_is_empty() {
        assert_eq!(render_vtt(10.0, ""), "");
    }

    #[test]
    fn trim_vtt_restricts_and_reanchors_cues() {
        let vtt = "WEBVTT FILE:\n\n\
00:00.000 --> 00:01.000\nfirst\n\n\
00:01.500 --> 00:02.000\nsecond\n\n\
00:05.000 --> 00:06.000\nthird\n\n";
        let (trimmed, transcript) = trim_vtt_and_transcript(vtt, 0.5, 2.5);
        let cues = parse_vtt(&trimmed);
        assert_eq!(cues.len(), 1);
        assert_eq!(transcript, "second");
        assert!((cues[0].start - 0.5).abs() < 0.001);
    }
}
