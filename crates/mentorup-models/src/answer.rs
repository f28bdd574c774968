//! `Answer` and `AnswerMedia` (spec §3).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `"_IDLE_"` is the sentinel question name that skips transcription (spec §4.5).
pub const IDLE_QUESTION_NAME: &str = "_IDLE_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Video,
    Subtitles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaTag {
    Original,
    Web,
    Mobile,
    En,
}

impl MediaType {
    /// File extension used under `videos/{mentor}/{question}/`.
    pub fn extension(&self) -> &'static str {
        match self {
            MediaType::Subtitles => "vtt",
            MediaType::Video => "mp4",
        }
    }
}

/// One tagged artifact. `(type, tag)` is unique within an `Answer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnswerMedia {
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub tag: MediaTag,
    pub url: String,
    #[serde(default)]
    pub needs_transfer: bool,
}

impl AnswerMedia {
    pub fn new(media_type: MediaType, tag: MediaTag, url: impl Into<String>) -> Self {
        Self {
            media_type,
            tag,
            url: url.into(),
            needs_transfer: false,
        }
    }

    /// Replace entries sharing this media's `(type, tag)` key, per spec §4.5's
    /// merge rule ("the server merges by `(type, tag)` replacing identical roles").
    pub fn merge_into(self, media: &mut Vec<AnswerMedia>) {
        media.retain(|m| !(m.media_type == self.media_type && m.tag == self.tag));
        media.push(self);
    }
}

/// The metadata entity identified by `(mentor_id, question_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Answer {
    pub mentor_id: String,
    pub question_id: String,
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub has_edited_transcript: bool,
    #[serde(default)]
    pub media: Vec<AnswerMedia>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_replaces_identical_role() {
        let mut media = vec![AnswerMedia::new(MediaType::Video, MediaTag::Web, "old")];
        AnswerMedia::new(MediaType::Video, MediaTag::Web, "new").merge_into(&mut media);
        assert_eq!(media.len(), 1);
        assert_eq!(media[0].url, "new");
    }

    #[test]
    fn merge_keeps_distinct_roles() {
        let mut media = vec![AnswerMedia::new(MediaType::Video, MediaTag::Web, "w")];
        AnswerMedia::new(MediaType::Video, MediaTag::Mobile, "m").merge_into(&mut media);
        assert_eq!(media.len(), 2);
    }
}
