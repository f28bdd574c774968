//! Deterministic object key layout (spec §3 `StorageLayout`, §6 Object layout).

/// Content-Type tags emitted on `put` (spec §4.2).
pub const CONTENT_TYPE_MP4: &str = "video/mp4";
pub const CONTENT_TYPE_VTT: &str = "text/vtt";
pub const CONTENT_TYPE_PNG: &str = "image/png";

/// The four recognized answer-media roles under one `(mentor, question)` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerArtifact {
    Original,
    Web,
    Mobile,
    Vtt,
}

impl AnswerArtifact {
    pub fn filename(&self) -> &'static str {
        match self {
            AnswerArtifact::Original => "original.mp4",
            AnswerArtifact::Web => "web.mp4",
            AnswerArtifact::Mobile => "mobile.mp4",
            AnswerArtifact::Vtt => "en.vtt",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            AnswerArtifact::Original | AnswerArtifact::Web | AnswerArtifact::Mobile => {
                CONTENT_TYPE_MP4
            }
            AnswerArtifact::Vtt => CONTENT_TYPE_VTT,
        }
    }
}

/// Builds the deterministic object keys and public URLs for one answer's
/// artifacts and for mentor thumbnails (spec §3, §6).
#[derive(Debug, Clone)]
pub struct StorageLayout {
    static_url_base: String,
}

impl StorageLayout {
    pub fn new(static_url_base: impl Into<String>) -> Self {
        Self {
            static_url_base: static_url_base.into(),
        }
    }

    /// `videos/{mentor}/{question}/` — the write-shared prefix for one answer.
    pub fn answer_prefix(&self, mentor: &str, question: &str) -> String {
        format!("videos/{mentor}/{question}/")
    }

    /// `videos/{mentor}/{question}/{original|web|mobile}.mp4` or `.../en.vtt`.
    pub fn answer_key(&self, mentor: &str, question: &str, artifact: AnswerArtifact) -> String {
        format!(
            "{}{}",
            self.answer_prefix(mentor, question),
            artifact.filename()
        )
    }

    /// The four recognized answer-artifact keys for `(mentor, question)`, in
    /// the deletion order spec §4.4 step 5 expects before a new ingestion.
    pub fn all_answer_keys(&self, mentor: &str, question: &str) -> Vec<String> {
        [
            AnswerArtifact::Original,
            AnswerArtifact::Web,
            AnswerArtifact::Mobile,
            AnswerArtifact::Vtt,
        ]
        .iter()
        .map(|a| self.answer_key(mentor, question, *a))
        .collect()
    }

    /// `mentor/thumbnails/{mentor}/{ISO8601-compact}/thumbnail.png`, where
    /// `timestamp` is already formatted as `%Y%m%dT%H%M%SZ` by the caller.
    pub fn thumbnail_key(&self, mentor: &str, timestamp: &str) -> String {
        format!("mentor/thumbnails/{mentor}/{timestamp}/thumbnail.png")
    }

    /// Joins `key` onto `STATIC_URL_BASE` for emission in API responses.
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/{}",
            self.static_url_base.trim_end_matches('/'),
            key.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_key_matches_spec_layout() {
        let layout = StorageLayout::new("https://static.example.com");
        assert_eq!(
            layout.answer_key("mentor-1", "question-1", AnswerArtifact::Web),
            "videos/mentor-1/question-1/web.mp4"
        );
        assert_eq!(
            layout.answer_key("mentor-1", "question-1", AnswerArtifact::Vtt),
            "videos/mentor-1/question-1/en.vtt"
        );
    }

    #[test]
    fn all_answer_keys_covers_the_four_artifacts() {
        let layout = StorageLayout::new("https://static.example.com");
        let keys = layout.all_answer_keys("m", "q");
        assert_eq!(
            keys,
            vec![
                "videos/m/q/original.mp4",
                "videos/m/q/web.mp4",
                "videos/m/q/mobile.mp4",
                "videos/m/q/en.vtt",
            ]
        );
    }

    #[test]
    fn thumbnail_key_matches_spec_layout() {
        let layout = StorageLayout::new("https://static.example.com");
        assert_eq!(
            layout.thumbnail_key("mentor-1", "20260101T120000Z"),
            "mentor/thumbnails/mentor-1/20260101T120000Z/thumbnail.png"
        );
    }

    #[test]
    fn public_url_joins_without_duplicating_slashes() {
        let layout = StorageLayout::new("https://static.example.com/");
        assert_eq!(
            layout.public_url("/videos/m/q/web.mp4"),
            "https://static.example.com/videos/m/q/web.mp4"
        );
    }
}
