//! Small free-standing helpers shared by a couple of handlers.

/// `%Y%m%dT%H%M%SZ`, matching `thumbnail.py`'s `strftime` format (spec §10.5).
pub fn utc_compact_timestamp() -> String {
    chrono::Utc::now().format("%Y%m%dT%H%M%SZ").to_string()
}
