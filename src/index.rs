//! Segment index loading and identifier resolution.
//!
//! The index is a JSON file holding a flat ordered list of segment
//! filenames, written by an external ingestion process. Each request reads
//! its own immutable snapshot; nothing is cached across requests.

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Extension carried by every playable segment filename.
pub const SEGMENT_EXT: &str = ".m3u8";

/// Placeholder shown when a filename carries no recognizable timestamp.
pub const UNKNOWN_TIME: &str = "?";

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("failed to read segment index: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse segment index: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Immutable snapshot of the segment index, in stored playback order.
///
/// Deserialization is strict: any entry that is not a JSON string rejects
/// the whole document.
#[derive(Debug, Clone, Default)]
pub struct SegmentIndex {
    files: Vec<String>,
}

impl SegmentIndex {
    /// Read and parse the index file at `path`.
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let content = std::fs::read_to_string(path)?;
        let files: Vec<String> = serde_json::from_str(&content)?;
        Ok(Self { files })
    }

    /// Read the index file, degrading to an empty snapshot on any failure.
    ///
    /// An absent or malformed file is normal during initial ingestion, so
    /// this only leaves a debug trace.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(index) => index,
            Err(e) => {
                tracing::debug!("treating segment index {:?} as empty: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Filenames in stored order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(String::as_str)
    }

    /// Exact, type-strict membership check.
    pub fn contains(&self, filename: &str) -> bool {
        self.files.iter().any(|f| f == filename)
    }

    /// Identifier of the entry following `filename`, if any.
    ///
    /// Returns `None` when `filename` is absent or is the last entry; there
    /// is no wraparound.
    pub fn next_after(&self, filename: &str) -> Option<&str> {
        let pos = self.files.iter().position(|f| f == filename)?;
        self.files.get(pos + 1).map(|f| strip_extension(f))
    }
}

impl FromIterator<String> for SegmentIndex {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

/// Validated public request key: a segment's base filename.
///
/// Construction goes through [`FromStr`], which enforces the allow-listed
/// character set before any lookup happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentId(String);

impl SegmentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The filename this identifier maps to in the index.
    pub fn filename(&self) -> String {
        format!("{}{}", self.0, SEGMENT_EXT)
    }
}

impl FromStr for SegmentId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("empty identifier".to_string());
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(format!("invalid identifier: {}", s));
        }
        Ok(Self(s.to_string()))
    }
}

impl std::fmt::Display for SegmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip the segment extension if present.
pub fn strip_extension(filename: &str) -> &str {
    filename.strip_suffix(SEGMENT_EXT).unwrap_or(filename)
}

/// Display title: the portion of the base name before the first underscore.
pub fn display_title(base: &str) -> &str {
    base.split('_').next().unwrap_or(base)
}

/// Human-readable recording time derived from the base name.
///
/// A base ending in `_` followed by exactly 13 ASCII digits is read as Unix
/// milliseconds and formatted as `YYYY-MM-DD HH:MM:SS` (UTC). Anything else
/// yields the [`UNKNOWN_TIME`] placeholder.
pub fn format_time(base: &str) -> String {
    match timestamp_millis(base).and_then(DateTime::<Utc>::from_timestamp_millis) {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => UNKNOWN_TIME.to_string(),
    }
}

fn timestamp_millis(base: &str) -> Option<i64> {
    let (_, suffix) = base.rsplit_once('_')?;
    if suffix.len() == 13 && suffix.bytes().all(|b| b.is_ascii_digit()) {
        suffix.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(files: &[&str]) -> SegmentIndex {
        files.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn segment_id_accepts_allowed_charset() {
        assert!("a_1700000000000".parse::<SegmentId>().is_ok());
        assert!("ABC-123_xyz".parse::<SegmentId>().is_ok());
    }

    #[test]
    fn segment_id_rejects_bad_input() {
        assert!("".parse::<SegmentId>().is_err());
        assert!("../etc/passwd".parse::<SegmentId>().is_err());
        assert!("a.m3u8".parse::<SegmentId>().is_err());
        assert!("a b".parse::<SegmentId>().is_err());
        assert!("a%2f".parse::<SegmentId>().is_err());
    }

    #[test]
    fn segment_id_filename_round_trip() {
        let id: SegmentId = "a_1700000000000".parse().unwrap();
        assert_eq!(id.filename(), "a_1700000000000.m3u8");
        assert_eq!(strip_extension(&id.filename()), id.as_str());
    }

    #[test]
    fn next_after_middle_entry() {
        let index = index_of(&["a_1.m3u8", "b_2.m3u8", "c_3.m3u8"]);
        assert_eq!(index.next_after("a_1.m3u8"), Some("b_2"));
        assert_eq!(index.next_after("b_2.m3u8"), Some("c_3"));
    }

    #[test]
    fn next_after_last_entry_is_none() {
        let index = index_of(&["a_1.m3u8", "b_2.m3u8"]);
        assert_eq!(index.next_after("b_2.m3u8"), None);
    }

    #[test]
    fn next_after_absent_entry_is_none() {
        let index = index_of(&["a_1.m3u8"]);
        assert_eq!(index.next_after("zzz.m3u8"), None);
    }

    #[test]
    fn contains_is_exact() {
        let index = index_of(&["a_1.m3u8"]);
        assert!(index.contains("a_1.m3u8"));
        assert!(!index.contains("a_1"));
        assert!(!index.contains("A_1.m3u8"));
    }

    #[test]
    fn title_is_prefix_before_first_underscore() {
        assert_eq!(display_title("talk_1700000000000"), "talk");
        assert_eq!(display_title("talk_part_2"), "talk");
        assert_eq!(display_title("plain"), "plain");
    }

    #[test]
    fn format_time_reads_thirteen_digit_suffix() {
        // 1700000000000 ms = 2023-11-14 22:13:20 UTC
        assert_eq!(format_time("a_1700000000000"), "2023-11-14 22:13:20");
        assert_eq!(format_time("a_b_1700000000000"), "2023-11-14 22:13:20");
    }

    #[test]
    fn format_time_placeholder_for_other_suffixes() {
        assert_eq!(format_time("a_170000000000"), UNKNOWN_TIME); // 12 digits
        assert_eq!(format_time("a_17000000000000"), UNKNOWN_TIME); // 14 digits
        assert_eq!(format_time("1700000000000"), UNKNOWN_TIME); // no underscore
        assert_eq!(format_time("a_x700000000000"), UNKNOWN_TIME);
        assert_eq!(format_time("plain"), UNKNOWN_TIME);
    }

    #[test]
    fn load_missing_file_is_error_but_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        assert!(SegmentIndex::load(&path).is_err());
        assert!(SegmentIndex::load_or_empty(&path).is_empty());
    }

    #[test]
    fn load_rejects_malformed_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        std::fs::write(&path, "{ not json").unwrap();
        assert!(SegmentIndex::load(&path).is_err());

        // Non-string entries reject the whole document.
        std::fs::write(&path, r#"["ok.m3u8", 42]"#).unwrap();
        assert!(SegmentIndex::load(&path).is_err());
        assert!(SegmentIndex::load_or_empty(&path).is_empty());
    }

    #[test]
    fn load_preserves_stored_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, r#"["b_2.m3u8", "a_1.m3u8", "c_3.m3u8"]"#).unwrap();

        let index = SegmentIndex::load(&path).unwrap();
        let files: Vec<&str> = index.iter().collect();
        assert_eq!(files, vec!["b_2.m3u8", "a_1.m3u8", "c_3.m3u8"]);
    }
}
