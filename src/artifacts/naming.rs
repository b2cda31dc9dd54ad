use chrono::Utc;

use crate::error::{Result, SessionError};

/// Prefix distinguishing voice replies from unrelated cache entries
pub const DEFAULT_PREFIX: &str = "voice_response";

/// Longest extension accepted from the server's `audio_format`
const MAX_EXTENSION_LEN: usize = 8;

/// Artifact file name: `<prefix>_<unixMillis>.<extension>`
///
/// Both the writer and the janitor go through this type, so a file the
/// session writes is always one the sweep recognizes.
///
/// Two replies saved in the same millisecond would map to the same name.
/// Stores refuse to overwrite, and the writer moves on to `next()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName {
    pub prefix: String,
    pub timestamp_ms: i64,
    pub extension: String,
}

impl ArtifactName {
    pub fn new(prefix: &str, timestamp_ms: i64, extension: &str) -> Result<Self> {
        if !is_valid_extension(extension) {
            return Err(SessionError::Decode(format!(
                "unsupported audio format: {:?}",
                extension
            )));
        }

        Ok(Self {
            prefix: prefix.to_string(),
            timestamp_ms,
            extension: extension.to_ascii_lowercase(),
        })
    }

    /// Name stamped with the current time
    pub fn now(prefix: &str, extension: &str) -> Result<Self> {
        Self::new(prefix, Utc::now().timestamp_millis(), extension)
    }

    /// The same name one millisecond later
    pub fn next(&self) -> Self {
        Self {
            timestamp_ms: self.timestamp_ms + 1,
            ..self.clone()
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}_{}.{}", self.prefix, self.timestamp_ms, self.extension)
    }

    /// Parse a file name written with `prefix`; `None` for anything else
    pub fn parse(prefix: &str, file_name: &str) -> Option<Self> {
        let rest = file_name.strip_prefix(prefix)?.strip_prefix('_')?;
        let (stamp, extension) = rest.rsplit_once('.')?;

        if stamp.is_empty() || !stamp.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if !is_valid_extension(extension) {
            return None;
        }

        Some(Self {
            prefix: prefix.to_string(),
            timestamp_ms: stamp.parse().ok()?,
            extension: extension.to_string(),
        })
    }
}

fn is_valid_extension(extension: &str) -> bool {
    !extension.is_empty()
        && extension.len() <= MAX_EXTENSION_LEN
        && extension.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_stays_parseable() {
        let name = ArtifactName::new(DEFAULT_PREFIX, 42, "wav").unwrap();
        let next = name.next();
        assert_eq!(next.file_name(), "voice_response_43.wav");
        assert_eq!(ArtifactName::parse(DEFAULT_PREFIX, &next.file_name()), Some(next));
    }

    #[test]
    fn test_file_name_format() {
        let name = ArtifactName::new(DEFAULT_PREFIX, 1_700_000_000_123, "mp3").unwrap();
        assert_eq!(name.file_name(), "voice_response_1700000000123.mp3");
    }

    #[test]
    fn test_parse_matches_writer() {
        let name = ArtifactName::new(DEFAULT_PREFIX, 42, "wav").unwrap();
        let parsed = ArtifactName::parse(DEFAULT_PREFIX, &name.file_name()).unwrap();
        assert_eq!(parsed, name);
    }

    #[test]
    fn test_parse_rejects_foreign_files() {
        assert_eq!(ArtifactName::parse(DEFAULT_PREFIX, "other_123.mp3"), None);
        assert_eq!(ArtifactName::parse(DEFAULT_PREFIX, "voice_response_abc.mp3"), None);
        assert_eq!(ArtifactName::parse(DEFAULT_PREFIX, "voice_response_123"), None);
        assert_eq!(ArtifactName::parse(DEFAULT_PREFIX, "voice_response_.mp3"), None);
        assert_eq!(ArtifactName::parse(DEFAULT_PREFIX, "voice_response123.mp3"), None);
    }

    #[test]
    fn test_rejects_path_like_format() {
        assert!(ArtifactName::new(DEFAULT_PREFIX, 1, "../../etc").is_err());
        assert!(ArtifactName::new(DEFAULT_PREFIX, 1, "").is_err());
        assert!(ArtifactName::new(DEFAULT_PREFIX, 1, "verylongext").is_err());
    }
}
