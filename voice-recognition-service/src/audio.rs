//! Audio container detection by file extension

use std::path::Path;

use serde::Serialize;

/// Speech-to-Text `RecognitionConfig.AudioEncoding` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioEncoding {
    EncodingUnspecified,
    Linear16,
    Flac,
    Mp3,
    OggOpus,
    WebmOpus,
}

impl AudioEncoding {
    /// Unknown or missing extensions fall back to LINEAR16
    pub fn from_filename(filename: &str) -> Self {
        match extension(filename).as_deref() {
            Some(".flac") => AudioEncoding::Flac,
            Some(".mp3") => AudioEncoding::Mp3,
            Some(".ogg") => AudioEncoding::OggOpus,
            Some(".webm") => AudioEncoding::WebmOpus,
            Some(".m4a") => AudioEncoding::EncodingUnspecified,
            _ => AudioEncoding::Linear16,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AudioEncoding::EncodingUnspecified => "ENCODING_UNSPECIFIED",
            AudioEncoding::Linear16 => "LINEAR16",
            AudioEncoding::Flac => "FLAC",
            AudioEncoding::Mp3 => "MP3",
            AudioEncoding::OggOpus => "OGG_OPUS",
            AudioEncoding::WebmOpus => "WEBM_OPUS",
        }
    }

    /// Containers that carry their own sample rate must not be sent one
    pub fn needs_sample_rate(self) -> bool {
        matches!(self, AudioEncoding::Linear16)
    }
}

pub const SUPPORTED_AUDIO_FORMATS: [&str; 6] = [".wav", ".flac", ".mp3", ".ogg", ".webm", ".m4a"];

pub fn is_audio_file(filename: &str) -> bool {
    extension(filename).is_some_and(|ext| SUPPORTED_AUDIO_FORMATS.contains(&ext.as_str()))
}

/// Lowercased extension including the dot
pub fn extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_from_extension() {
        assert_eq!(AudioEncoding::from_filename("visit.wav"), AudioEncoding::Linear16);
        assert_eq!(AudioEncoding::from_filename("visit.FLAC"), AudioEncoding::Flac);
        assert_eq!(AudioEncoding::from_filename("memo.mp3"), AudioEncoding::Mp3);
        assert_eq!(AudioEncoding::from_filename("memo.ogg"), AudioEncoding::OggOpus);
        assert_eq!(AudioEncoding::from_filename("rec.webm"), AudioEncoding::WebmOpus);
        assert_eq!(AudioEncoding::from_filename("rec.m4a"), AudioEncoding::EncodingUnspecified);
        assert_eq!(AudioEncoding::from_filename("noext"), AudioEncoding::Linear16);
    }

    #[test]
    fn test_is_audio_file() {
        assert!(is_audio_file("a.webm"));
        assert!(is_audio_file("A.M4A"));
        assert!(!is_audio_file("photo.jpg"));
        assert!(!is_audio_file("wav"));
    }

    #[test]
    fn test_encoding_wire_name() {
        assert_eq!(
            serde_json::to_value(AudioEncoding::OggOpus).unwrap(),
            serde_json::json!("OGG_OPUS")
        );
        assert_eq!(AudioEncoding::Linear16.as_str(), "LINEAR16");
    }
}
