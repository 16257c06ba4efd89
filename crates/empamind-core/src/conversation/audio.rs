//! Opaque audio attachments.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Container format of an audio clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Webm,
    Ogg,
    Mp3,
    Wav,
}

impl AudioFormat {
    /// The tag sent to the backend as `audioFormat`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Webm => "webm",
            Self::Ogg => "ogg",
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Webm => "audio/webm",
            Self::Ogg => "audio/ogg",
            Self::Mp3 => "audio/mpeg",
            Self::Wav => "audio/wav",
        }
    }

    /// Guesses the format from a file extension (`"ogg"`, `"MP3"`, ...).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "webm" => Some(Self::Webm),
            "ogg" | "oga" | "opus" => Some(Self::Ogg),
            "mp3" | "mpeg" => Some(Self::Mp3),
            "wav" => Some(Self::Wav),
            _ => None,
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An opaque binary audio blob with its format tag.
///
/// Bytes are shared, so cloning a message that carries a clip is cheap.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioClip {
    bytes: Arc<[u8]>,
    format: AudioFormat,
}

impl AudioClip {
    pub fn new(bytes: impl Into<Vec<u8>>, format: AudioFormat) -> Self {
        Self {
            bytes: Arc::from(bytes.into()),
            format,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for AudioClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioClip")
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .finish()
    }
}
