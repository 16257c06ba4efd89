//! Base64 transfer encoding for voice payloads.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use empamind_core::conversation::{AudioClip, AudioFormat};
use empamind_core::{EmpaMindError, Result};

/// Encodes a clip for the `audio` field of a voice request.
pub fn encode_audio(clip: &AudioClip) -> String {
    BASE64_STANDARD.encode(clip.bytes())
}

/// Decodes a base64 audio payload, with or without a `data:...;base64,` prefix.
pub fn decode_audio(payload: &str, format: AudioFormat) -> Result<AudioClip> {
    let data = match payload.split_once(',') {
        Some((_, data)) => data,
        None => payload,
    };
    let data: String = data.chars().filter(|c| !c.is_whitespace()).collect();

    if data.is_empty() {
        return Err(EmpaMindError::decode("base64", "audio payload is empty"));
    }

    let bytes = BASE64_STANDARD
        .decode(data.as_bytes())
        .map_err(|e| EmpaMindError::decode("base64", e.to_string()))?;

    Ok(AudioClip::new(bytes, format))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_strips_data_url_prefix() {
        let clip = decode_audio("data:audio/mpeg;base64,SUQz", AudioFormat::Mp3).unwrap();
        assert_eq!(clip.bytes(), b"ID3");
        assert_eq!(clip.format(), AudioFormat::Mp3);
    }

    #[test]
    fn test_decode_accepts_bare_payload_with_line_breaks() {
        let clip = decode_audio("SUQz\nBAA=", AudioFormat::Mp3).unwrap();
        assert_eq!(clip.bytes(), b"ID3\x04\x00");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_audio("not*base64!", AudioFormat::Mp3).unwrap_err();
        assert!(matches!(err, EmpaMindError::Decode { .. }));

        assert!(decode_audio("data:audio/mpeg;base64,", AudioFormat::Mp3).is_err());
    }

    #[test]
    fn test_encode_matches_standard_alphabet() {
        let clip = AudioClip::new(b"ID3".to_vec(), AudioFormat::Webm);
        assert_eq!(encode_audio(&clip), "SUQz");
    }
}
