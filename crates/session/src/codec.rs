//! Newline-delimited JSON framing for broadcast streams.

use drydock_core::{Error, Result};
use serde::de::DeserializeOwned;

/// Splits a raw byte stream into parsed JSON frames.
///
/// Frames are delimited by a line-feed byte. Stream sockets do not guarantee
/// frame-aligned delivery, so the bytes after the last newline of a chunk are
/// carried over and prepended to the next chunk. One decoder instance lives
/// for the duration of one broadcast connection.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    carry: Vec<u8>,
}

impl FrameDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode every complete frame contained in `chunk`, in order.
    ///
    /// Segments of length <= 1 are skipped; they cover empty lines and the
    /// stray separator bytes the daemon emits between frames. A segment that
    /// fails to parse is a protocol violation and fails the whole call with
    /// the offending payload attached.
    pub fn decode<T: DeserializeOwned>(&mut self, chunk: &[u8]) -> Result<Vec<T>> {
        let mut buf = std::mem::take(&mut self.carry);
        buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        let mut start = 0;
        while let Some(offset) = buf[start..].iter().position(|&b| b == b'\n') {
            let segment = &buf[start..start + offset];
            if segment.len() > 1 {
                let frame = serde_json::from_slice(segment).map_err(|e| {
                    Error::protocol(
                        format!("invalid broadcast frame: {e}"),
                        String::from_utf8_lossy(segment).into_owned(),
                    )
                })?;
                frames.push(frame);
            }
            start += offset + 1;
        }

        self.carry = buf.split_off(start);
        Ok(frames)
    }

    /// Bytes of the trailing partial frame awaiting its newline.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.carry.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drydock_core::{ContentLevel, Message};

    fn encoded(messages: &[Message]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for message in messages {
            bytes.extend_from_slice(serde_json::to_string(message).unwrap().as_bytes());
            bytes.push(b'\n');
        }
        bytes
    }

    fn sample_messages() -> Vec<Message> {
        vec![
            Message::Log {
                content: "[App] Building".into(),
                level: ContentLevel::Info,
            },
            Message::OpenLogger,
            Message::Notify {
                content: "ready".into(),
                level: ContentLevel::Warn,
            },
        ]
    }

    #[test]
    fn decodes_multiple_frames_from_one_chunk() {
        let messages = sample_messages();
        let mut decoder = FrameDecoder::new();
        let decoded: Vec<Message> = decoder.decode(&encoded(&messages)).unwrap();
        assert_eq!(decoded, messages);
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn frame_integrity_across_every_chunk_boundary() {
        // Split the encoded stream at every possible byte boundary, including
        // inside JSON values, and expect the exact original sequence back.
        let messages = sample_messages();
        let bytes = encoded(&messages);
        for split in 0..=bytes.len() {
            let mut decoder = FrameDecoder::new();
            let mut decoded: Vec<Message> = decoder.decode(&bytes[..split]).unwrap();
            decoded.extend(decoder.decode::<Message>(&bytes[split..]).unwrap());
            assert_eq!(decoded, messages, "split at byte {split}");
            assert_eq!(decoder.pending(), 0);
        }
    }

    #[test]
    fn carries_partial_frame_between_chunks() {
        let mut decoder = FrameDecoder::new();
        let frames: Vec<Message> = decoder.decode(br#"{"type":"Open"#).unwrap();
        assert!(frames.is_empty());
        assert!(decoder.pending() > 0);
        let frames: Vec<Message> = decoder.decode(b"Logger\"}\n").unwrap();
        assert_eq!(frames, vec![Message::OpenLogger]);
    }

    #[test]
    fn skips_empty_segments() {
        let mut decoder = FrameDecoder::new();
        let frames: Vec<Message> = decoder
            .decode(b"\n\n{\"type\":\"OpenLogger\"}\n\n")
            .unwrap();
        assert_eq!(frames, vec![Message::OpenLogger]);
    }

    #[test]
    fn malformed_frame_fails_loudly_with_payload() {
        let mut decoder = FrameDecoder::new();
        let error = decoder.decode::<Message>(b"not json at all\n").unwrap_err();
        assert!(error.to_string().contains("not json at all"));
    }

    #[test]
    fn unknown_tag_is_rejected_not_coerced() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder
            .decode::<Message>(b"{\"type\":\"Mystery\",\"args\":{}}\n")
            .is_err());
    }
}
