//! # Cursor: Journal Frame Position Tracker
//!
//! Walks the frames of a journal image front to back. Every frame is
//!
//! ```text
//! [len: u32 LE][crc32(payload): u32 LE][payload: len bytes]
//! ```
//!
//! The cursor enforces one invariant: `offset` never passes the end of the
//! image, and it only ever stops on a frame boundary. A frame that runs past
//! the end of the image (a write interrupted mid-append) marks the image as
//! torn; everything before `offset` is intact.

use crate::error::{Error, Result};

/// Bytes of framing in front of every payload.
pub const FRAME_HEADER_SIZE: usize = 8;

/// Upper bound on a single payload. Anything larger is corruption.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Frame a payload for appending.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(&crc32fast::hash(payload).to_le_bytes());
    frame.extend_from_slice(payload);
    frame
}

pub struct FrameCursor<'a> {
    /// The journal image being walked.
    bytes: &'a [u8],

    /// Start of the next unread frame.
    offset: usize,

    /// Set once a truncated frame is found at the tail.
    torn: bool,
}

impl<'a> FrameCursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            torn: false,
        }
    }

    /// Byte offset of the next unread frame (end of the intact prefix).
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns `true` if the walk stopped on a truncated tail frame.
    #[inline]
    pub fn is_torn(&self) -> bool {
        self.torn
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    /// Read the next frame.
    ///
    /// Returns `(offset, payload)`, or `None` at the end of the image or on
    /// a torn tail. A checksum mismatch on the last frame is treated as a
    /// torn write; anywhere else it is corruption.
    pub fn next_frame(&mut self) -> Result<Option<(usize, &'a [u8])>> {
        if self.torn || self.remaining() == 0 {
            return Ok(None);
        }
        if self.remaining() < FRAME_HEADER_SIZE {
            self.torn = true;
            return Ok(None);
        }

        let start = self.offset;
        let header = &self.bytes[start..start + FRAME_HEADER_SIZE];
        let len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let expected = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        if len > MAX_FRAME_LEN {
            return Err(Error::FrameTooLarge {
                offset: start,
                len,
                max: MAX_FRAME_LEN,
            });
        }

        let body_start = start + FRAME_HEADER_SIZE;
        if self.bytes.len() - body_start < len {
            self.torn = true;
            return Ok(None);
        }

        let end = body_start + len;
        let payload = &self.bytes[body_start..end];
        let actual = crc32fast::hash(payload);
        if actual != expected {
            if end == self.bytes.len() {
                self.torn = true;
                return Ok(None);
            }
            return Err(Error::Checksum {
                offset: start,
                expected,
                actual,
            });
        }

        self.offset = end;
        Ok(Some((start, payload)))
    }
}

// =============================================================================
// Kani Proofs: Cursor Bounds
// =============================================================================

#[cfg(kani)]
mod proofs {
    use super::*;

    /// **Proof: the cursor never moves past the end of the image**
    #[kani::proof]
    #[kani::unwind(5)]
    fn verify_offset_stays_in_bounds() {
        let bytes: [u8; 12] = kani::any();
        let mut cursor = FrameCursor::new(&bytes);

        for _ in 0..3 {
            match cursor.next_frame() {
                Ok(Some(_)) => {}
                _ => break,
            }
        }

        assert!(cursor.offset() <= bytes.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(payloads: &[&[u8]]) -> Vec<u8> {
        payloads.iter().flat_map(|p| encode_frame(p)).collect()
    }

    #[test]
    fn test_empty_image_yields_nothing() {
        let mut c = FrameCursor::new(&[]);
        assert!(c.next_frame().unwrap().is_none());
        assert!(!c.is_torn());
    }

    #[test]
    fn test_walks_frames_in_order() {
        let bytes = image(&[b"alpha", b"", b"gamma"]);
        let mut c = FrameCursor::new(&bytes);
        assert_eq!(c.next_frame().unwrap(), Some((0, &b"alpha"[..])));
        assert_eq!(c.next_frame().unwrap(), Some((13, &b""[..])));
        assert_eq!(c.next_frame().unwrap(), Some((21, &b"gamma"[..])));
        assert_eq!(c.next_frame().unwrap(), None);
        assert_eq!(c.offset(), bytes.len());
        assert!(!c.is_torn());
    }

    #[test]
    fn test_truncated_payload_is_torn() {
        let mut bytes = image(&[b"alpha", b"omega"]);
        bytes.truncate(bytes.len() - 2);
        let mut c = FrameCursor::new(&bytes);
        assert!(c.next_frame().unwrap().is_some());
        assert!(c.next_frame().unwrap().is_none());
        assert!(c.is_torn());
        assert_eq!(c.offset(), 13);
    }

    #[test]
    fn test_truncated_header_is_torn() {
        let mut bytes = image(&[b"alpha"]);
        bytes.extend_from_slice(&[7, 0, 0]);
        let mut c = FrameCursor::new(&bytes);
        assert!(c.next_frame().unwrap().is_some());
        assert!(c.next_frame().unwrap().is_none());
        assert!(c.is_torn());
        assert_eq!(c.offset(), 13);
    }

    #[test]
    fn test_bad_checksum_in_middle_is_corruption() {
        let mut bytes = image(&[b"alpha", b"omega"]);
        bytes[FRAME_HEADER_SIZE] ^= 0xFF;
        let mut c = FrameCursor::new(&bytes);
        assert!(matches!(
            c.next_frame(),
            Err(Error::Checksum { offset: 0, .. })
        ));
    }

    #[test]
    fn test_bad_checksum_on_tail_is_torn() {
        let mut bytes = image(&[b"alpha", b"omega"]);
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        let mut c = FrameCursor::new(&bytes);
        assert!(c.next_frame().unwrap().is_some());
        assert!(c.next_frame().unwrap().is_none());
        assert!(c.is_torn());
    }
}
