//! Capture files: a sequence of XLogData frames, each prefixed with its
//! length as a big-endian `u32`.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{Error, Result};

/// Appends one length-prefixed frame to `buf`.
pub fn put_frame(buf: &mut BytesMut, frame: &[u8]) {
    buf.put_u32(frame.len() as u32);
    buf.put_slice(frame);
}

/// Encodes a whole capture from its frames.
pub fn encode_capture<I, F>(frames: I) -> Bytes
where
    I: IntoIterator<Item = F>,
    F: AsRef<[u8]>,
{
    let mut buf = BytesMut::new();
    for frame in frames {
        put_frame(&mut buf, frame.as_ref());
    }
    buf.freeze()
}

/// Iterates the frames of a capture without copying them.
#[derive(Debug, Clone)]
pub struct CaptureReader {
    data: Bytes,
    position: u64,
}

impl CaptureReader {
    pub fn new(data: Bytes) -> Self {
        Self { data, position: 0 }
    }

    /// Number of frames returned so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn next_frame(&mut self) -> Result<Option<Bytes>> {
        if self.data.is_empty() {
            return Ok(None);
        }

        if self.data.remaining() < 4 {
            return Err(Error::invalid_message(format!(
                "Truncated frame header after frame {}",
                self.position
            )));
        }

        let len = self.data.get_u32() as usize;
        if self.data.remaining() < len {
            return Err(Error::invalid_message(format!(
                "Frame {} declares {} bytes but only {} remain",
                self.position,
                len,
                self.data.remaining()
            )));
        }

        self.position += 1;
        Ok(Some(self.data.split_to(len)))
    }
}

impl Iterator for CaptureReader {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_frames_in_order() {
        let capture = encode_capture([&b"first"[..], &b""[..], &b"third"[..]]);
        let frames: Vec<Bytes> = CaptureReader::new(capture).collect::<Result<_>>().unwrap();
        assert_eq!(frames, vec![Bytes::from("first"), Bytes::new(), Bytes::from("third")]);
    }

    #[test]
    fn test_empty_capture() {
        let mut reader = CaptureReader::new(Bytes::new());
        assert!(reader.next_frame().unwrap().is_none());
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_truncated_frame() {
        let mut buf = BytesMut::new();
        buf.put_u32(10);
        buf.put_slice(b"short");
        let mut reader = CaptureReader::new(buf.freeze());
        assert!(matches!(reader.next_frame(), Err(Error::InvalidMessage { .. })));
    }

    #[test]
    fn test_truncated_header() {
        let mut reader = CaptureReader::new(Bytes::from_static(&[0, 0]));
        assert!(reader.next_frame().is_err());
    }
}
