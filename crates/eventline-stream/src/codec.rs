//! Line framing for event streams.

use std::io;

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, LinesCodecError};

/// Splits bytes into lines ended by `\n`, `\r\n`, or a bare `\r`.
///
/// Failures are reported the way `LinesCodec` reports them: a line longer
/// than the maximum gives [`LinesCodecError::MaxLineLengthExceeded`], and
/// bytes that are not UTF-8 give an [`io::ErrorKind::InvalidData`] error
/// inside [`LinesCodecError::Io`]. Bytes left without a terminator at the
/// end of input come out as a final line.
#[derive(Clone, Debug, Default)]
pub struct EventLineCodec {
    /// Prefix of the buffer already searched for a terminator.
    next_index: usize,
    max_length: Option<usize>,
    /// The previous line ended in `\r`, so a leading `\n` belongs to it.
    skip_lf: bool,
}

impl EventLineCodec {
    /// A codec with no limit on line length.
    pub fn new() -> Self {
        Self::default()
    }

    /// A codec rejecting lines longer than `max_length` bytes, terminator
    /// excluded.
    pub fn new_with_max_length(max_length: usize) -> Self {
        Self {
            max_length: Some(max_length),
            ..Self::default()
        }
    }

    /// The configured maximum line length.
    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }
}

fn utf8(bytes: &[u8]) -> Result<String, LinesCodecError> {
    std::str::from_utf8(bytes).map(str::to_owned).map_err(|_| {
        LinesCodecError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            "unable to decode input as UTF8",
        ))
    })
}

impl Decoder for EventLineCodec {
    type Item = String;
    type Error = LinesCodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<String>, LinesCodecError> {
        if self.skip_lf && !buf.is_empty() {
            self.skip_lf = false;
            if buf[0] == b'\n' {
                buf.advance(1);
            }
        }

        let limit = self
            .max_length
            .map_or(buf.len(), |max| buf.len().min(max.saturating_add(1)));
        let terminator = buf[self.next_index..limit]
            .iter()
            .position(|byte| *byte == b'\n' || *byte == b'\r');

        match terminator {
            Some(offset) => {
                let end = self.next_index + offset;
                self.next_index = 0;
                let mut line = buf.split_to(end + 1);
                self.skip_lf = line[end] == b'\r';
                line.truncate(end);
                utf8(&line).map(Some)
            }
            None if self.max_length.is_some_and(|max| buf.len() > max) => {
                Err(LinesCodecError::MaxLineLengthExceeded)
            }
            None => {
                self.next_index = limit;
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<String>, LinesCodecError> {
        match self.decode(buf)? {
            Some(line) => Ok(Some(line)),
            None if buf.is_empty() => Ok(None),
            None => {
                self.next_index = 0;
                let line = buf.split_to(buf.len());
                utf8(&line).map(Some)
            }
        }
    }
}
