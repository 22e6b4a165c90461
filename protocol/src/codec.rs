//! Splits the inbound TCP byte stream into individual MU packets.

use crate::header::{FrameError, HeaderKind, declared_len};

/// Limits used by the frame codec to protect against malformed streams.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodecLimits {
    pub max_frame_size: usize,
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            max_frame_size: u16::MAX as usize,
        }
    }
}

/// Errors produced while splitting the byte stream. Any of them leaves the
/// stream in an unknown position, so the connection cannot continue.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("frame exceeds limit: limit={limit} actual={actual}")]
    FrameTooLarge { limit: usize, actual: usize },

    #[error("{kind:?} frame declares length {declared}, shorter than its header")]
    DeclaredLengthTooSmall { kind: HeaderKind, declared: usize },
}

/// Stateless codec that finds packet boundaries in a byte buffer.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameCodec {
    limits: CodecLimits,
}

impl FrameCodec {
    #[must_use]
    pub const fn new(limits: CodecLimits) -> Self {
        Self { limits }
    }

    #[must_use]
    pub const fn limits(&self) -> CodecLimits {
        self.limits
    }

    /// Attempts to take a single frame from the beginning of `buffer`.
    ///
    /// Returns `Ok(None)` when there are not enough bytes yet. On success the
    /// frame slice and the number of consumed bytes are returned.
    pub fn try_decode_frame<'a>(
        &self,
        buffer: &'a [u8],
    ) -> Result<Option<(&'a [u8], usize)>, CodecError> {
        let Some((kind, declared)) = declared_len(buffer)? else {
            return Ok(None);
        };

        let min_len = kind.opcode_offset() + 1;
        if declared < min_len {
            return Err(CodecError::DeclaredLengthTooSmall { kind, declared });
        }
        if declared > self.limits.max_frame_size {
            return Err(CodecError::FrameTooLarge {
                limit: self.limits.max_frame_size,
                actual: declared,
            });
        }
        if buffer.len() < declared {
            return Ok(None);
        }

        Ok(Some((&buffer[..declared], declared)))
    }

    /// Decodes as many complete frames as possible from `buffer`.
    ///
    /// Returns `(frames, consumed_bytes)`; the caller keeps
    /// `buffer[consumed_bytes..]` for the next read.
    pub fn decode_batch<'a>(
        &self,
        buffer: &'a [u8],
    ) -> Result<(Vec<&'a [u8]>, usize), CodecError> {
        let mut frames = Vec::new();
        let mut consumed = 0;

        while let Some((frame, used)) = self.try_decode_frame(&buffer[consumed..])? {
            frames.push(frame);
            consumed += used;
        }

        Ok((frames, consumed))
    }
}
