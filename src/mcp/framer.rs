// Copyright 2026 ContextGuard Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Newline-delimited frame codec.
//!
//! Splits an incoming byte stream into complete `\n`-terminated frames,
//! tolerant of partial reads. Frames carry the original bytes of the line
//! (without the terminator) so unparseable lines can still be forwarded
//! byte-for-byte. Parsing is left to the interceptor; a parse failure only
//! classifies a frame as opaque, it never invalidates it.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::engine_core::constants::limits;
use crate::engine_core::errors::GatewayError;

/// One complete line from the peer, terminator stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    bytes: Bytes,
}

impl RawFrame {
    pub fn new(bytes: Bytes) -> Self {
        Self { bytes }
    }

    /// The original line bytes (no trailing `\n`).
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lossy view for log excerpts.
    pub fn as_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// The line re-terminated, ready to forward.
    pub fn to_wire(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(self.bytes.len() + 1);
        out.extend_from_slice(&self.bytes);
        out.extend_from_slice(b"\n");
        out.freeze()
    }
}

pub struct LineFramer {
    max_line: usize,
    /// Offset into the accumulator already scanned for a newline.
    next_index: usize,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::with_max_line(limits::MAX_LINE_BYTES)
    }

    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            max_line,
            next_index: 0,
        }
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineFramer {
    type Item = RawFrame;
    type Error = GatewayError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<RawFrame>, GatewayError> {
        loop {
            let newline = src[self.next_index..]
                .iter()
                .position(|&b| b == b'\n')
                .map(|off| self.next_index + off);

            match newline {
                Some(pos) => {
                    if pos > self.max_line {
                        return Err(GatewayError::Transport(format!(
                            "frame exceeds {} byte limit",
                            self.max_line
                        )));
                    }
                    let line = src.split_to(pos + 1);
                    self.next_index = 0;
                    // Drop the terminator; blank lines are not frames.
                    let segment = &line[..line.len() - 1];
                    if segment.iter().all(|b| b.is_ascii_whitespace()) {
                        continue;
                    }
                    trace!(len = segment.len(), "framed one line");
                    return Ok(Some(RawFrame::new(Bytes::copy_from_slice(segment))));
                }
                None => {
                    if src.len() > self.max_line {
                        return Err(GatewayError::Transport(format!(
                            "unterminated frame exceeds {} byte limit",
                            self.max_line
                        )));
                    }
                    self.next_index = src.len();
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<RawFrame>, GatewayError> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if !src.is_empty() {
            // Residue without a terminator is not a frame; the stream ended
            // mid-line and there is nothing well-formed left to deliver.
            trace!(len = src.len(), "discarding unterminated residue at EOF");
            src.clear();
            self.next_index = 0;
        }
        Ok(None)
    }
}
