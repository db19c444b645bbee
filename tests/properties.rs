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

//! Property tests for framing fidelity and policy transparency.

use bytes::BytesMut;
use proptest::prelude::*;
use tokio_util::codec::Decoder;

use contextguard::config::PolicyConfig;
use contextguard::engine::PolicyEngine;
use contextguard::mcp::framer::LineFramer;

/// Collect all frames the framer yields for a given chunking of the input.
fn frames_for_chunking(input: &[u8], chunk_sizes: &[usize]) -> Vec<Vec<u8>> {
    let mut framer = LineFramer::new();
    let mut buf = BytesMut::new();
    let mut frames = Vec::new();
    let mut offset = 0;

    for &size in chunk_sizes {
        let end = (offset + size.max(1)).min(input.len());
        buf.extend_from_slice(&input[offset..end]);
        offset = end;
        while let Some(frame) = framer.decode(&mut buf).unwrap() {
            frames.push(frame.bytes().to_vec());
        }
        if offset == input.len() {
            break;
        }
    }
    buf.extend_from_slice(&input[offset..]);
    while let Some(frame) = framer.decode(&mut buf).unwrap() {
        frames.push(frame.bytes().to_vec());
    }
    while let Some(frame) = framer.decode_eof(&mut buf).unwrap() {
        frames.push(frame.bytes().to_vec());
    }
    frames
}

proptest! {
    /// Framing is independent of how the byte stream is chunked: any split
    /// of the same input yields the same frames as one whole-input chunk.
    #[test]
    fn framing_is_chunking_invariant(
        lines in proptest::collection::vec("[^\n]{0,40}", 0..8),
        chunk_sizes in proptest::collection::vec(1usize..16, 0..64),
    ) {
        let input = lines.iter().map(|l| format!("{l}\n")).collect::<String>();
        let whole = frames_for_chunking(input.as_bytes(), &[input.len().max(1)]);
        let split = frames_for_chunking(input.as_bytes(), &chunk_sizes);
        prop_assert_eq!(whole, split);
    }

    /// Every framed line reproduces the input bytes: no loss, no
    /// duplication, no reordering of non-blank lines.
    #[test]
    fn frames_preserve_line_bytes(
        lines in proptest::collection::vec("[^\n]{1,40}", 1..8),
    ) {
        let input = lines.iter().map(|l| format!("{l}\n")).collect::<String>();
        let frames = frames_for_chunking(input.as_bytes(), &[7]);
        let expected: Vec<Vec<u8>> = lines
            .iter()
            .filter(|l| !l.chars().all(|c| c.is_ascii_whitespace()))
            .map(|l| l.as_bytes().to_vec())
            .collect();
        prop_assert_eq!(frames, expected);
    }

    /// Policy checks are referentially transparent over arbitrary input.
    #[test]
    fn policy_checks_are_pure(text in "\\PC{0,200}") {
        let engine = PolicyEngine::new(PolicyConfig::default());
        prop_assert_eq!(
            engine.check_prompt_injection(&text),
            engine.check_prompt_injection(&text)
        );
        prop_assert_eq!(
            engine.check_sensitive_data(&text),
            engine.check_sensitive_data(&text)
        );
        prop_assert_eq!(engine.check_file_access(&text), engine.check_file_access(&text));
    }

    /// The rate predicate depends only on the window contents and the
    /// clock, never on call order.
    #[test]
    fn rate_check_is_order_insensitive(
        mut timestamps in proptest::collection::vec(0i64..200_000, 0..50),
        now in 100_000i64..300_000,
    ) {
        let engine = PolicyEngine::new(PolicyConfig::default());
        let forward = engine.check_rate_limit(&timestamps, now);
        timestamps.reverse();
        prop_assert_eq!(forward, engine.check_rate_limit(&timestamps, now));
    }
}
