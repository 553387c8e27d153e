// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Request body shapes as seen by the signer.

use crate::hash::{Sha256Hasher, EMPTY_SHA256};
use crate::{Error, Result};
use bytes::Bytes;
use std::collections::VecDeque;
use std::fmt::Debug;

/// A streaming request body.
///
/// Streams are read chunk by chunk. A replayable stream can be rewound with
/// [`BodyStream::reset`] so the transport can send it after the signer
/// consumed it for hashing.
#[async_trait::async_trait]
pub trait BodyStream: Debug + Send + Sync + 'static {
    /// Total length if known up front.
    fn content_length(&self) -> Option<u64>;

    /// Whether the stream can be read more than once.
    fn is_replayable(&self) -> bool;

    /// Read the next chunk, `None` at the end of the stream.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>>;

    /// Rewind to the first byte.
    fn reset(&mut self) -> Result<()>;
}

/// Body of an outgoing request.
#[derive(Debug, Default)]
pub enum Body {
    /// No payload at all.
    #[default]
    Empty,
    /// A payload fully held in memory.
    Bytes(Bytes),
    /// A payload produced incrementally.
    Stream(Box<dyn BodyStream>),
}

impl Body {
    /// Wrap a stream.
    pub fn stream(stream: impl BodyStream) -> Self {
        Body::Stream(Box::new(stream))
    }

    /// True for [`Body::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }

    /// True for a stream that can't be read twice.
    pub fn is_unbounded_stream(&self) -> bool {
        matches!(self, Body::Stream(s) if !s.is_replayable())
    }

    /// Hex encoded SHA256 of the payload.
    ///
    /// Streams are read to the end and rewound afterwards. Returns an error for
    /// a stream that can't be rewound since reading it would lose the payload.
    pub async fn hex_sha256(&mut self) -> Result<String> {
        match self {
            Body::Empty => Ok(EMPTY_SHA256.to_string()),
            Body::Bytes(bs) => Ok(crate::hash::hex_sha256(bs)),
            Body::Stream(s) => {
                if !s.is_replayable() {
                    return Err(Error::request_invalid(
                        "can't compute hash of a stream that is not replayable",
                    ));
                }
                let mut hasher = Sha256Hasher::default();
                while let Some(chunk) = s.next_chunk().await? {
                    hasher.update(&chunk);
                }
                s.reset()?;
                Ok(hasher.finish_hex())
            }
        }
    }

    /// Rewind a replayable stream, no-op for every other body.
    pub fn reset_stream(&mut self) -> Result<()> {
        match self {
            Body::Stream(s) if s.is_replayable() => s.reset(),
            _ => Ok(()),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bs: Bytes) -> Self {
        Body::Bytes(bs)
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Body::Bytes(Bytes::from_static(s.as_bytes()))
    }
}

/// An in-memory stream that can be replayed.
#[derive(Debug, Clone)]
pub struct ReplayableStream {
    chunks: Vec<Bytes>,
    pos: usize,
}

impl ReplayableStream {
    /// Create a stream that yields `chunks` in order.
    pub fn new(chunks: impl IntoIterator<Item = Bytes>) -> Self {
        Self {
            chunks: chunks.into_iter().collect(),
            pos: 0,
        }
    }

    /// Index of the next chunk to be read.
    pub fn position(&self) -> usize {
        self.pos
    }
}

#[async_trait::async_trait]
impl BodyStream for ReplayableStream {
    fn content_length(&self) -> Option<u64> {
        Some(self.chunks.iter().map(|c| c.len() as u64).sum())
    }

    fn is_replayable(&self) -> bool {
        true
    }

    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        let chunk = self.chunks.get(self.pos).cloned();
        if chunk.is_some() {
            self.pos += 1;
        }
        Ok(chunk)
    }

    fn reset(&mut self) -> Result<()> {
        self.pos = 0;
        Ok(())
    }
}

/// A stream that can only be read once, like a socket or a pipe.
#[derive(Debug)]
pub struct OneShotStream {
    chunks: VecDeque<Bytes>,
}

impl OneShotStream {
    /// Create a stream that yields `chunks` once.
    pub fn new(chunks: impl IntoIterator<Item = Bytes>) -> Self {
        Self {
            chunks: chunks.into_iter().collect(),
        }
    }
}

#[async_trait::async_trait]
impl BodyStream for OneShotStream {
    fn content_length(&self) -> Option<u64> {
        None
    }

    fn is_replayable(&self) -> bool {
        false
    }

    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        Ok(self.chunks.pop_front())
    }

    fn reset(&mut self) -> Result<()> {
        Err(Error::request_invalid("one-shot stream can't be reset"))
    }
}
