//! # Block Sources
//!
//! A source feeds blocks to a [`BlockHandler`] one at a time, in height
//! order, until the handler reports end-of-stream or the source runs dry.

use crate::driver::{HandlerOutcome, Pipeline};
use crate::errors::PipelineError;
use async_trait::async_trait;
use shared_types::{Block, BlockNum};
use std::path::{Path, PathBuf};
use sx_02_call_cache::CallClient;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;
use tracing::{debug, info};

/// Consumer of an ordered block stream.
#[async_trait]
pub trait BlockHandler: Send {
    async fn handle_block(&mut self, block: &Block) -> Result<HandlerOutcome, PipelineError>;
}

#[async_trait]
impl<C: CallClient + 'static> BlockHandler for Pipeline<C> {
    async fn handle_block(&mut self, block: &Block) -> Result<HandlerOutcome, PipelineError> {
        Pipeline::handle_block(self, block).await
    }
}

/// Producer of an ordered block stream.
#[async_trait]
pub trait BlockSource: Send {
    async fn run(&mut self, handler: &mut dyn BlockHandler) -> Result<StreamEnd, SourceError>;
}

/// How a source run ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The handler stopped the stream at this block.
    EndOfStream { at: BlockNum },
    /// The source had no more blocks.
    Exhausted { last: Option<BlockNum> },
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Cannot read blocks from {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Line {line} is not a block")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Block {found} after block {previous}: heights must increase")]
    NonIncreasing { previous: BlockNum, found: BlockNum },

    #[error(transparent)]
    Handler(#[from] PipelineError),
}

/// Shared ordering rules: skip below start, reject non-increasing heights.
#[derive(Debug, Default)]
struct Cursor {
    start: BlockNum,
    last: Option<BlockNum>,
}

impl Cursor {
    fn new(start: BlockNum) -> Self {
        Self { start, last: None }
    }

    /// `Ok(false)` for blocks below the start height.
    fn admit(&mut self, number: BlockNum) -> Result<bool, SourceError> {
        if number < self.start {
            return Ok(false);
        }
        if let Some(previous) = self.last.filter(|previous| number <= *previous) {
            return Err(SourceError::NonIncreasing {
                previous,
                found: number,
            });
        }
        self.last = Some(number);
        Ok(true)
    }

    async fn feed(
        &mut self,
        block: &Block,
        handler: &mut dyn BlockHandler,
    ) -> Result<Option<StreamEnd>, SourceError> {
        if !self.admit(block.number)? {
            debug!(block = block.number, start = self.start, "Skipping block before start");
            return Ok(None);
        }
        match handler.handle_block(block).await? {
            HandlerOutcome::Continue => Ok(None),
            HandlerOutcome::EndOfStream => Ok(Some(StreamEnd::EndOfStream { at: block.number })),
        }
    }
}

/// Blocks as newline-delimited JSON, one [`Block`] per line.
pub struct JsonlBlockSource {
    path: PathBuf,
    cursor: Cursor,
}

impl JsonlBlockSource {
    pub fn new(path: impl AsRef<Path>, start: BlockNum) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cursor: Cursor::new(start),
        }
    }
}

#[async_trait]
impl BlockSource for JsonlBlockSource {
    async fn run(&mut self, handler: &mut dyn BlockHandler) -> Result<StreamEnd, SourceError> {
        let io_error = |source| SourceError::Io {
            path: self.path.clone(),
            source,
        };
        let file = File::open(&self.path).await.map_err(io_error)?;
        info!(path = %self.path.display(), start = self.cursor.start, "Reading blocks");

        let mut lines = LinesStream::new(BufReader::new(file).lines());
        let mut line_no = 0;
        while let Some(line) = lines.next().await {
            line_no += 1;
            let line = line.map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let block: Block = serde_json::from_str(&line).map_err(|source| SourceError::Parse {
                line: line_no,
                source,
            })?;
            if let Some(end) = self.cursor.feed(&block, handler).await? {
                return Ok(end);
            }
        }

        Ok(StreamEnd::Exhausted {
            last: self.cursor.last,
        })
    }
}

/// In-memory block sequence.
pub struct IterBlockSource {
    blocks: std::vec::IntoIter<Block>,
    cursor: Cursor,
}

impl IterBlockSource {
    pub fn new(blocks: impl IntoIterator<Item = Block>, start: BlockNum) -> Self {
        Self {
            blocks: blocks.into_iter().collect::<Vec<_>>().into_iter(),
            cursor: Cursor::new(start),
        }
    }
}

#[async_trait]
impl BlockSource for IterBlockSource {
    async fn run(&mut self, handler: &mut dyn BlockHandler) -> Result<StreamEnd, SourceError> {
        for block in self.blocks.by_ref() {
            if let Some(end) = self.cursor.feed(&block, handler).await? {
                return Ok(end);
            }
        }
        Ok(StreamEnd::Exhausted {
            last: self.cursor.last,
        })
    }
}
