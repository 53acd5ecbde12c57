//! Validated configuration primitives
//!
//! Small newtypes that make invalid engine parameters unrepresentable once
//! construction succeeds. Validation failures are reported as
//! [`Error::Config`](crate::Error::Config), before any engine state exists.

use crate::{Error, Result};

/// Staging buffer size with validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BufferSize(usize);

impl BufferSize {
    /// Minimum buffer size (1KB)
    pub const MIN: usize = 1024;
    /// Maximum buffer size (64MB)
    pub const MAX: usize = 64 * 1024 * 1024;
    /// Default buffer size (32KB, the sweet spot for compressed chunks)
    pub const DEFAULT: usize = 32 * 1024;

    /// Create a new buffer size with validation
    pub fn new(size: usize) -> Result<Self> {
        if size < Self::MIN {
            Err(Error::config(format!(
                "buffer size {} is below minimum {}",
                size,
                Self::MIN
            )))
        } else if size > Self::MAX {
            Err(Error::config(format!(
                "buffer size {} exceeds maximum {}",
                size,
                Self::MAX
            )))
        } else {
            Ok(Self(size))
        }
    }

    /// Get the buffer size value
    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for BufferSize {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// Compression level with validation
///
/// Follows the zlib convention: `0` stores, `1` is fastest, `9` is best,
/// and `-1` asks the engine for its built-in default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompressionLevel(i32);

impl CompressionLevel {
    /// Engine-chosen default level
    pub const DEFAULT: i32 = -1;
    /// No compression, stored blocks only
    pub const NONE: i32 = 0;
    /// Fastest compression
    pub const FASTEST: i32 = 1;
    /// Best compression
    pub const BEST: i32 = 9;

    /// Create a new compression level with validation
    pub fn new(level: i32) -> Result<Self> {
        if (Self::DEFAULT..=Self::BEST).contains(&level) {
            Ok(Self(level))
        } else {
            Err(Error::config(format!(
                "compression level {} outside {}..={}",
                level,
                Self::DEFAULT,
                Self::BEST
            )))
        }
    }

    /// Get the compression level value
    pub fn get(self) -> i32 {
        self.0
    }

    /// Check whether the engine should pick its own level
    pub fn is_engine_default(self) -> bool {
        self.0 == Self::DEFAULT
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// Engine memory level with validation (zlib `memLevel`, 1..=9)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemLevel(u8);

impl MemLevel {
    /// Minimum memory level
    pub const MIN: u8 = 1;
    /// Maximum memory level
    pub const MAX: u8 = 9;
    /// Default memory level
    pub const DEFAULT: u8 = 8;

    /// Create a new memory level with validation
    pub fn new(level: u8) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&level) {
            Ok(Self(level))
        } else {
            Err(Error::config(format!(
                "memory level {} outside {}..={}",
                level,
                Self::MIN,
                Self::MAX
            )))
        }
    }

    /// Get the memory level value
    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for MemLevel {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// Compression strategy (zlib `strategy` parameter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Strategy {
    /// General-purpose strategy
    #[default]
    Default,
    /// Data produced by a filter or predictor
    Filtered,
    /// Huffman coding only, no string matching
    HuffmanOnly,
    /// Run-length encoding only
    Rle,
    /// Fixed Huffman codes, no dynamic trees
    Fixed,
}
