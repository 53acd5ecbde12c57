//! Codec configuration
//!
//! Construction parameters for the compressing writer and decompressing
//! reader, following the zlib parameter conventions (level, method, window
//! bits, memory level, strategy).

use streamflate_types::{BufferSize, CompressionLevel, Error, MemLevel, Result, Strategy};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The only supported compression method (zlib `Z_DEFLATED`)
pub const METHOD_DEFLATED: u8 = 8;

/// Default window bits: 32KB history window with zlib framing
pub const DEFAULT_WINDOW_BITS: i32 = 15;

/// Configuration for a compressing writer
///
/// Memory level and strategy are validated and carried for parameter
/// compatibility; the bundled DEFLATE backend compresses with its own
/// internal tuning and does not vary on them.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeflateConfig {
    /// Compression level (-1 = engine default, 0..=9)
    pub level: CompressionLevel,
    /// Compression method; only [`METHOD_DEFLATED`] is accepted
    pub method: u8,
    /// Window bits selecting history size and stream framing
    pub window_bits: i32,
    /// Engine memory level (1..=9)
    pub mem_level: MemLevel,
    /// Compression strategy
    pub strategy: Strategy,
    /// Staging buffer size for compressed output
    pub buffer_size: BufferSize,
}

impl Default for DeflateConfig {
    fn default() -> Self {
        Self {
            level: CompressionLevel::default(), // engine default (-1)
            method: METHOD_DEFLATED,
            window_bits: DEFAULT_WINDOW_BITS, // zlib framing
            mem_level: MemLevel::default(),
            strategy: Strategy::default(),
            buffer_size: BufferSize::default(), // 32KB
        }
    }
}

impl DeflateConfig {
    /// Create a configuration for the given framing, defaults elsewhere
    pub fn with_window_bits(window_bits: i32) -> Self {
        Self {
            window_bits,
            ..Self::default()
        }
    }

    /// Validate parameters that are not already enforced by their types
    pub fn validate(&self) -> Result<()> {
        if self.method != METHOD_DEFLATED {
            return Err(Error::config(format!(
                "unsupported compression method {}, only {} (deflated) is supported",
                self.method, METHOD_DEFLATED
            )));
        }
        Ok(())
    }
}

/// Configuration for a decompressing reader
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InflateConfig {
    /// Window bits; must match (or exceed) the compressor's framing
    pub window_bits: i32,
    /// Staging buffer size for compressed input
    pub buffer_size: BufferSize,
}

impl Default for InflateConfig {
    fn default() -> Self {
        Self {
            window_bits: DEFAULT_WINDOW_BITS,
            buffer_size: BufferSize::default(),
        }
    }
}

impl InflateConfig {
    /// Create a configuration for the given framing, defaults elsewhere
    pub fn with_window_bits(window_bits: i32) -> Self {
        Self {
            window_bits,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DeflateConfig::default();
        assert_eq!(config.method, METHOD_DEFLATED);
        assert_eq!(config.window_bits, 15);
        assert_eq!(config.buffer_size.get(), 32 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unsupported_method_rejected() {
        let config = DeflateConfig {
            method: 9,
            ..DeflateConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }
}
