//! Streaming DEFLATE adapter for streamflate
//!
//! This crate drives a stateful deflate/inflate engine across repeated
//! chunks of data:
//!
//! - **[`CompressingWriter`]**: buffers engine output and forwards it to a
//!   downstream [`std::io::Write`] sink, with distinct none/sync/finish
//!   flush semantics and a sticky terminal state
//! - **[`DecompressingReader`]**: the pull-side counterpart over a
//!   [`std::io::Read`] source
//! - **[`engine`]**: the control boundary over the low-level `flate2`
//!   contexts, including gzip member framing
//!
//! Stream framing is selected through the zlib window-bits convention:
//! negative for raw DEFLATE, 9..=15 for zlib, 25..=31 for gzip.
//!
//! # Features
//!
//! - `serde` (default): Enable serialization support for configurations
//!
//! # Examples
//!
//! ```rust
//! use streamflate_codec::{CompressingWriter, DecompressingReader};
//! use std::io::Read;
//!
//! # fn main() -> streamflate_types::Result<()> {
//! let mut writer = CompressingWriter::new(Vec::new(), 15)?;
//! writer.write(b"hello, stream")?;
//! writer.finish()?;
//! let compressed = writer.into_inner();
//!
//! let mut reader = DecompressingReader::new(compressed.as_slice(), 15)?;
//! let mut out = Vec::new();
//! reader.read_to_end(&mut out).map_err(streamflate_types::Error::from)?;
//! assert_eq!(out, b"hello, stream");
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod engine;
pub mod reader;
pub mod writer;

mod state;

// Re-export main types
pub use config::{DeflateConfig, InflateConfig, DEFAULT_WINDOW_BITS, METHOD_DEFLATED};
pub use engine::{DeflateEngine, EngineStatus, FlushMode, InflateEngine, Progress, StreamFormat};
pub use reader::DecompressingReader;
pub use writer::CompressingWriter;
