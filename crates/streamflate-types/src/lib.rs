//! Core type system and error handling for streamflate
//!
//! This crate provides the foundational types shared across the streamflate
//! workspace:
//!
//! - **Error handling**: a cloneable, categorized error type suited to
//!   sticky terminal stream states
//! - **Configuration**: validated primitives for engine parameters
//!
//! # Features
//!
//! - `serde`: Enable serialization support
//!
//! # Examples
//!
//! ```rust
//! use streamflate_types::{BufferSize, CompressionLevel, Error, Result};
//!
//! fn pick_buffer(size: usize) -> Result<BufferSize> {
//!     BufferSize::new(size)
//! }
//!
//! assert!(pick_buffer(32 * 1024).is_ok());
//! assert!(matches!(pick_buffer(1), Err(Error::Config { .. })));
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod result;

// Re-export commonly used types
pub use config::{BufferSize, CompressionLevel, MemLevel, Strategy};
pub use error::{Error, ErrorKind};
pub use result::Result;
