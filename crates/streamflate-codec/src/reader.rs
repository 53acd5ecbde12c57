//! Decompressing reader adapter
//!
//! [`DecompressingReader`] pulls compressed bytes from an upstream source
//! and hands back decompressed chunks through [`std::io::Read`]. It shares
//! the writer's lifecycle rules: one engine, torn down exactly once, sticky
//! terminal state after the first error or after the logical end of the
//! stream.

use std::io::Read;

use streamflate_types::{Error, Result};
use tracing::debug;

use crate::config::InflateConfig;
use crate::engine::{EngineStatus, InflateEngine};
use crate::state::StreamState;

/// Streaming decompressor reading from an owned source
///
/// Reaching the logical end of the compressed stream reports EOF; bytes
/// following it in the source are left unread apart from what already sits
/// in the staging buffer. Closing before end of stream is legal.
#[derive(Debug)]
pub struct DecompressingReader<R: Read> {
    source: R,
    engine: Option<InflateEngine>,
    buf: Vec<u8>,
    pos: usize,
    filled: usize,
    state: StreamState,
}

impl<R: Read> DecompressingReader<R> {
    /// Create a reader for the framing selected by `window_bits`
    pub fn new(source: R, window_bits: i32) -> Result<Self> {
        Self::with_config(source, InflateConfig::with_window_bits(window_bits))
    }

    /// Create a reader from a full configuration
    pub fn with_config(source: R, config: InflateConfig) -> Result<Self> {
        let engine = InflateEngine::new(config.window_bits)?;
        Ok(Self {
            source,
            engine: Some(engine),
            buf: vec![0; config.buffer_size.get()],
            pos: 0,
            filled: 0,
            state: StreamState::Open,
        })
    }

    /// Produce the next chunk of decompressed bytes
    ///
    /// Typed counterpart of [`Read::read`]: `Ok(0)` means the compressed
    /// stream ended (or the reader was closed), a [`Error::Codec`] means
    /// the input is corrupt or truncated.
    pub fn read_chunk(&mut self, out: &mut [u8]) -> Result<usize> {
        match &self.state {
            StreamState::Open => {}
            StreamState::Closed => return Ok(0),
            StreamState::Errored(e) => return Err(e.clone()),
        }
        if out.is_empty() {
            return Ok(0);
        }

        let Some(mut engine) = self.engine.take() else {
            unreachable!("stream open without an engine");
        };
        loop {
            let progress = match engine.process(&self.buf[self.pos..self.filled], out) {
                Ok(progress) => progress,
                Err(e) => {
                    self.state = StreamState::Errored(e.clone());
                    return Err(e); // engine dropped, exactly once
                }
            };
            self.pos += progress.consumed;

            if progress.status == EngineStatus::StreamEnd {
                // Normal teardown point; the engine goes away with this
                // call and further reads report EOF through Closed.
                self.state = StreamState::Closed;
                debug!(
                    total_in = engine.total_in(),
                    total_out = engine.total_out(),
                    "compressed stream fully decoded"
                );
                return Ok(progress.produced);
            }
            if progress.produced > 0 {
                self.engine = Some(engine);
                return Ok(progress.produced);
            }

            // No output and no end: the engine needs more compressed input.
            if self.pos == self.filled {
                match self.refill() {
                    Ok(0) => {
                        let err = Error::codec("truncated compressed stream");
                        self.state = StreamState::Errored(err.clone());
                        return Err(err);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        self.state = StreamState::Errored(e.clone());
                        return Err(e);
                    }
                }
            } else if progress.consumed == 0 {
                // Input available, output space available, yet no progress:
                // the stream cannot be advanced.
                let err = Error::codec("compressed stream stalled the engine");
                self.state = StreamState::Errored(err.clone());
                return Err(err);
            }
        }
    }

    /// Stop decompressing and release the engine
    ///
    /// Legal before the logical end of the stream; idempotent afterwards.
    pub fn close(&mut self) -> Result<()> {
        match &self.state {
            StreamState::Open => {}
            StreamState::Closed => return Ok(()),
            StreamState::Errored(e) => return Err(e.clone()),
        }
        self.engine = None;
        self.state = StreamState::Closed;
        Ok(())
    }

    /// Check whether the reader reached end of stream or was closed
    pub fn is_finished(&self) -> bool {
        self.state == StreamState::Closed
    }

    /// Get a reference to the underlying source
    pub fn get_ref(&self) -> &R {
        &self.source
    }

    /// Get a mutable reference to the underlying source
    ///
    /// Reading from the source directly will desynchronize the stream.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.source
    }

    /// Consume the reader and return the source
    pub fn into_inner(self) -> R {
        self.source
    }

    fn refill(&mut self) -> Result<usize> {
        self.pos = 0;
        self.filled = 0;
        loop {
            match self.source.read(&mut self.buf) {
                Ok(n) => {
                    self.filled = n;
                    return Ok(n);
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::from(e)),
            }
        }
    }
}

impl<R: Read> Read for DecompressingReader<R> {
    fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
        self.read_chunk(out).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::CompressingWriter;
    use std::io::Cursor;
    use streamflate_types::ErrorKind;

    fn compress(data: &[u8], window_bits: i32) -> Vec<u8> {
        let mut writer = CompressingWriter::new(Vec::new(), window_bits).unwrap();
        writer.write(data).unwrap();
        writer.finish().unwrap();
        writer.into_inner()
    }

    #[test]
    fn test_read_to_end_round_trip() {
        let data = b"a reader should hand back exactly what the writer took".repeat(50);
        let compressed = compress(&data, 15);
        let mut reader = DecompressingReader::new(Cursor::new(compressed), 15).unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
        assert!(reader.is_finished());
    }

    #[test]
    fn test_read_after_end_reports_eof() {
        let compressed = compress(b"short", -15);
        let mut reader = DecompressingReader::new(Cursor::new(compressed), -15).unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        let mut buf = [0u8; 16];
        assert_eq!(reader.read_chunk(&mut buf).unwrap(), 0);
        assert_eq!(reader.read_chunk(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_close_before_end_of_stream() {
        let compressed = compress(&vec![3u8; 100_000], 15);
        let mut reader = DecompressingReader::new(Cursor::new(compressed), 15).unwrap();
        let mut buf = [0u8; 64];
        assert!(reader.read_chunk(&mut buf).unwrap() > 0);
        reader.close().unwrap();
        assert!(reader.is_finished());
        assert_eq!(reader.read_chunk(&mut buf).unwrap(), 0);
        reader.close().unwrap();
    }

    #[test]
    fn test_truncated_stream_is_codec_error() {
        let compressed = compress(&vec![9u8; 50_000], 15);
        let cut = &compressed[..compressed.len() / 2];
        let mut reader = DecompressingReader::new(Cursor::new(cut.to_vec()), 15).unwrap();
        let err = loop {
            let mut buf = [0u8; 4096];
            match reader.read_chunk(&mut buf) {
                Ok(_) => {}
                Err(e) => break e,
            }
        };
        assert_eq!(err.kind(), ErrorKind::Codec);

        // Sticky: the same error again, and close refuses too.
        let mut buf = [0u8; 16];
        assert_eq!(reader.read_chunk(&mut buf).unwrap_err(), err);
        assert_eq!(reader.close().unwrap_err(), err);
    }

    #[test]
    fn test_corrupt_stream_is_codec_error() {
        let mut compressed = compress(b"soon to be corrupted payload data", 15);
        // Break the zlib header so inflate fails immediately.
        compressed[0] = 0xff;
        let mut reader = DecompressingReader::new(Cursor::new(compressed), 15).unwrap();
        let mut buf = [0u8; 64];
        let err = reader.read_chunk(&mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Codec);
    }

    #[test]
    fn test_one_byte_source_reads() {
        /// Source that returns at most one byte per read call
        struct OneByte<R: Read>(R);
        impl<R: Read> Read for OneByte<R> {
            fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
                if out.is_empty() {
                    return Ok(0);
                }
                self.0.read(&mut out[..1])
            }
        }

        let data = b"dribbled in one compressed byte at a time";
        let compressed = compress(data, 31);
        let source = OneByte(Cursor::new(compressed));
        let mut reader = DecompressingReader::new(source, 31).unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }
}
