//! Compressing writer adapter
//!
//! [`CompressingWriter`] turns arbitrary-length writes into a correctly
//! flushed compressed byte stream on a downstream sink, hiding the engine's
//! output-buffer-full looping from the caller.
//!
//! Lifecycle: `Open -> Closed` via a successful [`finish`], or
//! `Open -> Errored` at the first sink failure. Both are terminal; the
//! engine is torn down exactly once, on whichever of the two is reached
//! first. Dropping the writer without finishing truncates the stream; the
//! sink itself is never closed and can be taken back with
//! [`into_inner`].
//!
//! [`finish`]: CompressingWriter::finish
//! [`into_inner`]: CompressingWriter::into_inner

use std::io::Write;

use streamflate_types::{Error, Result};
use tracing::debug;

use crate::config::DeflateConfig;
use crate::engine::{DeflateEngine, FlushMode};
use crate::state::StreamState;

/// Streaming compressor writing to an owned sink
///
/// The sink only ever receives bytes; it is not flushed or closed by this
/// type except through the caller-visible operations. `Write` is
/// implemented for `&mut W`, so callers who want to keep ownership of the
/// sink can pass a mutable reference.
#[derive(Debug)]
pub struct CompressingWriter<W: Write> {
    sink: W,
    engine: Option<DeflateEngine>,
    buf: Vec<u8>,
    state: StreamState,
    total_in: u64,
    total_out: u64,
}

impl<W: Write> CompressingWriter<W> {
    /// Create a writer with default level and the framing selected by
    /// `window_bits`
    pub fn new(sink: W, window_bits: i32) -> Result<Self> {
        Self::with_config(sink, DeflateConfig::with_window_bits(window_bits))
    }

    /// Create a writer with an explicit compression level
    pub fn with_level(sink: W, level: i32, window_bits: i32) -> Result<Self> {
        let config = DeflateConfig {
            level: streamflate_types::CompressionLevel::new(level)?,
            window_bits,
            ..DeflateConfig::default()
        };
        Self::with_config(sink, config)
    }

    /// Create a writer from a full configuration
    pub fn with_config(sink: W, config: DeflateConfig) -> Result<Self> {
        let engine = DeflateEngine::new(&config)?;
        Ok(Self {
            sink,
            engine: Some(engine),
            buf: vec![0; config.buffer_size.get()],
            state: StreamState::Open,
            total_in: 0,
            total_out: 0,
        })
    }

    /// Compress and forward `bytes`
    ///
    /// Returns the full length of `bytes` on success; partial success is
    /// not a concept at this layer. On a sink failure the engine is torn
    /// down, the error becomes the writer's permanent state, and every
    /// later call returns it again.
    pub fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        self.state.check_open()?;
        self.drive(bytes, FlushMode::None)?;
        Ok(bytes.len())
    }

    /// Emit all previously written bytes up to a decodable boundary
    ///
    /// The stream stays open; further writes remain legal.
    pub fn flush(&mut self) -> Result<()> {
        self.state.check_open()?;
        self.drive(&[], FlushMode::Sync)
    }

    /// Emit the engine's final bytes and end the stream
    ///
    /// Idempotent: finishing an already finished writer returns `Ok(())`.
    /// The sink is not closed.
    pub fn finish(&mut self) -> Result<()> {
        match &self.state {
            StreamState::Open => {}
            StreamState::Closed => return Ok(()),
            StreamState::Errored(e) => return Err(e.clone()),
        }
        self.drive(&[], FlushMode::Finish)?;
        // Normal teardown; the only other teardown site is a sink failure
        // inside drive.
        self.engine = None;
        self.state = StreamState::Closed;
        debug!(
            total_in = self.total_in,
            total_out = self.total_out,
            "compressed stream finished"
        );
        Ok(())
    }

    /// Check whether the writer finished normally
    pub fn is_finished(&self) -> bool {
        self.state == StreamState::Closed
    }

    /// Total uncompressed bytes accepted so far
    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    /// Total compressed bytes handed to the sink so far
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Get a reference to the underlying sink
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Get a mutable reference to the underlying sink
    ///
    /// Writing to the sink directly will corrupt the compressed stream.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    /// Consume the writer and return the sink
    pub fn into_inner(self) -> W {
        self.sink
    }

    // The shared drive routine behind write/flush/finish: stage the input,
    // loop the engine over the staging buffer, fully drain each buffer to
    // the sink before the engine runs again.
    fn drive(&mut self, input: &[u8], flush: FlushMode) -> Result<()> {
        let Some(mut engine) = self.engine.take() else {
            unreachable!("stream open without an engine");
        };
        let mut offset = 0;
        loop {
            let progress = engine.process(&input[offset..], &mut self.buf, flush);
            offset += progress.consumed;
            self.total_in += progress.consumed as u64;

            let mut from = 0;
            while from < progress.produced {
                match self.sink.write(&self.buf[from..progress.produced]) {
                    Ok(0) => {
                        let err = Error::io("sink accepted no bytes");
                        self.state = StreamState::Errored(err.clone());
                        return Err(err); // engine dropped here, exactly once
                    }
                    Ok(n) => {
                        from += n;
                        self.total_out += n as u64;
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                    Err(e) => {
                        let err = Error::from(e);
                        self.state = StreamState::Errored(err.clone());
                        return Err(err);
                    }
                }
            }

            // A partially filled buffer means the engine has nothing more
            // to emit for this call.
            if progress.produced < self.buf.len() {
                break;
            }
        }
        // The engine drains its input before it ever reports a partially
        // filled output buffer.
        assert!(
            offset == input.len(),
            "deflate engine left {} unconsumed input bytes",
            input.len() - offset
        );
        self.engine = Some(engine);
        Ok(())
    }
}

impl<W: Write> Write for CompressingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        CompressingWriter::write(self, buf).map_err(Into::into)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        CompressingWriter::flush(self).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamflate_types::ErrorKind;

    /// Sink that fails with `BrokenPipe` on its n-th accepted call
    struct FailingSink {
        calls: usize,
        fail_on: usize,
    }

    impl Write for FailingSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.calls += 1;
            if self.calls >= self.fail_on {
                Err(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "sink gone",
                ))
            } else {
                Ok(buf.len())
            }
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn decompress_with_flate2(compressed: &[u8], expected_len: usize) -> Vec<u8> {
        let mut inflater = flate2::Decompress::new(false);
        let mut out = Vec::with_capacity(expected_len + 64);
        inflater
            .decompress_vec(compressed, &mut out, flate2::FlushDecompress::Finish)
            .unwrap();
        out
    }

    #[test]
    fn test_write_reports_full_length() {
        let mut writer = CompressingWriter::new(Vec::new(), 15).unwrap();
        let data = vec![7u8; 100_000];
        assert_eq!(writer.write(&data).unwrap(), data.len());
        writer.finish().unwrap();
        assert_eq!(writer.total_in(), data.len() as u64);
        assert!(writer.total_out() > 0);
    }

    #[test]
    fn test_empty_write_is_ok() {
        let mut writer = CompressingWriter::new(Vec::new(), 15).unwrap();
        assert_eq!(writer.write(&[]).unwrap(), 0);
        writer.finish().unwrap();
    }

    #[test]
    fn test_finish_is_idempotent() {
        let mut writer = CompressingWriter::new(Vec::new(), -15).unwrap();
        writer.write(b"some data").unwrap();
        writer.finish().unwrap();
        assert!(writer.is_finished());
        writer.finish().unwrap();
        writer.finish().unwrap();
    }

    #[test]
    fn test_write_after_finish_reports_closed() {
        let mut writer = CompressingWriter::new(Vec::new(), 15).unwrap();
        writer.finish().unwrap();
        let err = writer.write(b"late").unwrap_err();
        assert!(err.is_closed());
        let err = writer.flush().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Closed);
    }

    #[test]
    fn test_sink_failure_is_sticky() {
        let sink = FailingSink {
            calls: 0,
            fail_on: 1,
        };
        let mut writer = CompressingWriter::new(sink, 15).unwrap();
        writer.write(b"to be flushed").unwrap(); // buffered by the engine
        let err = writer.flush().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);

        // Same error again, without touching the sink or engine.
        let calls_after_failure = writer.get_ref().calls;
        assert_eq!(writer.write(b"more").unwrap_err(), err);
        assert_eq!(writer.flush().unwrap_err(), err);
        assert_eq!(writer.finish().unwrap_err(), err);
        assert_eq!(writer.get_ref().calls, calls_after_failure);
    }

    #[test]
    fn test_flush_then_write_continues_stream() {
        let mut writer = CompressingWriter::new(Vec::new(), 15).unwrap();
        writer.write(b"first half, ").unwrap();
        writer.flush().unwrap();
        let after_flush = writer.get_ref().len();
        assert!(after_flush > 0);
        writer.write(b"second half").unwrap();
        writer.finish().unwrap();
        assert!(writer.get_ref().len() > after_flush);
    }

    #[test]
    fn test_io_write_facade() {
        let mut writer = CompressingWriter::new(Vec::new(), -15).unwrap();
        std::io::Write::write_all(&mut writer, b"through the trait").unwrap();
        std::io::Write::flush(&mut writer).unwrap();
        writer.finish().unwrap();
    }

    #[test]
    fn test_tiny_staging_buffer_forces_looping() {
        let config = DeflateConfig {
            buffer_size: streamflate_types::BufferSize::new(1024).unwrap(),
            window_bits: -15,
            ..DeflateConfig::default()
        };
        let mut writer = CompressingWriter::with_config(Vec::new(), config).unwrap();
        // Incompressible data larger than the staging buffer, so the drive
        // loop has to run the engine more than once per call.
        let mut state = 0x2545_f491_4f6c_dd1du64;
        let data: Vec<u8> = (0..64 * 1024)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state >> 24) as u8
            })
            .collect();
        assert_eq!(writer.write(&data).unwrap(), data.len());
        writer.finish().unwrap();
        assert!(writer.get_ref().len() > 1024);
        assert_eq!(
            decompress_with_flate2(writer.get_ref(), data.len()),
            data
        );
    }

    #[test]
    fn test_borrowed_sink() {
        let mut out = Vec::new();
        let mut writer = CompressingWriter::new(&mut out, 15).unwrap();
        writer.write(b"borrowed").unwrap();
        writer.finish().unwrap();
        drop(writer);
        assert!(!out.is_empty());
    }
}
