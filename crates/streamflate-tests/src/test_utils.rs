//! Unified test utilities for streamflate tests
//!
//! Sink and source doubles plus test data generation shared across the
//! integration suite.

use std::io::Write;

/// Test data generation patterns
#[derive(Debug, Clone, Copy)]
pub enum TestDataPattern {
    /// All zeros - highly compressible
    Zeros,
    /// Repeated text - moderately compressible
    Text,
    /// Deterministic pseudo-random data - incompressible
    Random,
    /// Mixed compressible/incompressible data
    Mixed,
}

/// Generate test data with the specified pattern
///
/// Deterministic so failures reproduce.
pub fn generate_test_data(size: usize, pattern: TestDataPattern) -> Vec<u8> {
    match pattern {
        TestDataPattern::Zeros => vec![0u8; size],
        TestDataPattern::Text => b"the quick brown fox jumps over the lazy dog. "
            .iter()
            .copied()
            .cycle()
            .take(size)
            .collect(),
        TestDataPattern::Random => {
            let mut state = 0x2545_f491_4f6c_dd1du64;
            (0..size)
                .map(|_| {
                    // xorshift
                    state ^= state << 13;
                    state ^= state >> 7;
                    state ^= state << 17;
                    (state >> 24) as u8
                })
                .collect()
        }
        TestDataPattern::Mixed => {
            let mut data = Vec::with_capacity(size);
            for i in 0..size {
                if i % 1000 < 300 {
                    data.push(0);
                } else {
                    data.push((i.wrapping_mul(2654435761) % 256) as u8);
                }
            }
            data
        }
    }
}

/// Sink that accepts at most `chunk` bytes per write call
///
/// Exercises the adapter's partial-write draining: the compressed bytes it
/// collects must be identical to what an all-at-once sink collects.
#[derive(Debug)]
pub struct TrickleSink {
    /// Bytes collected so far
    pub collected: Vec<u8>,
    /// Maximum bytes accepted per call
    pub chunk: usize,
}

impl TrickleSink {
    /// Create a sink accepting `chunk` bytes per call
    pub fn new(chunk: usize) -> Self {
        Self {
            collected: Vec::new(),
            chunk,
        }
    }
}

impl Write for TrickleSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = buf.len().min(self.chunk);
        self.collected.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Sink that fails with `BrokenPipe` starting at its `fail_on`-th call
#[derive(Debug)]
pub struct FailingSink {
    /// Number of write calls observed, including the failing ones
    pub calls: usize,
    /// 1-based index of the first failing call
    pub fail_on: usize,
    /// Bytes accepted before the failure
    pub collected: Vec<u8>,
}

impl FailingSink {
    /// Create a sink whose `fail_on`-th write call fails
    pub fn new(fail_on: usize) -> Self {
        Self {
            calls: 0,
            fail_on,
            collected: Vec::new(),
        }
    }
}

impl Write for FailingSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.calls += 1;
        if self.calls >= self.fail_on {
            Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "sink failed on purpose",
            ))
        } else {
            self.collected.extend_from_slice(&buf[..buf.len().min(8)]);
            Ok(buf.len().min(8))
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
