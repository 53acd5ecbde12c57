//! Engine control boundary
//!
//! Thin, stateful wrappers around the low-level DEFLATE contexts from
//! `flate2`. Each [`DeflateEngine::process`] / [`InflateEngine::process`]
//! call takes explicit input and output slices valid only for that call and
//! reports how many bytes were consumed and produced; nothing is retained
//! across calls except the engine's own internal state.
//!
//! The bundled backend frames raw and zlib streams natively. Gzip member
//! framing (RFC 1952 header, CRC32 + ISIZE trailer) is handled here so that
//! the adapters above see one uniform engine contract for all three formats.
//!
//! Fault policy, asymmetric on purpose: a compression-side engine error can
//! only mean the adapter drove the engine against its contract, so it
//! panics. A decompression-side error means corrupt input, a data problem,
//! and is returned as [`Error::Codec`].

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};
use streamflate_types::{Error, Result};
use tracing::trace;

use crate::config::DeflateConfig;

/// How aggressively the engine must emit buffered output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushMode {
    /// Normal streaming; the engine may buffer internally
    None,
    /// Emit everything pending up to a byte boundary, stream stays open
    Sync,
    /// Emit everything and terminate the logical stream
    Finish,
}

impl FlushMode {
    fn to_compress(self) -> FlushCompress {
        match self {
            Self::None => FlushCompress::None,
            Self::Sync => FlushCompress::Sync,
            Self::Finish => FlushCompress::Finish,
        }
    }
}

/// Stream framing, selected through the zlib window-bits convention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFormat {
    /// Bare DEFLATE bit stream, no header or checksum
    Raw,
    /// zlib wrapper (RFC 1950): 2-byte header, Adler-32 trailer
    Zlib,
    /// gzip wrapper (RFC 1952): member header, CRC32 + ISIZE trailer
    Gzip,
}

impl StreamFormat {
    /// Decode the window-bits sign/magnitude convention
    ///
    /// `-15..=-9` selects raw framing, `9..=15` zlib, and `25..=31`
    /// (magnitude plus 16) gzip.
    pub fn from_window_bits(window_bits: i32) -> Result<Self> {
        match window_bits {
            -15..=-9 => Ok(Self::Raw),
            9..=15 => Ok(Self::Zlib),
            25..=31 => Ok(Self::Gzip),
            other => Err(Error::config(format!(
                "invalid window bits {other}: expected -15..=-9 (raw), 9..=15 (zlib) \
                 or 25..=31 (gzip)"
            ))),
        }
    }
}

/// What the engine reported for one `process` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// The engine can accept further calls
    Working,
    /// The logical stream is complete; the engine must not be driven again
    StreamEnd,
}

/// Byte accounting for one `process` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Input bytes the engine consumed
    pub consumed: usize,
    /// Output bytes the engine produced
    pub produced: usize,
    /// Engine status after the call
    pub status: EngineStatus,
}

fn drain_pending(pending: &mut Vec<u8>, output: &mut [u8]) -> usize {
    let n = pending.len().min(output.len());
    output[..n].copy_from_slice(&pending[..n]);
    pending.drain(..n);
    n
}

/// Compression-side engine
///
/// Owns one `flate2::Compress` context plus, for gzip framing, the running
/// CRC and the not-yet-emitted header/trailer bytes.
#[derive(Debug)]
pub struct DeflateEngine {
    inner: Compress,
    crc: Option<crc32fast::Hasher>,
    bytes_in: u64,
    pending: Vec<u8>,
    body_done: bool,
}

impl DeflateEngine {
    /// Initialize a compression context for the configured format and level
    pub fn new(config: &DeflateConfig) -> Result<Self> {
        config.validate()?;
        let format = StreamFormat::from_window_bits(config.window_bits)?;
        let level = if config.level.is_engine_default() {
            Compression::default()
        } else {
            Compression::new(config.level.get() as u32)
        };
        let inner = Compress::new(level, format == StreamFormat::Zlib);
        let (crc, pending) = if format == StreamFormat::Gzip {
            (Some(crc32fast::Hasher::new()), gzip_header(level))
        } else {
            (None, Vec::new())
        };
        trace!(?format, level = level.level(), "deflate engine initialized");
        Ok(Self {
            inner,
            crc,
            bytes_in: 0,
            pending,
            body_done: false,
        })
    }

    /// Drive the engine once
    ///
    /// Consumes as much of `input` as the engine chooses and fills as much
    /// of `output` as fits. The caller must fully dispose of the produced
    /// bytes before calling again.
    ///
    /// # Panics
    ///
    /// Panics if the underlying context rejects its own stream state; that
    /// is a contract violation between adapter and engine, not a data
    /// error.
    pub fn process(&mut self, input: &[u8], output: &mut [u8], flush: FlushMode) -> Progress {
        let mut produced = drain_pending(&mut self.pending, output);
        if !self.pending.is_empty() {
            // Framing bytes filled the whole output buffer; come back for
            // the rest.
            return Progress {
                consumed: 0,
                produced,
                status: EngineStatus::Working,
            };
        }
        if self.body_done {
            return Progress {
                consumed: 0,
                produced,
                status: EngineStatus::StreamEnd,
            };
        }
        if produced == output.len() {
            return Progress {
                consumed: 0,
                produced,
                status: EngineStatus::Working,
            };
        }

        let before_in = self.inner.total_in();
        let before_out = self.inner.total_out();
        let status = match self.inner.compress(input, &mut output[produced..], flush.to_compress()) {
            Ok(status) => status,
            Err(e) => panic!("deflate engine rejected its own stream state: {e}"),
        };
        let consumed = (self.inner.total_in() - before_in) as usize;
        produced += (self.inner.total_out() - before_out) as usize;

        if let Some(crc) = self.crc.as_mut() {
            crc.update(&input[..consumed]);
            self.bytes_in += consumed as u64;
        }

        let status = match status {
            Status::StreamEnd => {
                self.body_done = true;
                match self.crc.take() {
                    Some(crc) => {
                        // Gzip trailer: CRC32 and input length, both LE.
                        self.pending.extend_from_slice(&crc.finalize().to_le_bytes());
                        self.pending
                            .extend_from_slice(&(self.bytes_in as u32).to_le_bytes());
                        produced += drain_pending(&mut self.pending, &mut output[produced..]);
                        if self.pending.is_empty() {
                            EngineStatus::StreamEnd
                        } else {
                            EngineStatus::Working
                        }
                    }
                    None => EngineStatus::StreamEnd,
                }
            }
            Status::Ok | Status::BufError => EngineStatus::Working,
        };

        Progress {
            consumed,
            produced,
            status,
        }
    }

    /// Total uncompressed bytes consumed so far
    pub fn total_in(&self) -> u64 {
        self.inner.total_in()
    }

    /// Total compressed bytes produced by the DEFLATE body so far
    ///
    /// Gzip framing bytes are accounted by the adapter, not here.
    pub fn total_out(&self) -> u64 {
        self.inner.total_out()
    }
}

fn gzip_header(level: Compression) -> Vec<u8> {
    // Fixed 10-byte member header: magic, CM=deflate, no flags, zero
    // mtime, XFL hint, unknown OS.
    let xfl = if level.level() >= Compression::best().level() {
        2
    } else if level.level() <= Compression::fast().level() {
        4
    } else {
        0
    };
    vec![0x1f, 0x8b, 0x08, 0, 0, 0, 0, 0, xfl, 0xff]
}

// RFC 1952 FLG bits
const FHCRC: u8 = 1 << 1;
const FEXTRA: u8 = 1 << 2;
const FNAME: u8 = 1 << 3;
const FCOMMENT: u8 = 1 << 4;
const FRESERVED: u8 = 0xe0;

/// Incremental gzip member-header parser
///
/// Tolerates arbitrary chunk boundaries: every call consumes what it can
/// and remembers which field it is in the middle of.
#[derive(Debug)]
struct HeaderParser {
    field: HeaderField,
    flags: u8,
}

#[derive(Debug)]
enum HeaderField {
    Fixed { filled: usize, buf: [u8; 10] },
    ExtraLen { filled: usize, buf: [u8; 2] },
    Extra { remaining: usize },
    Name,
    Comment,
    Crc { remaining: usize },
}

impl HeaderParser {
    fn new() -> Self {
        Self {
            field: HeaderField::Fixed {
                filled: 0,
                buf: [0; 10],
            },
            flags: 0,
        }
    }

    // Optional fields appear in a fixed order: FEXTRA, FNAME, FCOMMENT,
    // FHCRC. `from` is the rank of the first candidate still possible.
    fn optional_from(flags: u8, from: u8) -> Option<HeaderField> {
        if from == 0 && flags & FEXTRA != 0 {
            return Some(HeaderField::ExtraLen {
                filled: 0,
                buf: [0; 2],
            });
        }
        if from <= 1 && flags & FNAME != 0 {
            return Some(HeaderField::Name);
        }
        if from <= 2 && flags & FCOMMENT != 0 {
            return Some(HeaderField::Comment);
        }
        if from <= 3 && flags & FHCRC != 0 {
            return Some(HeaderField::Crc { remaining: 2 });
        }
        None
    }

    /// Consume header bytes from `input`; returns (consumed, done)
    fn advance(&mut self, mut input: &[u8]) -> Result<(usize, bool)> {
        let mut consumed = 0;
        loop {
            let next = match &mut self.field {
                HeaderField::Fixed { filled, buf } => {
                    let n = (10 - *filled).min(input.len());
                    buf[*filled..*filled + n].copy_from_slice(&input[..n]);
                    *filled += n;
                    consumed += n;
                    input = &input[n..];
                    if *filled < 10 {
                        return Ok((consumed, false));
                    }
                    if buf[0] != 0x1f || buf[1] != 0x8b {
                        return Err(Error::codec("invalid gzip header magic"));
                    }
                    if buf[2] != 0x08 {
                        return Err(Error::codec(format!(
                            "unsupported gzip compression method {}",
                            buf[2]
                        )));
                    }
                    if buf[3] & FRESERVED != 0 {
                        return Err(Error::codec("reserved gzip header flags set"));
                    }
                    self.flags = buf[3];
                    Self::optional_from(self.flags, 0)
                }
                HeaderField::ExtraLen { filled, buf } => {
                    let n = (2 - *filled).min(input.len());
                    buf[*filled..*filled + n].copy_from_slice(&input[..n]);
                    *filled += n;
                    consumed += n;
                    input = &input[n..];
                    if *filled < 2 {
                        return Ok((consumed, false));
                    }
                    let len = u16::from_le_bytes(*buf) as usize;
                    if len > 0 {
                        self.field = HeaderField::Extra { remaining: len };
                        continue;
                    }
                    Self::optional_from(self.flags, 1)
                }
                HeaderField::Extra { remaining } => {
                    let n = (*remaining).min(input.len());
                    *remaining -= n;
                    consumed += n;
                    input = &input[n..];
                    if *remaining > 0 {
                        return Ok((consumed, false));
                    }
                    Self::optional_from(self.flags, 1)
                }
                HeaderField::Name => match input.iter().position(|&b| b == 0) {
                    Some(pos) => {
                        consumed += pos + 1;
                        input = &input[pos + 1..];
                        Self::optional_from(self.flags, 2)
                    }
                    None => {
                        consumed += input.len();
                        return Ok((consumed, false));
                    }
                },
                HeaderField::Comment => match input.iter().position(|&b| b == 0) {
                    Some(pos) => {
                        consumed += pos + 1;
                        input = &input[pos + 1..];
                        Self::optional_from(self.flags, 3)
                    }
                    None => {
                        consumed += input.len();
                        return Ok((consumed, false));
                    }
                },
                HeaderField::Crc { remaining } => {
                    // Header CRC16 is skipped, not verified.
                    let n = (*remaining).min(input.len());
                    *remaining -= n;
                    consumed += n;
                    input = &input[n..];
                    if *remaining > 0 {
                        return Ok((consumed, false));
                    }
                    None
                }
            };
            match next {
                Some(field) => self.field = field,
                None => return Ok((consumed, true)),
            }
        }
    }
}

#[derive(Debug)]
enum GzipReadState {
    Header(HeaderParser),
    Body,
    Trailer { filled: usize, buf: [u8; 8] },
    Done,
}

/// Decompression-side engine
#[derive(Debug)]
pub struct InflateEngine {
    inner: Decompress,
    gzip: Option<GzipReadState>,
    crc: crc32fast::Hasher,
    bytes_out: u64,
}

impl InflateEngine {
    /// Initialize a decompression context for the framing selected by
    /// `window_bits`
    pub fn new(window_bits: i32) -> Result<Self> {
        let format = StreamFormat::from_window_bits(window_bits)?;
        let inner = Decompress::new(format == StreamFormat::Zlib);
        let gzip = (format == StreamFormat::Gzip)
            .then(|| GzipReadState::Header(HeaderParser::new()));
        trace!(?format, "inflate engine initialized");
        Ok(Self {
            inner,
            gzip,
            crc: crc32fast::Hasher::new(),
            bytes_out: 0,
        })
    }

    /// Drive the engine once
    ///
    /// Consumes compressed bytes from `input` and produces decompressed
    /// bytes into `output`. Corrupt input, including gzip framing
    /// mismatches, is reported as [`Error::Codec`].
    pub fn process(&mut self, input: &[u8], output: &mut [u8]) -> Result<Progress> {
        match self.gzip.take() {
            None => self.process_body(input, output),
            Some(state) => self.process_gzip(state, input, output),
        }
    }

    fn process_body(&mut self, input: &[u8], output: &mut [u8]) -> Result<Progress> {
        let before_in = self.inner.total_in();
        let before_out = self.inner.total_out();
        let status = self
            .inner
            .decompress(input, output, FlushDecompress::None)
            .map_err(|e| Error::codec(format!("inflate failed: {e}")))?;
        Ok(Progress {
            consumed: (self.inner.total_in() - before_in) as usize,
            produced: (self.inner.total_out() - before_out) as usize,
            status: match status {
                Status::StreamEnd => EngineStatus::StreamEnd,
                Status::Ok | Status::BufError => EngineStatus::Working,
            },
        })
    }

    fn process_gzip(
        &mut self,
        mut state: GzipReadState,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<Progress> {
        let mut consumed = 0;
        let mut produced = 0;
        loop {
            match state {
                GzipReadState::Header(mut parser) => {
                    let (n, done) = match parser.advance(&input[consumed..]) {
                        Ok(r) => r,
                        Err(e) => return Err(e), // header state discarded, stream is dead
                    };
                    consumed += n;
                    if !done {
                        self.gzip = Some(GzipReadState::Header(parser));
                        return Ok(Progress {
                            consumed,
                            produced,
                            status: EngineStatus::Working,
                        });
                    }
                    state = GzipReadState::Body;
                }
                GzipReadState::Body => {
                    let progress = self.process_body(&input[consumed..], output)?;
                    consumed += progress.consumed;
                    self.crc.update(&output[produced..produced + progress.produced]);
                    self.bytes_out += progress.produced as u64;
                    produced += progress.produced;
                    if progress.status != EngineStatus::StreamEnd {
                        self.gzip = Some(GzipReadState::Body);
                        return Ok(Progress {
                            consumed,
                            produced,
                            status: EngineStatus::Working,
                        });
                    }
                    state = GzipReadState::Trailer {
                        filled: 0,
                        buf: [0; 8],
                    };
                }
                GzipReadState::Trailer { mut filled, mut buf } => {
                    let n = (8 - filled).min(input.len() - consumed);
                    buf[filled..filled + n].copy_from_slice(&input[consumed..consumed + n]);
                    filled += n;
                    consumed += n;
                    if filled < 8 {
                        self.gzip = Some(GzipReadState::Trailer { filled, buf });
                        return Ok(Progress {
                            consumed,
                            produced,
                            status: EngineStatus::Working,
                        });
                    }
                    let stored_crc = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
                    let stored_len = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
                    if stored_crc != self.crc.clone().finalize() {
                        return Err(Error::codec("gzip checksum mismatch"));
                    }
                    if stored_len != self.bytes_out as u32 {
                        return Err(Error::codec("gzip length mismatch"));
                    }
                    state = GzipReadState::Done;
                }
                GzipReadState::Done => {
                    self.gzip = Some(GzipReadState::Done);
                    return Ok(Progress {
                        consumed,
                        produced,
                        status: EngineStatus::StreamEnd,
                    });
                }
            }
        }
    }

    /// Total compressed bytes consumed by the DEFLATE body so far
    pub fn total_in(&self) -> u64 {
        self.inner.total_in()
    }

    /// Total decompressed bytes produced so far
    pub fn total_out(&self) -> u64 {
        self.inner.total_out()
    }
}
