use crc32fast::Hasher;
use flate2::{Compress, Compression, FlushCompress, Status};

use crate::constants::CHUNK;
use crate::error::ZipError;

/// Deflate compression level, mapping onto zlib's -1..9 range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Fastest,
    Best,
    /// zlib's default (level 6).
    Default,
    Precise(u32),
}

impl Level {
    pub(crate) fn validate(self) -> Result<Level, ZipError> {
        if let Level::Precise(val) = self {
            if val > 9 {
                return Err(ZipError::InvalidLevel(val));
            }
        }
        Ok(self)
    }

    fn numeric(self) -> u32 {
        match self {
            Level::Fastest => 1,
            Level::Best => 9,
            Level::Default => 6,
            Level::Precise(val) => val,
        }
    }

    /// Level signal carried in general-purpose flag bits 1-2: maximum,
    /// fast, and super-fast compression each have their own pattern.
    pub(crate) fn flag_bits(self) -> u16 {
        match self.numeric() {
            9.. => 0b01 << 1,
            2 => 0b10 << 1,
            1 => 0b11 << 1,
            _ => 0,
        }
    }
}

impl From<Level> for Compression {
    fn from(level: Level) -> Self {
        match level {
            Level::Fastest => Compression::fast(),
            Level::Best => Compression::best(),
            Level::Default => Compression::default(),
            Level::Precise(val) => Compression::new(val),
        }
    }
}

/// Largest input slice handed to the engine in one call; its input counter
/// is 32 bits wide.
pub(crate) const MAX_FEED: usize = u32::MAX as usize;

/// One step of the engine over an input slice.
pub(crate) struct Step {
    pub consumed: usize,
    pub produced: usize,
    pub status: Status,
}

/// Raw deflate engine plus the running CRC-32 over uncompressed bytes.
///
/// A single instance serves the whole session: it is reset between entries,
/// never torn down, and owns the compressed-output chunk buffer.
pub(crate) struct Deflater {
    engine: Compress,
    crc: Hasher,
    out: Vec<u8>,
}

impl Deflater {
    pub fn new(level: Level) -> Deflater {
        Deflater {
            // false: raw deflate, no zlib framing
            engine: Compress::new(level.into(), false),
            crc: Hasher::new(),
            out: vec![0; CHUNK],
        }
    }

    /// Swap in an engine at a different level. Only valid between entries.
    pub fn retune(&mut self, level: Level) {
        self.engine = Compress::new(level.into(), false);
    }

    pub fn update_crc(&mut self, data: &[u8]) {
        self.crc.update(data);
    }

    /// Run the engine once over `input`, filling the output chunk buffer.
    pub fn step(&mut self, input: &[u8], flush: FlushCompress) -> Step {
        let before_in = self.engine.total_in();
        let before_out = self.engine.total_out();
        let status = self
            .engine
            .compress(input, &mut self.out, flush)
            .expect("deflate internal error");
        Step {
            consumed: (self.engine.total_in() - before_in) as usize,
            produced: (self.engine.total_out() - before_out) as usize,
            status,
        }
    }

    /// Bytes produced by the last [`step`](Self::step).
    pub fn output(&self, produced: usize) -> &[u8] {
        &self.out[..produced]
    }

    /// Complete an entry: reset the engine for the next one and yield the
    /// final CRC-32 of the bytes fed so far.
    pub fn finish_entry(&mut self) -> u32 {
        self.engine.reset();
        std::mem::replace(&mut self.crc, Hasher::new()).finalize()
    }
}
