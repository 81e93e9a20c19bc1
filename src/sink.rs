use std::io::{self, Write};

/// Flush hint carried with every write.
///
/// Only `Stream` (end of the archive) asks the writer to flush; `Record`
/// marks a record boundary without forcing anything out.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Flush {
    None,
    Record,
    Stream,
}

/// Single chokepoint for all output.
///
/// Tracks the running offset and latches a sticky error flag: after the
/// first failed write nothing further reaches the writer, the offset stays
/// frozen, and `put` reports the failure exactly once so the caller can log
/// it.
pub(crate) struct ByteSink<W: Write> {
    out: W,
    offset: u64,
    bad: bool,
}

impl<W: Write> ByteSink<W> {
    pub fn new(out: W) -> ByteSink<W> {
        ByteSink {
            out,
            offset: 0,
            bad: false,
        }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn bad(&self) -> bool {
        self.bad
    }

    pub fn put(&mut self, bytes: &[u8], flush: Flush) -> io::Result<()> {
        if self.bad {
            return Ok(());
        }
        if let Err(err) = self.put_inner(bytes, flush) {
            self.bad = true;
            return Err(err);
        }
        self.offset += bytes.len() as u64;
        Ok(())
    }

    fn put_inner(&mut self, bytes: &[u8], flush: Flush) -> io::Result<()> {
        self.out.write_all(bytes)?;
        if let Flush::Stream = flush {
            self.out.flush()?;
        }
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
