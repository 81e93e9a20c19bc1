use std::fs::File;
use std::io::{self, Read, Write};
use std::mem;

use flate2::{FlushCompress, Status};

use crate::compress::{Deflater, Level, MAX_FEED};
use crate::constants::{CHUNK, EXTENDED_LOCAL_HEADER_FLAG, MAX_NAME_LEN, UTF8_NAME_FLAG};
use crate::descriptor::RecordBuffer;
use crate::entry::{
    build_central_header, build_data_descriptor, build_local_header, CentralDirectoryEnd,
    EntryRecord,
};
use crate::error::ZipError;
use crate::sink::{ByteSink, Flush};
use crate::types::EntryMeta;

/// Diagnostic channel. Messages go to a registered hook when one is set,
/// otherwise to stderr with the "zipflow: " prefix and a newline. Hook
/// messages carry neither.
pub(crate) struct LogSink<'a> {
    hook: Option<Box<dyn FnMut(String) + 'a>>,
}

impl LogSink<'_> {
    pub fn warn(&mut self, msg: String) {
        match &mut self.hook {
            Some(hook) => hook(msg),
            None => eprintln!("zipflow: {msg}"),
        }
    }
}

/// Caller-fed entry progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeedState {
    Idle,
    /// `meta()` accepted; the local header waits for the first data.
    AwaitingData,
    /// The local header is out and compressed data is flowing.
    InData,
}

/// Streaming zip writer.
///
/// The archive is produced as a forward-only byte stream on any
/// [`Write`] sink: no seeking, no rewriting of earlier bytes, and no
/// buffering of the archive. Entries come from the filesystem via
/// [`entry`](Self::entry), or from the caller via [`meta`](Self::meta)
/// followed by [`data`](Self::data) chunks; both kinds can be mixed freely.
/// [`close`](Self::close) appends the central directory and the end
/// records, switching to the Zip64 forms whenever a size, offset, or entry
/// count outgrows the classic fields.
///
/// ```no_run
/// use std::fs::File;
/// use zipflow::{EntryMeta, Level, ZipStream};
///
/// # fn main() -> Result<(), zipflow::ZipError> {
/// let out = File::create("out.zip").expect("create output");
/// let mut zip = ZipStream::new(out, Level::Default)?;
/// zip.entry("some/directory")?;
/// zip.meta("greeting.txt", EntryMeta::Unix { mode: 0o644, atime: 0, mtime: 0 })?;
/// zip.data(b"hello\n", true)?;
/// zip.close()?;
/// # Ok(())
/// # }
/// ```
pub struct ZipStream<'a, W: Write> {
    pub(crate) sink: ByteSink<W>,
    pub(crate) log: LogSink<'a>,
    deflate: Deflater,
    level: Level,
    /// Scratch path of the entry being walked; also the walker's cursor.
    pub(crate) path: String,
    entries: Vec<EntryRecord>,
    pending: Option<EntryRecord>,
    state: FeedState,
    record: RecordBuffer,
    read_buf: Vec<u8>,
}

impl<'a, W: Write> ZipStream<'a, W> {
    /// Start an archive on `out` at the given compression level.
    pub fn new(out: W, level: Level) -> Result<ZipStream<'a, W>, ZipError> {
        let level = level.validate()?;
        Ok(ZipStream {
            sink: ByteSink::new(out),
            log: LogSink { hook: None },
            deflate: Deflater::new(level),
            level,
            path: String::with_capacity(512),
            entries: Vec::new(),
            pending: None,
            state: FeedState::Idle,
            record: RecordBuffer::with_capacity(128),
            read_buf: vec![0; CHUNK],
        })
    }

    /// Intercept warning and error messages. The hook receives each message
    /// as an owned string without the default "zipflow: " prefix or
    /// trailing newline.
    pub fn set_log<F: FnMut(String) + 'a>(&mut self, hook: F) {
        self.log.hook = Some(Box::new(hook));
    }

    /// Drop a registered hook; messages go back to stderr.
    pub fn clear_log(&mut self) {
        self.log.hook = None;
    }

    /// Bytes of archive successfully written so far.
    pub fn archive_size(&self) -> u64 {
        self.sink.offset()
    }

    /// Retune the deflate engine between entries.
    pub fn set_level(&mut self, level: Level) -> Result<(), ZipError> {
        let level = level.validate()?;
        if self.state != FeedState::Idle {
            return Err(ZipError::EntryOpen);
        }
        if self.sink.bad() {
            return Err(ZipError::Aborted);
        }
        if level != self.level {
            self.deflate.retune(level);
            self.level = level;
        }
        Ok(())
    }

    /// Zip the file at `path`, or every regular file under it when it names
    /// a directory. Unreadable or non-regular objects are skipped with a
    /// diagnostic; they never fail the archive.
    pub fn entry(&mut self, path: &str) -> Result<(), ZipError> {
        if self.state != FeedState::Idle {
            return Err(ZipError::EntryOpen);
        }
        self.path.clear();
        self.path.push_str(path);
        self.walk();
        self.latched()
    }

    /// Begin a caller-fed entry. Nothing is written until the first
    /// [`data`](Self::data) call, so there is no write error to have here.
    /// Unix modes are reduced to their permission bits with the
    /// regular-file type forced on.
    pub fn meta(&mut self, name: &str, meta: EntryMeta) -> Result<(), ZipError> {
        if self.state != FeedState::Idle {
            return Err(ZipError::EntryOpen);
        }
        if name.len() > MAX_NAME_LEN {
            return Err(ZipError::NameTooLong(name.len()));
        }
        self.pending = Some(EntryRecord::new(
            name.to_owned(),
            meta.normalized(),
            self.sink.offset(),
            self.entry_flags(),
        ));
        self.state = FeedState::AwaitingData;
        Ok(())
    }

    /// Compress and write one chunk of the current entry; `last` completes
    /// it. An empty non-last call is a no-op, so the local header only goes
    /// out once there is something to follow it.
    pub fn data(&mut self, data: &[u8], last: bool) -> Result<(), ZipError> {
        if self.state == FeedState::Idle {
            return Err(ZipError::NotFeeding);
        }
        if data.is_empty() && !last {
            return self.latched();
        }

        if self.state == FeedState::AwaitingData {
            self.write_local_header();
            self.state = FeedState::InData;
        }

        if !data.is_empty() {
            self.deflate.update_crc(data);
            if let Some(entry) = self.pending.as_mut() {
                entry.uncompressed_size += data.len() as u64;
            }
        }
        self.pump(data, last)?;

        if last {
            self.complete_entry();
        }
        self.latched()
    }

    /// Complete the archive: central directory, end records, flush. All
    /// resources are released whether or not the archive succeeded. On
    /// success the total byte count and the sink are handed back.
    pub fn close(mut self) -> Result<(u64, W), ZipError> {
        if self.state != FeedState::Idle && !self.sink.bad() {
            // Always land on a complete archive, even mid-entry.
            let _ = self.data(&[], true);
        }

        let dir_offset = self.sink.offset();
        for index in 0..self.entries.len() {
            if self.sink.bad() {
                break;
            }
            self.record.clear();
            build_central_header(&mut self.record, &self.entries[index]);
            self.flush_record(Flush::None);
        }

        let end = CentralDirectoryEnd {
            entries: self.entries.len() as u64,
            size: self.sink.offset() - dir_offset,
            offset: dir_offset,
        };
        self.record.clear();
        if end.needs_zip64() {
            end.build_zip64_records(&mut self.record, self.sink.offset());
        }
        end.build_end_record(&mut self.record);
        self.flush_record(Flush::None);

        if let Err(err) = self.sink.put(&[], Flush::Stream) {
            self.log.warn(format!("write error: {err} -- aborting"));
        }
        if self.sink.bad() {
            return Err(ZipError::Aborted);
        }
        Ok((self.sink.offset(), self.sink.into_inner()))
    }

    /// Flags for a new entry: data descriptor, UTF-8 name, and the level
    /// signal in bits 1-2.
    fn entry_flags(&self) -> u16 {
        EXTENDED_LOCAL_HEADER_FLAG | UTF8_NAME_FLAG | self.level.flag_bits()
    }

    fn latched(&self) -> Result<(), ZipError> {
        if self.sink.bad() {
            Err(ZipError::Aborted)
        } else {
            Ok(())
        }
    }

    /// Write the scratch record, reporting a fresh write failure once.
    fn flush_record(&mut self, flush: Flush) {
        if let Err(err) = self.sink.put(self.record.bytes(), flush) {
            self.log.warn(format!("write error: {err} -- aborting"));
        }
    }

    fn write_local_header(&mut self) {
        self.record.clear();
        build_local_header(&mut self.record, self.pending.as_ref().expect("open entry"));
        self.flush_record(Flush::None);
    }

    fn write_data_descriptor(&mut self) {
        self.record.clear();
        build_data_descriptor(&mut self.record, self.pending.as_ref().expect("open entry"));
        self.flush_record(Flush::Record);
    }

    /// Feed `data` through the deflate engine, streaming every produced
    /// block out. Input goes in slices no larger than the engine's 32-bit
    /// input counter can address. A write error abandons compression
    /// immediately; the output would not be going anywhere anyway.
    fn pump(&mut self, data: &[u8], last: bool) -> Result<(), ZipError> {
        let mut input = data;
        loop {
            let take = input.len().min(MAX_FEED);
            let flush = if last && take == input.len() {
                FlushCompress::Finish
            } else {
                FlushCompress::None
            };
            let step = self.deflate.step(&input[..take], flush);
            input = &input[step.consumed..];

            if let Err(err) = self.sink.put(self.deflate.output(step.produced), Flush::None) {
                self.log.warn(format!("write error: {err} -- aborting"));
            }
            if self.sink.bad() {
                return Err(ZipError::Aborted);
            }
            if let Some(entry) = self.pending.as_mut() {
                entry.compressed_size += step.produced as u64;
            }

            match step.status {
                Status::Ok => {}
                // An unproductive call: all input consumed, nothing left to
                // emit until more data or a finish arrives.
                Status::BufError => {
                    assert!(!last, "deflate internal error");
                    return Ok(());
                }
                Status::StreamEnd => {
                    assert!(last, "deflate internal error");
                    return Ok(());
                }
            }
        }
    }

    /// Seal the current entry: final CRC, engine reset, data descriptor,
    /// and the record joins the central directory list.
    fn complete_entry(&mut self) {
        if let Some(entry) = self.pending.as_mut() {
            entry.crc32 = self.deflate.finish_entry();
        }
        self.write_data_descriptor();
        let entry = self.pending.take().expect("open entry");
        self.entries.push(entry);
        self.state = FeedState::Idle;
    }

    /// Emit one regular file: local header, compressed data, data
    /// descriptor. Called by the walker with the file's metadata; the name
    /// is the current scratch path.
    pub(crate) fn add_file(&mut self, meta: EntryMeta, file: File) {
        self.pending = Some(EntryRecord::new(
            self.path.clone(),
            meta,
            self.sink.offset(),
            self.entry_flags(),
        ));
        self.write_local_header();
        if self.sink.bad() {
            self.pending = None;
            return;
        }

        let omit = self.deflate_file(file);
        if self.sink.bad() {
            self.pending = None;
            return;
        }

        if let Some(entry) = self.pending.as_mut() {
            entry.crc32 = self.deflate.finish_entry();
        }
        self.write_data_descriptor();
        match self.pending.take() {
            // A read failure omits the entry from the central directory;
            // the bytes already written stay invisible to readers.
            Some(entry) if !omit => self.entries.push(entry),
            _ => {}
        }
    }

    /// Chunked deflate of an input file. A read failure still finishes the
    /// deflate stream with the data so far, so the archive keeps parsing,
    /// and returns true to leave the entry out of the directory.
    fn deflate_file(&mut self, mut file: File) -> bool {
        let mut buf = mem::take(&mut self.read_buf);
        let omit = self.pump_file(&mut file, &mut buf);
        self.read_buf = buf;
        omit
    }

    fn pump_file(&mut self, file: &mut File, buf: &mut [u8]) -> bool {
        let mut omit = false;
        loop {
            let (n, eof) = match file.read(buf) {
                Ok(0) => (0, true),
                Ok(n) => (n, false),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.log
                        .warn(format!("read error on {}: {err} -- entry omitted", self.path));
                    omit = true;
                    (0, true)
                }
            };
            if n > 0 {
                self.deflate.update_crc(&buf[..n]);
                if let Some(entry) = self.pending.as_mut() {
                    entry.uncompressed_size += n as u64;
                }
            }
            if self.pump(&buf[..n], eof).is_err() || eof {
                return omit;
            }
        }
    }
}
