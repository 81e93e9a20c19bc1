#![allow(dead_code)]

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};

const EOCD_SIGNATURE: u32 = 0x06054b50;
const ZIP64_EOCD_SIGNATURE: u32 = 0x06064b50;
const ZIP64_LOCATOR_SIGNATURE: u32 = 0x07064b50;
const CENTRAL_ENTRY_SIGNATURE: u32 = 0x02014b50;

/// One central directory header, with any Zip64 extra field resolved.
pub struct CentralEntry {
    pub name: String,
    pub version_made_by: u16,
    pub version_needed: u16,
    pub flags: u16,
    pub method: u16,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub offset: u64,
    pub external_attributes: u32,
    pub extra: Vec<u8>,
    /// Number of 64-bit fields the Zip64 extra carried (0 when absent).
    pub zip64_fields: usize,
}

impl CentralEntry {
    /// Extra subfield payload by header id, when present.
    pub fn extra_field(&self, id: u16) -> Option<&[u8]> {
        let mut rest = &self.extra[..];
        while rest.len() >= 4 {
            let field_id = u16::from_le_bytes([rest[0], rest[1]]);
            let size = u16::from_le_bytes([rest[2], rest[3]]) as usize;
            let payload = &rest[4..4 + size];
            if field_id == id {
                return Some(payload);
            }
            rest = &rest[4 + size..];
        }
        None
    }
}

/// The trailing metadata of an archive: end records plus every central
/// directory header.
pub struct ArchiveTail {
    pub entries: Vec<CentralEntry>,
    pub total_entries: u64,
    pub dir_offset: u64,
    pub dir_size: u64,
    pub zip64: bool,
}

/// Parse the archive from its end, the way a reader does: classic EOCD
/// (this writer emits no comment, so it is the last 22 bytes), then the
/// Zip64 records when the classic fields hold sentinels, then the central
/// directory itself.
pub fn parse_tail(bytes: &[u8]) -> ArchiveTail {
    parse_stream_tail(bytes, bytes.len() as u64)
}

/// Like [`parse_tail`], but for the trailing window of a longer stream:
/// `tail` holds the last `tail.len()` bytes of a `stream_len`-byte archive.
/// The central directory must fall inside the window.
pub fn parse_stream_tail(tail: &[u8], stream_len: u64) -> ArchiveTail {
    let base = stream_len - tail.len() as u64;
    let bytes = tail;
    let at = |absolute: u64| -> usize {
        assert!(absolute >= base, "offset before the kept window");
        (absolute - base) as usize
    };

    let eocd_at = at(stream_len - 22);
    let mut rdr = Cursor::new(&bytes[eocd_at..]);
    assert_eq!(
        rdr.read_u32::<LittleEndian>().unwrap(),
        EOCD_SIGNATURE,
        "missing end-of-central-directory record"
    );
    assert_eq!(rdr.read_u16::<LittleEndian>().unwrap(), 0); // this disk
    assert_eq!(rdr.read_u16::<LittleEndian>().unwrap(), 0); // directory disk
    let entries_here = rdr.read_u16::<LittleEndian>().unwrap();
    let entries_total = rdr.read_u16::<LittleEndian>().unwrap();
    assert_eq!(entries_here, entries_total);
    let mut total = entries_total as u64;
    let mut dir_size = rdr.read_u32::<LittleEndian>().unwrap() as u64;
    let mut dir_offset = rdr.read_u32::<LittleEndian>().unwrap() as u64;
    assert_eq!(rdr.read_u16::<LittleEndian>().unwrap(), 0); // comment length

    let zip64 = total == u16::MAX as u64
        || dir_size == u32::MAX as u64
        || dir_offset == u32::MAX as u64;
    if zip64 {
        let locator_at = eocd_at - 20;
        let mut rdr = Cursor::new(&bytes[locator_at..eocd_at]);
        assert_eq!(
            rdr.read_u32::<LittleEndian>().unwrap(),
            ZIP64_LOCATOR_SIGNATURE
        );
        assert_eq!(rdr.read_u32::<LittleEndian>().unwrap(), 0);
        let zip64_eocd_at = at(rdr.read_u64::<LittleEndian>().unwrap());
        assert_eq!(rdr.read_u32::<LittleEndian>().unwrap(), 1);

        let mut rdr = Cursor::new(&bytes[zip64_eocd_at..locator_at]);
        assert_eq!(
            rdr.read_u32::<LittleEndian>().unwrap(),
            ZIP64_EOCD_SIGNATURE
        );
        assert_eq!(rdr.read_u64::<LittleEndian>().unwrap(), 44);
        assert_eq!(rdr.read_u16::<LittleEndian>().unwrap(), 45);
        assert_eq!(rdr.read_u16::<LittleEndian>().unwrap(), 45);
        assert_eq!(rdr.read_u32::<LittleEndian>().unwrap(), 0);
        assert_eq!(rdr.read_u32::<LittleEndian>().unwrap(), 0);
        let here = rdr.read_u64::<LittleEndian>().unwrap();
        total = rdr.read_u64::<LittleEndian>().unwrap();
        assert_eq!(here, total);
        dir_size = rdr.read_u64::<LittleEndian>().unwrap();
        dir_offset = rdr.read_u64::<LittleEndian>().unwrap();
    }

    let dir = &bytes[at(dir_offset)..at(dir_offset) + dir_size as usize];
    let mut rdr = Cursor::new(dir);
    let mut entries = Vec::new();
    for _ in 0..total {
        entries.push(parse_central_entry(&mut rdr));
    }
    assert_eq!(rdr.position(), dir_size, "central directory length mismatch");

    ArchiveTail {
        entries,
        total_entries: total,
        dir_offset,
        dir_size,
        zip64,
    }
}

fn parse_central_entry(rdr: &mut Cursor<&[u8]>) -> CentralEntry {
    assert_eq!(
        rdr.read_u32::<LittleEndian>().unwrap(),
        CENTRAL_ENTRY_SIGNATURE
    );
    let version_made_by = rdr.read_u16::<LittleEndian>().unwrap();
    let version_needed = rdr.read_u16::<LittleEndian>().unwrap();
    let flags = rdr.read_u16::<LittleEndian>().unwrap();
    let method = rdr.read_u16::<LittleEndian>().unwrap();
    let _time = rdr.read_u16::<LittleEndian>().unwrap();
    let _date = rdr.read_u16::<LittleEndian>().unwrap();
    let crc32 = rdr.read_u32::<LittleEndian>().unwrap();
    let mut compressed_size = rdr.read_u32::<LittleEndian>().unwrap() as u64;
    let mut uncompressed_size = rdr.read_u32::<LittleEndian>().unwrap() as u64;
    let name_len = rdr.read_u16::<LittleEndian>().unwrap() as usize;
    let extra_len = rdr.read_u16::<LittleEndian>().unwrap() as usize;
    let comment_len = rdr.read_u16::<LittleEndian>().unwrap() as usize;
    assert_eq!(comment_len, 0);
    assert_eq!(rdr.read_u16::<LittleEndian>().unwrap(), 0); // disk
    assert_eq!(rdr.read_u16::<LittleEndian>().unwrap(), 0); // internal attributes
    let external_attributes = rdr.read_u32::<LittleEndian>().unwrap();
    let mut offset = rdr.read_u32::<LittleEndian>().unwrap() as u64;

    let mut name = vec![0u8; name_len];
    rdr.read_exact(&mut name).unwrap();
    let mut extra = vec![0u8; extra_len];
    rdr.read_exact(&mut extra).unwrap();

    // Resolve the Zip64 extra: only the fields whose classic counterparts
    // hold sentinels are present, uncompressed then compressed then offset.
    let mut zip64_fields = 0;
    let mut rest = &extra[..];
    while rest.len() >= 4 {
        let id = u16::from_le_bytes([rest[0], rest[1]]);
        let size = u16::from_le_bytes([rest[2], rest[3]]) as usize;
        let mut payload = Cursor::new(&rest[4..4 + size]);
        if id == 0x0001 {
            zip64_fields = size / 8;
            if uncompressed_size == u32::MAX as u64 {
                uncompressed_size = payload.read_u64::<LittleEndian>().unwrap();
            }
            if compressed_size == u32::MAX as u64 {
                compressed_size = payload.read_u64::<LittleEndian>().unwrap();
            }
            if offset == u32::MAX as u64 {
                offset = payload.read_u64::<LittleEndian>().unwrap();
            }
            assert_eq!(payload.position() as usize, size, "stray zip64 fields");
        }
        rest = &rest[4 + size..];
    }

    CentralEntry {
        name: String::from_utf8(name).unwrap(),
        version_made_by,
        version_needed,
        flags,
        method,
        crc32,
        compressed_size,
        uncompressed_size,
        offset,
        external_attributes,
        extra,
        zip64_fields,
    }
}

/// Sink that counts everything and keeps only the trailing window, for
/// archives too large to hold in memory. The window must be big enough for
/// the central directory and end records.
pub struct TailSink {
    pub total: u64,
    pub tail: Vec<u8>,
    keep: usize,
}

impl TailSink {
    pub fn new(keep: usize) -> TailSink {
        TailSink {
            total: 0,
            tail: Vec::with_capacity(keep),
            keep,
        }
    }
}

impl std::io::Write for TailSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.total += buf.len() as u64;
        if buf.len() >= self.keep {
            self.tail.clear();
            self.tail.extend_from_slice(&buf[buf.len() - self.keep..]);
        } else {
            self.tail.extend_from_slice(buf);
            if self.tail.len() > self.keep {
                self.tail.drain(..self.tail.len() - self.keep);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Read every entry back with the zip crate: `(name, content)` pairs in
/// directory order. Exercises a second, independent reader on our output.
pub fn unzip_entries(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).unwrap();
        let mut content = Vec::new();
        file.read_to_end(&mut content).unwrap();
        entries.push((file.name().to_owned(), content));
    }
    entries
}

/// Unix mode of a named entry as the zip crate sees it.
pub fn unzip_mode(bytes: &[u8], name: &str) -> Option<u32> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    let file = archive.by_name(name).unwrap();
    file.unix_mode()
}
