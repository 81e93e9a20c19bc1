use crate::constants::{
    CENTRAL_DIRECTORY_END_SIGNATURE, CENTRAL_DIRECTORY_ENTRY_SIGNATURE, DATA_DESCRIPTOR_SIGNATURE,
    LOCAL_FILE_HEADER_SIGNATURE, METHOD_DEFLATE, VERSION_DEFLATE,
    VERSION_USES_ZIP64_FORMAT_EXTENSIONS, X000A_NTFS, X5455_EXTENDEDTIMESTAMP,
    ZIP64_CENTRAL_DIRECTORY_END_SIGNATURE, ZIP64_END_OF_CENTRAL_DIR_LOCATOR_SIGNATURE,
    ZIP64_EXTENDED_INFORMATION,
};
use crate::descriptor::RecordBuffer;
use crate::types::{dos_date_time, EntryMeta};

/// Everything kept per entry until the central directory is written.
#[derive(Debug)]
pub(crate) struct EntryRecord {
    pub name: String,
    pub meta: EntryMeta,
    pub crc32: u32,
    pub uncompressed_size: u64,
    pub compressed_size: u64,
    /// Offset of this entry's local header in the output stream.
    pub offset: u64,
    /// General-purpose flags captured when the entry began.
    pub flags: u16,
}

impl EntryRecord {
    pub fn new(name: String, meta: EntryMeta, offset: u64, flags: u16) -> EntryRecord {
        EntryRecord {
            name,
            meta,
            crc32: 0,
            uncompressed_size: 0,
            compressed_size: 0,
            offset,
            flags,
        }
    }

    /// Any counter at or past its 32-bit sentinel promotes the entry.
    pub fn is_zip64(&self) -> bool {
        self.uncompressed_size >= u32::MAX as u64
            || self.compressed_size >= u32::MAX as u64
            || self.offset >= u32::MAX as u64
    }

    fn dos_stamp(&self) -> (u16, u16) {
        dos_date_time(self.meta.mtime_epoch())
    }
}

fn timestamp_extra_len(meta: &EntryMeta) -> u16 {
    match meta {
        EntryMeta::Unix { .. } => 12,
        EntryMeta::Windows { .. } => 36,
    }
}

/// OS-native timestamp extra field: 0x5455 with access and modify times for
/// Unix entries, the NTFS 0x000A field with all three FILETIMEs for Windows
/// entries. The same field rides on the local and the central header.
fn write_timestamp_extra(buf: &mut RecordBuffer, meta: &EntryMeta) {
    match *meta {
        EntryMeta::Unix { atime, mtime, .. } => {
            buf.write_u16(X5455_EXTENDEDTIMESTAMP);
            buf.write_u16(8);
            buf.write_u32(atime);
            buf.write_u32(mtime);
        }
        EntryMeta::Windows {
            ctime,
            atime,
            mtime,
            ..
        } => {
            buf.write_u16(X000A_NTFS);
            buf.write_u16(32);
            buf.write_u32(0); // reserved
            buf.write_u16(1); // tag 1: file times
            buf.write_u16(24);
            buf.write_u64(mtime);
            buf.write_u64(atime);
            buf.write_u64(ctime);
        }
    }
}

/// Local file header. CRC and sizes are zero here; the data descriptor
/// carries the real values (general-purpose bit 3 is set). Only the header
/// offset can require Zip64 at this point, the sizes are still unknown.
pub(crate) fn build_local_header(buf: &mut RecordBuffer, entry: &EntryRecord) {
    let (time, date) = entry.dos_stamp();
    let version_needed = if entry.offset >= u32::MAX as u64 {
        VERSION_USES_ZIP64_FORMAT_EXTENSIONS
    } else {
        VERSION_DEFLATE
    };

    buf.write_u32(LOCAL_FILE_HEADER_SIGNATURE);
    buf.write_u16(version_needed);
    buf.write_u16(entry.flags);
    buf.write_u16(METHOD_DEFLATE);
    buf.write_u16(time);
    buf.write_u16(date);
    buf.write_u32(0); // CRC-32, in the data descriptor
    buf.write_u32(0); // compressed size
    buf.write_u32(0); // uncompressed size
    buf.write_u16(entry.name.len() as u16);
    buf.write_u16(timestamp_extra_len(&entry.meta));
    buf.write_bytes(entry.name.as_bytes());
    write_timestamp_extra(buf, &entry.meta);
}

/// Data descriptor trailing the compressed data. The field width must
/// follow the same logic that decides the Zip64 extra field in the central
/// header, which is why a large header offset widens the sizes here too.
pub(crate) fn build_data_descriptor(buf: &mut RecordBuffer, entry: &EntryRecord) {
    buf.write_u32(DATA_DESCRIPTOR_SIGNATURE);
    buf.write_u32(entry.crc32);
    if entry.is_zip64() {
        buf.write_u64(entry.compressed_size);
        buf.write_u64(entry.uncompressed_size);
    } else {
        buf.write_u32(entry.compressed_size as u32);
        buf.write_u32(entry.uncompressed_size as u32);
    }
}

/// Central directory header. Counters that overflow their 32-bit field are
/// written as the max-value sentinel and appear in the Zip64 extra field
/// instead, which carries only the overflowed ones -- in uncompressed,
/// compressed, offset order, unlike the data descriptor.
pub(crate) fn build_central_header(buf: &mut RecordBuffer, entry: &EntryRecord) {
    let mut zip64 = RecordBuffer::with_capacity(24);
    if entry.uncompressed_size >= u32::MAX as u64 {
        zip64.write_u64(entry.uncompressed_size);
    }
    if entry.compressed_size >= u32::MAX as u64 {
        zip64.write_u64(entry.compressed_size);
    }
    if entry.offset >= u32::MAX as u64 {
        zip64.write_u64(entry.offset);
    }

    let zip64_len = zip64.len() as u16;
    let mut extra_len = timestamp_extra_len(&entry.meta);
    if zip64_len > 0 {
        extra_len += zip64_len + 4;
    }
    let version_needed = if zip64_len > 0 {
        VERSION_USES_ZIP64_FORMAT_EXTENSIONS
    } else {
        VERSION_DEFLATE
    };
    let (time, date) = entry.dos_stamp();

    buf.write_u32(CENTRAL_DIRECTORY_ENTRY_SIGNATURE);
    buf.write_u16(
        ((entry.meta.os_code() as u16) << 8) | VERSION_USES_ZIP64_FORMAT_EXTENSIONS,
    );
    buf.write_u16(version_needed);
    buf.write_u16(entry.flags);
    buf.write_u16(METHOD_DEFLATE);
    buf.write_u16(time);
    buf.write_u16(date);
    buf.write_u32(entry.crc32);
    buf.write_u32(entry.compressed_size.min(u32::MAX as u64) as u32);
    buf.write_u32(entry.uncompressed_size.min(u32::MAX as u64) as u32);
    buf.write_u16(entry.name.len() as u16);
    buf.write_u16(extra_len);
    buf.write_u16(0); // file comment length
    buf.write_u16(0); // starting disk
    buf.write_u16(0); // internal attributes
    buf.write_u32(entry.meta.external_attributes());
    buf.write_u32(entry.offset.min(u32::MAX as u64) as u32);
    buf.write_bytes(entry.name.as_bytes());
    if zip64_len > 0 {
        buf.write_u16(ZIP64_EXTENDED_INFORMATION);
        buf.write_u16(zip64_len);
        buf.write_bytes(zip64.bytes());
    }
    write_timestamp_extra(buf, &entry.meta);
}

/// Figures for the end-of-archive records.
#[derive(Debug)]
pub(crate) struct CentralDirectoryEnd {
    pub entries: u64,
    pub size: u64,
    pub offset: u64,
}

impl CentralDirectoryEnd {
    /// An entry count, directory length, or directory offset at or past its
    /// classic field's sentinel requires the Zip64 end records.
    pub fn needs_zip64(&self) -> bool {
        self.entries >= u16::MAX as u64
            || self.size >= u32::MAX as u64
            || self.offset >= u32::MAX as u64
    }

    /// Zip64 end-of-central-directory record followed by its locator.
    /// `record_offset` is where the Zip64 end record itself lands.
    pub fn build_zip64_records(&self, buf: &mut RecordBuffer, record_offset: u64) {
        buf.write_u32(ZIP64_CENTRAL_DIRECTORY_END_SIGNATURE);
        buf.write_u64(44); // size of the remainder of this record
        buf.write_u16(VERSION_USES_ZIP64_FORMAT_EXTENSIONS);
        buf.write_u16(VERSION_USES_ZIP64_FORMAT_EXTENSIONS);
        buf.write_u32(0); // this disk
        buf.write_u32(0); // disk with the central directory
        buf.write_u64(self.entries);
        buf.write_u64(self.entries);
        buf.write_u64(self.size);
        buf.write_u64(self.offset);

        buf.write_u32(ZIP64_END_OF_CENTRAL_DIR_LOCATOR_SIGNATURE);
        buf.write_u32(0); // disk with the Zip64 end record
        buf.write_u64(record_offset);
        buf.write_u32(1); // total disks
    }

    /// Classic end-of-central-directory record, with overflowing fields
    /// clamped to their sentinels.
    pub fn build_end_record(&self, buf: &mut RecordBuffer) {
        buf.write_u32(CENTRAL_DIRECTORY_END_SIGNATURE);
        buf.write_u16(0); // this disk
        buf.write_u16(0); // disk with the central directory
        buf.write_u16(self.entries.min(u16::MAX as u64) as u16);
        buf.write_u16(self.entries.min(u16::MAX as u64) as u16);
        buf.write_u32(self.size.min(u32::MAX as u64) as u32);
        buf.write_u32(self.offset.min(u32::MAX as u64) as u32);
        buf.write_u16(0); // archive comment length
    }
}
