pub const LOCAL_FILE_HEADER_SIGNATURE: u32 = 0x04034b50;
pub const DATA_DESCRIPTOR_SIGNATURE: u32 = 0x08074b50;
pub const CENTRAL_DIRECTORY_ENTRY_SIGNATURE: u32 = 0x02014b50;
pub const CENTRAL_DIRECTORY_END_SIGNATURE: u32 = 0x06054b50;
pub const ZIP64_CENTRAL_DIRECTORY_END_SIGNATURE: u32 = 0x06064b50;
pub const ZIP64_END_OF_CENTRAL_DIR_LOCATOR_SIGNATURE: u32 = 0x07064b50;

/// The only compression method this writer emits.
pub const METHOD_DEFLATE: u16 = 8;

pub const EXTENDED_LOCAL_HEADER_FLAG: u16 = 1 << 3;
pub const UTF8_NAME_FLAG: u16 = 1 << 11;

pub const VERSION_DEFLATE: u16 = 20;
pub const VERSION_USES_ZIP64_FORMAT_EXTENSIONS: u16 = 45;

pub const OS_UNIX: u8 = 3;
pub const OS_WINDOWS_NTFS: u8 = 10;

pub const X5455_EXTENDEDTIMESTAMP: u16 = 0x5455;
pub const X000A_NTFS: u16 = 0x000a;
pub const ZIP64_EXTENDED_INFORMATION: u16 = 0x0001;

/// Regular-file type bit of a POSIX mode.
pub const S_IFREG: u32 = 0o100000;

/// A name length field is 16 bits wide.
pub const MAX_NAME_LEN: usize = u16::MAX as usize;

/// Buffer size for the deflate input and output chunks.
#[cfg(target_pointer_width = "64")]
pub const CHUNK: usize = 256 * 1024;
#[cfg(not(target_pointer_width = "64"))]
pub const CHUNK: usize = 32 * 1024;
