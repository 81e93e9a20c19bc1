use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};

use crate::constants::{OS_UNIX, OS_WINDOWS_NTFS, S_IFREG};

/// Per-entry metadata, tagged by the system the attributes come from.
///
/// The variant decides the operating-system code in the central directory,
/// the external-attribute encoding, and which timestamp extra field rides
/// along with the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryMeta {
    /// POSIX permissions and 32-bit seconds-since-epoch timestamps.
    Unix { mode: u32, atime: u32, mtime: u32 },
    /// NTFS attribute bitmap and 64-bit FILETIME stamps
    /// (100-nanosecond ticks since 1601-01-01 UTC).
    Windows {
        attr: u32,
        ctime: u64,
        atime: u64,
        mtime: u64,
    },
}

impl EntryMeta {
    pub(crate) fn os_code(&self) -> u8 {
        match self {
            EntryMeta::Unix { .. } => OS_UNIX,
            EntryMeta::Windows { .. } => OS_WINDOWS_NTFS,
        }
    }

    /// External attributes for the central header. Unix modes ride in the
    /// high 16 bits; Windows attribute bitmaps are stored as-is.
    pub(crate) fn external_attributes(&self) -> u32 {
        match *self {
            EntryMeta::Unix { mode, .. } => mode << 16,
            EntryMeta::Windows { attr, .. } => attr,
        }
    }

    /// Keeps the permission bits of a caller-supplied Unix mode and forces
    /// the regular-file type bit on.
    pub(crate) fn normalized(self) -> EntryMeta {
        match self {
            EntryMeta::Unix { mode, atime, mtime } => EntryMeta::Unix {
                mode: S_IFREG | (mode & 0o7777),
                atime,
                mtime,
            },
            windows => windows,
        }
    }

    /// Modification time as seconds since the Unix epoch, for the DOS stamp.
    pub(crate) fn mtime_epoch(&self) -> i64 {
        match *self {
            EntryMeta::Unix { mtime, .. } => mtime as i64,
            EntryMeta::Windows { mtime, .. } => filetime_to_epoch(mtime),
        }
    }
}

/// Seconds between 1601-01-01 and 1970-01-01.
const FILETIME_EPOCH_DELTA: i64 = 11_644_473_600;
const FILETIME_TICKS_PER_SECOND: u64 = 10_000_000;

pub(crate) fn filetime_to_epoch(filetime: u64) -> i64 {
    (filetime / FILETIME_TICKS_PER_SECOND) as i64 - FILETIME_EPOCH_DELTA
}

/// DOS-format timestamp for the local and central headers, returned as the
/// two little-endian words the records carry: `(time, date)`.
///
/// DOS time holds only even seconds, so the stamp is rounded up first. Times
/// that land before 1980 in local time become midnight 1980-01-01, the
/// earliest stamp the format can express. If the conversion itself fails the
/// current wall-clock time is substituted under the same rules.
pub(crate) fn dos_date_time(epoch_secs: i64) -> (u16, u16) {
    let rounded = epoch_secs + (epoch_secs & 1);
    let local = match Local.timestamp_opt(rounded, 0) {
        chrono::LocalResult::Single(local) => local,
        chrono::LocalResult::Ambiguous(local, _) => local,
        chrono::LocalResult::None => {
            let now = Local::now().timestamp();
            match Local.timestamp_opt(now + (now & 1), 0) {
                chrono::LocalResult::Single(local) => local,
                chrono::LocalResult::Ambiguous(local, _) => local,
                chrono::LocalResult::None => unreachable!("local time of the current instant"),
            }
        }
    };
    pack_dos(&local)
}

fn pack_dos(local: &DateTime<Local>) -> (u16, u16) {
    if local.year() < 1980 {
        // midnight, Jan 1, 1980
        return (0, (1 << 5) | 1);
    }
    let time = (local.second() as u16 / 2)
        | ((local.minute() as u16) << 5)
        | ((local.hour() as u16) << 11);
    let date = (local.day() as u16)
        | ((local.month() as u16) << 5)
        | ((((local.year() - 1980) as u16) & 0x7f) << 9);
    (time, date)
}
