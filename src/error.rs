use std::fmt::{self, Display};

/// Errors reported by [`ZipStream`](crate::ZipStream).
///
/// A failed write on the output latches the stream: nothing further is
/// emitted and every subsequent call reports [`Aborted`](ZipError::Aborted),
/// but the session can still be closed to release its resources. The other
/// variants are argument or call-order mistakes and leave the session
/// untouched.
#[derive(Debug)]
pub enum ZipError {
    /// A write or flush on the output failed earlier; output is frozen.
    Aborted,
    /// Deflate compression level outside 0..=9.
    InvalidLevel(u32),
    /// Entry name longer than the 65535 bytes the zip format can hold.
    NameTooLong(usize),
    /// `data()` was called with no entry started by `meta()`.
    NotFeeding,
    /// The call needs an idle session but an entry is still being fed.
    EntryOpen,
}

impl Display for ZipError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ZipError::Aborted => {
                write!(f, "output aborted by an earlier write error")
            }
            ZipError::InvalidLevel(level) => {
                write!(f, "compression level {} is out of range (0..=9)", level)
            }
            ZipError::NameTooLong(len) => {
                write!(f, "entry name of {} bytes exceeds the zip limit of 65535", len)
            }
            ZipError::NotFeeding => {
                write!(f, "no entry is in progress; start one with meta()")
            }
            ZipError::EntryOpen => {
                write!(f, "an entry is still in progress; complete it with data(.., true)")
            }
        }
    }
}

impl std::error::Error for ZipError {}
