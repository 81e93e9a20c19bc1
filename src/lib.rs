//! Streaming zip archive writer.
//!
//! [`ZipStream`] emits a PKZIP-compatible archive as a forward-only byte
//! stream. The output is never seeked and never rewritten, and the archive
//! is never held in memory, so the same code serves files, pipes, and
//! network sinks alike. Entries are deflate-compressed with a data
//! descriptor after each payload, and the size, offset, and entry-count
//! fields switch to their Zip64 forms whenever the classic 32-bit limits
//! are exceeded.

mod archive;
mod compress;
mod constants;
mod descriptor;
mod entry;
mod error;
mod sink;
mod types;
mod walk;

pub use archive::ZipStream;
pub use compress::Level;
pub use error::ZipError;
pub use types::EntryMeta;
