use std::fs::{self, File, Metadata};
use std::io::Write;

use crate::archive::ZipStream;
use crate::constants::MAX_NAME_LEN;
use crate::types::EntryMeta;

/// Separator used inside archive names, matching what the platform's
/// directory traversal produces.
#[cfg(unix)]
const SEPARATOR: char = '/';
#[cfg(windows)]
const SEPARATOR: char = '\\';

#[cfg(unix)]
fn file_meta(meta: &Metadata) -> EntryMeta {
    use std::os::unix::fs::MetadataExt;
    EntryMeta::Unix {
        mode: meta.mode(),
        atime: meta.atime() as u32,
        mtime: meta.mtime() as u32,
    }
}

#[cfg(windows)]
fn file_meta(meta: &Metadata) -> EntryMeta {
    use std::os::windows::fs::MetadataExt;
    EntryMeta::Windows {
        attr: meta.file_attributes(),
        ctime: meta.creation_time(),
        atime: meta.last_access_time(),
        mtime: meta.last_write_time(),
    }
}

impl<'a, W: Write> ZipStream<'a, W> {
    /// Look for regular files at the scratch path, descending into
    /// directories. Symbolic links count as the objects they point to,
    /// except links to directories, which would make the walk cyclic.
    /// Everything else is diagnosed and skipped.
    ///
    /// The scratch path grows in place while descending and is cut back to
    /// its previous length on the way out, so memory stays bounded by the
    /// deepest path, not the tree.
    pub(crate) fn walk(&mut self) {
        if self.sink.bad() {
            return;
        }

        let meta = match fs::metadata(&self.path) {
            Ok(meta) => meta,
            Err(_) => {
                self.log
                    .warn(format!("could not stat {} -- skipping", self.path));
                return;
            }
        };

        if meta.is_dir() {
            let is_link = fs::symlink_metadata(&self.path)
                .map(|meta| meta.file_type().is_symlink())
                .unwrap_or(false);
            if is_link {
                self.log.warn(format!(
                    "{} is a symbolic link to a directory -- skipping",
                    self.path
                ));
                return;
            }

            let dir = match fs::read_dir(&self.path) {
                Ok(dir) => dir,
                Err(_) => {
                    self.log
                        .warn(format!("could not open directory {} -- skipping", self.path));
                    return;
                }
            };

            let len = self.path.len();
            for dirent in dir {
                let dirent = match dirent {
                    Ok(dirent) => dirent,
                    Err(_) => break,
                };
                let name = dirent.file_name();
                let name = match name.to_str() {
                    Some(name) => name,
                    None => {
                        self.log.warn(format!(
                            "a name under {} is not valid UTF-8 -- skipping",
                            self.path
                        ));
                        continue;
                    }
                };
                self.path.truncate(len);
                self.path.push(SEPARATOR);
                self.path.push_str(name);
                self.walk();
                if self.sink.bad() {
                    break;
                }
            }
            self.path.truncate(len);
            return;
        }

        if !meta.is_file() {
            // A device, pipe, or socket.
            self.log
                .warn(format!("{} is not a file or directory -- skipping", self.path));
            return;
        }

        self.file_entry(&meta);
    }

    /// One regular file, or a symbolic link to one.
    fn file_entry(&mut self, meta: &Metadata) {
        if self.path.len() > MAX_NAME_LEN {
            self.log.warn(format!(
                "file name is too long for the zip format! -- skipping {}",
                self.path
            ));
            return;
        }

        // stat said it is there, but reading may still be denied.
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(_) => {
                self.log.warn(format!(
                    "could not open {} for reading -- skipping",
                    self.path
                ));
                return;
            }
        };

        self.add_file(file_meta(meta), file);
    }
}
