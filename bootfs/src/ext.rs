//! Extention traits and io helpers for base types defined in `bootfs-core`.
use std::ffi::OsStr;
use std::io::{self, Read, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::{Component, Path};

use bootfs_core::DirEntry;

use crate::Error;

pub trait DirEntryExt {
    fn check_path(&self) -> Result<&Path, Error>;
}

impl DirEntryExt for DirEntry {
    /// Iterate the components of the name and ensure that there are no
    /// non-normal components, so the entry can be placed under a base
    /// directory.
    fn check_path(&self) -> Result<&Path, Error> {
        let path = Path::new(OsStr::from_bytes(self.name()));
        if path.as_os_str().is_empty() {
            return Err(Error::InvalidPath {
                entry: path.to_path_buf(),
                component: path.to_path_buf(),
            });
        }
        for component in path.components() {
            match component {
                Component::Normal(_) => {}
                invalid => {
                    let bad_component: &Path = invalid.as_ref();
                    return Err(Error::InvalidPath {
                        entry: path.to_path_buf(),
                        component: bad_component.to_path_buf(),
                    });
                }
            }
        }
        Ok(path)
    }
}

/// Copy everything from `read` to `write`, returning the byte count
pub(crate) fn copy_counted<R: Read, W: Write>(mut read: R, mut write: W, buf: &mut [u8]) -> io::Result<u64> {
    let mut total = 0;
    loop {
        let count = match read.read(buf) {
            Ok(0) => break,
            Ok(count) => count,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        total += count as u64;
        write.write_all(&buf[..count])?;
    }
    Ok(total)
}

pub(crate) fn write_zeros<W: Write>(mut write: W, count: u64) -> io::Result<()> {
    let written = io::copy(&mut io::repeat(0).take(count), &mut write)?;
    debug_assert_eq!(written, count);
    Ok(())
}
