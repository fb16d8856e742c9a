//! Directory records: one per packed file, each aligned to [`DIRENT_ALIGN`]

use alloc::vec::Vec;
use core::fmt::{self, Display};

use bytemuck::{Pod, Zeroable};

use crate::{align_up, Error, DIRENT_ALIGN, DIRENT_HEAD_SIZE};

/// Fixed part of a directory record; the name bytes follow it directly.
/// Fields are stored little-endian.
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(packed, C)]
pub struct DirentHead {
    /// Length of the name including its NUL terminator
    pub name_len: u32,
    /// Size in bytes of the file data
    pub size: u32,
    /// Absolute offset of the file data within the image
    pub offset: u32,
}

/// One logical file to be packed: its name and raw content
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entry<'a> {
    pub name: &'a [u8],
    pub data: &'a [u8],
}

impl<'a> Entry<'a> {
    pub fn new(name: &'a (impl AsRef<[u8]> + ?Sized), data: &'a [u8]) -> Entry<'a> {
        Entry {
            name: name.as_ref(),
            data,
        }
    }
}

/// Length of the name field as stored, including the terminator
fn name_field_len(name: &[u8]) -> Result<u32, Error> {
    if name.contains(&0) {
        return Err(Error::InvalidName);
    }
    name.len()
        .checked_add(1)
        .and_then(|len| u32::try_from(len).ok())
        .ok_or(Error::NameTooLong(name.len()))
}

/// Padded size of the record for `name`. Depends on the name only, so the
/// directory can be sized before any data is placed.
pub fn dirent_size(name: &[u8]) -> Result<usize, Error> {
    let name_len = name_field_len(name)?;
    let size = align_up(DIRENT_HEAD_SIZE as u64 + u64::from(name_len), DIRENT_ALIGN)?;
    Ok(usize::try_from(size)?)
}

/// Append the record for `name` to `out`, returning the number of bytes written
pub fn encode_dirent(name: &[u8], size: u32, offset: u32, out: &mut Vec<u8>) -> Result<usize, Error> {
    let record_size = dirent_size(name)?;
    let head = DirentHead {
        name_len: name_field_len(name)?.to_le(),
        size: size.to_le(),
        offset: offset.to_le(),
    };

    let start = out.len();
    out.extend_from_slice(bytemuck::bytes_of(&head));
    out.extend_from_slice(name);
    out.resize(start + record_size, 0);
    Ok(record_size)
}

/// A directory record decoded from an image
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dirent<'a> {
    name: &'a [u8],
    size: u32,
    offset: u32,
}

impl<'a> Dirent<'a> {
    /// Name without the terminator
    pub fn name(&self) -> &'a [u8] {
        self.name
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// End of the file data within the image
    pub fn end(&self) -> u64 {
        u64::from(self.offset) + u64::from(self.size)
    }
}

impl Display for Dirent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "name={:?} size={} offset={}",
            alloc::string::String::from_utf8_lossy(self.name),
            self.size,
            self.offset
        )
    }
}

/// Owned copy of a [`Dirent`], as returned by [`ImageSrc`](crate::ImageSrc)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub name: Vec<u8>,
    pub size: u32,
    pub offset: u32,
}

impl DirEntry {
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    pub fn as_dirent(&self) -> Dirent<'_> {
        Dirent {
            name: &self.name,
            size: self.size,
            offset: self.offset,
        }
    }
}

impl From<Dirent<'_>> for DirEntry {
    fn from(dirent: Dirent<'_>) -> DirEntry {
        DirEntry {
            name: dirent.name.to_vec(),
            size: dirent.size,
            offset: dirent.offset,
        }
    }
}

/// Iterator over the records of a directory region.
///
/// Records are walked the way a boot loader walks them: the next record
/// starts `DIRENT_HEAD_SIZE + align(name_len, DIRENT_ALIGN)` bytes later.
/// A malformed record yields one `Err` and ends the iteration.
#[derive(Clone, Debug)]
pub struct Directory<'a> {
    data: &'a [u8],
    failed: bool,
}

impl<'a> Directory<'a> {
    pub fn new(data: &'a [u8]) -> Directory<'a> {
        Directory {
            data,
            failed: false,
        }
    }

    fn decode_next(&mut self) -> Result<Dirent<'a>, Error> {
        let head_bytes = self.data.get(..DIRENT_HEAD_SIZE).ok_or(Error::InvalidData)?;
        let head: DirentHead = bytemuck::pod_read_unaligned(head_bytes);
        let name_len = usize::try_from(u32::from_le(head.name_len))?;
        if name_len == 0 {
            return Err(Error::InvalidData);
        }

        let record_size = align_up(
            DIRENT_HEAD_SIZE as u64 + name_len as u64,
            DIRENT_ALIGN,
        )?;
        let record_size = usize::try_from(record_size)?;
        let record = self.data.get(..record_size).ok_or(Error::InvalidData)?;

        let name_field = &record[DIRENT_HEAD_SIZE..DIRENT_HEAD_SIZE + name_len];
        let (terminator, name) = name_field.split_last().ok_or(Error::InvalidData)?;
        if *terminator != 0 || name.contains(&0) {
            return Err(Error::InvalidData);
        }

        self.data = &self.data[record_size..];
        Ok(Dirent {
            name,
            size: u32::from_le(head.size),
            offset: u32::from_le(head.offset),
        })
    }
}

impl<'a> Iterator for Directory<'a> {
    type Item = Result<Dirent<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.data.is_empty() {
            return None;
        }
        let next = self.decode_next();
        self.failed = next.is_err();
        Some(next)
    }
}
