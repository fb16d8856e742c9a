use alloc::vec;
use alloc::vec::Vec;

use crate::{DirEntry, Directory, Error, Header, HEADER_SIZE};

/// Random-access source of an image, such as a buffer or a file
pub trait ImageSrc {
    type Err: From<Error>;

    /// Fill `buf` from `offset`, returning the count of bytes read
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, Self::Err>;

    /// Total length of the source in bytes
    fn src_len(&mut self) -> Result<u64, Self::Err>;

    fn read_header(&mut self) -> Result<Header, Self::Err> {
        let mut header_data = [0; HEADER_SIZE];
        let count = self.read_at(0, &mut header_data)?;
        let header = Header::parse(&header_data[..count])?;
        Ok(header)
    }

    fn read_directory(&mut self) -> Result<Vec<DirEntry>, Self::Err> {
        let header = self.read_header()?;
        // The directory size is untrusted, bound it before allocating
        let dir_end = (HEADER_SIZE as u64)
            .checked_add(u64::from(header.dir_size()))
            .ok_or(Error::Overflow)?;
        if dir_end > self.src_len()? {
            return Err(Error::InvalidData.into());
        }

        let dir_size = usize::try_from(header.dir_size()).map_err(Error::TryFromInt)?;
        let mut dir_data = vec![0; dir_size];
        let count = self.read_at(HEADER_SIZE as u64, &mut dir_data)?;
        if count != dir_size {
            return Err(Error::InvalidData.into());
        }

        let entries = Directory::new(&dir_data)
            .map(|dirent| dirent.map(DirEntry::from))
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(entries)
    }

    /// Read from a given entry's data with a given offset within that entry.
    /// Reads past the end of the entry are clamped.
    fn read_entry(&mut self, entry: &DirEntry, offset: u64, buf: &mut [u8]) -> Result<usize, Self::Err> {
        let size = u64::from(entry.size);
        if offset >= size {
            return Ok(0);
        }

        let mut end = usize::try_from(size - offset).map_err(Error::TryFromInt)?;
        if end > buf.len() {
            end = buf.len();
        }

        let offset = u64::from(entry.offset)
            .checked_add(offset)
            .ok_or(Error::Overflow)?;
        self.read_at(offset, &mut buf[..end])
    }
}

impl<T: AsRef<[u8]>> ImageSrc for T {
    type Err = Error;

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, Error> {
        let start = usize::try_from(offset).map_err(Error::TryFromInt)?;
        let len = self.as_ref().len();
        if start >= len {
            return Ok(0);
        }
        let mut end = start.checked_add(buf.len()).ok_or(Error::Overflow)?;
        if end > len {
            end = len;
        }
        let count = end - start;
        buf[..count].copy_from_slice(&self.as_ref()[start..end]);
        Ok(count)
    }

    fn src_len(&mut self) -> Result<u64, Error> {
        Ok(self.as_ref().len() as u64)
    }
}
