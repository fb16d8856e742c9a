use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use bootfs_core::{DirEntry, Header, ImageSrc};
use bytemuck::Zeroable;

use crate::{wrap_io_err, Error, READ_WRITE_BUF_SIZE};

/// A BootFS image on disk
#[derive(Debug)]
pub struct ImageFile {
    path: PathBuf,
    src: BufReader<File>,
    header: Header,
}

impl ImageFile {
    /// Open the image at `path` and check its header
    pub fn new(path: impl AsRef<Path>) -> Result<ImageFile, Error> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .read(true)
            .open(&path)
            .map_err(wrap_io_err!(path, "Open"))?;

        let mut new = ImageFile {
            path,
            src: BufReader::new(file),
            // Replaced by the parsed header below
            header: Header::zeroed(),
        };

        new.header = new.read_header()?;
        Ok(new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> Header {
        self.header
    }

    /// Copy the data of `entry` to `writer`, returning the count of bytes
    pub fn copy_entry(&mut self, entry: &DirEntry, writer: &mut impl Write) -> Result<u64, Error> {
        let mut buf = vec![0; READ_WRITE_BUF_SIZE];
        let mut offset = 0;
        loop {
            let count = self.read_entry(entry, offset, &mut buf)?;
            if count == 0 {
                break;
            }
            writer
                .write_all(&buf[..count])
                .map_err(wrap_io_err!("Writing entry data"))?;
            offset += count as u64;
        }

        if offset != u64::from(entry.size) {
            return Err(Error::LengthMismatch {
                entry: PathBuf::from(String::from_utf8_lossy(entry.name()).into_owned()),
                actual: offset,
                expected: u64::from(entry.size),
            });
        }
        Ok(offset)
    }
}

impl ImageSrc for ImageFile {
    type Err = Error;

    /// Reads until `buf` is full or the end of the file
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, Self::Err> {
        self.src
            .seek(SeekFrom::Start(offset))
            .map_err(wrap_io_err!(self.path, "Seek at read_at"))?;

        let mut total = 0;
        while total < buf.len() {
            match self.src.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(count) => total += count,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(wrap_io_err!(self.path, "Read at read_at")(err)),
            }
        }
        Ok(total)
    }

    fn src_len(&mut self) -> Result<u64, Self::Err> {
        let metadata = self
            .src
            .get_ref()
            .metadata()
            .map_err(wrap_io_err!(self.path, "Reading metadata"))?;
        Ok(metadata.len())
    }
}
