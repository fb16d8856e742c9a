//! Assembling an image in memory, and a validated view over an existing one.

use alloc::vec::Vec;

use crate::{Dirent, Directory, Entry, Error, Header, Layout};

/// Build a complete image from `entries`, in order.
///
/// Either the whole image is returned or nothing is.
pub fn compose(entries: &[Entry<'_>]) -> Result<Vec<u8>, Error> {
    let layout = Layout::plan(entries.iter().map(|e| (e.name, e.data.len() as u64)))?;
    let directory = layout.encode_directory(entries.iter().map(|e| e.name))?;

    let mut image = Vec::with_capacity(usize::try_from(layout.image_size())?);
    image.extend_from_slice(layout.header().as_bytes());
    image.extend_from_slice(&directory);
    image.resize(usize::try_from(layout.data_start())?, 0);

    for (entry, placement) in entries.iter().zip(layout.placements()) {
        debug_assert_eq!(image.len() as u64, u64::from(placement.offset));
        image.extend_from_slice(entry.data);
        image.resize(usize::try_from(placement.end())?, 0);
    }

    debug_assert_eq!(image.len() as u64, layout.image_size());
    Ok(image)
}

/// A parsed image borrowing its bytes.
///
/// Parsing checks the magic, that the directory lies inside the image,
/// that every record is well formed, and that every file's data lies
/// inside the image.
#[derive(Clone, Copy, Debug)]
pub struct Image<'a> {
    data: &'a [u8],
    header: Header,
}

impl<'a> Image<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Image<'a>, Error> {
        let header = Header::parse(data)?;
        let image = Image { data, header };
        for dirent in image.entries()? {
            let dirent = dirent?;
            if dirent.end() > data.len() as u64 {
                return Err(Error::InvalidData);
            }
        }
        Ok(image)
    }

    pub fn header(&self) -> Header {
        self.header
    }

    /// Directory records in image order
    pub fn entries(&self) -> Result<Directory<'a>, Error> {
        self.header.directory(self.data)
    }

    /// First record named `name`. Duplicate names are legal; later ones are
    /// shadowed, matching what boot loaders see.
    pub fn find(&self, name: &[u8]) -> Option<Dirent<'a>> {
        self.entries()
            .ok()?
            .filter_map(Result::ok)
            .find(|dirent| dirent.name() == name)
    }

    /// Data of the record
    pub fn data(&self, dirent: &Dirent<'_>) -> Option<&'a [u8]> {
        let start = usize::try_from(dirent.offset()).ok()?;
        let end = usize::try_from(dirent.end()).ok()?;
        self.data.get(start..end)
    }

    /// Data of the first file named `name`
    pub fn open(&self, name: &[u8]) -> Option<&'a [u8]> {
        self.data(&self.find(name)?)
    }
}
