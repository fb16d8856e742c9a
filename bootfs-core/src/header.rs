//! The packed structs represent the on-disk format of a BootFS image

use bytemuck::{Pod, PodCastError, Zeroable};

use crate::{Directory, Error, HEADER_SIZE, MAGIC};

/// Fixed header at the start of every image. All fields are stored
/// little-endian; use the accessors to read native values.
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(packed, C)]
pub struct Header {
    /// Format identifier, always [`MAGIC`]
    pub magic: u32,
    /// Size in bytes of the directory, which starts immediately after the header
    pub dir_size: u32,
    /// Reserved, always zero
    pub reserved0: u32,
    /// Reserved, always zero
    pub reserved1: u32,
}

impl Header {
    pub fn new(dir_size: u32) -> Header {
        Header {
            magic: MAGIC.to_le(),
            dir_size: dir_size.to_le(),
            reserved0: 0,
            reserved1: 0,
        }
    }

    /// Parse the header from the start of `data` and check the magic
    pub fn parse(data: &[u8]) -> Result<Header, Error> {
        let header = Header::parse_unchecked(data)?;
        if header.magic() != MAGIC {
            return Err(Error::InvalidMagic(header.magic()));
        }
        Ok(header)
    }

    /// Parse the header from the start of `data` without checking the magic
    pub fn parse_unchecked(data: &[u8]) -> Result<Header, Error> {
        let head = data
            .get(..HEADER_SIZE)
            .ok_or(Error::Cast(PodCastError::SizeMismatch))?;
        Ok(*bytemuck::try_from_bytes::<Header>(head)?)
    }

    pub fn magic(&self) -> u32 {
        u32::from_le(self.magic)
    }

    pub fn dir_size(&self) -> u32 {
        u32::from_le(self.dir_size)
    }

    pub fn reserved(&self) -> [u32; 2] {
        [u32::from_le(self.reserved0), u32::from_le(self.reserved1)]
    }

    /// Size of the header and the directory together
    pub fn total_size(&self) -> Result<usize, Error> {
        usize::try_from(self.dir_size())?
            .checked_add(HEADER_SIZE)
            .ok_or(Error::Overflow)
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Iterate the directory records stored in `data`, which must start at
    /// the beginning of the image
    pub fn directory<'a>(&self, data: &'a [u8]) -> Result<Directory<'a>, Error> {
        let dir = data
            .get(HEADER_SIZE..self.total_size()?)
            .ok_or(Error::InvalidData)?;
        Ok(Directory::new(dir))
    }
}
