//! Two-pass placement of the directory and file data.

use alloc::vec::Vec;

use crate::{align_up, dirent_size, encode_dirent, Error, Header, BLOCK_SIZE, HEADER_SIZE};

/// Where one entry ends up in the image
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Absolute offset of the data, always a multiple of [`BLOCK_SIZE`]
    pub offset: u32,
    /// Length of the content
    pub size: u32,
    /// Length of the block-aligned data region
    pub padded: u64,
    /// Length of the padded directory record
    pub record_size: usize,
}

impl Placement {
    /// End of the block-aligned data region
    pub fn end(&self) -> u64 {
        u64::from(self.offset) + self.padded
    }
}

/// Result of planning an image. Offsets are a pure function of the entry
/// order and the lengths of the names and contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    dir_size: u32,
    data_start: u64,
    image_size: u64,
    placements: Vec<Placement>,
}

impl Layout {
    /// Plan an image for `(name, content length)` pairs, in order.
    pub fn plan<'a, I>(entries: I) -> Result<Layout, Error>
    where
        I: IntoIterator<Item = (&'a [u8], u64)>,
    {
        // Directory sizing
        let mut dir_size: u64 = 0;
        let mut sized = Vec::new();
        for (name, len) in entries {
            let size = u32::try_from(len).map_err(|_| Error::ContentTooLong(len))?;
            let record_size = dirent_size(name)?;
            dir_size = dir_size
                .checked_add(record_size as u64)
                .ok_or(Error::Overflow)?;
            sized.push((record_size, size));
        }
        let dir_size = u32::try_from(dir_size).map_err(|_| Error::Overflow)?;

        // Data start
        let data_start = align_up(HEADER_SIZE as u64 + u64::from(dir_size), BLOCK_SIZE)?;

        // Offset assignment
        let mut cursor = data_start;
        let mut placements = Vec::with_capacity(sized.len());
        for (record_size, size) in sized {
            let offset = u32::try_from(cursor).map_err(|_| Error::Overflow)?;
            let padded = align_up(u64::from(size), BLOCK_SIZE)?;
            placements.push(Placement {
                offset,
                size,
                padded,
                record_size,
            });
            cursor = cursor.checked_add(padded).ok_or(Error::Overflow)?;
        }

        Ok(Layout {
            dir_size,
            data_start,
            image_size: cursor,
            placements,
        })
    }

    pub fn dir_size(&self) -> u32 {
        self.dir_size
    }

    /// Offset of the first data block; header, directory and padding precede it
    pub fn data_start(&self) -> u64 {
        self.data_start
    }

    /// Zero bytes between the end of the directory and [`Self::data_start`]
    pub fn dir_padding(&self) -> u64 {
        self.data_start - (HEADER_SIZE as u64 + u64::from(self.dir_size))
    }

    pub fn image_size(&self) -> u64 {
        self.image_size
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn header(&self) -> Header {
        Header::new(self.dir_size)
    }

    /// Encode the directory for `names`, which must be the names this
    /// layout was planned with, in the same order.
    pub fn encode_directory<'a, I>(&self, names: I) -> Result<Vec<u8>, Error>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut dir = Vec::with_capacity(usize::try_from(self.dir_size)?);
        let mut placements = self.placements.iter();
        for name in names {
            let placement = placements.next().ok_or(Error::InvalidData)?;
            let written = encode_dirent(name, placement.size, placement.offset, &mut dir)?;
            if written != placement.record_size {
                return Err(Error::InvalidData);
            }
        }
        if placements.next().is_some() || dir.len() != self.dir_size as usize {
            return Err(Error::InvalidData);
        }
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use super::Layout;
    use crate::{Error, BLOCK_SIZE, HEADER_SIZE};

    fn plan(entries: &[(&str, u64)]) -> Layout {
        Layout::plan(entries.iter().map(|(name, len)| (name.as_bytes(), *len))).unwrap()
    }

    #[test]
    fn empty() {
        let layout = plan(&[]);
        assert_eq!(layout.dir_size(), 0);
        assert_eq!(layout.data_start(), 4096);
        assert_eq!(layout.dir_padding(), 4080);
        assert_eq!(layout.image_size(), 4096);
        assert!(layout.placements().is_empty());
    }

    #[test]
    fn single_file() {
        let layout = plan(&[("hello.txt", 5)]);
        assert_eq!(layout.dir_size(), 24);
        assert_eq!(layout.data_start(), 4096);
        assert_eq!(layout.placements()[0].offset, 4096);
        assert_eq!(layout.placements()[0].padded, 4096);
        assert_eq!(layout.image_size(), 8192);
    }

    #[test]
    fn small_then_large() {
        let layout = plan(&[("a", 1), ("b", 4097)]);
        let p = layout.placements();
        assert_eq!((p[0].offset, p[0].end()), (4096, 8192));
        assert_eq!((p[1].offset, p[1].end()), (8192, 16384));
        assert_eq!(layout.image_size(), 16384);
    }

    #[test]
    fn empty_content_takes_no_blocks() {
        let layout = plan(&[("a", 0), ("b", 0), ("c", 1)]);
        let offsets = layout.placements().iter().map(|p| p.offset).collect::<Vec<_>>();
        assert_eq!(offsets, vec![4096, 4096, 4096]);
        assert_eq!(layout.image_size(), 8192);
    }

    #[test]
    fn large_directory_pushes_data_start() {
        // 300 records of 16 bytes each spill the header block
        let names = (0..300).map(|i| alloc::format!("{:03}", i)).collect::<Vec<_>>();
        let layout = Layout::plan(names.iter().map(|n| (n.as_bytes(), 10))).unwrap();
        assert_eq!(layout.dir_size(), 300 * 16);
        assert_eq!(layout.data_start(), 8192);
        assert!(layout.data_start() >= HEADER_SIZE as u64 + u64::from(layout.dir_size()));
    }

    #[test]
    fn regions_are_ordered_and_disjoint() {
        let sizes = [0, 1, 4095, 4096, 4097, 10_000, 3, 65_536];
        let entries = sizes.iter().map(|len| ("file", *len as u64)).collect::<Vec<_>>();
        let layout = plan(&entries);
        assert_eq!(layout.data_start() % BLOCK_SIZE, 0);

        let mut cursor = layout.data_start();
        for placement in layout.placements() {
            assert_eq!(u64::from(placement.offset), cursor);
            assert_eq!(u64::from(placement.offset) % BLOCK_SIZE, 0);
            assert!(placement.padded >= u64::from(placement.size));
            cursor = placement.end();
        }
        assert_eq!(cursor, layout.image_size());
    }

    #[test]
    fn deterministic() {
        let entries = [("boot/kernel", 123_456), ("init", 42)];
        assert_eq!(plan(&entries), plan(&entries));
    }

    #[test]
    fn content_too_long() {
        let err = Layout::plan([(&b"big"[..], u64::from(u32::MAX) + 1)]).unwrap_err();
        assert!(matches!(err, Error::ContentTooLong(_)));
    }

    #[test]
    fn offsets_must_fit() {
        let max = u64::from(u32::MAX);
        let err = Layout::plan([(&b"a"[..], max), (&b"b"[..], 1)]).unwrap_err();
        assert!(matches!(err, Error::Overflow));
    }

    #[test]
    fn directory_matches_plan() {
        let layout = plan(&[("a", 1), ("bb", 2)]);
        let dir = layout.encode_directory([&b"a"[..], &b"bb"[..]]).unwrap();
        assert_eq!(dir.len(), layout.dir_size() as usize);

        assert!(layout.encode_directory([&b"a"[..]]).is_err());
        assert!(layout.encode_directory([&b"a"[..], &b"bbbbb"[..]]).is_err());
    }
}
