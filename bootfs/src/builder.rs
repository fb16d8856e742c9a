use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use bootfs_core::{Layout, NAME_MAX};
use log::{debug, warn};

use crate::ext::{copy_counted, write_zeros};
use crate::{wrap_io_err, Error, READ_WRITE_BUF_SIZE};

struct BuilderEntry {
    /// Name stored in the directory
    name: Vec<u8>,
    kind: BuilderEntryKind,
}

impl BuilderEntry {
    fn new(name: impl AsRef<[u8]>, kind: BuilderEntryKind) -> BuilderEntry {
        let name = name.as_ref().to_vec();
        if name.len() >= NAME_MAX {
            warn!(
                "name '{}' is {} bytes, loaders may only accept {}",
                String::from_utf8_lossy(&name),
                name.len(),
                NAME_MAX - 1
            );
        }
        BuilderEntry { name, kind }
    }
}

fn display_name(name: &[u8]) -> PathBuf {
    PathBuf::from(std::ffi::OsStr::from_bytes(name))
}

enum BuilderEntryKind {
    /// Path to regular file during build
    File(PathBuf),

    Reader(Box<dyn Read>),

    /// Contents already in memory
    Bytes(Vec<u8>),
}

/// An entry whose length is known, ready to be planned and copied
struct MeasuredEntry {
    name: Vec<u8>,
    payload: Payload,
    len: u64,
}

enum Payload {
    File(PathBuf),
    Bytes(Vec<u8>),
}

impl fmt::Debug for BuilderEntryKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use BuilderEntryKind::*;
        match self {
            File(p) => write!(f, "BuilderEntryKind::File({:?})", p),
            Reader(_) => write!(f, "BuilderEntryKind::Reader(_)"),
            Bytes(b) => write!(f, "BuilderEntryKind::Bytes({} bytes)", b.len()),
        }
    }
}

impl fmt::Debug for BuilderEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("BuilderEntry")
            .field("name", &String::from_utf8_lossy(&self.name))
            .field("kind", &self.kind)
            .finish()
    }
}

/// Builder pattern for constructing BootFS images. Holds a list of entries
/// and consumes itself to write an image.
///
/// Entries are packed in the order they were added. Names are stored as
/// given; duplicates are allowed and loaders resolve the first one.
///
/// # Example
/// ```
/// use bootfs::ImageBuilder;
/// use bootfs_core::Image;
///
/// let mut builder = ImageBuilder::new();
/// builder
///     .bytes(b"#!/bin/sh\necho hi\n".to_vec(), "init")
///     .file_reader(&b"console=ttyS0"[..], "cmdline");
///
/// let mut image = Vec::new();
/// let size = builder.write_image(&mut image).unwrap();
/// assert_eq!(size, 3 * 4096);
///
/// let image = Image::parse(&image).unwrap();
/// assert_eq!(image.open(b"cmdline"), Some(&b"console=ttyS0"[..]));
/// ```
#[derive(Debug, Default)]
pub struct ImageBuilder {
    entries: Vec<BuilderEntry>,
}

impl ImageBuilder {
    pub fn new() -> ImageBuilder {
        ImageBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a regular file to this builder. `source` is the position of the
    /// file on the build system, `name` the name stored in the image.
    pub fn file(&mut self, source: impl AsRef<Path>, name: impl AsRef<[u8]>) -> &mut ImageBuilder {
        self.entries.push(BuilderEntry::new(
            name,
            BuilderEntryKind::File(source.as_ref().to_path_buf()),
        ));
        self
    }

    /// Add a file to this builder. `source` is a Reader to read the entry's
    /// data from; it is read fully before the image is planned.
    pub fn file_reader(&mut self, source: impl Read + 'static, name: impl AsRef<[u8]>) -> &mut ImageBuilder {
        self.entries
            .push(BuilderEntry::new(name, BuilderEntryKind::Reader(Box::new(source))));
        self
    }

    /// Add a file whose contents are already in memory
    pub fn bytes(&mut self, data: Vec<u8>, name: impl AsRef<[u8]>) -> &mut ImageBuilder {
        self.entries
            .push(BuilderEntry::new(name, BuilderEntryKind::Bytes(data)));
        self
    }

    /// Walk a directory and add every regular file in it, named by its path
    /// relative to `dir`. Each directory's children are visited in name
    /// order so the same tree always produces the same image.
    pub fn dir(&mut self, dir: impl AsRef<Path>) -> Result<&mut ImageBuilder, Error> {
        let dir = dir.as_ref();
        self.add_dir_entries(dir, dir)?;
        Ok(self)
    }

    /// Recursive helper to walk directory and yield `BuilderEntry` to
    /// `self.entries`
    fn add_dir_entries(&mut self, base: &Path, current: &Path) -> Result<(), Error> {
        let mut read_dir = Vec::new();
        for entry_res in fs::read_dir(current).map_err(wrap_io_err!(current, "Reading directory"))? {
            read_dir.push(entry_res.map_err(wrap_io_err!(current, "Reading directory entry"))?);
        }
        read_dir.sort_by_key(|entry| entry.file_name());

        for entry in read_dir {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .map_err(wrap_io_err!(path, "Reading file type"))?;

            if file_type.is_dir() {
                self.add_dir_entries(base, &path)?;
                continue;
            }

            // Symlinks count when they resolve to a regular file
            let is_file = file_type.is_file()
                || (file_type.is_symlink()
                    && fs::metadata(&path)
                        .map_err(wrap_io_err!(path, "Following symlink"))?
                        .is_file());
            if !is_file {
                debug!("skipping {}: not a regular file", path.display());
                continue;
            }

            let relative = path.strip_prefix(base).map_err(|_| Error::InvalidPath {
                entry: path.clone(),
                component: base.to_path_buf(),
            })?;
            let name = relative.as_os_str().as_bytes().to_vec();
            self.entries
                .push(BuilderEntry::new(name, BuilderEntryKind::File(path)));
        }
        Ok(())
    }

    /// Resolve every entry to a source of known length, reading readers
    /// into memory since their length is unknown otherwise.
    fn measure(self) -> Result<Vec<MeasuredEntry>, Error> {
        let mut measured = Vec::with_capacity(self.entries.len());
        for entry in self.entries {
            let BuilderEntry { name, kind } = entry;
            let (payload, len) = match kind {
                BuilderEntryKind::File(source) => {
                    let len = fs::metadata(&source)
                        .map_err(wrap_io_err!(source, "Reading metadata"))?
                        .len();
                    (Payload::File(source), len)
                }
                BuilderEntryKind::Reader(mut reader) => {
                    let mut data = Vec::new();
                    reader
                        .read_to_end(&mut data)
                        .map_err(wrap_io_err!(display_name(&name), "Reading entry"))?;
                    let len = data.len() as u64;
                    (Payload::Bytes(data), len)
                }
                BuilderEntryKind::Bytes(data) => {
                    let len = data.len() as u64;
                    (Payload::Bytes(data), len)
                }
            };
            measured.push(MeasuredEntry { name, payload, len });
        }
        Ok(measured)
    }

    /// Consume this `ImageBuilder`, writing the image to `w`. Returns the
    /// length of the image.
    ///
    /// Offsets are planned before anything is written, so an
    /// unrepresentable input is rejected without output. A source file
    /// that changes length while being copied is reported as
    /// [`Error::LengthMismatch`] after its bytes have been written.
    pub fn write_image<W: Write>(self, w: &mut W) -> Result<u64, Error> {
        let entries = self.measure()?;
        let layout = Layout::plan(entries.iter().map(|entry| (entry.name.as_slice(), entry.len)))?;
        let directory = layout.encode_directory(entries.iter().map(|e| e.name.as_slice()))?;
        debug!(
            "planned {} entries: directory {} bytes, data at {:#x}, image {} bytes",
            entries.len(),
            layout.dir_size(),
            layout.data_start(),
            layout.image_size()
        );

        w.write_all(layout.header().as_bytes())
            .map_err(wrap_io_err!("Writing header"))?;
        w.write_all(&directory)
            .map_err(wrap_io_err!("Writing directory"))?;
        write_zeros(&mut *w, layout.dir_padding()).map_err(wrap_io_err!("Padding directory"))?;

        let mut buf = vec![0; READ_WRITE_BUF_SIZE];
        for (entry, placement) in entries.iter().zip(layout.placements()) {
            let name = display_name(&entry.name);
            debug!(
                "{} at {:#x}, {} bytes",
                name.display(),
                placement.offset,
                placement.size
            );
            let expected = u64::from(placement.size);

            let written = match &entry.payload {
                Payload::File(source) => {
                    let file = File::open(source).map_err(wrap_io_err!(source, "Opening file"))?;
                    // One byte more than planned is enough to notice growth
                    copy_counted(file.take(expected + 1), &mut *w, &mut buf)
                        .map_err(wrap_io_err!(source, "Copying file"))?
                }
                Payload::Bytes(data) => {
                    w.write_all(data)
                        .map_err(wrap_io_err!(name, "Writing entry"))?;
                    data.len() as u64
                }
            };
            if written != expected {
                return Err(Error::LengthMismatch {
                    entry: name,
                    actual: written,
                    expected,
                });
            }

            write_zeros(&mut *w, placement.padded - expected)
                .map_err(wrap_io_err!(name, "Padding entry"))?;
        }

        Ok(layout.image_size())
    }

    /// Consume this `ImageBuilder`, writing the image to a new file at `path`
    pub fn write_file(self, path: impl AsRef<Path>) -> Result<u64, Error> {
        let path = path.as_ref();
        let file = File::create(path).map_err(wrap_io_err!(path, "Creating image"))?;
        let mut writer = BufWriter::new(file);
        let size = self.write_image(&mut writer)?;
        writer.flush().map_err(wrap_io_err!(path, "Writing image"))?;
        Ok(size)
    }
}
