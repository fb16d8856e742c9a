//! Format-print a BootFS image; Useful for debugging images a loader rejects
use std::io::{self, Write};

use bootfs_core::{Dirent, Image};

use crate::{wrap_io_err, Error};

/// Canonical hexdump: offset, 16 bytes in hex, then the printable ASCII
pub fn hexdump(data: &[u8], out: &mut impl Write) -> io::Result<()> {
    for (line, chunk) in data.chunks(16).enumerate() {
        write!(out, "{:08x}  ", line * 16)?;
        for byte in chunk {
            write!(out, "{:02x} ", byte)?;
        }
        for _ in chunk.len()..16 {
            write!(out, "   ")?;
        }
        write!(out, " |")?;
        for &byte in chunk {
            let c = if (32..=126).contains(&byte) { byte as char } else { '.' };
            write!(out, "{}", c)?;
        }
        writeln!(out, "|")?;
    }
    Ok(())
}

fn write_entry(image: &Image<'_>, dirent: &Dirent<'_>, out: &mut impl Write) -> io::Result<()> {
    writeln!(
        out,
        "File: {}, Size: {} bytes, Offset: {}",
        String::from_utf8_lossy(dirent.name()),
        dirent.size(),
        dirent.offset()
    )?;
    hexdump(image.data(dirent).unwrap_or_default(), out)?;
    writeln!(out)
}

/// Write the header, then every file with its contents as a hexdump
pub fn format_print_image(image: &[u8], out: &mut impl Write) -> Result<(), Error> {
    let image = Image::parse(image)?;
    let header = image.header();

    writeln!(
        out,
        "BootFS Image:\nMagic: {:#010x}\nDirectory Length: {} bytes\nFiles:",
        header.magic(),
        header.dir_size()
    )
    .map_err(wrap_io_err!("Writing dump"))?;

    for dirent in image.entries()? {
        write_entry(&image, &dirent?, out).map_err(wrap_io_err!("Writing dump"))?;
    }
    Ok(())
}
