use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use bootfs_core::{DirEntry, ImageSrc};
use log::info;

use crate::dump::format_print_image;
use crate::ext::DirEntryExt;
use crate::{wrap_io_err, Error, ImageBuilder, ImageFile};

/// Parse a `PATH:NAME` input, splitting at the first `:`
pub fn parse_input(input: &str) -> Result<(PathBuf, String), Error> {
    let (path, name) = input
        .split_once(':')
        .ok_or_else(|| Error::InvalidInput(input.to_string()))?;
    Ok((PathBuf::from(path), name.to_string()))
}

/// Temporary sibling of `target`, renamed over it once the image is complete
fn temp_path(target: &Path) -> Result<PathBuf, Error> {
    let file_name = target.file_name().ok_or_else(|| Error::InvalidPath {
        entry: target.to_path_buf(),
        component: target.to_path_buf(),
    })?;
    let tmp_name = format!(".bootfs.{}", Path::new(file_name).display());
    Ok(target.with_file_name(tmp_name))
}

/// Create an image at `image_path` from `(source, name)` inputs, or from
/// every file under `folder` when it is given. Returns the image length.
///
/// The image is written to a temporary file first, so a failed build
/// never leaves a partial image at `image_path`.
pub fn create(
    image_path: impl AsRef<Path>,
    inputs: &[(PathBuf, String)],
    folder: Option<&Path>,
) -> Result<u64, Error> {
    let image_path = image_path.as_ref();

    let mut builder = ImageBuilder::new();
    match folder {
        Some(folder) => {
            builder.dir(folder)?;
        }
        None => {
            for (source, name) in inputs {
                builder.file(source, name);
            }
        }
    }
    let count = builder.len();

    let tmp_path = temp_path(image_path)?;
    let result = builder
        .write_file(&tmp_path)
        .and_then(|size| {
            fs::rename(&tmp_path, image_path)
                .map_err(wrap_io_err!(image_path, "Renaming image"))?;
            Ok(size)
        });

    match result {
        Ok(size) => {
            info!("wrote {} ({} entries, {} bytes)", image_path.display(), count, size);
            Ok(size)
        }
        Err(err) => {
            // Best effort; the build error is the one worth reporting
            let _ = fs::remove_file(&tmp_path);
            Err(err)
        }
    }
}

/// Write one line per entry: offset, size and name
pub fn list(image_path: impl AsRef<Path>, out: &mut impl Write) -> Result<Vec<DirEntry>, Error> {
    let mut image = ImageFile::new(image_path)?;
    let entries = image.read_directory()?;
    for entry in &entries {
        writeln!(
            out,
            "{:>10} {:>10} {}",
            entry.offset,
            entry.size,
            String::from_utf8_lossy(entry.name())
        )
        .map_err(wrap_io_err!("Writing listing"))?;
    }
    Ok(entries)
}

pub fn dump(image_path: impl AsRef<Path>, out: &mut impl Write) -> Result<(), Error> {
    let image_path = image_path.as_ref();
    let data = fs::read(image_path).map_err(wrap_io_err!(image_path, "Reading image"))?;
    format_print_image(&data, out)
}

/// Unpack every entry of the image under `base_dir`. Later entries with a
/// duplicate name overwrite earlier ones. Returns the number of files written.
pub fn extract(image_path: impl AsRef<Path>, base_dir: impl AsRef<Path>) -> Result<usize, Error> {
    let base_dir = base_dir.as_ref();
    let mut image = ImageFile::new(image_path)?;
    let entries = image.read_directory()?;

    // Check every name before touching the file system
    for entry in &entries {
        entry.check_path()?;
    }

    for entry in &entries {
        let target_path = base_dir.join(entry.check_path()?);
        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent).map_err(wrap_io_err!(parent, "Creating directory"))?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&target_path)
            .map_err(wrap_io_err!(target_path, "Creating file"))?;
        let mut writer = BufWriter::new(file);
        image.copy_entry(entry, &mut writer)?;
        writer
            .flush()
            .map_err(wrap_io_err!(target_path, "Writing file"))?;
    }

    info!("extracted {} entries to {}", entries.len(), base_dir.display());
    Ok(entries.len())
}
