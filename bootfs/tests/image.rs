use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use bootfs::{create, dump, extract, list, parse_input, ImageFile};
use bootfs_core::{Image, ImageSrc, MAGIC};

struct TestDir {
    tmpdir: tempfile::TempDir,
}

impl TestDir {
    fn new() -> std::io::Result<TestDir> {
        Ok(TestDir {
            tmpdir: tempfile::tempdir()?,
        })
    }

    fn file(&self, path: impl AsRef<Path>) -> PathBuf {
        self.tmpdir.path().join(path)
    }

    fn write(&self, path: impl AsRef<Path>, data: &[u8]) -> std::io::Result<PathBuf> {
        let path = self.file(path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, data)?;
        Ok(path)
    }
}

#[test]
fn parse_inputs() -> Result<(), Box<dyn Error>> {
    let (path, name) = parse_input("build/init:sbin/init")?;
    assert_eq!(path, PathBuf::from("build/init"));
    assert_eq!(name, "sbin/init");

    // Only the first colon separates
    let (path, name) = parse_input("a:b:c")?;
    assert_eq!(path, PathBuf::from("a"));
    assert_eq!(name, "b:c");

    assert!(parse_input("no-colon").is_err());
    Ok(())
}

#[test]
fn create_list_extract() -> Result<(), Box<dyn Error>> {
    let tmp = TestDir::new()?;
    let hello = tmp.write("src/hello.txt", b"hello")?;
    let big = tmp.write("src/big.bin", &vec![0x55; 4097])?;

    let inputs = vec![
        (hello, "hello.txt".to_string()),
        (big, "data/big.bin".to_string()),
    ];
    let size = create(tmp.file("boot.img"), &inputs, None)?;
    assert_eq!(size, 4096 + 4096 + 8192);

    let data = fs::read(tmp.file("boot.img"))?;
    assert_eq!(data.len() as u64, size);
    assert_eq!(&data[..4], &MAGIC.to_le_bytes());
    assert_eq!(&data[4096..4101], b"hello");
    assert!(!tmp.file(".bootfs.boot.img").exists());

    let mut out = Vec::new();
    let entries = list(tmp.file("boot.img"), &mut out)?;
    assert_eq!(entries.len(), 2);
    let out = String::from_utf8(out)?;
    assert_eq!(
        out,
        "      4096          5 hello.txt\n      8192       4097 data/big.bin\n"
    );

    let count = extract(tmp.file("boot.img"), tmp.file("out"))?;
    assert_eq!(count, 2);
    assert_eq!(fs::read(tmp.file("out/hello.txt"))?, b"hello");
    assert_eq!(fs::read(tmp.file("out/data/big.bin"))?, vec![0x55; 4097]);
    Ok(())
}

#[test]
fn create_from_dir_round_trips() -> Result<(), Box<dyn Error>> {
    let tmp = TestDir::new()?;
    tmp.write("root/init", b"#!/bin/sh\n")?;
    tmp.write("root/lib/modules/virtio.ko", &[1, 2, 3])?;

    create(tmp.file("root.img"), &[], Some(&tmp.file("root")))?;
    extract(tmp.file("root.img"), tmp.file("copy"))?;

    assert_eq!(fs::read(tmp.file("copy/init"))?, b"#!/bin/sh\n");
    assert_eq!(fs::read(tmp.file("copy/lib/modules/virtio.ko"))?, vec![1, 2, 3]);

    // Same tree, same bytes
    create(tmp.file("again.img"), &[], Some(&tmp.file("root")))?;
    assert_eq!(fs::read(tmp.file("root.img"))?, fs::read(tmp.file("again.img"))?);
    Ok(())
}

#[test]
fn failed_create_leaves_nothing() -> Result<(), Box<dyn Error>> {
    let tmp = TestDir::new()?;
    let inputs = vec![(tmp.file("missing"), "missing".to_string())];

    assert!(create(tmp.file("boot.img"), &inputs, None).is_err());
    assert!(!tmp.file("boot.img").exists());
    assert!(!tmp.file(".bootfs.boot.img").exists());
    Ok(())
}

#[test]
fn image_file_reads_entries() -> Result<(), Box<dyn Error>> {
    let tmp = TestDir::new()?;
    let cmdline = tmp.write("cmdline", b"console=ttyS0 quiet")?;
    create(tmp.file("boot.img"), &[(cmdline, "cmdline".to_string())], None)?;

    let mut image = ImageFile::new(tmp.file("boot.img"))?;
    assert_eq!(image.header().magic(), MAGIC);
    assert_eq!(image.header().dir_size(), 20);

    let entries = image.read_directory()?;
    let mut buf = [0; 7];
    let count = image.read_entry(&entries[0], 8, &mut buf)?;
    assert_eq!(&buf[..count], b"ttyS0 q");

    let mut copy = Vec::new();
    assert_eq!(image.copy_entry(&entries[0], &mut copy)?, 19);
    assert_eq!(copy, b"console=ttyS0 quiet");
    Ok(())
}

#[test]
fn image_file_rejects_garbage() -> Result<(), Box<dyn Error>> {
    let tmp = TestDir::new()?;
    tmp.write("not-an-image", b"definitely not a bootfs image")?;
    tmp.write("short", b"\xf9\x3f")?;

    assert!(matches!(
        ImageFile::new(tmp.file("not-an-image")),
        Err(bootfs::Error::Core(bootfs_core::Error::InvalidMagic(_)))
    ));
    assert!(ImageFile::new(tmp.file("short")).is_err());
    Ok(())
}

#[test]
fn image_file_bounds_directory_by_file_length() -> Result<(), Box<dyn Error>> {
    let tmp = TestDir::new()?;
    let mut data = Vec::new();
    data.extend_from_slice(&MAGIC.to_le_bytes());
    data.extend_from_slice(&u32::MAX.to_le_bytes());
    data.extend_from_slice(&[0; 8]);
    tmp.write("huge-dir.img", &data)?;

    let mut image = ImageFile::new(tmp.file("huge-dir.img"))?;
    assert!(matches!(
        image.read_directory(),
        Err(bootfs::Error::Core(bootfs_core::Error::InvalidData))
    ));
    assert!(list(tmp.file("huge-dir.img"), &mut Vec::<u8>::new()).is_err());
    Ok(())
}

#[test]
fn truncated_image_is_a_length_mismatch() -> Result<(), Box<dyn Error>> {
    let tmp = TestDir::new()?;
    let kernel = tmp.write("kernel", &[0xAB; 100])?;
    create(tmp.file("boot.img"), &[(kernel, "kernel".to_string())], None)?;

    // Cut the image in the middle of the entry data
    let mut data = fs::read(tmp.file("boot.img"))?;
    data.truncate(4096 + 40);
    fs::write(tmp.file("boot.img"), &data)?;

    let mut image = ImageFile::new(tmp.file("boot.img"))?;
    let entries = image.read_directory()?;
    let mut copy = Vec::new();
    match image.copy_entry(&entries[0], &mut copy) {
        Err(bootfs::Error::LengthMismatch { entry, actual, expected }) => {
            assert_eq!(entry, PathBuf::from("kernel"));
            assert_eq!(actual, 40);
            assert_eq!(expected, 100);
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(copy, vec![0xAB; 40]);
    Ok(())
}

#[test]
fn extract_refuses_escaping_names() -> Result<(), Box<dyn Error>> {
    let tmp = TestDir::new()?;
    let mut builder = bootfs::ImageBuilder::new();
    builder
        .bytes(b"ok".to_vec(), "fine")
        .bytes(b"evil".to_vec(), "../escape");
    builder.write_file(tmp.file("evil.img"))?;

    assert!(matches!(
        extract(tmp.file("evil.img"), tmp.file("out")),
        Err(bootfs::Error::InvalidPath { .. })
    ));
    assert!(!tmp.file("out/fine").exists());
    assert!(!tmp.file("escape").exists());
    Ok(())
}

#[test]
fn dump_format() -> Result<(), Box<dyn Error>> {
    let tmp = TestDir::new()?;
    let hello = tmp.write("hello.txt", b"hello")?;
    create(tmp.file("boot.img"), &[(hello, "hello.txt".to_string())], None)?;

    let mut out = Vec::new();
    dump(tmp.file("boot.img"), &mut out)?;
    let out = String::from_utf8(out)?;
    assert_eq!(
        out,
        "BootFS Image:\n\
         Magic: 0xa56d3ff9\n\
         Directory Length: 24 bytes\n\
         Files:\n\
         File: hello.txt, Size: 5 bytes, Offset: 4096\n\
         00000000  68 65 6c 6c 6f                                   |hello|\n\
         \n"
    );

    let data = fs::read(tmp.file("boot.img"))?;
    assert_eq!(Image::parse(&data)?.open(b"hello.txt"), Some(&b"hello"[..]));
    Ok(())
}
