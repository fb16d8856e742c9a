#![no_main]
use libfuzzer_sys::fuzz_target;

use bootfs_core::{Image, ImageSrc};

fuzz_target!(|data: &[u8]| {
    if let Ok(image) = Image::parse(data) {
        // Everything parse accepted must be readable without going out of bounds
        for dirent in image.entries().unwrap() {
            let dirent = dirent.unwrap();
            assert!(image.data(&dirent).is_some());
        }
    }

    let mut src = data;
    if let Ok(entries) = src.read_directory() {
        let mut buf = [0; 64];
        for entry in &entries {
            let _ = src.read_entry(entry, 0, &mut buf);
        }
    }
});
