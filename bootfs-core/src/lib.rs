#![no_std]
extern crate alloc;

use core::mem;

pub use crate::align::align_up;
pub use crate::entry::{dirent_size, encode_dirent, DirEntry, Dirent, DirentHead, Directory, Entry};
pub use crate::error::Error;
pub use crate::header::Header;
pub use crate::image::{compose, Image};
pub use crate::layout::{Layout, Placement};
pub use crate::src::ImageSrc;

mod align;
mod entry;
mod error;
mod header;
mod image;
mod layout;
mod src;


/// Identifies a BootFS image
pub const MAGIC: u32 = 0xA56D3FF9;
/// Alignment of the data section and of every file's data
pub const BLOCK_SIZE: u64 = 4096;
/// Alignment of every directory record
pub const DIRENT_ALIGN: u64 = 4;
/// Longest name, terminator included, that C loaders reserve room for.
/// Not enforced by the format.
pub const NAME_MAX: usize = 256;

pub const HEADER_SIZE: usize = mem::size_of::<Header>();
pub const DIRENT_HEAD_SIZE: usize = mem::size_of::<DirentHead>();
