mod bin;
mod builder;
pub mod dump;
mod error;
pub mod ext;
mod image;

pub use bin::*;
pub use builder::ImageBuilder;
pub use error::Error;
pub use image::ImageFile;

const READ_WRITE_BUF_SIZE: usize = 4 * 1024 * 1024;
