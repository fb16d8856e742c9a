use alloc::format;
use alloc::string::ToString;
use bytemuck::PodCastError;
use core::error;
use core::fmt::{Display, Formatter, Result};

#[derive(Debug)]
pub enum Error {
    /// Alignment argument was not a power of two
    InvalidAlignment(u64),
    /// Encoded name length (including the terminator) does not fit in a u32
    NameTooLong(usize),
    /// Content length does not fit in a u32
    ContentTooLong(u64),
    /// Name contains a NUL byte
    InvalidName,
    InvalidMagic(u32),
    InvalidData,
    Cast(PodCastError),
    Overflow,
    TryFromInt(core::num::TryFromIntError),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> Result {
        use Error::*;

        let msg = match self {
            InvalidAlignment(align) => format!("Invalid Alignment: {} is not a power of two", align),
            NameTooLong(len) => format!("Name Too Long: {} bytes", len),
            ContentTooLong(len) => format!("Content Too Long: {} bytes", len),
            InvalidName => "Name contains a NUL byte".to_string(),
            InvalidMagic(magic) => format!("Invalid Magic: {:#010x}", magic),
            InvalidData => "Data Invalid".to_string(),
            Cast(err) => format!("Cast: {:?}", err),
            Overflow => "Overflow".to_string(),
            TryFromInt(err) => format!("TryFromInt: {}", err),
        };
        write!(f, "{}", msg)
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::TryFromInt(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PodCastError> for Error {
    fn from(err: PodCastError) -> Error {
        Error::Cast(err)
    }
}

impl From<core::num::TryFromIntError> for Error {
    fn from(err: core::num::TryFromIntError) -> Error {
        Error::TryFromInt(err)
    }
}
