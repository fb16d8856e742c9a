use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::PathBuf;

#[derive(thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] bootfs_core::Error),
    #[error("{context}{}", fmt_path(.path))]
    Io {
        #[source]
        source: io::Error,
        path: Option<PathBuf>,
        context: &'static str,
    },
    #[error("Invalid input '{0}': expected PATH:NAME")]
    InvalidInput(String),
    #[error("Invalid path component '{}' in entry '{}'", .component.display(), .entry.display())]
    InvalidPath { entry: PathBuf, component: PathBuf },
    #[error("Entry '{}' size mismatch: expected {expected}, got {actual}", .entry.display())]
    LengthMismatch {
        entry: PathBuf,
        actual: u64,
        expected: u64,
    },
}

fn fmt_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" '{}'", path.display()),
        None => String::new(),
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{self}")?;

        let mut source = self.source();
        while let Some(err) = source {
            writeln!(f, "\tCaused by: {err}")?;
            source = err.source();
        }

        Ok(())
    }
}

/// Build a closure mapping an `io::Error` into [`Error::Io`], with an
/// optional path for context.
#[macro_export]
macro_rules! wrap_io_err {
    ($path:expr, $context:expr) => {
        |source| $crate::Error::Io {
            source,
            path: Some(::std::path::PathBuf::from(&$path)),
            context: $context,
        }
    };
    ($context:expr) => {
        |source| $crate::Error::Io {
            source,
            path: None,
            context: $context,
        }
    };
}
