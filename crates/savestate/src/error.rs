use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StateError>;

/// Failures recorded by a [`crate::StateWrapper`] session or reported by the header drivers.
///
/// The wrapper itself never returns these from individual `do_*` calls. The first failure of a
/// session is kept as the sticky error and surfaced by [`crate::StateWrapper::finish`], so load
/// and save routines can be written straight-line and checked once at the end.
///
/// [`StateError::Stream`] stores only the [`io::ErrorKind`] so the error stays `Clone + Eq`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("stream i/o failed: {0}")]
    Stream(io::ErrorKind),

    #[error("length {len} exceeds limit of {limit}")]
    LengthLimit { len: u64, limit: u64 },

    #[error("out of memory allocating {len} elements")]
    OutOfMemory { len: usize },

    #[error("invalid {name} discriminant {value}")]
    InvalidEnum { name: &'static str, value: String },

    #[error("marker mismatch at offset {offset}: found '{found}' expected '{expected}'")]
    MarkerMismatch {
        offset: u64,
        found: String,
        expected: String,
    },

    /// Set by calling code through [`crate::StateWrapper::set_error`].
    #[error("invalid state: {0}")]
    Invalid(&'static str),

    #[error("invalid save state magic")]
    InvalidMagic,

    #[error("unsupported save state version {found} (supported {minimum}..={current})")]
    UnsupportedVersion {
        found: u32,
        minimum: u32,
        current: u32,
    },
}

impl From<io::Error> for StateError {
    fn from(err: io::Error) -> Self {
        StateError::Stream(err.kind())
    }
}

impl StateError {
    /// Whether this is the core's single I/O failure kind (short read, short write or EOF).
    pub fn is_stream(&self) -> bool {
        matches!(self, StateError::Stream(_))
    }
}
