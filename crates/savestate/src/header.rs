//! Save-state container: an 8-byte magic and a `u32` format version, followed by the payload
//! produced by a [`DoState`] implementation.
//!
//! The header goes through the same [`StateWrapper`] machinery as the payload, so it shares the
//! host-native layout.

use std::ops::RangeInclusive;

use crate::error::{Result, StateError};
use crate::stream::ByteStream;
use crate::wrapper::{Mode, StateWrapper};

pub const SAVE_STATE_MAGIC: &[u8; 8] = b"SAVSTATE";

/// Versions a reader accepts. Writers always emit `current`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatVersion {
    pub current: u32,
    pub minimum: u32,
}

impl FormatVersion {
    pub const fn new(current: u32, minimum: u32) -> Self {
        Self { current, minimum }
    }

    pub fn supported(&self) -> RangeInclusive<u32> {
        self.minimum..=self.current
    }

    pub fn check(&self, found: u32) -> Result<()> {
        if self.supported().contains(&found) {
            Ok(())
        } else {
            Err(StateError::UnsupportedVersion {
                found,
                minimum: self.minimum,
                current: self.current,
            })
        }
    }
}

/// Component state that is saved and restored through one symmetric routine.
pub trait DoState {
    fn do_state(&mut self, sw: &mut StateWrapper<'_>) -> Result<()>;
}

fn do_header(sw: &mut StateWrapper<'_>) -> Result<u32> {
    let mut magic = *SAVE_STATE_MAGIC;
    sw.do_bytes(&mut magic);
    let mut version = sw.version();
    sw.do_pod(&mut version);
    if let Some(err) = sw.error() {
        return Err(err.clone());
    }
    if &magic != SAVE_STATE_MAGIC {
        return Err(StateError::InvalidMagic);
    }
    Ok(version)
}

/// Writes the header at `format.current`, then `state`.
pub fn save_state<S: DoState + ?Sized>(
    stream: &mut dyn ByteStream,
    format: FormatVersion,
    state: &mut S,
) -> Result<()> {
    let mut sw = StateWrapper::new(stream, Mode::Write, format.current);
    do_header(&mut sw)?;
    state.do_state(&mut sw)?;
    sw.finish()
}

/// Reads only the header and returns the stored format version.
pub fn read_header(stream: &mut dyn ByteStream) -> Result<u32> {
    let mut sw = StateWrapper::new(stream, Mode::Read, 0);
    do_header(&mut sw)
}

/// Validates the header against `format`, then restores `state` at the stored version.
///
/// Returns the version the state was written with.
pub fn load_state<S: DoState + ?Sized>(
    stream: &mut dyn ByteStream,
    format: FormatVersion,
    state: &mut S,
) -> Result<u32> {
    let version = read_header(stream)?;
    format.check(version)?;

    let mut sw = StateWrapper::new(stream, Mode::Read, version);
    state.do_state(&mut sw)?;
    sw.finish()?;

    tracing::debug!(version, "restored save state");
    Ok(version)
}
