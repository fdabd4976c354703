//! Versioned, bidirectional binary save-state serialization.
//!
//! A [`StateWrapper`] is a mode-tagged cursor over a borrowed [`ByteStream`]. Components write a
//! single `do_state` routine that saves in [`Mode::Write`] and restores in [`Mode::Read`]:
//!
//! ```
//! use savestate::{Mode, MemoryStream, StateWrapper, VersionedField};
//!
//! #[derive(Default)]
//! struct Timer {
//!     counter: u32,
//!     enabled: bool,
//!     label: String,
//!     divider: u16,
//! }
//!
//! const DIVIDER: VersionedField<u16> = VersionedField::new(3, 1);
//!
//! impl Timer {
//!     fn do_state(&mut self, sw: &mut StateWrapper<'_>) -> bool {
//!         sw.do_value(&mut self.counter);
//!         sw.do_bool(&mut self.enabled);
//!         sw.do_string(&mut self.label);
//!         sw.do_field(&mut self.divider, &DIVIDER);
//!         sw.do_marker("TIMR") && !sw.has_error()
//!     }
//! }
//!
//! let mut stream = MemoryStream::new();
//! let mut timer = Timer { counter: 42, enabled: true, label: "pit".into(), divider: 4 };
//! assert!(timer.do_state(&mut StateWrapper::new(&mut stream, Mode::Write, 3)));
//!
//! stream.rewind();
//! let mut restored = Timer::default();
//! assert!(restored.do_state(&mut StateWrapper::new(&mut stream, Mode::Read, 3)));
//! assert_eq!(restored.counter, 42);
//! assert_eq!(restored.divider, 4);
//! ```
//!
//! Wire layout is host-native: booleans are one byte, scalars are `size_of::<T>()` bytes with no
//! byte-order conversion, strings and markers carry a `u32` length prefix. Fields introduced in
//! a later format version are absent from older streams.

mod error;
mod field;
mod header;
mod options;
mod stream;
mod value;
mod wrapper;

pub use crate::error::{Result, StateError};
pub use crate::field::VersionedField;
pub use crate::header::{
    load_state, read_header, save_state, DoState, FormatVersion, SAVE_STATE_MAGIC,
};
pub use crate::options::StateOptions;
pub use crate::stream::{ByteStream, IoStream, MemoryStream, SliceStream};
pub use crate::value::{StateEnum, StateValue};
pub use crate::wrapper::{Mode, SmallString, StateWrapper, SMALL_STRING_CAPACITY};

pub use arrayvec::ArrayString;
