use arrayvec::ArrayString;
use bytemuck::Pod;

use crate::error::{Result, StateError};
use crate::field::VersionedField;
use crate::options::StateOptions;
use crate::stream::ByteStream;
use crate::value::{StateEnum, StateValue};

pub const SMALL_STRING_CAPACITY: usize = 256;

/// Inline string used for markers and other short identifiers.
pub type SmallString = ArrayString<SMALL_STRING_CAPACITY>;

/// Upper bound on how far a length-prefixed read grows its buffer ahead of the data.
const READ_CHUNK_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Read,
    Write,
}

/// Bidirectional save-state cursor over a borrowed [`ByteStream`].
///
/// The same `do_*` call sequence saves state in [`Mode::Write`] and restores it in
/// [`Mode::Read`]. Individual calls never return errors. The first failure is recorded and
/// poisons the rest of the session: later reads zero-fill their destination and later writes are
/// skipped. Check [`StateWrapper::has_error`] or call [`StateWrapper::finish`] once at the end.
///
/// The stream is never flushed or closed; the caller owns it.
pub struct StateWrapper<'a> {
    stream: &'a mut dyn ByteStream,
    mode: Mode,
    version: u32,
    options: StateOptions,
    error: Option<StateError>,
    mismatch: Option<StateError>,
}

impl<'a> StateWrapper<'a> {
    pub fn new(stream: &'a mut dyn ByteStream, mode: Mode, version: u32) -> Self {
        Self::with_options(stream, mode, version, StateOptions::default())
    }

    pub fn with_options(
        stream: &'a mut dyn ByteStream,
        mode: Mode,
        version: u32,
        options: StateOptions,
    ) -> Self {
        Self {
            stream,
            mode,
            version,
            options,
            error: None,
            mismatch: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_reading(&self) -> bool {
        self.mode == Mode::Read
    }

    pub fn is_writing(&self) -> bool {
        self.mode == Mode::Write
    }

    /// Format version of the data being read, or the version being written.
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn options(&self) -> &StateOptions {
        &self.options
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// First failure of this session, if any.
    pub fn error(&self) -> Option<&StateError> {
        self.error.as_ref()
    }

    /// Most recent failed [`StateWrapper::do_marker`] check. Does not poison the session.
    pub fn marker_mismatch(&self) -> Option<&StateError> {
        self.mismatch.as_ref()
    }

    /// Poisons the session, e.g. when restored data fails a semantic check.
    pub fn set_error(&mut self, reason: &'static str) {
        self.fail(StateError::Invalid(reason));
    }

    pub fn stream(&mut self) -> &mut dyn ByteStream {
        &mut *self.stream
    }

    pub fn position(&mut self) -> u64 {
        self.stream.position()
    }

    /// Ends the session, reporting the sticky failure first and then any marker mismatch.
    pub fn finish(self) -> Result<()> {
        match (self.error, self.mismatch) {
            (Some(err), _) | (None, Some(err)) => Err(err),
            (None, None) => Ok(()),
        }
    }

    pub(crate) fn fail(&mut self, err: StateError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    fn write_bytes(&mut self, data: &[u8]) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.stream.write(data) {
            self.fail(err.into());
        }
    }

    /// Transfers `data` verbatim.
    ///
    /// On read, the whole buffer is zero-filled if the session has already failed or if this read
    /// fails, so nothing after a truncated or desynced stream observes stale memory.
    pub fn do_bytes(&mut self, data: &mut [u8]) {
        match self.mode {
            Mode::Read => {
                if self.error.is_none() {
                    if let Err(err) = self.stream.read(data) {
                        self.fail(err.into());
                    }
                }
                if self.error.is_some() {
                    data.fill(0);
                }
            }
            Mode::Write => self.write_bytes(data),
        }
    }

    /// Like [`StateWrapper::do_bytes`], for a field introduced in `version_introduced`.
    ///
    /// Reading an older stream copies `default` into `data` and consumes nothing, since the field
    /// is absent from data written before it existed.
    ///
    /// # Panics
    ///
    /// If `default.len() != data.len()`.
    pub fn do_bytes_ex(&mut self, data: &mut [u8], version_introduced: u32, default: &[u8]) {
        if self.mode == Mode::Read && self.version < version_introduced {
            data.copy_from_slice(default);
            return;
        }
        self.do_bytes(data);
    }

    /// Booleans are always one byte on the wire, `0` or `1`. Any nonzero byte reads as `true`.
    pub fn do_bool(&mut self, value: &mut bool) {
        match self.mode {
            Mode::Read => {
                let mut byte = 0u8;
                if self.error.is_none() {
                    match self.stream.read_byte() {
                        Ok(b) => byte = b,
                        Err(err) => self.fail(err.into()),
                    }
                }
                *value = byte != 0;
            }
            Mode::Write => {
                if self.error.is_some() {
                    return;
                }
                if let Err(err) = self.stream.write_byte(u8::from(*value)) {
                    self.fail(err.into());
                }
            }
        }
    }

    /// Transfers the host-native bytes of a plain-old-data value.
    pub fn do_pod<T: Pod>(&mut self, value: &mut T) {
        self.do_bytes(bytemuck::bytes_of_mut(value));
    }

    pub fn do_pod_slice<T: Pod>(&mut self, values: &mut [T]) {
        self.do_bytes(bytemuck::cast_slice_mut(values));
    }

    /// Length-prefixed POD vector transferred as one contiguous byte run.
    pub fn do_pod_vec<T: Pod>(&mut self, values: &mut Vec<T>) {
        let len = self.do_collection_len(values.len());
        match self.mode {
            Mode::Read => self.read_vec_chunked(
                values,
                len,
                <T as bytemuck::Zeroable>::zeroed,
                |sw, chunk| sw.do_pod_slice(chunk),
            ),
            Mode::Write => self.do_pod_slice(values.as_mut_slice()),
        }
    }

    /// Transfers a `u32` length prefix.
    ///
    /// On write, returns `len` (failing the session if it does not fit in `u32`). On read, returns
    /// the stored length, or 0 if it exceeds `limit` or the session has failed.
    fn do_len(&mut self, len: usize, limit: u32) -> usize {
        let mut prefix = match self.mode {
            Mode::Write => match u32::try_from(len) {
                Ok(prefix) => prefix,
                Err(_) => {
                    self.fail(StateError::LengthLimit {
                        len: len as u64,
                        limit: u64::from(u32::MAX),
                    });
                    return 0;
                }
            },
            Mode::Read => 0,
        };
        self.do_pod(&mut prefix);
        if self.is_reading() && prefix > limit {
            self.fail(StateError::LengthLimit {
                len: u64::from(prefix),
                limit: u64::from(limit),
            });
            return 0;
        }
        prefix as usize
    }

    pub(crate) fn do_collection_len(&mut self, len: usize) -> usize {
        self.do_len(len, self.options.max_collection_len)
    }

    /// Replaces `values` with `len` elements read by `read_chunk`.
    ///
    /// The vector grows at most `READ_CHUNK_BYTES` at a time and reading stops at the first
    /// failure, so a corrupt length prefix on a short stream costs one chunk, not `len` elements.
    /// On failure `values` is left empty.
    pub(crate) fn read_vec_chunked<T>(
        &mut self,
        values: &mut Vec<T>,
        len: usize,
        mut fill: impl FnMut() -> T,
        mut read_chunk: impl FnMut(&mut Self, &mut [T]),
    ) {
        values.clear();
        let chunk_len = (READ_CHUNK_BYTES / std::mem::size_of::<T>().max(1)).max(1);
        while values.len() < len && self.error.is_none() {
            let start = values.len();
            let end = start + chunk_len.min(len - start);
            if values.try_reserve(end - start).is_err() {
                self.fail(StateError::OutOfMemory { len });
                break;
            }
            values.resize_with(end, &mut fill);
            read_chunk(self, &mut values[start..end]);
        }
        if self.error.is_some() {
            values.clear();
        }
    }

    /// Reads and discards `len` bytes in fixed-size chunks.
    fn skip_bytes(&mut self, mut len: usize) {
        let mut scratch = [0u8; 64];
        while len > 0 && self.error.is_none() {
            let chunk = len.min(scratch.len());
            self.do_bytes(&mut scratch[..chunk]);
            len -= chunk;
        }
    }

    /// Transfers a `u32` length prefix followed by the UTF-8 bytes.
    ///
    /// NOTE: on read the value is cut at the first NUL byte, so a string that legitimately
    /// contains `'\0'` comes back shortened. Existing save data depends on this behavior. Use
    /// [`StateWrapper::do_pod_vec`] on a `Vec<u8>` for byte strings that may contain NUL; it has
    /// the same wire layout.
    pub fn do_string(&mut self, value: &mut String) {
        match self.mode {
            Mode::Write => {
                self.do_len(value.len(), u32::MAX);
                self.write_bytes(value.as_bytes());
            }
            Mode::Read => {
                let len = self.do_len(0, self.options.max_string_len);
                let mut bytes = std::mem::take(value).into_bytes();
                self.read_vec_chunked(&mut bytes, len, u8::default, |sw, chunk| {
                    sw.do_bytes(chunk)
                });
                if let Some(nul) = bytes.iter().position(|&b| b == 0) {
                    bytes.truncate(nul);
                }
                *value = match String::from_utf8(bytes) {
                    Ok(s) => s,
                    Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
                };
            }
        }
    }

    /// Same wire layout as [`StateWrapper::do_string`], without NUL truncation.
    ///
    /// On read the full payload is always consumed, so the stream stays aligned. A payload longer
    /// than `CAP` bytes is lossy: the value keeps only the longest valid UTF-8 prefix that fits.
    /// The truncation is logged as a warning and does not fail the session.
    pub fn do_small_string<const CAP: usize>(&mut self, value: &mut ArrayString<CAP>) {
        match self.mode {
            Mode::Write => {
                self.do_len(value.len(), u32::MAX);
                self.write_bytes(value.as_bytes());
            }
            Mode::Read => {
                let len = self.do_len(0, self.options.max_string_len);
                let mut buf = [0u8; CAP];
                let kept = len.min(CAP);
                self.do_bytes(&mut buf[..kept]);
                if len > kept && self.error.is_none() {
                    tracing::warn!(len, capacity = CAP, "truncating oversized small string");
                }
                self.skip_bytes(len - kept);

                let bytes = &buf[..kept];
                let valid = match std::str::from_utf8(bytes) {
                    Ok(_) => bytes.len(),
                    Err(err) => err.valid_up_to(),
                };
                let text = std::str::from_utf8(&bytes[..valid]).unwrap_or_default();
                value.clear();
                value.push_str(text);
            }
        }
    }

    /// Writes a borrowed string with the [`StateWrapper::do_string`] layout.
    ///
    /// # Panics
    ///
    /// In [`Mode::Read`]: there is nowhere to store the value.
    pub fn do_str(&mut self, value: &str) {
        assert!(
            self.is_writing(),
            "StateWrapper::do_str is only valid in write mode"
        );
        self.do_len(value.len(), u32::MAX);
        self.write_bytes(value.as_bytes());
    }

    /// Writes `marker`, or reads a small string and checks it equals `marker`.
    ///
    /// Returns `false` if the session has already failed. A mismatch is logged with the stream
    /// offset and recorded as [`StateWrapper::marker_mismatch`], but does not poison the session.
    ///
    /// # Panics
    ///
    /// If `marker` is longer than [`SMALL_STRING_CAPACITY`] bytes, since it could never be read
    /// back intact.
    pub fn do_marker(&mut self, marker: &str) -> bool {
        assert!(
            marker.len() <= SMALL_STRING_CAPACITY,
            "save state marker is longer than {SMALL_STRING_CAPACITY} bytes"
        );
        let mut found = SmallString::new();
        match self.mode {
            Mode::Write => self.do_str(marker),
            Mode::Read => self.do_small_string(&mut found),
        }
        if self.error.is_some() {
            return false;
        }
        if self.is_writing() || found.as_str() == marker {
            return true;
        }

        let offset = self.stream.position();
        tracing::error!(
            offset,
            found = %found,
            expected = marker,
            "save state marker mismatch"
        );
        self.mismatch = Some(StateError::MarkerMismatch {
            offset,
            found: found.to_string(),
            expected: marker.to_owned(),
        });
        false
    }

    /// [`StateWrapper::do_marker`] for `?`-style callers.
    pub fn expect_marker(&mut self, marker: &str) -> Result<()> {
        if self.do_marker(marker) {
            return Ok(());
        }
        Err(self
            .error
            .clone()
            .or_else(|| self.mismatch.clone())
            .unwrap_or(StateError::Invalid("marker check failed")))
    }

    pub fn do_value<T: StateValue + ?Sized>(&mut self, value: &mut T) {
        value.transfer(self);
    }

    /// Typed version gate: reading a stream older than `version_introduced` stores `default`
    /// without consuming any bytes.
    pub fn do_ex<T: StateValue>(&mut self, value: &mut T, version_introduced: u32, default: T) {
        if self.mode == Mode::Read && self.version < version_introduced {
            *value = default;
            return;
        }
        self.do_value(value);
    }

    pub fn do_field<T: StateValue + Clone>(&mut self, value: &mut T, field: &VersionedField<T>) {
        self.do_ex(value, field.introduced, field.default.clone());
    }

    pub fn do_slice<T: StateValue>(&mut self, values: &mut [T]) {
        for value in values {
            value.transfer(self);
        }
    }

    /// Transfers an enum through its integer representation.
    ///
    /// An unknown discriminant on read fails the session and stores `E::default()`.
    pub fn do_enum<E: StateEnum>(&mut self, value: &mut E) {
        let mut repr = value.to_repr();
        self.do_pod(&mut repr);
        if self.is_writing() {
            return;
        }
        *value = match E::from_repr(repr) {
            Some(v) if self.error.is_none() => v,
            Some(_) => E::default(),
            None => {
                self.fail(StateError::InvalidEnum {
                    name: std::any::type_name::<E>(),
                    value: repr.to_string(),
                });
                E::default()
            }
        };
    }
}
