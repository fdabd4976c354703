/// Descriptor for a field that only exists in save states at or above `introduced`.
///
/// Declaring gated fields as constants keeps call sites uniform:
///
/// ```
/// use savestate::{Mode, MemoryStream, StateWrapper, VersionedField};
///
/// const IRQ_LATCH: VersionedField<u32> = VersionedField::new(5, 0xFF);
///
/// // A version 4 stream predates the field: nothing is consumed and the default is used.
/// let mut stream = MemoryStream::new();
/// let mut sw = StateWrapper::new(&mut stream, Mode::Read, 4);
/// let mut latch = 0u32;
/// sw.do_field(&mut latch, &IRQ_LATCH);
/// assert_eq!(latch, 0xFF);
/// assert!(!sw.has_error());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionedField<T> {
    pub introduced: u32,
    pub default: T,
}

impl<T> VersionedField<T> {
    pub const fn new(introduced: u32, default: T) -> Self {
        Self {
            introduced,
            default,
        }
    }

    /// Whether a stream written at `version` carries this field.
    pub fn is_present(&self, version: u32) -> bool {
        version >= self.introduced
    }
}
