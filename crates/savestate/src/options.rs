/// Limits applied while reading length-prefixed values.
///
/// A corrupt or truncated stream can carry an arbitrary `u32` length prefix. Lengths above these
/// limits poison the session with [`crate::StateError::LengthLimit`] instead of attempting the
/// allocation. Lengths within the limits are still read incrementally: the destination grows
/// with the data actually present, so a short stream fails after a bounded allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateOptions {
    /// Maximum byte length of a `String` or small string payload.
    pub max_string_len: u32,
    /// Maximum element count of a `Vec`/`VecDeque`.
    pub max_collection_len: u32,
}

impl StateOptions {
    pub const DEFAULT_MAX_STRING_LEN: u32 = 16 * 1024 * 1024;
    pub const DEFAULT_MAX_COLLECTION_LEN: u32 = 16 * 1024 * 1024;

    /// No limits beyond what the `u32` prefix can express.
    pub const UNLIMITED: StateOptions = StateOptions {
        max_string_len: u32::MAX,
        max_collection_len: u32::MAX,
    };

    pub fn with_max_string_len(mut self, len: u32) -> Self {
        self.max_string_len = len;
        self
    }

    pub fn with_max_collection_len(mut self, len: u32) -> Self {
        self.max_collection_len = len;
        self
    }
}

impl Default for StateOptions {
    fn default() -> Self {
        Self {
            max_string_len: Self::DEFAULT_MAX_STRING_LEN,
            max_collection_len: Self::DEFAULT_MAX_COLLECTION_LEN,
        }
    }
}
