use thiserror::Error;

/// Why a removal failed. The map is left untouched in both cases.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveError {
    /// The key's bucket has no entries at all.
    #[error("cannot remove from an empty chain")]
    EmptyChain,
    /// The key's bucket has entries, but none with this key.
    #[error("key not found")]
    KeyNotFound,
}
