// error.rs -- error taxonomy for the save serialization engine

use thiserror::Error;

use crate::platform::Platform;

/// Errors raised while reading or writing a save image.
///
/// None of these are advisory: any consistency check that fails aborts the
/// current operation. `BlockSizeExceeded` is the only error a caller can
/// meaningfully recover from (shrink the offending payload and rewrite);
/// `UnrecognizedFormat` is recovered by supplying an explicit format.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SaveError {
    /// A read ran past the end of the buffer, or a write ran past a fixed
    /// capacity.
    #[error("unexpected end of data at offset {offset}: needed {needed} more bytes")]
    UnexpectedEndOfData {
        /// Cursor offset when the access was attempted
        offset: usize,
        /// Bytes the access required beyond what was available
        needed: usize,
    },

    /// A framed block's tag or length headers did not match while reading.
    #[error("malformed block at offset {offset}: {detail}")]
    MalformedBlock {
        /// Offset of the block's first header byte
        offset: usize,
        detail: String,
    },

    /// A framed block would exceed the format's maximum block size.
    #[error("block of {size} bytes exceeds the format maximum of {max}")]
    BlockSizeExceeded { size: usize, max: usize },

    /// A format descriptor lookup failed for a required field. Indicates a
    /// defect in the layout tables, not bad input.
    #[error("format {platform:?} does not define {what}")]
    UnsupportedFormat {
        platform: Platform,
        what: &'static str,
    },

    /// No candidate format matched the input during detection.
    #[error("save data does not match any known format")]
    UnrecognizedFormat,

    /// Fewer bytes remain than a structural read requires.
    #[error("container truncated at offset {offset}")]
    TruncatedContainer { offset: usize },

    /// The summed block payload disagrees with the format's fixed total.
    #[error("container payload is {actual} bytes, format requires exactly {expected}")]
    ContainerSizeMismatch { expected: usize, actual: usize },

    /// The trailing checksum does not match the byte sum of the image.
    #[error("checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    BadChecksum { stored: u32, computed: u32 },

    /// An entity serialized a byte count different from its declared size.
    #[error("entity wrote {actual} bytes but declared {expected}")]
    EntitySizeMismatch { expected: usize, actual: usize },
}

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, SaveError>;
