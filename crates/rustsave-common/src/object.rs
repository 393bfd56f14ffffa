// object.rs -- serializer contract implemented by every domain entity

use crate::error::{Result, SaveError};
use crate::platform::Platform;
use crate::savebuf::SaveBuf;

/// The contract every saveable entity implements to plug into the engine.
///
/// Law: for any value `v` and applicable platform `f`,
/// `read_from(write_to(v, f), f)` equals `v` under domain equality and
/// consumes exactly `v.saved_size(f)` bytes. Sizes are computed
/// structurally, never by trial serialization, because block headers are
/// sized before any payload bytes exist.
///
/// Fixed-size collections serialize element by element with no implicit
/// padding between elements; variable-length collections are preceded by
/// an explicit count field.
pub trait SaveObject: Sized {
    /// Serialized size of this value under the given platform.
    fn saved_size(&self, platform: Platform) -> usize;

    /// Deserialize one value, consuming exactly its serialized size.
    fn read_from(buf: &mut SaveBuf, platform: Platform) -> Result<Self>;

    /// Serialize this value.
    fn write_to(&self, buf: &mut SaveBuf, platform: Platform) -> Result<()>;
}

/// Serialize an entity into a standalone chunk, enforcing the size law.
/// The buffer is fixed at `saved_size` so an oversized write fails fast; a
/// short write is caught by the final size comparison.
pub fn to_chunk<T: SaveObject>(value: &T, platform: Platform) -> Result<Vec<u8>> {
    let expected = value.saved_size(platform);
    let mut buf = SaveBuf::fixed(expected);
    value.write_to(&mut buf, platform)?;
    if buf.pos() != expected {
        return Err(SaveError::EntitySizeMismatch {
            expected,
            actual: buf.pos(),
        });
    }
    Ok(buf.into_bytes())
}

/// Deserialize an entity from a chunk, enforcing the size law in the
/// opposite direction: the read must consume the chunk exactly.
pub fn from_chunk<T: SaveObject>(chunk: &[u8], platform: Platform) -> Result<T> {
    let mut buf = SaveBuf::from_bytes(chunk.to_vec());
    let value = T::read_from(&mut buf, platform)?;
    if buf.pos() != chunk.len() {
        return Err(SaveError::EntitySizeMismatch {
            expected: chunk.len(),
            actual: buf.pos(),
        });
    }
    Ok(value)
}

// ============================================================
// Tests
// ============================================================
