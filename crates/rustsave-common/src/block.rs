// block.rs -- length/tag-prefixed block framing
//
// A block is: optional 4-byte tag with doubled length headers, the payload,
// and zero padding out to a 4-byte boundary from the block's own start.
// Tagged layout:   [payload+8: u32] [tag: 4 bytes] [payload: u32] [payload]
// Untagged layout: [payload: u32] [payload]

use log::trace;

use crate::error::{Result, SaveError};
use crate::platform::Platform;
use crate::savebuf::SaveBuf;

/// Frame one or more chunks into a single block.
///
/// The payload is the concatenation of `chunks`. The total framed size
/// (headers, payload and alignment padding) must fit the platform's block
/// limit or the call fails with `BlockSizeExceeded`.
pub fn frame_chunks(tag: Option<[u8; 4]>, chunks: &[&[u8]], platform: Platform) -> Result<Vec<u8>> {
    let payload_len: usize = chunks.iter().map(|c| c.len()).sum();

    let mut buf = SaveBuf::new();
    match tag {
        Some(tag) => {
            buf.write_u32((payload_len + 8) as u32)?;
            buf.write_bytes(&tag)?;
            buf.write_u32(payload_len as u32)?;
        }
        None => buf.write_u32(payload_len as u32)?,
    }
    for chunk in chunks {
        buf.write_bytes(chunk)?;
    }
    buf.align(4)?;

    let framed = buf.into_bytes();
    let max = platform.max_block_size();
    if framed.len() > max {
        return Err(SaveError::BlockSizeExceeded {
            size: framed.len(),
            max,
        });
    }
    trace!(
        "framed block: tag={:?} payload={} total={}",
        tag.map(|t| String::from_utf8_lossy(&t).into_owned()),
        payload_len,
        framed.len()
    );
    Ok(framed)
}

/// Read one framed block from the cursor and return its payload bytes.
///
/// If `expected_tag` is given, the tag bytes and the doubled length header
/// are cross-checked; any mismatch is `MalformedBlock`. The cursor is left
/// aligned to 4 bytes past the block's own start.
pub fn read_block(
    buf: &mut SaveBuf,
    expected_tag: Option<[u8; 4]>,
    platform: Platform,
) -> Result<Vec<u8>> {
    let start = buf.pos();
    buf.set_origin(start);

    let outer = buf.read_u32()? as usize;
    let (payload_len, header_len) = match expected_tag {
        Some(expected) => {
            let tag = buf.read_bytes(4)?;
            if tag != expected {
                return Err(SaveError::MalformedBlock {
                    offset: start,
                    detail: format!(
                        "tag mismatch: expected {:?}, got {:?}",
                        String::from_utf8_lossy(&expected),
                        String::from_utf8_lossy(&tag)
                    ),
                });
            }
            let inner = buf.read_u32()? as usize;
            if outer < 8 || inner != outer - 8 {
                return Err(SaveError::MalformedBlock {
                    offset: start,
                    detail: format!("length cross-check failed: outer {outer}, inner {inner}"),
                });
            }
            (inner, 12)
        }
        None => (outer, 4),
    };

    // A declared size no block of this format could carry means the input
    // is corrupt or in a different format.
    if header_len + payload_len > platform.max_block_size() {
        return Err(SaveError::MalformedBlock {
            offset: start,
            detail: format!(
                "declared payload of {payload_len} bytes exceeds the format block limit"
            ),
        });
    }

    let payload = buf.read_bytes(payload_len)?;
    buf.align(4)?;
    Ok(payload)
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TAG: [u8; 4] = *b"SCR\0";

    fn read_all(framed: Vec<u8>, tag: Option<[u8; 4]>) -> Result<Vec<u8>> {
        let mut buf = SaveBuf::from_bytes(framed);
        read_block(&mut buf, tag, Platform::Pc)
    }

    // =========================================================================
    // Framing layout
    // =========================================================================

    #[test]
    fn untagged_block_layout() {
        let framed = frame_chunks(None, &[b"abcd"], Platform::Pc).unwrap();
        assert_eq!(framed, vec![4, 0, 0, 0, b'a', b'b', b'c', b'd']);
    }

    #[test]
    fn tagged_block_layout() {
        let framed = frame_chunks(Some(TAG), &[b"abcd"], Platform::Pc).unwrap();
        let mut expected = vec![12, 0, 0, 0];
        expected.extend_from_slice(b"SCR\0");
        expected.extend_from_slice(&[4, 0, 0, 0]);
        expected.extend_from_slice(b"abcd");
        assert_eq!(framed, expected);
    }

    #[test]
    fn framing_pads_to_four_bytes() {
        let framed = frame_chunks(None, &[b"abcde"], Platform::Pc).unwrap();
        // 4-byte header + 5 payload bytes + 3 padding
        assert_eq!(framed.len(), 12);
        assert_eq!(&framed[9..], &[0, 0, 0][..]);
    }

    #[test]
    fn chunks_concatenate_without_separators() {
        let framed = frame_chunks(None, &[b"ab", b"", b"cd"], Platform::Pc).unwrap();
        assert_eq!(read_all(framed, None).unwrap(), b"abcd");
    }

    #[test]
    fn empty_block_is_just_a_header() {
        let framed = frame_chunks(None, &[], Platform::Pc).unwrap();
        assert_eq!(framed, vec![0, 0, 0, 0]);
        assert_eq!(read_all(framed, None).unwrap(), b"");
    }

    // =========================================================================
    // Size limit
    // =========================================================================

    #[test]
    fn oversized_block_is_rejected() {
        let big = vec![0u8; Platform::Ps2.max_block_size()];
        let err = frame_chunks(None, &[&big], Platform::Ps2).unwrap_err();
        assert!(matches!(err, SaveError::BlockSizeExceeded { max: 0xC350, .. }));

        // The same payload fits the default limit.
        assert!(frame_chunks(None, &[&big], Platform::Pc).is_ok());
    }

    #[test]
    fn limit_counts_headers_and_padding() {
        // Payload that fits exactly once the 4-byte header is added.
        let payload = vec![0u8; Platform::Pc.max_block_size() - 4];
        assert!(frame_chunks(None, &[&payload], Platform::Pc).is_ok());

        let payload = vec![0u8; Platform::Pc.max_block_size() - 3];
        assert!(frame_chunks(None, &[&payload], Platform::Pc).is_err());
    }

    // =========================================================================
    // Read-side validation
    // =========================================================================

    #[test]
    fn tag_mismatch_is_malformed() {
        let framed = frame_chunks(Some(*b"PED\0"), &[b"data"], Platform::Pc).unwrap();
        let err = read_all(framed, Some(TAG)).unwrap_err();
        assert!(matches!(err, SaveError::MalformedBlock { offset: 0, .. }));
    }

    #[test]
    fn corrupted_inner_length_is_malformed() {
        let mut framed = frame_chunks(Some(TAG), &[b"data"], Platform::Pc).unwrap();
        framed[8] ^= 1; // inner length field
        let err = read_all(framed, Some(TAG)).unwrap_err();
        assert!(matches!(err, SaveError::MalformedBlock { .. }));
    }

    #[test]
    fn truncated_payload_is_end_of_data() {
        let mut framed = frame_chunks(None, &[b"abcdefgh"], Platform::Pc).unwrap();
        framed.truncate(framed.len() - 2);
        let err = read_all(framed, None).unwrap_err();
        assert!(matches!(err, SaveError::UnexpectedEndOfData { .. }));
    }

    #[test]
    fn absurd_declared_length_is_malformed() {
        let mut buf = SaveBuf::new();
        buf.write_u32(0xFFFF_FFF0).unwrap();
        let err = read_all(buf.into_bytes(), None).unwrap_err();
        assert!(matches!(err, SaveError::MalformedBlock { .. }));
    }

    // =========================================================================
    // Alignment inside a larger stream
    // =========================================================================

    #[test]
    fn reader_aligns_relative_to_block_start() {
        // Two blocks back to back, the first with a 1-byte payload; the
        // reader must land exactly on the second block's header.
        let a = frame_chunks(None, &[b"x"], Platform::Pc).unwrap();
        let b = frame_chunks(None, &[b"yz"], Platform::Pc).unwrap();
        let mut stream = a.clone();
        stream.extend_from_slice(&b);

        let mut buf = SaveBuf::from_bytes(stream);
        assert_eq!(read_block(&mut buf, None, Platform::Pc).unwrap(), b"x");
        assert_eq!(buf.pos(), a.len());
        assert_eq!(read_block(&mut buf, None, Platform::Pc).unwrap(), b"yz");
        assert_eq!(buf.remaining(), 0);
    }

    // =========================================================================
    // Properties
    // =========================================================================

    proptest! {
        #[test]
        fn prop_frame_then_read_is_identity(payload in prop::collection::vec(any::<u8>(), 0..256), tagged: bool) {
            let tag = tagged.then_some(TAG);
            let framed = frame_chunks(tag, &[&payload], Platform::Pc).unwrap();
            prop_assert_eq!(framed.len() % 4, 0);
            let mut buf = SaveBuf::from_bytes(framed);
            let back = read_block(&mut buf, tag, Platform::Pc).unwrap();
            prop_assert_eq!(back, payload);
        }
    }
}
