// detect.rs -- format auto-detection from raw bytes
//
// Nothing in a save image names its platform, so the format is inferred
// from a handful of fixed-offset words: the summary record's size at the
// head of the image, the position of the script sub-block's tag (which
// moves with the summary size and the outer grouping), and the per-thread
// record size recovered by dividing the script span by its thread count.
// Candidates are probed in a fixed order and the first match wins; the
// order is part of the format's compatibility surface and must not change.

use log::{debug, trace};

use crate::error::{Result, SaveError};
use crate::platform::{Platform, SCRIPT_BLOCK_TAG};

/// Identify the platform a raw save image was written for.
///
/// Every probe is bounds-checked; short or malformed input rejects the
/// candidate rather than failing the call. `UnrecognizedFormat` is returned
/// when no candidate matches, at which point the caller must supply an
/// explicit format.
pub fn detect(image: &[u8]) -> Result<Platform> {
    for candidate in Platform::DETECTION_ORDER {
        if probe(image, candidate).is_some() {
            debug!("detected save format: {:?}", candidate);
            return Ok(candidate);
        }
        trace!("detection: {:?} rejected", candidate);
    }
    Err(SaveError::UnrecognizedFormat)
}

/// Check one candidate's diagnostics against the image. `None` means any
/// probe failed, including running off the end of the input.
fn probe(data: &[u8], platform: Platform) -> Option<()> {
    let summary = platform.summary_size();

    // Locate the framed script chunk. Per-section layouts put the summary
    // alone in the first block; console layouts nest it at the head of the
    // first group block.
    let chunk_off = if platform.is_console() {
        let group_len = u32_at(data, 0)? as usize;
        if group_len < summary + 8 || group_len > platform.max_block_size() {
            return None;
        }
        if u32_at(data, 4)? as usize != summary {
            return None;
        }
        8 + summary
    } else {
        if u32_at(data, 0)? as usize != summary {
            return None;
        }
        4 + summary
    };

    let chunk_len = u32_at(data, chunk_off)? as usize;
    if chunk_len < 12 || chunk_len > platform.max_block_size() {
        return None;
    }

    // Tagged frame: [inner+8: u32] [SCR tag] [inner: u32] [payload]
    let frame = chunk_off + 4;
    let outer = u32_at(data, frame)? as usize;
    if data.get(frame + 4..frame + 8)? != &SCRIPT_BLOCK_TAG[..] {
        return None;
    }
    let inner = u32_at(data, frame + 8)? as usize;
    if inner + 8 != outer {
        return None;
    }

    // Payload: [globals len][globals][main size][largest mission][count][threads]
    let globals = u32_at(data, frame + 12)? as usize;
    if inner < globals + 16 {
        return None;
    }
    let count = u32_at(data, frame + 24 + globals)? as usize;
    let thread_bytes = inner - globals - 16;

    if count == 0 {
        // No running threads: the per-element check cannot run, so the
        // candidate order alone decides. Only an empty span is acceptable.
        if thread_bytes != 0 {
            return None;
        }
    } else if thread_bytes % count != 0 || thread_bytes / count != platform.script_thread_size() {
        return None;
    }

    Some(())
}

fn u32_at(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::frame_chunks;
    use crate::container::{assemble, Section, SectionData};
    use crate::savebuf::SaveBuf;

    /// Build a well-formed script section chunk with the given global
    /// space and thread count.
    fn script_chunk(platform: Platform, globals: usize, threads: usize) -> Vec<u8> {
        let mut payload = SaveBuf::new();
        payload.write_u32(globals as u32).unwrap();
        payload.write_zeros(globals).unwrap();
        payload.write_u32(0x1000).unwrap(); // main script size
        payload.write_u32(0x2000).unwrap(); // largest mission size
        payload.write_u32(threads as u32).unwrap();
        payload
            .write_zeros(threads * platform.script_thread_size())
            .unwrap();
        frame_chunks(Some(SCRIPT_BLOCK_TAG), &[payload.bytes()], platform).unwrap()
    }

    fn image_for(platform: Platform, threads: usize) -> Vec<u8> {
        let mut data = SectionData::new();
        data.set(Section::Summary, vec![0; platform.summary_size()]);
        data.set(Section::Scripts, script_chunk(platform, 64, threads));
        assemble(&data, platform).unwrap()
    }

    // =========================================================================
    // Detection stability
    // =========================================================================

    #[test]
    fn detects_every_format_it_can_produce() {
        for platform in Platform::DETECTION_ORDER {
            let image = image_for(platform, 2);
            assert_eq!(detect(&image).unwrap(), platform);
        }
    }

    #[test]
    fn detects_with_a_single_thread() {
        for platform in Platform::DETECTION_ORDER {
            let image = image_for(platform, 1);
            assert_eq!(detect(&image).unwrap(), platform);
        }
    }

    #[test]
    fn detection_reads_only_the_head_of_the_image() {
        // Everything the detector needs sits in the first two blocks, so a
        // partial download of a PC save still identifies.
        let image = image_for(Platform::Pc, 3);
        let head = &image[..0x800];
        assert_eq!(detect(head).unwrap(), Platform::Pc);
    }

    // =========================================================================
    // Rejection
    // =========================================================================

    #[test]
    fn garbage_is_unrecognized() {
        let garbage = vec![0x5A; 1024];
        assert_eq!(detect(&garbage), Err(SaveError::UnrecognizedFormat));
    }

    #[test]
    fn empty_and_tiny_inputs_are_unrecognized() {
        assert_eq!(detect(&[]), Err(SaveError::UnrecognizedFormat));
        assert_eq!(detect(&[0xBC]), Err(SaveError::UnrecognizedFormat));
        assert_eq!(detect(&[0xBC, 0, 0, 0]), Err(SaveError::UnrecognizedFormat));
    }

    #[test]
    fn corrupt_script_tag_is_unrecognized() {
        let mut image = image_for(Platform::Pc, 2);
        // The tag sits 8 bytes into the scripts block.
        let tag_off = 4 + Platform::Pc.summary_size() + 8;
        assert_eq!(&image[tag_off..tag_off + 4], b"SCR\0".as_slice());
        image[tag_off] = b'X';
        assert_eq!(detect(&image), Err(SaveError::UnrecognizedFormat));
    }

    #[test]
    fn wrong_thread_size_is_unrecognized() {
        // A script span that divides into records no platform uses.
        let platform = Platform::Pc;
        let mut payload = SaveBuf::new();
        payload.write_u32(0).unwrap();
        payload.write_u32(0x1000).unwrap();
        payload.write_u32(0x2000).unwrap();
        payload.write_u32(3).unwrap();
        payload.write_zeros(3 * 0x44).unwrap();
        let chunk = frame_chunks(Some(SCRIPT_BLOCK_TAG), &[payload.bytes()], platform).unwrap();

        let mut data = SectionData::new();
        data.set(Section::Summary, vec![0; platform.summary_size()]);
        data.set(Section::Scripts, chunk);
        let image = assemble(&data, platform).unwrap();
        assert_eq!(detect(&image), Err(SaveError::UnrecognizedFormat));
    }

    // =========================================================================
    // Legacy order behavior
    // =========================================================================

    #[test]
    fn zero_threads_resolve_by_candidate_order() {
        // With no running threads the per-element check cannot separate
        // candidates sharing a layout signature; the probe order decides.
        // PC is unambiguous either way because its summary size differs.
        let image = image_for(Platform::Pc, 0);
        assert_eq!(detect(&image).unwrap(), Platform::Pc);

        // iOS and Android share summary size and grouping; with zero
        // threads the earlier candidate wins. This mirrors the historical
        // tooling and is deliberate.
        let image = image_for(Platform::Android, 0);
        assert_eq!(detect(&image).unwrap(), Platform::Ios);
    }
}
