// container.rs -- outer container assembly and splitting
//
// A save image is a fixed sequence of framed blocks whose payload bytes
// (everything except each block's 4-byte length prefix) total exactly the
// format's byte budget, followed by a 32-bit byte-sum checksum. Blocks are
// not self-describing: they are read in the fixed subsystem order below.

use log::debug;

use crate::block::{frame_chunks, read_block};
use crate::error::{Result, SaveError};
use crate::platform::{Platform, SECTION_COUNT};
use crate::savebuf::SaveBuf;

// ============================================================
// Subsystem sections
// ============================================================

/// Top-level subsystem sections, in emission order. One serialized chunk
/// per section; the engine never looks inside a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum Section {
    Summary = 0,
    Scripts,
    Pools,
    Garages,
    Pickups,
    Phone,
    Restarts,
    Radar,
    Zones,
    Gangs,
    CarGenerators,
    Particles,
    AudioObjects,
    Stats,
    Streaming,
    PedTypes,
}

impl Section {
    pub const ALL: [Section; SECTION_COUNT] = [
        Section::Summary,
        Section::Scripts,
        Section::Pools,
        Section::Garages,
        Section::Pickups,
        Section::Phone,
        Section::Restarts,
        Section::Radar,
        Section::Zones,
        Section::Gangs,
        Section::CarGenerators,
        Section::Particles,
        Section::AudioObjects,
        Section::Stats,
        Section::Streaming,
        Section::PedTypes,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// The ordered chunk list the container is built from, one chunk per
/// section. Sections with no data stay empty and are still framed (an
/// empty block is a bare length header).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionData {
    chunks: [Vec<u8>; SECTION_COUNT],
}

impl SectionData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, section: Section, chunk: Vec<u8>) {
        self.chunks[section.index()] = chunk;
    }

    pub fn get(&self, section: Section) -> &[u8] {
        &self.chunks[section.index()]
    }

    fn get_index(&self, index: usize) -> &[u8] {
        &self.chunks[index]
    }

    fn set_index(&mut self, index: usize, chunk: Vec<u8>) {
        self.chunks[index] = chunk;
    }
}

// ============================================================
// Checksum
// ============================================================

/// 32-bit truncated sum of every byte.
pub fn checksum(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(0u32, |sum, &b| sum.wrapping_add(b as u32))
}

/// Check the trailing 4-byte checksum of a complete save image.
pub fn verify_checksum(image: &[u8]) -> Result<()> {
    if image.len() < 4 {
        return Err(SaveError::TruncatedContainer { offset: 0 });
    }
    let split = image.len() - 4;
    let stored = u32::from_le_bytes([
        image[split],
        image[split + 1],
        image[split + 2],
        image[split + 3],
    ]);
    let computed = checksum(&image[..split]);
    if stored != computed {
        return Err(SaveError::BadChecksum { stored, computed });
    }
    Ok(())
}

// ============================================================
// Write path
// ============================================================

/// Assemble a complete save image from per-section chunks.
///
/// Grouping is format-dependent: console builds pack the sections into 3
/// outer blocks of nested frames, everything else frames one block per
/// section. Padding-only blocks fill the remainder of the byte budget and
/// the checksum is appended last.
pub fn assemble(data: &SectionData, platform: Platform) -> Result<Vec<u8>> {
    let budget = platform.total_payload_size();
    let groups = platform.section_groups()?;

    let mut image = SaveBuf::new();
    let mut payload_total = 0usize;
    let mut blocks = 0usize;

    for (start, end) in groups {
        let framed = if end - start == 1 {
            frame_chunks(None, &[data.get_index(start)], platform)?
        } else {
            // Console grouping: each section keeps its own nested frame so
            // the read path can split the group without entity knowledge.
            let mut nested = Vec::with_capacity(end - start);
            for index in start..end {
                nested.push(frame_chunks(None, &[data.get_index(index)], platform)?);
            }
            let refs: Vec<&[u8]> = nested.iter().map(Vec::as_slice).collect();
            frame_chunks(None, &refs, platform)?
        };
        payload_total += framed.len() - 4;
        blocks += 1;
        image.write_bytes(&framed)?;
    }

    if payload_total > budget {
        return Err(SaveError::ContainerSizeMismatch {
            expected: budget,
            actual: payload_total,
        });
    }

    // Fill the remaining budget with padding-only blocks, each within the
    // format's block limit.
    let pad_payload_max = platform.max_block_size() - 4;
    while payload_total < budget {
        let pad = (budget - payload_total).min(pad_payload_max);
        image.write_u32(pad as u32)?;
        image.write_zeros(pad)?;
        payload_total += pad;
        blocks += 1;
    }

    debug!(
        "assembled {:?} container: {} blocks, {} payload bytes",
        platform, blocks, payload_total
    );

    let sum = checksum(image.bytes());
    image.write_u32(sum)?;
    Ok(image.into_bytes())
}

// ============================================================
// Read path
// ============================================================

/// Split a complete save image back into per-section chunks.
///
/// The trailing checksum is verified first, then blocks are read in the
/// format's fixed order. The summed payload must equal the byte budget
/// exactly; anything else is rejected.
pub fn disassemble(image: &[u8], platform: Platform) -> Result<SectionData> {
    verify_checksum(image)?;

    let budget = platform.total_payload_size();
    let groups = platform.section_groups()?;
    let body = image[..image.len() - 4].to_vec();
    let mut buf = SaveBuf::from_bytes(body);

    let mut out = SectionData::new();
    let mut payload_total = 0usize;

    for (start, end) in groups {
        let payload = next_block(&mut buf, platform, &mut payload_total)?;
        if end - start == 1 {
            out.set_index(start, payload);
        } else {
            let group_len = payload.len();
            let mut inner = SaveBuf::from_bytes(payload);
            for index in start..end {
                if inner.remaining() < 4 {
                    return Err(SaveError::TruncatedContainer {
                        offset: inner.pos(),
                    });
                }
                out.set_index(index, read_block(&mut inner, None, platform)?);
            }
            if inner.remaining() != 0 {
                return Err(SaveError::MalformedBlock {
                    offset: group_len - inner.remaining(),
                    detail: format!("{} trailing bytes after grouped sections", inner.remaining()),
                });
            }
        }
    }

    // Padding-only blocks until the budget is consumed.
    while payload_total < budget {
        next_block(&mut buf, platform, &mut payload_total)?;
    }

    if payload_total != budget {
        return Err(SaveError::ContainerSizeMismatch {
            expected: budget,
            actual: payload_total,
        });
    }
    if buf.remaining() != 0 {
        return Err(SaveError::ContainerSizeMismatch {
            expected: budget,
            actual: payload_total + buf.remaining(),
        });
    }
    Ok(out)
}

/// Read one outer block, accounting its payload bytes (everything it
/// occupied except the 4-byte length prefix) toward the running total.
fn next_block(buf: &mut SaveBuf, platform: Platform, payload_total: &mut usize) -> Result<Vec<u8>> {
    if buf.remaining() < 4 {
        return Err(SaveError::TruncatedContainer { offset: buf.pos() });
    }
    buf.mark();
    let payload = read_block(buf, None, platform)?;
    let consumed = buf.bytes_since_mark();
    buf.pop_mark();
    *payload_total += consumed - 4;
    Ok(payload)
}

// ============================================================
// Tests
// ============================================================
