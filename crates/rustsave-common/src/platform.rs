// platform.rs -- per-platform format descriptor
//
// Every fact about how the on-disk layout differs between platforms lives
// here. Entity code consults these predicates instead of matching on the
// platform directly, so "what differs per platform" stays auditable in one
// place.

use crate::error::{Result, SaveError};

// ============================================================
// Layout constants
// ============================================================

/// Fixed total of block payload bytes in every save image (excluding the
/// 4-byte length prefix of each block and the trailing checksum).
pub const TOTAL_PAYLOAD_SIZE: usize = 0x31400;

/// Maximum framed block size on most platforms.
pub const MAX_BLOCK_SIZE_DEFAULT: usize = 0xD6D8;

/// Maximum framed block size on the console family.
pub const MAX_BLOCK_SIZE_CONSOLE: usize = 0xC350;

/// Number of top-level subsystem sections in a save.
pub const SECTION_COUNT: usize = 16;

/// Console grouping: which section ranges land in each of the 3 outer
/// blocks. Non-console platforms frame one block per section instead.
pub const CONSOLE_GROUPS: [(usize, usize); 3] = [(0, 6), (6, 11), (11, 16)];

/// Tag of the script-memory sub-block. The format detector keys on it.
pub const SCRIPT_BLOCK_TAG: [u8; 4] = *b"SCR\0";

// ============================================================
// Platform enumeration
// ============================================================

/// A supported platform variant. Exactly one `Platform` governs an entire
/// read or write pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Pc,
    Xbox,
    Ps2,
    /// Regional PS2 build with a shortened summary record.
    Ps2Aus,
    Ios,
    Android,
}

impl Platform {
    /// All variants, in the order the format detector probes them. The
    /// order is load-bearing: historical files that satisfy more than one
    /// candidate resolve to the earliest, matching legacy tooling.
    pub const DETECTION_ORDER: [Platform; 6] = [
        Platform::Pc,
        Platform::Xbox,
        Platform::Ps2,
        Platform::Ps2Aus,
        Platform::Ios,
        Platform::Android,
    ];

    // ============================================================
    // Substructure sizes
    // ============================================================

    /// Size of the summary record at the head of every save.
    pub fn summary_size(self) -> usize {
        match self {
            Platform::Pc | Platform::Xbox => 0xBC,
            Platform::Ps2 | Platform::Ios | Platform::Android => 0xB0,
            Platform::Ps2Aus => 0xA8,
        }
    }

    /// Serialized size of one script thread record.
    pub fn script_thread_size(self) -> usize {
        let mut size = 0x80;
        if self.has_and_or_logic() {
            size += 8;
        }
        if self.has_script_wakeup_flag() {
            size += 4;
        }
        if self.has_sleep_compensation() {
            size += 4;
        }
        size
    }

    /// Maximum total size of one framed block, headers and padding
    /// included.
    pub fn max_block_size(self) -> usize {
        if self.is_console() {
            MAX_BLOCK_SIZE_CONSOLE
        } else {
            MAX_BLOCK_SIZE_DEFAULT
        }
    }

    /// Fixed total of block payload bytes in a save image.
    pub fn total_payload_size(self) -> usize {
        TOTAL_PAYLOAD_SIZE
    }

    /// Number of data blocks in the outer container (padding-only blocks
    /// come after these).
    pub fn outer_block_count(self) -> usize {
        if self.is_console() {
            CONSOLE_GROUPS.len()
        } else {
            SECTION_COUNT
        }
    }

    /// Section grouping for the outer container: `(start, end)` section
    /// index ranges, one per data block. Fails with `UnsupportedFormat` if
    /// a console grouping table is missing for a console variant.
    pub fn section_groups(self) -> Result<Vec<(usize, usize)>> {
        if self.is_console() {
            // Table-consistency guard: a grouping that fails to cover every
            // section is a descriptor defect and must fail loudly.
            if CONSOLE_GROUPS.last().map(|g| g.1) != Some(SECTION_COUNT) {
                return Err(SaveError::UnsupportedFormat {
                    platform: self,
                    what: "a complete section grouping",
                });
            }
            Ok(CONSOLE_GROUPS.to_vec())
        } else {
            Ok((0..SECTION_COUNT).map(|i| (i, i + 1)).collect())
        }
    }

    // ============================================================
    // Capability predicates
    // ============================================================

    /// Console family: groups all sections into 3 outer blocks and uses
    /// the smaller block limit.
    pub fn is_console(self) -> bool {
        matches!(self, Platform::Ps2 | Platform::Ps2Aus)
    }

    pub fn is_mobile(self) -> bool {
        matches!(self, Platform::Ios | Platform::Android)
    }

    /// Summary starts with a wide-character save title.
    pub fn has_wide_title(self) -> bool {
        matches!(self, Platform::Pc | Platform::Xbox)
    }

    /// Summary carries a wall-clock timestamp after the title.
    pub fn has_timestamp(self) -> bool {
        matches!(self, Platform::Pc | Platform::Xbox)
    }

    /// Console builds store display/audio preference words inline in the
    /// summary; other platforms keep them outside the save.
    pub fn has_inline_prefs(self) -> bool {
        self.is_console()
    }

    /// The default console build stores the full preference set. The
    /// regional variant omits the radio-station and language words, which
    /// is exactly its summary-size delta.
    pub fn has_full_prefs(self) -> bool {
        matches!(self, Platform::Ps2)
    }

    /// Script threads carry and/or conditional state (two extra words).
    pub fn has_and_or_logic(self) -> bool {
        matches!(self, Platform::Pc | Platform::Ios | Platform::Android)
    }

    /// Mobile builds append one extra boolean to each script thread.
    pub fn has_script_wakeup_flag(self) -> bool {
        self.is_mobile()
    }

    /// Android builds additionally store a sleep-compensation word per
    /// thread.
    pub fn has_sleep_compensation(self) -> bool {
        matches!(self, Platform::Android)
    }

    /// Console builds write the millisecond timer before the game clock;
    /// everything else writes the clock first.
    pub fn has_early_timer(self) -> bool {
        self.is_console()
    }
}

// ============================================================
// Tests
// ============================================================
