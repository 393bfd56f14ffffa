// summary.rs -- summary record at the head of every save
//
// The one substructure whose serialized size differs per platform: 0xBC on
// PC and Xbox, 0xB0 on the default console build and both mobile ports,
// 0xA8 on the regional console variant. Platform-conditional fields are
// gated on the format descriptor's capability predicates; the record is
// zero-filled out to its exact declared size.

use rustsave_common::error::{Result, SaveError};
use rustsave_common::object::SaveObject;
use rustsave_common::platform::Platform;
use rustsave_common::savebuf::SaveBuf;

/// Width of the wide-character save title, in UTF-16 code units.
pub const TITLE_UNITS: usize = 24;

// ============================================================
// SaveTime
// ============================================================

/// Wall-clock stamp recorded when the save was written (PC and Xbox only).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveTime {
    pub year: u16,
    pub month: u16,
    pub day_of_week: u16,
    pub day: u16,
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
    pub millis: u16,
}

impl SaveObject for SaveTime {
    fn saved_size(&self, _platform: Platform) -> usize {
        16
    }

    fn read_from(buf: &mut SaveBuf, _platform: Platform) -> Result<Self> {
        Ok(Self {
            year: buf.read_u16()?,
            month: buf.read_u16()?,
            day_of_week: buf.read_u16()?,
            day: buf.read_u16()?,
            hour: buf.read_u16()?,
            minute: buf.read_u16()?,
            second: buf.read_u16()?,
            millis: buf.read_u16()?,
        })
    }

    fn write_to(&self, buf: &mut SaveBuf, _platform: Platform) -> Result<()> {
        buf.write_u16(self.year)?;
        buf.write_u16(self.month)?;
        buf.write_u16(self.day_of_week)?;
        buf.write_u16(self.day)?;
        buf.write_u16(self.hour)?;
        buf.write_u16(self.minute)?;
        buf.write_u16(self.second)?;
        buf.write_u16(self.millis)
    }
}

// ============================================================
// Console preferences
// ============================================================

/// Display/audio settings the console family keeps inline in the summary.
/// The regional variant drops the radio-station and language words.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsolePrefs {
    pub brightness: u32,
    pub sfx_volume: u32,
    pub music_volume: u32,
    pub stereo_output: bool,
    pub radio_station: u32,
    pub language: u32,
}

// ============================================================
// SummaryVars
// ============================================================

/// World and clock state at the head of the save.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryVars {
    /// Save slot title (PC/Xbox only).
    pub title: String,
    /// Wall-clock stamp (PC/Xbox only).
    pub timestamp: SaveTime,
    pub current_level: u32,
    pub camera_position: [f32; 3],
    pub ms_per_game_minute: u32,
    pub last_clock_tick: u32,
    pub game_hour: u8,
    pub game_minute: u8,
    pub time_in_ms: u32,
    pub frame_counter: u32,
    pub time_step: f32,
    pub old_weather: u16,
    pub new_weather: u16,
    pub weather_interpolation: f32,
    pub weather_cycle_index: u32,
    pub on_mission: bool,
    pub total_play_time: u32,
    /// Inline settings (console family only).
    pub prefs: ConsolePrefs,
    /// Extra camera boolean appended on mobile builds.
    pub invert_look: bool,
}

impl SaveObject for SummaryVars {
    fn saved_size(&self, platform: Platform) -> usize {
        platform.summary_size()
    }

    fn read_from(buf: &mut SaveBuf, platform: Platform) -> Result<Self> {
        buf.mark();
        let mut v = SummaryVars::default();

        if platform.has_wide_title() {
            v.title = buf.read_wide_string(TITLE_UNITS)?;
        }
        if platform.has_timestamp() {
            v.timestamp = SaveTime::read_from(buf, platform)?;
        }

        v.current_level = buf.read_u32()?;
        for c in v.camera_position.iter_mut() {
            *c = buf.read_f32()?;
        }
        v.ms_per_game_minute = buf.read_u32()?;
        v.last_clock_tick = buf.read_u32()?;

        // Console builds store the millisecond timer ahead of the clock.
        if platform.has_early_timer() {
            v.time_in_ms = buf.read_u32()?;
        }
        v.game_hour = buf.read_u8()?;
        v.game_minute = buf.read_u8()?;
        buf.skip(2)?;
        if !platform.has_early_timer() {
            v.time_in_ms = buf.read_u32()?;
        }

        v.frame_counter = buf.read_u32()?;
        v.time_step = buf.read_f32()?;
        v.old_weather = buf.read_u16()?;
        v.new_weather = buf.read_u16()?;
        v.weather_interpolation = buf.read_f32()?;
        v.weather_cycle_index = buf.read_u32()?;
        v.on_mission = buf.read_bool32()?;
        v.total_play_time = buf.read_u32()?;

        if platform.has_inline_prefs() {
            v.prefs.brightness = buf.read_u32()?;
            v.prefs.sfx_volume = buf.read_u32()?;
            v.prefs.music_volume = buf.read_u32()?;
            v.prefs.stereo_output = buf.read_bool32()?;
            if platform.has_full_prefs() {
                v.prefs.radio_station = buf.read_u32()?;
                v.prefs.language = buf.read_u32()?;
            }
        }
        if platform.is_mobile() {
            v.invert_look = buf.read_bool32()?;
        }

        let consumed = buf.bytes_since_mark();
        buf.pop_mark();
        let reserved = platform
            .summary_size()
            .checked_sub(consumed)
            .ok_or(SaveError::EntitySizeMismatch {
                expected: platform.summary_size(),
                actual: consumed,
            })?;
        buf.skip(reserved)?;
        Ok(v)
    }

    fn write_to(&self, buf: &mut SaveBuf, platform: Platform) -> Result<()> {
        buf.mark();

        if platform.has_wide_title() {
            buf.write_wide_string(&self.title, TITLE_UNITS)?;
        }
        if platform.has_timestamp() {
            self.timestamp.write_to(buf, platform)?;
        }

        buf.write_u32(self.current_level)?;
        for c in self.camera_position {
            buf.write_f32(c)?;
        }
        buf.write_u32(self.ms_per_game_minute)?;
        buf.write_u32(self.last_clock_tick)?;

        if platform.has_early_timer() {
            buf.write_u32(self.time_in_ms)?;
        }
        buf.write_u8(self.game_hour)?;
        buf.write_u8(self.game_minute)?;
        buf.write_u16(0)?;
        if !platform.has_early_timer() {
            buf.write_u32(self.time_in_ms)?;
        }

        buf.write_u32(self.frame_counter)?;
        buf.write_f32(self.time_step)?;
        buf.write_u16(self.old_weather)?;
        buf.write_u16(self.new_weather)?;
        buf.write_f32(self.weather_interpolation)?;
        buf.write_u32(self.weather_cycle_index)?;
        buf.write_bool32(self.on_mission)?;
        buf.write_u32(self.total_play_time)?;

        if platform.has_inline_prefs() {
            buf.write_u32(self.prefs.brightness)?;
            buf.write_u32(self.prefs.sfx_volume)?;
            buf.write_u32(self.prefs.music_volume)?;
            buf.write_bool32(self.prefs.stereo_output)?;
            if platform.has_full_prefs() {
                buf.write_u32(self.prefs.radio_station)?;
                buf.write_u32(self.prefs.language)?;
            }
        }
        if platform.is_mobile() {
            buf.write_bool32(self.invert_look)?;
        }

        let written = buf.bytes_since_mark();
        buf.pop_mark();
        let reserved = platform
            .summary_size()
            .checked_sub(written)
            .ok_or(SaveError::EntitySizeMismatch {
                expected: platform.summary_size(),
                actual: written,
            })?;
        buf.write_zeros(reserved)
    }
}

// ============================================================
// Tests
// ============================================================
