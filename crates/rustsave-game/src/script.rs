// script.rs -- script memory and running script threads
//
// Script memory is the one resizable subsystem: the global variable space
// grows with the mission script, so this is the entity that can push a
// framed block past the format limit during ordinary tool use. Its section
// chunk wraps the payload in the tagged SCR sub-block the format detector
// keys on.

use bitflags::bitflags;

use rustsave_common::block::{frame_chunks, read_block};
use rustsave_common::error::Result;
use rustsave_common::object::{from_chunk, to_chunk, SaveObject};
use rustsave_common::platform::{Platform, SCRIPT_BLOCK_TAG};
use rustsave_common::savebuf::SaveBuf;

/// Width of a thread's script name field, in bytes.
pub const THREAD_NAME_LEN: usize = 8;

bitflags! {
    /// Per-thread status word.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct ThreadFlags: u32 {
        const CONDITION_RESULT = 1 << 0;
        const IS_MISSION = 1 << 1;
        const SKIP_WAKE_TIME = 1 << 2;
        const DEATH_ARREST_CHECK = 1 << 3;
    }
}

// ============================================================
// ScriptThread
// ============================================================

/// One running script thread. Fixed-size per platform: 0x80 base, +8 with
/// and/or conditional state, +4 for the mobile wakeup boolean, +4 for the
/// Android sleep-compensation word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptThread {
    pub name: String,
    pub program_counter: u32,
    pub return_stack: [u32; 6],
    pub stack_depth: u16,
    pub locals: [u32; 16],
    pub timers: [u32; 2],
    pub flags: ThreadFlags,
    pub wake_time: u32,
    pub wait_timer: u32,
    pub condition_count: u16,
    /// And/or conditional evaluation state (not serialized on every
    /// platform; see `Platform::has_and_or_logic`).
    pub and_or_state: u32,
    pub not_flag: bool,
    /// Mobile-only: wake the thread on touch input.
    pub wake_on_input: bool,
    /// Android-only: timer drift compensation accumulated while asleep.
    pub sleep_compensation: u32,
}

impl Default for ScriptThread {
    fn default() -> Self {
        Self {
            name: String::new(),
            program_counter: 0,
            return_stack: [0; 6],
            stack_depth: 0,
            locals: [0; 16],
            timers: [0; 2],
            flags: ThreadFlags::empty(),
            wake_time: 0,
            wait_timer: 0,
            condition_count: 0,
            and_or_state: 0,
            not_flag: false,
            wake_on_input: false,
            sleep_compensation: 0,
        }
    }
}

impl SaveObject for ScriptThread {
    fn saved_size(&self, platform: Platform) -> usize {
        platform.script_thread_size()
    }

    fn read_from(buf: &mut SaveBuf, platform: Platform) -> Result<Self> {
        let mut t = ScriptThread {
            name: buf.read_fixed_string(THREAD_NAME_LEN)?,
            ..Default::default()
        };
        t.program_counter = buf.read_u32()?;
        for slot in t.return_stack.iter_mut() {
            *slot = buf.read_u32()?;
        }
        t.stack_depth = buf.read_u16()?;
        buf.skip(2)?;
        for local in t.locals.iter_mut() {
            *local = buf.read_u32()?;
        }
        for timer in t.timers.iter_mut() {
            *timer = buf.read_u32()?;
        }
        t.flags = ThreadFlags::from_bits_retain(buf.read_u32()?);
        t.wake_time = buf.read_u32()?;
        t.wait_timer = buf.read_u32()?;
        t.condition_count = buf.read_u16()?;
        buf.skip(2)?;

        if platform.has_and_or_logic() {
            t.and_or_state = buf.read_u32()?;
            t.not_flag = buf.read_bool32()?;
        }
        if platform.has_script_wakeup_flag() {
            t.wake_on_input = buf.read_bool32()?;
        }
        if platform.has_sleep_compensation() {
            t.sleep_compensation = buf.read_u32()?;
        }
        Ok(t)
    }

    fn write_to(&self, buf: &mut SaveBuf, platform: Platform) -> Result<()> {
        buf.write_fixed_string(&self.name, THREAD_NAME_LEN)?;
        buf.write_u32(self.program_counter)?;
        for slot in self.return_stack {
            buf.write_u32(slot)?;
        }
        buf.write_u16(self.stack_depth)?;
        buf.write_u16(0)?;
        for local in self.locals {
            buf.write_u32(local)?;
        }
        for timer in self.timers {
            buf.write_u32(timer)?;
        }
        buf.write_u32(self.flags.bits())?;
        buf.write_u32(self.wake_time)?;
        buf.write_u32(self.wait_timer)?;
        buf.write_u16(self.condition_count)?;
        buf.write_u16(0)?;

        if platform.has_and_or_logic() {
            buf.write_u32(self.and_or_state)?;
            buf.write_bool32(self.not_flag)?;
        }
        if platform.has_script_wakeup_flag() {
            buf.write_bool32(self.wake_on_input)?;
        }
        if platform.has_sleep_compensation() {
            buf.write_u32(self.sleep_compensation)?;
        }
        Ok(())
    }
}

// ============================================================
// ScriptMemory
// ============================================================

/// The script subsystem: global variable space plus every running thread.
/// The global space is externally resizable, which makes this the entity
/// expected to trigger `BlockSizeExceeded` when a modified script grows
/// past the format's block limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptMemory {
    pub globals: Vec<u8>,
    pub main_script_size: u32,
    pub largest_mission_size: u32,
    pub threads: Vec<ScriptThread>,
}

impl SaveObject for ScriptMemory {
    fn saved_size(&self, platform: Platform) -> usize {
        4 + self.globals.len() + 4 + 4 + 4 + self.threads.len() * platform.script_thread_size()
    }

    fn read_from(buf: &mut SaveBuf, platform: Platform) -> Result<Self> {
        let globals_len = buf.read_u32()? as usize;
        let globals = buf.read_bytes(globals_len)?;
        let main_script_size = buf.read_u32()?;
        let largest_mission_size = buf.read_u32()?;
        let count = buf.read_u32()? as usize;
        let mut threads = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            threads.push(ScriptThread::read_from(buf, platform)?);
        }
        Ok(Self {
            globals,
            main_script_size,
            largest_mission_size,
            threads,
        })
    }

    fn write_to(&self, buf: &mut SaveBuf, platform: Platform) -> Result<()> {
        buf.write_u32(self.globals.len() as u32)?;
        buf.write_bytes(&self.globals)?;
        buf.write_u32(self.main_script_size)?;
        buf.write_u32(self.largest_mission_size)?;
        buf.write_u32(self.threads.len() as u32)?;
        for thread in &self.threads {
            thread.write_to(buf, platform)?;
        }
        Ok(())
    }
}

impl ScriptMemory {
    /// Serialize into the scripts section chunk: the payload wrapped in
    /// the tagged SCR sub-block.
    pub fn to_section_chunk(&self, platform: Platform) -> Result<Vec<u8>> {
        let payload = to_chunk(self, platform)?;
        frame_chunks(Some(SCRIPT_BLOCK_TAG), &[&payload], platform)
    }

    /// Parse back from a scripts section chunk.
    pub fn from_section_chunk(chunk: &[u8], platform: Platform) -> Result<Self> {
        let mut buf = SaveBuf::from_bytes(chunk.to_vec());
        let payload = read_block(&mut buf, Some(SCRIPT_BLOCK_TAG), platform)?;
        from_chunk(&payload, platform)
    }
}

// ============================================================
// Tests
// ============================================================
