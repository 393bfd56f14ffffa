// lib.rs -- save serialization engine shared by every tool in the workspace
//
// The engine is a pure transform between bytes and typed state: a byte
// cursor, a per-platform format descriptor, a nested block framer, the
// outer-container assembler with its trailing checksum, and a format
// auto-detector. Domain entities plug in through the SaveObject contract
// and live in rustsave-game.

pub mod block;
pub mod container;
pub mod detect;
pub mod error;
pub mod object;
pub mod platform;
pub mod savebuf;

pub use block::{frame_chunks, read_block};
pub use container::{assemble, checksum, disassemble, verify_checksum, Section, SectionData};
pub use detect::detect;
pub use error::{Result, SaveError};
pub use object::{from_chunk, to_chunk, SaveObject};
pub use platform::Platform;
pub use savebuf::SaveBuf;
