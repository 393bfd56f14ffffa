// lib.rs -- domain entities serialized through the rustsave-common engine
//
// Only the entities the engine itself depends on for detection and testing
// live here: the summary record at the head of every save and the script
// memory subsystem. The long tail of pool entities follows the same
// SaveObject pattern.

pub mod script;
pub mod summary;

pub use script::{ScriptMemory, ScriptThread, ThreadFlags};
pub use summary::{ConsolePrefs, SaveTime, SummaryVars};
