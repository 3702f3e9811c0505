//! Effect handlers for the external store and entropy source
//!
//! - `memory`: shared in-memory map with write-failure injection (tests)
//! - `filesystem`: one file per key with rename-on-write (production)
//! - `random`: UUID v4 (production) and sequential (tests) id entropy

mod filesystem;
mod memory;
mod random;

pub use filesystem::FilesystemStorageHandler;
pub use memory::MemoryStorageHandler;
pub use random::{OsRandomHandler, SequentialRandomHandler};
