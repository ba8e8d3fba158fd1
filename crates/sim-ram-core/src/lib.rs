//! Simulated RAM backend for logic-simulation testbenches.
//!
//! Blocks of fixed-width rows are allocated in a [`SimRam`], read and written
//! as std_logic vectors, and preloaded from `.bin` or `.hex` dump files.

/// Runtime configuration.
pub mod config;
pub use config::{RamConfig, DEFAULT_MAX_BLOCKS, DEFAULT_PREVIEW_BYTES};

/// Error taxonomy and non-fatal load warnings.
pub mod error;
pub use error::{ErrorClass, LoadWarning, RamError, STATUS_FAILURE, STATUS_OK};

/// std_logic symbols and the byte/bit codec.
pub mod logic;
pub use logic::{decode_byte, format_symbols, merge_byte, LogicSymbol, SYMBOLS_PER_BYTE};

/// Memory blocks and the block registry.
pub mod block;
pub use block::{BlockHandle, BlockRegistry, MemoryBlock};

/// Dump-file loaders.
pub mod loader;
pub use loader::{load_file, FileFormat, HexWordSize, LoadReport};

/// Symbol-level read/write/load API.
pub mod api;
pub use api::{row_symbol_len, SimRam};

/// Integer-status wrappers for the simulator callback boundary.
pub mod host;
pub use host::symbol_from_code;

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
#[cfg(test)]
use tempfile as _;
