//! Status-code entry points for the simulator callback boundary.
//!
//! The simulator passes std_logic vectors as raw code bytes and expects
//! integer status results. These wrappers translate both directions and
//! never panic; every failure is logged by the underlying [`SimRam`] call.

use tracing::debug;

use crate::error::{STATUS_FAILURE, STATUS_OK};
use crate::{BlockHandle, LogicSymbol, SimRam};

/// Maps a raw simulator code to a symbol, treating unknown codes as undriven.
#[must_use]
pub fn symbol_from_code(code: u8) -> LogicSymbol {
    LogicSymbol::from_u8(code).unwrap_or(LogicSymbol::Unknown)
}

fn symbols_from_codes(codes: &[u8]) -> Vec<LogicSymbol> {
    codes.iter().copied().map(symbol_from_code).collect()
}

impl SimRam {
    /// Allocates a block, returning its handle or `-1`.
    pub fn ram_create(&mut self, width: u32, rows: u32) -> i32 {
        self.allocate(width, rows)
            .ok()
            .and_then(|handle| i32::try_from(handle.get()).ok())
            .unwrap_or(STATUS_FAILURE)
    }

    /// Loads a dump file, returning `0` on success or `-1` on failure.
    pub fn ram_load_file(&mut self, block: u32, row: u32, name: &str) -> i32 {
        match self.load_file(BlockHandle(block), row, name) {
            Ok(_) => STATUS_OK,
            Err(_) => STATUS_FAILURE,
        }
    }

    /// Fills `vec` with the raw codes of one row; `vec` is left untouched on
    /// failure.
    pub fn ram_read(&self, block: u32, row: u32, vec: &mut [u8]) {
        let mut symbols = vec![LogicSymbol::Zero; vec.len()];
        if self.read(BlockHandle(block), row, &mut symbols).is_ok() {
            for (code, symbol) in vec.iter_mut().zip(&symbols) {
                *code = symbol.as_u8();
            }
        }
    }

    /// Writes one row from raw data and select codes.
    ///
    /// The callback has no status result, so a rejected write is only logged
    /// and memory is left unchanged.
    pub fn ram_write(&mut self, block: u32, row: u32, vec: &[u8], sel: &[u8]) {
        let symbols = symbols_from_codes(vec);
        let select = symbols_from_codes(sel);
        if self.write(BlockHandle(block), row, &symbols, &select).is_err() {
            debug!(block, row, "raw write dropped");
        }
    }
}
