//! Simulator-facing access API over a block registry.
//!
//! Rows are exchanged as `8 * width` logic symbols ordered most significant
//! byte (highest address in the row) first, most significant bit first within
//! each byte. Every call validates its block, row and vector lengths before
//! touching storage, so a rejected call never mutates memory.

use std::path::Path;

use tracing::{debug, warn};

use crate::logic::{decode_byte, merge_byte, SYMBOLS_PER_BYTE};
use crate::{
    loader, BlockHandle, BlockRegistry, LoadReport, LogicSymbol, MemoryBlock, RamConfig, RamError,
};

/// Number of symbols exchanged for one row of `block`.
#[must_use]
pub const fn row_symbol_len(block: &MemoryBlock) -> usize {
    block.width_bytes() * SYMBOLS_PER_BYTE
}

const fn check_vector_len(block: &MemoryBlock, actual: usize) -> Result<(), RamError> {
    let expected = row_symbol_len(block);
    if actual == expected {
        Ok(())
    } else {
        Err(RamError::InvalidVectorLength { expected, actual })
    }
}

/// Splits a vector into per-byte lanes, most significant byte first.
///
/// `chunks_exact` only yields full lanes, so the array conversion never fails;
/// callers check the vector length first so no remainder is dropped.
fn lanes(symbols: &[LogicSymbol]) -> impl Iterator<Item = &[LogicSymbol; SYMBOLS_PER_BYTE]> {
    symbols
        .chunks_exact(SYMBOLS_PER_BYTE)
        .filter_map(|chunk| chunk.try_into().ok())
}

/// A set of simulated RAM blocks owned by one simulation instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimRam {
    config: RamConfig,
    registry: BlockRegistry,
}

impl Default for SimRam {
    fn default() -> Self {
        Self::with_config(RamConfig::default())
    }
}

impl SimRam {
    /// Creates an empty instance with the given configuration.
    #[must_use]
    pub const fn with_config(config: RamConfig) -> Self {
        let registry = BlockRegistry::with_capacity(config.max_blocks);
        Self { config, registry }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &RamConfig {
        &self.config
    }

    /// Underlying block registry.
    #[must_use]
    pub const fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    /// Number of allocated blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.registry.len()
    }

    /// Looks up a block for inspection.
    ///
    /// # Errors
    ///
    /// Returns [`RamError::InvalidHandle`] when `handle` is not registered.
    pub fn block(&self, handle: BlockHandle) -> Result<&MemoryBlock, RamError> {
        self.registry.get(handle)
    }

    /// Allocates a zero-filled block of `rows` rows, `width` bytes each.
    ///
    /// # Errors
    ///
    /// Returns [`RamError::AllocationExhausted`], [`RamError::InvalidGeometry`]
    /// or [`RamError::OutOfMemory`].
    pub fn allocate(&mut self, width: u32, rows: u32) -> Result<BlockHandle, RamError> {
        self.registry.allocate(width, rows).inspect_err(|err| {
            warn!(width, rows, class = ?err.class(), %err, "block allocation failed");
        })
    }

    /// Decodes one row into `out`.
    ///
    /// `out` must hold exactly `8 * width` symbols and is left untouched when
    /// the call fails.
    ///
    /// # Errors
    ///
    /// Returns [`RamError::InvalidHandle`], [`RamError::InvalidRow`] or
    /// [`RamError::InvalidVectorLength`].
    pub fn read(
        &self,
        handle: BlockHandle,
        row: u32,
        out: &mut [LogicSymbol],
    ) -> Result<(), RamError> {
        let result = self.read_checked(handle, row, out);
        if let Err(err) = &result {
            warn!(block = handle.get(), row, class = ?err.class(), %err, "ram read rejected");
        }
        result
    }

    fn read_checked(
        &self,
        handle: BlockHandle,
        row: u32,
        out: &mut [LogicSymbol],
    ) -> Result<(), RamError> {
        let block = self.registry.resolve(handle, row)?;
        check_vector_len(block, out.len())?;
        let bytes = block.row_bytes(row)?;

        for (chunk, byte) in out
            .chunks_exact_mut(SYMBOLS_PER_BYTE)
            .zip(bytes.iter().rev())
        {
            chunk.copy_from_slice(&decode_byte(*byte));
        }
        Ok(())
    }

    /// Decodes one row into a freshly allocated vector.
    ///
    /// # Errors
    ///
    /// Returns [`RamError::InvalidHandle`] or [`RamError::InvalidRow`].
    pub fn read_row(&self, handle: BlockHandle, row: u32) -> Result<Vec<LogicSymbol>, RamError> {
        let len = self
            .registry
            .get(handle)
            .map(row_symbol_len)
            .inspect_err(|err| {
                warn!(block = handle.get(), row, class = ?err.class(), %err, "ram read rejected");
            })?;
        let mut out = vec![LogicSymbol::Zero; len];
        self.read(handle, row, &mut out)?;
        Ok(out)
    }

    /// Writes one row under a per-bit select mask.
    ///
    /// `symbols` and `select` use the same ordering as [`SimRam::read`]. A bit
    /// is written only where its select symbol is `'1'`; other bits keep their
    /// stored value.
    ///
    /// # Errors
    ///
    /// Returns [`RamError::InvalidHandle`], [`RamError::InvalidRow`] or
    /// [`RamError::InvalidVectorLength`]; memory is not modified.
    pub fn write(
        &mut self,
        handle: BlockHandle,
        row: u32,
        symbols: &[LogicSymbol],
        select: &[LogicSymbol],
    ) -> Result<(), RamError> {
        let result = self.write_checked(handle, row, symbols, select);
        if let Err(err) = &result {
            warn!(block = handle.get(), row, class = ?err.class(), %err, "ram write rejected");
        }
        result
    }

    fn write_checked(
        &mut self,
        handle: BlockHandle,
        row: u32,
        symbols: &[LogicSymbol],
        select: &[LogicSymbol],
    ) -> Result<(), RamError> {
        let block = self.registry.resolve_mut(handle, row)?;
        check_vector_len(block, symbols.len())?;
        check_vector_len(block, select.len())?;
        let bytes = block.row_bytes_mut(row)?;

        let pairs = lanes(symbols).zip(lanes(select));
        for (byte, (data, enable)) in bytes.iter_mut().rev().zip(pairs) {
            *byte = merge_byte(*byte, data, enable);
        }
        Ok(())
    }

    /// Loads a `.bin` or `.hex` dump into a block starting at `row`.
    ///
    /// On success the leading bytes of the row are logged at debug level.
    ///
    /// # Errors
    ///
    /// Returns [`RamError::InvalidHandle`] or [`RamError::InvalidRow`] before
    /// the file is inspected, [`RamError::UnsupportedFormat`] for unknown
    /// suffixes, and [`RamError::FileNotFound`] / [`RamError::Io`] when the
    /// file cannot be opened.
    pub fn load_file(
        &mut self,
        handle: BlockHandle,
        row: u32,
        path: impl AsRef<Path>,
    ) -> Result<LoadReport, RamError> {
        let path = path.as_ref();
        let preview_len = self.config.preview_bytes;
        let result = self
            .registry
            .resolve_mut(handle, row)
            .and_then(|block| loader::load_file(block, row, path));

        match &result {
            Ok(report) => {
                let preview = self
                    .registry
                    .get(handle)
                    .and_then(|block| block.row_bytes(row))
                    .map(|bytes| &bytes[..bytes.len().min(preview_len)])
                    .unwrap_or_default();
                debug!(
                    block = handle.get(),
                    row,
                    path = %path.display(),
                    bytes_written = report.bytes_written,
                    "loaded file: {preview:02x?}"
                );
            }
            Err(err) => {
                warn!(
                    block = handle.get(),
                    row,
                    path = %path.display(),
                    class = ?err.class(),
                    %err,
                    "ram load failed"
                );
            }
        }
        result
    }
}
