//! Memory blocks and the handle-indexed block registry.

use std::ops::Range;

use tracing::debug;

use crate::RamError;

/// Opaque identifier of a registered memory block.
///
/// Handles are dense and assigned in allocation order starting at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct BlockHandle(pub u32);

impl BlockHandle {
    /// Returns the raw handle value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for BlockHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One simulated RAM/ROM instance: `rows` rows of `width` bytes each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryBlock {
    width: u32,
    rows: u32,
    storage: Box<[u8]>,
}

impl MemoryBlock {
    /// Allocates a zero-filled block.
    ///
    /// # Errors
    ///
    /// Returns [`RamError::InvalidGeometry`] when `width` or `rows` is zero,
    /// and [`RamError::OutOfMemory`] when the storage size overflows or cannot
    /// be reserved.
    pub fn new(width: u32, rows: u32) -> Result<Self, RamError> {
        if width == 0 || rows == 0 {
            return Err(RamError::InvalidGeometry { width, rows });
        }
        let total_size = usize::try_from(u64::from(width) * u64::from(rows))
            .map_err(|_| RamError::OutOfMemory { bytes: usize::MAX })?;

        let mut storage = Vec::new();
        storage
            .try_reserve_exact(total_size)
            .map_err(|_| RamError::OutOfMemory { bytes: total_size })?;
        storage.resize(total_size, 0);

        Ok(Self {
            width,
            rows,
            storage: storage.into_boxed_slice(),
        })
    }

    /// Bytes per row.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of addressable rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Total storage size in bytes (`width * rows`).
    #[must_use]
    pub fn total_size(&self) -> usize {
        self.storage.len()
    }

    /// Width in bytes as a `usize` for slice arithmetic.
    #[must_use]
    pub const fn width_bytes(&self) -> usize {
        self.width as usize
    }

    /// Returns the full backing storage.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.storage
    }

    /// Returns the full backing storage mutably.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.storage
    }

    /// Validates `row` against this block.
    ///
    /// # Errors
    ///
    /// Returns [`RamError::InvalidRow`] when `row >= rows`.
    pub const fn check_row(&self, row: u32) -> Result<(), RamError> {
        if row < self.rows {
            Ok(())
        } else {
            Err(RamError::InvalidRow {
                row,
                rows: self.rows,
            })
        }
    }

    /// Byte offset of the first byte of `row`.
    ///
    /// # Errors
    ///
    /// Returns [`RamError::InvalidRow`] when `row >= rows`.
    pub fn row_offset(&self, row: u32) -> Result<usize, RamError> {
        self.check_row(row)?;
        Ok(row as usize * self.width_bytes())
    }

    /// Byte range occupied by `row` within the storage.
    ///
    /// # Errors
    ///
    /// Returns [`RamError::InvalidRow`] when `row >= rows`.
    pub fn row_range(&self, row: u32) -> Result<Range<usize>, RamError> {
        let start = self.row_offset(row)?;
        Ok(start..start + self.width_bytes())
    }

    /// The `width` bytes of `row`, lowest address first.
    ///
    /// # Errors
    ///
    /// Returns [`RamError::InvalidRow`] when `row >= rows`.
    pub fn row_bytes(&self, row: u32) -> Result<&[u8], RamError> {
        let range = self.row_range(row)?;
        Ok(&self.storage[range])
    }

    /// The `width` bytes of `row`, mutably.
    ///
    /// # Errors
    ///
    /// Returns [`RamError::InvalidRow`] when `row >= rows`.
    pub fn row_bytes_mut(&mut self, row: u32) -> Result<&mut [u8], RamError> {
        let range = self.row_range(row)?;
        Ok(&mut self.storage[range])
    }

    /// Storage from the start of `row` to the end of the block.
    ///
    /// # Errors
    ///
    /// Returns [`RamError::InvalidRow`] when `row >= rows`.
    pub fn tail_from_row_mut(&mut self, row: u32) -> Result<&mut [u8], RamError> {
        let start = self.row_offset(row)?;
        Ok(&mut self.storage[start..])
    }
}

/// Ordered set of memory blocks indexed by [`BlockHandle`].
///
/// Blocks are never removed or resized; a handle stays valid for the life of
/// the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRegistry {
    blocks: Vec<MemoryBlock>,
    capacity: usize,
}

impl BlockRegistry {
    /// Creates an empty registry accepting at most `capacity` blocks.
    #[must_use]
    pub const fn with_capacity(capacity: usize) -> Self {
        Self {
            blocks: Vec::new(),
            capacity,
        }
    }

    /// Maximum number of blocks this registry accepts.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of registered blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` when no block has been allocated yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Allocates and registers a zero-filled block.
    ///
    /// # Errors
    ///
    /// Returns [`RamError::AllocationExhausted`] when the registry is full,
    /// otherwise any error from [`MemoryBlock::new`]. The registry is left
    /// unchanged on failure.
    pub fn allocate(&mut self, width: u32, rows: u32) -> Result<BlockHandle, RamError> {
        debug!(width, rows, "allocating block");
        if self.blocks.len() >= self.capacity {
            return Err(RamError::AllocationExhausted {
                capacity: self.capacity,
            });
        }
        let handle = u32::try_from(self.blocks.len()).map_err(|_| {
            RamError::AllocationExhausted {
                capacity: self.capacity,
            }
        })?;
        let block = MemoryBlock::new(width, rows)?;
        debug!(handle, total_size = block.total_size(), "block allocated");
        self.blocks.push(block);
        Ok(BlockHandle(handle))
    }

    /// Looks up a block by handle.
    ///
    /// # Errors
    ///
    /// Returns [`RamError::InvalidHandle`] when `handle` is not registered.
    pub fn get(&self, handle: BlockHandle) -> Result<&MemoryBlock, RamError> {
        self.blocks
            .get(handle.0 as usize)
            .ok_or(RamError::InvalidHandle {
                handle: handle.0,
                count: self.blocks.len(),
            })
    }

    /// Looks up a block by handle, mutably.
    ///
    /// # Errors
    ///
    /// Returns [`RamError::InvalidHandle`] when `handle` is not registered.
    pub fn get_mut(&mut self, handle: BlockHandle) -> Result<&mut MemoryBlock, RamError> {
        let count = self.blocks.len();
        self.blocks
            .get_mut(handle.0 as usize)
            .ok_or(RamError::InvalidHandle {
                handle: handle.0,
                count,
            })
    }

    /// Validates `(handle, row)` and returns the addressed block.
    ///
    /// # Errors
    ///
    /// Returns [`RamError::InvalidHandle`] or [`RamError::InvalidRow`].
    pub fn resolve(&self, handle: BlockHandle, row: u32) -> Result<&MemoryBlock, RamError> {
        let block = self.get(handle)?;
        block.check_row(row)?;
        Ok(block)
    }

    /// Validates `(handle, row)` and returns the addressed block mutably.
    ///
    /// # Errors
    ///
    /// Returns [`RamError::InvalidHandle`] or [`RamError::InvalidRow`].
    pub fn resolve_mut(
        &mut self,
        handle: BlockHandle,
        row: u32,
    ) -> Result<&mut MemoryBlock, RamError> {
        let block = self.get_mut(handle)?;
        block.check_row(row)?;
        Ok(block)
    }

    /// Iterates blocks in handle order.
    pub fn blocks(&self) -> impl Iterator<Item = (BlockHandle, &MemoryBlock)> + '_ {
        (0_u32..)
            .zip(&self.blocks)
            .map(|(index, block)| (BlockHandle(index), block))
    }
}

#[cfg(test)]
mod tests {
    use super::{BlockHandle, BlockRegistry, MemoryBlock};
    use crate::RamError;

    #[test]
    fn new_block_is_zeroed_with_derived_size() {
        let block = MemoryBlock::new(4, 16).expect("valid geometry");
        assert_eq!(block.total_size(), 64);
        assert!(block.bytes().iter().all(|byte| *byte == 0));
    }

    #[test]
    fn zero_geometry_is_rejected() {
        assert!(matches!(
            MemoryBlock::new(0, 4),
            Err(RamError::InvalidGeometry { width: 0, rows: 4 })
        ));
        assert!(matches!(
            MemoryBlock::new(4, 0),
            Err(RamError::InvalidGeometry { width: 4, rows: 0 })
        ));
    }

    #[test]
    fn rows_are_laid_out_row_major() {
        let mut block = MemoryBlock::new(3, 4).expect("valid geometry");
        block.row_bytes_mut(2).expect("row 2").copy_from_slice(&[1, 2, 3]);
        assert_eq!(&block.bytes()[6..9], &[1, 2, 3]);
        assert_eq!(block.row_offset(3).expect("last row"), 9);
        assert_eq!(block.tail_from_row_mut(3).expect("last row").len(), 3);
    }

    #[test]
    fn row_past_end_is_rejected() {
        let block = MemoryBlock::new(2, 2).expect("valid geometry");
        assert!(matches!(
            block.row_bytes(2),
            Err(RamError::InvalidRow { row: 2, rows: 2 })
        ));
    }

    #[test]
    fn handles_are_dense_and_increasing() {
        let mut registry = BlockRegistry::with_capacity(8);
        let handles: Vec<_> = (1..=3)
            .map(|width| registry.allocate(width, 2).expect("capacity available"))
            .collect();
        assert_eq!(handles, [BlockHandle(0), BlockHandle(1), BlockHandle(2)]);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get(BlockHandle(2)).expect("registered").width(), 3);
        let widths: Vec<_> = registry
            .blocks()
            .map(|(handle, block)| (handle.get(), block.width()))
            .collect();
        assert_eq!(widths, [(0, 1), (1, 2), (2, 3)]);
    }

    #[test]
    fn exhausted_registry_rejects_allocation_without_growing() {
        let mut registry = BlockRegistry::with_capacity(1);
        registry.allocate(1, 1).expect("first block fits");
        assert!(matches!(
            registry.allocate(1, 1),
            Err(RamError::AllocationExhausted { capacity: 1 })
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unreservable_storage_leaves_registry_empty() {
        let mut registry = BlockRegistry::with_capacity(4);
        assert!(matches!(
            registry.allocate(u32::MAX, u32::MAX),
            Err(RamError::OutOfMemory { .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn failed_geometry_does_not_consume_a_handle() {
        let mut registry = BlockRegistry::with_capacity(4);
        assert!(registry.allocate(0, 1).is_err());
        assert_eq!(registry.allocate(1, 1).expect("valid"), BlockHandle(0));
    }

    #[test]
    fn resolve_checks_handle_before_row() {
        let mut registry = BlockRegistry::with_capacity(4);
        let handle = registry.allocate(4, 2).expect("valid");
        assert!(registry.resolve(handle, 1).is_ok());
        assert!(matches!(
            registry.resolve(BlockHandle(1), 0),
            Err(RamError::InvalidHandle {
                handle: 1,
                count: 1
            })
        ));
        assert!(matches!(
            registry.resolve_mut(handle, 2),
            Err(RamError::InvalidRow { row: 2, rows: 2 })
        ));
    }
}
