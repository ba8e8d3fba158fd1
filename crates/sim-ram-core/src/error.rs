use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Status code reported to the simulator for every failed call.
pub const STATUS_FAILURE: i32 = -1;
/// Status code reported to the simulator for a successful call.
pub const STATUS_OK: i32 = 0;

/// Error classes attached to failure diagnostics as the `class` log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ErrorClass {
    /// Block allocation could not be satisfied.
    Allocation,
    /// A handle, row or vector length did not address valid memory.
    Addressing,
    /// A dump file could not be recognised or read.
    File,
}

/// Failure taxonomy for block allocation, addressing and file loading.
#[derive(Debug, Error)]
pub enum RamError {
    /// The registry already holds its configured maximum number of blocks.
    #[error("too many blocks, registry capacity of {capacity} reached")]
    AllocationExhausted {
        /// Configured registry ceiling.
        capacity: usize,
    },
    /// Backing storage for a block could not be obtained.
    #[error("failed to allocate {bytes} bytes of block storage")]
    OutOfMemory {
        /// Requested size in bytes, saturated when the product overflowed.
        bytes: usize,
    },
    /// Allocation requested a zero width or zero row count.
    #[error("invalid block geometry: width={width} rows={rows}")]
    InvalidGeometry {
        /// Requested bytes per row.
        width: u32,
        /// Requested row count.
        rows: u32,
    },
    /// Handle does not name a registered block.
    #[error("block {handle} out of range ({count} blocks registered)")]
    InvalidHandle {
        /// Offending handle.
        handle: u32,
        /// Number of registered blocks.
        count: usize,
    },
    /// Row lies past the end of the addressed block.
    #[error("row {row} out of range (block has {rows} rows)")]
    InvalidRow {
        /// Offending row.
        row: u32,
        /// Row count of the addressed block.
        rows: u32,
    },
    /// A logic vector does not hold exactly `8 * width` symbols.
    #[error("logic vector holds {actual} symbols, row needs {expected}")]
    InvalidVectorLength {
        /// Symbols required by the row width.
        expected: usize,
        /// Symbols supplied by the caller.
        actual: usize,
    },
    /// File name carries neither a `.bin` nor a `.hex` suffix.
    #[error("unsupported file type {}", .path.display())]
    UnsupportedFormat {
        /// Rejected path.
        path: PathBuf,
    },
    /// Dump file does not exist.
    #[error("file {} not found", .path.display())]
    FileNotFound {
        /// Missing path.
        path: PathBuf,
    },
    /// Dump file could not be opened, stat'd or read.
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

impl RamError {
    /// Wraps an I/O failure, mapping a missing file to [`RamError::FileNotFound`].
    #[must_use]
    pub fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            Self::FileNotFound { path }
        } else {
            Self::Io { path, source }
        }
    }

    /// Returns the diagnostics class for this error.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::AllocationExhausted { .. }
            | Self::OutOfMemory { .. }
            | Self::InvalidGeometry { .. } => ErrorClass::Allocation,
            Self::InvalidHandle { .. }
            | Self::InvalidRow { .. }
            | Self::InvalidVectorLength { .. } => ErrorClass::Addressing,
            Self::UnsupportedFormat { .. } | Self::FileNotFound { .. } | Self::Io { .. } => {
                ErrorClass::File
            }
        }
    }
}

/// Non-fatal conditions raised while loading a dump file.
///
/// The load still succeeds; the warning records which part of the input was
/// dropped or missing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum LoadWarning {
    /// Input extends past the end of the block and was cropped.
    Truncated {
        /// Source file.
        path: PathBuf,
        /// Bytes the input wanted to place from the start offset, when known.
        wanted: Option<u64>,
        /// Bytes available between the start offset and the block end.
        available: usize,
    },
    /// Fewer bytes were read than the file size promised.
    ShortRead {
        /// Source file.
        path: PathBuf,
        /// Bytes requested.
        wanted: usize,
        /// Bytes actually copied.
        got: usize,
    },
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Truncated {
                path, available, ..
            } => write!(
                f,
                "file {} bigger than available memory, cropping to {available} bytes",
                path.display()
            ),
            Self::ShortRead { path, wanted, got } => write!(
                f,
                "file {} short read, wanted {wanted} got {got}",
                path.display()
            ),
        }
    }
}
