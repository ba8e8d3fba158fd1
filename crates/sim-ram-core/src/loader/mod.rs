//! Dump-file ingestion into memory blocks.
//!
//! Two formats are recognised by exact file-name suffix:
//!
//! - `.bin`: raw bytes copied verbatim from the start of the target row.
//! - `.hex`: one hexadecimal word per line, stored little-endian.
//!
//! Oversized or short input never fails a load; it is cropped or left partial
//! and reported as a [`LoadWarning`].

/// Raw binary dump loader.
pub mod binary;
/// Line-oriented hexadecimal dump loader.
pub mod hex;

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::{LoadWarning, MemoryBlock, RamError};

pub use binary::load_binary;
pub use hex::{load_hex, parse_hex_lenient, HexWordSize};

/// Dump-file formats understood by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FileFormat {
    /// Raw bytes (`.bin`).
    Binary,
    /// Hexadecimal text, one word per line (`.hex`).
    Hex,
}

impl FileFormat {
    /// File-name suffix selecting this format.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Binary => ".bin",
            Self::Hex => ".hex",
        }
    }

    /// Selects a format from the exact, case-sensitive suffix of `path`.
    ///
    /// The name must be longer than the suffix itself, so a bare `.bin` is
    /// not recognised.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.as_os_str().as_encoded_bytes();
        [Self::Binary, Self::Hex].into_iter().find(|format| {
            let suffix = format.suffix().as_bytes();
            name.len() > suffix.len() && name.ends_with(suffix)
        })
    }
}

/// Outcome of a successful load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Source file.
    pub path: PathBuf,
    /// Format the file was parsed as.
    pub format: FileFormat,
    /// Byte offset within the block where loading started.
    pub offset: usize,
    /// Bytes copied into the block.
    pub bytes_written: usize,
    /// Non-fatal conditions hit while loading.
    pub warnings: Vec<LoadWarning>,
}

impl LoadReport {
    pub(crate) fn new(path: &Path, format: FileFormat, offset: usize) -> Self {
        Self {
            path: path.to_path_buf(),
            format,
            offset,
            bytes_written: 0,
            warnings: Vec::new(),
        }
    }

    /// Returns `true` when the load completed without warnings.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub(crate) fn push_warning(&mut self, warning: LoadWarning) {
        warn!(path = %self.path.display(), "{warning}");
        self.warnings.push(warning);
    }
}

/// Loads `path` into `block` starting at `row`, dispatching on the suffix.
///
/// # Errors
///
/// Returns [`RamError::UnsupportedFormat`] for unrecognised suffixes (the
/// block is not touched), [`RamError::InvalidRow`] when `row` is out of range,
/// and [`RamError::FileNotFound`] / [`RamError::Io`] when the file cannot be
/// opened or inspected.
pub fn load_file(block: &mut MemoryBlock, row: u32, path: &Path) -> Result<LoadReport, RamError> {
    match FileFormat::from_path(path) {
        Some(FileFormat::Binary) => load_binary(block, row, path),
        Some(FileFormat::Hex) => load_hex(block, row, path),
        None => Err(RamError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use rstest::rstest;

    use super::{load_file, FileFormat};
    use crate::{MemoryBlock, RamError};

    #[rstest]
    #[case("rom.bin", Some(FileFormat::Binary))]
    #[case("dir/firmware.hex", Some(FileFormat::Hex))]
    #[case("image.dat", None)]
    #[case("ROM.BIN", None)]
    #[case(".bin", None)]
    #[case("rom.bin.gz", None)]
    #[case("romhex", None)]
    fn suffix_selects_format(#[case] name: &str, #[case] expected: Option<FileFormat>) {
        assert_eq!(FileFormat::from_path(Path::new(name)), expected);
    }

    #[test]
    fn unsupported_suffix_leaves_block_untouched() {
        let mut block = MemoryBlock::new(4, 2).expect("valid geometry");
        let result = load_file(&mut block, 0, Path::new("image.dat"));
        assert!(matches!(result, Err(RamError::UnsupportedFormat { .. })));
        assert!(block.bytes().iter().all(|byte| *byte == 0));
    }

    #[test]
    fn missing_file_is_reported_as_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut block = MemoryBlock::new(4, 2).expect("valid geometry");
        for name in ["absent.bin", "absent.hex"] {
            let result = load_file(&mut block, 0, &dir.path().join(name));
            assert!(matches!(result, Err(RamError::FileNotFound { .. })));
        }
    }
}
