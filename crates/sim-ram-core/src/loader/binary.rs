use std::fs::{self, File};
use std::io::{ErrorKind, Read};
use std::path::Path;

use tracing::debug;

use super::{FileFormat, LoadReport};
use crate::{LoadWarning, MemoryBlock, RamError};

/// Fills `dest` from `reader` until it is full or input ends.
///
/// Read errors other than interruption end the copy like end of input; the
/// bytes copied so far stay in place.
fn read_into(reader: &mut impl Read, dest: &mut [u8], path: &Path) -> usize {
    let mut filled = 0;
    while filled < dest.len() {
        match reader.read(&mut dest[filled..]) {
            Ok(0) => break,
            Ok(count) => filled += count,
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err) => {
                debug!(path = %path.display(), %err, "stopping binary read on error");
                break;
            }
        }
    }
    filled
}

/// Copies a raw binary file into `block` starting at `row`.
///
/// A file larger than the space between the row offset and the block end is
/// cropped with a [`LoadWarning::Truncated`]. A file yielding fewer bytes than
/// its reported size produces a [`LoadWarning::ShortRead`]; the bytes read are
/// kept and the rest of the destination keeps its previous contents.
///
/// # Errors
///
/// Returns [`RamError::InvalidRow`] when `row` is out of range, and
/// [`RamError::FileNotFound`] / [`RamError::Io`] when the file cannot be
/// stat'd or opened.
pub fn load_binary(block: &mut MemoryBlock, row: u32, path: &Path) -> Result<LoadReport, RamError> {
    let offset = block.row_offset(row)?;
    let size = fs::metadata(path)
        .map_err(|err| RamError::from_io(path, err))?
        .len();
    let mut report = LoadReport::new(path, FileFormat::Binary, offset);

    let available = block.total_size() - offset;
    let wanted = match usize::try_from(size) {
        Ok(size) if size <= available => size,
        _ => {
            report.push_warning(LoadWarning::Truncated {
                path: path.to_path_buf(),
                wanted: Some(size),
                available,
            });
            available
        }
    };

    let mut file = File::open(path).map_err(|err| RamError::from_io(path, err))?;
    debug!(path = %path.display(), offset, wanted, "loading binary file");

    let dest = &mut block.tail_from_row_mut(row)?[..wanted];
    let got = read_into(&mut file, dest, path);
    if got < wanted {
        report.push_warning(LoadWarning::ShortRead {
            path: path.to_path_buf(),
            wanted,
            got,
        });
    }

    report.bytes_written = got;
    Ok(report)
}
