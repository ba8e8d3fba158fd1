use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use super::{FileFormat, LoadReport};
use crate::{LoadWarning, MemoryBlock, RamError};

/// First-line character count from which a hex file is read as 64-bit words.
pub const WIDE_LINE_THRESHOLD: usize = 16;

/// Word granularity of a hex dump, fixed by its first line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum HexWordSize {
    /// 4 bytes per line.
    Word32,
    /// 8 bytes per line.
    Word64,
}

impl HexWordSize {
    /// Infers the word size from the first line's length in characters,
    /// excluding the line terminator.
    ///
    /// Lines shorter than [`WIDE_LINE_THRESHOLD`] select 32-bit words. This is
    /// a length heuristic, not a format tag: a short 64-bit value on the first
    /// line makes the whole file load as 32-bit words.
    ///
    /// Legacy loaders counted the trailing `\n` toward this length, so a
    /// 15-character first line selected 64-bit words there. Here it selects
    /// 32-bit words, and CRLF and LF files infer the same size.
    #[must_use]
    pub const fn infer(first_line_len: usize) -> Self {
        if first_line_len < WIDE_LINE_THRESHOLD {
            Self::Word32
        } else {
            Self::Word64
        }
    }

    /// Bytes stored per line.
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::Word32 => 4,
            Self::Word64 => 8,
        }
    }
}

/// Parses a hex value the way C `strtoull(s, NULL, 16)` does.
///
/// Leading whitespace, an optional sign and an optional `0x`/`0X` prefix are
/// skipped, then digits are consumed up to the first non-hex character.
/// Nothing parseable yields 0, overflow saturates at `u64::MAX`, and a leading
/// `-` negates the result in two's complement.
#[must_use]
pub fn parse_hex_lenient(text: &[u8]) -> u64 {
    let mut rest = text.trim_ascii_start();

    let negative = match rest.first() {
        Some(b'-') => {
            rest = &rest[1..];
            true
        }
        Some(b'+') => {
            rest = &rest[1..];
            false
        }
        _ => false,
    };

    if let [b'0', b'x' | b'X', digit, ..] = rest {
        if digit.is_ascii_hexdigit() {
            rest = &rest[2..];
        }
    }

    let mut value: u64 = 0;
    let mut overflowed = false;
    for digit in rest.iter().map_while(|c| char::from(*c).to_digit(16)) {
        match value
            .checked_mul(16)
            .and_then(|shifted| shifted.checked_add(u64::from(digit)))
        {
            Some(next) => value = next,
            None => overflowed = true,
        }
    }

    if overflowed {
        u64::MAX
    } else if negative {
        value.wrapping_neg()
    } else {
        value
    }
}

/// Reads one raw line (terminator included) into `line`, returning its length.
fn next_line(reader: &mut impl BufRead, line: &mut Vec<u8>) -> std::io::Result<usize> {
    line.clear();
    reader.read_until(b'\n', line)
}

fn trim_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Loads a hex dump into `block` starting at `row`.
///
/// Each line is parsed leniently with [`parse_hex_lenient`] and stored
/// little-endian, advancing by the word size inferred from the first line.
/// Loading ends quietly at end of input, on a read error, or at a line whose
/// raw length (terminator included) is shorter than the word size. Input that
/// remains once the block end is reached is dropped with a
/// [`LoadWarning::Truncated`].
///
/// # Errors
///
/// Returns [`RamError::InvalidRow`] when `row` is out of range, and
/// [`RamError::FileNotFound`] / [`RamError::Io`] when the file cannot be
/// opened or its first line cannot be read.
pub fn load_hex(block: &mut MemoryBlock, row: u32, path: &Path) -> Result<LoadReport, RamError> {
    let offset = block.row_offset(row)?;
    let file = File::open(path).map_err(|err| RamError::from_io(path, err))?;
    let mut reader = BufReader::new(file);
    let mut report = LoadReport::new(path, FileFormat::Hex, offset);

    let mut line = Vec::new();
    let first_len = next_line(&mut reader, &mut line).map_err(|err| RamError::from_io(path, err))?;
    if first_len == 0 {
        debug!(path = %path.display(), "hex file is empty");
        return Ok(report);
    }

    let word = HexWordSize::infer(trim_terminator(&line).len());
    let word_bytes = word.bytes();
    debug!(path = %path.display(), ?word, offset, "loading hex file");

    let dest = block.tail_from_row_mut(row)?;
    let mut cursor = 0;
    loop {
        let bytes = parse_hex_lenient(&line).to_le_bytes();
        let count = word_bytes.min(dest.len() - cursor);
        dest[cursor..cursor + count].copy_from_slice(&bytes[..count]);
        cursor += count;

        match next_line(&mut reader, &mut line) {
            Ok(len) if len >= word_bytes => {}
            Ok(_) => break,
            Err(err) => {
                debug!(path = %path.display(), %err, "stopping hex load on read error");
                break;
            }
        }

        if cursor == dest.len() {
            report.bytes_written = cursor;
            report.push_warning(LoadWarning::Truncated {
                path: path.to_path_buf(),
                wanted: None,
                available: dest.len(),
            });
            return Ok(report);
        }
    }

    report.bytes_written = cursor;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rstest::rstest;

    use super::{load_hex, parse_hex_lenient, HexWordSize};
    use crate::{LoadWarning, MemoryBlock};

    fn hex_fixture(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("image.hex");
        fs::write(&path, contents).expect("write fixture");
        (dir, path)
    }

    #[rstest]
    #[case("000000ff", 0xFF)]
    #[case("DEADbeef", 0xDEAD_BEEF)]
    #[case("  0x1f\n", 0x1F)]
    #[case("12zz34", 0x12)]
    #[case("zz", 0)]
    #[case("", 0)]
    #[case("0x", 0)]
    #[case("+10", 0x10)]
    #[case("-1", u64::MAX)]
    #[case("ffffffffffffffff", u64::MAX)]
    #[case("1ffffffffffffffff", u64::MAX)]
    fn lenient_parse_matches_strtoull(#[case] text: &str, #[case] expected: u64) {
        assert_eq!(parse_hex_lenient(text.as_bytes()), expected);
    }

    #[rstest]
    #[case(8, HexWordSize::Word32)]
    #[case(15, HexWordSize::Word32)]
    #[case(16, HexWordSize::Word64)]
    #[case(20, HexWordSize::Word64)]
    fn word_size_follows_first_line_length(#[case] len: usize, #[case] expected: HexWordSize) {
        assert_eq!(HexWordSize::infer(len), expected);
    }

    #[test]
    fn short_lines_load_as_little_endian_32_bit_words() {
        let (_dir, path) = hex_fixture("000000ff\n00000001\n");
        let mut block = MemoryBlock::new(4, 2).expect("valid geometry");

        let report = load_hex(&mut block, 0, &path).expect("load succeeds");

        assert_eq!(block.row_bytes(0).expect("row 0"), &[0xFF, 0x00, 0x00, 0x00]);
        assert_eq!(block.row_bytes(1).expect("row 1"), &[0x01, 0x00, 0x00, 0x00]);
        assert_eq!(report.bytes_written, 8);
        assert!(report.is_clean());
    }

    #[test]
    fn long_first_line_selects_64_bit_words() {
        let (_dir, path) = hex_fixture("0807060504030201\n00000000000000aa\n");
        let mut block = MemoryBlock::new(8, 2).expect("valid geometry");

        load_hex(&mut block, 0, &path).expect("load succeeds");

        assert_eq!(
            block.row_bytes(0).expect("row 0"),
            &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]
        );
        assert_eq!(block.row_bytes(1).expect("row 1")[0], 0xAA);
    }

    #[test]
    fn fifteen_character_first_line_selects_32_bit_words() {
        let (_dir, path) = hex_fixture("0000000000000ff\n00000001\n");
        let mut block = MemoryBlock::new(4, 2).expect("valid geometry");

        let report = load_hex(&mut block, 0, &path).expect("load succeeds");

        assert_eq!(block.bytes(), &[0xFF, 0, 0, 0, 1, 0, 0, 0]);
        assert_eq!(report.bytes_written, 8);
    }

    #[test]
    fn loading_starts_at_requested_row() {
        let (_dir, path) = hex_fixture("11223344\n");
        let mut block = MemoryBlock::new(4, 3).expect("valid geometry");

        let report = load_hex(&mut block, 2, &path).expect("load succeeds");

        assert_eq!(report.offset, 8);
        assert_eq!(&block.bytes()[..8], &[0; 8]);
        assert_eq!(block.row_bytes(2).expect("row 2"), &[0x44, 0x33, 0x22, 0x11]);
    }

    #[test]
    fn word_size_is_independent_of_block_width() {
        let (_dir, path) = hex_fixture("aabbccdd\n11223344\n");
        let mut block = MemoryBlock::new(2, 4).expect("valid geometry");

        load_hex(&mut block, 0, &path).expect("load succeeds");

        assert_eq!(
            block.bytes(),
            &[0xDD, 0xCC, 0xBB, 0xAA, 0x44, 0x33, 0x22, 0x11]
        );
    }

    #[test]
    fn input_past_block_end_is_cropped_with_warning() {
        let (_dir, path) = hex_fixture("00000001\n00000002\n00000003\n");
        let mut block = MemoryBlock::new(4, 2).expect("valid geometry");

        let report = load_hex(&mut block, 0, &path).expect("load succeeds");

        assert_eq!(block.bytes(), &[1, 0, 0, 0, 2, 0, 0, 0]);
        assert_eq!(report.bytes_written, 8);
        assert!(matches!(
            report.warnings.as_slice(),
            [LoadWarning::Truncated { available: 8, .. }]
        ));
    }

    #[test]
    fn exact_fit_reports_no_truncation() {
        let (_dir, path) = hex_fixture("00000001\n00000002\n");
        let mut block = MemoryBlock::new(4, 2).expect("valid geometry");

        let report = load_hex(&mut block, 0, &path).expect("load succeeds");

        assert!(report.is_clean());
    }

    #[test]
    fn partial_word_at_block_end_is_clamped() {
        let (_dir, path) = hex_fixture("0807060504030201\n");
        let mut block = MemoryBlock::new(3, 2).expect("valid geometry");

        let report = load_hex(&mut block, 0, &path).expect("load succeeds");

        assert_eq!(block.bytes(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(report.bytes_written, 6);
    }

    #[test]
    fn short_line_ends_input() {
        let (_dir, path) = hex_fixture("00000001\nff\n00000003\n");
        let mut block = MemoryBlock::new(4, 3).expect("valid geometry");

        let report = load_hex(&mut block, 0, &path).expect("load succeeds");

        assert_eq!(report.bytes_written, 4);
        assert_eq!(block.row_bytes(1).expect("row 1"), &[0, 0, 0, 0]);
    }

    #[test]
    fn malformed_digits_load_best_effort_value() {
        // Legacy quirk: parsing stops at the first non-hex character.
        let (_dir, path) = hex_fixture("12g45678\n");
        let mut block = MemoryBlock::new(4, 1).expect("valid geometry");

        load_hex(&mut block, 0, &path).expect("load succeeds");

        assert_eq!(block.bytes(), &[0x12, 0, 0, 0]);
    }

    #[test]
    fn crlf_terminators_do_not_change_word_size() {
        let (_dir, path) = hex_fixture("000000ff\r\n000000ee\r\n");
        let mut block = MemoryBlock::new(4, 2).expect("valid geometry");

        load_hex(&mut block, 0, &path).expect("load succeeds");

        assert_eq!(block.bytes(), &[0xFF, 0, 0, 0, 0xEE, 0, 0, 0]);
    }

    #[test]
    fn empty_file_loads_nothing() {
        let (_dir, path) = hex_fixture("");
        let mut block = MemoryBlock::new(4, 1).expect("valid geometry");

        let report = load_hex(&mut block, 0, &path).expect("load succeeds");

        assert_eq!(report.bytes_written, 0);
        assert!(block.bytes().iter().all(|byte| *byte == 0));
    }
}
