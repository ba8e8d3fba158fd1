//! CLI entry point for the simulated RAM dump inspector.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use sim_ram_core::{format_symbols, RamConfig, SimRam};
#[cfg(test)]
use tempfile as _;
use tracing_subscriber::EnvFilter;

const USAGE_TEXT: &str = "\
Usage: simram <command> [options]

Commands:
  dump <file> --width <bytes> --rows <n>  Load a .bin/.hex dump and print its rows

Options:
  -w, --width <bytes>  Bytes per row
  -r, --rows <n>       Number of rows in the block
      --row <n>        Row at which loading starts (default 0)
      --hex            Print rows as hex bytes instead of std_logic strings
  -h, --help           Show this help message

Rows are printed most significant byte first. Set RUST_LOG=debug for load
diagnostics.

Examples:
  simram dump boot.hex --width 4 --rows 1024
  simram dump rom.bin -w 8 -r 512 --row 16 --hex
";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Dump(DumpArgs),
}

#[derive(Debug, PartialEq, Eq)]
struct DumpArgs {
    input: PathBuf,
    width: u32,
    rows: u32,
    start_row: u32,
    hex: bool,
}

#[derive(Debug)]
enum ParseResult {
    Command(Command),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(ParseResult::Help);
    }

    let command_str = first.to_string_lossy().to_string();

    match command_str.as_str() {
        "dump" => parse_dump_args(args)
            .map(Command::Dump)
            .map(ParseResult::Command),
        other => Err(format!("unknown command: {other}")),
    }
}

fn parse_number(flag: &str, value: Option<OsString>) -> Result<u32, String> {
    let value = value.ok_or_else(|| format!("missing value for {flag}"))?;
    let text = value.to_string_lossy();
    text.parse()
        .map_err(|_| format!("invalid value for {flag}: {text}"))
}

#[allow(clippy::while_let_on_iterator)]
fn parse_dump_args(mut args: impl Iterator<Item = OsString>) -> Result<DumpArgs, String> {
    let mut input: Option<PathBuf> = None;
    let mut width: Option<u32> = None;
    let mut rows: Option<u32> = None;
    let mut start_row = 0;
    let mut hex = false;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "--hex" {
            hex = true;
            continue;
        }

        if arg == "-w" || arg == "--width" {
            width = Some(parse_number("--width", args.next())?);
            continue;
        }

        if arg == "-r" || arg == "--rows" {
            rows = Some(parse_number("--rows", args.next())?);
            continue;
        }

        if arg == "--row" {
            start_row = parse_number("--row", args.next())?;
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if input.is_some() {
            return Err("multiple input paths provided".to_string());
        }
        input = Some(PathBuf::from(arg));
    }

    Ok(DumpArgs {
        input: input.ok_or_else(|| "missing input path".to_string())?,
        width: width.ok_or_else(|| "missing --width".to_string())?,
        rows: rows.ok_or_else(|| "missing --rows".to_string())?,
        start_row,
        hex,
    })
}

fn format_row_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .rev()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn run_dump(args: &DumpArgs) -> Result<(), i32> {
    tracing::debug!(?args, "running dump");
    let mut ram = SimRam::with_config(RamConfig::default().with_max_blocks(1));
    let handle = ram.allocate(args.width, args.rows).map_err(|e| {
        eprintln!("error: {e}");
        1
    })?;

    let report = ram
        .load_file(handle, args.start_row, &args.input)
        .map_err(|e| {
            eprintln!("error: {e}");
            1
        })?;

    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }

    let digits = args.rows.saturating_sub(1).to_string().len();
    for row in 0..args.rows {
        let line = if args.hex {
            ram.block(handle)
                .and_then(|block| block.row_bytes(row))
                .map(format_row_hex)
        } else {
            ram.read_row(handle, row).map(|symbols| format_symbols(&symbols))
        };
        match line {
            Ok(line) => println!("{row:>digits$}: {line}"),
            Err(e) => {
                eprintln!("error: {e}");
                return Err(1);
            }
        }
    }

    eprintln!(
        "Loaded {} ({} bytes at offset {}) into {} rows of {} bytes",
        args.input.display(),
        report.bytes_written,
        report.offset,
        args.rows,
        args.width
    );
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Command(Command::Dump(args))) => match run_dump(&args) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Err(error) => {
            if error.starts_with("Usage:") {
                println!("{error}");
            } else {
                eprintln!("error: {error}");
                eprintln!("{USAGE_TEXT}");
            }
            1
        }
    };

    std::process::exit(exit_code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::path::PathBuf;

    fn os_args(args: &[&str]) -> impl Iterator<Item = OsString> {
        args.iter().map(OsString::from).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parses_dump_command() {
        let result = parse_dump_args(os_args(&[
            "boot.hex", "--width", "4", "-r", "16", "--row", "2", "--hex",
        ]))
        .expect("valid dump args should parse");

        assert_eq!(
            result,
            DumpArgs {
                input: PathBuf::from("boot.hex"),
                width: 4,
                rows: 16,
                start_row: 2,
                hex: true,
            }
        );
    }

    #[test]
    fn parses_help_flag() {
        let result = parse_args(os_args(&["--help"])).expect("help should parse without error");
        assert!(matches!(result, ParseResult::Help));
    }

    #[test]
    fn rejects_unknown_command() {
        let error = parse_args(os_args(&["unknown"])).expect_err("unknown command should fail");
        assert!(error.contains("unknown command"));
    }

    #[test]
    fn dump_requires_geometry() {
        let error =
            parse_dump_args(os_args(&["rom.bin", "-w", "4"])).expect_err("rows are required");
        assert!(error.contains("missing --rows"));
    }

    #[test]
    fn dump_rejects_non_numeric_width() {
        let error = parse_dump_args(os_args(&["rom.bin", "-w", "four", "-r", "1"]))
            .expect_err("width must be numeric");
        assert!(error.contains("invalid value for --width"));
    }

    #[test]
    fn dump_rejects_missing_option_value() {
        let error = parse_dump_args(os_args(&["rom.bin", "--row"])).expect_err("value required");
        assert!(error.contains("missing value for --row"));
    }

    #[test]
    fn hex_rows_print_highest_address_first() {
        assert_eq!(format_row_hex(&[0x01, 0x02, 0xAB]), "AB 02 01");
    }
}
