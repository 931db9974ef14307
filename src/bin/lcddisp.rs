//! Command line control of an lcdi2c display

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::fmt::Display;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use alphalcd::metadata::{self, Metadata};
use alphalcd::{DeviceChannel, DeviceInterface, Error, Geometry, Lcd};
use clap::{Parser, ValueEnum};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Scroll {
    Left,
    Right,
}

#[derive(Parser)]
#[command(
    name = "lcddisp",
    version,
    about = "Control an alphanumeric LCD driven by the lcdi2c kernel module"
)]
struct Cli {
    /// Switch the backlight on
    #[arg(long, overrides_with = "no_backlight")]
    backlight: bool,
    /// Switch the backlight off
    #[arg(long)]
    no_backlight: bool,

    /// Show the cursor
    #[arg(long, overrides_with = "no_cursor")]
    cursor: bool,
    /// Hide the cursor
    #[arg(long)]
    no_cursor: bool,

    /// Make the cursor blink
    #[arg(long, overrides_with = "no_blink")]
    blink: bool,
    /// Stop the cursor blinking
    #[arg(long)]
    no_blink: bool,

    /// Re-initialise the display controller
    #[arg(long)]
    reset: bool,

    /// Clear the display
    #[arg(long)]
    clear: bool,

    /// Move the cursor to the top left corner
    #[arg(long)]
    home: bool,

    /// Shift the display contents by one cell
    #[arg(long, value_enum)]
    scroll: Option<Scroll>,

    /// Print the cursor position
    #[arg(long)]
    get_position: bool,

    /// Move the cursor
    #[arg(long, num_args = 2, value_names = ["COL", "ROW"], allow_negative_numbers = true)]
    set_position: Option<Vec<i32>>,

    /// Print the display size as `COLS ROWS`
    #[arg(long)]
    get_size: bool,

    /// Print the I2C bus and address of the display
    #[arg(long)]
    get_address: bool,

    /// Text to show, one display row per line (`\n` separates lines)
    #[arg(short, long, value_name = "TEXT")]
    print: Option<String>,

    /// Continue lines longer than the display on the next row
    #[arg(long)]
    wrap: bool,

    /// Scroll the display up when the text has more rows than it
    #[arg(long)]
    autoscroll: bool,

    /// Driver metadata file
    #[arg(long, value_name = "PATH", default_value = metadata::META_FILE_PATH)]
    meta: PathBuf,

    /// Device node, found through sysfs when not given
    #[arg(long, value_name = "PATH")]
    device: Option<PathBuf>,

    /// File whose lines are shown on the display (`-` reads stdin); takes
    /// precedence over --print
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,
}

const fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}

/// Split `lines` into display rows
///
/// Each row is cut to `columns` characters, or continued on the next row
/// when `wrap` is set.
fn layout_rows<'a>(
    lines: impl IntoIterator<Item = &'a str>,
    columns: usize,
    wrap: bool,
) -> Vec<String> {
    let mut rows = Vec::new();
    for line in lines {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            rows.push(String::new());
        } else if wrap {
            rows.extend(chars.chunks(columns).map(|chunk| chunk.iter().collect()));
        } else {
            rows.push(chars.iter().take(columns).collect());
        }
    }
    rows
}

/// Rows for `--print`, where a literal `\n` separates lines
fn text_rows(text: &str, columns: usize, wrap: bool) -> Vec<String> {
    let text = text.trim().replace("\\n", "\n");
    layout_rows(text.lines(), columns, wrap)
}

/// Rows for an input file, one per line with surrounding blanks removed
fn input_rows(text: &str, columns: usize, wrap: bool) -> Vec<String> {
    layout_rows(text.lines().map(str::trim), columns, wrap)
}

fn read_input(path: &Path) -> io::Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        fs::read_to_string(path)
    }
}

/// `--get-address` output, e.g. `0x01 0x27`
fn format_address(bus: u32, address: u16) -> String {
    format!("{bus:#04x} {address:#04x}")
}

fn fail(context: &str, e: impl Display) -> ExitCode {
    eprintln!("{context}: {e}");
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let meta = match Metadata::load(&cli.meta) {
        Ok(meta) => meta,
        Err(e) => return fail("Cannot read driver metadata", e),
    };
    let path = match cli.device.clone() {
        Some(path) => path,
        None => match meta.device_path(metadata::I2C_DEVICES_ROOT) {
            Ok(path) => path,
            Err(e) => return fail("Cannot locate the display", e),
        },
    };
    let config = match meta.builder().and_then(alphalcd::Builder::build) {
        Ok(config) => config,
        Err(e) => return fail("Invalid driver metadata", e),
    };

    if cli.get_size {
        let Geometry { columns, rows } = config.geometry;
        println!("{columns} {rows}");
    }
    if cli.get_address {
        match (meta.bus, meta.address) {
            (Some(bus), Some(address)) => println!("{}", format_address(bus, address)),
            _ => return fail("Cannot report address", "metadata has no busno/reg"),
        }
    }

    let input = match cli.input.as_deref().map(read_input).transpose() {
        Ok(input) => input,
        Err(e) => return fail("Cannot read input", e),
    };

    let mut lcd = Lcd::new(DeviceChannel::new(&path), config);
    let mut session = match lcd.session() {
        Ok(session) => session,
        Err(e) => return fail(&format!("Cannot open {}", path.display()), e),
    };
    if let Err(e) = run(&cli, input.as_deref(), &mut *session) {
        return fail("Display error", e);
    }
    match session.finish() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail("Cannot close the display", e),
    }
}

fn run<I>(cli: &Cli, input: Option<&str>, lcd: &mut Lcd<I>) -> Result<(), Error<I>>
where
    I: DeviceInterface,
{
    if cli.reset {
        lcd.reset()?;
    }
    if cli.clear {
        lcd.clear()?;
    }
    if cli.home {
        lcd.home()?;
    }
    if let Some(on) = switch(cli.backlight, cli.no_backlight) {
        lcd.set_backlight(on)?;
    }
    if let Some(on) = switch(cli.cursor, cli.no_cursor) {
        lcd.set_cursor(on)?;
    }
    if let Some(on) = switch(cli.blink, cli.no_blink) {
        lcd.set_blink(on)?;
    }
    if let Some(&[column, row]) = cli.set_position.as_deref() {
        lcd.set_position(column, row)?;
    }
    let columns = lcd.geometry().columns as usize;
    if let Some(text) = input {
        print_rows(lcd, &input_rows(text, columns, cli.wrap), cli.autoscroll)?;
    } else if let Some(text) = &cli.print {
        print_rows(lcd, &text_rows(text, columns, cli.wrap), cli.autoscroll)?;
    }
    if let Some(direction) = cli.scroll {
        lcd.scroll(direction == Scroll::Right)?;
    }
    if cli.get_position {
        let position = lcd.get_position()?;
        println!("{} {}", position.column, position.row);
    }
    Ok(())
}

fn print_rows<I>(lcd: &mut Lcd<I>, lines: &[String], autoscroll: bool) -> Result<(), Error<I>>
where
    I: DeviceInterface,
{
    let rows = lcd.geometry().rows as usize;
    let (visible, overflow) = lines.split_at(lines.len().min(rows));
    for (row, line) in visible.iter().enumerate() {
        lcd.set_line(line, row as u8)?;
    }
    if autoscroll {
        for line in overflow {
            lcd.scroll_vert(line, false)?;
        }
    } else if !overflow.is_empty() {
        eprintln!("{} line(s) did not fit on the display", overflow.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_text_rows_truncates() {
        assert_eq!(text_rows(" abcdef\\nxy ", 4, false), ["abcd", "xy"]);
    }

    #[test]
    fn test_text_rows_wraps() {
        assert_eq!(text_rows("abcdefghij\nk", 4, true), ["abcd", "efgh", "ij", "k"]);
    }

    #[test]
    fn test_input_file_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"  first line  \n\nsecond\\nline\n").unwrap();

        let text = read_input(file.path()).unwrap();
        assert_eq!(input_rows(&text, 6, false), ["first", "", "second"]);
        assert_eq!(
            input_rows(&text, 6, true),
            ["first ", "line", "", "second", "\\nline"]
        );
    }

    #[test]
    fn test_read_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_input(&dir.path().join("absent.txt")).is_err());
    }

    #[test]
    fn test_format_address() {
        assert_eq!(format_address(1, 0x27), "0x01 0x27");
        assert_eq!(format_address(10, 0x3F), "0x0a 0x3f");
    }

    #[test]
    fn test_switch() {
        assert_eq!(switch(true, false), Some(true));
        assert_eq!(switch(false, true), Some(false));
        assert_eq!(switch(false, false), None);
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "lcddisp",
            "--no-backlight",
            "--set-position",
            "3",
            "1",
            "--scroll",
            "left",
            "-p",
            "hello",
        ])
        .unwrap();
        assert_eq!(switch(cli.backlight, cli.no_backlight), Some(false));
        assert_eq!(cli.set_position, Some(vec![3, 1]));
        assert_eq!(cli.scroll, Some(Scroll::Left));
        assert_eq!(cli.print.as_deref(), Some("hello"));
        assert_eq!(cli.meta, PathBuf::from(metadata::META_FILE_PATH));
        assert_eq!(cli.input, None);
    }

    #[test]
    fn test_cli_parses_input_file() {
        let cli = Cli::try_parse_from(["lcddisp", "--wrap", "notes.txt"]).unwrap();
        assert!(cli.wrap);
        assert_eq!(cli.input, Some(PathBuf::from("notes.txt")));

        let cli = Cli::try_parse_from(["lcddisp", "-"]).unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("-")));
    }
}
