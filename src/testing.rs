//! In-memory LCD used by the unit tests
//!
//! Behaves like the lcdi2c driver for the default command table: commands
//! are recognised by sequence number, so tables that only change direction
//! bits still work.

use crate::command::{Command, CommandCode, DEFAULT_COMMANDS};
use crate::interface::DeviceInterface;
use crate::layout::{FLAG_ON, Position};

#[derive(Debug, PartialEq, Eq)]
pub enum FakeError {
    Closed,
    AlreadyOpen,
    Unsupported(CommandCode),
}

#[derive(Debug)]
pub struct FakeLcd {
    columns: usize,
    rows: usize,
    cells: Vec<u8>,
    position: Position,
    backlight: bool,
    cursor: bool,
    blink: bool,
    glyphs: [[u8; 8]; 8],
    open: bool,
    calls: Vec<CommandCode>,
    writes: Vec<Vec<u8>>,
    flushes: usize,
}

impl FakeLcd {
    /// Open device with a blank display
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            cells: vec![b' '; columns * rows],
            position: Position::default(),
            backlight: true,
            cursor: false,
            blink: false,
            glyphs: [[0; 8]; 8],
            open: true,
            calls: Vec::new(),
            writes: Vec::new(),
            flushes: 0,
        }
    }

    /// Closed device with a blank display
    pub fn closed(columns: usize, rows: usize) -> Self {
        Self {
            open: false,
            ..Self::new(columns, rows)
        }
    }

    pub fn calls(&self) -> &[CommandCode] {
        &self.calls
    }

    pub fn writes(&self) -> &[Vec<u8>] {
        &self.writes
    }

    pub const fn flushes(&self) -> usize {
        self.flushes
    }

    pub fn row(&self, row: usize) -> String {
        let start = row * self.columns;
        self.cells[start..start + self.columns]
            .iter()
            .copied()
            .map(char::from)
            .collect()
    }

    pub fn fill_rows(&mut self, rows: &[&str]) {
        for (row, text) in rows.iter().enumerate() {
            let start = row * self.columns;
            let field = &mut self.cells[start..start + self.columns];
            field.fill(b' ');
            for (cell, byte) in field.iter_mut().zip(text.bytes()) {
                *cell = byte;
            }
        }
    }

    fn command(code: CommandCode) -> Option<Command> {
        let nr = code.decode().nr;
        DEFAULT_COMMANDS
            .iter()
            .find(|(_, c)| c.decode().nr == nr)
            .map(|(command, _)| *command)
    }

    fn index(&self) -> usize {
        (self.position.row as usize * self.columns + self.position.column as usize)
            % self.cells.len()
    }

    fn advance(&mut self) {
        let next = (self.index() + 1) % self.cells.len();
        self.position = self.position_of(next);
    }

    fn position_of(&self, index: usize) -> Position {
        Position {
            column: (index % self.columns) as u8,
            row: (index / self.columns) as u8,
        }
    }

    fn put(&mut self, byte: u8) {
        match byte {
            b'\n' | b'\r' => {
                self.position.column = 0;
                self.position.row = ((self.position.row as usize + 1) % self.rows) as u8;
            }
            0x08 => self.position.column = self.position.column.saturating_sub(1),
            _ => {
                let index = self.index();
                self.cells[index] = byte;
                self.advance();
            }
        }
    }

    fn scroll_vert(&mut self, down: bool, line: &[u8]) {
        let width = self.columns;
        let last = (self.rows - 1) * width;
        let line = &line[..width.min(line.len())];
        if down {
            self.cells.copy_within(..last, width);
            self.cells[..width].fill(b' ');
            self.cells[..line.len()].copy_from_slice(line);
        } else {
            self.cells.copy_within(width.., 0);
            self.cells[last..].fill(b' ');
            self.cells[last..last + line.len()].copy_from_slice(line);
        }
    }
}

impl DeviceInterface for FakeLcd {
    type Error = FakeError;

    fn open(&mut self) -> Result<(), Self::Error> {
        if self.open {
            return Err(FakeError::AlreadyOpen);
        }
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        if self.open {
            self.flushes += 1;
        }
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn control(&mut self, code: CommandCode, arg: Option<&mut [u8]>) -> Result<(), Self::Error> {
        if !self.open {
            return Err(FakeError::Closed);
        }
        self.calls.push(code);
        let command = Self::command(code).ok_or(FakeError::Unsupported(code))?;
        let mut empty: [u8; 0] = [];
        let buf: &mut [u8] = match arg {
            Some(buf) => buf,
            None => &mut empty,
        };
        let on = buf.first() == Some(&FLAG_ON);
        let columns = self.columns;
        match command {
            Command::GetChar => buf[0] = self.cells[self.index()],
            Command::SetChar => {
                let index = self.index();
                self.cells[index] = buf[0];
                self.advance();
            }
            Command::GetLine => {
                let start = self.position.row as usize * columns;
                buf[..columns].copy_from_slice(&self.cells[start..start + columns]);
            }
            Command::SetLine => {
                let start = self.position.row as usize * columns;
                self.cells[start..start + columns].copy_from_slice(&buf[..columns]);
            }
            Command::GetBuffer => {
                let cells = self.cells.len();
                buf[..cells].copy_from_slice(&self.cells);
            }
            Command::SetBuffer => {
                let cells = self.cells.len();
                self.cells.copy_from_slice(&buf[..cells]);
            }
            Command::GetPosition => buf[..2].copy_from_slice(&self.position.encode()),
            Command::SetPosition => {
                self.position = Position {
                    column: buf[0],
                    row: buf[1],
                };
            }
            Command::GetBacklight => buf[0] = if self.backlight { b'1' } else { b'0' },
            Command::SetBacklight => self.backlight = on,
            Command::GetCursor => buf[0] = if self.cursor { b'1' } else { b'0' },
            Command::SetCursor => self.cursor = on,
            Command::GetBlink => buf[0] = if self.blink { b'1' } else { b'0' },
            Command::SetBlink => self.blink = on,
            Command::GetCustomChar => {
                let glyph = self.glyphs[usize::from(buf[0] & 0x07)];
                buf[1..9].copy_from_slice(&glyph);
            }
            Command::SetCustomChar => {
                let slot = usize::from(buf[0] & 0x07);
                self.glyphs[slot].copy_from_slice(&buf[1..9]);
            }
            Command::ScrollHz => {}
            Command::ScrollVert => {
                let down = u32::from_ne_bytes([buf[0], buf[1], buf[2], buf[3]]) != 0;
                let line = buf[4..].to_vec();
                self.scroll_vert(down, &line);
            }
            Command::Clear => {
                self.cells.fill(b' ');
                self.position = Position::default();
            }
            Command::Home => self.position = Position::default(),
            Command::Reset => {
                *self = Self {
                    calls: core::mem::take(&mut self.calls),
                    ..Self::new(self.columns, self.rows)
                };
            }
            Command::GetVersion => return Err(FakeError::Unsupported(code)),
        }
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<Option<usize>, Self::Error> {
        if !self.open {
            return Ok(None);
        }
        self.writes.push(data.to_vec());
        for byte in data {
            self.put(*byte);
        }
        Ok(Some(data.len()))
    }

    fn flush(&mut self) -> Result<Option<()>, Self::Error> {
        if !self.open {
            return Ok(None);
        }
        self.flushes += 1;
        Ok(Some(()))
    }
}
