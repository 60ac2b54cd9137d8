// Keyboard input: maps single raw-mode bytes to overlay commands and
// provides the blocking stdin key source.

pub mod raw_mode;

use std::io::{self, Read};

use raw_mode::RawModeGuard;

/// An overlay command triggered by a keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// `j` — step opacity down.
    OpacityDown,
    /// `k` — step opacity up.
    OpacityUp,
    /// `q` — leave the control loop.
    Quit,
}

/// Map a raw input byte to a command. Unbound keys map to `None` and are
/// ignored by the control loop.
pub fn match_key(byte: u8) -> Option<KeyCommand> {
    match byte {
        b'j' => Some(KeyCommand::OpacityDown),
        b'k' => Some(KeyCommand::OpacityUp),
        b'q' => Some(KeyCommand::Quit),
        _ => None,
    }
}

/// A blocking, one-byte-at-a-time key stream.
pub trait KeySource {
    /// Block until a key arrives. `Ok(None)` means the stream ended.
    fn next_key(&mut self) -> io::Result<Option<u8>>;
}

/// Keystrokes from stdin with the terminal held in raw mode.
///
/// Raw mode lasts exactly as long as this value lives; dropping it puts the
/// terminal's saved attributes back.
pub struct StdinKeys {
    _raw: RawModeGuard,
    stdin: io::Stdin,
}

impl StdinKeys {
    pub fn new() -> io::Result<Self> {
        let raw = RawModeGuard::enter(libc::STDIN_FILENO)?;
        Ok(Self {
            _raw: raw,
            stdin: io::stdin(),
        })
    }
}

impl KeySource for StdinKeys {
    fn next_key(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.stdin.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }
}
