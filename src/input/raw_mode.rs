// Scoped terminal raw mode: canonical line buffering and echo are off
// while the guard lives, and the saved attributes come back on drop, so
// no exit path can leave the terminal raw.

use std::io;
use std::os::unix::io::RawFd;

pub struct RawModeGuard {
    fd: RawFd,
    saved: libc::termios,
    restored: bool,
}

impl RawModeGuard {
    /// Capture the terminal attributes on `fd` and switch it to raw mode
    /// (no line buffering, no echo). Fails on non-terminal descriptors.
    pub fn enter(fd: RawFd) -> io::Result<Self> {
        let mut saved = unsafe { std::mem::zeroed::<libc::termios>() };
        if unsafe { libc::tcgetattr(fd, &mut saved) } != 0 {
            return Err(io::Error::last_os_error());
        }

        let mut raw = saved;
        raw.c_lflag &= !(libc::ICANON | libc::ECHO);
        if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &raw) } != 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(Self {
            fd,
            saved,
            restored: false,
        })
    }

    /// Put the saved attributes back now instead of at drop, surfacing the
    /// error to the caller. Idempotent.
    pub fn restore(&mut self) -> io::Result<()> {
        if self.restored {
            return Ok(());
        }
        if unsafe { libc::tcsetattr(self.fd, libc::TCSANOW, &self.saved) } != 0 {
            return Err(io::Error::last_os_error());
        }
        self.restored = true;
        Ok(())
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.restore().is_err() {
            log::warn!("failed to restore terminal attributes");
        }
    }
}
