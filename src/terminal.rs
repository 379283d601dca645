//! Scoped raw terminal mode.
//!
//! [`ModeGuard`] captures the terminal configuration, switches to raw input
//! and hides the cursor; dropping it (or calling [`ModeGuard::release`])
//! puts both back. The device is a trait so the guard can be exercised
//! against a mock configuration in tests.

use std::io::{self, IsTerminal};

use crossterm::{cursor, execute};
use tracing::warn;

use crate::error::{MonitorError, Result};

/// A terminal whose input mode can be read and written.
pub trait ModeDevice {
    /// Opaque configuration snapshot.
    type Mode: Clone;

    fn is_terminal(&self) -> bool;

    fn get_mode(&self) -> io::Result<Self::Mode>;

    fn set_mode(&mut self, mode: &Self::Mode) -> io::Result<()>;

    /// Derives the raw configuration: no canonical mode, no echo, no
    /// signal-generating control characters.
    fn make_raw(&self, original: &Self::Mode) -> Self::Mode;

    fn set_cursor_visible(&mut self, visible: bool) -> io::Result<()>;
}

/// Standard input as a termios device; cursor sequences go to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinTerminal;

impl ModeDevice for StdinTerminal {
    type Mode = libc::termios;

    fn is_terminal(&self) -> bool {
        io::stdin().is_terminal()
    }

    fn get_mode(&self) -> io::Result<libc::termios> {
        let mut mode = unsafe { std::mem::zeroed::<libc::termios>() };
        if unsafe { libc::tcgetattr(libc::STDIN_FILENO, &mut mode) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(mode)
    }

    fn set_mode(&mut self, mode: &libc::termios) -> io::Result<()> {
        if unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, mode) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn make_raw(&self, original: &libc::termios) -> libc::termios {
        let mut raw = *original;
        raw.c_lflag &= !(libc::ICANON | libc::ECHO | libc::ISIG);
        raw.c_cc[libc::VMIN] = 1;
        raw.c_cc[libc::VTIME] = 0;
        raw
    }

    fn set_cursor_visible(&mut self, visible: bool) -> io::Result<()> {
        let mut out = io::stdout();
        if visible {
            execute!(out, cursor::Show)
        } else {
            execute!(out, cursor::Hide)
        }
    }
}

/// Raw mode held for the lifetime of the value.
pub struct ModeGuard<D: ModeDevice> {
    device: D,
    original: D::Mode,
    released: bool,
}

impl<D: ModeDevice> ModeGuard<D> {
    /// Captures the current mode, then applies raw mode and hides the cursor.
    ///
    /// Fails with [`MonitorError::TerminalUnavailable`] when `device` is not
    /// a terminal or a mode call fails. A failure after raw mode was applied
    /// restores the captured mode before returning.
    pub fn acquire(mut device: D) -> Result<Self> {
        if !device.is_terminal() {
            return Err(MonitorError::TerminalUnavailable(
                "standard input is not a TTY".into(),
            ));
        }

        let original = device
            .get_mode()
            .map_err(|e| MonitorError::TerminalUnavailable(format!("reading terminal mode: {e}")))?;

        let raw = device.make_raw(&original);
        device
            .set_mode(&raw)
            .map_err(|e| MonitorError::TerminalUnavailable(format!("entering raw mode: {e}")))?;

        let mut guard = Self {
            device,
            original,
            released: false,
        };

        if let Err(e) = guard.device.set_cursor_visible(false) {
            guard.release();
            return Err(MonitorError::TerminalUnavailable(format!("hiding cursor: {e}")));
        }

        Ok(guard)
    }

    /// The configuration captured by [`acquire`](Self::acquire).
    pub fn original(&self) -> &D::Mode {
        &self.original
    }

    /// Restores the captured mode and shows the cursor. Idempotent.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if let Err(e) = self.device.set_mode(&self.original) {
            warn!(error = %e, "failed to restore terminal mode");
        }
        if let Err(e) = self.device.set_cursor_visible(true) {
            warn!(error = %e, "failed to show cursor");
        }
    }
}

impl<D: ModeDevice> Drop for ModeGuard<D> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const ICANON: u32 = 0b0001;
    const ECHO: u32 = 0b0010;
    const ISIG: u32 = 0b0100;
    const OPOST: u32 = 0b1000;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct MockMode {
        lflag: u32,
        cc: [u8; 4],
    }

    #[derive(Debug)]
    struct Shared {
        mode: MockMode,
        cursor_visible: bool,
        sets: usize,
    }

    #[derive(Debug, Clone)]
    struct MockDevice {
        tty: bool,
        fail_set: bool,
        fail_cursor: bool,
        shared: Rc<RefCell<Shared>>,
    }

    fn device() -> (MockDevice, Rc<RefCell<Shared>>) {
        let shared = Rc::new(RefCell::new(Shared {
            mode: MockMode {
                lflag: ICANON | ECHO | ISIG | OPOST,
                cc: [3, 28, 127, 21],
            },
            cursor_visible: true,
            sets: 0,
        }));
        let dev = MockDevice {
            tty: true,
            fail_set: false,
            fail_cursor: false,
            shared: Rc::clone(&shared),
        };
        (dev, shared)
    }

    impl ModeDevice for MockDevice {
        type Mode = MockMode;

        fn is_terminal(&self) -> bool {
            self.tty
        }

        fn get_mode(&self) -> io::Result<MockMode> {
            Ok(self.shared.borrow().mode)
        }

        fn set_mode(&mut self, mode: &MockMode) -> io::Result<()> {
            if self.fail_set {
                return Err(io::Error::other("tcsetattr failed"));
            }
            let mut s = self.shared.borrow_mut();
            s.mode = *mode;
            s.sets += 1;
            Ok(())
        }

        fn make_raw(&self, original: &MockMode) -> MockMode {
            MockMode {
                lflag: original.lflag & !(ICANON | ECHO | ISIG),
                cc: [1, 0, original.cc[2], original.cc[3]],
            }
        }

        fn set_cursor_visible(&mut self, visible: bool) -> io::Result<()> {
            if self.fail_cursor && !visible {
                return Err(io::Error::other("write failed"));
            }
            self.shared.borrow_mut().cursor_visible = visible;
            Ok(())
        }
    }

    #[test]
    fn acquire_then_release_restores_exact_mode() {
        let (dev, shared) = device();
        let before = shared.borrow().mode;

        let mut guard = ModeGuard::acquire(dev).unwrap();
        {
            let s = shared.borrow();
            assert_eq!(s.mode.lflag & (ICANON | ECHO | ISIG), 0);
            assert_eq!(s.mode.lflag & OPOST, OPOST);
            assert!(!s.cursor_visible);
        }
        assert_eq!(*guard.original(), before);

        guard.release();
        let s = shared.borrow();
        assert_eq!(s.mode, before);
        assert!(s.cursor_visible);
    }

    #[test]
    fn release_is_idempotent() {
        let (dev, shared) = device();
        let mut guard = ModeGuard::acquire(dev).unwrap();
        guard.release();
        guard.release();
        drop(guard);
        // one set to enter raw mode, one to restore
        assert_eq!(shared.borrow().sets, 2);
    }

    #[test]
    fn drop_restores_mode() {
        let (dev, shared) = device();
        let before = shared.borrow().mode;
        {
            let _guard = ModeGuard::acquire(dev).unwrap();
            assert_ne!(shared.borrow().mode, before);
        }
        assert_eq!(shared.borrow().mode, before);
        assert!(shared.borrow().cursor_visible);
    }

    #[test]
    fn unwinding_restores_mode() {
        let (dev, shared) = device();
        let before = shared.borrow().mode;
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = ModeGuard::acquire(dev).unwrap();
            panic!("boom");
        }));
        assert!(result.is_err());
        assert_eq!(shared.borrow().mode, before);
    }

    #[test]
    fn not_a_tty_is_terminal_unavailable() {
        let (mut dev, shared) = device();
        dev.tty = false;
        let Err(err) = ModeGuard::acquire(dev) else {
            panic!("acquire should fail");
        };
        assert!(matches!(err, MonitorError::TerminalUnavailable(_)));
        assert_eq!(shared.borrow().sets, 0);
    }

    #[test]
    fn failed_mode_call_leaves_terminal_untouched() {
        let (mut dev, shared) = device();
        let before = shared.borrow().mode;
        dev.fail_set = true;
        let Err(err) = ModeGuard::acquire(dev) else {
            panic!("acquire should fail");
        };
        assert!(matches!(err, MonitorError::TerminalUnavailable(_)));
        assert_eq!(shared.borrow().mode, before);
    }

    #[test]
    fn partial_acquire_is_rolled_back() {
        let (mut dev, shared) = device();
        let before = shared.borrow().mode;
        dev.fail_cursor = true;
        assert!(ModeGuard::acquire(dev).is_err());
        assert_eq!(shared.borrow().mode, before);
        assert!(shared.borrow().cursor_visible);
    }
}
