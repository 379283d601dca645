//! OS interrupt handling for the interactive session.
//!
//! `SIGINT`/`SIGTERM` only flip a process-wide flag; the controller polls
//! it between events and winds down through its normal exit path.

use std::sync::atomic::{AtomicBool, Ordering};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_signal(_: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Routes `SIGINT` and `SIGTERM` to the interrupt flag.
pub fn install() {
    INTERRUPTED.store(false, Ordering::SeqCst);
    let handler = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
    unsafe {
        libc::signal(libc::SIGINT, handler);
        libc::signal(libc::SIGTERM, handler);
    }
}

/// Whether an interrupt arrived since [`install`].
pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;

    // The only test that touches the process-wide flag.
    #[test]
    fn sigint_sets_the_flag() {
        install();
        assert!(!interrupted());

        assert_eq!(unsafe { libc::raise(libc::SIGINT) }, 0);
        assert!(interrupted());

        install();
        assert!(!interrupted());

        unsafe {
            libc::signal(libc::SIGINT, libc::SIG_DFL);
            libc::signal(libc::SIGTERM, libc::SIG_DFL);
        }
    }
}
