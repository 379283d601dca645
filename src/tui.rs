//! The interactive session: terminal setup, the event loop, and teardown.

use std::io::{self, Stdout};
use std::panic;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use tracing::{debug, warn};

use crate::config::Config;
use crate::controller::Controller;
use crate::error::Result;
use crate::input::{self, KeyEvent, RawStdin};
use crate::process::{ProcessSource, SignalTerminator, SysinfoSource, Terminator};
use crate::signal;
use crate::terminal::{ModeDevice, ModeGuard, StdinTerminal};
use crate::ui;

/// How long one poll of the key queue may idle.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs the interactive process table until the user quits or an
/// interrupt arrives. The terminal is restored on every exit path.
pub fn run(config: &Config) -> Result<()> {
    let mut guard = ModeGuard::acquire(StdinTerminal)?;
    install_panic_hook(*guard.original());
    signal::install();

    let running = Arc::new(AtomicBool::new(true));
    let result = session(config, &running);

    running.store(false, Ordering::Relaxed);
    guard.release();
    let _ = panic::take_hook();
    result
}

fn session(config: &Config, running: &Arc<AtomicBool>) -> Result<()> {
    let keys = input::spawn_reader(RawStdin, Arc::clone(running))?;
    let mut terminal: Terminal<CrosstermBackend<Stdout>> =
        Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let mut controller = Controller::new(SysinfoSource::new(), SignalTerminator, config);
    controller.refresh();

    let result = event_loop(
        &mut terminal,
        &mut controller,
        &keys,
        config.refresh_interval,
        signal::interrupted,
    );

    clear_on_exit(&mut terminal);
    result.map_err(Into::into)
}

/// Best effort: blanks the screen and homes the cursor.
fn clear_on_exit<B: Backend>(terminal: &mut Terminal<B>) {
    if let Err(e) = terminal.clear() {
        warn!(error = %e, "failed to clear screen on exit");
    }
    if let Err(e) = terminal.set_cursor_position((0, 0)) {
        warn!(error = %e, "failed to home cursor on exit");
    }
}

/// Restores the terminal before the default panic report is printed.
fn install_panic_hook(original: libc::termios) {
    let default = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let mut device = StdinTerminal;
        let _ = device.set_mode(&original);
        let _ = device.set_cursor_visible(true);
        default(info);
    }));
}

/// Consumes keys, interrupts, and refresh ticks until the state stops running.
///
/// `interrupted` is polled once per iteration; the session passes
/// [`signal::interrupted`].
pub fn event_loop<B, S, T>(
    terminal: &mut Terminal<B>,
    controller: &mut Controller<S, T>,
    keys: &Receiver<KeyEvent>,
    refresh_interval: Duration,
    interrupted: fn() -> bool,
) -> io::Result<()>
where
    B: Backend,
    S: ProcessSource,
    T: Terminator,
{
    redraw(terminal, controller)?;

    while controller.state().is_running() {
        if interrupted() {
            debug!("interrupted");
            controller.quit();
            break;
        }

        let mut dirty = match keys.recv_timeout(POLL_INTERVAL) {
            Ok(key) => controller.handle_key(key),
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => {
                debug!("key channel closed");
                controller.quit();
                false
            }
        };

        if controller.state().is_running() && controller.refresh_due(refresh_interval) {
            controller.refresh();
            dirty = true;
        }

        if dirty && controller.state().is_running() {
            redraw(terminal, controller)?;
        }
    }

    Ok(())
}

/// Full redraw: clear, then paint the whole view at the current size.
fn redraw<B, S, T>(terminal: &mut Terminal<B>, controller: &mut Controller<S, T>) -> io::Result<()>
where
    B: Backend,
    S: ProcessSource,
    T: Terminator,
{
    let size = terminal.size()?;
    controller.resize(size.width, size.height);
    terminal.clear()?;
    terminal.draw(|f| ui::draw(f, controller.state()))?;
    Ok(())
}
