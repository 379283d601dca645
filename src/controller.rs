//! The interactive controller: applies key events to the [`ViewState`],
//! refreshes the snapshot, and issues kill requests.

use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::app::ViewState;
use crate::config::Config;
use crate::input::KeyEvent;
use crate::process::{ProcessSource, SortMode, Terminator};

/// What a key asks the controller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Up,
    Down,
    Refresh,
    Sort(SortMode),
    Kill,
}

impl Action {
    pub fn from_key(key: KeyEvent) -> Option<Self> {
        let action = match key {
            // 0x03 is Ctrl-C; raw mode delivers it as a plain byte.
            KeyEvent::Quit | KeyEvent::Char('q' | 'Q') | KeyEvent::Byte(0x03) => Action::Quit,
            KeyEvent::Up | KeyEvent::Char('k') => Action::Up,
            KeyEvent::Down | KeyEvent::Char('j') => Action::Down,
            KeyEvent::Refresh | KeyEvent::Char('r' | 'R') => Action::Refresh,
            KeyEvent::Char('c' | 'C') => Action::Sort(SortMode::Cpu),
            KeyEvent::Char('m' | 'M') => Action::Sort(SortMode::Ram),
            KeyEvent::Char('p' | 'P') => Action::Sort(SortMode::Pid),
            KeyEvent::Delete | KeyEvent::Char('d' | 'D') => Action::Kill,
            _ => return None,
        };
        Some(action)
    }
}

/// Owns the view state and the collaborators that feed it.
pub struct Controller<S, T> {
    state: ViewState,
    source: S,
    terminator: T,
    kill_grace: Duration,
    last_refresh: Option<Instant>,
}

impl<S: ProcessSource, T: Terminator> Controller<S, T> {
    pub fn new(source: S, terminator: T, config: &Config) -> Self {
        Self {
            state: ViewState::new(config.max_rows),
            source,
            terminator,
            kill_grace: config.kill_grace,
            last_refresh: None,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.state.set_viewport(width, height);
    }

    pub fn quit(&mut self) {
        self.state.quit();
    }

    /// Applies one key. Returns whether the view needs a re-render.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match Action::from_key(key) {
            Some(action) => {
                debug!(?key, ?action, "key");
                self.apply(action)
            }
            None => false,
        }
    }

    /// Applies one action. Returns whether the view needs a re-render.
    pub fn apply(&mut self, action: Action) -> bool {
        if !self.state.is_running() {
            return false;
        }

        match action {
            Action::Quit => {
                self.state.quit();
                return false;
            }
            Action::Up => self.state.select_process(-1),
            Action::Down => self.state.select_process(1),
            Action::Refresh => self.refresh(),
            Action::Sort(mode) => {
                self.state.set_sort_mode(mode);
                self.refresh();
            }
            Action::Kill => self.kill_selected(),
        }
        true
    }

    /// Resnapshots the process list. A failed fetch keeps the last list.
    pub fn refresh(&mut self) {
        self.last_refresh = Some(Instant::now());
        match self.source.snapshot() {
            Ok(processes) => {
                debug!(count = processes.len(), "refreshed process snapshot");
                let total = self.source.total_memory();
                self.state.replace_processes(processes, total);
            }
            Err(e) => warn!(error = %e, "keeping previous snapshot"),
        }
    }

    /// Whether `interval` has passed since the last refresh.
    pub fn refresh_due(&self, interval: Duration) -> bool {
        self.last_refresh.is_none_or(|at| at.elapsed() >= interval)
    }

    /// Sends a graceful termination request to the selected process,
    /// escalating to a forced one exactly once if it fails, then refreshes.
    fn kill_selected(&mut self) {
        let Some(target) = self.state.selected() else {
            return;
        };
        let (pid, name) = (target.pid, target.name.clone());

        info!(pid, %name, "terminating process");
        if let Err(e) = self.terminator.terminate(pid) {
            warn!(error = %e, "graceful termination failed, forcing");
            if let Err(e) = self.terminator.force_kill(pid) {
                warn!(error = %e, "forced termination failed");
            }
        }

        if !self.kill_grace.is_zero() {
            thread::sleep(self.kill_grace);
        }
        self.refresh();
    }
}
