//! View state for the interactive process table.
//!
//! [`ViewState`] owns the current snapshot, the selection, the scroll window
//! and the sort order. Every mutator re-establishes its invariants before
//! returning:
//!
//! - the selection is a valid index whenever the list is non-empty, and 0
//!   otherwise;
//! - the selection sits inside `[scroll_offset, scroll_offset + visible_rows)`;
//! - the list is ordered by the current [`SortMode`].

use crate::process::{Pid, ProcessRecord, SortMode, sort_processes};
use crate::ui::CHROME_HEIGHT;

/// Terminal size the view is laid out for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 120,
            height: 30,
        }
    }
}

/// Single-owner state of the interactive session.
#[derive(Debug, Clone)]
pub struct ViewState {
    processes: Vec<ProcessRecord>,
    selected_index: usize,
    scroll_offset: usize,
    sort_mode: SortMode,
    running: bool,
    viewport: Viewport,
    total_memory: u64,
    max_rows: usize,
}

impl ViewState {
    /// Empty state showing at most `max_rows` table rows.
    pub fn new(max_rows: usize) -> Self {
        Self {
            processes: Vec::new(),
            selected_index: 0,
            scroll_offset: 0,
            sort_mode: SortMode::default(),
            running: true,
            viewport: Viewport::default(),
            total_memory: 0,
            max_rows: max_rows.max(1),
        }
    }

    pub fn processes(&self) -> &[ProcessRecord] {
        &self.processes
    }

    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Total physical memory in bytes, from the last successful refresh.
    pub fn total_memory(&self) -> u64 {
        self.total_memory
    }

    /// Table rows that fit: the configured maximum, capped by the
    /// terminal height left over after the fixed chrome. At least 1.
    pub fn visible_rows(&self) -> usize {
        usize::from(self.viewport.height.saturating_sub(CHROME_HEIGHT))
            .min(self.max_rows)
            .max(1)
    }

    pub fn selected(&self) -> Option<&ProcessRecord> {
        self.processes.get(self.selected_index)
    }

    /// The slice of processes inside the scroll window.
    pub fn window(&self) -> &[ProcessRecord] {
        let start = self.scroll_offset.min(self.processes.len());
        let end = (start + self.visible_rows()).min(self.processes.len());
        &self.processes[start..end]
    }

    pub fn set_viewport(&mut self, width: u16, height: u16) {
        self.viewport = Viewport { width, height };
        self.scroll_into_view();
    }

    /// Moves the selection by `offset` rows, clamped to the list bounds.
    pub fn select_process(&mut self, offset: isize) {
        let len = self.processes.len();
        if len == 0 {
            return;
        }

        self.selected_index = self.selected_index.saturating_add_signed(offset).min(len - 1);
        self.scroll_into_view();
    }

    /// Replaces the list wholesale with a fresh snapshot.
    ///
    /// The snapshot is sorted by the current mode and the selection follows
    /// the previously selected pid when it is still present.
    pub fn replace_processes(&mut self, mut processes: Vec<ProcessRecord>, total_memory: u64) {
        let anchor = self.selected().map(|p| p.pid);
        sort_processes(&mut processes, self.sort_mode);
        self.processes = processes;
        self.total_memory = total_memory;
        self.restore_selection(anchor);
    }

    /// Switches the sort order and re-sorts the list already held.
    pub fn set_sort_mode(&mut self, mode: SortMode) {
        let anchor = self.selected().map(|p| p.pid);
        self.sort_mode = mode;
        sort_processes(&mut self.processes, mode);
        self.restore_selection(anchor);
    }

    /// Idempotent.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Re-selects `anchor` after a reorder, else clamps the old index.
    fn restore_selection(&mut self, anchor: Option<Pid>) {
        let found = anchor.and_then(|pid| self.processes.iter().position(|p| p.pid == pid));

        self.selected_index = match found {
            Some(i) => i,
            None => self.selected_index.min(self.processes.len().saturating_sub(1)),
        };
        self.scroll_into_view();
    }

    /// Slides the window by exactly the distance the selection fell outside it.
    fn scroll_into_view(&mut self) {
        let rows = self.visible_rows();
        if self.selected_index < self.scroll_offset {
            self.scroll_offset = self.selected_index;
        } else if self.selected_index >= self.scroll_offset + rows {
            self.scroll_offset = self.selected_index + 1 - rows;
        }
    }
}
