//! Process snapshots and process control.
//!
//! [`SysinfoSource`] resnapshots every live process through `sysinfo`;
//! [`SignalTerminator`] delivers `SIGTERM`/`SIGKILL` through `libc`.
//! Both sit behind small traits so the controller can be driven by fakes.

use std::cmp::Ordering;
use std::io;

use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

use crate::error::{MonitorError, Result};

/// Type alias for an operating-system process identifier.
pub type Pid = u32;

/// One row of the process table.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRecord {
    pub pid: Pid,
    pub name: String,
    /// Can exceed 100 on multi-core machines.
    pub cpu_percent: f32,
    /// Resident memory relative to total physical memory.
    pub ram_percent: f32,
    /// Resident set size in bytes.
    pub ram_bytes: u64,
}

/// Ordering applied to the process table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortMode {
    #[default]
    Cpu,
    Ram,
    Pid,
}

impl SortMode {
    /// Label shown in the info bar, arrow included.
    pub fn label(self) -> &'static str {
        match self {
            SortMode::Cpu => "CPU ▼",
            SortMode::Ram => "RAM ▼",
            SortMode::Pid => "PID ▲",
        }
    }

    /// CPU and RAM sort descending, PID ascending.
    pub fn compare(self, a: &ProcessRecord, b: &ProcessRecord) -> Ordering {
        match self {
            SortMode::Cpu => b.cpu_percent.total_cmp(&a.cpu_percent),
            SortMode::Ram => b.ram_percent.total_cmp(&a.ram_percent),
            SortMode::Pid => a.pid.cmp(&b.pid),
        }
    }
}

/// Stable sort, so equal keys keep their snapshot order.
pub fn sort_processes(processes: &mut [ProcessRecord], mode: SortMode) {
    processes.sort_by(|a, b| mode.compare(a, b));
}

/// Returns the `n` highest-CPU processes, ties broken by snapshot order.
pub fn top_by_cpu(mut processes: Vec<ProcessRecord>, n: usize) -> Vec<ProcessRecord> {
    sort_processes(&mut processes, SortMode::Cpu);
    processes.truncate(n);
    processes
}

/// Sum of CPU and RAM percentages over a list, as shown in the info bar.
pub fn totals(processes: &[ProcessRecord]) -> (f64, f64) {
    processes.iter().fold((0.0, 0.0), |(cpu, ram), p| {
        (cpu + f64::from(p.cpu_percent), ram + f64::from(p.ram_percent))
    })
}

// ── Snapshot source ─────────────────────────────────────────

/// Anything that can enumerate live processes.
pub trait ProcessSource {
    /// Full resnapshot; processes that cannot be read are omitted.
    fn snapshot(&mut self) -> Result<Vec<ProcessRecord>>;

    /// Total physical memory in bytes, as of the last snapshot.
    fn total_memory(&self) -> u64;
}

/// Process source backed by a long-lived `sysinfo::System`.
///
/// CPU usage is computed from the delta between two refreshes, so the
/// handle is kept across snapshots instead of being rebuilt each time.
#[derive(Debug)]
pub struct SysinfoSource {
    sys: System,
}

impl SysinfoSource {
    /// Creates the source and primes the CPU counters.
    ///
    /// Blocks for `sysinfo::MINIMUM_CPU_UPDATE_INTERVAL` so that the first
    /// snapshot already carries meaningful CPU percentages.
    pub fn new() -> Self {
        let mut sys = System::new();
        refresh(&mut sys);
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        Self { sys }
    }
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

fn refresh(sys: &mut System) {
    sys.refresh_memory();
    sys.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::nothing().with_cpu().with_memory(),
    );
}

impl ProcessSource for SysinfoSource {
    fn snapshot(&mut self) -> Result<Vec<ProcessRecord>> {
        refresh(&mut self.sys);

        let total = self.sys.total_memory();
        if total == 0 {
            return Err(MonitorError::SnapshotFetchFailed(
                "total system memory reported as zero".into(),
            ));
        }

        Ok(self
            .sys
            .processes()
            .values()
            .map(|p| record(p, total))
            .collect())
    }

    fn total_memory(&self) -> u64 {
        self.sys.total_memory()
    }
}

/// Looks up a single process by pid.
pub trait ProcessLookup {
    /// Fails with [`MonitorError::ProcessNotFound`] once the process is gone.
    fn lookup(&mut self, pid: Pid) -> Result<ProcessRecord>;
}

impl ProcessLookup for SysinfoSource {
    fn lookup(&mut self, pid: Pid) -> Result<ProcessRecord> {
        let target = sysinfo::Pid::from_u32(pid);
        self.sys.refresh_memory();
        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[target]),
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );

        let total = self.sys.total_memory();
        self.sys
            .process(target)
            .map(|p| record(p, total))
            .ok_or(MonitorError::ProcessNotFound(pid))
    }
}

fn record(p: &sysinfo::Process, total_memory: u64) -> ProcessRecord {
    let ram_percent = if total_memory == 0 {
        0.0
    } else {
        (p.memory() as f64 / total_memory as f64 * 100.0) as f32
    };
    ProcessRecord {
        pid: p.pid().as_u32(),
        name: p.name().to_string_lossy().into_owned(),
        cpu_percent: p.cpu_usage(),
        ram_percent,
        ram_bytes: p.memory(),
    }
}

// ── Termination ─────────────────────────────────────────────

/// Delivers termination requests to processes.
pub trait Terminator {
    /// Graceful request (`SIGTERM`).
    fn terminate(&mut self, pid: Pid) -> Result<()>;

    /// Forced request (`SIGKILL`).
    fn force_kill(&mut self, pid: Pid) -> Result<()>;
}

/// Sends real signals with `kill(2)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SignalTerminator;

impl Terminator for SignalTerminator {
    fn terminate(&mut self, pid: Pid) -> Result<()> {
        send_signal(pid, libc::SIGTERM, "SIGTERM")
    }

    fn force_kill(&mut self, pid: Pid) -> Result<()> {
        send_signal(pid, libc::SIGKILL, "SIGKILL")
    }
}

fn send_signal(pid: Pid, signal: libc::c_int, name: &'static str) -> Result<()> {
    let failed = |source| MonitorError::TerminationRequestFailed {
        pid,
        signal: name,
        source,
    };

    // pid 0 would address our own process group.
    let target = match libc::pid_t::try_from(pid) {
        Ok(p) if p > 0 => p,
        _ => {
            return Err(failed(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a valid target pid",
            )));
        }
    };

    if unsafe { libc::kill(target, signal) } == 0 {
        Ok(())
    } else {
        Err(failed(io::Error::last_os_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(pid: Pid, cpu: f32, ram: f32) -> ProcessRecord {
        ProcessRecord {
            pid,
            name: format!("proc{pid}"),
            cpu_percent: cpu,
            ram_percent: ram,
            ram_bytes: (ram * 1000.0) as u64,
        }
    }

    fn pids(list: &[ProcessRecord]) -> Vec<Pid> {
        list.iter().map(|p| p.pid).collect()
    }

    #[test]
    fn cpu_and_ram_sort_descending_pid_ascending() {
        let mut list = vec![rec(3, 5.0, 40.0), rec(1, 90.0, 1.0), rec(2, 20.0, 10.0)];

        sort_processes(&mut list, SortMode::Cpu);
        assert_eq!(pids(&list), [1, 2, 3]);

        sort_processes(&mut list, SortMode::Ram);
        assert_eq!(pids(&list), [3, 2, 1]);

        sort_processes(&mut list, SortMode::Pid);
        assert_eq!(pids(&list), [1, 2, 3]);
    }

    #[test]
    fn equal_keys_keep_snapshot_order() {
        let mut list = vec![rec(9, 1.0, 0.0), rec(4, 1.0, 0.0), rec(7, 3.0, 0.0), rec(5, 1.0, 0.0)];
        sort_processes(&mut list, SortMode::Cpu);
        assert_eq!(pids(&list), [7, 9, 4, 5]);
    }

    #[test]
    fn top_by_cpu_truncates_after_sorting() {
        let list = vec![rec(1, 1.0, 0.0), rec(2, 50.0, 0.0), rec(3, 50.0, 0.0), rec(4, 10.0, 0.0)];
        assert_eq!(pids(&top_by_cpu(list.clone(), 3)), [2, 3, 4]);
        assert_eq!(top_by_cpu(list, 10).len(), 4);
    }

    #[test]
    fn totals_sum_percentages() {
        let (cpu, ram) = totals(&[rec(1, 150.0, 2.5), rec(2, 25.0, 0.5)]);
        assert!((cpu - 175.0).abs() < 1e-6);
        assert!((ram - 3.0).abs() < 1e-6);
        assert_eq!(totals(&[]), (0.0, 0.0));
    }

    #[test]
    fn pid_zero_is_never_signalled() {
        let err = SignalTerminator.terminate(0).unwrap_err();
        assert!(matches!(
            err,
            MonitorError::TerminationRequestFailed { pid: 0, signal: "SIGTERM", .. }
        ));
    }
}
