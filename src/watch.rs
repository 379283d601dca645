//! Continuous monitor of a single process (`--pid`).

use std::io::Write;
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::Result;
use crate::process::{Pid, ProcessLookup, ProcessRecord};
use crate::ui::{fmt_bytes, truncate_name};

const BOX_INNER: usize = 58;
const WATCH_NAME_WIDTH: usize = 50;

/// Prints one box per interval until the process disappears.
///
/// Returns the lookup error that ended the watch.
pub fn watch_process<L, W>(lookup: &mut L, pid: Pid, interval: Duration, out: &mut W) -> Result<()>
where
    L: ProcessLookup,
    W: Write,
{
    info!(pid, ?interval, "watching process");
    loop {
        let record = match lookup.lookup(pid) {
            Ok(record) => record,
            Err(err) => {
                debug!(pid, %err, "watch ended");
                return Err(err);
            }
        };
        let timestamp = chrono::Local::now().format("%H:%M:%S").to_string();
        for line in watch_box(&record, &timestamp) {
            writeln!(out, "{line}")?;
        }
        writeln!(out)?;
        out.flush()?;
        thread::sleep(interval);
    }
}

/// Header printed once before the first sample.
pub fn watch_banner(pid: Pid, interval: Duration) -> Vec<String> {
    framed(
        &format!(" Monitoring process PID {pid} every {:.1?}", interval),
        &[" Press Ctrl+C to stop".to_string()],
    )
}

/// Renders a sample as a fixed-width box titled with `timestamp`.
pub fn watch_box(record: &ProcessRecord, timestamp: &str) -> Vec<String> {
    let top = format!("┌─ [{timestamp}] ");
    let fill = (BOX_INNER + 1).saturating_sub(top.chars().count());
    let mut lines = vec![format!("{top}{}┐", "─".repeat(fill))];
    lines.extend(
        [
            format!("PID:  {}", record.pid),
            format!("Name: {}", truncate_name(&record.name, WATCH_NAME_WIDTH)),
            format!("CPU:  {:.2}%", record.cpu_percent),
            format!("RAM:  {:.2}% ({})", record.ram_percent, fmt_bytes(record.ram_bytes)),
        ]
        .iter()
        .map(|row| format!("│ {row:<width$} │", width = BOX_INNER - 2)),
    );
    lines.push(format!("└{}┘", "─".repeat(BOX_INNER)));
    lines
}

fn framed(title: &str, rows: &[String]) -> Vec<String> {
    let mut lines = vec![format!("┌{}┐", "─".repeat(BOX_INNER))];
    for row in std::iter::once(title).chain(rows.iter().map(String::as_str)) {
        lines.push(format!("│{row:<BOX_INNER$}│"));
    }
    lines.push(format!("└{}┘", "─".repeat(BOX_INNER)));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MonitorError;

    struct Countdown {
        remaining: usize,
        calls: usize,
    }

    impl ProcessLookup for Countdown {
        fn lookup(&mut self, pid: Pid) -> Result<ProcessRecord> {
            self.calls += 1;
            if self.remaining == 0 {
                return Err(MonitorError::ProcessNotFound(pid));
            }
            self.remaining -= 1;
            Ok(ProcessRecord {
                pid,
                name: "postgres".into(),
                cpu_percent: 12.5,
                ram_percent: 3.25,
                ram_bytes: 64 * 1024 * 1024,
            })
        }
    }

    fn width(line: &str) -> usize {
        line.chars().count()
    }

    #[test]
    fn box_lines_share_one_width() {
        let record = ProcessRecord {
            pid: 4242,
            name: "x".repeat(80),
            cpu_percent: 150.0,
            ram_percent: 0.5,
            ram_bytes: 2048,
        };
        let lines = watch_box(&record, "09:15:00");

        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("┌─ [09:15:00] ─"));
        assert!(lines.iter().all(|l| width(l) == BOX_INNER + 2), "{lines:#?}");
        assert!(lines[1].contains("PID:  4242"));
        assert!(lines[2].contains(&format!("{}...", "x".repeat(47))));
        assert!(lines[3].contains("CPU:  150.00%"));
        assert!(lines[4].contains("RAM:  0.50% (2.00 KB)"));
    }

    #[test]
    fn banner_names_the_pid() {
        let lines = watch_banner(7, Duration::from_secs(2));
        assert!(lines[1].contains("Monitoring process PID 7 every 2.0s"));
        assert!(lines[2].contains("Press Ctrl+C to stop"));
        assert!(lines.iter().all(|l| width(l) == BOX_INNER + 2));
    }

    #[test]
    fn watch_prints_until_the_process_is_gone() {
        let mut lookup = Countdown { remaining: 3, calls: 0 };
        let mut out = Vec::new();

        let err = watch_process(&mut lookup, 99, Duration::ZERO, &mut out).unwrap_err();

        assert!(matches!(err, MonitorError::ProcessNotFound(99)));
        assert_eq!(err.to_string(), "process 99 terminated or is not accessible");
        assert_eq!(lookup.calls, 4);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("PID:  99").count(), 3);
        assert_eq!(text.matches("Name: postgres").count(), 3);
        assert!(text.contains("RAM:  3.25% (64.00 MB)"));
    }

    #[test]
    fn missing_process_prints_nothing() {
        let mut lookup = Countdown { remaining: 0, calls: 0 };
        let mut out = Vec::new();

        assert!(watch_process(&mut lookup, 1, Duration::ZERO, &mut out).is_err());
        assert!(out.is_empty());
    }
}
