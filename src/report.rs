//! One-shot text reports printed to stdout.
//!
//! Every section builds its lines with pure functions and only the `print_*`
//! entry points touch the terminal, so a failing section reports its own error
//! and the caller moves on to the next one.

use crossterm::style::{Color, Stylize};
use crossterm::terminal;

use crate::error::Result;
use crate::gpu::{self, GpuSummary};
use crate::process::{self, ProcessRecord, ProcessSource, SortMode, SysinfoSource};
use crate::summary::{
    self, CpuSummary, HostSummary, MemorySummary, Sampler, StorageDevice, StorageTotals,
};
use crate::ui::{fmt_bytes, truncate_name};

/// Inner width of the key/value boxes.
const BOX_INNER: usize = 82;
/// Inner width of the process and storage tables.
const TABLE_INNER: usize = 84;
const LABEL_WIDTH: usize = 17;
const VALUE_WIDTH: usize = BOX_INNER - LABEL_WIDTH - 3;
const NAME_COLUMN: usize = 30;
const MOUNT_COLUMN: usize = 23;

/// Below this many columns the default view stacks the logo above the info.
const WIDE_LAYOUT_MIN: u16 = 110;
const LOGO_INNER: usize = 38;
const LOGO_COLUMN: usize = 46;

const SECTION_TOP: usize = 5;
pub const DEFAULT_TOP: usize = 10;

type Field = (&'static str, String);

// ── Entry points ────────────────────────────────────────────

pub fn print_default_view() {
    let mut sampler = Sampler::new();
    let host = summary::host();
    let cpu = sampler.cpu();
    let memory = sampler.memory();
    let storage = summary::storage_totals(&summary::storage_devices());
    let gpu = gpu::query();

    let info = info_lines(&host, &cpu, &memory, &storage, gpu.as_ref().ok());
    let wide = terminal::size().is_ok_and(|(w, _)| w >= WIDE_LAYOUT_MIN);

    println!();
    if wide {
        let logo = logo();
        for i in 0..logo.len().max(info.len()) {
            let left = logo.get(i).map_or("", String::as_str);
            print!("{}", format!("{left:<w$}", w = LOGO_COLUMN).cyan());
            match info.get(i) {
                Some(line) => print_info_line(line),
                None => println!(),
            }
        }
    } else {
        for line in logo() {
            println!("{}", line.cyan());
        }
        println!();
        for line in &info {
            print_info_line(line);
        }
    }
    println!();
}

pub fn print_cpu() {
    print_banner();
    let cpu = Sampler::new().cpu();
    print_box("CPU INFORMATION", &cpu_fields(&cpu), Color::Cyan);
    print_top(&format!("TOP {SECTION_TOP} PROCESSES BY CPU"), SortMode::Cpu, SECTION_TOP);
}

pub fn print_memory() {
    print_banner();
    let memory = Sampler::new().memory();
    print_box("MEMORY INFORMATION", &memory_fields(&memory), Color::Magenta);
    print_top(&format!("TOP {SECTION_TOP} PROCESSES BY RAM"), SortMode::Ram, SECTION_TOP);
}

pub fn print_gpu() {
    print_banner();
    print_gpu_section();
}

pub fn print_storage() {
    print_banner();
    print_storage_section();
}

/// `--all`: host, CPU, RAM, GPU, storage, then the top processes.
pub fn print_overview() {
    print_banner();
    let mut sampler = Sampler::new();
    print_box("SYSTEM OVERVIEW", &host_fields(&summary::host()), Color::Cyan);
    print_box("CPU INFORMATION", &cpu_fields(&sampler.cpu()), Color::Cyan);
    print_box("MEMORY INFORMATION", &memory_fields(&sampler.memory()), Color::Magenta);
    print_gpu_section();
    print_storage_section();
    print_top(&format!("TOP {DEFAULT_TOP} PROCESSES BY CPU"), SortMode::Cpu, DEFAULT_TOP);
}

pub fn print_top_processes(n: usize) {
    print_banner();
    print_top(&format!("TOP {n} PROCESSES BY CPU"), SortMode::Cpu, n);
}

/// Guidance shown when the interactive table is requested without a TTY.
pub fn print_tty_required(reason: Option<&str>) {
    eprintln!("{}", "Error: interactive mode requires a TTY terminal.".red().bold());
    if let Some(reason) = reason {
        eprintln!("{}", format!("  {reason}").red());
    }
    eprintln!(
        "{}",
        "  Run it from a real terminal, or use a static view instead: resmon --all".yellow()
    );
}

// ── Printing helpers ────────────────────────────────────────

fn print_banner() {
    let lines = boxed("RESMON - System Resource Monitor", &[]);
    println!();
    for line in lines {
        println!("{}", line.cyan().bold());
    }
}

fn print_box(title: &str, fields: &[Field], color: Color) {
    println!();
    for line in boxed(title, fields) {
        println!("{}", line.with(color));
    }
}

fn print_gpu_section() {
    match gpu::query() {
        Ok(gpu) => print_box("GPU INFORMATION", &gpu_fields(&gpu), Color::Green),
        Err(err) => {
            println!();
            println!("{}", format!("⚠ {err}").yellow());
        }
    }
}

fn print_storage_section() {
    let devices = summary::storage_devices();
    if devices.is_empty() {
        print_error("no storage devices found");
        return;
    }
    let totals = summary::storage_totals(&devices);
    println!();
    for line in storage_table(&devices, &totals) {
        println!("{}", line.blue());
    }
}

fn print_top(title: &str, mode: SortMode, n: usize) {
    match top_processes(mode, n) {
        Ok(list) => {
            println!();
            for line in process_table(title, &list) {
                println!("{}", line.yellow());
            }
        }
        Err(err) => print_error(&err.to_string()),
    }
}

fn print_info_line(line: &InfoLine) {
    match line {
        InfoLine::Title(text) => println!("{}", text.as_str().cyan().bold()),
        InfoLine::Rule(width) => println!("{}", "-".repeat(*width)),
        InfoLine::Field(label, value) => {
            println!("{} {value}", format!("{label}:").cyan().bold())
        }
    }
}

pub fn print_error(message: &str) {
    println!();
    println!("{}", format!("Error: {message}").red());
}

fn top_processes(mode: SortMode, n: usize) -> Result<Vec<ProcessRecord>> {
    let mut list = SysinfoSource::new().snapshot()?;
    Ok(match mode {
        SortMode::Cpu => process::top_by_cpu(list, n),
        _ => {
            process::sort_processes(&mut list, mode);
            list.truncate(n);
            list
        }
    })
}

// ── Line builders ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum InfoLine {
    Title(String),
    Rule(usize),
    Field(&'static str, String),
}

fn info_lines(
    host: &HostSummary,
    cpu: &CpuSummary,
    memory: &MemorySummary,
    storage: &StorageTotals,
    gpu: Option<&GpuSummary>,
) -> Vec<InfoLine> {
    let title = format!("{}@{}", host.user, host.hostname);
    let rule = title.chars().count();
    let mut lines = vec![
        InfoLine::Title(title),
        InfoLine::Rule(rule),
        InfoLine::Field("OS", host.os.clone()),
        InfoLine::Field("Kernel", host.kernel.clone()),
        InfoLine::Field("Uptime", summary::format_uptime(host.uptime_secs)),
        InfoLine::Field("Shell", host.shell.clone()),
        InfoLine::Field("CPU", format!("{} ({} cores)", cpu.model, cpu.cores)),
        InfoLine::Field("CPU Usage", format!("{:.1}%", cpu.usage)),
    ];
    if let Some(temp) = cpu.temperature {
        lines.push(InfoLine::Field("CPU Temp", format!("{temp}°C")));
    }
    lines.push(InfoLine::Field(
        "RAM",
        usage(memory.used, memory.total, memory.used_percent()),
    ));
    lines.push(InfoLine::Field(
        "Disk",
        usage(storage.used, storage.total, storage.used_percent()),
    ));
    lines.push(InfoLine::Field(
        "GPU",
        gpu.map_or_else(|| "Not detected".to_string(), |g| g.model.clone()),
    ));
    lines
}

fn usage(used: u64, total: u64, percent: f64) -> String {
    format!("{} / {} ({percent:.1}%)", fmt_bytes(used), fmt_bytes(total))
}

fn host_fields(host: &HostSummary) -> Vec<Field> {
    vec![
        ("User:", host.user.clone()),
        ("Hostname:", host.hostname.clone()),
        ("OS:", host.os.clone()),
        ("Kernel:", host.kernel.clone()),
        ("Uptime:", summary::format_uptime(host.uptime_secs)),
        ("Shell:", host.shell.clone()),
    ]
}

fn cpu_fields(cpu: &CpuSummary) -> Vec<Field> {
    let mut fields = vec![
        ("Model:", cpu.model.clone()),
        ("Vendor:", cpu.vendor.clone()),
        ("Cores:", cpu.cores.to_string()),
        ("Frequency:", format!("{} MHz", cpu.frequency_mhz)),
        ("Usage:", format!("{:.2}%", cpu.usage)),
    ];
    if let Some(temp) = cpu.temperature {
        fields.push(("Temperature:", format!("{temp}°C")));
    }
    fields
}

fn memory_fields(memory: &MemorySummary) -> Vec<Field> {
    vec![
        ("Total:", fmt_bytes(memory.total)),
        ("Used:", fmt_bytes(memory.used)),
        ("Free:", fmt_bytes(memory.free)),
        ("Available:", fmt_bytes(memory.available)),
        ("Usage:", format!("{:.2}%", memory.used_percent())),
        ("Swap Total:", fmt_bytes(memory.swap_total)),
        ("Swap Used:", fmt_bytes(memory.swap_used)),
        ("Swap Usage:", format!("{:.2}%", memory.swap_percent())),
    ]
}

fn gpu_fields(gpu: &GpuSummary) -> Vec<Field> {
    let mut fields = vec![("Model:", gpu.model.clone()), ("Type:", gpu.kind.label().to_string())];
    if let Some(util) = gpu.utilization {
        fields.push(("Usage:", format!("{util:.0}%")));
    }
    if let (Some(used), Some(total)) = (gpu.memory_used, gpu.memory_total) {
        let pct = gpu.memory_percent().unwrap_or(0.0);
        fields.push(("Memory:", format!("{used} MiB / {total} MiB ({pct:.1}%)")));
    }
    if let Some(temp) = gpu.temperature {
        fields.push(("Temperature:", format!("{temp}°C")));
    }
    fields
}

fn rule(left: char, right: char, inner: usize) -> String {
    format!("{left}{}{right}", "═".repeat(inner))
}

/// A double-lined box with a title row and one row per field.
fn boxed(title: &str, fields: &[Field]) -> Vec<String> {
    let mut lines = vec![
        rule('╔', '╗', BOX_INNER),
        format!("║ {:<w$} ║", truncate_name(title, BOX_INNER - 2), w = BOX_INNER - 2),
    ];
    if !fields.is_empty() {
        lines.push(rule('╠', '╣', BOX_INNER));
        for (label, value) in fields {
            lines.push(format!(
                "║  {label:<lw$}{:<vw$} ║",
                truncate_name(value, VALUE_WIDTH),
                lw = LABEL_WIDTH,
                vw = VALUE_WIDTH,
            ));
        }
    }
    lines.push(rule('╚', '╝', BOX_INNER));
    lines
}

/// PID, name, CPU %, RAM %, and resident memory, one row per process.
pub fn process_table(title: &str, processes: &[ProcessRecord]) -> Vec<String> {
    let mut lines = vec![
        rule('╔', '╗', TABLE_INNER),
        format!("║ {title:<w$} ║", w = TABLE_INNER - 2),
        rule('╠', '╣', TABLE_INNER),
        format!(
            "║ {:<8} │ {:<30} │ {:>10} │ {:>10} │ {:>12} ║",
            "PID", "NAME", "CPU %", "RAM %", "RAM"
        ),
        rule('╠', '╣', TABLE_INNER),
    ];
    for p in processes {
        lines.push(format!(
            "║ {:<8} │ {:<30} │ {:>9.2}% │ {:>9.2}% │ {:>12} ║",
            p.pid,
            truncate_name(&p.name, NAME_COLUMN),
            p.cpu_percent,
            p.ram_percent,
            fmt_bytes(p.ram_bytes),
        ));
    }
    lines.push(rule('╚', '╝', TABLE_INNER));
    lines
}

fn storage_table(devices: &[StorageDevice], totals: &StorageTotals) -> Vec<String> {
    let row = |mount: &str, fs: &str, total: u64, used: u64, free: u64, pct: f64| {
        format!(
            "║ {:<mw$} │ {:<8} │ {:>10} │ {:>10} │ {:>10} │ {:>5.1}% ║",
            truncate_name(mount, MOUNT_COLUMN),
            truncate_name(fs, 8),
            fmt_bytes(total),
            fmt_bytes(used),
            fmt_bytes(free),
            pct,
            mw = MOUNT_COLUMN,
        )
    };

    let mut lines = vec![
        rule('╔', '╗', TABLE_INNER),
        format!("║ {:<w$} ║", "STORAGE INFORMATION", w = TABLE_INNER - 2),
        rule('╠', '╣', TABLE_INNER),
        format!(
            "║ {:<mw$} │ {:<8} │ {:>10} │ {:>10} │ {:>10} │ {:>6} ║",
            "MOUNT", "FS", "TOTAL", "USED", "FREE", "USE",
            mw = MOUNT_COLUMN,
        ),
        rule('╠', '╣', TABLE_INNER),
    ];
    for d in devices {
        lines.push(row(&d.mount_point, &d.file_system, d.total, d.used, d.free, d.used_percent()));
    }
    lines.push(rule('╠', '╣', TABLE_INNER));
    lines.push(row("TOTAL", "", totals.total, totals.used, totals.free, totals.used_percent()));
    lines.push(rule('╚', '╝', TABLE_INNER));
    lines
}

fn logo() -> Vec<String> {
    let body = ["", "r e s m o n", "", "system resource monitor", ""];
    let mut lines = vec![format!("  ╔{}╗", "═".repeat(LOGO_INNER))];
    for text in body {
        lines.push(format!("  ║{text:^w$}║", w = LOGO_INNER));
    }
    lines.push(format!("  ╚{}╝", "═".repeat(LOGO_INNER)));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::GpuKind;

    fn width(line: &str) -> usize {
        line.chars().count()
    }

    fn record(pid: u32, name: &str, cpu: f32) -> ProcessRecord {
        ProcessRecord {
            pid,
            name: name.into(),
            cpu_percent: cpu,
            ram_percent: 1.5,
            ram_bytes: 3 << 20,
        }
    }

    #[test]
    fn process_table_rows_are_aligned() {
        let long = "a-process-name-that-is-far-longer-than-thirty-chars";
        let lines = process_table("TOP 2", &[record(1, "init", 12.5), record(4242, long, 0.0)]);

        assert_eq!(lines.len(), 8);
        assert!(lines.iter().all(|l| width(l) == TABLE_INNER + 2));
        assert!(lines[5].contains("init"));
        assert!(lines[5].contains("12.50%"));
        assert!(lines[5].contains("3.00 MB"));
        assert!(lines[6].contains("a-process-name-that-is-far-..."));
        assert!(!lines[6].contains(long));
    }

    #[test]
    fn empty_process_table_keeps_its_frame() {
        let lines = process_table("TOP 0", &[]);
        assert_eq!(lines.len(), 6);
        assert!(lines[3].contains("PID"));
    }

    #[test]
    fn boxes_have_constant_width() {
        let fields = vec![
            ("Model:", "x".repeat(200)),
            ("Temperature:", "45°C".to_string()),
        ];
        let lines = boxed("CPU INFORMATION", &fields);
        assert_eq!(lines.len(), 6);
        assert!(lines.iter().all(|l| width(l) == BOX_INNER + 2));
        assert!(lines[4].contains("45°C"));
    }

    #[test]
    fn storage_table_ends_with_totals() {
        let devices = vec![StorageDevice {
            mount_point: "/".into(),
            file_system: "ext4".into(),
            total: 100 << 30,
            used: 25 << 30,
            free: 75 << 30,
        }];
        let totals = summary::storage_totals(&devices);
        let lines = storage_table(&devices, &totals);

        assert!(lines.iter().all(|l| width(l) == TABLE_INNER + 2));
        let total_row = &lines[lines.len() - 2];
        assert!(total_row.contains("TOTAL"));
        assert!(total_row.contains("100.00 GB"));
        assert!(total_row.contains("25.0%"));
    }

    #[test]
    fn info_lines_skip_unknown_temperature() {
        let host = HostSummary {
            user: "ada".into(),
            hostname: "box".into(),
            uptime_secs: 90_000,
            ..HostSummary::default()
        };
        let cpu = CpuSummary { model: "Test CPU".into(), cores: 8, ..CpuSummary::default() };
        let lines = info_lines(
            &host,
            &cpu,
            &MemorySummary::default(),
            &StorageTotals::default(),
            None,
        );

        assert_eq!(lines[0], InfoLine::Title("ada@box".into()));
        assert_eq!(lines[1], InfoLine::Rule(7));
        assert!(lines.contains(&InfoLine::Field("Uptime", "1 days, 1 hours, 0 mins".into())));
        assert!(lines.contains(&InfoLine::Field("CPU", "Test CPU (8 cores)".into())));
        assert!(lines.contains(&InfoLine::Field("GPU", "Not detected".into())));
        assert!(!lines.iter().any(|l| matches!(l, InfoLine::Field("CPU Temp", _))));
    }

    #[test]
    fn gpu_fields_omit_missing_metrics() {
        let gpu = GpuSummary {
            model: "Intel Iris Xe Graphics".into(),
            kind: GpuKind::Integrated,
            utilization: None,
            memory_total: None,
            memory_used: None,
            temperature: Some(50),
        };
        let fields = gpu_fields(&gpu);
        let labels: Vec<_> = fields.iter().map(|(l, _)| *l).collect();
        assert_eq!(labels, ["Model:", "Type:", "Temperature:"]);
        assert_eq!(fields[1].1, "Integrated");
    }

    #[test]
    fn logo_lines_share_a_width() {
        let lines = logo();
        let first = width(&lines[0]);
        assert!(lines.iter().all(|l| width(l) == first));
        assert!(first <= LOGO_COLUMN);
    }
}
