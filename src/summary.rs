//! One-shot hardware and host summaries for the static views.

use std::fs;
use std::thread;

use sysinfo::{CpuRefreshKind, Disks, MemoryRefreshKind, RefreshKind, System};

/// Devices smaller than this are not reported as storage (2 GiB).
pub const MIN_STORAGE_SIZE: u64 = 2 * 1024 * 1024 * 1024;

/// Pseudo and virtual file systems that never count as storage.
const IGNORED_FS_TYPES: &[&str] = &[
    "tmpfs", "devtmpfs", "sysfs", "proc", "devpts", "securityfs", "cgroup", "cgroup2", "pstore",
    "efivarfs", "bpf", "autofs", "mqueue", "hugetlbfs", "debugfs", "tracefs", "configfs",
    "fusectl", "squashfs", "overlay",
];

/// Mount point prefixes of kernel, runtime, and snap mounts.
const IGNORED_PREFIXES: &[&str] = &[
    "/sys", "/proc", "/dev", "/run/snapd", "/run/lock", "/run/user", "/snap", "/boot/efi",
    "/var/snap",
];

/// Thermal zone types that belong to the CPU package.
const CPU_ZONE_TYPES: &[&str] = &["x86_pkg_temp", "coretemp", "cpu_thermal", "acpitz"];

const THERMAL_ZONES: usize = 20;

// ── Data ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct CpuSummary {
    pub model: String,
    pub vendor: String,
    /// Logical cores.
    pub cores: usize,
    pub frequency_mhz: u64,
    /// Global usage over one sampling interval.
    pub usage: f32,
    /// Degrees Celsius, when a CPU thermal zone is readable.
    pub temperature: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MemorySummary {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub available: u64,
    pub swap_total: u64,
    pub swap_used: u64,
}

impl MemorySummary {
    pub fn used_percent(&self) -> f64 {
        percent(self.used, self.total)
    }

    pub fn swap_percent(&self) -> f64 {
        percent(self.swap_used, self.swap_total)
    }
}

#[derive(Debug, Clone)]
pub struct StorageDevice {
    pub mount_point: String,
    pub file_system: String,
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

impl StorageDevice {
    pub fn used_percent(&self) -> f64 {
        percent(self.used, self.total)
    }
}

/// Storage summed across every kept device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageTotals {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

impl StorageTotals {
    pub fn used_percent(&self) -> f64 {
        percent(self.used, self.total)
    }
}

#[derive(Debug, Clone, Default)]
pub struct HostSummary {
    pub user: String,
    pub hostname: String,
    pub os: String,
    pub kernel: String,
    pub uptime_secs: u64,
    pub shell: String,
}

// ── Collection ──────────────────────────────────────────────

/// Owns the `sysinfo` handle used by the CPU and memory summaries.
#[derive(Debug)]
pub struct Sampler {
    sys: System,
}

impl Sampler {
    pub fn new() -> Self {
        let sys = System::new_with_specifics(
            RefreshKind::nothing()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::everything()),
        );
        Self { sys }
    }

    /// Samples CPU usage across `MINIMUM_CPU_UPDATE_INTERVAL`, so this blocks briefly.
    pub fn cpu(&mut self) -> CpuSummary {
        self.sys.refresh_cpu_all();
        thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        self.sys.refresh_cpu_all();

        let first = self.sys.cpus().first();
        CpuSummary {
            model: first.map(|c| c.brand().trim().to_string()).unwrap_or_default(),
            vendor: first.map(|c| c.vendor_id().to_string()).unwrap_or_default(),
            cores: self.sys.cpus().len(),
            frequency_mhz: first.map_or(0, |c| c.frequency()),
            usage: self.sys.global_cpu_usage(),
            temperature: zone_temperature(CPU_ZONE_TYPES),
        }
    }

    pub fn memory(&mut self) -> MemorySummary {
        self.sys.refresh_memory();
        MemorySummary {
            total: self.sys.total_memory(),
            used: self.sys.used_memory(),
            free: self.sys.free_memory(),
            available: self.sys.available_memory(),
            swap_total: self.sys.total_swap(),
            swap_used: self.sys.used_swap(),
        }
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Every mounted device that passes [`is_real_disk`] and the size floor.
pub fn storage_devices() -> Vec<StorageDevice> {
    let disks = Disks::new_with_refreshed_list();
    disks
        .list()
        .iter()
        .filter_map(|d| {
            let mount_point = d.mount_point().to_string_lossy().into_owned();
            let file_system = d.file_system().to_string_lossy().into_owned();
            if !is_real_disk(&mount_point, &file_system) || d.total_space() < MIN_STORAGE_SIZE {
                return None;
            }
            let free = d.available_space();
            Some(StorageDevice {
                mount_point,
                file_system,
                total: d.total_space(),
                used: d.total_space().saturating_sub(free),
                free,
            })
        })
        .collect()
}

pub fn storage_totals(devices: &[StorageDevice]) -> StorageTotals {
    devices.iter().fold(StorageTotals::default(), |acc, d| StorageTotals {
        total: acc.total + d.total,
        used: acc.used + d.used,
        free: acc.free + d.free,
    })
}

/// Whether a mount is physical storage rather than a kernel or snap mount.
pub fn is_real_disk(mount_point: &str, file_system: &str) -> bool {
    !IGNORED_FS_TYPES.contains(&file_system)
        && !IGNORED_PREFIXES.iter().any(|p| mount_point.starts_with(p))
}

pub fn host() -> HostSummary {
    HostSummary {
        user: env_or_unknown("USER"),
        hostname: System::host_name().unwrap_or_else(|| "unknown".into()),
        os: System::long_os_version()
            .or_else(System::name)
            .unwrap_or_else(|| std::env::consts::OS.into()),
        kernel: System::kernel_version().unwrap_or_else(|| "unknown".into()),
        uptime_secs: System::uptime(),
        shell: env_or_unknown("SHELL"),
    }
}

fn env_or_unknown(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| "unknown".into())
}

/// "D days, H hours, M mins" past one day, else "H hours, M mins".
pub fn format_uptime(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs / 60) % 60;
    if hours > 24 {
        format!("{} days, {} hours, {minutes} mins", hours / 24, hours % 24)
    } else {
        format!("{hours} hours, {minutes} mins")
    }
}

// ── Thermal zones ───────────────────────────────────────────

/// First sane reading from a thermal zone whose type contains one of `types`.
pub(crate) fn zone_temperature(types: &[&str]) -> Option<u32> {
    (0..THERMAL_ZONES).find_map(|i| {
        let dir = format!("/sys/class/thermal/thermal_zone{i}");
        let zone_type = fs::read_to_string(format!("{dir}/type")).ok()?;
        let zone_type = zone_type.trim();
        if !types.iter().any(|t| zone_type.contains(t)) {
            return None;
        }
        parse_millidegrees(&fs::read_to_string(format!("{dir}/temp")).ok()?)
    })
}

/// Reading of thermal zone 0, whatever its type.
pub(crate) fn first_zone_temperature() -> Option<u32> {
    parse_millidegrees(&fs::read_to_string("/sys/class/thermal/thermal_zone0/temp").ok()?)
}

/// Converts a sysfs millidegree reading to whole degrees, rejecting
/// anything outside (0, 150) °C.
pub(crate) fn parse_millidegrees(raw: &str) -> Option<u32> {
    let milli: i64 = raw.trim().parse().ok()?;
    let celsius = milli / 1000;
    (1..150).contains(&celsius).then_some(celsius as u32)
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pseudo_file_systems_are_not_disks() {
        assert!(is_real_disk("/", "ext4"));
        assert!(is_real_disk("/home", "btrfs"));
        assert!(!is_real_disk("/tmp", "tmpfs"));
        assert!(!is_real_disk("/sys/fs/cgroup", "cgroup2"));
        assert!(!is_real_disk("/snap/core/123", "ext4"));
        assert!(!is_real_disk("/boot/efi", "vfat"));
        assert!(!is_real_disk("/run/user/1000", "ext4"));
    }

    #[test]
    fn storage_totals_sum_devices() {
        let dev = |total, used| StorageDevice {
            mount_point: "/".into(),
            file_system: "ext4".into(),
            total,
            used,
            free: total - used,
        };
        let totals = storage_totals(&[dev(100, 40), dev(300, 60)]);
        assert_eq!(totals, StorageTotals { total: 400, used: 100, free: 300 });
        assert!((totals.used_percent() - 25.0).abs() < 1e-9);
        assert_eq!(storage_totals(&[]).used_percent(), 0.0);
    }

    #[test]
    fn uptime_wording() {
        assert_eq!(format_uptime(0), "0 hours, 0 mins");
        assert_eq!(format_uptime(3 * 3600 + 25 * 60 + 59), "3 hours, 25 mins");
        assert_eq!(format_uptime(24 * 3600), "24 hours, 0 mins");
        assert_eq!(format_uptime(2 * 86400 + 5 * 3600 + 7 * 60), "2 days, 5 hours, 7 mins");
    }

    #[test]
    fn millidegree_parsing() {
        assert_eq!(parse_millidegrees("45000\n"), Some(45));
        assert_eq!(parse_millidegrees("149999"), Some(149));
        assert_eq!(parse_millidegrees("150000"), None);
        assert_eq!(parse_millidegrees("0"), None);
        assert_eq!(parse_millidegrees("-5000"), None);
        assert_eq!(parse_millidegrees("n/a"), None);
    }

    #[test]
    fn memory_percentages() {
        let mem = MemorySummary {
            total: 200,
            used: 50,
            swap_total: 0,
            ..MemorySummary::default()
        };
        assert!((mem.used_percent() - 25.0).abs() < 1e-9);
        assert_eq!(mem.swap_percent(), 0.0);
    }
}
