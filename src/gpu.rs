//! Graphics adapter discovery.
//!
//! NVIDIA cards are queried through `nvidia-smi`; everything else falls back
//! to a scan of the DRM device tree, which only yields the model name and a
//! thermal estimate.

use std::fs;
use std::process::Command;

use tracing::debug;

use crate::error::{MonitorError, Result};
use crate::summary;

const DRM_CARDS: usize = 10;
const VENDOR_INTEL: &str = "0x8086";
const VENDOR_AMD: &str = "0x1002";

/// Thermal zone types that usually track the integrated GPU's package.
const GPU_ZONE_TYPES: &[&str] = &["INT3400", "acpitz", "pch_skylake", "B0D4"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuKind {
    Dedicated,
    Integrated,
}

impl GpuKind {
    pub fn label(self) -> &'static str {
        match self {
            GpuKind::Dedicated => "Dedicated",
            GpuKind::Integrated => "Integrated",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GpuSummary {
    pub model: String,
    pub kind: GpuKind,
    pub utilization: Option<f32>,
    /// MiB.
    pub memory_total: Option<u64>,
    /// MiB.
    pub memory_used: Option<u64>,
    pub temperature: Option<u32>,
}

impl GpuSummary {
    pub fn memory_percent(&self) -> Option<f64> {
        match (self.memory_used, self.memory_total) {
            (Some(used), Some(total)) if total > 0 => Some(used as f64 / total as f64 * 100.0),
            _ => None,
        }
    }
}

/// Detects the primary graphics adapter.
pub fn query() -> Result<GpuSummary> {
    match query_nvidia() {
        Ok(gpu) => Ok(gpu),
        Err(err) => {
            debug!(%err, "nvidia-smi unavailable, scanning drm devices");
            scan_drm()
        }
    }
}

fn query_nvidia() -> Result<GpuSummary> {
    let output = Command::new("nvidia-smi")
        .args([
            "--query-gpu=name,utilization.gpu,memory.total,memory.used,temperature.gpu",
            "--format=csv,noheader,nounits",
        ])
        .output()?;
    if !output.status.success() {
        return Err(MonitorError::GpuUnavailable(format!(
            "nvidia-smi exited with {}",
            output.status
        )));
    }
    parse_nvidia_smi(&String::from_utf8_lossy(&output.stdout))
}

/// Parses the first line of `nvidia-smi --format=csv,noheader,nounits`.
pub fn parse_nvidia_smi(csv: &str) -> Result<GpuSummary> {
    let line = csv
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| MonitorError::GpuUnavailable("nvidia-smi printed nothing".into()))?;

    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let [name, util, mem_total, mem_used, temp, ..] = fields[..] else {
        return Err(MonitorError::GpuUnavailable(format!("too few nvidia-smi fields: {line}")));
    };

    Ok(GpuSummary {
        model: name.to_string(),
        kind: GpuKind::Dedicated,
        utilization: util.parse().ok(),
        memory_total: mem_total.parse().ok(),
        memory_used: mem_used.parse().ok(),
        temperature: temp.parse().ok(),
    })
}

fn scan_drm() -> Result<GpuSummary> {
    for i in 0..DRM_CARDS {
        let dir = format!("/sys/class/drm/card{i}/device");
        let Ok(vendor) = fs::read_to_string(format!("{dir}/vendor")) else {
            continue;
        };
        let device = fs::read_to_string(format!("{dir}/device")).unwrap_or_default();
        let vendor = vendor.trim();
        if vendor != VENDOR_INTEL && vendor != VENDOR_AMD {
            continue;
        }

        return Ok(GpuSummary {
            model: identify_model(vendor, device.trim()),
            kind: GpuKind::Integrated,
            utilization: None,
            memory_total: None,
            memory_used: None,
            temperature: summary::zone_temperature(GPU_ZONE_TYPES)
                .or_else(summary::first_zone_temperature),
        });
    }
    Err(MonitorError::GpuUnavailable("no supported graphics adapter found".into()))
}

/// Maps a PCI vendor and device id to a marketing name.
pub fn identify_model(vendor: &str, device: &str) -> String {
    match vendor {
        VENDOR_INTEL => intel_model(device).to_string(),
        VENDOR_AMD => "AMD Radeon Graphics".to_string(),
        other => format!("Unknown GPU ({other})"),
    }
}

fn intel_model(device: &str) -> &'static str {
    match device {
        "0x9a49" | "0x9a40" | "0x9a60" | "0x9a68" | "0x9a70" | "0x9a78" => {
            "Intel Iris Xe Graphics"
        }
        "0x46a6" | "0x46a8" | "0x46aa" | "0x4626" | "0x4628" => {
            "Intel Iris Xe Graphics (Alder Lake)"
        }
        "0xa7a0" | "0xa7a1" | "0xa720" | "0xa721" => "Intel Iris Xe Graphics (Raptor Lake)",
        "0x3e92" | "0x3e91" | "0x3e98" | "0x9bc5" | "0x9bc8" => "Intel UHD Graphics 630",
        "0x3ea0" | "0x9b41" | "0x9bca" => "Intel UHD Graphics 620",
        "0x5917" | "0x5916" => "Intel UHD Graphics 620 (Kaby Lake)",
        "0x8a52" | "0x8a56" | "0x8a5a" | "0x8a5c" => "Intel Iris Plus Graphics",
        "0x7d55" | "0x7dd5" => "Intel Arc Graphics (Meteor Lake)",
        _ => "Intel Integrated Graphics",
    }
}
