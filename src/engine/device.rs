use std::fmt;

use candle_core::Device;
use tracing::{debug, info, warn};

/// Configured compute preference, parsed from `ALIGNSCORE_DEVICE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevicePreference {
    Auto,
    Cpu,
    Metal,
    Cuda,
}

impl DevicePreference {
    /// Case-insensitive parse. `mps` is accepted as an alias for Metal; unknown values mean `Auto`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Self::Auto,
            "cpu" => Self::Cpu,
            "mps" | "metal" => Self::Metal,
            "cuda" | "gpu" => Self::Cuda,
            other => {
                warn!(device = other, "Unknown device preference, resolving as auto");
                Self::Auto
            }
        }
    }
}

/// A resolved compute backend. Never `auto`.
///
/// The Apple GPU is labelled `mps`, the name `ALIGNSCORE_DEVICE` takes for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Cpu,
    Metal,
    Cuda,
}

impl DeviceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::Cpu => "cpu",
            DeviceKind::Metal => "mps",
            DeviceKind::Cuda => "cuda",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reports which accelerators the current build/platform can use.
pub trait AcceleratorProbe {
    fn metal_available(&self) -> bool;
    fn cuda_available(&self) -> bool;
}

/// Probe backed by candle's compiled-in backend checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct CandleProbe;

impl AcceleratorProbe for CandleProbe {
    fn metal_available(&self) -> bool {
        candle_core::utils::metal_is_available()
    }

    fn cuda_available(&self) -> bool {
        candle_core::utils::cuda_is_available()
    }
}

/// Resolves a preference against what the probe reports.
///
/// `Auto` prefers Metal, then CUDA, then CPU. An explicitly requested accelerator that is
/// unavailable downgrades to CPU instead of failing.
pub fn resolve_device(preference: DevicePreference, probe: &impl AcceleratorProbe) -> DeviceKind {
    match preference {
        DevicePreference::Cpu => DeviceKind::Cpu,
        DevicePreference::Auto => {
            if probe.metal_available() {
                DeviceKind::Metal
            } else if probe.cuda_available() {
                DeviceKind::Cuda
            } else {
                debug!("No accelerator available, auto resolved to CPU");
                DeviceKind::Cpu
            }
        }
        DevicePreference::Metal => {
            if probe.metal_available() {
                DeviceKind::Metal
            } else {
                warn!("Metal requested but unavailable, falling back to CPU");
                DeviceKind::Cpu
            }
        }
        DevicePreference::Cuda => {
            if probe.cuda_available() {
                DeviceKind::Cuda
            } else {
                warn!("CUDA requested but unavailable, falling back to CPU");
                DeviceKind::Cpu
            }
        }
    }
}

/// Creates the candle device for `kind`, downgrading to CPU if the accelerator fails to start.
///
/// Returns the kind actually used alongside the device.
pub fn create_device(kind: DeviceKind) -> (DeviceKind, Device) {
    let attempt = match kind {
        DeviceKind::Cpu => return (DeviceKind::Cpu, Device::Cpu),
        DeviceKind::Metal => Device::new_metal(0),
        DeviceKind::Cuda => Device::new_cuda(0),
    };

    match attempt {
        Ok(device) => {
            info!(device = %kind, "Using GPU acceleration");
            (kind, device)
        }
        Err(e) => {
            warn!(device = %kind, error = %e, "Accelerator failed to initialize, falling back to CPU");
            (DeviceKind::Cpu, Device::Cpu)
        }
    }
}

/// Resolves a configured preference string into a usable device.
pub fn select_device(preference: &str) -> (DeviceKind, Device) {
    let kind = resolve_device(DevicePreference::parse(preference), &CandleProbe);
    create_device(kind)
}
