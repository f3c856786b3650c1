//! Output device enumeration via cpal.

use crate::Result;
use cpal::Device;
use cpal::traits::{DeviceTrait, HostTrait};

/// Extract device name via `description()` (cpal 0.17+).
pub(crate) fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// Output device information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDevice {
    /// Human-readable device name.
    pub name: String,
    /// Whether this is the host's default output.
    pub is_default: bool,
    /// Default sample rate in Hz.
    pub default_sample_rate: u32,
}

fn describe(device: &Device, is_default: bool) -> Option<AudioDevice> {
    let name = device_name(device).ok()?;
    let default_sample_rate = device
        .default_output_config()
        .map(|c| c.sample_rate())
        .unwrap_or(48000);
    Some(AudioDevice {
        name,
        is_default,
        default_sample_rate,
    })
}

/// List the output devices of the default host.
pub fn list_output_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let default_name = host
        .default_output_device()
        .and_then(|d| device_name(&d).ok());

    let mut devices = Vec::new();
    if let Ok(outputs) = host.output_devices() {
        for device in outputs {
            let Ok(name) = device_name(&device) else {
                continue;
            };
            if devices.iter().any(|d: &AudioDevice| d.name == name) {
                continue;
            }
            let is_default = default_name.as_deref() == Some(name.as_str());
            if let Some(info) = describe(&device, is_default) {
                devices.push(info);
            }
        }
    }

    tracing::debug!(count = devices.len(), "enumerated output devices");
    Ok(devices)
}

/// The default host's default output device, if any.
pub fn default_output_device() -> Result<Option<AudioDevice>> {
    let host = cpal::default_host();
    Ok(host
        .default_output_device()
        .and_then(|d| describe(&d, true)))
}
