//! Output device selection

use padqueue_core::{DeviceBinding, RemoteDevice};

/// Pick the device to play on
///
/// Exact name first, then a case-insensitive substring match, then whichever
/// device the session already plays on. Unbound if none of those exist.
pub fn resolve_binding(devices: &[RemoteDevice], wanted: &str) -> DeviceBinding {
    let wanted_lower = wanted.to_lowercase();

    let found = devices
        .iter()
        .find(|d| d.name == wanted)
        .or_else(|| {
            if wanted_lower.is_empty() {
                return None;
            }
            devices
                .iter()
                .find(|d| d.name.to_lowercase().contains(&wanted_lower))
        });

    if let Some(device) = found {
        log::info!("Discovery: Bound to '{}' ({})", device.name, device.id);
        return DeviceBinding::new(device.id.clone());
    }

    if let Some(device) = devices.iter().find(|d| d.is_active) {
        log::warn!(
            "Discovery: No device named '{}', falling back to active device '{}'",
            wanted,
            device.name
        );
        return DeviceBinding::new(device.id.clone());
    }

    log::warn!(
        "Discovery: No device named '{}' among {} device(s); playback stays unbound",
        wanted,
        devices.len()
    );
    DeviceBinding::unbound()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(id: &str, name: &str, is_active: bool) -> RemoteDevice {
        RemoteDevice {
            id: id.to_string(),
            name: name.to_string(),
            is_active,
        }
    }

    fn devices() -> Vec<RemoteDevice> {
        vec![
            device("a", "Spotifyd@raspberrypi-kitchen", false),
            device("b", "Spotifyd@raspberrypi", false),
            device("c", "Laptop", true),
        ]
    }

    #[test]
    fn test_exact_match_wins_over_substring() {
        let binding = resolve_binding(&devices(), "Spotifyd@raspberrypi");
        assert_eq!(binding.device_id(), Some("b"));
    }

    #[test]
    fn test_case_insensitive_substring() {
        let binding = resolve_binding(&devices(), "KITCHEN");
        assert_eq!(binding.device_id(), Some("a"));
    }

    #[test]
    fn test_falls_back_to_active_device() {
        let binding = resolve_binding(&devices(), "Living Room");
        assert_eq!(binding.device_id(), Some("c"));
    }

    #[test]
    fn test_unbound_when_nothing_matches() {
        let list = vec![device("a", "Phone", false)];
        assert!(!resolve_binding(&list, "Living Room").is_bound());
        assert!(!resolve_binding(&[], "Living Room").is_bound());
    }

    #[test]
    fn test_empty_name_only_uses_active() {
        let list = vec![device("a", "Phone", false)];
        assert!(!resolve_binding(&list, "").is_bound());
        assert_eq!(resolve_binding(&devices(), "").device_id(), Some("c"));
    }
}
