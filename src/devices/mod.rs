//! Device profiles for scripted serial sessions
//!
//! Each profile defines serial settings, the usual port, a built-in command
//! script and output patterns for one kind of board.

pub mod generic;
pub mod nrf5340;
pub mod profile;

pub use generic::GENERIC_PROFILE;
pub use nrf5340::NRF5340DK_PROFILE;
pub use profile::{DeviceProfile, SerialSettings, Severity};

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Profile used when `--device` is not given
pub const DEFAULT_DEVICE: &str = "nrf5340dk";

/// Registry of built-in device profiles
pub static DEVICE_PROFILES: Lazy<HashMap<&'static str, &'static DeviceProfile>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("nrf5340dk", &*NRF5340DK_PROFILE);
    m.insert("nrf5340", &*NRF5340DK_PROFILE);
    m.insert("default", &*NRF5340DK_PROFILE);
    m.insert("generic", &*GENERIC_PROFILE);
    m
});

/// Get a device profile by name
pub fn get_profile(name: &str) -> Option<&'static DeviceProfile> {
    DEVICE_PROFILES.get(name.to_lowercase().as_str()).copied()
}

/// Get a device profile by name, or an `UnknownDevice` error
pub fn require_profile(name: &str) -> crate::error::Result<&'static DeviceProfile> {
    get_profile(name).ok_or_else(|| crate::error::Error::UnknownDevice(name.to_string()))
}

/// Get profile names only (deduplicated)
pub fn profile_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = vec!["nrf5340dk", "generic"];
    names.sort();
    names
}

/// Find the profile a USB vendor ID belongs to
pub fn profile_for_vendor(vid: u16) -> Option<&'static DeviceProfile> {
    profile_names()
        .into_iter()
        .filter_map(get_profile)
        .find(|p| p.matches_vendor(vid))
}
