//! Generic device profile
//!
//! Any board with a newline-terminated text console on a USB-to-serial
//! adapter. The built-in script only asks for help.

use super::profile::{DeviceProfile, Severity};
use once_cell::sync::Lazy;

/// Generic device profile
pub static GENERIC_PROFILE: Lazy<DeviceProfile> = Lazy::new(|| {
    let mut profile = DeviceProfile::new("generic", "Generic Device");
    profile.description = "Generic serial console with common settings".to_string();
    profile.manufacturer = "Unknown".to_string();

    profile.add_pattern("error", Severity::Error, "Error detected");
    profile.add_pattern("fail", Severity::Error, "Failure detected");
    profile.add_pattern("panic", Severity::Error, "Panic detected");
    profile.add_pattern("unknown command", Severity::Error, "Command rejected");
    profile.add_pattern("warning", Severity::Warning, "Warning detected");
    profile.add_pattern("timeout", Severity::Warning, "Timeout detected");

    profile.success_patterns = vec![
        "OK".to_string(),
        "ok".to_string(),
        "success".to_string(),
        "done".to_string(),
    ];
    profile.usb_vendor_ids = vec![
        0x0403, // FTDI
        0x10c4, // Silicon Labs
        0x1a86, // WCH
        0x067b, // Prolific
    ];
    profile.script = vec!["help".to_string()];
    profile
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_profile() {
        let profile = &*GENERIC_PROFILE;
        assert_eq!(profile.id, "generic");
        assert_eq!(profile.serial.baud_rate, 115200);
        assert_eq!(profile.default_port, "/dev/ttyUSB0");
        assert_eq!(profile.script, vec!["help"]);
    }

    #[test]
    fn test_generic_classification_ignores_case() {
        let profile = &*GENERIC_PROFILE;
        assert_eq!(profile.classify("ERROR: bad arg"), Some(Severity::Error));
        assert_eq!(profile.classify("Warning: voltage low"), Some(Severity::Warning));
        assert!(profile.is_success("done"));
    }
}
