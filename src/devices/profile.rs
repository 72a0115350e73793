//! Device profile definitions
//!
//! A profile describes how to talk to one kind of board: serial settings,
//! the port it usually shows up on, the command script to play, and how to
//! classify the lines it prints back.

/// Serial port settings for a device
#[derive(Debug, Clone)]
pub struct SerialSettings {
    /// Default baud rate
    pub baud_rate: u32,
    /// Data bits (typically 8)
    pub data_bits: u8,
    /// Stop bits (1 or 2)
    pub stop_bits: u8,
    /// Parity ("none", "even", "odd")
    pub parity: String,
    /// Flow control ("none", "hardware", "software")
    pub flow_control: String,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            baud_rate: 115200,
            data_bits: 8,
            stop_bits: 1,
            parity: "none".to_string(),
            flow_control: "none".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Pattern used to classify a line printed by the device
#[derive(Debug, Clone)]
pub struct OutputPattern {
    /// Case-insensitive substring to match
    pub pattern: String,
    pub severity: Severity,
    /// What the match means
    pub description: String,
}

/// Complete device profile
#[derive(Debug, Clone)]
pub struct DeviceProfile {
    /// Device name
    pub name: String,
    /// Short identifier (e.g., "nrf5340dk")
    pub id: String,
    /// Device description
    pub description: String,
    /// Device manufacturer
    pub manufacturer: String,
    /// Port the board usually enumerates as
    pub default_port: String,
    /// Serial settings
    pub serial: SerialSettings,
    /// Patterns that mark a line as an error, warning or info
    pub output_patterns: Vec<OutputPattern>,
    /// Substrings that mark a line as a success reply
    pub success_patterns: Vec<String>,
    /// USB vendor IDs for port detection
    pub usb_vendor_ids: Vec<u16>,
    /// Commands played by `run` when no script file is given
    pub script: Vec<String>,
}

impl DeviceProfile {
    /// Create a new empty profile
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            id: id.to_string(),
            description: String::new(),
            manufacturer: String::new(),
            default_port: String::from("/dev/ttyUSB0"),
            serial: SerialSettings::default(),
            output_patterns: Vec::new(),
            success_patterns: Vec::new(),
            usb_vendor_ids: Vec::new(),
            script: Vec::new(),
        }
    }

    /// Add an output pattern
    pub fn add_pattern(&mut self, pattern: &str, severity: Severity, description: &str) {
        self.output_patterns.push(OutputPattern {
            pattern: pattern.to_string(),
            severity,
            description: description.to_string(),
        });
    }

    /// Find the first output pattern matching a line
    pub fn match_pattern(&self, line: &str) -> Option<&OutputPattern> {
        let lower = line.to_lowercase();
        self.output_patterns
            .iter()
            .find(|p| lower.contains(&p.pattern.to_lowercase()))
    }

    /// Severity of a line, if any pattern matches
    pub fn classify(&self, line: &str) -> Option<Severity> {
        self.match_pattern(line).map(|p| p.severity)
    }

    /// Check if a line indicates success
    ///
    /// Success patterns only match whole words, so `OK` does not fire on `BOOK`.
    pub fn is_success(&self, line: &str) -> bool {
        self.success_patterns
            .iter()
            .any(|p| contains_word(line, p))
    }

    /// Whether a USB vendor ID belongs to this board
    pub fn matches_vendor(&self, vid: u16) -> bool {
        self.usb_vendor_ids.contains(&vid)
    }
}

/// Whether `needle` occurs in `haystack` with no alphanumeric character
/// directly before or after it
fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_serial_settings() {
        let settings = SerialSettings::default();
        assert_eq!(settings.baud_rate, 115200);
        assert_eq!(settings.data_bits, 8);
        assert_eq!(settings.parity, "none");
    }

    #[test]
    fn test_profile_creation() {
        let mut profile = DeviceProfile::new("test", "Test Device");
        profile.add_pattern("<err>", Severity::Error, "Firmware error");
        profile.add_pattern("<wrn>", Severity::Warning, "Firmware warning");

        assert_eq!(profile.output_patterns.len(), 2);
        assert!(profile.script.is_empty());
        assert_eq!(profile.classify("[00:00:01.000] <ERR> main: boom"), Some(Severity::Error));
        assert_eq!(profile.classify("<wrn> low battery"), Some(Severity::Warning));
        assert_eq!(profile.classify("LED 0 ON"), None);
    }

    #[test]
    fn test_success_word_boundaries() {
        let mut profile = DeviceProfile::new("test", "Test Device");
        profile.success_patterns.push("OK".to_string());

        assert!(profile.is_success("OK"));
        assert!(profile.is_success("[OK] ready"));
        assert!(profile.is_success("led 0 1: OK"));
        assert!(!profile.is_success("BOOK"));
        assert!(!profile.is_success("OKAY"));
        assert!(!profile.is_success("ok"));
    }

    #[test]
    fn test_vendor_match() {
        let mut profile = DeviceProfile::new("test", "Test Device");
        profile.usb_vendor_ids.push(0x1366);
        assert!(profile.matches_vendor(0x1366));
        assert!(!profile.matches_vendor(0x0403));
    }
}
