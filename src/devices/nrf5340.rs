//! nRF5340 DK device profile
//!
//! Nordic nRF5340 development kit running the Zephyr LED demo firmware.
//! The on-board SEGGER J-Link exposes the application core UART as a CDC
//! ACM port, usually `/dev/ttyACM0`.

use super::profile::{DeviceProfile, OutputPattern, SerialSettings, Severity};
use once_cell::sync::Lazy;
use std::fmt;

/// LED patterns built into the demo firmware, in firmware order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedPattern {
    AllBlink = 0,
    Sequence = 1,
    Chase = 2,
    Bounce = 3,
}

impl LedPattern {
    pub const ALL: [LedPattern; 4] = [
        LedPattern::AllBlink,
        LedPattern::Sequence,
        LedPattern::Chase,
        LedPattern::Bounce,
    ];

    /// Name the firmware logs when it switches to this pattern
    pub fn name(self) -> &'static str {
        match self {
            LedPattern::AllBlink => "ALL_BLINK",
            LedPattern::Sequence => "SEQUENCE",
            LedPattern::Chase => "CHASE",
            LedPattern::Bounce => "BOUNCE",
        }
    }
}

/// Profile description listing the selectable patterns
fn describe() -> String {
    let patterns: Vec<String> = LedPattern::ALL
        .iter()
        .map(|p| format!("{}={}", p.name(), *p as u8))
        .collect();
    format!(
        "Nordic nRF5340 DK with the Zephyr LED demo firmware (patterns: {})",
        patterns.join(", ")
    )
}

/// Shell commands understood by the LED demo firmware
///
/// Only used to author the built-in script; the runner forwards plain strings
/// and never checks them against this vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedCommand {
    Help,
    Status,
    /// Stop automatic pattern cycling
    Manual,
    /// Resume automatic pattern cycling
    Auto,
    Pattern(LedPattern),
    All(bool),
    Led { index: u8, on: bool },
    /// Bit `n` drives LED `n`
    Leds(u8),
}

impl fmt::Display for LedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedCommand::Help => write!(f, "help"),
            LedCommand::Status => write!(f, "status"),
            LedCommand::Manual => write!(f, "manual"),
            LedCommand::Auto => write!(f, "auto"),
            LedCommand::Pattern(p) => write!(f, "pattern {}", *p as u8),
            LedCommand::All(on) => write!(f, "all {}", u8::from(*on)),
            LedCommand::Led { index, on } => write!(f, "led {} {}", index, u8::from(*on)),
            LedCommand::Leds(mask) => write!(f, "leds {}", mask),
        }
    }
}

/// The LED demo walkthrough: query, take manual control, exercise every
/// command, then hand control back to the firmware.
pub const DEMO_SCRIPT: &[LedCommand] = &[
    LedCommand::Help,
    LedCommand::Status,
    LedCommand::Manual,
    LedCommand::Pattern(LedPattern::Chase),
    LedCommand::All(true),
    LedCommand::All(false),
    LedCommand::Led { index: 0, on: true },
    LedCommand::Led { index: 2, on: true },
    LedCommand::Leds(0b0101),
    LedCommand::Leds(0b1010),
    LedCommand::Pattern(LedPattern::AllBlink),
    LedCommand::Auto,
    LedCommand::Status,
];

/// nRF5340 DK device profile
pub static NRF5340DK_PROFILE: Lazy<DeviceProfile> = Lazy::new(|| DeviceProfile {
    name: "nRF5340 DK".to_string(),
    id: "nrf5340dk".to_string(),
    description: describe(),
    manufacturer: "Nordic Semiconductor".to_string(),
    default_port: "/dev/ttyACM0".to_string(),
    serial: SerialSettings::default(),
    output_patterns: vec![
        OutputPattern {
            pattern: "<err>".to_string(),
            severity: Severity::Error,
            description: "Zephyr LOG_ERR output".to_string(),
        },
        OutputPattern {
            pattern: "not ready".to_string(),
            severity: Severity::Error,
            description: "LED GPIO device not ready".to_string(),
        },
        OutputPattern {
            pattern: "Cannot configure".to_string(),
            severity: Severity::Error,
            description: "LED GPIO configuration failed".to_string(),
        },
        OutputPattern {
            pattern: "command not found".to_string(),
            severity: Severity::Error,
            description: "Firmware rejected the command".to_string(),
        },
        OutputPattern {
            pattern: "<wrn>".to_string(),
            severity: Severity::Warning,
            description: "Zephyr LOG_WRN output".to_string(),
        },
        OutputPattern {
            pattern: "Switched to pattern".to_string(),
            severity: Severity::Info,
            description: "Automatic pattern change".to_string(),
        },
    ],
    success_patterns: vec![
        "OK".to_string(),
        "initialized successfully".to_string(),
        "Starting LED patterns".to_string(),
    ],
    usb_vendor_ids: vec![
        0x1366, // SEGGER J-Link OB
        0x1915, // Nordic Semiconductor
    ],
    script: DEMO_SCRIPT.iter().map(|c| c.to_string()).collect(),
});
