//! Command scripts
//!
//! A script is an ordered, immutable list of command lines. It comes either
//! from a device profile or from a TOML script file:
//!
//! ```toml
//! port = "/dev/ttyACM1"
//! baud_rate = 115200
//! commands = ["help", "status", "pattern 2"]
//!
//! [timing]
//! warmup_ms = 2000
//! settle_ms = 100
//! pace_ms = 1000
//! ```

use crate::devices::DeviceProfile;
use crate::error::{Error, Result};
use crate::serial::Timing;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Ordered list of commands played by the runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandScript {
    commands: Vec<String>,
}

impl CommandScript {
    /// Build a script; an empty command list is rejected
    pub fn new<I, S>(commands: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let commands: Vec<String> = commands.into_iter().map(Into::into).collect();
        if commands.is_empty() {
            return Err(Error::EmptyScript);
        }
        Ok(Self { commands })
    }

    /// The built-in script of a device profile
    pub fn from_profile(profile: &DeviceProfile) -> Result<Self> {
        Self::new(profile.script.iter().cloned())
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }
}

/// Delay overrides from a script file, in milliseconds
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimingOverrides {
    pub warmup_ms: Option<u64>,
    pub settle_ms: Option<u64>,
    pub pace_ms: Option<u64>,
}

impl TimingOverrides {
    /// Replace the delays that were set, keep the rest of `base`
    pub fn apply(&self, base: Timing) -> Timing {
        Timing {
            warmup: self.warmup_ms.map(Duration::from_millis).unwrap_or(base.warmup),
            settle: self.settle_ms.map(Duration::from_millis).unwrap_or(base.settle),
            pace: self.pace_ms.map(Duration::from_millis).unwrap_or(base.pace),
        }
    }
}

/// Contents of a TOML script file
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptFile {
    /// Port to open unless overridden on the command line
    pub port: Option<String>,
    /// Baud rate unless overridden on the command line
    pub baud_rate: Option<u32>,
    pub commands: Vec<String>,
    #[serde(default)]
    pub timing: TimingOverrides,
}

impl ScriptFile {
    /// Load and parse a script file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ScriptRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Parse script file content; `path` is only used in error messages
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let file: ScriptFile = toml::from_str(content).map_err(|source| Error::ScriptParse {
            path: path.to_path_buf(),
            source,
        })?;
        if file.commands.is_empty() {
            return Err(Error::EmptyScript);
        }
        Ok(file)
    }

    pub fn script(&self) -> Result<CommandScript> {
        CommandScript::new(self.commands.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::NRF5340DK_PROFILE;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_script_from_profile_keeps_order() {
        let script = CommandScript::from_profile(&NRF5340DK_PROFILE).unwrap();
        assert_eq!(script.len(), 13);
        assert_eq!(script.commands()[0], "help");
        assert_eq!(script.commands()[3], "pattern 2");
        assert_eq!(script.commands()[12], "status");
    }

    #[test]
    fn test_empty_script_rejected() {
        let empty: Vec<String> = Vec::new();
        assert!(matches!(CommandScript::new(empty), Err(Error::EmptyScript)));
    }

    #[test]
    fn test_parse_script_file() {
        let content = r#"
port = "/dev/ttyACM1"
commands = ["help", "leds 5"]

[timing]
settle_ms = 250
"#;
        let file = ScriptFile::parse(content, Path::new("demo.toml")).unwrap();
        assert_eq!(file.port.as_deref(), Some("/dev/ttyACM1"));
        assert_eq!(file.baud_rate, None);
        assert_eq!(file.script().unwrap().commands(), &["help", "leds 5"]);

        let timing = file.timing.apply(Timing::default());
        assert_eq!(timing.settle, Duration::from_millis(250));
        assert_eq!(timing.warmup, Duration::from_secs(2));
        assert_eq!(timing.pace, Duration::from_secs(1));
    }

    #[test]
    fn test_parse_rejects_unknown_keys() {
        let err = ScriptFile::parse("comands = [\"help\"]", Path::new("typo.toml")).unwrap_err();
        assert!(matches!(err, Error::ScriptParse { .. }));
        assert!(err.to_string().contains("typo.toml"));
    }

    #[test]
    fn test_parse_rejects_empty_commands() {
        let err = ScriptFile::parse("commands = []", Path::new("empty.toml")).unwrap_err();
        assert!(matches!(err, Error::EmptyScript));
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "baud_rate = 9600").unwrap();
        writeln!(file, "commands = [\"status\"]").unwrap();

        let loaded = ScriptFile::load(file.path()).unwrap();
        assert_eq!(loaded.baud_rate, Some(9600));
        assert_eq!(loaded.commands, vec!["status"]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ScriptFile::load(Path::new("/nonexistent/script.toml")).unwrap_err();
        assert!(matches!(err, Error::ScriptRead { .. }));
    }
}
