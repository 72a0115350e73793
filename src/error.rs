//! Error types for serial-script
//!
//! Connection failures are fatal and end the process before any command is
//! sent. Everything raised while a session is open is handled by the runner.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === Connection ===
    #[error("Failed to open serial port {port}: {source}")]
    Connection {
        port: String,
        #[source]
        source: serialport::Error,
    },

    // === Playback ===
    #[error("Serial I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    // === Input ===
    #[error("Unknown device profile: {0}. Use 'serial-script devices list' to see available profiles")]
    UnknownDevice(String),

    #[error("Failed to read script file '{}': {source}", path.display())]
    ScriptRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid script file '{}': {source}", path.display())]
    ScriptParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Script has no commands")]
    EmptyScript,

    #[error("Failed to create transcript file '{}': {source}", path.display())]
    TranscriptOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Whether this error happened before a session existed
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Connection { .. })
    }
}
