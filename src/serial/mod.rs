//! Serial session handling
//!
//! This module provides functionality for:
//! - Opening and listing serial ports
//! - The line-oriented `Session` seam the runner talks to
//! - Playing a command script against a board and printing its replies

pub mod port;
pub mod runner;
pub mod session;

pub use port::{PortConfig, SerialConnection};
pub use runner::{CommandRunner, RunnerConfig, Timing};
