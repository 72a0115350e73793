//! Scripted command playback
//!
//! Plays a [`CommandScript`] against an open [`Session`]:
//! - fixed warm-up delay so the firmware can finish booting
//! - for each command: echo, write, settle, drain replies, pace
//! - Ctrl+C stops between commands
//! - the session is closed exactly once however playback ends
//!
//! The delays are fixed sleeps, not readiness polls.

use crate::devices::{DeviceProfile, Severity};
use crate::error::{Error, Result};
use crate::script::CommandScript;
use crate::serial::session::{decode_line, Session};
use anyhow::Context;
use chrono::Local;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Wait after opening the port before the first command
pub const WARMUP_DELAY: Duration = Duration::from_secs(2);

/// Wait after writing a command before draining replies
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Wait after draining before the next command
pub const PACE_DELAY: Duration = Duration::from_secs(1);

/// Fixed delays used during playback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub warmup: Duration,
    pub settle: Duration,
    pub pace: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            warmup: WARMUP_DELAY,
            settle: SETTLE_DELAY,
            pace: PACE_DELAY,
        }
    }
}

/// Source of the runner's sleeps
pub trait Clock {
    fn sleep(&mut self, duration: Duration);
}

/// Blocks the current thread
pub struct ThreadClock;

impl Clock for ThreadClock {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Configuration for a playback run
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub timing: Timing,
    /// Prefix received lines with the local time
    pub show_timestamps: bool,
    /// Color received lines using the profile's output patterns
    pub highlight: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timing: Timing::default(),
            show_timestamps: false,
            highlight: true,
        }
    }
}

/// Timestamped record of everything sent and received
pub struct Transcript {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl Transcript {
    /// Open a transcript file for appending
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::options()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| Error::TranscriptOpen {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record(&mut self, direction: &str, line: &str) -> Result<()> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        writeln!(self.writer, "[{}] {} {}", timestamp, direction, line)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// How playback ended
#[derive(Debug)]
pub enum Outcome {
    /// Every command was sent
    Completed { sent: usize },
    /// Stopped by Ctrl+C
    Interrupted { sent: usize },
    /// Stopped by an I/O error
    Failed { sent: usize, error: Error },
}

impl Outcome {
    pub fn sent(&self) -> usize {
        match self {
            Outcome::Completed { sent }
            | Outcome::Interrupted { sent }
            | Outcome::Failed { sent, .. } => *sent,
        }
    }
}

/// Plays a command script over a session it owns
pub struct CommandRunner<S: Session, C: Clock, W: Write> {
    session: S,
    clock: C,
    out: W,
    profile: &'static DeviceProfile,
    config: RunnerConfig,
    transcript: Option<Transcript>,
    running: Arc<AtomicBool>,
    sent: usize,
    line_count: usize,
    error_count: usize,
}

impl<S: Session, C: Clock, W: Write> CommandRunner<S, C, W> {
    /// Take ownership of an open session
    pub fn new(
        session: S,
        clock: C,
        out: W,
        profile: &'static DeviceProfile,
        config: RunnerConfig,
    ) -> Self {
        Self {
            session,
            clock,
            out,
            profile,
            config,
            transcript: None,
            running: Arc::new(AtomicBool::new(true)),
            sent: 0,
            line_count: 0,
            error_count: 0,
        }
    }

    /// Record sent and received lines to a transcript
    pub fn with_transcript(mut self, transcript: Transcript) -> Self {
        self.transcript = Some(transcript);
        self
    }

    /// Get a clone of the running flag for signal handling
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Warm up, play the script, report, and close the session.
    pub fn run(mut self, script: &CommandScript) -> Outcome {
        let outcome = self.play(script);

        if let Err(e) = self.report(&outcome) {
            log::warn!("failed to print summary: {}", e);
        }
        self.finish();
        outcome
    }

    /// Warm-up delay followed by the playback loop
    fn play(&mut self, script: &CommandScript) -> Outcome {
        if let Err(error) = self.print_banner(script) {
            return Outcome::Failed { sent: 0, error };
        }

        self.clock.sleep(self.config.timing.warmup);

        for command in script.commands() {
            if !self.running.load(Ordering::SeqCst) {
                return Outcome::Interrupted { sent: self.sent };
            }
            if let Err(error) = self.step(command) {
                return Outcome::Failed {
                    sent: self.sent,
                    error,
                };
            }
        }

        Outcome::Completed { sent: self.sent }
    }

    fn print_banner(&mut self, script: &CommandScript) -> Result<()> {
        writeln!(
            self.out,
            "\n{} Playing {} commands for {} {}\n",
            "[*]".cyan().bold(),
            script.len(),
            self.profile.name.white().bold(),
            "(Ctrl+C to stop)".yellow()
        )?;
        Ok(())
    }

    /// Send one command and print whatever comes back
    fn step(&mut self, command: &str) -> Result<()> {
        writeln!(self.out, "{} {}", ">>>".cyan().bold(), command)?;
        if let Some(ref mut transcript) = self.transcript {
            transcript.record("TX", command)?;
        }

        self.session.write_line(command)?;
        self.sent += 1;

        self.clock.sleep(self.config.timing.settle);
        let printed = self.drain()?;
        log::debug!("{:?}: {} reply lines", command, printed);
        self.clock.sleep(self.config.timing.pace);

        writeln!(self.out)?;
        Ok(())
    }

    /// Print every complete line already buffered by the driver.
    ///
    /// Stops at the first line that is not valid UTF-8; anything behind it
    /// is left for the next drain.
    fn drain(&mut self) -> Result<usize> {
        let mut printed = 0;

        while self.session.bytes_available()? > 0 {
            let raw = self.session.read_line()?;
            if raw.is_empty() {
                break;
            }

            match decode_line(&raw) {
                Ok(Some(line)) => {
                    self.print_response(&line)?;
                    printed += 1;
                }
                Ok(None) => {}
                Err(e) => {
                    log::warn!("dropping undecodable line ({} bytes): {}", raw.len(), e);
                    break;
                }
            }
        }

        Ok(printed)
    }

    fn print_response(&mut self, line: &str) -> Result<()> {
        self.line_count += 1;

        let severity = self.profile.classify(line);
        if severity == Some(Severity::Error) {
            self.error_count += 1;
        }

        let mut output = String::new();
        if self.config.show_timestamps {
            let timestamp = Local::now().format("%H:%M:%S%.3f");
            output.push_str(&format!("{} ", timestamp.to_string().dimmed()));
        }
        output.push_str(&format!("{} ", "<<<".green().bold()));
        output.push_str(&self.format_line(line, severity));
        writeln!(self.out, "{}", output)?;

        if let Some(ref mut transcript) = self.transcript {
            transcript.record("RX", line)?;
        }
        Ok(())
    }

    /// Color a line for display
    fn format_line(&self, line: &str, severity: Option<Severity>) -> String {
        if !self.config.highlight {
            return line.to_string();
        }
        match severity {
            Some(Severity::Error) => line.red().to_string(),
            Some(Severity::Warning) => line.yellow().to_string(),
            Some(Severity::Info) => line.cyan().to_string(),
            None if self.profile.is_success(line) => line.green().to_string(),
            None => line.to_string(),
        }
    }

    fn report(&mut self, outcome: &Outcome) -> Result<()> {
        match outcome {
            Outcome::Completed { sent } => writeln!(
                self.out,
                "{} Command script completed ({} sent)",
                "[OK]".green().bold(),
                sent
            )?,
            Outcome::Interrupted { sent } => writeln!(
                self.out,
                "\n{} Script interrupted by user after {} commands",
                "[WARNING]".yellow().bold(),
                sent
            )?,
            Outcome::Failed { error, .. } => writeln!(
                self.out,
                "{} Error during script: {}",
                "[ERROR]".red().bold(),
                error
            )?,
        }

        writeln!(
            self.out,
            "Responses: {} lines, {} errors",
            self.line_count,
            if self.error_count > 0 {
                self.error_count.to_string().red().bold().to_string()
            } else {
                self.error_count.to_string().green().to_string()
            }
        )?;
        if let Some(ref transcript) = self.transcript {
            writeln!(self.out, "Transcript saved to: {}", transcript.path().display())?;
        }
        Ok(())
    }

    /// Close the session; consumes the runner so it happens once
    fn finish(self) {
        let CommandRunner {
            session, mut out, ..
        } = self;

        match session.close() {
            Ok(()) => {
                let _ = writeln!(out, "{} Serial connection closed", "[OK]".green().bold());
            }
            Err(e) => {
                log::warn!("error while closing serial port: {}", e);
                let _ = writeln!(
                    out,
                    "{} Serial connection closed with error: {}",
                    "[WARNING]".yellow().bold(),
                    e
                );
            }
        }
    }
}

/// Setup Ctrl+C signal handler
///
/// The handler only clears `running`; the runner notices before the next
/// command.
pub fn install_interrupt_handler(running: Arc<AtomicBool>) -> anyhow::Result<()> {
    ctrlc::set_handler(move || {
        eprintln!("\n{}", "Stopping after the current command...".yellow());
        running.store(false, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")
}
