//! Serial Script
//!
//! Plays a fixed script of text commands to an embedded development board
//! over its serial console and prints whatever the board answers. Built for
//! the nRF5340 DK LED demo firmware; works with any newline-terminated
//! console through the generic profile or a TOML script file.
//!
//! # Usage
//!
//! ```bash
//! # Play the nRF5340 DK LED demo script on /dev/ttyACM0
//! serial-script run
//!
//! # Same, on another port, with timestamps and a transcript
//! serial-script run -p /dev/ttyACM1 --timestamps --log session.log
//!
//! # Play a custom script file
//! serial-script run --script smoke.toml
//!
//! # Send a single command
//! serial-script send "pattern 3"
//!
//! # Show the script `run` would play
//! serial-script script --device nrf5340dk
//!
//! # List serial ports and matching profiles
//! serial-script ports
//! ```

mod devices;
mod error;
mod script;
mod serial;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use devices::{get_profile, profile_names, require_profile, DeviceProfile, DEFAULT_DEVICE};
use script::{CommandScript, ScriptFile};
use serial::runner::{install_interrupt_handler, Clock, ThreadClock, Transcript};
use serial::session::Session;
use serial::{CommandRunner, PortConfig, RunnerConfig, SerialConnection, Timing};

/// Serial Script
///
/// Scripted serial command runner for embedded development boards
#[derive(Parser)]
#[command(name = "serial-script")]
#[command(author = "Prasanna Gautam")]
#[command(version = "0.1.0")]
#[command(about = "Plays a command script to a board's serial console and prints its replies")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a command script and print the board's replies
    Run {
        /// Serial port path (default: the device profile's port)
        #[arg(short, long)]
        port: Option<String>,

        /// Device profile
        #[arg(short, long, default_value = DEFAULT_DEVICE)]
        device: String,

        /// Baud rate (overrides script file and device profile)
        #[arg(short, long)]
        baud: Option<u32>,

        /// TOML script file to play instead of the profile's built-in script
        #[arg(short, long)]
        script: Option<PathBuf>,

        /// Append a timestamped transcript to this file
        #[arg(short, long)]
        log: Option<PathBuf>,

        /// Prefix received lines with the local time
        #[arg(long)]
        timestamps: bool,

        /// Disable coloring of received lines
        #[arg(long)]
        no_highlight: bool,
    },

    /// Send a single command and print the reply
    Send {
        /// Command to send
        command: String,

        /// Serial port path (default: the device profile's port)
        #[arg(short, long)]
        port: Option<String>,

        /// Device profile (for port and baud rate)
        #[arg(short, long, default_value = DEFAULT_DEVICE)]
        device: String,

        /// Baud rate (overrides device profile)
        #[arg(short, long)]
        baud: Option<u32>,
    },

    /// Print the script `run` would play
    Script {
        /// Device profile
        #[arg(short, long, default_value = DEFAULT_DEVICE)]
        device: String,

        /// TOML script file
        #[arg(short, long)]
        script: Option<PathBuf>,
    },

    /// List available serial ports
    Ports,

    /// Device profile operations
    #[command(subcommand)]
    Devices(DeviceCommands),
}

#[derive(Subcommand)]
enum DeviceCommands {
    /// List all supported device profiles
    List,

    /// Show detailed information about a device profile
    Show {
        /// Device profile name (e.g., nrf5340dk, generic)
        device: String,
    },
}

/// Everything needed to open a port and play a script
struct Plan {
    profile: &'static DeviceProfile,
    port_config: PortConfig,
    script: CommandScript,
    timing: Timing,
    source: String,
}

/// Resolve settings with precedence: command line, script file, device profile
fn plan(
    device: &str,
    port: Option<String>,
    baud: Option<u32>,
    script_path: Option<&Path>,
) -> error::Result<Plan> {
    let profile = require_profile(device)?;
    let file = script_path.map(ScriptFile::load).transpose()?;

    let port_path = port
        .or_else(|| file.as_ref().and_then(|f| f.port.clone()))
        .unwrap_or_else(|| profile.default_port.clone());
    let mut port_config = PortConfig::from_profile(&port_path, profile);
    if let Some(rate) = baud.or_else(|| file.as_ref().and_then(|f| f.baud_rate)) {
        port_config = port_config.with_baud_rate(rate);
    }

    let (script, timing, source) = match (&file, script_path) {
        (Some(f), Some(path)) => (
            f.script()?,
            f.timing.apply(Timing::default()),
            path.display().to_string(),
        ),
        _ => (
            CommandScript::from_profile(profile)?,
            Timing::default(),
            format!("{} built-in script", profile.id),
        ),
    };

    Ok(Plan {
        profile,
        port_config,
        script,
        timing,
        source,
    })
}

fn main() {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = match cli.command {
        Commands::Run {
            port,
            device,
            baud,
            script,
            log,
            timestamps,
            no_highlight,
        } => handle_run(
            port,
            &device,
            baud,
            script.as_deref(),
            log.as_deref(),
            timestamps,
            no_highlight,
        ),
        Commands::Send {
            command,
            port,
            device,
            baud,
        } => handle_send(&command, port, &device, baud),
        Commands::Script { device, script } => handle_script(&device, script.as_deref()),
        Commands::Ports => serial::port::print_ports().map_err(Into::into),
        Commands::Devices(cmd) => handle_devices(cmd),
    };

    let code = exit_code(&result);
    if code != 0 {
        std::process::exit(code);
    }
}

/// Report a failed command and pick the process exit code
///
/// Every playback outcome reaches here as `Ok`. Only errors raised before or
/// while opening the port are fatal.
fn exit_code(result: &Result<()>) -> i32 {
    let Err(e) = result else {
        return 0;
    };

    eprintln!("{} {}", "[ERROR]".red().bold(), e);
    if e
        .downcast_ref::<error::Error>()
        .is_some_and(error::Error::is_connection)
    {
        eprintln!("Make sure the board is connected and the firmware is running");
    }
    1
}

/// Open the port and report where we are connected
fn connect(port_config: PortConfig) -> error::Result<SerialConnection> {
    let conn = SerialConnection::open(port_config)?;
    println!(
        "{} Connected to {} at {} baud",
        "[OK]".green().bold(),
        conn.config().port_path.white().bold(),
        conn.config().baud_rate
    );
    Ok(conn)
}

/// Route Ctrl+C to the runner so the port is still closed on interrupt
fn watch_interrupts<S: Session, C: Clock, W: io::Write>(runner: &CommandRunner<S, C, W>) {
    if let Err(e) = install_interrupt_handler(runner.running_flag()) {
        log::warn!("{:#}; Ctrl+C will not close the port cleanly", e);
    }
}

fn handle_run(
    port: Option<String>,
    device: &str,
    baud: Option<u32>,
    script: Option<&Path>,
    log_file: Option<&Path>,
    timestamps: bool,
    no_highlight: bool,
) -> Result<()> {
    let plan = plan(device, port, baud, script)?;
    let transcript = log_file.map(Transcript::create).transpose()?;

    let conn = connect(plan.port_config)?;

    let config = RunnerConfig {
        timing: plan.timing,
        show_timestamps: timestamps,
        highlight: !no_highlight,
    };
    let mut runner = CommandRunner::new(conn, ThreadClock, io::stdout(), plan.profile, config);
    if let Some(transcript) = transcript {
        runner = runner.with_transcript(transcript);
    }
    watch_interrupts(&runner);

    let outcome = runner.run(&plan.script);
    log::debug!(
        "sent {} of {} commands from {}",
        outcome.sent(),
        plan.script.len(),
        plan.source
    );

    Ok(())
}

fn handle_send(command: &str, port: Option<String>, device: &str, baud: Option<u32>) -> Result<()> {
    let plan = plan(device, port, baud, None)?;
    let script = CommandScript::new([command])?;

    let conn = connect(plan.port_config)?;

    let config = RunnerConfig {
        timing: Timing {
            pace: Duration::ZERO,
            ..Timing::default()
        },
        ..RunnerConfig::default()
    };
    let runner = CommandRunner::new(conn, ThreadClock, io::stdout(), plan.profile, config);
    watch_interrupts(&runner);
    runner.run(&script);

    Ok(())
}

fn handle_script(device: &str, script: Option<&Path>) -> Result<()> {
    let plan = plan(device, None, None, script)?;

    println!("{}", "=".repeat(60));
    println!("{}", format!("Script: {}", plan.source).cyan().bold());
    println!("{}", "=".repeat(60));

    println!(
        "  Port: {} at {} baud",
        plan.port_config.port_path, plan.port_config.baud_rate
    );
    println!(
        "  Timing: warm-up {:?}, settle {:?}, pace {:?}",
        plan.timing.warmup, plan.timing.settle, plan.timing.pace
    );
    println!();

    for (i, command) in plan.script.commands().iter().enumerate() {
        println!("  {:>3}. {}", i + 1, command.white());
    }

    println!("\n{}", "=".repeat(60));
    Ok(())
}

fn handle_devices(cmd: DeviceCommands) -> Result<()> {
    match cmd {
        DeviceCommands::List => {
            println!("{}", "=".repeat(60));
            println!("{}", "Supported Device Profiles".cyan().bold());
            println!("{}", "=".repeat(60));

            for name in profile_names() {
                if let Some(profile) = get_profile(name) {
                    println!("\n  {}: {}", name.white().bold(), profile.description);
                    println!("    Manufacturer: {}", profile.manufacturer);
                    println!("    Default port: {}", profile.default_port);
                    println!("    Default baud: {}", profile.serial.baud_rate);
                    println!("    Script: {} commands", profile.script.len());
                }
            }

            println!("\n{}", "=".repeat(60));
            println!(
                "Use {} to see detailed profile information",
                "serial-script devices show <device>".cyan()
            );
        }

        DeviceCommands::Show { device } => {
            let profile = require_profile(&device)?;
            print_device_profile(profile);
        }
    }

    Ok(())
}

fn print_device_profile(profile: &DeviceProfile) {
    println!("{}", "=".repeat(70));
    println!("{}", format!("Device Profile: {}", profile.name).cyan().bold());
    println!("{}", "=".repeat(70));

    println!("\n{}", "Basic Information:".white().bold());
    println!("  ID: {}", profile.id);
    println!("  Description: {}", profile.description);
    println!("  Manufacturer: {}", profile.manufacturer);
    println!("  Default port: {}", profile.default_port);

    println!("\n{}", "Serial Settings:".white().bold());
    println!("  Baud rate: {}", profile.serial.baud_rate);
    println!("  Data bits: {}", profile.serial.data_bits);
    println!("  Stop bits: {}", profile.serial.stop_bits);
    println!("  Parity: {}", profile.serial.parity);
    println!("  Flow control: {}", profile.serial.flow_control);
    let vids: Vec<String> = profile
        .usb_vendor_ids
        .iter()
        .map(|v| format!("{:04x}", v))
        .collect();
    println!("  USB vendor IDs: {}", vids.join(", "));

    println!("\n{}", "Built-in Script:".white().bold());
    for (i, command) in profile.script.iter().enumerate() {
        println!("  {:>3}. {}", i + 1, command);
    }

    println!("\n{}", "Output Patterns:".white().bold());
    for pattern in &profile.output_patterns {
        let severity = match pattern.severity {
            devices::Severity::Error => pattern.severity.to_string().red(),
            devices::Severity::Warning => pattern.severity.to_string().yellow(),
            devices::Severity::Info => pattern.severity.to_string().cyan(),
        };
        println!(
            "  [{}] {} - {}",
            severity,
            pattern.pattern.white(),
            pattern.description.dimmed()
        );
    }

    println!("\n{}", "=".repeat(70));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_plan_uses_profile_defaults() {
        let resolved = plan("nrf5340dk", None, None, None).unwrap();
        assert_eq!(resolved.port_config.port_path, "/dev/ttyACM0");
        assert_eq!(resolved.port_config.baud_rate, 115200);
        assert_eq!(resolved.timing, Timing::default());
        assert_eq!(resolved.script.len(), 13);
    }

    #[test]
    fn test_plan_precedence() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = \"/dev/ttyACM7\"").unwrap();
        writeln!(file, "baud_rate = 57600").unwrap();
        writeln!(file, "commands = [\"status\"]").unwrap();
        writeln!(file, "[timing]\npace_ms = 0").unwrap();

        let from_file = plan("generic", None, Some(9600), Some(file.path())).unwrap();
        assert_eq!(from_file.port_config.port_path, "/dev/ttyACM7");
        assert_eq!(from_file.port_config.baud_rate, 9600);
        assert_eq!(from_file.script.commands(), &["status"]);
        assert_eq!(from_file.timing.pace, Duration::ZERO);

        let overridden =
            plan("generic", Some("/dev/ttyS1".to_string()), None, Some(file.path())).unwrap();
        assert_eq!(overridden.port_config.port_path, "/dev/ttyS1");
        assert_eq!(overridden.port_config.baud_rate, 57600);
    }

    #[test]
    fn test_plan_unknown_device() {
        assert!(matches!(
            plan("esp8266", None, None, None),
            Err(error::Error::UnknownDevice(_))
        ));
    }

    #[test]
    fn test_exit_code_success() {
        assert_eq!(exit_code(&Ok(())), 0);
    }

    #[test]
    fn test_exit_code_connection_failure() {
        let err = error::Error::Connection {
            port: "/dev/ttyACM9".to_string(),
            source: serialport::Error::new(serialport::ErrorKind::NoDevice, "no such device"),
        };
        assert_ne!(exit_code(&Err(err.into())), 0);
    }

    #[test]
    fn test_exit_code_invalid_input() {
        let unknown = plan("esp8266", None, None, None).map(|_| ());
        assert_ne!(exit_code(&unknown.map_err(Into::into)), 0);

        let missing = plan("nrf5340dk", None, None, Some(Path::new("/nonexistent/demo.toml")));
        assert_ne!(exit_code(&missing.map(|_| ()).map_err(Into::into)), 0);
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "serial-script",
            "run",
            "-p",
            "/dev/ttyACM1",
            "--timestamps",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                port, device, timestamps, ..
            } => {
                assert_eq!(port.as_deref(), Some("/dev/ttyACM1"));
                assert_eq!(device, DEFAULT_DEVICE);
                assert!(timestamps);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
