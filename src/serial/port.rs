//! Serial port configuration and connection management
//!
//! Opens the board's serial port and exposes it to the runner as a
//! line-oriented [`Session`]. Also handles port discovery.

use crate::devices::{self, DeviceProfile, SerialSettings};
use crate::error::{Error, Result};
use crate::serial::session::Session;
use colored::Colorize;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{Read, Write};
use std::time::Duration;

/// Default baud rate of the board consoles we talk to
pub const DEFAULT_BAUD: u32 = 115200;

/// Read timeout for a single line
pub const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Configuration for serial port connection
#[derive(Debug, Clone)]
pub struct PortConfig {
    /// Serial port path (e.g., /dev/ttyACM0, /dev/ttyUSB0)
    pub port_path: String,
    /// Baud rate (default: 115200)
    pub baud_rate: u32,
    /// Data bits (default: 8)
    pub data_bits: DataBits,
    /// Parity (default: None)
    pub parity: Parity,
    /// Stop bits (default: 1)
    pub stop_bits: StopBits,
    /// Flow control (default: None)
    pub flow_control: FlowControl,
    /// Read timeout
    pub timeout: Duration,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            port_path: String::from("/dev/ttyACM0"),
            baud_rate: DEFAULT_BAUD,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
            timeout: READ_TIMEOUT,
        }
    }
}

impl PortConfig {
    /// Create a new configuration with default 115200 8N1 settings
    pub fn new(port_path: &str) -> Self {
        Self {
            port_path: port_path.to_string(),
            ..Default::default()
        }
    }

    /// Create a configuration from a device profile's serial settings
    pub fn from_profile(port_path: &str, profile: &DeviceProfile) -> Self {
        Self::new(port_path).with_settings(&profile.serial)
    }

    /// Apply serial settings; unrecognised values keep the 8N1 defaults
    pub fn with_settings(mut self, settings: &SerialSettings) -> Self {
        self.baud_rate = settings.baud_rate;
        self.data_bits = match settings.data_bits {
            5 => DataBits::Five,
            6 => DataBits::Six,
            7 => DataBits::Seven,
            _ => DataBits::Eight,
        };
        self.stop_bits = match settings.stop_bits {
            2 => StopBits::Two,
            _ => StopBits::One,
        };
        self.parity = match settings.parity.as_str() {
            "even" => Parity::Even,
            "odd" => Parity::Odd,
            _ => Parity::None,
        };
        self.flow_control = match settings.flow_control.as_str() {
            "hardware" => FlowControl::Hardware,
            "software" => FlowControl::Software,
            _ => FlowControl::None,
        };
        self
    }

    /// Set the baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the read timeout
    #[cfg(test)]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// An open serial port, owned by exactly one runner
pub struct SerialConnection {
    port: Box<dyn SerialPort>,
    config: PortConfig,
}

impl SerialConnection {
    /// Open a serial connection with the given configuration
    pub fn open(config: PortConfig) -> Result<Self> {
        let port = serialport::new(&config.port_path, config.baud_rate)
            .data_bits(config.data_bits)
            .parity(config.parity)
            .stop_bits(config.stop_bits)
            .flow_control(config.flow_control)
            .timeout(config.timeout)
            .open()
            .map_err(|source| Error::Connection {
                port: config.port_path.clone(),
                source,
            })?;

        log::debug!(
            "opened {} at {} baud (timeout {:?})",
            config.port_path,
            config.baud_rate,
            config.timeout
        );
        Ok(Self { port, config })
    }

    /// Get the port configuration
    pub fn config(&self) -> &PortConfig {
        &self.config
    }
}

impl Session for SerialConnection {
    fn write_line(&mut self, line: &str) -> Result<()> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        self.port.write_all(&buf)?;
        self.port.flush()?;
        log::debug!("wrote {} bytes to {}", buf.len(), self.config.port_path);
        Ok(())
    }

    fn bytes_available(&mut self) -> Result<u32> {
        Ok(self.port.bytes_to_read()?)
    }

    fn read_line(&mut self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut byte = [0u8; 1];

        loop {
            match self.port.read(&mut byte) {
                Ok(0) => break,
                Ok(_) => {
                    buffer.push(byte[0]);
                    if byte[0] == b'\n' {
                        break;
                    }
                }
                // A partial line is returned as-is once the timeout expires
                Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => break,
                Err(e) => return Err(e.into()),
            }
        }

        log::trace!("read {:?}", String::from_utf8_lossy(&buffer));
        Ok(buffer)
    }

    fn close(mut self) -> Result<()> {
        let result = self.port.flush();
        log::debug!("closing {}", self.config.port_path);
        drop(self.port);
        result.map_err(Error::from)
    }
}

/// Information about a detected serial port
#[derive(Debug, Clone)]
pub struct PortInfo {
    pub path: String,
    pub port_type: PortType,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial_number: Option<String>,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PortType {
    UsbSerial,
    PciSerial,
    Bluetooth,
    Unknown,
}

impl std::fmt::Display for PortType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortType::UsbSerial => write!(f, "USB Serial"),
            PortType::PciSerial => write!(f, "PCI Serial"),
            PortType::Bluetooth => write!(f, "Bluetooth"),
            PortType::Unknown => write!(f, "Unknown"),
        }
    }
}

impl From<serialport::SerialPortInfo> for PortInfo {
    fn from(p: serialport::SerialPortInfo) -> Self {
        let (port_type, manufacturer, product, serial_number, vid, pid) = match p.port_type {
            serialport::SerialPortType::UsbPort(info) => (
                PortType::UsbSerial,
                info.manufacturer,
                info.product,
                info.serial_number,
                Some(info.vid),
                Some(info.pid),
            ),
            serialport::SerialPortType::PciPort => {
                (PortType::PciSerial, None, None, None, None, None)
            }
            serialport::SerialPortType::BluetoothPort => {
                (PortType::Bluetooth, None, None, None, None, None)
            }
            serialport::SerialPortType::Unknown => (PortType::Unknown, None, None, None, None, None),
        };

        PortInfo {
            path: p.port_name,
            port_type,
            manufacturer,
            product,
            serial_number,
            vid,
            pid,
        }
    }
}

impl PortInfo {
    /// Profile whose USB vendor ID matches this port
    pub fn matching_profile(&self) -> Option<&'static DeviceProfile> {
        self.vid.and_then(devices::profile_for_vendor)
    }
}

/// List all available serial ports
pub fn list_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports()?;
    Ok(ports.into_iter().map(PortInfo::from).collect())
}

/// Print formatted list of available serial ports
pub fn print_ports() -> Result<()> {
    let ports = list_ports()?;

    if ports.is_empty() {
        println!("{}", "No serial ports found".yellow());
        println!("\n{}", "Troubleshooting tips:".cyan().bold());
        println!("  1. Connect the board's USB debug port");
        println!("  2. Check if the device is recognized: ls -la /dev/ttyACM* /dev/ttyUSB*");
        println!("  3. Add your user to the 'dialout' group: sudo usermod -aG dialout $USER");
        println!("  4. Check dmesg for connection events: dmesg | tail -20");
        return Ok(());
    }

    println!("{}", "Available Serial Ports:".green().bold());
    println!("{}", "=".repeat(60));

    for port in &ports {
        println!("\n{}: {}", "Port".cyan(), port.path.white().bold());
        println!("  Type: {}", port.port_type);

        if let Some(ref mfg) = port.manufacturer {
            println!("  Manufacturer: {}", mfg);
        }
        if let Some(ref prod) = port.product {
            println!("  Product: {}", prod);
        }
        if let Some(ref sn) = port.serial_number {
            println!("  Serial: {}", sn);
        }
        if let (Some(vid), Some(pid)) = (port.vid, port.pid) {
            println!("  VID:PID: {:04x}:{:04x}", vid, pid);
        }
        if let Some(profile) = port.matching_profile() {
            println!("  Profile: {}", profile.id.green());
        }
    }

    println!("\n{}", "=".repeat(60));
    println!(
        "{}",
        "Use: serial-script run -p <PORT> to play the board's script".yellow()
    );

    Ok(())
}
