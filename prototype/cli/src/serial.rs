use std::io::{self, Write};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, SerialPortType, StopBits};

/// Line parameters the rig firmware expects. Not user configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSettings {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
    pub timeout: Duration,
}

impl Default for LineSettings {
    fn default() -> Self {
        Self {
            baud_rate: crate::consts::BAUD_RATE,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
            timeout: Duration::from_millis(100),
        }
    }
}

/// What the platform tells us about a serial device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortInfo {
    /// Identifier used to open the port, e.g. `COM4` or `/dev/ttyUSB0`
    pub name: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    pub serial_number: Option<String>,
}

impl PortInfo {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// An open, writable serial connection.
pub trait Link: Send {
    fn name(&self) -> &str;

    /// Write a frame, returning how many bytes the platform accepted.
    fn write(&mut self, frame: &[u8]) -> io::Result<usize>;
}

/// Access to the serial devices of the host.
pub trait Platform: Send + 'static {
    fn available_ports(&self) -> io::Result<Vec<PortInfo>>;

    fn open(&mut self, name: &str, settings: &LineSettings) -> io::Result<Box<dyn Link>>;
}

/// The real thing, backed by the `serialport` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPlatform;

impl Platform for SystemPlatform {
    fn available_ports(&self) -> io::Result<Vec<PortInfo>> {
        let ports = serialport::available_ports()?;
        Ok(ports
            .into_iter()
            .map(|p| {
                let mut info = PortInfo {
                    location: Some(p.port_name.clone()),
                    name: p.port_name,
                    ..PortInfo::default()
                };
                match p.port_type {
                    SerialPortType::UsbPort(usb) => {
                        info.description = usb.product;
                        info.manufacturer = usb.manufacturer;
                        info.serial_number = usb.serial_number;
                    }
                    SerialPortType::PciPort => info.description = Some("PCI".to_owned()),
                    SerialPortType::BluetoothPort => {
                        info.description = Some("Bluetooth".to_owned())
                    }
                    SerialPortType::Unknown => {}
                }
                info
            })
            .collect())
    }

    fn open(&mut self, name: &str, settings: &LineSettings) -> io::Result<Box<dyn Link>> {
        let port = serialport::new(name, settings.baud_rate)
            .data_bits(settings.data_bits)
            .parity(settings.parity)
            .stop_bits(settings.stop_bits)
            .flow_control(settings.flow_control)
            .timeout(settings.timeout)
            .open()?;

        Ok(Box::new(SerialLink {
            name: name.to_owned(),
            port,
        }))
    }
}

pub struct SerialLink {
    name: String,
    port: Box<dyn SerialPort>,
}

impl Link for SerialLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&mut self, frame: &[u8]) -> io::Result<usize> {
        write_frame(&mut self.port, &self.name, frame)
    }
}

/// Write a frame and push it out. A failed flush does not undo the
/// bytes the port already accepted, so the count is still returned.
fn write_frame<W: Write + ?Sized>(port: &mut W, name: &str, frame: &[u8]) -> io::Result<usize> {
    let written = port.write(frame)?;
    if let Err(e) = port.flush() {
        log::warn!("Failed to flush {}: {}", name, e);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_line_is_115200_8n1() {
        let s = LineSettings::default();
        assert_eq!(s.baud_rate, 115_200);
        assert_eq!(s.data_bits, DataBits::Eight);
        assert_eq!(s.parity, Parity::None);
        assert_eq!(s.stop_bits, StopBits::One);
        assert_eq!(s.flow_control, FlowControl::None);
    }

    struct StuckFlush(Vec<u8>);

    impl Write for StuckFlush {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::TimedOut, "flush timed out"))
        }
    }

    #[test]
    fn failed_flush_keeps_written_count() {
        let mut port = StuckFlush(Vec::new());
        let written = write_frame(&mut port, "COM4", &[0x09]).unwrap();
        assert_eq!(written, 1);
        assert_eq!(port.0, vec![0x09]);
    }

    #[test]
    fn write_errors_are_still_reported() {
        struct Gone;
        impl Write for Gone {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let err = write_frame(&mut Gone, "COM4", &[0x01]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn named_port_has_no_metadata() {
        let p = PortInfo::named("COM4");
        assert_eq!(p.name, "COM4");
        assert!(p.manufacturer.is_none());
        assert!(p.location.is_none());
    }
}
