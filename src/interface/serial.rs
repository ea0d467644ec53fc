use embedded_hal as hal;

use super::DeviceInterface;
use crate::Error;

/// This encapsulates the serial UART peripheral the receiver streams
/// sentences on.
pub struct SerialInterface<SER> {
    /// the serial port to use when communicating
    serial: SER,
}

impl<SER, CommE> SerialInterface<SER>
where
    SER: hal::serial::Read<u8, Error = CommE>,
{
    pub fn new(serial_port: SER) -> Self {
        Self {
            serial: serial_port,
        }
    }
}

impl<SER, CommE> DeviceInterface for SerialInterface<SER>
where
    SER: hal::serial::Read<u8, Error = CommE>,
{
    type InterfaceError = Error<CommE>;

    /// Drain whatever the port has buffered, bounded by `buf`.
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, Self::InterfaceError> {
        let mut count = 0;
        while count < buf.len() {
            match self.serial.read() {
                Ok(byte) => {
                    buf[count] = byte;
                    count += 1;
                }
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(e)) => return Err(Error::Comm(e)),
            }
        }
        Ok(count)
    }
}
