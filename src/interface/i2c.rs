use embedded_hal as hal;
use hal::blocking::i2c::{Read, Write};

use super::DeviceInterface;
use crate::Error;

/// Quectel L76 family register address
pub const GPS_I2C_ADDR: u8 = 0x10;

/// The device serves sentence data in fixed 255 byte register reads.
const BUS_READ_LEN: usize = 255;

/// This encapsulates an I2C-attached receiver such as the Quectel L76-L.
pub struct I2cInterface<I2C> {
    /// the bus to use when communicating
    i2c: I2C,
}

impl<I2C, CommE> I2cInterface<I2C>
where
    I2C: Read<Error = CommE> + Write<Error = CommE>,
{
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }
}

impl<I2C, CommE> DeviceInterface for I2cInterface<I2C>
where
    I2C: Read<Error = CommE> + Write<Error = CommE>,
{
    type InterfaceError = Error<CommE>;

    /// Write to the register to start sending data.
    fn wake(&mut self) -> Result<(), Self::InterfaceError> {
        self.i2c.write(GPS_I2C_ADDR, &[]).map_err(Error::Comm)
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, Self::InterfaceError> {
        let len = BUS_READ_LEN.min(buf.len());
        self.i2c
            .read(GPS_I2C_ADDR, &mut buf[..len])
            .map_err(Error::Comm)?;
        Ok(len)
    }
}
