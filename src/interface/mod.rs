pub mod serial;
pub use self::serial::SerialInterface;

pub mod i2c;
pub use self::i2c::I2cInterface;

/// A method of communicating with the receiver
pub trait DeviceInterface {
    /// Interface associated error type
    type InterfaceError;

    /// Ask the receiver to start streaming sentences.
    /// Interfaces that need no kick leave the default no-op.
    fn wake(&mut self) -> Result<(), Self::InterfaceError> {
        Ok(())
    }

    /// Read the next chunk of raw sentence bytes into `buf`.
    /// Returns the number of bytes placed; zero means nothing was available.
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, Self::InterfaceError>;
}
