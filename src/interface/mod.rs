pub mod spi;

pub use self::spi::SpiInterface;

/// A method of communicating with the sensor
pub trait SensorInterface {
    /// Interface error type
    type InterfaceError;

    /// Read a single 8-bit register
    fn register_read(&mut self, reg: u8) -> Result<u8, Self::InterfaceError>;

    /// Write a single 8-bit register
    fn register_write(&mut self, reg: u8, val: u8) -> Result<(), Self::InterfaceError>;

    /// Read three consecutive 16-bit values in one bus transaction,
    /// starting at the given register
    fn read_vec3_i16(&mut self, reg: u8) -> Result<[i16; 3], Self::InterfaceError>;
}
