use embedded_hal as hal;
use hal::digital::OutputPin;
use hal::spi::SpiBus;

use super::SensorInterface;
use crate::Error;
#[cfg(feature = "rttdebug")]
use panic_rtt_core::rprintln;

/// This combines the SPI peripheral and
/// associated control pins such as:
/// - CSN : Chip Select (aka SS or Slave Select)
///
/// The sensor expects SPI mode 3, MSB first, 10 MHz maximum clock;
/// configuring the bus is the caller's job.
pub struct SpiInterface<SPI, CSN> {
    /// the SPI port to use when communicating
    spi: SPI,
    /// the Chip Select pin (GPIO output) to use when communicating
    csn: CSN,
}

impl<SPI, CSN, CommE, PinE> SpiInterface<SPI, CSN>
where
    SPI: SpiBus<u8, Error = CommE>,
    CSN: OutputPin<Error = PinE>,
{
    /// Combined with register address for reading single byte register
    const DIR_READ: u8 = 0x80; // same as 1<<7

    /// Combined with register address for multi-byte reads:
    /// the address auto-increments after every byte transferred
    const ADDR_INC: u8 = 0x40; // same as 1<<6

    pub fn new(spi: SPI, csn: CSN) -> Self {
        let mut inst = Self { spi, csn };
        //ensure that the device is initially deselected
        let _ = inst.csn.set_high();
        inst
    }

    /// Release owned resources
    pub fn release(self) -> (SPI, CSN) {
        (self.spi, self.csn)
    }

    /// Clock one full-duplex frame out and back, chip select held low
    /// for the duration.
    fn transfer_block(&mut self, buffer: &mut [u8]) -> Result<(), Error<CommE, PinE>> {
        self.csn.set_low().map_err(Error::Pin)?;
        let rc = self
            .spi
            .transfer_in_place(buffer)
            .and_then(|_| self.spi.flush());
        self.csn.set_high().map_err(Error::Pin)?;
        rc.map_err(Error::Comm)?;

        Ok(())
    }

    fn write_block(&mut self, block: &[u8]) -> Result<(), Error<CommE, PinE>> {
        #[cfg(feature = "rttdebug")]
        rprintln!("write {:x?} ", block);

        self.csn.set_low().map_err(Error::Pin)?;
        let rc = self.spi.write(block).and_then(|_| self.spi.flush());
        self.csn.set_high().map_err(Error::Pin)?;
        rc.map_err(Error::Comm)?;

        Ok(())
    }
}

impl<SPI, CSN, CommE, PinE> SensorInterface for SpiInterface<SPI, CSN>
where
    SPI: SpiBus<u8, Error = CommE>,
    CSN: OutputPin<Error = PinE>,
{
    type InterfaceError = Error<CommE, PinE>;

    fn register_read(&mut self, reg: u8) -> Result<u8, Self::InterfaceError> {
        // the register value is echoed back during the dummy byte
        let mut block: [u8; 2] = [reg | Self::DIR_READ, 0];
        self.transfer_block(&mut block)?;

        #[cfg(feature = "rttdebug")]
        rprintln!("read reg 0x{:x} {:x?} ", reg, block[1]);

        Ok(block[1])
    }

    fn register_write(&mut self, reg: u8, val: u8) -> Result<(), Self::InterfaceError> {
        let block: [u8; 2] = [reg & 0x7F, val];
        self.write_block(&block)?;
        Ok(())
    }

    fn read_vec3_i16(&mut self, reg: u8) -> Result<[i16; 3], Self::InterfaceError> {
        let mut block: [u8; 7] = [0; 7];
        block[0] = reg | Self::DIR_READ | Self::ADDR_INC;
        self.transfer_block(&mut block)?;

        // low byte first for each axis
        Ok([
            i16::from_le_bytes([block[1], block[2]]),
            i16::from_le_bytes([block[3], block[4]]),
            i16::from_le_bytes([block[5], block[6]]),
        ])
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};
    use std::vec;

    #[test]
    fn new_deselects_the_device() {
        let mut spi = SpiMock::new(&[]);
        let mut csn = PinMock::new(&[PinTransaction::set(PinState::High)]);

        let iface = SpiInterface::new(spi.clone(), csn.clone());
        drop(iface);

        spi.done();
        csn.done();
    }

    #[test]
    fn register_read_sets_the_read_bit() {
        let spi_expectations = [
            SpiTransaction::transfer_in_place(vec![0x8F, 0x00], vec![0x00, 0x33]),
            SpiTransaction::flush(),
        ];
        let pin_expectations = [
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ];
        let mut spi = SpiMock::new(&spi_expectations);
        let mut csn = PinMock::new(&pin_expectations);

        let mut iface = SpiInterface::new(spi.clone(), csn.clone());
        assert_eq!(iface.register_read(0x0F).unwrap(), 0x33);

        spi.done();
        csn.done();
    }

    #[test]
    fn register_write_masks_the_read_bit() {
        let spi_expectations = [
            SpiTransaction::write_vec(vec![0x20, 0x57]),
            SpiTransaction::flush(),
        ];
        let pin_expectations = [
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ];
        let mut spi = SpiMock::new(&spi_expectations);
        let mut csn = PinMock::new(&pin_expectations);

        let mut iface = SpiInterface::new(spi.clone(), csn.clone());
        iface.register_write(0xA0, 0x57).unwrap();

        spi.done();
        csn.done();
    }

    #[test]
    fn burst_read_auto_increments_and_assembles_little_endian() {
        let spi_expectations = [
            SpiTransaction::transfer_in_place(
                vec![0xE8, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
                vec![0x00, 0x10, 0x00, 0xF0, 0xFF, 0x00, 0x80],
            ),
            SpiTransaction::flush(),
        ];
        let pin_expectations = [
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ];
        let mut spi = SpiMock::new(&spi_expectations);
        let mut csn = PinMock::new(&pin_expectations);

        let mut iface = SpiInterface::new(spi.clone(), csn.clone());
        assert_eq!(iface.read_vec3_i16(0x28).unwrap(), [16, -16, -32768]);

        spi.done();
        csn.done();
    }
}
