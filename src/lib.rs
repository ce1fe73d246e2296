/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

#![no_std]

use embedded_hal as hal;
use hal::digital::OutputPin;

#[cfg(feature = "rttdebug")]
use panic_rtt_core::rprintln;

mod interface;
pub use interface::{SensorInterface, SpiInterface};

/// Errors in this crate
#[derive(Debug)]
pub enum Error<CommE, PinE> {
    /// Sensor communication error
    Comm(CommE),
    /// Pin setting error
    Pin(PinE),
}

pub struct Builder {}

impl Builder {
    /// Create a new driver using SPI interface
    pub fn new_spi<SPI, CSN, CommE, PinE>(spi: SPI, csn: CSN) -> IIS2DH<SpiInterface<SPI, CSN>>
    where
        SPI: hal::spi::SpiBus<u8, Error = CommE>,
        CSN: OutputPin<Error = PinE>,
        CommE: core::fmt::Debug,
        PinE: core::fmt::Debug,
    {
        let iface = interface::SpiInterface::new(spi, csn);
        IIS2DH::new_with_interface(iface)
    }
}

pub struct IIS2DH<SI> {
    pub(crate) si: SI,

    /// operating mode last written to the sensor, used for sample decode
    pub(crate) mode: Mode,
    /// full-scale range last written to the sensor, used for unit conversion
    pub(crate) scale: FullScale,
}

impl<SI, CommE, PinE> IIS2DH<SI>
where
    SI: SensorInterface<InterfaceError = Error<CommE, PinE>>,
{
    pub(crate) fn new_with_interface(sensor_interface: SI) -> Self {
        Self {
            si: sensor_interface,
            mode: Mode::default(),
            scale: FullScale::default(),
        }
    }

    /// Read the sensor identifier and return true if it matches the expected value
    pub fn check_identity(&mut self) -> Result<bool, SI::InterfaceError> {
        let chip_id = self.si.register_read(REG_WHO_AM_I)?;
        if chip_id == IIS2DH_WAI {
            #[cfg(feature = "rttdebug")]
            rprintln!("found device: 0x{:0x}  ", chip_id);
            return Ok(true);
        }

        #[cfg(feature = "rttdebug")]
        rprintln!("bogus whoami: 0x{:0x}  ", chip_id);

        Ok(false)
    }

    /// Apply an operating configuration to the sensor.
    ///
    /// Writes CTRL_REG1 then CTRL_REG4. A power-down rate writes only
    /// CTRL_REG1 (0x00): the remaining fields have no effect on a sensor
    /// that produces no samples.
    pub fn init(&mut self, config: Config) -> Result<(), SI::InterfaceError> {
        // capture mode and scale up front so later conversions match the
        // caller's intent even if a register write is garbled on the wire
        self.mode = config.mode;
        self.scale = config.scale;

        if config.odr == OutputDataRate::PowerDown {
            return self.si.register_write(REG_CTRL_REG1, 0x00);
        }

        self.si.register_write(REG_CTRL_REG1, config.ctrl_reg1())?;
        self.si.register_write(REG_CTRL_REG4, config.ctrl_reg4())?;

        Ok(())
    }

    /// Write a single register
    pub fn write_register(&mut self, reg: u8, val: u8) -> Result<(), SI::InterfaceError> {
        self.si.register_write(reg, val)
    }

    /// Read a single register
    pub fn read_register(&mut self, reg: u8) -> Result<u8, SI::InterfaceError> {
        self.si.register_read(reg)
    }

    /// Read one raw acceleration sample for the three axes.
    ///
    /// A powered-down sensor (CTRL_REG1 reads 0x00) yields an all-zero
    /// sample without touching the output registers.
    pub fn read_accel_raw(&mut self) -> Result<[i16; 3], SI::InterfaceError> {
        if self.si.register_read(REG_CTRL_REG1)? == 0x00 {
            return Ok([0; 3]);
        }

        let raw = self.si.read_vec3_i16(REG_OUT_X_L)?;

        // samples are left-justified; arithmetic shift keeps the sign
        let shift = self.mode.shift();
        Ok([raw[0] >> shift, raw[1] >> shift, raw[2] >> shift])
    }

    /// Read one acceleration sample converted to milli-g
    pub fn read_accel_mg(&mut self) -> Result<[f32; 3], SI::InterfaceError> {
        let raw = self.read_accel_raw()?;
        let sens = self.mode.sensitivity_mg(self.scale);
        Ok([
            sens * (raw[0] as f32),
            sens * (raw[1] as f32),
            sens * (raw[2] as f32),
        ])
    }

    /// Route the data-ready signal to the INT1 pin.
    ///
    /// The pin level can then be polled or wired to an edge interrupt on
    /// the host; `data_ready` reads the same flag over the bus.
    pub fn configure_int1_data_ready(&mut self) -> Result<(), SI::InterfaceError> {
        /// route DRDY1 to INT1
        const I1_ZYXDA: u8 = 1 << 4;

        // no interrupt latching
        self.si.register_write(REG_CTRL_REG5, 0x00)?;
        // no other interrupt sources
        self.si.register_write(REG_CTRL_REG6, 0x00)?;
        self.si.register_write(REG_CTRL_REG3, I1_ZYXDA)?;
        // no threshold interrupts
        self.si.register_write(REG_INT1_CFG, 0x00)?;

        Ok(())
    }

    /// Return true if a new sample is available on all three axes
    pub fn data_ready(&mut self) -> Result<bool, SI::InterfaceError> {
        /// new X, Y and Z data available
        const STATUS_ZYXDA: u8 = 1 << 3;

        let status = self.si.register_read(REG_STATUS_REG)?;
        Ok(status & STATUS_ZYXDA != 0)
    }

    /// Read back the two control registers, for diagnostics
    pub fn dump_config(&mut self) -> Result<(u8, u8), SI::InterfaceError> {
        let ctrl_reg1 = self.si.register_read(REG_CTRL_REG1)?;
        let ctrl_reg4 = self.si.register_read(REG_CTRL_REG4)?;

        #[cfg(feature = "rttdebug")]
        rprintln!("CTRL_REG1: 0x{:x} CTRL_REG4: 0x{:x}", ctrl_reg1, ctrl_reg4);

        Ok((ctrl_reg1, ctrl_reg4))
    }
}

/// Register map
///
pub const REG_WHO_AM_I: u8 = 0x0F;
pub const REG_CTRL_REG1: u8 = 0x20;
pub const REG_CTRL_REG3: u8 = 0x22;
pub const REG_CTRL_REG4: u8 = 0x23;
pub const REG_CTRL_REG5: u8 = 0x24;
pub const REG_CTRL_REG6: u8 = 0x25;
pub const REG_STATUS_REG: u8 = 0x27;
pub const REG_OUT_X_L: u8 = 0x28;
pub const REG_INT1_CFG: u8 = 0x30;

/// Device ID expected in WHO_AM_I
const IIS2DH_WAI: u8 = 0x33;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// Resolution mode: the sensor trades sample width for power draw.
pub enum Mode {
    /// 8-bit samples
    LowPower,
    /// 10-bit samples
    Normal,
    /// 12-bit samples
    HighRes,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::HighRes
    }
}

impl Mode {
    /// Right shift that discards the padding bits of a left-justified sample
    pub(crate) fn shift(self) -> u8 {
        match self {
            Mode::HighRes => 4,
            Mode::Normal => 6,
            // low-power data nominally occupies only the high byte;
            // it is decoded unshifted here, low-order bits included
            Mode::LowPower => 0,
        }
    }

    /// Sensitivity in milli-g per LSB for this mode at the given range
    pub fn sensitivity_mg(self, scale: FullScale) -> f32 {
        match (self, scale) {
            (Mode::HighRes, FullScale::Range_2g) => 0.98,
            (Mode::HighRes, FullScale::Range_4g) => 1.95,
            (Mode::HighRes, FullScale::Range_8g) => 3.91,
            (Mode::HighRes, FullScale::Range_16g) => 11.72,
            (Mode::Normal, FullScale::Range_2g) => 3.9,
            (Mode::Normal, FullScale::Range_4g) => 7.82,
            (Mode::Normal, FullScale::Range_8g) => 15.63,
            (Mode::Normal, FullScale::Range_16g) => 46.9,
            (Mode::LowPower, FullScale::Range_2g) => 15.63,
            (Mode::LowPower, FullScale::Range_4g) => 31.26,
            (Mode::LowPower, FullScale::Range_8g) => 62.52,
            (Mode::LowPower, FullScale::Range_16g) => 187.58,
        }
    }
}

#[repr(u8)]
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// The accelerometer has a user-programmable full-scale range
/// of ±2g, ±4g, ±8g, and ±16g.
/// The numeric values of these enums correspond to the FS bits of CTRL_REG4.
pub enum FullScale {
    /// ±2g
    Range_2g = 0b00,
    /// ±4g
    Range_4g = 0b01,
    /// ±8g
    Range_8g = 0b10,
    /// ±16g
    Range_16g = 0b11,
}

impl Default for FullScale {
    fn default() -> Self {
        FullScale::Range_2g
    }
}

#[repr(u8)]
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// Output data rate. The numeric values correspond to the ODR bits of
/// CTRL_REG1.
pub enum OutputDataRate {
    /// no sampling
    PowerDown = 0x00,
    /// 1 Hz
    Rate_1hz = 0x01,
    /// 10 Hz
    Rate_10hz = 0x02,
    /// 25 Hz
    Rate_25hz = 0x03,
    /// 50 Hz
    Rate_50hz = 0x04,
    /// 100 Hz
    Rate_100hz = 0x05,
    /// 200 Hz
    Rate_200hz = 0x06,
    /// 400 Hz
    Rate_400hz = 0x07,
    /// 1.62 kHz, low-power mode only
    Rate_1620hz_lp = 0x08,
    /// 1.344 kHz in high-resolution and normal modes, 5.376 kHz in low-power
    Rate_1344hz = 0x09,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// Which axes the sensor samples
pub enum Axes {
    Xyz,
    Xy,
    Xz,
    Yz,
    X,
    Y,
    Z,
}

impl Axes {
    /// CTRL_REG1 enable bits: X = bit 2, Y = bit 1, Z = bit 0
    pub(crate) fn enable_bits(self) -> u8 {
        match self {
            Axes::Xyz => 0b111,
            Axes::Xy => 0b110,
            Axes::Xz => 0b101,
            Axes::Yz => 0b011,
            Axes::X => 0b100,
            Axes::Y => 0b010,
            Axes::Z => 0b001,
        }
    }
}

#[derive(Copy, Clone, Debug)]
/// Operating configuration applied by `init`
pub struct Config {
    pub mode: Mode,
    pub odr: OutputDataRate,
    pub scale: FullScale,
    pub axes: Axes,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::HighRes,
            odr: OutputDataRate::Rate_100hz,
            scale: FullScale::Range_2g,
            axes: Axes::Xyz,
        }
    }
}

impl Config {
    /// CTRL_REG1 bit layout: ODR[7:4] | LPen[3] | Xen[2] | Yen[1] | Zen[0]
    pub(crate) fn ctrl_reg1(&self) -> u8 {
        if self.odr == OutputDataRate::PowerDown {
            return 0x00;
        }

        let lp = (self.mode == Mode::LowPower) as u8;
        ((self.odr as u8) << 4) | (lp << 3) | self.axes.enable_bits()
    }

    /// CTRL_REG4 bit layout: FS[5:4] | HR[3].
    ///
    /// Normal and low-power leave HR clear; the low-power distinction
    /// lives only in CTRL_REG1's LPen bit.
    pub(crate) fn ctrl_reg4(&self) -> u8 {
        let hr = (self.mode == Mode::HighRes) as u8;
        ((self.scale as u8) << 4) | (hr << 3)
    }
}
