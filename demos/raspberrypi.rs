use std::thread::sleep;
use std::time::Duration;

use iis2dh::{Axes, Builder, Config, FullScale, Mode, OutputDataRate};
use linux_embedded_hal::gpio_cdev::{Chip, LineRequestFlags};
use linux_embedded_hal::spidev::{self, SpidevOptions};
use linux_embedded_hal::{CdevPin, SpidevBus};

fn main() {
    let mut spi = SpidevBus::open("/dev/spidev0.0").expect("SPI device");
    let options = SpidevOptions::new()
        .bits_per_word(8)
        .max_speed_hz(10_000_000)
        .mode(spidev::SpiModeFlags::SPI_MODE_3)
        .build();
    spi.0.configure(&options).expect("SPI configuration");

    let mut chip = Chip::new("/dev/gpiochip0").expect("gpio chip");
    let cs_line = chip.get_line(4).expect("CS line");
    let cs_handle = cs_line
        .request(LineRequestFlags::OUTPUT, 1, "iis2dh-cs")
        .expect("CS request");
    let cs = CdevPin::new(cs_handle).expect("CS pin");

    //initialize the sensor through spi
    let mut accel = Builder::new_spi(spi, cs);

    println!(
        "Check device, device present = {}",
        accel.check_identity().unwrap()
    );

    // high resolution, 1.344 kHz, ±2g, all three axes
    let config = Config {
        mode: Mode::HighRes,
        odr: OutputDataRate::Rate_1344hz,
        scale: FullScale::Range_2g,
        axes: Axes::Xyz,
    };
    accel.init(config).expect("error init");

    let (ctrl_reg1, ctrl_reg4) = accel.dump_config().unwrap();
    println!("CTRL_REG1: 0x{:02X}", ctrl_reg1);
    println!("CTRL_REG4: 0x{:02X}", ctrl_reg4);

    loop {
        if accel.data_ready().unwrap() {
            let raw = accel.read_accel_raw().unwrap();
            let mg = accel.read_accel_mg().unwrap();
            println!("raw: {:?}  mg: {:?}", raw, mg);
        }
        sleep(Duration::from_millis(500));
    }
}
