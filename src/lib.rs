//! A platform-agnostic driver for the DS3231 battery-backed real-time clock.
//!
//! The DS3231 keeps time in an 8-register BCD block (seconds through year,
//! plus a control byte for the square wave output) and exposes its internal
//! temperature sensor through a separate register pair. This crate provides:
//!
//! - A register-level driver ([`DS3231`]) over `embedded-hal` I2C, with
//!   chrono-based date/time conversion and temperature readout
//! - A host integration layer ([`component::DS3231Component`]) that
//!   synchronizes a system clock from the RTC on a periodic tick and writes
//!   the system time back on demand
//! - An async driver ([`asynch::DS3231`]) behind the `async` feature
//!
//! All times are interpreted as UTC; timezone handling belongs to the host.
//! Only years 2000-2099 are representable in the year register.
//!
//! # Example
//!
//! ```rust,ignore
//! use ds3231_rtc::{DS3231, DEFAULT_ADDRESS};
//!
//! let mut rtc = DS3231::new(i2c, DEFAULT_ADDRESS);
//!
//! // Get current date/time
//! let datetime = rtc.datetime()?;
//!
//! // Read the die temperature in Celsius
//! let celsius = rtc.temperature_f32()?;
//! ```

#![no_std]

#[macro_use]
mod fmt;

pub mod component;
mod datetime;
mod registers;

#[cfg(feature = "async")]
pub mod asynch;

pub(crate) use datetime::DS3231DateTime;
pub use datetime::DS3231DateTimeError;
pub use registers::*;

use chrono::NaiveDateTime;
use embedded_hal::i2c::I2c;

/// Factory-default I2C address of the DS3231.
pub const DEFAULT_ADDRESS: u8 = 0x68;

/// Lowest temperature the sensor can plausibly report, in Celsius.
pub const TEMPERATURE_MIN_CELSIUS: f32 = -40.0;
/// Highest temperature the sensor can plausibly report, in Celsius.
pub const TEMPERATURE_MAX_CELSIUS: f32 = 85.0;

/// Square wave output configuration applied by [`DS3231::configure`].
pub struct Config {
    /// Enable the square wave output pin
    pub square_wave_enable: bool,
    /// Square wave output frequency
    pub square_wave_frequency: SquareWaveFrequency,
    /// Output pin level while the square wave is disabled
    pub output_control: OutputLevel,
}

/// Errors returned by the DS3231 driver.
#[derive(Debug)]
pub enum DS3231Error<I2CE> {
    /// I2C bus transfer failed
    I2c(I2CE),
    /// Date/time conversion or validation failed
    DateTime(DS3231DateTimeError),
    /// Temperature reading outside the sensor's physical bounds,
    /// treated as a transient sensor glitch
    TemperatureOutOfRange,
}

impl<I2CE> From<I2CE> for DS3231Error<I2CE> {
    fn from(e: I2CE) -> Self {
        DS3231Error::I2c(e)
    }
}

/// DS3231 Real-Time Clock driver.
///
/// The driver remembers the control byte from the most recent register-block
/// read so that write-back preserves the square wave bits it does not own.
pub struct DS3231<I2C: I2c> {
    i2c: I2C,
    address: u8,
    control: Option<Control>,
}

impl<I2C: I2c> DS3231<I2C> {
    /// Creates a new DS3231 driver instance.
    ///
    /// # Arguments
    /// * `i2c` - The I2C bus implementation
    /// * `address` - The I2C address of the device (typically [`DEFAULT_ADDRESS`])
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            control: None,
        }
    }

    /// Releases the underlying I2C bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// The I2C address this driver talks to.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Configures the square wave output according to the provided
    /// configuration.
    ///
    /// The control register is read first so that reserved bits are
    /// preserved.
    ///
    /// # Errors
    /// Returns `DS3231Error::I2c` if either bus transfer fails.
    pub fn configure(&mut self, config: &Config) -> Result<(), DS3231Error<I2C::Error>> {
        let mut control = self.control()?;
        control.set_square_wave_enable(config.square_wave_enable);
        control.set_rate_select(config.square_wave_frequency);
        control.set_output_control(config.output_control);
        debug!("control: {:?}", control);
        self.set_control(control)?;
        self.control = Some(control);
        Ok(())
    }

    /// Reads the full register block (time, date and control) in one
    /// contiguous transfer.
    pub(crate) fn read_raw_datetime(&mut self) -> Result<DS3231DateTime, DS3231Error<I2C::Error>> {
        let mut data = [0; 8];
        self.i2c
            .write_read(self.address, &[RegAddr::Seconds as u8], &mut data)?;
        let raw = DS3231DateTime::from(data);
        self.control = Some(raw.control());
        debug!("read raw datetime: {:?}", raw);
        Ok(raw)
    }

    /// Writes the full register block in one contiguous transfer.
    pub(crate) fn write_raw_datetime(
        &mut self,
        datetime: &DS3231DateTime,
    ) -> Result<(), DS3231Error<I2C::Error>> {
        let data: [u8; 8] = datetime.into();
        debug!("write raw datetime: {:?}", datetime);
        self.i2c.write(
            self.address,
            &[
                RegAddr::Seconds as u8,
                data[0],
                data[1],
                data[2],
                data[3],
                data[4],
                data[5],
                data[6],
                data[7],
            ],
        )?;
        Ok(())
    }

    /// Gets the current date and time from the device.
    ///
    /// The decode is performed even while the oscillator is halted; use
    /// [`clock_halted`](Self::clock_halted) to decide whether the value is
    /// advancing.
    ///
    /// # Errors
    /// * `DS3231Error::I2c` if the bus transfer fails
    /// * `DS3231Error::DateTime` if the register contents do not form a
    ///   valid date/time
    pub fn datetime(&mut self) -> Result<NaiveDateTime, DS3231Error<I2C::Error>> {
        let raw = self.read_raw_datetime()?;
        raw.into_datetime().map_err(DS3231Error::DateTime)
    }

    /// Sets the current date and time on the device.
    ///
    /// The clock-halt flag is always cleared by this write, so a halted
    /// oscillator restarts. Control bits from the most recent read are
    /// carried over; if the device was never read they default to zero.
    ///
    /// # Errors
    /// * `DS3231Error::DateTime` if the datetime cannot be encoded
    /// * `DS3231Error::I2c` if the bus transfer fails
    pub fn set_datetime(&mut self, datetime: &NaiveDateTime) -> Result<(), DS3231Error<I2C::Error>> {
        let control = self.control.unwrap_or_default();
        let raw =
            DS3231DateTime::from_datetime(datetime, control).map_err(DS3231Error::DateTime)?;
        self.write_raw_datetime(&raw)
    }

    /// Returns true when the oscillator is stopped and the time registers
    /// are frozen.
    pub fn clock_halted(&mut self) -> Result<bool, DS3231Error<I2C::Error>> {
        Ok(self.second()?.clock_halt())
    }

    /// Reads the temperature sensor in degrees Celsius.
    ///
    /// The whole-degree byte is two's-complement; the quarter-degree bits
    /// are always a non-negative addend.
    ///
    /// # Errors
    /// * `DS3231Error::I2c` if the bus transfer fails
    /// * `DS3231Error::TemperatureOutOfRange` if the reading is outside
    ///   [-40.0, 85.0]
    pub fn temperature_f32(&mut self) -> Result<f32, DS3231Error<I2C::Error>> {
        let mut data = [0; 2];
        self.i2c
            .write_read(self.address, &[RegAddr::MSBTemp as u8], &mut data)?;
        let whole = Temperature(data[0]);
        let fraction = TemperatureFraction(data[1]);
        let celsius = f32::from(whole.degrees()) + 0.25 * f32::from(fraction.quarter_degrees());
        if !(TEMPERATURE_MIN_CELSIUS..=TEMPERATURE_MAX_CELSIUS).contains(&celsius) {
            warn!("temperature reading out of range: {:?}", celsius);
            return Err(DS3231Error::TemperatureOutOfRange);
        }
        Ok(celsius)
    }
}

// Generates single-register get and set accessors on the driver
macro_rules! set_and_get_register {
    ($(($name:ident, $regaddr:expr, $typ:ty)),+) => {
        impl<I2C: I2c> DS3231<I2C> {
            $(
                paste::paste! {
                    #[doc = concat!("Gets the value of the ", stringify!($name), " register.")]
                    pub fn $name(&mut self) -> Result<$typ, DS3231Error<I2C::Error>> {
                        let mut data = [0];
                        self.i2c
                            .write_read(self.address, &[$regaddr as u8], &mut data)?;
                        Ok($typ(data[0]))
                    }

                    #[doc = concat!("Sets the value of the ", stringify!($name), " register.")]
                    pub fn [< set_ $name >](&mut self, value: $typ) -> Result<(), DS3231Error<I2C::Error>> {
                        self.i2c.write(
                            self.address,
                            &[$regaddr as u8, value.into()],
                        )?;
                        Ok(())
                    }
                }
            )+
        }
    }
}

set_and_get_register!(
    (second, RegAddr::Seconds, Seconds),
    (minute, RegAddr::Minutes, Minutes),
    (hour, RegAddr::Hours, Hours),
    (day, RegAddr::Day, Day),
    (date, RegAddr::Date, Date),
    (month, RegAddr::Month, Month),
    (year, RegAddr::Year, Year),
    (control, RegAddr::Control, Control),
    (temperature, RegAddr::MSBTemp, Temperature),
    (temperature_fraction, RegAddr::LSBTemp, TemperatureFraction)
);
