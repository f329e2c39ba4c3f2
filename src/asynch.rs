//! Async implementation of the DS3231 driver.
//!
//! This module provides an async interface to the DS3231 RTC device using
//! `embedded-hal-async` traits. It is only available when the `async` feature
//! is enabled.
//!
//! # Example
//!
//! ```rust,ignore
//! use ds3231_rtc::asynch::DS3231;
//!
//! // Initialize device
//! let mut rtc = DS3231::new(i2c, 0x68);
//!
//! // Get current date/time asynchronously
//! let datetime = rtc.datetime().await?;
//!
//! // Read the die temperature asynchronously
//! let celsius = rtc.temperature_f32().await?;
//! ```

use chrono::NaiveDateTime;
use embedded_hal_async::i2c::I2c;
use paste::paste;

use crate::{
    Config, Control, DS3231DateTime, DS3231Error, Date, Day, Hours, Minutes, Month, RegAddr,
    Seconds, Temperature, TemperatureFraction, Year, TEMPERATURE_MAX_CELSIUS,
    TEMPERATURE_MIN_CELSIUS,
};

/// DS3231 Real-Time Clock async driver.
///
/// This struct provides the async interface to the DS3231 RTC device.
/// Like the sync driver it remembers the control byte from the most recent
/// register-block read so that write-back preserves the square wave bits.
pub struct DS3231<I2C: I2c> {
    i2c: I2C,
    address: u8,
    control: Option<Control>,
}

impl<I2C: I2c> DS3231<I2C> {
    /// Creates a new DS3231 async driver instance.
    ///
    /// # Arguments
    /// * `i2c` - The async I2C bus implementation
    /// * `address` - The I2C address of the device (typically 0x68)
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

    /// Configures the square wave output according to the provided
    /// configuration.
    ///
    /// # Arguments
    /// * `config` - The configuration to apply
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err(DS3231Error)` on error
    pub async fn configure(&mut self, config: &Config) -> Result<(), DS3231Error<I2C::Error>> {
        let mut control = self.control().await?;
        control.set_square_wave_enable(config.square_wave_enable);
        control.set_rate_select(config.square_wave_frequency);
        control.set_output_control(config.output_control);
        debug!("control: {:?}", control);
        self.set_control(control).await?;
        self.control = Some(control);
        Ok(())
    }

    /// Reads the full register block from the device in one transfer.
    ///
    /// # Returns
    /// * `Ok(DS3231DateTime)` - The raw register values on success
    /// * `Err(DS3231Error)` on error
    async fn read_raw_datetime(&mut self) -> Result<DS3231DateTime, DS3231Error<I2C::Error>> {
        let mut data = [0; 8];
        self.i2c
            .write_read(self.address, &[RegAddr::Seconds as u8], &mut data)
            .await?;
        let raw = DS3231DateTime::from(data);
        self.control = Some(raw.control());
        Ok(raw)
    }

    /// Writes the full register block to the device in one transfer.
    ///
    /// # Arguments
    /// * `datetime` - The raw register values to write
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err(DS3231Error)` on error
    async fn write_raw_datetime(
        &mut self,
        datetime: &DS3231DateTime,
    ) -> Result<(), DS3231Error<I2C::Error>> {
        let data: [u8; 8] = datetime.into();
        self.i2c
            .write(
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
            )
            .await?;
        Ok(())
    }

    /// Gets the current date and time from the device.
    ///
    /// # Returns
    /// * `Ok(NaiveDateTime)` - The current date and time
    /// * `Err(DS3231Error)` on error
    pub async fn datetime(&mut self) -> Result<NaiveDateTime, DS3231Error<I2C::Error>> {
        let raw = self.read_raw_datetime().await?;
        raw.into_datetime().map_err(DS3231Error::DateTime)
    }

    /// Sets the current date and time on the device, clearing the clock-halt
    /// flag.
    ///
    /// # Arguments
    /// * `datetime` - The date and time to set
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err(DS3231Error)` on error
    pub async fn set_datetime(
        &mut self,
        datetime: &NaiveDateTime,
    ) -> Result<(), DS3231Error<I2C::Error>> {
        let control = self.control.unwrap_or_default();
        let raw =
            DS3231DateTime::from_datetime(datetime, control).map_err(DS3231Error::DateTime)?;
        self.write_raw_datetime(&raw).await?;
        Ok(())
    }

    /// Returns true when the oscillator is stopped and the time registers
    /// are frozen.
    pub async fn clock_halted(&mut self) -> Result<bool, DS3231Error<I2C::Error>> {
        Ok(self.second().await?.clock_halt())
    }

    /// Reads the temperature sensor in degrees Celsius.
    ///
    /// # Returns
    /// * `Ok(f32)` - The temperature on success
    /// * `Err(DS3231Error)` on bus error or an out-of-range reading
    pub async fn temperature_f32(&mut self) -> Result<f32, DS3231Error<I2C::Error>> {
        let mut data = [0; 2];
        self.i2c
            .write_read(self.address, &[RegAddr::MSBTemp as u8], &mut data)
            .await?;
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

// Register access implementations
macro_rules! impl_register_access {
    ($(($name:ident, $regaddr:expr, $typ:ty)),+) => {
        impl<I2C: I2c> DS3231<I2C> {
            $(
                paste! {
                    #[doc = concat!("Gets the value of the ", stringify!($name), " register.")]
                    #[doc = "\n\n# Returns"]
                    #[doc = concat!("* `Ok(", stringify!($typ), ")` - The register value on success")]
                    #[doc = "* `Err(DS3231Error)` on error"]
                    pub async fn $name(&mut self) -> Result<$typ, DS3231Error<I2C::Error>> {
                        let mut data = [0];
                        self.i2c
                            .write_read(self.address, &[$regaddr as u8], &mut data)
                            .await?;
                        Ok($typ(data[0]))
                    }

                    #[doc = concat!("Sets the value of the ", stringify!($name), " register.")]
                    #[doc = "\n\n# Arguments"]
                    #[doc = concat!("* `value` - The value to write to the ", stringify!($name), " register")]
                    #[doc = "\n\n# Returns"]
                    #[doc = "* `Ok(())` on success"]
                    #[doc = "* `Err(DS3231Error)` on error"]
                    pub async fn [<set_ $name>](&mut self, value: $typ) -> Result<(), DS3231Error<I2C::Error>> {
                        self.i2c.write(
                            self.address,
                            &[$regaddr as u8, value.into()],
                        ).await?;
                        Ok(())
                    }
                }
            )+
        }
    }
}

impl_register_access!(
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

#[cfg(test)]
mod tests {
    extern crate alloc;
    use super::*;
    use crate::{OutputLevel, SquareWaveFrequency};
    use alloc::vec;
    use chrono::{Datelike, NaiveDate, Timelike};
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};

    const DEVICE_ADDRESS: u8 = 0x68;

    async fn setup_mock(expectations: &[I2cTrans]) -> I2cMock {
        I2cMock::new(expectations)
    }

    #[tokio::test]
    async fn test_async_read_control() {
        let expected = 0b1001_0010; // OUT high, SQWE, 8.192 kHz
        let mock = setup_mock(&[I2cTrans::write_read(
            DEVICE_ADDRESS,
            vec![RegAddr::Control as u8],
            vec![expected],
        )])
        .await;
        let mut dev = DS3231::new(mock, DEVICE_ADDRESS);

        let control = dev.control().await.unwrap();
        assert_eq!(control.output_control(), OutputLevel::High);
        assert!(control.square_wave_enable());
        assert_eq!(control.rate_select(), SquareWaveFrequency::Hz8192);
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_configure() {
        let config = Config {
            square_wave_enable: true,
            square_wave_frequency: SquareWaveFrequency::Hz1,
            output_control: OutputLevel::Low,
        };

        let mock = setup_mock(&[
            // Read control register
            I2cTrans::write_read(DEVICE_ADDRESS, vec![RegAddr::Control as u8], vec![0]),
            // Write control register with the square wave enabled at 1 Hz
            I2cTrans::write(DEVICE_ADDRESS, vec![RegAddr::Control as u8, 0b0001_0000]),
        ])
        .await;

        let mut dev = DS3231::new(mock, DEVICE_ADDRESS);
        dev.configure(&config).await.unwrap();
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_read_datetime() {
        // 2024-03-14 15:30:00
        let datetime_registers = [
            0x00, // seconds
            0x30, // minutes
            0x15, // hours
            0x05, // day (Thursday)
            0x14, // date
            0x03, // month
            0x24, // year
            0x00, // control
        ];

        let mock = setup_mock(&[I2cTrans::write_read(
            DEVICE_ADDRESS,
            vec![RegAddr::Seconds as u8],
            datetime_registers.to_vec(),
        )])
        .await;
        let mut dev = DS3231::new(mock, DEVICE_ADDRESS);

        let dt = dev.datetime().await.unwrap();
        assert_eq!(dt.hour(), 15);
        assert_eq!(dt.minute(), 30);
        assert_eq!(dt.second(), 0);
        assert_eq!(dt.day(), 14);
        assert_eq!(dt.month(), 3);
        assert_eq!(dt.year(), 2024);
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_set_datetime() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 14)
            .unwrap()
            .and_hms_opt(15, 30, 0)
            .unwrap();

        let mock = setup_mock(&[I2cTrans::write(
            DEVICE_ADDRESS,
            vec![
                RegAddr::Seconds as u8,
                0x00, // seconds, clock-halt cleared
                0x30, // minutes (BCD for 30)
                0x15, // hours (BCD for 15)
                0x05, // day (Thursday)
                0x14, // date
                0x03, // month
                0x24, // year
                0x00, // control, device never read
            ],
        )])
        .await;
        let mut dev = DS3231::new(mock, DEVICE_ADDRESS);

        dev.set_datetime(&dt).await.unwrap();
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_clock_halted() {
        let mock = setup_mock(&[I2cTrans::write_read(
            DEVICE_ADDRESS,
            vec![RegAddr::Seconds as u8],
            vec![0x80],
        )])
        .await;
        let mut dev = DS3231::new(mock, DEVICE_ADDRESS);

        assert!(dev.clock_halted().await.unwrap());
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_read_temperature() {
        // -25°C whole part with 0.75°C added on top
        let mock = setup_mock(&[I2cTrans::write_read(
            DEVICE_ADDRESS,
            vec![RegAddr::MSBTemp as u8],
            vec![0xE7, 0xC0],
        )])
        .await;
        let mut dev = DS3231::new(mock, DEVICE_ADDRESS);

        assert_eq!(dev.temperature_f32().await.unwrap(), -24.25);
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_temperature_out_of_range() {
        let mock = setup_mock(&[I2cTrans::write_read(
            DEVICE_ADDRESS,
            vec![RegAddr::MSBTemp as u8],
            vec![0x60, 0x40],
        )])
        .await;
        let mut dev = DS3231::new(mock, DEVICE_ADDRESS);

        assert!(matches!(
            dev.temperature_f32().await,
            Err(DS3231Error::TemperatureOutOfRange)
        ));
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_register_operations() {
        let mock = setup_mock(&[
            // Test second register
            I2cTrans::write_read(DEVICE_ADDRESS, vec![RegAddr::Seconds as u8], vec![0x45]),
            I2cTrans::write(DEVICE_ADDRESS, vec![RegAddr::Seconds as u8, 0x30]),
            // Test minute register
            I2cTrans::write_read(DEVICE_ADDRESS, vec![RegAddr::Minutes as u8], vec![0x30]),
            I2cTrans::write(DEVICE_ADDRESS, vec![RegAddr::Minutes as u8, 0x45]),
        ])
        .await;

        let mut dev = DS3231::new(mock, DEVICE_ADDRESS);

        // Test seconds
        let seconds = dev.second().await.unwrap();
        assert_eq!(seconds.seconds(), 5);
        assert_eq!(seconds.ten_seconds(), 4);
        dev.set_second(Seconds(0x30)).await.unwrap();

        // Test minutes
        let minutes = dev.minute().await.unwrap();
        assert_eq!(minutes.minutes(), 0);
        assert_eq!(minutes.ten_minutes(), 3);
        dev.set_minute(Minutes(0x45)).await.unwrap();

        dev.i2c.done();
    }
}
