//! Host integration layer for the DS3231 RTC.
//!
//! This module adapts the register-level driver to a host component
//! lifecycle: a one-time [`setup`](DS3231Component::setup) that validates
//! communication, a periodic [`update`](DS3231Component::update) that
//! synchronizes the host clock (and optionally publishes the die
//! temperature), and an on-demand [`write_time`](DS3231Component::write_time)
//! that pushes the host time back into the RTC.
//!
//! The host provides its side of the contract through two traits:
//! [`SystemClock`] (epoch synchronization and the time source for
//! write-back) and [`TemperatureSink`] (an optional temperature consumer).
//! Scheduling of the periodic tick stays with the host; the component never
//! retries a failed transfer on its own.
//!
//! # State machine
//!
//! `Uninitialized -> Ready` on successful setup, or
//! `Uninitialized -> Failed` when the initial register read fails. `Failed`
//! is terminal: every subsequent operation returns
//! [`ComponentError::NotReady`] without touching the bus.

use chrono::NaiveDateTime;
use embedded_hal::i2c::I2c;

use crate::{DS3231Error, DS3231};

/// Host clock interface consumed by the component.
pub trait SystemClock {
    /// Pushes a freshly read RTC time into the host clock as seconds since
    /// the Unix epoch (UTC). One-way notification; the component does not
    /// inspect a result.
    fn synchronize_epoch(&mut self, timestamp: i64);

    /// Returns the current host time (UTC), used when writing the host
    /// clock back to the RTC.
    fn utc_now(&mut self) -> NaiveDateTime;
}

/// Consumer for temperature readings taken alongside the time update.
pub trait TemperatureSink {
    /// Called with an in-range temperature in degrees Celsius.
    fn publish(&mut self, celsius: f32);
}

/// Placeholder sink for components without a temperature consumer.
pub struct NoSink;

impl TemperatureSink for NoSink {
    fn publish(&mut self, _celsius: f32) {}
}

/// Lifecycle state of the component.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ComponentState {
    /// `setup` has not been called yet
    Uninitialized,
    /// Communication is established and periodic updates may run
    Ready,
    /// The initial register read failed; terminal, all I/O is refused
    Failed,
}

/// Errors returned by the component layer.
#[derive(Debug)]
pub enum ComponentError<I2CE> {
    /// The component is not in the `Ready` state; no I/O was attempted
    NotReady,
    /// Underlying driver error
    Rtc(DS3231Error<I2CE>),
}

impl<I2CE> From<DS3231Error<I2CE>> for ComponentError<I2CE> {
    fn from(e: DS3231Error<I2CE>) -> Self {
        ComponentError::Rtc(e)
    }
}

/// Outcome of one periodic update pass.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Update {
    /// Epoch timestamp pushed to the host clock, if the RTC time was valid
    /// and the oscillator running
    pub synchronized: Option<i64>,
    /// Clock-halt flag as read this cycle; while set, synchronization is
    /// suppressed
    pub halted: bool,
    /// Temperature published this cycle, if a sink is attached and the
    /// reading was in range
    pub temperature: Option<f32>,
}

/// Named zero-argument operations for host automation hooks.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    /// Read the RTC and synchronize the host clock
    ReadTime,
    /// Write the current host time to the RTC
    WriteTime,
}

/// DS3231 host component.
///
/// Owns the driver, the host clock interface and an optional temperature
/// sink, and enforces the `Uninitialized -> Ready / Failed` lifecycle.
pub struct DS3231Component<I2C: I2c, CLK, SINK = NoSink> {
    rtc: DS3231<I2C>,
    clock: CLK,
    temperature_sink: Option<SINK>,
    state: ComponentState,
}

impl<I2C: I2c, CLK: SystemClock> DS3231Component<I2C, CLK> {
    /// Creates a component without a temperature sink.
    pub fn new(rtc: DS3231<I2C>, clock: CLK) -> Self {
        Self {
            rtc,
            clock,
            temperature_sink: None,
            state: ComponentState::Uninitialized,
        }
    }
}

impl<I2C: I2c, CLK: SystemClock, SINK: TemperatureSink> DS3231Component<I2C, CLK, SINK> {
    /// Attaches a temperature sink; the temperature registers are only read
    /// when a sink is present.
    pub fn with_temperature_sink<S: TemperatureSink>(
        self,
        sink: S,
    ) -> DS3231Component<I2C, CLK, S> {
        DS3231Component {
            rtc: self.rtc,
            clock: self.clock,
            temperature_sink: Some(sink),
            state: self.state,
        }
    }

    /// Validates communication with the device by reading the register
    /// block once.
    ///
    /// A failure here marks the component `Failed`; the state is terminal
    /// and all further operations are refused.
    pub fn setup(&mut self) -> Result<(), ComponentError<I2C::Error>> {
        info!("setting up DS3231");
        match self.rtc.read_raw_datetime() {
            Ok(_) => {
                self.state = ComponentState::Ready;
                Ok(())
            }
            Err(e) => {
                error!("communication with DS3231 failed");
                self.state = ComponentState::Failed;
                Err(ComponentError::Rtc(e))
            }
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ComponentState {
        self.state
    }

    /// True once the component has permanently given up on the device.
    pub fn is_failed(&self) -> bool {
        self.state == ComponentState::Failed
    }

    fn ensure_ready(&self) -> Result<(), ComponentError<I2C::Error>> {
        match self.state {
            ComponentState::Ready => Ok(()),
            _ => Err(ComponentError::NotReady),
        }
    }

    /// Periodic tick: reads the RTC, synchronizes the host clock when the
    /// time is valid and the oscillator running, then reads and publishes
    /// the temperature if a sink is attached.
    ///
    /// # Errors
    /// * [`ComponentError::NotReady`] before setup or after failure
    /// * [`ComponentError::Rtc`] if the time read fails or decodes to an
    ///   invalid date/time
    ///
    /// Temperature problems are not errors: the clock synchronization has
    /// already happened, so they are logged and reported as
    /// `temperature: None`.
    pub fn update(&mut self) -> Result<Update, ComponentError<I2C::Error>> {
        self.ensure_ready()?;
        let raw = self.rtc.read_raw_datetime().map_err(ComponentError::Rtc)?;
        if raw.clock_halted() {
            warn!("RTC halted, not syncing to system clock");
            return Ok(Update {
                synchronized: None,
                halted: true,
                temperature: None,
            });
        }
        let datetime = match raw.into_datetime() {
            Ok(datetime) => datetime,
            Err(e) => {
                error!("invalid RTC time, not syncing to system clock");
                return Err(ComponentError::Rtc(DS3231Error::DateTime(e)));
            }
        };
        let timestamp = datetime.and_utc().timestamp();
        self.clock.synchronize_epoch(timestamp);
        debug!("synchronized host clock to {}", timestamp);

        let temperature = self.read_temperature();
        Ok(Update {
            synchronized: Some(timestamp),
            halted: false,
            temperature,
        })
    }

    fn read_temperature(&mut self) -> Option<f32> {
        let sink = self.temperature_sink.as_mut()?;
        match self.rtc.temperature_f32() {
            Ok(celsius) => {
                sink.publish(celsius);
                debug!("temperature: {:?}", celsius);
                Some(celsius)
            }
            Err(DS3231Error::TemperatureOutOfRange) => None,
            Err(_) => {
                warn!("failed to read temperature from DS3231");
                None
            }
        }
    }

    /// Writes the current host time to the RTC, restarting a halted
    /// oscillator.
    pub fn write_time(&mut self) -> Result<(), ComponentError<I2C::Error>> {
        self.ensure_ready()?;
        let now = self.clock.utc_now();
        self.set_time(&now)
    }

    /// Writes a specific time to the RTC.
    pub fn set_time(&mut self, datetime: &NaiveDateTime) -> Result<(), ComponentError<I2C::Error>> {
        self.ensure_ready()?;
        debug!("writing time to RTC, epoch {}", datetime.and_utc().timestamp());
        self.rtc.set_datetime(datetime).map_err(ComponentError::Rtc)
    }

    /// Runs a named operation. The automation surface of the host maps to
    /// these two zero-argument commands.
    pub fn perform(&mut self, action: Action) -> Result<(), ComponentError<I2C::Error>> {
        match action {
            Action::ReadTime => self.update().map(|_| ()),
            Action::WriteTime => self.write_time(),
        }
    }

    /// Logs the component configuration and state.
    pub fn dump_config(&self) {
        info!("DS3231:");
        info!("  address: 0x{:x}", self.rtc.address());
        if self.is_failed() {
            error!("  communication with DS3231 failed!");
        }
    }

    /// Tears the component apart, returning the driver, the host clock and
    /// the temperature sink.
    pub fn release(self) -> (DS3231<I2C>, CLK, Option<SINK>) {
        (self.rtc, self.clock, self.temperature_sink)
    }
}
