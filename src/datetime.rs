//! `DateTime` conversion and register utilities for the DS3231 RTC.
//!
//! This module provides the internal representation and conversion logic for the DS3231's date and time registers.
//! It enables safe, validated conversion between the DS3231's BCD-encoded register block and chrono's `NaiveDateTime`.
//!
//! # Features
//!
//! - Conversion to/from chrono `NaiveDateTime`
//! - Error handling for invalid or out-of-range values
//!
//! # Register Model
//!
//! The DS3231 stores date and time in 8 consecutive registers, transferred as
//! one block:
//! - Seconds (with the clock-halt flag), Minutes, Hours, Day, Date, Month,
//!   Year, Control
//!
//! Times are interpreted as UTC; timezone handling is a host display concern.
//!
//! # Error Handling
//!
//! Conversion errors are reported via [`DS3231DateTimeError`].

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::{Control, Date, Day, Hours, Minutes, Month, Seconds, Year};

/// Internal representation of the DS3231 register block.
///
/// This struct models the 8 time-keeping registers of the DS3231, using strongly-typed bitfield wrappers for each field.
/// It is used for register-level I/O and conversion to/from chrono's `NaiveDateTime`.
///
/// A value is constructed fresh for every decode or encode and discarded
/// afterwards; nothing in here outlives one transfer.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) struct DS3231DateTime {
    seconds: Seconds,
    minutes: Minutes,
    hours: Hours,
    day: Day,
    date: Date,
    month: Month,
    year: Year,
    control: Control,
}

impl DS3231DateTime {
    /// Helper function to convert a number to BCD format with validation
    pub(crate) fn make_bcd(value: u32, max_value: u32) -> Result<(u8, u8), DS3231DateTimeError> {
        if value > max_value {
            return Err(DS3231DateTimeError::InvalidInput);
        }
        let ones = u8::try_from(value % 10).map_err(|_| DS3231DateTimeError::InvalidInput)?;
        let tens = u8::try_from(value / 10).map_err(|_| DS3231DateTimeError::InvalidInput)?;
        Ok((ones, tens))
    }

    fn convert_seconds(seconds: u32) -> Result<Seconds, DS3231DateTimeError> {
        let (ones, tens) = Self::make_bcd(seconds, 59)?;
        let mut value = Seconds::default();
        value.set_seconds(ones);
        value.set_ten_seconds(tens);
        // Writing the block always restarts the oscillator
        value.set_clock_halt(false);
        Ok(value)
    }

    fn convert_minutes(minutes: u32) -> Result<Minutes, DS3231DateTimeError> {
        let (ones, tens) = Self::make_bcd(minutes, 59)?;
        let mut value = Minutes::default();
        value.set_minutes(ones);
        value.set_ten_minutes(tens);
        Ok(value)
    }

    fn convert_hours(hours: u32) -> Result<Hours, DS3231DateTimeError> {
        let (ones, tens) = Self::make_bcd(hours, 23)?;
        let mut value = Hours::default();
        value.set_hours(ones);
        value.set_ten_hours(tens);
        Ok(value)
    }

    fn convert_day(weekday: u32) -> Result<Day, DS3231DateTimeError> {
        if !(1..=7).contains(&weekday) {
            return Err(DS3231DateTimeError::InvalidInput);
        }
        let mut value = Day::default();
        value.set_day(u8::try_from(weekday).map_err(|_| DS3231DateTimeError::InvalidInput)?);
        Ok(value)
    }

    pub(crate) fn convert_date(date: u32) -> Result<Date, DS3231DateTimeError> {
        let (ones, tens) = Self::make_bcd(date, 31)?;
        let mut value = Date::default();
        value.set_date(ones);
        value.set_ten_date(tens);
        Ok(value)
    }

    pub(crate) fn convert_month(month: u32) -> Result<Month, DS3231DateTimeError> {
        let (ones, tens) = Self::make_bcd(month, 12)?;
        let mut value = Month::default();
        value.set_month(ones);
        value.set_ten_month(tens);
        Ok(value)
    }

    /// Converts a full year to the two-digit register value.
    ///
    /// Only 2000-2099 is representable; years outside the window wrap
    /// modulo 100 (2105 encodes the same as 2005). Documented precision
    /// loss, not an error.
    fn convert_year(year: i32) -> Year {
        let year_offset = (year - 2000).rem_euclid(100) as u8;
        let ones = year_offset % 10;
        let tens = year_offset / 10;
        let mut value = Year::default();
        value.set_year(ones);
        value.set_ten_year(tens);
        value
    }

    pub(crate) fn from_datetime(
        datetime: &NaiveDateTime,
        control: Control,
    ) -> Result<Self, DS3231DateTimeError> {
        let seconds = Self::convert_seconds(datetime.second())?;
        let minutes = Self::convert_minutes(datetime.minute())?;
        let hours = Self::convert_hours(datetime.hour())?;
        let day = Self::convert_day(datetime.weekday().number_from_sunday())?;
        let date = Self::convert_date(datetime.day())?;
        let month = Self::convert_month(datetime.month())?;
        let year = Self::convert_year(datetime.year());

        let raw = DS3231DateTime {
            seconds,
            minutes,
            hours,
            day,
            date,
            month,
            year,
            control,
        };

        debug!("raw={:?}", raw);

        Ok(raw)
    }

    /// Decodes the block into a calendar date and time.
    ///
    /// Each BCD field is reconstructed arithmetically without clamping;
    /// out-of-range register contents surface as an invalid calendar value.
    /// The clock-halt flag does not prevent decoding, see
    /// [`clock_halted`](Self::clock_halted).
    pub(crate) fn into_datetime(self) -> Result<NaiveDateTime, DS3231DateTimeError> {
        let seconds = 10 * u32::from(self.seconds.ten_seconds()) + u32::from(self.seconds.seconds());
        let minutes = 10 * u32::from(self.minutes.ten_minutes()) + u32::from(self.minutes.minutes());
        let hours = 10 * u32::from(self.hours.ten_hours()) + u32::from(self.hours.hours());
        let year = 2000 + i32::from(10 * self.year.ten_year() + self.year.year());
        let month = 10 * u32::from(self.month.ten_month()) + u32::from(self.month.month());
        let date = 10 * u32::from(self.date.ten_date()) + u32::from(self.date.date());

        debug!(
            "raw_hour={:?} h={} m={} s={}",
            self.hours, hours, minutes, seconds
        );

        // Validate the date components before creating NaiveDateTime
        NaiveDate::from_ymd_opt(year, month, date)
            .and_then(|d| d.and_hms_opt(hours, minutes, seconds))
            .ok_or(DS3231DateTimeError::InvalidDateTime)
    }

    /// Returns true when the oscillator is stopped and the time registers are
    /// frozen. Consumers must not synchronize a host clock from a halted
    /// block.
    pub(crate) fn clock_halted(&self) -> bool {
        self.seconds.clock_halt()
    }

    /// The control register read along with the time block.
    pub(crate) fn control(&self) -> Control {
        self.control
    }
}

impl From<[u8; 8]> for DS3231DateTime {
    fn from(data: [u8; 8]) -> Self {
        DS3231DateTime {
            seconds: Seconds(data[0]),
            minutes: Minutes(data[1]),
            hours: Hours(data[2]),
            day: Day(data[3]),
            date: Date(data[4]),
            month: Month(data[5]),
            year: Year(data[6]),
            control: Control(data[7]),
        }
    }
}

impl From<&DS3231DateTime> for [u8; 8] {
    fn from(dt: &DS3231DateTime) -> [u8; 8] {
        [
            dt.seconds.0,
            dt.minutes.0,
            dt.hours.0,
            dt.day.0,
            dt.date.0,
            dt.month.0,
            dt.year.0,
            dt.control.0,
        ]
    }
}

/// Errors that can occur during DS3231 date/time conversion or validation.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DS3231DateTimeError {
    /// The decoded register contents do not form a valid date/time
    InvalidDateTime,
    /// A time component passed to the encoder is outside the encodable range
    InvalidInput,
}
