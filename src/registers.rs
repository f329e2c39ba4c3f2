//! Register definitions and bitfield structures for the DS3231 RTC.
//!
//! This module contains all register addresses, bitfield definitions, and
//! related types for interacting with the DS3231 time-keeping registers.
//! Time and date values are BCD encoded: each register splits into a units
//! nibble and a tens field, accessed through explicit bit ranges rather than
//! any structure-layout overlay.

use bitfield::bitfield;

/// Register addresses for the DS3231 RTC.
#[allow(unused)]
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegAddr {
    /// Seconds register (0-59), bit 7 is the clock-halt flag
    Seconds = 0x00,
    /// Minutes register (0-59)
    Minutes = 0x01,
    /// Hours register (0-23, 24-hour mode)
    Hours = 0x02,
    /// Day of week register (1-7)
    Day = 0x03,
    /// Date register (1-31)
    Date = 0x04,
    /// Month register (1-12)
    Month = 0x05,
    /// Year register (0-99)
    Year = 0x06,
    /// Control register (square wave output)
    Control = 0x07,
    /// Temperature MSB register (signed whole degrees)
    MSBTemp = 0x11,
    /// Temperature LSB register (quarter degrees in the top 2 bits)
    LSBTemp = 0x12,
}

/// Square wave output frequency options (rate-select bits).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SquareWaveFrequency {
    /// 1 Hz square wave output
    Hz1 = 0b00,
    /// 4.096 kHz square wave output
    Hz4096 = 0b01,
    /// 8.192 kHz square wave output
    Hz8192 = 0b10,
    /// 32.768 kHz square wave output
    Hz32768 = 0b11,
}
impl From<u8> for SquareWaveFrequency {
    /// Creates a `SquareWaveFrequency` from a raw register value.
    ///
    /// # Panics
    /// Panics if the value is not 0b00, 0b01, 0b10, or 0b11.
    fn from(v: u8) -> Self {
        match v {
            0b00 => SquareWaveFrequency::Hz1,
            0b01 => SquareWaveFrequency::Hz4096,
            0b10 => SquareWaveFrequency::Hz8192,
            0b11 => SquareWaveFrequency::Hz32768,
            _ => panic!("Invalid value for SquareWaveFrequency: {}", v),
        }
    }
}
impl From<SquareWaveFrequency> for u8 {
    /// Converts a `SquareWaveFrequency` to its raw register value.
    fn from(v: SquareWaveFrequency) -> Self {
        v as u8
    }
}

/// Level driven on the output pin while the square wave is disabled.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputLevel {
    /// Output pin is driven low
    Low = 0,
    /// Output pin is driven high
    High = 1,
}
impl From<u8> for OutputLevel {
    /// Creates an `OutputLevel` from a raw register value.
    ///
    /// # Panics
    /// Panics if the value is not 0 or 1.
    fn from(v: u8) -> Self {
        match v {
            0 => OutputLevel::Low,
            1 => OutputLevel::High,
            _ => panic!("Invalid value for OutputLevel: {}", v),
        }
    }
}
impl From<OutputLevel> for u8 {
    /// Converts an `OutputLevel` to its raw register value.
    fn from(v: OutputLevel) -> Self {
        v as u8
    }
}

// This macro generates the From<u8> and Into<u8> implementations for the
// register type
macro_rules! from_register_u8 {
    ($typ:ty) => {
        impl From<u8> for $typ {
            fn from(v: u8) -> Self {
                paste::paste!([< $typ >](v))
            }
        }
        impl From<$typ> for u8 {
            fn from(v: $typ) -> Self {
                v.0
            }
        }
    };
}

bitfield! {
    /// Seconds register (0-59) with BCD encoding and the clock-halt flag.
    ///
    /// When the clock-halt bit is set the oscillator is stopped and the time
    /// registers are frozen.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Seconds(u8);
    impl Debug;
    /// Clock-halt flag (1 = oscillator stopped)
    pub clock_halt, set_clock_halt: 7;
    /// Tens place of seconds (0-5)
    pub ten_seconds, set_ten_seconds: 6, 4;
    /// Ones place of seconds (0-9)
    pub seconds, set_seconds: 3, 0;
}
from_register_u8!(Seconds);

#[cfg(feature = "defmt")]
impl defmt::Format for Seconds {
    fn format(&self, f: defmt::Formatter) {
        let seconds = 10 * self.ten_seconds() + self.seconds();
        if self.clock_halt() {
            defmt::write!(f, "Seconds({}s, halted)", seconds);
        } else {
            defmt::write!(f, "Seconds({}s)", seconds);
        }
    }
}

bitfield! {
    /// Minutes register (0-59) with BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Minutes(u8);
    impl Debug;
    /// Tens place of minutes (0-5)
    pub ten_minutes, set_ten_minutes: 6, 4;
    /// Ones place of minutes (0-9)
    pub minutes, set_minutes: 3, 0;
}
from_register_u8!(Minutes);

#[cfg(feature = "defmt")]
impl defmt::Format for Minutes {
    fn format(&self, f: defmt::Formatter) {
        let minutes = 10 * self.ten_minutes() + self.minutes();
        defmt::write!(f, "Minutes({}m)", minutes);
    }
}

bitfield! {
    /// Hours register (0-23) with BCD encoding, 24-hour mode.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Hours(u8);
    impl Debug;
    /// Tens place of hours (0-2)
    pub ten_hours, set_ten_hours: 5, 4;
    /// Ones place of hours (0-9)
    pub hours, set_hours: 3, 0;
}
from_register_u8!(Hours);

#[cfg(feature = "defmt")]
impl defmt::Format for Hours {
    fn format(&self, f: defmt::Formatter) {
        let hours = 10 * self.ten_hours() + self.hours();
        defmt::write!(f, "Hours({}h)", hours);
    }
}

bitfield! {
    /// Day of week register (1-7).
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Day(u8);
    impl Debug;
    /// Day of week (1-7, 1 = Sunday)
    pub day, set_day: 2, 0;
}
from_register_u8!(Day);

#[cfg(feature = "defmt")]
impl defmt::Format for Day {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Day({})", self.day());
    }
}

bitfield! {
    /// Date register (1-31) with BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Date(u8);
    impl Debug;
    /// Tens place of date (0-3)
    pub ten_date, set_ten_date: 5, 4;
    /// Ones place of date (0-9)
    pub date, set_date: 3, 0;
}
from_register_u8!(Date);

#[cfg(feature = "defmt")]
impl defmt::Format for Date {
    fn format(&self, f: defmt::Formatter) {
        let date = 10 * self.ten_date() + self.date();
        defmt::write!(f, "Date({})", date);
    }
}

bitfield! {
    /// Month register (1-12) with BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Month(u8);
    impl Debug;
    /// Tens place of month (0-1)
    pub ten_month, set_ten_month: 4, 4;
    /// Ones place of month (0-9)
    pub month, set_month: 3, 0;
}
from_register_u8!(Month);

#[cfg(feature = "defmt")]
impl defmt::Format for Month {
    fn format(&self, f: defmt::Formatter) {
        let month = 10 * self.ten_month() + self.month();
        defmt::write!(f, "Month({})", month);
    }
}

bitfield! {
    /// Year register (0-99) with BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Year(u8);
    impl Debug;
    /// Tens place of year (0-9)
    pub ten_year, set_ten_year: 7, 4;
    /// Ones place of year (0-9)
    pub year, set_year: 3, 0;
}
from_register_u8!(Year);

#[cfg(feature = "defmt")]
impl defmt::Format for Year {
    fn format(&self, f: defmt::Formatter) {
        let year = 10 * self.ten_year() + self.year();
        defmt::write!(f, "Year({})", year);
    }
}

bitfield! {
    /// Control register for the square wave output.
    ///
    /// Bits outside the three documented fields are reserved and must be
    /// carried over unchanged on write-back.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Control(u8);
    impl Debug;
    /// Output pin level while the square wave is disabled
    pub from into OutputLevel, output_control, set_output_control: 7, 7;
    /// Enable square wave output
    pub square_wave_enable, set_square_wave_enable: 4;
    /// Square wave output frequency selection
    pub from into SquareWaveFrequency, rate_select, set_rate_select: 1, 0;
}
from_register_u8!(Control);

#[cfg(feature = "defmt")]
impl defmt::Format for Control {
    fn format(&self, f: defmt::Formatter) {
        match self.output_control() {
            OutputLevel::Low => defmt::write!(f, "Control(OUT low"),
            OutputLevel::High => defmt::write!(f, "Control(OUT high"),
        }
        if self.square_wave_enable() {
            defmt::write!(f, ", square wave enabled");
        }
        match self.rate_select() {
            SquareWaveFrequency::Hz1 => defmt::write!(f, ", 1 Hz)"),
            SquareWaveFrequency::Hz4096 => defmt::write!(f, ", 4096 Hz)"),
            SquareWaveFrequency::Hz8192 => defmt::write!(f, ", 8192 Hz)"),
            SquareWaveFrequency::Hz32768 => defmt::write!(f, ", 32768 Hz)"),
        }
    }
}

bitfield! {
    /// Temperature register (signed whole degrees Celsius).
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Temperature(u8);
    impl Debug;
    /// Temperature value (-128 to +127)
    pub i8, degrees, set_degrees: 7, 0;
}
from_register_u8!(Temperature);

#[cfg(feature = "defmt")]
impl defmt::Format for Temperature {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Temperature({}°C)", self.degrees());
    }
}

bitfield! {
    /// Temperature fraction register (quarter degrees in the top 2 bits).
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct TemperatureFraction(u8);
    impl Debug;
    /// Quarter-degree count (0-3, each unit is 0.25°C)
    pub quarter_degrees, set_quarter_degrees: 7, 6;
}
from_register_u8!(TemperatureFraction);

#[cfg(feature = "defmt")]
impl defmt::Format for TemperatureFraction {
    fn format(&self, f: defmt::Formatter) {
        match self.quarter_degrees() {
            0 => defmt::write!(f, "TemperatureFraction(0.00°C)"),
            1 => defmt::write!(f, "TemperatureFraction(0.25°C)"),
            2 => defmt::write!(f, "TemperatureFraction(0.50°C)"),
            _ => defmt::write!(f, "TemperatureFraction(0.75°C)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_wave_frequency_conversions() {
        assert_eq!(SquareWaveFrequency::from(0b00), SquareWaveFrequency::Hz1);
        assert_eq!(SquareWaveFrequency::from(0b01), SquareWaveFrequency::Hz4096);
        assert_eq!(SquareWaveFrequency::from(0b10), SquareWaveFrequency::Hz8192);
        assert_eq!(
            SquareWaveFrequency::from(0b11),
            SquareWaveFrequency::Hz32768
        );
        assert_eq!(u8::from(SquareWaveFrequency::Hz1), 0b00);
        assert_eq!(u8::from(SquareWaveFrequency::Hz32768), 0b11);
    }

    #[test]
    #[should_panic(expected = "Invalid value for SquareWaveFrequency: 4")]
    fn test_invalid_square_wave_frequency_conversion() {
        let _ = SquareWaveFrequency::from(4);
    }

    #[test]
    fn test_output_level_conversions() {
        assert_eq!(OutputLevel::from(0), OutputLevel::Low);
        assert_eq!(OutputLevel::from(1), OutputLevel::High);
        assert_eq!(u8::from(OutputLevel::Low), 0);
        assert_eq!(u8::from(OutputLevel::High), 1);
    }

    #[test]
    fn test_seconds_register_conversions() {
        // Test valid BCD values
        let seconds = Seconds::from(0x59); // 59 seconds
        assert_eq!(seconds.ten_seconds(), 5);
        assert_eq!(seconds.seconds(), 9);
        assert!(!seconds.clock_halt());
        assert_eq!(u8::from(seconds), 0x59);

        let seconds = Seconds::from(0x00); // 0 seconds
        assert_eq!(seconds.ten_seconds(), 0);
        assert_eq!(seconds.seconds(), 0);
        assert_eq!(u8::from(seconds), 0x00);

        let seconds = Seconds::from(0x30); // 30 seconds
        assert_eq!(seconds.ten_seconds(), 3);
        assert_eq!(seconds.seconds(), 0);
        assert_eq!(u8::from(seconds), 0x30);
    }

    #[test]
    fn test_seconds_clock_halt_flag() {
        // Bit 7 carries the halt flag on top of the BCD seconds
        let seconds = Seconds::from(0xB2); // halt set, 32 seconds
        assert!(seconds.clock_halt());
        assert_eq!(seconds.ten_seconds(), 3);
        assert_eq!(seconds.seconds(), 2);

        let mut seconds = Seconds::from(0x45);
        assert!(!seconds.clock_halt());
        seconds.set_clock_halt(true);
        assert_eq!(u8::from(seconds), 0xC5);
        seconds.set_clock_halt(false);
        assert_eq!(u8::from(seconds), 0x45);
    }

    #[test]
    fn test_minutes_register_conversions() {
        let minutes = Minutes::from(0x59); // 59 minutes
        assert_eq!(minutes.ten_minutes(), 5);
        assert_eq!(minutes.minutes(), 9);
        assert_eq!(u8::from(minutes), 0x59);

        let minutes = Minutes::from(0x45); // 45 minutes
        assert_eq!(minutes.ten_minutes(), 4);
        assert_eq!(minutes.minutes(), 5);
        assert_eq!(u8::from(minutes), 0x45);
    }

    #[test]
    fn test_hours_register_conversions() {
        let hours = Hours::from(0x23); // 23 hours
        assert_eq!(hours.ten_hours(), 2);
        assert_eq!(hours.hours(), 3);
        assert_eq!(u8::from(hours), 0x23);

        let hours = Hours::from(0x00); // midnight
        assert_eq!(hours.ten_hours(), 0);
        assert_eq!(hours.hours(), 0);

        let hours = Hours::from(0x15); // 15 hours
        assert_eq!(hours.ten_hours(), 1);
        assert_eq!(hours.hours(), 5);
    }

    #[test]
    fn test_day_register_conversions() {
        let day = Day::from(0x01); // Sunday
        assert_eq!(day.day(), 1);
        assert_eq!(u8::from(day), 0x01);

        let day = Day::from(0x07); // Saturday
        assert_eq!(day.day(), 7);
        assert_eq!(u8::from(day), 0x07);
    }

    #[test]
    fn test_date_register_conversions() {
        let date = Date::from(0x31); // 31st
        assert_eq!(date.ten_date(), 3);
        assert_eq!(date.date(), 1);
        assert_eq!(u8::from(date), 0x31);

        let date = Date::from(0x01); // 1st
        assert_eq!(date.ten_date(), 0);
        assert_eq!(date.date(), 1);
    }

    #[test]
    fn test_month_register_conversions() {
        let month = Month::from(0x12); // December
        assert_eq!(month.ten_month(), 1);
        assert_eq!(month.month(), 2);
        assert_eq!(u8::from(month), 0x12);

        let month = Month::from(0x09); // September
        assert_eq!(month.ten_month(), 0);
        assert_eq!(month.month(), 9);
    }

    #[test]
    fn test_year_register_conversions() {
        let year = Year::from(0x24); // 2024
        assert_eq!(year.ten_year(), 2);
        assert_eq!(year.year(), 4);
        assert_eq!(u8::from(year), 0x24);

        let year = Year::from(0x99); // 2099
        assert_eq!(year.ten_year(), 9);
        assert_eq!(year.year(), 9);
    }

    #[test]
    fn test_control_register_conversions() {
        let control = Control::from(0x00);
        assert_eq!(control.output_control(), OutputLevel::Low);
        assert!(!control.square_wave_enable());
        assert_eq!(control.rate_select(), SquareWaveFrequency::Hz1);

        let control = Control::from(0x93); // OUT high, SQWE, 32.768 kHz
        assert_eq!(control.output_control(), OutputLevel::High);
        assert!(control.square_wave_enable());
        assert_eq!(control.rate_select(), SquareWaveFrequency::Hz32768);

        let mut control = Control::default();
        control.set_output_control(OutputLevel::High);
        control.set_square_wave_enable(true);
        control.set_rate_select(SquareWaveFrequency::Hz4096);
        assert_eq!(u8::from(control), 0x91);
    }

    #[test]
    fn test_control_register_preserves_reserved_bits() {
        // Reserved bits (2, 3, 5, 6) pass through field updates untouched
        let mut control = Control::from(0b0110_1100);
        control.set_square_wave_enable(false);
        control.set_rate_select(SquareWaveFrequency::Hz1);
        assert_eq!(u8::from(control), 0b0110_1100);
    }

    #[test]
    fn test_temperature_register_conversions() {
        let temp = Temperature::from(0x19); // 25°C
        assert_eq!(temp.degrees(), 25);

        let temp = Temperature::from(0xE7); // -25°C as two's complement
        assert_eq!(temp.degrees(), -25);

        let temp = Temperature::from(0x00);
        assert_eq!(temp.degrees(), 0);
    }

    #[test]
    fn test_temperature_fraction_register_conversions() {
        let frac = TemperatureFraction::from(0x00);
        assert_eq!(frac.quarter_degrees(), 0);

        let frac = TemperatureFraction::from(0x40); // 0.25°C
        assert_eq!(frac.quarter_degrees(), 1);

        let frac = TemperatureFraction::from(0xC0); // 0.75°C
        assert_eq!(frac.quarter_degrees(), 3);

        // Low 6 bits are unused and do not contribute
        let frac = TemperatureFraction::from(0x3F);
        assert_eq!(frac.quarter_degrees(), 0);
    }
}
