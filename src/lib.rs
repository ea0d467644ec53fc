/*
Copyright (c) 2018 InnovateNow
LICENSE: MIT (see LICENSE file)
*/

#![no_std]

use embedded_hal as hal;

#[cfg(test)]
extern crate std;

mod interface;
pub use interface::{DeviceInterface, I2cInterface, SerialInterface};

mod reader;
pub use reader::{SegmentRegistry, SentenceReader, SUPPORTED_SEGMENTS};

mod parser;
pub use parser::{
    CoordFormat, Coordinate, NmeaChecksum, NmeaParser, SentenceKind, SpeedUnit,
};

pub mod messages;

use hal::blocking::delay::DelayMs;
use heapless::String;

/// Errors in this crate
#[derive(Debug)]
pub enum Error<CommE> {
    /// Transport communication error
    Comm(CommE),
}

/// Acquisition settings for one driver instance.
#[derive(Debug, Clone)]
pub struct GpsConfig {
    /// Sentence reader time budget per update cycle, in seconds
    pub timeout_secs: u16,
    /// Segment codes that must all be seen for a session to count as complete
    pub required_segments: &'static [&'static str],
    /// Output format of the latitude/longitude accessors
    pub coord_format: CoordFormat,
}

impl Default for GpsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            required_segments: &SUPPORTED_SEGMENTS,
            coord_format: CoordFormat::DecimalDegrees,
        }
    }
}

pub fn new_serial_driver<UART, CommE>(
    uart: UART,
    config: GpsConfig,
) -> GpsDriver<SerialInterface<UART>>
where
    UART: hal::serial::Read<u8, Error = CommE>,
    CommE: core::fmt::Debug,
{
    let iface = interface::SerialInterface::new(uart);
    GpsDriver::new_with_interface(iface, config)
}

pub fn new_i2c_driver<I2C, CommE>(
    i2c: I2C,
    config: GpsConfig,
) -> GpsDriver<I2cInterface<I2C>>
where
    I2C: hal::blocking::i2c::Read<Error = CommE>
        + hal::blocking::i2c::Write<Error = CommE>,
    CommE: core::fmt::Debug,
{
    let iface = interface::I2cInterface::new(i2c);
    GpsDriver::new_with_interface(iface, config)
}

/// GPS receiver driver holding the cumulative navigation fix.
///
/// One `update()` call runs one acquisition cycle: a fresh reader session
/// collects sentence data from the transport, and the collected buffer is
/// streamed through the incremental decoder. Fix fields carry over between
/// cycles; the validity flags are recomputed every cycle.
pub struct GpsDriver<DI> {
    /// the device interface
    di: DI,
    config: GpsConfig,
    /// cumulative decoder state, persists across cycles
    parser: NmeaParser,
    is_running: bool,
    coords_valid: bool,
    segments_complete: bool,
}

impl<DI, CommE> GpsDriver<DI>
where
    DI: DeviceInterface<InterfaceError = Error<CommE>>,
    CommE: core::fmt::Debug,
{
    pub(crate) fn new_with_interface(device_interface: DI, config: GpsConfig) -> Self {
        let parser = NmeaParser::new(config.coord_format);
        Self {
            di: device_interface,
            config,
            parser,
            is_running: false,
            coords_valid: false,
            segments_complete: false,
        }
    }

    /// Run one acquisition cycle, blocking up to the configured timeout.
    ///
    /// Never fails: transport trouble, malformed sentences and timeouts all
    /// degrade to stale-or-empty fix data with the flags telling the story.
    pub fn update(&mut self, delay_source: &mut impl DelayMs<u8>) {
        log::info!("start reading the GPS values");
        self.is_running = true;

        let mut session = SentenceReader::new();
        session.start(
            &mut self.di,
            delay_source,
            self.config.timeout_secs,
            self.config.required_segments,
        );

        self.segments_complete =
            session.registry().covers(self.config.required_segments);
        for byte in session.data().bytes() {
            self.parser.feed(byte);
        }
        self.coords_valid = self.parser.has_position();
        if self.coords_valid {
            log::debug!("found coordinates");
        }

        self.is_running = false;
    }

    /// Latitude in the configured output format.
    pub fn latitude(&self) -> Coordinate {
        self.parser.latitude()
    }

    /// Longitude in the configured output format.
    pub fn longitude(&self) -> Coordinate {
        self.parser.longitude()
    }

    /// Antenna altitude above mean sea level, meters.
    pub fn altitude(&self) -> f32 {
        self.parser.altitude()
    }

    /// Speed over ground in the requested unit.
    pub fn speed(&self, unit: SpeedUnit) -> f32 {
        self.parser.speed(unit)
    }

    /// Course over ground, degrees true.
    pub fn course(&self) -> f32 {
        self.parser.course()
    }

    /// 16-point compass direction derived from the course.
    pub fn direction(&self) -> &'static str {
        self.parser.direction()
    }

    /// Last decoded UTC moment as `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn timestamp_utc(&self) -> String<20> {
        self.parser.timestamp_utc()
    }

    pub fn satellites_in_use(&self) -> u8 {
        self.parser.satellites_in_use()
    }

    pub fn satellites_in_view(&self) -> u8 {
        self.parser.satellites_in_view()
    }

    pub fn hdop(&self) -> f32 {
        self.parser.hdop()
    }

    /// True while an `update()` cycle is in progress.
    pub fn is_running(&self) -> bool {
        self.is_running
    }

    /// True when the last cycle left a non-zero coordinate pair.
    pub fn coords_valid(&self) -> bool {
        self.coords_valid
    }

    /// True when the last session saw every required segment code.
    pub fn is_valid(&self) -> bool {
        self.segments_complete
    }
}
