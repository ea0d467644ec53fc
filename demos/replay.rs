//! Replay a canned NMEA stream through the driver on the host.
//!
//! Run with `cargo run --example replay`.

use std::collections::VecDeque;
use std::convert::Infallible;

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::serial;
use nmea_core::messages::GpsMessage;
use nmea_core::{new_serial_driver, GpsConfig, SpeedUnit};

const STREAM: &[&str] = &[
    "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A",
    "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47",
    "$GPGSA,A,3,04,05,,09,12,,,24,,,,,2.5,1.3,2.1*39",
    "$GPGSV,2,1,08,01,40,083,46,02,17,308,41,12,07,344,39,14,22,228,45*75",
    "$GPGLL,4807.038,N,01131.000,E,123519,A*25",
    "$GPVTG,084.4,T,077.8,M,022.4,N,041.5,K*4A",
];

/// Hands out one sentence per drain, like a slow receiver.
struct ReplayUart {
    lines: VecDeque<VecDeque<u8>>,
}

impl serial::Read<u8> for ReplayUart {
    type Error = Infallible;

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        match self.lines.front_mut() {
            None => Err(nb::Error::WouldBlock),
            Some(line) => match line.pop_front() {
                Some(byte) => Ok(byte),
                None => {
                    self.lines.pop_front();
                    Err(nb::Error::WouldBlock)
                }
            },
        }
    }
}

struct HostDelay;

impl DelayMs<u8> for HostDelay {
    fn delay_ms(&mut self, ms: u8) {
        std::thread::sleep(std::time::Duration::from_millis(ms.into()));
    }
}

fn main() {
    let uart = ReplayUart {
        lines: STREAM
            .iter()
            .map(|s| s.bytes().chain("\r\n".bytes()).collect())
            .collect(),
    };
    let mut delay = HostDelay;
    let mut gps = new_serial_driver(uart, GpsConfig::default());

    gps.update(&mut delay);

    println!("segments complete: {}", gps.is_valid());
    println!("coords valid:      {}", gps.coords_valid());
    println!("latitude:          {:?}", gps.latitude());
    println!("longitude:         {:?}", gps.longitude());
    println!("altitude:          {} m", gps.altitude());
    println!(
        "speed:             {:.1} km/h heading {}",
        gps.speed(SpeedUnit::Kph),
        gps.direction()
    );
    println!("utc:               {}", gps.timestamp_utc());

    let report = GpsMessage {
        sensor_id: Some("gps"),
        latitude: Some(gps.latitude().to_decimal()),
        longitude: Some(gps.longitude().to_decimal()),
        speed: Some(gps.speed(SpeedUnit::Kph)),
        course: Some(gps.course()),
        direction: Some(gps.direction()),
        altitude: Some(gps.altitude()),
    };
    println!("uplink json:       {}", report.to_json().unwrap());
    println!("uplink lora:       {}", report.lora());
}
