//! Uplink message payloads for the tracker backhaul.
//!
//! Every message renders to JSON for the broker path; the sensor messages
//! additionally render to the compact pipe-delimited form used on the LoRa
//! uplink, where every byte is airtime. Unset fields stay out of the JSON.

use core::fmt::Write;

use heapless::{String, Vec};
use serde::Serialize;

/// Round to a fixed number of decimals; `scale` is 10^decimals.
fn round_to(value: f32, scale: f32) -> f32 {
    let scaled = value * scale;
    let nudged = if scaled >= 0.0 {
        scaled + 0.5
    } else {
        scaled - 0.5
    };
    (nudged as i32) as f32 / scale
}

/// Position report from the GPS driver.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsMessage<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f32>,
}

impl<'a> GpsMessage<'a> {
    pub fn to_json(&self) -> Result<String<256>, serde_json_core::ser::Error> {
        serde_json_core::to_string(self)
    }

    /// `latitude|longitude|speed` for the LoRa uplink.
    pub fn lora(&self) -> String<48> {
        let mut out = String::new();
        let _ = write!(
            out,
            "{}|{}|{}",
            self.latitude.unwrap_or_default(),
            self.longitude.unwrap_or_default(),
            self.speed.unwrap_or_default(),
        );
        out
    }
}

/// Environmental report from the BME280-class sensor.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironMessage<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barometric_pressure: Option<f32>,
}

impl<'a> EnvironMessage<'a> {
    /// Readings are rounded on the way in: temperature to two decimals,
    /// humidity and pressure to whole units.
    pub fn new(
        sensor_id: Option<&'a str>,
        temperature: Option<f32>,
        humidity: Option<f32>,
        barometric_pressure: Option<f32>,
    ) -> Self {
        Self {
            sensor_id,
            temperature: temperature.map(|t| round_to(t, 100.0)),
            humidity: humidity.map(|h| round_to(h, 1.0)),
            barometric_pressure: barometric_pressure.map(|p| round_to(p, 1.0)),
        }
    }

    pub fn to_json(&self) -> Result<String<256>, serde_json_core::ser::Error> {
        serde_json_core::to_string(self)
    }

    /// `temperature|humidity|pressure` for the LoRa uplink.
    pub fn lora(&self) -> String<32> {
        let mut out = String::new();
        let _ = write!(
            out,
            "{:.2}|{:.0}|{:.0}",
            self.temperature.unwrap_or_default(),
            self.humidity.unwrap_or_default(),
            self.barometric_pressure.unwrap_or_default(),
        );
        out
    }
}

/// Heartbeat published when the device comes up.
#[derive(Debug, Clone, Serialize)]
pub struct AliveMessage<'a> {
    pub customer: &'a str,
    #[serde(rename = "devId")]
    pub device_id: &'a str,
    /// epoch seconds, supplied by the caller's clock
    pub time: u64,
}

impl<'a> AliveMessage<'a> {
    pub fn new(customer: &'a str, device_id: &'a str, time: u64) -> Self {
        Self {
            customer,
            device_id,
            time,
        }
    }

    pub fn to_json(&self) -> Result<String<128>, serde_json_core::ser::Error> {
        serde_json_core::to_string(self)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SensorReading<'a> {
    Environment(EnvironMessage<'a>),
    Gps(GpsMessage<'a>),
}

/// Composite status message carrying the cycle's sensor readings.
#[derive(Debug, Clone, Serialize)]
pub struct TrackerMessage<'a> {
    pub customer: &'a str,
    #[serde(rename = "devId")]
    pub device_id: &'a str,
    /// epoch seconds, supplied by the caller's clock
    pub time: u64,
    sensors: Vec<SensorReading<'a>, 2>,
}

impl<'a> TrackerMessage<'a> {
    pub fn new(customer: &'a str, device_id: &'a str, time: u64) -> Self {
        Self {
            customer,
            device_id,
            time,
            sensors: Vec::new(),
        }
    }

    pub fn add_environment(&mut self, message: EnvironMessage<'a>) {
        let _ = self.sensors.push(SensorReading::Environment(message));
    }

    pub fn add_gps(&mut self, message: GpsMessage<'a>) {
        let _ = self.sensors.push(SensorReading::Gps(message));
    }

    pub fn to_json(&self) -> Result<String<512>, serde_json_core::ser::Error> {
        serde_json_core::to_string(self)
    }
}
