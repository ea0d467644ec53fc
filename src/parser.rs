use core::fmt::Write;

use heapless::{String, Vec};

pub(crate) const KNOTS_TO_KPH: f32 = 1.852;
pub(crate) const KNOTS_TO_MPH: f32 = 1.150779;

/// Longest field we expect in a supported sentence (coordinates, timestamps).
const FIELD_LEN: usize = 16;
/// GSV carries the most fields: type + 3 counters + 4 satellite quadruples.
const MAX_FIELDS: usize = 24;

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW",
    "WSW", "W", "WNW", "NW", "NNW",
];

/// Running XOR over the sentence body (between `$` and `*`).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NmeaChecksum(pub u8);

impl NmeaChecksum {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn next(self, byte: u8) -> Self {
        Self(self.0 ^ byte)
    }
}

impl Default for NmeaChecksum {
    fn default() -> Self {
        Self::new()
    }
}

/// The supported sentence grammars, keyed by the trailing three letters of
/// the talker code so that GP/GN/GL talkers all dispatch the same way.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SentenceKind {
    Rmc,
    Gga,
    Gll,
    Vtg,
    Gsa,
    Gsv,
}

impl SentenceKind {
    pub fn from_code(code: &str) -> Option<Self> {
        if code.len() != 5 {
            return None;
        }
        match code.get(2..)? {
            "RMC" => Some(SentenceKind::Rmc),
            "GGA" => Some(SentenceKind::Gga),
            "GLL" => Some(SentenceKind::Gll),
            "VTG" => Some(SentenceKind::Vtg),
            "GSA" => Some(SentenceKind::Gsa),
            "GSV" => Some(SentenceKind::Gsv),
            _ => None,
        }
    }
}

/// Output format of the latitude/longitude accessors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CoordFormat {
    /// Raw NMEA split: whole degrees, decimal minutes, hemisphere letter.
    DegreesMinutes,
    /// Signed decimal degrees (south/west negative).
    DecimalDegrees,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SpeedUnit {
    Kph,
    Mph,
    Knot,
}

/// One decoded coordinate, in the configured output format.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Coordinate {
    DegreesMinutes {
        degrees: u16,
        minutes: f32,
        hemisphere: char,
    },
    Decimal(f32),
}

impl Coordinate {
    /// Signed decimal degrees regardless of the stored representation.
    pub fn to_decimal(&self) -> f32 {
        match *self {
            Coordinate::Decimal(value) => value,
            Coordinate::DegreesMinutes {
                degrees,
                minutes,
                hemisphere,
            } => {
                let dd = f32::from(degrees) + minutes / 60.0;
                if hemisphere == 'S' || hemisphere == 'W' {
                    -dd
                } else {
                    dd
                }
            }
        }
    }
}

// States are named for the portion of the sentence being received
#[derive(Copy, Clone)]
enum DecodeState {
    Idle,
    Fields {
        crc: NmeaChecksum,
    },
    Checksum {
        crc: NmeaChecksum,
        high_nibble: Option<u8>,
    },
}
use DecodeState::*;

/// The cumulative navigation state. Fields keep their last committed value
/// until a later validated sentence replaces them.
#[derive(Debug, Clone)]
struct FixData {
    lat_degrees: u16,
    lat_minutes: f32,
    lat_hemisphere: char,
    lon_degrees: u16,
    lon_minutes: f32,
    lon_hemisphere: char,
    /// Antenna altitude above mean sea level, meters
    altitude: f32,
    speed_knots: f32,
    /// Course over ground, degrees true
    course: f32,
    hour: u8,
    minute: u8,
    second: f32,
    day: u8,
    month: u8,
    year: u8,
    /// 1 = no fix, 2 = 2D, 3 = 3D
    fix_type: u8,
    satellites_in_use: u8,
    satellites_in_view: u8,
    hdop: f32,
}

impl Default for FixData {
    fn default() -> Self {
        Self {
            lat_degrees: 0,
            lat_minutes: 0.0,
            lat_hemisphere: 'N',
            lon_degrees: 0,
            lon_minutes: 0.0,
            lon_hemisphere: 'W',
            altitude: 0.0,
            speed_knots: 0.0,
            course: 0.0,
            hour: 0,
            minute: 0,
            second: 0.0,
            day: 0,
            month: 0,
            year: 0,
            fix_type: 1,
            satellites_in_use: 0,
            satellites_in_view: 0,
            hdop: 0.0,
        }
    }
}

/// Incremental sentence decoder fed one byte at a time.
///
/// A sentence's fields are buffered until its checksum validates; only then
/// are they committed to the fix, so a mid-sentence reader never observes a
/// torn update and a corrupted sentence leaves the fix untouched.
pub struct NmeaParser {
    state: DecodeState,
    fields: Vec<String<FIELD_LEN>, MAX_FIELDS>,
    overflow: bool,
    format: CoordFormat,
    fix: FixData,
}

impl NmeaParser {
    pub fn new(format: CoordFormat) -> Self {
        Self {
            state: Idle,
            fields: Vec::new(),
            overflow: false,
            format,
            fix: FixData::default(),
        }
    }

    pub fn feed(&mut self, byte: u8) {
        let c = byte as char;
        match self.state {
            Idle => {
                if c == '$' {
                    self.begin();
                }
            }
            Fields { crc } => match c {
                '$' => self.begin(),
                '*' => {
                    self.state = Checksum {
                        crc,
                        high_nibble: None,
                    };
                }
                // sentence end without a checksum marker: discard
                '\r' | '\n' => self.state = Idle,
                ',' => {
                    self.state = Fields {
                        crc: crc.next(byte),
                    };
                    if self.fields.push(String::new()).is_err() {
                        self.overflow = true;
                    }
                }
                _ => {
                    self.state = Fields {
                        crc: crc.next(byte),
                    };
                    self.push_field_char(c);
                }
            },
            Checksum { crc, high_nibble } => {
                if c == '$' {
                    self.begin();
                    return;
                }
                let digit = match c.to_digit(16) {
                    Some(d) => d as u8,
                    // truncated checksum: discard the sentence
                    None => {
                        self.state = Idle;
                        return;
                    }
                };
                match high_nibble {
                    None => {
                        self.state = Checksum {
                            crc,
                            high_nibble: Some(digit),
                        };
                    }
                    Some(high) => {
                        self.state = Idle;
                        let found = (high << 4) | digit;
                        if crc.0 == found {
                            self.commit();
                        } else {
                            log::debug!(
                                "checksum mismatch: expect {:02X} saw {:02X}",
                                crc.0,
                                found
                            );
                        }
                    }
                }
            }
        }
    }

    fn begin(&mut self) {
        self.fields.clear();
        let _ = self.fields.push(String::new());
        self.overflow = false;
        self.state = Fields {
            crc: NmeaChecksum::new(),
        };
    }

    fn push_field_char(&mut self, c: char) {
        if let Some(field) = self.fields.last_mut() {
            if field.push(c).is_err() {
                self.overflow = true;
            }
        }
    }

    fn field(&self, index: usize) -> &str {
        self.fields.get(index).map(|f| f.as_str()).unwrap_or("")
    }

    fn commit(&mut self) {
        if self.overflow {
            log::debug!("oversized sentence dropped");
            return;
        }
        match SentenceKind::from_code(self.field(0)) {
            Some(SentenceKind::Rmc) => self.commit_rmc(),
            Some(SentenceKind::Gga) => self.commit_gga(),
            Some(SentenceKind::Gll) => self.commit_gll(),
            Some(SentenceKind::Vtg) => self.commit_vtg(),
            Some(SentenceKind::Gsa) => self.commit_gsa(),
            Some(SentenceKind::Gsv) => self.commit_gsv(),
            // valid checksum but not a grammar we decode
            None => {}
        }
    }

    fn commit_rmc(&mut self) {
        if let Some((hour, minute, second)) = parse_time(self.field(1)) {
            self.fix.hour = hour;
            self.fix.minute = minute;
            self.fix.second = second;
        }
        if let Some((day, month, year)) = parse_date(self.field(9)) {
            self.fix.day = day;
            self.fix.month = month;
            self.fix.year = year;
        }
        // position, speed and course are only trustworthy on an active fix
        if self.field(2) == "A" {
            let lat = parse_latitude(self.field(3), self.field(4));
            let lon = parse_longitude(self.field(5), self.field(6));
            if let (Some(lat), Some(lon)) = (lat, lon) {
                self.set_position(lat, lon);
            }
            if let Ok(knots) = self.field(7).parse::<f32>() {
                self.fix.speed_knots = knots;
            }
            if let Ok(course) = self.field(8).parse::<f32>() {
                self.fix.course = course;
            }
        }
    }

    fn commit_gga(&mut self) {
        if let Some((hour, minute, second)) = parse_time(self.field(1)) {
            self.fix.hour = hour;
            self.fix.minute = minute;
            self.fix.second = second;
        }
        let quality: u8 = self.field(6).parse().unwrap_or(0);
        if quality == 0 {
            return;
        }
        let lat = parse_latitude(self.field(2), self.field(3));
        let lon = parse_longitude(self.field(4), self.field(5));
        if let (Some(lat), Some(lon)) = (lat, lon) {
            self.set_position(lat, lon);
        }
        if let Ok(in_use) = self.field(7).parse::<u8>() {
            self.fix.satellites_in_use = in_use;
        }
        if let Ok(hdop) = self.field(8).parse::<f32>() {
            self.fix.hdop = hdop;
        }
        if let Ok(altitude) = self.field(9).parse::<f32>() {
            self.fix.altitude = altitude;
        }
    }

    fn commit_gll(&mut self) {
        if self.field(6) != "A" {
            return;
        }
        let lat = parse_latitude(self.field(1), self.field(2));
        let lon = parse_longitude(self.field(3), self.field(4));
        if let (Some(lat), Some(lon)) = (lat, lon) {
            self.set_position(lat, lon);
        }
        if let Some((hour, minute, second)) = parse_time(self.field(5)) {
            self.fix.hour = hour;
            self.fix.minute = minute;
            self.fix.second = second;
        }
    }

    fn commit_vtg(&mut self) {
        if let Ok(course) = self.field(1).parse::<f32>() {
            self.fix.course = course;
        }
        if let Ok(knots) = self.field(5).parse::<f32>() {
            self.fix.speed_knots = knots;
        }
    }

    fn commit_gsa(&mut self) {
        if let Ok(fix_type) = self.field(2).parse::<u8>() {
            self.fix.fix_type = fix_type;
        }
        if let Ok(hdop) = self.field(16).parse::<f32>() {
            self.fix.hdop = hdop;
        }
    }

    fn commit_gsv(&mut self) {
        if let Ok(in_view) = self.field(3).parse::<u8>() {
            self.fix.satellites_in_view = in_view;
        }
    }

    fn set_position(&mut self, lat: (u16, f32, char), lon: (u16, f32, char)) {
        let (degrees, minutes, hemisphere) = lat;
        self.fix.lat_degrees = degrees;
        self.fix.lat_minutes = minutes;
        self.fix.lat_hemisphere = hemisphere;
        let (degrees, minutes, hemisphere) = lon;
        self.fix.lon_degrees = degrees;
        self.fix.lon_minutes = minutes;
        self.fix.lon_hemisphere = hemisphere;
    }

    /// True once a committed latitude/longitude pair is non-zero. All-zero
    /// coordinates are the never-received sentinel.
    pub fn has_position(&self) -> bool {
        let lat_zero = self.fix.lat_degrees == 0 && self.fix.lat_minutes == 0.0;
        let lon_zero = self.fix.lon_degrees == 0 && self.fix.lon_minutes == 0.0;
        !lat_zero && !lon_zero
    }

    pub fn latitude(&self) -> Coordinate {
        self.coordinate(
            self.fix.lat_degrees,
            self.fix.lat_minutes,
            self.fix.lat_hemisphere,
        )
    }

    pub fn longitude(&self) -> Coordinate {
        self.coordinate(
            self.fix.lon_degrees,
            self.fix.lon_minutes,
            self.fix.lon_hemisphere,
        )
    }

    fn coordinate(&self, degrees: u16, minutes: f32, hemisphere: char) -> Coordinate {
        match self.format {
            CoordFormat::DegreesMinutes => Coordinate::DegreesMinutes {
                degrees,
                minutes,
                hemisphere,
            },
            CoordFormat::DecimalDegrees => {
                let dd = f32::from(degrees) + minutes / 60.0;
                if hemisphere == 'S' || hemisphere == 'W' {
                    Coordinate::Decimal(-dd)
                } else {
                    Coordinate::Decimal(dd)
                }
            }
        }
    }

    pub fn altitude(&self) -> f32 {
        self.fix.altitude
    }

    pub fn speed(&self, unit: SpeedUnit) -> f32 {
        match unit {
            SpeedUnit::Knot => self.fix.speed_knots,
            SpeedUnit::Kph => self.fix.speed_knots * KNOTS_TO_KPH,
            SpeedUnit::Mph => self.fix.speed_knots * KNOTS_TO_MPH,
        }
    }

    pub fn course(&self) -> f32 {
        self.fix.course
    }

    /// 16-point compass direction derived from the course.
    pub fn direction(&self) -> &'static str {
        let sector = ((self.fix.course + 11.25) / 22.5) as usize % 16;
        COMPASS_POINTS[sector]
    }

    /// `YYYY-MM-DDTHH:MM:SSZ` from the last committed date and time.
    /// Two-digit years 80..99 expand to 19xx, the rest to 20xx.
    pub fn timestamp_utc(&self) -> String<20> {
        let year = if self.fix.year >= 80 {
            1900 + u16::from(self.fix.year)
        } else {
            2000 + u16::from(self.fix.year)
        };
        let mut out = String::new();
        let _ = write!(
            out,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
            year,
            self.fix.month,
            self.fix.day,
            self.fix.hour,
            self.fix.minute,
            (self.fix.second + 0.5) as u8,
        );
        out
    }

    pub fn satellites_in_use(&self) -> u8 {
        self.fix.satellites_in_use
    }

    pub fn satellites_in_view(&self) -> u8 {
        self.fix.satellites_in_view
    }

    pub fn fix_type(&self) -> u8 {
        self.fix.fix_type
    }

    pub fn hdop(&self) -> f32 {
        self.fix.hdop
    }
}

/// `hhmmss[.sss]` into hours, minutes and decimal seconds.
fn parse_time(raw: &str) -> Option<(u8, u8, f32)> {
    if raw.len() < 6 {
        return None;
    }
    let hour = raw.get(0..2)?.parse().ok()?;
    let minute = raw.get(2..4)?.parse().ok()?;
    let second = raw.get(4..)?.parse().ok()?;
    Some((hour, minute, second))
}

/// `ddmmyy` into day, month and two-digit year.
fn parse_date(raw: &str) -> Option<(u8, u8, u8)> {
    if raw.len() != 6 {
        return None;
    }
    let day = raw.get(0..2)?.parse().ok()?;
    let month = raw.get(2..4)?.parse().ok()?;
    let year = raw.get(4..6)?.parse().ok()?;
    Some((day, month, year))
}

/// `DDMM.MMMM` plus hemisphere letter.
fn parse_latitude(value: &str, hemisphere: &str) -> Option<(u16, f32, char)> {
    let degrees = value.get(0..2)?.parse().ok()?;
    let minutes = value.get(2..)?.parse().ok()?;
    let hemisphere = match hemisphere {
        "N" => 'N',
        "S" => 'S',
        _ => return None,
    };
    Some((degrees, minutes, hemisphere))
}

/// `DDDMM.MMMM` plus hemisphere letter.
fn parse_longitude(value: &str, hemisphere: &str) -> Option<(u16, f32, char)> {
    let degrees = value.get(0..3)?.parse().ok()?;
    let minutes = value.get(3..)?.parse().ok()?;
    let hemisphere = match hemisphere {
        "E" => 'E',
        "W" => 'W',
        _ => return None,
    };
    Some((degrees, minutes, hemisphere))
}
