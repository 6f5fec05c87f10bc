//! Telemetry field extraction
//!
//! Every RD94 frame carries its fields at fixed byte offsets. The
//! offsets below are counted from the end of the sync bytes which
//! open the frame. All integers are little-endian.
//!
//! | Field                     | Offset | Size  | Units          |
//! |---------------------------|--------|-------|----------------|
//! | Frame number              | `0x00` | 2     |                |
//! | Frame counter             | `0x02` | 4     |                |
//! | GPS time-of-week          | `0x17` | 4     | ms (signed)    |
//! | GPS week                  | `0x1F` | 2     | signed         |
//! | ECEF X, Y, Z              | `0x23` | 3 × 4 | cm (signed)    |
//! | Velocity scalar           | `0x2F` | 4     | ×1/100         |
//! | ECEF velocity             | `0x33` | 3 × 4 | cm/s (signed)  |
//! | Secondary ECEF velocity   | `0x49` | 3 × 4 | cm/s (signed)  |
//!
//! The velocity section (from `0x2F` onward) is only decoded if the
//! frame capture covers all of it. The meaning of the velocity
//! scalar and of the secondary velocity vector is not known; both
//! are decoded and kept, but only the primary velocity is
//! resolved into speed and heading.

use std::ops::RangeInclusive;

use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

use crate::frame::Frame;
use crate::geodesy::{Ecef, EcefVelocity, Geodetic, Motion};
use crate::gpstime::{CalendarDate, GpsTime, TimeOfDay, Weekday};
use crate::waveform::{SYNC_BYTES, UART_SYMBOL_BITS};

const OFS: usize = SYNC_BYTES;
const POS_FRAME_NB: usize = OFS + 0x00;
const POS_FRAME_COUNTER: usize = OFS + 0x02;
const POS_GPS_TOW: usize = OFS + 0x17;
const POS_GPS_WEEK: usize = OFS + 0x1F;
const POS_ECEF_POSITION: usize = OFS + 0x23;
const POS_VELOCITY_SCALAR: usize = OFS + 0x2F;
const POS_ECEF_VELOCITY: usize = OFS + 0x33;
const POS_ECEF_VELOCITY2: usize = OFS + 0x49;

/// End of the position fields, in frame bytes
///
/// A frame must cover at least this many bytes to be decoded.
pub const POSITION_END: usize = POS_ECEF_POSITION + 12;

/// End of the velocity section, in frame bytes
pub const VELOCITY_END: usize = POS_ECEF_VELOCITY2 + 12;

/// Plausible altitudes (m)
pub const ALTITUDE_RANGE_M: RangeInclusive<f64> = -1000.0..=80000.0;

// position and velocity LSb
const CENTI: f64 = 1.0 / 100.0;

/// Error decoding a fix
#[derive(Error, Clone, Debug, PartialEq)]
pub enum FixError {
    /// The capture ends before the position fields
    #[error("frame truncated: {captured} bits captured, {required} required")]
    Truncated { captured: usize, required: usize },

    /// The GPS week is negative
    #[error("invalid GPS week: {0}")]
    NegativeWeek(i16),

    /// The time-of-week does not fall within one week
    #[error("invalid GPS time-of-week: day {0} of week")]
    WeekdayOutOfRange(i32),

    /// The altitude is implausible
    #[error("implausible altitude: {0:.2} m")]
    AltitudeOutOfRange(f64),
}

/// Velocity section of a frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VelocityFix {
    scalar: f64,
    ecef: EcefVelocity,
    secondary: EcefVelocity,
    motion: Motion,
}

impl VelocityFix {
    /// Scaled value which precedes the velocity vector
    ///
    /// Its meaning is not known.
    pub fn scalar(&self) -> f64 {
        self.scalar
    }

    /// ECEF velocity (m/s)
    pub fn ecef(&self) -> &EcefVelocity {
        &self.ecef
    }

    /// Secondary ECEF velocity block (m/s)
    ///
    /// This block is decoded but never resolved or validated.
    pub fn secondary(&self) -> &EcefVelocity {
        &self.secondary
    }

    /// Horizontal speed (m/s)
    pub fn horizontal_mps(&self) -> f64 {
        self.motion.horizontal_mps
    }

    /// Heading (degrees clockwise from north)
    pub fn heading_deg(&self) -> f64 {
        self.motion.heading_deg
    }

    /// Vertical speed (m/s, positive up)
    pub fn vertical_mps(&self) -> f64 {
        self.motion.vertical_mps
    }

    /// Resolved motion
    pub fn motion(&self) -> &Motion {
        &self.motion
    }
}

/// A validated navigation fix
///
/// Decode one from a [`Frame`] with [`Frame::fix()`]. A fix is
/// only produced if:
///
/// * the GPS week is not negative;
/// * the time-of-week falls within `[0, 7)` days; and
/// * the altitude lies within [`ALTITUDE_RANGE_M`].
///
/// The velocity is present only if the frame capture includes
/// the entire velocity section.
#[derive(Clone, Debug, PartialEq)]
pub struct FixRecord {
    frame_number: u16,
    frame_counter: u32,
    gps_time: GpsTime,
    weekday: Weekday,
    ecef: Ecef,
    position: Geodetic,
    velocity: Option<VelocityFix>,
}

impl FixRecord {
    /// Frame number
    ///
    /// A 16-bit counter which wraps.
    pub fn frame_number(&self) -> u16 {
        self.frame_number
    }

    /// Frame counter
    pub fn frame_counter(&self) -> u32 {
        self.frame_counter
    }

    /// GPS week and time-of-week
    pub fn gps_time(&self) -> &GpsTime {
        &self.gps_time
    }

    /// GPS week number
    pub fn gps_week(&self) -> i32 {
        self.gps_time.week()
    }

    /// Day of the week
    pub fn weekday(&self) -> Weekday {
        self.weekday
    }

    /// Calendar date (GPS time scale)
    pub fn date(&self) -> CalendarDate {
        self.gps_time.date()
    }

    /// Time of day (GPS time scale)
    pub fn time_of_day(&self) -> TimeOfDay {
        self.gps_time.time_of_day()
    }

    /// Position as reported, in ECEF
    pub fn ecef(&self) -> &Ecef {
        &self.ecef
    }

    /// WGS84 position
    pub fn position(&self) -> &Geodetic {
        &self.position
    }

    /// Latitude (degrees)
    pub fn lat_deg(&self) -> f64 {
        self.position.lat_deg
    }

    /// Longitude (degrees)
    pub fn lon_deg(&self) -> f64 {
        self.position.lon_deg
    }

    /// Altitude above the ellipsoid (m)
    pub fn alt_m(&self) -> f64 {
        self.position.alt_m
    }

    /// Velocity, if the frame contained it
    pub fn velocity(&self) -> Option<&VelocityFix> {
        self.velocity.as_ref()
    }
}

impl TryFrom<&Frame> for FixRecord {
    type Error = FixError;

    fn try_from(frame: &Frame) -> Result<Self, Self::Error> {
        if !frame.covers_bytes(POSITION_END) {
            return Err(FixError::Truncated {
                captured: frame.captured_bits(),
                required: POSITION_END * UART_SYMBOL_BITS,
            });
        }

        let bytes = frame.bytes();

        let week = LittleEndian::read_i16(&bytes[POS_GPS_WEEK..]);
        if week < 0 {
            return Err(FixError::NegativeWeek(week));
        }

        let gps_time = GpsTime::new(week as i32, LittleEndian::read_i32(&bytes[POS_GPS_TOW..]));
        let weekday = gps_time
            .weekday()
            .ok_or(FixError::WeekdayOutOfRange(gps_time.day_index()))?;

        let ecef = read_ecef(bytes, POS_ECEF_POSITION);
        let position = ecef.to_geodetic();
        if !ALTITUDE_RANGE_M.contains(&position.alt_m) {
            return Err(FixError::AltitudeOutOfRange(position.alt_m));
        }

        let velocity = if frame.covers_bytes(VELOCITY_END) {
            let v = read_ecef(bytes, POS_ECEF_VELOCITY);
            let ecef = EcefVelocity::new(v.x, v.y, v.z);
            let v2 = read_ecef(bytes, POS_ECEF_VELOCITY2);
            Some(VelocityFix {
                scalar: read_centi(bytes, POS_VELOCITY_SCALAR),
                ecef,
                secondary: EcefVelocity::new(v2.x, v2.y, v2.z),
                motion: ecef.resolve(&position),
            })
        } else {
            None
        };

        Ok(Self {
            frame_number: LittleEndian::read_u16(&bytes[POS_FRAME_NB..]),
            frame_counter: LittleEndian::read_u32(&bytes[POS_FRAME_COUNTER..]),
            gps_time,
            weekday,
            ecef,
            position,
            velocity,
        })
    }
}

// Read a signed 32-bit value in hundredths
#[inline]
fn read_centi(bytes: &[u8], pos: usize) -> f64 {
    LittleEndian::read_i32(&bytes[pos..]) as f64 * CENTI
}

// Read three consecutive signed 32-bit values in hundredths
fn read_ecef(bytes: &[u8], pos: usize) -> Ecef {
    Ecef::new(
        read_centi(bytes, pos),
        read_centi(bytes, pos + 4),
        read_centi(bytes, pos + 8),
    )
}

/// Build frame bytes with the given fields
///
/// This method is designed for use in tests. Positions and
/// velocities are in ECEF centimeters.
#[cfg(test)]
pub(crate) fn make_frame_bytes(
    frame_number: u16,
    frame_counter: u32,
    week: i16,
    tow_ms: i32,
    position_cm: [i32; 3],
    velocity_cm: [i32; 3],
) -> [u8; crate::waveform::FRAME_LEN] {
    use byteorder::WriteBytesExt;

    let mut out = [0u8; crate::waveform::FRAME_LEN];
    out[0..SYNC_BYTES].copy_from_slice(&crate::waveform::HEADER_BYTES[5 - SYNC_BYTES..]);
    LittleEndian::write_u16(&mut out[POS_FRAME_NB..], frame_number);
    LittleEndian::write_u32(&mut out[POS_FRAME_COUNTER..], frame_counter);
    LittleEndian::write_i32(&mut out[POS_GPS_TOW..], tow_ms);
    LittleEndian::write_i16(&mut out[POS_GPS_WEEK..], week);

    let mut wr = &mut out[POS_ECEF_POSITION..];
    for v in position_cm {
        wr.write_i32::<LittleEndian>(v).expect("fits");
    }
    LittleEndian::write_i32(&mut out[POS_VELOCITY_SCALAR..], 1234);
    let mut wr = &mut out[POS_ECEF_VELOCITY..];
    for v in velocity_cm {
        wr.write_i32::<LittleEndian>(v).expect("fits");
    }
    let mut wr = &mut out[POS_ECEF_VELOCITY2..];
    for v in velocity_cm {
        wr.write_i32::<LittleEndian>(-v).expect("fits");
    }
    out
}
