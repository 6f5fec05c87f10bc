//! # rd94: RD94 dropsonde telemetry decoding
//!
//! This crate decodes the downlink of the Vaisala RD94 dropsonde.
//! The sonde transmits a 4800 baud binary FSK signal carrying
//! Manchester-coded frames of 120 bytes. Each frame holds the
//! sonde's GPS solution: time, position, and velocity.
//!
//! ## Example
//!
//! You will first need to recover the *baseband* FSK signal, as it
//! appears at the discriminator output of a receiver or as the
//! FM-demodulated audio of a software-defined radio. Record or
//! sample it at 44.1 kHz or 48 kHz, mixed down to mono.
//!
//! ```
//! use rd94::Rd94ReceiverBuilder;
//!
//! # let some_audio_source_iterator = || std::iter::once(0i32);
//! #
//! // create a receiver with your sampling rate
//! let mut rx = Rd94ReceiverBuilder::new(48000)
//!     .with_drift_compensation(false)  // interpolate zero crossings
//!     .build();
//!
//! // let audiosrc be an iterator which outputs signed samples
//! let audiosrc = some_audio_source_iterator();
//! for frame in rx.iter(audiosrc) {
//!     match frame.fix() {
//!         Ok(fix) => println!(
//!             "{} {}: {:.5} {:.5} {:.1} m",
//!             fix.date(),
//!             fix.time_of_day(),
//!             fix.lat_deg(),
//!             fix.lon_deg(),
//!             fix.alt_m()
//!         ),
//!         Err(e) => println!("bad frame: {}", e),
//!     }
//! }
//!
//! // pick up a frame that was cut off at the end of the input
//! if let Some(frame) = rx.flush() {
//!     let _ = frame.fix();
//! }
//! ```
//!
//! The [`Rd94Receiver`] binds by iterator to any source of `i32`
//! samples. Only the sign of each sample is used. The iterator
//! consumes samples until the next complete [`Frame`].
//!
//! Frames carry no checksum. A [`FixRecord`] is only produced for
//! frames which pass some basic plausibility checks on the GPS
//! week, time-of-week, and altitude. Frames can also be built
//! directly from Manchester-decoded bits with
//! [`Frame::from_bit_str()`].
//!
//! ## Background
//!
//! The RD94 is dropped from aircraft, mostly to sample the
//! atmosphere in and around tropical cyclones. Its telemetry uses
//! a 4800 baud line rate. Each data bit is Manchester coded, so
//! the data rate is 2400 bit/s. Bytes are framed like an 8N1
//! serial port. Every frame begins with the header bytes
//! `1A CF FC 1D 01`.
//!
//! GPS times are reported in the GPS time scale, which does not
//! observe leap seconds. Positions and velocities are reported in
//! Earth-Centered Earth-Fixed coordinates and converted to WGS84.
//!
//! ## Crate features
//!
//! * `chrono`: Express GPS times as chrono timestamps with
//!   [`GpsTime::to_datetime()`]. If enabled, `chrono` becomes
//!   part of this crate's public API.

#![allow(dead_code)]

mod builder;
mod fix;
mod frame;
mod geodesy;
mod gpstime;
mod receiver;

pub mod waveform;

pub use builder::Rd94ReceiverBuilder;
pub use fix::{FixError, FixRecord, VelocityFix, ALTITUDE_RANGE_M, POSITION_END, VELOCITY_END};
pub use frame::{manchester_decode, pack_bytes, DecodedBit, Frame, LogicalBits};
pub use geodesy::{Ecef, EcefVelocity, Geodetic, Motion, Neu, WGS84_A, WGS84_B};
pub use gpstime::{gps_to_date, gps_to_mjd, CalendarDate, GpsTime, TimeOfDay, Weekday};
pub use receiver::{Rd94Receiver, SourceIter};
