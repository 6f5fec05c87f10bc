//! ECEF, geodetic, and local-level coordinates
//!
//! The sonde reports its GPS solution in Earth-Centered Earth-Fixed
//! (ECEF) coordinates. [`Ecef::to_geodetic()`] converts positions to
//! WGS84 latitude, longitude, and height with a closed-form
//! single-step approximation (Bowring's formula, without
//! refinement). Near the Earth's surface it is accurate to well
//! below one meter.
//!
//! Velocities are rotated into a local North-East-Up frame and
//! summarized as a horizontal speed, a heading, and a vertical
//! speed.

use std::f64::consts::PI;

/// WGS84 semi-major axis (m)
pub const WGS84_A: f64 = 6378137.0;

/// WGS84 semi-minor axis (m)
pub const WGS84_B: f64 = 6356752.31424518;

// a² − b²
const WGS84_A2_B2: f64 = WGS84_A * WGS84_A - WGS84_B * WGS84_B;

// first eccentricity squared
const E2: f64 = WGS84_A2_B2 / (WGS84_A * WGS84_A);

// second eccentricity squared
const EE2: f64 = WGS84_A2_B2 / (WGS84_B * WGS84_B);

/// Earth-Centered Earth-Fixed position (m)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Ecef {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Ecef {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Convert to WGS84 geodetic coordinates
    ///
    /// Uses a single evaluation of Bowring's formula. There is no
    /// iterative refinement.
    pub fn to_geodetic(&self) -> Geodetic {
        let lam = f64::atan2(self.y, self.x);

        let p = f64::sqrt(self.x * self.x + self.y * self.y);
        let t = f64::atan2(self.z * WGS84_A, p * WGS84_B);
        let (sin_t, cos_t) = t.sin_cos();

        let phi = f64::atan2(
            self.z + EE2 * WGS84_B * sin_t * sin_t * sin_t,
            p - E2 * WGS84_A * cos_t * cos_t * cos_t,
        );

        let sin_phi = phi.sin();
        let r = WGS84_A / f64::sqrt(1.0 - E2 * sin_phi * sin_phi);

        Geodetic {
            lat_deg: phi * 180.0 / PI,
            lon_deg: lam * 180.0 / PI,
            alt_m: p / phi.cos() - r,
        }
    }
}

/// WGS84 geodetic position
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Geodetic {
    /// Latitude (degrees, north positive)
    pub lat_deg: f64,

    /// Longitude (degrees, east positive)
    pub lon_deg: f64,

    /// Height above the ellipsoid (m)
    pub alt_m: f64,
}

impl Geodetic {
    pub fn new(lat_deg: f64, lon_deg: f64, alt_m: f64) -> Self {
        Self {
            lat_deg,
            lon_deg,
            alt_m,
        }
    }

    /// Convert to ECEF
    ///
    /// This conversion is exact.
    pub fn to_ecef(&self) -> Ecef {
        let (sin_lat, cos_lat) = self.lat_deg.to_radians().sin_cos();
        let (sin_lon, cos_lon) = self.lon_deg.to_radians().sin_cos();
        let n = WGS84_A / f64::sqrt(1.0 - E2 * sin_lat * sin_lat);

        Ecef {
            x: (n + self.alt_m) * cos_lat * cos_lon,
            y: (n + self.alt_m) * cos_lat * sin_lon,
            z: (n * (1.0 - E2) + self.alt_m) * sin_lat,
        }
    }
}

/// ECEF velocity (m/s)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EcefVelocity {
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
}

impl EcefVelocity {
    pub fn new(vx: f64, vy: f64, vz: f64) -> Self {
        Self { vx, vy, vz }
    }

    /// Rotate into the North-East-Up frame at `at`
    pub fn to_neu(&self, at: &Geodetic) -> Neu {
        let (sin_phi, cos_phi) = (at.lat_deg * PI / 180.0).sin_cos();
        let (sin_lam, cos_lam) = (at.lon_deg * PI / 180.0).sin_cos();

        Neu {
            north: -self.vx * sin_phi * cos_lam - self.vy * sin_phi * sin_lam + self.vz * cos_phi,
            east: -self.vx * sin_lam + self.vy * cos_lam,
            up: self.vx * cos_phi * cos_lam + self.vy * cos_phi * sin_lam + self.vz * sin_phi,
        }
    }

    /// Resolve into speed, heading, and climb at `at`
    pub fn resolve(&self, at: &Geodetic) -> Motion {
        Motion::from(self.to_neu(at))
    }
}

/// Local North-East-Up velocity (m/s)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Neu {
    pub north: f64,
    pub east: f64,
    pub up: f64,
}

/// Horizontal and vertical motion
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Motion {
    /// Horizontal speed (m/s)
    pub horizontal_mps: f64,

    /// Direction of travel (degrees clockwise from north, `[0, 360)`)
    pub heading_deg: f64,

    /// Vertical speed (m/s, positive up)
    pub vertical_mps: f64,
}

impl From<Neu> for Motion {
    fn from(neu: Neu) -> Self {
        let mut heading_deg = f64::atan2(neu.east, neu.north) * 180.0 / PI;
        if heading_deg < 0.0 {
            heading_deg += 360.0;
        }
        // tiny negative angles round up to exactly 360
        if heading_deg >= 360.0 {
            heading_deg -= 360.0;
        }

        Self {
            horizontal_mps: f64::sqrt(neu.north * neu.north + neu.east * neu.east),
            heading_deg,
            vertical_mps: neu.up,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_geodetic_roundtrip() {
        const POINTS: &[(f64, f64, f64)] = &[
            (48.1, 11.5, 1500.0),
            (-33.9, 151.2, 25000.0),
            (0.0, 0.0, 0.0),
            (80.0, -120.0, 30000.0),
            (12.5, -179.9, -500.0),
        ];

        for &(lat, lon, alt) in POINTS {
            let ecef = Geodetic::new(lat, lon, alt).to_ecef();
            let geo = ecef.to_geodetic();
            assert_approx_eq!(lat, geo.lat_deg, 1e-6);
            assert_approx_eq!(lon, geo.lon_deg, 1e-6);
            assert_approx_eq!(alt, geo.alt_m, 0.1);
        }
    }

    #[test]
    fn test_geodetic_reference() {
        // reference values for the single-step conversion, at
        // centimeter ECEF resolution
        let geo = Ecef::new(4182759.55, 850992.05, 4725425.73).to_geodetic();
        assert_approx_eq!(48.09999996, geo.lat_deg, 1e-7);
        assert_approx_eq!(11.50000002, geo.lon_deg, 1e-7);
        assert_approx_eq!(1500.0003, geo.alt_m, 1e-3);

        let geo = Ecef::new(WGS84_A, 0.0, 0.0).to_geodetic();
        assert_approx_eq!(0.0, geo.lat_deg);
        assert_approx_eq!(0.0, geo.lon_deg);
        assert_approx_eq!(0.0, geo.alt_m, 1e-6);
    }

    #[test]
    fn test_neu_rotation() {
        // at the equator and prime meridian, ECEF x is up, y is east,
        // z is north
        let origin = Geodetic::new(0.0, 0.0, 0.0);
        let neu = EcefVelocity::new(1.0, 2.0, 3.0).to_neu(&origin);
        assert_approx_eq!(3.0, neu.north);
        assert_approx_eq!(2.0, neu.east);
        assert_approx_eq!(1.0, neu.up);

        // at the north pole, −x points north along λ = 0
        let pole = Geodetic::new(90.0, 0.0, 0.0);
        let neu = EcefVelocity::new(-5.0, 0.0, 2.0).to_neu(&pole);
        assert_approx_eq!(5.0, neu.north);
        assert_approx_eq!(0.0, neu.east);
        assert_approx_eq!(2.0, neu.up);
    }

    #[test]
    fn test_motion() {
        let m = Motion::from(Neu {
            north: 3.0,
            east: 4.0,
            up: -1.5,
        });
        assert_approx_eq!(5.0, m.horizontal_mps);
        assert_approx_eq!(53.130102, m.heading_deg, 1e-5);
        assert_approx_eq!(-1.5, m.vertical_mps);

        // westward heading is normalized into [0, 360)
        let m = Motion::from(Neu {
            north: 0.0,
            east: -2.0,
            up: 0.0,
        });
        assert_approx_eq!(270.0, m.heading_deg);

        // due south
        let m = Motion::from(Neu {
            north: -1.0,
            east: 0.0,
            up: 0.0,
        });
        assert_approx_eq!(180.0, m.heading_deg);
    }

    #[test]
    fn test_resolve_known_track() {
        // a sonde at 45°N 10°E drifting 10 m/s toward the east
        // and falling at 12 m/s
        let at = Geodetic::new(45.0, 10.0, 5000.0);
        let (sin_lam, cos_lam) = 10.0f64.to_radians().sin_cos();
        let (sin_phi, cos_phi) = 45.0f64.to_radians().sin_cos();
        let east = [-sin_lam, cos_lam, 0.0];
        let up = [cos_phi * cos_lam, cos_phi * sin_lam, sin_phi];
        let v = EcefVelocity::new(
            10.0 * east[0] - 12.0 * up[0],
            10.0 * east[1] - 12.0 * up[1],
            10.0 * east[2] - 12.0 * up[2],
        );

        let m = v.resolve(&at);
        assert_approx_eq!(10.0, m.horizontal_mps, 1e-9);
        assert_approx_eq!(90.0, m.heading_deg, 1e-9);
        assert_approx_eq!(-12.0, m.vertical_mps, 1e-9);
    }
}
