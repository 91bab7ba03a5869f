//! The 26 canonical drop directions of a cuboid device.
//!
//! Purpose
//! - Name every resting pose a rigid box can land on: 6 faces, 12 edges, 8 corners.
//! - Fix one canonical ordering (`F1..F6, E1..E12, C1..C8`) that the row-uniqueness
//!   pass walks when it perturbs a candidate row.
//!
//! Body frame
//! - `x` across the device width, `y` along its length, `z` through its thickness.
//! - `down_axis` is the body-frame unit vector that points at the floor when the device
//!   rests on that feature. Faces are signed axes, edges are two-axis diagonals, corners
//!   are three-axis diagonals.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of directions in the canonical pool.
pub const DIRECTION_COUNT: usize = 26;

/// Pool a direction belongs to. Pool membership drives diversity and tolerance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Pool {
    Face,
    Edge,
    Corner,
}

impl Pool {
    pub const ALL: [Pool; 3] = [Pool::Face, Pool::Edge, Pool::Corner];

    /// Directions of this pool, in canonical order.
    pub fn members(self) -> &'static [Direction] {
        match self {
            Pool::Face => &Direction::ALL[0..6],
            Pool::Edge => &Direction::ALL[6..18],
            Pool::Corner => &Direction::ALL[18..26],
        }
    }
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Pool::Face => "face",
            Pool::Edge => "edge",
            Pool::Corner => "corner",
        };
        f.write_str(s)
    }
}

/// One of the 26 canonical device orientations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    E1,
    E2,
    E3,
    E4,
    E5,
    E6,
    E7,
    E8,
    E9,
    E10,
    E11,
    E12,
    C1,
    C2,
    C3,
    C4,
    C5,
    C6,
    C7,
    C8,
}

/// Tilt of a corner pose about the pitch axis: `atan(1/√2)` in degrees.
pub const CORNER_TILT_DEG: f64 = 35.264_389_682_754_654;

impl Direction {
    /// Canonical ordering used for wrap-around perturbation.
    pub const ALL: [Direction; DIRECTION_COUNT] = [
        Direction::F1,
        Direction::F2,
        Direction::F3,
        Direction::F4,
        Direction::F5,
        Direction::F6,
        Direction::E1,
        Direction::E2,
        Direction::E3,
        Direction::E4,
        Direction::E5,
        Direction::E6,
        Direction::E7,
        Direction::E8,
        Direction::E9,
        Direction::E10,
        Direction::E11,
        Direction::E12,
        Direction::C1,
        Direction::C2,
        Direction::C3,
        Direction::C4,
        Direction::C5,
        Direction::C6,
        Direction::C7,
        Direction::C8,
    ];

    /// Position in the canonical ordering.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn from_index(i: usize) -> Direction {
        Self::ALL[i % DIRECTION_COUNT]
    }

    pub fn pool(self) -> Pool {
        match self.index() {
            0..=5 => Pool::Face,
            6..=17 => Pool::Edge,
            _ => Pool::Corner,
        }
    }

    /// The direction `shift` positions ahead in the canonical ordering (wrapping).
    #[inline]
    pub fn advance(self, shift: usize) -> Direction {
        Self::from_index(self.index() + shift % DIRECTION_COUNT)
    }

    /// Short code such as `"F1"` or `"E12"`.
    pub fn code(self) -> &'static str {
        const CODES: [&str; DIRECTION_COUNT] = [
            "F1", "F2", "F3", "F4", "F5", "F6", "E1", "E2", "E3", "E4", "E5", "E6", "E7", "E8",
            "E9", "E10", "E11", "E12", "C1", "C2", "C3", "C4", "C5", "C6", "C7", "C8",
        ];
        CODES[self.index()]
    }

    /// Nominal resting attitude `(phi, theta, psi)` in degrees.
    pub fn nominal_angles(self) -> [f64; 3] {
        use Direction::*;
        let c = CORNER_TILT_DEG;
        match self {
            F1 => [0.0, 0.0, 0.0],
            F2 => [180.0, 0.0, 0.0],
            F3 => [90.0, 0.0, 0.0],
            F4 => [-90.0, 0.0, 0.0],
            F5 => [0.0, 90.0, 0.0],
            F6 => [0.0, -90.0, 0.0],
            E1 => [45.0, 0.0, 0.0],
            E2 => [-45.0, 0.0, 0.0],
            E3 => [135.0, 0.0, 0.0],
            E4 => [-135.0, 0.0, 0.0],
            E5 => [0.0, 45.0, 0.0],
            E6 => [0.0, -45.0, 0.0],
            E7 => [180.0, 45.0, 0.0],
            E8 => [180.0, -45.0, 0.0],
            E9 => [90.0, 45.0, 0.0],
            E10 => [90.0, -45.0, 0.0],
            E11 => [-90.0, 45.0, 0.0],
            E12 => [-90.0, -45.0, 0.0],
            C1 => [45.0, c, 0.0],
            C2 => [45.0, -c, 0.0],
            C3 => [-45.0, c, 0.0],
            C4 => [-45.0, -c, 0.0],
            C5 => [135.0, c, 0.0],
            C6 => [135.0, -c, 0.0],
            C7 => [-135.0, c, 0.0],
            C8 => [-135.0, -c, 0.0],
        }
    }

    /// Body-frame unit vector pointing at the floor in the nominal attitude.
    pub fn down_axis(self) -> Vector3<f64> {
        use Direction::*;
        let s = match self {
            F1 => [0.0, 0.0, -1.0],
            F2 => [0.0, 0.0, 1.0],
            F3 => [0.0, -1.0, 0.0],
            F4 => [0.0, 1.0, 0.0],
            F5 => [1.0, 0.0, 0.0],
            F6 => [-1.0, 0.0, 0.0],
            E1 => [0.0, -1.0, -1.0],
            E2 => [0.0, 1.0, -1.0],
            E3 => [0.0, -1.0, 1.0],
            E4 => [0.0, 1.0, 1.0],
            E5 => [1.0, 0.0, -1.0],
            E6 => [-1.0, 0.0, -1.0],
            E7 => [1.0, 0.0, 1.0],
            E8 => [-1.0, 0.0, 1.0],
            E9 => [1.0, -1.0, 0.0],
            E10 => [-1.0, -1.0, 0.0],
            E11 => [1.0, 1.0, 0.0],
            E12 => [-1.0, 1.0, 0.0],
            C1 => [1.0, -1.0, -1.0],
            C2 => [-1.0, -1.0, -1.0],
            C3 => [1.0, 1.0, -1.0],
            C4 => [-1.0, 1.0, -1.0],
            C5 => [1.0, -1.0, 1.0],
            C6 => [-1.0, -1.0, 1.0],
            C7 => [1.0, 1.0, 1.0],
            C8 => [-1.0, 1.0, 1.0],
        };
        Vector3::new(s[0], s[1], s[2]).normalize()
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error for an unrecognized direction code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownDirection(pub String);

impl fmt::Display for UnknownDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown direction code `{}`", self.0)
    }
}

impl std::error::Error for UnknownDirection {}

impl FromStr for Direction {
    type Err = UnknownDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        Direction::ALL
            .iter()
            .copied()
            .find(|d| d.code().eq_ignore_ascii_case(t))
            .ok_or_else(|| UnknownDirection(s.to_string()))
    }
}
