//! Euler-angle attitude sets for the predefined and edge-rotation drop modes.
//!
//! Convention
//! - `phi` roll about body `x`, `theta` pitch about `y`, `psi` yaw about `z`, in degrees,
//!   applied roll → pitch → yaw (`R = Rz(psi)·Ry(theta)·Rx(phi)`).
//! - A generated set only seeds the editable list. Later edits (add, remove, rename,
//!   re-angle) are kept until the mode changes or the user resets to default.

use crate::direction::{Direction, Pool};
use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One named drop attitude.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attitude {
    pub name: String,
    pub phi: f64,
    pub theta: f64,
    pub psi: f64,
}

impl Attitude {
    pub fn new(name: impl Into<String>, phi: f64, theta: f64, psi: f64) -> Self {
        Self {
            name: name.into(),
            phi,
            theta,
            psi,
        }
    }

    /// Nominal resting attitude of a canonical direction, named by its code.
    pub fn nominal(dir: Direction) -> Self {
        let [phi, theta, psi] = dir.nominal_angles();
        Self::new(dir.code(), phi, theta, psi)
    }

    pub fn angles(&self) -> [f64; 3] {
        [self.phi, self.theta, self.psi]
    }

    /// Body → world rotation.
    pub fn rotation(&self) -> Rotation3<f64> {
        Rotation3::from_euler_angles(
            self.phi.to_radians(),
            self.theta.to_radians(),
            self.psi.to_radians(),
        )
    }

    /// Body-frame vector that points at the floor in this attitude.
    pub fn body_down(&self) -> Vector3<f64> {
        self.rotation().inverse() * Vector3::new(0.0, 0.0, -1.0)
    }

    /// Pool of the canonical direction this entry is named after, if any.
    pub fn pool(&self) -> Option<Pool> {
        self.name.parse::<Direction>().ok().map(Direction::pool)
    }
}

/// Ordered, editable list of attitudes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttitudeSet {
    pub entries: Vec<Attitude>,
}

impl AttitudeSet {
    pub fn new(entries: Vec<Attitude>) -> Self {
        Self { entries }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attitude> {
        self.entries.iter()
    }

    pub fn push(&mut self, attitude: Attitude) {
        self.entries.push(attitude);
    }

    pub fn remove(&mut self, index: usize) -> Option<Attitude> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    /// Replace entry `index`; returns the previous value.
    pub fn replace(&mut self, index: usize, attitude: Attitude) -> Option<Attitude> {
        self.entries
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, attitude))
    }
}

/// Which canonical poses the predefined mode covers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PredefinedMode {
    #[default]
    Face,
    Edge,
    Corner,
    All,
}

impl PredefinedMode {
    pub fn directions(self) -> &'static [Direction] {
        match self {
            PredefinedMode::Face => Pool::Face.members(),
            PredefinedMode::Edge => Pool::Edge.members(),
            PredefinedMode::Corner => Pool::Corner.members(),
            PredefinedMode::All => &Direction::ALL,
        }
    }
}

/// Fixed attitude table for `mode`: 6, 12, 8 or all 26 canonical poses.
pub fn generate_predefined_attitudes(mode: PredefinedMode) -> AttitudeSet {
    AttitudeSet::new(mode.directions().iter().map(|d| Attitude::nominal(*d)).collect())
}

/// Edge of the device the rotation sweeps about.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeAxis {
    #[default]
    Top,
    Bottom,
    Left,
    Right,
}

impl EdgeAxis {
    pub const ALL: [EdgeAxis; 4] = [
        EdgeAxis::Top,
        EdgeAxis::Bottom,
        EdgeAxis::Left,
        EdgeAxis::Right,
    ];

    /// The two Euler angles held fixed while the third sweeps.
    pub fn fixed_angles(self) -> (f64, f64) {
        match self {
            EdgeAxis::Top => (0.0, -90.0),
            EdgeAxis::Bottom => (0.0, 90.0),
            EdgeAxis::Left => (90.0, 0.0),
            EdgeAxis::Right => (-90.0, 0.0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EdgeAxis::Top => "top",
            EdgeAxis::Bottom => "bottom",
            EdgeAxis::Left => "left",
            EdgeAxis::Right => "right",
        }
    }
}

impl fmt::Display for EdgeAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeAxis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EdgeAxis::ALL
            .iter()
            .copied()
            .find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown edge axis `{s}` (expected top, bottom, left or right)"))
    }
}

impl FromStr for PredefinedMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "face" | "faces" => Ok(PredefinedMode::Face),
            "edge" | "edges" => Ok(PredefinedMode::Edge),
            "corner" | "corners" => Ok(PredefinedMode::Corner),
            "all" => Ok(PredefinedMode::All),
            _ => Err(format!("unknown predefined mode `{s}` (expected face, edge, corner or all)")),
        }
    }
}

/// `divisions` attitudes evenly spaced over a full turn about `axis`.
///
/// Entry `i` sweeps `psi = i · 360 / divisions`; `(phi, theta)` come from
/// [`EdgeAxis::fixed_angles`]. Zero divisions give an empty set.
pub fn generate_edge_rotation_attitudes(axis: EdgeAxis, divisions: usize) -> AttitudeSet {
    let (phi, theta) = axis.fixed_angles();
    let step = if divisions == 0 { 0.0 } else { 360.0 / divisions as f64 };
    AttitudeSet::new(
        (0..divisions)
            .map(|i| Attitude::new(format!("{axis}-{}", i + 1), phi, theta, i as f64 * step))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predefined_table_sizes() {
        assert_eq!(generate_predefined_attitudes(PredefinedMode::Face).len(), 6);
        assert_eq!(generate_predefined_attitudes(PredefinedMode::Edge).len(), 12);
        assert_eq!(generate_predefined_attitudes(PredefinedMode::Corner).len(), 8);
        let all = generate_predefined_attitudes(PredefinedMode::All);
        assert_eq!(all.len(), 26);
        assert_eq!(all.entries[0].name, "F1");
        assert_eq!(all.entries[25].name, "C8");
    }

    #[test]
    fn predefined_poses_put_the_named_feature_down() {
        for d in Direction::ALL {
            let a = Attitude::nominal(d);
            let down = a.body_down();
            assert!(
                (down - d.down_axis()).norm() < 1e-9,
                "{d}: {down:?} vs {:?}",
                d.down_axis()
            );
            assert_eq!(a.pool(), Some(d.pool()));
        }
    }

    #[test]
    fn edge_rotation_top_twelve() {
        let set = generate_edge_rotation_attitudes(EdgeAxis::Top, 12);
        assert_eq!(set.len(), 12);
        let psis: Vec<f64> = set.iter().map(|a| a.psi).collect();
        let expected: Vec<f64> = (0..12).map(|i| i as f64 * 30.0).collect();
        for (got, want) in psis.iter().zip(&expected) {
            assert!((got - want).abs() < 1e-9);
        }
        assert!(set.iter().all(|a| a.phi == 0.0 && a.theta == -90.0));
        assert!(set.iter().all(|a| a.pool().is_none()));
    }

    #[test]
    fn edge_rotation_fixed_angles_per_axis() {
        for (axis, fixed) in [
            (EdgeAxis::Bottom, (0.0, 90.0)),
            (EdgeAxis::Left, (90.0, 0.0)),
            (EdgeAxis::Right, (-90.0, 0.0)),
        ] {
            let set = generate_edge_rotation_attitudes(axis, 4);
            assert!(set.iter().all(|a| (a.phi, a.theta) == fixed));
            assert_eq!(set.entries[1].psi, 90.0);
        }
        assert!(generate_edge_rotation_attitudes(EdgeAxis::Top, 0).is_empty());
    }

    #[test]
    fn set_edits() {
        let mut set = generate_predefined_attitudes(PredefinedMode::Face);
        set.push(Attitude::new("custom", 10.0, 20.0, 30.0));
        assert_eq!(set.len(), 7);
        let old = set.replace(0, Attitude::new("F1-tilted", 5.0, 0.0, 0.0)).unwrap();
        assert_eq!(old.name, "F1");
        assert!(set.entries[0].pool().is_none());
        assert!(set.remove(99).is_none());
        assert_eq!(set.remove(6).unwrap().name, "custom");
    }

    #[test]
    fn parse_modes_and_axes() {
        assert_eq!("Corners".parse::<PredefinedMode>().unwrap(), PredefinedMode::Corner);
        assert_eq!("LEFT".parse::<EdgeAxis>().unwrap(), EdgeAxis::Left);
        assert!("diagonal".parse::<EdgeAxis>().is_err());
    }
}
