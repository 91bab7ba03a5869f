//! Angular tolerance on generated face/edge/corner attitudes.
//!
//! Each pool has its own tolerance. For every pool and every Euler angle, one LHS draw
//! over `[-tol, +tol]` is made with as many samples as there are entries of that pool,
//! so the offsets of a pool cover the tolerance band evenly.

use crate::attitude::AttitudeSet;
use crate::direction::Pool;
use crate::sampling::generate_lhs_variations;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Per-pool angular tolerance in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToleranceSettings {
    pub enabled: bool,
    pub face_tolerance: f64,
    pub edge_tolerance: f64,
    pub corner_tolerance: f64,
}

impl Default for ToleranceSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            face_tolerance: 5.0,
            edge_tolerance: 5.0,
            corner_tolerance: 5.0,
        }
    }
}

impl ToleranceSettings {
    /// Effective tolerance for `pool`: 0 when disabled, never negative.
    pub fn for_pool(&self, pool: Pool) -> f64 {
        if !self.enabled {
            return 0.0;
        }
        let t = match pool {
            Pool::Face => self.face_tolerance,
            Pool::Edge => self.edge_tolerance,
            Pool::Corner => self.corner_tolerance,
        };
        if t.is_finite() {
            t.max(0.0)
        } else {
            0.0
        }
    }

    /// First negative or non-finite tolerance, as `(field, value)`.
    pub fn invalid_field(&self) -> Option<(&'static str, f64)> {
        [
            ("faceTolerance", self.face_tolerance),
            ("edgeTolerance", self.edge_tolerance),
            ("cornerTolerance", self.corner_tolerance),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_finite() || *v < 0.0)
    }
}

/// Offset added to `(phi, theta, psi)`, degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AngleOffset {
    pub d_phi: f64,
    pub d_theta: f64,
    pub d_psi: f64,
}

impl AngleOffset {
    pub fn is_zero(&self) -> bool {
        self.d_phi == 0.0 && self.d_theta == 0.0 && self.d_psi == 0.0
    }

    pub fn max_abs(&self) -> f64 {
        self.d_phi.abs().max(self.d_theta.abs()).max(self.d_psi.abs())
    }
}

/// One offset per entry of `pools`. Entries without a pool get a zero offset.
pub fn draw_pool_offsets<R: Rng + ?Sized>(
    rng: &mut R,
    pools: &[Option<Pool>],
    settings: &ToleranceSettings,
) -> Vec<AngleOffset> {
    let mut out = vec![AngleOffset::default(); pools.len()];
    for pool in Pool::ALL {
        let idx: Vec<usize> = pools
            .iter()
            .enumerate()
            .filter(|(_, p)| **p == Some(pool))
            .map(|(i, _)| i)
            .collect();
        let tol = settings.for_pool(pool);
        if idx.is_empty() || tol == 0.0 {
            continue;
        }
        let phi = generate_lhs_variations(rng, idx.len(), tol);
        let theta = generate_lhs_variations(rng, idx.len(), tol);
        let psi = generate_lhs_variations(rng, idx.len(), tol);
        for (k, i) in idx.into_iter().enumerate() {
            out[i] = AngleOffset {
                d_phi: phi[k],
                d_theta: theta[k],
                d_psi: psi[k],
            };
        }
    }
    out
}

/// Copy of `set` with pool-named entries perturbed within their tolerance.
pub fn perturb_attitudes<R: Rng + ?Sized>(
    rng: &mut R,
    set: &AttitudeSet,
    settings: &ToleranceSettings,
) -> AttitudeSet {
    let pools: Vec<Option<Pool>> = set.iter().map(|a| a.pool()).collect();
    let offsets = draw_pool_offsets(rng, &pools, settings);
    AttitudeSet::new(
        set.iter()
            .zip(offsets)
            .map(|(a, o)| {
                let mut a = a.clone();
                a.phi += o.d_phi;
                a.theta += o.d_theta;
                a.psi += o.d_psi;
                a
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attitude::{generate_edge_rotation_attitudes, generate_predefined_attitudes};
    use crate::attitude::{EdgeAxis, PredefinedMode};
    use crate::direction::Direction;
    use crate::sampling::SeedToken;

    fn enabled(face: f64, edge: f64, corner: f64) -> ToleranceSettings {
        ToleranceSettings {
            enabled: true,
            face_tolerance: face,
            edge_tolerance: edge,
            corner_tolerance: corner,
        }
    }

    #[test]
    fn disabled_means_zero() {
        let s = ToleranceSettings::default();
        assert_eq!(s.for_pool(Pool::Face), 0.0);
        let mut rng = SeedToken::new(0, 0).to_std_rng();
        let offs = draw_pool_offsets(&mut rng, &[Some(Pool::Edge); 4], &s);
        assert!(offs.iter().all(AngleOffset::is_zero));
    }

    #[test]
    fn offsets_respect_pool_bounds() {
        let s = enabled(1.0, 2.0, 3.0);
        let pools: Vec<Option<Pool>> = Direction::ALL.iter().map(|d| Some(d.pool())).collect();
        let mut rng = SeedToken::new(11, 2).to_std_rng();
        let offs = draw_pool_offsets(&mut rng, &pools, &s);
        for (p, o) in pools.iter().zip(&offs) {
            let tol = s.for_pool(p.unwrap());
            assert!(o.max_abs() <= tol);
            assert!(!o.is_zero());
        }
    }

    #[test]
    fn unnamed_attitudes_are_left_alone() {
        let s = enabled(4.0, 4.0, 4.0);
        let set = generate_edge_rotation_attitudes(EdgeAxis::Left, 6);
        let mut rng = SeedToken::new(5, 5).to_std_rng();
        assert_eq!(perturb_attitudes(&mut rng, &set, &s), set);
    }

    #[test]
    fn predefined_faces_move_within_tolerance() {
        let s = enabled(2.5, 0.0, 0.0);
        let set = generate_predefined_attitudes(PredefinedMode::Face);
        let mut rng = SeedToken::new(5, 6).to_std_rng();
        let moved = perturb_attitudes(&mut rng, &set, &s);
        for (a, b) in set.iter().zip(moved.iter()) {
            assert_eq!(a.name, b.name);
            assert!((a.phi - b.phi).abs() <= 2.5);
            assert!((a.theta - b.theta).abs() <= 2.5);
            assert!((a.psi - b.psi).abs() <= 2.5);
        }
        assert_ne!(moved, set);
    }

    #[test]
    fn invalid_fields_are_found() {
        assert_eq!(enabled(1.0, 1.0, 1.0).invalid_field(), None);
        assert_eq!(
            enabled(1.0, -1.0, 1.0).invalid_field(),
            Some(("edgeTolerance", -1.0))
        );
    }
}
