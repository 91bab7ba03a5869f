//! Drop-test scenario generation.
//!
//! Builds the orientation grids, heights, tolerance offsets, attitude sets and impact
//! points that drive external MBD/explicit-FE drop and impact solvers. Everything here is
//! a synchronous transform from configuration to payload; randomness only enters through
//! an explicitly passed RNG.
//!
//! Layers, leaf first
//! - `direction`, `diversity`: the 26-pose pool and its round-robin default order.
//! - `matrix`: DOE × repeat grids with row uniqueness and resizing.
//! - `sampling`, `layout`: LHS draws and percentage grids for impact points.
//! - `attitude`, `tolerance`: Euler attitude sets and per-pool perturbation.
//! - `pattern`: wildcard matching of component names.
//! - `scenario`: records, edits, the collection and the submission payload.
//!
//! API Policy
//! - There is no stable public API; `api` is the curated surface for callers.

pub mod api;
pub mod attitude;
pub mod direction;
pub mod diversity;
pub mod layout;
pub mod matrix;
pub mod notice;
pub mod pattern;
pub mod sampling;
pub mod scenario;
pub mod tolerance;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use direction::{Direction, Pool};
pub use notice::{Generated, Notice};
pub use scenario::{AnalysisType, ScenarioCollection, ScenarioRecord};

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::attitude::{Attitude, AttitudeSet, EdgeAxis, PredefinedMode};
    pub use crate::direction::{Direction, Pool};
    pub use crate::layout::{GridLayout, Location};
    pub use crate::matrix::DoeGrid;
    pub use crate::notice::{Generated, Notice};
    pub use crate::sampling::SeedToken;
    pub use crate::scenario::{
        AnalysisType, ScenarioCollection, ScenarioEdit, ScenarioRecord, SubmitCfg,
    };
    pub use crate::tolerance::ToleranceSettings;
}
