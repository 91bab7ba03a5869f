//! Curated API for the CLI and other in-repo callers (UNSTABLE).
//!
//! Prefer these re-exports for consistency across callers. Breaking changes are
//! allowed.

// Direction pool and default orders
pub use crate::direction::{Direction, Pool, UnknownDirection, DIRECTION_COUNT};
pub use crate::diversity::diverse_default_dirs;
// Direction grids
pub use crate::matrix::{
    conform_grid, dedup_grid, diverse_default_grid, ensure_row_unique, resize_doe,
    resize_repeat, resize_sequence, rotate, unique_row_capacity, DoeGrid, Row, StillDuplicate,
};
// Sampling and impact points
pub use crate::layout::{calculate_grid_dimensions, generate_grid_locations, GridLayout, Location};
pub use crate::sampling::{
    generate_lhs_variations, lhs_in_range, random_impact_locations, SeedToken,
};
// Attitudes and tolerance
pub use crate::attitude::{
    generate_edge_rotation_attitudes, generate_predefined_attitudes, Attitude, AttitudeSet,
    EdgeAxis, PredefinedMode,
};
pub use crate::tolerance::{perturb_attitudes, AngleOffset, ToleranceSettings};
// Pattern matching
pub use crate::pattern::{
    matches_any_pattern, matches_package_pattern, select_targets, PatternSet,
    DEFAULT_PACKAGE_PATTERN,
};
// Scenarios
pub use crate::notice::{Generated, Notice};
pub use crate::scenario::{
    AnalysisType, Attachment, EditError, ImportError, ScenarioCollection, ScenarioEdit,
    ScenarioParams, ScenarioRecord, StandardScenario, SubmissionEntry, SubmissionSink,
    SubmitCfg, SubmitError, MAX_COUNT, MAX_REPEAT_COUNT,
};
