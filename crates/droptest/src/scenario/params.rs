//! Per-mode parameter blocks and their defaults.

use crate::attitude::{
    generate_edge_rotation_attitudes, generate_predefined_attitudes, AttitudeSet, EdgeAxis,
    PredefinedMode,
};
use crate::direction::Direction;
use crate::diversity::diverse_default_dirs;
use crate::layout::{GridLayout, Location};
use crate::matrix::{conform_grid, dedup_grid, diverse_default_grid, resize_sequence, DoeGrid};
use crate::notice::{Generated, Notice};
use crate::pattern::{normalize_patterns, DEFAULT_PACKAGE_PATTERN};
use crate::sampling::lhs_in_range;
use crate::tolerance::ToleranceSettings;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Largest accepted DOE, sample, division or impact-point count.
pub const MAX_COUNT: usize = 10_000;
/// Largest accepted repeat count (drops per device).
pub const MAX_REPEAT_COUNT: usize = 100;

/// How drop heights are chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeightMode {
    #[default]
    #[serde(rename = "const")]
    Const,
    #[serde(rename = "lhs", alias = "LHS")]
    Lhs,
}

/// Impact surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Surface {
    #[default]
    SteelPlate,
    PavingBlock,
    Concrete,
    Wood,
}

/// Height and surface shared by every drop-style mode. Heights in metres.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DropSetup {
    pub height_mode: HeightMode,
    pub height_const: f64,
    pub height_min: f64,
    pub height_max: f64,
    pub surface: Surface,
}

impl Default for DropSetup {
    fn default() -> Self {
        Self {
            height_mode: HeightMode::Const,
            height_const: 1.0,
            height_min: 0.5,
            height_max: 1.5,
            surface: Surface::SteelPlate,
        }
    }
}

impl DropSetup {
    /// Reason the setup is unusable, if any.
    pub fn problem(&self) -> Option<String> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        match self.height_mode {
            HeightMode::Const if !positive(self.height_const) => {
                Some(format!("heightConst must be > 0 (got {})", self.height_const))
            }
            HeightMode::Lhs if !(positive(self.height_min) && positive(self.height_max)) => Some(
                format!(
                    "heightMin/heightMax must be > 0 (got {}..{})",
                    self.height_min, self.height_max
                ),
            ),
            HeightMode::Lhs if self.height_min > self.height_max => Some(format!(
                "heightMin {} exceeds heightMax {}",
                self.height_min, self.height_max
            )),
            _ => None,
        }
    }

    /// `count` drop heights: the constant repeated, or one LHS draw over `[min, max]`.
    pub fn heights<R: Rng + ?Sized>(&self, rng: &mut R, count: usize) -> Vec<f64> {
        match self.height_mode {
            HeightMode::Const => vec![self.height_const; count],
            HeightMode::Lhs => lhs_in_range(rng, count, self.height_min, self.height_max),
        }
    }
}

/// Direction grid for `fullAngleMBD` and `fullAngleCumulative`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DirectionGridParams {
    pub drop: DropSetup,
    pub repeat_count: usize,
    pub doe_count: usize,
    pub grid: DoeGrid,
    pub tolerance: ToleranceSettings,
}

impl DirectionGridParams {
    pub fn with_counts(repeat: usize, doe: usize) -> Generated<Self> {
        diverse_default_grid(repeat, doe).map(|grid| Self {
            drop: DropSetup::default(),
            repeat_count: repeat,
            doe_count: doe,
            grid,
            tolerance: ToleranceSettings::default(),
        })
    }
}

impl Default for DirectionGridParams {
    fn default() -> Self {
        Self::with_counts(3, 5).value
    }
}

/// Where a `fullAngle` study takes its starting attitudes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AngleSource {
    #[default]
    Generated,
    UsePrevResult,
    File,
}

/// Plain-text angle-source file (`.json` / `.csv`) kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AngleFile {
    pub name: String,
    pub text: String,
}

/// Single-drop full-angle study: one direction per DOE row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FullAngleParams {
    pub drop: DropSetup,
    pub doe_count: usize,
    pub grid: DoeGrid,
    pub tolerance: ToleranceSettings,
    pub angle_source: AngleSource,
    /// Id of the record whose result seeds this one (`usePrevResult`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_result_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle_file: Option<AngleFile>,
}

impl Default for FullAngleParams {
    fn default() -> Self {
        Self {
            drop: DropSetup::default(),
            doe_count: 10,
            grid: diverse_default_grid(1, 10).value,
            tolerance: ToleranceSettings::default(),
            angle_source: AngleSource::Generated,
            prev_result_id: None,
            angle_file: None,
        }
    }
}

/// One device dropped `repeat_count` times in sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MultiRepeatParams {
    pub drop: DropSetup,
    pub repeat_count: usize,
    pub sequence: Vec<Direction>,
    pub tolerance: ToleranceSettings,
}

impl Default for MultiRepeatParams {
    fn default() -> Self {
        Self {
            drop: DropSetup::default(),
            repeat_count: 6,
            sequence: diverse_default_dirs(6),
            tolerance: ToleranceSettings::default(),
        }
    }
}

/// How impact points are chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LocationMode {
    #[default]
    Grid,
    Percentage,
    Random,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImpactorType {
    #[default]
    Ball,
    Cylinder,
}

/// Drop-weight impact: an impactor falls onto selected packages of the device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImpactParams {
    pub drop: DropSetup,
    pub package_patterns: Vec<String>,
    pub location_mode: LocationMode,
    pub grid_mode: GridLayout,
    /// Percentages in `[0, 100]`.
    pub locations: Vec<Location>,
    pub random_count: usize,
    pub impactor_type: ImpactorType,
    /// Impactor diameter in millimetres.
    pub diameter: f64,
}

impl Default for ImpactParams {
    fn default() -> Self {
        let grid_mode = GridLayout::default();
        Self {
            drop: DropSetup {
                height_const: 0.2,
                height_min: 0.1,
                height_max: 0.3,
                ..DropSetup::default()
            },
            package_patterns: vec![DEFAULT_PACKAGE_PATTERN.to_string()],
            location_mode: LocationMode::Grid,
            grid_mode,
            locations: grid_mode.locations(),
            random_count: 9,
            impactor_type: ImpactorType::Ball,
            diameter: 10.0,
        }
    }
}

/// Canonical face/edge/corner poses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PredefinedParams {
    pub drop: DropSetup,
    pub mode: PredefinedMode,
    pub attitudes: AttitudeSet,
    pub tolerance: ToleranceSettings,
}

impl Default for PredefinedParams {
    fn default() -> Self {
        Self {
            drop: DropSetup::default(),
            mode: PredefinedMode::Face,
            attitudes: generate_predefined_attitudes(PredefinedMode::Face),
            tolerance: ToleranceSettings::default(),
        }
    }
}

/// Even angular sweep about one device edge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EdgeRotationParams {
    pub drop: DropSetup,
    pub axis: EdgeAxis,
    pub divisions: usize,
    pub attitudes: AttitudeSet,
}

impl Default for EdgeRotationParams {
    fn default() -> Self {
        Self {
            drop: DropSetup::default(),
            axis: EdgeAxis::Top,
            divisions: 12,
            attitudes: generate_edge_rotation_attitudes(EdgeAxis::Top, 12),
        }
    }
}

/// Shared checks applied after import.
pub(crate) fn normalize_drop(drop: DropSetup, notices: &mut Vec<Notice>) -> DropSetup {
    match drop.problem() {
        Some(msg) => {
            notices.push(Notice::validation("drop", format!("{msg}; using defaults")));
            DropSetup::default()
        }
        None => drop,
    }
}

pub(crate) fn normalize_tolerance(
    tol: ToleranceSettings,
    notices: &mut Vec<Notice>,
) -> ToleranceSettings {
    match tol.invalid_field() {
        Some((field, v)) => {
            notices.push(Notice::validation(
                field,
                format!("tolerance must be a finite value >= 0 (got {v}); using defaults"),
            ));
            ToleranceSettings::default()
        }
        None => tol,
    }
}

/// `n` clamped into `1..=max`, with a notice when it moved.
pub(crate) fn clamp_count(field: &str, n: usize, max: usize, notices: &mut Vec<Notice>) -> usize {
    if n == 0 {
        notices.push(Notice::validation(field, "must be >= 1; using 1"));
        1
    } else if n > max {
        notices.push(Notice::validation(field, format!("must be <= {max}; using {max}")));
        max
    } else {
        n
    }
}

/// Repair duplicate rows of an authored grid.
fn dedup_imported(grid: DoeGrid, notices: &mut Vec<Notice>) -> DoeGrid {
    if grid.duplicate_pairs().is_empty() {
        return grid;
    }
    notices.push(Notice::validation("grid", "duplicate rows were perturbed to be unique"));
    let g = dedup_grid(&grid);
    notices.extend(g.notices);
    g.value
}

impl DirectionGridParams {
    pub(crate) fn normalized(mut self) -> Generated<Self> {
        let mut notices = Vec::new();
        self.drop = normalize_drop(self.drop, &mut notices);
        self.tolerance = normalize_tolerance(self.tolerance, &mut notices);
        self.repeat_count =
            clamp_count("repeatCount", self.repeat_count, MAX_REPEAT_COUNT, &mut notices);
        self.doe_count = clamp_count("doeCount", self.doe_count, MAX_COUNT, &mut notices);
        if self.grid.doe_count() != self.doe_count
            || self.grid.repeat_count() != self.repeat_count
            || !self.grid.is_rectangular()
        {
            let g = conform_grid(&self.grid, self.repeat_count, self.doe_count);
            notices.extend(g.notices);
            self.grid = g.value;
        }
        self.grid = dedup_imported(self.grid, &mut notices);
        Generated::with_notices(self, notices)
    }
}

impl FullAngleParams {
    pub(crate) fn normalized(mut self) -> Generated<Self> {
        let mut notices = Vec::new();
        self.drop = normalize_drop(self.drop, &mut notices);
        self.tolerance = normalize_tolerance(self.tolerance, &mut notices);
        self.doe_count = clamp_count("doeCount", self.doe_count, MAX_COUNT, &mut notices);
        if self.grid.doe_count() != self.doe_count || self.grid.repeat_count() != 1 {
            let g = conform_grid(&self.grid, 1, self.doe_count);
            notices.extend(g.notices);
            self.grid = g.value;
        }
        self.grid = dedup_imported(self.grid, &mut notices);
        match self.angle_source {
            AngleSource::UsePrevResult
                if self.prev_result_id.as_deref().map_or(true, |t| t.trim().is_empty()) =>
            {
                notices.push(Notice::validation(
                    "prevResultId",
                    "usePrevResult needs a source record; falling back to generated angles",
                ));
                self.angle_source = AngleSource::Generated;
                self.prev_result_id = None;
            }
            AngleSource::File if self.angle_file.is_none() => {
                notices.push(Notice::validation(
                    "angleFile",
                    "angleSource is file but no angle file is attached; \
                     falling back to generated angles",
                ));
                self.angle_source = AngleSource::Generated;
            }
            _ => {}
        }
        Generated::with_notices(self, notices)
    }
}

impl MultiRepeatParams {
    pub(crate) fn normalized(mut self) -> Generated<Self> {
        let mut notices = Vec::new();
        self.drop = normalize_drop(self.drop, &mut notices);
        self.tolerance = normalize_tolerance(self.tolerance, &mut notices);
        self.repeat_count =
            clamp_count("repeatCount", self.repeat_count, MAX_REPEAT_COUNT, &mut notices);
        if self.sequence.len() != self.repeat_count {
            self.sequence = resize_sequence(&self.sequence, self.repeat_count);
        }
        Generated::with_notices(self, notices)
    }
}

impl ImpactParams {
    pub(crate) fn normalized(mut self) -> Generated<Self> {
        let mut notices = Vec::new();
        self.drop = normalize_drop(self.drop, &mut notices);
        let pats = normalize_patterns(&self.package_patterns);
        notices.extend(pats.notices);
        self.package_patterns = pats.value;
        if !(self.diameter.is_finite() && self.diameter > 0.0) {
            notices.push(Notice::validation(
                "diameter",
                format!("must be > 0 (got {}); using 10", self.diameter),
            ));
            self.diameter = 10.0;
        }
        if self.locations.iter().any(|l| !l.is_on_part()) {
            notices.push(Notice::validation(
                "locations",
                "coordinates outside [0, 100] were clamped",
            ));
            self.locations = self.locations.iter().map(|l| l.clamped()).collect();
        }
        self.random_count = clamp_count("randomCount", self.random_count, MAX_COUNT, &mut notices);
        if !(1..=MAX_COUNT).contains(&self.grid_mode.point_count()) {
            notices.push(Notice::validation(
                "gridMode",
                format!(
                    "{}x{} layout must hold 1..={MAX_COUNT} points; using the default",
                    self.grid_mode.rows, self.grid_mode.cols
                ),
            ));
            self.grid_mode = GridLayout {
                edge_margin: self.grid_mode.edge_margin,
                ..GridLayout::default()
            };
        }
        if self.locations.len() > MAX_COUNT {
            notices.push(Notice::validation(
                "locations",
                format!("more than {MAX_COUNT} points; extra points dropped"),
            ));
            self.locations.truncate(MAX_COUNT);
        }
        if self.location_mode == LocationMode::Grid {
            self.locations = self.grid_mode.locations();
        }
        Generated::with_notices(self, notices)
    }
}

impl PredefinedParams {
    pub(crate) fn normalized(mut self) -> Generated<Self> {
        let mut notices = Vec::new();
        self.drop = normalize_drop(self.drop, &mut notices);
        self.tolerance = normalize_tolerance(self.tolerance, &mut notices);
        if self.attitudes.is_empty() {
            notices.push(Notice::validation(
                "attitudes",
                "at least one attitude is required; regenerated from mode",
            ));
            self.attitudes = generate_predefined_attitudes(self.mode);
        }
        Generated::with_notices(self, notices)
    }
}

impl EdgeRotationParams {
    pub(crate) fn normalized(mut self) -> Generated<Self> {
        let mut notices = Vec::new();
        self.drop = normalize_drop(self.drop, &mut notices);
        if self.divisions == 0 {
            notices.push(Notice::validation("divisions", "must be >= 1; using 12"));
            self.divisions = 12;
        }
        self.divisions = clamp_count("divisions", self.divisions, MAX_COUNT, &mut notices);
        if self.attitudes.is_empty() {
            notices.push(Notice::validation(
                "attitudes",
                "at least one attitude is required; regenerated from axis",
            ));
            self.attitudes = generate_edge_rotation_attitudes(self.axis, self.divisions);
        }
        Generated::with_notices(self, notices)
    }
}
