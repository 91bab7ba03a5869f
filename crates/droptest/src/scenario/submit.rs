//! Projection of selected records into the job-queue payload.
//!
//! Model
//! - Every randomized field (LHS heights, tolerance offsets, random impact points) is
//!   drawn here, from one `StdRng` per record seeded by `SeedToken { seed, index }` with
//!   `index` the record's position in the collection. A seed therefore reproduces the
//!   payload exactly.
//! - "Use prior result" links are looked up by id at this point and nowhere else.
//! - An empty `percentage` location list is filled from the grid layout in the payload
//!   only; the stored record is not touched.

use super::params::{AngleFile, AngleSource, DropSetup, ImpactorType, LocationMode};
use super::{AnalysisType, ScenarioCollection, ScenarioParams, ScenarioRecord};
use crate::attitude::{Attitude, AttitudeSet};
use crate::direction::{Direction, Pool};
use crate::layout::Location;
use crate::matrix::Row;
use crate::pattern::select_targets;
use crate::sampling::{random_impact_locations, SeedToken};
use crate::tolerance::{draw_pool_offsets, perturb_attitudes, ToleranceSettings};
use rand::Rng;
use serde::Serialize;
use std::convert::Infallible;
use std::fmt;

/// Submission settings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmitCfg {
    pub seed: u64,
    /// Component names of the device; enables impact-target selection when non-empty.
    pub components: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    UnknownRecord(String),
    UnknownReference { record: String, target: String },
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::UnknownRecord(id) => write!(f, "no scenario with id `{id}`"),
            SubmitError::UnknownReference { record, target } => write!(
                f,
                "scenario `{record}` uses the result of `{target}`, which does not exist"
            ),
        }
    }
}

impl std::error::Error for SubmitError {}

/// One resolved attitude: nominal angles plus any tolerance offset.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedCell {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    pub name: String,
    pub phi: f64,
    pub theta: f64,
    pub psi: f64,
}

impl From<Attitude> for ResolvedCell {
    fn from(a: Attitude) -> Self {
        Self {
            direction: a.name.parse().ok(),
            name: a.name,
            phi: a.phi,
            theta: a.theta,
            psi: a.psi,
        }
    }
}

/// One solver case: a height, the attitudes dropped in sequence, and for impact
/// studies the impact point.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedDrop {
    pub height: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attitudes: Vec<ResolvedCell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrevResult {
    pub id: String,
    pub name: String,
    pub analysis_type: AnalysisType,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedImpact {
    pub impactor_type: ImpactorType,
    pub diameter: f64,
    pub package_patterns: Vec<String>,
    /// Components matched by the patterns; absent when no component list was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<String>>,
}

/// Fully resolved parameters of one record.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedParams {
    /// Height setup and impact surface.
    pub drop: DropSetup,
    pub drops: Vec<ResolvedDrop>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle_source: Option<AngleSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle_file: Option<AngleFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_result: Option<PrevResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<ResolvedImpact>,
}

impl ResolvedParams {
    fn new(drop: DropSetup, drops: Vec<ResolvedDrop>) -> Self {
        Self {
            drop,
            drops,
            angle_source: None,
            angle_file: None,
            prev_result: None,
            impact: None,
        }
    }
}

/// One payload entry.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionEntry {
    pub id: String,
    pub name: String,
    pub analysis_type: AnalysisType,
    pub analysis_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obj_file_name: Option<String>,
    pub params: ResolvedParams,
}

/// Where payloads go: a job queue, a file, or a test buffer.
pub trait SubmissionSink {
    type Error;

    fn send(&mut self, entries: Vec<SubmissionEntry>) -> Result<(), Self::Error>;
}

impl SubmissionSink for Vec<SubmissionEntry> {
    type Error = Infallible;

    fn send(&mut self, entries: Vec<SubmissionEntry>) -> Result<(), Self::Error> {
        self.extend(entries);
        Ok(())
    }
}

/// Rows of directions → per-cell nominal attitudes with pool tolerance applied.
fn resolve_rows<R: Rng + ?Sized>(
    rng: &mut R,
    rows: &[Row],
    tolerance: &ToleranceSettings,
) -> Vec<Vec<ResolvedCell>> {
    let pools: Vec<Option<Pool>> = rows.iter().flatten().map(|d| Some(d.pool())).collect();
    let mut offsets = draw_pool_offsets(rng, &pools, tolerance).into_iter();
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|&d| {
                    let [phi, theta, psi] = d.nominal_angles();
                    let o = offsets.next().unwrap_or_default();
                    ResolvedCell {
                        direction: Some(d),
                        name: d.code().to_string(),
                        phi: phi + o.d_phi,
                        theta: theta + o.d_theta,
                        psi: psi + o.d_psi,
                    }
                })
                .collect()
        })
        .collect()
}

/// One drop per row, heights drawn over the row count.
fn drops_from_rows<R: Rng + ?Sized>(
    rng: &mut R,
    drop: &DropSetup,
    rows: Vec<Vec<ResolvedCell>>,
) -> Vec<ResolvedDrop> {
    let heights = drop.heights(rng, rows.len());
    heights
        .into_iter()
        .zip(rows)
        .map(|(height, attitudes)| ResolvedDrop {
            height,
            attitudes,
            location: None,
        })
        .collect()
}

fn drops_from_attitudes<R: Rng + ?Sized>(
    rng: &mut R,
    drop: &DropSetup,
    set: AttitudeSet,
) -> Vec<ResolvedDrop> {
    let rows = set.entries.into_iter().map(|a| vec![a.into()]).collect();
    drops_from_rows(rng, drop, rows)
}

impl ScenarioCollection {
    /// Resolve `rec` (stored at `index`) into its payload entry.
    pub fn resolve(
        &self,
        rec: &ScenarioRecord,
        index: usize,
        cfg: &SubmitCfg,
    ) -> Result<SubmissionEntry, SubmitError> {
        let mut rng = SeedToken::new(cfg.seed, index as u64).to_std_rng();
        let rng = &mut rng;
        let params = match &rec.params {
            ScenarioParams::FullAngleMbd(p) | ScenarioParams::FullAngleCumulative(p) => {
                let rows = resolve_rows(rng, &p.grid.rows, &p.tolerance);
                ResolvedParams::new(p.drop, drops_from_rows(rng, &p.drop, rows))
            }
            ScenarioParams::FullAngle(p) => {
                let drops = match p.angle_source {
                    AngleSource::File if p.angle_file.is_some() => Vec::new(),
                    _ => {
                        let rows = resolve_rows(rng, &p.grid.rows, &p.tolerance);
                        drops_from_rows(rng, &p.drop, rows)
                    }
                };
                let mut out = ResolvedParams::new(p.drop, drops);
                out.angle_source = Some(p.angle_source);
                if p.angle_source == AngleSource::File {
                    out.angle_file = p.angle_file.clone();
                }
                if p.angle_source == AngleSource::UsePrevResult {
                    let target = p.prev_result_id.clone().unwrap_or_default();
                    let prev = self.get(&target).ok_or_else(|| SubmitError::UnknownReference {
                        record: rec.id.clone(),
                        target: target.clone(),
                    })?;
                    out.prev_result = Some(PrevResult {
                        id: prev.id.clone(),
                        name: prev.name.clone(),
                        analysis_type: prev.analysis_type(),
                    });
                }
                out
            }
            ScenarioParams::MultiRepeatCumulative(p) => {
                let rows: Vec<Row> = p.sequence.iter().map(|d| vec![*d]).collect();
                let cells = resolve_rows(rng, &rows, &p.tolerance);
                ResolvedParams::new(p.drop, drops_from_rows(rng, &p.drop, cells))
            }
            ScenarioParams::PredefinedAttitudes(p) => {
                let set = perturb_attitudes(rng, &p.attitudes, &p.tolerance);
                ResolvedParams::new(p.drop, drops_from_attitudes(rng, &p.drop, set))
            }
            ScenarioParams::EdgeAxisRotation(p) => {
                ResolvedParams::new(p.drop, drops_from_attitudes(rng, &p.drop, p.attitudes.clone()))
            }
            ScenarioParams::DropWeightImpact(p) => {
                let locations = match p.location_mode {
                    LocationMode::Grid => p.grid_mode.locations(),
                    LocationMode::Percentage if p.locations.is_empty() => {
                        tracing::debug!(id = %rec.id, "empty percentage locations, using layout");
                        p.grid_mode.locations()
                    }
                    LocationMode::Percentage => p.locations.clone(),
                    LocationMode::Random => random_impact_locations(rng, p.random_count),
                };
                let heights = p.drop.heights(rng, locations.len());
                let drops = heights
                    .into_iter()
                    .zip(locations)
                    .map(|(height, loc)| ResolvedDrop {
                        height,
                        attitudes: Vec::new(),
                        location: Some(loc),
                    })
                    .collect();
                let mut out = ResolvedParams::new(p.drop, drops);
                out.impact = Some(ResolvedImpact {
                    impactor_type: p.impactor_type,
                    diameter: p.diameter,
                    package_patterns: p.package_patterns.clone(),
                    targets: (!cfg.components.is_empty())
                        .then(|| select_targets(&cfg.components, &p.package_patterns)),
                });
                out
            }
        };
        Ok(SubmissionEntry {
            id: rec.id.clone(),
            name: rec.name.clone(),
            analysis_type: rec.analysis_type(),
            analysis_label: rec.analysis_label().to_string(),
            file_name: rec.file_name.clone(),
            obj_file_name: rec.obj_file_name.clone(),
            params,
        })
    }

    /// Payload for the records `ids`, in the given order.
    pub fn submit<S: AsRef<str>>(
        &self,
        ids: &[S],
        cfg: &SubmitCfg,
    ) -> Result<Vec<SubmissionEntry>, SubmitError> {
        ids.iter()
            .map(|id| {
                let id = id.as_ref();
                let index = self
                    .position(id)
                    .ok_or_else(|| SubmitError::UnknownRecord(id.to_string()))?;
                self.resolve(&self.records()[index], index, cfg)
            })
            .collect()
    }

    /// Payload for every record.
    pub fn submit_all(&self, cfg: &SubmitCfg) -> Result<Vec<SubmissionEntry>, SubmitError> {
        self.iter()
            .enumerate()
            .map(|(i, rec)| self.resolve(rec, i, cfg))
            .collect()
    }
}
