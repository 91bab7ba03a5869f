//! Edits on a scenario record.
//!
//! `ScenarioRecord::apply` consumes the record and returns the edited copy. Count
//! changes re-derive only the structure they own (grid, sequence, attitudes, locations)
//! and keep authored entries where the index ranges still overlap.
//!
//! A rejected value (zero count, empty name, bad height) is not an error: the field
//! keeps its prior value and a validation notice is returned. Errors are reserved for
//! edits that do not fit the record at all.

use super::params::{
    AngleFile, AngleSource, DropSetup, ImpactorType, LocationMode, MAX_COUNT, MAX_REPEAT_COUNT,
};
use super::{AnalysisType, Attachment, AttachmentKind, ScenarioParams, ScenarioRecord};
use crate::attitude::{
    generate_edge_rotation_attitudes, generate_predefined_attitudes, Attitude, EdgeAxis,
    PredefinedMode,
};
use crate::direction::Direction;
use crate::layout::{GridLayout, Location};
use crate::matrix::{resize_doe, resize_repeat, resize_sequence, DoeGrid};
use crate::notice::{Generated, Notice};
use crate::pattern::normalize_patterns;
use crate::tolerance::ToleranceSettings;
use std::fmt;

/// Every user edit of a record.
#[derive(Clone, Debug, PartialEq)]
pub enum ScenarioEdit {
    Rename(String),
    /// Replaces the params with the defaults of the new type.
    SetAnalysisType(AnalysisType),
    SetDrop(DropSetup),
    SetTolerance(ToleranceSettings),
    SetRepeatCount(usize),
    SetDoeCount(usize),
    SetCell {
        row: usize,
        col: usize,
        direction: Direction,
    },
    SetSequenceEntry {
        index: usize,
        direction: Direction,
    },
    SetAngleSource {
        source: AngleSource,
        prev_result_id: Option<String>,
    },
    SetPredefinedMode(PredefinedMode),
    /// Regenerate the attitude list from the current mode or axis.
    ResetAttitudes,
    SetEdgeAxis(EdgeAxis),
    SetEdgeDivisions(usize),
    AddAttitude(Attitude),
    RemoveAttitude(usize),
    UpdateAttitude {
        index: usize,
        attitude: Attitude,
    },
    SetPackagePatterns(Vec<String>),
    SetLocationMode(LocationMode),
    SetGridLayout(GridLayout),
    /// Total impact-point count; re-derives the layout.
    SetSampleCount(usize),
    SetLocations(Vec<Location>),
    SetImpactor {
        impactor_type: ImpactorType,
        diameter: f64,
    },
    AttachFile(Attachment),
}

impl ScenarioEdit {
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioEdit::Rename(_) => "rename",
            ScenarioEdit::SetAnalysisType(_) => "setAnalysisType",
            ScenarioEdit::SetDrop(_) => "setDrop",
            ScenarioEdit::SetTolerance(_) => "setTolerance",
            ScenarioEdit::SetRepeatCount(_) => "setRepeatCount",
            ScenarioEdit::SetDoeCount(_) => "setDoeCount",
            ScenarioEdit::SetCell { .. } => "setCell",
            ScenarioEdit::SetSequenceEntry { .. } => "setSequenceEntry",
            ScenarioEdit::SetAngleSource { .. } => "setAngleSource",
            ScenarioEdit::SetPredefinedMode(_) => "setPredefinedMode",
            ScenarioEdit::ResetAttitudes => "resetAttitudes",
            ScenarioEdit::SetEdgeAxis(_) => "setEdgeAxis",
            ScenarioEdit::SetEdgeDivisions(_) => "setEdgeDivisions",
            ScenarioEdit::AddAttitude(_) => "addAttitude",
            ScenarioEdit::RemoveAttitude(_) => "removeAttitude",
            ScenarioEdit::UpdateAttitude { .. } => "updateAttitude",
            ScenarioEdit::SetPackagePatterns(_) => "setPackagePatterns",
            ScenarioEdit::SetLocationMode(_) => "setLocationMode",
            ScenarioEdit::SetGridLayout(_) => "setGridLayout",
            ScenarioEdit::SetSampleCount(_) => "setSampleCount",
            ScenarioEdit::SetLocations(_) => "setLocations",
            ScenarioEdit::SetImpactor { .. } => "setImpactor",
            ScenarioEdit::AttachFile(_) => "attachFile",
        }
    }
}

/// Why an edit could not be applied. The record is unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum EditError {
    NotApplicable {
        edit: &'static str,
        analysis: AnalysisType,
    },
    IndexOut {
        what: &'static str,
        index: usize,
        len: usize,
    },
    InvalidValue {
        reason: String,
    },
    UnknownRecord(String),
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditError::NotApplicable { edit, analysis } => {
                write!(f, "edit `{edit}` does not apply to {analysis} scenarios")
            }
            EditError::IndexOut { what, index, len } => {
                write!(f, "{what} index {index} out of range (len {len})")
            }
            EditError::InvalidValue { reason } => write!(f, "invalid value: {reason}"),
            EditError::UnknownRecord(id) => write!(f, "no scenario with id `{id}`"),
        }
    }
}

impl std::error::Error for EditError {}

fn invalid(reason: impl Into<String>) -> EditError {
    EditError::InvalidValue {
        reason: reason.into(),
    }
}

fn finite_attitude(a: &Attitude) -> Result<(), EditError> {
    if a.angles().iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(invalid(format!("attitude `{}` has non-finite angles", a.name)))
    }
}

/// Set one grid cell unless that would duplicate another row.
fn set_grid_cell(
    grid: &mut DoeGrid,
    row: usize,
    col: usize,
    direction: Direction,
    notices: &mut Vec<Notice>,
) -> Result<(), EditError> {
    let len = grid.doe_count();
    let cols = grid.rows.get(row).map(Vec::len).ok_or(EditError::IndexOut {
        what: "row",
        index: row,
        len,
    })?;
    if col >= cols {
        return Err(EditError::IndexOut {
            what: "column",
            index: col,
            len: cols,
        });
    }
    let mut candidate = grid.rows[row].clone();
    candidate[col] = direction;
    if let Some(other) = grid
        .rows
        .iter()
        .enumerate()
        .position(|(i, r)| i != row && *r == candidate)
    {
        notices.push(Notice::validation(
            "grid",
            format!("row {row} would duplicate row {other}; cell left unchanged"),
        ));
        return Ok(());
    }
    grid.set_cell(row, col, direction);
    Ok(())
}

/// Accept a count ≥ 1, or record a notice and keep the prior value.
fn positive_count(
    field: &str,
    n: usize,
    max: usize,
    notices: &mut Vec<Notice>,
) -> Option<usize> {
    if n == 0 {
        notices.push(Notice::validation(field, "must be >= 1; value unchanged"));
        None
    } else if n > max {
        notices.push(Notice::validation(field, format!("must be <= {max}; value unchanged")));
        None
    } else {
        Some(n)
    }
}

impl ScenarioRecord {
    /// Apply `edit`, returning the new record and any advisories.
    pub fn apply(mut self, edit: ScenarioEdit) -> Result<Generated<Self>, EditError> {
        let analysis = self.analysis_type();
        let not_applicable = EditError::NotApplicable {
            edit: edit.name(),
            analysis,
        };
        let mut notices = Vec::new();
        tracing::debug!(id = %self.id, edit = edit.name(), "apply scenario edit");

        match (edit, &mut self.params) {
            (ScenarioEdit::Rename(name), _) => {
                let name = name.trim();
                if name.is_empty() {
                    notices.push(Notice::validation("name", "must not be empty; value unchanged"));
                } else {
                    self.name = name.to_string();
                }
            }
            (ScenarioEdit::SetAnalysisType(t), params) => {
                if t != analysis {
                    *params = ScenarioParams::default_for(t);
                }
            }
            (ScenarioEdit::SetDrop(drop), params) => match drop.problem() {
                Some(msg) => {
                    notices.push(Notice::validation("drop", format!("{msg}; value unchanged")))
                }
                None => *params.drop_setup_mut() = drop,
            },
            (ScenarioEdit::SetTolerance(tol), params) => {
                let slot = match params {
                    ScenarioParams::FullAngleMbd(p) | ScenarioParams::FullAngleCumulative(p) => {
                        &mut p.tolerance
                    }
                    ScenarioParams::FullAngle(p) => &mut p.tolerance,
                    ScenarioParams::MultiRepeatCumulative(p) => &mut p.tolerance,
                    ScenarioParams::PredefinedAttitudes(p) => &mut p.tolerance,
                    _ => return Err(not_applicable),
                };
                match tol.invalid_field() {
                    Some((field, v)) => notices.push(Notice::validation(
                        field,
                        format!("tolerance must be a finite value >= 0 (got {v}); value unchanged"),
                    )),
                    None => *slot = tol,
                }
            }
            (ScenarioEdit::SetRepeatCount(n), params) => match params {
                ScenarioParams::FullAngleMbd(p) | ScenarioParams::FullAngleCumulative(p) => {
                    let n = positive_count("repeatCount", n, MAX_REPEAT_COUNT, &mut notices);
                    if let Some(n) = n {
                        let g = resize_repeat(&p.grid, n);
                        notices.extend(g.notices);
                        p.grid = g.value;
                        p.repeat_count = n;
                    }
                }
                ScenarioParams::MultiRepeatCumulative(p) => {
                    let n = positive_count("repeatCount", n, MAX_REPEAT_COUNT, &mut notices);
                    if let Some(n) = n {
                        p.sequence = resize_sequence(&p.sequence, n);
                        p.repeat_count = n;
                    }
                }
                _ => return Err(not_applicable),
            },
            (ScenarioEdit::SetDoeCount(n), params) => {
                let (grid, doe, repeat) = match params {
                    ScenarioParams::FullAngleMbd(p) | ScenarioParams::FullAngleCumulative(p) => {
                        (&mut p.grid, &mut p.doe_count, p.repeat_count)
                    }
                    ScenarioParams::FullAngle(p) => (&mut p.grid, &mut p.doe_count, 1),
                    _ => return Err(not_applicable),
                };
                if let Some(n) = positive_count("doeCount", n, MAX_COUNT, &mut notices) {
                    let g = resize_doe(grid, n, repeat);
                    notices.extend(g.notices);
                    *grid = g.value;
                    *doe = n;
                }
            }
            (ScenarioEdit::SetCell { row, col, direction }, params) => {
                let grid = match params {
                    ScenarioParams::FullAngleMbd(p) | ScenarioParams::FullAngleCumulative(p) => {
                        &mut p.grid
                    }
                    ScenarioParams::FullAngle(p) => &mut p.grid,
                    _ => return Err(not_applicable),
                };
                set_grid_cell(grid, row, col, direction, &mut notices)?;
            }
            (ScenarioEdit::SetSequenceEntry { index, direction }, params) => {
                let ScenarioParams::MultiRepeatCumulative(p) = params else {
                    return Err(not_applicable);
                };
                let len = p.sequence.len();
                let slot = p.sequence.get_mut(index).ok_or(EditError::IndexOut {
                    what: "sequence",
                    index,
                    len,
                })?;
                *slot = direction;
            }
            (
                ScenarioEdit::SetAngleSource {
                    source,
                    prev_result_id,
                },
                params,
            ) => {
                let ScenarioParams::FullAngle(p) = params else {
                    return Err(not_applicable);
                };
                match source {
                    AngleSource::UsePrevResult => {
                        let target = prev_result_id
                            .filter(|t| !t.trim().is_empty())
                            .ok_or_else(|| invalid("usePrevResult needs a source record id"))?;
                        if target == self.id {
                            return Err(invalid("a scenario cannot use its own result"));
                        }
                        p.prev_result_id = Some(target);
                        p.angle_source = source;
                    }
                    AngleSource::File if p.angle_file.is_none() => {
                        notices.push(Notice::validation(
                            "angleSource",
                            "no angle file attached; value unchanged",
                        ));
                    }
                    AngleSource::File | AngleSource::Generated => {
                        p.prev_result_id = None;
                        p.angle_source = source;
                    }
                }
            }
            (ScenarioEdit::SetPredefinedMode(mode), params) => {
                let ScenarioParams::PredefinedAttitudes(p) = params else {
                    return Err(not_applicable);
                };
                if mode != p.mode {
                    p.mode = mode;
                    p.attitudes = generate_predefined_attitudes(mode);
                }
            }
            (ScenarioEdit::ResetAttitudes, params) => match params {
                ScenarioParams::PredefinedAttitudes(p) => {
                    p.attitudes = generate_predefined_attitudes(p.mode);
                }
                ScenarioParams::EdgeAxisRotation(p) => {
                    p.attitudes = generate_edge_rotation_attitudes(p.axis, p.divisions);
                }
                _ => return Err(not_applicable),
            },
            (ScenarioEdit::SetEdgeAxis(axis), params) => {
                let ScenarioParams::EdgeAxisRotation(p) = params else {
                    return Err(not_applicable);
                };
                if axis != p.axis {
                    p.axis = axis;
                    p.attitudes = generate_edge_rotation_attitudes(axis, p.divisions);
                }
            }
            (ScenarioEdit::SetEdgeDivisions(n), params) => {
                let ScenarioParams::EdgeAxisRotation(p) = params else {
                    return Err(not_applicable);
                };
                if let Some(n) = positive_count("divisions", n, MAX_COUNT, &mut notices) {
                    p.divisions = n;
                    p.attitudes = generate_edge_rotation_attitudes(p.axis, n);
                }
            }
            (ScenarioEdit::AddAttitude(a), params) => {
                finite_attitude(&a)?;
                match params {
                    ScenarioParams::PredefinedAttitudes(p) => p.attitudes.push(a),
                    ScenarioParams::EdgeAxisRotation(p) => p.attitudes.push(a),
                    _ => return Err(not_applicable),
                }
            }
            (ScenarioEdit::RemoveAttitude(index), params) => {
                let set = match params {
                    ScenarioParams::PredefinedAttitudes(p) => &mut p.attitudes,
                    ScenarioParams::EdgeAxisRotation(p) => &mut p.attitudes,
                    _ => return Err(not_applicable),
                };
                if index >= set.len() {
                    return Err(EditError::IndexOut {
                        what: "attitude",
                        index,
                        len: set.len(),
                    });
                }
                if set.len() == 1 {
                    notices.push(Notice::validation(
                        "attitudes",
                        "at least one attitude is required; entry kept",
                    ));
                } else {
                    set.remove(index);
                }
            }
            (ScenarioEdit::UpdateAttitude { index, attitude }, params) => {
                finite_attitude(&attitude)?;
                let set = match params {
                    ScenarioParams::PredefinedAttitudes(p) => &mut p.attitudes,
                    ScenarioParams::EdgeAxisRotation(p) => &mut p.attitudes,
                    _ => return Err(not_applicable),
                };
                let len = set.len();
                set.replace(index, attitude).ok_or(EditError::IndexOut {
                    what: "attitude",
                    index,
                    len,
                })?;
            }
            (ScenarioEdit::SetPackagePatterns(raw), params) => {
                let ScenarioParams::DropWeightImpact(p) = params else {
                    return Err(not_applicable);
                };
                let pats = normalize_patterns(&raw);
                notices.extend(pats.notices);
                p.package_patterns = pats.value;
            }
            (ScenarioEdit::SetLocationMode(mode), params) => {
                let ScenarioParams::DropWeightImpact(p) = params else {
                    return Err(not_applicable);
                };
                p.location_mode = mode;
                if mode == LocationMode::Grid {
                    p.locations = p.grid_mode.locations();
                }
            }
            (ScenarioEdit::SetGridLayout(layout), params) => {
                let ScenarioParams::DropWeightImpact(p) = params else {
                    return Err(not_applicable);
                };
                if !(1..=MAX_COUNT).contains(&layout.point_count()) {
                    notices.push(Notice::validation(
                        "gridMode",
                        format!("layout must hold 1..={MAX_COUNT} points; value unchanged"),
                    ));
                } else {
                    p.grid_mode = layout;
                    if p.location_mode == LocationMode::Grid {
                        p.locations = layout.locations();
                    }
                }
            }
            (ScenarioEdit::SetSampleCount(n), params) => {
                let ScenarioParams::DropWeightImpact(p) = params else {
                    return Err(not_applicable);
                };
                if let Some(n) = positive_count("sampleCount", n, MAX_COUNT, &mut notices) {
                    match p.location_mode {
                        LocationMode::Grid => {
                            p.grid_mode = GridLayout::for_count(n, p.grid_mode.edge_margin);
                            p.locations = p.grid_mode.locations();
                        }
                        LocationMode::Random => p.random_count = n,
                        LocationMode::Percentage => {
                            // Keep authored points; extend from the layout for the new count.
                            let layout = GridLayout::for_count(n, p.grid_mode.edge_margin);
                            let fill = layout.locations();
                            p.locations.truncate(n);
                            let have = p.locations.len();
                            p.locations.extend(fill.into_iter().skip(have).take(n - have));
                            p.grid_mode = layout;
                        }
                    }
                }
            }
            (ScenarioEdit::SetLocations(locs), params) => {
                let ScenarioParams::DropWeightImpact(p) = params else {
                    return Err(not_applicable);
                };
                if locs.iter().any(|l| !(l.x.is_finite() && l.y.is_finite())) {
                    return Err(invalid("locations must be finite"));
                }
                if locs.iter().any(|l| !l.is_on_part()) {
                    notices.push(Notice::validation(
                        "locations",
                        "coordinates outside [0, 100] were clamped",
                    ));
                }
                p.locations = locs.into_iter().map(Location::clamped).collect();
                p.location_mode = LocationMode::Percentage;
            }
            (
                ScenarioEdit::SetImpactor {
                    impactor_type,
                    diameter,
                },
                params,
            ) => {
                let ScenarioParams::DropWeightImpact(p) = params else {
                    return Err(not_applicable);
                };
                p.impactor_type = impactor_type;
                if diameter.is_finite() && diameter > 0.0 {
                    p.diameter = diameter;
                } else {
                    notices.push(Notice::validation(
                        "diameter",
                        format!("must be > 0 (got {diameter}); value unchanged"),
                    ));
                }
            }
            (ScenarioEdit::AttachFile(file), params) => {
                if file.bytes.is_empty() {
                    notices.push(Notice::validation(
                        "file",
                        format!("`{}` is empty; not attached", file.name),
                    ));
                } else {
                    match file.kind() {
                        AttachmentKind::Keyword => self.file_name = Some(file.name),
                        AttachmentKind::Obj => self.obj_file_name = Some(file.name),
                        AttachmentKind::AngleText => {
                            let ScenarioParams::FullAngle(p) = params else {
                                return Err(not_applicable);
                            };
                            let name = file.name;
                            let text = String::from_utf8(file.bytes)
                                .map_err(|_| invalid(format!("`{name}` is not UTF-8 text")))?;
                            p.angle_file = Some(AngleFile { name, text });
                            p.angle_source = AngleSource::File;
                            p.prev_result_id = None;
                        }
                        AttachmentKind::Other => {
                            return Err(invalid(format!("unsupported file type `{}`", file.name)))
                        }
                    }
                }
            }
        }

        for n in &notices {
            tracing::warn!(id = %self.id, "{n}");
        }
        Ok(Generated::with_notices(self, notices))
    }
}
