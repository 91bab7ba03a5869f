//! The in-memory scenario collection: ordered records plus an id counter.
//!
//! Ids are `scn-1`, `scn-2`, ... drawn from a counter owned by the collection, skipping
//! ids already present. `clear` and a successful JSON import reset the counter.

use super::edit::{EditError, ScenarioEdit};
use super::params::{
    AngleFile, AngleSource, DirectionGridParams, DropSetup, EdgeRotationParams, FullAngleParams,
    HeightMode, ImpactParams, PredefinedParams,
};
use super::{AnalysisType, Attachment, AttachmentKind, ScenarioParams, ScenarioRecord};
use crate::attitude::{generate_predefined_attitudes, PredefinedMode};
use crate::notice::{Generated, Notice};
use crate::tolerance::ToleranceSettings;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Why an import was rejected. The collection is left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    Malformed(String),
    NotAnArray,
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::Malformed(msg) => write!(f, "malformed scenario JSON: {msg}"),
            ImportError::NotAnArray => write!(f, "scenario JSON must be an array of records"),
        }
    }
}

impl std::error::Error for ImportError {}

/// Ready-made scenario templates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StandardScenario {
    /// Flat drops on all six faces.
    SixFaceDrop,
    /// Every face, edge and corner once.
    AllDirectionDrop,
    /// Twelve steps about the top edge.
    EdgeTumble,
    /// 26 DOE rows × 3 repeats with LHS heights and 5° tolerance.
    MbdScreening,
    /// 10 mm ball onto every `*pkg*` component on a 3 × 3 grid.
    BallImpact,
}

impl StandardScenario {
    pub const ALL: [StandardScenario; 5] = [
        StandardScenario::SixFaceDrop,
        StandardScenario::AllDirectionDrop,
        StandardScenario::EdgeTumble,
        StandardScenario::MbdScreening,
        StandardScenario::BallImpact,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StandardScenario::SixFaceDrop => "six-face",
            StandardScenario::AllDirectionDrop => "all-directions",
            StandardScenario::EdgeTumble => "edge-tumble",
            StandardScenario::MbdScreening => "mbd-screening",
            StandardScenario::BallImpact => "ball-impact",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            StandardScenario::SixFaceDrop => "Six-face drop",
            StandardScenario::AllDirectionDrop => "26-direction drop",
            StandardScenario::EdgeTumble => "Edge tumble",
            StandardScenario::MbdScreening => "MBD screening",
            StandardScenario::BallImpact => "Ball impact",
        }
    }

    pub fn params(self) -> ScenarioParams {
        match self {
            StandardScenario::SixFaceDrop => {
                ScenarioParams::PredefinedAttitudes(PredefinedParams::default())
            }
            StandardScenario::AllDirectionDrop => {
                ScenarioParams::PredefinedAttitudes(PredefinedParams {
                    mode: PredefinedMode::All,
                    attitudes: generate_predefined_attitudes(PredefinedMode::All),
                    ..PredefinedParams::default()
                })
            }
            StandardScenario::EdgeTumble => {
                ScenarioParams::EdgeAxisRotation(EdgeRotationParams::default())
            }
            StandardScenario::MbdScreening => {
                let mut p = DirectionGridParams::with_counts(3, 26).value;
                p.drop = DropSetup {
                    height_mode: HeightMode::Lhs,
                    ..DropSetup::default()
                };
                p.tolerance = ToleranceSettings {
                    enabled: true,
                    ..ToleranceSettings::default()
                };
                ScenarioParams::FullAngleMbd(p)
            }
            StandardScenario::BallImpact => {
                ScenarioParams::DropWeightImpact(ImpactParams::default())
            }
        }
    }
}

impl fmt::Display for StandardScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StandardScenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StandardScenario::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<&str> = StandardScenario::ALL.iter().map(|t| t.as_str()).collect();
                format!("unknown template `{s}` (expected one of {})", names.join(", "))
            })
    }
}

/// Ordered scenario records owned by the caller's session.
#[derive(Clone, Debug, PartialEq)]
pub struct ScenarioCollection {
    records: Vec<ScenarioRecord>,
    next_id: u64,
}

impl Default for ScenarioCollection {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
        }
    }
}

impl ScenarioCollection {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ScenarioRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScenarioRecord> {
        self.records.iter()
    }

    pub fn get(&self, id: &str) -> Option<&ScenarioRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    /// Drop every record and restart ids at `scn-1`.
    pub fn clear(&mut self) {
        self.records.clear();
        self.next_id = 1;
    }

    fn allocate_id(&mut self) -> String {
        loop {
            let id = format!("scn-{}", self.next_id);
            self.next_id += 1;
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    fn insert(&mut self, name: String, params: ScenarioParams) -> &ScenarioRecord {
        let id = self.allocate_id();
        tracing::debug!(%id, analysis = %params.analysis_type(), "create scenario");
        let idx = self.records.len();
        self.records.push(ScenarioRecord::from_params(id, name, params));
        &self.records[idx]
    }

    /// New record with the defaults of `t`.
    pub fn create_empty(&mut self, t: AnalysisType) -> &ScenarioRecord {
        let name = format!("Scenario {}", self.records.len() + 1);
        self.insert(name, ScenarioParams::default_for(t))
    }

    pub fn create_standard(&mut self, template: StandardScenario) -> &ScenarioRecord {
        self.insert(template.title().to_string(), template.params())
    }

    /// New record from an uploaded file.
    ///
    /// Keyword decks and OBJ geometry give a `fullAngleMBD` record that references the
    /// file by name. Angle-source text gives a `fullAngle` record reading its angles from
    /// the file. Empty or unsupported files produce a notice and no record.
    pub fn create_from_file(&mut self, file: Attachment) -> Generated<Option<String>> {
        let refuse =
            |msg: String| Generated::with_notices(None, vec![Notice::validation("file", msg)]);
        if file.bytes.is_empty() {
            return refuse(format!("`{}` is empty", file.name));
        }
        let name = file.stem();
        let (params, file_name, obj_file_name) = match file.kind() {
            AttachmentKind::Keyword => (
                ScenarioParams::default_for(AnalysisType::FullAngleMbd),
                Some(file.name),
                None,
            ),
            AttachmentKind::Obj => (
                ScenarioParams::default_for(AnalysisType::FullAngleMbd),
                None,
                Some(file.name),
            ),
            AttachmentKind::AngleText => {
                let text = match String::from_utf8(file.bytes) {
                    Ok(t) => t,
                    Err(_) => return refuse(format!("`{}` is not UTF-8 text", file.name)),
                };
                let params = FullAngleParams {
                    angle_source: AngleSource::File,
                    angle_file: Some(AngleFile {
                        name: file.name,
                        text,
                    }),
                    ..FullAngleParams::default()
                };
                (ScenarioParams::FullAngle(params), None, None)
            }
            AttachmentKind::Other => {
                return refuse(format!("unsupported file type `{}`", file.name));
            }
        };
        let id = self.allocate_id();
        let mut rec = ScenarioRecord::from_params(id.clone(), name, params);
        rec.file_name = file_name;
        rec.obj_file_name = obj_file_name;
        self.records.push(rec);
        Generated::clean(Some(id))
    }

    /// Apply `edit` to record `id` and store the result.
    pub fn update(&mut self, id: &str, edit: ScenarioEdit) -> Result<Vec<Notice>, EditError> {
        let idx = self
            .position(id)
            .ok_or_else(|| EditError::UnknownRecord(id.to_string()))?;
        let out = self.records[idx].clone().apply(edit)?;
        self.records[idx] = out.value;
        Ok(out.notices)
    }

    pub fn delete(&mut self, id: &str) -> Option<ScenarioRecord> {
        let idx = self.position(id)?;
        Some(self.records.remove(idx))
    }

    pub fn export_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.records)
    }

    /// Replace the whole collection with the records in `text`.
    ///
    /// Malformed JSON or a non-array top level is rejected and the collection is left
    /// as it was. Individual entries are coerced rather than dropped: an unknown
    /// `analysisType` becomes `fullAngleMBD` with default params, missing or duplicate
    /// ids are regenerated, and every coercion is reported as a notice.
    pub fn import_json(&mut self, text: &str) -> Result<Vec<Notice>, ImportError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ImportError::Malformed(e.to_string()))?;
        let Value::Array(entries) = value else {
            return Err(ImportError::NotAnArray);
        };

        let mut notices = Vec::new();
        let mut staged: Vec<(Option<String>, ScenarioRecord)> =
            Vec::with_capacity(entries.len());
        let mut seen: HashSet<String> = HashSet::new();
        for (index, entry) in entries.into_iter().enumerate() {
            let mut note = |message: String| notices.push(Notice::Import { index, message });
            let Value::Object(mut obj) = entry else {
                note("entry is not an object; replaced by a default fullAngleMBD record".into());
                let name = format!("Scenario {}", index + 1);
                let rec = ScenarioRecord::new("", name, AnalysisType::FullAngleMbd);
                staged.push((None, rec));
                continue;
            };

            let id = match obj.remove("id") {
                Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            };
            let id = match id {
                Some(id) if seen.insert(id.clone()) => Some(id),
                Some(id) => {
                    note(format!("duplicate id `{id}`; a new id was assigned"));
                    None
                }
                None => {
                    note("missing id; a new id was assigned".into());
                    None
                }
            };
            let name = match obj.remove("name") {
                Some(Value::String(s)) => s,
                _ => format!("Scenario {}", index + 1),
            };
            let params_value = match obj.remove("params") {
                Some(v @ Value::Object(_)) => v,
                _ => Value::Object(Default::default()),
            };
            let raw_type = obj.remove("analysisType");
            let parsed = raw_type
                .as_ref()
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<AnalysisType>().ok());
            let params = match parsed {
                Some(t) => match ScenarioParams::from_value(t, params_value) {
                    Ok(p) => p,
                    Err(e) => {
                        note(format!("params for {t} could not be read ({e}); using defaults"));
                        ScenarioParams::default_for(t)
                    }
                },
                None => {
                    let shown = raw_type
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "missing".into());
                    note(format!(
                        "unknown analysisType {shown}; using {} with default params",
                        AnalysisType::FullAngleMbd
                    ));
                    ScenarioParams::default_for(AnalysisType::FullAngleMbd)
                }
            };
            let params = params.normalized();
            notices.extend(params.notices);

            let mut rec = ScenarioRecord::from_params(String::new(), name, params.value);
            rec.file_name = take_string(&mut obj, "fileName");
            rec.obj_file_name = take_string(&mut obj, "objFileName");
            staged.push((id, rec));
        }

        let mut fresh = ScenarioCollection::new();
        fresh.records = staged
            .iter()
            .filter_map(|(id, rec)| id.clone().map(|id| ScenarioRecord { id, ..rec.clone() }))
            .collect();
        let mut records = Vec::with_capacity(staged.len());
        for (id, mut rec) in staged {
            rec.id = match id {
                Some(id) => id,
                None => fresh.allocate_id(),
            };
            records.push(rec);
        }
        fresh.records = records;

        // Self-references only show up once ids are final.
        for rec in &mut fresh.records {
            let ScenarioParams::FullAngle(p) = &mut rec.params else {
                continue;
            };
            if p.angle_source == AngleSource::UsePrevResult
                && p.prev_result_id.as_deref() == Some(rec.id.as_str())
            {
                notices.push(Notice::validation(
                    "prevResultId",
                    format!(
                        "`{}` cannot use its own result; falling back to generated angles",
                        rec.id
                    ),
                ));
                p.angle_source = AngleSource::Generated;
                p.prev_result_id = None;
            }
        }

        for n in &notices {
            tracing::warn!("{n}");
        }
        tracing::debug!(records = fresh.len(), "imported scenario collection");
        *self = fresh;
        Ok(notices)
    }
}

fn take_string(obj: &mut serde_json::Map<String, Value>, key: &str) -> Option<String> {
    match obj.remove(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    }
}
