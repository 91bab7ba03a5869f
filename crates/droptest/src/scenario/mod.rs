//! Scenario records: the unit of configuration threaded through the generators.
//!
//! Model
//! - A `ScenarioRecord` is an immutable value. Edits consume a record and return a new
//!   one (`ScenarioRecord::apply`), re-deriving only the grid/attitude/location structure
//!   the edit touches.
//! - The analysis type is carried by the params variant, so the two cannot disagree.
//!   Changing the type replaces the params with that mode's defaults.
//! - Cross-record links ("use prior result") are stored as the other record's id and
//!   resolved by lookup at submission time.
//!
//! JSON shape
//! - `{ id, name, analysisType, params, fileName?, objFileName? }`, `params` being the
//!   mode's parameter block in camelCase.

mod collection;
mod edit;
mod params;
mod submit;

pub use collection::{ImportError, ScenarioCollection, StandardScenario};
pub use edit::{EditError, ScenarioEdit};
pub use params::{
    AngleFile, AngleSource, DirectionGridParams, DropSetup, EdgeRotationParams, FullAngleParams,
    HeightMode, ImpactParams, ImpactorType, LocationMode, MultiRepeatParams, PredefinedParams,
    Surface, MAX_COUNT, MAX_REPEAT_COUNT,
};
pub use submit::{
    PrevResult, ResolvedCell, ResolvedDrop, ResolvedImpact, ResolvedParams, SubmissionEntry,
    SubmissionSink, SubmitCfg, SubmitError,
};

use crate::notice::Generated;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// The seven analysis modes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisType {
    #[default]
    #[serde(rename = "fullAngleMBD")]
    FullAngleMbd,
    #[serde(rename = "fullAngle")]
    FullAngle,
    #[serde(rename = "fullAngleCumulative")]
    FullAngleCumulative,
    #[serde(rename = "multiRepeatCumulative")]
    MultiRepeatCumulative,
    #[serde(rename = "dropWeightImpact")]
    DropWeightImpact,
    #[serde(rename = "predefinedAttitudes")]
    PredefinedAttitudes,
    #[serde(rename = "edgeAxisRotation")]
    EdgeAxisRotation,
}

impl AnalysisType {
    pub const ALL: [AnalysisType; 7] = [
        AnalysisType::FullAngleMbd,
        AnalysisType::FullAngle,
        AnalysisType::FullAngleCumulative,
        AnalysisType::MultiRepeatCumulative,
        AnalysisType::DropWeightImpact,
        AnalysisType::PredefinedAttitudes,
        AnalysisType::EdgeAxisRotation,
    ];

    /// Wire name, e.g. `"fullAngleMBD"`.
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisType::FullAngleMbd => "fullAngleMBD",
            AnalysisType::FullAngle => "fullAngle",
            AnalysisType::FullAngleCumulative => "fullAngleCumulative",
            AnalysisType::MultiRepeatCumulative => "multiRepeatCumulative",
            AnalysisType::DropWeightImpact => "dropWeightImpact",
            AnalysisType::PredefinedAttitudes => "predefinedAttitudes",
            AnalysisType::EdgeAxisRotation => "edgeAxisRotation",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            AnalysisType::FullAngleMbd => "Full-Angle Drop (MBD)",
            AnalysisType::FullAngle => "Full-Angle Drop",
            AnalysisType::FullAngleCumulative => "Full-Angle Cumulative Drop",
            AnalysisType::MultiRepeatCumulative => "Multi-Repeat Cumulative Drop",
            AnalysisType::DropWeightImpact => "Drop-Weight Impact",
            AnalysisType::PredefinedAttitudes => "Predefined-Attitude Drop",
            AnalysisType::EdgeAxisRotation => "Edge-Axis Rotation Drop",
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnalysisType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown analysis type `{s}`"))
    }
}

/// Mode-specific parameters; the variant fixes the analysis type.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScenarioParams {
    FullAngleMbd(DirectionGridParams),
    FullAngle(FullAngleParams),
    FullAngleCumulative(DirectionGridParams),
    MultiRepeatCumulative(MultiRepeatParams),
    DropWeightImpact(ImpactParams),
    PredefinedAttitudes(PredefinedParams),
    EdgeAxisRotation(EdgeRotationParams),
}

impl ScenarioParams {
    /// Defaults seeded for a freshly created (or re-typed) record.
    pub fn default_for(t: AnalysisType) -> Self {
        match t {
            AnalysisType::FullAngleMbd => Self::FullAngleMbd(DirectionGridParams::default()),
            AnalysisType::FullAngle => Self::FullAngle(FullAngleParams::default()),
            AnalysisType::FullAngleCumulative => {
                Self::FullAngleCumulative(DirectionGridParams::default())
            }
            AnalysisType::MultiRepeatCumulative => {
                Self::MultiRepeatCumulative(MultiRepeatParams::default())
            }
            AnalysisType::DropWeightImpact => Self::DropWeightImpact(ImpactParams::default()),
            AnalysisType::PredefinedAttitudes => {
                Self::PredefinedAttitudes(PredefinedParams::default())
            }
            AnalysisType::EdgeAxisRotation => Self::EdgeAxisRotation(EdgeRotationParams::default()),
        }
    }

    pub fn analysis_type(&self) -> AnalysisType {
        match self {
            Self::FullAngleMbd(_) => AnalysisType::FullAngleMbd,
            Self::FullAngle(_) => AnalysisType::FullAngle,
            Self::FullAngleCumulative(_) => AnalysisType::FullAngleCumulative,
            Self::MultiRepeatCumulative(_) => AnalysisType::MultiRepeatCumulative,
            Self::DropWeightImpact(_) => AnalysisType::DropWeightImpact,
            Self::PredefinedAttitudes(_) => AnalysisType::PredefinedAttitudes,
            Self::EdgeAxisRotation(_) => AnalysisType::EdgeAxisRotation,
        }
    }

    /// Parse the params block of a record of type `t`. Missing fields take defaults.
    pub fn from_value(t: AnalysisType, value: serde_json::Value) -> serde_json::Result<Self> {
        use serde_json::from_value;
        Ok(match t {
            AnalysisType::FullAngleMbd => Self::FullAngleMbd(from_value(value)?),
            AnalysisType::FullAngle => Self::FullAngle(from_value(value)?),
            AnalysisType::FullAngleCumulative => Self::FullAngleCumulative(from_value(value)?),
            AnalysisType::MultiRepeatCumulative => Self::MultiRepeatCumulative(from_value(value)?),
            AnalysisType::DropWeightImpact => Self::DropWeightImpact(from_value(value)?),
            AnalysisType::PredefinedAttitudes => Self::PredefinedAttitudes(from_value(value)?),
            AnalysisType::EdgeAxisRotation => Self::EdgeAxisRotation(from_value(value)?),
        })
    }

    /// Make derived structures consistent with their counts; clamp invalid values.
    pub fn normalized(self) -> Generated<Self> {
        match self {
            Self::FullAngleMbd(p) => p.normalized().map(Self::FullAngleMbd),
            Self::FullAngle(p) => p.normalized().map(Self::FullAngle),
            Self::FullAngleCumulative(p) => p.normalized().map(Self::FullAngleCumulative),
            Self::MultiRepeatCumulative(p) => p.normalized().map(Self::MultiRepeatCumulative),
            Self::DropWeightImpact(p) => p.normalized().map(Self::DropWeightImpact),
            Self::PredefinedAttitudes(p) => p.normalized().map(Self::PredefinedAttitudes),
            Self::EdgeAxisRotation(p) => p.normalized().map(Self::EdgeAxisRotation),
        }
    }

    pub fn drop_setup(&self) -> &DropSetup {
        match self {
            Self::FullAngleMbd(p) | Self::FullAngleCumulative(p) => &p.drop,
            Self::FullAngle(p) => &p.drop,
            Self::MultiRepeatCumulative(p) => &p.drop,
            Self::DropWeightImpact(p) => &p.drop,
            Self::PredefinedAttitudes(p) => &p.drop,
            Self::EdgeAxisRotation(p) => &p.drop,
        }
    }

    fn drop_setup_mut(&mut self) -> &mut DropSetup {
        match self {
            Self::FullAngleMbd(p) | Self::FullAngleCumulative(p) => &mut p.drop,
            Self::FullAngle(p) => &mut p.drop,
            Self::MultiRepeatCumulative(p) => &mut p.drop,
            Self::DropWeightImpact(p) => &mut p.drop,
            Self::PredefinedAttitudes(p) => &mut p.drop,
            Self::EdgeAxisRotation(p) => &mut p.drop,
        }
    }
}

/// Kind of an attached file, from its extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttachmentKind {
    /// Solver keyword deck (`.k`, `.key`, `.dyn`).
    Keyword,
    /// Wavefront geometry (`.obj`).
    Obj,
    /// Plain-text angle source (`.json`, `.csv`).
    AngleText,
    Other,
}

/// File handed over by the caller: a name and an opaque blob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn kind(&self) -> AttachmentKind {
        let ext = Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("k" | "key" | "dyn") => AttachmentKind::Keyword,
            Some("obj") => AttachmentKind::Obj,
            Some("json" | "csv") => AttachmentKind::AngleText,
            _ => AttachmentKind::Other,
        }
    }

    /// File name without extension.
    pub fn stem(&self) -> String {
        Path::new(&self.name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone())
    }
}

/// One scenario in a collection. The analysis type is that of `params`.
#[derive(Clone, Debug, PartialEq)]
pub struct ScenarioRecord {
    pub id: String,
    pub name: String,
    pub params: ScenarioParams,
    pub file_name: Option<String>,
    pub obj_file_name: Option<String>,
}

impl ScenarioRecord {
    /// Record with default params for `t`.
    pub fn new(id: impl Into<String>, name: impl Into<String>, t: AnalysisType) -> Self {
        Self::from_params(id, name, ScenarioParams::default_for(t))
    }

    pub fn from_params(
        id: impl Into<String>,
        name: impl Into<String>,
        params: ScenarioParams,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            params,
            file_name: None,
            obj_file_name: None,
        }
    }

    #[inline]
    pub fn analysis_type(&self) -> AnalysisType {
        self.params.analysis_type()
    }

    /// Label for the submission payload. A `fullAngle` study seeded from a prior
    /// result is a cumulative drop.
    pub fn analysis_label(&self) -> &'static str {
        match &self.params {
            ScenarioParams::FullAngle(p) if p.angle_source == AngleSource::UsePrevResult => {
                "Cumulative Full-Angle Drop"
            }
            _ => self.analysis_type().label(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordOut<'a> {
    id: &'a str,
    name: &'a str,
    analysis_type: AnalysisType,
    params: &'a ScenarioParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    obj_file_name: Option<&'a str>,
}

impl Serialize for ScenarioRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RecordOut {
            id: &self.id,
            name: &self.name,
            analysis_type: self.analysis_type(),
            params: &self.params,
            file_name: self.file_name.as_deref(),
            obj_file_name: self.obj_file_name.as_deref(),
        }
        .serialize(serializer)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordIn {
    id: String,
    #[serde(default)]
    name: String,
    analysis_type: AnalysisType,
    #[serde(default)]
    params: serde_json::Value,
    #[serde(default)]
    file_name: Option<String>,
    #[serde(default)]
    obj_file_name: Option<String>,
}

/// Strict form: an unknown `analysisType` is an error. Collection import is lenient
/// instead (see [`ScenarioCollection::import_json`]).
impl<'de> Deserialize<'de> for ScenarioRecord {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RecordIn::deserialize(deserializer)?;
        let params = match raw.params {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            v => v,
        };
        let params = ScenarioParams::from_value(raw.analysis_type, params)
            .map_err(serde::de::Error::custom)?;
        Ok(Self {
            id: raw.id,
            name: raw.name,
            params,
            file_name: raw.file_name,
            obj_file_name: raw.obj_file_name,
        })
    }
}

#[cfg(test)]
mod tests;
