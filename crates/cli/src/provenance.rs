use anyhow::{Context, Result};
use droptest::api::{SubmissionEntry, SubmissionSink};
use serde_json::{json, Value};
use std::ffi::OsString;
use std::fs;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Metadata used to generate a provenance sidecar.
pub struct Payload {
    pub params: Value,
    pub seed: Option<u64>,
}

impl Payload {
    pub fn new(params: Value) -> Self {
        Self { params, seed: None }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Write `<artifact>.provenance.json` containing the git commit, callsite, seed, params,
/// and outputs.
#[track_caller]
pub fn write_sidecar<P: AsRef<Path>>(artifact: P, payload: Payload) -> Result<PathBuf> {
    let artifact = artifact.as_ref();
    let provenance_path = provenance_path(artifact);
    if let Some(parent) = provenance_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating provenance dir {}", parent.display()))?;
        }
    }

    let callsite = Location::caller();
    let doc = json!({
        "code_rev": current_git_rev(),
        "engine": droptest::VERSION,
        "callsite": {
            "file": callsite.file(),
            "line": callsite.line()
        },
        "seed": payload.seed,
        "params": payload.params,
        "outputs": [artifact.to_string_lossy()]
    });
    fs::write(&provenance_path, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing {}", provenance_path.display()))?;
    Ok(provenance_path)
}

fn provenance_path(artifact: &Path) -> PathBuf {
    let stem = artifact
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| OsString::from("artifact"));
    let mut name = stem;
    name.push(".provenance.json");
    artifact.with_file_name(name)
}

pub fn current_git_rev() -> String {
    if let Some(from_env) = option_env!("GIT_COMMIT") {
        if !from_env.is_empty() {
            return from_env.to_string();
        }
    }
    if let Ok(env_override) = std::env::var("GIT_COMMIT") {
        if !env_override.is_empty() {
            return env_override;
        }
    }
    Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                String::from_utf8(output.stdout)
                    .ok()
                    .map(|s| s.trim().to_string())
            } else {
                None
            }
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Create the parent directory of `path` if needed.
pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output dir {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Job-queue stand-in: writes the payload as a JSON array plus a provenance sidecar.
pub struct JsonFileSink {
    path: PathBuf,
    seed: u64,
    params: Value,
    written: Option<PathBuf>,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>, seed: u64, params: Value) -> Self {
        Self {
            path: path.into(),
            seed,
            params,
            written: None,
        }
    }

    /// Sidecar path of the last successful `send`.
    pub fn sidecar(&self) -> Option<&Path> {
        self.written.as_deref()
    }
}

impl SubmissionSink for JsonFileSink {
    type Error = anyhow::Error;

    fn send(&mut self, entries: Vec<SubmissionEntry>) -> Result<()> {
        ensure_parent(&self.path)?;
        let body = serde_json::to_vec_pretty(&entries)?;
        fs::write(&self.path, body)
            .with_context(|| format!("writing payload {}", self.path.display()))?;
        let mut params = self.params.clone();
        if let Value::Object(map) = &mut params {
            map.insert("entries".into(), json!(entries.len()));
            map.insert(
                "ids".into(),
                json!(entries.iter().map(|e| e.id.as_str()).collect::<Vec<_>>()),
            );
        }
        let sidecar = write_sidecar(&self.path, Payload::new(params).with_seed(self.seed))?;
        tracing::info!(
            out = %self.path.display(),
            entries = entries.len(),
            "payload_written"
        );
        self.written = Some(sidecar);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use droptest::api::{ScenarioCollection, StandardScenario, SubmitCfg};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn provenance_path_rewrites_extension() {
        let base = Path::new("/tmp/output/payload.json");
        let derived = provenance_path(base);
        assert_eq!(derived, Path::new("/tmp/output/payload.provenance.json"));
    }

    #[test]
    fn write_sidecar_creates_file() {
        let dir = tempdir().unwrap();
        let artifact = dir.path().join("grid.json");
        fs::write(&artifact, "[]").unwrap();
        let payload = Payload::new(json!({"repeat": 3, "doe": 5})).with_seed(7);
        let prov_path = write_sidecar(&artifact, payload).unwrap();
        assert!(prov_path.exists());
        let parsed: Value = serde_json::from_slice(&fs::read(prov_path).unwrap()).unwrap();
        assert_eq!(parsed["outputs"][0], artifact.to_string_lossy().as_ref());
        assert_eq!(parsed["seed"], 7);
        assert_eq!(parsed["params"]["doe"], 5);
    }

    #[test]
    fn file_sink_writes_payload_and_sidecar() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("runs").join("payload.json");
        let mut c = ScenarioCollection::new();
        c.create_standard(StandardScenario::EdgeTumble);
        c.create_standard(StandardScenario::BallImpact);
        let entries = c.submit_all(&SubmitCfg::default()).unwrap();

        let mut sink = JsonFileSink::new(&out, 0, json!({"scenarios": "in.json"}));
        sink.send(entries).unwrap();

        let payload: Value = serde_json::from_slice(&fs::read(&out).unwrap()).unwrap();
        assert_eq!(payload.as_array().unwrap().len(), 2);
        assert_eq!(payload[0]["analysisLabel"], "Edge-Axis Rotation Drop");
        let side: Value =
            serde_json::from_slice(&fs::read(sink.sidecar().unwrap()).unwrap()).unwrap();
        assert_eq!(side["params"]["ids"][1], "scn-2");
        assert_eq!(side["params"]["entries"], 2);
    }
}
