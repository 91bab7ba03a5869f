mod angles;
mod provenance;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use droptest::api::{
    calculate_grid_dimensions, diverse_default_grid, generate_edge_rotation_attitudes,
    generate_grid_locations, generate_lhs_variations, generate_predefined_attitudes,
    matches_any_pattern, random_impact_locations, AnalysisType, EdgeAxis, Notice,
    PredefinedMode, ScenarioCollection, SeedToken, StandardScenario, SubmissionSink, SubmitCfg,
    MAX_COUNT, MAX_REPEAT_COUNT,
};
use provenance::{ensure_parent, write_sidecar, JsonFileSink, Payload};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::SubscriberBuilder;

#[derive(Parser)]
#[command(name = "cli")]
#[command(about = "Drop-test scenario generation")]
struct Cmd {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Default DOE × repeat direction grid
    Grid {
        #[arg(long, default_value_t = 3)]
        repeat: usize,
        #[arg(long, default_value_t = 5)]
        doe: usize,
        /// Write JSON here (plus provenance sidecar) instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Latin-hypercube offsets in [-tol, +tol]
    Lhs {
        #[arg(long)]
        count: usize,
        #[arg(long)]
        tol: f64,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Euler attitude sets
    Attitudes {
        #[command(subcommand)]
        kind: AttitudeKind,
    },
    /// Impact locations in percent of the part
    Locations {
        #[arg(long, default_value_t = 3)]
        rows: usize,
        #[arg(long, default_value_t = 3)]
        cols: usize,
        /// Derive rows × cols from a total point count
        #[arg(long, conflicts_with_all = ["rows", "cols"])]
        count: Option<usize>,
        #[arg(long)]
        edge_margin: bool,
        /// Draw this many random points instead of a grid
        #[arg(long, conflicts_with = "count")]
        random: Option<usize>,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Names matching any of the wildcard patterns
    Match {
        #[arg(long = "pattern", required = true)]
        patterns: Vec<String>,
        names: Vec<String>,
    },
    /// Create a scenario collection file
    New {
        /// Template to add (six-face, all-directions, edge-tumble, mbd-screening, ball-impact)
        #[arg(long = "template")]
        templates: Vec<StandardScenario>,
        /// Empty record of this analysis type (e.g. fullAngleMBD)
        #[arg(long = "type")]
        types: Vec<AnalysisType>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Resolve scenarios into a submission payload
    Submit {
        #[arg(long)]
        scenarios: PathBuf,
        /// Record ids to submit; all records when omitted
        #[arg(long = "id")]
        ids: Vec<String>,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// File with one component name per line, for impact targets
        #[arg(long)]
        components: Option<PathBuf>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Convert a CSV with phi,theta,psi[,name] columns into an attitude set
    ImportAngles {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print engine version, analysis types, templates and count limits as JSON
    Report,
}

#[derive(Subcommand)]
enum AttitudeKind {
    /// Canonical face/edge/corner poses
    Predefined {
        #[arg(long, default_value = "face")]
        mode: PredefinedMode,
    },
    /// Even sweep about one device edge
    Edge {
        #[arg(long, default_value = "top")]
        axis: EdgeAxis,
        #[arg(long, default_value_t = 12)]
        divisions: usize,
    },
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Grid { repeat, doe, out } => grid(repeat, doe, out),
        Action::Lhs { count, tol, seed } => lhs(count, tol, seed),
        Action::Attitudes { kind } => attitudes(kind),
        Action::Locations {
            rows,
            cols,
            count,
            edge_margin,
            random,
            seed,
        } => locations(rows, cols, count, edge_margin, random, seed),
        Action::Match { patterns, names } => match_names(&patterns, &names),
        Action::New {
            templates,
            types,
            out,
        } => new_collection(&templates, &types, &out),
        Action::Submit {
            scenarios,
            ids,
            seed,
            components,
            out,
        } => submit(&scenarios, &ids, seed, components.as_deref(), &out),
        Action::ImportAngles { csv, out } => import_angles(&csv, out),
        Action::Report => report(),
    }
}

fn log_notices(notices: &[Notice]) {
    for n in notices {
        if n.is_informational() {
            tracing::info!("{n}");
        } else {
            tracing::warn!("{n}");
        }
    }
}

/// Pretty JSON to `out` (with provenance sidecar) or to stdout.
#[track_caller]
fn emit<T: Serialize>(value: &T, out: Option<&Path>, params: serde_json::Value) -> Result<()> {
    let body = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            ensure_parent(path)?;
            fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
            write_sidecar(path, Payload::new(params))?;
        }
        None => println!("{body}"),
    }
    Ok(())
}

fn grid(repeat: usize, doe: usize, out: Option<PathBuf>) -> Result<()> {
    tracing::info!(repeat, doe, "grid");
    if repeat == 0 {
        bail!("--repeat must be >= 1");
    }
    let g = diverse_default_grid(repeat, doe);
    log_notices(&g.notices);
    emit(
        &g.value,
        out.as_deref(),
        serde_json::json!({ "repeat": repeat, "doe": doe }),
    )
}

fn lhs(count: usize, tol: f64, seed: u64) -> Result<()> {
    tracing::info!(count, tol, seed, "lhs");
    let mut rng = SeedToken::new(seed, 0).to_std_rng();
    emit(&generate_lhs_variations(&mut rng, count, tol), None, serde_json::Value::Null)
}

fn attitudes(kind: AttitudeKind) -> Result<()> {
    let set = match kind {
        AttitudeKind::Predefined { mode } => {
            tracing::info!(mode = ?mode, "attitudes_predefined");
            generate_predefined_attitudes(mode)
        }
        AttitudeKind::Edge { axis, divisions } => {
            tracing::info!(%axis, divisions, "attitudes_edge");
            if divisions == 0 {
                bail!("--divisions must be >= 1");
            }
            generate_edge_rotation_attitudes(axis, divisions)
        }
    };
    emit(&set, None, serde_json::Value::Null)
}

fn locations(
    rows: usize,
    cols: usize,
    count: Option<usize>,
    edge_margin: bool,
    random: Option<usize>,
    seed: u64,
) -> Result<()> {
    let requested = random.or(count).unwrap_or(rows.saturating_mul(cols));
    if requested > MAX_COUNT {
        bail!("at most {MAX_COUNT} locations per call (asked for {requested})");
    }
    let points = match (random, count) {
        (Some(n), _) => {
            tracing::info!(count = n, seed, "locations_random");
            let mut rng = SeedToken::new(seed, 0).to_std_rng();
            random_impact_locations(&mut rng, n)
        }
        (None, Some(n)) => {
            let (rows, cols) = calculate_grid_dimensions(n);
            tracing::info!(count = n, rows, cols, edge_margin, "locations_grid");
            generate_grid_locations(rows, cols, edge_margin)
        }
        (None, None) => {
            tracing::info!(rows, cols, edge_margin, "locations_grid");
            generate_grid_locations(rows, cols, edge_margin)
        }
    };
    emit(&points, None, serde_json::Value::Null)
}

fn match_names(patterns: &[String], names: &[String]) -> Result<()> {
    tracing::info!(patterns = ?patterns, names = names.len(), "match");
    for name in names.iter().filter(|n| matches_any_pattern(n, patterns)) {
        println!("{name}");
    }
    Ok(())
}

fn new_collection(
    templates: &[StandardScenario],
    types: &[AnalysisType],
    out: &Path,
) -> Result<()> {
    tracing::info!(templates = templates.len(), types = types.len(), "new");
    let mut c = ScenarioCollection::new();
    for t in templates {
        c.create_standard(*t);
    }
    for t in types {
        c.create_empty(*t);
    }
    if c.is_empty() {
        c.create_empty(AnalysisType::default());
    }
    ensure_parent(out)?;
    fs::write(out, c.export_json()?).with_context(|| format!("writing {}", out.display()))?;
    tracing::info!(records = c.len(), out = %out.display(), "collection_written");
    Ok(())
}

fn read_collection(path: &Path) -> Result<ScenarioCollection> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading scenarios {}", path.display()))?;
    let mut c = ScenarioCollection::new();
    let notices = c
        .import_json(&text)
        .with_context(|| format!("importing {}", path.display()))?;
    log_notices(&notices);
    Ok(c)
}

fn read_components(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading components {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

fn submit(
    scenarios: &Path,
    ids: &[String],
    seed: u64,
    components: Option<&Path>,
    out: &Path,
) -> Result<()> {
    tracing::info!(scenarios = %scenarios.display(), ids = ?ids, seed, "submit");
    let c = read_collection(scenarios)?;
    let cfg = SubmitCfg {
        seed,
        components: components.map(read_components).transpose()?.unwrap_or_default(),
    };
    let entries = if ids.is_empty() {
        c.submit_all(&cfg)?
    } else {
        c.submit(ids, &cfg)?
    };
    let params = serde_json::json!({
        "scenarios": scenarios.to_string_lossy(),
        "components": cfg.components.len(),
    });
    let mut sink = JsonFileSink::new(out, seed, params);
    sink.send(entries)?;
    Ok(())
}

fn import_angles(csv: &Path, out: Option<PathBuf>) -> Result<()> {
    tracing::info!(csv = %csv.display(), "import_angles");
    let set = angles::load_angle_csv(csv)?;
    emit(
        &set,
        out.as_deref(),
        serde_json::json!({ "csv": csv.to_string_lossy() }),
    )
}

fn report_doc() -> serde_json::Value {
    serde_json::json!({
        "code_rev": provenance::current_git_rev(),
        "engine": droptest::VERSION,
        "analysis_types": AnalysisType::ALL.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
        "templates": StandardScenario::ALL.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
        "limits": {
            "max_count": MAX_COUNT,
            "max_repeat_count": MAX_REPEAT_COUNT
        }
    })
}

fn report() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&report_doc())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_lists_modes_templates_and_limits() {
        let doc = report_doc();
        assert_eq!(doc["analysis_types"].as_array().unwrap().len(), 7);
        assert_eq!(doc["templates"].as_array().unwrap().len(), 5);
        assert_eq!(doc["limits"]["max_repeat_count"], MAX_REPEAT_COUNT);
        assert!(doc.get("params").is_none());
        assert!(doc.get("outputs").is_none());
    }
}
