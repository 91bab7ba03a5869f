//! CSV angle-source files → attitude sets.
//!
//! Columns `phi`, `theta`, `psi` (degrees, any numeric type) are required; `name` is
//! optional and defaults to `row-<n>` (1-based).

use anyhow::{anyhow, bail, Context, Result};
use droptest::api::{Attitude, AttitudeSet};
use polars::prelude::*;
use std::path::Path;

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let series = df
        .column(name)
        .with_context(|| format!("angle file needs a `{name}` column"))?
        .cast(&DataType::Float64)?;
    series
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            v.filter(|v| v.is_finite())
                .ok_or_else(|| anyhow!("row {}: `{name}` is missing or not finite", i + 1))
        })
        .collect()
}

/// Read an angle CSV into an attitude set.
pub fn load_angle_csv(path: &Path) -> Result<AttitudeSet> {
    let df = LazyCsvReader::new(path)
        .with_infer_schema_length(Some(100))
        .finish()
        .and_then(|lf| lf.collect())
        .with_context(|| format!("reading angle CSV {}", path.display()))?;
    if df.height() == 0 {
        bail!("angle file {} has no rows", path.display());
    }
    let phi = float_column(&df, "phi")?;
    let theta = float_column(&df, "theta")?;
    let psi = float_column(&df, "psi")?;
    let names: Vec<Option<String>> = if df.schema().contains("name") {
        let s = df.column("name")?.cast(&DataType::String)?;
        s.str()?.into_iter().map(|v| v.map(str::to_string)).collect()
    } else {
        vec![None; df.height()]
    };
    tracing::info!(rows = df.height(), "angle_csv_loaded");
    Ok(AttitudeSet::new(
        names
            .into_iter()
            .zip(phi.into_iter().zip(theta).zip(psi))
            .enumerate()
            .map(|(i, (name, ((phi, theta), psi)))| {
                let name = name
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| format!("row-{}", i + 1));
                Attitude::new(name, phi, theta, psi)
            })
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn reads_named_and_unnamed_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("angles.csv");
        fs::write(&path, "phi,theta,psi,name\n0,0,0,F1\n45.5,-10,90,\n").unwrap();
        let set = load_angle_csv(&path).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.entries[0], Attitude::new("F1", 0.0, 0.0, 0.0));
        assert_eq!(set.entries[1], Attitude::new("row-2", 45.5, -10.0, 90.0));
    }

    #[test]
    fn integer_columns_without_names() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ints.csv");
        fs::write(&path, "psi,theta,phi\n30,0,90\n").unwrap();
        let set = load_angle_csv(&path).unwrap();
        assert_eq!(set.entries[0], Attitude::new("row-1", 90.0, 0.0, 30.0));
    }

    #[test]
    fn missing_column_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "phi,theta\n0,0\n").unwrap();
        let err = load_angle_csv(&path).unwrap_err();
        assert!(format!("{err:#}").contains("psi"));
    }
}
