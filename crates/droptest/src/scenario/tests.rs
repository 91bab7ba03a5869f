use super::*;
use crate::attitude::{Attitude, EdgeAxis, PredefinedMode};
use crate::direction::Direction::{self, *};
use crate::layout::{GridLayout, Location};
use crate::notice::Notice;
use crate::tolerance::ToleranceSettings;

fn grid_params(rec: &ScenarioRecord) -> &DirectionGridParams {
    match &rec.params {
        ScenarioParams::FullAngleMbd(p) | ScenarioParams::FullAngleCumulative(p) => p,
        other => panic!("expected a direction grid, got {:?}", other.analysis_type()),
    }
}

fn impact_params(rec: &ScenarioRecord) -> &ImpactParams {
    match &rec.params {
        ScenarioParams::DropWeightImpact(p) => p,
        other => panic!("expected impact params, got {:?}", other.analysis_type()),
    }
}

fn edit(rec: ScenarioRecord, e: ScenarioEdit) -> (ScenarioRecord, Vec<Notice>) {
    let out = rec.apply(e).expect("edit applies");
    (out.value, out.notices)
}

#[test]
fn wire_names_and_labels() {
    assert_eq!(
        serde_json::to_string(&AnalysisType::FullAngleMbd).unwrap(),
        "\"fullAngleMBD\""
    );
    for t in AnalysisType::ALL {
        assert_eq!(t.as_str().parse::<AnalysisType>(), Ok(t));
        assert_eq!(ScenarioParams::default_for(t).analysis_type(), t);
    }
    let rec = ScenarioRecord::new("a", "A", AnalysisType::FullAngle);
    assert_eq!(rec.analysis_label(), "Full-Angle Drop");
    let (rec, _) = edit(
        rec,
        ScenarioEdit::SetAngleSource {
            source: AngleSource::UsePrevResult,
            prev_result_id: Some("b".into()),
        },
    );
    assert_eq!(rec.analysis_label(), "Cumulative Full-Angle Drop");
}

#[test]
fn record_json_carries_type() {
    let mut rec = ScenarioRecord::new("scn-1", "Drop", AnalysisType::EdgeAxisRotation);
    rec.obj_file_name = Some("phone.obj".into());
    let v = serde_json::to_value(&rec).unwrap();
    assert_eq!(v["analysisType"], "edgeAxisRotation");
    assert_eq!(v["objFileName"], "phone.obj");
    assert!(v.get("fileName").is_none());
    assert_eq!(v["params"]["divisions"], 12);
    let back: ScenarioRecord = serde_json::from_value(v).unwrap();
    assert_eq!(back, rec);

    let bogus = r#"{"id":"x","name":"A","analysisType":"bogus","params":{}}"#;
    assert!(serde_json::from_str::<ScenarioRecord>(bogus).is_err());
}

#[test]
fn changing_type_replaces_params() {
    let rec = ScenarioRecord::new("a", "A", AnalysisType::FullAngleMbd);
    let (rec, _) = edit(rec, ScenarioEdit::SetRepeatCount(5));
    let (rec, _) = edit(rec, ScenarioEdit::SetAnalysisType(AnalysisType::FullAngleCumulative));
    assert_eq!(rec.analysis_type(), AnalysisType::FullAngleCumulative);
    assert_eq!(grid_params(&rec).repeat_count, 3);

    // Same type again keeps the edited values.
    let (rec, _) = edit(rec, ScenarioEdit::SetDoeCount(7));
    let (rec, _) = edit(rec, ScenarioEdit::SetAnalysisType(AnalysisType::FullAngleCumulative));
    assert_eq!(grid_params(&rec).doe_count, 7);
}

#[test]
fn repeat_change_keeps_authored_cells() {
    let rec = ScenarioRecord::new("a", "A", AnalysisType::FullAngleMbd);
    let before = grid_params(&rec).grid.clone();
    let (rec, notices) = edit(rec, ScenarioEdit::SetRepeatCount(4));
    assert!(notices.is_empty());
    let p = grid_params(&rec);
    assert_eq!(p.repeat_count, 4);
    assert_eq!(p.grid.repeat_count(), 4);
    for (old, new) in before.rows.iter().zip(&p.grid.rows) {
        assert_eq!(&new[..3], &old[..]);
        assert_eq!(new[3], F2);
    }
}

#[test]
fn doe_change_appends_rotations() {
    let rec = ScenarioRecord::new("a", "A", AnalysisType::FullAngleMbd);
    let (rec, _) = edit(rec, ScenarioEdit::SetDoeCount(7));
    let p = grid_params(&rec);
    assert_eq!(p.doe_count, 7);
    assert_eq!(p.grid.rows[5], vec![C2, F1, E1]);
    assert_eq!(p.grid.rows[6], vec![F2, E2, C1]);
    let (rec, _) = edit(rec, ScenarioEdit::SetDoeCount(2));
    assert_eq!(grid_params(&rec).grid.rows, vec![vec![F1, E1, C1], vec![E1, C1, F1]]);
}

#[test]
fn zero_counts_keep_prior_value() {
    let rec = ScenarioRecord::new("a", "A", AnalysisType::FullAngleMbd);
    let (rec, notices) = edit(rec, ScenarioEdit::SetRepeatCount(0));
    assert_eq!(grid_params(&rec).repeat_count, 3);
    assert!(matches!(&notices[..], [Notice::Validation { field, .. }] if field == "repeatCount"));
}

#[test]
fn oversized_counts_keep_prior_value() {
    let rec = ScenarioRecord::new("a", "A", AnalysisType::FullAngleMbd);
    let (rec, notices) = edit(rec, ScenarioEdit::SetDoeCount(MAX_COUNT + 1));
    assert_eq!(grid_params(&rec).doe_count, 5);
    assert_eq!(notices.len(), 1);

    let rec = ScenarioRecord::new("i", "I", AnalysisType::DropWeightImpact);
    let (rec, notices) = edit(rec, ScenarioEdit::SetSampleCount(usize::MAX));
    assert_eq!(impact_params(&rec).grid_mode, GridLayout::default());
    assert_eq!(notices.len(), 1);
    let huge = GridLayout {
        rows: usize::MAX,
        cols: 2,
        edge_margin: false,
    };
    let (rec, notices) = edit(rec, ScenarioEdit::SetGridLayout(huge));
    assert_eq!(impact_params(&rec).locations.len(), 9);
    assert_eq!(notices.len(), 1);
}

#[test]
fn cell_edits_never_duplicate_rows() {
    let rec = ScenarioRecord::new("a", "A", AnalysisType::FullAngleMbd);
    let set_cell = |row, direction| ScenarioEdit::SetCell {
        row,
        col: 0,
        direction,
    };
    let (rec, notices) = edit(rec, set_cell(3, F1));
    assert_eq!(notices.len(), 1);
    assert_eq!(grid_params(&rec).grid.cell(3, 0), Some(F2));

    let (rec, notices) = edit(rec, set_cell(3, C8));
    assert!(notices.is_empty());
    assert_eq!(grid_params(&rec).grid.cell(3, 0), Some(C8));

    let err = rec.apply(set_cell(9, F1)).unwrap_err();
    assert_eq!(
        err,
        EditError::IndexOut {
            what: "row",
            index: 9,
            len: 5
        }
    );
}

#[test]
fn edits_outside_their_mode_are_rejected() {
    let rec = ScenarioRecord::new("a", "A", AnalysisType::EdgeAxisRotation);
    let err = rec.clone().apply(ScenarioEdit::SetRepeatCount(2)).unwrap_err();
    assert_eq!(
        err,
        EditError::NotApplicable {
            edit: "setRepeatCount",
            analysis: AnalysisType::EdgeAxisRotation
        }
    );
    assert!(rec.apply(ScenarioEdit::SetTolerance(ToleranceSettings::default())).is_err());
}

#[test]
fn sequence_entries_and_resizes() {
    let rec = ScenarioRecord::new("m", "M", AnalysisType::MultiRepeatCumulative);
    let (rec, _) = edit(
        rec,
        ScenarioEdit::SetSequenceEntry {
            index: 1,
            direction: C5,
        },
    );
    let (rec, _) = edit(rec, ScenarioEdit::SetRepeatCount(8));
    let ScenarioParams::MultiRepeatCumulative(p) = &rec.params else {
        panic!("wrong params variant");
    };
    assert_eq!(p.sequence.len(), 8);
    assert_eq!(&p.sequence[..3], &[F1, C5, C1]);
    assert_eq!(&p.sequence[6..], &[F3, E3]);
}

#[test]
fn predefined_attitude_lifecycle() {
    let rec = ScenarioRecord::new("p", "P", AnalysisType::PredefinedAttitudes);
    let (rec, _) = edit(rec, ScenarioEdit::AddAttitude(Attitude::new("tilted", 10.0, 5.0, 0.0)));
    let (rec, _) = edit(
        rec,
        ScenarioEdit::UpdateAttitude {
            index: 0,
            attitude: Attitude::new("F1 (rolled)", 3.0, 0.0, 0.0),
        },
    );
    let count = |r: &ScenarioRecord| match &r.params {
        ScenarioParams::PredefinedAttitudes(p) => p.attitudes.len(),
        _ => panic!("wrong params variant"),
    };
    assert_eq!(count(&rec), 7);

    // Same mode: edits survive. New mode: regenerated.
    let (rec, _) = edit(rec, ScenarioEdit::SetPredefinedMode(PredefinedMode::Face));
    assert_eq!(count(&rec), 7);
    let (rec, _) = edit(rec, ScenarioEdit::SetPredefinedMode(PredefinedMode::Corner));
    assert_eq!(count(&rec), 8);
    let (rec, _) = edit(rec, ScenarioEdit::ResetAttitudes);
    assert_eq!(count(&rec), 8);

    let bad = Attitude::new("nan", f64::NAN, 0.0, 0.0);
    assert!(matches!(
        rec.apply(ScenarioEdit::AddAttitude(bad)),
        Err(EditError::InvalidValue { .. })
    ));
}

#[test]
fn last_attitude_cannot_be_removed() {
    let mut rec = ScenarioRecord::new("e", "E", AnalysisType::EdgeAxisRotation);
    let mut notices = Vec::new();
    for _ in 0..12 {
        let out = rec.apply(ScenarioEdit::RemoveAttitude(0)).unwrap();
        rec = out.value;
        notices = out.notices;
    }
    let ScenarioParams::EdgeAxisRotation(p) = &rec.params else {
        panic!("wrong params variant");
    };
    assert_eq!(p.attitudes.len(), 1);
    assert_eq!(p.attitudes.entries[0].name, "top-12");
    assert_eq!(notices.len(), 1);
}

#[test]
fn edge_axis_and_divisions_regenerate() {
    let rec = ScenarioRecord::new("e", "E", AnalysisType::EdgeAxisRotation);
    let (rec, _) = edit(rec, ScenarioEdit::SetEdgeAxis(EdgeAxis::Right));
    let (rec, _) = edit(rec, ScenarioEdit::SetEdgeDivisions(8));
    let ScenarioParams::EdgeAxisRotation(p) = &rec.params else {
        panic!("wrong params variant");
    };
    assert_eq!(p.attitudes.len(), 8);
    assert!(p.attitudes.iter().all(|a| (a.phi, a.theta) == (-90.0, 0.0)));
    assert_eq!(p.attitudes.entries[1].psi, 45.0);
}

#[test]
fn impact_edits() {
    let rec = ScenarioRecord::new("i", "I", AnalysisType::DropWeightImpact);
    let (rec, notices) = edit(rec, ScenarioEdit::SetPackagePatterns(vec!["  ".into()]));
    assert_eq!(impact_params(&rec).package_patterns, vec!["*pkg*".to_string()]);
    assert_eq!(notices.len(), 1);

    let (rec, _) = edit(rec, ScenarioEdit::SetSampleCount(12));
    let p = impact_params(&rec);
    assert_eq!(
        p.grid_mode,
        GridLayout {
            rows: 4,
            cols: 3,
            edge_margin: false
        }
    );
    assert_eq!(p.locations.len(), 12);

    let (rec, _) = edit(rec, ScenarioEdit::SetLocations(vec![Location::new(10.0, 120.0)]));
    let p = impact_params(&rec);
    assert_eq!(p.location_mode, LocationMode::Percentage);
    assert_eq!(p.locations, vec![Location::new(10.0, 100.0)]);

    let (rec, _) = edit(rec, ScenarioEdit::SetSampleCount(4));
    let p = impact_params(&rec);
    assert_eq!(p.locations.len(), 4);
    assert_eq!(p.locations[0], Location::new(10.0, 100.0));

    let (rec, notices) = edit(
        rec,
        ScenarioEdit::SetImpactor {
            impactor_type: ImpactorType::Cylinder,
            diameter: -1.0,
        },
    );
    assert_eq!(impact_params(&rec).impactor_type, ImpactorType::Cylinder);
    assert_eq!(impact_params(&rec).diameter, 10.0);
    assert_eq!(notices.len(), 1);
}

#[test]
fn attachments_by_kind() {
    let rec = ScenarioRecord::new("f", "F", AnalysisType::FullAngle);
    let attach =
        |name: &str, bytes: &[u8]| ScenarioEdit::AttachFile(Attachment::new(name, bytes));
    let (rec, _) = edit(rec, attach("deck.KEY", b"*KEYWORD"));
    assert_eq!(rec.file_name.as_deref(), Some("deck.KEY"));
    let (rec, notices) = edit(rec, attach("blank.obj", b""));
    assert!(rec.obj_file_name.is_none());
    assert_eq!(notices.len(), 1);
    let (rec, _) = edit(rec, attach("angles.json", br#"[[0,0,0]]"#));
    let ScenarioParams::FullAngle(p) = &rec.params else {
        panic!("wrong params variant");
    };
    assert_eq!(p.angle_source, AngleSource::File);
    assert_eq!(p.angle_file.as_ref().unwrap().text, "[[0,0,0]]");
    assert!(rec.apply(attach("x.png", &[1])).is_err());
}

#[test]
fn self_reference_is_invalid() {
    let rec = ScenarioRecord::new("a", "A", AnalysisType::FullAngle);
    let err = rec
        .apply(ScenarioEdit::SetAngleSource {
            source: AngleSource::UsePrevResult,
            prev_result_id: Some("a".into()),
        })
        .unwrap_err();
    assert!(matches!(err, EditError::InvalidValue { .. }));
}

fn screening_collection() -> ScenarioCollection {
    let mut c = ScenarioCollection::new();
    c.create_standard(StandardScenario::MbdScreening);
    c.create_standard(StandardScenario::SixFaceDrop);
    c.create_standard(StandardScenario::BallImpact);
    c
}

#[test]
fn submission_is_reproducible_per_seed() {
    let c = screening_collection();
    let cfg = SubmitCfg {
        seed: 42,
        ..SubmitCfg::default()
    };
    let a = c.submit_all(&cfg).unwrap();
    let b = c.submit_all(&cfg).unwrap();
    assert_eq!(a, b);
    let other = c.submit_all(&SubmitCfg { seed: 43, ..cfg.clone() }).unwrap();
    assert_ne!(a[0].params.drops, other[0].params.drops);
    // Selection order does not change a record's stream.
    let only = c.submit(&["scn-1"], &cfg).unwrap();
    assert_eq!(only[0], a[0]);
}

#[test]
fn screening_payload_respects_ranges() {
    let c = screening_collection();
    let out = c.submit(&["scn-1"], &SubmitCfg::default()).unwrap();
    let entry = &out[0];
    assert_eq!(entry.analysis_type, AnalysisType::FullAngleMbd);
    assert_eq!(entry.analysis_label, "Full-Angle Drop (MBD)");
    let drops = &entry.params.drops;
    assert_eq!(drops.len(), 26);
    for d in drops {
        assert!((0.5..=1.5).contains(&d.height));
        assert_eq!(d.attitudes.len(), 3);
        for cell in &d.attitudes {
            let dir: Direction = cell.direction.unwrap();
            let [phi, theta, psi] = dir.nominal_angles();
            assert!((cell.phi - phi).abs() <= 5.0);
            assert!((cell.theta - theta).abs() <= 5.0);
            assert!((cell.psi - psi).abs() <= 5.0);
        }
    }
}

#[test]
fn prior_results_resolve_by_id() {
    let mut c = screening_collection();
    let id = c.create_empty(AnalysisType::FullAngle).id.clone();
    c.update(
        &id,
        ScenarioEdit::SetAngleSource {
            source: AngleSource::UsePrevResult,
            prev_result_id: Some("scn-1".into()),
        },
    )
    .unwrap();
    let out = c.submit(&[id.as_str()], &SubmitCfg::default()).unwrap();
    assert_eq!(out[0].analysis_label, "Cumulative Full-Angle Drop");
    let prev = out[0].params.prev_result.as_ref().unwrap();
    assert_eq!(prev.id, "scn-1");
    assert_eq!(prev.name, "MBD screening");

    c.delete("scn-1");
    assert_eq!(
        c.submit(&[id.as_str()], &SubmitCfg::default()),
        Err(SubmitError::UnknownReference {
            record: id.clone(),
            target: "scn-1".into()
        })
    );
    assert_eq!(
        c.submit(&["scn-99"], &SubmitCfg::default()),
        Err(SubmitError::UnknownRecord("scn-99".into()))
    );
}

#[test]
fn impact_payload_fills_empty_percentage_grid() {
    let mut c = screening_collection();
    c.update("scn-3", ScenarioEdit::SetLocations(Vec::new())).unwrap();
    let cfg = SubmitCfg {
        seed: 1,
        components: vec!["frame".into(), "soc_pkg".into(), "display_PKG_2".into()],
    };
    let before = c.clone();
    let out = c.submit(&["scn-3"], &cfg).unwrap();
    let again = c.submit(&["scn-3"], &cfg).unwrap();
    assert_eq!(out, again);
    assert_eq!(c, before);
    assert!(impact_params(c.get("scn-3").unwrap()).locations.is_empty());

    let params = &out[0].params;
    assert_eq!(params.drops.len(), 9);
    assert!(params.drops.iter().all(|d| d.height == 0.2 && d.location.is_some()));
    let impact = params.impact.as_ref().unwrap();
    assert_eq!(
        impact.targets.as_deref(),
        Some(&["soc_pkg".to_string(), "display_PKG_2".to_string()][..])
    );
}

#[test]
fn random_locations_stay_on_part() {
    let mut c = ScenarioCollection::new();
    let id = c.create_empty(AnalysisType::DropWeightImpact).id.clone();
    c.update(&id, ScenarioEdit::SetLocationMode(LocationMode::Random)).unwrap();
    c.update(&id, ScenarioEdit::SetSampleCount(5)).unwrap();
    let out = c.submit_all(&SubmitCfg::default()).unwrap();
    let drops = &out[0].params.drops;
    assert_eq!(drops.len(), 5);
    assert!(drops.iter().all(|d| d.location.is_some_and(|l| l.is_on_part())));
    assert!(out[0].params.impact.as_ref().unwrap().targets.is_none());
}

#[test]
fn vec_sink_collects_entries() {
    let c = screening_collection();
    let mut sink: Vec<SubmissionEntry> = Vec::new();
    let entries = c.submit_all(&SubmitCfg::default()).unwrap();
    sink.send(entries).unwrap();
    assert_eq!(sink.len(), 3);
    let json = serde_json::to_value(&sink).unwrap();
    assert_eq!(json[1]["analysisType"], "predefinedAttitudes");
    assert_eq!(json[1]["params"]["drops"].as_array().unwrap().len(), 6);
    assert_eq!(json[1]["params"]["drop"]["surface"], "steelPlate");
    assert!(json[1]["params"].get("surface").is_none());
}
