// end-to-end checks over the whole pipeline: request in, scene and host commands out

use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::systems::hydro::animation::MotionKind;
use crate::systems::hydro::builders::parents_form_forest;
use crate::systems::hydro::host::{HostCommand, RecordingHost};
use crate::systems::hydro::layout::{compute_intake_layout, compute_layout, LayoutPlan};
use crate::systems::hydro::params::{
    resolve, ComponentKind, IntakeParams, ParamType, ParamValue, RawParams, RawValue, ResolvePolicy,
};
use crate::systems::hydro::scene::{compose, GenerationRequest, Scene};

fn request(component: &str, pairs: &[(&str, RawValue)]) -> GenerationRequest {
    let values: RawParams = pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
    GenerationRequest::new(component, values)
}

fn scene(component: &str, pairs: &[(&str, RawValue)]) -> Scene {
    compose(&request(component, pairs), ResolvePolicy::Permissive).unwrap()
}

fn group_len(scene: &Scene, group: &str) -> usize {
    scene.primitives.iter().filter(|p| p.group == group).count()
}

#[test]
fn default_generator_has_five_parts_and_two_spins() {
    let scene = scene("generator", &[]);

    assert_eq!(scene.primitives.len(), 5);
    assert_eq!(scene.clips.len(), 2);
    for clip in &scene.clips {
        assert!(clip.cyclic);
        assert_eq!(clip.kind, MotionKind::Rotation);
        assert_eq!((clip.start.frame, clip.end.frame), (1, 100));
        assert_eq!(clip.end.pose.rotation.y - clip.start.pose.rotation.y, TAU);
    }
}

#[test]
fn turbine_groups_match_requested_counts() {
    let scene = scene("turbine", &[
        ("stay_vane_count", RawValue::Int(8)),
        ("guide_vane_count", RawValue::Text("20".into())),
        ("blade_count", RawValue::Int(0)),
    ]);

    assert_eq!(group_len(&scene, "stay_vanes"), 8);
    assert_eq!(group_len(&scene, "guide_vanes"), 20);
    assert_eq!(group_len(&scene, "blades"), 0);
    assert_eq!(group_len(&scene, "runner"), 1);
    assert_eq!(group_len(&scene, "spiral_casing"), 1);
    assert_eq!(scene.clips.len(), 1);
}

#[test]
fn negative_counts_are_empty_groups() {
    let scene = scene("turbine", &[("stay_vane_count", RawValue::Int(-4))]);
    assert_eq!(group_len(&scene, "stay_vanes"), 0);
    assert_eq!(group_len(&scene, "guide_vanes"), 16);
}

#[test]
fn non_numeric_blade_count_becomes_one_blade() {
    let scene = scene("turbine", &[("blade_count", RawValue::Text("abc".into()))]);
    assert_eq!(group_len(&scene, "blades"), 1);
    assert!(!scene.report.is_clean());
}

#[test]
fn wide_intake_matches_the_bay_formula() {
    let scene = scene("intake", &[
        ("bay_count", RawValue::Int(3)),
        ("bay_width", RawValue::Float(9.0)),
        ("pier_thick", RawValue::Float(3.0)),
    ]);

    let gates: Vec<f32> = scene.primitives.iter()
        .filter(|p| p.group == "gates")
        .map(|p| p.placement.translation.x)
        .collect();
    assert_eq!(gates, vec![-12.0, 0.0, 12.0]);
    assert_eq!(group_len(&scene, "piers"), 4);
}

#[test]
fn random_bay_counts_keep_the_plan_consistent() {
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..50 {
        let n = rng.random_range(0..12);
        let w = rng.random_range(2.0..10.0);
        let p = rng.random_range(0.5..3.0);

        let values: RawParams = [
            ("bay_count".to_string(), RawValue::Int(n)),
            ("bay_width".to_string(), RawValue::Float(w)),
            ("pier_thick".to_string(), RawValue::Float(p)),
        ].into_iter().collect();
        let (record, _) = resolve(&values, ComponentKind::Intake.schema(), ResolvePolicy::Permissive).unwrap();
        let layout = compute_intake_layout(&IntakeParams::from_record(&record).unwrap());

        assert_eq!(layout.centers.len(), n as usize);
        for pair in layout.centers.windows(2) {
            assert!((pair[1] - pair[0] - layout.bay_span).abs() < 1e-3);
        }
        if let Some(first) = layout.centers.first() {
            let left_edge = first - layout.bay_width / 2.0;
            assert!((left_edge - (layout.origin_x + layout.pier_thick)).abs() < 1e-3);
            // symmetric about x = 0
            let last = layout.centers.last().unwrap();
            assert!((first + last).abs() < 1e-3);
        }

        let scene = compose(&GenerationRequest::new("intake", values), ResolvePolicy::Permissive).unwrap();
        let tunnels: Vec<f32> = scene.primitives.iter()
            .filter(|p| p.group == "tunnels")
            .map(|p| p.placement.translation.x)
            .collect();
        assert_eq!(tunnels, layout.centers);
        assert!(parents_form_forest(&scene.primitives));
    }
}

#[test]
fn numeric_input_round_trips_through_the_resolver() {
    let mut rng = StdRng::seed_from_u64(11);

    for kind in ComponentKind::ALL {
        let schema = kind.schema();
        let values: RawParams = schema.iter()
            .map(|spec| {
                let value = match spec.ty {
                    ParamType::Int => RawValue::Int(rng.random_range(-5..50)),
                    ParamType::Float => RawValue::Float(rng.random_range(-5.0..50.0)),
                };
                (spec.name.to_string(), value)
            })
            .collect();

        let (record, report) = resolve(&values, schema, ResolvePolicy::Permissive).unwrap();
        assert!(report.is_clean());
        for (key, raw) in &values {
            let expected = match raw {
                RawValue::Int(v) => ParamValue::Int(*v),
                RawValue::Float(v) => ParamValue::Float(*v),
                RawValue::Text(_) | RawValue::Other(_) => unreachable!(),
            };
            assert_eq!(record.get(key), Some(expected));
        }
    }
}

#[test]
fn layouts_are_recomputed_identically() {
    let values: RawParams = [("bay_count".to_string(), RawValue::Int(5))].into_iter().collect();
    let (record, _) = resolve(&values, ComponentKind::Intake.schema(), ResolvePolicy::Permissive).unwrap();

    let first = compute_layout(ComponentKind::Intake, &record).unwrap();
    let second = compute_layout(ComponentKind::Intake, &record).unwrap();
    assert_eq!(first, second);
    assert!(matches!(first, LayoutPlan::Intake(_)));
}

#[test]
fn unknown_component_yields_nothing_and_no_error() {
    let scene = scene("foo", &[("bay_count", RawValue::Int(3))]);
    assert!(scene.primitives.is_empty());
    assert!(scene.clips.is_empty());
    assert!(scene.kind.is_none());

    // still framed, so a host gets a camera and a light
    let mut host = RecordingHost::new();
    assert_eq!(scene.submit(&mut host).unwrap(), 2);
}

#[test]
fn every_component_submits_cleanly() {
    for kind in ComponentKind::ALL {
        let scene = scene(kind.name(), &[]);
        assert!(parents_form_forest(&scene.primitives));

        let mut host = RecordingHost::new();
        scene.submit(&mut host).unwrap();

        let keyframes = host.commands.iter()
            .filter(|c| matches!(c, HostCommand::InsertKeyframe { .. }))
            .count();
        assert_eq!(keyframes, scene.clips.len() * 2);
        assert!(matches!(host.commands.last(), Some(HostCommand::PlaceLight { .. })));
    }
}

#[test]
fn camera_backs_off_from_the_scene_center() {
    for kind in ComponentKind::ALL {
        let scene = scene(kind.name(), &[]);
        let offset = scene.camera.position - scene.camera.target;
        assert!(offset.x > 0.0 && offset.y > 0.0 && offset.z > 0.0);
        assert_eq!(scene.lights.len(), 2);
    }
}

#[test]
fn config_file_round_trip() {
    let dir = std::env::temp_dir().join(format!("hydro_gen_config_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.json");
    std::fs::write(
        &path,
        r#"{"component": "intake_structure", "values": {"bay_count": "2", "bay_width": 5.5}, "export_folder": "out"}"#,
    ).unwrap();

    let request = crate::load_request(&path).unwrap();
    assert_eq!(request.values.get("bay_count"), Some(&RawValue::Text("2".into())));
    assert_eq!(request.values.get("bay_width"), Some(&RawValue::Float(5.5)));
    assert_eq!(request.export_folder, std::path::PathBuf::from("out"));

    let scene = compose(&request, ResolvePolicy::Permissive).unwrap();
    assert_eq!(scene.kind, Some(ComponentKind::Intake));
    assert_eq!(group_len(&scene, "gates"), 2);

    assert!(matches!(
        crate::load_request(&dir.join("missing.json")),
        Err(crate::error::ConfigError::Io { .. })
    ));
    // a null value is not a parse error, it goes through the fallback
    std::fs::write(&path, r#"{"component": "turbine", "values": {"blade_count": null}}"#).unwrap();
    let request = crate::load_request(&path).unwrap();
    let scene = compose(&request, ResolvePolicy::Permissive).unwrap();
    assert_eq!(group_len(&scene, "blades"), 1);

    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(crate::load_request(&path), Err(crate::error::ConfigError::Parse { .. })));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn range_check_follows_the_run_policy() {
    let bad_blades = request("turbine", &[("blade_count", RawValue::Text("abc".into()))]);

    // the permissive run uses the fallback 1, below the advised blade range
    let flagged = crate::out_of_range_keys(&bad_blades, ResolvePolicy::Permissive).unwrap();
    assert_eq!(flagged, vec!["blade_count"]);

    // the strict run never resolves, so there is nothing to check
    assert_eq!(crate::out_of_range_keys(&bad_blades, ResolvePolicy::Strict), None);
    assert_eq!(crate::out_of_range_keys(&request("foo", &[]), ResolvePolicy::Strict), None);
}
