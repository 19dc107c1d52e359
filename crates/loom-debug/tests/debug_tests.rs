//! Integration tests for loom-debug.

use std::sync::Arc;

use loom_controller::{ClothActor, ControllerConfig, SimulationController};
use loom_debug::extractor::{
    bounds_lines, constraint_error, constraint_error_lines, constraint_lines, position_delta_lines,
    tether_lines,
};
use loom_debug::lines::{error_color, BOUNDS_COLOR, TETHER_COLOR, TETHER_OVER_LIMIT_COLOR};
use loom_debug::{ClothSnapshot, DebugDrawOptions, DebugLines, DiagnosticsExtractor};
use loom_fabric::FabricCooker;
use loom_math::{Aabb, Vec3};
use loom_mesh::generators::{ClothMeshData, PlaneCloth, Side};
use loom_render::HeadlessRenderer;
use loom_solver::{ClothInstance, Solver, SolverConfig};

const DT: f32 = 1.0 / 60.0;

fn hanging_cloth() -> ClothInstance {
    let mut data = ClothMeshData::generate_plane_cloth(&PlaneCloth::new(1.0, 1.0, 2, 2)).unwrap();
    data.attach_by_side(2, 2, Side::Top).unwrap();
    let desc = data.cloth_mesh_desc();
    let fabric = Arc::new(FabricCooker::default().cook(&desc).unwrap());
    ClothInstance::from_desc(fabric, &desc).unwrap()
}

fn stepped(cloth: ClothInstance, steps: usize) -> ClothInstance {
    let mut solver = Solver::new(SolverConfig::default()).unwrap();
    solver.add_cloth(loom_types::ClothId(0), cloth).unwrap();
    for _ in 0..steps {
        solver.simulate(DT).unwrap();
    }
    solver.remove_cloth(loom_types::ClothId(0)).unwrap()
}

fn controller() -> SimulationController {
    let config = ControllerConfig {
        log_events: false,
        ..ControllerConfig::with_threads(1)
    };
    SimulationController::new(config).unwrap()
}

// ─── Tether Lines ─────────────────────────────────────────────

#[test]
fn tether_lines_skip_self_tethers() {
    let cloth = hanging_cloth();
    let free = cloth.fabric().tethers().iter().filter(|t| t.particle != t.anchor).count();
    let lines = tether_lines(&cloth);
    assert_eq!(lines.len(), free);
    assert_eq!(free, 6);
    assert!(lines.iter().all(|l| l.color == TETHER_COLOR));
}

#[test]
fn tether_lines_flag_over_limit() {
    let cloth = hanging_cloth();
    // Drag a bottom particle far away from the pinned row.
    let mut positions = cloth.positions().to_vec();
    positions[8] += Vec3::new(0.0, 0.0, 5.0);
    let cloth = ClothInstance::new(Arc::clone(cloth.fabric()), positions, cloth.inv_masses().to_vec()).unwrap();

    let lines = tether_lines(&cloth);
    let over: Vec<_> = lines.iter().filter(|l| l.color == TETHER_OVER_LIMIT_COLOR).collect();
    assert_eq!(over.len(), 1);
    assert_eq!(over[0].end, cloth.positions()[8]);
}

// ─── Constraint Lines ─────────────────────────────────────────

#[test]
fn constraint_lines_cover_all_phases() {
    let cloth = hanging_cloth();
    let lines = constraint_lines(&cloth, None);
    assert_eq!(lines.len(), cloth.fabric().constraints().len());
}

#[test]
fn constraint_lines_phase_range() {
    let cloth = hanging_cloth();
    let fabric = cloth.fabric();
    let first = constraint_lines(&cloth, Some(0..1));
    assert_eq!(first.len(), fabric.phase_constraints(0).len());

    let clamped = constraint_lines(&cloth, Some(1..1000));
    assert_eq!(clamped.len(), fabric.constraints().len() - first.len());
    assert!(constraint_lines(&cloth, Some(500..600)).is_empty());
}

#[test]
fn constraint_error_mapping() {
    assert_eq!(constraint_error(1.0, 1.0, 0.1), 0.5);
    assert_eq!(constraint_error(2.0, 1.0, 0.1), 1.0);
    assert_eq!(constraint_error(0.5, 1.0, 0.1), 0.0);
    assert!((constraint_error(1.05, 1.0, 0.1) - 0.75).abs() < 1e-5);
    assert_eq!(constraint_error(1.0, 0.0, 0.1), 0.5);
}

#[test]
fn constraint_error_at_rest_is_neutral() {
    let cloth = hanging_cloth();
    let lines = constraint_error_lines(&cloth, 0.1);
    assert_eq!(lines.len(), cloth.fabric().constraints().len());
    assert!(lines.iter().all(|l| l.color == error_color(0.5)));
}

// ─── Delta and Bounds Lines ───────────────────────────────────

#[test]
fn position_deltas_empty_before_first_step() {
    assert!(position_delta_lines(&hanging_cloth(), DT).is_empty());
}

#[test]
fn position_deltas_scale_with_reference_dt() {
    let cloth = stepped(hanging_cloth(), 3);
    let short = position_delta_lines(&cloth, DT);
    let long = position_delta_lines(&cloth, 2.0 * DT);
    assert_eq!(short.len(), 6);
    for (a, b) in short.iter().zip(long.iter()) {
        assert_eq!(a.start, b.start);
        assert!((b.length() - 2.0 * a.length()).abs() < 1e-5);
    }
}

#[test]
fn bounds_lines_twelve_edges() {
    let lines = bounds_lines(&Aabb::new(Vec3::ZERO, Vec3::ONE));
    assert_eq!(lines.len(), 12);
    assert!(lines.iter().all(|l| (l.length() - 1.0).abs() < 1e-6));
    assert!(lines.iter().all(|l| l.color == BOUNDS_COLOR));
    assert!(bounds_lines(&Aabb::EMPTY).is_empty());
}

#[test]
fn vertex_data_layout() {
    let lines = bounds_lines(&Aabb::new(Vec3::ZERO, Vec3::ONE));
    let data = lines.to_vertex_data();
    assert_eq!(data.len(), 12 * 14);
    assert_eq!(&data[3..7], &BOUNDS_COLOR.to_array());
}

// ─── Extractor ────────────────────────────────────────────────

#[test]
fn extract_on_empty_controller() {
    let ctl = controller();
    let extractor = DiagnosticsExtractor::new(DebugDrawOptions::all());
    assert_eq!(extractor.extract(&ctl), DebugLines::new());
}

#[test]
fn extract_default_options_draw_nothing() {
    let extractor = DiagnosticsExtractor::default();
    assert!(extractor.extract_cloth(&hanging_cloth()).is_empty());
}

#[test]
fn extract_through_controller() {
    let mut ctl = controller();
    let s = ctl.track_solver(Solver::new(SolverConfig::default()).unwrap()).unwrap();
    let bound = ctl
        .track_actor(ClothActor::new(hanging_cloth(), Box::new(HeadlessRenderer::new())).unwrap())
        .unwrap();
    ctl.track_actor(ClothActor::new(hanging_cloth(), Box::new(HeadlessRenderer::new())).unwrap())
        .unwrap();
    ctl.bind_actor_to_solver(bound, s).unwrap();
    ctl.step(DT).unwrap();

    let options = DebugDrawOptions {
        bounds: true,
        ..Default::default()
    };
    let extractor = DiagnosticsExtractor::new(options);
    assert_eq!(extractor.extract(&ctl).len(), 24);

    ctl.start_step(DT).unwrap();
    assert_eq!(extractor.extract(&ctl).len(), 12);
    ctl.finish_step().unwrap();

    ctl.teardown().unwrap();
    assert!(extractor.extract(&ctl).is_empty());
}

#[test]
fn options_from_json() {
    let options: DebugDrawOptions =
        serde_json::from_str(r#"{ "tethers": true, "phase_range": { "start": 0, "end": 2 } }"#).unwrap();
    assert!(options.tethers);
    assert_eq!(options.phase_range, Some(0..2));
    assert!(!options.bounds);
    assert_eq!(options.reference_dt, DebugDrawOptions::default().reference_dt);
}

// ─── Snapshot Tests ───────────────────────────────────────────

#[test]
fn snapshot_round_trip() {
    let cloth = stepped(hanging_cloth(), 2);
    let snapshot = ClothSnapshot::capture(2, &cloth);
    let recovered = ClothSnapshot::from_bytes(&snapshot.to_bytes().unwrap()).unwrap();
    assert_eq!(recovered, snapshot);
    assert_eq!(recovered.particle_count, 9);
    assert_eq!(recovered.pinned_count(), 3);
    assert_eq!(recovered.positions(), cloth.positions());
    assert_eq!(recovered.position(4), Some(cloth.positions()[4]));
    assert_eq!(recovered.position(9), None);
}

#[test]
fn snapshot_velocities() {
    let fresh = ClothSnapshot::capture(0, &hanging_cloth());
    assert!(fresh.velocities().iter().all(|v| *v == Vec3::ZERO));

    let moving = ClothSnapshot::capture(3, &stepped(hanging_cloth(), 3));
    let velocities = moving.velocities();
    assert_eq!(velocities[0], Vec3::ZERO);
    assert!(velocities[8].length() > 0.0);
}

#[test]
fn snapshot_displacement() {
    let a = ClothSnapshot::capture(0, &hanging_cloth());
    let b = ClothSnapshot::capture(5, &stepped(hanging_cloth(), 5));
    assert_eq!(a.max_displacement(&a), Some(0.0));
    assert!(a.max_displacement(&b).unwrap() > 0.0);
}

#[test]
fn snapshot_rejects_garbage() {
    assert!(ClothSnapshot::from_bytes(&[1, 2, 3]).is_err());
}

#[test]
fn snapshot_file_round_trip() {
    let path = std::env::temp_dir().join(format!("loom-snapshot-{}.bin", std::process::id()));
    let snapshot = ClothSnapshot::capture(1, &hanging_cloth());
    snapshot.save(&path).unwrap();
    let loaded = ClothSnapshot::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(loaded, snapshot);
}
