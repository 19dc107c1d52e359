//! Integration tests for loom-solver.

use std::sync::Arc;

use loom_fabric::{Constraint, FabricCooker, PhaseConfig};
use loom_math::{Mat4, Quat, Vec3};
use loom_mesh::generators::{ClothMeshData, PlaneCloth, Side};
use loom_solver::constraints::{solve_phase, solve_self_collision};
use loom_solver::{ClothInstance, ClothParams, Solver, SolverConfig, SpatialHash, SphereCollider};
use loom_types::constants::DEFAULT_DT;
use loom_types::{ClothId, LoomError, PhaseId};

fn mesh(sx: u32, sy: u32, transform: Mat4) -> ClothMeshData {
    let params = PlaneCloth::new(1.0, 1.0, sx, sy).with_transform(transform);
    ClothMeshData::generate_plane_cloth(&params).unwrap()
}

fn instance(data: &ClothMeshData) -> ClothInstance {
    let desc = data.cloth_mesh_desc();
    let fabric = Arc::new(FabricCooker::default().cook(&desc).unwrap());
    ClothInstance::from_desc(fabric, &desc).unwrap()
}

fn pinned_top(sx: u32, sy: u32) -> ClothInstance {
    let mut data = mesh(sx, sy, Mat4::IDENTITY);
    data.attach_by_side(sx, sy, Side::Top).unwrap();
    instance(&data)
}

fn quiet_params() -> ClothParams {
    ClothParams {
        linear_drag: 0.0,
        lift_coefficient: 0.0,
        self_collision_distance: 0.0,
        ..Default::default()
    }
}

// ─── Instance Tests ───────────────────────────────────────────

#[test]
fn instance_from_desc() {
    let cloth = pinned_top(4, 4);
    assert_eq!(cloth.particle_count(), 25);
    assert_eq!(cloth.pinned_count(), 5);
    assert_eq!(cloth.positions(), cloth.prev_positions());
    assert_eq!(cloth.phase_configs().len(), cloth.fabric().phase_count());
    assert_eq!(cloth.last_iteration_dt(), 0.0);
}

#[test]
fn instance_rejects_mismatched_buffers() {
    let data = mesh(2, 2, Mat4::IDENTITY);
    let desc = data.cloth_mesh_desc();
    let fabric = Arc::new(FabricCooker::default().cook(&desc).unwrap());
    let err = ClothInstance::new(fabric, vec![Vec3::ZERO; 3], vec![1.0; 3]).unwrap_err();
    assert!(matches!(err, LoomError::InvalidMesh(_)));
}

#[test]
fn instances_share_fabric() {
    let data = mesh(2, 2, Mat4::IDENTITY);
    let desc = data.cloth_mesh_desc();
    let fabric = Arc::new(FabricCooker::default().cook(&desc).unwrap());
    let a = ClothInstance::from_desc(fabric.clone(), &desc).unwrap();
    let b = ClothInstance::from_desc(fabric.clone(), &desc).unwrap();
    assert!(Arc::ptr_eq(a.fabric(), b.fabric()));
    assert_eq!(Arc::strong_count(&fabric), 3);
    drop(a);
    assert_eq!(Arc::strong_count(&fabric), 2);
}

#[test]
fn set_translation_carries_pins_only() {
    let mut cloth = pinned_top(2, 2);
    let before = cloth.positions().to_vec();
    cloth.set_translation(Vec3::new(1.0, 0.0, 0.0));

    for i in 0..cloth.particle_count() {
        if cloth.inv_masses()[i] == 0.0 {
            assert!((cloth.positions()[i] - (before[i] + Vec3::X)).length() < 1e-6);
        } else {
            assert_eq!(cloth.positions()[i], before[i]);
        }
    }
    assert_eq!(cloth.translation(), Vec3::new(1.0, 0.0, 0.0));
}

#[test]
fn set_rotation_rotates_pins() {
    let mut cloth = pinned_top(2, 2);
    let before = cloth.positions()[0];
    let rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
    cloth.set_rotation(rotation);
    assert!((cloth.positions()[0] - rotation * before).length() < 1e-5);
}

#[test]
fn phase_override_bounds() {
    let mut cloth = pinned_top(2, 2);
    let soft = PhaseConfig {
        stiffness: 0.3,
        ..PhaseConfig::default()
    };
    cloth.set_phase_config(0, soft).unwrap();
    assert_eq!(cloth.phase_configs()[0], soft);
    assert!(cloth.set_phase_config(10_000, soft).is_err());
}

#[test]
fn set_inv_mass_pins_particle() {
    let mut cloth = pinned_top(2, 2);
    cloth.set_inv_mass(8, 0.0).unwrap();
    assert_eq!(cloth.pinned_count(), 4);
    assert!(cloth.set_inv_mass(8, -1.0).is_err());
    assert!(cloth.set_inv_mass(99, 1.0).is_err());
}

// ─── Params Tests ─────────────────────────────────────────────

#[test]
fn params_validate() {
    assert!(ClothParams::default().validate().is_ok());
    assert!(ClothParams::windy(Vec3::X).validate().is_ok());
    let bad = ClothParams {
        damping: 1.0,
        ..Default::default()
    };
    assert!(bad.validate().is_err());
    let bad = ClothParams {
        solver_frequency: 0.0,
        ..Default::default()
    };
    assert!(bad.validate().is_err());
}

#[test]
fn params_from_toml() {
    let params: ClothParams = toml::from_str(
        r#"
        damping = 0.1
        wind_velocity = [1.0, 0.0, 0.5]
        "#,
    )
    .unwrap();
    assert_eq!(params.damping, 0.1);
    assert_eq!(params.wind_velocity, Vec3::new(1.0, 0.0, 0.5));
    assert_eq!(params.gravity, ClothParams::default().gravity);
}

#[test]
fn solver_config_rejects_zero_iterations() {
    let err = Solver::new(SolverConfig {
        max_iterations_per_step: 0,
    })
    .unwrap_err();
    assert!(matches!(err, LoomError::InvalidConfig(_)));
}

// ─── Solver Ownership Tests ───────────────────────────────────

#[test]
fn add_remove_cloth() {
    let mut solver = Solver::default();
    solver.add_cloth(ClothId(7), pinned_top(2, 2)).unwrap();
    solver.add_cloth(ClothId(3), pinned_top(2, 2)).unwrap();
    assert_eq!(solver.len(), 2);
    assert_eq!(solver.cloth_ids(), vec![ClothId(3), ClothId(7)]);

    let err = solver.add_cloth(ClothId(3), pinned_top(2, 2)).unwrap_err();
    assert!(matches!(err, LoomError::InvariantViolation(_)));

    assert!(solver.remove_cloth(ClothId(3)).is_some());
    assert!(solver.remove_cloth(ClothId(3)).is_none());
    assert_eq!(solver.len(), 1);
}

// ─── Simulation Tests ─────────────────────────────────────────

#[test]
fn iteration_count_follows_frequency() {
    let mut solver = Solver::default();
    solver.add_cloth(ClothId(1), pinned_top(2, 2)).unwrap();
    let report = solver.simulate(DEFAULT_DT).unwrap();
    // 1/60 s at 300 Hz.
    assert_eq!(report.iterations, 5);
    assert_eq!(report.cloth_count, 1);
    assert_eq!(report.particle_count, 9);
    let cloth = solver.cloth(ClothId(1)).unwrap();
    assert!((cloth.last_iteration_dt() - DEFAULT_DT / 5.0).abs() < 1e-7);
}

#[test]
fn at_least_one_iteration() {
    let mut solver = Solver::default();
    solver.add_cloth(ClothId(1), pinned_top(2, 2)).unwrap();
    let report = solver.simulate(1e-5).unwrap();
    assert_eq!(report.iterations, 1);
}

#[test]
fn iterations_clamped_by_config() {
    let mut solver = Solver::new(SolverConfig {
        max_iterations_per_step: 4,
    })
    .unwrap();
    solver.add_cloth(ClothId(1), pinned_top(2, 2)).unwrap();
    let report = solver.simulate(1.0).unwrap();
    assert_eq!(report.iterations, 4);
}

#[test]
fn rejects_bad_dt() {
    let mut solver = Solver::default();
    solver.add_cloth(ClothId(1), pinned_top(2, 2)).unwrap();
    assert!(solver.simulate(0.0).is_err());
    assert!(solver.simulate(f32::NAN).is_err());
    assert_eq!(solver.steps(), 0);
}

#[test]
fn rejects_bad_params_without_stepping() {
    let mut solver = Solver::default();
    let mut cloth = pinned_top(2, 2);
    cloth.set_friction(3.0);
    let before = cloth.positions().to_vec();
    solver.add_cloth(ClothId(1), cloth).unwrap();
    assert!(solver.simulate(DEFAULT_DT).is_err());
    assert_eq!(solver.cloth(ClothId(1)).unwrap().positions(), &before[..]);
}

#[test]
fn pinned_particles_stay_exact() {
    let mut solver = Solver::default();
    let cloth = pinned_top(6, 6).with_params(quiet_params()).unwrap();
    let initial = cloth.positions().to_vec();
    solver.add_cloth(ClothId(1), cloth).unwrap();

    for _ in 0..10 {
        solver.simulate(DEFAULT_DT).unwrap();
    }

    let cloth = solver.cloth(ClothId(1)).unwrap();
    for i in 0..cloth.particle_count() {
        if cloth.inv_masses()[i] == 0.0 {
            assert_eq!(cloth.positions()[i], initial[i], "pinned particle {i} moved");
        } else {
            assert_ne!(cloth.positions()[i], initial[i], "particle {i} did not move");
        }
    }
}

#[test]
fn unpinned_cloth_falls_freely() {
    let mut solver = Solver::default();
    let params = ClothParams {
        damping: 0.0,
        ..quiet_params()
    };
    let cloth = instance(&mesh(2, 2, Mat4::IDENTITY)).with_params(params).unwrap();
    solver.add_cloth(ClothId(1), cloth).unwrap();
    solver.simulate(DEFAULT_DT).unwrap();

    // Five Verlet iterations of h = dt/5 from rest: y = -g h² (1+2+3+4+5).
    let h = DEFAULT_DT / 5.0;
    let expected = -9.81 * h * h * 15.0;
    let cloth = solver.cloth(ClothId(1)).unwrap();
    for p in cloth.positions() {
        assert!((p.y - expected).abs() < 1e-5);
    }
}

#[test]
fn tethers_bound_distance() {
    let mut solver = Solver::default();
    let cloth = pinned_top(8, 8).with_params(quiet_params()).unwrap();
    solver.add_cloth(ClothId(1), cloth).unwrap();
    for _ in 0..60 {
        solver.simulate(DEFAULT_DT).unwrap();
    }

    let cloth = solver.cloth(ClothId(1)).unwrap();
    let scale = cloth.params().tether_scale;
    for t in cloth.fabric().tethers() {
        let len = cloth.positions()[t.particle as usize]
            .distance(cloth.positions()[t.anchor as usize]);
        assert!(len <= t.rest_length * scale + 1e-4);
    }
}

#[test]
fn sphere_keeps_particles_outside() {
    let mut solver = Solver::default();
    let data = mesh(6, 6, Mat4::from_translation(Vec3::new(0.0, 0.6, 0.0)));
    let mut cloth = instance(&data).with_params(quiet_params()).unwrap();
    let sphere = SphereCollider::new(Vec3::ZERO, 0.5);
    cloth.add_sphere(sphere);
    solver.add_cloth(ClothId(1), cloth).unwrap();

    let mut contacts = 0;
    for _ in 0..60 {
        contacts += solver.simulate(DEFAULT_DT).unwrap().sphere_contacts;
    }
    assert!(contacts > 0);

    let cloth = solver.cloth(ClothId(1)).unwrap();
    for p in cloth.positions() {
        assert!(p.distance(sphere.center) >= sphere.radius - 1e-4);
    }
}

#[test]
fn wind_drag_pushes_cloth() {
    let mut solver = Solver::default();
    let params = ClothParams {
        gravity: Vec3::ZERO,
        wind_velocity: Vec3::new(0.0, 5.0, 0.0),
        linear_drag: 0.5,
        ..quiet_params()
    };
    let cloth = instance(&mesh(4, 4, Mat4::IDENTITY)).with_params(params).unwrap();
    solver.add_cloth(ClothId(1), cloth).unwrap();
    for _ in 0..5 {
        solver.simulate(DEFAULT_DT).unwrap();
    }
    let cloth = solver.cloth(ClothId(1)).unwrap();
    assert!(cloth.bounds().center().y > 0.0);
}

#[test]
fn bounds_follow_particles() {
    let mut solver = Solver::default();
    solver.add_cloth(ClothId(1), pinned_top(4, 4)).unwrap();
    solver.simulate(DEFAULT_DT).unwrap();
    let cloth = solver.cloth(ClothId(1)).unwrap();
    for p in cloth.positions() {
        assert!(cloth.bounds().contains(*p));
    }
    assert_eq!(solver.bounds(), cloth.bounds());
}

#[test]
fn cloths_in_one_solver_are_independent() {
    let a = pinned_top(4, 4).with_params(quiet_params()).unwrap();
    let mut b = pinned_top(4, 4).with_params(quiet_params()).unwrap();
    b.set_gravity(Vec3::new(0.0, -30.0, 0.0));

    let mut alone = Solver::default();
    alone.add_cloth(ClothId(1), a.clone()).unwrap();
    let mut shared = Solver::default();
    shared.add_cloth(ClothId(1), a).unwrap();
    shared.add_cloth(ClothId(2), b).unwrap();

    for _ in 0..10 {
        alone.simulate(DEFAULT_DT).unwrap();
        shared.simulate(DEFAULT_DT).unwrap();
    }
    assert_eq!(
        alone.cloth(ClothId(1)).unwrap().positions(),
        shared.cloth(ClothId(1)).unwrap().positions()
    );
}

#[test]
fn merged_pieces_move_independently() {
    let offset = Mat4::from_translation(Vec3::new(3.0, 0.0, 0.0));
    let mut a = mesh(5, 5, Mat4::IDENTITY);
    a.attach_by_side(5, 5, Side::Top).unwrap();
    let mut b = mesh(5, 5, offset);
    b.attach_by_side(5, 5, Side::Left).unwrap();

    let mut merged = a.clone();
    merged.merge(&b).unwrap();

    let run = |data: &ClothMeshData| {
        let mut solver = Solver::default();
        let cloth = instance(data).with_params(quiet_params()).unwrap();
        solver.add_cloth(ClothId(1), cloth).unwrap();
        for _ in 0..10 {
            solver.simulate(DEFAULT_DT).unwrap();
        }
        solver.remove_cloth(ClothId(1)).unwrap().positions().to_vec()
    };

    let pa = run(&a);
    let pb = run(&b);
    let pm = run(&merged);
    assert_eq!(pm.len(), pa.len() + pb.len());
    for (i, p) in pa.iter().chain(pb.iter()).enumerate() {
        assert!((pm[i] - *p).length() < 1e-5, "particle {i} diverged");
    }
}

// ─── Projection Tests ─────────────────────────────────────────

#[test]
fn phase_projection_restores_rest_length() {
    let mut positions = vec![Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)];
    let constraint = Constraint {
        a: 0,
        b: 1,
        rest_length: 1.0,
        phase: PhaseId(0),
    };
    solve_phase(&mut positions, &[1.0, 1.0], &[constraint], &PhaseConfig::default());
    assert!((positions[0].x - 0.5).abs() < 1e-6);
    assert!((positions[1].x - 1.5).abs() < 1e-6);
}

#[test]
fn phase_projection_respects_pins() {
    let mut positions = vec![Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)];
    let constraint = Constraint {
        a: 0,
        b: 1,
        rest_length: 1.0,
        phase: PhaseId(0),
    };
    solve_phase(&mut positions, &[0.0, 1.0], &[constraint], &PhaseConfig::default());
    assert_eq!(positions[0], Vec3::ZERO);
    assert!((positions[1].x - 1.0).abs() < 1e-6);
}

#[test]
fn phase_projection_soft_zone() {
    let config = PhaseConfig {
        stiffness: 1.0,
        stiffness_multiplier: 0.0,
        compression_limit: 0.5,
        stretch_limit: 1.5,
    };
    let constraint = Constraint {
        a: 0,
        b: 1,
        rest_length: 1.0,
        phase: PhaseId(0),
    };

    // Inside the band with a zero multiplier: untouched.
    let mut positions = vec![Vec3::ZERO, Vec3::new(1.2, 0.0, 0.0)];
    solve_phase(&mut positions, &[0.0, 1.0], &[constraint], &config);
    assert!((positions[1].x - 1.2).abs() < 1e-6);

    // Past the stretch limit: pulled back to the limit, not to rest.
    let mut positions = vec![Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)];
    solve_phase(&mut positions, &[0.0, 1.0], &[constraint], &config);
    assert!((positions[1].x - 1.5).abs() < 1e-6);
}

#[test]
fn spatial_hash_pairs() {
    let mut hash = SpatialHash::new(0.1);
    hash.rebuild(&[
        Vec3::ZERO,
        Vec3::new(0.05, 0.0, 0.0),
        Vec3::new(5.0, 5.0, 5.0),
    ]);
    let pairs = hash.candidate_pairs();
    assert_eq!(pairs, vec![(0, 1)]);
}

#[test]
fn spatial_hash_far_particles_share_edge_cell() {
    // 3e6 / 0.001 is past i32::MAX, so both land in the saturated edge cell.
    let mut hash = SpatialHash::new(0.001);
    hash.rebuild(&[Vec3::new(3e6, 0.0, 0.0), Vec3::new(3e6, 0.0, 0.0005)]);
    assert_eq!(hash.candidate_pairs(), vec![(0, 1)]);
}

#[test]
fn spatial_hash_edge_cells_on_every_axis() {
    let mut hash = SpatialHash::new(0.001);
    hash.rebuild(&[
        Vec3::new(3e6, 3e6, 3e6),
        Vec3::new(-3e6, -3e6, -3e6),
        Vec3::new(3e6, -3e6, 3e6),
    ]);
    assert!(hash.candidate_pairs().is_empty());
    assert_eq!(hash.occupied_cells(), 3);
}

#[test]
fn self_collision_separates_particles() {
    let rest = [Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)];
    let mut positions = vec![Vec3::ZERO, Vec3::new(0.02, 0.0, 0.0)];
    let mut hash = SpatialHash::new(0.1);
    let contacts =
        solve_self_collision(&mut positions, &[1.0, 1.0], &rest, 0.1, 1.0, &mut hash);
    assert_eq!(contacts, 1);
    assert!((positions[0].distance(positions[1]) - 0.1).abs() < 1e-6);
}

#[test]
fn self_collision_skips_rest_neighbors() {
    let rest = [Vec3::ZERO, Vec3::new(0.05, 0.0, 0.0)];
    let mut positions = rest.to_vec();
    let mut hash = SpatialHash::new(0.1);
    let contacts =
        solve_self_collision(&mut positions, &[1.0, 1.0], &rest, 0.1, 1.0, &mut hash);
    assert_eq!(contacts, 0);
    assert_eq!(positions, rest.to_vec());
}
