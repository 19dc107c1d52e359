//! Integration tests for loom-fabric.

use std::collections::HashSet;

use loom_fabric::phases::PhaseColoring;
use loom_fabric::{ConstraintKind, CookingConfig, Fabric, FabricCooker, PhaseConfig, TetherMetric};
use loom_mesh::generators::{ClothMeshData, PlaneCloth, Side};
use loom_mesh::ClothMeshDesc;
use loom_types::LoomError;

fn plane(sx: u32, sy: u32) -> ClothMeshData {
    ClothMeshData::generate_plane_cloth(&PlaneCloth::new(1.0, 1.0, sx, sy)).unwrap()
}

fn cook(desc: &ClothMeshDesc) -> Fabric {
    FabricCooker::default().cook(desc).unwrap()
}

// ─── Coloring Tests ───────────────────────────────────────────

#[test]
fn coloring_empty() {
    assert!(PhaseColoring::color(&[], 4).is_empty());
}

#[test]
fn coloring_chain_uses_two_colors() {
    let pairs = [[0, 1], [1, 2], [2, 3], [3, 4]];
    let classes = PhaseColoring::color(&pairs, 5);
    assert_eq!(classes, vec![vec![0, 2], vec![1, 3]]);
    assert!(PhaseColoring::is_independent(&pairs, &classes));
}

#[test]
fn coloring_star_exceeds_one_word() {
    // Every pair shares particle 0, so each needs its own color.
    let pairs: Vec<[u32; 2]> = (1..=100).map(|i| [0, i]).collect();
    let classes = PhaseColoring::color(&pairs, 101);
    assert_eq!(classes.len(), 100);
    assert!(PhaseColoring::is_independent(&pairs, &classes));
}

// ─── Constraint Derivation Tests ──────────────────────────────

#[test]
fn single_cell_triangles() {
    let fabric = cook(&plane(1, 1).cloth_mesh_desc());
    assert_eq!(fabric.particle_count(), 4);
    assert_eq!(fabric.constraint_count(ConstraintKind::Stretch), 5);
    assert_eq!(fabric.constraint_count(ConstraintKind::Shear), 0);
    assert_eq!(fabric.constraint_count(ConstraintKind::Bending), 1);
    // Sorted edges color into three stretch phases, plus one bending phase.
    assert_eq!(fabric.phase_count(), 4);
    assert_eq!(fabric.triangle_count(), 2);
}

#[test]
fn single_cell_quads() {
    let params = PlaneCloth::new(1.0, 1.0, 1, 1).with_quads(true);
    let mesh = ClothMeshData::generate_plane_cloth(&params).unwrap();
    let fabric = cook(&mesh.cloth_mesh_desc());
    assert_eq!(fabric.constraint_count(ConstraintKind::Stretch), 4);
    assert_eq!(fabric.constraint_count(ConstraintKind::Shear), 2);
    // The only wing pair is a shear diagonal already.
    assert_eq!(fabric.constraint_count(ConstraintKind::Bending), 0);
}

#[test]
fn rest_lengths_match_positions() {
    let fabric = cook(&plane(4, 3).cloth_mesh_desc());
    let rest = fabric.rest_positions();
    for c in fabric.constraints() {
        let d = rest[c.a as usize].distance(rest[c.b as usize]);
        assert!((c.rest_length - d).abs() < 1e-6);
        assert!(c.rest_length > 0.0);
    }
}

#[test]
fn bending_can_be_disabled() {
    let config = CookingConfig {
        bending: false,
        ..Default::default()
    };
    let fabric = FabricCooker::new(config)
        .cook(&plane(3, 3).cloth_mesh_desc())
        .unwrap();
    assert_eq!(fabric.constraint_count(ConstraintKind::Bending), 0);
    assert!(fabric.phases().iter().all(|p| p.kind != ConstraintKind::Bending));
}

#[test]
fn no_duplicate_constraints() {
    let params = PlaneCloth::new(1.0, 1.0, 5, 5).with_quads(true);
    let mesh = ClothMeshData::generate_plane_cloth(&params).unwrap();
    let fabric = cook(&mesh.cloth_mesh_desc());
    let mut seen = HashSet::new();
    for c in fabric.constraints() {
        assert!(c.a < c.b);
        assert!(seen.insert((c.a, c.b)), "duplicate constraint {}-{}", c.a, c.b);
    }
}

// ─── Phase Tests ──────────────────────────────────────────────

#[test]
fn phases_are_independent_and_ordered() {
    let fabric = cook(&plane(20, 20).cloth_mesh_desc());
    let mut last_kind = ConstraintKind::Stretch;
    let mut covered = 0;
    for (i, phase) in fabric.phases().iter().enumerate() {
        assert!(phase.kind >= last_kind);
        last_kind = phase.kind;
        assert!(!phase.is_empty());
        assert_eq!(phase.start as usize, covered);
        covered = phase.end as usize;

        let mut touched = HashSet::new();
        for c in fabric.phase_constraints(i) {
            assert_eq!(c.phase.index(), i);
            assert!(touched.insert(c.a), "particle {} repeated in phase {}", c.a, i);
            assert!(touched.insert(c.b), "particle {} repeated in phase {}", c.b, i);
        }
    }
    assert_eq!(covered, fabric.constraints().len());
}

#[test]
fn phase_configs_follow_kind() {
    let fabric = cook(&plane(3, 3).cloth_mesh_desc());
    let defaults = CookingConfig::default();
    for phase in fabric.phases() {
        let expected = match phase.kind {
            ConstraintKind::Stretch => defaults.stretch,
            ConstraintKind::Shear => defaults.shear,
            ConstraintKind::Bending => defaults.bend,
        };
        assert_eq!(phase.config, expected);
    }
}

#[test]
fn cooking_is_deterministic() {
    let desc = plane(8, 6).cloth_mesh_desc();
    assert_eq!(cook(&desc), cook(&desc));
}

// ─── Tether Tests ─────────────────────────────────────────────

#[test]
fn no_pins_no_tethers() {
    let fabric = cook(&plane(3, 3).cloth_mesh_desc());
    assert!(fabric.tethers().is_empty());
}

#[test]
fn euclidean_tethers_to_nearest_anchor() {
    let mut mesh = plane(2, 2);
    mesh.attach_by_side(2, 2, Side::Top).unwrap();
    let fabric = cook(&mesh.cloth_mesh_desc());
    assert_eq!(fabric.tethers().len(), 9);

    let t4 = fabric.tethers().iter().find(|t| t.particle == 4).unwrap();
    assert_eq!(t4.anchor, 1);
    assert!((t4.rest_length - 0.5).abs() < 1e-6);

    for pinned in 0..3 {
        let t = fabric.tethers().iter().find(|t| t.particle == pinned).unwrap();
        assert_eq!(t.anchor, pinned);
        assert_eq!(t.rest_length, 0.0);
    }
}

#[test]
fn geodesic_tethers_follow_edges() {
    let mut mesh = plane(2, 2);
    mesh.attach_by_side(2, 2, Side::Top).unwrap();
    let desc = mesh.cloth_mesh_desc();
    let geodesic = FabricCooker::new(CookingConfig::geodesic()).cook(&desc).unwrap();
    let euclidean = cook(&desc);

    let t8 = geodesic.tethers().iter().find(|t| t.particle == 8).unwrap();
    assert_eq!(t8.anchor, 2);
    assert!((t8.rest_length - 1.0).abs() < 1e-6);

    for g in geodesic.tethers() {
        let e = euclidean
            .tethers()
            .iter()
            .find(|t| t.particle == g.particle)
            .unwrap();
        assert!(g.rest_length + 1e-6 >= e.rest_length);
    }
}

#[test]
fn tethers_stay_within_piece() {
    let mut a = plane(1, 1);
    a.attach_by_side(1, 1, Side::Top).unwrap();
    let b = plane(1, 1);
    a.merge(&b).unwrap();
    let fabric = cook(&a.cloth_mesh_desc());

    assert_eq!(fabric.tethers().len(), 4);
    assert!(fabric.tethers().iter().all(|t| t.particle < 4 && t.anchor < 4));
}

// ─── Validation Tests ─────────────────────────────────────────

#[test]
fn rejects_invalid_mesh() {
    let desc = ClothMeshDesc {
        positions: vec![],
        inv_masses: vec![],
        indices: vec![],
        quads: vec![],
        edges: vec![],
    };
    let err = FabricCooker::default().cook(&desc).unwrap_err();
    assert!(matches!(err, LoomError::InvalidMesh(_)));
}

#[test]
fn rejects_out_of_range_stiffness() {
    let config = CookingConfig {
        stretch: PhaseConfig {
            stiffness: 1.5,
            ..PhaseConfig::default()
        },
        ..Default::default()
    };
    let err = FabricCooker::new(config)
        .cook(&plane(2, 2).cloth_mesh_desc())
        .unwrap_err();
    assert!(matches!(err, LoomError::InvalidConfig(_)));
}

#[test]
fn phase_config_limits() {
    assert!(PhaseConfig::default().validate().is_ok());
    let bad = PhaseConfig {
        compression_limit: 1.2,
        ..PhaseConfig::default()
    };
    assert!(bad.validate().is_err());
    let bad = PhaseConfig {
        stretch_limit: 0.9,
        ..PhaseConfig::default()
    };
    assert!(bad.validate().is_err());
}

// ─── Config Tests ─────────────────────────────────────────────

#[test]
fn config_from_toml() {
    let config: CookingConfig = toml::from_str(
        r#"
        tether_metric = "geodesic"

        [bend]
        stiffness = 0.2
        "#,
    )
    .unwrap();
    assert_eq!(config.tether_metric, TetherMetric::Geodesic);
    assert!(config.bending);
    assert_eq!(config.bend.stiffness, 0.2);
    assert_eq!(config.bend.stretch_limit, 1.0);
    assert_eq!(config.shear, CookingConfig::default().shear);
}

#[test]
fn fabric_json_roundtrip() {
    let fabric = cook(&plane(2, 2).cloth_mesh_desc());
    let json = serde_json::to_string(&fabric).unwrap();
    let back: Fabric = serde_json::from_str(&json).unwrap();
    assert_eq!(fabric, back);
}
