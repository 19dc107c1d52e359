//! Demo scenarios: procedural cloth + pinning + coefficients for each scene.
//!
//! Presets:
//! 1. **hanging_flag**: vertical sheet pinned along one side, blown by wind
//! 2. **clamped_rod**: wide sheet hanging from the two corners of its top edge
//! 3. **curtain**: pleated panels hanging from their top vertices
//! 4. **merged_pieces**: two sheets merged into one fabric that must move independently
//! 5. **shared_fabric**: several instances of one cooked fabric across two solvers
//! 6. **sphere_drape**: free sheet falling onto a sphere

use std::f32::consts::FRAC_PI_2;
use std::path::Path;

use loom_fabric::CookingConfig;
use loom_math::{Mat4, Quat, Vec3};
use loom_mesh::generators::{ClothMeshData, PlaneCloth, Side, Zigzag};
use loom_solver::{ClothParams, SphereCollider};
use loom_types::{LoomError, LoomResult};
use serde::{Deserialize, Serialize};

/// Names accepted by [`Scenario::preset`].
pub const PRESET_NAMES: [&str; 6] = [
    "hanging_flag",
    "clamped_rod",
    "curtain",
    "merged_pieces",
    "shared_fabric",
    "sphere_drape",
];

/// Which particles of a generated plane are pinned.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum PinRule {
    #[default]
    None,
    /// The two corners of row 0 (`attach_by_width`) or column 0.
    Angles { attach_by_width: bool },
    /// Every particle of one grid edge.
    Side { side: Side },
    /// Every particle within `threshold` of the highest one.
    TopVertices { threshold: f32 },
}

impl PinRule {
    /// Applies the rule to a freshly generated plane.
    pub fn apply(&self, mesh: &mut ClothMeshData, cloth: &PlaneCloth) -> LoomResult<()> {
        let (sx, sy) = (cloth.segments_x, cloth.segments_y);
        match *self {
            PinRule::None => {}
            PinRule::Angles { attach_by_width } => mesh.attach_by_angles(sx, sy, attach_by_width)?,
            PinRule::Side { side } => mesh.attach_by_side(sx, sy, side)?,
            PinRule::TopVertices { threshold } => {
                mesh.attach_using_top_vertices(threshold)?;
            }
        }
        Ok(())
    }
}

/// A fully specified demo scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub name: String,
    pub cloth: PlaneCloth,
    pub pin: PinRule,
    /// Areal density (kg/m²). `None` keeps unit inverse masses.
    pub density: Option<f32>,
    pub params: ClothParams,
    pub cooking: CookingConfig,
    /// Instances created from the one cooked fabric.
    pub instances: usize,
    /// Offset between consecutive instances.
    pub spacing: Vec3,
    /// Instances are bound round-robin across this many solvers.
    pub solvers: usize,
    pub frames: u32,
    pub dt: f32,
    /// Second plane merged into the first before cooking.
    pub merge_with: Option<PlaneCloth>,
    /// Colliders, placed relative to each instance's offset.
    pub spheres: Vec<SphereCollider>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: "custom".into(),
            cloth: PlaneCloth::default(),
            pin: PinRule::None,
            density: None,
            params: ClothParams::default(),
            cooking: CookingConfig::default(),
            instances: 1,
            spacing: Vec3::ZERO,
            solvers: 1,
            frames: 120,
            dt: 1.0 / 60.0,
            merge_with: None,
            spheres: Vec::new(),
        }
    }
}

/// Stands a plane up: row 0 on top at `height`, facing +Z.
fn upright(height: f32, offset: Vec3) -> Mat4 {
    Mat4::from_rotation_translation(Quat::from_rotation_x(FRAC_PI_2), offset + Vec3::Y * height)
}

impl Scenario {
    /// Vertical 2m × 1.5m sheet pinned along its left edge in a steady breeze.
    pub fn hanging_flag() -> Self {
        Self {
            name: "hanging_flag".into(),
            cloth: PlaneCloth::new(2.0, 1.5, 20, 15).with_transform(upright(0.75, Vec3::Y * 1.5)),
            pin: PinRule::Side { side: Side::Left },
            density: Some(0.2),
            params: ClothParams::windy(Vec3::new(4.0, 0.0, 1.5)),
            frames: 240,
            ..Default::default()
        }
    }

    /// 5m × 6m sheet at 20×20 hanging from the two corners of its top edge.
    pub fn clamped_rod() -> Self {
        Self {
            name: "clamped_rod".into(),
            cloth: PlaneCloth::new(5.0, 6.0, 20, 20).with_transform(upright(3.0, Vec3::Y)),
            pin: PinRule::Angles {
                attach_by_width: true,
            },
            cooking: CookingConfig::geodesic(),
            ..Default::default()
        }
    }

    /// Three pleated panels hanging from their top vertices.
    pub fn curtain() -> Self {
        Self {
            name: "curtain".into(),
            cloth: PlaneCloth::new(1.5, 2.5, 12, 20)
                .with_alternating_diagonals(true)
                .with_zigzag(Zigzag::Pleat)
                .with_transform(upright(1.25, Vec3::Y * 0.5)),
            pin: PinRule::TopVertices { threshold: 0.01 },
            params: ClothParams::self_colliding(0.02),
            cooking: CookingConfig::loose(),
            instances: 3,
            spacing: Vec3::new(1.7, 0.0, 0.0),
            ..Default::default()
        }
    }

    /// Two 1m sheets side by side, merged into one fabric.
    pub fn merged_pieces() -> Self {
        Self {
            name: "merged_pieces".into(),
            cloth: PlaneCloth::new(1.0, 1.0, 10, 10).with_transform(upright(0.5, Vec3::Y)),
            merge_with: Some(
                PlaneCloth::new(1.0, 1.0, 10, 10)
                    .with_transform(upright(0.5, Vec3::new(1.5, 1.0, 0.0))),
            ),
            pin: PinRule::Side { side: Side::Top },
            ..Default::default()
        }
    }

    /// Four instances of one cooked fabric spread over two solvers.
    pub fn shared_fabric() -> Self {
        Self {
            name: "shared_fabric".into(),
            cloth: PlaneCloth::new(1.0, 1.0, 12, 12).with_transform(upright(0.5, Vec3::Y)),
            pin: PinRule::Angles {
                attach_by_width: true,
            },
            instances: 4,
            spacing: Vec3::new(1.5, 0.0, 0.0),
            solvers: 2,
            ..Default::default()
        }
    }

    /// 1.5m × 1.5m horizontal sheet dropped onto a 0.3m sphere.
    pub fn sphere_drape() -> Self {
        Self {
            name: "sphere_drape".into(),
            cloth: PlaneCloth::new(1.5, 1.5, 20, 20)
                .with_transform(Mat4::from_translation(Vec3::Y * 0.5)),
            spheres: vec![SphereCollider::new(Vec3::ZERO, 0.3)],
            frames: 180,
            ..Default::default()
        }
    }

    /// Looks up a preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "hanging_flag" => Some(Self::hanging_flag()),
            "clamped_rod" => Some(Self::clamped_rod()),
            "curtain" => Some(Self::curtain()),
            "merged_pieces" => Some(Self::merged_pieces()),
            "shared_fabric" => Some(Self::shared_fabric()),
            "sphere_drape" => Some(Self::sphere_drape()),
            _ => None,
        }
    }

    /// Every preset, in [`PRESET_NAMES`] order.
    pub fn presets() -> Vec<Self> {
        PRESET_NAMES.iter().filter_map(|name| Self::preset(name)).collect()
    }

    /// Parses and validates a scenario from TOML.
    pub fn from_toml_str(text: &str) -> LoomResult<Self> {
        let scenario: Self = toml::from_str(text)
            .map_err(|e| LoomError::Serialization(format!("Invalid scenario TOML: {e}")))?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: impl AsRef<Path>) -> LoomResult<Self> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    pub fn to_toml_string(&self) -> LoomResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| LoomError::Serialization(format!("Cannot encode scenario: {e}")))
    }

    pub fn validate(&self) -> LoomResult<()> {
        if self.name.trim().is_empty() {
            return Err(LoomError::InvalidConfig("Scenario name is empty".into()));
        }
        if self.instances == 0 {
            return Err(LoomError::InvalidConfig("Scenario needs at least one instance".into()));
        }
        if self.solvers == 0 {
            return Err(LoomError::InvalidConfig("Scenario needs at least one solver".into()));
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(LoomError::InvalidConfig(format!(
                "Scenario dt must be positive and finite (got {})",
                self.dt
            )));
        }
        if !self.spacing.is_finite() {
            return Err(LoomError::InvalidConfig("Instance spacing is not finite".into()));
        }
        if let Some(density) = self.density {
            if !(density.is_finite() && density > 0.0) {
                return Err(LoomError::InvalidConfig(format!(
                    "Density must be positive and finite (got {density})"
                )));
            }
        }
        if let Some(sphere) = self.spheres.iter().find(|s| !(s.radius > 0.0) || !s.center.is_finite()) {
            return Err(LoomError::InvalidConfig(format!(
                "Invalid sphere collider (center {}, radius {})",
                sphere.center, sphere.radius
            )));
        }
        self.params.validate()
    }

    /// Generates the pinned (and optionally merged) mesh every instance
    /// shares.
    pub fn build_mesh(&self) -> LoomResult<ClothMeshData> {
        let mut mesh = ClothMeshData::generate_plane_cloth(&self.cloth)?;
        self.pin.apply(&mut mesh, &self.cloth)?;
        if let Some(other) = &self.merge_with {
            let mut piece = ClothMeshData::generate_plane_cloth(other)?;
            self.pin.apply(&mut piece, other)?;
            mesh.merge(&piece)?;
        }
        if let Some(density) = self.density {
            mesh.set_inv_masses_from_density(density)?;
        }
        Ok(mesh)
    }

    /// Offset of instance `i`.
    pub fn instance_offset(&self, i: usize) -> Vec3 {
        self.spacing * i as f32
    }
}
