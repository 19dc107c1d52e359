//! Cloth actors.
//!
//! A [`ClothActor`] binds one cloth instance to one renderer and at most
//! one solver. While unbound the actor owns its instance; binding moves
//! the instance into the solver and unbinding moves it back.

use loom_fabric::ConstraintKind;
use loom_mesh::ClothMeshDesc;
use loom_render::Renderer;
use loom_solver::ClothInstance;
use loom_types::LoomResult;
use serde::{Deserialize, Serialize};

use crate::keys::SolverKey;

/// Lifecycle of an actor: `Unbound → Bound → (Stepping → Settled)* → Unbound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorState {
    Unbound,
    Bound,
    /// Its solver is inside an in-flight step.
    Stepping,
    /// Last step finished and its positions were published.
    Settled,
}

/// One cloth instance paired with its renderer.
pub struct ClothActor {
    pub(crate) cloth: Option<ClothInstance>,
    pub(crate) renderer: Box<dyn Renderer>,
    pub(crate) solver: Option<SolverKey>,
    pub(crate) state: ActorState,
    pub(crate) frames_published: u64,
}

impl ClothActor {
    /// Creates an unbound actor and initializes the renderer with the
    /// cloth's triangles and starting positions.
    pub fn new(cloth: ClothInstance, mut renderer: Box<dyn Renderer>) -> LoomResult<Self> {
        renderer.init(&render_desc(&cloth))?;
        Ok(Self {
            cloth: Some(cloth),
            renderer,
            solver: None,
            state: ActorState::Unbound,
            frames_published: 0,
        })
    }

    pub fn state(&self) -> ActorState {
        self.state
    }

    pub fn solver(&self) -> Option<SolverKey> {
        self.solver
    }

    /// The instance, while the actor is unbound.
    pub fn cloth(&self) -> Option<&ClothInstance> {
        self.cloth.as_ref()
    }

    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    pub fn renderer_mut(&mut self) -> &mut dyn Renderer {
        self.renderer.as_mut()
    }

    pub fn frames_published(&self) -> u64 {
        self.frames_published
    }

    /// Splits an unbound actor into its instance and renderer.
    pub fn into_parts(self) -> (Option<ClothInstance>, Box<dyn Renderer>) {
        (self.cloth, self.renderer)
    }
}

/// Mesh description handed to the renderer at creation.
fn render_desc(cloth: &ClothInstance) -> ClothMeshDesc {
    let fabric = cloth.fabric();
    let edges = fabric
        .phases()
        .iter()
        .filter(|p| p.kind == ConstraintKind::Stretch)
        .flat_map(|p| fabric.constraints()[p.range()].iter().map(|c| [c.a, c.b]))
        .collect();
    ClothMeshDesc {
        positions: cloth.positions().to_vec(),
        inv_masses: cloth.inv_masses().to_vec(),
        indices: fabric.indices().to_vec(),
        quads: Vec::new(),
        edges,
    }
}
