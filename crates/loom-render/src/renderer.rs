//! Renderer trait and HeadlessRenderer stub.
//!
//! A renderer is initialized once with the cloth's mesh description (to
//! build its static index buffer) and then receives one [`RenderFrame`]
//! per completed simulation step. Frames are copies; a renderer never sees
//! the solver's live buffers.

use loom_math::Vec3;
use loom_mesh::ClothMeshDesc;
use loom_types::LoomResult;

/// Particle positions of one cloth after one step.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    /// Controller step this frame was published by.
    pub frame: u64,
    /// Positions ordered by particle index.
    pub positions: Vec<Vec3>,
}

impl RenderFrame {
    /// Copies `positions` into a new frame.
    pub fn from_positions(frame: u64, positions: &[Vec3]) -> Self {
        Self {
            frame,
            positions: positions.to_vec(),
        }
    }
}

/// Trait for consuming simulation output.
///
/// # Implementations
/// - [`HeadlessRenderer`] - Counts and discards frames (benchmarks, CI)
/// - [`VertexBufferRenderer`](crate::VertexBufferRenderer) - Keeps the latest frame in a shared buffer
/// - [`JsonFrameExporter`](crate::JsonFrameExporter) - Writes every frame to a JSON file
pub trait Renderer: Send {
    /// Initialize the renderer with the mesh topology.
    fn init(&mut self, mesh: &ClothMeshDesc) -> LoomResult<()>;

    /// Submit a frame for rendering.
    fn submit_frame(&mut self, frame: &RenderFrame) -> LoomResult<()>;

    /// Finalize rendering (flush buffers, close files, etc.).
    fn finalize(&mut self) -> LoomResult<()>;

    fn name(&self) -> &str;

    /// Returns the number of frames submitted.
    fn frame_count(&self) -> u64;
}

/// Headless renderer. Discards all frames.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    frames: u64,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for HeadlessRenderer {
    fn init(&mut self, _mesh: &ClothMeshDesc) -> LoomResult<()> {
        Ok(())
    }

    fn submit_frame(&mut self, _frame: &RenderFrame) -> LoomResult<()> {
        self.frames += 1;
        Ok(())
    }

    fn finalize(&mut self) -> LoomResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "headless"
    }

    fn frame_count(&self) -> u64 {
        self.frames
    }
}
