//! Renderer that owns a vertex buffer readable from other threads.
//!
//! Stands in for a GPU vertex buffer: `init` uploads the static index
//! buffer, every frame overwrites the positions. Readers clone the
//! [`SharedVertexBuffer`] handle and take a snapshot whenever they like.

use std::sync::{Arc, Mutex, PoisonError};

use loom_math::Vec3;
use loom_mesh::ClothMeshDesc;
use loom_types::{LoomError, LoomResult};

use crate::renderer::{RenderFrame, Renderer};

/// CPU copy of a cloth's render buffers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexBuffer {
    pub indices: Vec<u32>,
    pub positions: Vec<Vec3>,
    /// Frame number of the last upload (`None` before the first frame).
    pub frame: Option<u64>,
}

/// Cloneable handle to a renderer's vertex buffer.
#[derive(Debug, Clone, Default)]
pub struct SharedVertexBuffer(Arc<Mutex<VertexBuffer>>);

impl SharedVertexBuffer {
    /// Copy of the current buffer contents.
    pub fn snapshot(&self) -> VertexBuffer {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn update<R>(&self, f: impl FnOnce(&mut VertexBuffer) -> R) -> R {
        f(&mut self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Keeps the most recent frame in a [`SharedVertexBuffer`].
#[derive(Debug, Default)]
pub struct VertexBufferRenderer {
    buffer: SharedVertexBuffer,
    frames: u64,
}

impl VertexBufferRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for reading the buffer after the renderer has been moved
    /// into an actor.
    pub fn buffer(&self) -> SharedVertexBuffer {
        self.buffer.clone()
    }
}

impl Renderer for VertexBufferRenderer {
    fn init(&mut self, mesh: &ClothMeshDesc) -> LoomResult<()> {
        self.buffer.update(|b| {
            b.indices = mesh.indices.clone();
            b.positions = mesh.positions.clone();
            b.frame = None;
        });
        Ok(())
    }

    fn submit_frame(&mut self, frame: &RenderFrame) -> LoomResult<()> {
        self.buffer.update(|b| {
            if b.positions.len() != frame.positions.len() {
                return Err(LoomError::InvariantViolation(format!(
                    "Frame has {} positions, vertex buffer holds {}",
                    frame.positions.len(),
                    b.positions.len()
                )));
            }
            b.positions.copy_from_slice(&frame.positions);
            b.frame = Some(frame.frame);
            Ok(())
        })?;
        self.frames += 1;
        Ok(())
    }

    fn finalize(&mut self) -> LoomResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "vertex_buffer"
    }

    fn frame_count(&self) -> u64 {
        self.frames
    }
}
