//! Renderer that records every published frame and writes the whole
//! animation, with the cloth's triangle indices, to one JSON file when
//! the actor is torn down.

use std::path::{Path, PathBuf};

use loom_mesh::ClothMeshDesc;
use loom_types::{LoomError, LoomResult};
use serde::{Deserialize, Serialize};

use crate::renderer::{RenderFrame, Renderer};

/// Positions of one published frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameData {
    pub frame: u64,
    /// Interleaved `[x0, y0, z0, x1, y1, z1, ...]`.
    pub positions: Vec<f32>,
}

/// File layout of a [`JsonFrameExporter`] export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationData {
    pub particle_count: usize,
    pub triangle_count: usize,
    pub indices: Vec<u32>,
    pub frames: Vec<FrameData>,
}

/// Buffers frames in memory; nothing touches the disk before `finalize`.
/// Frames whose particle count differs from the initialized mesh are
/// rejected.
pub struct JsonFrameExporter {
    output_path: PathBuf,
    indices: Vec<u32>,
    particle_count: usize,
    frames: Vec<FrameData>,
    written: u64,
}

impl JsonFrameExporter {
    pub fn new(output_path: impl AsRef<Path>) -> Self {
        Self {
            output_path: output_path.as_ref().to_path_buf(),
            indices: Vec::new(),
            particle_count: 0,
            frames: Vec::new(),
            written: 0,
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
}

impl Renderer for JsonFrameExporter {
    fn init(&mut self, mesh: &ClothMeshDesc) -> LoomResult<()> {
        self.particle_count = mesh.particle_count();
        self.indices = mesh.indices.clone();
        Ok(())
    }

    fn submit_frame(&mut self, frame: &RenderFrame) -> LoomResult<()> {
        if frame.positions.len() != self.particle_count {
            return Err(LoomError::InvariantViolation(format!(
                "Frame {} has {} particles, export was initialized with {}",
                frame.frame,
                frame.positions.len(),
                self.particle_count
            )));
        }
        let positions = frame.positions.iter().flat_map(|p| p.to_array()).collect();
        self.frames.push(FrameData {
            frame: frame.frame,
            positions,
        });
        Ok(())
    }

    fn finalize(&mut self) -> LoomResult<()> {
        let frames = std::mem::take(&mut self.frames);
        self.written += frames.len() as u64;
        let data = AnimationData {
            particle_count: self.particle_count,
            triangle_count: self.indices.len() / 3,
            indices: self.indices.clone(),
            frames,
        };
        let json = serde_json::to_string(&data)
            .map_err(|e| LoomError::Serialization(format!("Cannot encode frame export: {e}")))?;
        std::fs::write(&self.output_path, json)?;
        tracing::info!(
            path = %self.output_path.display(),
            frames = data.frames.len(),
            "Wrote frame export"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "json_exporter"
    }

    fn frame_count(&self) -> u64 {
        self.written + self.frames.len() as u64
    }
}
