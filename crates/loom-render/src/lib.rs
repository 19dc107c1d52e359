//! # loom-render
//!
//! The renderer side of the per-frame boundary. After each completed step
//! the controller copies every bound cloth's particle positions into a
//! [`RenderFrame`] and hands it to that cloth's [`Renderer`].
//!
//! Provides a `Renderer` trait with a `HeadlessRenderer` stub, a
//! `VertexBufferRenderer` that owns a shared vertex buffer, and a
//! `JsonFrameExporter` for offline inspection.

pub mod json_exporter;
pub mod renderer;
pub mod vertex_buffer;

pub use json_exporter::JsonFrameExporter;
pub use renderer::{HeadlessRenderer, RenderFrame, Renderer};
pub use vertex_buffer::{SharedVertexBuffer, VertexBuffer, VertexBufferRenderer};
