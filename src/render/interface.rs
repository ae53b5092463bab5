//! Consumed render-engine surface
//!
//! The rendering engine itself (command graph, views, GPU submission) is an
//! external collaborator. The streaming runtime needs exactly three things
//! from it: a way to submit an object for GPU compilation and get a result
//! token back, a way to apply that result to live render state on the main
//! thread, and a monotonically increasing frame counter.

use crate::core::types::Result;

/// A renderable scene node produced by the content decoder
///
/// Opaque to the streaming runtime: it is compiled, attached, traversed, and
/// eventually handed to the deferred deletion queue, never inspected.
pub trait RenderNode: Send {
    /// Short label for logging
    fn label(&self) -> &str;
}

/// Token identifying one GPU compile submission
///
/// Produced on a background thread by `compile_node`/`compile_uniform` and
/// applied to live render state on the main thread.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileResult {
    pub token: u64,
}

/// The render-engine operations the streaming runtime depends on
///
/// Compile submissions may happen on worker threads; `apply` and
/// `frame_count` are main-thread calls. Compile failures indicate device or
/// resource-limit violations the application should have avoided through
/// resource hints, so callers treat them as fatal.
pub trait RenderEngine: Send + Sync {
    /// Record a renderable node for GPU compilation
    fn compile_node(&self, node: &dyn RenderNode) -> Result<CompileResult>;

    /// Record a raw uniform block (e.g. overlay parameters) for upload
    fn compile_uniform(&self, bytes: &[u8]) -> Result<CompileResult>;

    /// Apply a recorded compile result to live render state (main thread)
    fn apply(&self, result: &CompileResult);

    /// Current render frame number, monotonically non-decreasing
    fn frame_count(&self) -> u64;
}

/// Visitor invoked by tile traversal for each renderable tile
///
/// Traversal passes the tile's render resources directly; consumers that
/// need the per-tile GPU parameter block read it from there instead of
/// downcasting scene nodes.
pub trait TileVisitor {
    fn visit(&mut self, resources: &crate::prepare::RenderResources);
}
