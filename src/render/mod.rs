//! Render-engine interface and GPU resource lifecycle

pub mod interface;
pub mod params;
pub mod deletion;

pub use interface::{CompileResult, RenderEngine, RenderNode, TileVisitor};
pub use params::{
    MAX_OVERLAY_LAYERS, OverlayBlockUniform, OverlayLayerUniform, OverlayParamBlock, TileParams,
    TileUniform,
};
pub use deletion::{DeferredDeletionQueue, SAFETY_MARGIN};
