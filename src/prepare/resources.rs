//! Ownership wrappers for the two load phases
//!
//! Each wrapper marks which phase produced it and which thread may hold it:
//! `Prepared*` values belong to the background phase and travel to the main
//! thread exactly once; `RenderResources`/`RasterResources` are main-thread
//! wrappers for content attached to the live scene.

use crate::render::interface::{CompileResult, RenderNode};
use crate::render::params::{OverlayParamBlock, TileParams};

/// Background-phase output for one tile: a renderable node plus the token
/// for its pending GPU compile
///
/// Owned exclusively by the producing thread until handed to
/// `finalize_on_main_thread`.
pub struct PreparedModel {
    pub node: Box<dyn RenderNode>,
    pub compile: CompileResult,
}

/// Main-thread wrapper for a resident tile's attached content
///
/// Exactly one exists per resident tile, stored in the tile's
/// render-resources slot.
pub struct RenderResources {
    pub node: Box<dyn RenderNode>,
    pub compile: CompileResult,
    /// Per-tile GPU parameter block (fade, geometric error)
    pub params: TileParams,
    /// Per-tile overlay parameter block, shared by all overlay layers
    pub overlays: OverlayParamBlock,
}

/// Background-phase output for one overlay image
pub struct PreparedRaster {
    pub texture: Box<dyn RenderNode>,
    pub compile: CompileResult,
    /// Overlay layer this image belongs to
    pub layer: u32,
    pub opacity: f32,
}

/// Main-thread wrapper for one overlay image bound to a tile
///
/// One exists per (tile, overlay layer) pair.
pub struct RasterResources {
    pub texture: Box<dyn RenderNode>,
    pub compile: CompileResult,
    pub layer: u32,
    pub opacity: f32,
}

/// Tagged ownership of a superseded GPU-backed object
///
/// Everything that was ever reachable from a frame's command submission
/// passes through here on its way out; the deferred deletion queue owns the
/// value until destruction becomes safe.
pub enum DeferredResource {
    /// A resident tile's detached render resources
    Resident(RenderResources),
    /// Background output that never reached the main thread
    Prepared(PreparedModel),
    /// A raster image detached from a tile
    Raster(RasterResources),
    /// Raster background output that never reached the main thread
    PreparedRaster(PreparedRaster),
    /// A superseded per-tile overlay parameter block
    OverlayBlock(OverlayParamBlock),
}
