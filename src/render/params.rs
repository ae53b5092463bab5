//! GPU-visible parameter blocks for tiles and overlays
//!
//! Layouts must match the shader structs exactly; vec2 members keep 8-byte
//! alignment and the blocks are padded to 16-byte multiples.

use bytemuck::{Pod, Zeroable};

use crate::core::types::Vec2;
use crate::render::interface::CompileResult;

/// Number of overlay layers a single tile can bind
///
/// Overlay layer numbers index into this array, so they must stay below it.
pub const MAX_OVERLAY_LAYERS: usize = 4;

/// Per-tile uniform data (fade and LOD parameters)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct TileUniform {
    /// Fade-out progress: 0.0 fully visible, 1.0 fully faded (4 bytes, offset 0)
    pub fade: f32,
    /// Geometric error of this tile's LOD level (4 bytes, offset 4)
    pub geometric_error: f32,
    /// Padding to 16 bytes (8 bytes, offset 8)
    pub _pad: [f32; 2],
}

impl TileUniform {
    pub fn new(geometric_error: f32) -> Self {
        Self {
            fade: 0.0,
            geometric_error,
            _pad: [0.0; 2],
        }
    }
}

/// One overlay layer's parameters within a tile's overlay block
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct OverlayLayerUniform {
    /// Texture-coordinate translation (8 bytes, offset 0)
    pub translation: [f32; 2],
    /// Texture-coordinate scale (8 bytes, offset 8)
    pub scale: [f32; 2],
    /// Layer opacity (4 bytes, offset 16)
    pub opacity: f32,
    /// 1 if the layer is bound, 0 if disabled (4 bytes, offset 20)
    pub enabled: u32,
    /// Which texture-coordinate set the layer samples with (4 bytes, offset 24)
    pub coordinate_set: u32,
    /// Padding to 32 bytes (4 bytes, offset 28)
    pub _pad: u32,
}

impl OverlayLayerUniform {
    /// A disabled layer slot
    pub fn disabled() -> Self {
        Self::zeroed()
    }

    pub fn bound(translation: Vec2, scale: Vec2, opacity: f32, coordinate_set: u32) -> Self {
        Self {
            translation: translation.to_array(),
            scale: scale.to_array(),
            opacity,
            enabled: 1,
            coordinate_set,
            _pad: 0,
        }
    }
}

/// The whole per-tile overlay uniform block
///
/// All layers share one GPU binding, which is why overlay attach/detach
/// rebuilds the block as a unit.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct OverlayBlockUniform {
    pub layers: [OverlayLayerUniform; MAX_OVERLAY_LAYERS],
}

impl OverlayBlockUniform {
    /// Block with every layer disabled
    pub fn empty() -> Self {
        Self::zeroed()
    }
}

/// CPU-side copy of a tile's uniform data with dirty tracking
///
/// The per-frame update pushes fade changes here; the renderer re-uploads
/// the block only on frames where `take_dirty` reports a change.
#[derive(Clone, Debug)]
pub struct TileParams {
    uniform: TileUniform,
    dirty: bool,
}

impl TileParams {
    pub fn new(geometric_error: f32) -> Self {
        Self {
            uniform: TileUniform::new(geometric_error),
            // Fresh blocks need an initial upload.
            dirty: true,
        }
    }

    pub fn fade(&self) -> f32 {
        self.uniform.fade
    }

    /// Set the fade value, marking the block dirty only if it changed
    pub fn set_fade(&mut self, fade: f32) {
        if self.uniform.fade != fade {
            self.uniform.fade = fade;
            self.dirty = true;
        }
    }

    pub fn geometric_error(&self) -> f32 {
        self.uniform.geometric_error
    }

    pub fn uniform(&self) -> &TileUniform {
        &self.uniform
    }

    /// Report and clear the dirty flag (called by the renderer after upload)
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

/// A tile's overlay uniform block together with its GPU compile token
#[derive(Clone, Debug)]
pub struct OverlayParamBlock {
    pub uniform: OverlayBlockUniform,
    /// Compile token for the currently bound block; None until first attach
    pub compile: Option<CompileResult>,
}

impl OverlayParamBlock {
    /// Block with every layer disabled and nothing compiled
    pub fn empty() -> Self {
        Self {
            uniform: OverlayBlockUniform::empty(),
            compile: None,
        }
    }
}
