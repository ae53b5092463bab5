//! Raster overlay layers draped over tile geometry

use std::sync::{Arc, Mutex};

/// One draped imagery layer attached to a tileset
///
/// The layer number doubles as the index into every tile's overlay parameter
/// block, ordered highest-to-lowest at render time. It is assigned when the
/// overlay is added, stays stable for the overlay's lifetime, and is never
/// reused while any tile referencing it is resident. The GPU-side imagery
/// lives in `RasterResources`, keyed by this layer number.
#[derive(Debug)]
pub struct Overlay {
    layer: u32,
    /// Opacity applied to the whole layer
    pub opacity: f32,
}

impl Overlay {
    pub fn new(layer: u32, opacity: f32) -> Self {
        Self { layer, opacity }
    }

    /// Stable layer number, assigned contiguously from 0
    pub fn layer(&self) -> u32 {
        self.layer
    }
}

/// Shared overlay handle, owned jointly by the tileset node and LOD engine
pub type SharedOverlay = Arc<Mutex<Overlay>>;

/// Wrap an overlay for sharing with the LOD engine
pub fn shared(overlay: Overlay) -> SharedOverlay {
    Arc::new(Mutex::new(overlay))
}
