//! Consumed content-decoder surface
//!
//! Turning a raw tile payload into a renderable node (glTF-like document
//! parsing, material and texture extraction, vertex-attribute assembly) is
//! an external collaborator's job. The runtime treats the step as opaque.

use crate::core::types::{Mat4, Result};
use crate::render::interface::RenderNode;

/// Raw tile payload as fetched, before decoding
pub struct TileContent {
    pub bytes: Vec<u8>,
    /// Where the payload came from, for diagnostics
    pub source: String,
}

/// Decoded overlay image, ready for texture upload
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 pixels
    pub pixels: Vec<u8>,
}

/// Options applied while building renderable nodes
#[derive(Clone, Copy, Debug)]
pub struct PrepareOptions {
    /// Synthesize normals when the payload omits them
    pub generate_missing_normals: bool,
    /// Flip texture V coordinates during assembly
    pub flip_textures: bool,
}

impl Default for PrepareOptions {
    fn default() -> Self {
        Self {
            generate_missing_normals: true,
            flip_textures: false,
        }
    }
}

/// Builds renderable nodes from raw payloads; called on worker threads
///
/// `Ok(None)` means the payload holds no renderable content — not an error.
/// `Err(Error::Content)` means the payload was malformed; callers treat both
/// the same way (the tile never becomes resident) and log the latter.
pub trait ContentDecoder: Send + Sync {
    /// Decode a tile payload into a renderable node
    fn decode_model(
        &self,
        content: &TileContent,
        transform: Mat4,
        options: &PrepareOptions,
    ) -> Result<Option<Box<dyn RenderNode>>>;

    /// Build a texture node from a decoded overlay image
    fn decode_raster(&self, image: &RasterImage) -> Result<Option<Box<dyn RenderNode>>>;
}
