//! Tile handle shared with the LOD engine
//!
//! Tiles are allocated and freed by the external LOD engine; the streaming
//! runtime only reads and writes a tile's render-resources slot, and only
//! through the preparer contract, on the main thread.

use std::sync::{Arc, Mutex};

use crate::core::types::Mat4;
use crate::math::Aabb;
use crate::prepare::RenderResources;

/// Unique identifier for a tile within its tileset
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileId(pub u64);

/// One node in the streamed content hierarchy
pub struct Tile {
    pub id: TileId,
    /// Bounding volume of the tile's content
    pub bounds: Aabb,
    /// Geometric error of this tile's level of detail
    pub geometric_error: f32,
    /// Content-to-tileset transform
    pub transform: Mat4,
    /// Fade-out progress during LOD transitions: 0.0 fully visible,
    /// 1.0 fully faded. Written by the LOD engine.
    pub fade: f32,
    /// Render-resources slot: non-empty iff the tile is resident
    render: Option<RenderResources>,
}

impl Tile {
    pub fn new(id: TileId, bounds: Aabb, geometric_error: f32) -> Self {
        Self {
            id,
            bounds,
            geometric_error,
            transform: Mat4::IDENTITY,
            fade: 0.0,
            render: None,
        }
    }

    /// Whether both load phases have completed and content is attached
    pub fn is_resident(&self) -> bool {
        self.render.is_some()
    }

    pub fn render_content(&self) -> Option<&RenderResources> {
        self.render.as_ref()
    }

    pub fn render_content_mut(&mut self) -> Option<&mut RenderResources> {
        self.render.as_mut()
    }

    /// Install render resources; exactly one set may exist per resident tile
    pub fn attach_render_content(&mut self, resources: RenderResources) {
        assert!(
            self.render.is_none(),
            "tile {:?} already has render resources attached",
            self.id,
        );
        self.render = Some(resources);
    }

    /// Remove and return the attached render resources, if any
    pub fn take_render_content(&mut self) -> Option<RenderResources> {
        self.render.take()
    }
}

/// Shared tile handle
///
/// The LOD engine hands these out in view-update results; the mutex
/// serializes the (main-thread-only) slot writes against traversal reads
/// that may happen on a different thread in a different frame phase.
pub type SharedTile = Arc<Mutex<Tile>>;

/// Wrap a tile for sharing with the LOD engine
pub fn shared(tile: Tile) -> SharedTile {
    Arc::new(Mutex::new(tile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Vec3;
    use crate::prepare::resources::tests::stub_render_resources;

    fn tile() -> Tile {
        Tile::new(
            TileId(1),
            Aabb::from_center_half_extent(Vec3::ZERO, Vec3::splat(10.0)),
            16.0,
        )
    }

    #[test]
    fn test_new_tile_is_not_resident() {
        let t = tile();
        assert!(!t.is_resident());
        assert!(t.render_content().is_none());
        assert_eq!(t.fade, 0.0);
    }

    #[test]
    fn test_attach_take_round_trip() {
        let mut t = tile();
        t.attach_render_content(stub_render_resources());
        assert!(t.is_resident());
        assert!(t.render_content().is_some());

        let taken = t.take_render_content();
        assert!(taken.is_some());
        assert!(!t.is_resident());

        // Taking again yields nothing.
        assert!(t.take_render_content().is_none());
    }

    #[test]
    #[should_panic(expected = "already has render resources")]
    fn test_double_attach_panics() {
        let mut t = tile();
        t.attach_render_content(stub_render_resources());
        t.attach_render_content(stub_render_resources());
    }
}
