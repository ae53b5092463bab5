//! Tiles, overlays, and the consumed LOD-engine surface

pub mod tile;
pub mod overlay;
pub mod engine;

pub use tile::{SharedTile, Tile, TileId};
pub use overlay::{Overlay, SharedOverlay};
pub use engine::{
    AssetFetcher, EngineExternals, LodEngine, LodEngineFactory, TileSource, TilesetMetadata,
    TilesetOptions, ViewState, ViewUpdateResult,
};
