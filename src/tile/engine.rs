//! Consumed LOD/streaming-engine surface
//!
//! The hierarchical level-of-detail selection engine is an external
//! collaborator: given per-view camera state once per frame, it decides
//! which tiles to render, fade, load, and unload, and drives loading through
//! the preparer contract it was constructed with. Everything here is the
//! interface the streaming runtime binds it through.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::types::{Result, UVec2, Vec3};
use crate::prepare::PrepareRenderResources;
use crate::tasks::{MainThreadHandle, TaskRunner};
use crate::tile::overlay::SharedOverlay;
use crate::tile::tile::SharedTile;

/// Frame-scoped snapshot of one camera in the LOD engine's coordinate frame
///
/// Derived each frame from engine camera state; never retained.
#[derive(Clone, Copy, Debug)]
pub struct ViewState {
    pub position: Vec3,
    pub direction: Vec3,
    pub up: Vec3,
    /// Viewport size in pixels
    pub viewport: UVec2,
    /// Horizontal field of view in radians
    pub fov_x: f32,
    /// Vertical field of view in radians
    pub fov_y: f32,
}

/// Tile lists produced by one `update_view` call
///
/// `tiles_to_render` is ordered; the renderer draws in exactly this order.
/// `tiles_fading_out` still hold GPU resources during a cross-fade. Valid
/// for one frame only: holders must replace it on the next `update_view`.
#[derive(Default)]
pub struct ViewUpdateResult {
    pub tiles_to_render: Vec<SharedTile>,
    pub tiles_fading_out: Vec<SharedTile>,
}

/// Where a tileset's content comes from
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum TileSource {
    /// Direct URL to a tileset manifest
    Url(String),
    /// Remote catalog asset with an access token
    Catalog { asset_id: u64, access_token: String },
}

/// Tuning options passed through to the LOD engine
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TilesetOptions {
    /// Screen-space error threshold driving LOD refinement
    pub maximum_screen_space_error: f32,
    /// Cache budget for resident tile content, in bytes
    pub cache_bytes: usize,
    /// Maximum number of simultaneous tile loads
    pub loading_concurrency: usize,
    /// Refuse to render a parent until all visible children are loaded
    pub forbid_holes: bool,
}

impl Default for TilesetOptions {
    fn default() -> Self {
        Self {
            maximum_screen_space_error: 16.0,
            cache_bytes: 512 * 1024 * 1024,
            loading_concurrency: 8,
            forbid_holes: false,
        }
    }
}

impl TilesetOptions {
    /// Parse options from a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Metadata reported by the LOD engine once the tileset manifest loads
#[derive(Clone, Debug)]
pub struct TilesetMetadata {
    pub name: Option<String>,
    pub root_geometric_error: f32,
}

/// Fetches raw tile bytes; called from worker threads
///
/// The wire protocol is the fetcher's concern. A failed fetch surfaces as
/// `Error::Fetch` with a status code and message; the runtime logs it and
/// streaming continues.
pub trait AssetFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// The LOD-engine operations the streaming runtime invokes
///
/// All methods run on the main thread. Completion callbacks passed in are
/// dispatched back on the main-thread queue; teardown is asynchronous and
/// callers must not assume destruction is synchronous with the request.
pub trait LodEngine: Send {
    /// Run tile selection for this frame's views; at most once per frame
    fn update_view(&mut self, views: &[ViewState], delta_time: f32) -> ViewUpdateResult;

    /// Attach an overlay; the engine starts loading imagery for it
    fn add_overlay(&mut self, overlay: SharedOverlay);

    /// Detach an overlay; `on_removed` fires on the main thread once all of
    /// the overlay's in-flight work has drained
    fn remove_overlay(&mut self, overlay: &SharedOverlay, on_removed: Box<dyn FnOnce() + Send>);

    /// Root tile of the hierarchy, once the manifest has loaded
    fn root_tile(&self) -> Option<SharedTile>;

    /// Kick the asynchronous manifest/metadata load
    fn load_metadata(&mut self, on_loaded: Box<dyn FnOnce(Result<TilesetMetadata>) + Send>);

    /// Request asynchronous destruction; `on_destroyed` fires on the main
    /// thread once outstanding background work has been released
    fn request_destroy(&mut self, on_destroyed: Box<dyn FnOnce() + Send>);
}

/// Collaborators handed to the LOD engine at construction
#[derive(Clone)]
pub struct EngineExternals {
    /// The binding point for the two-phase load contract
    pub preparer: Arc<dyn PrepareRenderResources>,
    /// Fetches raw tile and imagery bytes
    pub fetcher: Arc<dyn AssetFetcher>,
    /// Worker pool for decode/build work
    pub tasks: Arc<TaskRunner>,
    /// Queue for completion callbacks that must run on the main thread
    pub main_thread: MainThreadHandle,
}

/// Constructs a LOD engine bound to a source and its collaborators
pub trait LodEngineFactory {
    fn create(
        &self,
        source: &TileSource,
        options: &TilesetOptions,
        externals: EngineExternals,
    ) -> Box<dyn LodEngine>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_default() {
        let options = TilesetOptions::default();
        assert_eq!(options.maximum_screen_space_error, 16.0);
        assert_eq!(options.loading_concurrency, 8);
        assert!(!options.forbid_holes);
    }

    #[test]
    fn test_options_json_round_trip() {
        let options = TilesetOptions {
            maximum_screen_space_error: 4.0,
            cache_bytes: 1024,
            loading_concurrency: 2,
            forbid_holes: true,
        };
        let json = serde_json::to_string(&options).expect("serialize");
        let back = TilesetOptions::from_json(&json).expect("parse");
        assert_eq!(back.maximum_screen_space_error, 4.0);
        assert_eq!(back.cache_bytes, 1024);
        assert_eq!(back.loading_concurrency, 2);
        assert!(back.forbid_holes);
    }

    #[test]
    fn test_options_from_invalid_json_is_config_error() {
        let result = TilesetOptions::from_json("{ not json");
        assert!(result.is_err());
    }

    #[test]
    fn test_source_json_round_trip() {
        let source = TileSource::Catalog {
            asset_id: 42,
            access_token: "token".into(),
        };
        let json = serde_json::to_string(&source).expect("serialize");
        let back: TileSource = serde_json::from_str(&json).expect("parse");
        match back {
            TileSource::Catalog { asset_id, .. } => assert_eq!(asset_id, 42),
            TileSource::Url(_) => panic!("wrong variant"),
        }
    }
}
