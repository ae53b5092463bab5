//! Tile stream scene node
//!
//! The bridge between the scene graph and the LOD engine: one node per
//! streamed tileset. Each frame it resolves registered views into the
//! engine's coordinate frame, runs tile selection, pushes fade values into
//! resident tiles' GPU parameters, and exposes the selected tiles for render
//! traversal. Teardown is asynchronous; the engine signals completion
//! through callbacks once in-flight background work has drained.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::core::types::Mat4;
use crate::render::interface::TileVisitor;
use crate::render::params::MAX_OVERLAY_LAYERS;
use crate::scene::{SceneGraph, SceneNodeId};
use crate::streaming::views::{ViewId, ViewRegistrar};
use crate::tile::engine::{
    EngineExternals, LodEngine, LodEngineFactory, TileSource, TilesetMetadata, TilesetOptions,
    ViewState, ViewUpdateResult,
};
use crate::tile::overlay::{self, Overlay, SharedOverlay};
use crate::tile::tile::SharedTile;

/// Where a stream node is in its life cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TeardownState {
    /// Normal operation
    Idle,
    /// `shutdown` requested; background work still draining
    Destroying,
    /// Engine destroyed and every overlay removal drained
    Destroyed,
}

/// Scene node streaming one tileset
pub struct TileStreamNode {
    node_id: SceneNodeId,
    source: TileSource,
    options: TilesetOptions,
    engine: Box<dyn LodEngine>,
    initialized: bool,
    metadata: Arc<Mutex<Option<TilesetMetadata>>>,
    /// Mount-to-stream transform per view, rebuilt by `update_views`
    view_transforms: HashMap<ViewId, Mat4>,
    /// Last frame's selection; what `traverse` walks
    current: ViewUpdateResult,
    overlays: Vec<SharedOverlay>,
    next_overlay_layer: u32,
    pending_overlay_removals: Arc<AtomicUsize>,
    /// Set once `shutdown` has been requested; the flag flips when the
    /// engine reports destruction complete
    teardown: Option<Arc<AtomicBool>>,
}

impl TileStreamNode {
    /// Create the node and its LOD engine; the engine does not start
    /// loading until `initialize`
    pub fn new(
        node_id: SceneNodeId,
        source: TileSource,
        options: TilesetOptions,
        factory: &dyn LodEngineFactory,
        externals: EngineExternals,
    ) -> Self {
        let engine = factory.create(&source, &options, externals);
        Self {
            node_id,
            source,
            options,
            engine,
            initialized: false,
            metadata: Arc::new(Mutex::new(None)),
            view_transforms: HashMap::new(),
            current: ViewUpdateResult::default(),
            overlays: Vec::new(),
            next_overlay_layer: 0,
            pending_overlay_removals: Arc::new(AtomicUsize::new(0)),
            teardown: None,
        }
    }

    /// Scene graph node this stream is anchored at
    pub fn node_id(&self) -> SceneNodeId {
        self.node_id
    }

    pub fn options(&self) -> &TilesetOptions {
        &self.options
    }

    /// Metadata from the tileset manifest, once it has loaded
    pub fn metadata(&self) -> Option<TilesetMetadata> {
        self.metadata
            .lock()
            .expect("metadata lock poisoned")
            .clone()
    }

    /// Root tile of the content hierarchy, once the manifest has loaded
    pub fn root_tile(&self) -> Option<SharedTile> {
        self.engine.root_tile()
    }

    /// Resolve views and kick the asynchronous manifest load
    ///
    /// Call exactly once, after the node has been inserted into the scene
    /// graph.
    pub fn initialize(&mut self, views: &ViewRegistrar, graph: &SceneGraph) {
        assert!(
            !self.initialized,
            "tile stream node {:?} initialized twice",
            self.node_id,
        );
        self.initialized = true;
        self.update_views(views, graph);

        log::info!("loading tileset manifest from {:?}", self.source);
        let slot = self.metadata.clone();
        self.engine.load_metadata(Box::new(move |result| match result {
            Ok(metadata) => {
                log::info!(
                    "tileset {:?} loaded, root geometric error {}",
                    metadata.name,
                    metadata.root_geometric_error,
                );
                *slot.lock().expect("metadata lock poisoned") = Some(metadata);
            }
            Err(e) => log::error!("tileset manifest load failed: {e}"),
        }));
    }

    /// Re-resolve each registered view's mount against the scene graph
    ///
    /// Call when the graph topology or transforms change, before `update`.
    /// Walks the ancestry from the view's camera mount up to this node; a
    /// view whose mount is not beneath this node sees no tileset and is
    /// left out of tile selection.
    pub fn update_views(&mut self, views: &ViewRegistrar, graph: &SceneGraph) {
        self.view_transforms.clear();
        for view in views.views() {
            match graph.ancestry_transform(self.node_id, view.mount) {
                Some(m) => {
                    self.view_transforms.insert(view.id, m);
                }
                None => log::debug!(
                    "view {:?} mount {:?} is not beneath stream node {:?}",
                    view.id,
                    view.mount,
                    self.node_id,
                ),
            }
        }
    }

    /// Per-frame tile selection; call once per frame before traversal
    ///
    /// Pushes each selected tile's fade value into its GPU parameter block
    /// so the re-upload happens only on change.
    pub fn update(&mut self, views: &ViewRegistrar, delta_time: f32) {
        if self.teardown.is_some() || !self.initialized {
            return;
        }

        let states: Vec<ViewState> = views
            .views()
            .iter()
            .filter_map(|v| self.view_transforms.get(&v.id).map(|m| v.view_state(m)))
            .collect();
        if states.is_empty() {
            self.current = ViewUpdateResult::default();
            return;
        }

        let result = self.engine.update_view(&states, delta_time);

        for tile in result
            .tiles_to_render
            .iter()
            .chain(result.tiles_fading_out.iter())
        {
            let mut tile = tile.lock().expect("tile mutex poisoned");
            let fade = tile.fade;
            if let Some(resources) = tile.render_content_mut() {
                resources.params.set_fade(fade);
            }
        }

        self.current = result;
    }

    /// Walk this frame's selected tiles in render order
    ///
    /// Renderable tiles come first, in the engine's order, then fading
    /// tiles that still have any visibility left.
    pub fn traverse(&self, visitor: &mut dyn TileVisitor) {
        for tile in &self.current.tiles_to_render {
            let tile = tile.lock().expect("tile mutex poisoned");
            if let Some(resources) = tile.render_content() {
                visitor.visit(resources);
            }
        }
        for tile in &self.current.tiles_fading_out {
            let tile = tile.lock().expect("tile mutex poisoned");
            if tile.fade >= 1.0 {
                continue;
            }
            if let Some(resources) = tile.render_content() {
                visitor.visit(resources);
            }
        }
    }

    /// Attach a new raster overlay; the engine starts loading its imagery
    ///
    /// Layer numbers are assigned contiguously from 0 and never reused, so
    /// a long-lived node can exhaust the per-tile layer budget.
    pub fn add_overlay(&mut self, opacity: f32) -> SharedOverlay {
        assert!(
            (self.next_overlay_layer as usize) < MAX_OVERLAY_LAYERS,
            "overlay layer budget of {} exhausted",
            MAX_OVERLAY_LAYERS,
        );
        let layer = self.next_overlay_layer;
        self.next_overlay_layer += 1;

        let overlay = overlay::shared(Overlay::new(layer, opacity));
        self.overlays.push(overlay.clone());
        self.engine.add_overlay(overlay.clone());
        log::debug!("overlay layer {layer} attached");
        overlay
    }

    /// Detach an overlay; its in-flight work drains asynchronously
    pub fn remove_overlay(&mut self, overlay: &SharedOverlay) {
        let before = self.overlays.len();
        self.overlays.retain(|o| !Arc::ptr_eq(o, overlay));
        if self.overlays.len() == before {
            log::warn!("remove_overlay called with an overlay not attached to this node");
            return;
        }

        let pending = self.pending_overlay_removals.clone();
        pending.fetch_add(1, Ordering::SeqCst);
        self.engine.remove_overlay(
            overlay,
            Box::new(move || {
                pending.fetch_sub(1, Ordering::SeqCst);
                log::debug!("overlay removal drained");
            }),
        );
    }

    /// Overlay removals whose background work has not drained yet
    pub fn pending_overlay_removals(&self) -> usize {
        self.pending_overlay_removals.load(Ordering::SeqCst)
    }

    /// Begin asynchronous teardown; safe to call more than once
    ///
    /// Detaches every overlay, stops selection and traversal, and asks the
    /// engine to destroy itself once outstanding background work completes.
    pub fn shutdown(&mut self) {
        if self.teardown.is_some() {
            return;
        }

        for overlay in std::mem::take(&mut self.overlays) {
            let pending = self.pending_overlay_removals.clone();
            pending.fetch_add(1, Ordering::SeqCst);
            self.engine.remove_overlay(
                &overlay,
                Box::new(move || {
                    pending.fetch_sub(1, Ordering::SeqCst);
                }),
            );
        }

        self.current = ViewUpdateResult::default();
        self.view_transforms.clear();

        let destroyed = Arc::new(AtomicBool::new(false));
        let flag = destroyed.clone();
        self.engine.request_destroy(Box::new(move || {
            flag.store(true, Ordering::SeqCst);
            log::debug!("tile stream engine destroyed");
        }));
        self.teardown = Some(destroyed);
    }

    pub fn teardown_state(&self) -> TeardownState {
        match &self.teardown {
            None => TeardownState::Idle,
            Some(flag) => {
                if flag.load(Ordering::SeqCst) && self.pending_overlay_removals() == 0 {
                    TeardownState::Destroyed
                } else {
                    TeardownState::Destroying
                }
            }
        }
    }

    /// Whether `shutdown` has been requested
    pub fn is_shutting_down(&self) -> bool {
        self.teardown.is_some()
    }

    /// Whether teardown has fully completed: the engine is destroyed and
    /// every overlay removal has drained
    pub fn is_destroyed(&self) -> bool {
        self.teardown_state() == TeardownState::Destroyed
    }
}
