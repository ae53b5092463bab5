//! Two-phase resource preparation
//!
//! Per tile: `Requested -> BackgroundPrepared -> MainThreadAttached ->
//! (Resident) -> Detaching -> Freed`. The background phase decodes and
//! submits GPU compilation without touching live scene state; the main-thread
//! phase applies the compile and attaches the result between frames. Raster
//! overlay images follow the same shape. Nothing is ever destroyed inline:
//! superseded objects go to the deferred deletion queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::core::error::Error;
use crate::core::types::{Mat4, Result, Vec2};
use crate::prepare::decoder::{ContentDecoder, PrepareOptions, RasterImage, TileContent};
use crate::prepare::resources::{
    DeferredResource, PreparedModel, PreparedRaster, RasterResources, RenderResources,
};
use crate::render::deletion::DeferredDeletionQueue;
use crate::render::interface::RenderEngine;
use crate::render::params::{
    MAX_OVERLAY_LAYERS, OverlayLayerUniform, OverlayParamBlock, TileParams,
};
use crate::tasks::{MainThreadQueue, TaskRunner};
use crate::tile::overlay::Overlay;
use crate::tile::tile::{SharedTile, Tile};

/// How long the synchronous load helper pumps before giving up
const SYNC_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// A failed GPU compile is a setup bug, not a runtime condition. This runs
/// on a worker thread whose panics are contained, so it must not unwind.
fn fatal_compile_error(what: &str, e: Error) -> ! {
    log::error!("GPU compile failed for {what}: {e}");
    std::process::abort();
}

/// The binding point handed to the LOD engine: the two-phase load/unload
/// contract for tile content and raster overlay imagery
///
/// `prepare_*` methods run on worker threads; everything else is
/// main-thread-only. A `None` from a background phase means "no render
/// content" — the tile or raster simply never becomes resident.
pub trait PrepareRenderResources: Send + Sync {
    /// Decode a payload and submit its node for GPU compilation
    fn prepare_in_background(
        &self,
        content: TileContent,
        transform: Mat4,
    ) -> Option<PreparedModel>;

    /// Apply the pending compile and attach the content to the tile
    ///
    /// After this returns, the node is safe for render traversal; the
    /// resources live in the tile's render slot.
    fn finalize_on_main_thread(&self, tile: &mut Tile, prepared: PreparedModel);

    /// Release a tile's resources on unload or reload
    ///
    /// Both phase results are independently nullable: a tile may be freed
    /// having reached only one phase, or neither. Anything still attached to
    /// the tile's render slot is released as well.
    fn release(
        &self,
        tile: &mut Tile,
        background: Option<PreparedModel>,
        main_thread: Option<RenderResources>,
    );

    /// Build and submit a texture for one overlay image
    fn prepare_raster_in_background(
        &self,
        image: RasterImage,
        overlay: &Overlay,
    ) -> Option<PreparedRaster>;

    /// Apply the pending texture compile
    fn finalize_raster_on_main_thread(&self, prepared: PreparedRaster) -> RasterResources;

    /// Release one overlay image's resources
    fn release_raster(
        &self,
        background: Option<PreparedRaster>,
        main_thread: Option<RasterResources>,
    );

    /// Bind a raster image to its layer slot on a resident tile
    ///
    /// Rebuilds the tile's whole overlay parameter block (all layers share
    /// one binding), preserving every other layer, and defers the old block.
    fn attach_overlay(
        &self,
        tile: &mut Tile,
        coordinate_set: u32,
        raster: &RasterResources,
        translation: Vec2,
        scale: Vec2,
    );

    /// Unbind a raster image's layer slot, rebuilding the block with that
    /// layer disabled
    fn detach_overlay(&self, tile: &mut Tile, raster: &RasterResources);
}

/// Production preparer: decodes through the content decoder, compiles
/// through the render engine, and owns the deferred deletion queue
pub struct GpuResourcePreparer {
    engine: Arc<dyn RenderEngine>,
    decoder: Arc<dyn ContentDecoder>,
    options: PrepareOptions,
    deletion: Mutex<DeferredDeletionQueue>,
}

impl GpuResourcePreparer {
    pub fn new(
        engine: Arc<dyn RenderEngine>,
        decoder: Arc<dyn ContentDecoder>,
        options: PrepareOptions,
    ) -> Self {
        Self {
            engine,
            decoder,
            options,
            deletion: Mutex::new(DeferredDeletionQueue::new()),
        }
    }

    /// Run deferred deletion for this frame (main thread, once per frame)
    pub fn collect(&self, frame: u64) {
        self.deletion
            .lock()
            .expect("deletion queue lock poisoned")
            .collect(frame);
    }

    /// Destroy everything still waiting (shutdown path)
    pub fn flush(&self) {
        self.deletion
            .lock()
            .expect("deletion queue lock poisoned")
            .flush();
    }

    /// Number of resources awaiting deferred destruction
    pub fn deferred_len(&self) -> usize {
        self.deletion
            .lock()
            .expect("deletion queue lock poisoned")
            .len()
    }

    fn defer(&self, resource: DeferredResource) {
        let frame = self.engine.frame_count();
        self.deletion
            .lock()
            .expect("deletion queue lock poisoned")
            .enqueue(frame, resource);
    }

    /// Load a single tile synchronously: schedule the background phase,
    /// pump the main-thread queue until the finalize posted back by the
    /// worker has run
    ///
    /// Pumping is what prevents this path from deadlocking against its own
    /// completion. The tile's content-to-tileset transform is captured at
    /// call time. The tile ends up resident unless the payload had no
    /// render content.
    pub fn load_now(
        self: &Arc<Self>,
        tasks: &TaskRunner,
        queue: &mut MainThreadQueue,
        tile: &SharedTile,
        content: TileContent,
    ) -> Result<()> {
        let transform = tile.lock().expect("tile mutex poisoned").transform;
        let done = Arc::new(AtomicBool::new(false));

        let handle = queue.handle();
        let preparer = self.clone();
        let tile = tile.clone();
        let flag = done.clone();
        tasks.schedule(move || {
            let prepared = preparer.prepare_in_background(content, transform);
            handle.post(move || {
                if let Some(prepared) = prepared {
                    let mut tile = tile.lock().expect("tile mutex poisoned");
                    preparer.finalize_on_main_thread(&mut tile, prepared);
                }
                flag.store(true, Ordering::SeqCst);
            });
        });

        if queue.pump_until(SYNC_LOAD_TIMEOUT, move || done.load(Ordering::SeqCst)) {
            Ok(())
        } else {
            Err(Error::Lifecycle("synchronous tile load timed out".into()))
        }
    }

    /// Rebuild a tile's overlay block with `patch` applied to one layer slot
    fn rebuild_overlay_block(&self, tile: &mut Tile, layer: u32, patch: OverlayLayerUniform) {
        assert!(
            (layer as usize) < MAX_OVERLAY_LAYERS,
            "overlay layer {} exceeds the parameter block size {}",
            layer,
            MAX_OVERLAY_LAYERS,
        );

        let Some(resources) = tile.render_content_mut() else {
            log::warn!(
                "overlay layer {} touched on tile {:?} with no render content",
                layer,
                tile.id,
            );
            return;
        };

        // All layers share one binding, so the whole block is rebuilt and
        // recompiled; the superseded block may still be referenced by an
        // in-flight frame.
        let mut uniform = resources.overlays.uniform;
        uniform.layers[layer as usize] = patch;

        let compile = self
            .engine
            .compile_uniform(bytemuck::bytes_of(&uniform))
            .unwrap_or_else(|e| fatal_compile_error("overlay block", e));

        let old = std::mem::replace(
            &mut resources.overlays,
            OverlayParamBlock {
                uniform,
                compile: Some(compile),
            },
        );
        self.defer(DeferredResource::OverlayBlock(old));
    }
}

impl PrepareRenderResources for GpuResourcePreparer {
    fn prepare_in_background(
        &self,
        content: TileContent,
        transform: Mat4,
    ) -> Option<PreparedModel> {
        let node = match self.decoder.decode_model(&content, transform, &self.options) {
            Ok(Some(node)) => node,
            Ok(None) => {
                log::debug!("tile payload from {} has no render content", content.source);
                return None;
            }
            Err(e) => {
                // Malformed content is recoverable: the tile just never
                // becomes resident.
                log::warn!("failed to decode tile payload from {}: {e}", content.source);
                return None;
            }
        };

        let compile = self
            .engine
            .compile_node(node.as_ref())
            .unwrap_or_else(|e| fatal_compile_error(node.label(), e));

        Some(PreparedModel { node, compile })
    }

    fn finalize_on_main_thread(&self, tile: &mut Tile, prepared: PreparedModel) {
        self.engine.apply(&prepared.compile);

        let mut params = TileParams::new(tile.geometric_error);
        params.set_fade(tile.fade);

        log::debug!("tile {:?} resident ({})", tile.id, prepared.node.label());
        tile.attach_render_content(RenderResources {
            node: prepared.node,
            compile: prepared.compile,
            params,
            overlays: OverlayParamBlock::empty(),
        });
    }

    fn release(
        &self,
        tile: &mut Tile,
        background: Option<PreparedModel>,
        main_thread: Option<RenderResources>,
    ) {
        if let Some(prepared) = background {
            self.defer(DeferredResource::Prepared(prepared));
        }
        if let Some(resources) = main_thread {
            self.defer(DeferredResource::Resident(resources));
        }
        // Whatever is still attached goes too, keeping the slot invariant:
        // no render content on a freed tile.
        if let Some(resources) = tile.take_render_content() {
            self.defer(DeferredResource::Resident(resources));
        }
    }

    fn prepare_raster_in_background(
        &self,
        image: RasterImage,
        overlay: &Overlay,
    ) -> Option<PreparedRaster> {
        let texture = match self.decoder.decode_raster(&image) {
            Ok(Some(texture)) => texture,
            Ok(None) => return None,
            Err(e) => {
                log::warn!(
                    "failed to decode {}x{} overlay image for layer {}: {e}",
                    image.width,
                    image.height,
                    overlay.layer(),
                );
                return None;
            }
        };

        let compile = self
            .engine
            .compile_node(texture.as_ref())
            .unwrap_or_else(|e| fatal_compile_error(texture.label(), e));

        Some(PreparedRaster {
            texture,
            compile,
            layer: overlay.layer(),
            opacity: overlay.opacity,
        })
    }

    fn finalize_raster_on_main_thread(&self, prepared: PreparedRaster) -> RasterResources {
        self.engine.apply(&prepared.compile);
        RasterResources {
            texture: prepared.texture,
            compile: prepared.compile,
            layer: prepared.layer,
            opacity: prepared.opacity,
        }
    }

    fn release_raster(
        &self,
        background: Option<PreparedRaster>,
        main_thread: Option<RasterResources>,
    ) {
        if let Some(prepared) = background {
            self.defer(DeferredResource::PreparedRaster(prepared));
        }
        if let Some(resources) = main_thread {
            self.defer(DeferredResource::Raster(resources));
        }
    }

    fn attach_overlay(
        &self,
        tile: &mut Tile,
        coordinate_set: u32,
        raster: &RasterResources,
        translation: Vec2,
        scale: Vec2,
    ) {
        self.rebuild_overlay_block(
            tile,
            raster.layer,
            OverlayLayerUniform::bound(translation, scale, raster.opacity, coordinate_set),
        );
    }

    fn detach_overlay(&self, tile: &mut Tile, raster: &RasterResources) {
        self.rebuild_overlay_block(tile, raster.layer, OverlayLayerUniform::disabled());
    }
}
