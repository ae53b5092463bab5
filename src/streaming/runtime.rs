//! Frame-loop services for tile streaming
//!
//! Owns the pieces every tile stream node shares: the worker pool, the
//! main-thread queue, the resource preparer, and frame timing. The host
//! render loop calls `begin_frame` before updating stream nodes and
//! `end_frame` after submission.

use std::sync::Arc;

use crate::core::time::FrameTimer;
use crate::core::types::Result;
use crate::prepare::{ContentDecoder, GpuResourcePreparer, PrepareOptions, TileContent};
use crate::render::interface::RenderEngine;
use crate::tasks::{MainThreadQueue, TaskRunner};
use crate::tile::engine::{AssetFetcher, EngineExternals};
use crate::tile::tile::SharedTile;

pub struct StreamingRuntime {
    tasks: Arc<TaskRunner>,
    queue: MainThreadQueue,
    preparer: Arc<GpuResourcePreparer>,
    engine: Arc<dyn RenderEngine>,
    fetcher: Arc<dyn AssetFetcher>,
    timer: FrameTimer,
}

impl StreamingRuntime {
    pub fn new(
        engine: Arc<dyn RenderEngine>,
        decoder: Arc<dyn ContentDecoder>,
        fetcher: Arc<dyn AssetFetcher>,
        options: PrepareOptions,
        worker_threads: usize,
    ) -> Self {
        let preparer = Arc::new(GpuResourcePreparer::new(engine.clone(), decoder, options));
        Self {
            tasks: Arc::new(TaskRunner::new(worker_threads)),
            queue: MainThreadQueue::new(),
            preparer,
            engine,
            fetcher,
            timer: FrameTimer::new(),
        }
    }

    /// Collaborators for constructing a LOD engine
    pub fn externals(&self) -> EngineExternals {
        EngineExternals {
            preparer: self.preparer.clone(),
            fetcher: self.fetcher.clone(),
            tasks: self.tasks.clone(),
            main_thread: self.queue.handle(),
        }
    }

    pub fn preparer(&self) -> &Arc<GpuResourcePreparer> {
        &self.preparer
    }

    pub fn tasks(&self) -> &Arc<TaskRunner> {
        &self.tasks
    }

    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    /// Start a frame: advance timing and run queued main-thread completions
    ///
    /// Returns the frame's delta time in seconds, for tile selection.
    pub fn begin_frame(&mut self) -> f32 {
        self.timer.tick();
        let ran = self.queue.dispatch();
        if ran > 0 {
            log::trace!("ran {ran} main-thread completions");
        }
        self.timer.delta_secs()
    }

    /// End a frame: destroy deferred resources that are old enough
    pub fn end_frame(&mut self) {
        self.preparer.collect(self.engine.frame_count());
    }

    /// Load one tile synchronously, pumping completions until it finishes
    ///
    /// The tile's own content-to-tileset transform positions the decoded
    /// content.
    pub fn load_tile_now(&mut self, tile: &SharedTile, content: TileContent) -> Result<()> {
        self.preparer
            .load_now(&self.tasks, &mut self.queue, tile, content)
    }

    /// Tear down: run remaining completions, destroy everything deferred,
    /// and stop the worker pool
    pub fn shutdown(mut self) {
        self.queue.dispatch();
        self.preparer.flush();
        self.tasks.shutdown();
    }
}
