//! Two-phase load/unload pipeline for tile and overlay content

pub mod decoder;
pub mod resources;
pub mod preparer;

pub use decoder::{ContentDecoder, PrepareOptions, RasterImage, TileContent};
pub use resources::{
    DeferredResource, PreparedModel, PreparedRaster, RasterResources, RenderResources,
};
pub use preparer::{GpuResourcePreparer, PrepareRenderResources};
