//! Tile streaming: views, stream nodes, and the frame-loop runtime

pub mod node;
pub mod runtime;
pub mod views;

pub use node::{TeardownState, TileStreamNode};
pub use runtime::StreamingRuntime;
pub use views::{RenderView, ViewId, ViewRegistrar};
