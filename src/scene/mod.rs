//! CPU-side scene graph

pub mod graph;
pub mod node;

pub use graph::SceneGraph;
pub use node::{LocalTransform, NodeContent, SceneNode, SceneNodeId};
