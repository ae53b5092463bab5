//! Tilestream - a 3D geospatial tile streaming runtime

pub mod core;
pub mod math;
pub mod tasks;
pub mod render;
pub mod prepare;
pub mod tile;
pub mod scene;
pub mod streaming;
