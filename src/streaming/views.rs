//! Render views and their registry
//!
//! A render view pairs a camera with the scene node it is mounted on. Views
//! are registered up front and resolved against the scene graph each frame:
//! the camera pose composed with the mount's transform chain yields the
//! frame-scoped view state handed to the LOD engine.

use crate::core::camera::Camera;
use crate::core::types::{Mat4, UVec2, Vec3};
use crate::scene::SceneNodeId;
use crate::tile::engine::ViewState;

/// Unique identifier for a registered render view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ViewId(pub u32);

/// One camera rendering streamed content
pub struct RenderView {
    pub id: ViewId,
    /// Scene node the camera is mounted on
    pub mount: SceneNodeId,
    pub camera: Camera,
    /// Viewport size in pixels
    pub viewport: UVec2,
}

impl RenderView {
    /// Snapshot this view in a tile stream's coordinate frame
    ///
    /// `mount_to_stream` maps mount-local coordinates into the stream
    /// node's frame; the camera pose composes on top of it.
    pub fn view_state(&self, mount_to_stream: &Mat4) -> ViewState {
        let pose = *mount_to_stream * self.camera.pose_matrix();

        ViewState {
            position: pose.transform_point3(Vec3::ZERO),
            direction: pose.transform_vector3(-Vec3::Z).normalize(),
            up: pose.transform_vector3(Vec3::Y).normalize(),
            viewport: self.viewport,
            fov_x: self.camera.fov_x(),
            fov_y: self.camera.fov_y,
        }
    }
}

/// Registry of the render views streaming content is selected for
///
/// IDs are assigned once and never reused; per-frame view state is derived
/// from the registered views in registration order.
pub struct ViewRegistrar {
    views: Vec<RenderView>,
    next_id: u32,
}

impl ViewRegistrar {
    pub fn new() -> Self {
        Self {
            views: Vec::new(),
            next_id: 0,
        }
    }

    /// Register a view; returns its stable ID
    pub fn add_view(&mut self, mount: SceneNodeId, camera: Camera, viewport: UVec2) -> ViewId {
        let id = ViewId(self.next_id);
        self.next_id += 1;
        self.views.push(RenderView {
            id,
            mount,
            camera,
            viewport,
        });
        id
    }

    /// Unregister a view; unknown IDs are ignored
    pub fn remove_view(&mut self, id: ViewId) {
        self.views.retain(|v| v.id != id);
    }

    pub fn get(&self, id: ViewId) -> Option<&RenderView> {
        self.views.iter().find(|v| v.id == id)
    }

    pub fn get_mut(&mut self, id: ViewId) -> Option<&mut RenderView> {
        self.views.iter_mut().find(|v| v.id == id)
    }

    /// Views in registration order
    pub fn views(&self) -> &[RenderView] {
        &self.views
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

impl Default for ViewRegistrar {
    fn default() -> Self {
        Self::new()
    }
}
