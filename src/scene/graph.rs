//! Scene graph hierarchy of nodes.
//!
//! The scene graph organizes content with parent/child relationships. Tile
//! stream nodes and camera mounts both live in the tree; view resolution
//! asks the graph for the transform from a camera mount up to its streaming
//! ancestor, so transforms are computed on demand by walking parent links
//! rather than cached.

use std::collections::HashMap;

use crate::core::types::Mat4;

use super::node::{LocalTransform, NodeContent, SceneNode, SceneNodeId};

/// CPU-side scene graph that organizes streamed content into a hierarchy.
pub struct SceneGraph {
    nodes: HashMap<SceneNodeId, SceneNode>,
    root: SceneNodeId,
    next_id: u64,
}

impl SceneGraph {
    /// Create a new scene graph with a root Group node.
    pub fn new() -> Self {
        let root_id = SceneNodeId(0);
        let root_node = SceneNode::new(root_id, "root", NodeContent::Group);

        let mut nodes = HashMap::new();
        nodes.insert(root_id, root_node);

        Self {
            nodes,
            root: root_id,
            next_id: 1,
        }
    }

    /// Get the root node ID.
    pub fn root(&self) -> SceneNodeId {
        self.root
    }

    /// Allocate a fresh node ID.
    fn alloc_id(&mut self) -> SceneNodeId {
        let id = SceneNodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add a child node under `parent`. Returns the new node's ID.
    pub fn add_child(
        &mut self,
        parent: SceneNodeId,
        name: impl Into<String>,
        content: NodeContent,
    ) -> SceneNodeId {
        let id = self.alloc_id();
        let mut node = SceneNode::new(id, name, content);
        node.parent = Some(parent);

        self.nodes.insert(id, node);

        // Register as child of parent
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.push(id);
        }

        id
    }

    /// Remove a node and its entire subtree. Cannot remove the root.
    pub fn remove(&mut self, id: SceneNodeId) {
        if id == self.root {
            return;
        }

        // Collect subtree IDs (BFS)
        let mut to_remove = vec![id];
        let mut i = 0;
        while i < to_remove.len() {
            let current = to_remove[i];
            if let Some(node) = self.nodes.get(&current) {
                to_remove.extend_from_slice(&node.children);
            }
            i += 1;
        }

        // Detach from parent
        if let Some(node) = self.nodes.get(&id) {
            if let Some(parent_id) = node.parent {
                if let Some(parent) = self.nodes.get_mut(&parent_id) {
                    parent.children.retain(|c| *c != id);
                }
            }
        }

        // Remove all nodes in subtree
        for nid in to_remove {
            self.nodes.remove(&nid);
        }
    }

    /// Move a node to a new parent. Cannot reparent the root, and a node
    /// cannot be moved into its own subtree.
    pub fn reparent(&mut self, id: SceneNodeId, new_parent: SceneNodeId) {
        if id == self.root || self.is_ancestor(id, new_parent) {
            return;
        }

        // Detach from old parent
        if let Some(node) = self.nodes.get(&id) {
            if let Some(old_parent_id) = node.parent {
                if let Some(old_parent) = self.nodes.get_mut(&old_parent_id) {
                    old_parent.children.retain(|c| *c != id);
                }
            }
        }

        // Attach to new parent
        if let Some(new_parent_node) = self.nodes.get_mut(&new_parent) {
            new_parent_node.children.push(id);
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = Some(new_parent);
        }
    }

    /// Set the local transform of a node.
    pub fn set_transform(&mut self, id: SceneNodeId, transform: LocalTransform) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.local_transform = transform;
        }
    }

    /// Get an immutable reference to a node.
    pub fn get(&self, id: SceneNodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    /// Get a mutable reference to a node.
    pub fn get_mut(&mut self, id: SceneNodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    /// Iterate over the children of a node.
    pub fn children(&self, id: SceneNodeId) -> impl Iterator<Item = SceneNodeId> + '_ {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
            .iter()
            .copied()
    }

    /// Total number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether `ancestor` lies on the parent chain of `id` (or equals it).
    pub fn is_ancestor(&self, ancestor: SceneNodeId, id: SceneNodeId) -> bool {
        let mut current = Some(id);
        while let Some(cid) = current {
            if cid == ancestor {
                return true;
            }
            current = self.nodes.get(&cid).and_then(|n| n.parent);
        }
        false
    }

    /// Transform mapping `descendant`-local coordinates into
    /// `ancestor`-local coordinates.
    ///
    /// Walks the parent chain upward, accumulating local transforms. Returns
    /// None if `ancestor` is not on `descendant`'s path to the root. Equal
    /// IDs yield the identity.
    pub fn ancestry_transform(
        &self,
        ancestor: SceneNodeId,
        descendant: SceneNodeId,
    ) -> Option<Mat4> {
        let mut m = Mat4::IDENTITY;
        let mut current = descendant;
        loop {
            if current == ancestor {
                return Some(m);
            }
            let node = self.nodes.get(&current)?;
            m = node.local_transform.to_mat4() * m;
            current = node.parent?;
        }
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}
