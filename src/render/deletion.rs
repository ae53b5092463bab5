//! Deferred destruction of superseded GPU resources
//!
//! The render pipeline keeps 2-3 frames in flight: command buffers already
//! recorded and queued for the GPU may still reference a resource after the
//! scene graph has dropped it. Destroying such a resource synchronously is
//! undefined behavior, so superseded objects sit here until enough frames
//! have elapsed that no in-flight submission can reference them.

use std::collections::VecDeque;

use crate::prepare::resources::DeferredResource;

/// Frames an entry must wait before destruction
///
/// Must be at least the render pipeline's in-flight frame depth.
pub const SAFETY_MARGIN: u64 = 3;

struct Entry {
    frame_removed: u64,
    resource: DeferredResource,
}

/// FIFO of GPU-backed objects awaiting destruction
///
/// Entries are appended with non-decreasing frame numbers, so `collect` only
/// has to scan a prefix from the front: the first ineligible entry ends the
/// scan. All mutation happens on the main thread.
pub struct DeferredDeletionQueue {
    entries: VecDeque<Entry>,
    last_collect_frame: u64,
}

impl DeferredDeletionQueue {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            last_collect_frame: 0,
        }
    }

    /// Append an object removed from the scene at `frame`
    pub fn enqueue(&mut self, frame: u64, resource: DeferredResource) {
        if let Some(back) = self.entries.back() {
            assert!(
                frame >= back.frame_removed,
                "deferred deletion enqueued out of frame order ({} < {})",
                frame,
                back.frame_removed,
            );
        }
        self.entries.push_back(Entry {
            frame_removed: frame,
            resource,
        });
    }

    /// Destroy every entry old enough that no in-flight frame references it
    ///
    /// Call once per frame with the render engine's frame counter. A repeat
    /// of the previous frame number is a no-op; going backwards is a
    /// lifecycle error.
    pub fn collect(&mut self, frame: u64) {
        assert!(
            frame >= self.last_collect_frame,
            "deferred deletion collected with a decreasing frame counter ({} < {})",
            frame,
            self.last_collect_frame,
        );
        if frame == self.last_collect_frame {
            return;
        }
        self.last_collect_frame = frame;

        while let Some(front) = self.entries.front() {
            if front.frame_removed + SAFETY_MARGIN > frame {
                break;
            }
            let entry = self.entries.pop_front();
            drop(entry);
        }
    }

    /// Unconditionally destroy everything (shutdown path)
    pub fn flush(&mut self) {
        if !self.entries.is_empty() {
            log::debug!("flushing {} deferred resources", self.entries.len());
        }
        self.entries.clear();
    }

    /// Number of objects still waiting
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for DeferredDeletionQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prepare::resources::PreparedModel;
    use crate::render::interface::{CompileResult, RenderNode};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// RenderNode stub that counts drops
    struct DropProbe {
        drops: Arc<AtomicUsize>,
    }

    impl RenderNode for DropProbe {
        fn label(&self) -> &str {
            "drop-probe"
        }
    }

    impl Drop for DropProbe {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn probe(drops: &Arc<AtomicUsize>) -> DeferredResource {
        DeferredResource::Prepared(PreparedModel {
            node: Box::new(DropProbe {
                drops: drops.clone(),
            }),
            compile: CompileResult { token: 0 },
        })
    }

    #[test]
    fn test_not_destroyed_before_safety_margin() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut queue = DeferredDeletionQueue::new();

        queue.enqueue(10, probe(&drops));

        // Every frame strictly below 10 + SAFETY_MARGIN must keep it alive.
        for frame in 11..(10 + SAFETY_MARGIN) {
            queue.collect(frame);
            assert_eq!(drops.load(Ordering::SeqCst), 0, "destroyed at frame {frame}");
        }

        queue.collect(10 + SAFETY_MARGIN);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_prefix_draining_is_exact() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut queue = DeferredDeletionQueue::new();

        queue.enqueue(1, probe(&drops));
        queue.enqueue(1, probe(&drops));
        queue.enqueue(2, probe(&drops));
        queue.enqueue(5, probe(&drops));

        // Frame 1 + margin: exactly the two frame-1 entries go.
        queue.collect(1 + SAFETY_MARGIN);
        assert_eq!(drops.load(Ordering::SeqCst), 2);
        assert_eq!(queue.len(), 2);

        // Frame 2 + margin: the frame-2 entry goes, frame-5 stays.
        queue.collect(2 + SAFETY_MARGIN);
        assert_eq!(drops.load(Ordering::SeqCst), 3);
        assert_eq!(queue.len(), 1);

        queue.collect(5 + SAFETY_MARGIN);
        assert_eq!(drops.load(Ordering::SeqCst), 4);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_repeat_frame_is_noop() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut queue = DeferredDeletionQueue::new();

        queue.collect(7);
        queue.enqueue(7, probe(&drops));

        // Same frame again: nothing may happen, even though nothing is
        // eligible anyway; the no-op path must not advance state.
        queue.collect(7);
        assert_eq!(queue.len(), 1);
        assert_eq!(drops.load(Ordering::SeqCst), 0);
    }

    #[test]
    #[should_panic(expected = "decreasing frame counter")]
    fn test_collect_backwards_panics() {
        let mut queue = DeferredDeletionQueue::new();
        queue.collect(10);
        queue.collect(9);
    }

    #[test]
    #[should_panic(expected = "out of frame order")]
    fn test_enqueue_backwards_panics() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut queue = DeferredDeletionQueue::new();
        queue.enqueue(5, probe(&drops));
        queue.enqueue(4, probe(&drops));
    }

    #[test]
    fn test_flush_destroys_everything() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut queue = DeferredDeletionQueue::new();

        queue.enqueue(100, probe(&drops));
        queue.enqueue(101, probe(&drops));

        queue.flush();
        assert_eq!(drops.load(Ordering::SeqCst), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_skipped_collects_are_safe() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut queue = DeferredDeletionQueue::new();

        queue.enqueue(1, probe(&drops));

        // Several frames with no collect call, then a late one: the object
        // just waits longer.
        queue.collect(50);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }
}
