//! Main-thread task queue
//!
//! Background workers never touch scene-graph or GPU-submission state
//! directly; they post closures here instead. The render loop drains the
//! queue once per frame, between the update phase and traversal.

use std::time::{Duration, Instant};

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

type MainTask = Box<dyn FnOnce() + Send>;

/// Clonable handle for posting tasks to the main thread
///
/// Safe to hold on any thread; posting never blocks.
#[derive(Clone)]
pub struct MainThreadHandle {
    tx: UnboundedSender<MainTask>,
}

impl MainThreadHandle {
    /// Post a closure to run on the next main-thread dispatch
    ///
    /// Tasks posted after the queue itself has been dropped are discarded.
    pub fn post<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.tx.send(Box::new(task)).is_err() {
            log::debug!("main-thread queue closed; task discarded");
        }
    }
}

/// Queue of closures to execute on the main/render thread
pub struct MainThreadQueue {
    tx: UnboundedSender<MainTask>,
    rx: UnboundedReceiver<MainTask>,
}

impl MainThreadQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded_channel();
        Self { tx, rx }
    }

    /// Get a handle for posting from other threads
    pub fn handle(&self) -> MainThreadHandle {
        MainThreadHandle {
            tx: self.tx.clone(),
        }
    }

    /// Execute every task currently queued; returns how many ran
    ///
    /// Call once per frame from the main thread. Tasks posted while
    /// dispatching run in the same drain.
    pub fn dispatch(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Dispatch repeatedly until `done` returns true or `timeout` elapses
    ///
    /// This is the pump used by synchronous load paths: a caller blocking on
    /// the completion of work it scheduled itself must keep draining the
    /// queue, or the completion it is waiting for can never run.
    ///
    /// Returns true if `done` was observed before the timeout.
    pub fn pump_until<F>(&mut self, timeout: Duration, done: F) -> bool
    where
        F: Fn() -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            self.dispatch();
            if done() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }
}

impl Default for MainThreadQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[test]
    fn test_dispatch_runs_posted_tasks() {
        let mut queue = MainThreadQueue::new();
        let probe = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let p = probe.clone();
            queue.handle().post(move || {
                p.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(queue.dispatch(), 3);
        assert_eq!(probe.load(Ordering::SeqCst), 3);

        // Nothing left on a second drain.
        assert_eq!(queue.dispatch(), 0);
    }

    #[test]
    fn test_post_from_worker_thread() {
        let mut queue = MainThreadQueue::new();
        let probe = Arc::new(AtomicUsize::new(0));

        let handle = queue.handle();
        let p = probe.clone();
        let worker = std::thread::spawn(move || {
            handle.post(move || {
                p.fetch_add(1, Ordering::SeqCst);
            });
        });
        worker.join().expect("worker thread panicked");

        queue.dispatch();
        assert_eq!(probe.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_pump_until_sees_completion_from_worker() {
        let mut queue = MainThreadQueue::new();
        let done = Arc::new(AtomicBool::new(false));

        let handle = queue.handle();
        let flag = done.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            handle.post(move || {
                flag.store(true, Ordering::SeqCst);
            });
        });

        let d = done.clone();
        let finished = queue.pump_until(Duration::from_secs(5), move || {
            d.load(Ordering::SeqCst)
        });
        assert!(finished);
    }

    #[test]
    fn test_pump_until_times_out() {
        let mut queue = MainThreadQueue::new();
        let finished = queue.pump_until(Duration::from_millis(20), || false);
        assert!(!finished);
    }

    #[test]
    fn test_post_after_queue_dropped_is_discarded() {
        let queue = MainThreadQueue::new();
        let handle = queue.handle();
        drop(queue);
        handle.post(|| panic!("must not run"));
    }
}
