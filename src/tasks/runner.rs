//! Fixed-size background worker pool
//!
//! Wraps a dedicated tokio runtime behind a "run this callback asynchronously"
//! interface. Decode and compile-submission work runs here; nothing scheduled
//! on the pool may touch live scene-graph or GPU-submission state.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Mutex;
use std::time::Duration;

use tokio::runtime::{Builder, Runtime};

/// Background worker pool with a fixed number of threads
///
/// `schedule` returns immediately; no ordering is guaranteed between
/// independently scheduled tasks. A panic inside a task is caught and logged
/// so it cannot take a worker thread down with it — tasks are expected to
/// report failures through their own completion channels.
pub struct TaskRunner {
    runtime: Mutex<Option<Runtime>>,
    worker_count: usize,
}

impl TaskRunner {
    /// Create a runner with the given number of worker threads
    pub fn new(worker_threads: usize) -> Self {
        let runtime = Builder::new_multi_thread()
            .worker_threads(worker_threads.max(1))
            .thread_name("tile-worker")
            .enable_time()
            .build()
            .expect("failed to build worker runtime");

        Self {
            runtime: Mutex::new(Some(runtime)),
            worker_count: worker_threads.max(1),
        }
    }

    /// Number of worker threads in the pool
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Enqueue a task for execution on one of the worker threads
    ///
    /// Calling this after `shutdown` is a lifecycle error and aborts.
    pub fn schedule<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let guard = self.runtime.lock().expect("task runner lock poisoned");
        let runtime = guard
            .as_ref()
            .expect("TaskRunner::schedule called after shutdown");

        runtime.spawn_blocking(move || {
            if catch_unwind(AssertUnwindSafe(task)).is_err() {
                log::error!("background task panicked; worker thread continues");
            }
        });
    }

    /// Drain outstanding tasks and stop all workers
    ///
    /// Must be called exactly once; a second call aborts.
    pub fn shutdown(&self) {
        let runtime = self
            .runtime
            .lock()
            .expect("task runner lock poisoned")
            .take()
            .expect("TaskRunner::shutdown called twice");

        runtime.shutdown_timeout(Duration::from_secs(10));
    }
}

impl Drop for TaskRunner {
    fn drop(&mut self) {
        // Tolerate dropping without an explicit shutdown; workers stop in
        // the background without blocking the dropping thread.
        if let Ok(mut guard) = self.runtime.lock() {
            if let Some(runtime) = guard.take() {
                runtime.shutdown_background();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    fn wait_for(probe: &AtomicUsize, expected: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while probe.load(Ordering::SeqCst) < expected {
            assert!(Instant::now() < deadline, "timed out waiting for tasks");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_schedule_runs_task() {
        let runner = TaskRunner::new(2);
        let probe = Arc::new(AtomicUsize::new(0));

        let p = probe.clone();
        runner.schedule(move || {
            p.fetch_add(1, Ordering::SeqCst);
        });

        wait_for(&probe, 1);
        runner.shutdown();
    }

    #[test]
    fn test_schedule_runs_off_calling_thread() {
        let runner = TaskRunner::new(1);
        let probe = Arc::new(AtomicUsize::new(0));
        let main_thread = std::thread::current().id();

        let p = probe.clone();
        runner.schedule(move || {
            assert_ne!(std::thread::current().id(), main_thread);
            p.fetch_add(1, Ordering::SeqCst);
        });

        wait_for(&probe, 1);
        runner.shutdown();
    }

    #[test]
    fn test_panicking_task_is_contained() {
        let runner = TaskRunner::new(1);
        let probe = Arc::new(AtomicUsize::new(0));

        runner.schedule(|| panic!("boom"));

        // A later task on the same single worker still runs.
        let p = probe.clone();
        runner.schedule(move || {
            p.fetch_add(1, Ordering::SeqCst);
        });

        wait_for(&probe, 1);
        runner.shutdown();
    }

    #[test]
    fn test_shutdown_drains_outstanding_tasks() {
        let runner = TaskRunner::new(2);
        let probe = Arc::new(AtomicUsize::new(0));

        for _ in 0..16 {
            let p = probe.clone();
            runner.schedule(move || {
                std::thread::sleep(Duration::from_millis(5));
                p.fetch_add(1, Ordering::SeqCst);
            });
        }

        runner.shutdown();
        assert_eq!(probe.load(Ordering::SeqCst), 16);
    }

    #[test]
    #[should_panic(expected = "shutdown called twice")]
    fn test_double_shutdown_panics() {
        let runner = TaskRunner::new(1);
        runner.shutdown();
        runner.shutdown();
    }

    #[test]
    #[should_panic(expected = "after shutdown")]
    fn test_schedule_after_shutdown_panics() {
        let runner = TaskRunner::new(1);
        runner.shutdown();
        runner.schedule(|| {});
    }

    #[test]
    fn test_drop_without_shutdown_is_tolerated() {
        let runner = TaskRunner::new(1);
        runner.schedule(|| {});
        drop(runner);
    }

    #[test]
    fn test_worker_count_is_at_least_one() {
        let runner = TaskRunner::new(0);
        assert_eq!(runner.worker_count(), 1);
        runner.shutdown();
    }
}
